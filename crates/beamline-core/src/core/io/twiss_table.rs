use std::io::Write;
use std::path::Path;

use crate::core::models::twiss::Twiss;

/// Writes a CSV optics table, one row per Twiss snapshot.
pub fn write_twiss_table<W: Write>(writer: W, rows: &[Twiss]) -> Result<(), csv::Error> {
    let mut table = csv::Writer::from_writer(writer);
    for row in rows {
        table.serialize(row)?;
    }
    table.flush()?;
    Ok(())
}

/// Writes a CSV optics table to a file path.
pub fn write_twiss_table_path(path: impl AsRef<Path>, rows: &[Twiss]) -> Result<(), csv::Error> {
    let mut table = csv::Writer::from_path(path)?;
    for row in rows {
        table.serialize(row)?;
    }
    table.flush()?;
    Ok(())
}
