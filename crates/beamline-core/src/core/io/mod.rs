//! # I/O Module
//!
//! Reading lattice descriptions and writing optics tables.
//!
//! - [`lattice_file`] - TOML element sequences with a reference energy
//! - [`twiss_table`] - CSV tables of Twiss snapshots

pub mod lattice_file;
pub mod twiss_table;
