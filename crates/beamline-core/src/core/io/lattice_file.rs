use std::path::Path;

use nalgebra::Matrix6;
use serde::Deserialize;
use thiserror::Error;

use crate::core::models::element::{Alignment, EdgeSide, Element, ElementKind, UndulatorSolver};

#[derive(Debug, Error)]
pub enum LatticeFileError {
    #[error("failed to read lattice file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse lattice file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("element '{label}' supplies a matrix that is not 6x6")]
    InvalidMatrix { label: String },
}

/// A parsed lattice description: the element sequence and the reference
/// energy of the beam it was designed for.
#[derive(Debug, Clone)]
pub struct LatticeDescription {
    pub energy: f64,
    pub elements: Vec<Element>,
}

#[derive(Debug, Deserialize)]
struct RawLattice {
    #[serde(default)]
    energy: f64,
    #[serde(default)]
    elements: Vec<RawElement>,
}

#[derive(Debug, Deserialize)]
struct RawElement {
    label: Option<String>,
    kind: String,
    #[serde(default)]
    length: f64,
    #[serde(default)]
    dx: f64,
    #[serde(default)]
    dy: f64,
    #[serde(default)]
    tilt: f64,
    #[serde(default)]
    k1: f64,
    #[serde(default)]
    k2: f64,
    #[serde(default)]
    k3: f64,
    #[serde(default)]
    angle: f64,
    integrated: Option<f64>,
    #[serde(default)]
    h: f64,
    #[serde(default)]
    gap: f64,
    #[serde(default)]
    fint: f64,
    #[serde(default)]
    h_pole: f64,
    side: Option<String>,
    #[serde(default)]
    kn: Vec<f64>,
    #[serde(default)]
    voltage: f64,
    #[serde(default)]
    frequency: f64,
    #[serde(default)]
    phase: f64,
    #[serde(default)]
    k: f64,
    #[serde(default)]
    lperiod: f64,
    #[serde(default)]
    kx: f64,
    #[serde(default)]
    ky: f64,
    solver: Option<String>,
    ax: Option<f64>,
    r: Option<Vec<Vec<f64>>>,
}

impl RawElement {
    fn into_element(self, index: usize) -> Result<Element, LatticeFileError> {
        let label = self
            .label
            .clone()
            .unwrap_or_else(|| format!("{}_{index}", self.kind));
        let kind = match self.kind.as_str() {
            "drift" => ElementKind::Drift,
            "quadrupole" => ElementKind::Quadrupole { k1: self.k1 },
            "bend" | "sbend" | "rbend" => ElementKind::Bend {
                angle: self.angle,
                k1: self.k1,
            },
            "edge" => ElementKind::Edge {
                h: self.h,
                angle: self.angle,
                k1: self.k1,
                gap: self.gap,
                fint: self.fint,
                h_pole: self.h_pole,
                side: match self.side.as_deref() {
                    Some("exit") => EdgeSide::Exit,
                    _ => EdgeSide::Entrance,
                },
            },
            "sextupole" => ElementKind::Sextupole {
                k2: self.k2,
                integrated: self.integrated,
            },
            "octupole" => ElementKind::Octupole {
                k3: self.k3,
                integrated: self.integrated,
            },
            "multipole" => ElementKind::Multipole {
                kn: self.kn.clone(),
            },
            "hcorrector" | "hcor" => ElementKind::HCorrector { angle: self.angle },
            "vcorrector" | "vcor" => ElementKind::VCorrector { angle: self.angle },
            "cavity" => ElementKind::Cavity {
                voltage: self.voltage,
                frequency: self.frequency,
                phase: self.phase,
            },
            "solenoid" => ElementKind::Solenoid { k: self.k },
            "undulator" => ElementKind::Undulator {
                lperiod: self.lperiod,
                kx: self.kx,
                ky: self.ky,
                ax: self.ax.unwrap_or(-1.0),
                solver: match self.solver.as_deref() {
                    Some("symplectic") => UndulatorSolver::Symplectic,
                    _ => UndulatorSolver::Harmonic,
                },
            },
            "matrix" => {
                let rows = self.r.as_deref().unwrap_or(&[]);
                if rows.len() != 6 || rows.iter().any(|row| row.len() != 6) {
                    return Err(LatticeFileError::InvalidMatrix { label });
                }
                let mut m = Matrix6::identity();
                for (i, row) in rows.iter().enumerate() {
                    for (j, &value) in row.iter().enumerate() {
                        m[(i, j)] = value;
                    }
                }
                ElementKind::Matrix { r: m }
            }
            "monitor" => ElementKind::Monitor,
            "marker" => ElementKind::Marker,
            // surfaced as a fatal error when the lattice builds its maps
            _ => ElementKind::Undefined,
        };
        Ok(Element {
            label,
            length: self.length,
            alignment: Alignment {
                dx: self.dx,
                dy: self.dy,
                tilt: self.tilt,
            },
            kind,
        })
    }
}

/// Parses a TOML lattice description from a string.
pub fn parse_lattice(input: &str) -> Result<LatticeDescription, LatticeFileError> {
    let raw: RawLattice = toml::from_str(input)?;
    let elements = raw
        .elements
        .into_iter()
        .enumerate()
        .map(|(index, raw)| raw.into_element(index))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(LatticeDescription {
        energy: raw.energy,
        elements,
    })
}

/// Reads and parses a TOML lattice description from disk.
pub fn load_lattice(path: impl AsRef<Path>) -> Result<LatticeDescription, LatticeFileError> {
    let content = std::fs::read_to_string(path)?;
    parse_lattice(&content)
}
