use nalgebra::Matrix6;

/// Transverse misalignment and roll of an element relative to the reference
/// orbit.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Alignment {
    /// Horizontal offset in meters.
    pub dx: f64,
    /// Vertical offset in meters.
    pub dy: f64,
    /// Roll angle around the beam axis in radians.
    pub tilt: f64,
}

/// Which pole face of a bend an edge element describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeSide {
    Entrance,
    Exit,
}

/// Solver selection for undulator transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UndulatorSolver {
    /// Closed-form harmonic focusing matrix.
    #[default]
    Harmonic,
    /// Multi-step symplectic field integrator.
    Symplectic,
}

/// The physics of a lattice element, with its type-specific parameters.
///
/// Strengths follow the usual conventions: `k1` in 1/m^2, `k2` in 1/m^3,
/// `k3` in 1/m^4, bend `angle` in radians, RF voltage in GV.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    /// Field-free straight section.
    Drift,
    /// Normal quadrupole; `k1 > 0` focuses horizontally.
    Quadrupole { k1: f64 },
    /// Sector dipole, optionally with a gradient. Rectangular bends are the
    /// same body matrix with explicit [`ElementKind::Edge`] elements on both
    /// pole faces.
    Bend { angle: f64, k1: f64 },
    /// Zero-length pole-face focusing of a bend.
    Edge {
        /// Curvature of the adjacent bend in 1/m.
        h: f64,
        /// Pole-face rotation angle in radians.
        angle: f64,
        /// Gradient of the adjacent bend in 1/m^2.
        k1: f64,
        /// Full magnet gap in meters.
        gap: f64,
        /// Fringe-field integral.
        fint: f64,
        /// Pole-face curvature in 1/m.
        h_pole: f64,
        side: EdgeSide,
    },
    /// Sextupole; `integrated` supplies the strength for the zero-length
    /// (thin) form.
    Sextupole { k2: f64, integrated: Option<f64> },
    /// Octupole; `integrated` supplies the strength for the zero-length form.
    Octupole { k3: f64, integrated: Option<f64> },
    /// Thin multipole with integrated strengths `kn[n]` per order `n`.
    Multipole { kn: Vec<f64> },
    /// Horizontal steering corrector with total deflection `angle`.
    HCorrector { angle: f64 },
    /// Vertical steering corrector with total deflection `angle`.
    VCorrector { angle: f64 },
    /// Accelerating RF cavity.
    Cavity {
        /// Total voltage in GV.
        voltage: f64,
        /// RF frequency in Hz.
        frequency: f64,
        /// RF phase in radians; zero is on-crest.
        phase: f64,
    },
    /// Solenoid with strength `k = B0 / (2 * Brho)` in 1/m.
    Solenoid { k: f64 },
    /// Planar undulator.
    Undulator {
        /// Period length in meters.
        lperiod: f64,
        /// Horizontal undulator parameter.
        kx: f64,
        /// Vertical undulator parameter.
        ky: f64,
        /// Horizontal field roll-off length in meters; a negative value means
        /// an ideal flat field.
        ax: f64,
        solver: UndulatorSolver,
    },
    /// Fixed user-supplied linear map over the element length.
    Matrix { r: Matrix6<f64> },
    /// Beam-position monitor; no physical effect.
    Monitor,
    /// Zero-length reference point; no physical effect.
    Marker,
    /// Placeholder for an element kind the library does not know. The map
    /// factory rejects it.
    Undefined,
}

/// An immutable lattice-element descriptor.
///
/// The map factory reads descriptors and never mutates them; changing a
/// strength means building a new descriptor and rebuilding its map.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Identifier used for observation points and diagnostics.
    pub label: String,
    /// Physical length in meters.
    pub length: f64,
    pub alignment: Alignment,
    pub kind: ElementKind,
}

impl Element {
    pub fn new(label: impl Into<String>, length: f64, kind: ElementKind) -> Self {
        Self {
            label: label.into(),
            length,
            alignment: Alignment::default(),
            kind,
        }
    }

    pub fn drift(label: impl Into<String>, length: f64) -> Self {
        Self::new(label, length, ElementKind::Drift)
    }

    pub fn quadrupole(label: impl Into<String>, length: f64, k1: f64) -> Self {
        Self::new(label, length, ElementKind::Quadrupole { k1 })
    }

    pub fn bend(label: impl Into<String>, length: f64, angle: f64) -> Self {
        Self::new(label, length, ElementKind::Bend { angle, k1: 0.0 })
    }

    pub fn sextupole(label: impl Into<String>, length: f64, k2: f64) -> Self {
        Self::new(
            label,
            length,
            ElementKind::Sextupole {
                k2,
                integrated: None,
            },
        )
    }

    pub fn thin_sextupole(label: impl Into<String>, integrated: f64) -> Self {
        Self::new(
            label,
            0.0,
            ElementKind::Sextupole {
                k2: 0.0,
                integrated: Some(integrated),
            },
        )
    }

    pub fn hcorrector(label: impl Into<String>, length: f64, angle: f64) -> Self {
        Self::new(label, length, ElementKind::HCorrector { angle })
    }

    pub fn marker(label: impl Into<String>) -> Self {
        Self::new(label, 0.0, ElementKind::Marker)
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Curvature of the reference orbit inside the element, in 1/m.
    pub fn curvature(&self) -> f64 {
        match self.kind {
            ElementKind::Bend { angle, .. } if self.length != 0.0 => angle / self.length,
            _ => 0.0,
        }
    }
}
