use serde::{Deserialize, Serialize};

/// Second-moment description of a beam envelope at one lattice position.
///
/// Holds the Courant-Snyder parameters and dispersion for both transverse
/// planes, the accumulated betatron phase advances, and the centroid
/// trajectory of the beam. Invariant maintained by every propagation step:
/// `gamma = (1 + alpha^2) / beta` in each plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Twiss {
    /// Horizontal beta function in meters.
    pub beta_x: f64,
    /// Horizontal alpha function.
    pub alpha_x: f64,
    /// Horizontal gamma function in 1/m.
    pub gamma_x: f64,
    /// Vertical beta function in meters.
    pub beta_y: f64,
    /// Vertical alpha function.
    pub alpha_y: f64,
    /// Vertical gamma function in 1/m.
    pub gamma_y: f64,
    /// Accumulated horizontal phase advance in radians.
    pub mux: f64,
    /// Accumulated vertical phase advance in radians.
    pub muy: f64,
    /// Horizontal dispersion in meters.
    pub dx: f64,
    /// Horizontal dispersion slope.
    pub dxp: f64,
    /// Vertical dispersion in meters.
    pub dy: f64,
    /// Vertical dispersion slope.
    pub dyp: f64,
    /// Centroid horizontal position in meters.
    pub x: f64,
    /// Centroid horizontal momentum.
    pub px: f64,
    /// Centroid vertical position in meters.
    pub y: f64,
    /// Centroid vertical momentum.
    pub py: f64,
    /// Centroid longitudinal offset in meters.
    pub tau: f64,
    /// Centroid relative momentum deviation.
    pub p: f64,
    /// Reference energy in GeV.
    pub energy: f64,
    /// Position along the lattice in meters.
    pub s: f64,
}

/// Enum-keyed accessor over the fixed Twiss field set.
///
/// Constraint-evaluation code selects fields by value of this enum instead of
/// by string name, so a misspelled field is a compile error rather than a
/// silent zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TwissParam {
    BetaX,
    AlphaX,
    GammaX,
    BetaY,
    AlphaY,
    GammaY,
    MuX,
    MuY,
    Dx,
    Dxp,
    Dy,
    Dyp,
    X,
    Px,
    Y,
    Py,
    Tau,
    P,
    Energy,
    S,
}

impl Twiss {
    /// Recomputes both gamma functions from beta and alpha.
    ///
    /// Used to normalize caller-supplied initial conditions before
    /// propagation.
    pub fn normalize_gammas(&mut self) {
        if self.beta_x != 0.0 {
            self.gamma_x = (1.0 + self.alpha_x * self.alpha_x) / self.beta_x;
        }
        if self.beta_y != 0.0 {
            self.gamma_y = (1.0 + self.alpha_y * self.alpha_y) / self.beta_y;
        }
    }

    /// Reads one field by its [`TwissParam`] key.
    pub fn get(&self, param: TwissParam) -> f64 {
        match param {
            TwissParam::BetaX => self.beta_x,
            TwissParam::AlphaX => self.alpha_x,
            TwissParam::GammaX => self.gamma_x,
            TwissParam::BetaY => self.beta_y,
            TwissParam::AlphaY => self.alpha_y,
            TwissParam::GammaY => self.gamma_y,
            TwissParam::MuX => self.mux,
            TwissParam::MuY => self.muy,
            TwissParam::Dx => self.dx,
            TwissParam::Dxp => self.dxp,
            TwissParam::Dy => self.dy,
            TwissParam::Dyp => self.dyp,
            TwissParam::X => self.x,
            TwissParam::Px => self.px,
            TwissParam::Y => self.y,
            TwissParam::Py => self.py,
            TwissParam::Tau => self.tau,
            TwissParam::P => self.p,
            TwissParam::Energy => self.energy,
            TwissParam::S => self.s,
        }
    }

    /// The centroid trajectory as a flat coordinate buffer.
    pub fn centroid(&self) -> [f64; 6] {
        [self.x, self.px, self.y, self.py, self.tau, self.p]
    }

    /// Replaces the centroid trajectory from a flat coordinate buffer.
    pub fn set_centroid(&mut self, coords: &[f64; 6]) {
        self.x = coords[0];
        self.px = coords[1];
        self.y = coords[2];
        self.py = coords[3];
        self.tau = coords[4];
        self.p = coords[5];
    }
}
