use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum BeamError {
    #[error("particle list is empty")]
    EmptyEnsemble,
    #[error("particles do not share one reference energy")]
    MixedReferenceEnergy,
}

/// A single particle in six-dimensional phase space.
///
/// Coordinates follow the accelerator convention: transverse positions and
/// momenta `(x, px, y, py)`, longitudinal offset `tau` relative to the
/// reference particle, and relative momentum deviation `p`. The particle also
/// carries its longitudinal position `s` along the lattice and the reference
/// energy of the beam it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Particle {
    /// Horizontal position in meters.
    pub x: f64,
    /// Horizontal momentum, normalized to the reference momentum.
    pub px: f64,
    /// Vertical position in meters.
    pub y: f64,
    /// Vertical momentum, normalized to the reference momentum.
    pub py: f64,
    /// Longitudinal offset from the reference particle in meters.
    pub tau: f64,
    /// Relative momentum deviation.
    pub p: f64,
    /// Position along the lattice in meters.
    pub s: f64,
    /// Reference energy in GeV.
    pub energy: f64,
}

impl Particle {
    /// Packs the six phase-space coordinates into a flat buffer.
    pub fn coords(&self) -> [f64; 6] {
        [self.x, self.px, self.y, self.py, self.tau, self.p]
    }

    /// Replaces the six phase-space coordinates from a flat buffer.
    pub fn set_coords(&mut self, coords: &[f64; 6]) {
        self.x = coords[0];
        self.px = coords[1];
        self.y = coords[2];
        self.py = coords[3];
        self.tau = coords[4];
        self.p = coords[5];
    }
}

/// A batched ensemble of particles sharing one reference energy.
///
/// Coordinates are stored as a flat buffer of length `6 * n` with stride 6,
/// which lets transfer maps apply vectorized updates chunk by chunk. The
/// buffer is exclusively owned by its `ParticleArray`; maps may mutate it in
/// place as an optimization but observably behave as pure transforms.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParticleArray {
    coords: Vec<f64>,
    /// Reference energy in GeV, shared by every particle in the ensemble.
    pub energy: f64,
    /// Position along the lattice in meters.
    pub s: f64,
}

impl ParticleArray {
    /// Creates an ensemble from a flat coordinate buffer with stride 6.
    ///
    /// The buffer length must be a multiple of six.
    pub fn new(coords: Vec<f64>, energy: f64) -> Self {
        debug_assert!(coords.len() % 6 == 0);
        Self {
            coords,
            energy,
            s: 0.0,
        }
    }

    /// Builds an ensemble from individual particles.
    ///
    /// All particles must share the same reference energy; the ensemble takes
    /// its position `s` from the first particle.
    pub fn from_particles(particles: &[Particle]) -> Result<Self, BeamError> {
        let first = particles.first().ok_or(BeamError::EmptyEnsemble)?;
        if particles.iter().any(|p| p.energy != first.energy) {
            return Err(BeamError::MixedReferenceEnergy);
        }
        let mut coords = Vec::with_capacity(particles.len() * 6);
        for p in particles {
            coords.extend_from_slice(&p.coords());
        }
        Ok(Self {
            coords,
            energy: first.energy,
            s: first.s,
        })
    }

    /// Unpacks the ensemble back into individual particles.
    pub fn to_particles(&self) -> Vec<Particle> {
        self.coords
            .chunks_exact(6)
            .map(|c| Particle {
                x: c[0],
                px: c[1],
                y: c[2],
                py: c[3],
                tau: c[4],
                p: c[5],
                s: self.s,
                energy: self.energy,
            })
            .collect()
    }

    /// Number of particles in the ensemble.
    pub fn len(&self) -> usize {
        self.coords.len() / 6
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Read access to the flat coordinate buffer.
    pub fn coords(&self) -> &[f64] {
        &self.coords
    }

    /// Mutable access to the flat coordinate buffer, for vectorized map
    /// application.
    pub fn coords_mut(&mut self) -> &mut [f64] {
        &mut self.coords
    }
}
