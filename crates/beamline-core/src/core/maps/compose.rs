use nalgebra::{Matrix6, Vector6};

use super::transfer::{MapError, MapOrder, TransferMap, propagate_twiss};
use crate::core::models::particle::{Particle, ParticleArray};
use crate::core::models::twiss::Twiss;

/// A linear map accumulated as an ordered product of order-1 maps.
///
/// The factors are kept rather than premultiplied so that the composed
/// `R(E)` and `B(E)` stay exact functions of the reference energy:
/// `R(E) = R_n(E) * ... * R_1(E)` and `B(E)` folds as
/// `B <- R_i(E) * B + B_i(E)`. Only order-1 maps may enter a composition;
/// crossing a nonlinear boundary requires a map sequence instead, which is
/// the traversal layer's job.
#[derive(Debug, Clone, Default)]
pub struct ComposedLinear {
    factors: Vec<TransferMap>,
    length: f64,
}

impl ComposedLinear {
    /// The empty product: a zero-length identity map.
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn is_identity(&self) -> bool {
        self.factors.is_empty()
    }

    /// Number of composed factors; the traversal layer bounds this to keep
    /// evaluation cost and conditioning in check.
    pub fn depth(&self) -> usize {
        self.factors.len()
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    /// Appends a map to the product (applied after everything already
    /// composed). Rejects maps whose exact representation is nonlinear.
    pub fn push(&mut self, map: TransferMap) -> Result<(), MapError> {
        if map.order() > MapOrder::First {
            return Err(MapError::NonlinearComposition { order: map.order() });
        }
        self.length += map.length();
        self.factors.push(map);
        Ok(())
    }

    /// The composed linear matrix at the given reference energy.
    pub fn matrix(&self, energy: f64) -> Matrix6<f64> {
        self.factors
            .iter()
            .fold(Matrix6::identity(), |acc, map| map.full_matrix(energy) * acc)
    }

    /// The composed affine offset at the given reference energy.
    pub fn offset(&self, energy: f64) -> Vector6<f64> {
        self.factors.iter().fold(Vector6::zeros(), |acc, map| {
            map.full_matrix(energy) * acc + map.full_offset(energy)
        })
    }

    /// Transports a single particle through the composed map.
    pub fn apply_particle(&self, particle: &Particle) -> Particle {
        let v = self.matrix(particle.energy)
            * Vector6::from_column_slice(&particle.coords())
            + self.offset(particle.energy);
        let mut out = *particle;
        out.set_coords(&[v[0], v[1], v[2], v[3], v[4], v[5]]);
        out.s += self.length;
        out
    }

    /// Transports an ensemble in place through the composed map.
    pub fn apply_array(&self, particles: &mut ParticleArray) {
        let r = self.matrix(particles.energy);
        let b = self.offset(particles.energy);
        for chunk in particles.coords_mut().chunks_exact_mut(6) {
            let v = r * Vector6::from_column_slice(chunk) + b;
            chunk.copy_from_slice(v.as_slice());
        }
        particles.s += self.length;
    }

    /// Transports a Twiss envelope through the composed map. Compositions
    /// carry no energy gain, so the reference energy is unchanged.
    pub fn apply_twiss(&self, tws: &Twiss) -> Twiss {
        let r = self.matrix(tws.energy);
        let mut out = propagate_twiss(&r, 0.0, tws);
        let v = r * Vector6::from_column_slice(&tws.centroid()) + self.offset(tws.energy);
        out.set_centroid(&[v[0], v[1], v[2], v[3], v[4], v[5]]);
        out.s = tws.s + self.length;
        out
    }
}

/// Composes two order-1 maps: `a` applied first, then `b`.
pub fn compose(a: &TransferMap, b: &TransferMap) -> Result<ComposedLinear, MapError> {
    let mut product = ComposedLinear::identity();
    product.push(a.clone())?;
    product.push(b.clone())?;
    Ok(product)
}
