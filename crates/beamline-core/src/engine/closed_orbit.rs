use nalgebra::{Matrix4, Matrix6, Vector6};
use tracing::{debug, info, instrument};

use super::error::EngineError;
use super::navigator::{Navigator, TrackStep, segment_maps};
use super::optimize::{MinimizeBudget, nelder_mead};
use crate::core::maps::transfer::MapOrder;
use crate::core::models::lattice::Lattice;
use crate::core::models::particle::Particle;

/// Tolerance and iteration budget for the closed-orbit refinement.
#[derive(Debug, Clone, Copy)]
pub struct ClosedOrbitConfig {
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for ClosedOrbitConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            max_iterations: 2000,
        }
    }
}

/// Finds the transverse fixed point of the one-turn map.
///
/// The first stage composes a linear approximation of the turn, treating
/// every nonlinear step as a pure drift, and solves `p0 = (I - R)^-1 * B`
/// directly. The second stage refines `p0` by minimizing the squared
/// turn residual of an actual particle propagated through the *true* step
/// sequence, all nonlinear kicks included. Exceeding the iteration budget
/// without meeting tolerance is reported, never silently accepted.
#[instrument(skip_all, name = "closed_orbit")]
pub fn closed_orbit(
    lattice: &Lattice,
    energy: f64,
    config: &ClosedOrbitConfig,
) -> Result<Particle, EngineError> {
    let mut navigator = Navigator::default();
    let steps = segment_maps(lattice, lattice.total_len(), &mut navigator, MapOrder::First)?;

    let mut r = Matrix6::identity();
    let mut b = Vector6::zeros();
    for step in &steps {
        let (step_r, step_b) = match step {
            TrackStep::Linear(composed) => (composed.matrix(energy), composed.offset(energy)),
            TrackStep::Atomic(map) => {
                let mut drift = Matrix6::identity();
                drift[(0, 1)] = map.length();
                drift[(2, 3)] = map.length();
                (drift, Vector6::zeros())
            }
        };
        r = step_r * r;
        b = step_r * b + step_b;
    }

    let r4 = r.fixed_view::<4, 4>(0, 0).into_owned();
    let b4 = b.fixed_rows::<4>(0).into_owned();
    let system = Matrix4::identity() - r4;
    let inverse = system.try_inverse().ok_or(EngineError::SingularOrbit)?;
    let guess = inverse * b4;
    debug!(
        x = guess[0],
        px = guess[1],
        y = guess[2],
        py = guess[3],
        "linear closed-orbit estimate"
    );

    let objective = |coords: &[f64]| -> Result<f64, EngineError> {
        let mut particle = Particle {
            x: coords[0],
            px: coords[1],
            y: coords[2],
            py: coords[3],
            energy,
            ..Default::default()
        };
        for step in &steps {
            particle = step.apply_particle(&particle)?;
        }
        Ok(1000.0
            * ((particle.x - coords[0]).powi(2)
                + (particle.px - coords[1]).powi(2)
                + (particle.y - coords[2]).powi(2)
                + (particle.py - coords[3]).powi(2)))
    };

    let budget = MinimizeBudget {
        tolerance: config.tolerance,
        max_iterations: config.max_iterations,
    };
    let result = nelder_mead(objective, guess.as_slice(), 1e-7, &budget)?;
    if !result.converged {
        return Err(EngineError::Convergence {
            iterations: result.iterations,
            residual: result.value,
        });
    }
    info!(
        iterations = result.iterations,
        residual = result.value,
        "closed orbit refined"
    );
    Ok(Particle {
        x: result.x[0],
        px: result.x[1],
        y: result.x[2],
        py: result.x[3],
        energy,
        ..Default::default()
    })
}
