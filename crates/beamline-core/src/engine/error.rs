use thiserror::Error;

use crate::core::maps::transfer::MapError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Map(#[from] MapError),

    #[error("traversal past the end of the lattice: requested {requested} m of {available} m")]
    OutOfRange { requested: f64, available: f64 },

    #[error("one-turn matrix has no periodic solution")]
    NoPeriodicSolution,

    #[error("singular dispersion system in the {plane} plane")]
    SingularDispersion { plane: char },

    #[error("singular linear system for the closed-orbit fixed point")]
    SingularOrbit,

    #[error("failed to converge after {iterations} iterations (residual {residual:.3e})")]
    Convergence { iterations: usize, residual: f64 },
}
