use tracing::debug;

use super::error::EngineError;
use crate::core::maps::compose::ComposedLinear;
use crate::core::maps::transfer::{MapError, MapOrder, TransferMap};
use crate::core::models::lattice::Lattice;
use crate::core::models::particle::{Particle, ParticleArray};

/// Tolerance for deciding that a target position has reached an element
/// boundary, absorbing the rounding of accumulated lengths.
const BOUNDARY_EPS: f64 = 1e-10;

/// Flush the linear accumulator after this many compositions to keep the
/// evaluation depth and matrix conditioning bounded.
const MAX_COMPOSITION_DEPTH: usize = 100;

/// Traversal cursor over a lattice.
///
/// Owned by the caller performing a multi-step walk and mutated only by
/// [`segment_maps`]; it must not be shared across concurrent traversals.
#[derive(Debug, Clone, Copy, Default)]
pub struct Navigator {
    /// Absolute position along the lattice in meters.
    pub z0: f64,
    /// Index of the element containing the current position.
    pub element_index: usize,
    /// Summed length of all fully completed elements.
    pub traversed_length: f64,
}

/// One entry of the ordered map list a traversal produces.
///
/// Sequential application of the steps reproduces the exact transport; the
/// entries are never merged further, which is what preserves nonlinear
/// fidelity across kick elements.
#[derive(Debug, Clone)]
pub enum TrackStep {
    /// A run of composed order-1 maps.
    Linear(ComposedLinear),
    /// A single nonlinear slice, applied atomically.
    Atomic(TransferMap),
}

impl TrackStep {
    pub fn length(&self) -> f64 {
        match self {
            TrackStep::Linear(composed) => composed.length(),
            TrackStep::Atomic(map) => map.length(),
        }
    }

    /// Transports a single particle through this step. Atomic steps honor
    /// their map's own order, so nonlinear kicks are preserved.
    pub fn apply_particle(&self, particle: &Particle) -> Result<Particle, MapError> {
        match self {
            TrackStep::Linear(composed) => Ok(composed.apply_particle(particle)),
            TrackStep::Atomic(map) => map.apply_particle(particle),
        }
    }

    /// Transports an ensemble in place at the requested tracking order.
    pub fn apply_array(
        &self,
        particles: &mut ParticleArray,
        requested: MapOrder,
    ) -> Result<(), MapError> {
        match self {
            TrackStep::Linear(composed) => {
                composed.apply_array(particles);
                Ok(())
            }
            TrackStep::Atomic(map) => map.apply_array(particles, requested),
        }
    }
}

/// Walks `dz` meters from the navigator's current position and returns the
/// ordered list of maps covering that span.
///
/// Linear slices are merged into a running accumulator; any slice whose map
/// is intrinsically nonlinear, or every slice when the caller requests
/// higher-order tracking, is flushed as its own atomic entry. The
/// accumulator is also flushed after [`MAX_COMPOSITION_DEPTH`] compositions.
/// Requesting a walk past the end of the element sequence is a fatal client
/// error; there is no implicit wraparound.
pub fn segment_maps(
    lattice: &Lattice,
    dz: f64,
    navigator: &mut Navigator,
    order: MapOrder,
) -> Result<Vec<TrackStep>, EngineError> {
    let sequence = lattice.sequence();
    let target = navigator.z0 + dz;
    if navigator.element_index >= sequence.len() || target > lattice.total_len() + BOUNDARY_EPS {
        return Err(EngineError::OutOfRange {
            requested: target,
            available: lattice.total_len(),
        });
    }

    let mut steps = Vec::new();
    let mut accumulator = ComposedLinear::identity();
    let mut index = navigator.element_index;
    let mut node = &sequence[index];
    let mut boundary = navigator.traversed_length + node.element.length;
    let mut remaining = dz;

    let flush = |accumulator: &mut ComposedLinear, steps: &mut Vec<TrackStep>| {
        if !accumulator.is_identity() {
            steps.push(TrackStep::Linear(std::mem::take(accumulator)));
        }
    };

    while target > boundary + BOUNDARY_EPS {
        let dl = boundary - navigator.z0;
        let slice = node.map.slice(dl);
        if slice.order() > MapOrder::First || order > MapOrder::First {
            flush(&mut accumulator, &mut steps);
            steps.push(TrackStep::Atomic(slice));
        } else {
            accumulator.push(slice)?;
            if accumulator.depth() > MAX_COMPOSITION_DEPTH {
                flush(&mut accumulator, &mut steps);
            }
        }
        navigator.z0 = boundary;
        remaining -= dl;
        index += 1;
        if index >= sequence.len() {
            return Err(EngineError::OutOfRange {
                requested: target,
                available: lattice.total_len(),
            });
        }
        node = &sequence[index];
        boundary += node.element.length;
    }

    let slice = node.map.slice(remaining.clamp(0.0, node.element.length));
    if slice.order() > MapOrder::First || order > MapOrder::First {
        flush(&mut accumulator, &mut steps);
        steps.push(TrackStep::Atomic(slice));
    } else {
        accumulator.push(slice)?;
    }
    navigator.z0 += remaining;
    navigator.traversed_length = boundary - node.element.length;
    navigator.element_index = index;
    flush(&mut accumulator, &mut steps);

    debug!(
        steps = steps.len(),
        z0 = navigator.z0,
        element = navigator.element_index,
        "traversal segment built"
    );
    Ok(steps)
}
