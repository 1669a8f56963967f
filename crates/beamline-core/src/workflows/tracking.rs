use nalgebra::Matrix6;
use tracing::instrument;

use crate::core::maps::transfer::{MapError, MapOrder, TransferMap};
use crate::core::models::lattice::Lattice;
use crate::core::models::particle::{Particle, ParticleArray};
use crate::core::models::twiss::Twiss;
use crate::engine::error::EngineError;
use crate::engine::navigator::{Navigator, segment_maps};

/// Seam trait for objects a transfer map can transport one element at a
/// time: single particles and Twiss envelopes.
pub trait Transportable: Clone {
    fn transported(&self, map: &TransferMap) -> Result<Self, MapError>;
}

impl Transportable for Particle {
    fn transported(&self, map: &TransferMap) -> Result<Self, MapError> {
        map.apply_particle(self)
    }
}

impl Transportable for Twiss {
    fn transported(&self, map: &TransferMap) -> Result<Self, MapError> {
        map.apply_twiss(self)
    }
}

/// One-pass transfer matrix of the whole lattice at a fixed reference
/// energy: the repeated composition of every element matrix in sequence.
pub fn lattice_transfer_map(lattice: &Lattice, energy: f64) -> Matrix6<f64> {
    lattice
        .sequence()
        .iter()
        .fold(Matrix6::identity(), |acc, node| {
            node.map.full_matrix(energy) * acc
        })
}

/// Tracks an object element by element through the lattice.
///
/// With `observe = None` the result holds the initial state followed by one
/// snapshot per element; otherwise only snapshots at elements whose label is
/// listed.
pub fn track<T: Transportable>(
    lattice: &Lattice,
    initial: &T,
    observe: Option<&[&str]>,
) -> Result<Vec<T>, EngineError> {
    let mut snapshots = match observe {
        None => vec![initial.clone()],
        Some(_) => Vec::new(),
    };
    let mut state = initial.clone();
    for node in lattice.sequence() {
        state = state.transported(&node.map)?;
        match observe {
            None => snapshots.push(state.clone()),
            Some(labels) => {
                if labels.contains(&node.element.label.as_str()) {
                    snapshots.push(state.clone());
                }
            }
        }
    }
    Ok(snapshots)
}

/// Samples an object at the given non-decreasing absolute positions.
///
/// Whole elements up to each position are applied once; the final partial
/// element is covered by a recomputed slice, so interior optics are exact,
/// not interpolated.
pub fn trace_z<T: Transportable>(
    lattice: &Lattice,
    initial: &T,
    positions: &[f64],
) -> Result<Vec<T>, EngineError> {
    debug_assert!(positions.windows(2).all(|w| w[0] <= w[1]));
    let sequence = lattice.sequence();
    let mut snapshots = Vec::with_capacity(positions.len());
    if sequence.is_empty() {
        if let Some(&z) = positions.iter().find(|&&z| z > 0.0) {
            return Err(EngineError::OutOfRange {
                requested: z,
                available: 0.0,
            });
        }
        snapshots.extend(positions.iter().map(|_| initial.clone()));
        return Ok(snapshots);
    }

    let mut index = 0;
    let mut boundary = sequence[0].element.length;
    let mut carried = initial.clone();
    for &z in positions {
        if z > lattice.total_len() + 1e-10 {
            return Err(EngineError::OutOfRange {
                requested: z,
                available: lattice.total_len(),
            });
        }
        while z > boundary + 1e-10 {
            carried = carried.transported(&sequence[index].map)?;
            index += 1;
            boundary += sequence[index].element.length;
        }
        let local = z - (boundary - sequence[index].element.length);
        let slice = sequence[index]
            .map
            .slice(local.clamp(0.0, sequence[index].element.length));
        snapshots.push(carried.transported(&slice)?);
    }
    Ok(snapshots)
}

/// Tracks a particle ensemble through the whole lattice at the requested
/// order, using the traversal layer so nonlinear kicks stay atomic.
#[instrument(skip_all, name = "track_particle_array")]
pub fn track_particle_array(
    lattice: &Lattice,
    particles: &mut ParticleArray,
    order: MapOrder,
) -> Result<(), EngineError> {
    let mut navigator = Navigator::default();
    let steps = segment_maps(lattice, lattice.total_len(), &mut navigator, order)?;
    for step in &steps {
        step.apply_array(particles, order)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::element::Element;

    const TOLERANCE: f64 = 1e-12;

    fn drift_pair() -> Lattice {
        Lattice::new(vec![Element::drift("d1", 1.0), Element::drift("d2", 1.0)]).unwrap()
    }

    #[test]
    fn lattice_transfer_map_composes_drifts() {
        let lattice = drift_pair();
        let r = lattice_transfer_map(&lattice, 0.0);
        assert!((r[(0, 1)] - 2.0).abs() < TOLERANCE);
        assert!((r[(2, 3)] - 2.0).abs() < TOLERANCE);
    }

    #[test]
    fn track_records_one_snapshot_per_element() {
        let lattice = drift_pair();
        let p = Particle {
            px: 1e-3,
            energy: 1.0,
            ..Default::default()
        };
        let snapshots = track(&lattice, &p, None).unwrap();
        assert_eq!(snapshots.len(), 3);
        assert!((snapshots[1].x - 1e-3).abs() < TOLERANCE);
        assert!((snapshots[2].x - 2e-3).abs() < TOLERANCE);
        assert!((snapshots[2].s - 2.0).abs() < TOLERANCE);
    }

    #[test]
    fn track_can_observe_selected_elements_only() {
        let lattice = Lattice::new(vec![
            Element::drift("d1", 1.0),
            Element::marker("obs"),
            Element::drift("d2", 1.0),
        ])
        .unwrap();
        let p = Particle {
            px: 1e-3,
            energy: 1.0,
            ..Default::default()
        };
        let snapshots = track(&lattice, &p, Some(&["obs"])).unwrap();
        assert_eq!(snapshots.len(), 1);
        assert!((snapshots[0].s - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn trace_z_samples_interior_optics_exactly() {
        let lattice = Lattice::new(vec![Element::drift("d1", 2.0)]).unwrap();
        let mut tws = Twiss {
            beta_x: 10.0,
            beta_y: 10.0,
            ..Default::default()
        };
        tws.normalize_gammas();
        let samples = trace_z(&lattice, &tws, &[0.5, 1.5, 2.0]).unwrap();
        // beta(z) = beta0 + z^2 * gamma0 for alpha0 = 0
        assert!((samples[0].beta_x - (10.0 + 0.25 * 0.1)).abs() < 1e-9);
        assert!((samples[1].beta_x - (10.0 + 2.25 * 0.1)).abs() < 1e-9);
        assert!((samples[2].beta_x - (10.0 + 4.0 * 0.1)).abs() < 1e-9);
        assert!((samples[1].s - 1.5).abs() < TOLERANCE);
    }

    #[test]
    fn trace_z_rejects_positions_past_the_end() {
        let lattice = drift_pair();
        let p = Particle::default();
        assert!(matches!(
            trace_z(&lattice, &p, &[2.5]),
            Err(EngineError::OutOfRange { .. })
        ));
    }

    #[test]
    fn ensemble_tracking_matches_single_particle_tracking() {
        let lattice = Lattice::new(vec![
            Element::quadrupole("qf", 0.4, 1.2),
            Element::drift("d1", 1.0),
            Element::thin_sextupole("sx", 5.0),
            Element::drift("d2", 1.0),
        ])
        .unwrap();
        let particles = vec![
            Particle {
                x: 1e-3,
                y: -1e-3,
                energy: 1.0,
                ..Default::default()
            },
            Particle {
                x: -2e-3,
                px: 1e-4,
                energy: 1.0,
                ..Default::default()
            },
        ];
        let mut array = ParticleArray::from_particles(&particles).unwrap();
        track_particle_array(&lattice, &mut array, MapOrder::First).unwrap();

        let mut navigator = Navigator::default();
        let steps =
            segment_maps(&lattice, lattice.total_len(), &mut navigator, MapOrder::First).unwrap();
        for (tracked, original) in array.to_particles().iter().zip(particles.iter()) {
            let mut expected = *original;
            for step in &steps {
                expected = step.apply_particle(&expected).unwrap();
            }
            assert!((tracked.x - expected.x).abs() < 1e-9);
            assert!((tracked.px - expected.px).abs() < 1e-9);
            assert!((tracked.y - expected.y).abs() < 1e-9);
        }
        assert!((array.s - lattice.total_len()).abs() < TOLERANCE);
    }
}
