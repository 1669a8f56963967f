use tracing::{info, instrument};

use super::tracking::{lattice_transfer_map, trace_z, track};
use crate::core::models::lattice::Lattice;
use crate::core::models::twiss::Twiss;
use crate::engine::error::EngineError;
use crate::engine::periodic::periodic_twiss;

/// Propagates Twiss optics along the whole lattice.
///
/// With no initial optics (or unset beta functions), the matched periodic
/// solution of the one-turn matrix is used as the starting point; a lattice
/// without one is reported as [`EngineError::NoPeriodicSolution`]. With
/// `n_points = None` the result holds one snapshot per element boundary;
/// otherwise `n` equidistant samples over the full length.
#[instrument(skip_all, name = "twiss")]
pub fn twiss(
    lattice: &Lattice,
    initial: Option<Twiss>,
    n_points: Option<usize>,
) -> Result<Vec<Twiss>, EngineError> {
    let mut tws0 = initial.unwrap_or_default();
    if tws0.beta_x == 0.0 || tws0.beta_y == 0.0 {
        let r = lattice_transfer_map(lattice, tws0.energy);
        let matched = periodic_twiss(&r, tws0.energy)?.ok_or(EngineError::NoPeriodicSolution)?;
        info!(
            beta_x = matched.beta_x,
            beta_y = matched.beta_y,
            "derived matched initial optics from the one-turn matrix"
        );
        tws0 = Twiss { s: tws0.s, ..matched };
    } else {
        tws0.normalize_gammas();
    }

    match n_points {
        None => track(lattice, &tws0, None),
        Some(0) => Ok(Vec::new()),
        Some(1) => trace_z(lattice, &tws0, &[0.0]),
        Some(n) => {
            let total = lattice.total_len();
            let positions: Vec<f64> = (0..n)
                .map(|i| total * i as f64 / (n - 1) as f64)
                .collect();
            trace_z(lattice, &tws0, &positions)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::element::Element;

    fn fodo_cell() -> Lattice {
        Lattice::new(vec![
            Element::quadrupole("qf", 0.4, 1.2),
            Element::drift("d1", 1.0),
            Element::quadrupole("qd", 0.4, -1.2),
            Element::drift("d2", 1.0),
        ])
        .unwrap()
    }

    #[test]
    fn given_initial_optics_are_propagated_per_element() {
        let lattice = fodo_cell();
        let initial = Twiss {
            beta_x: 12.0,
            beta_y: 5.0,
            ..Default::default()
        };
        let optics = twiss(&lattice, Some(initial), None).unwrap();
        assert_eq!(optics.len(), 5);
        assert!((optics[0].beta_x - 12.0).abs() < 1e-12);
        assert!((optics[4].s - lattice.total_len()).abs() < 1e-12);
        // the initial gammas were normalized before propagation
        assert!((optics[0].gamma_x - 1.0 / 12.0).abs() < 1e-12);
    }

    #[test]
    fn missing_initial_optics_fall_back_to_the_matched_solution() {
        let lattice = fodo_cell();
        let optics = twiss(&lattice, None, None).unwrap();
        let first = optics.first().unwrap();
        let last = optics.last().unwrap();
        assert!((first.beta_x - last.beta_x).abs() < 1e-8);
        assert!((first.alpha_x - last.alpha_x).abs() < 1e-8);
        assert!(last.mux > 0.0);
    }

    #[test]
    fn unstable_lattices_report_no_periodic_solution() {
        let lattice = Lattice::new(vec![Element::drift("d1", 2.0)]).unwrap();
        assert!(matches!(
            twiss(&lattice, None, None),
            Err(EngineError::NoPeriodicSolution)
        ));
    }

    #[test]
    fn equidistant_sampling_covers_the_full_length() {
        let lattice = fodo_cell();
        let initial = Twiss {
            beta_x: 12.0,
            beta_y: 5.0,
            ..Default::default()
        };
        let optics = twiss(&lattice, Some(initial), Some(5)).unwrap();
        assert_eq!(optics.len(), 5);
        assert!((optics[0].s - 0.0).abs() < 1e-12);
        assert!((optics[2].s - lattice.total_len() / 2.0).abs() < 1e-12);
        assert!((optics[4].s - lattice.total_len()).abs() < 1e-12);
    }
}
