use super::second_order::fringe_map;
use super::transfer::{KickStrength, MapError, MapKind, TransferMap};
use crate::core::models::element::{Element, ElementKind, UndulatorSolver};

/// Builds the transfer map of a single element.
///
/// This is a pure function of the descriptor: rebuilding after a strength
/// change is an explicit reconstruction, and the descriptor is never
/// mutated. Unknown element kinds are rejected immediately, since continuing
/// would silently produce wrong transport.
pub fn transfer_map(element: &Element) -> Result<TransferMap, MapError> {
    let length = element.length;
    let kind = match &element.kind {
        ElementKind::Drift | ElementKind::Monitor | ElementKind::Marker => {
            MapKind::Uniform { k1: 0.0, hx: 0.0 }
        }
        ElementKind::Quadrupole { k1 } => MapKind::Uniform { k1: *k1, hx: 0.0 },
        ElementKind::Bend { k1, .. } => MapKind::Uniform {
            k1: *k1,
            hx: element.curvature(),
        },
        ElementKind::Edge {
            h,
            angle,
            k1,
            gap,
            fint,
            h_pole,
            side,
        } => {
            let (r, t) = fringe_map(*h, *k1, *angle, *h_pole, *gap, *fint, *side);
            MapKind::Edge { r, t: Box::new(t) }
        }
        ElementKind::Sextupole { k2, integrated } => MapKind::Sextupole {
            strength: if length == 0.0 {
                KickStrength::Integrated(integrated.unwrap_or(0.0))
            } else {
                KickStrength::PerLength(*k2)
            },
        },
        ElementKind::Octupole { k3, integrated } => MapKind::Octupole {
            strength: if length == 0.0 {
                KickStrength::Integrated(integrated.unwrap_or(0.0))
            } else {
                KickStrength::PerLength(*k3)
            },
        },
        ElementKind::Multipole { kn } => MapKind::Multipole { kn: kn.clone() },
        ElementKind::HCorrector { angle } => MapKind::Corrector {
            angle_x: *angle,
            angle_y: 0.0,
            full_length: length,
        },
        ElementKind::VCorrector { angle } => MapKind::Corrector {
            angle_x: 0.0,
            angle_y: *angle,
            full_length: length,
        },
        ElementKind::Cavity {
            voltage,
            frequency,
            phase,
        } => {
            if length <= 0.0 {
                return Err(MapError::InvalidElement {
                    label: element.label.clone(),
                    reason: "cavity length must be positive",
                });
            }
            MapKind::Cavity {
                voltage: *voltage,
                frequency: *frequency,
                phase: *phase,
                full_length: length,
            }
        }
        ElementKind::Solenoid { k } => MapKind::Solenoid { k: *k },
        ElementKind::Undulator {
            lperiod,
            kx,
            ax,
            solver,
            ..
        } => match solver {
            UndulatorSolver::Harmonic => MapKind::UndulatorHarmonic {
                lperiod: *lperiod,
                kx: *kx,
            },
            UndulatorSolver::Symplectic => {
                if *lperiod <= 0.0 {
                    return Err(MapError::InvalidElement {
                        label: element.label.clone(),
                        reason: "undulator period must be positive",
                    });
                }
                let kz = 2.0 * std::f64::consts::PI / lperiod;
                let kx_rolloff = if *ax <= 0.0 {
                    0.0
                } else {
                    2.0 * std::f64::consts::PI / ax
                };
                MapKind::UndulatorKick {
                    kz,
                    kx: kx_rolloff,
                    k_peak: *kx,
                }
            }
        },
        ElementKind::Matrix { r } => MapKind::Fixed {
            r: *r,
            full_length: length,
        },
        ElementKind::Undefined => {
            return Err(MapError::UnknownElement {
                label: element.label.clone(),
            });
        }
    };
    Ok(TransferMap::new(length, element.alignment, kind))
}
