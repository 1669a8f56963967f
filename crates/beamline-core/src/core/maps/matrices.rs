use nalgebra::{Complex, Matrix6, Vector6};

use crate::core::constants::ELECTRON_MASS_GEV;

/// Rotation of the transverse planes around the beam axis.
pub fn tilt_rotation(angle: f64) -> Matrix6<f64> {
    let cs = angle.cos();
    let sn = angle.sin();
    let mut m = Matrix6::identity();
    m[(0, 0)] = cs;
    m[(0, 2)] = sn;
    m[(1, 1)] = cs;
    m[(1, 3)] = sn;
    m[(2, 0)] = -sn;
    m[(2, 2)] = cs;
    m[(3, 1)] = -sn;
    m[(3, 3)] = cs;
    m
}

/// Body matrix of an element with uniform focusing `k1` and curvature `hx`
/// over length `z`.
///
/// The natural frequencies `kx^2 = k1 + hx^2` and `ky^2 = -k1` may be
/// negative; the complex square root with the real part of the resulting
/// circular functions covers the focusing and defocusing regimes uniformly.
/// The `kx = 0` and `ky = 0` limits are substituted directly.
pub fn uniform_matrix(z: f64, k1: f64, hx: f64, energy: f64) -> Matrix6<f64> {
    let gamma = energy / ELECTRON_MASS_GEV;
    let kx2 = k1 + hx * hx;
    let ky2 = -k1;
    let kx = Complex::new(kx2, 0.0).sqrt();
    let ky = Complex::new(ky2, 0.0).sqrt();
    let cx = kx.scale(z).cos().re;
    let cy = ky.scale(z).cos().re;
    let sy = if ky2 != 0.0 {
        (ky.scale(z).sin() / ky).re
    } else {
        z
    };
    let (sx, dx, mut r56) = if kx2 != 0.0 {
        let sx = (kx.scale(z).sin() / kx).re;
        (
            sx,
            hx / kx2 * (1.0 - cx),
            hx * hx * (z - sx) / kx2,
        )
    } else {
        (z, z * z * hx / 2.0, hx * hx * z.powi(3) / 6.0)
    };
    if gamma != 0.0 {
        let gamma2 = gamma * gamma;
        let beta = 1.0 - 0.5 / gamma2;
        r56 -= z / (beta * beta * gamma2);
    }
    let mut m = Matrix6::identity();
    m[(0, 0)] = cx;
    m[(0, 1)] = sx;
    m[(0, 5)] = dx;
    m[(1, 0)] = -kx2 * sx;
    m[(1, 1)] = cx;
    m[(1, 5)] = sx * hx;
    m[(2, 2)] = cy;
    m[(2, 3)] = sy;
    m[(3, 2)] = -ky2 * sy;
    m[(3, 3)] = cy;
    m[(4, 0)] = hx * sx;
    m[(4, 1)] = dx;
    m[(4, 5)] = r56;
    m
}

/// Rotation-coupled solenoid matrix after K. Brown and A. Chao.
///
/// `k = B0 / (2 * Brho)` where `B0` is the field inside the solenoid.
pub fn solenoid_matrix(z: f64, k: f64, energy: f64) -> Matrix6<f64> {
    let gamma = energy / ELECTRON_MASS_GEV;
    let c = (z * k).cos();
    let s = (z * k).sin();
    let s_k = if k == 0.0 { z } else { s / k };
    let r56 = if gamma != 0.0 {
        z / (gamma * gamma)
    } else {
        0.0
    };
    let mut m = Matrix6::identity();
    m[(0, 0)] = c * c;
    m[(0, 1)] = c * s_k;
    m[(0, 2)] = s * c;
    m[(0, 3)] = s * s_k;
    m[(1, 0)] = -k * s * c;
    m[(1, 1)] = c * c;
    m[(1, 2)] = -k * s * s;
    m[(1, 3)] = s * c;
    m[(2, 0)] = -s * c;
    m[(2, 1)] = -s * s_k;
    m[(2, 2)] = c * c;
    m[(2, 3)] = c * s_k;
    m[(3, 0)] = k * s * s;
    m[(3, 1)] = -s * c;
    m[(3, 2)] = -k * s * c;
    m[(3, 3)] = c * c;
    m[(4, 5)] = r56;
    m
}

/// Accelerating-cavity matrix for the pi-standing-wave model.
///
/// `v` is the voltage seen over the length `z`; the transverse blocks carry
/// the RF focusing and adiabatic damping, the longitudinal block the
/// velocity-dependent path-length term. Requires a positive initial energy
/// when the net energy gain is nonzero.
pub fn cavity_matrix(z: f64, v: f64, energy: f64, phi: f64) -> Matrix6<f64> {
    let de = v * phi.cos();
    let gamma = (energy + 0.5 * de) / ELECTRON_MASS_GEV;
    let ep = de / z;
    let ei = energy;
    let ef = energy + de;
    let cphi = phi.cos();
    let alpha = (1.0f64 / 8.0).sqrt() / cphi * (ef / ei).ln();
    let sqrt2 = 2.0f64.sqrt();
    let r11 = alpha.cos() - sqrt2 * cphi * alpha.sin();
    let r12 = if ep.abs() > 1e-10 {
        8.0f64.sqrt() * ei / ep * cphi * alpha.sin()
    } else {
        z
    };
    let r21 = -ep / ef * (cphi / sqrt2 + (1.0f64 / 8.0).sqrt() / cphi) * alpha.sin();
    let r22 = ei / ef * (alpha.cos() + sqrt2 * cphi * alpha.sin());
    let r56 = if gamma != 0.0 {
        let gamma2 = gamma * gamma;
        let beta = 1.0 - 0.5 / gamma2;
        -z / (beta * beta * gamma2)
    } else {
        0.0
    };
    let mut m = Matrix6::identity();
    m[(0, 0)] = r11;
    m[(0, 1)] = r12;
    m[(1, 0)] = r21;
    m[(1, 1)] = r22;
    m[(2, 2)] = r11;
    m[(2, 3)] = r12;
    m[(3, 2)] = r21;
    m[(3, 3)] = r22;
    m[(4, 5)] = r56;
    m
}

/// Harmonic undulator matrix: free horizontal drift plus natural vertical
/// focusing for a planar device.
pub fn undulator_matrix(z: f64, lperiod: f64, kx: f64, energy: f64) -> Matrix6<f64> {
    let gamma = energy / ELECTRON_MASS_GEV;
    let mut m = Matrix6::identity();
    m[(0, 1)] = z;
    if gamma != 0.0 && lperiod != 0.0 && kx != 0.0 {
        let beta = 1.0 / (1.0 - 1.0 / (gamma * gamma)).sqrt();
        let omega = 2.0f64.sqrt() * std::f64::consts::PI * kx / (lperiod * gamma * beta);
        m[(2, 2)] = (omega * z).cos();
        m[(2, 3)] = (omega * z).sin() / omega;
        m[(3, 2)] = -(omega * z).sin() * omega;
        m[(3, 3)] = (omega * z).cos();
    } else {
        m[(2, 3)] = z;
    }
    m
}

/// Steering-corrector kick vector at sub-length `z`.
///
/// A zero-length corrector degenerates to a pure delta kick of the full
/// angles.
pub fn corrector_kick(z: f64, full_length: f64, angle_x: f64, angle_y: f64) -> Vector6<f64> {
    if full_length == 0.0 {
        return Vector6::new(0.0, angle_x, 0.0, angle_y, 0.0, 0.0);
    }
    let hx = angle_x / full_length;
    let hy = angle_y / full_length;
    Vector6::new(
        hx * z * z / 2.0,
        hx * z,
        hy * z * z / 2.0,
        hy * z,
        0.0,
        0.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-12;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn drift_matrix_is_identity_plus_path_terms() {
        let m = uniform_matrix(2.0, 0.0, 0.0, 0.0);
        assert!(f64_approx_equal(m[(0, 0)], 1.0));
        assert!(f64_approx_equal(m[(0, 1)], 2.0));
        assert!(f64_approx_equal(m[(2, 3)], 2.0));
        assert!(f64_approx_equal(m[(1, 0)], 0.0));
        assert!(f64_approx_equal(m[(4, 5)], 0.0));
        assert!(f64_approx_equal(m[(5, 5)], 1.0));
    }

    #[test]
    fn focusing_quadrupole_matches_trigonometric_form() {
        let k1: f64 = 1.44;
        let z = 0.5;
        let kx = k1.sqrt();
        let m = uniform_matrix(z, k1, 0.0, 0.0);
        assert!(f64_approx_equal(m[(0, 0)], (kx * z).cos()));
        assert!(f64_approx_equal(m[(0, 1)], (kx * z).sin() / kx));
        assert!(f64_approx_equal(m[(1, 0)], -kx * (kx * z).sin()));
        // defocusing plane goes hyperbolic
        assert!(f64_approx_equal(m[(2, 2)], (kx * z).cosh()));
        assert!(f64_approx_equal(m[(2, 3)], (kx * z).sinh() / kx));
        assert!(f64_approx_equal(m[(3, 2)], kx * (kx * z).sinh()));
    }

    #[test]
    fn defocusing_quadrupole_matches_hyperbolic_form() {
        let k1: f64 = -0.81;
        let z = 0.4;
        let kx = (-k1).sqrt();
        let m = uniform_matrix(z, k1, 0.0, 0.0);
        assert!(f64_approx_equal(m[(0, 0)], (kx * z).cosh()));
        assert!(f64_approx_equal(m[(0, 1)], (kx * z).sinh() / kx));
        assert!(f64_approx_equal(m[(2, 2)], (kx * z).cos()));
    }

    #[test]
    fn sector_bend_dispersion_matches_closed_form() {
        let z = 1.5;
        let hx = 0.2;
        let m = uniform_matrix(z, 0.0, hx, 0.0);
        let kx = hx;
        let cx = (kx * z).cos();
        let sx = (kx * z).sin() / kx;
        assert!(f64_approx_equal(m[(0, 0)], cx));
        assert!(f64_approx_equal(m[(0, 5)], hx / (kx * kx) * (1.0 - cx)));
        assert!(f64_approx_equal(m[(1, 5)], sx * hx));
        assert!(f64_approx_equal(m[(4, 0)], hx * sx));
    }

    #[test]
    fn zero_curvature_limit_is_substituted_without_division() {
        let m = uniform_matrix(1.0, 0.0, 0.0, 0.0);
        assert!(f64_approx_equal(m[(0, 5)], 0.0));
        assert!(f64_approx_equal(m[(4, 0)], 0.0));
        assert!(f64_approx_equal(m[(4, 5)], 0.0));
        assert!(m.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn tilt_rotations_compose_to_identity() {
        let r = tilt_rotation(0.3) * tilt_rotation(-0.3);
        let i = Matrix6::<f64>::identity();
        for row in 0..6 {
            for col in 0..6 {
                assert!(f64_approx_equal(r[(row, col)], i[(row, col)]));
            }
        }
    }

    #[test]
    fn solenoid_with_zero_strength_is_a_transverse_drift() {
        let m = solenoid_matrix(1.2, 0.0, 0.0);
        assert!(f64_approx_equal(m[(0, 1)], 1.2));
        assert!(f64_approx_equal(m[(2, 3)], 1.2));
        assert!(f64_approx_equal(m[(0, 2)], 0.0));
    }

    #[test]
    fn cavity_matrix_damps_the_transverse_planes() {
        let m = cavity_matrix(1.0, 0.01, 1.0, 0.0);
        // determinant of the 2x2 block shrinks by Ei/Ef under acceleration
        let det = m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)];
        assert!((det - 1.0 / 1.01).abs() < 1e-9);
    }

    #[test]
    fn thin_corrector_kicks_the_full_angle() {
        let b = corrector_kick(0.0, 0.0, 1e-3, -2e-3);
        assert_eq!(b[1], 1e-3);
        assert_eq!(b[3], -2e-3);
        assert_eq!(b[0], 0.0);
    }

    #[test]
    fn thick_corrector_accumulates_offset_quadratically() {
        let b = corrector_kick(0.5, 1.0, 2e-3, 0.0);
        assert!(f64_approx_equal(b[1], 1e-3));
        assert!(f64_approx_equal(b[0], 2.5e-4));
    }
}
