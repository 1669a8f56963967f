use nalgebra::Complex;

use super::transfer::MapError;
use crate::core::constants::{ELECTRON_MASS_GEV, SPEED_OF_LIGHT};

/// Kick-drift sextupole map over length `z` with integrated strength `ms`.
///
/// Half drift, impulse kick, half drift; the kick acts at the
/// misalignment-shifted coordinates.
pub fn sextupole(coords: &mut [f64], z: f64, ms: f64, dx: f64, dy: f64) {
    let z1 = z / 2.0;
    for chunk in coords.chunks_exact_mut(6) {
        let x = chunk[0] + chunk[1] * z1 - dx;
        let y = chunk[2] + chunk[3] * z1 - dy;
        chunk[1] += -ms / 2.0 * (x * x - y * y);
        chunk[3] += ms * x * y;
        chunk[0] = x + chunk[1] * z1 + dx;
        chunk[2] = y + chunk[3] * z1 + dy;
    }
}

/// Kick-drift octupole map over length `z` with integrated strength `moct`.
pub fn octupole(coords: &mut [f64], z: f64, moct: f64, dx: f64, dy: f64) {
    let z1 = z / 2.0;
    for chunk in coords.chunks_exact_mut(6) {
        let x = chunk[0] + chunk[1] * z1 - dx;
        let y = chunk[2] + chunk[3] * z1 - dy;
        chunk[1] += -moct / 2.0 * (x * x * x - 3.0 * y * y * x);
        chunk[3] += moct * (3.0 * y * x * x - y * y * y);
        chunk[0] = x + chunk[1] * z1 + dx;
        chunk[2] = y + chunk[3] * z1 + dy;
    }
}

/// Thin-multipole kick in the complex plane: `p = -kn[0]*dp + sum_n
/// kn[n]*(x + iy)^n / n!`, with the dipole term also advancing the path
/// length.
pub fn multipole(coords: &mut [f64], kn: &[f64]) {
    let k0 = kn.first().copied().unwrap_or(0.0);
    for chunk in coords.chunks_exact_mut(6) {
        let mut p = Complex::new(-k0 * chunk[5], 0.0);
        let pos = Complex::new(chunk[0], chunk[2]);
        let mut power = Complex::new(1.0, 0.0);
        let mut factorial = 1.0;
        for (n, &k) in kn.iter().enumerate().skip(1) {
            power *= pos;
            factorial *= n as f64;
            p += power.scale(k / factorial);
        }
        chunk[1] -= p.re;
        chunk[3] += p.im;
        chunk[4] += k0 * chunk[0];
    }
}

/// Longitudinal RF update: `dp' = (dp*E + V*cos(k*tau + phi) - dE) / (E + dE)`
/// with `dE = V*cos(phi)`.
///
/// Fails when the final reference energy would be non-positive.
pub fn cavity(
    coords: &mut [f64],
    energy: f64,
    voltage: f64,
    frequency: f64,
    phi: f64,
) -> Result<(), MapError> {
    let delta_e = voltage * phi.cos();
    let final_energy = energy + delta_e;
    if final_energy <= 0.0 {
        return Err(MapError::NonPhysicalEnergy {
            energy: final_energy,
        });
    }
    let k = 2.0 * std::f64::consts::PI * frequency / SPEED_OF_LIGHT;
    for chunk in coords.chunks_exact_mut(6) {
        chunk[5] =
            (chunk[5] * energy + voltage * (chunk[4] * k + phi).cos() - delta_e) / final_energy;
    }
    Ok(())
}

/// Symplectic undulator field integrator over length `z`.
///
/// Subdivides the length into `floor(10*z) + 2` nodes and applies the
/// hyperbolic field kicks of a planar device with longitudinal wave number
/// `kz`, transverse roll-off `kx`, and peak parameter `k_peak`.
pub fn undulator(coords: &mut [f64], z: f64, kz: f64, kx: f64, k_peak: f64, energy: f64) {
    let ndiv = (z * 10.0) as usize + 2;
    let step = z / (ndiv as f64 - 1.0);
    let kx2 = kx * kx;
    let kz2 = kz * kz;
    let ky2 = kz2 + kx2;
    let ky = ky2.sqrt();
    let gamma = energy / ELECTRON_MASS_GEV;
    let h0 = if gamma != 0.0 {
        k_peak * kz / gamma
    } else {
        0.0
    };
    let h02 = h0 * h0;
    for chunk in coords.chunks_exact_mut(6) {
        let h = step / (1.0 + chunk[5]);
        for _ in 0..ndiv - 1 {
            let chx = (kx * chunk[0]).cosh();
            let chy = (ky * chunk[2]).cosh();
            let shx = (kx * chunk[0]).sinh();
            let shy = (ky * chunk[2]).sinh();
            chunk[1] -=
                h / 2.0 * chx * shx * (kx * ky2 * chy * chy + kx2 * kx * shy * shy) / (ky2 * kz2)
                    * h02;
            chunk[3] -= h / 2.0 * chy * shy * (ky2 * chx * chx + kx2 * shx * shx) / (ky * kz2) * h02;
            chunk[4] -= h / 2.0 / (1.0 + chunk[5])
                * ((chunk[1] * chunk[1] + chunk[3] * chunk[3])
                    + chx * chx * chy * chy / (2.0 * kz2) * h02
                    + shx * shx * shy * shy * kx2 / (2.0 * ky2 * kz2) * h02);
            chunk[0] += h * chunk[1];
            chunk[2] += h * chunk[3];
        }
    }
}
