use nalgebra::{Matrix2, Matrix6, Vector2};
use tracing::debug;

use super::error::EngineError;
use crate::core::models::twiss::Twiss;

/// Derives the matched (periodic) Twiss parameters from a one-turn matrix.
///
/// Returns `Ok(None)` when no periodic solution exists: either the motion is
/// unstable (`|cos mu| >= 1` in a plane) or a plane is exactly degenerate
/// (`R01 = 0` or `R23 = 0`), where the sign of `sin mu` is undefined.
/// Callers such as matching loops treat `None` as a penalty, not a fatal
/// error. A singular dispersion system is a design-time failure and is
/// reported as an error instead of propagating non-finite values.
pub fn periodic_twiss(r: &Matrix6<f64>, energy: f64) -> Result<Option<Twiss>, EngineError> {
    let cos_mux = (r[(0, 0)] + r[(1, 1)]) / 2.0;
    let cos_muy = (r[(2, 2)] + r[(3, 3)]) / 2.0;
    if cos_mux.abs() >= 1.0 || cos_muy.abs() >= 1.0 {
        debug!(cos_mux, cos_muy, "one-turn matrix is unstable");
        return Ok(None);
    }
    if r[(0, 1)] == 0.0 || r[(2, 3)] == 0.0 {
        debug!("degenerate decoupled plane: sign of sin(mu) is undefined");
        return Ok(None);
    }
    let sin_mux = r[(0, 1)].signum() * (1.0 - cos_mux * cos_mux).sqrt();
    let sin_muy = r[(2, 3)].signum() * (1.0 - cos_muy * cos_muy).sqrt();

    let mut tws = Twiss {
        energy,
        ..Default::default()
    };
    tws.beta_x = (r[(0, 1)] / sin_mux).abs();
    tws.beta_y = (r[(2, 3)] / sin_muy).abs();
    tws.alpha_x = (r[(0, 0)] - r[(1, 1)]) / (2.0 * sin_mux);
    tws.alpha_y = (r[(2, 2)] - r[(3, 3)]) / (2.0 * sin_muy);
    tws.gamma_x = (1.0 + tws.alpha_x * tws.alpha_x) / tws.beta_x;
    tws.gamma_y = (1.0 + tws.alpha_y * tws.alpha_y) / tws.beta_y;

    let (dx, dxp) = periodic_dispersion(r, 0, 'x')?;
    let (dy, dyp) = periodic_dispersion(r, 2, 'y')?;
    tws.dx = dx;
    tws.dxp = dxp;
    tws.dy = dy;
    tws.dyp = dyp;
    Ok(Some(tws))
}

/// Solves `(I - R_block) * D = R_col` for the periodic dispersion of one
/// transverse plane.
fn periodic_dispersion(
    r: &Matrix6<f64>,
    offset: usize,
    plane: char,
) -> Result<(f64, f64), EngineError> {
    let block = Matrix2::new(
        1.0 - r[(offset, offset)],
        -r[(offset, offset + 1)],
        -r[(offset + 1, offset)],
        1.0 - r[(offset + 1, offset + 1)],
    );
    let inverse = block
        .try_inverse()
        .ok_or(EngineError::SingularDispersion { plane })?;
    let d = inverse * Vector2::new(r[(offset, 5)], r[(offset + 1, 5)]);
    Ok((d[0], d[1]))
}
