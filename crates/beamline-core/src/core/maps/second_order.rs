use nalgebra::{Matrix6, Vector6};

use super::matrices::tilt_rotation;
use crate::core::models::element::EdgeSide;

/// Dense second-order map coefficients `T[i][j][k]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SecondOrderTensor(pub [[[f64; 6]; 6]; 6]);

impl Default for SecondOrderTensor {
    fn default() -> Self {
        Self([[[0.0; 6]; 6]; 6])
    }
}

impl SecondOrderTensor {
    pub fn is_zero(&self) -> bool {
        self.0
            .iter()
            .flatten()
            .flatten()
            .all(|&v| v == 0.0)
    }

    /// Thin-sextupole coefficients for an integrated strength `ms`.
    pub fn thin_sextupole(ms: f64) -> Self {
        let mut t = Self::default();
        t.0[1][0][0] = -ms / 2.0;
        t.0[1][2][2] = ms / 2.0;
        t.0[3][0][2] = ms;
        t
    }
}

fn shift_rotate_in(coords: &mut [f64], dx: f64, dy: f64, tilt: f64) {
    let rot = tilt_rotation(tilt);
    for chunk in coords.chunks_exact_mut(6) {
        let v = Vector6::new(
            chunk[0] - dx,
            chunk[1],
            chunk[2] - dy,
            chunk[3],
            chunk[4],
            chunk[5],
        );
        let r = rot * v;
        chunk.copy_from_slice(r.as_slice());
    }
}

fn rotate_shift_out(coords: &mut [f64], dx: f64, dy: f64, tilt: f64) {
    let rot = tilt_rotation(-tilt);
    for chunk in coords.chunks_exact_mut(6) {
        let v = Vector6::from_column_slice(chunk);
        let r = rot * v;
        chunk.copy_from_slice(r.as_slice());
        chunk[0] += dx;
        chunk[2] += dy;
    }
}

/// Applies a linear matrix plus second-order tensor to a flat coordinate
/// buffer, with the misalignment shift-rotate transforms on entry and exit.
///
/// The quadratic terms are evaluated from the pre-map coordinates; the
/// component set is the physically populated one (transverse-coupled and
/// chromatic monomials), so a zero tensor reduces exactly to the linear map.
pub fn apply_second_order(
    r: &Matrix6<f64>,
    t: &SecondOrderTensor,
    coords: &mut [f64],
    dx: f64,
    dy: f64,
    tilt: f64,
) {
    let misaligned = dx != 0.0 || dy != 0.0 || tilt != 0.0;
    if misaligned {
        shift_rotate_in(coords, dx, dy, tilt);
    }
    let t = &t.0;
    for chunk in coords.chunks_exact_mut(6) {
        let (x, px, y, py, _tau, dp) = (chunk[0], chunk[1], chunk[2], chunk[3], chunk[4], chunk[5]);
        let lin = r * Vector6::from_column_slice(chunk);

        let x2 = x * x;
        let xpx = x * px;
        let px2 = px * px;
        let py2 = py * py;
        let ypy = y * py;
        let y2 = y * y;
        let dp2 = dp * dp;
        let xdp = x * dp;
        let pxdp = px * dp;
        let xy = x * y;
        let xpy = x * py;
        let ypx = px * y;
        let pxpy = px * py;
        let ydp = y * dp;
        let pydp = py * dp;

        let horizontal = |row: &[[f64; 6]; 6]| {
            row[0][0] * x2
                + row[0][1] * xpx
                + row[0][5] * xdp
                + row[1][1] * px2
                + row[1][5] * pxdp
                + row[5][5] * dp2
                + row[2][2] * y2
                + row[2][3] * ypy
                + row[3][3] * py2
        };
        let vertical = |row: &[[f64; 6]; 6]| {
            row[0][2] * xy
                + row[0][3] * xpy
                + row[1][2] * ypx
                + row[1][3] * pxpy
                + row[2][5] * ydp
                + row[3][5] * pydp
        };

        chunk[0] = lin[0] + horizontal(&t[0]);
        chunk[1] = lin[1] + horizontal(&t[1]);
        chunk[2] = lin[2] + vertical(&t[2]);
        chunk[3] = lin[3] + vertical(&t[3]);
        chunk[4] = lin[4] + horizontal(&t[4]);
        chunk[5] = lin[5];
    }
    if misaligned {
        rotate_shift_out(coords, dx, dy, tilt);
    }
}

/// Pole-face focusing of a bend edge: linear matrix and second-order tensor.
///
/// The linear part carries the classic wedge focusing `h*tan(e)` in the bend
/// plane and the fringe-corrected `-h*tan(e - psi)` vertically, with
/// `psi = fint*h*gap*sec(e)*(1 + sin(e)^2)`. The quadratic part combines the
/// geometric wedge terms with the thin-sextupole equivalent of a curved pole
/// face (`h_pole*sec(e)^3`); the wedge terms change orientation between the
/// entrance and exit faces.
pub fn fringe_map(
    h: f64,
    k1: f64,
    edge: f64,
    h_pole: f64,
    gap: f64,
    fint: f64,
    side: EdgeSide,
) -> (Matrix6<f64>, SecondOrderTensor) {
    let tan_e = edge.tan();
    let sec_e = 1.0 / edge.cos();
    let psi = fint * h * gap * sec_e * (1.0 + edge.sin().powi(2));

    let mut r = Matrix6::identity();
    r[(1, 0)] = h * tan_e;
    r[(3, 2)] = -h * (edge - psi).tan();

    let sign = match side {
        EdgeSide::Entrance => 1.0,
        EdgeSide::Exit => -1.0,
    };
    let ms_face = sign * h_pole * sec_e.powi(3);
    let mut t = SecondOrderTensor::thin_sextupole(ms_face);
    t.0[1][0][0] += sign * k1 * tan_e;
    t.0[1][2][2] -= sign * k1 * tan_e;
    t.0[0][0][0] = sign * (-h / 2.0) * tan_e * tan_e;
    t.0[0][2][2] = sign * (h / 2.0) * sec_e * sec_e;
    t.0[1][0][1] = sign * h * tan_e * tan_e;
    t.0[2][0][2] = sign * h * tan_e * tan_e;
    (r, t)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-12;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn zero_tensor_reduces_to_the_linear_map() {
        let mut r = Matrix6::identity();
        r[(0, 1)] = 2.0;
        r[(2, 3)] = 2.0;
        let t = SecondOrderTensor::default();
        let mut coords = [1e-3, 2e-3, -1e-3, 5e-4, 0.0, 1e-3];
        apply_second_order(&r, &t, &mut coords, 0.0, 0.0, 0.0);
        assert!(f64_approx_equal(coords[0], 1e-3 + 2.0 * 2e-3));
        assert!(f64_approx_equal(coords[1], 2e-3));
        assert!(f64_approx_equal(coords[2], -1e-3 + 2.0 * 5e-4));
    }

    #[test]
    fn identity_map_with_misalignment_is_a_round_trip() {
        let r = Matrix6::identity();
        let t = SecondOrderTensor::default();
        let original = [1e-3, -2e-4, 4e-4, 3e-5, 1e-6, 2e-3];
        let mut coords = original;
        apply_second_order(&r, &t, &mut coords, 1e-3, -5e-4, 0.2);
        for (a, b) in coords.iter().zip(original.iter()) {
            assert!(f64_approx_equal(*a, *b));
        }
    }

    #[test]
    fn thin_sextupole_tensor_matches_the_kick_form() {
        let ms = 30.0;
        let t = SecondOrderTensor::thin_sextupole(ms);
        let r = Matrix6::identity();
        let (x, y) = (2e-3, -1e-3);
        let mut coords = [x, 0.0, y, 0.0, 0.0, 0.0];
        apply_second_order(&r, &t, &mut coords, 0.0, 0.0, 0.0);
        assert!(f64_approx_equal(coords[1], -ms / 2.0 * (x * x - y * y)));
        assert!(f64_approx_equal(coords[3], ms * x * y));
        assert!(f64_approx_equal(coords[0], x));
    }

    #[test]
    fn entrance_fringe_focuses_in_the_bend_plane() {
        let (r, _) = fringe_map(0.1, 0.0, 0.05, 0.0, 0.0, 0.0, EdgeSide::Entrance);
        assert!(f64_approx_equal(r[(1, 0)], 0.1 * 0.05f64.tan()));
        assert!(f64_approx_equal(r[(3, 2)], -0.1 * 0.05f64.tan()));
    }

    #[test]
    fn fringe_integral_weakens_vertical_edge_focusing() {
        let h = 0.1;
        let e = 0.05;
        let (bare, _) = fringe_map(h, 0.0, e, 0.0, 0.0, 0.0, EdgeSide::Exit);
        let (corrected, _) = fringe_map(h, 0.0, e, 0.0, 0.02, 0.5, EdgeSide::Exit);
        assert!(corrected[(3, 2)] > bare[(3, 2)]);
        assert!(f64_approx_equal(corrected[(1, 0)], bare[(1, 0)]));
    }

    #[test]
    fn exit_face_flips_the_wedge_tensor_orientation() {
        let (_, ent) = fringe_map(0.1, 0.0, 0.05, 0.1, 0.0, 0.0, EdgeSide::Entrance);
        let (_, ext) = fringe_map(0.1, 0.0, 0.05, 0.1, 0.0, 0.0, EdgeSide::Exit);
        assert!(f64_approx_equal(ent.0[0][0][0], -ext.0[0][0][0]));
        assert!(f64_approx_equal(ent.0[3][0][2], -ext.0[3][0][2]));
    }
}
