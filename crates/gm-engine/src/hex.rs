//! Trilinear hexahedron shape functions.

use gm_core::Real;
use nalgebra::{Matrix3, Point3, Vector3};

/// Natural coordinates of the eight corners, in local node order.
const NATURAL_CORNERS: [[Real; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
];

/// Derivatives of the eight shape functions with respect to (ξ, η, ζ).
fn shape_derivatives(xi: [Real; 3]) -> [Vector3<Real>; 8] {
    NATURAL_CORNERS.map(|[a, b, c]| {
        let (u, v, w) = (1.0 + xi[0] * a, 1.0 + xi[1] * b, 1.0 + xi[2] * c);
        Vector3::new(a * v * w, u * b * w, u * v * c) / 8.0
    })
}

/// Spatial gradient of the trilinear interpolation of `values`, evaluated
/// at each corner. `None` if the element is degenerate at any corner.
pub fn hex_corner_gradients(
    coords: &[Point3<Real>; 8],
    values: &[Real; 8],
) -> Option<[Vector3<Real>; 8]> {
    let mut out = [Vector3::zeros(); 8];
    for (corner, xi) in NATURAL_CORNERS.iter().enumerate() {
        let dn = shape_derivatives(*xi);
        let mut jac = Matrix3::zeros();
        let mut dphi = Vector3::zeros();
        for a in 0..8 {
            jac += coords[a].coords * dn[a].transpose();
            dphi += dn[a] * values[a];
        }
        let inv_t = jac.try_inverse()?.transpose();
        out[corner] = inv_t * dphi;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_field_has_constant_gradient() {
        let coords = NATURAL_CORNERS.map(|[a, b, c]| {
            Point3::new(2.0 + a * 1.5, -1.0 + b * 0.5, 10.0 + c + 0.2 * a)
        });
        let values = coords.map(|p| 3.0 * p.x - 2.0 * p.y + 0.5 * p.z);
        let grads = hex_corner_gradients(&coords, &values).unwrap();
        for g in grads {
            assert!((g - Vector3::new(3.0, -2.0, 0.5)).norm() < 1e-9);
        }
    }

    #[test]
    fn flat_element_is_degenerate() {
        let coords = NATURAL_CORNERS.map(|[a, b, _]| Point3::new(a, b, 0.0));
        assert!(hex_corner_gradients(&coords, &[0.0; 8]).is_none());
    }
}
