//! Symmetric 3×3 tensors: principal values, directions and tractions.

use gm_core::Real;
use nalgebra::{Matrix3, Vector3};

/// Relative gap below which two eigenvalues count as coincident.
const COINCIDENT_EIGEN_TOL: Real = 1e-6;

/// Components in the order 11, 22, 33, 12, 13, 23.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymTensor(pub [Real; 6]);

/// One principal value with its direction, if the direction is unique.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Principal {
    pub value: Real,
    pub direction: Option<Vector3<Real>>,
}

impl SymTensor {
    pub fn to_matrix(&self) -> Matrix3<Real> {
        let [s11, s22, s33, s12, s13, s23] = self.0;
        Matrix3::new(s11, s12, s13, s12, s22, s23, s13, s23, s33)
    }

    pub fn mean(&self) -> Real {
        (self.0[0] + self.0[1] + self.0[2]) / 3.0
    }

    pub fn trace(&self) -> Real {
        self.0[0] + self.0[1] + self.0[2]
    }

    /// Von Mises equivalent.
    pub fn von_mises(&self) -> Real {
        let [s11, s22, s33, s12, s13, s23] = self.0;
        (0.5 * ((s11 - s22).powi(2) + (s22 - s33).powi(2) + (s33 - s11).powi(2))
            + 3.0 * (s12 * s12 + s13 * s13 + s23 * s23))
            .sqrt()
    }

    /// Principal values sorted from largest to smallest.
    ///
    /// A direction is `None` when its value coincides with another one.
    pub fn principal(&self) -> [Principal; 3] {
        let eig = self.to_matrix().symmetric_eigen();
        let mut order = [0usize, 1, 2];
        order.sort_by(|&a, &b| eig.eigenvalues[b].total_cmp(&eig.eigenvalues[a]));

        let values = order.map(|i| eig.eigenvalues[i]);
        let scale = values.iter().fold(0.0_f64, |m, v| m.max(v.abs())).max(Real::MIN_POSITIVE);
        let coincident = |a: Real, b: Real| (a - b).abs() <= COINCIDENT_EIGEN_TOL * scale;

        std::array::from_fn(|n| {
            let value = values[n];
            let shared = (0..3).any(|m| m != n && coincident(value, values[m]));
            let direction = (!shared).then(|| eig.eigenvectors.column(order[n]).into_owned());
            Principal { value, direction }
        })
    }

    /// Traction on the plane with unit normal `n`: (normal, shear magnitude).
    pub fn traction(&self, n: &Vector3<Real>) -> (Real, Real) {
        let t = self.to_matrix() * n;
        let normal = t.dot(n);
        let shear = (t - n * normal).norm();
        (normal, shear)
    }
}

/// Inclination from vertical and azimuth clockwise from +y, in degrees.
///
/// The direction is flipped to point downwards first. A vertical direction
/// has azimuth 0.
pub fn inclination_azimuth(direction: &Vector3<Real>) -> Option<(Real, Real)> {
    let len = direction.norm();
    if len <= 0.0 || !len.is_finite() {
        return None;
    }
    let mut d = direction / len;
    if d.z > 0.0 {
        d = -d;
    }
    let inclination = d.z.abs().min(1.0).acos().to_degrees();
    let horizontal = (d.x * d.x + d.y * d.y).sqrt();
    let azimuth = if horizontal < 1e-12 {
        0.0
    } else {
        let a = d.x.atan2(d.y).to_degrees();
        if a < 0.0 { a + 360.0 } else { a }
    };
    Some((inclination, azimuth))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Real, b: Real) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn uniaxial_principal_values() {
        let p = SymTensor([10.0, 0.0, 0.0, 0.0, 0.0, 0.0]).principal();
        assert!(close(p[0].value, 10.0));
        assert!(close(p[1].value, 0.0));
        assert!(close(p[2].value, 0.0));
        let d = p[0].direction.unwrap();
        assert!(close(d.x.abs(), 1.0));
        assert!(p[1].direction.is_none());
        assert!(p[2].direction.is_none());
    }

    #[test]
    fn sheared_tensor_sorted_descending() {
        let p = SymTensor([0.0, 0.0, 0.0, 5.0, 0.0, 0.0]).principal();
        assert!(close(p[0].value, 5.0));
        assert!(close(p[1].value, 0.0));
        assert!(close(p[2].value, -5.0));
        assert!(p.iter().all(|x| x.direction.is_some()));
    }

    #[test]
    fn invariants() {
        let t = SymTensor([3.0, 3.0, 3.0, 0.0, 0.0, 0.0]);
        assert!(close(t.mean(), 3.0));
        assert!(close(t.von_mises(), 0.0));
        let u = SymTensor([1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert!(close(u.von_mises(), 1.0));
    }

    #[test]
    fn traction_on_axis_plane() {
        let t = SymTensor([2.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
        let (sn, tp) = t.traction(&Vector3::x());
        assert!(close(sn, 2.0));
        assert!(close(tp, 1.0));
    }

    #[test]
    fn inclination_and_azimuth_conventions() {
        let (inc, azi) = inclination_azimuth(&Vector3::z()).unwrap();
        assert!(close(inc, 0.0) && close(azi, 0.0));
        let (inc, azi) = inclination_azimuth(&Vector3::x()).unwrap();
        assert!(close(inc, 90.0) && close(azi, 90.0));
        let (_, azi) = inclination_azimuth(&Vector3::new(-1.0, 0.0, -1.0)).unwrap();
        assert!(close(azi, 270.0));
        assert!(inclination_azimuth(&Vector3::zeros()).is_none());
    }
}
