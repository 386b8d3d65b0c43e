use gm_core::{Real, safe_div};
use gm_results::{PositionType, ResultAddress, ScalarResultFrames};

use super::plain_at;
use crate::calculator::{ResultCalculator, if_all_defined, load_dependencies, map_values, publish_siblings};
use crate::collection::PartResultsCollection;
use crate::error::EngineResult;
use crate::names;

/// Mohr-Coulomb indices of the effective principal stresses.
#[derive(Debug, Clone, Copy)]
pub struct MohrCoulombCalculator;

/// Stress failure index: distance to the failure line over the Mohr radius.
pub(crate) fn stress_failure_index(s1: Real, s3: Real, cohesion: Real, phi: Real) -> Option<Real> {
    let attraction = safe_div(cohesion, phi.tan())?;
    safe_div((attraction + 0.5 * (s1 + s3)) * phi.sin(), 0.5 * (s1 - s3))
}

/// Degree of shear mobilization.
pub(crate) fn shear_mobilization(s1: Real, s3: Real, cohesion: Real, phi: Real) -> Option<Real> {
    let attraction = safe_div(cohesion, phi.tan())?;
    let sin_mob = safe_div(s1 - s3, s1 + s3 + 2.0 * attraction)?;
    if sin_mob.abs() > 1.0 {
        return None;
    }
    safe_div(sin_mob.asin().tan(), phi.tan())
}

impl ResultCalculator for MohrCoulombCalculator {
    fn name(&self) -> &str {
        "mohr-coulomb"
    }

    fn is_matching(&self, address: &ResultAddress) -> bool {
        plain_at(address, PositionType::ElementNodal, names::SE, &names::MOHR_COULOMB)
    }

    fn calculate(
        &self,
        results: &PartResultsCollection,
        part: usize,
        address: &ResultAddress,
    ) -> EngineResult<ScalarResultFrames> {
        let params = results.parameters();
        let (c, phi) = (params.cohesion, params.friction_angle_rad());
        let deps = ["S1", "S3"].map(|comp| address.with_component(comp));
        let Some([s1, s3]) = load_dependencies(results, part, deps, address)? else {
            return Ok(results.create_scalar_result(part, address));
        };

        let [sfi, dsm, fos] = map_values(results.frame_count(), [s1.as_ref(), s3.as_ref()], |_, v| {
            [
                if_all_defined(v, |[a, b]| stress_failure_index(a, b, c, phi)),
                if_all_defined(v, |[a, b]| shear_mobilization(a, b, c, phi)),
                if_all_defined(v, |[a, b]| safe_div(1.0, shear_mobilization(a, b, c, phi)?)),
            ]
        });
        let computed = vec![
            (address.with_component("SFI"), sfi),
            (address.with_component("DSM"), dsm),
            (address.with_component("FOS"), fos),
        ];
        publish_siblings(results, part, address, computed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hydrostatic_state_is_far_from_failure() {
        let phi = 30f64.to_radians();
        assert_eq!(stress_failure_index(100.0, 100.0, 10.0, phi), None);
        assert_eq!(shear_mobilization(100.0, 100.0, 10.0, phi), Some(0.0));
    }

    #[test]
    fn state_on_failure_line_is_fully_mobilized() {
        let phi = 30f64.to_radians();
        // Cohesionless: failure when (s1 - s3) / (s1 + s3) = sin(phi) = 0.5.
        let dsm = shear_mobilization(300.0, 100.0, 0.0, phi).unwrap();
        assert!((dsm - 1.0).abs() < 1e-9);
        let sfi = stress_failure_index(300.0, 100.0, 0.0, phi).unwrap();
        assert!((sfi - 1.0).abs() < 1e-9);
    }
}
