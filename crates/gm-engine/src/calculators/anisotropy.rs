use gm_core::{Real, safe_div};
use gm_results::{PositionType, ResultAddress, ScalarResultFrames};

use super::plain_at;
use crate::calculator::{ResultCalculator, if_all_defined, load_dependencies, map_values, publish_siblings};
use crate::collection::PartResultsCollection;
use crate::error::EngineResult;
use crate::names;

/// Stress anisotropy `SA12`, `SA13` and `SA23` between pairs of principal stresses.
#[derive(Debug, Clone, Copy)]
pub struct StressAnisotropyCalculator;

/// Relative difference `2 (a - b) / (a + b)`; undefined when the pair sums to zero.
fn anisotropy(a: Real, b: Real) -> Option<Real> {
    safe_div(2.0 * (a - b), a + b)
}

impl ResultCalculator for StressAnisotropyCalculator {
    fn name(&self) -> &str {
        "stress-anisotropy"
    }

    fn is_matching(&self, address: &ResultAddress) -> bool {
        plain_at(address, PositionType::ElementNodal, names::SE, &names::STRESS_ANISOTROPY)
            || plain_at(address, PositionType::ElementNodal, names::ST, &names::STRESS_ANISOTROPY)
    }

    fn calculate(
        &self,
        results: &PartResultsCollection,
        part: usize,
        address: &ResultAddress,
    ) -> EngineResult<ScalarResultFrames> {
        let principal = names::PRINCIPAL_STRESSES.map(|c| address.with_component(c));
        let Some([s1, s2, s3]) = load_dependencies(results, part, principal, address)? else {
            return Ok(results.create_scalar_result(part, address));
        };
        let outputs = map_values(results.frame_count(), [s1.as_ref(), s2.as_ref(), s3.as_ref()], |_, [s1, s2, s3]| {
            [
                if_all_defined([s1, s2], |[a, b]| anisotropy(a, b)),
                if_all_defined([s1, s3], |[a, b]| anisotropy(a, b)),
                if_all_defined([s2, s3], |[a, b]| anisotropy(a, b)),
            ]
        });
        let computed = names::STRESS_ANISOTROPY
            .iter()
            .zip(outputs)
            .map(|(c, frames)| (address.with_component(*c), frames))
            .collect();
        publish_siblings(results, part, address, computed)
    }
}
