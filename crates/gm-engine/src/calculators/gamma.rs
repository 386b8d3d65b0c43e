use gm_core::safe_div;
use gm_results::{PositionType, ResultAddress, ScalarResultFrames};

use super::plain_at;
use crate::calculator::{ResultCalculator, if_all_defined, load_dependencies, map_values, publish_siblings};
use crate::collection::PartResultsCollection;
use crate::error::EngineResult;
use crate::names;

/// Total stress components over pore pressure.
#[derive(Debug, Clone, Copy)]
pub struct GammaCalculator;

const SOURCES: [&str; 6] = ["S1", "S2", "S3", "S11", "S22", "S33"];

impl ResultCalculator for GammaCalculator {
    fn name(&self) -> &str {
        "gamma"
    }

    fn is_matching(&self, address: &ResultAddress) -> bool {
        plain_at(address, PositionType::ElementNodal, names::GAMMA, &names::GAMMA_COMPONENTS)
    }

    fn calculate(
        &self,
        results: &PartResultsCollection,
        part: usize,
        address: &ResultAddress,
    ) -> EngineResult<ScalarResultFrames> {
        let deps: [ResultAddress; 7] = std::array::from_fn(|i| match SOURCES.get(i) {
            Some(c) => address.sibling(names::ST, *c),
            None => address.sibling(names::POR_BAR, ""),
        });
        let Some(inputs) = load_dependencies(results, part, deps, address)? else {
            return Ok(results.create_scalar_result(part, address));
        };
        let inputs: [&ScalarResultFrames; 7] = inputs.each_ref().map(|f| f.as_ref());
        let outputs = map_values(results.frame_count(), inputs, |_, v| {
            let pore = v[6];
            std::array::from_fn::<_, 6, _>(|n| if_all_defined([v[n], pore], |[s, p]| safe_div(s, p)))
        });
        let computed = names::GAMMA_COMPONENTS
            .iter()
            .zip(outputs)
            .map(|(c, frames)| (address.with_component(*c), frames))
            .collect();
        publish_siblings(results, part, address, computed)
    }
}
