use gm_core::{UNDEFINED, to_value};
use gm_results::{PositionType, ResultAddress, ScalarResultFrames};

use super::plain_at;
use crate::calculator::{ResultCalculator, if_all_defined, load_dependencies, map_values, publish_siblings};
use crate::collection::PartResultsCollection;
use crate::error::EngineResult;
use crate::names;
use crate::tensor::SymTensor;

/// Mean stress `SM` and von Mises equivalent `Q` of `SE` and `ST`.
#[derive(Debug, Clone, Copy)]
pub struct StressInvariantsCalculator;

impl ResultCalculator for StressInvariantsCalculator {
    fn name(&self) -> &str {
        "stress-invariants"
    }

    fn is_matching(&self, address: &ResultAddress) -> bool {
        plain_at(address, PositionType::ElementNodal, names::SE, &names::STRESS_INVARIANTS)
            || plain_at(address, PositionType::ElementNodal, names::ST, &names::STRESS_INVARIANTS)
    }

    fn calculate(
        &self,
        results: &PartResultsCollection,
        part: usize,
        address: &ResultAddress,
    ) -> EngineResult<ScalarResultFrames> {
        let tensor = names::STRESS_COMPONENTS.map(|c| address.with_component(c));
        let Some(inputs) = load_dependencies(results, part, tensor, address)? else {
            return Ok(results.create_scalar_result(part, address));
        };
        let inputs: [&ScalarResultFrames; 6] = inputs.each_ref().map(|f| f.as_ref());
        let [sm, q] = map_values(results.frame_count(), inputs, |_, v| {
            if v.iter().any(|x| !x.is_finite()) {
                return [UNDEFINED; 2];
            }
            let t = SymTensor(v.map(f64::from));
            [to_value(t.mean()), to_value(t.von_mises())]
        });
        let computed = vec![
            (address.with_component("SM"), sm),
            (address.with_component("Q"), q),
        ];
        publish_siblings(results, part, address, computed)
    }
}

/// Volumetric strain `EV` and deviatoric strain `ED` of `NE`.
#[derive(Debug, Clone, Copy)]
pub struct VolumetricStrainCalculator;

impl ResultCalculator for VolumetricStrainCalculator {
    fn name(&self) -> &str {
        "volumetric-strain"
    }

    fn is_matching(&self, address: &ResultAddress) -> bool {
        plain_at(address, PositionType::ElementNodal, names::NE, &names::VOLUMETRIC_STRAIN)
    }

    fn calculate(
        &self,
        results: &PartResultsCollection,
        part: usize,
        address: &ResultAddress,
    ) -> EngineResult<ScalarResultFrames> {
        let deps = ["E11", "E22", "E33", "E1", "E3"].map(|c| address.with_component(c));
        let Some(inputs) = load_dependencies(results, part, deps, address)? else {
            return Ok(results.create_scalar_result(part, address));
        };
        let inputs: [&ScalarResultFrames; 5] = inputs.each_ref().map(|f| f.as_ref());
        let [ev, ed] = map_values(results.frame_count(), inputs, |_, [e11, e22, e33, e1, e3]| {
            [
                if_all_defined([e11, e22, e33], |[a, b, c]| Some(a + b + c)),
                if_all_defined([e1, e3], |[a, b]| Some(2.0 / 3.0 * (a - b))),
            ]
        });
        let computed = vec![
            (address.with_component("EV"), ev),
            (address.with_component("ED"), ed),
        ];
        publish_siblings(results, part, address, computed)
    }
}
