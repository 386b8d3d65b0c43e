use gm_core::{Value, pascal_to_bar_factor};
use gm_results::{PositionType, ResultAddress, ScalarResultFrames};
use rayon::prelude::*;
use tracing::debug;

use super::plain_at;
use crate::calculator::ResultCalculator;
use crate::collection::PartResultsCollection;
use crate::error::EngineResult;
use crate::names;

/// Pascal → bar conversion of a native field.
///
/// The consumed pascal field is deleted once converted.
#[derive(Debug, Clone)]
pub struct BarConvertedCalculator {
    name: &'static str,
    position: PositionType,
    target: &'static str,
    source: &'static str,
    components: &'static [&'static str],
}

impl BarConvertedCalculator {
    /// ElementNodal `S-Bar` from `S`.
    pub fn stress() -> Self {
        Self {
            name: "stress-bar",
            position: PositionType::ElementNodal,
            target: names::S_BAR,
            source: names::S,
            components: &names::STRESS_COMPONENTS,
        }
    }

    /// Nodal `POR-Bar` from `POR`.
    pub fn pore_pressure() -> Self {
        Self {
            name: "pore-pressure-bar",
            position: PositionType::Nodal,
            target: names::POR_BAR,
            source: names::POR,
            components: &[""],
        }
    }
}

impl ResultCalculator for BarConvertedCalculator {
    fn name(&self) -> &str {
        self.name
    }

    fn is_matching(&self, address: &ResultAddress) -> bool {
        plain_at(address, self.position, self.target, self.components)
    }

    fn calculate(
        &self,
        results: &PartResultsCollection,
        part: usize,
        address: &ResultAddress,
    ) -> EngineResult<ScalarResultFrames> {
        let source_address = address.sibling(self.source, address.component_name());
        let source = results.find_or_load_scalar_result(part, &source_address)?;
        let factor = pascal_to_bar_factor() as Value;

        let mut out = results.create_scalar_result(part, address);
        for frame in 0..results.frame_count() {
            let values = source.frame(frame);
            if values.is_empty() {
                continue;
            }
            out.set_frame(frame, values.par_iter().map(|&v| v * factor).collect());
        }

        results.delete_result(&source_address);
        debug!(source = %source_address, "deleted converted source");
        Ok(out)
    }
}
