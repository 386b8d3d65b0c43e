use gm_core::{UNDEFINED, Value, safe_div, to_value};
use gm_results::{ResultAddress, ScalarResultFrames, value_count};
use rayon::prelude::*;

use super::hydrostatic_reference;
use crate::calculator::ResultCalculator;
use crate::collection::PartResultsCollection;
use crate::error::EngineResult;
use crate::names;

/// A normalizable field divided by the hydrostatic pressure at its depth.
#[derive(Debug, Clone, Copy)]
pub struct NormalizedCalculator;

impl ResultCalculator for NormalizedCalculator {
    fn name(&self) -> &str {
        "normalized"
    }

    fn is_matching(&self, address: &ResultAddress) -> bool {
        address.is_normalized()
            && !address.is_time_lapse()
            && names::is_normalizable(&address.without_normalization())
    }

    fn calculate(
        &self,
        results: &PartResultsCollection,
        part: usize,
        address: &ResultAddress,
    ) -> EngineResult<ScalarResultFrames> {
        let mesh = results.part(part)?;
        let source = results.find_or_load_scalar_result(part, &address.without_normalization())?;
        let air_gap = results.parameters().normalization_air_gap;
        let hydro = hydrostatic_reference(mesh, address.position(), air_gap);
        let len = value_count(mesh, address.position());

        let mut out = results.create_scalar_result(part, address);
        for frame in 0..results.frame_count() {
            let values = source.frame(frame);
            // Missing data counts as zero.
            let normalized: Vec<Value> = (0..len)
                .into_par_iter()
                .map(|i| {
                    let v = values.get(i).copied().unwrap_or(0.0);
                    safe_div(f64::from(v), hydro[i]).map_or(UNDEFINED, to_value)
                })
                .collect();
            out.set_frame(frame, normalized);
        }
        Ok(out)
    }
}
