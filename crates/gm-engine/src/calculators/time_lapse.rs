use gm_core::{UNDEFINED, Value};
use gm_results::{ResultAddress, ScalarResultFrames};
use rayon::prelude::*;

use crate::calculator::ResultCalculator;
use crate::collection::PartResultsCollection;
use crate::error::{EngineError, EngineResult};

/// `v(frame) - v(base)` for any address carrying a base frame.
///
/// Undefined where either value is undefined. When the base is the
/// requested frame every defined value becomes exactly zero.
#[derive(Debug, Clone, Copy)]
pub struct TimeLapseCalculator;

impl ResultCalculator for TimeLapseCalculator {
    fn name(&self) -> &str {
        "time-lapse"
    }

    fn is_matching(&self, address: &ResultAddress) -> bool {
        address.is_time_lapse()
    }

    fn calculate(
        &self,
        results: &PartResultsCollection,
        part: usize,
        address: &ResultAddress,
    ) -> EngineResult<ScalarResultFrames> {
        let frame_count = results.frame_count();
        let base = address.time_lapse_base_frame().unwrap_or_default();
        if base >= frame_count {
            return Err(EngineError::FrameOutOfRange {
                frame: base,
                count: frame_count,
            });
        }

        let source = results.find_or_load_scalar_result(part, &address.without_time_lapse())?;
        let mut out = results.create_scalar_result(part, address);
        let base_values = source.frame(base);
        for frame in 0..frame_count {
            let current = source.frame(frame);
            if current.is_empty() || current.len() != base_values.len() {
                continue;
            }
            let diff: Vec<Value> = current
                .par_iter()
                .zip(base_values.par_iter())
                .map(|(&c, &b)| {
                    if c.is_finite() && b.is_finite() {
                        c - b
                    } else {
                        UNDEFINED
                    }
                })
                .collect();
            out.set_frame(frame, diff);
        }
        Ok(out)
    }
}
