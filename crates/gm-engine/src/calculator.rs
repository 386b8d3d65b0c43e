//! The calculator strategy trait and per-value mapping helpers.

use std::sync::Arc;

use gm_core::{UNDEFINED, Value};
use gm_results::{ResultAddress, ScalarResultFrames};
use rayon::prelude::*;
use tracing::warn;

use crate::collection::PartResultsCollection;
use crate::error::EngineResult;

/// A strategy producing one family of derived results.
///
/// `is_matching` must be cheap and free of side effects. `calculate` may
/// request other addresses from `results`; it returns the staged frames for
/// `address` and publishes any sibling results it computed along the way.
pub trait ResultCalculator: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    fn is_matching(&self, address: &ResultAddress) -> bool;

    fn calculate(
        &self,
        results: &PartResultsCollection,
        part: usize,
        address: &ResultAddress,
    ) -> EngineResult<ScalarResultFrames>;
}

/// Inputs of one frame, or `None` if any is missing or sized differently.
fn frame_inputs<'a, const N: usize>(
    inputs: &[&'a ScalarResultFrames; N],
    frame: usize,
) -> Option<[&'a [Value]; N]> {
    let slices = inputs.map(|f| f.frame(frame));
    let len = slices.first().map_or(0, |s| s.len());
    (len > 0 && slices.iter().all(|s| s.len() == len)).then_some(slices)
}

/// Evaluate `f` at every value index of every frame, in parallel within a
/// frame. `f` receives the value index and the input values at that index.
///
/// A frame where any input is missing stays empty in every output.
pub fn map_values<const N: usize, const M: usize, F>(
    frame_count: usize,
    inputs: [&ScalarResultFrames; N],
    f: F,
) -> [ScalarResultFrames; M]
where
    F: Fn(usize, [Value; N]) -> [Value; M] + Sync,
{
    let mut outputs: [ScalarResultFrames; M] = std::array::from_fn(|_| ScalarResultFrames::new(frame_count));
    for frame in 0..frame_count {
        let Some(slices) = frame_inputs(&inputs, frame) else {
            continue;
        };
        let len = slices[0].len();
        let rows: Vec<[Value; M]> = (0..len)
            .into_par_iter()
            .map(|i| f(i, slices.map(|s| s[i])))
            .collect();
        for (m, out) in outputs.iter_mut().enumerate() {
            out.set_frame(frame, rows.iter().map(|r| r[m]).collect());
        }
    }
    outputs
}

/// Single-output form of [`map_values`].
pub fn map_values_single<const N: usize, F>(
    frame_count: usize,
    inputs: [&ScalarResultFrames; N],
    f: F,
) -> ScalarResultFrames
where
    F: Fn(usize, [Value; N]) -> Value + Sync,
{
    let [out] = map_values(frame_count, inputs, |i, v| [f(i, v)]);
    out
}

/// `UNDEFINED` unless every input is defined, in which case `f` decides.
pub fn if_all_defined<const N: usize>(values: [Value; N], f: impl FnOnce([f64; N]) -> Option<f64>) -> Value {
    if values.iter().any(|v| !v.is_finite()) {
        return UNDEFINED;
    }
    f(values.map(f64::from)).map_or(UNDEFINED, gm_core::to_value)
}

/// Publish the sibling results of `address`, skipping already cached ones,
/// and hand back the frames belonging to `address` itself.
pub fn publish_siblings(
    results: &PartResultsCollection,
    part: usize,
    address: &ResultAddress,
    computed: Vec<(ResultAddress, ScalarResultFrames)>,
) -> EngineResult<ScalarResultFrames> {
    let mut own = None;
    for (addr, frames) in computed {
        if addr == *address {
            own = Some(frames);
        } else if !results.is_cached(part, &addr) {
            results.store_scalar_result(part, addr, frames)?;
        }
    }
    Ok(own.unwrap_or_else(|| results.create_scalar_result(part, address)))
}

/// Load `address`, warning on behalf of `needed_by` when its data is missing.
pub fn load_dependency(
    results: &PartResultsCollection,
    part: usize,
    address: &ResultAddress,
    needed_by: &ResultAddress,
) -> EngineResult<Option<Arc<ScalarResultFrames>>> {
    let frames = results.find_or_load_scalar_result(part, address)?;
    if frames.is_empty() {
        warn!(%address, %needed_by, part, "missing dependency, result left empty");
        return Ok(None);
    }
    Ok(Some(frames))
}

/// Load several dependencies; `None` if any is missing.
pub fn load_dependencies<const N: usize>(
    results: &PartResultsCollection,
    part: usize,
    addresses: [ResultAddress; N],
    needed_by: &ResultAddress,
) -> EngineResult<Option<[Arc<ScalarResultFrames>; N]>> {
    let mut loaded = Vec::with_capacity(N);
    for addr in &addresses {
        match load_dependency(results, part, addr, needed_by)? {
            Some(frames) => loaded.push(frames),
            None => return Ok(None),
        }
    }
    Ok(loaded.try_into().ok())
}
