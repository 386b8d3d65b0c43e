use gm_core::{UNDEFINED, Value};
use gm_results::{PositionType, ResultAddress, ScalarResultFrames};
use rayon::prelude::*;

use super::plain_at;
use crate::calculator::{ResultCalculator, load_dependency, map_values_single};
use crate::collection::PartResultsCollection;
use crate::error::EngineResult;
use crate::names;

fn negated(
    results: &PartResultsCollection,
    part: usize,
    address: &ResultAddress,
    source_field: &str,
) -> EngineResult<ScalarResultFrames> {
    let source = address.sibling(source_field, address.component_name());
    let Some(values) = load_dependency(results, part, &source, address)? else {
        return Ok(results.create_scalar_result(part, address));
    };
    Ok(map_values_single(results.frame_count(), [values.as_ref()], |_, [v]| {
        if v.is_finite() { -v } else { UNDEFINED }
    }))
}

/// Effective stress `SE`: compression positive, in bar.
#[derive(Debug, Clone, Copy)]
pub struct EffectiveStressCalculator;

impl ResultCalculator for EffectiveStressCalculator {
    fn name(&self) -> &str {
        "effective-stress"
    }

    fn is_matching(&self, address: &ResultAddress) -> bool {
        plain_at(address, PositionType::ElementNodal, names::SE, &names::STRESS_COMPONENTS)
    }

    fn calculate(
        &self,
        results: &PartResultsCollection,
        part: usize,
        address: &ResultAddress,
    ) -> EngineResult<ScalarResultFrames> {
        negated(results, part, address, names::S_BAR)
    }
}

/// Total stress `ST`: effective stress plus pore pressure on the diagonal.
///
/// Elements without pore pressure contribute zero pore pressure.
#[derive(Debug, Clone, Copy)]
pub struct TotalStressCalculator;

impl ResultCalculator for TotalStressCalculator {
    fn name(&self) -> &str {
        "total-stress"
    }

    fn is_matching(&self, address: &ResultAddress) -> bool {
        plain_at(address, PositionType::ElementNodal, names::ST, &names::STRESS_COMPONENTS)
    }

    fn calculate(
        &self,
        results: &PartResultsCollection,
        part: usize,
        address: &ResultAddress,
    ) -> EngineResult<ScalarResultFrames> {
        let effective = address.sibling(names::SE, address.component_name());
        if !names::STRESS_COMPONENTS[..3].contains(&address.component_name()) {
            let Some(se) = load_dependency(results, part, &effective, address)? else {
                return Ok(results.create_scalar_result(part, address));
            };
            return Ok(map_values_single(results.frame_count(), [se.as_ref()], |_, [v]| v));
        }

        let pore = address.sibling(names::POR_BAR, "");
        let por = results.find_or_load_scalar_result(part, &pore)?;
        let Some(se) = load_dependency(results, part, &effective, address)? else {
            return Ok(results.create_scalar_result(part, address));
        };
        let mut out = results.create_scalar_result(part, address);
        for frame in 0..results.frame_count() {
            let s = se.frame(frame);
            let p = por.frame(frame);
            let values = if p.len() == s.len() {
                s.par_iter().zip(p).map(|(&s, &p)| total_stress(s, p)).collect()
            } else {
                // No pore pressure in this frame.
                s.to_vec()
            };
            out.set_frame(frame, values);
        }
        Ok(out)
    }
}

fn total_stress(effective: Value, pore: Value) -> Value {
    if !effective.is_finite() {
        UNDEFINED
    } else if pore.is_finite() {
        effective + pore
    } else {
        effective
    }
}

/// Strain `NE`: compression positive.
#[derive(Debug, Clone, Copy)]
pub struct StrainCalculator;

impl ResultCalculator for StrainCalculator {
    fn name(&self) -> &str {
        "strain"
    }

    fn is_matching(&self, address: &ResultAddress) -> bool {
        plain_at(address, PositionType::ElementNodal, names::NE, &names::STRAIN_COMPONENTS)
    }

    fn calculate(
        &self,
        results: &PartResultsCollection,
        part: usize,
        address: &ResultAddress,
    ) -> EngineResult<ScalarResultFrames> {
        negated(results, part, address, names::E)
    }
}
