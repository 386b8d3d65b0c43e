use gm_core::UNDEFINED;
use gm_results::{PositionType, ResultAddress, ScalarResultFrames};
use rayon::prelude::*;

use super::plain_at;
use crate::calculator::{ResultCalculator, load_dependency};
use crate::collection::PartResultsCollection;
use crate::error::EngineResult;
use crate::names;

/// Nodal pore pressure copied onto the corners of pore-pressure-bearing
/// elements. Other elements get `UNDEFINED`.
#[derive(Debug, Clone, Copy)]
pub struct ElementNodalPorBarCalculator;

impl ResultCalculator for ElementNodalPorBarCalculator {
    fn name(&self) -> &str {
        "element-nodal-pore-pressure"
    }

    fn is_matching(&self, address: &ResultAddress) -> bool {
        plain_at(address, PositionType::ElementNodal, names::POR_BAR, &[""])
    }

    fn calculate(
        &self,
        results: &PartResultsCollection,
        part: usize,
        address: &ResultAddress,
    ) -> EngineResult<ScalarResultFrames> {
        let mesh = results.part(part)?;
        let mut out = results.create_scalar_result(part, address);
        let nodal_address = address.with_position(PositionType::Nodal);
        let Some(nodal) = load_dependency(results, part, &nodal_address, address)? else {
            return Ok(out);
        };

        let owners = mesh.element_node_owners();
        for frame in 0..results.frame_count() {
            let values = nodal.frame(frame);
            if values.is_empty() {
                continue;
            }
            let mapped = mesh
                .connectivities()
                .par_iter()
                .zip(owners.par_iter())
                .map(|(&node, &elm)| {
                    if mesh.element_type(elm).is_pore_pressure_bearing() {
                        values.get(node).copied().unwrap_or(UNDEFINED)
                    } else {
                        UNDEFINED
                    }
                })
                .collect();
            out.set_frame(frame, mapped);
        }
        Ok(out)
    }
}
