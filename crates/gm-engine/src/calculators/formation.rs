use gm_core::{UNDEFINED, Value};
use gm_mesh::MeshError;
use gm_results::{PositionType, ResultAddress, ScalarResultFrames};
use tracing::warn;

use super::{plain_at, undefined_single};
use crate::calculator::ResultCalculator;
use crate::collection::PartResultsCollection;
use crate::error::EngineResult;
use crate::names;

/// Per-element index of the formation layer covering the element's K.
#[derive(Debug, Clone, Copy)]
pub struct FormationCalculator;

impl ResultCalculator for FormationCalculator {
    fn name(&self) -> &str {
        "formation"
    }

    fn is_matching(&self, address: &ResultAddress) -> bool {
        plain_at(address, PositionType::FormationNames, names::FORMATION, &[""])
    }

    fn calculate(
        &self,
        results: &PartResultsCollection,
        part: usize,
        _address: &ResultAddress,
    ) -> EngineResult<ScalarResultFrames> {
        let mesh = results.part(part)?;
        let grid = match mesh.struct_grid() {
            Ok(grid) => grid,
            Err(MeshError::NotStructured { reason }) => {
                warn!(part, %reason, "formation index needs a structured grid");
                return Ok(undefined_single(mesh.element_count()));
            }
            Err(err) => return Err(err.into()),
        };

        let layers = &results.parameters().formations;
        let values: Vec<Value> = (0..mesh.element_count())
            .map(|elm| {
                grid.ijk_from_cell_index(elm)
                    .and_then(|[_, _, k]| layers.iter().position(|l| l.contains(k)))
                    .map_or(UNDEFINED, |idx| idx as Value)
            })
            .collect();
        Ok(ScalarResultFrames::single(values))
    }
}
