use gm_core::{Real, hydrostatic_pressure_bar, safe_div};
use gm_results::{PositionType, ResultAddress, ScalarResultFrames};

use super::{element_nodal_node_depths, plain_at};
use crate::calculator::{ResultCalculator, if_all_defined, load_dependencies, map_values_single};
use crate::collection::PartResultsCollection;
use crate::error::EngineResult;
use crate::names;

/// Shear-slip indicator `DPN`: pore overpressure over the margin between
/// the minimum total stress and hydrostatic pressure.
#[derive(Debug, Clone, Copy)]
pub struct ShearSlipCalculator;

impl ResultCalculator for ShearSlipCalculator {
    fn name(&self) -> &str {
        "shear-slip-indicator"
    }

    fn is_matching(&self, address: &ResultAddress) -> bool {
        plain_at(
            address,
            PositionType::ElementNodal,
            names::ST,
            &[names::SHEAR_SLIP_INDICATOR],
        )
    }

    fn calculate(
        &self,
        results: &PartResultsCollection,
        part: usize,
        address: &ResultAddress,
    ) -> EngineResult<ScalarResultFrames> {
        let mesh = results.part(part)?;
        let density = results.parameters().water_density_shear_slip_indicator;
        let deps = [address.sibling(names::POR_BAR, ""), address.with_component("S3")];
        let Some([pore, st3]) = load_dependencies(results, part, deps, address)? else {
            return Ok(results.create_scalar_result(part, address));
        };
        let hydrostatic: Vec<Real> = element_nodal_node_depths(mesh, 0.0)
            .into_iter()
            .map(|depth| hydrostatic_pressure_bar(depth, density))
            .collect();

        Ok(map_values_single(
            results.frame_count(),
            [pore.as_ref(), st3.as_ref()],
            |i, v| {
                let ph = hydrostatic[i];
                if_all_defined(v, |[pp, s3]| safe_div(pp - ph, s3 - ph))
            },
        ))
    }
}
