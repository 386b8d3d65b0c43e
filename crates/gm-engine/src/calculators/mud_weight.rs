use std::f64::consts::FRAC_PI_4;

use gm_core::{Real, UNDEFINED, hydrostatic_pressure_bar, safe_div, to_value};
use gm_mesh::{MeshError, Part};
use gm_results::{PositionType, ResultAddress, ScalarResultFrames};
use rayon::prelude::*;
use tracing::{debug, warn};

use super::pore_compressibility::element_nodal_property;
use super::{element_nodal_node_depths, plain_at, undefined_single};
use crate::calculator::{ResultCalculator, load_dependencies, map_values, publish_siblings};
use crate::collection::PartResultsCollection;
use crate::error::EngineResult;
use crate::names;
use crate::params::{CalculationParameters, LowerMudWeightLimit, UpperMudWeightLimit};

/// Safe mud-weight window of a vertical well, in equivalent mud weight [sg].
#[derive(Debug, Clone, Copy)]
pub struct MudWeightCalculator;

/// Borehole pressure below which a vertical well collapses (Kirsch, Mohr-Coulomb).
pub(crate) fn collapse_pressure(sh_max: Real, sh_min: Real, pore: Real, cohesion: Real, phi: Real) -> Real {
    let q = (FRAC_PI_4 + phi / 2.0).tan().powi(2);
    let ucs = 2.0 * cohesion * phi.cos() / (1.0 - phi.sin());
    (3.0 * sh_max - sh_min - ucs + pore * (q - 1.0)) / (1.0 + q)
}

/// Upper and lower window limits [bar].
fn window(
    params: &CalculationParameters,
    st1: Real,
    st3: Real,
    pore: Real,
) -> (Real, Real) {
    let upper = match params.upper_limit {
        UpperMudWeightLimit::FractureGradient => params.sh_multiplier * st3,
        UpperMudWeightLimit::ShMin => st3,
    };
    let lower = match params.lower_limit {
        LowerMudWeightLimit::PorePressure => pore,
        LowerMudWeightLimit::MaxOfPorePressureAndShearFailure => pore.max(collapse_pressure(
            st1,
            st3,
            pore,
            params.cohesion,
            params.friction_angle_rad(),
        )),
    };
    (upper, lower)
}

/// Element-nodal slots of elements above the reservoir reference layer.
///
/// Without an explicit layer the reference is the topmost layer holding
/// pore pressure elements. Parts without K layers have no overburden.
fn overburden_slots(mesh: &Part, reference_layer: Option<usize>) -> EngineResult<Vec<bool>> {
    let grid = match mesh.struct_grid() {
        Ok(grid) => grid,
        Err(MeshError::NotStructured { reason }) => {
            warn!(%reason, "no K layers, mud weight uses reservoir pore pressure everywhere");
            return Ok(vec![false; mesh.element_node_count()]);
        }
        Err(err) => return Err(err.into()),
    };
    let upward = grid.k_direction().is_none_or(|k| k.z >= 0.0);
    let layer = |elm: usize| grid.ijk_from_cell_index(elm).map(|[_, _, k]| k);
    let reservoir_layers = (0..mesh.element_count())
        .filter(|&elm| mesh.element_type(elm).is_pore_pressure_bearing())
        .filter_map(layer);
    let reference = match reference_layer {
        Some(k) => Some(k),
        None if upward => reservoir_layers.max(),
        None => reservoir_layers.min(),
    };
    let Some(reference) = reference else {
        return Ok(vec![false; mesh.element_node_count()]);
    };
    debug!(reference, "mud weight reference layer");
    Ok(mesh
        .element_node_owners()
        .par_iter()
        .map(|&elm| layer(elm).is_some_and(|k| if upward { k > reference } else { k < reference }))
        .collect())
}

impl ResultCalculator for MudWeightCalculator {
    fn name(&self) -> &str {
        "mud-weight-window"
    }

    fn is_matching(&self, address: &ResultAddress) -> bool {
        plain_at(address, PositionType::ElementNodal, names::MUD_WEIGHT, &names::MUD_WEIGHT_COMPONENTS)
    }

    fn calculate(
        &self,
        results: &PartResultsCollection,
        part: usize,
        address: &ResultAddress,
    ) -> EngineResult<ScalarResultFrames> {
        let params = results.parameters();
        let mesh = results.part(part)?;
        let deps = [
            address.sibling(names::ST, "S1"),
            address.sibling(names::ST, "S3"),
        ];
        let Some([st1, st3]) = load_dependencies(results, part, deps, address)? else {
            return Ok(results.create_scalar_result(part, address));
        };
        let loaded_pore = results.find_or_load_scalar_result(part, &address.sibling(names::POR_BAR, ""))?;
        let fallback;
        let pore: &ScalarResultFrames = if loaded_pore.is_empty() {
            fallback = undefined_single(mesh.element_node_count());
            &fallback
        } else {
            loaded_pore.as_ref()
        };

        let unit_hydrostatic: Vec<Real> = element_nodal_node_depths(mesh, params.mud_weight_air_gap)
            .into_iter()
            .map(|depth| hydrostatic_pressure_bar(depth, 1.0))
            .collect();
        let non_reservoir = match element_nodal_property(
            results,
            part,
            params.non_reservoir_pore_pressure_property.as_deref(),
            address,
        )? {
            Some(pressure) => pressure,
            None => ScalarResultFrames::single(
                unit_hydrostatic
                    .iter()
                    .map(|hp| to_value(hp * params.hydrostatic_multiplier_pp_non_res))
                    .collect(),
            ),
        };
        let overburden = overburden_slots(mesh, params.mud_weight_reference_layer)?;

        let inputs = [st1.as_ref(), st3.as_ref(), pore, &non_reservoir];
        let outputs = map_values(results.frame_count(), inputs, |i, [s1, s3, pp, pp_non_res]| {
            let hp = unit_hydrostatic[i];
            let pp = if !overburden[i] && pp.is_finite() { pp } else { pp_non_res };
            if !s1.is_finite() || !s3.is_finite() || !pp.is_finite() {
                return [UNDEFINED; 4];
            }
            let (upper, lower) = window(params, s1.into(), s3.into(), pp.into());
            let (Some(upper), Some(lower)) = (safe_div(upper, hp), safe_div(lower, hp)) else {
                return [UNDEFINED; 4];
            };
            [upper - lower, 0.5 * (upper + lower), upper, lower].map(to_value)
        });

        let computed = names::MUD_WEIGHT_COMPONENTS
            .iter()
            .zip(outputs)
            .map(|(c, frames)| (address.with_component(*c), frames))
            .collect();
        publish_siblings(results, part, address, computed)
    }
}
