use gm_core::{Real, safe_div};
use gm_results::{PositionType, ResultAddress, ScalarResultFrames};
use tracing::warn;

use super::{element_to_element_nodal, plain_at, reference_frame, undefined_single};
use crate::calculator::{ResultCalculator, if_all_defined, load_dependencies, map_values, publish_siblings};
use crate::collection::PartResultsCollection;
use crate::error::EngineResult;
use crate::names;

/// GPa → bar.
const GPA_TO_BAR: Real = 1.0e4;

/// Pore and vertical compressibility relative to the reference time step.
#[derive(Debug, Clone, Copy)]
pub struct PoreCompressibilityCalculator;

/// Element-nodal values of an optional element property.
pub(crate) fn element_nodal_property(
    results: &PartResultsCollection,
    part: usize,
    property: Option<&str>,
    needed_by: &ResultAddress,
) -> EngineResult<Option<ScalarResultFrames>> {
    let Some(name) = property else {
        return Ok(None);
    };
    let Some(frames) = results.element_property(part, name)? else {
        warn!(property = name, %needed_by, "element property missing");
        return Ok(None);
    };
    let mesh = results.part(part)?;
    Ok(Some(ScalarResultFrames::single(element_to_element_nodal(mesh, frames.frame(0)))))
}

impl ResultCalculator for PoreCompressibilityCalculator {
    fn name(&self) -> &str {
        "pore-compressibility"
    }

    fn is_matching(&self, address: &ResultAddress) -> bool {
        plain_at(
            address,
            PositionType::ElementNodal,
            names::COMPRESSIBILITY,
            &names::COMPRESSIBILITY_COMPONENTS,
        )
    }

    fn calculate(
        &self,
        results: &PartResultsCollection,
        part: usize,
        address: &ResultAddress,
    ) -> EngineResult<ScalarResultFrames> {
        let params = results.parameters();
        let frame_count = results.frame_count();
        let len = results.part(part)?.element_node_count();

        let deps = [
            address.sibling(names::POR_BAR, ""),
            address.sibling(names::NE, "EV"),
            address.sibling(names::NE, "E33"),
        ];
        let Some([pp, ev, e33]) = load_dependencies(results, part, deps, address)? else {
            return Ok(results.create_scalar_result(part, address));
        };
        let ref_step = params.reference_time_step;
        let pp_ref = reference_frame(&pp, ref_step, frame_count)?;
        let ev_ref = reference_frame(&ev, ref_step, frame_count)?;
        let e33_ref = reference_frame(&e33, ref_step, frame_count)?;

        let phi0_address = address.sibling(names::PORO_PERM, names::INITIAL_POROSITY);
        let loaded_phi0 = results.find_or_load_scalar_result(part, &phi0_address)?;
        let fallback;
        let phi0: &ScalarResultFrames = if loaded_phi0.is_empty() {
            warn!(%address, "initial porosity missing, pore compressibility undefined");
            fallback = undefined_single(len);
            &fallback
        } else {
            loaded_phi0.as_ref()
        };

        let biot = element_nodal_property(results, part, params.biot_property.as_deref(), address)?
            .unwrap_or_else(|| ScalarResultFrames::single(vec![params.biot_fixed_factor as f32; len]));
        let modulus = element_nodal_property(results, part, params.youngs_modulus_property.as_deref(), address)?
            .unwrap_or_else(|| undefined_single(len));
        let ratio = element_nodal_property(results, part, params.poisson_ratio_property.as_deref(), address)?
            .unwrap_or_else(|| undefined_single(len));

        let inputs = [
            pp.as_ref(),
            &pp_ref,
            ev.as_ref(),
            &ev_ref,
            e33.as_ref(),
            &e33_ref,
            phi0,
            &biot,
            &modulus,
            &ratio,
        ];
        let [pore, vertical, vertical_ratio] = map_values(frame_count, inputs, |_, v| {
            let [pp, pp0, ev, ev0, e33, e330, phi0, biot, modulus, nu] = v;
            let pore = if_all_defined([pp, pp0, ev, ev0, phi0, biot], |[pp, pp0, ev, ev0, phi0, biot]| {
                let dpp = pp - pp0;
                safe_div(biot * (ev - ev0), phi0 * -dpp)
            });
            let vertical = if_all_defined([pp, pp0, e33, e330], |[pp, pp0, e33, e330]| {
                safe_div(e33 - e330, -(pp - pp0))
            });
            let ratio = if_all_defined([vertical, biot, modulus, nu], |[cv, biot, modulus, nu]| {
                let uniaxial = safe_div(
                    biot * (1.0 + nu) * (1.0 - 2.0 * nu),
                    modulus * GPA_TO_BAR * (1.0 - nu),
                )?;
                safe_div(cv, uniaxial)
            });
            [pore, vertical, ratio]
        });

        let computed = vec![
            (address.with_component("PORE"), pore),
            (address.with_component("VERTICAL"), vertical),
            (address.with_component("VERTICAL-RATIO"), vertical_ratio),
        ];
        publish_siblings(results, part, address, computed)
    }
}
