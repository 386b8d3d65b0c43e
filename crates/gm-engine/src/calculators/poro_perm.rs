use gm_core::{Real, Value, safe_div};
use gm_results::{PositionType, ResultAddress, ScalarResultFrames};
use tracing::info;

use super::pore_compressibility::element_nodal_property;
use super::{plain_at, reference_frame};
use crate::calculator::{
    ResultCalculator, if_all_defined, load_dependencies, load_dependency, map_values, map_values_single,
    publish_siblings,
};
use crate::collection::PartResultsCollection;
use crate::error::EngineResult;
use crate::names;

/// Porosity from void ratio.
fn porosity(void_ratio: Real) -> Option<Real> {
    safe_div(void_ratio, 1.0 + void_ratio)
}

/// Initial porosity `PHI0` from the void ratio at the reference time step.
///
/// The result is single-frame: it does not change over the steps.
#[derive(Debug, Clone, Copy)]
pub struct InitialPorosityCalculator;

impl ResultCalculator for InitialPorosityCalculator {
    fn name(&self) -> &str {
        "initial-porosity"
    }

    fn is_matching(&self, address: &ResultAddress) -> bool {
        plain_at(address, PositionType::ElementNodal, names::PORO_PERM, &[names::INITIAL_POROSITY])
    }

    fn calculate(
        &self,
        results: &PartResultsCollection,
        part: usize,
        address: &ResultAddress,
    ) -> EngineResult<ScalarResultFrames> {
        let frame_count = results.frame_count();
        let voidr_address = address.sibling(names::VOIDR, "");
        let Some(voidr) = load_dependency(results, part, &voidr_address, address)? else {
            return Ok(results.create_scalar_result(part, address));
        };
        let voidr_ref = reference_frame(&voidr, results.parameters().reference_time_step, frame_count)?;
        let mut phi0 = map_values_single(1, [&voidr_ref], |_, [e]| if_all_defined([e], |[e]| porosity(e)));
        phi0.enable_as_single_frame();
        Ok(phi0)
    }
}

/// Porosity and permeability evolution from volumetric strain.
#[derive(Debug, Clone, Copy)]
pub struct PoroPermCalculator;

impl ResultCalculator for PoroPermCalculator {
    fn name(&self) -> &str {
        "poro-perm"
    }

    fn is_matching(&self, address: &ResultAddress) -> bool {
        plain_at(address, PositionType::ElementNodal, names::PORO_PERM, &names::PORO_PERM_COMPONENTS[1..])
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
            address.with_component(names::INITIAL_POROSITY),
            address.sibling(names::NE, "EV"),
        ];
        let Some([phi0, ev]) = load_dependencies(results, part, deps, address)? else {
            return Ok(results.create_scalar_result(part, address));
        };
        let ev_ref = reference_frame(&ev, params.reference_time_step, frame_count)?;

        let k0 = match element_nodal_property(
            results,
            part,
            params.initial_permeability_property.as_deref(),
            address,
        )? {
            Some(k0) => k0,
            None => {
                info!(k0 = params.initial_permeability_fixed, "using fixed initial permeability");
                ScalarResultFrames::single(vec![params.initial_permeability_fixed as Value; len])
            }
        };
        let exponent = params.permeability_exponent;

        let inputs = [phi0.as_ref(), ev.as_ref(), &ev_ref, &k0];
        let [phi, dphi, perm] = map_values(frame_count, inputs, |_, [phi0, ev, ev0, k0]| {
            let phi = if_all_defined([phi0, ev, ev0], |[phi0, ev, ev0]| {
                let expansion = -(ev - ev0);
                safe_div(phi0 + expansion, 1.0 + expansion)
            });
            let dphi = if_all_defined([phi, phi0], |[phi, phi0]| Some(phi - phi0));
            let perm = if_all_defined([phi, phi0, k0], |[phi, phi0, k0]| {
                Some(k0 * safe_div(phi, phi0)?.powf(exponent))
            });
            [phi, dphi, perm]
        });

        let computed = vec![
            (address.with_component("PHI"), phi),
            (address.with_component("DPHI"), dphi),
            (address.with_component("PERM"), perm),
        ];
        publish_siblings(results, part, address, computed)
    }
}
