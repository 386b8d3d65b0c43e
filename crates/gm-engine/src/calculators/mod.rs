//! Built-in calculators, one module per family.

use gm_core::{Real, UNDEFINED, Value, hydrostatic_pressure_bar};
use gm_mesh::Part;
use gm_results::{PositionType, ResultAddress, ScalarResultFrames};
use rayon::prelude::*;

use crate::calculator::ResultCalculator;
use crate::error::{EngineError, EngineResult};

mod anisotropy;
mod bar_converted;
mod compaction;
mod components;
mod formation;
mod gamma;
mod gradients;
mod invariants;
mod mohr_coulomb;
mod mud_weight;
mod normalized;
mod por_bar;
mod pore_compressibility;
mod poro_perm;
mod principal;
mod shear_slip;
mod surface;
mod time_lapse;

pub use anisotropy::StressAnisotropyCalculator;
pub use bar_converted::BarConvertedCalculator;
pub use compaction::CompactionCalculator;
pub use components::{EffectiveStressCalculator, StrainCalculator, TotalStressCalculator};
pub use formation::FormationCalculator;
pub use gamma::GammaCalculator;
pub use gradients::{NodalGradientsCalculator, StressGradientsCalculator};
pub use invariants::{StressInvariantsCalculator, VolumetricStrainCalculator};
pub use mohr_coulomb::MohrCoulombCalculator;
pub use mud_weight::MudWeightCalculator;
pub use normalized::NormalizedCalculator;
pub use por_bar::ElementNodalPorBarCalculator;
pub use pore_compressibility::PoreCompressibilityCalculator;
pub use poro_perm::{InitialPorosityCalculator, PoroPermCalculator};
pub use principal::PrincipalCalculator;
pub use shear_slip::ShearSlipCalculator;
pub use surface::{PlaneOrientationCalculator, SurfaceStressCalculator};
pub use time_lapse::TimeLapseCalculator;

/// Every built-in calculator in registration order.
pub fn standard_calculators() -> Vec<Box<dyn ResultCalculator>> {
    vec![
        Box::new(TimeLapseCalculator),
        Box::new(NormalizedCalculator),
        Box::new(PlaneOrientationCalculator),
        Box::new(SurfaceStressCalculator),
        Box::new(BarConvertedCalculator::stress()),
        Box::new(BarConvertedCalculator::pore_pressure()),
        Box::new(ElementNodalPorBarCalculator),
        Box::new(NodalGradientsCalculator),
        Box::new(StressGradientsCalculator),
        Box::new(CompactionCalculator),
        Box::new(EffectiveStressCalculator),
        Box::new(TotalStressCalculator),
        Box::new(StrainCalculator),
        Box::new(StressInvariantsCalculator),
        Box::new(PrincipalCalculator),
        Box::new(StressAnisotropyCalculator),
        Box::new(VolumetricStrainCalculator),
        Box::new(MohrCoulombCalculator),
        Box::new(GammaCalculator),
        Box::new(PoreCompressibilityCalculator),
        Box::new(InitialPorosityCalculator),
        Box::new(PoroPermCalculator),
        Box::new(MudWeightCalculator),
        Box::new(ShearSlipCalculator),
        Box::new(FormationCalculator),
    ]
}

/// A plain address at `position` with `field` and one of `components`.
pub(crate) fn plain_at(
    address: &ResultAddress,
    position: PositionType,
    field: &str,
    components: &[&str],
) -> bool {
    address.is_plain()
        && address.matches(position, field)
        && components.contains(&address.component_name())
}

/// One frame of `frames` as a single-frame result.
pub(crate) fn reference_frame(
    frames: &ScalarResultFrames,
    frame: usize,
    frame_count: usize,
) -> EngineResult<ScalarResultFrames> {
    if frame >= frame_count {
        return Err(EngineError::FrameOutOfRange {
            frame,
            count: frame_count,
        });
    }
    Ok(ScalarResultFrames::single(frames.frame(frame).to_vec()))
}

pub(crate) fn undefined_single(len: usize) -> ScalarResultFrames {
    ScalarResultFrames::single(vec![UNDEFINED; len])
}

/// Spread per-element values onto each element's corner slots.
pub(crate) fn element_to_element_nodal(part: &Part, values: &[Value]) -> Vec<Value> {
    part.element_node_owners()
        .par_iter()
        .map(|&elm| values.get(elm).copied().unwrap_or(UNDEFINED))
        .collect()
}

/// Depth below the reference level of every element-nodal slot, by its node.
pub(crate) fn element_nodal_node_depths(part: &Part, air_gap: Real) -> Vec<Real> {
    part.connectivities()
        .par_iter()
        .map(|&node| -part.node_coord(node).z + air_gap)
        .collect()
}

/// Hydrostatic pressure [bar] per value of `position`, for density 1 sg.
///
/// Element-nodal values use node depth inside pore-pressure-bearing
/// elements and element-centroid depth elsewhere.
pub(crate) fn hydrostatic_reference(part: &Part, position: PositionType, air_gap: Real) -> Vec<Real> {
    let depth_to_bar = |z: Real| hydrostatic_pressure_bar(-z + air_gap, 1.0);
    match position {
        PositionType::Nodal => part
            .node_coords()
            .par_iter()
            .map(|p| depth_to_bar(p.z))
            .collect(),
        PositionType::ElementNodal => {
            let owners = part.element_node_owners();
            part.connectivities()
                .par_iter()
                .zip(owners.par_iter())
                .map(|(&node, &elm)| {
                    if part.element_type(elm).is_pore_pressure_bearing() {
                        depth_to_bar(part.node_coord(node).z)
                    } else {
                        depth_to_bar(part.element_centroid(elm).z)
                    }
                })
                .collect()
        }
        _ => Vec::new(),
    }
}
