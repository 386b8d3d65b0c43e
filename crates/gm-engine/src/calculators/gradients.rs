use gm_core::{Real, UNDEFINED, Value, to_value};
use gm_mesh::Part;
use gm_results::{PositionType, ResultAddress, ScalarResultFrames};
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

use super::plain_at;
use crate::calculator::{ResultCalculator, load_dependency, publish_siblings};
use crate::collection::PartResultsCollection;
use crate::error::EngineResult;
use crate::hex::hex_corner_gradients;
use crate::names;

/// Gradient components below this magnitude are reported as zero.
const GRADIENT_EPS: Real = 1e-6;

/// Mean of the corner gradients of every incident hexahedron, per node and axis.
///
/// `corner_value(elm, corner)` gives the interpolated value at each hex
/// corner. Hexes with an undefined corner are skipped; nodes no hex
/// contributes to are `UNDEFINED`.
fn averaged_nodal_gradients<F>(mesh: &Part, corner_value: F) -> [Vec<Value>; 3]
where
    F: Fn(usize, usize) -> Value + Sync,
{
    let element_gradients: Vec<Option<[Vector3<Real>; 8]>> = (0..mesh.element_count())
        .into_par_iter()
        .map(|elm| {
            if !mesh.element_type(elm).is_hexahedral() {
                return None;
            }
            let conn = mesh.connectivity(elm);
            let corner_values: [Value; 8] = std::array::from_fn(|n| corner_value(elm, n));
            if corner_values.iter().any(|v| !v.is_finite()) {
                return None;
            }
            let coords: [Point3<Real>; 8] = std::array::from_fn(|n| mesh.node_coord(conn[n]));
            hex_corner_gradients(&coords, &corner_values.map(Real::from))
        })
        .collect();

    let mut sums = vec![Vector3::<Real>::zeros(); mesh.node_count()];
    let mut counts = vec![0u32; mesh.node_count()];
    for (elm, grads) in element_gradients.iter().enumerate() {
        let Some(grads) = grads else { continue };
        for (corner, &node) in mesh.connectivity(elm).iter().enumerate() {
            sums[node] += grads[corner];
            counts[node] += 1;
        }
    }

    [0, 1, 2].map(|axis| {
        sums.par_iter()
            .zip(counts.par_iter())
            .map(|(sum, &count)| {
                if count == 0 {
                    return UNDEFINED;
                }
                let g = sum[axis] / Real::from(count);
                if g.abs() < GRADIENT_EPS { 0.0 } else { to_value(g) }
            })
            .collect()
    })
}

/// Gradient frames of `source`, skipping frames not holding `expected_len` values.
fn gradient_frames<F>(
    results: &PartResultsCollection,
    mesh: &Part,
    source: &ScalarResultFrames,
    expected_len: usize,
    corner_value: F,
) -> [ScalarResultFrames; 3]
where
    F: Fn(&[Value], usize, usize) -> Value + Sync,
{
    let frame_count = results.frame_count();
    let mut outputs: [ScalarResultFrames; 3] = std::array::from_fn(|_| ScalarResultFrames::new(frame_count));
    for frame in 0..frame_count {
        let values = source.frame(frame);
        if values.len() != expected_len {
            continue;
        }
        let axes = averaged_nodal_gradients(mesh, |elm, corner| corner_value(values, elm, corner));
        for (out, axis) in outputs.iter_mut().zip(axes) {
            out.set_frame(frame, axis);
        }
    }
    outputs
}

/// Per-node pore pressure gradient: the mean of the corner gradients of
/// every incident hexahedron.
#[derive(Debug, Clone, Copy)]
pub struct NodalGradientsCalculator;

impl ResultCalculator for NodalGradientsCalculator {
    fn name(&self) -> &str {
        "nodal-gradients"
    }

    fn is_matching(&self, address: &ResultAddress) -> bool {
        plain_at(
            address,
            PositionType::Differentials,
            names::POR_BAR,
            &names::GRADIENT_COMPONENTS,
        )
    }

    fn calculate(
        &self,
        results: &PartResultsCollection,
        part: usize,
        address: &ResultAddress,
    ) -> EngineResult<ScalarResultFrames> {
        let mesh = results.part(part)?;
        let source_address = ResultAddress::new(PositionType::Nodal, address.field_name(), "");
        let Some(source) = load_dependency(results, part, &source_address, address)? else {
            return Ok(results.create_scalar_result(part, address));
        };

        let outputs = gradient_frames(results, mesh, &source, mesh.node_count(), |values, elm, corner| {
            values[mesh.connectivity(elm)[corner]]
        });
        let computed = names::GRADIENT_COMPONENTS
            .iter()
            .zip(outputs)
            .map(|(c, frames)| (address.with_component(*c), frames))
            .collect();
        publish_siblings(results, part, address, computed)
    }
}

/// Spatial gradient of one effective or total stress component, per node.
///
/// Each hex contributes the gradient of its own corner values, so stress
/// jumps across element boundaries are averaged at shared nodes.
#[derive(Debug, Clone, Copy)]
pub struct StressGradientsCalculator;

impl ResultCalculator for StressGradientsCalculator {
    fn name(&self) -> &str {
        "stress-gradients"
    }

    fn is_matching(&self, address: &ResultAddress) -> bool {
        address.is_plain()
            && address.position() == PositionType::Differentials
            && (address.field_name() == names::SE || address.field_name() == names::ST)
            && names::split_stress_gradient(address.component_name()).is_some()
    }

    fn calculate(
        &self,
        results: &PartResultsCollection,
        part: usize,
        address: &ResultAddress,
    ) -> EngineResult<ScalarResultFrames> {
        let Some((stress, _)) = names::split_stress_gradient(address.component_name()) else {
            return Ok(results.create_scalar_result(part, address));
        };
        let mesh = results.part(part)?;
        let source_address = ResultAddress::new(PositionType::ElementNodal, address.field_name(), stress);
        let Some(source) = load_dependency(results, part, &source_address, address)? else {
            return Ok(results.create_scalar_result(part, address));
        };

        let outputs = gradient_frames(results, mesh, &source, mesh.element_node_count(), |values, elm, corner| {
            values[mesh.element_node_result_index(elm, corner)]
        });
        let computed = names::GRADIENT_COMPONENTS
            .iter()
            .zip(outputs)
            .map(|(axis, frames)| (address.with_component(names::stress_gradient_name(stress, axis)), frames))
            .collect();
        publish_siblings(results, part, address, computed)
    }
}
