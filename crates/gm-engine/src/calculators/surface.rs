use gm_core::{UNDEFINED, Value, to_value};
use gm_mesh::Part;
use gm_results::{PositionType, ResultAddress, ScalarResultFrames};
use rayon::prelude::*;

use super::plain_at;
use crate::calculator::{ResultCalculator, load_dependencies, publish_siblings};
use crate::collection::PartResultsCollection;
use crate::error::EngineResult;
use crate::names;
use crate::tensor::{SymTensor, inclination_azimuth};

/// Per face-node slot rows of one element, in result order.
fn face_rows<T: Copy>(part: &Part, elm: usize, row: impl Fn(usize, usize) -> T) -> Vec<T> {
    let etype = part.element_type(elm);
    (0..etype.face_count())
        .flat_map(|face| {
            let local = etype.face_nodes(face);
            local.iter().map(move |&l| (face, l))
        })
        .map(|(face, local)| row(face, local))
        .collect()
}

/// Inclination and azimuth of each element face, single-frame.
#[derive(Debug, Clone, Copy)]
pub struct PlaneOrientationCalculator;

impl ResultCalculator for PlaneOrientationCalculator {
    fn name(&self) -> &str {
        "plane-orientation"
    }

    fn is_matching(&self, address: &ResultAddress) -> bool {
        plain_at(address, PositionType::ElementNodalFace, names::PLANE, &names::PLANE_COMPONENTS)
    }

    fn calculate(
        &self,
        results: &PartResultsCollection,
        part: usize,
        address: &ResultAddress,
    ) -> EngineResult<ScalarResultFrames> {
        let mesh = results.part(part)?;
        let rows: Vec<[Value; 2]> = (0..mesh.element_count())
            .into_par_iter()
            .flat_map_iter(|elm| {
                face_rows(mesh, elm, |face, _| {
                    mesh.face_normal(elm, face)
                        .as_ref()
                        .and_then(inclination_azimuth)
                        .map_or([UNDEFINED; 2], |(inc, azi)| [to_value(inc), to_value(azi)])
                })
            })
            .collect();

        let computed = names::PLANE_COMPONENTS
            .iter()
            .enumerate()
            .map(|(n, c)| {
                let values = rows.iter().map(|r| r[n]).collect();
                (address.with_component(*c), ScalarResultFrames::single(values))
            })
            .collect();
        publish_siblings(results, part, address, computed)
    }
}

/// Normal and shear traction of the `SE` or `ST` tensor on each face.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceStressCalculator;

impl ResultCalculator for SurfaceStressCalculator {
    fn name(&self) -> &str {
        "surface-stress"
    }

    fn is_matching(&self, address: &ResultAddress) -> bool {
        plain_at(address, PositionType::ElementNodalFace, names::SE, &names::SURFACE_STRESS_COMPONENTS)
            || plain_at(address, PositionType::ElementNodalFace, names::ST, &names::SURFACE_STRESS_COMPONENTS)
    }

    fn calculate(
        &self,
        results: &PartResultsCollection,
        part: usize,
        address: &ResultAddress,
    ) -> EngineResult<ScalarResultFrames> {
        let mesh = results.part(part)?;
        let frame_count = results.frame_count();
        let tensor = names::STRESS_COMPONENTS
            .map(|c| address.with_position(PositionType::ElementNodal).with_component(c));
        let Some(inputs) = load_dependencies(results, part, tensor, address)? else {
            return Ok(results.create_scalar_result(part, address));
        };

        let mut normal = ScalarResultFrames::new(frame_count);
        let mut shear = ScalarResultFrames::new(frame_count);
        for frame in 0..frame_count {
            let slices = inputs.each_ref().map(|f| f.frame(frame));
            if slices.iter().any(|s| s.len() != mesh.element_node_count()) {
                continue;
            }
            let rows: Vec<[Value; 2]> = (0..mesh.element_count())
                .into_par_iter()
                .flat_map_iter(|elm| {
                    face_rows(mesh, elm, |face, local| {
                        let slot = mesh.element_node_result_index(elm, local);
                        let values = slices.map(|s| s[slot]);
                        let Some(n) = mesh.face_normal(elm, face) else {
                            return [UNDEFINED; 2];
                        };
                        if values.iter().any(|v| !v.is_finite()) {
                            return [UNDEFINED; 2];
                        }
                        let (sn, tp) = SymTensor(values.map(f64::from)).traction(&n);
                        [to_value(sn), to_value(tp)]
                    })
                })
                .collect();
            normal.set_frame(frame, rows.iter().map(|r| r[0]).collect());
            shear.set_frame(frame, rows.iter().map(|r| r[1]).collect());
        }

        let computed = vec![
            (address.with_component("SN"), normal),
            (address.with_component("TP"), shear),
        ];
        publish_siblings(results, part, address, computed)
    }
}
