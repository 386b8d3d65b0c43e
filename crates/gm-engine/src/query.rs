//! Read-side accessors for consumers: value views, tensors and histories.

use std::ops::Deref;
use std::sync::Arc;

use gm_core::{Real, UNDEFINED, Value};
use gm_mesh::Part;
use gm_results::{PositionType, ResultAddress, ScalarResultFrames};
use nalgebra::Point3;

use crate::collection::PartResultsCollection;
use crate::error::{EngineError, EngineResult};
use crate::names;

/// A view of one frame of a cached result. Empty when the data is missing.
#[derive(Debug, Clone)]
pub struct ResultValues {
    frames: Arc<ScalarResultFrames>,
    frame: usize,
}

impl ResultValues {
    pub fn frame_index(&self) -> usize {
        self.frame
    }
}

impl Deref for ResultValues {
    type Target = [Value];

    fn deref(&self) -> &[Value] {
        self.frames.frame(self.frame)
    }
}

impl PartResultsCollection {
    fn check_frame(&self, frame: usize) -> EngineResult<()> {
        if frame >= self.frame_count() {
            return Err(EngineError::FrameOutOfRange {
                frame,
                count: self.frame_count(),
            });
        }
        Ok(())
    }

    pub fn result_values(&self, address: &ResultAddress, part: usize, frame: usize) -> EngineResult<ResultValues> {
        self.check_frame(frame)?;
        let frames = self.find_or_load_scalar_result(part, address)?;
        Ok(ResultValues { frames, frame })
    }

    /// The six components of a stress or strain field, per value.
    ///
    /// Empty if any component is missing for `frame`.
    pub fn tensors(&self, address: &ResultAddress, part: usize, frame: usize) -> EngineResult<Vec<[Value; 6]>> {
        self.check_frame(frame)?;
        let components = names::tensor_component_addresses(address).ok_or_else(|| EngineError::InvalidAddress {
            address: address.to_string(),
            reason: "not a tensor field".to_string(),
        })?;
        let mut loaded = Vec::with_capacity(6);
        for c in &components {
            loaded.push(self.find_or_load_scalar_result(part, c)?);
        }
        let slices: Vec<&[Value]> = loaded.iter().map(|f| f.frame(frame)).collect();
        let len = slices[0].len();
        if slices.iter().any(|s| s.is_empty() || s.len() != len) {
            return Ok(Vec::new());
        }
        Ok((0..len).map(|i| std::array::from_fn(|c| slices[c][i])).collect())
    }

    /// Values at the corner closest to `point`, for every frame.
    ///
    /// `None` when no element contains the point.
    pub fn time_history(&self, address: &ResultAddress, point: &Point3<Real>) -> EngineResult<Option<Vec<Value>>> {
        let Some((part_index, elm)) = self.parts().find_containing_element(point) else {
            return Ok(None);
        };
        let part = self.part(part_index)?;
        let index = history_index(part, elm, address.position(), point);
        let frames = self.find_or_load_scalar_result(part_index, address)?;
        Ok(Some(
            (0..self.frame_count())
                .map(|f| frames.frame(f).get(index).copied().unwrap_or(UNDEFINED))
                .collect(),
        ))
    }
}

fn closest_corner(part: &Part, elm: usize, point: &Point3<Real>) -> usize {
    part.connectivity(elm)
        .iter()
        .enumerate()
        .map(|(local, &node)| (local, (part.node_coord(node) - point).norm_squared()))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map_or(0, |(local, _)| local)
}

/// Buffer index of the value nearest `point` inside `elm`.
fn history_index(part: &Part, elm: usize, position: PositionType, point: &Point3<Real>) -> usize {
    match position {
        PositionType::Element | PositionType::FormationNames => elm,
        PositionType::Nodal | PositionType::Differentials => {
            part.connectivity(elm)[closest_corner(part, elm, point)]
        }
        PositionType::ElementNodal => part.element_node_result_index(elm, closest_corner(part, elm, point)),
        PositionType::ElementNodalFace => {
            let face_count = part.element_type(elm).face_count();
            let face = (0..face_count)
                .min_by(|&a, &b| {
                    let da = (part.face_centroid(elm, a) - point).norm_squared();
                    let db = (part.face_centroid(elm, b) - point).norm_squared();
                    da.total_cmp(&db)
                })
                .unwrap_or(0);
            let face_node = part
                .face_nodes(elm, face)
                .iter()
                .enumerate()
                .map(|(slot, &node)| (slot, (part.node_coord(node) - point).norm_squared()))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map_or(0, |(slot, _)| slot);
            part.element_nodal_face_result_index(elm, face, face_node)
        }
    }
}
