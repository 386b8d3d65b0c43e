use gm_core::{Real, UNDEFINED, Value};
use gm_mesh::{HexFace, MeshError, Part};
use gm_results::{PositionType, ResultAddress, ScalarResultFrames};
use rayon::prelude::*;
use tracing::warn;

use super::{plain_at, undefined_single};
use crate::calculator::{ResultCalculator, load_dependency};
use crate::collection::PartResultsCollection;
use crate::error::EngineResult;
use crate::names;

/// Nodes this far above the reference face count as above it.
const LEVEL_TOL: Real = 1e-6;

/// Vertical displacement of each node relative to the top face of the
/// reference-layer cell in its (I, J) column.
#[derive(Debug, Clone, Copy)]
pub struct CompactionCalculator;

/// Top face nodes of the reference cell in each node's column, or `None`
/// when the node has no indexed column or lies above the reference face.
fn reference_faces(part: &Part, ref_k: usize) -> Result<Vec<Option<[usize; 4]>>, MeshError> {
    let grid = part.struct_grid()?;
    let adjacency = part.node_elements();

    let top_face = |cell: usize| -> ([usize; 4], Real) {
        let faces = [HexFace::PosK, HexFace::NegK].map(|f| {
            let nodes = part.face_nodes(cell, f.index());
            let z = nodes.iter().map(|&n| part.node_coord(n).z).sum::<Real>() / nodes.len() as Real;
            (std::array::from_fn(|i| nodes[i]), z)
        });
        if faces[0].1 >= faces[1].1 { faces[0] } else { faces[1] }
    };

    Ok((0..part.node_count())
        .into_par_iter()
        .map(|node| {
            let [i, j, _] = adjacency
                .elements_using_node(node)
                .iter()
                .find_map(|&elm| grid.ijk_from_cell_index(elm))?;
            let cell = grid.cell_index_from_ijk(i, j, ref_k)?;
            let (face, level) = top_face(cell);
            (part.node_coord(node).z <= level + LEVEL_TOL).then_some(face)
        })
        .collect())
}

impl ResultCalculator for CompactionCalculator {
    fn name(&self) -> &str {
        "compaction"
    }

    fn is_matching(&self, address: &ResultAddress) -> bool {
        plain_at(address, PositionType::Nodal, names::COMPACTION, &[""])
    }

    fn calculate(
        &self,
        results: &PartResultsCollection,
        part: usize,
        address: &ResultAddress,
    ) -> EngineResult<ScalarResultFrames> {
        let mesh = results.part(part)?;
        let ref_k = address
            .reference_layer_index()
            .unwrap_or(results.parameters().reference_layer);

        let faces = match reference_faces(mesh, ref_k) {
            Ok(faces) => faces,
            Err(MeshError::NotStructured { reason }) => {
                warn!(part, %reason, "compaction needs a structured grid");
                return Ok(undefined_single(mesh.node_count()));
            }
            Err(err) => return Err(err.into()),
        };

        let mut out = results.create_scalar_result(part, address);
        let u3_address = ResultAddress::new(PositionType::Nodal, names::U, "U3");
        let Some(u3) = load_dependency(results, part, &u3_address, address)? else {
            return Ok(out);
        };

        for frame in 0..results.frame_count() {
            let values = u3.frame(frame);
            if values.len() != mesh.node_count() {
                continue;
            }
            let compaction: Vec<Value> = faces
                .par_iter()
                .enumerate()
                .map(|(node, face)| {
                    let Some(face) = face else { return UNDEFINED };
                    let corner_values = face.map(|n| values[n]);
                    if !values[node].is_finite() || corner_values.iter().any(|v| !v.is_finite()) {
                        return UNDEFINED;
                    }
                    let u_ref = corner_values.iter().sum::<Value>() / 4.0;
                    values[node] - u_ref
                })
                .collect();
            out.set_frame(frame, compaction);
        }
        Ok(out)
    }
}
