//! Structured (I,J,K) addressing of topologically box-shaped hexahedral parts.
//!
//! Inference starts at the origin corner element (no neighbors across its
//! negative I, J and K faces) and walks the face-neighbor table, stepping one
//! logical index per face crossed. Every crossing must land on the neighbor's
//! opposite face and on a cell not already claimed by another element; any
//! contradiction is reported as `MeshError::InconsistentTopology`.

use std::collections::VecDeque;

use gm_core::Real;
use nalgebra::{Point3, Vector3};
use tracing::{debug, error, warn};

use crate::element::HexFace;
use crate::error::{MeshError, MeshResult};
use crate::part::Part;
use crate::search::BoundingBox;

/// IJK tables for one part. Built once, immutable afterwards.
#[derive(Debug, Clone)]
pub struct StructGridIndex {
    cell_counts: [usize; 3],
    ijk_of_element: Vec<Option<[usize; 3]>>,
    element_of_cell: Vec<Option<usize>>,
}

impl StructGridIndex {
    pub(crate) fn infer(part: &Part) -> MeshResult<Self> {
        let element_count = part.element_count();
        let neighbors = part.element_neighbors();

        let is_hex = |elm: usize| part.element_type(elm).is_hexahedral();
        if !(0..element_count).any(is_hex) {
            return Err(MeshError::NotStructured {
                reason: "part has no hexahedral elements".to_string(),
            });
        }

        let origins: Vec<usize> = (0..element_count)
            .filter(|&e| is_hex(e) && neighbors.neighbor_count(e) <= 3)
            .filter(|&e| {
                [HexFace::NegI, HexFace::NegJ, HexFace::NegK]
                    .iter()
                    .all(|f| neighbors.neighbor(e, f.index()).is_none())
            })
            .collect();
        let origin = match origins.as_slice() {
            [origin] => *origin,
            [] => {
                return Err(MeshError::NotStructured {
                    reason: "no origin corner element".to_string(),
                });
            }
            [first, second, ..] => {
                return Err(MeshError::NotStructured {
                    reason: format!(
                        "{} origin corner candidates, first elements {first} and {second}",
                        origins.len()
                    ),
                });
            }
        };

        let mut ijk: Vec<Option<[i64; 3]>> = vec![None; element_count];
        ijk[origin] = Some([0, 0, 0]);
        let mut min = [0i64; 3];
        let mut max = [0i64; 3];
        let mut queue = VecDeque::from([origin]);

        while let Some(elm) = queue.pop_front() {
            let Some(here) = ijk[elm] else { continue };
            for face in HexFace::ALL {
                let Some(nb) = neighbors.neighbor(elm, face.index()) else {
                    continue;
                };
                if !is_hex(nb.element) {
                    continue;
                }
                if nb.face != face.opposite().index() {
                    return Err(inconsistent(
                        part,
                        nb.element,
                        format!(
                            "entered through local face {} from element {elm} face {:?}, expected {:?}",
                            nb.face,
                            face,
                            face.opposite()
                        ),
                    ));
                }

                let step = face.ijk_offset();
                let there = [here[0] + step[0], here[1] + step[1], here[2] + step[2]];
                match ijk[nb.element] {
                    Some(existing) if existing != there => {
                        return Err(inconsistent(
                            part,
                            nb.element,
                            format!("reached as {there:?} but already indexed as {existing:?}"),
                        ));
                    }
                    Some(_) => {}
                    None => {
                        ijk[nb.element] = Some(there);
                        for axis in 0..3 {
                            min[axis] = min[axis].min(there[axis]);
                            max[axis] = max[axis].max(there[axis]);
                        }
                        queue.push_back(nb.element);
                    }
                }
            }
        }

        if min != [0, 0, 0] {
            debug!(part = %part.name(), ?min, "re-basing IJK indices");
        }

        let cell_counts = [
            (max[0] - min[0] + 1) as usize,
            (max[1] - min[1] + 1) as usize,
            (max[2] - min[2] + 1) as usize,
        ];
        let mut element_of_cell = vec![None; cell_counts[0] * cell_counts[1] * cell_counts[2]];
        let mut ijk_of_element = vec![None; element_count];

        for (elm, signed) in ijk.iter().enumerate() {
            let Some(s) = signed else { continue };
            let cell = [
                (s[0] - min[0]) as usize,
                (s[1] - min[1]) as usize,
                (s[2] - min[2]) as usize,
            ];
            let lin = cell[0] + cell_counts[0] * (cell[1] + cell_counts[1] * cell[2]);
            if let Some(other) = element_of_cell[lin] {
                return Err(inconsistent(
                    part,
                    elm,
                    format!("cell {cell:?} already occupied by element {other}"),
                ));
            }
            element_of_cell[lin] = Some(elm);
            ijk_of_element[elm] = Some(cell);
        }

        let indexed = ijk_of_element.iter().flatten().count();
        if indexed < element_count {
            warn!(
                part = %part.name(),
                unindexed = element_count - indexed,
                "elements outside the structured region have no IJK"
            );
        }
        debug!(part = %part.name(), ?cell_counts, "structured grid inferred");

        Ok(Self {
            cell_counts,
            ijk_of_element,
            element_of_cell,
        })
    }
}

fn inconsistent(part: &Part, element: usize, reason: String) -> MeshError {
    error!(part = %part.name(), element, %reason, "inconsistent mesh topology");
    MeshError::InconsistentTopology { element, reason }
}

/// Local corner node of a hexahedron at logical offset (di, dj, dk) ∈ {0,1}³.
fn hex_corner(di: usize, dj: usize, dk: usize) -> usize {
    const RING: [[usize; 2]; 2] = [[0, 3], [1, 2]];
    RING[di][dj] + 4 * dk
}

/// IJK queries bound to their part's geometry.
///
/// Cell indices are element indices of the part.
#[derive(Debug, Clone, Copy)]
pub struct StructGrid<'a> {
    part: &'a Part,
    index: &'a StructGridIndex,
}

impl<'a> StructGrid<'a> {
    pub(crate) fn new(part: &'a Part, index: &'a StructGridIndex) -> Self {
        Self { part, index }
    }

    pub fn cell_count_i(&self) -> usize {
        self.index.cell_counts[0]
    }

    pub fn cell_count_j(&self) -> usize {
        self.index.cell_counts[1]
    }

    pub fn cell_count_k(&self) -> usize {
        self.index.cell_counts[2]
    }

    /// Number of logical cells (occupied or not).
    pub fn cell_count(&self) -> usize {
        self.index.element_of_cell.len()
    }

    pub fn cell_index_from_ijk(&self, i: usize, j: usize, k: usize) -> Option<usize> {
        let [ni, nj, nk] = self.index.cell_counts;
        if i >= ni || j >= nj || k >= nk {
            return None;
        }
        self.index.element_of_cell[i + ni * (j + nj * k)]
    }

    pub fn ijk_from_cell_index(&self, cell: usize) -> Option<[usize; 3]> {
        self.index.ijk_of_element.get(cell).copied().flatten()
    }

    pub fn is_cell_valid(&self, i: usize, j: usize, k: usize) -> bool {
        self.cell_index_from_ijk(i, j, k).is_some()
    }

    /// The eight corners of a cell in hexahedron local node order.
    pub fn cell_corner_vertices(&self, cell: usize) -> Option<[Point3<Real>; 8]> {
        self.ijk_from_cell_index(cell)?;
        let conn = self.part.connectivity(cell);
        Some(std::array::from_fn(|n| self.part.node_coord(conn[n])))
    }

    pub fn cell_centroid(&self, cell: usize) -> Option<Point3<Real>> {
        self.ijk_from_cell_index(cell)?;
        Some(self.part.element_centroid(cell))
    }

    pub fn cell_min_max_coordinates(&self, cell: usize) -> Option<(Point3<Real>, Point3<Real>)> {
        self.ijk_from_cell_index(cell)?;
        let bbox = self.part.element_bounding_box(cell);
        Some((bbox.min, bbox.max))
    }

    /// Coordinate of grid point (i, j, k), where 0 ≤ i ≤ cell_count_i().
    pub fn grid_point_coordinate(&self, i: usize, j: usize, k: usize) -> Option<Point3<Real>> {
        let [ni, nj, nk] = self.index.cell_counts;
        if i > ni || j > nj || k > nk {
            return None;
        }
        let (ci, di) = if i == ni { (i - 1, 1) } else { (i, 0) };
        let (cj, dj) = if j == nj { (j - 1, 1) } else { (j, 0) };
        let (ck, dk) = if k == nk { (k - 1, 1) } else { (k, 0) };
        let cell = self.cell_index_from_ijk(ci, cj, ck)?;
        let node = self.part.connectivity(cell)[hex_corner(di, dj, dk)];
        Some(self.part.node_coord(node))
    }

    /// Cell containing `p`, if it is part of the structured region.
    pub fn find_cell_from_point(&self, p: &Point3<Real>) -> Option<usize> {
        self.part
            .find_elements_containing(p)
            .into_iter()
            .find(|&e| self.ijk_from_cell_index(e).is_some())
    }

    pub fn cell_ijk_from_point(&self, p: &Point3<Real>) -> Option<[usize; 3]> {
        self.find_cell_from_point(p)
            .and_then(|c| self.ijk_from_cell_index(c))
    }

    /// Cell across `face` of `cell` in IJK space.
    pub fn cell_ijk_neighbor(&self, cell: usize, face: HexFace) -> Option<usize> {
        let [i, j, k] = self.ijk_from_cell_index(cell)?;
        let step = face.ijk_offset();
        let shifted = |v: usize, d: i64| usize::try_from(v as i64 + d).ok();
        self.cell_index_from_ijk(shifted(i, step[0])?, shifted(j, step[1])?, shifted(k, step[2])?)
    }

    /// Mean coordinate of the corners on one local face of a cell.
    pub fn cell_face_center(&self, cell: usize, face: HexFace) -> Option<Point3<Real>> {
        self.ijk_from_cell_index(cell)?;
        Some(self.part.face_centroid(cell, face.index()))
    }

    /// Bounding box of all indexed cells.
    pub fn bounding_box(&self) -> BoundingBox {
        let mut bbox = BoundingBox::empty();
        for (elm, ijk) in self.index.ijk_of_element.iter().enumerate() {
            if ijk.is_some() {
                bbox = bbox.union(&self.part.element_bounding_box(elm));
            }
        }
        bbox
    }

    /// Direction of increasing K, averaged over the grid.
    pub fn k_direction(&self) -> Option<Vector3<Real>> {
        let mut dir = Vector3::zeros();
        for (elm, ijk) in self.index.ijk_of_element.iter().enumerate() {
            if ijk.is_some() {
                dir += self.part.face_centroid(elm, HexFace::PosK.index())
                    - self.part.face_centroid(elm, HexFace::NegK.index());
            }
        }
        dir.try_normalize(Real::EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementType;
    use crate::generate::box_part;

    #[test]
    fn grid_point_coordinates_span_the_box() {
        let part = box_part([2, 3, 1], [1.0, 2.0, 3.0], [1.0, 1.0, 2.0], ElementType::Hex8).unwrap();
        let grid = part.struct_grid().unwrap();
        assert_eq!(grid.grid_point_coordinate(0, 0, 0), Some(Point3::new(1.0, 2.0, 3.0)));
        assert_eq!(grid.grid_point_coordinate(2, 3, 1), Some(Point3::new(3.0, 5.0, 5.0)));
        assert_eq!(grid.grid_point_coordinate(3, 0, 0), None);
    }

    #[test]
    fn ijk_neighbors_follow_faces() {
        let part = box_part([3, 2, 2], [0.0; 3], [1.0; 3], ElementType::Hex8).unwrap();
        let grid = part.struct_grid().unwrap();
        let c = grid.cell_index_from_ijk(1, 0, 0).unwrap();
        let up = grid.cell_ijk_neighbor(c, HexFace::PosK).unwrap();
        assert_eq!(grid.ijk_from_cell_index(up), Some([1, 0, 1]));
        assert_eq!(grid.cell_ijk_neighbor(c, HexFace::NegJ), None);
        let k = grid.k_direction().unwrap();
        assert!((k - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-12);
    }

    #[test]
    fn tetrahedral_part_is_not_structured() {
        let mut b = crate::PartBuilder::new("tet");
        let n: Vec<usize> = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]
            .iter()
            .enumerate()
            .map(|(i, p)| b.add_node(i as i64, *p))
            .collect();
        b.add_element(1, ElementType::Tet4, &n);
        let part = b.build().unwrap();
        assert!(matches!(
            part.struct_grid(),
            Err(MeshError::NotStructured { .. })
        ));
    }

    #[test]
    fn disjoint_blocks_have_no_unique_origin() {
        let mut b = crate::PartBuilder::new("two-blocks");
        let mut id = 0;
        for x0 in [0.0, 5.0] {
            let nodes: Vec<usize> = [0.0, 1.0]
                .iter()
                .flat_map(|&z| [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]].map(|[x, y]| [x0 + x, y, z]))
                .map(|p| {
                    id += 1;
                    b.add_node(id, p)
                })
                .collect();
            b.add_element(id, ElementType::Hex8, &nodes);
        }
        let part = b.build().unwrap();
        match part.struct_grid() {
            Err(MeshError::NotStructured { reason }) => assert!(reason.contains("2 origin"), "{reason}"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
