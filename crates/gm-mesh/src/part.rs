//! A single mesh part: nodes, elements and lazily derived topology.

use gm_core::Real;
use nalgebra::{Point3, Vector3};
use once_cell::sync::OnceCell;
use tracing::debug;

use crate::adjacency::NodeElementAdjacency;
use crate::element::ElementType;
use crate::error::MeshResult;
use crate::face::FaceNodes;
use crate::neighbors::ElementNeighbors;
use crate::search::{BoundingBox, ElementSearchTree};
use crate::structured::{StructGrid, StructGridIndex};

/// Relative tolerance used by point-in-element tests.
const CONTAINMENT_TOL: Real = 1e-9;

/// An immutable mesh part.
///
/// Topology and geometry are fixed at construction. Derived structures
/// (adjacency, neighbors, search tree, IJK grid) are built on first access,
/// exactly once, and shared read-only afterwards.
#[derive(Debug)]
pub struct Part {
    pub(crate) name: String,
    pub(crate) node_ids: Vec<i64>,
    pub(crate) node_coords: Vec<Point3<Real>>,
    pub(crate) element_ids: Vec<i64>,
    pub(crate) element_types: Vec<ElementType>,
    /// Element e's nodes are `connectivities[connectivity_starts[e]..connectivity_starts[e+1]]`.
    pub(crate) connectivity_starts: Vec<usize>,
    pub(crate) connectivities: Vec<usize>,

    node_elements: OnceCell<NodeElementAdjacency>,
    element_node_owners: OnceCell<Vec<usize>>,
    face_slot_starts: OnceCell<Vec<usize>>,
    neighbors: OnceCell<ElementNeighbors>,
    search_tree: OnceCell<ElementSearchTree>,
    struct_grid: OnceCell<StructGridIndex>,
}

impl Part {
    pub(crate) fn from_parts(
        name: String,
        node_ids: Vec<i64>,
        node_coords: Vec<Point3<Real>>,
        element_ids: Vec<i64>,
        element_types: Vec<ElementType>,
        connectivity_starts: Vec<usize>,
        connectivities: Vec<usize>,
    ) -> Self {
        Self {
            name,
            node_ids,
            node_coords,
            element_ids,
            element_types,
            connectivity_starts,
            connectivities,
            node_elements: OnceCell::new(),
            element_node_owners: OnceCell::new(),
            face_slot_starts: OnceCell::new(),
            neighbors: OnceCell::new(),
            search_tree: OnceCell::new(),
            struct_grid: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node_count(&self) -> usize {
        self.node_coords.len()
    }

    pub fn element_count(&self) -> usize {
        self.element_types.len()
    }

    /// Total number of element corner slots (size of element-nodal buffers).
    pub fn element_node_count(&self) -> usize {
        self.connectivities.len()
    }

    /// Total number of element face-node slots (size of element-nodal-face buffers).
    pub fn element_nodal_face_count(&self) -> usize {
        self.face_slot_starts().last().copied().unwrap_or(0)
    }

    pub fn node_ids(&self) -> &[i64] {
        &self.node_ids
    }

    pub fn node_coords(&self) -> &[Point3<Real>] {
        &self.node_coords
    }

    pub fn node_coord(&self, node: usize) -> Point3<Real> {
        self.node_coords[node]
    }

    pub fn element_ids(&self) -> &[i64] {
        &self.element_ids
    }

    pub fn element_type(&self, elm: usize) -> ElementType {
        self.element_types[elm]
    }

    pub fn element_types(&self) -> &[ElementType] {
        &self.element_types
    }

    /// Node indices of `elm` in local order.
    pub fn connectivity(&self, elm: usize) -> &[usize] {
        &self.connectivities[self.connectivity_starts[elm]..self.connectivity_starts[elm + 1]]
    }

    pub fn connectivities(&self) -> &[usize] {
        &self.connectivities
    }

    /// Index of the first element-nodal value of `elm`.
    pub fn element_node_result_index(&self, elm: usize, local_node: usize) -> usize {
        self.connectivity_starts[elm] + local_node
    }

    /// Index of an element-nodal-face value: element, local face, position within the face.
    pub fn element_nodal_face_result_index(&self, elm: usize, face: usize, face_node: usize) -> usize {
        let etype = self.element_types[elm];
        let before: usize = (0..face).map(|f| etype.face_nodes(f).len()).sum();
        self.face_slot_starts()[elm] + before + face_node
    }

    /// Global node indices of a local face of `elm`.
    pub fn face_nodes(&self, elm: usize, face: usize) -> FaceNodes {
        let local = self.element_types[elm].face_nodes(face);
        let conn = self.connectivity(elm);
        FaceNodes::from_fn(local.len(), |i| conn[local[i]])
    }

    /// Element owning each element-nodal slot.
    pub fn element_node_owners(&self) -> &[usize] {
        self.element_node_owners.get_or_init(|| {
            let mut owners = Vec::with_capacity(self.connectivities.len());
            for elm in 0..self.element_count() {
                let n = self.connectivity_starts[elm + 1] - self.connectivity_starts[elm];
                owners.extend(std::iter::repeat_n(elm, n));
            }
            owners
        })
    }

    fn face_slot_starts(&self) -> &[usize] {
        self.face_slot_starts.get_or_init(|| {
            let mut starts = Vec::with_capacity(self.element_count() + 1);
            let mut acc = 0;
            starts.push(0);
            for etype in &self.element_types {
                acc += etype.face_node_slot_count();
                starts.push(acc);
            }
            starts
        })
    }

    pub fn node_elements(&self) -> &NodeElementAdjacency {
        self.node_elements.get_or_init(|| {
            debug!(part = %self.name, "building node to element adjacency");
            NodeElementAdjacency::build(
                self.node_count(),
                &self.connectivity_starts,
                &self.connectivities,
            )
        })
    }

    pub fn element_neighbors(&self) -> &ElementNeighbors {
        self.neighbors
            .get_or_init(|| ElementNeighbors::calculate(self))
    }

    pub fn search_tree(&self) -> &ElementSearchTree {
        self.search_tree
            .get_or_init(|| ElementSearchTree::build(self))
    }

    /// Structured (I,J,K) view of the part, inferred on first call.
    pub fn struct_grid(&self) -> MeshResult<StructGrid<'_>> {
        let index = self
            .struct_grid
            .get_or_try_init(|| StructGridIndex::infer(self))?;
        Ok(StructGrid::new(self, index))
    }

    pub fn element_corners(&self, elm: usize) -> impl Iterator<Item = Point3<Real>> + '_ {
        self.connectivity(elm).iter().map(|&n| self.node_coords[n])
    }

    pub fn element_centroid(&self, elm: usize) -> Point3<Real> {
        let conn = self.connectivity(elm);
        let sum = conn
            .iter()
            .fold(Vector3::zeros(), |acc, &n| acc + self.node_coords[n].coords);
        Point3::from(sum / conn.len().max(1) as Real)
    }

    pub fn element_bounding_box(&self, elm: usize) -> BoundingBox {
        BoundingBox::from_points(self.element_corners(elm))
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.node_coords.iter().copied())
    }

    pub fn face_centroid(&self, elm: usize, face: usize) -> Point3<Real> {
        let nodes = self.face_nodes(elm, face);
        let sum = nodes
            .iter()
            .fold(Vector3::zeros(), |acc, &n| acc + self.node_coords[n].coords);
        Point3::from(sum / nodes.len().max(1) as Real)
    }

    /// Unit normal of a face following its winding (Newell's method). `None` for degenerate faces.
    pub fn face_normal(&self, elm: usize, face: usize) -> Option<Vector3<Real>> {
        let nodes = self.face_nodes(elm, face);
        let mut n = Vector3::zeros();
        for i in 0..nodes.len() {
            let a = self.node_coords[nodes[i]];
            let b = self.node_coords[nodes[(i + 1) % nodes.len()]];
            n.x += (a.y - b.y) * (a.z + b.z);
            n.y += (a.z - b.z) * (a.x + b.x);
            n.z += (a.x - b.x) * (a.y + b.y);
        }
        n.try_normalize(Real::EPSILON)
    }

    /// True if `p` lies inside `elm` (treated as convex, either winding orientation).
    pub fn element_contains_point(&self, elm: usize, p: &Point3<Real>) -> bool {
        let bbox = self.element_bounding_box(elm);
        let tol = CONTAINMENT_TOL * bbox.extent().norm().max(1.0);
        if !bbox.contains(p, tol) {
            return false;
        }
        let center = self.element_centroid(elm);
        (0..self.element_types[elm].face_count()).all(|face| {
            let Some(normal) = self.face_normal(elm, face) else {
                return true;
            };
            let c = self.face_centroid(elm, face);
            let side_center = (center - c).dot(&normal);
            let side_point = (p - c).dot(&normal);
            side_point * side_center.signum() >= -tol
        })
    }

    /// Elements containing `p`, narrowed with the search tree.
    pub fn find_elements_containing(&self, p: &Point3<Real>) -> Vec<usize> {
        self.search_tree()
            .find_intersecting(&BoundingBox::from_points([*p]))
            .into_iter()
            .filter(|&elm| self.element_contains_point(elm, p))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::box_part;

    #[test]
    fn element_nodal_face_indices_are_dense() {
        let part = box_part([2, 1, 1], [0.0; 3], [1.0; 3], ElementType::Hex8).unwrap();
        assert_eq!(part.element_nodal_face_count(), 48);
        assert_eq!(part.element_nodal_face_result_index(0, 0, 0), 0);
        assert_eq!(part.element_nodal_face_result_index(0, 5, 3), 23);
        assert_eq!(part.element_nodal_face_result_index(1, 0, 0), 24);
    }

    #[test]
    fn unit_cube_geometry() {
        let part = box_part([1, 1, 1], [0.0; 3], [2.0; 3], ElementType::Hex8).unwrap();
        let c = part.element_centroid(0);
        assert!((c - Point3::new(1.0, 1.0, 1.0)).norm() < 1e-12);

        let n = part.face_normal(0, crate::HexFace::PosK.index()).unwrap();
        assert!((n - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-12);

        assert!(part.element_contains_point(0, &Point3::new(0.5, 1.5, 1.0)));
        assert!(!part.element_contains_point(0, &Point3::new(2.5, 1.0, 1.0)));
    }

    #[test]
    fn owners_follow_connectivity() {
        let part = box_part([2, 1, 1], [0.0; 3], [1.0; 3], ElementType::Hex8).unwrap();
        let owners = part.element_node_owners();
        assert_eq!(owners.len(), 16);
        assert!(owners[..8].iter().all(|&e| e == 0));
        assert!(owners[8..].iter().all(|&e| e == 1));
    }
}
