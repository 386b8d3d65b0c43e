//! Incremental part builder.

use gm_core::Real;
use nalgebra::Point3;

use crate::element::ElementType;
use crate::error::MeshResult;
use crate::part::Part;
use crate::validate;

/// Builder for constructing a part incrementally.
///
/// Use `add_node` and `add_element` to fill the tables,
/// then call `build()` to validate and freeze them into an immutable `Part`.
#[derive(Debug)]
pub struct PartBuilder {
    name: String,
    node_ids: Vec<i64>,
    node_coords: Vec<Point3<Real>>,
    element_ids: Vec<i64>,
    element_types: Vec<ElementType>,
    connectivity_starts: Vec<usize>,
    connectivities: Vec<usize>,
}

impl PartBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            node_ids: Vec::new(),
            node_coords: Vec::new(),
            element_ids: Vec::new(),
            element_types: Vec::new(),
            connectivity_starts: vec![0],
            connectivities: Vec::new(),
        }
    }

    pub fn with_capacity(name: impl Into<String>, nodes: usize, elements: usize) -> Self {
        let mut b = Self::new(name);
        b.node_ids.reserve(nodes);
        b.node_coords.reserve(nodes);
        b.element_ids.reserve(elements);
        b.element_types.reserve(elements);
        b.connectivity_starts.reserve(elements);
        b.connectivities.reserve(elements * 8);
        b
    }

    /// Add a node and return its index within the part.
    pub fn add_node(&mut self, id: i64, xyz: [Real; 3]) -> usize {
        self.node_ids.push(id);
        self.node_coords.push(Point3::from(xyz));
        self.node_coords.len() - 1
    }

    /// Add an element over node indices (not node ids) and return its index.
    pub fn add_element(&mut self, id: i64, element_type: ElementType, nodes: &[usize]) -> usize {
        self.element_ids.push(id);
        self.element_types.push(element_type);
        self.connectivities.extend_from_slice(nodes);
        self.connectivity_starts.push(self.connectivities.len());
        self.element_types.len() - 1
    }

    pub fn node_count(&self) -> usize {
        self.node_coords.len()
    }

    pub fn element_count(&self) -> usize {
        self.element_types.len()
    }

    /// Validate and freeze the part.
    pub fn build(self) -> MeshResult<Part> {
        validate::validate_unique_ids("node", &self.node_ids)?;
        validate::validate_unique_ids("element", &self.element_ids)?;
        validate::validate_connectivity(
            self.node_coords.len(),
            &self.element_types,
            &self.connectivity_starts,
            &self.connectivities,
        )?;

        Ok(Part::from_parts(
            self.name,
            self.node_ids,
            self.node_coords,
            self.element_ids,
            self.element_types,
            self.connectivity_starts,
            self.connectivities,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MeshError;

    #[test]
    fn builder_basic() {
        let mut b = PartBuilder::new("p");
        let n: Vec<usize> = (0..4).map(|i| b.add_node(10 + i, [i as Real, 0.0, 0.0])).collect();
        let e = b.add_element(7, ElementType::Tet4, &n);
        assert_eq!(e, 0);
        assert_eq!(b.node_count(), 4);
        let part = b.build().unwrap();
        assert_eq!(part.connectivity(0), &[0, 1, 2, 3]);
        assert_eq!(part.element_ids(), &[7]);
    }

    #[test]
    fn build_rejects_bad_node_reference() {
        let mut b = PartBuilder::new("p");
        b.add_node(1, [0.0; 3]);
        b.add_element(1, ElementType::Tet4, &[0, 0, 0, 5]);
        assert!(matches!(
            b.build(),
            Err(MeshError::InvalidNodeRef { element: 0, node: 5, .. })
        ));
    }

    #[test]
    fn build_rejects_wrong_node_count() {
        let mut b = PartBuilder::new("p");
        for i in 0..4 {
            b.add_node(i, [0.0; 3]);
        }
        b.add_element(1, ElementType::Hex8, &[0, 1, 2, 3]);
        assert!(matches!(b.build(), Err(MeshError::WrongNodeCount { .. })));
    }
}
