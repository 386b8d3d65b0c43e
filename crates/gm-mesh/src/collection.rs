//! Ordered set of parts with global index translation.

use gm_core::Real;
use nalgebra::Point3;

use crate::error::{MeshError, MeshResult};
use crate::part::Part;
use crate::search::BoundingBox;

/// Owns the parts of a model and the cumulative offsets between them.
///
/// Offsets have one entry more than there are parts: part p's elements are
/// global indices `element_offsets[p]..element_offsets[p+1]`.
#[derive(Debug)]
pub struct PartCollection {
    parts: Vec<Part>,
    element_offsets: Vec<usize>,
    node_offsets: Vec<usize>,
    connectivity_offsets: Vec<usize>,
}

impl Default for PartCollection {
    fn default() -> Self {
        Self {
            parts: Vec::new(),
            element_offsets: vec![0],
            node_offsets: vec![0],
            connectivity_offsets: vec![0],
        }
    }
}

impl PartCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a part and return its index.
    pub fn add_part(&mut self, part: Part) -> usize {
        push_offset(&mut self.element_offsets, part.element_count());
        push_offset(&mut self.node_offsets, part.node_count());
        push_offset(&mut self.connectivity_offsets, part.element_node_count());
        self.parts.push(part);
        self.parts.len() - 1
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    pub fn part(&self, index: usize) -> Option<&Part> {
        self.parts.get(index)
    }

    pub fn try_part(&self, index: usize) -> MeshResult<&Part> {
        self.parts.get(index).ok_or(MeshError::PartOutOfRange {
            index,
            count: self.parts.len(),
        })
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn total_element_count(&self) -> usize {
        *self.element_offsets.last().unwrap_or(&0)
    }

    pub fn total_node_count(&self) -> usize {
        *self.node_offsets.last().unwrap_or(&0)
    }

    pub fn total_element_node_count(&self) -> usize {
        *self.connectivity_offsets.last().unwrap_or(&0)
    }

    pub fn global_element_index(&self, part: usize, elm: usize) -> Option<usize> {
        global_index(&self.element_offsets, part, elm)
    }

    pub fn global_node_index(&self, part: usize, node: usize) -> Option<usize> {
        global_index(&self.node_offsets, part, node)
    }

    pub fn global_element_node_index(&self, part: usize, slot: usize) -> Option<usize> {
        global_index(&self.connectivity_offsets, part, slot)
    }

    /// (part, local element) of a global element index.
    pub fn local_element_index(&self, global: usize) -> Option<(usize, usize)> {
        local_index(&self.element_offsets, global)
    }

    /// (part, local node) of a global node index.
    pub fn local_node_index(&self, global: usize) -> Option<(usize, usize)> {
        local_index(&self.node_offsets, global)
    }

    pub fn local_element_node_index(&self, global: usize) -> Option<(usize, usize)> {
        local_index(&self.connectivity_offsets, global)
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.parts
            .iter()
            .fold(BoundingBox::empty(), |b, p| b.union(&p.bounding_box()))
    }

    /// First (part, element) containing `p`.
    pub fn find_containing_element(&self, p: &Point3<Real>) -> Option<(usize, usize)> {
        self.parts.iter().enumerate().find_map(|(pi, part)| {
            part.find_elements_containing(p)
                .first()
                .map(|&elm| (pi, elm))
        })
    }
}

fn push_offset(offsets: &mut Vec<usize>, count: usize) {
    let last = *offsets.last().unwrap_or(&0);
    offsets.push(last + count);
}

fn global_index(offsets: &[usize], part: usize, local: usize) -> Option<usize> {
    let start = *offsets.get(part)?;
    let end = *offsets.get(part + 1)?;
    (start + local < end).then_some(start + local)
}

fn local_index(offsets: &[usize], global: usize) -> Option<(usize, usize)> {
    let total = *offsets.last()?;
    if global >= total {
        return None;
    }
    // Last offset not greater than `global`; empty parts share offsets and are skipped.
    let part = offsets.partition_point(|&o| o <= global) - 1;
    Some((part, global - offsets[part]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementType;
    use crate::generate::box_part;

    fn two_parts() -> PartCollection {
        let mut pc = PartCollection::new();
        pc.add_part(box_part([2, 1, 1], [0.0; 3], [1.0; 3], ElementType::Hex8).unwrap());
        pc.add_part(box_part([1, 1, 1], [5.0, 0.0, 0.0], [1.0; 3], ElementType::Hex8).unwrap());
        pc
    }

    #[test]
    fn offsets_translate_both_ways() {
        let pc = two_parts();
        assert_eq!(pc.total_element_count(), 3);
        assert_eq!(pc.total_node_count(), 12 + 8);
        assert_eq!(pc.global_element_index(1, 0), Some(2));
        assert_eq!(pc.global_element_index(1, 1), None);
        assert_eq!(pc.local_element_index(2), Some((1, 0)));
        assert_eq!(pc.local_element_index(1), Some((0, 1)));
        assert_eq!(pc.local_element_index(3), None);
        assert_eq!(pc.local_node_index(12), Some((1, 0)));
        assert_eq!(pc.global_element_node_index(1, 7), Some(23));
    }

    #[test]
    fn point_lookup_spans_parts() {
        let pc = two_parts();
        assert_eq!(pc.find_containing_element(&Point3::new(1.5, 0.5, 0.5)), Some((0, 1)));
        assert_eq!(pc.find_containing_element(&Point3::new(5.5, 0.5, 0.5)), Some((1, 0)));
        assert_eq!(pc.find_containing_element(&Point3::new(3.5, 0.5, 0.5)), None);
        assert!(pc.try_part(4).is_err());
    }
}
