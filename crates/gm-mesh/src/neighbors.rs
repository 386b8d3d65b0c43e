//! Element → element face-neighbor table.

use tracing::debug;

use crate::face::FaceComparator;
use crate::part::Part;

/// The element and local face on the other side of a shared face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceNeighbor {
    pub element: usize,
    pub face: usize,
}

/// Per element, per local face: the neighbor across that face, if any.
#[derive(Debug, Clone, Default)]
pub struct ElementNeighbors {
    /// Element e's face slots are `slots[face_starts[e]..face_starts[e+1]]`.
    face_starts: Vec<usize>,
    slots: Vec<Option<FaceNeighbor>>,
}

impl ElementNeighbors {
    /// Discover face neighbors of every element of `part`.
    ///
    /// Candidates for a face are the elements sharing the face's first node.
    /// Faces without a matching candidate stay `None` (boundary faces).
    pub fn calculate(part: &Part) -> Self {
        let adjacency = part.node_elements();
        let element_count = part.element_count();

        let mut face_starts = Vec::with_capacity(element_count + 1);
        face_starts.push(0);
        for elm in 0..element_count {
            face_starts.push(face_starts[elm] + part.element_type(elm).face_count());
        }
        let mut slots = vec![None; face_starts[element_count]];

        let mut comparator = FaceComparator::new();
        for elm in 0..element_count {
            let etype = part.element_type(elm);
            for face in 0..etype.face_count() {
                let nodes = part.face_nodes(elm, face);
                comparator.set_main_face(&nodes);

                let mut found = None;
                'candidates: for &candidate in adjacency.elements_using_node(nodes[0]) {
                    if candidate == elm {
                        continue;
                    }
                    for cand_face in 0..part.element_type(candidate).face_count() {
                        if comparator.is_same_but_opposite(&part.face_nodes(candidate, cand_face)) {
                            found = Some(FaceNeighbor {
                                element: candidate,
                                face: cand_face,
                            });
                            break 'candidates;
                        }
                    }
                }
                slots[face_starts[elm] + face] = found;
            }
        }

        let table = Self { face_starts, slots };
        debug!(
            part = %part.name(),
            elements = element_count,
            boundary_faces = table.boundary_face_count(),
            "element neighbors calculated"
        );
        table
    }

    pub fn element_count(&self) -> usize {
        self.face_starts.len().saturating_sub(1)
    }

    /// Neighbor of `elm` across local `face`.
    pub fn neighbor(&self, elm: usize, face: usize) -> Option<FaceNeighbor> {
        let start = *self.face_starts.get(elm)?;
        let end = *self.face_starts.get(elm + 1)?;
        if start + face >= end {
            return None;
        }
        self.slots[start + face]
    }

    /// All face slots of `elm`.
    pub fn element_faces(&self, elm: usize) -> &[Option<FaceNeighbor>] {
        match (self.face_starts.get(elm), self.face_starts.get(elm + 1)) {
            (Some(&s), Some(&e)) => &self.slots[s..e],
            _ => &[],
        }
    }

    pub fn neighbor_count(&self, elm: usize) -> usize {
        self.element_faces(elm).iter().flatten().count()
    }

    pub fn boundary_face_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_none()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::PartBuilder;
    use crate::element::ElementType;

    #[test]
    fn two_tets_share_one_face() {
        let mut b = PartBuilder::new("tets");
        let n0 = b.add_node(1, [0.0, 0.0, 0.0]);
        let n1 = b.add_node(2, [1.0, 0.0, 0.0]);
        let n2 = b.add_node(3, [0.0, 1.0, 0.0]);
        let n3 = b.add_node(4, [0.0, 0.0, 1.0]);
        let n4 = b.add_node(5, [0.0, 0.0, -1.0]);
        b.add_element(1, ElementType::Tet4, &[n0, n1, n2, n3]);
        // mirrored below the z=0 plane, same orientation sense
        b.add_element(2, ElementType::Tet4, &[n0, n2, n1, n4]);
        let part = b.build().unwrap();

        let nb = part.element_neighbors();
        assert_eq!(nb.neighbor_count(0), 1);
        assert_eq!(nb.neighbor_count(1), 1);
        assert_eq!(nb.neighbor(0, 0), Some(FaceNeighbor { element: 1, face: 0 }));
        assert_eq!(nb.neighbor(1, 0), Some(FaceNeighbor { element: 0, face: 0 }));
        assert_eq!(nb.boundary_face_count(), 6);
    }

    #[test]
    fn out_of_range_queries_are_none() {
        let part = crate::generate::box_part([1, 1, 1], [0.0; 3], [1.0; 3], ElementType::Hex8)
            .unwrap();
        let nb = part.element_neighbors();
        assert_eq!(nb.neighbor(0, 17), None);
        assert_eq!(nb.neighbor(5, 0), None);
        assert!(nb.element_faces(5).is_empty());
    }
}
