//! Face comparison for element-neighbor discovery.
//!
//! Two elements are face-adjacent when they share a face whose node sequence is
//! traversed in opposite winding order. The comparator canonicalizes both faces
//! at their smallest node index and walks one forward and the other backward,
//! so a comparison costs O(face size) and never allocates.

use std::ops::Deref;

/// Largest face (quadrilateral) among the supported element types.
pub const MAX_FACE_NODES: usize = 4;

/// Global node indices of one element face, stored inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceNodes {
    nodes: [usize; MAX_FACE_NODES],
    len: usize,
}

impl FaceNodes {
    pub fn from_slice(nodes: &[usize]) -> Self {
        debug_assert!(nodes.len() <= MAX_FACE_NODES);
        let len = nodes.len().min(MAX_FACE_NODES);
        let mut buf = [0; MAX_FACE_NODES];
        buf[..len].copy_from_slice(&nodes[..len]);
        Self { nodes: buf, len }
    }

    pub(crate) fn from_fn(len: usize, mut f: impl FnMut(usize) -> usize) -> Self {
        debug_assert!(len <= MAX_FACE_NODES);
        let len = len.min(MAX_FACE_NODES);
        let mut buf = [0; MAX_FACE_NODES];
        for (i, slot) in buf.iter_mut().enumerate().take(len) {
            *slot = f(i);
        }
        Self { nodes: buf, len }
    }
}

impl Deref for FaceNodes {
    type Target = [usize];

    fn deref(&self) -> &[usize] {
        &self.nodes[..self.len]
    }
}

/// Holds a "main" face and tests candidate faces against it.
#[derive(Debug, Clone, Default)]
pub struct FaceComparator {
    main: [usize; MAX_FACE_NODES],
    len: usize,
    min_pos: usize,
}

impl FaceComparator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the face every later candidate is compared against.
    pub fn set_main_face(&mut self, nodes: &[usize]) {
        debug_assert!(nodes.len() <= MAX_FACE_NODES);
        self.len = nodes.len().min(MAX_FACE_NODES);
        self.main[..self.len].copy_from_slice(&nodes[..self.len]);
        self.min_pos = min_position(&self.main[..self.len]);
    }

    /// True if `candidate` is the main face traversed in the opposite winding.
    pub fn is_same_but_opposite(&self, candidate: &[usize]) -> bool {
        let n = self.len;
        if n == 0 || candidate.len() != n {
            return false;
        }

        let cand_min_pos = min_position(candidate);
        if candidate[cand_min_pos] != self.main[self.min_pos] {
            return false;
        }

        (1..n).all(|step| {
            candidate[(cand_min_pos + step) % n] == self.main[(self.min_pos + n - step) % n]
        })
    }
}

fn min_position(nodes: &[usize]) -> usize {
    let mut pos = 0;
    for (i, &n) in nodes.iter().enumerate().skip(1) {
        if n < nodes[pos] {
            pos = i;
        }
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn matches(main: &[usize], cand: &[usize]) -> bool {
        let mut cmp = FaceComparator::new();
        cmp.set_main_face(main);
        cmp.is_same_but_opposite(cand)
    }

    #[test]
    fn adjacent_hex_faces_match() {
        // +I face of one hex against the -I face of its neighbor
        let main = [1, 2, 6, 5];
        let cand = [1, 5, 6, 2];
        assert!(matches(&main, &cand));
        assert!(matches(&cand, &main));
    }

    #[test]
    fn same_winding_does_not_match() {
        assert!(!matches(&[1, 2, 6, 5], &[2, 6, 5, 1]));
        assert!(!matches(&[1, 2, 6, 5], &[1, 2, 6, 5]));
    }

    #[test]
    fn different_sizes_or_nodes_do_not_match() {
        assert!(!matches(&[1, 2, 6, 5], &[1, 6, 2]));
        assert!(!matches(&[1, 2, 6, 5], &[1, 5, 7, 2]));
        assert!(!matches(&[], &[]));
    }

    #[test]
    fn triangles_match_in_opposite_winding() {
        assert!(matches(&[4, 9, 7], &[7, 9, 4]));
        assert!(matches(&[4, 9, 7], &[9, 4, 7]));
        assert!(!matches(&[4, 9, 7], &[9, 7, 4]));
    }

    fn distinct_face() -> impl Strategy<Value = Vec<usize>> {
        prop::collection::btree_set(0usize..1000, 3..=4)
            .prop_map(|s| s.into_iter().collect::<Vec<_>>())
            .prop_shuffle()
    }

    proptest! {
        #[test]
        fn reversed_rotation_always_matches(face in distinct_face(), rot in 0usize..4) {
            let mut cand: Vec<usize> = face.iter().rev().copied().collect();
            let r = rot % cand.len();
            cand.rotate_left(r);
            prop_assert!(matches(&face, &cand));
            prop_assert!(matches(&cand, &face));
        }

        #[test]
        fn forward_rotation_never_matches(face in distinct_face(), rot in 0usize..4) {
            let mut cand = face.clone();
            let r = rot % cand.len();
            cand.rotate_left(r);
            prop_assert!(!matches(&face, &cand));
        }

        #[test]
        fn comparison_is_symmetric(a in distinct_face(), b in distinct_face()) {
            prop_assert_eq!(matches(&a, &b), matches(&b, &a));
        }
    }
}
