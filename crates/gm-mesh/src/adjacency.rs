//! Node → element adjacency in compressed (offsets + flat list) form.

/// For each node, the elements whose connectivity references it.
#[derive(Debug, Clone, Default)]
pub struct NodeElementAdjacency {
    /// Node i's elements are in `elements[offsets[i]..offsets[i+1]]`.
    offsets: Vec<usize>,
    elements: Vec<usize>,
}

impl NodeElementAdjacency {
    /// Build from per-element connectivity given as start offsets into a flat buffer.
    pub fn build(node_count: usize, connectivity_starts: &[usize], connectivities: &[usize]) -> Self {
        let element_count = connectivity_starts.len().saturating_sub(1);

        let mut counts = vec![0usize; node_count + 1];
        for &node in connectivities {
            counts[node + 1] += 1;
        }
        for i in 0..node_count {
            counts[i + 1] += counts[i];
        }
        let offsets = counts;

        // Elements are visited in index order, so each node's list ends up sorted.
        let mut cursor = offsets.clone();
        let mut elements = vec![0usize; connectivities.len()];
        for elm in 0..element_count {
            for &node in &connectivities[connectivity_starts[elm]..connectivity_starts[elm + 1]] {
                elements[cursor[node]] = elm;
                cursor[node] += 1;
            }
        }

        Self { offsets, elements }
    }

    pub fn node_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Elements using `node`, in ascending order. Out-of-range nodes yield an empty slice.
    pub fn elements_using_node(&self, node: usize) -> &[usize] {
        if node + 1 >= self.offsets.len() {
            return &[];
        }
        &self.elements[self.offsets[node]..self.offsets[node + 1]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_node_lists_both_elements() {
        // two triangles sharing nodes 1 and 2
        let starts = [0, 3, 6];
        let conn = [0, 1, 2, 1, 3, 2];
        let adj = NodeElementAdjacency::build(4, &starts, &conn);
        assert_eq!(adj.node_count(), 4);
        assert_eq!(adj.elements_using_node(0), &[0]);
        assert_eq!(adj.elements_using_node(1), &[0, 1]);
        assert_eq!(adj.elements_using_node(2), &[0, 1]);
        assert_eq!(adj.elements_using_node(3), &[1]);
        assert!(adj.elements_using_node(99).is_empty());
    }
}
