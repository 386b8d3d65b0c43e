//! Part validation.

use std::collections::HashSet;

use crate::element::ElementType;
use crate::error::{MeshError, MeshResult};

pub(crate) fn validate_unique_ids(what: &'static str, ids: &[i64]) -> MeshResult<()> {
    let mut seen = HashSet::with_capacity(ids.len());
    for &id in ids {
        if !seen.insert(id) {
            return Err(MeshError::DuplicateId { what, id });
        }
    }
    Ok(())
}

pub(crate) fn validate_connectivity(
    node_count: usize,
    element_types: &[ElementType],
    connectivity_starts: &[usize],
    connectivities: &[usize],
) -> MeshResult<()> {
    for (elm, etype) in element_types.iter().enumerate() {
        let nodes = &connectivities[connectivity_starts[elm]..connectivity_starts[elm + 1]];
        if nodes.len() != etype.node_count() {
            return Err(MeshError::WrongNodeCount {
                element: elm,
                expected: etype.node_count(),
                actual: nodes.len(),
            });
        }
        if let Some(&node) = nodes.iter().find(|&&n| n >= node_count) {
            return Err(MeshError::InvalidNodeRef {
                element: elm,
                node,
                node_count,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_ids_rejected() {
        assert!(validate_unique_ids("node", &[1, 2, 3]).is_ok());
        assert_eq!(
            validate_unique_ids("node", &[1, 2, 1]),
            Err(MeshError::DuplicateId { what: "node", id: 1 })
        );
    }
}
