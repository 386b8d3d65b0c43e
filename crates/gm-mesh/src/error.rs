//! Mesh-specific error types.

use thiserror::Error;

pub type MeshResult<T> = Result<T, MeshError>;

/// Mesh construction, topology and structured-grid errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeshError {
    /// An element refers to a node index that doesn't exist.
    #[error("Element {element} refers to non-existent node index {node} (node count {node_count})")]
    InvalidNodeRef {
        element: usize,
        node: usize,
        node_count: usize,
    },

    /// Connectivity length doesn't match the element type.
    #[error("Element {element} has {actual} nodes, its type needs {expected}")]
    WrongNodeCount {
        element: usize,
        expected: usize,
        actual: usize,
    },

    /// Two nodes or two elements share an external id.
    #[error("Duplicate {what} id {id}")]
    DuplicateId { what: &'static str, id: i64 },

    /// The part cannot be addressed as a structured (I,J,K) grid.
    #[error("Part is not a structured hexahedral grid: {reason}")]
    NotStructured { reason: String },

    /// Structured-grid inference met a neighbor relation that contradicts the grid layout.
    #[error("Inconsistent topology at element {element}: {reason}")]
    InconsistentTopology { element: usize, reason: String },

    /// Part index outside the collection.
    #[error("Part index {index} out of range (part count {count})")]
    PartOutOfRange { index: usize, count: usize },
}
