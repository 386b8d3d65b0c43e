//! Error types for the results engine.

use gm_mesh::MeshError;
use gm_results::ResultsError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Mesh error: {0}")]
    Mesh(#[from] MeshError),

    #[error("Results error: {0}")]
    Results(#[from] ResultsError),

    #[error("Part index {index} out of range (part count {count})")]
    PartOutOfRange { index: usize, count: usize },

    #[error("Frame {frame} out of range ({count} frames)")]
    FrameOutOfRange { frame: usize, count: usize },

    #[error("Cyclic dependency while resolving {address} on part {part}")]
    CyclicDependency { address: String, part: usize },

    #[error("Several calculators match {address}: {calculators:?}")]
    AmbiguousCalculator {
        address: String,
        calculators: Vec<String>,
    },

    #[error("No calculator produces {address}")]
    NoCalculator { address: String },

    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Invalid parameter {what}: {reason}")]
    InvalidParameter { what: &'static str, reason: String },

    #[error("Reader error: {message}")]
    Reader { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
