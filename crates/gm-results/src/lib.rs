//! gm-results: result addressing, frame storage and statistics.

pub mod address;
pub mod frames;
pub mod part_results;
pub mod statistics;

pub use address::{PositionType, ResultAddress, value_count};
pub use frames::ScalarResultFrames;
pub use part_results::PartResults;
pub use statistics::{
    HISTOGRAM_BIN_COUNT, ScalarStatistics, StatisticsCache, StatisticsScope, StatisticsStore,
};

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ResultsError {
    #[error("Frame {frame} out of range for {address} ({count} frames)")]
    FrameOutOfRange {
        address: String,
        frame: usize,
        count: usize,
    },

    #[error("Frame {frame} of {address} has {actual} values, expected {expected}")]
    ValueCountMismatch {
        address: String,
        frame: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Result {address} has {actual} frames, expected {expected}")]
    FrameCountMismatch {
        address: String,
        expected: usize,
        actual: usize,
    },
}
