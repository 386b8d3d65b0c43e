//! Per-frame value buffers of one result address.

use gm_core::Value;

use crate::{ResultsError, ResultsResult};

/// One dense buffer per frame.
///
/// Single-frame results (static properties, formation indices) keep one
/// buffer and answer every frame index with it. An empty buffer means the
/// data for that frame is missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScalarResultFrames {
    frames: Vec<Vec<Value>>,
    single_frame: bool,
}

impl ScalarResultFrames {
    /// `frame_count` empty frames.
    pub fn new(frame_count: usize) -> Self {
        Self {
            frames: vec![Vec::new(); frame_count],
            single_frame: false,
        }
    }

    /// A result holding one buffer shared by all frames.
    pub fn single(values: Vec<Value>) -> Self {
        Self {
            frames: vec![values],
            single_frame: true,
        }
    }

    pub fn enable_as_single_frame(&mut self) {
        self.frames.truncate(1);
        if self.frames.is_empty() {
            self.frames.push(Vec::new());
        }
        self.single_frame = true;
    }

    pub fn is_single_frame(&self) -> bool {
        self.single_frame
    }

    /// Number of stored buffers (1 for single-frame results).
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn slot(&self, frame: usize) -> usize {
        if self.single_frame { 0 } else { frame }
    }

    /// Values of `frame`; empty if the frame is missing or out of range.
    pub fn frame(&self, frame: usize) -> &[Value] {
        self.frames
            .get(self.slot(frame))
            .map_or(&[][..], |v| v.as_slice())
    }

    /// Mutable buffer of `frame`. Panics if the frame is out of range.
    pub fn frame_mut(&mut self, frame: usize) -> &mut Vec<Value> {
        let slot = self.slot(frame);
        &mut self.frames[slot]
    }

    pub fn set_frame(&mut self, frame: usize, values: Vec<Value>) {
        *self.frame_mut(frame) = values;
    }

    /// Release the values of `frame`, leaving it missing. Ignores frames out of range.
    pub fn clear_frame(&mut self, frame: usize) {
        let slot = self.slot(frame);
        if let Some(values) = self.frames.get_mut(slot) {
            *values = Vec::new();
        }
    }

    pub fn frames(&self) -> impl Iterator<Item = &[Value]> {
        self.frames.iter().map(|v| v.as_slice())
    }

    /// True when no frame holds data.
    pub fn is_empty(&self) -> bool {
        self.frames.iter().all(|f| f.is_empty())
    }

    /// Check every populated frame against the expected sizes.
    pub fn validate(&self, address: &str, frame_count: usize, value_count: usize) -> ResultsResult<()> {
        if !self.single_frame && self.frames.len() != frame_count {
            return Err(ResultsError::FrameCountMismatch {
                address: address.to_string(),
                expected: frame_count,
                actual: self.frames.len(),
            });
        }
        for (frame, values) in self.frames.iter().enumerate() {
            if !values.is_empty() && values.len() != value_count {
                return Err(ResultsError::ValueCountMismatch {
                    address: address.to_string(),
                    frame,
                    expected: value_count,
                    actual: values.len(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_frame_broadcasts() {
        let mut f = ScalarResultFrames::new(3);
        f.set_frame(0, vec![1.0, 2.0]);
        f.enable_as_single_frame();
        assert_eq!(f.frame_count(), 1);
        assert_eq!(f.frame(0), &[1.0, 2.0]);
        assert_eq!(f.frame(7), &[1.0, 2.0]);
    }

    #[test]
    fn cleared_frame_reads_as_missing() {
        let mut f = ScalarResultFrames::new(2);
        f.set_frame(0, vec![1.0]);
        f.set_frame(1, vec![2.0]);
        f.clear_frame(1);
        f.clear_frame(9);
        assert_eq!(f.frame(0), &[1.0]);
        assert!(f.frame(1).is_empty());
    }

    #[test]
    fn missing_frames_are_empty() {
        let mut f = ScalarResultFrames::new(2);
        assert!(f.is_empty());
        f.set_frame(1, vec![4.0]);
        assert!(!f.is_empty());
        assert!(f.frame(0).is_empty());
        assert!(f.frame(5).is_empty());
    }

    #[test]
    fn validate_reports_size_errors() {
        let mut f = ScalarResultFrames::new(2);
        f.set_frame(0, vec![1.0; 4]);
        assert!(f.validate("a", 2, 4).is_ok());
        assert!(matches!(
            f.validate("a", 3, 4),
            Err(ResultsError::FrameCountMismatch { .. })
        ));
        assert!(matches!(
            f.validate("a", 2, 5),
            Err(ResultsError::ValueCountMismatch { frame: 0, .. })
        ));
    }
}
