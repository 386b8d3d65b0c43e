//! Result cache of one part.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::address::ResultAddress;
use crate::frames::ScalarResultFrames;

/// Address → frames map for one part.
///
/// Entries are published whole. Readers hold `Arc`s and keep their data even
/// if the entry is deleted or one of its frames is cleared later.
#[derive(Debug)]
pub struct PartResults {
    frame_count: usize,
    results: RwLock<BTreeMap<ResultAddress, Arc<ScalarResultFrames>>>,
}

impl PartResults {
    pub fn new(frame_count: usize) -> Self {
        Self {
            frame_count,
            results: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn get(&self, address: &ResultAddress) -> Option<Arc<ScalarResultFrames>> {
        self.results.read().get(address).cloned()
    }

    pub fn contains(&self, address: &ResultAddress) -> bool {
        self.results.read().contains_key(address)
    }

    /// Publish `frames` under `address`, replacing any previous entry.
    pub fn insert(&self, address: ResultAddress, frames: ScalarResultFrames) -> Arc<ScalarResultFrames> {
        let frames = Arc::new(frames);
        self.results.write().insert(address, Arc::clone(&frames));
        frames
    }

    pub fn remove(&self, address: &ResultAddress) -> Option<Arc<ScalarResultFrames>> {
        self.results.write().remove(address)
    }

    /// Remove every entry `pred` selects, returning the removed addresses.
    pub fn remove_where(&self, mut pred: impl FnMut(&ResultAddress) -> bool) -> Vec<ResultAddress> {
        let mut results = self.results.write();
        let doomed: Vec<ResultAddress> = results.keys().filter(|a| pred(a)).cloned().collect();
        for a in &doomed {
            results.remove(a);
        }
        doomed
    }

    /// Empty one frame of `address`. Returns false when the address is not cached.
    pub fn clear_frame(&self, address: &ResultAddress, frame: usize) -> bool {
        let mut results = self.results.write();
        let Some(entry) = results.get_mut(address) else {
            return false;
        };
        Arc::make_mut(entry).clear_frame(frame);
        true
    }

    pub fn clear(&self) {
        self.results.write().clear();
    }

    pub fn addresses(&self) -> Vec<ResultAddress> {
        self.results.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.results.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::PositionType;

    #[test]
    fn insert_get_remove() {
        let pr = PartResults::new(2);
        let a = ResultAddress::new(PositionType::Nodal, "POR", "");
        let tl = a.clone().with_time_lapse(1);
        pr.insert(a.clone(), ScalarResultFrames::new(2));
        pr.insert(tl.clone(), ScalarResultFrames::new(2));
        assert_eq!(pr.len(), 2);
        assert!(pr.get(&a).is_some());

        let removed = pr.remove_where(|x| x.same_field_as(&a) && x.is_time_lapse());
        assert_eq!(removed, vec![tl]);
        assert!(pr.remove(&a).is_some());
        assert!(pr.is_empty());
    }

    #[test]
    fn readers_keep_data_after_removal() {
        let pr = PartResults::new(1);
        let a = ResultAddress::new(PositionType::Nodal, "U", "U3");
        let mut f = ScalarResultFrames::new(1);
        f.set_frame(0, vec![1.0]);
        let held = pr.insert(a.clone(), f);
        pr.clear();
        assert_eq!(held.frame(0), &[1.0]);
        assert!(!pr.contains(&a));
    }

    #[test]
    fn cleared_frame_leaves_held_copy_intact() {
        let pr = PartResults::new(2);
        let a = ResultAddress::new(PositionType::Nodal, "POR", "");
        let mut f = ScalarResultFrames::new(2);
        f.set_frame(0, vec![1.0]);
        f.set_frame(1, vec![2.0]);
        let held = pr.insert(a.clone(), f);

        assert!(pr.clear_frame(&a, 1));
        assert_eq!(held.frame(1), &[2.0]);
        let current = pr.get(&a).unwrap();
        assert!(current.frame(1).is_empty());
        assert_eq!(current.frame(0), &[1.0]);
        assert!(!pr.clear_frame(&ResultAddress::new(PositionType::Nodal, "U", "U1"), 0));
    }
}
