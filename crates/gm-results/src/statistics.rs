//! Scalar statistics and their per-address cache.

use std::collections::BTreeMap;
use std::sync::Arc;

use gm_core::Value;
use parking_lot::Mutex;
use rayon::prelude::*;
use serde::Serialize;

use crate::address::ResultAddress;

pub const HISTOGRAM_BIN_COUNT: usize = 100;

/// Which frames a statistic covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatisticsScope {
    Frame(usize),
    AllFrames,
}

/// Summary of the defined values of a result.
///
/// Undefined (non-finite) values are excluded. Fields are `None` when no
/// value qualifies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalarStatistics {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub pos_closest_to_zero: Option<f64>,
    pub neg_closest_to_zero: Option<f64>,
    pub sum: f64,
    pub count: usize,
    pub p10: Option<f64>,
    pub p90: Option<f64>,
    pub histogram: Vec<usize>,
}

#[derive(Debug, Clone, Copy)]
struct Accumulator {
    min: f64,
    max: f64,
    pos: f64,
    neg: f64,
    sum: f64,
    count: usize,
}

impl Accumulator {
    const EMPTY: Accumulator = Accumulator {
        min: f64::INFINITY,
        max: f64::NEG_INFINITY,
        pos: f64::INFINITY,
        neg: f64::NEG_INFINITY,
        sum: 0.0,
        count: 0,
    };

    fn add(mut self, v: Value) -> Self {
        if !v.is_finite() {
            return self;
        }
        let v = v as f64;
        self.min = self.min.min(v);
        self.max = self.max.max(v);
        if v > 0.0 {
            self.pos = self.pos.min(v);
        } else if v < 0.0 {
            self.neg = self.neg.max(v);
        }
        self.sum += v;
        self.count += 1;
        self
    }

    fn merge(self, o: Self) -> Self {
        Self {
            min: self.min.min(o.min),
            max: self.max.max(o.max),
            pos: self.pos.min(o.pos),
            neg: self.neg.max(o.neg),
            sum: self.sum + o.sum,
            count: self.count + o.count,
        }
    }
}

fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

impl ScalarStatistics {
    /// Statistics over the concatenation of `buffers`.
    pub fn from_buffers(buffers: &[&[Value]]) -> Self {
        let acc = buffers
            .par_iter()
            .map(|b| b.iter().fold(Accumulator::EMPTY, |a, &v| a.add(v)))
            .reduce(|| Accumulator::EMPTY, Accumulator::merge);

        let mut histogram = vec![0usize; HISTOGRAM_BIN_COUNT];
        if acc.count > 0 {
            let range = acc.max - acc.min;
            for &v in buffers.iter().flat_map(|b| b.iter()) {
                if v.is_finite() {
                    histogram[bin_index(v as f64, acc.min, range)] += 1;
                }
            }
        }

        let (p10, p90) = if acc.count > 0 {
            (
                Some(percentile(&histogram, acc.min, acc.max, 0.1)),
                Some(percentile(&histogram, acc.min, acc.max, 0.9)),
            )
        } else {
            (None, None)
        };

        Self {
            min: finite(acc.min),
            max: finite(acc.max),
            pos_closest_to_zero: finite(acc.pos),
            neg_closest_to_zero: finite(acc.neg),
            sum: acc.sum,
            count: acc.count,
            p10,
            p90,
            histogram,
        }
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

fn bin_index(v: f64, min: f64, range: f64) -> usize {
    if range <= 0.0 {
        return 0;
    }
    let idx = ((v - min) / range * HISTOGRAM_BIN_COUNT as f64) as usize;
    idx.min(HISTOGRAM_BIN_COUNT - 1)
}

/// Percentile estimated from the histogram, interpolating inside the bin that crosses it.
fn percentile(histogram: &[usize], min: f64, max: f64, p: f64) -> f64 {
    let total: usize = histogram.iter().sum();
    let bin_width = (max - min) / histogram.len() as f64;
    if total == 0 || bin_width <= 0.0 {
        return min;
    }
    let target = p * total as f64;
    let mut accumulated = 0.0;
    for (i, &n) in histogram.iter().enumerate() {
        accumulated += n as f64;
        if accumulated >= target && n > 0 {
            let bin_end = min + (i + 1) as f64 * bin_width;
            let unused_fraction = (accumulated - target) / n as f64;
            return bin_end - unused_fraction * bin_width;
        }
    }
    max
}

/// Cached statistics of one address.
#[derive(Debug, Default, Clone)]
pub struct StatisticsCache {
    per_frame: BTreeMap<usize, Arc<ScalarStatistics>>,
    all_frames: Option<Arc<ScalarStatistics>>,
}

impl StatisticsCache {
    pub fn get(&self, scope: StatisticsScope) -> Option<Arc<ScalarStatistics>> {
        match scope {
            StatisticsScope::Frame(f) => self.per_frame.get(&f).cloned(),
            StatisticsScope::AllFrames => self.all_frames.clone(),
        }
    }

    pub fn set(&mut self, scope: StatisticsScope, stats: Arc<ScalarStatistics>) {
        match scope {
            StatisticsScope::Frame(f) => {
                self.per_frame.insert(f, stats);
            }
            StatisticsScope::AllFrames => self.all_frames = Some(stats),
        }
    }
}

/// Address → statistics cache, shared by all parts.
#[derive(Debug, Default)]
pub struct StatisticsStore {
    entries: Mutex<BTreeMap<ResultAddress, StatisticsCache>>,
}

impl StatisticsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, address: &ResultAddress, scope: StatisticsScope) -> Option<Arc<ScalarStatistics>> {
        self.entries.lock().get(address).and_then(|c| c.get(scope))
    }

    /// Store `stats` unless another caller got there first; returns the cached value.
    pub fn insert(
        &self,
        address: &ResultAddress,
        scope: StatisticsScope,
        stats: ScalarStatistics,
    ) -> Arc<ScalarStatistics> {
        let mut entries = self.entries.lock();
        let cache = entries.entry(address.clone()).or_default();
        if let Some(existing) = cache.get(scope) {
            return existing;
        }
        let stats = Arc::new(stats);
        cache.set(scope, Arc::clone(&stats));
        stats
    }

    pub fn remove(&self, address: &ResultAddress) {
        self.entries.lock().remove(address);
    }

    pub fn remove_where(&self, mut pred: impl FnMut(&ResultAddress) -> bool) {
        self.entries.lock().retain(|a, _| !pred(a));
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn contains(&self, address: &ResultAddress) -> bool {
        self.entries.lock().contains_key(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::PositionType;
    use gm_core::UNDEFINED;

    #[test]
    fn basic_statistics_skip_undefined() {
        let a: &[Value] = &[-2.0, -0.5, 0.0, 1.0, UNDEFINED];
        let b: &[Value] = &[3.0, 0.25];
        let s = ScalarStatistics::from_buffers(&[a, b]);
        assert_eq!(s.count, 6);
        assert_eq!(s.min, Some(-2.0));
        assert_eq!(s.max, Some(3.0));
        assert_eq!(s.pos_closest_to_zero, Some(0.25));
        assert_eq!(s.neg_closest_to_zero, Some(-0.5));
        assert!((s.sum - 1.75).abs() < 1e-12);
        assert!((s.mean().unwrap() - 1.75 / 6.0).abs() < 1e-12);
        assert_eq!(s.histogram.iter().sum::<usize>(), 6);
    }

    #[test]
    fn empty_input_has_no_extremes() {
        let s = ScalarStatistics::from_buffers(&[&[UNDEFINED]]);
        assert_eq!(s.count, 0);
        assert_eq!(s.min, None);
        assert_eq!(s.mean(), None);
        assert_eq!(s.p10, None);
    }

    #[test]
    fn percentiles_of_uniform_values() {
        let values: Vec<Value> = (0..=1000).map(|i| i as Value / 10.0).collect();
        let s = ScalarStatistics::from_buffers(&[&values]);
        assert!((s.p10.unwrap() - 10.0).abs() < 1.1);
        assert!((s.p90.unwrap() - 90.0).abs() < 1.1);
    }

    #[test]
    fn constant_values_fill_first_bin() {
        let s = ScalarStatistics::from_buffers(&[&[5.0, 5.0, 5.0]]);
        assert_eq!(s.histogram[0], 3);
        assert_eq!(s.p10, Some(5.0));
    }

    #[test]
    fn store_keeps_first_insert() {
        let store = StatisticsStore::new();
        let a = ResultAddress::new(PositionType::Nodal, "POR-Bar", "");
        let first = store.insert(&a, StatisticsScope::AllFrames, ScalarStatistics::from_buffers(&[&[1.0]]));
        let second = store.insert(&a, StatisticsScope::AllFrames, ScalarStatistics::from_buffers(&[&[2.0]]));
        assert!(Arc::ptr_eq(&first, &second));
        assert!(store.get(&a, StatisticsScope::Frame(0)).is_none());
        store.remove(&a);
        assert!(!store.contains(&a));
    }
}
