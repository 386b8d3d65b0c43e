//! The results orchestrator: per-part caches, dispatch and statistics.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::thread::ThreadId;

use gm_mesh::{Part, PartCollection};
use gm_results::{
    PartResults, PositionType, ResultAddress, ScalarResultFrames, ScalarStatistics, StatisticsScope,
    StatisticsStore, value_count,
};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};
use crate::names;
use crate::params::{CalculationParameters, ParameterGroup};
use crate::reader::ResultReader;
use crate::registry::CalculatorRegistry;

type SlotKey = (usize, ResultAddress);

/// Which thread is building each address, and which address each blocked thread waits for.
#[derive(Default)]
struct BuildState {
    builders: HashMap<SlotKey, ThreadId>,
    waiting: HashMap<ThreadId, SlotKey>,
}

impl BuildState {
    /// Whether following the waits-for chain from `thread` reaches `target`.
    fn chain_reaches(&self, mut thread: ThreadId, target: ThreadId) -> bool {
        for _ in 0..=self.waiting.len() {
            if thread == target {
                return true;
            }
            match self.waiting.get(&thread).and_then(|key| self.builders.get(key)) {
                Some(&next) => thread = next,
                None => return false,
            }
        }
        false
    }
}

/// One build slot per `(part, address)`: the first caller builds, later callers block
/// until the slot is released and then read the published result.
#[derive(Default)]
struct BuildSlots {
    state: Mutex<BuildState>,
    released: Condvar,
}

impl BuildSlots {
    /// Claim the slot for the current thread, waiting while another thread holds it.
    ///
    /// Fails when the slot is held by this thread, or when waiting would close a
    /// cycle of threads blocked on each other's slots.
    fn claim(&self, key: SlotKey) -> EngineResult<BuildSlot<'_>> {
        let me = std::thread::current().id();
        let mut state = self.state.lock();
        loop {
            let Some(&builder) = state.builders.get(&key) else {
                state.builders.insert(key.clone(), me);
                return Ok(BuildSlot { slots: self, key });
            };
            if state.chain_reaches(builder, me) {
                return Err(EngineError::CyclicDependency {
                    address: key.1.to_string(),
                    part: key.0,
                });
            }
            state.waiting.insert(me, key.clone());
            self.released.wait(&mut state);
            state.waiting.remove(&me);
        }
    }
}

/// Releases its slot and wakes the waiters when the build ends, successfully or not.
struct BuildSlot<'a> {
    slots: &'a BuildSlots,
    key: SlotKey,
}

impl Drop for BuildSlot<'_> {
    fn drop(&mut self) {
        self.slots.state.lock().builders.remove(&self.key);
        self.slots.released.notify_all();
    }
}

/// Owns the mesh, the per-part result caches and the statistics cache, and
/// resolves addresses on demand.
///
/// Results are computed once and then shared as `Arc`s. A calculator may
/// call back into [`find_or_load_scalar_result`](Self::find_or_load_scalar_result)
/// for its inputs. Concurrent first requests for one address build it once;
/// a request that would wait on itself, directly or through other threads, is
/// reported as [`EngineError::CyclicDependency`].
pub struct PartResultsCollection {
    reader: Arc<dyn ResultReader>,
    parts: PartCollection,
    step_names: Vec<String>,
    part_results: Vec<PartResults>,
    statistics: StatisticsStore,
    registry: CalculatorRegistry,
    build_slots: BuildSlots,
    params: CalculationParameters,
}

impl std::fmt::Debug for PartResultsCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartResultsCollection")
            .field("parts", &self.parts.part_count())
            .field("steps", &self.step_names)
            .field("registry", &self.registry)
            .finish()
    }
}

impl PartResultsCollection {
    pub fn new(reader: Arc<dyn ResultReader>, parts: PartCollection) -> Self {
        Self::with_registry(reader, parts, CalculatorRegistry::standard())
    }

    pub fn with_registry(
        reader: Arc<dyn ResultReader>,
        parts: PartCollection,
        registry: CalculatorRegistry,
    ) -> Self {
        let step_names = reader.step_names();
        let part_results = (0..parts.part_count())
            .map(|_| PartResults::new(step_names.len()))
            .collect();
        info!(
            parts = parts.part_count(),
            steps = step_names.len(),
            calculators = registry.len(),
            "results collection created"
        );
        Self {
            reader,
            parts,
            step_names,
            part_results,
            statistics: StatisticsStore::new(),
            registry,
            build_slots: BuildSlots::default(),
            params: CalculationParameters::default(),
        }
    }

    pub fn frame_count(&self) -> usize {
        self.step_names.len()
    }

    pub fn step_names(&self) -> &[String] {
        &self.step_names
    }

    pub fn part_count(&self) -> usize {
        self.parts.part_count()
    }

    pub fn parts(&self) -> &PartCollection {
        &self.parts
    }

    pub fn reader(&self) -> &dyn ResultReader {
        self.reader.as_ref()
    }

    pub fn registry(&self) -> &CalculatorRegistry {
        &self.registry
    }

    pub fn parameters(&self) -> &CalculationParameters {
        &self.params
    }

    pub fn part(&self, part: usize) -> EngineResult<&Part> {
        self.parts.part(part).ok_or(EngineError::PartOutOfRange {
            index: part,
            count: self.parts.part_count(),
        })
    }

    fn part_results(&self, part: usize) -> EngineResult<&PartResults> {
        self.part_results.get(part).ok_or(EngineError::PartOutOfRange {
            index: part,
            count: self.part_results.len(),
        })
    }

    pub fn is_cached(&self, part: usize, address: &ResultAddress) -> bool {
        self.part_results
            .get(part)
            .is_some_and(|r| r.contains(address))
    }

    /// Addresses currently cached for `part`.
    pub fn loaded_addresses(&self, part: usize) -> EngineResult<Vec<ResultAddress>> {
        Ok(self.part_results(part)?.addresses())
    }

    /// The frames of `address` on `part`, loading or deriving them on a miss.
    ///
    /// Resolution order: cache, calculator, element property table, native
    /// reader field. An address nothing can produce yields an empty result.
    pub fn find_or_load_scalar_result(
        &self,
        part: usize,
        address: &ResultAddress,
    ) -> EngineResult<Arc<ScalarResultFrames>> {
        let cache = self.part_results(part)?;
        if let Some(frames) = cache.get(address) {
            return Ok(frames);
        }

        let _slot = self.build_slots.claim((part, address.clone()))?;
        if let Some(frames) = cache.get(address) {
            return Ok(frames);
        }

        if let Some(calculator) = self.registry.find(address)? {
            debug!(%address, part, calculator = calculator.name(), "calculating");
            let frames = calculator.calculate(self, part, address)?;
            if let Some(published) = cache.get(address) {
                // A sibling build on another thread published this address first.
                return Ok(published);
            }
            return self.store_scalar_result(part, address.clone(), frames);
        }

        if address.is_time_lapse() || address.is_normalized() || names::is_derived_field(address) {
            return Err(EngineError::NoCalculator {
                address: address.to_string(),
            });
        }

        if address.position() == PositionType::Element {
            if let Some(frames) = self.load_element_properties(part, address)? {
                return Ok(frames);
            }
        }

        if let Some(frames) = self.load_native_field(part, address)? {
            return Ok(frames);
        }

        warn!(%address, part, "no data found for result");
        self.store_scalar_result(part, address.clone(), self.create_scalar_result(part, address))
    }

    /// Cache every column of the property table holding `address`.
    fn load_element_properties(
        &self,
        part: usize,
        address: &ResultAddress,
    ) -> EngineResult<Option<Arc<ScalarResultFrames>>> {
        let table = self.reader.read_element_properties(part, address.field_name())?;
        if table.is_empty() {
            return Ok(None);
        }
        debug!(part, fields = table.len(), "loading element property table");
        for (field, values) in table {
            let addr = ResultAddress::new(PositionType::Element, field, address.component_name());
            if !self.is_cached(part, &addr) {
                self.store_scalar_result(part, addr, ScalarResultFrames::single(values))?;
            }
        }
        Ok(self.part_results(part)?.get(address))
    }

    /// Read every step of a native field, caching all of its components.
    fn load_native_field(
        &self,
        part: usize,
        address: &ResultAddress,
    ) -> EngineResult<Option<Arc<ScalarResultFrames>>> {
        let frame_count = self.frame_count();
        let mut components: BTreeMap<String, ScalarResultFrames> = BTreeMap::new();
        for step in 0..frame_count {
            let buffers = self
                .reader
                .read_field(address.position(), address.field_name(), part, step)?;
            for (component, values) in buffers {
                components
                    .entry(component)
                    .or_insert_with(|| ScalarResultFrames::new(frame_count))
                    .set_frame(step, values);
            }
        }
        if components.is_empty() {
            return Ok(None);
        }
        debug!(%address, part, components = components.len(), "loaded native field");
        for (component, frames) in components {
            let addr = address.with_component(component);
            if !self.is_cached(part, &addr) {
                self.store_scalar_result(part, addr, frames)?;
            }
        }
        Ok(self.part_results(part)?.get(address))
    }

    /// An empty, unregistered frame set sized for this collection.
    ///
    /// Calculators fill it and hand it back; nothing is visible in the cache
    /// until it is stored.
    pub fn create_scalar_result(&self, part: usize, address: &ResultAddress) -> ScalarResultFrames {
        debug!(%address, part, "staging result");
        ScalarResultFrames::new(self.frame_count())
    }

    /// Validate and publish `frames`, dropping stale statistics.
    pub fn store_scalar_result(
        &self,
        part: usize,
        address: ResultAddress,
        frames: ScalarResultFrames,
    ) -> EngineResult<Arc<ScalarResultFrames>> {
        let expected = value_count(self.part(part)?, address.position());
        frames.validate(&address.to_string(), self.frame_count(), expected)?;
        self.statistics.remove(&address);
        Ok(self.part_results(part)?.insert(address, frames))
    }

    /// Remove `address` from every part.
    pub fn delete_result(&self, address: &ResultAddress) {
        self.delete_results_where(|a| a == address);
    }

    /// Remove `address` and every time-lapse variant of it.
    pub fn delete_result_all_time_lapses(&self, address: &ResultAddress) {
        let base = address.without_time_lapse();
        self.delete_results_where(|a| a.without_time_lapse() == base);
    }

    /// Release one frame of `address` on `part`. Later reads see the frame as missing.
    pub fn delete_result_frame(&self, address: &ResultAddress, part: usize, frame: usize) -> EngineResult<()> {
        if frame >= self.frame_count() {
            return Err(EngineError::FrameOutOfRange {
                frame,
                count: self.frame_count(),
            });
        }
        if self.part_results(part)?.clear_frame(address, frame) {
            self.statistics.remove(address);
            debug!(%address, part, frame, "deleted result frame");
        }
        Ok(())
    }

    pub fn delete_all_scalar_results(&self) {
        for results in &self.part_results {
            results.clear();
        }
        self.statistics.clear();
        debug!("deleted all results");
    }

    /// Remove every cached result `pred` selects; returns how many went.
    pub fn delete_results_where(&self, pred: impl Fn(&ResultAddress) -> bool) -> usize {
        let mut removed = 0;
        for results in &self.part_results {
            removed += results.remove_where(&pred).len();
        }
        self.statistics.remove_where(&pred);
        if removed > 0 {
            debug!(removed, "deleted results");
        }
        removed
    }

    /// Replace the parameters, deleting exactly the results derived from
    /// the groups that changed.
    pub fn set_parameters(&mut self, params: CalculationParameters) -> EngineResult<()> {
        params.validate()?;
        let groups = ParameterGroup::changed_groups(&self.params, &params);
        for group in &groups {
            let removed = self.delete_results_where(|a| group.affects(a));
            info!(?group, removed, "parameter group changed");
        }
        self.params = params;
        Ok(())
    }

    pub fn update_parameters(&mut self, f: impl FnOnce(&mut CalculationParameters)) -> EngineResult<()> {
        let mut params = self.params.clone();
        f(&mut params);
        self.set_parameters(params)
    }

    /// A single-frame element property, `None` when the table is missing.
    pub fn element_property(&self, part: usize, name: &str) -> EngineResult<Option<Arc<ScalarResultFrames>>> {
        let address = ResultAddress::new(PositionType::Element, name, "");
        let frames = self.find_or_load_scalar_result(part, &address)?;
        Ok((!frames.is_empty()).then_some(frames))
    }

    /// Native names merged with everything the engine can derive.
    pub fn scalar_field_and_component_names(&self, position: PositionType) -> BTreeMap<String, Vec<String>> {
        let mut table = self.reader.field_and_component_names(position);
        for (field, comps) in names::derived_field_names(position) {
            let entry = table.entry(field).or_default();
            for c in comps {
                if !entry.contains(&c) {
                    entry.push(c);
                }
            }
        }
        table
    }

    /// Statistics of `address` over all parts, computed once per scope.
    pub fn statistics(
        &self,
        address: &ResultAddress,
        scope: StatisticsScope,
    ) -> EngineResult<Arc<ScalarStatistics>> {
        if let Some(stats) = self.statistics.get(address, scope) {
            return Ok(stats);
        }
        if let StatisticsScope::Frame(frame) = scope {
            if frame >= self.frame_count() {
                return Err(EngineError::FrameOutOfRange {
                    frame,
                    count: self.frame_count(),
                });
            }
        }

        let mut loaded = Vec::with_capacity(self.part_count());
        for part in 0..self.part_count() {
            loaded.push(self.find_or_load_scalar_result(part, address)?);
        }
        let buffers: Vec<&[gm_core::Value]> = loaded
            .iter()
            .flat_map(|frames| -> Vec<&[gm_core::Value]> {
                match scope {
                    StatisticsScope::Frame(f) => vec![frames.frame(f)],
                    StatisticsScope::AllFrames => frames.frames().collect(),
                }
            })
            .collect();
        let stats = ScalarStatistics::from_buffers(&buffers);
        Ok(self.statistics.insert(address, scope, stats))
    }

    pub fn min_max_scalar_values(
        &self,
        address: &ResultAddress,
        scope: StatisticsScope,
    ) -> EngineResult<(Option<f64>, Option<f64>)> {
        let s = self.statistics(address, scope)?;
        Ok((s.min, s.max))
    }

    pub fn pos_neg_closest_to_zero(
        &self,
        address: &ResultAddress,
        scope: StatisticsScope,
    ) -> EngineResult<(Option<f64>, Option<f64>)> {
        let s = self.statistics(address, scope)?;
        Ok((s.pos_closest_to_zero, s.neg_closest_to_zero))
    }

    /// Extremes over the principal values of a tensor field, or of `address`
    /// itself for scalar fields.
    pub fn min_max_scalar_values_over_all_tensor_components(
        &self,
        address: &ResultAddress,
        scope: StatisticsScope,
    ) -> EngineResult<(Option<f64>, Option<f64>)> {
        let mut extremes = (None, None);
        for principal in names::principal_component_addresses(address) {
            let (min, max) = self.min_max_scalar_values(&principal, scope)?;
            extremes = (min_of(extremes.0, min), max_of(extremes.1, max));
        }
        Ok(extremes)
    }

    /// Positive and negative values closest to zero over the principal values
    /// of a tensor field, or of `address` itself for scalar fields.
    pub fn pos_neg_closest_to_zero_over_all_tensor_components(
        &self,
        address: &ResultAddress,
        scope: StatisticsScope,
    ) -> EngineResult<(Option<f64>, Option<f64>)> {
        let mut closest = (None, None);
        for principal in names::principal_component_addresses(address) {
            let (pos, neg) = self.pos_neg_closest_to_zero(&principal, scope)?;
            closest = (min_of(closest.0, pos), max_of(closest.1, neg));
        }
        Ok(closest)
    }

    pub fn mean_scalar_value(&self, address: &ResultAddress, scope: StatisticsScope) -> EngineResult<Option<f64>> {
        Ok(self.statistics(address, scope)?.mean())
    }

    pub fn p10_p90_scalar_values(
        &self,
        address: &ResultAddress,
        scope: StatisticsScope,
    ) -> EngineResult<(Option<f64>, Option<f64>)> {
        let s = self.statistics(address, scope)?;
        Ok((s.p10, s.p90))
    }

    pub fn sum_scalar_value(&self, address: &ResultAddress, scope: StatisticsScope) -> EngineResult<f64> {
        Ok(self.statistics(address, scope)?.sum)
    }

    pub fn scalar_values_histogram(
        &self,
        address: &ResultAddress,
        scope: StatisticsScope,
    ) -> EngineResult<Vec<usize>> {
        Ok(self.statistics(address, scope)?.histogram.clone())
    }
}

fn min_of(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn max_of(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}
