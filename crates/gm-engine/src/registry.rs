//! Ordered calculator dispatch with a per-address match cache.

use std::collections::HashMap;

use gm_results::ResultAddress;
use parking_lot::Mutex;
use tracing::debug;

use crate::calculator::ResultCalculator;
use crate::calculators;
use crate::error::{EngineError, EngineResult};

/// Calculators in registration order.
///
/// At most one calculator may match an address; several matches are a
/// configuration error reported on first lookup.
pub struct CalculatorRegistry {
    calculators: Vec<Box<dyn ResultCalculator>>,
    matches: Mutex<HashMap<ResultAddress, Option<usize>>>,
}

impl std::fmt::Debug for CalculatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalculatorRegistry")
            .field("calculators", &self.names())
            .finish()
    }
}

impl Default for CalculatorRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl CalculatorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            calculators: Vec::new(),
            matches: Mutex::new(HashMap::new()),
        }
    }

    /// Every built-in calculator.
    pub fn standard() -> Self {
        Self {
            calculators: calculators::standard_calculators(),
            matches: Mutex::new(HashMap::new()),
        }
    }

    pub fn register(&mut self, calculator: Box<dyn ResultCalculator>) {
        self.calculators.push(calculator);
        self.matches.get_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.calculators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calculators.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.calculators.iter().map(|c| c.name()).collect()
    }

    /// The calculator producing `address`, if any.
    pub fn find(&self, address: &ResultAddress) -> EngineResult<Option<&dyn ResultCalculator>> {
        if let Some(cached) = self.matches.lock().get(address) {
            return Ok(cached.map(|i| self.calculators[i].as_ref()));
        }

        let hits: Vec<usize> = self
            .calculators
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_matching(address))
            .map(|(i, _)| i)
            .collect();
        if hits.len() > 1 {
            return Err(EngineError::AmbiguousCalculator {
                address: address.to_string(),
                calculators: hits
                    .iter()
                    .map(|&i| self.calculators[i].name().to_string())
                    .collect(),
            });
        }

        let hit = hits.first().copied();
        if let Some(i) = hit {
            debug!(%address, calculator = self.calculators[i].name(), "dispatch");
        }
        self.matches.lock().insert(address.clone(), hit);
        Ok(hit.map(|i| self.calculators[i].as_ref()))
    }
}
