//! The raw-data collaborator interface and an in-memory implementation.

use std::collections::BTreeMap;

use gm_core::Value;
use gm_results::PositionType;
use parking_lot::RwLock;

use crate::error::EngineResult;

/// Component name → values for one field, part and step.
pub type ComponentBuffers = BTreeMap<String, Vec<Value>>;

/// Source of native per-step field values and element property tables.
///
/// Implementations are file-format readers. The engine only calls these
/// methods and never assumes anything about the storage behind them.
pub trait ResultReader: Send + Sync {
    /// One name per step; the step count is the frame count.
    fn step_names(&self) -> Vec<String>;

    /// Native field → component names available at `position`.
    fn field_and_component_names(&self, position: PositionType) -> BTreeMap<String, Vec<String>>;

    /// All components of `field` for one part and step. Missing data yields
    /// an empty map rather than an error.
    fn read_field(
        &self,
        position: PositionType,
        field: &str,
        part: usize,
        step: usize,
    ) -> EngineResult<ComponentBuffers>;

    /// Names of per-element property tables.
    fn element_property_fields(&self) -> Vec<String> {
        Vec::new()
    }

    /// Every property stored in the same table as `field`, keyed by name.
    fn read_element_properties(&self, _part: usize, _field: &str) -> EngineResult<ComponentBuffers> {
        Ok(ComponentBuffers::new())
    }
}

type FieldKey = (PositionType, String, usize, usize);

/// A reader over tables filled in by the caller.
#[derive(Debug, Default)]
pub struct MemoryReader {
    step_names: Vec<String>,
    fields: RwLock<BTreeMap<FieldKey, ComponentBuffers>>,
    properties: RwLock<BTreeMap<usize, ComponentBuffers>>,
}

impl MemoryReader {
    pub fn new(step_names: Vec<String>) -> Self {
        Self {
            step_names,
            ..Self::default()
        }
    }

    pub fn step_count(&self) -> usize {
        self.step_names.len()
    }

    pub fn set_field_values(
        &self,
        position: PositionType,
        field: &str,
        component: &str,
        part: usize,
        step: usize,
        values: Vec<Value>,
    ) {
        self.fields
            .write()
            .entry((position, field.to_string(), part, step))
            .or_default()
            .insert(component.to_string(), values);
    }

    pub fn set_element_property(&self, part: usize, field: &str, values: Vec<Value>) {
        self.properties
            .write()
            .entry(part)
            .or_default()
            .insert(field.to_string(), values);
    }
}

impl ResultReader for MemoryReader {
    fn step_names(&self) -> Vec<String> {
        self.step_names.clone()
    }

    fn field_and_component_names(&self, position: PositionType) -> BTreeMap<String, Vec<String>> {
        let mut names: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for ((pos, field, _, _), buffers) in self.fields.read().iter() {
            if *pos != position {
                continue;
            }
            let comps = names.entry(field.clone()).or_default();
            for comp in buffers.keys() {
                if !comps.contains(comp) {
                    comps.push(comp.clone());
                }
            }
        }
        if position == PositionType::Element {
            for field in self.element_property_fields() {
                names.entry(field).or_default();
            }
        }
        names
    }

    fn read_field(
        &self,
        position: PositionType,
        field: &str,
        part: usize,
        step: usize,
    ) -> EngineResult<ComponentBuffers> {
        Ok(self
            .fields
            .read()
            .get(&(position, field.to_string(), part, step))
            .cloned()
            .unwrap_or_default())
    }

    fn element_property_fields(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .properties
            .read()
            .values()
            .flat_map(|table| table.keys().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    fn read_element_properties(&self, part: usize, field: &str) -> EngineResult<ComponentBuffers> {
        let properties = self.properties.read();
        Ok(properties
            .get(&part)
            .filter(|table| table.contains_key(field))
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_reader_groups_components() {
        let r = MemoryReader::new(vec!["geostatic".into(), "depletion".into()]);
        r.set_field_values(PositionType::Nodal, "U", "U1", 0, 0, vec![1.0]);
        r.set_field_values(PositionType::Nodal, "U", "U3", 0, 1, vec![2.0]);
        let names = r.field_and_component_names(PositionType::Nodal);
        assert_eq!(names["U"], vec!["U1".to_string(), "U3".to_string()]);

        let step1 = r.read_field(PositionType::Nodal, "U", 0, 1).unwrap();
        assert_eq!(step1["U3"], vec![2.0]);
        assert!(r.read_field(PositionType::Nodal, "POR", 0, 0).unwrap().is_empty());
    }

    #[test]
    fn property_table_returns_all_columns() {
        let r = MemoryReader::new(vec!["s".into()]);
        r.set_element_property(0, "MODULUS", vec![10.0]);
        r.set_element_property(0, "RATIO", vec![0.25]);
        let table = r.read_element_properties(0, "RATIO").unwrap();
        assert_eq!(table.len(), 2);
        assert!(r.read_element_properties(0, "BIOT").unwrap().is_empty());
        assert!(r.field_and_component_names(PositionType::Element).contains_key("MODULUS"));
    }
}
