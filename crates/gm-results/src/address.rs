//! Result addresses: the cache key of every scalar field variant.

use std::fmt;

use gm_mesh::Part;
use serde::{Deserialize, Serialize};

/// Where the values of a result live on the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PositionType {
    /// One value per node.
    Nodal,
    /// One value per element.
    Element,
    /// One value per element corner node.
    ElementNodal,
    /// One value per element face node.
    ElementNodalFace,
    /// One value per element, indexing the formation layer it belongs to.
    FormationNames,
    /// Nodal-sized spatial derivatives.
    Differentials,
}

impl PositionType {
    pub const ALL: [PositionType; 6] = [
        PositionType::Nodal,
        PositionType::Element,
        PositionType::ElementNodal,
        PositionType::ElementNodalFace,
        PositionType::FormationNames,
        PositionType::Differentials,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PositionType::Nodal => "Nodal",
            PositionType::Element => "Element",
            PositionType::ElementNodal => "ElementNodal",
            PositionType::ElementNodalFace => "ElementNodalFace",
            PositionType::FormationNames => "FormationNames",
            PositionType::Differentials => "Differentials",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for PositionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Number of values a frame of `position` holds on `part`.
pub fn value_count(part: &Part, position: PositionType) -> usize {
    match position {
        PositionType::Nodal | PositionType::Differentials => part.node_count(),
        PositionType::Element | PositionType::FormationNames => part.element_count(),
        PositionType::ElementNodal => part.element_node_count(),
        PositionType::ElementNodalFace => part.element_nodal_face_count(),
    }
}

/// Identifies one named, positioned scalar field variant.
///
/// Two addresses are equal iff all six parts are equal. Addresses are built
/// with `new` and the consuming `with_*` methods and are immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResultAddress {
    position: PositionType,
    field: String,
    component: String,
    #[serde(default)]
    time_lapse_base: Option<usize>,
    #[serde(default)]
    reference_layer: Option<usize>,
    #[serde(default)]
    normalized: bool,
}

impl ResultAddress {
    pub fn new(position: PositionType, field: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            position,
            field: field.into(),
            component: component.into(),
            time_lapse_base: None,
            reference_layer: None,
            normalized: false,
        }
    }

    /// The difference between this field and its value at `base_frame`.
    pub fn with_time_lapse(mut self, base_frame: usize) -> Self {
        self.time_lapse_base = Some(base_frame);
        self
    }

    pub fn with_reference_layer(mut self, k_layer: usize) -> Self {
        self.reference_layer = Some(k_layer);
        self
    }

    /// The field divided by hydrostatic pressure.
    pub fn normalized(mut self) -> Self {
        self.normalized = true;
        self
    }

    pub fn without_time_lapse(&self) -> Self {
        Self {
            time_lapse_base: None,
            ..self.clone()
        }
    }

    pub fn without_normalization(&self) -> Self {
        Self {
            normalized: false,
            ..self.clone()
        }
    }

    /// Same position, time lapse and normalization, other field/component.
    pub fn sibling(&self, field: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            component: component.into(),
            ..self.clone()
        }
    }

    pub fn with_component(&self, component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            ..self.clone()
        }
    }

    pub fn with_position(&self, position: PositionType) -> Self {
        Self {
            position,
            ..self.clone()
        }
    }

    pub fn position(&self) -> PositionType {
        self.position
    }

    pub fn field_name(&self) -> &str {
        &self.field
    }

    pub fn component_name(&self) -> &str {
        &self.component
    }

    pub fn time_lapse_base_frame(&self) -> Option<usize> {
        self.time_lapse_base
    }

    pub fn reference_layer_index(&self) -> Option<usize> {
        self.reference_layer
    }

    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    pub fn is_time_lapse(&self) -> bool {
        self.time_lapse_base.is_some()
    }

    /// Neither time-lapsed nor normalized.
    pub fn is_plain(&self) -> bool {
        !self.is_time_lapse() && !self.normalized
    }

    /// Same position, field and component, ignoring the time-lapse base.
    pub fn same_field_as(&self, other: &ResultAddress) -> bool {
        self.position == other.position
            && self.field == other.field
            && self.component == other.component
    }

    pub fn matches(&self, position: PositionType, field: &str) -> bool {
        self.position == position && self.field == field
    }
}

impl fmt::Display for ResultAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.position, self.field)?;
        if !self.component.is_empty() {
            write!(f, "/{}", self.component)?;
        }
        if let Some(k) = self.reference_layer {
            write!(f, " [ref layer {k}]")?;
        }
        if self.normalized {
            f.write_str(" (normalized)")?;
        }
        if let Some(base) = self.time_lapse_base {
            write!(f, " (diff to frame {base})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn equality_covers_every_part() {
        let a = ResultAddress::new(PositionType::ElementNodal, "ST", "S1");
        assert_eq!(a, a.clone());
        assert_ne!(a, a.clone().with_time_lapse(0));
        assert_ne!(a, a.clone().normalized());
        assert_ne!(a, a.clone().with_reference_layer(2));
        assert_ne!(a, a.with_component("S2"));
        assert_ne!(a, a.with_position(PositionType::Nodal));
        assert!(a.same_field_as(&a.clone().with_time_lapse(3)));
    }

    #[test]
    fn usable_as_ordered_map_key() {
        let mut map = BTreeMap::new();
        let a = ResultAddress::new(PositionType::Nodal, "POR-Bar", "");
        map.insert(a.clone(), 1);
        map.insert(a.clone().with_time_lapse(1), 2);
        map.insert(a.clone(), 3);
        assert_eq!(map.len(), 2);
        assert_eq!(map[&a], 3);
    }

    #[test]
    fn display_and_labels() {
        let a = ResultAddress::new(PositionType::ElementNodal, "ST", "S11")
            .normalized()
            .with_time_lapse(2);
        assert_eq!(a.to_string(), "ElementNodal:ST/S11 (normalized) (diff to frame 2)");
        assert!(!a.is_plain());
        assert_eq!(a.without_time_lapse().without_normalization().to_string(), "ElementNodal:ST/S11");
        assert_eq!(PositionType::from_label("nodal"), Some(PositionType::Nodal));
    }

    #[test]
    fn serde_defaults_optional_parts() {
        let json = r#"{"position":"Nodal","field":"POR-Bar","component":""}"#;
        let a: ResultAddress = serde_json::from_str(json).unwrap();
        assert_eq!(a, ResultAddress::new(PositionType::Nodal, "POR-Bar", ""));
    }
}
