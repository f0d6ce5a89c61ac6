//! Configuration document model
//!
//! The document is the portable snapshot of a design. Property bags are kept
//! as JSON maps so that whatever the host application reports for an entity
//! survives a round trip untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use super::section::Section;

/// Property bag of a single entity, keyed by the host application's property names
pub type PropertyBag = Map<String, Value>;

/// Entities of one section, keyed by entity name, in document order
pub type EntityMap = Map<String, Value>;

/// A point in model length units
pub type Point3 = [f64; 3];

/// Transient numeric identifier the host application assigns to an object,
/// face or edge. Not stable across sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl EntityId {
    /// Read an identifier from a stored property value (number or numeric string)
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64().map(EntityId),
            Value::String(s) => s.trim().parse().ok().map(EntityId),
            _ => None,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<EntityId> for Value {
    fn from(id: EntityId) -> Self {
        Value::from(id.0)
    }
}

/// Position fingerprint standing in for a transient identifier
///
/// Objects are name-stable and stored by name. Faces and edges are stored as
/// the owning object's name plus the face centroid or edge midpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityDescriptor {
    Object(String),
    Located(String, Point3),
}

impl EntityDescriptor {
    /// Name of the object itself, or of the object owning the face/edge
    pub fn owner(&self) -> &str {
        match self {
            EntityDescriptor::Object(name) => name,
            EntityDescriptor::Located(owner, _) => owner,
        }
    }

    pub fn point(&self) -> Option<Point3> {
        match self {
            EntityDescriptor::Object(_) => None,
            EntityDescriptor::Located(_, point) => Some(*point),
        }
    }
}

/// Stringified export-time identifier to fingerprint
pub type ObjectMapping = BTreeMap<String, EntityDescriptor>;

/// Coordinate table of a dataset
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<Vec<f64>>,
    #[serde(default)]
    pub x_unit: String,
    #[serde(default)]
    pub y_unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_unit: Option<String>,
}

impl Dataset {
    /// Two-column dataset without units
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Self {
        Self {
            x,
            y,
            ..Default::default()
        }
    }

    pub fn with_units(mut self, x_unit: impl Into<String>, y_unit: impl Into<String>) -> Self {
        self.x_unit = x_unit.into();
        self.y_unit = y_unit.into();
        self
    }
}

/// The `general` section
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeneralSection {
    /// Version of the tool that wrote the document
    #[serde(default)]
    pub producer_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_units: Option<String>,
    #[serde(default)]
    pub design_name: String,
    /// Export timestamp, `dd/mm/YYYY HH:MM:SS`
    #[serde(default)]
    pub date: String,
    #[serde(default, skip_serializing_if = "ObjectMapping::is_empty")]
    pub object_mapping: ObjectMapping,
    /// Keys written by other producers
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Root of a stored configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfigurationDocument {
    #[serde(default)]
    pub general: GeneralSection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<EntityMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postprocessing_variables: Option<EntityMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasets: Option<BTreeMap<String, Dataset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub materials: Option<EntityMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinatesystems: Option<EntityMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objects: Option<EntityMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundaries: Option<EntityMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<EntityMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setups: Option<EntityMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimizations: Option<EntityMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parametrics: Option<EntityMap>,
    /// Sections this crate does not interpret, kept for re-export
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConfigurationDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Named entities of a section. `Units` and `Datasets` are not entity
    /// maps and always return `None`.
    pub fn entities(&self, section: Section) -> Option<&EntityMap> {
        match section {
            Section::Units | Section::Datasets => None,
            Section::Variables => self.variables.as_ref(),
            Section::PostprocessingVariables => self.postprocessing_variables.as_ref(),
            Section::Materials => self.materials.as_ref(),
            Section::CoordinateSystems => self.coordinatesystems.as_ref(),
            Section::ObjectProperties => self.objects.as_ref(),
            Section::Boundaries => self.boundaries.as_ref(),
            Section::MeshOperations => self.mesh.as_ref(),
            Section::Setups => self.setups.as_ref(),
            Section::Optimizations => self.optimizations.as_ref(),
            Section::Parametrics => self.parametrics.as_ref(),
        }
    }

    fn entities_slot(&mut self, section: Section) -> Option<&mut Option<EntityMap>> {
        match section {
            Section::Units | Section::Datasets => None,
            Section::Variables => Some(&mut self.variables),
            Section::PostprocessingVariables => Some(&mut self.postprocessing_variables),
            Section::Materials => Some(&mut self.materials),
            Section::CoordinateSystems => Some(&mut self.coordinatesystems),
            Section::ObjectProperties => Some(&mut self.objects),
            Section::Boundaries => Some(&mut self.boundaries),
            Section::MeshOperations => Some(&mut self.mesh),
            Section::Setups => Some(&mut self.setups),
            Section::Optimizations => Some(&mut self.optimizations),
            Section::Parametrics => Some(&mut self.parametrics),
        }
    }

    /// Store a section, omitting it entirely when `entities` is empty
    pub fn set_entities(&mut self, section: Section, entities: EntityMap) {
        if let Some(slot) = self.entities_slot(section) {
            *slot = if entities.is_empty() {
                None
            } else {
                Some(entities)
            };
        }
    }

    /// Whether the document carries content for `section`
    pub fn has_section(&self, section: Section) -> bool {
        match section {
            Section::Units => self.general.model_units.is_some(),
            Section::Datasets => self.datasets.as_ref().is_some_and(|d| !d.is_empty()),
            _ => self.entities(section).is_some_and(|e| !e.is_empty()),
        }
    }

    /// Sections with content, in import order
    pub fn populated_sections(&self) -> Vec<Section> {
        Section::ALL
            .into_iter()
            .filter(|section| self.has_section(*section))
            .collect()
    }

    /// Property bag of one entity
    pub fn entity(&self, section: Section, name: &str) -> Option<&PropertyBag> {
        self.entities(section)?.get(name)?.as_object()
    }
}
