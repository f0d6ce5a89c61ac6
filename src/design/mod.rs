//! Live design abstraction
//!
//! The host modeling application is an external collaborator. Everything the
//! engine needs from it goes through [`LiveDesign`]; failures of its calls are
//! opaque and reported as `anyhow::Error`.

pub mod memory;

pub use memory::InMemoryDesign;

use anyhow::Result;
use serde_json::Value;
use std::fmt;

use crate::models::{Dataset, EntityId, Point3, PropertyBag, Section};

/// Kinds of named entities the host application stores as property bags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Material,
    CoordinateSystem,
    Boundary,
    MeshOperation,
    Setup,
    Optimization,
    Parametric,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Material,
        Category::CoordinateSystem,
        Category::Boundary,
        Category::MeshOperation,
        Category::Setup,
        Category::Optimization,
        Category::Parametric,
    ];

    /// Document section holding entities of this category
    pub fn section(self) -> Section {
        match self {
            Category::Material => Section::Materials,
            Category::CoordinateSystem => Section::CoordinateSystems,
            Category::Boundary => Section::Boundaries,
            Category::MeshOperation => Section::MeshOperations,
            Category::Setup => Section::Setups,
            Category::Optimization => Section::Optimizations,
            Category::Parametric => Section::Parametrics,
        }
    }

    /// Category stored in a document section, if the section holds one
    pub fn for_section(section: Section) -> Option<Self> {
        Category::ALL
            .into_iter()
            .find(|category| category.section() == section)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.section(), f)
    }
}

/// Namespace a variable lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableScope {
    Design,
    Postprocessing,
}

impl VariableScope {
    pub fn section(self) -> Section {
        match self {
            VariableScope::Design => Section::Variables,
            VariableScope::Postprocessing => Section::PostprocessingVariables,
        }
    }
}

/// Object fields carried in the `objects` section
pub const OBJECT_PROPERTY_KEYS: [&str; 7] = [
    "Material",
    "SolveInside",
    "Model",
    "Group",
    "Transparency",
    "Color",
    "CoordinateSystem",
];

/// Name of the root coordinate system every design has
pub const GLOBAL_COORDINATE_SYSTEM: &str = "Global";

/// Operations the engine consumes from the host modeling application
pub trait LiveDesign {
    fn design_name(&self) -> String;

    fn model_units(&self) -> String;

    fn set_model_units(&mut self, units: &str) -> Result<()>;

    /// Variables of a scope as `(name, expression)` in definition order
    fn variables(&self, scope: VariableScope) -> Vec<(String, String)>;

    /// Create or overwrite a variable
    fn set_variable(&mut self, scope: VariableScope, name: &str, expression: &str) -> Result<()>;

    fn dataset_names(&self) -> Vec<String>;

    fn dataset(&self, name: &str) -> Option<Dataset>;

    fn create_dataset(&mut self, name: &str, dataset: &Dataset) -> Result<()>;

    fn update_dataset(&mut self, name: &str, dataset: &Dataset) -> Result<()>;

    /// Names of all entities of a category in native order
    fn entity_names(&self, category: Category) -> Vec<String>;

    fn entity_properties(&self, category: Category, name: &str) -> Option<PropertyBag>;

    fn create_entity(&mut self, category: Category, name: &str, props: &PropertyBag) -> Result<()>;

    /// Replace the property bag of an existing entity and apply it
    fn update_entity(&mut self, category: Category, name: &str, props: &PropertyBag) -> Result<()>;

    /// Attach the coil boundary `coil` to the winding boundary `winding`
    fn link_winding_coil(&mut self, winding: &str, coil: &str) -> Result<()>;

    fn object_names(&self) -> Vec<String>;

    /// Current values of the object's [`OBJECT_PROPERTY_KEYS`]
    fn object_properties(&self, name: &str) -> Option<PropertyBag>;

    fn set_object_property(&mut self, name: &str, key: &str, value: &Value) -> Result<()>;

    fn object_name_by_id(&self, id: EntityId) -> Option<String>;

    fn object_id_by_name(&self, name: &str) -> Option<EntityId>;

    /// Name of the object a face belongs to
    fn face_owner(&self, id: EntityId) -> Option<String>;

    /// Name of the object an edge belongs to
    fn edge_owner(&self, id: EntityId) -> Option<String>;

    fn face_center(&self, id: EntityId) -> Option<Point3>;

    fn edge_midpoint(&self, id: EntityId) -> Option<Point3>;

    /// Faces of an object in native enumeration order
    fn faces_of(&self, object: &str) -> Vec<EntityId>;

    /// Edges of an object in native enumeration order
    fn edges_of(&self, object: &str) -> Vec<EntityId>;

    /// Face of `object` lying exactly at `point`
    fn face_by_position(&self, object: &str, point: Point3) -> Option<EntityId>;

    fn has_entity(&self, category: Category, name: &str) -> bool {
        self.entity_properties(category, name).is_some()
    }
}
