//! Export functionality
//!
//! Walks the live design one section at a time and assembles a
//! [`ConfigurationDocument`]. Property bags are deep-copied so that later
//! edits to the design never alter a document already produced.

pub mod datasets;

pub use datasets::extract_dataset_names;

use chrono::Local;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::design::{Category, LiveDesign, OBJECT_PROPERTY_KEYS, VariableScope};
use crate::mapping::FingerprintCodec;
use crate::model::DocumentError;
use crate::models::{
    ConfigurationDocument, ConfigurationOptions, Dataset, EntityMap, GeneralSection,
    ObjectMapping, Section,
};
use crate::storage::StorageError;

/// Version written to `general.producer_version`
pub const PRODUCER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Timestamp layout of `general.date`
pub const DATE_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Error during export
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),
}

/// Builds configuration documents from a live design
pub struct SnapshotExporter<'a, D: LiveDesign + ?Sized> {
    design: &'a D,
    producer_version: String,
}

impl<'a, D: LiveDesign + ?Sized> SnapshotExporter<'a, D> {
    pub fn new(design: &'a D) -> Self {
        Self {
            design,
            producer_version: PRODUCER_VERSION.to_string(),
        }
    }

    /// Override the producer version stamped into `general`
    pub fn with_producer_version(mut self, version: impl Into<String>) -> Self {
        self.producer_version = version.into();
        self
    }

    /// Snapshot every section enabled in `options`
    pub fn export(&self, options: &ConfigurationOptions) -> ConfigurationDocument {
        let mut doc = ConfigurationDocument::new();
        let mut mapping = ObjectMapping::new();

        for section in Section::ALL {
            if !options.exports(section) {
                continue;
            }
            match section {
                Section::Units | Section::Datasets => {}
                Section::Variables => {
                    doc.set_entities(section, self.export_variables(VariableScope::Design))
                }
                Section::PostprocessingVariables => doc.set_entities(
                    section,
                    self.export_variables(VariableScope::Postprocessing),
                ),
                Section::Materials => {
                    let materials = self.export_category(Category::Material, None);
                    if options.exports(Section::Datasets) {
                        let datasets = self.export_referenced_datasets(&materials);
                        if !datasets.is_empty() {
                            doc.datasets = Some(datasets);
                        }
                    }
                    doc.set_entities(section, materials);
                }
                Section::ObjectProperties => doc.set_entities(section, self.export_objects()),
                _ => {
                    let Some(category) = Category::for_section(section) else {
                        continue;
                    };
                    let references = section.references_geometry().then_some(&mut mapping);
                    doc.set_entities(section, self.export_category(category, references));
                }
            }
        }

        doc.general = self.export_general(mapping);
        info!(
            "Exported design '{}' with sections: {:?}",
            doc.general.design_name,
            doc.populated_sections()
        );
        doc
    }

    fn export_general(&self, object_mapping: ObjectMapping) -> GeneralSection {
        GeneralSection {
            producer_version: self.producer_version.clone(),
            model_units: Some(self.design.model_units()),
            design_name: self.design.design_name(),
            date: Local::now().format(DATE_FORMAT).to_string(),
            object_mapping,
            extra: Default::default(),
        }
    }

    fn export_variables(&self, scope: VariableScope) -> EntityMap {
        self.design
            .variables(scope)
            .into_iter()
            .map(|(name, expression)| (name, Value::String(expression)))
            .collect()
    }

    /// Copy every entity of `category`. When `mapping` is given, identifiers
    /// referenced by the entities are fingerprinted into it.
    fn export_category(&self, category: Category, mut mapping: Option<&mut ObjectMapping>) -> EntityMap {
        let codec = FingerprintCodec::new(self.design, 0.0);
        let mut entities = EntityMap::new();
        for name in self.design.entity_names(category) {
            let Some(props) = self.design.entity_properties(category, &name) else {
                debug!("{} '{}' disappeared during export", category, name);
                continue;
            };
            if let Some(mapping) = mapping.as_deref_mut() {
                codec.record_references(&props, mapping);
            }
            entities.insert(name, Value::Object(props));
        }
        entities
    }

    fn export_objects(&self) -> EntityMap {
        let mut objects = EntityMap::new();
        for name in self.design.object_names() {
            let Some(props) = self.design.object_properties(&name) else {
                continue;
            };
            let props: serde_json::Map<String, Value> = OBJECT_PROPERTY_KEYS
                .iter()
                .filter_map(|key| props.get(*key).map(|v| (key.to_string(), v.clone())))
                .collect();
            if !props.is_empty() {
                objects.insert(name, Value::Object(props));
            }
        }
        objects
    }

    /// Datasets referenced by the exported materials that exist in the design
    fn export_referenced_datasets(&self, materials: &EntityMap) -> BTreeMap<String, Dataset> {
        let tree = Value::Object(materials.clone());
        extract_dataset_names(&tree)
            .into_iter()
            .filter_map(|name| {
                let dataset = self.design.dataset(&name);
                if dataset.is_none() {
                    debug!("Material dataset '{}' is not in the design library", name);
                }
                dataset.map(|dataset| (name, dataset))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::InMemoryDesign;
    use serde_json::json;

    fn bag(value: Value) -> serde_json::Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_variables_only_export() {
        let mut design = InMemoryDesign::new("HFSSDesign1");
        design.set_variable(VariableScope::Design, "L", "10mm").unwrap();
        design.set_variable(VariableScope::Design, "W", "5mm").unwrap();
        design.insert_entity(Category::Setup, "Setup1", bag(json!({"Frequency": "1GHz"})));

        let options = ConfigurationOptions::builder()
            .export_only(&[Section::Variables])
            .build();
        let doc = SnapshotExporter::new(&design).export(&options);

        assert_eq!(doc.populated_sections(), vec![Section::Units, Section::Variables]);
        assert_eq!(
            Value::Object(doc.variables.clone().unwrap()),
            json!({"L": "10mm", "W": "5mm"})
        );
        assert_eq!(doc.general.design_name, "HFSSDesign1");
        assert_eq!(doc.general.producer_version, PRODUCER_VERSION);
        assert!(doc.setups.is_none());
    }

    #[test]
    fn test_empty_categories_are_omitted() {
        let design = InMemoryDesign::new("HFSSDesign1");
        let doc = SnapshotExporter::new(&design).export(&ConfigurationOptions::default());

        assert_eq!(doc.populated_sections(), vec![Section::Units]);
        assert!(doc.general.object_mapping.is_empty());
    }

    #[test]
    fn test_boundary_references_are_mapped_once() {
        let mut design = InMemoryDesign::new("HFSSDesign1");
        let box_id = design.add_box("Box1", [0.0; 3], [1.0; 3]);
        let face = design.faces_of("Box1")[0];
        design.insert_entity(
            Category::Boundary,
            "Rad1",
            bag(json!({"BoundType": "Radiation", "Faces": [face.0]})),
        );
        design.insert_entity(
            Category::MeshOperation,
            "Length1",
            bag(json!({"Type": "LengthBased", "Objects": [box_id.0], "Faces": [face.0]})),
        );
        design.insert_entity(
            Category::Setup,
            "Setup1",
            bag(json!({"Objects": [box_id.0]})),
        );

        let options = ConfigurationOptions::builder()
            .export(Section::Setups, true)
            .build();
        let doc = SnapshotExporter::new(&design).export(&options);

        let mapping = &doc.general.object_mapping;
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping[&box_id.to_string()].owner(), "Box1");
        assert_eq!(mapping[&face.to_string()].point(), Some([0.5, 0.5, 0.0]));
    }

    #[test]
    fn test_only_referenced_datasets_exported() {
        let mut design = InMemoryDesign::new("HFSSDesign1");
        design.insert_entity(
            Category::Material,
            "M1",
            bag(json!({"permittivity": "pwl($ds1,Freq)"})),
        );
        design.insert_entity(Category::Material, "M2", bag(json!({"permittivity": "4.4"})));
        design.insert_dataset("ds1", Dataset::new(vec![1.0, 2.0], vec![3.0, 4.0]));
        design.insert_dataset("ds_unused", Dataset::new(vec![0.0], vec![0.0]));

        let options = ConfigurationOptions::builder()
            .export_only(&[Section::Materials, Section::Datasets])
            .build();
        let doc = SnapshotExporter::new(&design).export(&options);

        let datasets = doc.datasets.unwrap();
        assert_eq!(datasets.keys().collect::<Vec<_>>(), vec!["ds1"]);
        assert_eq!(doc.materials.unwrap().len(), 2);
    }

    #[test]
    fn test_datasets_can_be_left_out() {
        let mut design = InMemoryDesign::new("HFSSDesign1");
        design.insert_entity(
            Category::Material,
            "M1",
            bag(json!({"permittivity": "pwl($ds1,Freq)"})),
        );
        design.insert_dataset("ds1", Dataset::new(vec![1.0, 2.0], vec![3.0, 4.0]));

        let options = ConfigurationOptions::builder()
            .export(Section::Datasets, false)
            .build();
        let doc = SnapshotExporter::new(&design).export(&options);

        assert!(doc.datasets.is_none());
        assert!(doc.materials.is_some());
    }

    #[test]
    fn test_export_is_a_deep_copy() {
        let mut design = InMemoryDesign::new("HFSSDesign1");
        design.insert_entity(Category::Setup, "Setup1", bag(json!({"Frequency": "1GHz"})));

        let doc = SnapshotExporter::new(&design).export(&ConfigurationOptions::default());
        design.insert_entity(Category::Setup, "Setup1", bag(json!({"Frequency": "9GHz"})));

        assert_eq!(
            doc.entity(Section::Setups, "Setup1").unwrap()["Frequency"],
            json!("1GHz")
        );
    }

    #[test]
    fn test_object_properties_export() {
        let mut design = InMemoryDesign::new("HFSSDesign1");
        design.add_box("Box1", [0.0; 3], [1.0; 3]);
        design.add_box("Box2", [2.0; 3], [1.0; 3]);
        design
            .set_object_property("Box1", "Material", &json!("copper"))
            .unwrap();
        design
            .set_object_property("Box1", "Color", &json!([255, 0, 0]))
            .unwrap();

        let doc = SnapshotExporter::new(&design).export(&ConfigurationOptions::default());
        let objects = doc.objects.unwrap();

        assert_eq!(objects.len(), 1);
        assert_eq!(objects["Box1"], json!({"Material": "copper", "Color": [255, 0, 0]}));
    }
}
