//! Validation functionality
//!
//! Checks a configuration document for problems that will make parts of an
//! import fail:
//! - boundaries without a `BoundType`
//! - geometry identifiers missing from `general.object_mapping`
//! - coordinate systems referencing unknown or cyclic reference systems
//!
//! Validation only reports; it never blocks an import.

pub mod coordinate_systems;

pub use coordinate_systems::{FrameGraph, REFERENCE_CS_KEY};

use serde_json::Value;
use std::fmt;

use crate::mapping::REFERENCE_KEYS;
use crate::models::{ConfigurationDocument, EntityId, Section};

/// A problem found in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// An entity is stored as something other than a property mapping
    MalformedEntity { section: Section, name: String },
    MissingBoundType { boundary: String },
    UnmappedReference {
        section: Section,
        entity: String,
        key: String,
        id: String,
    },
    /// Reference coordinate system not defined in the document
    ExternalReferenceFrame { frame: String, reference: String },
    ReferenceCycle { frames: Vec<String> },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MalformedEntity { section, name } => {
                write!(f, "{} entry '{}' is not a property mapping", section, name)
            }
            ValidationIssue::MissingBoundType { boundary } => {
                write!(f, "boundary '{}' has no BoundType", boundary)
            }
            ValidationIssue::UnmappedReference {
                section,
                entity,
                key,
                id,
            } => write!(
                f,
                "{} '{}' references {} id {} with no object mapping",
                section, entity, key, id
            ),
            ValidationIssue::ExternalReferenceFrame { frame, reference } => write!(
                f,
                "coordinate system '{}' references '{}' which is not in the document",
                frame, reference
            ),
            ValidationIssue::ReferenceCycle { frames } => {
                write!(f, "coordinate systems reference each other: {}", frames.join(", "))
            }
        }
    }
}

/// Result of document validation
#[derive(Debug, Clone, Default)]
pub struct DocumentValidationResult {
    pub issues: Vec<ValidationIssue>,
}

impl DocumentValidationResult {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Validate a configuration document
pub fn validate_document(doc: &ConfigurationDocument) -> DocumentValidationResult {
    let mut issues = Vec::new();

    for section in Section::ALL {
        let Some(entities) = doc.entities(section) else {
            continue;
        };
        for (name, props) in entities {
            let well_formed = match section {
                Section::Variables | Section::PostprocessingVariables => props.is_string(),
                _ => props.is_object(),
            };
            if !well_formed {
                issues.push(ValidationIssue::MalformedEntity {
                    section,
                    name: name.clone(),
                });
                continue;
            }
            if section == Section::Boundaries && props.get("BoundType").is_none() {
                issues.push(ValidationIssue::MissingBoundType {
                    boundary: name.clone(),
                });
            }
            if section.references_geometry() {
                check_references(doc, section, name, props, &mut issues);
            }
        }
    }

    if let Some(frames) = &doc.coordinatesystems {
        let graph = FrameGraph::new(frames);
        for (frame, reference) in graph.external_references(frames) {
            issues.push(ValidationIssue::ExternalReferenceFrame {
                frame: frame.to_string(),
                reference: reference.to_string(),
            });
        }
        for frames in graph.cycles() {
            issues.push(ValidationIssue::ReferenceCycle { frames });
        }
    }

    DocumentValidationResult { issues }
}

fn check_references(
    doc: &ConfigurationDocument,
    section: Section,
    entity: &str,
    props: &Value,
    issues: &mut Vec<ValidationIssue>,
) {
    for key in REFERENCE_KEYS {
        let Some(list) = props.get(key).and_then(Value::as_array) else {
            continue;
        };
        for id in list.iter().filter_map(EntityId::from_value) {
            if !doc.general.object_mapping.contains_key(&id.to_string()) {
                issues.push(ValidationIssue::UnmappedReference {
                    section,
                    entity: entity.to_string(),
                    key: key.to_string(),
                    id: id.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntityDescriptor;
    use serde_json::json;

    fn document(value: Value) -> ConfigurationDocument {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_valid_document() {
        let mut doc = document(json!({
            "boundaries": {"Rad1": {"BoundType": "Radiation", "Faces": [12], "Objects": ["Air"]}},
            "coordinatesystems": {"CS1": {"Reference CS": "Global"}}
        }));
        doc.general.object_mapping.insert(
            "12".to_string(),
            EntityDescriptor::Located("Box1".to_string(), [0.0; 3]),
        );

        assert!(validate_document(&doc).is_valid());
    }

    #[test]
    fn test_reports_every_problem() {
        let doc = document(json!({
            "variables": {"L": {"bad": true}},
            "boundaries": {"Port1": {"Faces": [3]}},
            "coordinatesystems": {
                "A": {"Reference CS": "B"},
                "B": {"Reference CS": "A"},
                "C": {"Reference CS": "Missing"}
            }
        }));

        let issues = validate_document(&doc).issues;
        assert!(issues.contains(&ValidationIssue::MalformedEntity {
            section: Section::Variables,
            name: "L".to_string()
        }));
        assert!(issues.contains(&ValidationIssue::MissingBoundType {
            boundary: "Port1".to_string()
        }));
        assert!(issues.contains(&ValidationIssue::UnmappedReference {
            section: Section::Boundaries,
            entity: "Port1".to_string(),
            key: "Faces".to_string(),
            id: "3".to_string()
        }));
        assert!(issues.contains(&ValidationIssue::ExternalReferenceFrame {
            frame: "C".to_string(),
            reference: "Missing".to_string()
        }));
        assert!(issues.contains(&ValidationIssue::ReferenceCycle {
            frames: vec!["A".to_string(), "B".to_string()]
        }));
    }
}
