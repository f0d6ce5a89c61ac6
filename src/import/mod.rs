//! Import functionality
//!
//! Applies a configuration document to a live design, one section at a time in
//! dependency order:
//! units, variables, datasets and materials, coordinate systems, object
//! properties, boundaries, mesh operations, setups, optimizations and
//! parametrics.
//!
//! Failures of single entities are recorded in [`ImportResults`] and never
//! stop the import.

pub mod ordering;
pub mod reconcile;

pub use ordering::{MISSING_ID, order_coordinate_systems, sort_boundaries};
pub use reconcile::{COIL_KINDS, EntityReconciler};

use serde_json::Value;
use tracing::{info, warn};

use crate::design::{Category, LiveDesign, VariableScope};
use crate::mapping::FingerprintCodec;
use crate::model::DocumentError;
use crate::models::{
    ConfigurationDocument, ConfigurationOptions, EntityOutcome, ImportResults, PropertyBag,
    Section,
};
use crate::storage::StorageError;

/// Error during import
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

/// Apply `doc` to `design`. Sections disabled in `options` or absent from the
/// document are left unattempted.
pub fn import_document<D: LiveDesign + ?Sized>(
    design: &mut D,
    doc: &ConfigurationDocument,
    options: &ConfigurationOptions,
) -> ImportResults {
    let mut results = ImportResults::new();
    let mut reconciler = EntityReconciler::new(design, options.skip_import_if_exists);

    for section in Section::ALL {
        if !options.imports(section) || !doc.has_section(section) {
            continue;
        }
        let first = results.entities.len();

        match section {
            Section::Units => {
                if let Some(units) = &doc.general.model_units {
                    let outcome = reconciler.set_model_units(units);
                    results.record(section, units.clone(), outcome);
                }
            }
            Section::Variables => {
                import_variables(&mut reconciler, doc, VariableScope::Design, &mut results)
            }
            Section::PostprocessingVariables => import_variables(
                &mut reconciler,
                doc,
                VariableScope::Postprocessing,
                &mut results,
            ),
            Section::Datasets => {
                for (name, dataset) in doc.datasets.iter().flatten() {
                    let outcome = reconciler.reconcile_dataset(name, dataset);
                    results.record(section, name.clone(), outcome);
                }
            }
            Section::CoordinateSystems => {
                let frames = doc.coordinatesystems.iter().flat_map(|frames| {
                    order_coordinate_systems(frames, options.sort_coordinate_systems)
                });
                for (name, props) in frames {
                    let outcome = match props.as_object() {
                        Some(props) => reconciler.reconcile_coordinate_system(name, props),
                        None => not_a_mapping(),
                    };
                    results.record(section, name.clone(), outcome);
                }
            }
            Section::ObjectProperties => {
                for (name, props) in doc.objects.iter().flatten() {
                    let outcome = match props.as_object() {
                        Some(props) => reconciler.reconcile_object(name, props),
                        None => not_a_mapping(),
                    };
                    results.record(section, name.clone(), outcome);
                }
            }
            Section::Boundaries | Section::MeshOperations => {
                import_geometry_section(&mut reconciler, doc, section, options, &mut results)
            }
            _ => {
                let Some(category) = Category::for_section(section) else {
                    continue;
                };
                for (name, props) in doc.entities(section).into_iter().flatten() {
                    let outcome = match props.as_object() {
                        Some(props) => reconciler.reconcile(category, name, props),
                        None => not_a_mapping(),
                    };
                    results.record(section, name.clone(), outcome);
                }
            }
        }

        log_section(section, &results, first);
    }

    info!(
        "Import of design '{}' finished, success: {}",
        reconciler.design().design_name(),
        results.global_import_success()
    );
    results
}

fn import_variables<D: LiveDesign + ?Sized>(
    reconciler: &mut EntityReconciler<'_, D>,
    doc: &ConfigurationDocument,
    scope: VariableScope,
    results: &mut ImportResults,
) {
    let section = scope.section();
    for (name, expression) in doc.entities(section).into_iter().flatten() {
        let outcome = match expression {
            Value::String(expression) => reconciler.reconcile_variable(scope, name, expression),
            _ => EntityOutcome::Failed("expression is not a string".to_string()),
        };
        results.record(section, name.clone(), outcome);
    }
}

/// Boundaries and mesh operations: identifiers stored at export are mapped to
/// live entities before reconciliation
fn import_geometry_section<D: LiveDesign + ?Sized>(
    reconciler: &mut EntityReconciler<'_, D>,
    doc: &ConfigurationDocument,
    section: Section,
    options: &ConfigurationOptions,
    results: &mut ImportResults,
) {
    let Some(entities) = doc.entities(section) else {
        return;
    };
    let ordered: Vec<(&String, &Value)> = if section == Section::Boundaries {
        sort_boundaries(entities)
    } else {
        entities.iter().collect()
    };

    let prepared: Vec<(String, Option<PropertyBag>)> = {
        let codec = FingerprintCodec::new(reconciler.design(), options.object_mapping_tolerance);
        ordered
            .into_iter()
            .map(|(name, props)| {
                let props = props.as_object().cloned().map(|mut props| {
                    let summary = codec.rewrite_references(&mut props, &doc.general.object_mapping);
                    if summary.dropped > 0 {
                        warn!(
                            "{} '{}': {} references could not be resolved",
                            section, name, summary.dropped
                        );
                    }
                    props
                });
                (name.clone(), props)
            })
            .collect()
    };

    for (name, props) in prepared {
        let outcome = match (section, props) {
            (_, None) => not_a_mapping(),
            (Section::Boundaries, Some(props)) => reconciler.reconcile_boundary(&name, props),
            (_, Some(props)) => reconciler.reconcile(Category::MeshOperation, &name, &props),
        };
        results.record(section, name, outcome);
    }
}

fn not_a_mapping() -> EntityOutcome {
    EntityOutcome::Failed("entry is not a property mapping".to_string())
}

fn log_section(section: Section, results: &ImportResults, first: usize) {
    let reports = &results.entities[first..];
    for report in reports {
        if let EntityOutcome::Failed(reason) = &report.outcome {
            warn!("Failed to import {} '{}': {}", section, report.name, reason);
        }
    }
    let count = |f: fn(&EntityOutcome) -> bool| reports.iter().filter(|r| f(&r.outcome)).count();
    info!(
        "Imported {}: {} created, {} updated, {} skipped, {} failed",
        section,
        count(|o| *o == EntityOutcome::Created),
        count(|o| *o == EntityOutcome::Updated),
        count(|o| *o == EntityOutcome::Skipped),
        count(|o| !o.is_success()),
    );
}
