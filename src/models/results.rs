//! Import results
//!
//! Every import returns a fresh [`ImportResults`]: one tri-state flag per
//! section plus the outcome of every entity that was attempted.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::section::Section;

/// What happened to one stored entity during an import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum EntityOutcome {
    Created,
    Updated,
    /// Already present and `skip_import_if_exists` was set
    Skipped,
    Failed(String),
}

impl EntityOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, EntityOutcome::Failed(_))
    }
}

impl fmt::Display for EntityOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityOutcome::Created => f.write_str("created"),
            EntityOutcome::Updated => f.write_str("updated"),
            EntityOutcome::Skipped => f.write_str("skipped"),
            EntityOutcome::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Outcome of a single entity, in the order entities were processed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityReport {
    pub section: Section,
    pub name: String,
    pub outcome: EntityOutcome,
}

/// Per-section result flags of one import call
///
/// `None` means the section was not attempted, `Some(true)` that every entity
/// succeeded, `Some(false)` that at least one failed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImportResults {
    pub import_units: Option<bool>,
    pub import_variables: Option<bool>,
    pub import_postprocessing_variables: Option<bool>,
    pub import_datasets: Option<bool>,
    pub import_materials: Option<bool>,
    pub import_coordinate_systems: Option<bool>,
    pub import_object_properties: Option<bool>,
    pub import_boundaries: Option<bool>,
    pub import_mesh_operations: Option<bool>,
    pub import_setups: Option<bool>,
    pub import_optimizations: Option<bool>,
    pub import_parametrics: Option<bool>,
    pub entities: Vec<EntityReport>,
}

impl ImportResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset every flag to "not attempted" and forget entity outcomes
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Flag of one section
    pub fn get(&self, section: Section) -> Option<bool> {
        match section {
            Section::Units => self.import_units,
            Section::Variables => self.import_variables,
            Section::PostprocessingVariables => self.import_postprocessing_variables,
            Section::Datasets => self.import_datasets,
            Section::Materials => self.import_materials,
            Section::CoordinateSystems => self.import_coordinate_systems,
            Section::ObjectProperties => self.import_object_properties,
            Section::Boundaries => self.import_boundaries,
            Section::MeshOperations => self.import_mesh_operations,
            Section::Setups => self.import_setups,
            Section::Optimizations => self.import_optimizations,
            Section::Parametrics => self.import_parametrics,
        }
    }

    fn flag_mut(&mut self, section: Section) -> &mut Option<bool> {
        match section {
            Section::Units => &mut self.import_units,
            Section::Variables => &mut self.import_variables,
            Section::PostprocessingVariables => &mut self.import_postprocessing_variables,
            Section::Datasets => &mut self.import_datasets,
            Section::Materials => &mut self.import_materials,
            Section::CoordinateSystems => &mut self.import_coordinate_systems,
            Section::ObjectProperties => &mut self.import_object_properties,
            Section::Boundaries => &mut self.import_boundaries,
            Section::MeshOperations => &mut self.import_mesh_operations,
            Section::Setups => &mut self.import_setups,
            Section::Optimizations => &mut self.import_optimizations,
            Section::Parametrics => &mut self.import_parametrics,
        }
    }

    /// Record one entity outcome. A section flag that turned false stays false.
    pub fn record(&mut self, section: Section, name: impl Into<String>, outcome: EntityOutcome) {
        let flag = self.flag_mut(section);
        *flag = Some(flag.unwrap_or(true) && outcome.is_success());
        self.entities.push(EntityReport {
            section,
            name: name.into(),
            outcome,
        });
    }

    /// True when no attempted section failed
    pub fn global_import_success(&self) -> bool {
        Section::ALL
            .into_iter()
            .all(|section| self.get(section) != Some(false))
    }

    /// Entities that failed, in processing order
    pub fn failures(&self) -> impl Iterator<Item = &EntityReport> {
        self.entities
            .iter()
            .filter(|report| !report.outcome.is_success())
    }

    /// Outcome of a named entity in a section
    pub fn outcome(&self, section: Section, name: &str) -> Option<&EntityOutcome> {
        self.entities
            .iter()
            .rev()
            .find(|report| report.section == section && report.name == name)
            .map(|report| &report.outcome)
    }
}
