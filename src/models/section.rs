//! Configuration categories
//!
//! A [`Section`] names one kind of design state. The variant order is the
//! order in which an import applies sections to a live design.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One top-level state category of a configuration document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// Model length units, carried in the `general` section
    Units,
    Variables,
    PostprocessingVariables,
    Datasets,
    Materials,
    CoordinateSystems,
    ObjectProperties,
    Boundaries,
    MeshOperations,
    Setups,
    Optimizations,
    Parametrics,
}

impl Section {
    /// Every section in import order
    pub const ALL: [Section; 12] = [
        Section::Units,
        Section::Variables,
        Section::PostprocessingVariables,
        Section::Datasets,
        Section::Materials,
        Section::CoordinateSystems,
        Section::ObjectProperties,
        Section::Boundaries,
        Section::MeshOperations,
        Section::Setups,
        Section::Optimizations,
        Section::Parametrics,
    ];

    /// Top-level key of this section inside a stored document
    pub fn key(self) -> &'static str {
        match self {
            Section::Units => "general",
            Section::Variables => "variables",
            Section::PostprocessingVariables => "postprocessing_variables",
            Section::Datasets => "datasets",
            Section::Materials => "materials",
            Section::CoordinateSystems => "coordinatesystems",
            Section::ObjectProperties => "objects",
            Section::Boundaries => "boundaries",
            Section::MeshOperations => "mesh",
            Section::Setups => "setups",
            Section::Optimizations => "optimizations",
            Section::Parametrics => "parametrics",
        }
    }

    /// Whether entities of this section may carry `Objects`/`Faces`/`Edges`
    /// lists of transient geometry identifiers
    pub fn references_geometry(self) -> bool {
        matches!(self, Section::Boundaries | Section::MeshOperations)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Section::Units => "units",
            Section::Variables => "variables",
            Section::PostprocessingVariables => "postprocessing variables",
            Section::Datasets => "datasets",
            Section::Materials => "materials",
            Section::CoordinateSystems => "coordinate systems",
            Section::ObjectProperties => "object properties",
            Section::Boundaries => "boundaries",
            Section::MeshOperations => "mesh operations",
            Section::Setups => "setups",
            Section::Optimizations => "optimizations",
            Section::Parametrics => "parametrics",
        };
        f.write_str(label)
    }
}
