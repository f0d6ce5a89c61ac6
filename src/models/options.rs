//! Export/import options

use serde::{Deserialize, Serialize};

use super::section::Section;

/// Default distance under which a stored face/edge position matches a live one
pub const DEFAULT_OBJECT_MAPPING_TOLERANCE: f64 = 1e-9;

/// Toggles controlling which sections are exported and imported
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigurationOptions {
    pub export_variables: bool,
    pub export_postprocessing_variables: bool,
    pub export_materials: bool,
    /// Embed the datasets referenced by exported materials
    pub export_datasets: bool,
    pub export_coordinate_systems: bool,
    pub export_object_properties: bool,
    pub export_boundaries: bool,
    pub export_mesh_operations: bool,
    pub export_setups: bool,
    pub export_optimizations: bool,
    pub export_parametrics: bool,

    pub import_units: bool,
    pub import_variables: bool,
    pub import_postprocessing_variables: bool,
    pub import_datasets: bool,
    pub import_materials: bool,
    pub import_coordinate_systems: bool,
    pub import_object_properties: bool,
    pub import_boundaries: bool,
    pub import_mesh_operations: bool,
    pub import_setups: bool,
    pub import_optimizations: bool,
    pub import_parametrics: bool,

    /// Maximum distance (model units) between a stored and a live face
    /// centroid or edge midpoint for them to be considered the same entity
    pub object_mapping_tolerance: f64,

    /// Leave entities that already exist in the design untouched
    pub skip_import_if_exists: bool,

    /// Import coordinate systems after the coordinate system they reference,
    /// regardless of document order
    pub sort_coordinate_systems: bool,
}

impl Default for ConfigurationOptions {
    fn default() -> Self {
        Self {
            export_variables: true,
            export_postprocessing_variables: true,
            export_materials: true,
            export_datasets: true,
            export_coordinate_systems: true,
            export_object_properties: true,
            export_boundaries: true,
            export_mesh_operations: true,
            export_setups: true,
            export_optimizations: true,
            export_parametrics: true,
            import_units: true,
            import_variables: true,
            import_postprocessing_variables: true,
            import_datasets: true,
            import_materials: true,
            import_coordinate_systems: true,
            import_object_properties: true,
            import_boundaries: true,
            import_mesh_operations: true,
            import_setups: true,
            import_optimizations: true,
            import_parametrics: true,
            object_mapping_tolerance: DEFAULT_OBJECT_MAPPING_TOLERANCE,
            skip_import_if_exists: false,
            sort_coordinate_systems: true,
        }
    }
}

impl ConfigurationOptions {
    /// Create options with every section enabled
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder starting from the defaults
    pub fn builder() -> ConfigurationOptionsBuilder {
        ConfigurationOptionsBuilder::default()
    }

    /// Whether `section` is written by an export.
    ///
    /// Units are always part of `general`. Datasets are only embedded next to
    /// the materials that reference them.
    pub fn exports(&self, section: Section) -> bool {
        match section {
            Section::Units => true,
            Section::Datasets => self.export_materials && self.export_datasets,
            _ => self.export_flag(section).copied().unwrap_or(false),
        }
    }

    /// Whether `section` is applied by an import
    pub fn imports(&self, section: Section) -> bool {
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

    /// Toggle the export of one section. Units have no flag of their own and
    /// are left unchanged.
    pub fn set_export(&mut self, section: Section, enabled: bool) {
        if let Some(flag) = self.export_flag_mut(section) {
            *flag = enabled;
        }
    }

    pub fn set_import(&mut self, section: Section, enabled: bool) {
        let flag = match section {
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
        };
        *flag = enabled;
    }

    /// Enable every export flag
    pub fn set_all_export(&mut self) {
        for section in Section::ALL {
            self.set_export(section, true);
        }
    }

    /// Disable every export flag
    pub fn unset_all_export(&mut self) {
        for section in Section::ALL {
            self.set_export(section, false);
        }
    }

    /// Enable every import flag
    pub fn set_all_import(&mut self) {
        for section in Section::ALL {
            self.set_import(section, true);
        }
    }

    /// Disable every import flag
    pub fn unset_all_import(&mut self) {
        for section in Section::ALL {
            self.set_import(section, false);
        }
    }

    fn export_flag(&self, section: Section) -> Option<&bool> {
        match section {
            Section::Units => None,
            Section::Datasets => Some(&self.export_datasets),
            Section::Variables => Some(&self.export_variables),
            Section::PostprocessingVariables => Some(&self.export_postprocessing_variables),
            Section::Materials => Some(&self.export_materials),
            Section::CoordinateSystems => Some(&self.export_coordinate_systems),
            Section::ObjectProperties => Some(&self.export_object_properties),
            Section::Boundaries => Some(&self.export_boundaries),
            Section::MeshOperations => Some(&self.export_mesh_operations),
            Section::Setups => Some(&self.export_setups),
            Section::Optimizations => Some(&self.export_optimizations),
            Section::Parametrics => Some(&self.export_parametrics),
        }
    }

    fn export_flag_mut(&mut self, section: Section) -> Option<&mut bool> {
        match section {
            Section::Units => None,
            Section::Datasets => Some(&mut self.export_datasets),
            Section::Variables => Some(&mut self.export_variables),
            Section::PostprocessingVariables => Some(&mut self.export_postprocessing_variables),
            Section::Materials => Some(&mut self.export_materials),
            Section::CoordinateSystems => Some(&mut self.export_coordinate_systems),
            Section::ObjectProperties => Some(&mut self.export_object_properties),
            Section::Boundaries => Some(&mut self.export_boundaries),
            Section::MeshOperations => Some(&mut self.export_mesh_operations),
            Section::Setups => Some(&mut self.export_setups),
            Section::Optimizations => Some(&mut self.export_optimizations),
            Section::Parametrics => Some(&mut self.export_parametrics),
        }
    }
}

/// Builder for ConfigurationOptions
#[derive(Debug, Default)]
pub struct ConfigurationOptionsBuilder {
    options: ConfigurationOptions,
}

impl ConfigurationOptionsBuilder {
    /// Export only the listed sections
    pub fn export_only(mut self, sections: &[Section]) -> Self {
        self.options.unset_all_export();
        for section in sections {
            self.options.set_export(*section, true);
        }
        self
    }

    /// Import only the listed sections
    pub fn import_only(mut self, sections: &[Section]) -> Self {
        self.options.unset_all_import();
        for section in sections {
            self.options.set_import(*section, true);
        }
        self
    }

    pub fn export(mut self, section: Section, enabled: bool) -> Self {
        self.options.set_export(section, enabled);
        self
    }

    pub fn import(mut self, section: Section, enabled: bool) -> Self {
        self.options.set_import(section, enabled);
        self
    }

    /// Set the position matching tolerance. Negative values are clamped to zero.
    pub fn object_mapping_tolerance(mut self, tolerance: f64) -> Self {
        self.options.object_mapping_tolerance = tolerance.max(0.0);
        self
    }

    pub fn skip_import_if_exists(mut self, skip: bool) -> Self {
        self.options.skip_import_if_exists = skip;
        self
    }

    pub fn sort_coordinate_systems(mut self, sort: bool) -> Self {
        self.options.sort_coordinate_systems = sort;
        self
    }

    pub fn build(self) -> ConfigurationOptions {
        self.options
    }
}
