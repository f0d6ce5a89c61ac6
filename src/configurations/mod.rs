//! Design configuration engine
//!
//! Ties one live design to a storage backend: [`DesignConfigurations::export`]
//! snapshots the design into a document (merging with an existing one when
//! allowed) and [`DesignConfigurations::import`] applies a stored document.

use tracing::{info, warn};

use crate::design::LiveDesign;
use crate::export::{ExportError, PRODUCER_VERSION, SnapshotExporter};
use crate::import::{ImportError, import_document};
use crate::model::{DocumentLoader, DocumentSaver};
use crate::models::{ConfigurationDocument, ConfigurationOptions, ImportResults};
use crate::storage::StorageBackend;
use crate::validation::validate_document;

/// Export/import engine of one design session
pub struct DesignConfigurations<D: LiveDesign, B: StorageBackend> {
    design: D,
    storage: B,
    options: ConfigurationOptions,
    producer_version: String,
}

impl<D: LiveDesign, B: StorageBackend> DesignConfigurations<D, B> {
    pub fn new(design: D, storage: B) -> Self {
        Self {
            design,
            storage,
            options: ConfigurationOptions::default(),
            producer_version: PRODUCER_VERSION.to_string(),
        }
    }

    pub fn with_options(mut self, options: ConfigurationOptions) -> Self {
        self.options = options;
        self
    }

    /// Version stamped into exported documents and compared when merging
    pub fn with_producer_version(mut self, version: impl Into<String>) -> Self {
        self.producer_version = version.into();
        self
    }

    pub fn options(&self) -> &ConfigurationOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut ConfigurationOptions {
        &mut self.options
    }

    pub fn design(&self) -> &D {
        &self.design
    }

    pub fn design_mut(&mut self) -> &mut D {
        &mut self.design
    }

    pub fn storage(&self) -> &B {
        &self.storage
    }

    pub fn into_parts(self) -> (D, B) {
        (self.design, self.storage)
    }

    /// Snapshot the design without writing it
    pub fn snapshot(&self) -> ConfigurationDocument {
        SnapshotExporter::new(&self.design)
            .with_producer_version(self.producer_version.clone())
            .export(&self.options)
    }

    /// Export the design to `path`. Unless `overwrite` is set, sections of a
    /// document already at `path` written by the same producer version are
    /// kept when this export leaves them out.
    pub fn export(&self, path: &str, overwrite: bool) -> Result<String, ExportError> {
        let document = self.snapshot();
        let path = DocumentSaver::new(&self.storage).save(
            path,
            &document,
            overwrite,
            &self.producer_version,
        )?;
        info!("Exported configuration of '{}' to {}", document.general.design_name, path);
        Ok(path)
    }

    /// Load the document at `path` and apply it to the design
    pub fn import(&mut self, path: &str) -> Result<(ConfigurationDocument, ImportResults), ImportError> {
        let document = DocumentLoader::new(&self.storage).load(path)?;

        for issue in validate_document(&document).issues {
            warn!("{}: {}", path, issue);
        }

        let results = import_document(&mut self.design, &document, &self.options);
        Ok((document, results))
    }
}
