//! Document loading functionality
//!
//! Loads configuration documents from storage backends, decoding them by
//! file extension.

use serde_json::Value;
use tracing::info;

use super::format::DocumentFormat;
use crate::import::ImportError;
use crate::models::ConfigurationDocument;
use crate::storage::StorageBackend;

/// Document loader that uses a storage backend
pub struct DocumentLoader<B: StorageBackend> {
    storage: B,
}

impl<B: StorageBackend> DocumentLoader<B> {
    /// Create a new document loader with the given storage backend
    pub fn new(storage: B) -> Self {
        Self { storage }
    }

    /// Read and decode a stored document without interpreting its sections
    pub fn load_value(&self, path: &str) -> Result<Value, ImportError> {
        let format = DocumentFormat::from_path(path)?;
        let content = self.storage.read_file(path)?;
        Ok(format.decode(&content)?)
    }

    /// Load a configuration document
    pub fn load(&self, path: &str) -> Result<ConfigurationDocument, ImportError> {
        let value = self.load_value(path)?;
        let document: ConfigurationDocument = serde_json::from_value(value)
            .map_err(|e| ImportError::InvalidDocument(format!("{}: {}", path, e)))?;

        info!(
            "Loaded configuration of design '{}' (version {}) from {}",
            document.general.design_name, document.general.producer_version, path
        );
        Ok(document)
    }
}
