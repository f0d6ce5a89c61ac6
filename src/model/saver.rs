//! Document saving functionality
//!
//! Writes configuration documents to storage backends, optionally merging
//! with the document already stored at the target path.

use serde_json::Value;
use tracing::{info, warn};

use super::format::{DocumentError, DocumentFormat};
use super::loader::DocumentLoader;
use super::merge::{MergeOutcome, merge_documents};
use crate::export::ExportError;
use crate::models::ConfigurationDocument;
use crate::storage::StorageBackend;

/// Document saver that uses a storage backend
pub struct DocumentSaver<B: StorageBackend> {
    storage: B,
}

impl<B: StorageBackend> DocumentSaver<B> {
    /// Create a new document saver with the given storage backend
    pub fn new(storage: B) -> Self {
        Self { storage }
    }

    /// Encode and write a document value, replacing any existing file
    pub fn save_value(&self, path: &str, value: &Value) -> Result<(), ExportError> {
        let format = DocumentFormat::from_path(path)?;
        let content = format.encode(value)?;
        self.storage.write_file(path, &content)?;
        info!("Saved configuration to {} ({} bytes)", path, content.len());
        Ok(())
    }

    /// Write `document` to `path`.
    ///
    /// Unless `overwrite` is set, a readable document already at `path` that
    /// was written by `producer_version` contributes the sections and keys the
    /// new document lacks. Returns the path written.
    pub fn save(
        &self,
        path: &str,
        document: &ConfigurationDocument,
        overwrite: bool,
        producer_version: &str,
    ) -> Result<String, ExportError> {
        let mut value = serde_json::to_value(document).map_err(DocumentError::from)?;

        if !overwrite && self.storage.file_exists(path)? {
            match DocumentLoader::new(&self.storage).load_value(path) {
                Ok(previous) => {
                    if let MergeOutcome::Merged { sections, keys } =
                        merge_documents(&mut value, &previous, producer_version)
                    {
                        info!(
                            "Kept {} sections and {} keys from existing {}",
                            sections, keys, path
                        );
                    }
                }
                Err(e) => warn!("Existing document {} is unreadable, replacing it: {}", path, e),
            }
        }

        self.save_value(path, &value)?;
        Ok(path.to_string())
    }
}
