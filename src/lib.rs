//! Design Configuration SDK - snapshot and reconciliation of EM design setups
//!
//! Provides unified interfaces for:
//! - Exporting the configuration of a live design into a portable document
//! - Re-applying a stored document to the same or another design session
//! - Position fingerprints for geometry identifiers that change between sessions
//! - Merging a new export into an existing document
//! - Document storage (via storage backends) and validation

pub mod configurations;
pub mod design;
pub mod export;
pub mod import;
pub mod mapping;
pub mod model;
pub mod models;
pub mod storage;
pub mod validation;

// Re-export commonly used types
pub use storage::{MemoryStorageBackend, StorageBackend, StorageError};
#[cfg(feature = "native-fs")]
pub use storage::filesystem::FileSystemStorageBackend;

pub use configurations::DesignConfigurations;
pub use design::{Category, InMemoryDesign, LiveDesign, VariableScope};
pub use export::{ExportError, PRODUCER_VERSION, SnapshotExporter, extract_dataset_names};
pub use import::{EntityReconciler, ImportError, import_document};
pub use mapping::FingerprintCodec;
pub use model::{DocumentError, DocumentFormat, DocumentLoader, DocumentSaver, MergeOutcome, merge_documents};
pub use validation::{DocumentValidationResult, ValidationIssue, validate_document};

// Re-export models
pub use models::{
    ConfigurationDocument, ConfigurationOptions, ConfigurationOptionsBuilder, Dataset,
    EntityDescriptor, EntityId, EntityOutcome, ImportResults, ObjectMapping, Section,
};
