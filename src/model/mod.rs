//! Document loading and saving functionality
//!
//! Provides high-level operations for reading and writing configuration
//! documents through storage backends, including the merge policy applied
//! when an export lands on an existing document.

pub mod format;
pub mod loader;
pub mod merge;
pub mod saver;

pub use format::{DocumentError, DocumentFormat};
pub use loader::DocumentLoader;
pub use merge::{MergeOutcome, merge_documents};
pub use saver::DocumentSaver;
