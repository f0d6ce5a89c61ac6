//! Storage backend abstraction
//!
//! Defines the StorageBackend trait and implementations for different storage systems:
//! - FileSystemStorageBackend: Native file system (for desktop sessions)
//! - MemoryStorageBackend: In-process map of paths to bytes (for embedding and tests)
//!
//! Configuration documents are always read and written whole, so the trait only
//! exposes whole-file operations.

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    FileNotFound(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

/// Trait for storage backends
///
/// Design sessions are single-threaded and every call blocks until the
/// underlying medium has completed the operation.
pub trait StorageBackend {
    /// Read a file from storage
    fn read_file(&self, path: &str) -> Result<Vec<u8>, StorageError>;

    /// Write a file to storage, replacing any previous content
    fn write_file(&self, path: &str, content: &[u8]) -> Result<(), StorageError>;

    /// Check if a file exists
    fn file_exists(&self, path: &str) -> Result<bool, StorageError>;

    /// Delete a file
    fn delete_file(&self, path: &str) -> Result<(), StorageError>;
}

impl<B: StorageBackend + ?Sized> StorageBackend for &B {
    fn read_file(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        (**self).read_file(path)
    }

    fn write_file(&self, path: &str, content: &[u8]) -> Result<(), StorageError> {
        (**self).write_file(path, content)
    }

    fn file_exists(&self, path: &str) -> Result<bool, StorageError> {
        (**self).file_exists(path)
    }

    fn delete_file(&self, path: &str) -> Result<(), StorageError> {
        (**self).delete_file(path)
    }
}

// Storage backend implementations
#[cfg(feature = "native-fs")]
pub mod filesystem;

pub mod memory;

#[cfg(feature = "native-fs")]
pub use filesystem::FileSystemStorageBackend;
pub use memory::MemoryStorageBackend;
