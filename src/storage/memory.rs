//! In-memory storage backend
//!
//! Keeps documents in a map keyed by normalized path. Interior mutability lets
//! the backend be shared by reference the same way a file system is.

use super::{StorageBackend, StorageError};
use std::cell::RefCell;
use std::collections::BTreeMap;

/// Storage backend that never touches the disk
#[derive(Debug, Default)]
pub struct MemoryStorageBackend {
    files: RefCell<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStorageBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths of all stored files, sorted
    pub fn paths(&self) -> Vec<String> {
        self.files.borrow().keys().cloned().collect()
    }

    fn key(path: &str) -> String {
        path.trim_start_matches('/').to_string()
    }
}

impl StorageBackend for MemoryStorageBackend {
    fn read_file(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        self.files
            .borrow()
            .get(&Self::key(path))
            .cloned()
            .ok_or_else(|| StorageError::FileNotFound(path.to_string()))
    }

    fn write_file(&self, path: &str, content: &[u8]) -> Result<(), StorageError> {
        self.files
            .borrow_mut()
            .insert(Self::key(path), content.to_vec());
        Ok(())
    }

    fn file_exists(&self, path: &str) -> Result<bool, StorageError> {
        Ok(self.files.borrow().contains_key(&Self::key(path)))
    }

    fn delete_file(&self, path: &str) -> Result<(), StorageError> {
        self.files
            .borrow_mut()
            .remove(&Self::key(path))
            .map(|_| ())
            .ok_or_else(|| StorageError::FileNotFound(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_slash_is_ignored() {
        let backend = MemoryStorageBackend::new();
        backend.write_file("/design.json", b"{}").unwrap();

        assert!(backend.file_exists("design.json").unwrap());
        assert_eq!(backend.paths(), vec!["design.json".to_string()]);

        backend.delete_file("design.json").unwrap();
        assert!(!backend.file_exists("/design.json").unwrap());
    }
}
