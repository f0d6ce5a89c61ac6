//! Merging a fresh export into a previously stored document
//!
//! Sections disabled in the current export are carried over from the
//! document already on disk, but only when both were written by the same
//! producer version. Anything else discards the old document.

use serde_json::Value;
use tracing::info;

/// What happened to the previous document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Sections or keys were copied from the previous document
    Merged { sections: usize, keys: usize },
    /// Versions matched but the fresh export already had everything
    NothingToMerge,
    /// The previous document was written by another producer version
    VersionMismatch,
}

/// `general.producer_version` of a stored document
pub fn producer_version(document: &Value) -> Option<&str> {
    document.get("general")?.get("producer_version")?.as_str()
}

/// Copy into `fresh` every top-level section of `previous` it lacks and,
/// for sections present in both, every second-level key it lacks.
pub fn merge_documents(fresh: &mut Value, previous: &Value, current_version: &str) -> MergeOutcome {
    if producer_version(previous) != Some(current_version) {
        info!(
            "Previous document version {:?} differs from {}, not merging",
            producer_version(previous),
            current_version
        );
        return MergeOutcome::VersionMismatch;
    }
    let (Some(fresh), Some(previous)) = (fresh.as_object_mut(), previous.as_object()) else {
        return MergeOutcome::NothingToMerge;
    };

    let mut sections = 0;
    let mut keys = 0;
    for (name, old_section) in previous {
        match fresh.get_mut(name) {
            None => {
                fresh.insert(name.clone(), old_section.clone());
                sections += 1;
            }
            Some(Value::Object(new_section)) => {
                if let Value::Object(old_section) = old_section {
                    for (key, value) in old_section {
                        if !new_section.contains_key(key) {
                            new_section.insert(key.clone(), value.clone());
                            keys += 1;
                        }
                    }
                }
            }
            Some(_) => {}
        }
    }

    if sections == 0 && keys == 0 {
        MergeOutcome::NothingToMerge
    } else {
        info!(
            "Merged {} sections and {} keys from previous document",
            sections, keys
        );
        MergeOutcome::Merged { sections, keys }
    }
}
