//! Dataset dependency extraction
//!
//! Material properties can be driven by piecewise-linear lookups such as
//! `pwl($ds_permittivity, Freq)`. Only datasets referenced that way are
//! exported next to the materials.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeSet;

/// First `$` up to the first following `,`
static DATASET_REFERENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$([^,]*),").unwrap());

/// Dataset named by a `pwl` expression, if any
pub fn dataset_reference(expression: &str) -> Option<&str> {
    if !expression.contains("pwl") {
        return None;
    }
    let name = DATASET_REFERENCE.captures(expression)?.get(1)?.as_str().trim();
    (!name.is_empty()).then_some(name)
}

/// Collect the names of all datasets referenced anywhere in a property tree.
///
/// Strings are inspected wherever they appear, which covers plain property
/// values as well as the `free_form_value` field of list-of-record values.
pub fn extract_dataset_names(tree: &Value) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    collect(tree, &mut names);
    names
}

fn collect(value: &Value, names: &mut BTreeSet<String>) {
    match value {
        Value::String(s) => {
            if let Some(name) = dataset_reference(s) {
                names.insert(name.to_string());
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect(item, names)),
        Value::Object(map) => map.values().for_each(|item| collect(item, names)),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}
