//! Processing order of stored entities
//!
//! Boundaries refer back to each other by the numeric `ID` they held at
//! export, so they are reconciled in ascending `ID` order. Coordinate systems
//! are optionally ordered so each reference system is created before the
//! systems defined relative to it.

use serde_json::Value;
use tracing::warn;

use crate::models::EntityMap;
use crate::validation::FrameGraph;

/// Sort key of boundaries without a stored `ID`
pub const MISSING_ID: i64 = i64::MAX;

/// Stored numeric identifier: an integer, a whole float or a string holding one
pub fn stored_id(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// The `ID` a boundary held at export
pub fn boundary_id(props: &Value) -> Option<i64> {
    stored_id(props.get("ID"))
}

/// Boundaries in ascending `ID` order. Boundaries sharing an `ID`, or lacking
/// one, keep their document order.
pub fn sort_boundaries(boundaries: &EntityMap) -> Vec<(&String, &Value)> {
    let mut ordered: Vec<(&String, &Value)> = boundaries.iter().collect();
    ordered.sort_by_key(|(_, props)| boundary_id(props).unwrap_or(MISSING_ID));
    ordered
}

/// Coordinate systems in processing order. With `sort` set, reference
/// systems come first; on a reference cycle the document order is kept.
pub fn order_coordinate_systems(frames: &EntityMap, sort: bool) -> Vec<(&String, &Value)> {
    if !sort {
        return frames.iter().collect();
    }
    let Some(order) = FrameGraph::new(frames).ordered() else {
        warn!("Coordinate systems reference each other in a cycle, keeping document order");
        return frames.iter().collect();
    };
    order
        .iter()
        .filter_map(|name| frames.get_key_value(name.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entities(value: Value) -> EntityMap {
        value.as_object().cloned().unwrap()
    }

    fn names<'a>(ordered: &[(&'a String, &'a Value)]) -> Vec<&'a str> {
        ordered.iter().map(|(name, _)| name.as_str()).collect()
    }

    #[test]
    fn test_stored_id_forms() {
        assert_eq!(stored_id(Some(&json!(7))), Some(7));
        assert_eq!(stored_id(Some(&json!("12"))), Some(12));
        assert_eq!(stored_id(Some(&json!(3.0))), Some(3));
        assert_eq!(stored_id(Some(&json!(3.7))), None);
        assert_eq!(stored_id(Some(&json!("Port1"))), None);
        assert_eq!(stored_id(None), None);
    }

    #[test]
    fn test_boundaries_sorted_by_id() {
        let boundaries = entities(json!({
            "NoId": {"BoundType": "Radiation"},
            "Slave": {"BoundType": "Slave", "ID": 5, "Independent": 2},
            "Master": {"BoundType": "Master", "ID": "2"},
            "Other": {"BoundType": "Radiation"}
        }));

        let ordered = sort_boundaries(&boundaries);
        assert_eq!(names(&ordered), vec!["Master", "Slave", "NoId", "Other"]);
    }

    #[test]
    fn test_coordinate_systems_unsorted_keeps_document_order() {
        let frames = entities(json!({
            "Child": {"Reference CS": "Parent"},
            "Parent": {"Reference CS": "Global"}
        }));

        assert_eq!(
            names(&order_coordinate_systems(&frames, false)),
            vec!["Child", "Parent"]
        );
        assert_eq!(
            names(&order_coordinate_systems(&frames, true)),
            vec!["Parent", "Child"]
        );
    }

    #[test]
    fn test_coordinate_system_cycle_keeps_document_order() {
        let frames = entities(json!({
            "A": {"Reference CS": "B"},
            "B": {"Reference CS": "A"}
        }));

        assert_eq!(names(&order_coordinate_systems(&frames, true)), vec!["A", "B"]);
    }
}
