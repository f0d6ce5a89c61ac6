//! Entity reconciliation
//!
//! Applies one stored entity to the live design: create it when no entity of
//! that name exists, otherwise update it or leave it alone when
//! `skip_import_if_exists` is set. Failures are returned as
//! [`EntityOutcome::Failed`] and never abort the surrounding import.

use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

use super::ordering::{boundary_id, stored_id};
use crate::design::{Category, GLOBAL_COORDINATE_SYSTEM, LiveDesign, OBJECT_PROPERTY_KEYS, VariableScope};
use crate::models::{Dataset, EntityOutcome, PropertyBag};
use crate::validation::REFERENCE_CS_KEY;

/// Boundary kinds that attach to a winding through `ParentBndID`
pub const COIL_KINDS: [&str; 3] = ["Coil", "CoilTerminal", "Coil Terminal"];

/// Create-or-update logic shared by every section of an import
pub struct EntityReconciler<'a, D: LiveDesign + ?Sized> {
    design: &'a mut D,
    skip_existing: bool,
    /// Stored boundary `ID` to the name the boundary has in the live design
    boundaries: HashMap<i64, String>,
}

impl<'a, D: LiveDesign + ?Sized> EntityReconciler<'a, D> {
    pub fn new(design: &'a mut D, skip_existing: bool) -> Self {
        Self {
            design,
            skip_existing,
            boundaries: HashMap::new(),
        }
    }

    pub fn design(&self) -> &D {
        &*self.design
    }

    pub fn set_model_units(&mut self, units: &str) -> EntityOutcome {
        if self.design.model_units() == units {
            return EntityOutcome::Skipped;
        }
        outcome(self.design.set_model_units(units), EntityOutcome::Updated)
    }

    pub fn reconcile_variable(
        &mut self,
        scope: VariableScope,
        name: &str,
        expression: &str,
    ) -> EntityOutcome {
        let exists = self
            .design
            .variables(scope)
            .iter()
            .any(|(existing, _)| existing == name);
        if exists && self.skip_existing {
            return EntityOutcome::Skipped;
        }
        let success = if exists {
            EntityOutcome::Updated
        } else {
            EntityOutcome::Created
        };
        outcome(self.design.set_variable(scope, name, expression), success)
    }

    pub fn reconcile_dataset(&mut self, name: &str, dataset: &Dataset) -> EntityOutcome {
        if self.design.dataset(name).is_none() {
            return outcome(self.design.create_dataset(name, dataset), EntityOutcome::Created);
        }
        if self.skip_existing {
            return EntityOutcome::Skipped;
        }
        outcome(self.design.update_dataset(name, dataset), EntityOutcome::Updated)
    }

    /// Generic create/update/skip of a named entity
    pub fn reconcile(&mut self, category: Category, name: &str, props: &PropertyBag) -> EntityOutcome {
        if self.design.has_entity(category, name) {
            if self.skip_existing {
                return EntityOutcome::Skipped;
            }
            return outcome(
                self.design.update_entity(category, name, props),
                EntityOutcome::Updated,
            );
        }
        outcome(
            self.design.create_entity(category, name, props),
            EntityOutcome::Created,
        )
    }

    /// A new coordinate system needs its reference system to exist already
    pub fn reconcile_coordinate_system(&mut self, name: &str, props: &PropertyBag) -> EntityOutcome {
        if !self.design.has_entity(Category::CoordinateSystem, name)
            && let Some(reference) = props.get(REFERENCE_CS_KEY).and_then(Value::as_str)
            && reference != GLOBAL_COORDINATE_SYSTEM
            && !self.design.has_entity(Category::CoordinateSystem, reference)
        {
            return EntityOutcome::Failed(format!(
                "reference coordinate system '{}' does not exist",
                reference
            ));
        }
        self.reconcile(Category::CoordinateSystem, name, props)
    }

    /// Reconcile a boundary, resolving `Independent` and `ParentBndID`
    /// against boundaries already reconciled in this pass
    pub fn reconcile_boundary(&mut self, name: &str, mut props: PropertyBag) -> EntityOutcome {
        if let Some(independent) = stored_id(props.get("Independent")) {
            match self.boundaries.get(&independent) {
                Some(current) => {
                    props.insert("Independent".to_string(), Value::String(current.clone()));
                }
                None => debug!(
                    "Boundary '{}' has Independent id {} with no reconciled boundary",
                    name, independent
                ),
            }
        }

        let result = self.reconcile(Category::Boundary, name, &props);
        if !result.is_success() {
            return result;
        }

        let props = Value::Object(props);
        if let Some(id) = boundary_id(&props) {
            self.boundaries.insert(id, name.to_string());
        }

        if result == EntityOutcome::Created && is_coil(&props) {
            let Some(parent) = stored_id(props.get("ParentBndID")) else {
                return result;
            };
            let Some(winding) = self.boundaries.get(&parent).cloned() else {
                warn!("Coil '{}' has no reconciled winding with ID {}", name, parent);
                return result;
            };
            if let Err(e) = self.design.link_winding_coil(&winding, name) {
                return EntityOutcome::Failed(format!(
                    "linking to winding '{}' failed: {}",
                    winding, e
                ));
            }
        }
        result
    }

    /// Update the stored fields of an existing object. Objects are never
    /// created by an import.
    pub fn reconcile_object(&mut self, name: &str, props: &PropertyBag) -> EntityOutcome {
        if self.design.object_properties(name).is_none() {
            return EntityOutcome::Failed(format!("object '{}' does not exist", name));
        }
        for key in OBJECT_PROPERTY_KEYS {
            let Some(value) = props.get(key) else {
                continue;
            };
            if let Err(e) = self.design.set_object_property(name, key, value) {
                return EntityOutcome::Failed(format!("{}: {}", key, e));
            }
        }
        EntityOutcome::Updated
    }
}

fn is_coil(props: &Value) -> bool {
    props
        .get("BoundType")
        .and_then(Value::as_str)
        .is_some_and(|kind| COIL_KINDS.contains(&kind))
}

fn outcome(result: anyhow::Result<()>, success: EntityOutcome) -> EntityOutcome {
    match result {
        Ok(()) => success,
        Err(e) => EntityOutcome::Failed(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::InMemoryDesign;
    use serde_json::json;

    fn bag(value: Value) -> PropertyBag {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_create_update_skip() {
        let mut design = InMemoryDesign::new("HFSSDesign1");
        let props = bag(json!({"Frequency": "1GHz"}));

        let mut reconciler = EntityReconciler::new(&mut design, false);
        assert_eq!(
            reconciler.reconcile(Category::Setup, "Setup1", &props),
            EntityOutcome::Created
        );
        assert_eq!(
            reconciler.reconcile(Category::Setup, "Setup1", &bag(json!({"Frequency": "2GHz"}))),
            EntityOutcome::Updated
        );

        let mut reconciler = EntityReconciler::new(&mut design, true);
        assert_eq!(
            reconciler.reconcile(Category::Setup, "Setup1", &props),
            EntityOutcome::Skipped
        );
        assert_eq!(
            design.entity_properties(Category::Setup, "Setup1"),
            Some(bag(json!({"Frequency": "2GHz"})))
        );
    }

    #[test]
    fn test_rejected_create_reports_failure() {
        let mut design = InMemoryDesign::new("HFSSDesign1");
        design.reject(Category::Setup, "Setup1");

        let mut reconciler = EntityReconciler::new(&mut design, false);
        let result = reconciler.reconcile(Category::Setup, "Setup1", &bag(json!({})));
        assert!(matches!(result, EntityOutcome::Failed(reason) if reason.contains("rejected")));
    }

    #[test]
    fn test_coordinate_system_requires_reference() {
        let mut design = InMemoryDesign::new("HFSSDesign1");
        let mut reconciler = EntityReconciler::new(&mut design, false);

        let child = bag(json!({"Reference CS": "Parent"}));
        assert!(matches!(
            reconciler.reconcile_coordinate_system("Child", &child),
            EntityOutcome::Failed(_)
        ));

        let parent = bag(json!({"Reference CS": "Global"}));
        assert_eq!(
            reconciler.reconcile_coordinate_system("Parent", &parent),
            EntityOutcome::Created
        );
        assert_eq!(
            reconciler.reconcile_coordinate_system("Child", &child),
            EntityOutcome::Created
        );
    }

    #[test]
    fn test_independent_and_coil_links() {
        let mut design = InMemoryDesign::new("Maxwell3DDesign1");
        {
            let mut reconciler = EntityReconciler::new(&mut design, false);
            let master = bag(json!({"BoundType": "Master", "ID": 4, "Objects": ["Box1"]}));
            let slave = bag(json!({"BoundType": "Slave", "ID": 9, "Independent": 4, "Objects": ["Box1"]}));
            let winding = bag(json!({"BoundType": "Winding Group", "ID": 11}));
            let coil = bag(json!({"BoundType": "Coil", "ID": 12, "ParentBndID": "11", "Objects": ["Box1"]}));

            assert_eq!(reconciler.reconcile_boundary("Master1", master), EntityOutcome::Created);
            assert_eq!(reconciler.reconcile_boundary("Slave1", slave), EntityOutcome::Created);
            assert_eq!(reconciler.reconcile_boundary("Winding1", winding), EntityOutcome::Created);
            assert_eq!(reconciler.reconcile_boundary("Coil1", coil), EntityOutcome::Created);
        }

        let slave = design.entity_properties(Category::Boundary, "Slave1").unwrap();
        assert_eq!(slave["Independent"], json!("Master1"));
        assert_eq!(
            design.windings(),
            &[("Winding1".to_string(), "Coil1".to_string())]
        );
    }

    #[test]
    fn test_fractional_independent_not_linked() {
        let mut design = InMemoryDesign::new("HFSSDesign1");
        {
            let mut reconciler = EntityReconciler::new(&mut design, false);
            let master = bag(json!({"BoundType": "Master", "ID": 3, "Objects": ["Box1"]}));
            let slave = bag(json!({"BoundType": "Slave", "ID": 9, "Independent": 3.7, "Objects": ["Box1"]}));
            assert_eq!(reconciler.reconcile_boundary("Master1", master), EntityOutcome::Created);
            assert_eq!(reconciler.reconcile_boundary("Slave1", slave), EntityOutcome::Created);
        }

        let slave = design.entity_properties(Category::Boundary, "Slave1").unwrap();
        assert_eq!(slave["Independent"], json!(3.7));
    }

    #[test]
    fn test_object_properties_only_update() {
        let mut design = InMemoryDesign::new("HFSSDesign1");
        design.add_box("Box1", [0.0; 3], [1.0; 3]);
        let mut reconciler = EntityReconciler::new(&mut design, true);

        let props = bag(json!({"Material": "copper", "Unknown": 1}));
        assert_eq!(reconciler.reconcile_object("Box1", &props), EntityOutcome::Updated);
        assert!(matches!(
            reconciler.reconcile_object("Missing", &props),
            EntityOutcome::Failed(_)
        ));

        let stored = design.object_properties("Box1").unwrap();
        assert_eq!(stored.get("Material"), Some(&json!("copper")));
        assert!(!stored.contains_key("Unknown"));
    }

    #[test]
    fn test_variables_and_datasets() {
        let mut design = InMemoryDesign::new("HFSSDesign1");
        let mut reconciler = EntityReconciler::new(&mut design, false);

        assert_eq!(
            reconciler.reconcile_variable(VariableScope::Design, "L", "10mm"),
            EntityOutcome::Created
        );
        assert_eq!(
            reconciler.reconcile_variable(VariableScope::Design, "L", "12mm"),
            EntityOutcome::Updated
        );

        let dataset = Dataset::new(vec![0.0, 1.0], vec![1.0, 2.0]);
        assert_eq!(reconciler.reconcile_dataset("ds1", &dataset), EntityOutcome::Created);
        assert_eq!(reconciler.reconcile_dataset("ds1", &dataset), EntityOutcome::Updated);

        assert_eq!(
            design.variables(VariableScope::Design),
            vec![("L".to_string(), "12mm".to_string())]
        );
    }
}
