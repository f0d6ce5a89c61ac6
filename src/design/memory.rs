//! In-memory live design
//!
//! A self-contained [`LiveDesign`] implementation holding entities, objects
//! with their faces and edges, variables and datasets. Used to exercise the
//! engine without a running host application, and as a fake for embedders.

use anyhow::{Result, anyhow, bail};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

use super::{Category, LiveDesign, OBJECT_PROPERTY_KEYS, VariableScope};
use crate::mapping::REFERENCE_KEYS;
use crate::models::{Dataset, EntityId, Point3, PropertyBag};

#[derive(Debug, Clone)]
struct Feature {
    id: EntityId,
    point: Point3,
}

#[derive(Debug, Clone)]
struct SolidObject {
    id: EntityId,
    name: String,
    properties: PropertyBag,
    faces: Vec<Feature>,
    edges: Vec<Feature>,
}

/// Design state kept entirely in memory
#[derive(Debug, Clone)]
pub struct InMemoryDesign {
    name: String,
    units: String,
    variables: Vec<(String, String)>,
    postprocessing_variables: Vec<(String, String)>,
    datasets: Vec<(String, Dataset)>,
    entities: BTreeMap<Category, Vec<(String, PropertyBag)>>,
    objects: Vec<SolidObject>,
    windings: Vec<(String, String)>,
    rejected: HashSet<(Category, String)>,
    next_id: u64,
}

impl InMemoryDesign {
    /// Empty design in millimeters
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            units: "mm".to_string(),
            variables: Vec::new(),
            postprocessing_variables: Vec::new(),
            datasets: Vec::new(),
            entities: BTreeMap::new(),
            objects: Vec::new(),
            windings: Vec::new(),
            rejected: HashSet::new(),
            next_id: 1,
        }
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Insert an entity without any validation
    pub fn insert_entity(&mut self, category: Category, name: impl Into<String>, props: PropertyBag) {
        let name = name.into();
        let entries = self.entities.entry(category).or_default();
        match entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, bag)) => *bag = props,
            None => entries.push((name, props)),
        }
    }

    pub fn insert_dataset(&mut self, name: impl Into<String>, dataset: Dataset) {
        let name = name.into();
        match self.datasets.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, existing)) => *existing = dataset,
            None => self.datasets.push((name, dataset)),
        }
    }

    /// Add a solid with faces and edges located at the given points.
    /// Returns the object's identifier; face and edge identifiers follow it.
    pub fn add_object(
        &mut self,
        name: impl Into<String>,
        face_centers: &[Point3],
        edge_midpoints: &[Point3],
    ) -> EntityId {
        let id = self.allocate_id();
        let faces = face_centers
            .iter()
            .map(|point| Feature {
                id: self.allocate_id(),
                point: *point,
            })
            .collect();
        let edges = edge_midpoints
            .iter()
            .map(|point| Feature {
                id: self.allocate_id(),
                point: *point,
            })
            .collect();
        self.objects.push(SolidObject {
            id,
            name: name.into(),
            properties: PropertyBag::new(),
            faces,
            edges,
        });
        id
    }

    /// Add an axis-aligned box with its 6 face centers and 12 edge midpoints
    pub fn add_box(&mut self, name: impl Into<String>, origin: Point3, size: Point3) -> EntityId {
        let [x0, y0, z0] = origin;
        let [dx, dy, dz] = size;
        let (xm, ym, zm) = (x0 + dx / 2.0, y0 + dy / 2.0, z0 + dz / 2.0);
        let (x1, y1, z1) = (x0 + dx, y0 + dy, z0 + dz);

        let faces = [
            [xm, ym, z0],
            [xm, ym, z1],
            [xm, y0, zm],
            [xm, y1, zm],
            [x0, ym, zm],
            [x1, ym, zm],
        ];
        let edges = [
            [xm, y0, z0],
            [xm, y1, z0],
            [xm, y0, z1],
            [xm, y1, z1],
            [x0, ym, z0],
            [x1, ym, z0],
            [x0, ym, z1],
            [x1, ym, z1],
            [x0, y0, zm],
            [x1, y0, zm],
            [x0, y1, zm],
            [x1, y1, zm],
        ];
        self.add_object(name, &faces, &edges)
    }

    /// Move the centroid of a face, as a geometry edit would
    pub fn move_face(&mut self, id: EntityId, center: Point3) -> bool {
        self.objects
            .iter_mut()
            .flat_map(|object| object.faces.iter_mut())
            .find(|face| face.id == id)
            .map(|face| face.point = center)
            .is_some()
    }

    /// Shift every object, face and edge identifier by `offset`, as happens
    /// when the host regenerates geometry in a new session
    pub fn renumber(&mut self, offset: u64) {
        for object in &mut self.objects {
            object.id = EntityId(object.id.0 + offset);
            for feature in object.faces.iter_mut().chain(object.edges.iter_mut()) {
                feature.id = EntityId(feature.id.0 + offset);
            }
        }
        self.next_id += offset;
    }

    /// Make every later create or update of this entity fail
    pub fn reject(&mut self, category: Category, name: impl Into<String>) {
        self.rejected.insert((category, name.into()));
    }

    /// `(winding, coil)` pairs linked so far
    pub fn windings(&self) -> &[(String, String)] {
        &self.windings
    }

    fn object(&self, name: &str) -> Option<&SolidObject> {
        self.objects.iter().find(|object| object.name == name)
    }

    fn features_of<'a>(
        &'a self,
        object: &str,
        select: impl Fn(&'a SolidObject) -> &'a Vec<Feature>,
    ) -> Vec<EntityId> {
        self.object(object)
            .map(|o| select(o).iter().map(|f| f.id).collect())
            .unwrap_or_default()
    }

    fn find_feature(
        &self,
        id: EntityId,
        select: impl Fn(&SolidObject) -> &Vec<Feature>,
    ) -> Option<(&SolidObject, Point3)> {
        self.objects.iter().find_map(|object| {
            select(object)
                .iter()
                .find(|feature| feature.id == id)
                .map(|feature| (object, feature.point))
        })
    }

    fn variables_mut(&mut self, scope: VariableScope) -> &mut Vec<(String, String)> {
        match scope {
            VariableScope::Design => &mut self.variables,
            VariableScope::Postprocessing => &mut self.postprocessing_variables,
        }
    }

    fn check_accepted(&self, category: Category, name: &str) -> Result<()> {
        if self.rejected.contains(&(category, name.to_string())) {
            bail!("{} '{}' rejected by the design", category, name);
        }
        Ok(())
    }
}

/// Assignments of boundaries and mesh operations must not be empty
fn check_assignment(category: Category, name: &str, props: &PropertyBag) -> Result<()> {
    if !matches!(category, Category::Boundary | Category::MeshOperation) {
        return Ok(());
    }
    let lists: Vec<&Vec<Value>> = REFERENCE_KEYS
        .iter()
        .filter_map(|key| props.get(*key).and_then(Value::as_array))
        .collect();
    if !lists.is_empty() && lists.iter().all(|list| list.is_empty()) {
        bail!("{} '{}' has no geometry assignment", category, name);
    }
    Ok(())
}

impl LiveDesign for InMemoryDesign {
    fn design_name(&self) -> String {
        self.name.clone()
    }

    fn model_units(&self) -> String {
        self.units.clone()
    }

    fn set_model_units(&mut self, units: &str) -> Result<()> {
        if units.trim().is_empty() {
            bail!("model units cannot be empty");
        }
        self.units = units.to_string();
        Ok(())
    }

    fn variables(&self, scope: VariableScope) -> Vec<(String, String)> {
        match scope {
            VariableScope::Design => self.variables.clone(),
            VariableScope::Postprocessing => self.postprocessing_variables.clone(),
        }
    }

    fn set_variable(&mut self, scope: VariableScope, name: &str, expression: &str) -> Result<()> {
        if name.is_empty() {
            bail!("variable name cannot be empty");
        }
        let variables = self.variables_mut(scope);
        match variables.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, value)) => *value = expression.to_string(),
            None => variables.push((name.to_string(), expression.to_string())),
        }
        Ok(())
    }

    fn dataset_names(&self) -> Vec<String> {
        self.datasets.iter().map(|(name, _)| name.clone()).collect()
    }

    fn dataset(&self, name: &str) -> Option<Dataset> {
        self.datasets
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, dataset)| dataset.clone())
    }

    fn create_dataset(&mut self, name: &str, dataset: &Dataset) -> Result<()> {
        if self.dataset(name).is_some() {
            bail!("dataset '{}' already exists", name);
        }
        if dataset.x.len() != dataset.y.len() {
            bail!("dataset '{}' has mismatched column lengths", name);
        }
        self.datasets.push((name.to_string(), dataset.clone()));
        Ok(())
    }

    fn update_dataset(&mut self, name: &str, dataset: &Dataset) -> Result<()> {
        let slot = self
            .datasets
            .iter_mut()
            .find(|(existing, _)| existing == name)
            .ok_or_else(|| anyhow!("dataset '{}' does not exist", name))?;
        slot.1 = dataset.clone();
        Ok(())
    }

    fn entity_names(&self, category: Category) -> Vec<String> {
        self.entities
            .get(&category)
            .map(|entries| entries.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default()
    }

    fn entity_properties(&self, category: Category, name: &str) -> Option<PropertyBag> {
        self.entities
            .get(&category)?
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, props)| props.clone())
    }

    fn create_entity(&mut self, category: Category, name: &str, props: &PropertyBag) -> Result<()> {
        self.check_accepted(category, name)?;
        if self.has_entity(category, name) {
            bail!("{} '{}' already exists", category, name);
        }
        check_assignment(category, name, props)?;
        self.insert_entity(category, name, props.clone());
        Ok(())
    }

    fn update_entity(&mut self, category: Category, name: &str, props: &PropertyBag) -> Result<()> {
        self.check_accepted(category, name)?;
        if !self.has_entity(category, name) {
            bail!("{} '{}' does not exist", category, name);
        }
        check_assignment(category, name, props)?;
        self.insert_entity(category, name, props.clone());
        Ok(())
    }

    fn link_winding_coil(&mut self, winding: &str, coil: &str) -> Result<()> {
        for name in [winding, coil] {
            if !self.has_entity(Category::Boundary, name) {
                bail!("boundary '{}' does not exist", name);
            }
        }
        self.windings.push((winding.to_string(), coil.to_string()));
        Ok(())
    }

    fn object_names(&self) -> Vec<String> {
        self.objects.iter().map(|object| object.name.clone()).collect()
    }

    fn object_properties(&self, name: &str) -> Option<PropertyBag> {
        self.object(name).map(|object| {
            OBJECT_PROPERTY_KEYS
                .iter()
                .filter_map(|key| {
                    object
                        .properties
                        .get(*key)
                        .map(|value| (key.to_string(), value.clone()))
                })
                .collect()
        })
    }

    fn set_object_property(&mut self, name: &str, key: &str, value: &Value) -> Result<()> {
        let object = self
            .objects
            .iter_mut()
            .find(|object| object.name == name)
            .ok_or_else(|| anyhow!("object '{}' does not exist", name))?;
        object.properties.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn object_name_by_id(&self, id: EntityId) -> Option<String> {
        self.objects
            .iter()
            .find(|object| object.id == id)
            .map(|object| object.name.clone())
    }

    fn object_id_by_name(&self, name: &str) -> Option<EntityId> {
        self.object(name).map(|object| object.id)
    }

    fn face_owner(&self, id: EntityId) -> Option<String> {
        self.find_feature(id, |o| &o.faces)
            .map(|(object, _)| object.name.clone())
    }

    fn edge_owner(&self, id: EntityId) -> Option<String> {
        self.find_feature(id, |o| &o.edges)
            .map(|(object, _)| object.name.clone())
    }

    fn face_center(&self, id: EntityId) -> Option<Point3> {
        self.find_feature(id, |o| &o.faces).map(|(_, point)| point)
    }

    fn edge_midpoint(&self, id: EntityId) -> Option<Point3> {
        self.find_feature(id, |o| &o.edges).map(|(_, point)| point)
    }

    fn faces_of(&self, object: &str) -> Vec<EntityId> {
        self.features_of(object, |o| &o.faces)
    }

    fn edges_of(&self, object: &str) -> Vec<EntityId> {
        self.features_of(object, |o| &o.edges)
    }

    fn face_by_position(&self, object: &str, point: Point3) -> Option<EntityId> {
        self.object(object)?
            .faces
            .iter()
            .find(|face| face.point == point)
            .map(|face| face.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(value: Value) -> PropertyBag {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_box_topology() {
        let mut design = InMemoryDesign::new("HFSSDesign1");
        let id = design.add_box("Box1", [0.0, 0.0, 0.0], [2.0, 2.0, 2.0]);

        assert_eq!(design.object_name_by_id(id).as_deref(), Some("Box1"));
        assert_eq!(design.faces_of("Box1").len(), 6);
        assert_eq!(design.edges_of("Box1").len(), 12);

        let top = design.face_by_position("Box1", [1.0, 1.0, 2.0]).unwrap();
        assert_eq!(design.face_owner(top).as_deref(), Some("Box1"));
        assert_eq!(design.face_center(top), Some([1.0, 1.0, 2.0]));
        assert!(design.edge_owner(top).is_none());
    }

    #[test]
    fn test_renumber_shifts_all_ids() {
        let mut design = InMemoryDesign::new("HFSSDesign1");
        let id = design.add_box("Box1", [0.0; 3], [1.0; 3]);
        let face = design.faces_of("Box1")[0];

        design.renumber(100);

        assert!(design.object_name_by_id(id).is_none());
        assert_eq!(
            design.object_name_by_id(EntityId(id.0 + 100)).as_deref(),
            Some("Box1")
        );
        assert_eq!(design.faces_of("Box1")[0], EntityId(face.0 + 100));
    }

    #[test]
    fn test_create_rejects_duplicates_and_empty_assignments() {
        let mut design = InMemoryDesign::new("HFSSDesign1");
        let props = bag(json!({"BoundType": "Radiation", "Faces": [7]}));

        design
            .create_entity(Category::Boundary, "Rad1", &props)
            .unwrap();
        assert!(design.create_entity(Category::Boundary, "Rad1", &props).is_err());

        let empty = bag(json!({"BoundType": "Radiation", "Faces": []}));
        assert!(design.create_entity(Category::Boundary, "Rad2", &empty).is_err());
    }

    #[test]
    fn test_rejected_entities_fail() {
        let mut design = InMemoryDesign::new("HFSSDesign1");
        design.reject(Category::Setup, "Setup1");

        let err = design
            .create_entity(Category::Setup, "Setup1", &PropertyBag::new())
            .unwrap_err();
        assert!(err.to_string().contains("rejected"));
    }

    #[test]
    fn test_object_properties_only_report_known_keys() {
        let mut design = InMemoryDesign::new("HFSSDesign1");
        design.add_box("Box1", [0.0; 3], [1.0; 3]);
        design
            .set_object_property("Box1", "Material", &json!("copper"))
            .unwrap();
        design
            .set_object_property("Box1", "Internal", &json!("x"))
            .unwrap();

        let props = design.object_properties("Box1").unwrap();
        assert_eq!(props.len(), 1);
        assert_eq!(props["Material"], json!("copper"));
    }
}
