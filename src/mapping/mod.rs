//! Geometric fingerprint codec
//!
//! The host application numbers objects, faces and edges with identifiers
//! that do not survive a new session or a geometry regeneration. At export,
//! every identifier referenced by a boundary or mesh operation is described by
//! a position fingerprint ([`EntityDescriptor`]). At import, each stored
//! identifier is resolved back to a live one:
//!
//! - objects by name (entries stored as names stay names),
//! - faces by exact position first, then by the nearest face centroid of the
//!   owning object within the configured tolerance,
//! - edges by the nearest edge midpoint of the owning object within tolerance.
//!
//! Identifiers that cannot be resolved are dropped from the rewritten list.
//! Positions that are not numbers never match.

use serde_json::Value;
use tracing::{debug, warn};

use crate::design::LiveDesign;
use crate::models::{EntityDescriptor, EntityId, ObjectMapping, Point3, PropertyBag};

/// Property keys holding lists of transient identifiers
pub const REFERENCE_KEYS: [&str; 3] = ["Objects", "Faces", "Edges"];

/// What a reference list points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Object,
    Face,
    Edge,
}

impl ReferenceKind {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "Objects" => Some(ReferenceKind::Object),
            "Faces" => Some(ReferenceKind::Face),
            "Edges" => Some(ReferenceKind::Edge),
            _ => None,
        }
    }
}

/// Counts of one reference rewrite
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteSummary {
    pub resolved: usize,
    pub dropped: usize,
}

/// Euclidean distance between two points
pub fn distance(a: Point3, b: Point3) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(p, q)| (p - q) * (p - q))
        .sum::<f64>()
        .sqrt()
}

/// Converts transient identifiers to fingerprints and back against one design
pub struct FingerprintCodec<'a, D: LiveDesign + ?Sized> {
    design: &'a D,
    tolerance: f64,
}

impl<'a, D: LiveDesign + ?Sized> FingerprintCodec<'a, D> {
    pub fn new(design: &'a D, tolerance: f64) -> Self {
        Self { design, tolerance }
    }

    /// Fingerprint of a live identifier: the object name, or the owner name
    /// plus face centroid / edge midpoint
    pub fn describe(&self, id: EntityId) -> Option<EntityDescriptor> {
        if let Some(name) = self.design.object_name_by_id(id) {
            return Some(EntityDescriptor::Object(name));
        }
        if let (Some(owner), Some(center)) = (self.design.face_owner(id), self.design.face_center(id)) {
            return Some(EntityDescriptor::Located(owner, center));
        }
        if let (Some(owner), Some(midpoint)) =
            (self.design.edge_owner(id), self.design.edge_midpoint(id))
        {
            return Some(EntityDescriptor::Located(owner, midpoint));
        }
        None
    }

    /// Describe every identifier referenced by `props` into `mapping`.
    /// Identifiers already in the mapping are not described twice.
    /// Returns the number of new entries.
    pub fn record_references(&self, props: &PropertyBag, mapping: &mut ObjectMapping) -> usize {
        let mut added = 0;
        for key in REFERENCE_KEYS {
            let Some(list) = props.get(key).and_then(Value::as_array) else {
                continue;
            };
            for id in list.iter().filter_map(EntityId::from_value) {
                let slot = id.to_string();
                if mapping.contains_key(&slot) {
                    continue;
                }
                match self.describe(id) {
                    Some(descriptor) => {
                        mapping.insert(slot, descriptor);
                        added += 1;
                    }
                    None => warn!("{} id {} is unknown to the design, not mapped", key, id),
                }
            }
        }
        added
    }

    /// Resolve an object fingerprint to the live identifier of the object
    /// with that name
    pub fn resolve_object(&self, descriptor: &EntityDescriptor) -> Option<EntityId> {
        self.design.object_id_by_name(descriptor.owner())
    }

    /// Resolve a face fingerprint to a live face of the same owner
    pub fn resolve_face(&self, descriptor: &EntityDescriptor) -> Option<EntityId> {
        let EntityDescriptor::Located(owner, center) = descriptor else {
            return None;
        };
        if let Some(id) = self.design.face_by_position(owner, *center) {
            return Some(id);
        }
        self.nearest(self.design.faces_of(owner), *center, |id| {
            self.design.face_center(id)
        })
    }

    /// Resolve an edge fingerprint to a live edge of the same owner
    pub fn resolve_edge(&self, descriptor: &EntityDescriptor) -> Option<EntityId> {
        let EntityDescriptor::Located(owner, midpoint) = descriptor else {
            return None;
        };
        self.nearest(self.design.edges_of(owner), *midpoint, |id| {
            self.design.edge_midpoint(id)
        })
    }

    /// Candidate closest to `target`, if strictly within tolerance.
    /// On equal distances the first candidate in enumeration order wins.
    fn nearest(
        &self,
        candidates: Vec<EntityId>,
        target: Point3,
        locate: impl Fn(EntityId) -> Option<Point3>,
    ) -> Option<EntityId> {
        let mut best: Option<(EntityId, f64)> = None;
        for id in candidates {
            let Some(point) = locate(id) else {
                continue;
            };
            let d = distance(point, target);
            if d.is_nan() || d >= self.tolerance {
                continue;
            }
            if best.is_none_or(|(_, best_distance)| d < best_distance) {
                best = Some((id, d));
            }
        }
        best.map(|(id, _)| id)
    }

    fn resolve_one(&self, kind: ReferenceKind, raw: &Value, mapping: &ObjectMapping) -> Option<Value> {
        match kind {
            // Objects stored by name are kept as names
            ReferenceKind::Object if raw.is_string() && EntityId::from_value(raw).is_none() => {
                Some(raw.clone())
            }
            _ => {
                let id = EntityId::from_value(raw)?;
                let descriptor = mapping.get(&id.to_string())?;
                let resolved = match kind {
                    ReferenceKind::Object => self.resolve_object(descriptor),
                    ReferenceKind::Face => self.resolve_face(descriptor),
                    ReferenceKind::Edge => self.resolve_edge(descriptor),
                };
                resolved.map(Value::from)
            }
        }
    }

    /// Rewrite the `Objects`/`Faces`/`Edges` lists of a stored property bag
    /// in place so they refer to live entities
    pub fn rewrite_references(&self, props: &mut PropertyBag, mapping: &ObjectMapping) -> RewriteSummary {
        let mut summary = RewriteSummary::default();
        for key in REFERENCE_KEYS {
            let Some(kind) = ReferenceKind::from_key(key) else {
                continue;
            };
            let Some(Value::Array(list)) = props.get_mut(key) else {
                continue;
            };
            let mut rewritten = Vec::with_capacity(list.len());
            for raw in list.iter() {
                match self.resolve_one(kind, raw, mapping) {
                    Some(value) => {
                        summary.resolved += 1;
                        rewritten.push(value);
                    }
                    None => {
                        summary.dropped += 1;
                        debug!("Dropping unresolved {} reference {}", key, raw);
                    }
                }
            }
            *list = rewritten;
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::InMemoryDesign;
    use serde_json::json;

    fn design_with_box() -> (InMemoryDesign, EntityId) {
        let mut design = InMemoryDesign::new("HFSSDesign1");
        let id = design.add_box("Box1", [0.0; 3], [2.0, 2.0, 2.0]);
        (design, id)
    }

    #[test]
    fn test_describe_object_face_edge() {
        let (design, id) = design_with_box();
        let codec = FingerprintCodec::new(&design, 1e-9);

        assert_eq!(
            codec.describe(id),
            Some(EntityDescriptor::Object("Box1".to_string()))
        );

        let face = design.faces_of("Box1")[1];
        assert_eq!(
            codec.describe(face),
            Some(EntityDescriptor::Located("Box1".to_string(), [1.0, 1.0, 2.0]))
        );

        let edge = design.edges_of("Box1")[0];
        assert_eq!(
            codec.describe(edge),
            Some(EntityDescriptor::Located("Box1".to_string(), [1.0, 0.0, 0.0]))
        );

        assert_eq!(codec.describe(EntityId(9999)), None);
    }

    #[test]
    fn test_record_references_maps_each_id_once() {
        let (design, id) = design_with_box();
        let face = design.faces_of("Box1")[0];
        let codec = FingerprintCodec::new(&design, 1e-9);

        let props = json!({"Objects": [id.0], "Faces": [face.0, face.0, 424242]});
        let mut mapping = ObjectMapping::new();
        let added = codec.record_references(props.as_object().unwrap(), &mut mapping);

        assert_eq!(added, 2);
        assert_eq!(mapping.len(), 2);
        assert!(mapping.contains_key(&face.to_string()));
    }

    #[test]
    fn test_face_resolves_after_renumbering() {
        let (mut design, _) = design_with_box();
        let face = design.faces_of("Box1")[3];
        let mut mapping = ObjectMapping::new();
        FingerprintCodec::new(&design, 1e-9)
            .record_references(json!({"Faces": [face.0]}).as_object().unwrap(), &mut mapping);

        design.renumber(500);
        let codec = FingerprintCodec::new(&design, 1e-9);
        let descriptor = &mapping[&face.to_string()];

        assert_eq!(codec.resolve_face(descriptor), Some(EntityId(face.0 + 500)));
    }

    #[test]
    fn test_face_tolerance_boundary() {
        let (mut design, _) = design_with_box();
        let face = design.faces_of("Box1")[1];
        let descriptor = EntityDescriptor::Located("Box1".to_string(), [1.0, 1.0, 2.0]);

        design.move_face(face, [1.0, 1.0, 2.0 + 1e-4]);
        let codec = FingerprintCodec::new(&design, 1e-3);
        assert_eq!(codec.resolve_face(&descriptor), Some(face));

        design.move_face(face, [1.0, 1.0, 2.1]);
        let codec = FingerprintCodec::new(&design, 1e-3);
        assert_eq!(codec.resolve_face(&descriptor), None);
    }

    #[test]
    fn test_tolerance_is_strict() {
        let (mut design, _) = design_with_box();
        let face = design.faces_of("Box1")[1];
        design.move_face(face, [1.0, 1.0, 2.5]);

        let descriptor = EntityDescriptor::Located("Box1".to_string(), [1.0, 1.0, 2.0]);
        assert_eq!(FingerprintCodec::new(&design, 0.5).resolve_face(&descriptor), None);
    }

    #[test]
    fn test_equidistant_candidates_pick_first() {
        let mut design = InMemoryDesign::new("HFSSDesign1");
        design.add_object("Sheet", &[], &[[0.0, 0.0, 1.0], [0.0, 0.0, -1.0]]);
        let edges = design.edges_of("Sheet");

        let codec = FingerprintCodec::new(&design, 2.0);
        let descriptor = EntityDescriptor::Located("Sheet".to_string(), [0.0, 0.0, 0.0]);
        assert_eq!(codec.resolve_edge(&descriptor), Some(edges[0]));
    }

    #[test]
    fn test_rewrite_drops_unresolved() {
        let (design, id) = design_with_box();
        let face = design.faces_of("Box1")[0];
        let edge = design.edges_of("Box1")[5];
        let codec = FingerprintCodec::new(&design, 1e-9);

        let mut mapping = ObjectMapping::new();
        mapping.insert(id.to_string(), EntityDescriptor::Object("Box1".to_string()));
        mapping.insert(
            face.to_string(),
            EntityDescriptor::Located("Box1".to_string(), design.face_center(face).unwrap()),
        );
        mapping.insert(
            edge.to_string(),
            EntityDescriptor::Located("Box1".to_string(), design.edge_midpoint(edge).unwrap()),
        );
        mapping.insert(
            "77".to_string(),
            EntityDescriptor::Located("Gone".to_string(), [0.0; 3]),
        );

        let mut props = json!({
            "Objects": [id.0, "Air", 31337],
            "Faces": [face.0, 77],
            "Edges": [edge.0],
            "BoundType": "Radiation"
        })
        .as_object()
        .cloned()
        .unwrap();

        let summary = codec.rewrite_references(&mut props, &mapping);

        assert_eq!(summary, RewriteSummary { resolved: 4, dropped: 2 });
        assert_eq!(props["Objects"], json!([id.0, "Air"]));
        assert_eq!(props["Faces"], json!([face.0]));
        assert_eq!(props["Edges"], json!([edge.0]));
        assert_eq!(props["BoundType"], json!("Radiation"));
    }

    #[test]
    fn test_object_resolves_to_live_id() {
        let (mut design, id) = design_with_box();
        let mut mapping = ObjectMapping::new();
        FingerprintCodec::new(&design, 1e-9)
            .record_references(json!({"Objects": [id.0]}).as_object().unwrap(), &mut mapping);

        design.renumber(40);
        let codec = FingerprintCodec::new(&design, 1e-9);
        let mut props = json!({"Objects": [id.0]}).as_object().cloned().unwrap();
        codec.rewrite_references(&mut props, &mapping);

        assert_eq!(props["Objects"], json!([id.0 + 40]));
        assert_eq!(
            codec.resolve_object(&EntityDescriptor::Object("Missing".to_string())),
            None
        );
    }

    #[test]
    fn test_nan_positions_never_match() {
        let mut design = InMemoryDesign::new("HFSSDesign1");
        design.add_object(
            "Sheet",
            &[[f64::NAN, 0.0, 0.0], [0.0, 0.0, 0.0]],
            &[[f64::NAN, 0.0, 0.0], [0.0, 0.0, 0.0]],
        );
        let faces = design.faces_of("Sheet");
        let edges = design.edges_of("Sheet");
        let codec = FingerprintCodec::new(&design, 1e-9);

        let exact = EntityDescriptor::Located("Sheet".to_string(), [0.0; 3]);
        assert_eq!(codec.resolve_edge(&exact), Some(edges[1]));
        assert_eq!(codec.nearest(faces.clone(), [0.0; 3], |id| design.face_center(id)), Some(faces[1]));

        let unknown = EntityDescriptor::Located("Sheet".to_string(), [f64::NAN, 0.0, 0.0]);
        assert_eq!(codec.resolve_edge(&unknown), None);
        assert_eq!(codec.resolve_face(&unknown), None);
    }

    #[test]
    fn test_distance() {
        assert_eq!(distance([0.0, 0.0, 0.0], [3.0, 4.0, 0.0]), 5.0);
    }
}
