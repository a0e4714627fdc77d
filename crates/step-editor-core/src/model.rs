//! Document model: parts, steps and placements.
//!
//! A [`Document`] owns every [`Part`] keyed by its ID and designates one of them as the main
//! model. Parts are either *leaf* parts (irreducible units without steps) or assemblies whose
//! ordered [`Step`]s place other parts through [`Placement`]s.
//!
//! The placement list of a step is the single source of truth; line-oriented serializations are
//! derived from it on demand (see [`crate::persistence::DocumentSerializer`]).

use crate::error::DocumentError;
use glam::{DMat3, DVec3};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Colour identifier as used by the palette collaborator.
pub type ColorId = u32;

/// The colour that makes a placement inherit the colour of the step that places it.
pub const INHERITED_COLOR: ColorId = 16;

/// Orientation convention for a step rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationKind {
    /// Rotation relative to the default view.
    Relative,
    /// Absolute rotation.
    Absolute,
}

/// Orientation descriptor attached to a step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepRotation {
    /// Rotation around the X axis in degrees.
    pub x: f64,
    /// Rotation around the Y axis in degrees.
    pub y: f64,
    /// Rotation around the Z axis in degrees.
    pub z: f64,
    /// How the angles are interpreted.
    pub kind: RotationKind,
}

impl StepRotation {
    /// Create a new rotation descriptor.
    pub fn new(x: f64, y: f64, z: f64, kind: RotationKind) -> Self {
        Self { x, y, z, kind }
    }

    /// A zero rotation of the given kind.
    pub fn zero(kind: RotationKind) -> Self {
        Self::new(0.0, 0.0, 0.0, kind)
    }
}

/// A reference from a step to a part, with instance data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// ID of the placed part.
    pub part_id: String,
    /// Orientation of the placed part.
    pub rotation: DMat3,
    /// Position of the placed part.
    pub position: DVec3,
    /// Colour of the placed part.
    pub color: ColorId,
    /// Transient selection flag marking the placement for the pending edit.
    ///
    /// Never serialized.
    #[serde(skip)]
    pub ghost: bool,
    /// Whether the winding of the placed part is inverted.
    #[serde(default)]
    pub invert_normals: bool,
}

impl Placement {
    /// Place `part_id` at the origin with identity orientation and the inherited colour.
    pub fn new(part_id: impl Into<String>) -> Self {
        Self {
            part_id: part_id.into(),
            rotation: DMat3::IDENTITY,
            position: DVec3::ZERO,
            color: INHERITED_COLOR,
            ghost: false,
            invert_normals: false,
        }
    }

    /// Set the colour.
    pub fn with_color(mut self, color: ColorId) -> Self {
        self.color = color;
        self
    }

    /// Set the position.
    pub fn with_position(mut self, position: DVec3) -> Self {
        self.position = position;
        self
    }

    /// Set the orientation.
    pub fn with_rotation(mut self, rotation: DMat3) -> Self {
        self.rotation = rotation;
        self
    }

    /// Mark the placement as selected (ghosted).
    pub fn ghosted(mut self) -> Self {
        self.ghost = true;
        self
    }

    /// Mark the placement as having inverted normals.
    pub fn inverted(mut self) -> Self {
        self.invert_normals = true;
        self
    }
}

/// An ordered stage of a part's assembly sequence.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Step {
    /// Placements added in this step.
    pub placements: Vec<Placement>,
    /// Orientation at this step, if any.
    #[serde(default)]
    pub rotation: Option<StepRotation>,
}

impl Step {
    /// Create a step with the given placements and no rotation.
    pub fn new(placements: Vec<Placement>) -> Self {
        Self {
            placements,
            rotation: None,
        }
    }

    /// Create an empty step carrying `rotation`.
    pub fn empty_with_rotation(rotation: Option<StepRotation>) -> Self {
        Self {
            placements: Vec::new(),
            rotation,
        }
    }

    /// Set the rotation.
    pub fn with_rotation(mut self, rotation: StepRotation) -> Self {
        self.rotation = Some(rotation);
        self
    }

    /// A step without placements.
    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Whether any placement is ghosted.
    pub fn has_ghosted(&self) -> bool {
        self.placements.iter().any(|p| p.ghost)
    }

    /// Number of ghosted placements.
    pub fn ghosted_count(&self) -> usize {
        self.placements.iter().filter(|p| p.ghost).count()
    }

    /// Whether the step places at least one non-leaf part.
    pub fn contains_assemblies(&self, document: &Document) -> bool {
        self.placements
            .iter()
            .any(|p| document.is_assembly(&p.part_id))
    }

    /// Remove and return the ghosted placements, keeping the others in order.
    pub fn take_ghosted(&mut self) -> Vec<Placement> {
        let (ghosted, plain): (Vec<_>, Vec<_>) = std::mem::take(&mut self.placements)
            .into_iter()
            .partition(|p| p.ghost);
        self.placements = plain;
        ghosted
    }
}

/// Authoring metadata of a part. Opaque to the editing engine.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PartMetadata {
    /// File name of the part.
    pub name: String,
    /// Human readable description.
    pub description: String,
    /// Author line.
    pub author: String,
    /// License line.
    pub license: String,
    /// Whether back-face culling is certified.
    pub certified_bfc: bool,
    /// Counter-clockwise winding when certified.
    pub ccw: bool,
}

/// A named, independently addressable unit of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    /// Unique ID within the owning [`Document`].
    pub id: String,
    /// Ordered assembly steps. Always empty for leaf parts.
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Irreducible unit that cannot place other parts.
    #[serde(default)]
    pub is_leaf: bool,
    /// Authoring metadata.
    #[serde(default)]
    pub metadata: PartMetadata,
}

impl Part {
    /// Create a leaf part.
    pub fn leaf(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            metadata: PartMetadata {
                name: id.clone(),
                ..PartMetadata::default()
            },
            id,
            steps: Vec::new(),
            is_leaf: true,
        }
    }

    /// Create an assembly with the given steps.
    pub fn assembly(id: impl Into<String>, steps: Vec<Step>) -> Self {
        let id = id.into();
        Self {
            metadata: PartMetadata {
                name: id.clone(),
                ..PartMetadata::default()
            },
            id,
            steps,
            is_leaf: false,
        }
    }

    /// Replace the metadata.
    pub fn with_metadata(mut self, metadata: PartMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Whether any step places `part_id`.
    pub fn places(&self, part_id: &str) -> bool {
        self.steps
            .iter()
            .flat_map(|s| s.placements.iter())
            .any(|p| p.part_id == part_id)
    }
}

/// Registry of all parts of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    main_model: String,
    parts: BTreeMap<String, Part>,
}

impl Document {
    /// Create a document whose main model is `main`.
    pub fn new(main: Part) -> Self {
        let main_model = main.id.clone();
        let mut parts = BTreeMap::new();
        parts.insert(main_model.clone(), main);
        Self { main_model, parts }
    }

    /// Create a document from a main model and additional parts.
    pub fn with_parts<I>(main: Part, parts: I) -> Result<Self, DocumentError>
    where
        I: IntoIterator<Item = Part>,
    {
        let mut document = Self::new(main);
        for part in parts {
            document.insert_part(part)?;
        }
        Ok(document)
    }

    /// Parse a JSON snapshot and validate it.
    pub fn from_json(text: &str) -> Result<Self, DocumentError> {
        let document: Self = serde_json::from_str(text)?;
        document.validate()?;
        Ok(document)
    }

    /// ID of the main model.
    pub fn main_model_id(&self) -> &str {
        &self.main_model
    }

    /// The main model, if registered.
    pub fn main_model(&self) -> Option<&Part> {
        self.parts.get(&self.main_model)
    }

    /// Look up a part.
    pub fn part(&self, id: &str) -> Option<&Part> {
        self.parts.get(id)
    }

    /// Look up a part for modification.
    pub fn part_mut(&mut self, id: &str) -> Option<&mut Part> {
        self.parts.get_mut(id)
    }

    /// Whether `id` is registered.
    pub fn contains_part(&self, id: &str) -> bool {
        self.parts.contains_key(id)
    }

    /// Whether `id` is a registered non-leaf part.
    pub fn is_assembly(&self, id: &str) -> bool {
        self.parts.get(id).is_some_and(|p| !p.is_leaf)
    }

    /// Iterate over all parts in ID order.
    pub fn parts(&self) -> impl Iterator<Item = &Part> {
        self.parts.values()
    }

    /// Iterate over all part IDs in order.
    pub fn part_ids(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(String::as_str)
    }

    /// Number of registered parts.
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Register a new part.
    pub fn insert_part(&mut self, part: Part) -> Result<(), DocumentError> {
        if self.parts.contains_key(&part.id) {
            return Err(DocumentError::DuplicatePart { id: part.id });
        }
        self.parts.insert(part.id.clone(), part);
        Ok(())
    }

    /// Remove a part definition. The main model cannot be removed.
    pub fn remove_part(&mut self, id: &str) -> Option<Part> {
        if id == self.main_model {
            return None;
        }
        self.parts.remove(id)
    }

    /// Whether any part places `id`.
    pub fn is_referenced(&self, id: &str) -> bool {
        self.parts.values().any(|p| p.places(id))
    }

    /// Serialize to a JSON snapshot. Ghost flags are not included.
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the structural invariants of the document.
    ///
    /// - the main model is registered and is not a leaf
    /// - every placement targets a registered part
    /// - leaf parts have no steps
    /// - no part places itself, directly or transitively
    pub fn validate(&self) -> Result<(), DocumentError> {
        let main = self
            .main_model()
            .ok_or_else(|| DocumentError::MissingMainModel {
                id: self.main_model.clone(),
            })?;
        if main.is_leaf {
            return Err(DocumentError::LeafMainModel {
                id: main.id.clone(),
            });
        }

        for part in self.parts.values() {
            if part.is_leaf && !part.steps.is_empty() {
                return Err(DocumentError::LeafWithSteps {
                    id: part.id.clone(),
                });
            }
            for placement in part.steps.iter().flat_map(|s| s.placements.iter()) {
                if !self.parts.contains_key(&placement.part_id) {
                    return Err(DocumentError::UnknownPart {
                        id: placement.part_id.clone(),
                        referenced_by: part.id.clone(),
                    });
                }
            }
        }

        let mut marks = HashMap::new();
        for id in self.parts.keys() {
            self.check_acyclic(id, &mut marks)?;
        }
        Ok(())
    }

    fn check_acyclic<'a>(
        &'a self,
        id: &'a str,
        marks: &mut HashMap<&'a str, Visit>,
    ) -> Result<(), DocumentError> {
        match marks.get(id) {
            Some(Visit::Done) => return Ok(()),
            Some(Visit::InProgress) => {
                return Err(DocumentError::PlacementCycle { id: id.to_string() });
            }
            None => {}
        }
        marks.insert(id, Visit::InProgress);
        if let Some(part) = self.parts.get(id) {
            for placement in part.steps.iter().flat_map(|s| s.placements.iter()) {
                self.check_acyclic(&placement.part_id, marks)?;
            }
        }
        marks.insert(id, Visit::Done);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brick() -> Part {
        Part::leaf("3001.dat")
    }

    #[test]
    fn test_take_ghosted_keeps_order() {
        let mut step = Step::new(vec![
            Placement::new("a.dat"),
            Placement::new("b.dat").ghosted(),
            Placement::new("c.dat"),
            Placement::new("d.dat").ghosted(),
        ]);

        let ghosted = step.take_ghosted();

        let taken: Vec<_> = ghosted.iter().map(|p| p.part_id.as_str()).collect();
        let kept: Vec<_> = step.placements.iter().map(|p| p.part_id.as_str()).collect();
        assert_eq!(taken, ["b.dat", "d.dat"]);
        assert_eq!(kept, ["a.dat", "c.dat"]);
    }

    #[test]
    fn test_validate_rejects_cycles() {
        let main = Part::assembly("main.ldr", vec![Step::new(vec![Placement::new("a.ldr")])]);
        let a = Part::assembly("a.ldr", vec![Step::new(vec![Placement::new("b.ldr")])]);
        let b = Part::assembly("b.ldr", vec![Step::new(vec![Placement::new("a.ldr")])]);
        let document = Document::with_parts(main, [a, b]).unwrap();

        assert!(matches!(
            document.validate(),
            Err(DocumentError::PlacementCycle { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_unknown_parts() {
        let main = Part::assembly("main.ldr", vec![Step::new(vec![Placement::new("x.dat")])]);
        let document = Document::new(main);

        assert!(matches!(
            document.validate(),
            Err(DocumentError::UnknownPart { .. })
        ));
    }

    #[test]
    fn test_shared_subassembly_is_not_a_cycle() {
        let main = Part::assembly(
            "main.ldr",
            vec![Step::new(vec![Placement::new("a.ldr"), Placement::new("b.ldr")])],
        );
        let a = Part::assembly("a.ldr", vec![Step::new(vec![Placement::new("b.ldr")])]);
        let b = Part::assembly("b.ldr", vec![Step::new(vec![Placement::new("3001.dat")])]);
        let document = Document::with_parts(main, [a, b, brick()]).unwrap();

        assert!(document.validate().is_ok());
    }

    #[test]
    fn test_duplicate_part_is_rejected() {
        let mut document = Document::new(Part::assembly("main.ldr", vec![]));
        document.insert_part(brick()).unwrap();

        assert!(matches!(
            document.insert_part(brick()),
            Err(DocumentError::DuplicatePart { .. })
        ));
    }

    #[test]
    fn test_json_snapshot_drops_ghost_flags() {
        let main = Part::assembly(
            "main.ldr",
            vec![Step::new(vec![Placement::new("3001.dat").ghosted()])],
        );
        let document = Document::with_parts(main, [brick()]).unwrap();

        let json = document.to_json().unwrap();
        assert!(!json.contains("ghost"));

        let restored = Document::from_json(&json).unwrap();
        let placement = &restored.main_model().unwrap().steps[0].placements[0];
        assert!(!placement.ghost);
        assert_eq!(placement.part_id, "3001.dat");
    }
}
