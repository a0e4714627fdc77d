//! Step rotation editing.
//!
//! A rotation change on the current step propagates forward: following steps that carried the
//! same rotation as the current step before the change receive the new one, up to the first
//! step whose rotation differs.

use crate::commands::CommandError;
use crate::delta::Landing;
use crate::edit::{EditOutcome, SkipReason, skip};
use crate::editor::StepEditor;
use crate::model::{RotationKind, StepRotation};
use serde::{Deserialize, Serialize};

/// Rotation axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    /// X axis.
    X,
    /// Y axis.
    Y,
    /// Z axis.
    Z,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
            Axis::Z => write!(f, "z"),
        }
    }
}

impl StepEditor {
    /// Replace the rotation of the current step and propagate it to the following steps that
    /// shared the old rotation.
    pub fn set_rotation(&mut self, rotation: Option<StepRotation>) -> EditOutcome {
        let Some(ctx) = self.cursor_context() else {
            return skip("rotate", SkipReason::InvalidCursorState);
        };
        let Some(part) = self.edit_target(&ctx) else {
            return skip("rotate", SkipReason::InvalidCursorState);
        };

        let c = ctx.step_index;
        let previous = part.steps[c].rotation;
        let mut propagated = 0;
        for step in &mut part.steps[c + 1..] {
            if step.rotation != previous {
                break;
            }
            step.rotation = rotation;
            propagated += 1;
        }
        part.steps[c].rotation = rotation;

        log::debug!(
            "Rotation of step {} in '{}' set to {:?}, propagated to {} steps",
            c,
            ctx.part_id,
            rotation,
            propagated
        );
        let cursor = self.finish_edit(&ctx, Landing::Step(c));
        EditOutcome::Applied { cursor }
    }

    /// Take over the rotation of the previous step (none for the first step).
    pub fn inherit_rotation(&mut self) -> EditOutcome {
        let inherited = self.current_step().map(|current| {
            current
                .index
                .checked_sub(1)
                .and_then(|i| current.part.steps[i].rotation)
        });
        match inherited {
            Some(rotation) => self.set_rotation(rotation),
            None => skip("rotate", SkipReason::InvalidCursorState),
        }
    }

    /// Switch the current rotation to `kind`, starting from a zero rotation if there is none.
    pub fn set_rotation_kind(&mut self, kind: RotationKind) -> EditOutcome {
        let Some(mut rotation) = self.rotation_or_zero() else {
            return skip("rotate", SkipReason::InvalidCursorState);
        };
        rotation.kind = kind;
        self.set_rotation(Some(rotation))
    }

    /// Remove the rotation of the current step.
    pub fn end_rotation(&mut self) -> EditOutcome {
        self.set_rotation(None)
    }

    /// Set the rotation angles of the current step, in degrees.
    pub fn set_rotation_angles(
        &mut self,
        x: f64,
        y: f64,
        z: f64,
    ) -> Result<EditOutcome, CommandError> {
        for (axis, value) in [(Axis::X, x), (Axis::Y, y), (Axis::Z, z)] {
            if !value.is_finite() {
                return Err(CommandError::InvalidAngle { axis, value });
            }
        }
        let Some(mut rotation) = self.rotation_or_zero() else {
            return Ok(skip("rotate", SkipReason::InvalidCursorState));
        };
        rotation.x = x;
        rotation.y = y;
        rotation.z = z;
        Ok(self.set_rotation(Some(rotation)))
    }

    /// Turn the current rotation around `axis` by `steps` times the configured rotation step.
    pub fn nudge_rotation(&mut self, axis: Axis, steps: i32) -> EditOutcome {
        let Some(mut rotation) = self.rotation_or_zero() else {
            return skip("rotate", SkipReason::InvalidCursorState);
        };
        let amount = f64::from(steps) * self.config().rotation_step_degrees;
        match axis {
            Axis::X => rotation.x += amount,
            Axis::Y => rotation.y += amount,
            Axis::Z => rotation.z += amount,
        }
        self.set_rotation(Some(rotation))
    }

    fn rotation_or_zero(&self) -> Option<StepRotation> {
        self.current_step().map(|current| {
            current
                .step
                .rotation
                .unwrap_or_else(|| StepRotation::zero(RotationKind::Relative))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Document, EditorConfig, Part, Placement, Step};

    fn rotated(x: f64) -> Option<StepRotation> {
        Some(StepRotation::new(x, 0.0, 0.0, RotationKind::Relative))
    }

    fn editor_with(rotations: &[Option<StepRotation>]) -> StepEditor {
        let steps = rotations
            .iter()
            .map(|rotation| Step {
                placements: vec![Placement::new("3001.dat")],
                rotation: *rotation,
            })
            .collect();
        let main = Part::assembly("main.ldr", steps);
        let document = Document::with_parts(main, [Part::leaf("3001.dat")]).unwrap();
        StepEditor::new(document, EditorConfig::default()).unwrap()
    }

    fn rotations(editor: &StepEditor) -> Vec<Option<StepRotation>> {
        editor
            .document()
            .main_model()
            .unwrap()
            .steps
            .iter()
            .map(|s| s.rotation)
            .collect()
    }

    #[test]
    fn test_propagation_stops_at_first_difference() {
        let mut editor = editor_with(&[None, None, rotated(45.0), None]);

        editor.nudge_rotation(Axis::X, 1);

        assert_eq!(
            rotations(&editor),
            vec![rotated(90.0), rotated(90.0), rotated(45.0), None]
        );
    }

    #[test]
    fn test_inherit_on_first_step_clears_rotation() {
        let mut editor = editor_with(&[rotated(30.0), rotated(30.0)]);

        assert!(editor.inherit_rotation().is_applied());
        assert_eq!(rotations(&editor), vec![None, None]);
    }

    #[test]
    fn test_non_finite_angle_is_rejected() {
        let mut editor = editor_with(&[None]);

        assert_eq!(
            editor.set_rotation_angles(f64::NAN, 0.0, 0.0).unwrap_err().to_string(),
            "rotation angle for x must be finite, got NaN"
        );
        assert_eq!(rotations(&editor), vec![None]);
    }

    #[test]
    fn test_set_kind_starts_from_zero() {
        let mut editor = editor_with(&[None]);

        editor.set_rotation_kind(RotationKind::Absolute);

        assert_eq!(
            rotations(&editor),
            vec![Some(StepRotation::zero(RotationKind::Absolute))]
        );
    }
}
