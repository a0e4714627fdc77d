//! Structural edits of the step under the cursor.
//!
//! Every edit follows the same protocol: capture the cursor context, mutate the document,
//! rebuild the handler tree and land the cursor through [`crate::delta::cursor_delta`]. An edit
//! that cannot apply leaves the document untouched and reports a [`SkipReason`].

use crate::delta::Landing;
use crate::editor::StepEditor;
use crate::ids::next_part_id;
use crate::model::{ColorId, Part, Placement, Step};
use thiserror::Error;

/// Why an edit left the document untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    /// The cursor is not on a step (for example an empty document).
    #[error("not at a valid step")]
    InvalidCursorState,

    /// The edit does not apply to the current step.
    #[error("{0}")]
    StructuralInconsistency(&'static str),
}

/// Result of an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// The edit was applied; `cursor` is the new global index.
    Applied {
        /// Global index after the edit.
        cursor: usize,
    },
    /// The edit created a new part.
    Created {
        /// ID of the created part.
        part_id: String,
        /// Global index after the edit.
        cursor: usize,
    },
    /// Nothing changed.
    Skipped(SkipReason),
}

impl EditOutcome {
    /// Whether the document or selection changed.
    pub fn is_applied(&self) -> bool {
        !matches!(self, EditOutcome::Skipped(_))
    }

    /// Cursor after the edit, if it was applied.
    pub fn cursor(&self) -> Option<usize> {
        match self {
            EditOutcome::Applied { cursor } | EditOutcome::Created { cursor, .. } => Some(*cursor),
            EditOutcome::Skipped(_) => None,
        }
    }
}

pub(crate) fn skip(operation: &str, reason: SkipReason) -> EditOutcome {
    log::warn!("{operation} skipped: {reason}");
    EditOutcome::Skipped(reason)
}

enum Removal {
    EmptyStep,
    Highlighted,
    MergeLeft,
}

impl StepEditor {
    /// Recolour the highlighted placements of the current step.
    pub fn recolor(&mut self, color: ColorId) -> EditOutcome {
        let Some(ctx) = self.cursor_context() else {
            return skip("recolor", SkipReason::InvalidCursorState);
        };
        let Some(part) = self.edit_target(&ctx) else {
            return skip("recolor", SkipReason::InvalidCursorState);
        };

        let mut recolored = 0;
        for placement in part.steps[ctx.step_index]
            .placements
            .iter_mut()
            .filter(|p| p.ghost)
        {
            placement.color = color;
            recolored += 1;
        }
        if recolored == 0 {
            return skip(
                "recolor",
                SkipReason::StructuralInconsistency("no highlighted placements"),
            );
        }

        log::info!("Recolored {recolored} placements to {color}");
        let cursor = self.finish_edit(&ctx, Landing::Step(ctx.step_index));
        EditOutcome::Applied { cursor }
    }

    /// Insert an empty step after the current one, inheriting its rotation.
    pub fn insert_step_after(&mut self) -> EditOutcome {
        let Some(ctx) = self.cursor_context() else {
            return skip("insert", SkipReason::InvalidCursorState);
        };
        let Some(part) = self.edit_target(&ctx) else {
            return skip("insert", SkipReason::InvalidCursorState);
        };

        let c = ctx.step_index;
        let rotation = part.steps[c].rotation;
        part.steps.insert(c + 1, Step::empty_with_rotation(rotation));

        let cursor = self.finish_edit(&ctx, Landing::Step(c + 1));
        EditOutcome::Applied { cursor }
    }

    /// Remove the current step or its highlighted placements.
    ///
    /// - An empty step is deleted. A part left without steps is purged from the document.
    /// - Otherwise highlighted placements are deleted, and the step too if nothing remains.
    /// - Otherwise the step is merged into the previous one.
    pub fn remove_current(&mut self) -> EditOutcome {
        let Some(ctx) = self.cursor_context() else {
            return skip("remove", SkipReason::InvalidCursorState);
        };
        let is_main = ctx.part_id == self.document().main_model_id();
        let Some(part) = self.edit_target(&ctx) else {
            return skip("remove", SkipReason::InvalidCursorState);
        };

        let c = ctx.step_index;
        let removal = {
            let step = &part.steps[c];
            if step.is_empty() {
                if is_main && part.steps.len() == 1 {
                    return skip(
                        "remove",
                        SkipReason::StructuralInconsistency("the main model must keep one step"),
                    );
                }
                Removal::EmptyStep
            } else if step.has_ghosted() {
                Removal::Highlighted
            } else if c > 0 {
                Removal::MergeLeft
            } else {
                return skip(
                    "remove",
                    SkipReason::StructuralInconsistency(
                        "nothing highlighted and no previous step to merge into",
                    ),
                );
            }
        };

        let landing = match removal {
            Removal::EmptyStep => {
                self.eliminate_step(&ctx.part_id, c);
                Landing::StepStart(c)
            }
            Removal::Highlighted => {
                let step = &mut part.steps[c];
                step.placements.retain(|p| !p.ghost);
                if step.is_empty() && self.eliminate_step(&ctx.part_id, c) {
                    Landing::StepStart(c)
                } else {
                    Landing::Step(c)
                }
            }
            Removal::MergeLeft => {
                let merged = part.steps.remove(c);
                part.steps[c - 1].placements.extend(merged.placements);
                Landing::Step(c - 1)
            }
        };

        let cursor = self.finish_edit(&ctx, landing);
        EditOutcome::Applied { cursor }
    }

    /// Move the current step, or its highlighted placements, forward.
    ///
    /// Without highlights the whole step swaps places with the next one. Highlighted placements
    /// skip over following steps that place assemblies and join the first step that does not.
    /// A step is appended when the move runs past the end.
    pub fn move_to_next(&mut self) -> EditOutcome {
        let Some(ctx) = self.cursor_context() else {
            return skip("move next", SkipReason::InvalidCursorState);
        };
        let assemblies = self.assembly_flags(&ctx.part_id);
        let Some(part) = self.edit_target(&ctx) else {
            return skip("move next", SkipReason::InvalidCursorState);
        };

        let c = ctx.step_index;
        let landing = if !part.steps[c].has_ghosted() {
            if c + 1 == part.steps.len() {
                let rotation = part.steps[c].rotation;
                part.steps.push(Step::empty_with_rotation(rotation));
            }
            part.steps.swap(c, c + 1);
            Landing::Step(c + 1)
        } else {
            let mut target = c + 1;
            while assemblies.get(target).copied().unwrap_or(false) {
                target += 1;
            }
            if target == part.steps.len() {
                let rotation = part.steps[target - 1].rotation;
                part.steps.push(Step::empty_with_rotation(rotation));
            }
            let moved = part.steps[c].take_ghosted();
            part.steps[target].placements.extend(moved);

            if part.steps[c].is_empty() && self.eliminate_step(&ctx.part_id, c) {
                Landing::Step(target - 1)
            } else {
                Landing::Step(target)
            }
        };

        let cursor = self.finish_edit(&ctx, landing);
        EditOutcome::Applied { cursor }
    }

    /// Move the current step, or its highlighted placements, backward.
    ///
    /// Mirror of [`StepEditor::move_to_next`]; a step is prepended when the move runs past the
    /// first step.
    pub fn move_to_previous(&mut self) -> EditOutcome {
        let Some(ctx) = self.cursor_context() else {
            return skip("move previous", SkipReason::InvalidCursorState);
        };
        let assemblies = self.assembly_flags(&ctx.part_id);
        let Some(part) = self.edit_target(&ctx) else {
            return skip("move previous", SkipReason::InvalidCursorState);
        };

        let c = ctx.step_index;
        let landing = if !part.steps[c].has_ghosted() {
            let mut current = c;
            if current == 0 {
                let rotation = part.steps[0].rotation;
                part.steps.insert(0, Step::empty_with_rotation(rotation));
                current = 1;
            }
            part.steps.swap(current - 1, current);
            Landing::Step(current - 1)
        } else {
            let mut candidate = c;
            while candidate > 0 && assemblies.get(candidate - 1).copied().unwrap_or(false) {
                candidate -= 1;
            }
            let (target, source) = if candidate == 0 {
                let rotation = part.steps[0].rotation;
                part.steps.insert(0, Step::empty_with_rotation(rotation));
                (0, c + 1)
            } else {
                (candidate - 1, c)
            };
            let moved = part.steps[source].take_ghosted();
            part.steps[target].placements.extend(moved);

            if part.steps[source].is_empty() {
                self.eliminate_step(&ctx.part_id, source);
            }
            Landing::Step(target)
        };

        let cursor = self.finish_edit(&ctx, landing);
        EditOutcome::Applied { cursor }
    }

    /// Move the highlighted placements (or the whole step) into a newly created part.
    ///
    /// The new part is placed once, at identity orientation, where the extracted content was:
    /// in a new step after the current one for a partial extraction, in place of the current
    /// step otherwise. The cursor lands on the new part's last step.
    pub fn extract_to_new_part(&mut self) -> EditOutcome {
        let Some(ctx) = self.cursor_context() else {
            return skip("extract", SkipReason::InvalidCursorState);
        };
        let Some((highlighted, placements, step_count)) =
            self.document().part(&ctx.part_id).and_then(|part| {
                let step = part.steps.get(ctx.step_index)?;
                Some((step.ghosted_count(), step.placements.len(), part.steps.len()))
            })
        else {
            return skip("extract", SkipReason::InvalidCursorState);
        };

        if placements == 0 {
            return skip(
                "extract",
                SkipReason::StructuralInconsistency("cannot extract an empty step"),
            );
        }
        if highlighted == 0 && step_count == 1 {
            return skip(
                "extract",
                SkipReason::StructuralInconsistency("cannot extract the only step of a part"),
            );
        }

        let partial = highlighted > 0 && highlighted < placements;
        let new_id = next_part_id(self.document(), &self.config().part_id_extension);
        let metadata = self.config().new_part_metadata(&new_id);
        let drop_color = self.config().drop_color;

        if let Err(err) = self
            .document_mut()
            .insert_part(Part::assembly(new_id.clone(), Vec::new()).with_metadata(metadata))
        {
            log::error!("Failed to register extracted part: {err}");
            return skip(
                "extract",
                SkipReason::StructuralInconsistency("generated part ID is already taken"),
            );
        }

        let Some(part) = self.edit_target(&ctx) else {
            self.document_mut().remove_part(&new_id);
            return skip("extract", SkipReason::InvalidCursorState);
        };
        let c = ctx.step_index;
        let drop_step = Step {
            placements: vec![Placement::new(new_id.clone()).with_color(drop_color)],
            rotation: part.steps[c].rotation,
        };
        let (mut extracted, landing) = if partial {
            let moved = part.steps[c].take_ghosted();
            part.steps.insert(c + 1, drop_step);
            (Step::new(moved), Landing::LastNested(c + 1))
        } else {
            (std::mem::replace(&mut part.steps[c], drop_step), Landing::LastNested(c))
        };

        for placement in &mut extracted.placements {
            placement.ghost = false;
        }
        if let Some(created) = self.document_mut().part_mut(&new_id) {
            created.steps.push(extracted);
        }
        log::info!(
            "Extracted {} step {} of '{}' into '{}'",
            if partial { "part of" } else { "all of" },
            c,
            ctx.part_id,
            new_id
        );

        let cursor = self.finish_edit(&ctx, landing);
        EditOutcome::Created {
            part_id: new_id,
            cursor,
        }
    }

    fn assembly_flags(&self, part_id: &str) -> Vec<bool> {
        let document = self.document();
        document
            .part(part_id)
            .map(|part| {
                part.steps
                    .iter()
                    .map(|step| step.contains_assemblies(document))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Document, EditorConfig};

    fn brick() -> Placement {
        Placement::new("3001.dat")
    }

    fn editor(main: Part, extra: Vec<Part>) -> StepEditor {
        let mut parts = vec![Part::leaf("3001.dat")];
        parts.extend(extra);
        let document = Document::with_parts(main, parts).unwrap();
        StepEditor::new(document, EditorConfig::default()).unwrap()
    }

    #[test]
    fn test_recolor_requires_highlight() {
        let main = Part::assembly("main.ldr", vec![Step::new(vec![brick()])]);
        let mut editor = editor(main, vec![]);

        assert_eq!(
            editor.recolor(4),
            EditOutcome::Skipped(SkipReason::StructuralInconsistency(
                "no highlighted placements"
            ))
        );
    }

    #[test]
    fn test_recolor_only_touches_highlighted() {
        let main = Part::assembly("main.ldr", vec![Step::new(vec![brick().ghosted(), brick()])]);
        let mut editor = editor(main, vec![]);

        assert_eq!(editor.recolor(4), EditOutcome::Applied { cursor: 0 });
        let step = &editor.document().main_model().unwrap().steps[0];
        assert_eq!(step.placements[0].color, 4);
        assert_eq!(step.placements[1].color, 16);
    }

    #[test]
    fn test_main_model_keeps_its_last_step() {
        let main = Part::assembly("main.ldr", vec![Step::default()]);
        let mut editor = editor(main, vec![]);

        assert!(!editor.remove_current().is_applied());
        assert_eq!(editor.total_steps(), 1);
    }

    #[test]
    fn test_remove_highlighted_on_first_step_keeps_rest() {
        let main = Part::assembly(
            "main.ldr",
            vec![Step::new(vec![brick().ghosted(), brick()]), Step::new(vec![brick()])],
        );
        let mut editor = editor(main, vec![]);

        assert_eq!(editor.remove_current(), EditOutcome::Applied { cursor: 0 });
        let main = editor.document().main_model().unwrap();
        assert_eq!(main.steps.len(), 2);
        assert_eq!(main.steps[0].placements.len(), 1);
    }

    #[test]
    fn test_merge_left_keeps_order() {
        let main = Part::assembly(
            "main.ldr",
            vec![
                Step::new(vec![brick().with_color(1)]),
                Step::new(vec![brick().with_color(2)]),
            ],
        );
        let mut editor = editor(main, vec![]);
        editor.move_to(1);

        assert_eq!(editor.remove_current(), EditOutcome::Applied { cursor: 0 });
        let colors: Vec<_> = editor.document().main_model().unwrap().steps[0]
            .placements
            .iter()
            .map(|p| p.color)
            .collect();
        assert_eq!(colors, vec![1, 2]);
    }

    #[test]
    fn test_extract_skips_single_unhighlighted_step() {
        let main = Part::assembly("main.ldr", vec![Step::new(vec![brick()])]);
        let mut editor = editor(main, vec![]);

        assert!(matches!(
            editor.extract_to_new_part(),
            EditOutcome::Skipped(SkipReason::StructuralInconsistency(_))
        ));
        assert_eq!(editor.document().part_count(), 2);
    }
}
