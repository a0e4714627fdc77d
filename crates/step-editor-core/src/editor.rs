//! The step editor: document, traversal handlers and configuration for one editing session.
//!
//! `StepEditor` owns the [`Document`] and the [`StepHandler`] tree built from it. Structural
//! edits live in [`crate::edit`], rotation edits in [`crate::rotation`]; this module holds the
//! shared cursor bookkeeping, navigation and selection.

use crate::commands::CommandError;
use crate::config::EditorConfig;
use crate::delta::{DeltaContext, Landing, apply_delta, cursor_delta};
use crate::edit::{EditOutcome, SkipReason, skip};
use crate::error::DocumentError;
use crate::indexer::{CursorFrame, Direction, StepCounter, StepHandler};
use crate::model::{Document, Part, Step};
use crate::purge::purge_part;

/// The step under the cursor.
#[derive(Debug, Clone, Copy)]
pub struct CurrentStep<'a> {
    /// Part owning the step.
    pub part: &'a Part,
    /// Index of the step within the part.
    pub index: usize,
    /// The step itself.
    pub step: &'a Step,
}

/// Cursor state captured before an edit.
#[derive(Debug, Clone)]
pub(crate) struct CursorContext {
    pub(crate) part_id: String,
    pub(crate) step_index: usize,
    pub(crate) global_index: usize,
    pub(crate) usages: usize,
    pub(crate) layout: Vec<usize>,
}

/// Which edits make sense at the current position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditAvailability {
    /// Highlighted placements can be recoloured.
    pub recolor: bool,
    /// A step can be inserted after the current one.
    pub insert_step: bool,
    /// Removal does something (delete, drop highlighted, or merge left).
    pub remove: bool,
    /// Moving forward is possible.
    pub move_next: bool,
    /// Moving backward is possible.
    pub move_previous: bool,
    /// Extraction into a new part does something.
    pub extract: bool,
}

/// Editing session over one document.
///
/// # Example
///
/// ```rust
/// use step_editor_core::{Document, EditorConfig, Part, Placement, Step, StepEditor};
///
/// let main = Part::assembly(
///     "main.ldr",
///     vec![
///         Step::new(vec![Placement::new("3001.dat")]),
///         Step::new(vec![Placement::new("3001.dat")]),
///     ],
/// );
/// let document = Document::with_parts(main, [Part::leaf("3001.dat")]).unwrap();
/// let mut editor = StepEditor::new(document, EditorConfig::default()).unwrap();
///
/// editor.insert_step_after();
/// assert_eq!(editor.global_index(), 1);
/// assert_eq!(editor.total_steps(), 3);
/// ```
pub struct StepEditor {
    document: Document,
    handler: StepHandler,
    config: EditorConfig,
}

impl StepEditor {
    /// Validate `document` and start a session on its first step.
    pub fn new(document: Document, config: EditorConfig) -> Result<Self, DocumentError> {
        document.validate()?;
        let handler = StepHandler::new(&document);
        Ok(Self {
            document,
            handler,
            config,
        })
    }

    /// The edited document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Consume the editor and return the document.
    pub fn into_document(self) -> Document {
        self.document
    }

    /// Active configuration.
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Root of the traversal handler tree.
    pub fn handler(&self) -> &StepHandler {
        &self.handler
    }

    /// Global index of the cursor.
    pub fn global_index(&self) -> usize {
        self.handler.global_index()
    }

    /// Number of flattened steps in the document.
    pub fn total_steps(&self) -> usize {
        self.handler.total_steps()
    }

    /// Frames from the main model down to the step under the cursor.
    pub fn cursor_path(&self) -> Vec<CursorFrame> {
        self.handler.cursor_path()
    }

    /// The step under the cursor, if any.
    pub fn current_step(&self) -> Option<CurrentStep<'_>> {
        let (part_id, index) = self.handler.current_step()?;
        let part = self.document.part(part_id)?;
        let step = part.steps.get(index)?;
        Some(CurrentStep { part, index, step })
    }

    /// Complete instances of `part_id` preceding the cursor.
    pub fn usage_count(&self, part_id: &str) -> usize {
        self.handler.usage_count(part_id)
    }

    /// Flattened size of the step adjacent to the cursor's step.
    pub fn steps_inside_adjacent_step(&self, direction: Direction) -> usize {
        self.handler.steps_inside_adjacent_step(direction)
    }

    /// Which edits make sense at the current position.
    pub fn available_edits(&self) -> EditAvailability {
        let Some(current) = self.current_step() else {
            return EditAvailability::default();
        };
        let highlighted = current.step.has_ghosted();
        let single = current.part.steps.len() == 1;
        let empty = current.step.is_empty();
        let is_main = current.part.id == self.document.main_model_id();

        EditAvailability {
            recolor: highlighted,
            insert_step: true,
            remove: (empty && !(is_main && single)) || highlighted || current.index > 0,
            move_next: !empty,
            move_previous: !empty,
            extract: !empty && (highlighted || !single),
        }
    }

    // Navigation

    /// Move the cursor to a global index (clamped) and return the new index.
    pub fn move_to(&mut self, index: usize) -> usize {
        self.handler.move_to(index);
        self.handler.global_index()
    }

    /// Advance one step. Returns `false` at the last step.
    pub fn next_step(&mut self) -> bool {
        if self.handler.is_at_last() {
            return false;
        }
        let index = self.handler.global_index() + 1;
        self.handler.move_to(index);
        true
    }

    /// Go back one step. Returns `false` at the first step.
    pub fn previous_step(&mut self) -> bool {
        if self.handler.is_at_first() {
            return false;
        }
        let index = self.handler.global_index() - 1;
        self.handler.move_to(index);
        true
    }

    /// Jump to the first step.
    pub fn first_step(&mut self) -> usize {
        self.move_to(0)
    }

    /// Jump to the last step.
    pub fn last_step(&mut self) -> usize {
        self.move_to(usize::MAX)
    }

    // Selection

    /// Set the ghost flag of one placement of the current step.
    pub fn set_ghost(&mut self, placement: usize, ghost: bool) -> Result<EditOutcome, CommandError> {
        let cursor = self.global_index();
        let Some(step) = self.current_step_mut() else {
            return Ok(skip("select", SkipReason::InvalidCursorState));
        };
        let len = step.placements.len();
        let target = step
            .placements
            .get_mut(placement)
            .ok_or(CommandError::InvalidPlacement {
                index: placement,
                len,
            })?;
        target.ghost = ghost;
        Ok(EditOutcome::Applied { cursor })
    }

    /// Flip the ghost flag of one placement of the current step.
    pub fn toggle_ghost(&mut self, placement: usize) -> Result<EditOutcome, CommandError> {
        let ghost = self
            .current_step()
            .and_then(|current| current.step.placements.get(placement))
            .map(|p| !p.ghost)
            .unwrap_or(true);
        self.set_ghost(placement, ghost)
    }

    /// Set the ghost flag of every placement of the current step.
    pub fn set_all_ghosts(&mut self, ghost: bool) -> EditOutcome {
        let cursor = self.global_index();
        let Some(step) = self.current_step_mut() else {
            return skip("select", SkipReason::InvalidCursorState);
        };
        for placement in &mut step.placements {
            placement.ghost = ghost;
        }
        EditOutcome::Applied { cursor }
    }

    // Edit plumbing

    fn current_step_mut(&mut self) -> Option<&mut Step> {
        let (part_id, index) = self.handler.current_step()?;
        let part_id = part_id.to_string();
        self.document.part_mut(&part_id)?.steps.get_mut(index)
    }

    /// Capture where the cursor is before an edit.
    pub(crate) fn cursor_context(&self) -> Option<CursorContext> {
        let cursor = self.handler.cursor();
        let (part_id, step_index) = self.handler.current_step()?;
        Some(CursorContext {
            part_id: part_id.to_string(),
            step_index,
            global_index: self.handler.global_index(),
            usages: self.handler.usage_count(part_id),
            layout: cursor.layout(),
        })
    }

    /// The part being edited, provided the captured step still exists.
    pub(crate) fn edit_target(&mut self, ctx: &CursorContext) -> Option<&mut Part> {
        self.document
            .part_mut(&ctx.part_id)
            .filter(|part| ctx.step_index < part.steps.len())
    }

    pub(crate) fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Remove a step. A non-main part left without steps is purged from the document.
    ///
    /// The only step of the main model is kept; returns whether the step was removed.
    pub(crate) fn eliminate_step(&mut self, part_id: &str, index: usize) -> bool {
        let is_main = part_id == self.document.main_model_id();
        let Some(part) = self.document.part_mut(part_id) else {
            return false;
        };
        if index >= part.steps.len() || (is_main && part.steps.len() == 1) {
            return false;
        }
        part.steps.remove(index);
        if part.steps.is_empty() {
            purge_part(&mut self.document, part_id);
        }
        true
    }

    /// Rebuild the handlers and land the cursor as described by `landing`.
    pub(crate) fn finish_edit(&mut self, ctx: &CursorContext, landing: Landing) -> usize {
        let after = StepCounter::new(&self.document).layout(&ctx.part_id);
        let delta = cursor_delta(&DeltaContext {
            usages: ctx.usages,
            before: &ctx.layout,
            after: &after,
            from: ctx.step_index,
            landing,
        });
        let target = apply_delta(ctx.global_index, delta);

        self.handler = StepHandler::new(&self.document);
        self.handler.move_to(target);
        log::debug!(
            "Cursor {} -> {} (delta {}, {} usages of '{}')",
            ctx.global_index,
            target,
            delta,
            ctx.usages,
            ctx.part_id
        );
        self.handler.global_index()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Placement;

    fn editor() -> StepEditor {
        let sub = Part::assembly("sub.ldr", vec![Step::new(vec![Placement::new("3001.dat")])]);
        let main = Part::assembly(
            "main.ldr",
            vec![
                Step::new(vec![Placement::new("sub.ldr"), Placement::new("3001.dat")]),
                Step::new(vec![Placement::new("3001.dat")]),
            ],
        );
        let document = Document::with_parts(main, [sub, Part::leaf("3001.dat")]).unwrap();
        StepEditor::new(document, EditorConfig::default()).unwrap()
    }

    #[test]
    fn test_navigation_stops_at_the_ends() {
        let mut editor = editor();
        assert_eq!(editor.total_steps(), 3);
        assert_eq!(editor.current_step().unwrap().part.id, "sub.ldr");

        assert!(!editor.previous_step());
        assert!(editor.next_step());
        assert_eq!(editor.current_step().unwrap().part.id, "main.ldr");
        assert_eq!(editor.last_step(), 2);
        assert!(!editor.next_step());
        assert_eq!(editor.first_step(), 0);
        assert_eq!(editor.move_to(99), 2);
    }

    #[test]
    fn test_ghost_selection() {
        let mut editor = editor();
        editor.move_to(1);

        assert_eq!(
            editor.toggle_ghost(1).unwrap(),
            EditOutcome::Applied { cursor: 1 }
        );
        assert_eq!(editor.current_step().unwrap().step.ghosted_count(), 1);
        editor.toggle_ghost(1).unwrap();
        assert!(!editor.current_step().unwrap().step.has_ghosted());

        editor.set_all_ghosts(true);
        assert_eq!(editor.current_step().unwrap().step.ghosted_count(), 2);

        assert_eq!(
            editor.set_ghost(2, true),
            Err(CommandError::InvalidPlacement { index: 2, len: 2 })
        );
    }

    #[test]
    fn test_only_main_step_cannot_be_eliminated() {
        let main = Part::assembly("main.ldr", vec![Step::default()]);
        let mut editor = StepEditor::new(Document::new(main), EditorConfig::default()).unwrap();

        assert!(!editor.eliminate_step("main.ldr", 0));
        assert!(!editor.available_edits().remove);
        assert!(editor.available_edits().insert_step);
        assert!(!editor.available_edits().extract);
    }
}
