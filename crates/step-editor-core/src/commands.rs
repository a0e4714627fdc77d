//! Command Interface Layer
//!
//! Wraps the [`StepEditor`] operations in a single command enum for frontend integration.
//!
//! # Overview
//!
//! - **Edit**: recolour, insert, remove, move and extract steps
//! - **Cursor**: step through the flattened sequence
//! - **Selection**: mark placements of the current step for the next edit
//! - **Rotation**: change and propagate the step rotation
//!
//! # Example
//!
//! ```rust
//! use step_editor_core::{
//!     Command, CommandExecutor, CommandResult, CursorCommand, Document, EditCommand,
//!     EditorConfig, Part, Placement, SelectionCommand, Step,
//! };
//!
//! let main = Part::assembly(
//!     "main.ldr",
//!     vec![Step::new(vec![Placement::new("3001.dat"), Placement::new("3002.dat")])],
//! );
//! let document =
//!     Document::with_parts(main, [Part::leaf("3001.dat"), Part::leaf("3002.dat")]).unwrap();
//! let mut executor = CommandExecutor::new(document, EditorConfig::default()).unwrap();
//!
//! let results = executor
//!     .execute_batch(vec![
//!         Command::Selection(SelectionCommand::Toggle { placement: 1 }),
//!         Command::Edit(EditCommand::MoveToNext),
//!         Command::Cursor(CursorCommand::First),
//!     ])
//!     .unwrap();
//!
//! assert_eq!(results[2], CommandResult::Position(0));
//! assert_eq!(executor.editor().total_steps(), 2);
//! ```

use crate::config::EditorConfig;
use crate::edit::{EditOutcome, SkipReason};
use crate::editor::StepEditor;
use crate::error::DocumentError;
use crate::model::{ColorId, Document, RotationKind};
use crate::rotation::Axis;
use thiserror::Error;

/// Structural edit commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    /// Recolour the highlighted placements
    Recolor {
        /// New colour.
        color: ColorId,
    },
    /// Insert an empty step after the current one
    InsertStepAfter,
    /// Remove the current step, its highlighted placements, or merge it left
    RemoveCurrent,
    /// Move the step (or highlighted placements) forward
    MoveToNext,
    /// Move the step (or highlighted placements) backward
    MoveToPrevious,
    /// Move the highlighted placements (or the step) into a new part
    ExtractToNewPart,
}

/// Cursor commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorCommand {
    /// Next flattened step
    Next,
    /// Previous flattened step
    Previous,
    /// First step
    First,
    /// Last step
    Last,
    /// Jump to a global index (clamped)
    GoTo {
        /// Target global index.
        index: usize,
    },
}

/// Selection commands on the placements of the current step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionCommand {
    /// Flip one placement
    Toggle {
        /// Placement index within the step.
        placement: usize,
    },
    /// Set one placement
    Set {
        /// Placement index within the step.
        placement: usize,
        /// New ghost flag.
        ghost: bool,
    },
    /// Highlight every placement
    SelectAll,
    /// Clear every highlight
    Clear,
}

/// Rotation commands on the current step
#[derive(Debug, Clone, PartialEq)]
pub enum RotationCommand {
    /// Take over the previous step's rotation
    Inherit,
    /// Switch between relative and absolute
    SetKind {
        /// New kind.
        kind: RotationKind,
    },
    /// Remove the rotation
    End,
    /// Set all three angles (degrees)
    SetAngles {
        /// X angle.
        x: f64,
        /// Y angle.
        y: f64,
        /// Z angle.
        z: f64,
    },
    /// Turn by a multiple of the configured rotation step
    Nudge {
        /// Axis to turn around.
        axis: Axis,
        /// Signed number of rotation steps.
        steps: i32,
    },
}

/// Unified command enum
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Structural edits
    Edit(EditCommand),
    /// Cursor movement
    Cursor(CursorCommand),
    /// Placement selection
    Selection(SelectionCommand),
    /// Step rotation
    Rotation(RotationCommand),
}

/// Command execution result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// The command changed the document or selection
    Applied {
        /// Global index after the command.
        cursor: usize,
    },
    /// The command created a part
    Created {
        /// ID of the new part.
        part_id: String,
        /// Global index after the command.
        cursor: usize,
    },
    /// The command did not apply; nothing changed
    Skipped(SkipReason),
    /// Cursor position after a cursor command
    Position(usize),
}

impl From<EditOutcome> for CommandResult {
    fn from(outcome: EditOutcome) -> Self {
        match outcome {
            EditOutcome::Applied { cursor } => CommandResult::Applied { cursor },
            EditOutcome::Created { part_id, cursor } => CommandResult::Created { part_id, cursor },
            EditOutcome::Skipped(reason) => CommandResult::Skipped(reason),
        }
    }
}

/// Command error type
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    /// Placement index outside the current step
    #[error("invalid placement index {index} (step has {len} placements)")]
    InvalidPlacement {
        /// Requested index.
        index: usize,
        /// Number of placements in the step.
        len: usize,
    },
    /// Non-finite rotation angle
    #[error("rotation angle for {axis} must be finite, got {value}")]
    InvalidAngle {
        /// Offending axis.
        axis: Axis,
        /// Offending value.
        value: f64,
    },
}

/// Command executor
///
/// Runs [`Command`]s against a [`StepEditor`] and keeps the command history.
pub struct CommandExecutor {
    editor: StepEditor,
    command_history: Vec<Command>,
}

impl CommandExecutor {
    /// Validate `document` and create an executor on its first step.
    pub fn new(document: Document, config: EditorConfig) -> Result<Self, DocumentError> {
        Ok(Self::from_editor(StepEditor::new(document, config)?))
    }

    /// Wrap an existing editor.
    pub fn from_editor(editor: StepEditor) -> Self {
        Self {
            editor,
            command_history: Vec::new(),
        }
    }

    /// Execute command
    pub fn execute(&mut self, command: Command) -> Result<CommandResult, CommandError> {
        self.record(&command);

        match command {
            Command::Edit(edit_cmd) => Ok(self.execute_edit(edit_cmd).into()),
            Command::Cursor(cursor_cmd) => Ok(self.execute_cursor(cursor_cmd)),
            Command::Selection(selection_cmd) => {
                self.execute_selection(selection_cmd).map(Into::into)
            }
            Command::Rotation(rotation_cmd) => {
                self.execute_rotation(rotation_cmd).map(Into::into)
            }
        }
    }

    /// Batch execute commands, stopping at the first error
    pub fn execute_batch(
        &mut self,
        commands: Vec<Command>,
    ) -> Result<Vec<CommandResult>, CommandError> {
        let mut results = Vec::new();

        for command in commands {
            let result = self.execute(command)?;
            results.push(result);
        }

        Ok(results)
    }

    /// Get command history, oldest first
    ///
    /// Holds at most [`EditorConfig::command_history_limit`] commands.
    pub fn get_command_history(&self) -> &[Command] {
        &self.command_history
    }

    /// Forget all recorded commands
    pub fn clear_history(&mut self) {
        self.command_history.clear();
    }

    fn record(&mut self, command: &Command) {
        let limit = self.editor.config().command_history_limit;
        if limit == 0 {
            return;
        }
        self.command_history.push(command.clone());
        if self.command_history.len() > limit {
            let excess = self.command_history.len() - limit;
            self.command_history.drain(..excess);
        }
    }

    /// The wrapped editor
    pub fn editor(&self) -> &StepEditor {
        &self.editor
    }

    /// The wrapped editor, mutably
    pub fn editor_mut(&mut self) -> &mut StepEditor {
        &mut self.editor
    }

    /// Consume the executor and return the editor
    pub fn into_editor(self) -> StepEditor {
        self.editor
    }

    fn execute_edit(&mut self, command: EditCommand) -> EditOutcome {
        match command {
            EditCommand::Recolor { color } => self.editor.recolor(color),
            EditCommand::InsertStepAfter => self.editor.insert_step_after(),
            EditCommand::RemoveCurrent => self.editor.remove_current(),
            EditCommand::MoveToNext => self.editor.move_to_next(),
            EditCommand::MoveToPrevious => self.editor.move_to_previous(),
            EditCommand::ExtractToNewPart => self.editor.extract_to_new_part(),
        }
    }

    fn execute_cursor(&mut self, command: CursorCommand) -> CommandResult {
        let index = match command {
            CursorCommand::Next => {
                self.editor.next_step();
                self.editor.global_index()
            }
            CursorCommand::Previous => {
                self.editor.previous_step();
                self.editor.global_index()
            }
            CursorCommand::First => self.editor.first_step(),
            CursorCommand::Last => self.editor.last_step(),
            CursorCommand::GoTo { index } => self.editor.move_to(index),
        };
        CommandResult::Position(index)
    }

    fn execute_selection(&mut self, command: SelectionCommand) -> Result<EditOutcome, CommandError> {
        match command {
            SelectionCommand::Toggle { placement } => self.editor.toggle_ghost(placement),
            SelectionCommand::Set { placement, ghost } => self.editor.set_ghost(placement, ghost),
            SelectionCommand::SelectAll => Ok(self.editor.set_all_ghosts(true)),
            SelectionCommand::Clear => Ok(self.editor.set_all_ghosts(false)),
        }
    }

    fn execute_rotation(&mut self, command: RotationCommand) -> Result<EditOutcome, CommandError> {
        match command {
            RotationCommand::Inherit => Ok(self.editor.inherit_rotation()),
            RotationCommand::SetKind { kind } => Ok(self.editor.set_rotation_kind(kind)),
            RotationCommand::End => Ok(self.editor.end_rotation()),
            RotationCommand::SetAngles { x, y, z } => self.editor.set_rotation_angles(x, y, z),
            RotationCommand::Nudge { axis, steps } => Ok(self.editor.nudge_rotation(axis, steps)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Part, Placement, Step};

    fn executor() -> CommandExecutor {
        let main = Part::assembly(
            "main.ldr",
            vec![
                Step::new(vec![Placement::new("3001.dat"), Placement::new("3001.dat")]),
                Step::new(vec![Placement::new("3001.dat")]),
            ],
        );
        let document = Document::with_parts(main, [Part::leaf("3001.dat")]).unwrap();
        CommandExecutor::new(document, EditorConfig::default()).unwrap()
    }

    #[test]
    fn test_invalid_placement_is_an_error() {
        let mut executor = executor();

        let err = executor
            .execute(Command::Selection(SelectionCommand::Toggle { placement: 5 }))
            .unwrap_err();

        assert_eq!(err, CommandError::InvalidPlacement { index: 5, len: 2 });
        assert_eq!(
            err.to_string(),
            "invalid placement index 5 (step has 2 placements)"
        );
    }

    #[test]
    fn test_cursor_commands_clamp() {
        let mut executor = executor();

        let results = executor
            .execute_batch(vec![
                Command::Cursor(CursorCommand::Previous),
                Command::Cursor(CursorCommand::GoTo { index: 99 }),
                Command::Cursor(CursorCommand::Next),
            ])
            .unwrap();

        assert_eq!(
            results,
            vec![
                CommandResult::Position(0),
                CommandResult::Position(1),
                CommandResult::Position(1),
            ]
        );
        assert_eq!(executor.get_command_history().len(), 3);
    }

    #[test]
    fn test_batch_stops_at_first_error() {
        let mut executor = executor();

        let result = executor.execute_batch(vec![
            Command::Edit(EditCommand::InsertStepAfter),
            Command::Selection(SelectionCommand::Set {
                placement: 0,
                ghost: true,
            }),
            Command::Edit(EditCommand::RemoveCurrent),
        ]);

        // The inserted step is empty, so selecting placement 0 fails.
        assert!(result.is_err());
        assert_eq!(executor.editor().total_steps(), 3);
        assert_eq!(executor.get_command_history().len(), 2);
    }

    #[test]
    fn test_skipped_edit_is_not_an_error() {
        let mut executor = executor();

        let result = executor
            .execute(Command::Edit(EditCommand::Recolor { color: 4 }))
            .unwrap();

        assert!(matches!(result, CommandResult::Skipped(_)));
    }

    #[test]
    fn test_history_keeps_most_recent_commands() {
        let main = Part::assembly("main.ldr", vec![Step::new(vec![Placement::new("3001.dat")])]);
        let document = Document::with_parts(main, [Part::leaf("3001.dat")]).unwrap();
        let config = EditorConfig {
            command_history_limit: 2,
            ..EditorConfig::default()
        };
        let mut executor = CommandExecutor::new(document, config).unwrap();

        executor
            .execute_batch(vec![
                Command::Cursor(CursorCommand::First),
                Command::Cursor(CursorCommand::Next),
                Command::Cursor(CursorCommand::Last),
            ])
            .unwrap();

        assert_eq!(
            executor.get_command_history(),
            &[
                Command::Cursor(CursorCommand::Next),
                Command::Cursor(CursorCommand::Last),
            ]
        );

        executor.clear_history();
        assert!(executor.get_command_history().is_empty());
    }
}
