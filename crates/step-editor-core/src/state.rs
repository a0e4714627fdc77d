//! Editor State Interface
//!
//! Exposes the editing session to a frontend in a structured, read-only manner.
//!
//! # Overview
//!
//! - **State Queries**: document and cursor snapshots
//! - **Version Tracking**: every change bumps the state version
//! - **Change Notifications**: subscribe to document, cursor, selection and save events
//! - **Saving**: serialize, hand off to a backend, and track the save status
//!
//! # Example
//!
//! ```rust
//! use step_editor_core::{
//!     Command, Document, EditCommand, EditorConfig, EditorStateManager, Part, Placement, Step,
//! };
//!
//! let main = Part::assembly("main.ldr", vec![Step::new(vec![Placement::new("3001.dat")])]);
//! let document = Document::with_parts(main, [Part::leaf("3001.dat")]).unwrap();
//! let mut manager = EditorStateManager::new("main.ldr", document, EditorConfig::default()).unwrap();
//!
//! manager.subscribe(|change| {
//!     println!("State changed: {:?}", change.change_type);
//! });
//!
//! manager.execute(Command::Edit(EditCommand::InsertStepAfter)).unwrap();
//!
//! let state = manager.get_document_state();
//! assert!(state.is_modified);
//! assert_eq!(state.total_steps, 2);
//! assert_eq!(manager.get_cursor_state().global_index, 1);
//! ```

use crate::commands::{Command, CommandError, CommandExecutor, CommandResult};
use crate::config::EditorConfig;
use crate::editor::{EditAvailability, StepEditor};
use crate::error::DocumentError;
use crate::indexer::CursorFrame;
use crate::model::Document;
use crate::persistence::{DocumentSerializer, SaveBackend, SaveError, SaveRequest, SaveStatus};

/// Document state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentState {
    /// Identifier of the document
    pub document_id: String,
    /// ID of the main model
    pub main_model_id: String,
    /// Number of parts, leaf parts included
    pub part_count: usize,
    /// Number of flattened steps
    pub total_steps: usize,
    /// Whether modified since the last save
    pub is_modified: bool,
    /// Persistence status
    pub save_status: SaveStatus,
    /// State version number (incremented after each change)
    pub version: u64,
}

/// Cursor state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorState {
    /// Global index in the flattened sequence
    pub global_index: usize,
    /// Number of flattened steps
    pub total_steps: usize,
    /// Part owning the current step
    pub part_id: Option<String>,
    /// Index of the current step within its part
    pub step_index: Option<usize>,
    /// Path from the main model to the current step
    pub path: Vec<CursorFrame>,
    /// Placements in the current step
    pub placement_count: usize,
    /// Highlighted placements in the current step
    pub ghosted_count: usize,
    /// Edits that apply at the current position
    pub available: EditAvailability,
}

/// State change type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateChangeType {
    /// Steps or placements were modified
    DocumentModified,
    /// The cursor was repositioned
    CursorMoved,
    /// Ghost flags changed
    SelectionChanged,
    /// The save status changed
    SaveStatusChanged,
}

/// State change record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    /// Change type
    pub change_type: StateChangeType,
    /// Old version number
    pub old_version: u64,
    /// New version number
    pub new_version: u64,
    /// Global cursor index after the change
    pub cursor: usize,
}

impl StateChange {
    /// Create a new state change record
    pub fn new(change_type: StateChangeType, old_version: u64, new_version: u64) -> Self {
        Self {
            change_type,
            old_version,
            new_version,
            cursor: 0,
        }
    }

    /// Attach the cursor position
    pub fn with_cursor(mut self, cursor: usize) -> Self {
        self.cursor = cursor;
        self
    }
}

/// State change callback function type
pub type StateChangeCallback = Box<dyn FnMut(&StateChange) + Send>;

/// Editor state manager
///
/// Runs commands, tracks versions and the save status, and notifies subscribers.
pub struct EditorStateManager {
    executor: CommandExecutor,
    document_id: String,
    state_version: u64,
    document_version: u64,
    is_modified: bool,
    save_status: SaveStatus,
    callbacks: Vec<StateChangeCallback>,
}

impl EditorStateManager {
    /// Validate `document` and start managing it under `document_id`.
    pub fn new(
        document_id: impl Into<String>,
        document: Document,
        config: EditorConfig,
    ) -> Result<Self, DocumentError> {
        Ok(Self {
            executor: CommandExecutor::new(document, config)?,
            document_id: document_id.into(),
            state_version: 0,
            document_version: 0,
            is_modified: false,
            save_status: SaveStatus::Saved,
            callbacks: Vec::new(),
        })
    }

    /// Get the editor
    pub fn editor(&self) -> &StepEditor {
        self.executor.editor()
    }

    /// Get the editor mutably.
    ///
    /// Changes made this way are not tracked; follow them with [`Self::mark_modified`].
    pub fn editor_mut(&mut self) -> &mut StepEditor {
        self.executor.editor_mut()
    }

    /// Get the command executor
    pub fn executor(&self) -> &CommandExecutor {
        &self.executor
    }

    /// Identifier of the managed document
    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// Execute a command and notify subscribers of what changed.
    ///
    /// Skipped edits and errors change nothing and notify nobody.
    pub fn execute(&mut self, command: Command) -> Result<CommandResult, CommandError> {
        let cursor_before = self.editor().global_index();
        let is_selection = matches!(command, Command::Selection(_));

        let result = self.executor.execute(command)?;

        match &result {
            CommandResult::Applied { .. } | CommandResult::Created { .. } => {
                if is_selection {
                    self.mark_modified(StateChangeType::SelectionChanged);
                } else {
                    self.mark_modified(StateChangeType::DocumentModified);
                    self.mark_modified(StateChangeType::CursorMoved);
                }
            }
            CommandResult::Position(index) => {
                if *index != cursor_before {
                    self.mark_modified(StateChangeType::CursorMoved);
                }
            }
            CommandResult::Skipped(_) => {}
        }

        Ok(result)
    }

    /// Execute commands in order, stopping at the first error
    pub fn execute_batch(
        &mut self,
        commands: Vec<Command>,
    ) -> Result<Vec<CommandResult>, CommandError> {
        let mut results = Vec::new();
        for command in commands {
            results.push(self.execute(command)?);
        }
        Ok(results)
    }

    /// Get current version number
    pub fn version(&self) -> u64 {
        self.state_version
    }

    /// Number of document modifications so far.
    ///
    /// Unlike [`Self::version`], cursor moves and selection changes leave it unchanged.
    pub fn document_version(&self) -> u64 {
        self.document_version
    }

    /// Whether modified since the last successful save
    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    /// Current persistence status
    pub fn save_status(&self) -> &SaveStatus {
        &self.save_status
    }

    /// Get document state
    pub fn get_document_state(&self) -> DocumentState {
        let document = self.editor().document();
        DocumentState {
            document_id: self.document_id.clone(),
            main_model_id: document.main_model_id().to_string(),
            part_count: document.part_count(),
            total_steps: self.editor().total_steps(),
            is_modified: self.is_modified,
            save_status: self.save_status.clone(),
            version: self.state_version,
        }
    }

    /// Get cursor state
    pub fn get_cursor_state(&self) -> CursorState {
        let editor = self.editor();
        let current = editor.current_step();
        CursorState {
            global_index: editor.global_index(),
            total_steps: editor.total_steps(),
            part_id: current.map(|c| c.part.id.clone()),
            step_index: current.map(|c| c.index),
            path: editor.cursor_path(),
            placement_count: current.map_or(0, |c| c.step.placements.len()),
            ghosted_count: current.map_or(0, |c| c.step.ghosted_count()),
            available: editor.available_edits(),
        }
    }

    /// Subscribe to state change events
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&StateChange) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Check if state has changed since a version
    pub fn has_changed_since(&self, version: u64) -> bool {
        self.state_version > version
    }

    /// Mark a change, bump the version and notify subscribers
    pub fn mark_modified(&mut self, change_type: StateChangeType) {
        let old_version = self.state_version;
        self.state_version += 1;

        let document_changed = matches!(change_type, StateChangeType::DocumentModified);
        if document_changed {
            self.document_version += 1;
            self.is_modified = true;
        }

        let change = StateChange::new(change_type, old_version, self.state_version)
            .with_cursor(self.editor().global_index());
        self.notify_callbacks(&change);

        if document_changed && self.save_status != SaveStatus::Saving {
            self.set_save_status(SaveStatus::Unsaved);
        }
    }

    /// Serialize the document and mark a save as in flight.
    pub fn begin_save<S>(&mut self, serializer: &S) -> Result<SaveRequest, SaveError>
    where
        S: DocumentSerializer,
    {
        let content = serializer
            .serialize_document(self.editor().document())
            .map_err(|err| SaveError::Serialize(err.to_string()))?;
        self.set_save_status(SaveStatus::Saving);
        log::debug!(
            "Saving '{}' at document version {}",
            self.document_id,
            self.document_version
        );
        Ok(SaveRequest {
            document_id: self.document_id.clone(),
            content,
            version: self.document_version,
        })
    }

    /// Record the outcome of a save started with [`Self::begin_save`].
    ///
    /// The document only counts as unmodified when it was not edited since the request. Cursor
    /// moves and selection changes do not affect the saved content.
    pub fn complete_save(&mut self, request: &SaveRequest, result: Result<(), String>) {
        match result {
            Ok(()) if self.document_version == request.version => {
                self.is_modified = false;
                self.set_save_status(SaveStatus::Saved);
                log::info!("Saved '{}'", request.document_id);
            }
            Ok(()) => {
                self.set_save_status(SaveStatus::Unsaved);
                log::info!(
                    "Saved '{}' at document version {}, now at {}",
                    request.document_id,
                    request.version,
                    self.document_version
                );
            }
            Err(message) => {
                log::error!("Saving '{}' failed: {}", request.document_id, message);
                self.set_save_status(SaveStatus::Failed(message));
            }
        }
    }

    /// Serialize and save through `backend` in one go.
    pub fn save_with<S, B>(&mut self, serializer: &S, backend: &mut B) -> Result<(), SaveError>
    where
        S: DocumentSerializer,
        B: SaveBackend,
    {
        let request = self.begin_save(serializer)?;
        let result = backend
            .save(&request.document_id, &request.content)
            .map_err(|err| err.to_string());
        self.complete_save(&request, result.clone());
        result.map_err(|message| SaveError::Backend {
            document_id: request.document_id,
            message,
        })
    }

    fn set_save_status(&mut self, status: SaveStatus) {
        if self.save_status == status {
            return;
        }
        self.save_status = status;
        self.notify_change(StateChangeType::SaveStatusChanged);
    }

    /// Notify state change (without modifying version number)
    fn notify_change(&mut self, change_type: StateChangeType) {
        let change = StateChange::new(change_type, self.state_version, self.state_version)
            .with_cursor(self.editor().global_index());
        self.notify_callbacks(&change);
    }

    fn notify_callbacks(&mut self, change: &StateChange) {
        for callback in &mut self.callbacks {
            callback(change);
        }
    }
}
