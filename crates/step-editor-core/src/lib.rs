#![warn(missing_docs)]
//! Step Editor Core - Headless Editing Engine for Stepped Assembly Instructions
//!
//! # Overview
//!
//! `step-editor-core` restructures building instructions: a main model made of ordered steps,
//! where each step places parts and parts may themselves be assemblies with their own steps. It
//! does not render anything; a frontend shows the step under the cursor and issues commands.
//!
//! # Core Features
//!
//! - **Flattened Navigation**: one global step index across all nested assemblies
//! - **Structural Edits**: insert, remove, merge, move and extract steps or highlighted placements
//! - **Cursor Stability**: the cursor follows the edited content across every placed instance
//! - **Rotation Editing**: step rotations with forward propagation
//! - **State Tracking**: version numbers, change notifications and save status
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Command Interface & State Management       │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Edits, Rotation & Selection (StepEditor)   │  ← Mutation
//! ├─────────────────────────────────────────────┤
//! │  Cursor Delta & Purge                       │  ← Consistency
//! ├─────────────────────────────────────────────┤
//! │  Position Indexer (StepHandler tree)        │  ← Navigation
//! ├─────────────────────────────────────────────┤
//! │  Document Model (parts, steps, placements)  │  ← Storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use step_editor_core::{
//!     Command, CommandExecutor, CommandResult, Document, EditCommand, EditorConfig, Part,
//!     Placement, SelectionCommand, Step,
//! };
//!
//! let main = Part::assembly(
//!     "main.ldr",
//!     vec![Step::new(vec![Placement::new("3001.dat"), Placement::new("3003.dat")])],
//! );
//! let document =
//!     Document::with_parts(main, [Part::leaf("3001.dat"), Part::leaf("3003.dat")]).unwrap();
//! let mut executor = CommandExecutor::new(document, EditorConfig::default()).unwrap();
//!
//! // Highlight the second brick and move it into a subassembly of its own.
//! executor
//!     .execute(Command::Selection(SelectionCommand::Toggle { placement: 1 }))
//!     .unwrap();
//! let result = executor
//!     .execute(Command::Edit(EditCommand::ExtractToNewPart))
//!     .unwrap();
//!
//! assert!(matches!(result, CommandResult::Created { .. }));
//! assert_eq!(executor.editor().total_steps(), 3);
//! ```

pub mod commands;
pub mod config;
pub mod delta;
pub mod edit;
pub mod editor;
pub mod error;
pub mod ids;
pub mod indexer;
pub mod model;
pub mod persistence;
pub mod purge;
pub mod rotation;
pub mod state;

pub use commands::{
    Command, CommandError, CommandExecutor, CommandResult, CursorCommand, EditCommand,
    RotationCommand, SelectionCommand,
};
pub use config::{ConfigError, EditorConfig};
pub use delta::{DeltaContext, Landing, apply_delta, cursor_delta};
pub use edit::{EditOutcome, SkipReason};
pub use editor::{CurrentStep, EditAvailability, StepEditor};
pub use error::DocumentError;
pub use ids::next_part_id;
pub use indexer::{CursorFrame, Direction, HandlerStep, NestedHandler, StepCounter, StepHandler};
pub use model::{
    ColorId, Document, INHERITED_COLOR, Part, PartMetadata, Placement, RotationKind, Step,
    StepRotation,
};
pub use persistence::{
    DocumentSerializer, JsonSerializer, MemoryBackend, SaveBackend, SaveError, SaveRequest,
    SaveStatus,
};
pub use purge::{PurgeReport, purge_part};
pub use rotation::Axis;
pub use state::{
    CursorState, DocumentState, EditorStateManager, StateChange, StateChangeCallback,
    StateChangeType,
};
