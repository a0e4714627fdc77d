//! Error types of the document model.

use thiserror::Error;

/// Structural problems found while loading or validating a [`crate::Document`].
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The designated main model is not registered.
    #[error("main model '{id}' is not registered")]
    MissingMainModel {
        /// The missing main model ID.
        id: String,
    },

    /// The main model is a leaf part and cannot hold steps.
    #[error("main model '{id}' is a leaf part")]
    LeafMainModel {
        /// The main model ID.
        id: String,
    },

    /// A part with the same ID is already registered.
    #[error("part '{id}' already exists")]
    DuplicatePart {
        /// The duplicate part ID.
        id: String,
    },

    /// A placement targets a part that is not registered.
    #[error("part '{id}' placed by '{referenced_by}' is not registered")]
    UnknownPart {
        /// The missing part ID.
        id: String,
        /// The part whose step holds the placement.
        referenced_by: String,
    },

    /// A leaf part carries steps.
    #[error("leaf part '{id}' has steps")]
    LeafWithSteps {
        /// The offending part ID.
        id: String,
    },

    /// A part places itself, directly or through other parts.
    #[error("placement cycle detected involving '{id}'")]
    PlacementCycle {
        /// A part on the cycle.
        id: String,
    },

    /// JSON snapshot could not be read or written.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
