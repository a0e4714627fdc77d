//! Document serialization and save tracking.
//!
//! Saving is split in two halves so a frontend can hand the serialized content to an
//! asynchronous backend: [`crate::EditorStateManager::begin_save`] serializes the document and
//! records the version being saved, [`crate::EditorStateManager::complete_save`] reports the
//! outcome. A failed save leaves the document untouched and still modified.

use crate::model::Document;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Turns a document into its persisted text form.
pub trait DocumentSerializer {
    /// Serialization error.
    type Error: std::error::Error;

    /// Serialize the whole document.
    fn serialize_document(&self, document: &Document) -> Result<String, Self::Error>;
}

/// Pretty-printed JSON snapshot of the document. Ghost flags are never written.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl DocumentSerializer for JsonSerializer {
    type Error = serde_json::Error;

    fn serialize_document(&self, document: &Document) -> Result<String, Self::Error> {
        serde_json::to_string_pretty(document)
    }
}

/// Stores serialized documents.
pub trait SaveBackend {
    /// Backend error.
    type Error: std::fmt::Display;

    /// Persist `content` under `document_id`.
    fn save(&mut self, document_id: &str, content: &str) -> Result<(), Self::Error>;
}

/// Persistence status of the document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SaveStatus {
    /// Matches the last successful save (or the loaded content).
    #[default]
    Saved,
    /// Changed since the last save.
    Unsaved,
    /// A save is in flight.
    Saving,
    /// The last save failed.
    Failed(String),
}

/// A save in flight: serialized content plus the version it was taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    /// Document identifier passed to the backend.
    pub document_id: String,
    /// Serialized document.
    pub content: String,
    /// Document version the content was serialized from.
    pub version: u64,
}

/// Save failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaveError {
    /// The document could not be serialized.
    #[error("failed to serialize document: {0}")]
    Serialize(String),

    /// The backend rejected the content.
    #[error("failed to save '{document_id}': {message}")]
    Backend {
        /// Document identifier.
        document_id: String,
        /// Backend message.
        message: String,
    },
}

/// In-memory [`SaveBackend`], mostly for tests and tools.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    saved: Vec<(String, String)>,
    fail_with: Option<String>,
}

impl MemoryBackend {
    /// A backend that accepts every save.
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that rejects every save with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            saved: Vec::new(),
            fail_with: Some(message.into()),
        }
    }

    /// Every accepted `(document_id, content)` pair, oldest first.
    pub fn saved(&self) -> &[(String, String)] {
        &self.saved
    }

    /// The most recently accepted content.
    pub fn last_content(&self) -> Option<&str> {
        self.saved.last().map(|(_, content)| content.as_str())
    }
}

impl SaveBackend for MemoryBackend {
    type Error = String;

    fn save(&mut self, document_id: &str, content: &str) -> Result<(), Self::Error> {
        if let Some(message) = &self.fail_with {
            return Err(message.clone());
        }
        self.saved
            .push((document_id.to_string(), content.to_string()));
        Ok(())
    }
}
