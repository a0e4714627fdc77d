//! Parse errors.

use step_editor_core::DocumentError;
use thiserror::Error;

/// Errors produced while reading the line format.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A type 1 line does not have the expected number of fields.
    #[error("line {line}: placement needs at least 15 fields, found {found}")]
    PlacementFields {
        /// 1-based line number.
        line: usize,
        /// Number of fields found.
        found: usize,
    },

    /// A numeric field could not be parsed.
    #[error("line {line}: invalid number '{value}'")]
    InvalidNumber {
        /// 1-based line number.
        line: usize,
        /// The offending field.
        value: String,
    },

    /// A `ROTSTEP` line is malformed.
    #[error("line {line}: malformed rotation step '{text}'")]
    InvalidRotation {
        /// 1-based line number.
        line: usize,
        /// The whole line.
        text: String,
    },

    /// A `FILE` line without a name.
    #[error("line {line}: FILE without a name")]
    MissingFileName {
        /// 1-based line number.
        line: usize,
    },

    /// A part is defined twice.
    #[error("line {line}: part '{id}' is defined twice")]
    DuplicateFile {
        /// 1-based line number.
        line: usize,
        /// The duplicated part ID.
        id: String,
    },

    /// The text defines no part at all.
    #[error("no model found")]
    Empty,

    /// The parsed parts do not form a valid document.
    #[error(transparent)]
    Document(#[from] DocumentError),
}
