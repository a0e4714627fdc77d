//! Line ending helpers.
//!
//! The parser accepts both LF and CRLF input. The writer emits the line ending it was configured
//! with, so a file can be saved back with the newlines it was loaded with.

/// Newline sequence written between lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    /// Unix-style LF (`'\n'`).
    #[default]
    Lf,
    /// Windows-style CRLF (`"\r\n"`).
    Crlf,
}

impl LineEnding {
    /// Detect the line ending of a source text.
    ///
    /// Any CRLF makes the text [`LineEnding::Crlf`], otherwise [`LineEnding::Lf`].
    pub fn detect_in_text(text: &str) -> Self {
        if text.contains("\r\n") {
            Self::Crlf
        } else {
            Self::Lf
        }
    }

    /// The newline sequence.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::Crlf => "\r\n",
        }
    }
}
