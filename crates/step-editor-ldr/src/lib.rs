#![warn(missing_docs)]
//! Line-format persistence for `step-editor-core` documents.
//!
//! The format is the multi-part text layout used by brick modelling tools: every non-leaf part is
//! a `0 FILE` section, placements are type 1 lines and steps end with `0 STEP` or `0 ROTSTEP`.
//!
//! # Example
//!
//! ```rust
//! use step_editor_ldr::{LdrWriter, LineEnding, parse_document};
//!
//! let text = "0 FILE main.ldr\r\n1 4 0 0 0 1 0 0 0 1 0 0 0 1 3001.dat\r\n0 STEP\r\n0 NOFILE\r\n";
//! let document = parse_document(text, "main.ldr").unwrap();
//! assert_eq!(document.main_model().unwrap().steps.len(), 1);
//!
//! let writer = LdrWriter::new().with_line_ending(LineEnding::detect_in_text(text));
//! assert!(writer.write_document(&document).ends_with("0 NOFILE\r\n"));
//! ```

pub mod error;
pub mod line_ending;
pub mod parser;
pub mod writer;

pub use error::ParseError;
pub use line_ending::LineEnding;
pub use parser::parse_document;
pub use writer::LdrWriter;
