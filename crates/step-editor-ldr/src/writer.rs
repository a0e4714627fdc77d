//! Line-format writer.
//!
//! Output layout, one section per non-leaf part (main model first, the rest in ID order):
//!
//! ```text
//! 0 FILE <id>
//! 0 <description>
//! 0 Name: <name>
//! 0 Author: <author>
//! 0 !LICENSE <license>
//! 0 BFC CERTIFY CCW
//! 1 <color> <x> <y> <z> <a> <b> <c> <d> <e> <f> <g> <h> <i> <part id>
//! 0 STEP
//! 0 NOFILE
//! ```
//!
//! Every step ends with `0 STEP`, or `0 ROTSTEP <x> <y> <z> REL|ABS` when it carries a rotation.
//! Empty metadata lines are omitted. Ghost flags are never written.

use crate::line_ending::LineEnding;
use std::convert::Infallible;
use step_editor_core::{
    Document, DocumentSerializer, Part, PartMetadata, Placement, RotationKind, Step, StepRotation,
};

/// Serializes documents to the line format.
#[derive(Debug, Clone, Copy, Default)]
pub struct LdrWriter {
    line_ending: LineEnding,
}

impl LdrWriter {
    /// A writer using LF line endings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `line_ending` between lines.
    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Serialize the whole document.
    pub fn write_document(&self, document: &Document) -> String {
        let mut lines = Vec::new();
        if let Some(main) = document.main_model() {
            lines.extend(Self::part_lines(main));
        }
        for part in document
            .parts()
            .filter(|p| !p.is_leaf && p.id != document.main_model_id())
        {
            lines.extend(Self::part_lines(part));
        }

        let newline = self.line_ending.as_str();
        let mut out = lines.join(newline);
        out.push_str(newline);
        out
    }

    /// Lines of one part section.
    pub fn part_lines(part: &Part) -> Vec<String> {
        let mut lines = vec![format!("0 FILE {}", part.id)];
        lines.extend(Self::header_lines(&part.metadata));
        for step in &part.steps {
            lines.extend(Self::step_lines(step));
        }
        lines.push("0 NOFILE".to_string());
        lines
    }

    /// Lines of one step, terminator included.
    ///
    /// This is the serialized view of the step's placement list and is derived on every call.
    pub fn step_lines(step: &Step) -> Vec<String> {
        let mut lines = Vec::with_capacity(step.placements.len() + 1);
        for placement in &step.placements {
            if placement.invert_normals {
                lines.push("0 BFC INVERTNEXT".to_string());
            }
            lines.push(Self::placement_line(placement));
        }
        lines.push(Self::step_end_line(step.rotation));
        lines
    }

    /// A type 1 line for `placement`.
    pub fn placement_line(placement: &Placement) -> String {
        let p = placement.position;
        let m = placement.rotation;
        let (r0, r1, r2) = (m.row(0), m.row(1), m.row(2));
        format!(
            "1 {} {} {} {} {} {} {} {} {} {} {} {} {} {}",
            placement.color,
            p.x,
            p.y,
            p.z,
            r0.x,
            r0.y,
            r0.z,
            r1.x,
            r1.y,
            r1.z,
            r2.x,
            r2.y,
            r2.z,
            placement.part_id
        )
    }

    fn step_end_line(rotation: Option<StepRotation>) -> String {
        match rotation {
            None => "0 STEP".to_string(),
            Some(r) => {
                let kind = match r.kind {
                    RotationKind::Relative => "REL",
                    RotationKind::Absolute => "ABS",
                };
                format!("0 ROTSTEP {} {} {} {}", r.x, r.y, r.z, kind)
            }
        }
    }

    fn header_lines(metadata: &PartMetadata) -> Vec<String> {
        let mut lines = Vec::new();
        if !metadata.description.is_empty() {
            lines.push(format!("0 {}", metadata.description));
        }
        if !metadata.name.is_empty() {
            lines.push(format!("0 Name: {}", metadata.name));
        }
        if !metadata.author.is_empty() {
            lines.push(format!("0 Author: {}", metadata.author));
        }
        if !metadata.license.is_empty() {
            lines.push(format!("0 !LICENSE {}", metadata.license));
        }
        lines.push(
            match (metadata.certified_bfc, metadata.ccw) {
                (true, true) => "0 BFC CERTIFY CCW",
                (true, false) => "0 BFC CERTIFY CW",
                (false, _) => "0 BFC NOCERTIFY",
            }
            .to_string(),
        );
        lines
    }
}

impl DocumentSerializer for LdrWriter {
    type Error = Infallible;

    fn serialize_document(&self, document: &Document) -> Result<String, Self::Error> {
        Ok(self.write_document(document))
    }
}
