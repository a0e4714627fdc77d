//! Line-format parser.
//!
//! Reads multi-part files (`0 FILE` ... `0 NOFILE` sections) as well as single-model files
//! without any `FILE` line, which become one part named after the fallback ID. The first section
//! is the main model. Parts that are placed but never defined become leaf parts.
//!
//! Unknown meta lines are skipped; the first one in a part header becomes its description.

use crate::error::ParseError;
use glam::{DMat3, DVec3};
use std::collections::HashSet;
use step_editor_core::{
    ColorId, Document, Part, PartMetadata, Placement, RotationKind, Step, StepRotation,
};

/// Parse `text` into a validated [`Document`].
///
/// `fallback_id` names the main model of files that have no `0 FILE` line.
pub fn parse_document(text: &str, fallback_id: &str) -> Result<Document, ParseError> {
    let mut parser = Parser::new(fallback_id);
    for (index, raw) in text.lines().enumerate() {
        parser.line(index + 1, raw)?;
    }
    parser.finish()
}

#[derive(Debug)]
struct PartBuilder {
    id: String,
    metadata: PartMetadata,
    steps: Vec<Step>,
    pending: Step,
    in_header: bool,
    invert_next: bool,
}

impl PartBuilder {
    fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            metadata: PartMetadata::default(),
            steps: Vec::new(),
            pending: Step::default(),
            in_header: true,
            invert_next: false,
        }
    }

    fn end_step(&mut self, rotation: Option<StepRotation>) {
        let mut step = std::mem::take(&mut self.pending);
        step.rotation = rotation;
        self.steps.push(step);
        self.in_header = false;
    }

    fn build(mut self) -> Part {
        if !self.pending.is_empty() {
            let step = std::mem::take(&mut self.pending);
            self.steps.push(step);
        }
        Part::assembly(self.id, self.steps).with_metadata(self.metadata)
    }
}

struct Parser {
    fallback_id: String,
    parts: Vec<Part>,
    current: Option<PartBuilder>,
}

impl Parser {
    fn new(fallback_id: &str) -> Self {
        Self {
            fallback_id: fallback_id.to_string(),
            parts: Vec::new(),
            current: None,
        }
    }

    fn line(&mut self, line: usize, raw: &str) -> Result<(), ParseError> {
        let text = raw.trim();
        match text.split_whitespace().next() {
            None => Ok(()),
            Some("0") => self.meta(line, text[1..].trim_start()),
            Some("1") => self.placement(line, text),
            Some(_) => {
                log::debug!("line {line}: skipping '{text}'");
                Ok(())
            }
        }
    }

    fn meta(&mut self, line: usize, body: &str) -> Result<(), ParseError> {
        if let Some(name) = keyword(body, "FILE") {
            if name.is_empty() {
                return Err(ParseError::MissingFileName { line });
            }
            self.finish_part();
            if self.parts.iter().any(|p| p.id == name) {
                return Err(ParseError::DuplicateFile {
                    line,
                    id: name.to_string(),
                });
            }
            self.current = Some(PartBuilder::new(name));
            return Ok(());
        }
        if keyword(body, "NOFILE").is_some() {
            self.finish_part();
            return Ok(());
        }

        let Some(part) = self.current_part(line) else {
            log::debug!("line {line}: meta line outside of a part");
            return Ok(());
        };

        if keyword(body, "STEP").is_some() {
            part.end_step(None);
        } else if let Some(args) = keyword(body, "ROTSTEP") {
            let rotation = parse_rotation(line, body, args)?;
            part.end_step(rotation);
        } else if let Some(name) = body.strip_prefix("Name:") {
            part.metadata.name = name.trim().to_string();
        } else if let Some(author) = body.strip_prefix("Author:") {
            part.metadata.author = author.trim().to_string();
        } else if let Some(license) = keyword(body, "!LICENSE") {
            part.metadata.license = license.to_string();
        } else if let Some(bfc) = keyword(body, "BFC") {
            match bfc {
                "INVERTNEXT" => part.invert_next = true,
                "NOCERTIFY" => {
                    part.metadata.certified_bfc = false;
                    part.metadata.ccw = false;
                }
                "CERTIFY" | "CERTIFY CCW" => {
                    part.metadata.certified_bfc = true;
                    part.metadata.ccw = true;
                }
                "CERTIFY CW" => {
                    part.metadata.certified_bfc = true;
                    part.metadata.ccw = false;
                }
                other => log::debug!("line {line}: ignoring BFC statement '{other}'"),
            }
        } else if part.in_header && part.metadata.description.is_empty() {
            part.metadata.description = body.to_string();
        } else {
            log::debug!("line {line}: ignoring meta line '{body}'");
        }
        Ok(())
    }

    fn placement(&mut self, line: usize, text: &str) -> Result<(), ParseError> {
        let fields: Vec<&str> = text.split_whitespace().collect();
        if fields.len() < 15 {
            return Err(ParseError::PlacementFields {
                line,
                found: fields.len(),
            });
        }
        let color: ColorId = parse_field(line, fields[1])?;
        let mut numbers = [0.0f64; 12];
        for (slot, field) in numbers.iter_mut().zip(&fields[2..14]) {
            *slot = parse_field(line, field)?;
        }
        let part_id = fields[14..].join(" ");

        let [x, y, z, a, b, c, d, e, f, g, h, i] = numbers;
        let mut placement = Placement::new(part_id)
            .with_color(color)
            .with_position(DVec3::new(x, y, z))
            .with_rotation(DMat3::from_cols_array(&[a, b, c, d, e, f, g, h, i]).transpose());

        let Some(part) = self.current_part(line) else {
            log::debug!("line {line}: placement outside of a part");
            return Ok(());
        };
        if std::mem::take(&mut part.invert_next) {
            placement = placement.inverted();
        }
        part.pending.placements.push(placement);
        part.in_header = false;
        Ok(())
    }

    /// The open part. Content before the first `FILE` line opens the implicit main model.
    fn current_part(&mut self, line: usize) -> Option<&mut PartBuilder> {
        if self.current.is_none() && self.parts.is_empty() {
            log::debug!(
                "line {line}: no FILE line, reading model as '{}'",
                self.fallback_id
            );
            self.current = Some(PartBuilder::new(self.fallback_id.clone()));
        }
        self.current.as_mut()
    }

    fn finish_part(&mut self) {
        if let Some(builder) = self.current.take() {
            self.parts.push(builder.build());
        }
    }

    fn finish(mut self) -> Result<Document, ParseError> {
        self.finish_part();
        let mut parts = self.parts.into_iter();
        let main = parts.next().ok_or(ParseError::Empty)?;

        let mut document = Document::new(main);
        for part in parts {
            document.insert_part(part)?;
        }

        let undefined: HashSet<String> = document
            .parts()
            .flat_map(|p| p.steps.iter())
            .flat_map(|s| s.placements.iter())
            .filter(|p| !document.contains_part(&p.part_id))
            .map(|p| p.part_id.clone())
            .collect();
        for id in undefined {
            document.insert_part(Part::leaf(id))?;
        }

        document.validate()?;
        log::debug!(
            "Parsed '{}' with {} parts",
            document.main_model_id(),
            document.part_count()
        );
        Ok(document)
    }
}

/// The rest of `body` if it starts with the word `word`.
fn keyword<'a>(body: &'a str, word: &str) -> Option<&'a str> {
    let rest = body.strip_prefix(word)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

fn parse_field<T: std::str::FromStr>(line: usize, field: &str) -> Result<T, ParseError> {
    field.parse().map_err(|_| ParseError::InvalidNumber {
        line,
        value: field.to_string(),
    })
}

fn parse_rotation(
    line: usize,
    body: &str,
    args: &str,
) -> Result<Option<StepRotation>, ParseError> {
    let fields: Vec<&str> = args.split_whitespace().collect();
    let invalid = || ParseError::InvalidRotation {
        line,
        text: format!("0 {body}"),
    };
    match fields.as_slice() {
        ["END"] => Ok(None),
        [x, y, z, rest @ ..] => {
            let kind = match rest {
                [] | ["REL"] => RotationKind::Relative,
                ["ABS"] => RotationKind::Absolute,
                _ => return Err(invalid()),
            };
            Ok(Some(StepRotation::new(
                parse_field(line, x)?,
                parse_field(line, y)?,
                parse_field(line, z)?,
                kind,
            )))
        }
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_model_without_file_line() {
        let text = "0 A small wall\n0 Name: wall.ldr\n1 4 0 0 0 1 0 0 0 1 0 0 0 1 3001.dat\n0 STEP\n1 1 0 -24 0 1 0 0 0 1 0 0 0 1 3001.dat\n";

        let document = parse_document(text, "wall.ldr").unwrap();

        let main = document.main_model().unwrap();
        assert_eq!(main.id, "wall.ldr");
        assert_eq!(main.metadata.description, "A small wall");
        assert_eq!(main.steps.len(), 2);
        assert_eq!(main.steps[1].placements[0].position, DVec3::new(0.0, -24.0, 0.0));
        assert!(document.part("3001.dat").unwrap().is_leaf);
    }

    #[test]
    fn test_matrix_is_read_row_major() {
        let text = "1 16 0 0 0 1 2 3 4 5 6 7 8 9 3001.dat\n";

        let document = parse_document(text, "m.ldr").unwrap();

        let rotation = document.main_model().unwrap().steps[0].placements[0].rotation;
        assert_eq!(rotation.row(0), DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(rotation.row(2), DVec3::new(7.0, 8.0, 9.0));
    }

    #[test]
    fn test_rotstep_variants() {
        let text = "0 FILE m.ldr\n0 ROTSTEP 10 20 30 ABS\n0 ROTSTEP 0 45 0\n0 ROTSTEP END\n0 NOFILE\n";

        let document = parse_document(text, "unused").unwrap();

        let rotations: Vec<_> = document
            .main_model()
            .unwrap()
            .steps
            .iter()
            .map(|s| s.rotation)
            .collect();
        assert_eq!(
            rotations,
            vec![
                Some(StepRotation::new(10.0, 20.0, 30.0, RotationKind::Absolute)),
                Some(StepRotation::new(0.0, 45.0, 0.0, RotationKind::Relative)),
                None,
            ]
        );
    }

    #[test]
    fn test_invertnext_applies_to_next_placement_only() {
        let text = "0 BFC INVERTNEXT\n1 16 0 0 0 1 0 0 0 1 0 0 0 1 a.dat\n1 16 0 0 0 1 0 0 0 1 0 0 0 1 b.dat\n";

        let document = parse_document(text, "m.ldr").unwrap();

        let placements = &document.main_model().unwrap().steps[0].placements;
        assert!(placements[0].invert_normals);
        assert!(!placements[1].invert_normals);
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        let err = parse_document("0 FILE m.ldr\n1 16 0 0 0 1 0 0 0 1 0 0 0 1\n", "m").unwrap_err();
        assert_eq!(
            err.to_string(),
            "line 2: placement needs at least 15 fields, found 14"
        );

        let err = parse_document("1 x 0 0 0 1 0 0 0 1 0 0 0 1 a.dat\n", "m").unwrap_err();
        assert_eq!(err.to_string(), "line 1: invalid number 'x'");

        let err = parse_document("0 ROTSTEP 1 2\n", "m").unwrap_err();
        assert!(matches!(err, ParseError::InvalidRotation { line: 1, .. }));

        assert!(matches!(parse_document("\n\n", "m"), Err(ParseError::Empty)));
    }

    #[test]
    fn test_duplicate_and_cyclic_files_are_rejected() {
        let duplicate = "0 FILE a.ldr\n0 NOFILE\n0 FILE a.ldr\n0 NOFILE\n";
        assert!(matches!(
            parse_document(duplicate, "m"),
            Err(ParseError::DuplicateFile { line: 3, .. })
        ));

        let cyclic = "0 FILE a.ldr\n1 16 0 0 0 1 0 0 0 1 0 0 0 1 b.ldr\n0 NOFILE\n0 FILE b.ldr\n1 16 0 0 0 1 0 0 0 1 0 0 0 1 a.ldr\n0 NOFILE\n";
        assert!(matches!(
            parse_document(cyclic, "m"),
            Err(ParseError::Document(_))
        ));
    }
}
