//! Removal of a part from every step that places it.

use crate::Document;
use std::collections::HashSet;

/// Outcome of [`purge_part`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeReport {
    /// Number of placements removed.
    pub removed_placements: usize,
    /// Parts whose steps were scanned.
    pub visited_parts: usize,
    /// Whether the part definition was dropped from the registry.
    pub definition_removed: bool,
}

/// Remove every placement of `part_id` reachable from the main model.
///
/// Each part is scanned once even when it is shared by several assemblies. When nothing
/// references `part_id` afterwards, its definition is removed from the registry (the main model
/// is never removed).
pub fn purge_part(document: &mut Document, part_id: &str) -> PurgeReport {
    let mut report = PurgeReport::default();
    let mut visited: HashSet<String> = HashSet::new();
    let mut pending = vec![document.main_model_id().to_string()];

    while let Some(id) = pending.pop() {
        if !visited.insert(id.clone()) {
            log::debug!("Purge of '{part_id}' already visited '{id}'");
            continue;
        }
        let Some(part) = document.part_mut(&id) else {
            continue;
        };
        if part.is_leaf {
            continue;
        }
        report.visited_parts += 1;

        for step in &mut part.steps {
            let before = step.placements.len();
            step.placements.retain(|p| p.part_id != part_id);
            report.removed_placements += before - step.placements.len();
        }

        let children: Vec<String> = part
            .steps
            .iter()
            .flat_map(|s| s.placements.iter())
            .filter(|p| !visited.contains(&p.part_id))
            .map(|p| p.part_id.clone())
            .collect();
        pending.extend(children);
    }

    if !document.is_referenced(part_id) {
        report.definition_removed = document.remove_part(part_id).is_some();
    }

    log::info!(
        "Purged '{}': {} placements removed from {} parts",
        part_id,
        report.removed_placements,
        report.visited_parts
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Part, Placement, Step};

    fn shared_document() -> Document {
        // main -> a, b; a -> shared, b -> shared; shared -> gone
        let main = Part::assembly(
            "main.ldr",
            vec![
                Step::new(vec![Placement::new("a.ldr"), Placement::new("gone.ldr")]),
                Step::new(vec![Placement::new("b.ldr")]),
            ],
        );
        let a = Part::assembly("a.ldr", vec![Step::new(vec![Placement::new("shared.ldr")])]);
        let b = Part::assembly("b.ldr", vec![Step::new(vec![Placement::new("shared.ldr")])]);
        let shared = Part::assembly(
            "shared.ldr",
            vec![Step::new(vec![
                Placement::new("gone.ldr"),
                Placement::new("3001.dat"),
            ])],
        );
        let gone = Part::assembly("gone.ldr", vec![Step::new(vec![Placement::new("3001.dat")])]);
        Document::with_parts(main, [a, b, shared, gone, Part::leaf("3001.dat")]).unwrap()
    }

    #[test]
    fn test_purge_visits_shared_parts_once() {
        let mut document = shared_document();

        let report = purge_part(&mut document, "gone.ldr");

        assert_eq!(report.removed_placements, 2);
        // main, a, b, shared; gone itself is only reached through removed placements.
        assert_eq!(report.visited_parts, 4);
        assert!(report.definition_removed);
        assert!(!document.contains_part("gone.ldr"));
        assert!(!document.is_referenced("gone.ldr"));
        assert!(document.validate().is_ok());
    }

    #[test]
    fn test_purge_leaves_leaf_parts_untouched() {
        let mut document = shared_document();

        purge_part(&mut document, "shared.ldr");

        assert!(document.contains_part("3001.dat"));
        assert!(document.part("a.ldr").unwrap().steps[0].is_empty());
        assert!(document.part("gone.ldr").is_some());
    }

    #[test]
    fn test_purge_keeps_definition_of_unreachable_reference() {
        let mut document = shared_document();
        document
            .insert_part(Part::assembly(
                "orphan.ldr",
                vec![Step::new(vec![Placement::new("gone.ldr")])],
            ))
            .unwrap();

        let report = purge_part(&mut document, "gone.ldr");

        assert!(!report.definition_removed);
        assert!(document.contains_part("gone.ldr"));
    }
}
