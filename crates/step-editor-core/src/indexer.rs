//! Position indexer and navigation cursor.
//!
//! # Overview
//!
//! The document is a tree: steps place parts, and non-leaf parts have steps of their own. To give
//! "step N of the whole document" a meaning, the tree is flattened depth-first. For every step,
//! the steps of each nested assembly it places come first (in placement order), followed by the
//! step itself:
//!
//! ```text
//! main.ldr  step 0 places sub.ldr (3 steps)   ->  0 1 2 (sub.ldr)  3 (main step 0)
//!           step 1 places bricks only         ->  4
//! ```
//!
//! A [`StepHandler`] mirrors the placement tree with one handler per placed assembly and tracks
//! where the cursor is. Handlers are cheap to build and are rebuilt wholesale after every edit.

use crate::{Document, Step};
use std::collections::{HashMap, HashSet};

/// Direction used by adjacency queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards later steps.
    Next,
    /// Towards earlier steps.
    Previous,
}

/// One level of the cursor path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorFrame {
    /// Part whose steps are being traversed at this level.
    pub part_id: String,
    /// Current step index within that part.
    pub step: usize,
    /// Placement index of the nested assembly the cursor descended into, if any.
    pub placement: Option<usize>,
}

/// Handler for an assembly placed by a step.
#[derive(Debug, Clone)]
pub struct NestedHandler {
    /// Index of the placement within its step.
    pub placement: usize,
    /// Traversal state of the placed part.
    pub handler: StepHandler,
}

/// Traversal data for a single step.
#[derive(Debug, Clone, Default)]
pub struct HandlerStep {
    nested: Vec<NestedHandler>,
    nested_steps: usize,
}

impl HandlerStep {
    fn build(document: &Document, step: &Step, ancestors: &mut Vec<String>) -> Self {
        let mut nested = Vec::new();
        for (index, placement) in step.placements.iter().enumerate() {
            if !document.is_assembly(&placement.part_id) {
                continue;
            }
            if ancestors.iter().any(|id| id == &placement.part_id) {
                log::warn!(
                    "Skipping cyclic placement of '{}' inside '{}'",
                    placement.part_id,
                    ancestors.last().map(String::as_str).unwrap_or_default()
                );
                continue;
            }
            nested.push(NestedHandler {
                placement: index,
                handler: StepHandler::build_part(document, &placement.part_id, ancestors),
            });
        }
        let nested_steps = nested.iter().map(|n| n.handler.total_steps).sum();
        Self {
            nested,
            nested_steps,
        }
    }

    /// Handlers of the assemblies placed in this step.
    pub fn nested(&self) -> &[NestedHandler] {
        &self.nested
    }

    /// Steps contributed by nested assemblies.
    pub fn nested_steps(&self) -> usize {
        self.nested_steps
    }

    /// Steps contributed by this step including its nested assemblies.
    pub fn flattened_len(&self) -> usize {
        self.nested_steps + 1
    }
}

/// Traversal handler for one placed instance of a part.
#[derive(Debug, Clone)]
pub struct StepHandler {
    part_id: String,
    current: usize,
    active: Option<usize>,
    steps: Vec<HandlerStep>,
    total_steps: usize,
}

impl StepHandler {
    /// Build the handler tree for the main model and place the cursor on the first step.
    pub fn new(document: &Document) -> Self {
        let mut handler = Self::build_part(document, document.main_model_id(), &mut Vec::new());
        handler.move_to(0);
        log::debug!(
            "Built step handlers for '{}': {} steps",
            handler.part_id,
            handler.total_steps
        );
        handler
    }

    fn build_part(document: &Document, part_id: &str, ancestors: &mut Vec<String>) -> Self {
        ancestors.push(part_id.to_string());
        let steps: Vec<HandlerStep> = document
            .part(part_id)
            .map(|part| {
                part.steps
                    .iter()
                    .map(|step| HandlerStep::build(document, step, ancestors))
                    .collect()
            })
            .unwrap_or_default();
        ancestors.pop();

        let total_steps = steps.iter().map(HandlerStep::flattened_len).sum();
        Self {
            part_id: part_id.to_string(),
            current: 0,
            active: None,
            steps,
            total_steps,
        }
    }

    /// The part traversed by this handler.
    pub fn part_id(&self) -> &str {
        &self.part_id
    }

    /// Current step index within this handler's part.
    pub fn current(&self) -> usize {
        self.current
    }

    /// Traversal data of every step.
    pub fn steps(&self) -> &[HandlerStep] {
        &self.steps
    }

    /// Total number of flattened steps of this handler's part.
    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    /// Per-step count of steps contributed by nested assemblies.
    pub fn layout(&self) -> Vec<usize> {
        self.steps.iter().map(HandlerStep::nested_steps).collect()
    }

    /// Global index of the cursor within this handler's flattened steps.
    pub fn global_index(&self) -> usize {
        let Some(step) = self.steps.get(self.current) else {
            return 0;
        };
        let before: usize = self.steps[..self.current]
            .iter()
            .map(HandlerStep::flattened_len)
            .sum();
        match self.active.and_then(|k| step.nested.get(k).map(|n| (k, n))) {
            Some((k, nested)) => {
                let skipped: usize = step.nested[..k]
                    .iter()
                    .map(|n| n.handler.total_steps)
                    .sum();
                before + skipped + nested.handler.global_index()
            }
            None => before + step.nested_steps,
        }
    }

    /// Move the cursor to a global index, clamped to the last step.
    pub fn move_to(&mut self, index: usize) {
        let mut remaining = index.min(self.total_steps.saturating_sub(1));
        self.current = 0;
        self.active = None;

        for (i, step) in self.steps.iter_mut().enumerate() {
            let len = step.flattened_len();
            if remaining >= len {
                remaining -= len;
                continue;
            }
            self.current = i;
            for (k, nested) in step.nested.iter_mut().enumerate() {
                if remaining < nested.handler.total_steps {
                    nested.handler.move_to(remaining);
                    self.active = Some(k);
                    return;
                }
                remaining -= nested.handler.total_steps;
            }
            return;
        }
    }

    /// The deepest handler on the cursor path.
    pub fn cursor(&self) -> &StepHandler {
        let mut handler = self;
        while let Some(next) = handler.active_nested() {
            handler = next;
        }
        handler
    }

    fn active_nested(&self) -> Option<&StepHandler> {
        let k = self.active?;
        self.steps
            .get(self.current)?
            .nested
            .get(k)
            .map(|n| &n.handler)
    }

    /// Part ID and step index of the step under the cursor.
    pub fn current_step(&self) -> Option<(&str, usize)> {
        let cursor = self.cursor();
        if cursor.steps.is_empty() {
            None
        } else {
            Some((cursor.part_id.as_str(), cursor.current))
        }
    }

    /// Frames from the root handler down to the cursor.
    pub fn cursor_path(&self) -> Vec<CursorFrame> {
        let mut frames = Vec::new();
        let mut handler = Some(self);
        while let Some(h) = handler {
            if h.steps.is_empty() {
                break;
            }
            let placement = h
                .active
                .and_then(|k| h.steps.get(h.current)?.nested.get(k))
                .map(|n| n.placement);
            frames.push(CursorFrame {
                part_id: h.part_id.clone(),
                step: h.current,
                placement,
            });
            handler = h.active_nested();
        }
        frames
    }

    /// Number of complete instances of `part_id` that precede the cursor.
    pub fn usage_count(&self, part_id: &str) -> usize {
        let mut count: usize = self.steps[..self.current.min(self.steps.len())]
            .iter()
            .flat_map(|s| s.nested.iter())
            .map(|n| n.handler.occurrences(part_id))
            .sum();

        if let Some(step) = self.steps.get(self.current) {
            match self.active.filter(|k| *k < step.nested.len()) {
                Some(k) => {
                    count += step.nested[..k]
                        .iter()
                        .map(|n| n.handler.occurrences(part_id))
                        .sum::<usize>();
                    count += step.nested[k].handler.usage_count(part_id);
                }
                None => {
                    count += step
                        .nested
                        .iter()
                        .map(|n| n.handler.occurrences(part_id))
                        .sum::<usize>();
                }
            }
        }
        count
    }

    fn occurrences(&self, part_id: &str) -> usize {
        if self.part_id == part_id {
            return 1;
        }
        self.steps
            .iter()
            .flat_map(|s| s.nested.iter())
            .map(|n| n.handler.occurrences(part_id))
            .sum()
    }

    /// Flattened size of the step next to (or before) the cursor's step.
    ///
    /// Returns 1 when there is no such step, as an empty one will be created.
    pub fn steps_inside_adjacent_step(&self, direction: Direction) -> usize {
        let cursor = self.cursor();
        let index = match direction {
            Direction::Next => Some(cursor.current + 1),
            Direction::Previous => cursor.current.checked_sub(1),
        };
        index
            .and_then(|i| cursor.steps.get(i))
            .map(HandlerStep::flattened_len)
            .unwrap_or(1)
    }

    /// Whether the cursor is on the first flattened step.
    pub fn is_at_first(&self) -> bool {
        self.global_index() == 0
    }

    /// Whether the cursor is on the last flattened step.
    pub fn is_at_last(&self) -> bool {
        self.global_index() + 1 >= self.total_steps
    }
}

/// Memoized flattened step counts computed directly from a [`Document`].
pub struct StepCounter<'a> {
    document: &'a Document,
    totals: HashMap<String, usize>,
    visiting: HashSet<String>,
}

impl<'a> StepCounter<'a> {
    /// Create a counter for `document`.
    pub fn new(document: &'a Document) -> Self {
        Self {
            document,
            totals: HashMap::new(),
            visiting: HashSet::new(),
        }
    }

    /// Total flattened steps of a part. Leaf and unknown parts count zero.
    pub fn total_steps(&mut self, part_id: &str) -> usize {
        if let Some(total) = self.totals.get(part_id) {
            return *total;
        }
        if !self.document.is_assembly(part_id) || !self.visiting.insert(part_id.to_string()) {
            return 0;
        }
        let total = self
            .layout(part_id)
            .iter()
            .map(|nested| nested + 1)
            .sum();
        self.visiting.remove(part_id);
        self.totals.insert(part_id.to_string(), total);
        total
    }

    /// Steps contributed by the assemblies placed in `step`.
    pub fn nested_steps(&mut self, step: &Step) -> usize {
        step.placements
            .iter()
            .map(|p| self.total_steps(&p.part_id))
            .sum()
    }

    /// Per-step nested counts of a part; empty for leaf and unknown parts.
    pub fn layout(&mut self, part_id: &str) -> Vec<usize> {
        let document = self.document;
        let Some(part) = document.part(part_id) else {
            return Vec::new();
        };
        part.steps.iter().map(|s| self.nested_steps(s)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Part, Placement};

    fn sample() -> Document {
        let main = Part::assembly(
            "main.ldr",
            vec![
                Step::new(vec![Placement::new("sub.ldr")]),
                Step::new(vec![Placement::new("3001.dat")]),
            ],
        );
        let sub = Part::assembly(
            "sub.ldr",
            vec![
                Step::new(vec![Placement::new("3001.dat")]),
                Step::new(vec![Placement::new("3001.dat")]),
                Step::new(vec![Placement::new("3001.dat")]),
            ],
        );
        Document::with_parts(main, [sub, Part::leaf("3001.dat")]).unwrap()
    }

    #[test]
    fn test_counter_matches_handler() {
        let document = sample();
        let handler = StepHandler::new(&document);
        let mut counter = StepCounter::new(&document);

        assert_eq!(counter.total_steps("main.ldr"), handler.total_steps());
        assert_eq!(counter.layout("main.ldr"), handler.layout());
        assert_eq!(counter.total_steps("3001.dat"), 0);
        assert_eq!(counter.layout("missing.ldr"), Vec::<usize>::new());
    }

    #[test]
    fn test_move_to_round_trips_every_index() {
        let document = sample();
        let mut handler = StepHandler::new(&document);

        for index in 0..handler.total_steps() {
            handler.move_to(index);
            assert_eq!(handler.global_index(), index);
        }
    }

    #[test]
    fn test_cursor_path_descends_into_nested_part() {
        let document = sample();
        let mut handler = StepHandler::new(&document);
        handler.move_to(1);

        let path = handler.cursor_path();
        assert_eq!(path.len(), 2);
        assert_eq!(path[0].part_id, "main.ldr");
        assert_eq!(path[0].placement, Some(0));
        assert_eq!(path[1].part_id, "sub.ldr");
        assert_eq!(path[1].step, 1);
        assert_eq!(path[1].placement, None);
    }

    #[test]
    fn test_move_to_clamps_past_end() {
        let document = sample();
        let mut handler = StepHandler::new(&document);
        handler.move_to(100);

        assert_eq!(handler.global_index(), 4);
        assert!(handler.is_at_last());
        assert_eq!(handler.current_step(), Some(("main.ldr", 1)));
    }
}
