//! Cursor deltas for structural edits.
//!
//! An edit changes the steps of one part, but that part may be placed many times along the
//! flattened document. Every complete instance of the part before the cursor grows or shrinks by
//! the same amount, and within the instance holding the cursor the cursor has to land on a
//! specific step of the edited part.
//!
//! [`cursor_delta`] computes the resulting shift of the global index from a [`DeltaContext`]
//! without touching the document, so the arithmetic can be tested on its own.
//!
//! Layouts are per-step counts of the steps contributed by nested assemblies (see
//! [`crate::StepHandler::layout`]); a step with a layout entry `n` occupies `n + 1` flattened
//! positions.

/// Where the cursor lands inside the edited part, in post-edit step indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Landing {
    /// The step itself, after the steps of the assemblies it places.
    Step(usize),
    /// The first flattened position of the step. An index equal to the step count means the
    /// position right after the part's last step.
    StepStart(usize),
    /// The last step of the assemblies placed by the step (the placed part's own final step).
    LastNested(usize),
}

impl Landing {
    /// Offset of the landing position from the start of the part's flattened range.
    pub fn offset(self, layout: &[usize]) -> usize {
        let prefix = |index: usize| -> usize {
            layout[..index.min(layout.len())]
                .iter()
                .map(|nested| nested + 1)
                .sum()
        };
        let nested_at = |index: usize| layout.get(index).copied().unwrap_or(0);
        match self {
            Landing::Step(index) => prefix(index) + nested_at(index),
            Landing::StepStart(index) => prefix(index),
            Landing::LastNested(index) => prefix(index) + nested_at(index).saturating_sub(1),
        }
    }
}

/// Inputs of [`cursor_delta`].
#[derive(Debug, Clone, Copy)]
pub struct DeltaContext<'a> {
    /// Complete instances of the edited part preceding the cursor.
    pub usages: usize,
    /// Layout of the edited part before the edit.
    pub before: &'a [usize],
    /// Layout of the edited part after the edit.
    pub after: &'a [usize],
    /// Step of the edited part the cursor was on before the edit.
    pub from: usize,
    /// Where the cursor should land after the edit.
    pub landing: Landing,
}

/// Total flattened steps of a part with the given layout.
pub fn flattened_total(layout: &[usize]) -> usize {
    layout.iter().map(|nested| nested + 1).sum()
}

/// Shift of the global cursor index caused by an edit.
pub fn cursor_delta(ctx: &DeltaContext<'_>) -> isize {
    let grown = flattened_total(ctx.after) as isize - flattened_total(ctx.before) as isize;
    let from = Landing::Step(ctx.from).offset(ctx.before) as isize;
    let to = ctx.landing.offset(ctx.after) as isize;
    ctx.usages as isize * grown + to - from
}

/// Apply a delta to a global index, saturating at zero.
pub fn apply_delta(index: usize, delta: isize) -> usize {
    index.saturating_add_signed(delta)
}
