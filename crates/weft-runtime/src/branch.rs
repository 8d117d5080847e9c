//! Branch bookkeeping for conditional nodes.
//!
//! A conditional node's output slots decide which downstream branches
//! run: a slot that carries data is active, an empty slot is dead. The
//! driver stashes each active slot under a synthetic context key and
//! runs each branch's downstream closure on its own queue, seeded with
//! that slot as input — so a branch only ever sees its own data.

use weft_workflow::OutputSlots;

/// Marker that keeps stash keys out of the node namespace.
const STASH_MARKER: char = '#';

/// Output indices that carry data, ascending. Branch enumeration order
/// is part of the replayed history, so this order is fixed.
pub(crate) fn active_outputs(slots: &OutputSlots) -> Vec<usize> {
  slots
    .iter()
    .enumerate()
    .filter(|(_, slot)| !slot.is_empty())
    .map(|(index, _)| index)
    .collect()
}

/// Synthetic context key holding one branch's input slice. Never a
/// legal node name; run-data collection drops it.
pub(crate) fn stash_key(node: &str, output_index: usize) -> String {
  format!("{node}{STASH_MARKER}branch:{output_index}")
}
