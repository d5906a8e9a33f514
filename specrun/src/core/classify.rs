//! Per-run decision for each block a run encounters.

use crate::core::path::SpecPath;

/// What the current run does with one encountered block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Run the block's body now.
    Execute,
    /// Leave the body unvisited and report it for a dedicated later run.
    Postpone,
    /// Leave the body unvisited; some other run covers it.
    Skip,
}

/// Decide what to do with the block at `path` while running toward
/// `target`.
///
/// Blocks on the route to the target execute, as does the first child of
/// any block first discovered beyond the target (the run keeps diving so
/// a fresh subtree yields more than one level per run). Later children
/// beyond the target are postponed. `ancestor_fatal` reports a fatal error
/// on the enclosing block; nothing below it executes or gets postponed in
/// this run.
pub fn decide(path: &SpecPath, target: &SpecPath, ancestor_fatal: bool) -> Decision {
    if ancestor_fatal {
        Decision::Skip
    } else if path.is_on(target) {
        Decision::Execute
    } else if path.is_beyond(target) && path.last_index() == Some(0) {
        Decision::Execute
    } else if path.is_beyond(target) {
        Decision::Postpone
    } else {
        Decision::Skip
    }
}
