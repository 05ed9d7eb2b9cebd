//! Dependency discovery as a bounded fixed point.
//!
//! Each pass processes the type names referenced by the previous pass's
//! headers that have not been attempted yet. The loop ends when a pass
//! discovers nothing new, or at the pass limit.

use crate::types::ScriptName;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    pub passes: usize,
    pub capped: bool,
    /// Names still unprocessed when the limit was hit.
    pub pending: BTreeSet<ScriptName>,
}

/// Run `step` over each new frontier.
///
/// `step` processes a batch of names and returns the names their headers
/// reference. Names in `attempted` are never handed to `step` again.
pub fn fixed_point<F>(
    attempted: &mut BTreeSet<ScriptName>,
    references: BTreeSet<ScriptName>,
    max_passes: usize,
    mut step: F,
) -> Discovery
where
    F: FnMut(&BTreeSet<ScriptName>) -> BTreeSet<ScriptName>,
{
    let mut frontier: BTreeSet<ScriptName> = references.difference(attempted).cloned().collect();
    let mut passes = 0;

    while !frontier.is_empty() {
        if passes >= max_passes {
            log::warn!(
                "Dependency discovery stopped after {passes} passes with {} names pending",
                frontier.len()
            );
            return Discovery {
                passes,
                capped: true,
                pending: frontier,
            };
        }

        passes += 1;
        log::info!("Discovery pass {passes}: {} new names", frontier.len());
        attempted.extend(frontier.iter().cloned());

        let found = step(&frontier);
        frontier = found.difference(attempted).cloned().collect();
    }

    Discovery {
        passes,
        capped: false,
        pending: BTreeSet::new(),
    }
}
