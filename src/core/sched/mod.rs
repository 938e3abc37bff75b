//! Scheduler module
//!
//! Priority selection with aging over the ready ring, and the dispatcher
//! that drives it.

mod dispatcher;

use crate::queue::{Linked, Ring};
use crate::types::Priority;

/// A ready-queue member the scheduler can rank
pub trait SchedEntity: Linked {
    /// User-set baseline priority
    fn static_prio(&self) -> Priority;
    /// Aging-adjusted priority used for selection
    fn dynamic_prio(&self) -> Priority;
    fn set_dynamic_prio(&mut self, prio: Priority);
}

/// Choose the next task to run
///
/// Walks the ring once from its head. Every visited task ages by one as
/// the walk passes it, and the task with the lowest dynamic priority wins;
/// ties go to the first one met in queue order. The winner's dynamic
/// priority is then reset to its static priority.
///
/// Because aging is applied while walking, the incumbent has already been
/// decremented when a later candidate is compared against it. Both sides
/// of every comparison carry the same single decrement, so the ranking is
/// that of the values seen on entry.
///
/// Membership is left untouched; the caller removes the winner.
pub fn pick<T: SchedEntity>(ready: &Ring, nodes: &mut [T]) -> Option<usize> {
    let head = ready.head()?;
    let mut best = head;
    let mut cursor = head;

    loop {
        let node = nodes.get_mut(cursor)?;
        let aged = node.dynamic_prio().saturating_sub(1);
        node.set_dynamic_prio(aged);

        if cursor != best && aged < nodes[best].dynamic_prio() {
            best = cursor;
        }

        match nodes[cursor].links().next() {
            Some(next) if next != head => cursor = next,
            _ => break,
        }
    }

    let winner = &mut nodes[best];
    winner.set_dynamic_prio(winner.static_prio());

    Some(best)
}
