//! Intrusive circular queue
//!
//! A ring is a doubly-linked cycle threaded through nodes that live in a
//! slice (the runtime's task table). Links are slice indices, not
//! references, so a node can move between rings without any ownership
//! transfer. A node whose links are set is a member of some ring, and every
//! ring refuses to take it until it has been removed from that ring.

use crate::error::{QueueError, QueueResult};

/// Per-node ring links
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Links {
    next: Option<usize>,
    prev: Option<usize>,
}

impl Links {
    /// Unlinked node
    pub const fn new() -> Self {
        Links { next: None, prev: None }
    }

    /// Check if the node belongs to a ring
    #[inline]
    pub fn is_linked(&self) -> bool {
        self.next.is_some() || self.prev.is_some()
    }

    /// Next node in ring order
    #[inline]
    pub fn next(&self) -> Option<usize> {
        self.next
    }

    /// Previous node in ring order
    #[inline]
    pub fn prev(&self) -> Option<usize> {
        self.prev
    }

    #[inline]
    fn clear(&mut self) {
        self.next = None;
        self.prev = None;
    }
}

/// A node that can be threaded into a [`Ring`]
pub trait Linked {
    fn links(&self) -> &Links;
    fn links_mut(&mut self) -> &mut Links;
}

/// Circular doubly-linked queue
///
/// Only the head index is stored here. Appends go in front of the head,
/// which is the tail position, so elements leave in FIFO order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ring {
    head: Option<usize>,
}

impl Ring {
    /// Create a new empty ring
    pub const fn new() -> Self {
        Ring { head: None }
    }

    /// Get the first element
    #[inline]
    pub fn head(&self) -> Option<usize> {
        self.head
    }

    /// Check if ring is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Count linked elements by walking the ring once
    pub fn size<T: Linked>(&self, nodes: &[T]) -> usize {
        self.iter(nodes).count()
    }

    /// Indices in ring order, starting at the head
    pub fn iter<'a, T: Linked>(&self, nodes: &'a [T]) -> RingIter<'a, T> {
        RingIter {
            nodes,
            head: self.head,
            cursor: self.head,
        }
    }

    /// Check if `elem` is linked into this ring
    pub fn contains<T: Linked>(&self, nodes: &[T], elem: usize) -> bool {
        self.iter(nodes).any(|idx| idx == elem)
    }

    /// Insert `elem` at the tail
    ///
    /// The first append into an empty ring makes `elem` the head of a
    /// single-node cycle.
    pub fn append<T: Linked>(&mut self, nodes: &mut [T], elem: usize) -> QueueResult<()> {
        if elem >= nodes.len() {
            return Err(QueueError::NullElem);
        }

        if nodes[elem].links().is_linked() {
            return Err(QueueError::AlreadyMember);
        }

        match self.head {
            None => {
                let links = nodes[elem].links_mut();
                links.next = Some(elem);
                links.prev = Some(elem);
                self.head = Some(elem);
            }
            Some(head) => {
                let tail = nodes[head].links().prev.unwrap_or(head);

                let links = nodes[elem].links_mut();
                links.next = Some(head);
                links.prev = Some(tail);

                nodes[tail].links_mut().next = Some(elem);
                nodes[head].links_mut().prev = Some(elem);
            }
        }

        Ok(())
    }

    /// Unlink `elem` from this ring
    ///
    /// Removing the head advances the head to the removed element's
    /// successor. On success both of `elem`'s links are cleared.
    pub fn remove<T: Linked>(&mut self, nodes: &mut [T], elem: usize) -> QueueResult<()> {
        let head = self.head.ok_or(QueueError::EmptyQueue)?;

        if elem >= nodes.len() {
            return Err(QueueError::NullElem);
        }

        // Single-node ring
        if nodes[head].links().next == Some(head) {
            if head != elem {
                return Err(QueueError::NotFound);
            }
            nodes[elem].links_mut().clear();
            self.head = None;
            return Ok(());
        }

        if !self.contains(nodes, elem) {
            return Err(QueueError::NotFound);
        }

        let Links { next, prev } = *nodes[elem].links();
        let (next, prev) = match (next, prev) {
            (Some(next), Some(prev)) => (next, prev),
            _ => return Err(QueueError::NotFound),
        };

        nodes[prev].links_mut().next = Some(next);
        nodes[next].links_mut().prev = Some(prev);

        if head == elem {
            self.head = Some(next);
        }

        nodes[elem].links_mut().clear();

        Ok(())
    }

    /// Unlink and return the head
    pub fn pop_front<T: Linked>(&mut self, nodes: &mut [T]) -> Option<usize> {
        let head = self.head?;
        self.remove(nodes, head).ok()?;
        Some(head)
    }
}

/// Iterator over ring indices in queue order
pub struct RingIter<'a, T> {
    nodes: &'a [T],
    head: Option<usize>,
    cursor: Option<usize>,
}

impl<T: Linked> Iterator for RingIter<'_, T> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.cursor?;
        let next = self.nodes.get(current).and_then(|node| node.links().next);

        // Stop when the walk closes the cycle or hits a broken link
        self.cursor = match next {
            Some(next) if Some(next) != self.head => Some(next),
            _ => None,
        };

        Some(current)
    }
}
