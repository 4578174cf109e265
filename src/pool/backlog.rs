//! # Global overflow queue.
//!
//! [`Backlog`] holds tasks that could not be placed on any slot at
//! submission time: every slot was at capacity and the pool was at its
//! worker ceiling.
//!
//! ## Rules
//! - Strict FIFO: tasks leave in submission order, never reordered.
//! - Unbounded: the pool never rejects a task for being unroutable;
//!   bounding the backlog is the caller's responsibility.

use std::collections::VecDeque;

use super::slot::Pending;

/// Submission-ordered FIFO of tasks awaiting slot capacity.
#[derive(Default)]
pub(crate) struct Backlog {
    queue: VecDeque<Pending>,
}

impl Backlog {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Appends a task behind every previously backlogged task.
    pub fn push(&mut self, task: Pending) {
        self.queue.push_back(task);
    }

    /// Removes and returns the oldest backlogged task.
    pub fn pop(&mut self) -> Option<Pending> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
