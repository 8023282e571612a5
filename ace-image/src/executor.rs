//! Marshalling decode completions back to the owning thread.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// A unit of work posted to the owning thread.
pub type UiTask = Box<dyn FnOnce() + Send + 'static>;

/// Runs completion callbacks on the thread that owns the loading contexts.
pub trait UiTaskExecutor: Send + Sync + 'static {
    /// Schedule `task`. Tasks run in the order they were posted.
    fn post(&self, task: UiTask);
}

/// Runs tasks immediately on the posting thread.
///
/// For hosts without a UI loop; callbacks then arrive on decode worker
/// threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

impl UiTaskExecutor for InlineExecutor {
    fn post(&self, task: UiTask) {
        task();
    }
}

/// Queues tasks until the owner drains them with
/// [`run_pending`](Self::run_pending).
#[derive(Default)]
pub struct QueuedExecutor {
    queue: Mutex<VecDeque<UiTask>>,
}

impl QueuedExecutor {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued tasks.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Run queued tasks until the queue is empty, including tasks posted by
    /// the tasks themselves. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = self
                .queue
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front();
            let Some(task) = next else {
                return ran;
            };
            task();
            ran += 1;
        }
    }
}

impl UiTaskExecutor for QueuedExecutor {
    fn post(&self, task: UiTask) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(task);
    }
}

impl std::fmt::Debug for QueuedExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuedExecutor")
            .field("pending", &self.pending())
            .finish()
    }
}
