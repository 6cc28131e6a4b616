//! Deferred task queue.
//!
//! Work that should run once the current event has been fully handled (for
//! example a UI refresh after a selection change) is posted here. The host
//! drains the queue at the end of its event turn with
//! [`TaskQueue::process_all`].

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::logging::targets;

/// Handle to a posted task, usable with [`TaskQueue::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl TaskId {
    /// The raw id.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

fn next_task_id() -> TaskId {
    TaskId(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
}

type BoxedTask = Box<dyn FnOnce() + Send + 'static>;

struct TaskData {
    id: TaskId,
    task: BoxedTask,
}

struct QueueState {
    tasks: VecDeque<TaskData>,
    batch_size: usize,
}

/// A FIFO of deferred closures.
///
/// The queue is shared by reference (usually behind an `Arc`). The internal
/// lock is never held while a task runs, so tasks may post further tasks; those
/// run in the same [`process_all`](Self::process_all) call.
pub struct TaskQueue {
    inner: Mutex<QueueState>,
}

impl TaskQueue {
    /// Creates an empty queue that processes ten tasks per batch.
    pub fn new() -> Self {
        Self::with_batch_size(10)
    }

    /// Creates an empty queue with the given batch size.
    pub fn with_batch_size(batch_size: usize) -> Self {
        Self {
            inner: Mutex::new(QueueState {
                tasks: VecDeque::new(),
                batch_size,
            }),
        }
    }

    /// Appends `task`; it runs the next time the queue is processed.
    pub fn post<F>(&self, task: F) -> TaskId
    where
        F: FnOnce() + Send + 'static,
    {
        let id = next_task_id();
        self.inner.lock().tasks.push_back(TaskData {
            id,
            task: Box::new(task),
        });
        id
    }

    /// Drops a task that has not run yet. Returns `false` if it already ran.
    pub fn cancel(&self, id: TaskId) -> bool {
        let mut state = self.inner.lock();
        if let Some(pos) = state.tasks.iter().position(|t| t.id == id) {
            state.tasks.remove(pos);
            true
        } else {
            false
        }
    }

    /// Whether any tasks are waiting.
    pub fn has_pending(&self) -> bool {
        !self.inner.lock().tasks.is_empty()
    }

    /// Get the number of pending tasks.
    pub fn pending_count(&self) -> usize {
        self.inner.lock().tasks.len()
    }

    /// Process up to `batch_size` tasks.
    ///
    /// Returns the number of tasks processed.
    pub fn process_batch(&self) -> usize {
        let batch_size = self.inner.lock().batch_size;
        let mut processed = 0;
        while processed < batch_size {
            let Some(task_data) = self.pop() else { break };
            (task_data.task)();
            processed += 1;
        }
        processed
    }

    /// Process all pending tasks, including any posted while processing.
    ///
    /// Returns the number of tasks processed.
    pub fn process_all(&self) -> usize {
        let mut processed = 0;
        while let Some(task_data) = self.pop() {
            (task_data.task)();
            processed += 1;
        }
        if processed > 0 {
            tracing::trace!(target: targets::TASK, processed, "drained deferred tasks");
        }
        processed
    }

    /// Set the batch size used by [`process_batch`](Self::process_batch).
    pub fn set_batch_size(&self, size: usize) {
        self.inner.lock().batch_size = size;
    }

    fn pop(&self) -> Option<TaskData> {
        self.inner.lock().tasks.pop_front()
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}
