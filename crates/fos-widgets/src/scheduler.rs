//! Deferred commands run at the end of the current turn.
//!
//! Nothing here blocks: scheduling only enqueues, and
//! [`WidgetTree::finish_turn`] drains the queue once the triggering work
//! has run to completion.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use crate::WidgetTree;

/// Work queued for the end of the turn
pub type DeferredCommand = Box<dyn FnOnce(&mut WidgetTree)>;

/// Handle to a scheduled command, used for cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

struct Entry {
    handle: TaskHandle,
    key: Option<&'static str>,
    command: DeferredCommand,
}

/// End-of-turn command queue with keyed coalescing
#[derive(Default)]
pub struct Scheduler {
    queue: VecDeque<Entry>,
    /// Handles scheduled but not yet started or cancelled
    pending: HashSet<TaskHandle>,
    /// Coalescing key -> the pending handle owning it
    coalesced: HashMap<&'static str, TaskHandle>,
    next_id: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn enqueue(&mut self, key: Option<&'static str>, command: DeferredCommand) -> TaskHandle {
        let handle = TaskHandle(self.next_id);
        self.next_id += 1;
        self.pending.insert(handle);
        if let Some(key) = key {
            self.coalesced.insert(key, handle);
        }
        self.queue.push_back(Entry { handle, key, command });
        handle
    }

    /// Queue a command for the end of the current turn
    pub fn schedule_deferred<F>(&mut self, command: F) -> TaskHandle
    where
        F: FnOnce(&mut WidgetTree) + 'static,
    {
        self.enqueue(None, Box::new(command))
    }

    /// Queue a command unless one with the same key is already pending,
    /// in which case the pending handle is returned and `command` dropped.
    pub fn schedule_coalesced<F>(&mut self, key: &'static str, command: F) -> TaskHandle
    where
        F: FnOnce(&mut WidgetTree) + 'static,
    {
        if let Some(&handle) = self.coalesced.get(key) {
            return handle;
        }
        self.enqueue(Some(key), Box::new(command))
    }

    /// Cancel a command that has not started. Returns false if it already
    /// ran, is running, or was cancelled before.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        if !self.pending.remove(&handle) {
            return false;
        }
        self.coalesced.retain(|_, h| *h != handle);
        true
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.pending.contains(&handle)
    }

    /// Number of commands still waiting to run
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn take_batch(&mut self) -> Vec<Entry> {
        self.queue.drain(..).collect()
    }

    /// Mark an entry as started; `None` if it was cancelled meanwhile.
    fn begin(&mut self, entry: Entry) -> Option<(TaskHandle, DeferredCommand)> {
        if !self.pending.remove(&entry.handle) {
            return None;
        }
        if let Some(key) = entry.key {
            if self.coalesced.get(key) == Some(&entry.handle) {
                self.coalesced.remove(key);
            }
        }
        Some((entry.handle, entry.command))
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("queued", &self.queue.len())
            .field("pending", &self.pending.len())
            .field("coalesced", &self.coalesced.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl WidgetTree {
    /// Run every deferred command queued so far.
    ///
    /// Commands scheduled while the queue drains run in a later round of
    /// the same call, up to `Config::max_deferred_rounds` rounds. Returns
    /// the number of commands executed.
    pub fn finish_turn(&mut self) -> usize {
        let mut executed = 0;
        for _ in 0..self.config().max_deferred_rounds {
            let batch = self.scheduler.take_batch();
            if batch.is_empty() {
                return executed;
            }
            for entry in batch {
                if let Some((handle, command)) = self.scheduler.begin(entry) {
                    tracing::trace!("Running deferred command {:?}", handle);
                    command(self);
                    executed += 1;
                }
            }
        }
        if self.scheduler.pending_count() > 0 {
            tracing::warn!(
                "Deferred round limit reached, {} command(s) left for the next turn",
                self.scheduler.pending_count()
            );
        }
        executed
    }
}
