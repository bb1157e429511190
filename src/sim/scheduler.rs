//! Virtual-clock task scheduler
//!
//! Deferred transitions and periodic ticks are plain data entries ordered by
//! `(due, seq)`. Nothing runs on its own: the session pops due entries while
//! advancing the clock, so tests control time completely.

use super::state::Step;

/// Cancellation token for a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

#[derive(Debug, Clone)]
struct Entry<T> {
    id: TaskId,
    /// Fire time (ms)
    due: u64,
    /// Scheduling order, breaks ties between equal due times
    seq: u64,
    /// Step whose engine scheduled this; teardown cancels by owner
    owner: Step,
    /// Repeat period for periodic tasks
    period: Option<u64>,
    task: T,
}

/// A task that came due
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<T> {
    pub id: TaskId,
    pub at: u64,
    pub owner: Step,
    pub task: T,
}

#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    now: u64,
    next_id: u64,
    next_seq: u64,
    /// Sorted by (due, seq)
    entries: Vec<Entry<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            now: 0,
            next_id: 1,
            next_seq: 0,
            entries: Vec::new(),
        }
    }
}

impl<T: Clone> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time (ms)
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Run `task` once, `delay` ms from now
    pub fn schedule(&mut self, owner: Step, delay: u64, task: T) -> TaskId {
        self.insert(owner, self.now + delay, None, task)
    }

    /// Run `task` first after `delay` ms, then every `period` ms until cancelled
    pub fn schedule_repeating(&mut self, owner: Step, delay: u64, period: u64, task: T) -> TaskId {
        self.insert(owner, self.now + delay, Some(period.max(1)), task)
    }

    fn insert(&mut self, owner: Step, due: u64, period: Option<u64>, task: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.push(Entry {
            id,
            due,
            seq: 0,
            owner,
            period,
            task,
        });
        id
    }

    fn push(&mut self, mut entry: Entry<T>) {
        entry.seq = self.next_seq;
        self.next_seq += 1;
        let key = (entry.due, entry.seq);
        let at = self.entries.partition_point(|e| (e.due, e.seq) <= key);
        self.entries.insert(at, entry);
    }

    /// Cancel one task. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Cancel every task scheduled by `owner`'s engine
    pub fn cancel_owned_by(&mut self, owner: Step) -> usize {
        self.cancel_where(|entry_owner, _| entry_owner == owner)
    }

    /// Cancel every task matching the predicate
    pub fn cancel_where(&mut self, mut pred: impl FnMut(Step, &T) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !pred(e.owner, &e.task));
        before - self.entries.len()
    }

    /// Drop every pending task
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_pending(&self, id: TaskId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn pending_count(&self) -> usize {
        self.entries.len()
    }

    /// Pending tasks in firing order, with their due times
    pub fn pending(&self) -> impl Iterator<Item = (u64, &T)> {
        self.entries.iter().map(|e| (e.due, &e.task))
    }

    /// Due time of the next task, if any
    pub fn next_due(&self) -> Option<u64> {
        self.entries.first().map(|e| e.due)
    }

    /// Pop the earliest task due at or before `until`, moving the clock to it.
    /// Periodic tasks are re-armed one period later.
    pub fn pop_due(&mut self, until: u64) -> Option<Fired<T>> {
        if self.entries.first()?.due > until {
            return None;
        }
        let entry = self.entries.remove(0);
        self.now = self.now.max(entry.due);

        let fired = Fired {
            id: entry.id,
            at: entry.due,
            owner: entry.owner,
            task: entry.task.clone(),
        };

        if let Some(period) = entry.period {
            self.push(Entry {
                due: entry.due + period,
                ..entry
            });
        }

        Some(fired)
    }

    /// Move the clock forward without firing anything (never backwards)
    pub fn advance_clock_to(&mut self, t: u64) {
        self.now = self.now.max(t);
    }
}
