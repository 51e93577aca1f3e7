//! Deterministic timed events.
//!
//! Events are keyed on simulation time rather than wall-clock timers, so the
//! frame loop decides when time advances and tests can jump straight to the
//! instant they care about.
//!
//! ```ignore
//! let mut scheduler = Scheduler::new();
//! scheduler.schedule_after(now, Duration::from_millis(500), Event::Fade);
//! // later, once per frame:
//! for (due, event) in scheduler.drain_due(clock.elapsed()) { /* ... */ }
//! ```

use std::time::Duration;

/// Handle to a scheduled event, used for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

#[derive(Debug)]
struct Scheduled<E> {
    id: TaskId,
    due: Duration,
    event: E,
}

/// Queue of events ordered by due time, ties broken by scheduling order.
#[derive(Debug)]
pub struct Scheduler<E> {
    next_id: u64,
    tasks: Vec<Scheduled<E>>,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            tasks: Vec::new(),
        }
    }

    /// Schedule `event` to fire at simulation time `due`.
    pub fn schedule_at(&mut self, due: Duration, event: E) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        // Later ids always sort after earlier ones at equal due times.
        let at = self.tasks.partition_point(|t| t.due <= due);
        self.tasks.insert(at, Scheduled { id, due, event });
        id
    }

    /// Schedule `event` to fire `delay` after `now`.
    pub fn schedule_after(&mut self, now: Duration, delay: Duration, event: E) -> TaskId {
        self.schedule_at(now + delay, event)
    }

    /// Remove a pending event. Returns `false` if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        match self.tasks.iter().position(|t| t.id == id) {
            Some(i) => {
                self.tasks.remove(i);
                true
            }
            None => false,
        }
    }

    /// Remove and return every event due at or before `now`, in firing order,
    /// each with the time it was due.
    ///
    /// Frames rarely land exactly on a due time; callers that animate from an
    /// event should start from `due`, not `now`.
    pub fn drain_due(&mut self, now: Duration) -> Vec<(Duration, E)> {
        let due = self.tasks.partition_point(|t| t.due <= now);
        self.tasks.drain(..due).map(|t| (t.due, t.event)).collect()
    }

    /// Due time of the next pending event.
    pub fn next_due(&self) -> Option<Duration> {
        self.tasks.first().map(|t| t.due)
    }

    pub fn is_pending(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
