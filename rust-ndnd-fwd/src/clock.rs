//! Event scheduling for the forwarding core.
//!
//! The core runs on a single-threaded cooperative loop: the scheduler owns
//! the loop's notion of "now" and a heap of one-shot timers. Timers fire in
//! deadline order; ties break by insertion order. Cancellation is idempotent
//! and safe after an event has fired.
//!
//! Timer payloads are plain data (`TimerEvent`) dispatched by the forwarder
//! rather than closures, so the tables keep a single owner and timer
//! ordering stays observable in tests.

use crate::tables::pit::PitKey;
use rust_ndnd_common::name::Name;
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};
use std::time::{Duration, Instant};

/// Handle for a scheduled event, usable with [`Scheduler::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventId(u64);

/// Timer kinds owned by a strategy for a specific PIT entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyTimerKind {
    /// The best face did not answer within the predicted time.
    NccBestFaceTimeout,
    /// Propagate the Interest to one more next-hop.
    NccPropagate,
}

/// What to do when a timer fires.
#[derive(Debug, Clone)]
pub enum TimerEvent {
    /// A PIT entry reached its expiry and must be finalized.
    PitExpire { key: PitKey },
    /// A Measurements entry reached the end of its lifetime.
    MeasurementsExpire { name: Name },
    /// A strategy-owned timer for a PIT entry.
    Strategy { key: PitKey, kind: StrategyTimerKind },
}

#[derive(Debug)]
struct Scheduled {
    at: Instant,
    id: u64,
    event: TimerEvent,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.id == other.id
    }
}

impl Eq for Scheduled {}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at.cmp(&other.at).then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One-shot timer queue with a monotonic clock.
///
/// The owner advances the clock explicitly: the daemon advances it to wall
/// time before dispatching each mailbox message, tests advance virtual time
/// directly.
#[derive(Debug)]
pub struct Scheduler {
    now: Instant,
    next_id: u64,
    queue: BinaryHeap<Reverse<Scheduled>>,
    live: HashSet<u64>,
    cancelled: HashSet<u64>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            now: Instant::now(),
            next_id: 0,
            queue: BinaryHeap::new(),
            live: HashSet::new(),
            cancelled: HashSet::new(),
        }
    }

    /// The loop's current time.
    pub fn now(&self) -> Instant {
        self.now
    }

    /// Schedules `event` to fire `after` the current time.
    pub fn schedule(&mut self, after: Duration, event: TimerEvent) -> EventId {
        self.schedule_at(self.now + after, event)
    }

    /// Schedules `event` to fire at an absolute instant.
    pub fn schedule_at(&mut self, at: Instant, event: TimerEvent) -> EventId {
        let id = self.next_id;
        self.next_id += 1;
        self.live.insert(id);
        self.queue.push(Reverse(Scheduled { at, id, event }));
        EventId(id)
    }

    /// Cancels a scheduled event. Idempotent, and a no-op for events that
    /// already fired.
    pub fn cancel(&mut self, id: EventId) {
        if self.live.remove(&id.0) {
            self.cancelled.insert(id.0);
        }
    }

    /// Moves the clock forward to `t`. The clock never moves backward.
    pub fn advance_to(&mut self, t: Instant) {
        if t > self.now {
            self.now = t;
        }
    }

    /// Moves the clock forward by `d`.
    pub fn advance(&mut self, d: Duration) {
        self.now += d;
    }

    /// Earliest pending deadline, if any.
    pub fn next_deadline(&mut self) -> Option<Instant> {
        loop {
            let head = self.queue.peek()?;
            if self.cancelled.contains(&head.0.id) {
                let popped = self.queue.pop();
                if let Some(Reverse(s)) = popped {
                    self.cancelled.remove(&s.id);
                }
                continue;
            }
            return Some(head.0.at);
        }
    }

    /// Pops the next event whose deadline has been reached.
    pub fn pop_due(&mut self) -> Option<TimerEvent> {
        loop {
            let head = self.queue.peek()?;
            if self.cancelled.contains(&head.0.id) {
                let popped = self.queue.pop();
                if let Some(Reverse(s)) = popped {
                    self.cancelled.remove(&s.id);
                }
                continue;
            }
            if head.0.at > self.now {
                return None;
            }
            let Reverse(s) = self.queue.pop()?;
            self.live.remove(&s.id);
            return Some(s.event);
        }
    }

    /// Number of events still pending.
    pub fn pending(&self) -> usize {
        self.live.len()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
