//! Clock & Event Queue.
//!
//! A min-heap of `(time, seq)`-ordered events, implemented as a
//! `BinaryHeap<Reverse<_>>` driving the whole simulation rather than a single
//! shortest-path search. `seq` is an ever-increasing insertion counter that
//! breaks ties between events at identical timestamps deterministically and
//! in FIFO order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::ltp::Feedback;
use crate::time::{BundleId, Date, NodeId, SessionId};

/// The kinds of events the scheduler dispatches.
#[derive(Debug, Clone)]
pub enum Event {
    ContactStart(usize),
    ContactEnd(usize),
    BundleGeneration(NodeId),
    SegmentArrival { session: SessionId, seg: u32, receiver: NodeId, generation: u32 },
    AckArrival { session: SessionId, sender: NodeId, feedback: Feedback, generation: u32 },
    CheckpointTimeout { session: SessionId, generation: u32 },
    BundleExpiry(BundleId),
    MetricsSnapshot,
}

#[derive(Debug, Clone)]
struct ScheduledEvent {
    time: Date,
    seq: u64,
    event: Event,
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}
impl Eq for ScheduledEvent {}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so a `BinaryHeap` (a max-heap) behaves as the min-heap
        // the scheduler needs: earliest time, then lowest seq, pops first.
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}
impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Drives simulated time forward. Owns the event heap and the insertion
/// sequence counter; has no knowledge of what an event *means* — dispatch
/// semantics live in `crate::sim`.
pub struct Clock {
    now: Date,
    horizon: Date,
    next_seq: u64,
    queue: BinaryHeap<ScheduledEvent>,
}

impl Clock {
    pub fn new(horizon: Date) -> Self {
        Self { now: 0.0, horizon, next_seq: 0, queue: BinaryHeap::new() }
    }

    pub fn now(&self) -> Date {
        self.now
    }

    pub fn horizon(&self) -> Date {
        self.horizon
    }

    /// Schedules `event` `delay` seconds from now. Events landing strictly
    /// after the horizon are discarded at insertion time.
    pub fn schedule(&mut self, delay: f64, event: Event) {
        self.schedule_at(self.now + delay, event);
    }

    /// Schedules `event` at absolute time `t`.
    pub fn schedule_at(&mut self, t: Date, event: Event) {
        if t > self.horizon {
            return;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(ScheduledEvent { time: t, seq, event });
    }

    /// Pops the next event in `(time, seq)` order, advancing `now` to its
    /// timestamp. Returns `None` once the queue is empty.
    pub fn pop(&mut self) -> Option<(Date, Event)> {
        let scheduled = self.queue.pop()?;
        debug_assert!(scheduled.time >= self.now, "scheduler time must be non-decreasing");
        self.now = scheduled.time;
        Some((scheduled.time, scheduled.event))
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_order_is_time_then_seq() {
        let mut clock = Clock::new(100.0);
        clock.schedule_at(5.0, Event::MetricsSnapshot);
        clock.schedule_at(1.0, Event::MetricsSnapshot);
        clock.schedule_at(1.0, Event::BundleGeneration(0));

        let (t1, _) = clock.pop().unwrap();
        let (t2, e2) = clock.pop().unwrap();
        let (t3, _) = clock.pop().unwrap();

        assert_eq!(t1, 1.0);
        assert_eq!(t2, 1.0);
        assert!(matches!(e2, Event::BundleGeneration(0)));
        assert_eq!(t3, 5.0);
    }

    #[test]
    fn events_past_horizon_are_discarded() {
        let mut clock = Clock::new(10.0);
        clock.schedule_at(11.0, Event::MetricsSnapshot);
        assert!(clock.pop().is_none());
    }

    #[test]
    fn time_is_monotonic_across_pops() {
        let mut clock = Clock::new(100.0);
        for t in [3.0, 1.0, 2.0] {
            clock.schedule_at(t, Event::MetricsSnapshot);
        }
        let mut last = -1.0;
        while let Some((t, _)) = clock.pop() {
            assert!(t >= last);
            last = t;
        }
    }
}
