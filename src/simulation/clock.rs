//! Virtual clock and event queue
//!
//! Events are ordered by timestamp, then by the order they were scheduled in,
//! so that every run over the same inputs replays identically.

use ordered_float::OrderedFloat;
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};

use super::error::SimError;
use super::types::{SimTime, TimeKey};

/// Handle to a scheduled event, used to withdraw it before it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventHandle(u64);

/// An event waiting in the queue
#[derive(Debug)]
struct Scheduled<E> {
    time: TimeKey,
    /// Scheduling order; breaks ties between equal timestamps
    sequence: u64,
    event: E,
}

impl<E> PartialEq for Scheduled<E> {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.sequence == other.sequence
    }
}

impl<E> Eq for Scheduled<E> {}

impl<E> Ord for Scheduled<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.time.cmp(&other.time) {
            Ordering::Equal => self.sequence.cmp(&other.sequence),
            ord => ord,
        }
    }
}

impl<E> PartialOrd for Scheduled<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Discrete-event clock: a min-heap of pending events plus the current virtual time
#[derive(Debug)]
pub struct EventQueue<E> {
    now: SimTime,
    heap: BinaryHeap<Reverse<Scheduled<E>>>,
    /// Sequences of events that are still live (scheduled, not fired, not cancelled)
    pending: HashSet<u64>,
    next_sequence: u64,
    fired: u64,
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventQueue<E> {
    pub fn new() -> Self {
        Self {
            now: 0.0,
            heap: BinaryHeap::new(),
            pending: HashSet::new(),
            next_sequence: 0,
            fired: 0,
        }
    }

    /// Current virtual time
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Number of events that have fired so far
    pub fn fired(&self) -> u64 {
        self.fired
    }

    /// Number of live events still waiting to fire
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Schedule `event` to fire at `now + delay`
    pub fn schedule(&mut self, delay: SimTime, event: E) -> Result<EventHandle, SimError> {
        if !delay.is_finite() || delay < 0.0 {
            return Err(SimError::InvalidDelay(delay));
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.heap.push(Reverse(Scheduled {
            time: OrderedFloat(self.now + delay),
            sequence,
            event,
        }));
        self.pending.insert(sequence);
        Ok(EventHandle(sequence))
    }

    /// Withdraw a pending event. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: EventHandle) -> bool {
        self.pending.remove(&handle.0)
    }

    pub fn is_pending(&self, handle: EventHandle) -> bool {
        self.pending.contains(&handle.0)
    }

    /// Drop cancelled events sitting at the head of the heap
    fn discard_cancelled(&mut self) {
        while let Some(Reverse(head)) = self.heap.peek() {
            if self.pending.contains(&head.sequence) {
                break;
            }
            self.heap.pop();
        }
    }

    /// Timestamp of the next live event
    pub fn peek_time(&mut self) -> Option<SimTime> {
        self.discard_cancelled();
        self.heap.peek().map(|Reverse(head)| head.time.into_inner())
    }

    /// Pop the earliest live event and move the clock to its timestamp
    pub fn pop(&mut self) -> Option<E> {
        self.discard_cancelled();
        let Reverse(next) = self.heap.pop()?;
        self.pending.remove(&next.sequence);
        self.now = next.time.into_inner();
        self.fired += 1;
        Some(next.event)
    }

    /// Pop the earliest live event only if it fires at or before `horizon`
    pub fn pop_due(&mut self, horizon: SimTime) -> Option<E> {
        match self.peek_time() {
            Some(time) if time <= horizon => self.pop(),
            _ => None,
        }
    }

    /// Move the clock forward without firing anything. Never moves it backwards.
    pub fn advance_to(&mut self, time: SimTime) {
        if time > self.now {
            self.now = time;
        }
    }

    /// Fire every event due at or before `horizon`, handing each to `handler`
    /// together with the queue so the handler can schedule follow-ups.
    pub fn run_until<F, Err>(&mut self, horizon: SimTime, mut handler: F) -> Result<(), Err>
    where
        F: FnMut(&mut Self, E) -> Result<(), Err>,
    {
        while let Some(event) = self.pop_due(horizon) {
            handler(self, event)?;
        }
        self.advance_to(horizon);
        Ok(())
    }
}
