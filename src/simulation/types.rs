//! Core types for the junction simulation
//!
//! Identifiers and shared constants used across the kernel.

use ordered_float::OrderedFloat;

/// Virtual time, in the same unit the duration sources sample in
pub type SimTime = f64;

/// Totally ordered virtual time used as a sort key
pub type TimeKey = OrderedFloat<SimTime>;

/// Index of a route inside its junction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RouteId(pub usize);

/// Index of a resource slot inside the pool's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotId(pub usize);

/// Train identity, assigned in arrival order starting at 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrainId(pub u64);

/// Canonical key of a shared track segment: an unordered pair of route names.
///
/// The pair is stored sorted, so `SlotKey::new("b", "a") == SlotKey::new("a", "b")`.
/// A route may be paired with itself to model track only it uses.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotKey {
    low: String,
    high: String,
}

impl SlotKey {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn routes(&self) -> (&str, &str) {
        (&self.low, &self.high)
    }

    pub fn involves(&self, route: &str) -> bool {
        self.low == route || self.high == route
    }

    /// The member of the pair that is not `route`, or `route` itself for a self-pair
    pub fn other(&self, route: &str) -> Option<&str> {
        if self.low == route {
            Some(&self.high)
        } else if self.high == route {
            Some(&self.low)
        } else {
            None
        }
    }
}

impl std::fmt::Display for SlotKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.low, self.high)
    }
}

/// Interval between scheduler polls.
///
/// Must stay well below the shortest arrival or service duration so that
/// polling does not materially delay dispatch.
pub const POLL_QUANTUM: SimTime = 1.0 / 600.0;

/// Default cadence of the queue-length sampler
pub const QUEUE_SAMPLE_INTERVAL: SimTime = 1.0;

/// Number of progress reports logged over a run
pub const PROGRESS_STEPS: u32 = 100;
