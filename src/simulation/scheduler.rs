//! Junction scheduler: readiness polling and arbitration
//!
//! Every tick the scheduler finds the routes that have a waiting train and
//! whose whole footprint is free, and lets an [`ArbitrationStrategy`] pick
//! one of them. None of the strategies guarantee freedom from starvation.

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;

use super::clock::EventHandle;
use super::resources::ResourcePool;
use super::route::Route;
use super::types::{RouteId, SimTime};

/// Picks which ready route is dispatched
pub trait ArbitrationStrategy {
    /// `ready` is non-empty and sorted by route id
    fn choose(&mut self, ready: &[RouteId]) -> Option<RouteId>;

    fn name(&self) -> &'static str;
}

/// Uniformly random choice among ready routes
#[derive(Debug, Clone)]
pub struct RandomArbitration {
    rng: StdRng,
}

impl RandomArbitration {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl ArbitrationStrategy for RandomArbitration {
    fn choose(&mut self, ready: &[RouteId]) -> Option<RouteId> {
        ready.choose(&mut self.rng).copied()
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

/// Cycles through route ids, starting after the last route dispatched
#[derive(Debug, Clone, Default)]
pub struct RoundRobinArbitration {
    last: Option<RouteId>,
}

impl RoundRobinArbitration {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArbitrationStrategy for RoundRobinArbitration {
    fn choose(&mut self, ready: &[RouteId]) -> Option<RouteId> {
        let chosen = match self.last {
            Some(last) => ready
                .iter()
                .find(|id| **id > last)
                .or_else(|| ready.first())
                .copied(),
            None => ready.first().copied(),
        };
        if chosen.is_some() {
            self.last = chosen;
        }
        chosen
    }

    fn name(&self) -> &'static str {
        "round-robin"
    }
}

/// Fixed priority order; routes missing from the order come last, by id
#[derive(Debug, Clone)]
pub struct PriorityArbitration {
    order: Vec<RouteId>,
}

impl PriorityArbitration {
    pub fn new(order: Vec<RouteId>) -> Self {
        Self { order }
    }
}

impl ArbitrationStrategy for PriorityArbitration {
    fn choose(&mut self, ready: &[RouteId]) -> Option<RouteId> {
        self.order
            .iter()
            .find(|id| ready.contains(id))
            .or_else(|| ready.first())
            .copied()
    }

    fn name(&self) -> &'static str {
        "priority"
    }
}

/// Result of scanning the routes on one tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Readiness {
    /// Waiting trains and a free footprint
    pub ready: Vec<RouteId>,
    /// Waiting trains but part of the footprint is held
    pub contended: Vec<RouteId>,
}

/// The periodic dispatcher
pub struct JunctionScheduler {
    /// Time between polls
    pub quantum: SimTime,
    /// Poll immediately when a service completes instead of waiting for the next tick
    pub wake_on_release: bool,
    strategy: Box<dyn ArbitrationStrategy>,
    /// The next poll, so it can be pulled forward when segments are released
    pending_tick: Option<EventHandle>,
    /// Polls run so far
    pub ticks: u64,
    /// Polls that found no ready route
    pub idle_ticks: u64,
    /// Trains sent into service
    pub dispatches: u64,
    /// Routes found with a waiting train but part of their footprint held, summed over polls
    pub contended_checks: u64,
}

impl std::fmt::Debug for JunctionScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JunctionScheduler")
            .field("quantum", &self.quantum)
            .field("wake_on_release", &self.wake_on_release)
            .field("strategy", &self.strategy.name())
            .field("ticks", &self.ticks)
            .field("dispatches", &self.dispatches)
            .finish_non_exhaustive()
    }
}

impl JunctionScheduler {
    pub fn new(quantum: SimTime, strategy: Box<dyn ArbitrationStrategy>) -> Self {
        Self {
            quantum,
            wake_on_release: false,
            strategy,
            pending_tick: None,
            ticks: 0,
            idle_ticks: 0,
            dispatches: 0,
            contended_checks: 0,
        }
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Check every route without claiming anything
    pub fn scan(&mut self, routes: &[Route], pool: &ResourcePool) -> Readiness {
        let mut readiness = Readiness::default();
        for route in routes.iter().filter(|route| route.has_waiting()) {
            if pool.can_acquire_all(route.footprint()) {
                readiness.ready.push(route.id);
            } else {
                readiness.contended.push(route.id);
            }
        }
        self.ticks += 1;
        self.contended_checks += readiness.contended.len() as u64;
        if readiness.ready.is_empty() {
            self.idle_ticks += 1;
        }
        readiness
    }

    /// Let the strategy pick one ready route
    pub fn select(&mut self, ready: &[RouteId]) -> Option<RouteId> {
        if ready.is_empty() {
            return None;
        }
        self.strategy.choose(ready)
    }

    pub fn record_dispatch(&mut self) {
        self.dispatches += 1;
    }

    pub fn set_pending_tick(&mut self, handle: EventHandle) {
        self.pending_tick = Some(handle);
    }

    pub fn take_pending_tick(&mut self) -> Option<EventHandle> {
        self.pending_tick.take()
    }
}
