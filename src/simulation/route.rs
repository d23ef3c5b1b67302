//! Routes: arrival stream, waiting queue, and service stage
//!
//! A route owns the ids of its live trains. The train values themselves live
//! in the junction's train table, which the route is handed when it needs to
//! move a train through its lifecycle.

use log::trace;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use super::duration::DurationSource;
use super::error::SimError;
use super::stats::RouteStats;
use super::train::Train;
use super::types::{RouteId, SimTime, SlotId, TrainId};

/// What a route needs from the outside: its two duration sources and an
/// optional queue bound
pub struct RouteSetup {
    pub arrival: Box<dyn DurationSource>,
    pub service: Box<dyn DurationSource>,
    /// Arrivals finding this many trains queued are turned away
    pub queue_capacity: Option<usize>,
}

impl RouteSetup {
    pub fn new(
        arrival: impl DurationSource + 'static,
        service: impl DurationSource + 'static,
    ) -> Self {
        Self {
            arrival: Box::new(arrival),
            service: Box::new(service),
            queue_capacity: None,
        }
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }
}

impl std::fmt::Debug for RouteSetup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteSetup")
            .field("arrival_rate", &self.arrival.rate())
            .field("service_rate", &self.service.rate())
            .field("queue_capacity", &self.queue_capacity)
            .finish()
    }
}

/// Outcome of one arrival event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    /// Queue was at capacity; no train was created
    Rejected,
}

/// A route through the junction
pub struct Route {
    pub id: RouteId,
    /// Unique within the topology, e.g. `a-b`
    pub name: String,
    /// Waiting trains, oldest first
    queue: VecDeque<TrainId>,
    /// Trains currently occupying the junction
    in_service: BTreeSet<TrainId>,
    /// Segments held during service
    footprint: Vec<SlotId>,
    /// Inter-arrival durations
    arrival: Box<dyn DurationSource>,
    /// Service durations
    service: Box<dyn DurationSource>,
    /// `None` means the queue is unbounded
    queue_capacity: Option<usize>,
    /// Samples and counters collected during the run
    pub stats: RouteStats,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("queue", &self.queue)
            .field("in_service", &self.in_service)
            .field("footprint", &self.footprint)
            .field("queue_capacity", &self.queue_capacity)
            .finish_non_exhaustive()
    }
}

impl Route {
    pub fn new(id: RouteId, name: impl Into<String>, footprint: Vec<SlotId>, setup: RouteSetup) -> Self {
        Self {
            id,
            name: name.into(),
            queue: VecDeque::new(),
            in_service: BTreeSet::new(),
            footprint,
            arrival: setup.arrival,
            service: setup.service,
            queue_capacity: setup.queue_capacity,
            stats: RouteStats::default(),
        }
    }

    pub fn footprint(&self) -> &[SlotId] {
        &self.footprint
    }

    /// Trains not yet in service
    pub fn queue_length(&self) -> usize {
        self.queue.len()
    }

    pub fn has_waiting(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn in_service_count(&self) -> usize {
        self.in_service.len()
    }

    pub fn waiting_trains(&self) -> impl Iterator<Item = TrainId> + '_ {
        self.queue.iter().copied()
    }

    /// Oldest waiting train, the next one to be served
    pub fn head(&self) -> Option<TrainId> {
        self.queue.front().copied()
    }

    pub fn queue_capacity(&self) -> Option<usize> {
        self.queue_capacity
    }

    pub fn arrival_rate(&self) -> Option<f64> {
        self.arrival.rate()
    }

    pub fn service_rate(&self) -> Option<f64> {
        self.service.rate()
    }

    /// Whether an arrival right now would be queued
    pub fn admits(&self) -> bool {
        match self.queue_capacity {
            Some(capacity) => self.queue_length() < capacity,
            None => true,
        }
    }

    fn checked(&self, kind: &'static str, value: SimTime) -> Result<SimTime, SimError> {
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(SimError::InvalidDuration {
                route: self.name.clone(),
                kind,
                value,
            })
        }
    }

    /// Draw the delay until the next arrival
    pub fn sample_inter_arrival(&mut self) -> Result<SimTime, SimError> {
        let value = self.arrival.sample(1.0);
        let value = self.checked("arrival", value)?;
        self.stats.inter_arrival_samples.push(value);
        Ok(value)
    }

    fn sample_service(&mut self) -> Result<SimTime, SimError> {
        let value = self.service.sample(1.0);
        let value = self.checked("service", value)?;
        self.stats.service_samples.push(value);
        Ok(value)
    }

    /// Handle an arrival: queue a new train if there is room.
    ///
    /// `next_id` is only consumed when the train is admitted.
    pub fn arrive(
        &mut self,
        trains: &mut BTreeMap<TrainId, Train>,
        next_id: impl FnOnce() -> TrainId,
        now: SimTime,
    ) -> Admission {
        if !self.admits() {
            self.stats.rejected += 1;
            return Admission::Rejected;
        }

        let id = next_id();
        trains.insert(id, Train::arrive(id, self.name.clone(), now));
        self.queue.push_back(id);
        self.stats.admitted += 1;
        trace!(
            "t={:.3} train {} queued on {} (queue {})",
            now,
            id.0,
            self.name,
            self.queue_length()
        );
        Admission::Admitted
    }

    /// Mark the head of the queue as blocked on contended segments
    pub fn block_head(&self, trains: &mut BTreeMap<TrainId, Train>) {
        if let Some(id) = self.head() {
            if let Some(train) = trains.remove(&id) {
                trains.insert(id, train.block());
            }
        }
    }

    /// Move the oldest waiting train into service.
    ///
    /// The caller must already hold the route's footprint. Returns the train
    /// and its sampled service duration, or `None` if nobody is waiting.
    pub fn begin_service(
        &mut self,
        trains: &mut BTreeMap<TrainId, Train>,
        now: SimTime,
    ) -> Result<Option<(TrainId, SimTime)>, SimError> {
        if self.queue.is_empty() {
            return Ok(None);
        }
        let duration = self.sample_service()?;
        let Some(id) = self.queue.pop_front() else {
            return Ok(None);
        };

        if let Some(train) = trains.remove(&id) {
            let train = train.begin_service(now, duration);
            if let Some(waited) = train.waiting_time() {
                self.stats.waiting_times.record(now, waited);
            }
            trains.insert(id, train);
        }
        self.in_service.insert(id);
        Ok(Some((id, duration)))
    }

    /// Finish a train's service: stamp it, record its service time, and drop it from the live set
    pub fn complete_service(
        &mut self,
        trains: &mut BTreeMap<TrainId, Train>,
        id: TrainId,
        now: SimTime,
    ) {
        if !self.in_service.remove(&id) {
            return;
        }
        let Some(train) = trains.remove(&id) else {
            return;
        };
        let train = train.complete(now);

        if let (Some(start), Some(served)) = (train.service_start_time, train.service_time()) {
            self.stats.service_times.record(start, served);
        }
        self.stats.completed += 1;
        trains.insert(id, train);
    }

    /// Record the current queue length
    pub fn sample_queue_length(&mut self, now: SimTime) {
        let length = self.queue_length();
        self.stats.queue_lengths.record(now, length as f64);
    }
}
