//! Train records and their lifecycle
//!
//! A train is a value: each transition consumes the current version and
//! returns the next one, and the junction's train table keeps the latest.

use super::types::{SimTime, TrainId};

/// Lifecycle of a train at the junction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainState {
    /// Queued at its route
    Waiting,
    /// Head of its route's queue but the route's footprint is held by others
    ResourceWait,
    /// Occupying the junction
    InService,
    /// Cleared the junction
    Completed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Train {
    pub id: TrainId,
    pub route: String,
    pub arrival_time: SimTime,
    pub service_start_time: Option<SimTime>,
    pub service_duration: Option<SimTime>,
    pub completion_time: Option<SimTime>,
    pub state: TrainState,
}

impl Train {
    pub fn arrive(id: TrainId, route: impl Into<String>, arrival_time: SimTime) -> Self {
        Self {
            id,
            route: route.into(),
            arrival_time,
            service_start_time: None,
            service_duration: None,
            completion_time: None,
            state: TrainState::Waiting,
        }
    }

    /// Mark a waiting train as blocked on contended segments
    pub fn block(self) -> Self {
        match self.state {
            TrainState::Waiting => Self {
                state: TrainState::ResourceWait,
                ..self
            },
            _ => self,
        }
    }

    pub fn begin_service(self, now: SimTime, duration: SimTime) -> Self {
        Self {
            service_start_time: Some(now),
            service_duration: Some(duration),
            state: TrainState::InService,
            ..self
        }
    }

    pub fn complete(self, now: SimTime) -> Self {
        Self {
            completion_time: Some(now),
            state: TrainState::Completed,
            ..self
        }
    }

    pub fn in_service(&self) -> bool {
        self.state == TrainState::InService
    }

    /// Still counted in its route's queue
    pub fn is_queued(&self) -> bool {
        matches!(self.state, TrainState::Waiting | TrainState::ResourceWait)
    }

    /// Time spent queued before service started
    pub fn waiting_time(&self) -> Option<SimTime> {
        self.service_start_time.map(|start| start - self.arrival_time)
    }

    /// Time spent in service, once completed
    pub fn service_time(&self) -> Option<SimTime> {
        match (self.service_start_time, self.completion_time) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    pub fn record(&self) -> TrainRecord {
        TrainRecord {
            id: self.id.0,
            route: self.route.clone(),
            arrival_time: self.arrival_time,
            service_start_time: self.service_start_time,
            completion_time: self.completion_time,
            service_duration: self.service_duration,
            in_service: self.in_service(),
        }
    }
}

/// Read-only row handed to auditors and exporters
#[derive(Debug, Clone, PartialEq)]
pub struct TrainRecord {
    pub id: u64,
    pub route: String,
    pub arrival_time: SimTime,
    pub service_start_time: Option<SimTime>,
    pub completion_time: Option<SimTime>,
    pub service_duration: Option<SimTime>,
    pub in_service: bool,
}

impl TrainRecord {
    /// Service interval `[start, end)`, if the train has completed
    pub fn service_interval(&self) -> Option<(SimTime, SimTime)> {
        Some((self.service_start_time?, self.completion_time?))
    }
}
