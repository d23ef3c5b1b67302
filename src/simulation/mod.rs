//! Discrete-event simulation of trains through a junction
//!
//! Routes share track segments; the kernel advances virtual time event by
//! event and makes sure conflicting routes are never in service together.

mod audit;
mod clock;
mod config;
mod duration;
mod error;
mod junction;
mod resources;
mod route;
mod scheduler;
mod stats;
mod topology;
mod train;
mod types;

pub use audit::{conflict_overlaps, fifo_violations, overlap_counts, overlapping_trains};
pub use clock::{EventHandle, EventQueue};
pub use config::{ArbitrationKind, SimConfig};
pub use duration::{Constant, DurationSource, Erlang, Exponential, MAX_ERLANG_SHAPE};
pub use error::{ConfigError, SimError, StatsError};
pub use junction::{run, Junction, Process, ResourceSnapshot};
pub use resources::{ResourcePool, ResourceSlot};
pub use route::{Admission, Route, RouteSetup};
pub use scheduler::{
    ArbitrationStrategy, JunctionScheduler, PriorityArbitration, RandomArbitration, Readiness,
    RoundRobinArbitration,
};
pub use stats::{
    reconstructed_queue_lengths, JunctionSummary, RouteStatistics, RouteStats, Sample,
    SampleSeries,
};
pub use topology::{JunctionTopology, TopologyBuilder, STANDARD_ROUTES};
pub use train::{Train, TrainRecord, TrainState};
pub use types::{
    RouteId, SimTime, SlotId, SlotKey, TimeKey, TrainId, POLL_QUANTUM, PROGRESS_STEPS,
    QUEUE_SAMPLE_INTERVAL,
};
