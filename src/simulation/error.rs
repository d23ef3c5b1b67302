//! Error types for the junction simulation

use thiserror::Error;

use super::types::{SimTime, SlotKey};

/// Malformed topology or run configuration. Raised at construction, never recovered.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("topology has no routes")]
    NoRoutes,

    #[error("route `{0}` is declared more than once")]
    DuplicateRoute(String),

    #[error("route `{0}` has an empty footprint")]
    EmptyFootprint(String),

    #[error("slot {slot} in the footprint of `{route}` references unknown route `{unknown}`")]
    UnknownRoute {
        route: String,
        slot: SlotKey,
        unknown: String,
    },

    #[error("slot {slot} does not involve route `{route}` but is in its footprint")]
    ForeignSlot { route: String, slot: SlotKey },

    #[error("slot {slot} is held by `{route}` but missing from the footprint of `{missing_in}`")]
    AsymmetricSlot {
        route: String,
        slot: SlotKey,
        missing_in: String,
    },

    #[error("no duration sources supplied for route `{0}`")]
    MissingSources(String),

    #[error("duration sources supplied for unknown route `{0}`")]
    UnknownSources(String),

    #[error("queue capacity of route `{0}` must be at least 1")]
    ZeroCapacity(String),

    #[error("{name} must be positive and finite, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("priority list names unknown route `{0}`")]
    UnknownPriority(String),

    #[error("coefficient of variation {cov} needs an Erlang shape above the maximum of {max}")]
    CovTooSmall { cov: f64, max: u32 },
}

/// Aggregate requested over a window with no qualifying samples.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("no {series} data for route `{route}` in window [{start}, {end}]")]
    NoData {
        route: String,
        series: &'static str,
        start: SimTime,
        end: SimTime,
    },

    #[error("unknown route `{0}`")]
    UnknownRoute(String),
}

/// Failure while the kernel is running.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{kind} source of route `{route}` sampled an invalid duration {value}")]
    InvalidDuration {
        route: String,
        kind: &'static str,
        value: f64,
    },

    #[error("cannot schedule an event after delay {0}")]
    InvalidDelay(SimTime),
}
