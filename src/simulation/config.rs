//! Run configuration

use super::error::ConfigError;
use super::scheduler::{
    ArbitrationStrategy, PriorityArbitration, RandomArbitration, RoundRobinArbitration,
};
use super::topology::JunctionTopology;
use super::types::{SimTime, POLL_QUANTUM, QUEUE_SAMPLE_INTERVAL};

/// Which arbitration strategy the scheduler uses
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ArbitrationKind {
    #[default]
    Random,
    RoundRobin,
    /// Route names, highest priority first
    Priority(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Seed of the arbitration RNG
    pub seed: u64,
    pub poll_quantum: SimTime,
    pub queue_sample_interval: SimTime,
    /// Cadence of slot-holder snapshots; `None` disables them
    pub resource_snapshot_interval: Option<SimTime>,
    /// Log progress every percent of the horizon
    pub log_progress: bool,
    /// Pull the next scheduler poll forward when a service completes
    pub wake_on_release: bool,
    pub arbitration: ArbitrationKind,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            poll_quantum: POLL_QUANTUM,
            queue_sample_interval: QUEUE_SAMPLE_INTERVAL,
            resource_snapshot_interval: None,
            log_progress: false,
            wake_on_release: false,
            arbitration: ArbitrationKind::Random,
        }
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

impl SimConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("poll quantum", self.poll_quantum)?;
        positive("queue sample interval", self.queue_sample_interval)?;
        if let Some(interval) = self.resource_snapshot_interval {
            positive("resource snapshot interval", interval)?;
        }
        Ok(())
    }

    /// Build the configured strategy, resolving priority names against the topology
    pub fn strategy(
        &self,
        topology: &JunctionTopology,
    ) -> Result<Box<dyn ArbitrationStrategy>, ConfigError> {
        Ok(match &self.arbitration {
            ArbitrationKind::Random => Box::new(RandomArbitration::new(self.seed)),
            ArbitrationKind::RoundRobin => Box::new(RoundRobinArbitration::new()),
            ArbitrationKind::Priority(names) => {
                let order = names
                    .iter()
                    .map(|name| {
                        topology
                            .route_id(name)
                            .ok_or_else(|| ConfigError::UnknownPriority(name.clone()))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Box::new(PriorityArbitration::new(order))
            }
        })
    }
}
