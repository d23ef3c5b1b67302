//! Ready-made experiment setups
//!
//! The standard junction has a main line (`a-b`, `b-a`) and a side branch
//! (`a-c`, `c-a`). Arrivals on each line share a rate; every route has its
//! own service rate.

use anyhow::{bail, Context, Result};
use std::collections::HashMap;

use crate::simulation::{
    run, Erlang, Junction, JunctionTopology, RouteSetup, SimConfig, SimTime, STANDARD_ROUTES,
};

/// Parameters of a standard junction experiment. Rates are trains per time unit.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioParams {
    pub main_arrival_rate: f64,
    pub side_arrival_rate: f64,
    /// Service rate per route name; routes missing here use `default_service_rate`
    pub service_rates: HashMap<String, f64>,
    pub default_service_rate: f64,
    /// Coefficient of variation of inter-arrival times
    pub arrival_cov: f64,
    /// Coefficient of variation of service times
    pub service_cov: f64,
    pub queue_capacity: Option<usize>,
    /// Base seed of the duration sources
    pub seed: u64,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        Self {
            // six trains an hour per line, time measured in minutes
            main_arrival_rate: 6.0 / 60.0,
            side_arrival_rate: 6.0 / 60.0,
            service_rates: HashMap::new(),
            default_service_rate: 0.3,
            arrival_cov: 0.8,
            service_cov: 0.3,
            queue_capacity: None,
            seed: 0,
        }
    }
}

impl ScenarioParams {
    fn service_rate(&self, route: &str) -> f64 {
        self.service_rates
            .get(route)
            .copied()
            .unwrap_or(self.default_service_rate)
    }

    fn arrival_rate(&self, route: &str) -> f64 {
        match route {
            "a-b" | "b-a" => self.main_arrival_rate,
            _ => self.side_arrival_rate,
        }
    }
}

fn check_rate(name: &str, rate: f64) -> Result<()> {
    if !(rate.is_finite() && rate > 0.0) {
        bail!("{} must be positive, got {}", name, rate);
    }
    Ok(())
}

/// Duration sources for the four standard routes.
///
/// Each route draws from its own seeded Erlang sources, with shapes picked to
/// approximate the configured coefficients of variation.
pub fn standard_setups(params: &ScenarioParams) -> Result<HashMap<String, RouteSetup>> {
    check_rate("main line arrival rate", params.main_arrival_rate)?;
    check_rate("side branch arrival rate", params.side_arrival_rate)?;

    let mut setups = HashMap::new();
    for (index, route) in STANDARD_ROUTES.iter().enumerate() {
        let arrival_rate = params.arrival_rate(route);
        let service_rate = params.service_rate(route);
        check_rate(&format!("service rate of {}", route), service_rate)?;

        let offset = 2 * index as u64;
        let arrival = Erlang::with_cov(
            params.arrival_cov,
            1.0 / arrival_rate,
            params.seed.wrapping_add(offset + 1),
        )
        .with_context(|| format!("Arrival source of {}", route))?;
        let service = Erlang::with_cov(
            params.service_cov,
            1.0 / service_rate,
            params.seed.wrapping_add(offset + 2),
        )
        .with_context(|| format!("Service source of {}", route))?;

        let mut setup = RouteSetup::new(arrival, service);
        if let Some(capacity) = params.queue_capacity {
            setup = setup.with_queue_capacity(capacity);
        }
        setups.insert(route.to_string(), setup);
    }
    Ok(setups)
}

/// Build and run the standard junction up to `horizon`
pub fn run_standard(params: &ScenarioParams, horizon: SimTime, config: SimConfig) -> Result<Junction> {
    let topology = JunctionTopology::standard().context("Standard topology is invalid")?;
    let setups = standard_setups(params).context("Invalid scenario parameters")?;
    run(topology, setups, horizon, config).context("Simulation run failed")
}
