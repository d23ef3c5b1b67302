//! The junction: the simulation world that ties everything together
//!
//! Every process (arrivals, service, scheduler polling, sampling) is an event
//! continuation. Firing an event resumes the matching process, which does its
//! work and schedules its own next step.

use log::{debug, info, trace};
use std::collections::{BTreeMap, HashMap};

use super::clock::EventQueue;
use super::config::SimConfig;
use super::error::{ConfigError, SimError, StatsError};
use super::resources::ResourcePool;
use super::route::{Admission, Route, RouteSetup};
use super::scheduler::JunctionScheduler;
use super::stats::{reconstructed_queue_lengths, JunctionSummary, RouteStatistics};
use super::topology::JunctionTopology;
use super::train::{Train, TrainRecord};
use super::types::{RouteId, SimTime, SlotKey, TrainId, PROGRESS_STEPS};

/// What to resume when an event fires
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Process {
    /// Next train arrives on the route
    Arrival(RouteId),
    /// A train clears the junction and its route releases the footprint
    ServiceComplete { route: RouteId, train: TrainId },
    SchedulerTick,
    SampleQueues,
    SnapshotResources,
    Progress { horizon: SimTime },
}

/// Holder of every slot at one instant
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSnapshot {
    pub time: SimTime,
    pub holders: Vec<(SlotKey, Option<String>)>,
}

/// The main simulation world
pub struct Junction {
    /// Virtual time and every pending process continuation
    clock: EventQueue<Process>,
    topology: JunctionTopology,
    /// Segment locks, one per distinct slot in the topology
    pool: ResourcePool,
    /// Indexed by `RouteId`, in topology order
    routes: Vec<Route>,

    /// Every train ever created, latest version of each
    trains: BTreeMap<TrainId, Train>,

    scheduler: JunctionScheduler,
    config: SimConfig,

    /// Last id handed out; ids start at 1
    last_train_id: u64,

    /// Slot holders recorded at the configured snapshot cadence
    resource_snapshots: Vec<ResourceSnapshot>,
    /// Whether the arrival, sampling and polling processes are on the clock
    started: bool,
    /// Progress reports are scheduled by the first `run_until` only
    progress_scheduled: bool,
}

impl std::fmt::Debug for Junction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Junction")
            .field("now", &self.clock.now())
            .field("routes", &self.routes)
            .field("trains", &self.trains.len())
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

impl Junction {
    /// Build a junction from a validated topology and one [`RouteSetup`] per route
    pub fn new(
        topology: JunctionTopology,
        mut setups: HashMap<String, RouteSetup>,
        config: SimConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut unknown: Vec<&String> = setups
            .keys()
            .filter(|name| topology.route_id(name).is_none())
            .collect();
        unknown.sort();
        if let Some(name) = unknown.first() {
            return Err(ConfigError::UnknownSources((*name).clone()));
        }

        let mut pool = ResourcePool::new();
        for key in topology.slot_keys() {
            pool.add_slot(key);
        }

        let mut routes = Vec::with_capacity(topology.route_count());
        for id in topology.route_ids() {
            let name = topology.route_names()[id.0].clone();
            let setup = setups
                .remove(&name)
                .ok_or_else(|| ConfigError::MissingSources(name.clone()))?;
            if setup.queue_capacity == Some(0) {
                return Err(ConfigError::ZeroCapacity(name));
            }
            let footprint = topology
                .footprint(id)
                .iter()
                .map(|key| pool.add_slot(key.clone()))
                .collect();
            routes.push(Route::new(id, name, footprint, setup));
        }

        let mut scheduler = JunctionScheduler::new(config.poll_quantum, config.strategy(&topology)?);
        scheduler.wake_on_release = config.wake_on_release;

        Ok(Self {
            clock: EventQueue::new(),
            topology,
            pool,
            routes,
            trains: BTreeMap::new(),
            scheduler,
            config,
            last_train_id: 0,
            resource_snapshots: Vec::new(),
            started: false,
            progress_scheduled: false,
        })
    }

    /// Put every process on the clock. Runs once, before the first event.
    fn start(&mut self) -> Result<(), SimError> {
        if self.started {
            return Ok(());
        }
        self.started = true;

        for index in 0..self.routes.len() {
            let delay = self.routes[index].sample_inter_arrival()?;
            self.clock.schedule(delay, Process::Arrival(RouteId(index)))?;
        }
        self.clock
            .schedule(self.config.queue_sample_interval, Process::SampleQueues)?;

        let handle = self.clock.schedule(0.0, Process::SchedulerTick)?;
        self.scheduler.set_pending_tick(handle);

        if let Some(interval) = self.config.resource_snapshot_interval {
            self.clock.schedule(interval, Process::SnapshotResources)?;
        }

        info!(
            "Junction started: {} routes, {} segments, {} arbitration",
            self.routes.len(),
            self.pool.len(),
            self.scheduler.strategy_name()
        );
        Ok(())
    }

    /// Fire the next event. Returns `false` if nothing is scheduled.
    pub fn advance(&mut self) -> Result<bool, SimError> {
        self.start()?;
        match self.clock.pop() {
            Some(process) => {
                self.resume(process)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Fire every event due at or before `horizon`, then move the clock to `horizon`.
    /// Events still pending afterwards stay queued.
    pub fn run_until(&mut self, horizon: SimTime) -> Result<(), SimError> {
        if !horizon.is_finite() || horizon < 0.0 {
            return Err(ConfigError::NonPositive {
                name: "horizon",
                value: horizon,
            }
            .into());
        }
        self.start()?;

        if self.config.log_progress && !self.progress_scheduled && horizon > self.clock.now() {
            self.progress_scheduled = true;
            let interval = horizon / f64::from(PROGRESS_STEPS);
            self.clock.schedule(interval, Process::Progress { horizon })?;
        }

        while let Some(process) = self.clock.pop_due(horizon) {
            self.resume(process)?;
        }
        self.clock.advance_to(horizon);

        info!(
            "Run reached t={:.2}: {} events, {} trains, {} dispatches",
            horizon,
            self.clock.fired(),
            self.trains.len(),
            self.scheduler.dispatches
        );
        Ok(())
    }

    fn resume(&mut self, process: Process) -> Result<(), SimError> {
        trace!("t={:.4} resume {:?}", self.clock.now(), process);
        match process {
            Process::Arrival(route) => self.on_arrival(route),
            Process::ServiceComplete { route, train } => self.on_service_complete(route, train),
            Process::SchedulerTick => self.on_scheduler_tick(),
            Process::SampleQueues => self.on_sample_queues(),
            Process::SnapshotResources => self.on_snapshot_resources(),
            Process::Progress { horizon } => self.on_progress(horizon),
        }
    }

    fn on_arrival(&mut self, id: RouteId) -> Result<(), SimError> {
        let now = self.clock.now();
        let last_train_id = &mut self.last_train_id;
        let route = &mut self.routes[id.0];

        let admission = route.arrive(
            &mut self.trains,
            || {
                *last_train_id += 1;
                TrainId(*last_train_id)
            },
            now,
        );
        if admission == Admission::Rejected {
            debug!(
                "t={:.3} route {} turned a train away (queue {} of {:?})",
                now,
                route.name,
                route.queue_length(),
                route.queue_capacity()
            );
        }

        let delay = route.sample_inter_arrival()?;
        self.clock.schedule(delay, Process::Arrival(id))?;
        Ok(())
    }

    fn on_scheduler_tick(&mut self) -> Result<(), SimError> {
        self.scheduler.take_pending_tick();

        let readiness = self.scheduler.scan(&self.routes, &self.pool);
        for id in &readiness.contended {
            self.routes[id.0].block_head(&mut self.trains);
        }
        if let Some(chosen) = self.scheduler.select(&readiness.ready) {
            self.dispatch(chosen)?;
        }

        let handle = self
            .clock
            .schedule(self.scheduler.quantum, Process::SchedulerTick)?;
        self.scheduler.set_pending_tick(handle);
        Ok(())
    }

    /// Claim the route's footprint and start its oldest waiting train
    fn dispatch(&mut self, id: RouteId) -> Result<(), SimError> {
        let now = self.clock.now();
        let route = &mut self.routes[id.0];

        if !self.pool.try_acquire_all(id, route.footprint()) {
            debug!("t={:.3} route {} lost its footprint before dispatch", now, route.name);
            return Ok(());
        }

        match route.begin_service(&mut self.trains, now)? {
            Some((train, duration)) => {
                debug!(
                    "t={:.3} dispatch train {} on {} for {:.3}",
                    now, train.0, route.name, duration
                );
                self.clock
                    .schedule(duration, Process::ServiceComplete { route: id, train })?;
                self.scheduler.record_dispatch();
            }
            None => self.pool.release_all(id, route.footprint()),
        }
        Ok(())
    }

    fn on_service_complete(&mut self, id: RouteId, train: TrainId) -> Result<(), SimError> {
        let now = self.clock.now();
        let route = &mut self.routes[id.0];
        route.complete_service(&mut self.trains, train, now);
        self.pool.release_all(id, route.footprint());
        debug!("t={:.3} train {} cleared {}", now, train.0, route.name);

        if self.scheduler.wake_on_release {
            if let Some(mut handle) = self.scheduler.take_pending_tick() {
                if self.clock.cancel(handle) {
                    handle = self.clock.schedule(0.0, Process::SchedulerTick)?;
                }
                self.scheduler.set_pending_tick(handle);
            }
        }
        Ok(())
    }

    fn on_sample_queues(&mut self) -> Result<(), SimError> {
        let now = self.clock.now();
        for route in &mut self.routes {
            route.sample_queue_length(now);
        }
        self.clock
            .schedule(self.config.queue_sample_interval, Process::SampleQueues)?;
        Ok(())
    }

    fn on_snapshot_resources(&mut self) -> Result<(), SimError> {
        let holders = self
            .pool
            .slots()
            .iter()
            .map(|slot| {
                let holder = slot
                    .holder
                    .and_then(|id| self.topology.route_name(id))
                    .map(str::to_string);
                (slot.key.clone(), holder)
            })
            .collect();
        self.resource_snapshots.push(ResourceSnapshot {
            time: self.clock.now(),
            holders,
        });

        if let Some(interval) = self.config.resource_snapshot_interval {
            self.clock.schedule(interval, Process::SnapshotResources)?;
        }
        Ok(())
    }

    fn on_progress(&mut self, horizon: SimTime) -> Result<(), SimError> {
        let now = self.clock.now();
        info!("{:.0} % done", (now / horizon * 100.0).round());

        let interval = horizon / f64::from(PROGRESS_STEPS);
        if now + interval <= horizon {
            self.clock.schedule(interval, Process::Progress { horizon })?;
        }
        Ok(())
    }

    pub fn now(&self) -> SimTime {
        self.clock.now()
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn topology(&self) -> &JunctionTopology {
        &self.topology
    }

    pub fn pool(&self) -> &ResourcePool {
        &self.pool
    }

    pub fn scheduler(&self) -> &JunctionScheduler {
        &self.scheduler
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn route(&self, name: &str) -> Option<&Route> {
        self.topology
            .route_id(name)
            .and_then(|id| self.routes.get(id.0))
    }

    fn route_or_err(&self, name: &str) -> Result<&Route, StatsError> {
        self.route(name)
            .ok_or_else(|| StatsError::UnknownRoute(name.to_string()))
    }

    pub fn trains(&self) -> &BTreeMap<TrainId, Train> {
        &self.trains
    }

    pub fn train(&self, id: TrainId) -> Option<&Train> {
        self.trains.get(&id)
    }

    /// One row per train, completed or still in flight, in id order
    pub fn train_records(&self) -> Vec<TrainRecord> {
        self.trains.values().map(Train::record).collect()
    }

    pub fn resource_snapshots(&self) -> &[ResourceSnapshot] {
        &self.resource_snapshots
    }

    pub fn queue_length(&self, route: &str) -> Result<usize, StatsError> {
        Ok(self.route_or_err(route)?.queue_length())
    }

    pub fn mean_queue_length(
        &self,
        route: &str,
        start: SimTime,
        end: SimTime,
    ) -> Result<f64, StatsError> {
        self.route_or_err(route)?
            .stats
            .mean_queue_length(route, start, end)
    }

    pub fn mean_waiting_time(
        &self,
        route: &str,
        start: SimTime,
        end: SimTime,
    ) -> Result<f64, StatsError> {
        self.route_or_err(route)?
            .stats
            .mean_waiting_time(route, start, end)
    }

    pub fn mean_service_time(
        &self,
        route: &str,
        start: SimTime,
        end: SimTime,
    ) -> Result<f64, StatsError> {
        self.route_or_err(route)?
            .stats
            .mean_service_time(route, start, end)
    }

    /// Queue lengths at each sample time, rebuilt from the train table
    pub fn reconstructed_queue_lengths(
        &self,
        route: &str,
    ) -> Result<Vec<(SimTime, usize)>, StatsError> {
        let sample_times: Vec<SimTime> = self
            .route_or_err(route)?
            .stats
            .queue_lengths
            .iter()
            .map(|(time, _)| time)
            .collect();
        let trains = self.trains.values().filter(|train| train.route == route);
        Ok(reconstructed_queue_lengths(sample_times, trains))
    }

    /// Aggregate export for every route over `[start, end]`
    pub fn route_statistics(&self, start: SimTime, end: SimTime) -> Vec<RouteStatistics> {
        self.routes
            .iter()
            .map(|route| RouteStatistics {
                route: route.name.clone(),
                mean_queue_length: route.stats.mean_queue_length(&route.name, start, end).ok(),
                mean_waiting_time: route.stats.mean_waiting_time(&route.name, start, end).ok(),
                arrival_rate: route.arrival_rate(),
                service_rate: route.service_rate(),
                start,
                end,
                admitted: route.stats.admitted,
                rejected: route.stats.rejected,
                completed: route.stats.completed,
            })
            .collect()
    }

    pub fn summary(&self) -> JunctionSummary {
        let trains_in_service = self.routes.iter().map(Route::in_service_count).sum();
        let trains_waiting = self.routes.iter().map(Route::queue_length).sum();
        JunctionSummary {
            elapsed_time: self.clock.now(),
            events_fired: self.clock.fired(),
            total_trains: self.trains.len(),
            trains_completed: self.routes.iter().map(|r| r.stats.completed).sum(),
            trains_in_service,
            trains_waiting,
            arrivals_rejected: self.routes.iter().map(|r| r.stats.rejected).sum(),
            scheduler_ticks: self.scheduler.ticks,
            dispatches: self.scheduler.dispatches,
            contended_checks: self.scheduler.contended_checks,
        }
    }

    /// Print a summary of the junction and its routes over a statistics window
    pub fn print_summary(&self, start: SimTime, end: SimTime) {
        let summary = self.summary();
        println!("=== Junction Simulation Summary ===");
        println!("Time: {:.2}", summary.elapsed_time);
        println!(
            "Routes: {}, Segments: {}, Arbitration: {}",
            self.routes.len(),
            self.pool.len(),
            self.scheduler.strategy_name()
        );
        println!(
            "Trains: {} total, {} completed, {} in service, {} waiting, {} turned away",
            summary.total_trains,
            summary.trains_completed,
            summary.trains_in_service,
            summary.trains_waiting,
            summary.arrivals_rejected
        );
        println!(
            "Scheduler: {} ticks, {} dispatches",
            summary.scheduler_ticks, summary.dispatches
        );
        println!();

        let show = |value: Option<f64>| value.map_or_else(|| "no data".to_string(), |v| format!("{:.3}", v));

        println!("--- Routes over [{}, {}] ---", start, end);
        for stats in self.route_statistics(start, end) {
            println!(
                "  {}: mean queue={}, mean wait={}, arrival rate={}, service rate={}",
                stats.route,
                show(stats.mean_queue_length),
                show(stats.mean_waiting_time),
                show(stats.arrival_rate),
                show(stats.service_rate)
            );
        }
    }
}

/// Run a junction from t=0 to `horizon` and hand it back for export
pub fn run(
    topology: JunctionTopology,
    setups: HashMap<String, RouteSetup>,
    horizon: SimTime,
    config: SimConfig,
) -> Result<Junction, SimError> {
    let mut junction = Junction::new(topology, setups, config)?;
    junction.run_until(horizon)?;
    Ok(junction)
}
