use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use log::{error, info};

use junction_sim::scenario::{run_standard, ScenarioParams};
use junction_sim::simulation::{
    conflict_overlaps, fifo_violations, ArbitrationKind, SimConfig, STANDARD_ROUTES,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Strategy {
    Random,
    RoundRobin,
    Priority,
}

#[derive(Parser)]
#[command(name = "junction_sim")]
#[command(about = "Discrete-event simulation of trains through a shared-track junction")]
struct Cli {
    /// Simulated time to run for
    #[arg(long, default_value = "1320")]
    horizon: f64,

    /// Seed for duration sources and arbitration
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Trains per hour on the main line (a-b, b-a)
    #[arg(long, default_value = "6")]
    main_trains_per_hour: f64,

    /// Trains per hour on the side branch (a-c, c-a)
    #[arg(long, default_value = "6")]
    side_trains_per_hour: f64,

    /// Service rate of every route, in trains per time unit
    #[arg(long, default_value = "0.3")]
    service_rate: f64,

    /// Turn away arrivals once this many trains are queued on a route
    #[arg(long)]
    queue_capacity: Option<usize>,

    /// How the scheduler picks among ready routes
    #[arg(long, value_enum, default_value = "random")]
    strategy: Strategy,

    /// Route order for the priority strategy, highest first (default: a-b,a-c,b-a,c-a)
    #[arg(long, value_delimiter = ',')]
    priority: Vec<String>,

    /// Poll again as soon as a train clears the junction
    #[arg(long)]
    wake_on_release: bool,

    /// Start of the statistics window
    #[arg(long, default_value = "60")]
    window_start: f64,

    /// End of the statistics window
    #[arg(long, default_value = "1260")]
    window_end: f64,

    /// Log progress every percent of the horizon
    #[arg(long)]
    progress: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run_headless(cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

/// Run the standard junction and report its statistics
fn run_headless(cli: Cli) -> Result<()> {
    if cli.window_start > cli.window_end {
        bail!(
            "Statistics window is empty: start {} is after end {}",
            cli.window_start,
            cli.window_end
        );
    }

    let params = ScenarioParams {
        main_arrival_rate: cli.main_trains_per_hour / 60.0,
        side_arrival_rate: cli.side_trains_per_hour / 60.0,
        default_service_rate: cli.service_rate,
        queue_capacity: cli.queue_capacity,
        seed: cli.seed,
        ..ScenarioParams::default()
    };

    let config = SimConfig {
        seed: cli.seed,
        log_progress: cli.progress,
        wake_on_release: cli.wake_on_release,
        arbitration: match cli.strategy {
            Strategy::Random => ArbitrationKind::Random,
            Strategy::RoundRobin => ArbitrationKind::RoundRobin,
            Strategy::Priority if cli.priority.is_empty() => ArbitrationKind::Priority(
                STANDARD_ROUTES.iter().map(|route| route.to_string()).collect(),
            ),
            Strategy::Priority => ArbitrationKind::Priority(cli.priority.clone()),
        },
        ..SimConfig::default()
    };

    info!("Running junction simulation until t={}", cli.horizon);
    let junction = run_standard(&params, cli.horizon, config)?;

    junction.print_summary(cli.window_start, cli.window_end);

    let records = junction.train_records();
    let conflicts = conflict_overlaps(&records, junction.topology());
    let out_of_order = fifo_violations(&records);
    let summary = junction.summary();

    info!("=== SIMULATION COMPLETE ===");
    info!("Elapsed time: {:.2}", summary.elapsed_time);
    info!("Total trains: {}", summary.total_trains);
    info!("Trains completed: {}", summary.trains_completed);
    info!("Arrivals rejected: {}", summary.arrivals_rejected);
    info!("Conflicting overlaps: {}", conflicts);
    info!("FIFO violations: {}", out_of_order.len());

    if conflicts > 0 {
        bail!("{} overlapping services on conflicting routes", conflicts);
    }
    Ok(())
}
