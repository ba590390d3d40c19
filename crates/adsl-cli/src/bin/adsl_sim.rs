//! Batch simulator for conflict detection under degraded ADS-L surveillance.
//!
//! Flies a scenario through the detection core and prints a JSON report,
//! or sweeps position-noise levels over several seeds.

use adsl_cli::config::{load_detector_config, Config};
use adsl_cli::sim::{
    create_circle_traffic, create_converging_scenario, create_crossing_scenario,
    create_head_on_scenario, create_parallel_scenario, noise_sweep, run_scenario_with,
    CircleTraffic, Scenario,
};
use adsl_core::DetectorConfig;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Available traffic scenarios
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScenarioType {
    /// Two drones closing head-on
    HeadOn,
    /// Two drones on crossing tracks
    Crossing,
    /// Two drones flying parallel paths
    Parallel,
    /// Four drones converging on a point
    Converging,
    /// Random traffic crossing a circular area
    Circle,
}

/// Degraded-surveillance conflict detection simulator
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Detector configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one scenario and print its report
    Run {
        #[command(flatten)]
        sim: SimArgs,

        /// Print a line for every tick with active conflicts
        #[arg(long)]
        verbose: bool,

        /// Write the JSON report to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Compare detection accuracy across position-noise levels
    Sweep {
        #[command(flatten)]
        sim: SimArgs,

        /// Position noise sigmas in meters
        #[arg(long, value_delimiter = ',', default_values_t = [0.0, 1.5, 5.0, 15.0, 50.0])]
        sigmas: Vec<f64>,

        /// Seeds per sigma
        #[arg(long, default_value_t = 5)]
        runs: u64,
    },
}

#[derive(Args, Debug)]
struct SimArgs {
    /// Scenario to simulate
    #[arg(long, value_enum, default_value = "circle")]
    scenario: ScenarioType,

    /// Center latitude (default: Delft)
    #[arg(long, default_value_t = 52.0116)]
    lat: f64,

    /// Center longitude (default: Delft)
    #[arg(long, default_value_t = 4.3571)]
    lon: f64,

    /// Number of aircraft for circle traffic
    #[arg(long, default_value_t = 40)]
    count: usize,

    /// Circle radius in meters
    #[arg(long, default_value_t = 1500.0)]
    radius: f64,

    /// Number of ticks (default: ADSL_TICKS or 120)
    #[arg(long)]
    ticks: Option<usize>,

    /// Tick length in seconds (default: ADSL_DT or 1.0)
    #[arg(long)]
    dt: Option<f64>,

    /// Random seed (default: ADSL_SEED, the config file, or 42)
    #[arg(long)]
    seed: Option<u64>,
}

impl SimArgs {
    fn build_scenario(&self, seed: u64) -> Scenario {
        match self.scenario {
            ScenarioType::HeadOn => create_head_on_scenario(self.lat, self.lon, 300.0, 10.0),
            ScenarioType::Crossing => create_crossing_scenario(self.lat, self.lon),
            ScenarioType::Parallel => create_parallel_scenario(self.lat, self.lon),
            ScenarioType::Converging => create_converging_scenario(self.lat, self.lon),
            ScenarioType::Circle => create_circle_traffic(
                self.lat,
                self.lon,
                &CircleTraffic {
                    radius_m: self.radius,
                    count: self.count,
                    seed,
                    ..Default::default()
                },
            ),
        }
    }
}

struct Resolved {
    detector: DetectorConfig,
    ticks: usize,
    dt: f64,
}

fn resolve(cli_config: Option<&PathBuf>, sim: &SimArgs) -> anyhow::Result<Resolved> {
    let env = Config::from_env();
    let mut detector = load_detector_config(cli_config.map(PathBuf::as_path))?;
    if let Some(seed) = sim.seed {
        detector.seed = seed;
    } else if cli_config.is_none() {
        detector.seed = env.seed;
    }
    Ok(Resolved {
        detector,
        ticks: sim.ticks.unwrap_or(env.ticks),
        dt: sim.dt.unwrap_or(env.dt),
    })
}

fn init_tracing(json: bool) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("adsl_cli=info".parse()?)
        .add_directive("adsl_core=info".parse()?);

    if json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs)?;

    match &cli.command {
        Command::Run {
            sim,
            verbose,
            output,
        } => {
            let resolved = resolve(cli.config.as_ref(), sim)?;
            let scenario = sim.build_scenario(resolved.detector.seed);
            eprintln!(
                "Scenario: {} ({} aircraft, {} ticks of {}s)",
                scenario.name,
                scenario.aircraft.len(),
                resolved.ticks,
                resolved.dt
            );

            let report = run_scenario_with(
                &scenario,
                &resolved.detector,
                resolved.ticks,
                resolved.dt,
                |result| {
                    if !*verbose || result.active().conflict_pairs.is_empty() {
                        return;
                    }
                    let pairs: Vec<String> = result
                        .active()
                        .conflict_pairs
                        .iter()
                        .map(ToString::to_string)
                        .collect();
                    eprintln!(
                        "[{:4}] t={:7.1}s conflicts: {}",
                        result.tick,
                        result.sim_time_s,
                        pairs.join(", ")
                    );
                },
            )?;

            let json = serde_json::to_string_pretty(&report)?;
            match output {
                Some(path) => {
                    std::fs::write(path, json)?;
                    eprintln!("Report written to {}", path.display());
                }
                None => println!("{}", json),
            }
        }
        Command::Sweep { sim, sigmas, runs } => {
            let resolved = resolve(cli.config.as_ref(), sim)?;
            let rows = noise_sweep(
                |seed| sim.build_scenario(seed),
                &resolved.detector,
                sigmas,
                *runs,
                resolved.ticks,
                resolved.dt,
            )?;

            eprintln!("{:>10} {:>10} {:>10} {:>10}", "sigma_m", "TP", "FP", "FN");
            for row in &rows {
                eprintln!(
                    "{:>10.1} {:>10.1} {:>10.1} {:>10.1}",
                    row.hpos_sigma_m,
                    row.mean_true_positive,
                    row.mean_false_positive,
                    row.mean_false_negative
                );
            }
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }
    Ok(())
}
