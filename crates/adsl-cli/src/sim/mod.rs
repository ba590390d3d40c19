pub mod paths;
pub mod runner;
pub mod scenarios;

pub use paths::{FlightPath, LinearPath};
pub use runner::{noise_sweep, run_scenario, run_scenario_with, RunReport, SweepRow};
pub use scenarios::{
    create_circle_traffic, create_converging_scenario, create_crossing_scenario,
    create_head_on_scenario, create_parallel_scenario, CircleTraffic, Scenario, ScenarioAircraft,
};
