//! Tick loop driving the detection core through a scenario.

use super::scenarios::Scenario;
use adsl_core::{
    haversine_distance, AccuracyCounters, AircraftPair, AircraftState, ClosestApproachEntry,
    ConfigUpdate, ConflictDetector, DetectorConfig, TickResult,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Pending,
    Live,
    Gone,
}

/// Summary of one scenario run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub scenario: String,
    pub seed: u64,
    pub ticks: usize,
    pub dt_s: f64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub aircraft_spawned: usize,
    pub aircraft_removed: usize,
    pub peak_aircraft: usize,
    /// Distinct unordered pairs seen over the run
    pub truth_conflict_pairs: usize,
    pub truth_los_pairs: usize,
    pub broadcast_conflict_pairs: usize,
    pub broadcast_los_pairs: usize,
    pub accuracy: AccuracyCounters,
    pub skipped_inputs: usize,
    pub latency_mean_s: Option<f64>,
    pub latency_max_s: Option<f64>,
    /// Closest approach of every pair that lost separation
    pub closest_approach: Vec<ClosestApproachEntry>,
    pub config: DetectorConfig,
}

pub fn run_scenario(
    scenario: &Scenario,
    config: &DetectorConfig,
    ticks: usize,
    dt: f64,
) -> anyhow::Result<RunReport> {
    run_scenario_with(scenario, config, ticks, dt, |_| {})
}

/// Run `ticks` steps of `dt` seconds, calling `observer` after every tick.
pub fn run_scenario_with(
    scenario: &Scenario,
    config: &DetectorConfig,
    ticks: usize,
    dt: f64,
    mut observer: impl FnMut(&TickResult),
) -> anyhow::Result<RunReport> {
    if !(dt.is_finite() && dt > 0.0) {
        anyhow::bail!("time step must be positive, got {}", dt);
    }

    let started_at = Utc::now();
    let mut detector = ConflictDetector::new(config.clone())?;
    let mut phases = vec![Phase::Pending; scenario.aircraft.len()];
    let mut spawned = 0;
    let mut removed = 0;
    let mut peak = 0;
    let mut skipped_inputs = 0;
    let mut closest: BTreeMap<AircraftPair, ClosestApproachEntry> = BTreeMap::new();
    let mut last_accuracy = AccuracyCounters::default();

    tracing::info!(
        "Running scenario {} with {} aircraft for {} ticks",
        scenario.name,
        scenario.aircraft.len(),
        ticks
    );

    for tick in 1..=ticks {
        let t = tick as f64 * dt;

        for (phase, aircraft) in phases.iter_mut().zip(&scenario.aircraft) {
            if *phase != Phase::Pending || aircraft.spawn_s > t {
                continue;
            }
            let state = aircraft
                .path
                .state_at(&aircraft.id, aircraft.category, t - aircraft.spawn_s);
            match detector.on_aircraft_created(&state) {
                Ok(_) => {
                    *phase = Phase::Live;
                    spawned += 1;
                }
                Err(err) => {
                    tracing::warn!("Failed to create {}: {}", aircraft.id, err);
                    *phase = Phase::Gone;
                }
            }
        }

        let states: Vec<AircraftState> = phases
            .iter()
            .zip(&scenario.aircraft)
            .filter(|(phase, _)| **phase == Phase::Live)
            .map(|(_, aircraft)| {
                aircraft
                    .path
                    .state_at(&aircraft.id, aircraft.category, t - aircraft.spawn_s)
            })
            .collect();

        peak = peak.max(detector.aircraft_count());
        let result = detector.on_tick(dt, &states);
        skipped_inputs += result.skipped.len();
        for entry in &result.closest_approach {
            closest.insert(entry.pair.clone(), entry.clone());
        }
        last_accuracy = result.accuracy;
        observer(&result);

        if let Some(radius_m) = scenario.despawn_radius_m {
            for ((phase, aircraft), state) in phases
                .iter_mut()
                .zip(&scenario.aircraft)
                .filter(|(phase, _)| **phase == Phase::Live)
                .zip(&states)
            {
                let from_center =
                    haversine_distance(scenario.center_lat, scenario.center_lon, state.lat, state.lon);
                if from_center <= radius_m {
                    continue;
                }
                match detector.on_aircraft_removed(&aircraft.id) {
                    Ok(()) => removed += 1,
                    Err(err) => tracing::warn!("Failed to remove {}: {}", aircraft.id, err),
                }
                *phase = Phase::Gone;
            }
        }
    }

    let latency = detector.latency();
    let report = RunReport {
        scenario: scenario.name.clone(),
        seed: config.seed,
        ticks,
        dt_s: dt,
        started_at,
        finished_at: Utc::now(),
        aircraft_spawned: spawned,
        aircraft_removed: removed,
        peak_aircraft: peak,
        truth_conflict_pairs: detector.truth_book().conflicts.history().len(),
        truth_los_pairs: detector.truth_book().los.history().len(),
        broadcast_conflict_pairs: detector.broadcast_book().conflicts.history().len(),
        broadcast_los_pairs: detector.broadcast_book().los.history().len(),
        accuracy: last_accuracy,
        skipped_inputs,
        latency_mean_s: latency.mean(),
        latency_max_s: latency.max(),
        closest_approach: closest.into_values().collect(),
        config: config.clone(),
    };

    tracing::info!(
        "Scenario {} done: tp={} fp={} fn={}",
        report.scenario,
        report.accuracy.true_positive,
        report.accuracy.false_positive,
        report.accuracy.false_negative
    );
    Ok(report)
}

/// Mean accuracy counts for one position-noise level.
#[derive(Debug, Clone, Serialize)]
pub struct SweepRow {
    pub hpos_sigma_m: f64,
    pub runs: u64,
    pub mean_true_positive: f64,
    pub mean_false_positive: f64,
    pub mean_false_negative: f64,
}

/// Repeat a scenario over `runs` seeds for each position-noise sigma.
///
/// `build` receives the run seed so random traffic can vary with it.
pub fn noise_sweep(
    build: impl Fn(u64) -> Scenario,
    base: &DetectorConfig,
    sigmas: &[f64],
    runs: u64,
    ticks: usize,
    dt: f64,
) -> anyhow::Result<Vec<SweepRow>> {
    if runs == 0 {
        anyhow::bail!("noise sweep needs at least one run per sigma");
    }

    let mut rows = Vec::with_capacity(sigmas.len());
    for &sigma in sigmas {
        let mut config = base.merged(&ConfigUpdate {
            hpos_sigma_m: Some(sigma),
            ..Default::default()
        })?;

        let mut totals = AccuracyCounters::default();
        for run in 0..runs {
            config.seed = base.seed.wrapping_add(run);
            let scenario = build(config.seed);
            let report = run_scenario(&scenario, &config, ticks, dt)?;
            totals.true_positive += report.accuracy.true_positive;
            totals.false_positive += report.accuracy.false_positive;
            totals.false_negative += report.accuracy.false_negative;
        }

        let n = runs as f64;
        rows.push(SweepRow {
            hpos_sigma_m: sigma,
            runs,
            mean_true_positive: totals.true_positive as f64 / n,
            mean_false_positive: totals.false_positive as f64 / n,
            mean_false_negative: totals.false_negative as f64 / n,
        });
        tracing::debug!("Sweep sigma={} done", sigma);
    }
    Ok(rows)
}
