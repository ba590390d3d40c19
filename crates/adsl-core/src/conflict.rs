//! Conflict detection under degraded surveillance.
//!
//! `ConflictDetector` is what the simulation host talks to. It owns the
//! aircraft roster, the broadcast records and all cumulative bookkeeping.
//! Every tick it runs detection twice, on ground truth and on broadcast
//! data, and scores the broadcast pass against the truth pass.

use crate::bookkeeping::{AccuracyCounters, ClosestApproachMatrix, PairDelta, StreamBook};
use crate::cpa::{self, Detection};
use crate::error::{CoreError, Result};
use crate::models::{AircraftPair, AircraftState, BroadcastRecord, Kinematics};
use crate::roster::{Roster, SlotHandle};
use crate::rules::{
    ConfigUpdate, DegradedView, DetectionSource, DetectorConfig, SeparationOverride,
    SeparationStandard,
};
use crate::surveillance::{LatencyStats, SurveillanceModel};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Geometry of one conflicting ordered pair, by aircraft id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictGeometry {
    pub ownship: String,
    pub intruder: String,
    pub bearing_deg: f64,
    pub distance_m: f64,
    pub dcpa_m: f64,
    pub tcpa_s: f64,
    /// Seconds until the protection zone is entered
    pub tin_s: f64,
    pub tout_s: f64,
}

/// Output of one detection pass plus its cumulative history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamSnapshot {
    pub conflicts: Vec<ConflictGeometry>,
    pub conflict_pairs: BTreeSet<AircraftPair>,
    pub los_pairs: BTreeSet<AircraftPair>,
    pub conflict_changes: PairDelta,
    pub los_changes: PairDelta,
    pub conflict_history: BTreeSet<AircraftPair>,
    pub los_history: BTreeSet<AircraftPair>,
}

/// Per-aircraft detection state after a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AircraftFlag {
    pub id: String,
    /// In conflict according to the active detection source
    pub in_conflict: bool,
    /// Largest time to CPA among active conflicts, 0 when none
    pub tcpa_max_s: f64,
    pub in_conflict_truth: bool,
    pub in_conflict_broadcast: bool,
    pub last_report_s: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosestApproachEntry {
    pub pair: AircraftPair,
    pub min_dcpa_m: f64,
    pub min_distance_m: f64,
    /// Deepest penetration of the protection radius, percent
    pub los_severity_pct: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickResult {
    pub tick: u64,
    pub sim_time_s: f64,
    pub resolve_on: DetectionSource,
    pub truth: StreamSnapshot,
    pub broadcast: StreamSnapshot,
    pub aircraft: Vec<AircraftFlag>,
    /// Counts scored on this tick alone
    pub tick_accuracy: AccuracyCounters,
    /// Running totals since the last reset
    pub accuracy: AccuracyCounters,
    pub closest_approach: Vec<ClosestApproachEntry>,
    /// Aircraft whose broadcast record was refreshed this tick
    pub reported: Vec<String>,
    /// Tick inputs that did not match a live aircraft
    pub skipped: Vec<String>,
}

impl TickResult {
    /// The pass whose output is handed to resolution.
    pub fn active(&self) -> &StreamSnapshot {
        match self.resolve_on {
            DetectionSource::Broadcast => &self.broadcast,
            DetectionSource::GroundTruth => &self.truth,
        }
    }
}

pub struct ConflictDetector<R = ChaCha8Rng> {
    config: DetectorConfig,
    /// Separation the detector was built with, restored by `reset`
    default_separation: SeparationStandard,
    roster: Roster,
    /// Slot-indexed per-aircraft separation standards
    separation: Vec<SeparationStandard>,
    surveillance: SurveillanceModel<R>,
    truth: StreamBook,
    broadcast: StreamBook,
    accuracy: AccuracyCounters,
    closest: ClosestApproachMatrix,
    sim_time_s: f64,
    tick: u64,
}

impl ConflictDetector<ChaCha8Rng> {
    /// Build a detector whose random source is seeded from `config.seed`.
    pub fn new(config: DetectorConfig) -> Result<Self> {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self::with_rng(config, rng)
    }
}

impl Default for ConflictDetector<ChaCha8Rng> {
    fn default() -> Self {
        let config = DetectorConfig::default();
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self::build(config, rng)
    }
}

impl<R: Rng> ConflictDetector<R> {
    pub fn with_rng(config: DetectorConfig, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, rng))
    }

    fn build(config: DetectorConfig, rng: R) -> Self {
        Self {
            default_separation: config.separation,
            config,
            roster: Roster::new(),
            separation: Vec::new(),
            surveillance: SurveillanceModel::with_rng(rng),
            truth: StreamBook::default(),
            broadcast: StreamBook::default(),
            accuracy: AccuracyCounters::default(),
            closest: ClosestApproachMatrix::new(),
            sim_time_s: 0.0,
            tick: 0,
        }
    }

    /// Register a new aircraft and start its broadcast record.
    pub fn on_aircraft_created(&mut self, state: &AircraftState) -> Result<SlotHandle> {
        if ![state.lat, state.lon, state.altitude_m].iter().all(|v| v.is_finite()) {
            return Err(CoreError::invalid(format!(
                "aircraft {} has a non-finite position",
                state.id
            )));
        }

        let slot = self.roster.insert(&state.id)?;
        let capacity = self.roster.capacity();

        if self.separation.len() < capacity {
            self.separation.resize(capacity, self.config.separation);
        }
        self.separation[slot.index] = self.config.separation;
        self.closest.ensure_capacity(capacity);
        self.closest.reset_slot(slot.index);
        self.surveillance.ensure_capacity(capacity);
        self.surveillance
            .create(slot, state, self.sim_time_s, &self.config);

        tracing::info!(aircraft = %state.id, slot = slot.index, "Aircraft created");
        Ok(slot)
    }

    pub fn on_aircraft_removed(&mut self, id: &str) -> Result<()> {
        let slot = self.roster.remove(id)?;
        self.surveillance.remove(slot);
        self.closest.reset_slot(slot.index);
        if let Some(standard) = self.separation.get_mut(slot.index) {
            *standard = self.config.separation;
        }
        tracing::info!(aircraft = %id, slot = slot.index, "Aircraft removed");
        Ok(())
    }

    /// Apply a partial configuration change. On error nothing changes.
    pub fn configure(&mut self, update: &ConfigUpdate) -> Result<()> {
        let next = self.config.merged(update).inspect_err(|err| {
            tracing::warn!("Rejected configuration update: {}", err);
        })?;

        if let Some(separation) = &update.separation {
            let updated: Vec<SeparationStandard> =
                self.separation.iter().map(|s| s.apply(separation)).collect();
            for standard in &updated {
                standard.validate().inspect_err(|err| {
                    tracing::warn!("Rejected separation update: {}", err);
                })?;
            }
            self.separation = updated;
        }

        self.config = next;
        tracing::info!(
            rpz_m = self.config.separation.rpz_m,
            hpz_m = self.config.separation.hpz_m,
            hpos_sigma_m = self.config.noise.hpos_sigma_m,
            update_probability = self.config.update_probability,
            codec = self.config.codec_enabled,
            "Detector configured"
        );
        Ok(())
    }

    /// Override the separation standard of a single aircraft.
    pub fn set_separation(&mut self, id: &str, update: &SeparationOverride) -> Result<()> {
        let slot = self.roster.resolve(id)?;
        let next = self.separation_of(slot.index).apply(update);
        next.validate()?;
        if let Some(standard) = self.separation.get_mut(slot.index) {
            *standard = next;
        }
        Ok(())
    }

    /// Clear history, counters and closest-approach records and restore the
    /// separation the detector was built with. Broadcast records are left
    /// untouched.
    pub fn reset(&mut self) {
        self.truth.clear();
        self.broadcast.clear();
        self.accuracy.clear();
        self.closest.clear();
        self.config.separation = self.default_separation;
        self.separation.fill(self.default_separation);
        tracing::info!("Detection history reset");
    }

    pub fn reset_surveillance_stats(&mut self) {
        self.surveillance.reset_stats();
    }

    /// Advance the simulation by `dt` seconds and run both detection passes.
    pub fn on_tick(&mut self, dt: f64, states: &[AircraftState]) -> TickResult {
        if dt.is_finite() && dt >= 0.0 {
            self.sim_time_s += dt;
        } else {
            tracing::warn!("Ignoring invalid time step {}", dt);
        }
        self.tick += 1;
        let now = self.sim_time_s;

        let mut skipped = Vec::new();
        let mut seen = HashSet::new();
        let mut entries: Vec<(SlotHandle, &AircraftState)> = Vec::with_capacity(states.len());
        for state in states {
            match self.roster.resolve(&state.id) {
                Ok(slot) if seen.insert(slot.index) => entries.push((slot, state)),
                Ok(_) => {
                    tracing::warn!("Duplicate state for aircraft {} in tick input", state.id);
                    skipped.push(state.id.clone());
                }
                Err(err) => {
                    tracing::warn!("Skipping aircraft {}: {}", state.id, err);
                    skipped.push(state.id.clone());
                }
            }
        }
        entries.sort_by_key(|(slot, _)| slot.index);

        let reported_slots = self.surveillance.update(now, &entries, &self.config);

        let ids: Vec<&str> = entries.iter().map(|(_, s)| s.id.as_str()).collect();
        let truth: Vec<Kinematics> = entries.iter().map(|(_, s)| s.kinematics()).collect();
        let broadcast: Vec<Kinematics> = entries
            .iter()
            .map(|&(slot, state)| match self.surveillance.record(slot) {
                Some(record) => record.kinematics(),
                None => {
                    tracing::warn!("No broadcast record for {}, using true state", state.id);
                    state.kinematics()
                }
            })
            .collect();
        let standards: Vec<SeparationStandard> = entries
            .iter()
            .map(|(slot, _)| self.separation_of(slot.index))
            .collect();

        let truth_pass = cpa::detect(&truth, &truth, &standards);
        let broadcast_pass = match self.config.degraded_view {
            DegradedView::Both => cpa::detect(&broadcast, &broadcast, &standards),
            DegradedView::IntruderOnly => cpa::detect(&truth, &broadcast, &standards),
        };

        for &(i, j) in &truth_pass.los {
            self.closest.update(
                entries[i].0.index,
                entries[j].0.index,
                truth_pass.dcpa.get(i, j),
                truth_pass.distance.get(i, j),
            );
        }

        let tick_accuracy = self
            .accuracy
            .record(&truth_pass.conflicts, &broadcast_pass.conflicts);

        let truth_snapshot = snapshot(&mut self.truth, &truth_pass, &ids);
        let broadcast_snapshot = snapshot(&mut self.broadcast, &broadcast_pass, &ids);

        let active = match self.config.resolve_on {
            DetectionSource::Broadcast => &broadcast_pass,
            DetectionSource::GroundTruth => &truth_pass,
        };
        let aircraft = entries
            .iter()
            .enumerate()
            .map(|(k, &(slot, state))| AircraftFlag {
                id: state.id.clone(),
                in_conflict: active.in_conflict[k],
                tcpa_max_s: active.tcpa_max[k],
                in_conflict_truth: truth_pass.in_conflict[k],
                in_conflict_broadcast: broadcast_pass.in_conflict[k],
                last_report_s: self.surveillance.record(slot).map(|r| r.last_update_s),
            })
            .collect();

        let reported = reported_slots
            .into_iter()
            .filter_map(|slot| self.roster.id_of(slot).ok().map(str::to_string))
            .collect();

        tracing::debug!(
            tick = self.tick,
            aircraft = entries.len(),
            truth_conflicts = truth_snapshot.conflict_pairs.len(),
            broadcast_conflicts = broadcast_snapshot.conflict_pairs.len(),
            truth_los = truth_snapshot.los_pairs.len(),
            "Tick processed"
        );

        TickResult {
            tick: self.tick,
            sim_time_s: now,
            resolve_on: self.config.resolve_on,
            truth: truth_snapshot,
            broadcast: broadcast_snapshot,
            aircraft,
            tick_accuracy,
            accuracy: self.accuracy,
            closest_approach: self.closest_approaches(),
            reported,
            skipped,
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn sim_time_s(&self) -> f64 {
        self.sim_time_s
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn aircraft_count(&self) -> usize {
        self.roster.len()
    }

    pub fn broadcast_state(&self, id: &str) -> Result<&BroadcastRecord> {
        let slot = self.roster.resolve(id)?;
        self.surveillance
            .record(slot)
            .ok_or_else(|| CoreError::stale(id))
    }

    pub fn separation(&self, id: &str) -> Result<SeparationStandard> {
        let slot = self.roster.resolve(id)?;
        Ok(self.separation_of(slot.index))
    }

    pub fn accuracy(&self) -> AccuracyCounters {
        self.accuracy
    }

    pub fn truth_book(&self) -> &StreamBook {
        &self.truth
    }

    pub fn broadcast_book(&self) -> &StreamBook {
        &self.broadcast
    }

    /// Current conflict pairs of the pass selected by `resolve_on`.
    pub fn active_conflicts(&self) -> &BTreeSet<AircraftPair> {
        match self.config.resolve_on {
            DetectionSource::Broadcast => self.broadcast.conflicts.current(),
            DetectionSource::GroundTruth => self.truth.conflicts.current(),
        }
    }

    pub fn latency(&self) -> &LatencyStats {
        self.surveillance.latency()
    }

    /// Recorded closest approach for two live aircraft, if they ever lost separation.
    pub fn closest_approach(&self, a: &str, b: &str) -> Result<Option<ClosestApproachEntry>> {
        let slot_a = self.roster.resolve(a)?;
        let slot_b = self.roster.resolve(b)?;
        Ok(self.closest_entry((slot_a.index, a), (slot_b.index, b)))
    }

    /// Every live pair with a recorded loss of separation.
    pub fn closest_approaches(&self) -> Vec<ClosestApproachEntry> {
        let live: Vec<(usize, &str)> = self
            .roster
            .live()
            .map(|(slot, id)| (slot.index, id))
            .collect();

        let mut entries = Vec::new();
        for (k, &a) in live.iter().enumerate() {
            for &b in &live[k + 1..] {
                if let Some(entry) = self.closest_entry(a, b) {
                    entries.push(entry);
                }
            }
        }
        entries
    }

    fn closest_entry(&self, a: (usize, &str), b: (usize, &str)) -> Option<ClosestApproachEntry> {
        let (slot_a, slot_b) = (a.0, b.0);
        if !self.closest.has_record(slot_a, slot_b) {
            return None;
        }
        let rpz_m = self
            .separation_of(slot_a)
            .pairwise(&self.separation_of(slot_b))
            .rpz_m;
        Some(ClosestApproachEntry {
            pair: AircraftPair::new(a.1, b.1),
            min_dcpa_m: self
                .closest
                .min_dcpa(slot_a, slot_b)
                .min(self.closest.min_dcpa(slot_b, slot_a)),
            min_distance_m: self
                .closest
                .min_distance(slot_a, slot_b)
                .min(self.closest.min_distance(slot_b, slot_a)),
            los_severity_pct: self.closest.los_severity(slot_a, slot_b, rpz_m),
        })
    }

    fn separation_of(&self, slot: usize) -> SeparationStandard {
        self.separation
            .get(slot)
            .copied()
            .unwrap_or(self.config.separation)
    }
}

fn unordered(pairs: &[(usize, usize)], ids: &[&str]) -> BTreeSet<AircraftPair> {
    pairs
        .iter()
        .map(|&(i, j)| AircraftPair::new(ids[i], ids[j]))
        .collect()
}

fn snapshot(book: &mut StreamBook, detection: &Detection, ids: &[&str]) -> StreamSnapshot {
    let conflict_pairs = unordered(&detection.conflicts, ids);
    let los_pairs = unordered(&detection.los, ids);
    let conflict_changes = book.conflicts.advance(conflict_pairs.clone());
    let los_changes = book.los.advance(los_pairs.clone());

    let conflicts = detection
        .geometry
        .iter()
        .map(|g| ConflictGeometry {
            ownship: ids[g.ownship].to_string(),
            intruder: ids[g.intruder].to_string(),
            bearing_deg: g.bearing_deg,
            distance_m: g.distance_m,
            dcpa_m: g.dcpa_m,
            tcpa_s: g.tcpa_s,
            tin_s: g.tin_s,
            tout_s: g.tout_s,
        })
        .collect();

    StreamSnapshot {
        conflicts,
        conflict_pairs,
        los_pairs,
        conflict_changes,
        los_changes,
        conflict_history: book.conflicts.history().clone(),
        los_history: book.los.history().clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::offset_by_bearing;

    fn quiet_config() -> DetectorConfig {
        let mut config = DetectorConfig::default();
        config.noise.nav_noise = false;
        config.noise.phase_sigma_s = 0.0;
        config.emergency_probability = 0.0;
        config
    }

    fn east_of(id: &str, distance_m: f64) -> AircraftState {
        let (lat, lon) = offset_by_bearing(52.0, 4.0, distance_m, 90.0_f64.to_radians());
        AircraftState::new(id, lat, lon, 100.0)
    }

    #[test]
    fn duplicate_create_leaves_roster_unchanged() {
        let mut detector = ConflictDetector::new(quiet_config()).unwrap();
        detector.on_aircraft_created(&east_of("A", 0.0)).unwrap();
        let err = detector.on_aircraft_created(&east_of("A", 10.0)).unwrap_err();
        assert_eq!(err, CoreError::DuplicateAircraft { id: "A".into() });
        assert_eq!(detector.aircraft_count(), 1);
        assert_eq!(detector.broadcast_state("A").unwrap().lat, 52.0);
    }

    #[test]
    fn non_finite_position_is_rejected() {
        let mut detector = ConflictDetector::default();
        let state = AircraftState::new("A", f64::NAN, 4.0, 100.0);
        assert!(matches!(
            detector.on_aircraft_created(&state),
            Err(CoreError::InvalidConfiguration(_))
        ));
        assert_eq!(detector.aircraft_count(), 0);
    }

    #[test]
    fn unknown_aircraft_are_skipped_not_fatal() {
        let mut detector = ConflictDetector::new(quiet_config()).unwrap();
        let a = east_of("A", 0.0);
        let b = east_of("B", 20.0);
        detector.on_aircraft_created(&a).unwrap();
        detector.on_aircraft_created(&b).unwrap();

        let ghost = east_of("GHOST", 10.0);
        let result = detector.on_tick(1.0, &[a, ghost, b]);
        assert_eq!(result.skipped, vec!["GHOST".to_string()]);
        assert_eq!(result.truth.los_pairs.len(), 1);
        assert_eq!(result.aircraft.len(), 2);
    }

    #[test]
    fn removing_unknown_aircraft_is_stale() {
        let mut detector = ConflictDetector::default();
        assert!(matches!(
            detector.on_aircraft_removed("nobody"),
            Err(CoreError::StaleReference { .. })
        ));
        assert!(detector.broadcast_state("nobody").is_err());
    }

    #[test]
    fn rejected_configure_keeps_previous_config() {
        let mut detector = ConflictDetector::default();
        let before = detector.config().clone();
        let update = ConfigUpdate {
            hpos_sigma_m: Some(7.0),
            separation: Some(SeparationOverride {
                lookahead_s: Some(0.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(matches!(
            detector.configure(&update),
            Err(CoreError::InvalidConfiguration(_))
        ));
        assert_eq!(detector.config(), &before);
    }

    #[test]
    fn per_aircraft_override_widens_pair_radius() {
        let mut detector = ConflictDetector::new(quiet_config()).unwrap();
        let a = east_of("A", 0.0);
        let b = east_of("B", 80.0);
        detector.on_aircraft_created(&a).unwrap();
        detector.on_aircraft_created(&b).unwrap();

        let result = detector.on_tick(1.0, &[a.clone(), b.clone()]);
        assert!(result.truth.los_pairs.is_empty());

        let wider = SeparationOverride {
            rpz_m: Some(100.0),
            ..Default::default()
        };
        detector.set_separation("B", &wider).unwrap();
        assert_eq!(detector.separation("B").unwrap().rpz_m, 100.0);
        assert_eq!(detector.separation("A").unwrap().rpz_m, 50.0);

        let result = detector.on_tick(1.0, &[a, b]);
        assert_eq!(result.truth.los_pairs.len(), 1);

        let bad = SeparationOverride {
            hpz_m: Some(-1.0),
            ..Default::default()
        };
        assert!(detector.set_separation("B", &bad).is_err());
        assert_eq!(detector.separation("B").unwrap().rpz_m, 100.0);
    }

    #[test]
    fn closest_approach_and_severity_from_truth() {
        let mut detector = ConflictDetector::new(quiet_config()).unwrap();
        let a = east_of("A", 0.0);
        let b = east_of("B", 20.0);
        detector.on_aircraft_created(&a).unwrap();
        detector.on_aircraft_created(&b).unwrap();
        let result = detector.on_tick(1.0, &[a, b]);

        assert_eq!(result.closest_approach.len(), 1);
        let entry = detector.closest_approach("B", "A").unwrap().unwrap();
        assert!((entry.min_distance_m - 20.0).abs() < 0.01);
        assert!((entry.los_severity_pct.unwrap() - 60.0).abs() < 0.1);
    }

    #[test]
    fn reset_clears_history_but_not_broadcast() {
        let mut detector = ConflictDetector::new(quiet_config()).unwrap();
        let a = east_of("A", 0.0);
        let b = east_of("B", 20.0);
        detector.on_aircraft_created(&a).unwrap();
        detector.on_aircraft_created(&b).unwrap();
        detector
            .configure(&ConfigUpdate {
                separation: Some(SeparationOverride {
                    rpz_m: Some(75.0),
                    ..Default::default()
                }),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(detector.separation("A").unwrap().rpz_m, 75.0);

        detector.on_tick(1.0, &[a, b]);
        assert!(!detector.truth_book().los.history().is_empty());
        let record_lon = detector.broadcast_state("B").unwrap().lon;

        detector.reset();
        assert!(detector.truth_book().los.history().is_empty());
        assert!(detector.broadcast_book().conflicts.history().is_empty());
        assert_eq!(detector.accuracy(), AccuracyCounters::default());
        assert!(detector.closest_approaches().is_empty());
        assert_eq!(detector.config().separation, SeparationStandard::default());
        assert_eq!(detector.separation("A").unwrap(), SeparationStandard::default());
        assert_eq!(detector.broadcast_state("B").unwrap().lon, record_lon);
    }

    #[test]
    fn reset_restores_configured_separation() {
        let mut config = quiet_config();
        config.separation.rpz_m = 100.0;
        let mut detector = ConflictDetector::new(config).unwrap();
        detector.on_aircraft_created(&east_of("A", 0.0)).unwrap();
        detector
            .configure(&ConfigUpdate {
                separation: Some(SeparationOverride {
                    rpz_m: Some(40.0),
                    ..Default::default()
                }),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(detector.separation("A").unwrap().rpz_m, 40.0);

        detector.reset();
        assert_eq!(detector.config().separation.rpz_m, 100.0);
        assert_eq!(detector.separation("A").unwrap().rpz_m, 100.0);
    }

    #[test]
    fn reused_slot_starts_with_clean_records() {
        let mut detector = ConflictDetector::new(quiet_config()).unwrap();
        let a = east_of("A", 0.0);
        let b = east_of("B", 20.0);
        detector.on_aircraft_created(&a).unwrap();
        detector.on_aircraft_created(&b).unwrap();
        detector.on_tick(1.0, &[a.clone(), b]);

        detector.on_aircraft_removed("B").unwrap();
        let c = east_of("C", 500.0);
        let slot = detector.on_aircraft_created(&c).unwrap();
        assert_eq!(slot.index, 1);
        assert_eq!(detector.closest_approach("A", "C").unwrap(), None);

        let result = detector.on_tick(1.0, &[a, c]);
        assert!(result.truth.los_pairs.is_empty());
        assert_eq!(result.truth.los_changes.ended.len(), 1);
        // History keeps the pair seen before the removal.
        assert_eq!(result.truth.los_history.len(), 1);
    }

    #[test]
    fn resolve_on_selects_active_pass() {
        let mut config = quiet_config();
        config.update_probability = 0.0;
        let mut detector = ConflictDetector::new(config).unwrap();

        // Broadcast records freeze at 1 km; truth then jumps into LOS range.
        detector.on_aircraft_created(&east_of("A", 0.0)).unwrap();
        detector.on_aircraft_created(&east_of("B", 1000.0)).unwrap();
        let states = [
            east_of("A", 0.0).with_velocity(90.0, 5.0, 0.0),
            east_of("B", 30.0).with_velocity(270.0, 5.0, 0.0),
        ];

        let result = detector.on_tick(1.0, &states);
        assert!(result.reported.is_empty());
        assert_eq!(result.truth.conflict_pairs.len(), 1);
        assert!(result.broadcast.conflict_pairs.is_empty());
        assert!(result.aircraft.iter().all(|a| !a.in_conflict && a.in_conflict_truth));
        assert_eq!(result.tick_accuracy.false_negative, 2);
        assert!(detector.active_conflicts().is_empty());

        detector
            .configure(&ConfigUpdate {
                resolve_on: Some(DetectionSource::GroundTruth),
                ..Default::default()
            })
            .unwrap();
        let result = detector.on_tick(1.0, &states);
        assert!(result.aircraft.iter().all(|a| a.in_conflict && a.tcpa_max_s > 0.0));
        assert_eq!(result.active().conflict_pairs.len(), 1);
        assert_eq!(detector.active_conflicts().len(), 1);
        assert_eq!(detector.accuracy().false_negative, 4);
    }

    #[test]
    fn intruder_only_view_uses_true_ownship() {
        let mut config = quiet_config();
        config.update_probability = 0.0;
        config.degraded_view = DegradedView::IntruderOnly;
        let mut detector = ConflictDetector::new(config).unwrap();

        detector.on_aircraft_created(&east_of("A", 0.0)).unwrap();
        detector.on_aircraft_created(&east_of("B", 1000.0)).unwrap();
        // A moved next to B's frozen broadcast position; B really moved away.
        let states = [east_of("A", 980.0), east_of("B", 3000.0)];

        let result = detector.on_tick(1.0, &states);
        assert!(result.truth.los_pairs.is_empty());
        // Only A sees B inside its zone: one ordered pair.
        assert_eq!(result.broadcast.los_pairs.len(), 1);
        assert!(result.aircraft[0].in_conflict_broadcast);
        assert!(!result.aircraft[1].in_conflict_broadcast);
    }
}
