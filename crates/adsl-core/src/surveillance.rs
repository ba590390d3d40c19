//! Surveillance degradation model.
//!
//! Holds the broadcast record of every aircraft and refreshes it on the
//! ticks the aircraft reports. Reporting aircraft get navigation noise on
//! position and ground speed and, optionally, codec quantization on ground
//! speed and track. Silent aircraft keep their stale record, which is what
//! introduces latency into degraded detection.

use crate::codec;
use crate::models::{AircraftState, BroadcastRecord};
use crate::roster::SlotHandle;
use crate::rules::DetectorConfig;
use crate::spatial::flat_earth_delta_deg;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Time elapsed between consecutive reports, across all aircraft.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LatencyStats {
    samples: Vec<f64>,
}

impl LatencyStats {
    pub fn push(&mut self, elapsed_s: f64) {
        self.samples.push(elapsed_s);
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
    }

    pub fn max(&self) -> Option<f64> {
        self.samples.iter().copied().reduce(f64::max)
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Codec round-trip of the transmitted fields of one aircraft.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantizedView {
    pub altitude_m: f64,
    pub ground_speed_mps: f64,
    pub vertical_speed_mps: f64,
    pub track_deg: Option<f64>,
}

/// What a receiver would decode for `state`. Diagnostic only: the live
/// broadcast record never carries the quantized altitude.
pub fn quantized_view(state: &AircraftState) -> QuantizedView {
    QuantizedView {
        altitude_m: codec::round_trip_altitude(state.altitude_m),
        ground_speed_mps: codec::round_trip_ground_speed(state.ground_speed_mps),
        vertical_speed_mps: codec::round_trip_vertical_speed(state.vertical_speed_mps),
        track_deg: codec::round_trip_track(Some(state.track_deg)),
    }
}

pub struct SurveillanceModel<R = ChaCha8Rng> {
    rng: R,
    /// Slot-indexed broadcast records
    records: Vec<Option<BroadcastRecord>>,
    latency: LatencyStats,
}

impl SurveillanceModel<ChaCha8Rng> {
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> SurveillanceModel<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            records: Vec::new(),
            latency: LatencyStats::default(),
        }
    }

    /// Grow the slot table to the roster capacity.
    pub fn ensure_capacity(&mut self, capacity: usize) {
        if self.records.len() < capacity {
            self.records.resize(capacity, None);
        }
    }

    /// Start broadcasting for a new aircraft from its true state, with a
    /// random broadcast phase around `now_s`.
    pub fn create(&mut self, slot: SlotHandle, state: &AircraftState, now_s: f64, config: &DetectorConfig) {
        self.ensure_capacity(slot.index + 1);
        let phase: f64 = self.rng.sample::<f64, _>(StandardNormal) * config.noise.phase_sigma_s;
        let emergency = self.rng.random_bool(config.emergency_probability);
        self.records[slot.index] = Some(BroadcastRecord::from_state(state, now_s + phase, emergency));
    }

    pub fn remove(&mut self, slot: SlotHandle) {
        if let Some(record) = self.records.get_mut(slot.index) {
            *record = None;
        }
    }

    pub fn record(&self, slot: SlotHandle) -> Option<&BroadcastRecord> {
        self.records.get(slot.index).and_then(Option::as_ref)
    }

    /// Advance one tick. `truth` lists the live aircraft in slot order;
    /// returns the slots that reported.
    pub fn update(
        &mut self,
        now_s: f64,
        truth: &[(SlotHandle, &AircraftState)],
        config: &DetectorConfig,
    ) -> Vec<SlotHandle> {
        let mut reported = Vec::new();

        for &(slot, state) in truth {
            let reports =
                !config.dropouts_enabled || self.rng.random::<f64>() < config.update_probability;
            if !reports {
                continue;
            }

            let (lat, lon, ground_speed_mps) = if config.noise.nav_noise {
                let angle = self.rng.random_range(0.0..TAU);
                let radial_m = self.rng.sample::<f64, _>(StandardNormal) * config.noise.hpos_sigma_m;
                let gs_noise =
                    self.rng.sample::<f64, _>(StandardNormal) * config.noise.ground_speed_sigma_mps;
                let (dlat, dlon) =
                    flat_earth_delta_deg(radial_m * angle.sin(), radial_m * angle.cos(), state.lat);
                (state.lat + dlat, state.lon + dlon, state.ground_speed_mps + gs_noise)
            } else {
                (state.lat, state.lon, state.ground_speed_mps)
            };

            let (ground_speed_mps, track_deg) = if config.codec_enabled {
                (
                    codec::round_trip_ground_speed(ground_speed_mps),
                    codec::round_trip_track(Some(state.track_deg)).unwrap_or(state.track_deg),
                )
            } else {
                (ground_speed_mps, state.track_deg)
            };

            let Some(record) = self.records.get_mut(slot.index).and_then(Option::as_mut) else {
                tracing::warn!(aircraft = %state.id, slot = slot.index, "no broadcast record for reporting aircraft");
                continue;
            };

            record.lat = lat;
            record.lon = lon;
            record.ground_speed_mps = ground_speed_mps;
            record.track_deg = track_deg;
            record.altitude_m = state.altitude_m;
            record.vertical_speed_mps = state.vertical_speed_mps;
            record.true_airspeed_mps = state.true_airspeed_mps;
            record.category = state.category;

            self.latency.push(now_s - record.last_update_s);
            record.last_update_s = now_s;
            reported.push(slot);
        }

        reported
    }

    pub fn latency(&self) -> &LatencyStats {
        &self.latency
    }

    /// Clear latency statistics. Broadcast records are kept.
    pub fn reset_stats(&mut self) {
        self.latency.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::haversine_distance;

    fn slot(index: usize) -> SlotHandle {
        SlotHandle {
            index,
            generation: 0,
        }
    }

    fn quiet_config() -> DetectorConfig {
        let mut config = DetectorConfig::default();
        config.noise.phase_sigma_s = 0.0;
        config.emergency_probability = 0.0;
        config
    }

    #[test]
    fn create_copies_true_state() {
        let mut model = SurveillanceModel::seeded(1);
        let state = AircraftState::new("A", 52.0, 4.0, 100.0).with_velocity(45.0, 12.0, -1.0);
        model.create(slot(0), &state, 10.0, &quiet_config());

        let record = model.record(slot(0)).unwrap();
        assert_eq!(record.lat, 52.0);
        assert_eq!(record.ground_speed_mps, 12.0);
        assert_eq!(record.vertical_speed_mps, -1.0);
        assert_eq!(record.last_update_s, 10.0);
        assert!(!record.emergency);
    }

    #[test]
    fn silent_aircraft_keeps_stale_record() {
        let mut config = quiet_config();
        config.update_probability = 0.0;
        let mut model = SurveillanceModel::seeded(2);
        let start = AircraftState::new("A", 52.0, 4.0, 100.0).with_velocity(90.0, 10.0, 0.0);
        model.create(slot(0), &start, 0.0, &config);

        for tick in 1..=20 {
            let moved = AircraftState::new("A", 52.0, 4.0 + tick as f64 * 1e-4, 100.0)
                .with_velocity(90.0, 10.0, 0.0);
            let reported = model.update(tick as f64, &[(slot(0), &moved)], &config);
            assert!(reported.is_empty());
        }

        let record = model.record(slot(0)).unwrap();
        assert_eq!(record.lon, 4.0);
        assert_eq!(record.last_update_s, 0.0);
        assert_eq!(model.latency().count(), 0);
    }

    #[test]
    fn without_nav_noise_record_tracks_truth() {
        let mut config = quiet_config();
        config.noise.nav_noise = false;
        let mut model = SurveillanceModel::seeded(3);
        let state = AircraftState::new("A", 33.0, -117.0, 50.0).with_velocity(10.0, 8.0, 0.5);
        model.create(slot(0), &state, 0.0, &config);

        let moved = AircraftState::new("A", 33.001, -117.001, 55.0).with_velocity(12.0, 9.0, 0.5);
        model.update(1.0, &[(slot(0), &moved)], &config);
        let record = model.record(slot(0)).unwrap();
        assert_eq!(record.lat, 33.001);
        assert_eq!(record.lon, -117.001);
        assert_eq!(record.altitude_m, 55.0);
        assert_eq!(record.track_deg, 12.0);
        assert_eq!(record.ground_speed_mps, 9.0);
    }

    #[test]
    fn nav_noise_perturbs_position_not_altitude() {
        let mut config = quiet_config();
        config.noise.hpos_sigma_m = 20.0;
        let mut model = SurveillanceModel::seeded(4);
        let state = AircraftState::new("A", 52.0, 4.0, 120.0);
        model.create(slot(0), &state, 0.0, &config);

        let mut total_err = 0.0;
        for tick in 1..=50 {
            model.update(tick as f64, &[(slot(0), &state)], &config);
            let record = model.record(slot(0)).unwrap();
            let err = haversine_distance(state.lat, state.lon, record.lat, record.lon);
            assert!(err < 200.0, "noise of {err} m is far outside 10 sigma");
            assert_eq!(record.altitude_m, 120.0);
            total_err += err;
        }
        assert!(total_err / 50.0 > 1.0);
    }

    #[test]
    fn codec_quantizes_speed_and_track() {
        let mut config = quiet_config();
        config.noise.nav_noise = false;
        config.codec_enabled = true;
        let mut model = SurveillanceModel::seeded(5);
        let state = AircraftState::new("A", 52.0, 4.0, 123.4).with_velocity(100.3, 20.1, 0.0);
        model.create(slot(0), &state, 0.0, &config);
        model.update(1.0, &[(slot(0), &state)], &config);

        let record = model.record(slot(0)).unwrap();
        assert_eq!(record.ground_speed_mps, codec::round_trip_ground_speed(20.1));
        let steps = record.track_deg / codec::TRACK_RESOLUTION_DEG;
        assert!((steps - steps.round()).abs() < 1e-9);
        // Altitude is never quantized on the live record.
        assert_eq!(record.altitude_m, 123.4);
    }

    #[test]
    fn latency_samples_time_between_reports() {
        let config = quiet_config();
        let mut model = SurveillanceModel::seeded(6);
        let state = AircraftState::new("A", 52.0, 4.0, 100.0);
        model.create(slot(0), &state, 0.0, &config);
        for tick in 1..=4 {
            model.update(tick as f64 * 0.5, &[(slot(0), &state)], &config);
        }
        assert_eq!(model.latency().count(), 4);
        assert!((model.latency().mean().unwrap() - 0.5).abs() < 1e-12);

        model.reset_stats();
        assert_eq!(model.latency().count(), 0);
        assert!(model.record(slot(0)).is_some());
    }

    #[test]
    fn same_seed_same_broadcast() {
        let config = DetectorConfig::default();
        let state = AircraftState::new("A", 52.0, 4.0, 100.0).with_velocity(30.0, 15.0, 0.0);
        let mut a = SurveillanceModel::seeded(99);
        let mut b = SurveillanceModel::seeded(99);
        a.create(slot(0), &state, 0.0, &config);
        b.create(slot(0), &state, 0.0, &config);
        for tick in 1..=10 {
            a.update(tick as f64, &[(slot(0), &state)], &config);
            b.update(tick as f64, &[(slot(0), &state)], &config);
        }
        let (ra, rb) = (a.record(slot(0)).unwrap(), b.record(slot(0)).unwrap());
        assert_eq!(ra.lat, rb.lat);
        assert_eq!(ra.lon, rb.lon);
        assert_eq!(ra.last_update_s, rb.last_update_s);
    }

    #[test]
    fn quantized_view_rounds_all_fields() {
        let state = AircraftState::new("A", 0.0, 0.0, 4000.4).with_velocity(359.9, -2.0, -3.3);
        let view = quantized_view(&state);
        assert_eq!(view.altitude_m, 4000.0);
        assert_eq!(view.ground_speed_mps, 0.25);
        assert_eq!(view.vertical_speed_mps, -3.25);
        assert_eq!(view.track_deg, Some(0.0));
    }
}
