//! Conflict and loss-of-separation bookkeeping across ticks.

use crate::models::AircraftPair;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Value held by closest-approach cells that never saw a loss of separation.
pub const CLOSEST_SENTINEL_M: f64 = 1e9;

/// Pairs that started or ended on the latest tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PairDelta {
    pub started: Vec<AircraftPair>,
    pub ended: Vec<AircraftPair>,
}

/// Current and cumulative unordered pair sets of one kind (conflict or LOS).
#[derive(Debug, Clone, Default)]
pub struct PairHistory {
    current: BTreeSet<AircraftPair>,
    history: BTreeSet<AircraftPair>,
}

impl PairHistory {
    /// Replace the current set with this tick's pairs.
    pub fn advance(&mut self, current: BTreeSet<AircraftPair>) -> PairDelta {
        let started: Vec<AircraftPair> = current.difference(&self.current).cloned().collect();
        let ended: Vec<AircraftPair> = self.current.difference(&current).cloned().collect();
        self.history.extend(started.iter().cloned());
        self.current = current;
        PairDelta { started, ended }
    }

    pub fn current(&self) -> &BTreeSet<AircraftPair> {
        &self.current
    }

    /// Every pair seen since the last reset.
    pub fn history(&self) -> &BTreeSet<AircraftPair> {
        &self.history
    }

    pub fn clear(&mut self) {
        self.current.clear();
        self.history.clear();
    }
}

/// Conflict and LOS histories for one detection pass.
#[derive(Debug, Clone, Default)]
pub struct StreamBook {
    pub conflicts: PairHistory,
    pub los: PairHistory,
}

impl StreamBook {
    pub fn clear(&mut self) {
        self.conflicts.clear();
        self.los.clear();
    }
}

/// Degraded detection scored against ground truth, over ordered pairs.
/// True negatives are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccuracyCounters {
    pub true_positive: u64,
    pub false_positive: u64,
    pub false_negative: u64,
}

impl AccuracyCounters {
    /// Score one tick and add it to the running totals. Returns this tick's counts.
    pub fn record<T: Ord>(&mut self, truth: &[T], degraded: &[T]) -> AccuracyCounters {
        let truth: BTreeSet<&T> = truth.iter().collect();
        let degraded: BTreeSet<&T> = degraded.iter().collect();

        let tick = AccuracyCounters {
            true_positive: degraded.intersection(&truth).count() as u64,
            false_positive: degraded.difference(&truth).count() as u64,
            false_negative: truth.difference(&degraded).count() as u64,
        };

        self.true_positive += tick.true_positive;
        self.false_positive += tick.false_positive;
        self.false_negative += tick.false_negative;
        tick
    }

    pub fn clear(&mut self) {
        *self = AccuracyCounters::default();
    }
}

/// Slot-indexed minimum CPA distance and minimum actual distance seen
/// while a pair was in loss of separation.
#[derive(Debug, Clone, Default)]
pub struct ClosestApproachMatrix {
    capacity: usize,
    dcpa: Vec<f64>,
    distance: Vec<f64>,
}

impl ClosestApproachMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Grow to `capacity` slots, keeping recorded values.
    pub fn ensure_capacity(&mut self, capacity: usize) {
        if capacity <= self.capacity {
            return;
        }
        let mut dcpa = vec![CLOSEST_SENTINEL_M; capacity * capacity];
        let mut distance = vec![CLOSEST_SENTINEL_M; capacity * capacity];
        for i in 0..self.capacity {
            for j in 0..self.capacity {
                dcpa[i * capacity + j] = self.dcpa[i * self.capacity + j];
                distance[i * capacity + j] = self.distance[i * self.capacity + j];
            }
        }
        self.capacity = capacity;
        self.dcpa = dcpa;
        self.distance = distance;
    }

    /// Forget everything recorded for one slot (row and column).
    pub fn reset_slot(&mut self, slot: usize) {
        if slot >= self.capacity {
            return;
        }
        for other in 0..self.capacity {
            for idx in [slot * self.capacity + other, other * self.capacity + slot] {
                self.dcpa[idx] = CLOSEST_SENTINEL_M;
                self.distance[idx] = CLOSEST_SENTINEL_M;
            }
        }
    }

    pub fn clear(&mut self) {
        self.dcpa.fill(CLOSEST_SENTINEL_M);
        self.distance.fill(CLOSEST_SENTINEL_M);
    }

    /// Lower the stored values for (a, b) where the new ones are smaller.
    pub fn update(&mut self, a: usize, b: usize, dcpa_m: f64, distance_m: f64) {
        if a >= self.capacity || b >= self.capacity {
            return;
        }
        let idx = a * self.capacity + b;
        if dcpa_m < self.dcpa[idx] {
            self.dcpa[idx] = dcpa_m;
        }
        if distance_m < self.distance[idx] {
            self.distance[idx] = distance_m;
        }
    }

    pub fn min_dcpa(&self, a: usize, b: usize) -> f64 {
        self.cell(&self.dcpa, a, b)
    }

    pub fn min_distance(&self, a: usize, b: usize) -> f64 {
        self.cell(&self.distance, a, b)
    }

    /// Whether a loss of separation was ever recorded for (a, b) in either order.
    pub fn has_record(&self, a: usize, b: usize) -> bool {
        self.min_distance(a, b).min(self.min_distance(b, a)) < CLOSEST_SENTINEL_M
    }

    /// Penetration depth of the worst recorded LOS as a percentage of `rpz_m`.
    pub fn los_severity(&self, a: usize, b: usize, rpz_m: f64) -> Option<f64> {
        if !self.has_record(a, b) || rpz_m <= 0.0 {
            return None;
        }
        let min_distance = self.min_distance(a, b).min(self.min_distance(b, a));
        Some((rpz_m - min_distance) / rpz_m * 100.0)
    }

    fn cell(&self, values: &[f64], a: usize, b: usize) -> f64 {
        if a >= self.capacity || b >= self.capacity {
            return CLOSEST_SENTINEL_M;
        }
        values[a * self.capacity + b]
    }
}
