//! Core data models for the detection core.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Type codes flown as drones in the traffic scenarios.
const DRONE_TYPE_CODES: [&str; 8] = [
    "M600", "AMZN", "MNET", "PHAN4", "M100", "M200", "MAVIC", "HORSEFLY",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AircraftCategory {
    #[default]
    Drone,
    GeneralAviation,
}

impl AircraftCategory {
    /// Classify an aircraft by its type code (case-insensitive).
    pub fn from_type_code(type_code: &str) -> Self {
        let upper = type_code.trim().to_ascii_uppercase();
        if DRONE_TYPE_CODES.contains(&upper.as_str()) {
            AircraftCategory::Drone
        } else {
            AircraftCategory::GeneralAviation
        }
    }
}

/// True kinematic state of one aircraft, supplied by the host each tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AircraftState {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    pub altitude_m: f64,
    /// Track over ground, degrees (0 = north, clockwise)
    #[serde(default)]
    pub track_deg: f64,
    #[serde(default)]
    pub ground_speed_mps: f64,
    #[serde(default)]
    pub vertical_speed_mps: f64,
    #[serde(default)]
    pub true_airspeed_mps: f64,
    #[serde(default)]
    pub category: AircraftCategory,
}

impl AircraftState {
    /// Create a state with position only; velocity fields default to zero.
    pub fn new(id: impl Into<String>, lat: f64, lon: f64, altitude_m: f64) -> Self {
        Self {
            id: id.into(),
            lat,
            lon,
            altitude_m,
            track_deg: 0.0,
            ground_speed_mps: 0.0,
            vertical_speed_mps: 0.0,
            true_airspeed_mps: 0.0,
            category: AircraftCategory::Drone,
        }
    }

    /// Set track, ground speed and vertical speed. True airspeed follows ground speed.
    pub fn with_velocity(mut self, track_deg: f64, ground_speed_mps: f64, vertical_speed_mps: f64) -> Self {
        self.track_deg = track_deg;
        self.ground_speed_mps = ground_speed_mps;
        self.vertical_speed_mps = vertical_speed_mps;
        self.true_airspeed_mps = ground_speed_mps;
        self
    }

    pub fn with_category(mut self, category: AircraftCategory) -> Self {
        self.category = category;
        self
    }

    pub fn kinematics(&self) -> Kinematics {
        Kinematics {
            lat: self.lat,
            lon: self.lon,
            altitude_m: self.altitude_m,
            track_deg: self.track_deg,
            ground_speed_mps: self.ground_speed_mps,
            vertical_speed_mps: self.vertical_speed_mps,
        }
    }
}

/// Degraded view of one aircraft as last received over the surveillance link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastRecord {
    pub lat: f64,
    pub lon: f64,
    pub altitude_m: f64,
    pub track_deg: f64,
    pub ground_speed_mps: f64,
    pub vertical_speed_mps: f64,
    pub true_airspeed_mps: f64,
    pub category: AircraftCategory,
    pub emergency: bool,
    /// Simulation time of the last report, seconds
    pub last_update_s: f64,
}

impl BroadcastRecord {
    /// Seed a record from the true state at creation time.
    pub fn from_state(state: &AircraftState, last_update_s: f64, emergency: bool) -> Self {
        Self {
            lat: state.lat,
            lon: state.lon,
            altitude_m: state.altitude_m,
            track_deg: state.track_deg,
            ground_speed_mps: state.ground_speed_mps,
            vertical_speed_mps: state.vertical_speed_mps,
            true_airspeed_mps: state.true_airspeed_mps,
            category: state.category,
            emergency,
            last_update_s,
        }
    }

    pub fn kinematics(&self) -> Kinematics {
        Kinematics {
            lat: self.lat,
            lon: self.lon,
            altitude_m: self.altitude_m,
            track_deg: self.track_deg,
            ground_speed_mps: self.ground_speed_mps,
            vertical_speed_mps: self.vertical_speed_mps,
        }
    }
}

/// Minimal state the CPA engine reads per aircraft.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    pub lat: f64,
    pub lon: f64,
    pub altitude_m: f64,
    pub track_deg: f64,
    pub ground_speed_mps: f64,
    pub vertical_speed_mps: f64,
}

impl Kinematics {
    /// Horizontal velocity as (east, north) in m/s.
    pub fn velocity_en(&self) -> (f64, f64) {
        let trk = self.track_deg.to_radians();
        (
            self.ground_speed_mps * trk.sin(),
            self.ground_speed_mps * trk.cos(),
        )
    }
}

/// Unordered aircraft pair: `(a, b)` and `(b, a)` build the same value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AircraftPair {
    pub first: String,
    pub second: String,
}

impl AircraftPair {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }
}

impl PartialOrd for AircraftPair {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AircraftPair {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.first, &self.second).cmp(&(&other.first, &other.second))
    }
}

impl fmt::Display for AircraftPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.first, self.second)
    }
}
