//! Flight path implementations.

use adsl_core::spatial::{offset_by_bearing, relative_position};
use adsl_core::{AircraftCategory, AircraftState};

/// Trait for flight path implementations.
pub trait FlightPath: Send + Sync {
    /// Get (lat, lon, altitude_m) at time t seconds from start.
    fn get_position(&self, t: f64) -> (f64, f64, f64);

    /// Get track at time t (degrees, 0 = North).
    fn get_heading(&self, t: f64) -> f64;

    /// Get speed in meters per second.
    fn get_speed_mps(&self) -> f64;

    fn get_vertical_speed_mps(&self) -> f64 {
        0.0
    }

    /// Sample the path as the true state the detection core consumes.
    fn state_at(&self, id: &str, category: AircraftCategory, t: f64) -> AircraftState {
        let (lat, lon, altitude_m) = self.get_position(t);
        AircraftState::new(id, lat, lon, altitude_m)
            .with_velocity(
                self.get_heading(t),
                self.get_speed_mps(),
                self.get_vertical_speed_mps(),
            )
            .with_category(category)
    }
}

/// Constant-velocity flight from a start point towards an end point.
///
/// The aircraft keeps going past the end point; encounter geometry only
/// depends on the start position and the track.
pub struct LinearPath {
    pub start_lat: f64,
    pub start_lon: f64,
    pub altitude_m: f64,
    pub speed_mps: f64,
    pub vertical_speed_mps: f64,
    /// Time to reach the end point
    pub duration: f64,
    heading: f64,
}

impl LinearPath {
    /// Create a new linear flight path.
    pub fn new(
        start_lat: f64,
        start_lon: f64,
        end_lat: f64,
        end_lon: f64,
        altitude_m: f64,
        speed_mps: f64,
    ) -> Self {
        let rel = relative_position(start_lat, start_lon, end_lat, end_lon);
        let duration = if speed_mps > 0.0 {
            rel.distance_m / speed_mps
        } else {
            0.0
        };

        Self {
            start_lat,
            start_lon,
            altitude_m,
            speed_mps,
            vertical_speed_mps: 0.0,
            duration,
            heading: rel.bearing_deg,
        }
    }

    /// Path that starts at a point and flies a fixed track.
    pub fn from_heading(
        start_lat: f64,
        start_lon: f64,
        heading_deg: f64,
        altitude_m: f64,
        speed_mps: f64,
    ) -> Self {
        Self {
            start_lat,
            start_lon,
            altitude_m,
            speed_mps,
            vertical_speed_mps: 0.0,
            duration: f64::INFINITY,
            heading: heading_deg.rem_euclid(360.0),
        }
    }

    pub fn with_vertical_speed(mut self, vertical_speed_mps: f64) -> Self {
        self.vertical_speed_mps = vertical_speed_mps;
        self
    }
}

impl FlightPath for LinearPath {
    fn get_position(&self, t: f64) -> (f64, f64, f64) {
        let (lat, lon) = offset_by_bearing(
            self.start_lat,
            self.start_lon,
            self.speed_mps * t,
            self.heading.to_radians(),
        );
        (lat, lon, self.altitude_m + self.vertical_speed_mps * t)
    }

    fn get_heading(&self, _t: f64) -> f64 {
        self.heading
    }

    fn get_speed_mps(&self) -> f64 {
        self.speed_mps
    }

    fn get_vertical_speed_mps(&self) -> f64 {
        self.vertical_speed_mps
    }
}
