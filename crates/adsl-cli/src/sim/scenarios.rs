//! Pre-defined traffic scenarios for detection runs.

use super::paths::LinearPath;
use super::FlightPath;
use adsl_core::spatial::offset_by_bearing;
use adsl_core::AircraftCategory;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

/// One aircraft of a scenario. Its path is sampled from `spawn_s` on.
pub struct ScenarioAircraft {
    pub id: String,
    pub category: AircraftCategory,
    pub spawn_s: f64,
    pub path: Arc<dyn FlightPath>,
}

impl ScenarioAircraft {
    fn drone(id: impl Into<String>, path: Arc<dyn FlightPath>) -> Self {
        Self {
            id: id.into(),
            category: AircraftCategory::Drone,
            spawn_s: 0.0,
            path,
        }
    }
}

/// A named scenario consisting of multiple aircraft with flight paths.
pub struct Scenario {
    pub name: String,
    pub center_lat: f64,
    pub center_lon: f64,
    pub aircraft: Vec<ScenarioAircraft>,
    /// Aircraft farther than this from the center are removed
    pub despawn_radius_m: Option<f64>,
}

impl Scenario {
    fn fixed(name: &str, center_lat: f64, center_lon: f64, aircraft: Vec<ScenarioAircraft>) -> Self {
        Self {
            name: name.to_string(),
            center_lat,
            center_lon,
            aircraft,
            despawn_radius_m: None,
        }
    }
}

/// Two drones flying straight at each other, `separation_m` apart at t = 0.
pub fn create_head_on_scenario(
    center_lat: f64,
    center_lon: f64,
    separation_m: f64,
    speed_mps: f64,
) -> Scenario {
    let half = separation_m / 2.0;
    let (lat_w, lon_w) = offset_by_bearing(center_lat, center_lon, half, 270.0_f64.to_radians());
    let (lat_e, lon_e) = offset_by_bearing(center_lat, center_lon, half, 90.0_f64.to_radians());

    Scenario::fixed(
        "head-on",
        center_lat,
        center_lon,
        vec![
            ScenarioAircraft::drone(
                "DRONE001",
                Arc::new(LinearPath::from_heading(lat_w, lon_w, 90.0, 50.0, speed_mps)),
            ),
            ScenarioAircraft::drone(
                "DRONE002",
                Arc::new(LinearPath::from_heading(lat_e, lon_e, 270.0, 50.0, speed_mps)),
            ),
        ],
    )
}

/// Create two drones on collision course (crossing at center).
///
/// - Drone 1: Flying West to East through center
/// - Drone 2: Flying South to North through center
pub fn create_crossing_scenario(center_lat: f64, center_lon: f64) -> Scenario {
    let offset_m = 300.0;

    let (start_lat_1, start_lon_1) =
        offset_by_bearing(center_lat, center_lon, offset_m, 270.0_f64.to_radians());
    let (start_lat_2, start_lon_2) =
        offset_by_bearing(center_lat, center_lon, offset_m, 180.0_f64.to_radians());

    Scenario::fixed(
        "crossing",
        center_lat,
        center_lon,
        vec![
            ScenarioAircraft::drone(
                "DRONE001",
                Arc::new(LinearPath::new(
                    start_lat_1, start_lon_1, center_lat, center_lon, 50.0, 10.0,
                )),
            ),
            ScenarioAircraft::drone(
                "DRONE002",
                Arc::new(LinearPath::new(
                    start_lat_2, start_lon_2, center_lat, center_lon, 50.0, 10.0,
                )),
            ),
        ],
    )
}

/// Create two drones flying parallel paths (no conflict).
pub fn create_parallel_scenario(center_lat: f64, center_lon: f64) -> Scenario {
    let offset_m = 300.0;
    let separation_m = 100.0;

    let (start_lat_1, start_lon_1) =
        offset_by_bearing(center_lat, center_lon, offset_m, 270.0_f64.to_radians());
    let (sep_lat, sep_lon) =
        offset_by_bearing(center_lat, center_lon, separation_m, 0.0_f64.to_radians());
    let (start_lat_2, start_lon_2) =
        offset_by_bearing(sep_lat, sep_lon, offset_m, 270.0_f64.to_radians());

    Scenario::fixed(
        "parallel",
        center_lat,
        center_lon,
        vec![
            ScenarioAircraft::drone(
                "DRONE001",
                Arc::new(LinearPath::from_heading(start_lat_1, start_lon_1, 90.0, 50.0, 10.0)),
            ),
            ScenarioAircraft::drone(
                "DRONE002",
                Arc::new(LinearPath::from_heading(start_lat_2, start_lon_2, 90.0, 50.0, 10.0)),
            ),
        ],
    )
}

/// Create multiple drones converging on a central point.
pub fn create_converging_scenario(center_lat: f64, center_lon: f64) -> Scenario {
    let offset_m = 300.0;
    let angles: [f64; 4] = [0.0, 90.0, 180.0, 270.0]; // 4 drones from cardinal directions

    let aircraft = angles
        .iter()
        .enumerate()
        .map(|(i, &angle)| {
            let (start_lat, start_lon) =
                offset_by_bearing(center_lat, center_lon, offset_m, angle.to_radians());
            let path = Arc::new(LinearPath::new(
                start_lat, start_lon, center_lat, center_lon, 50.0, 8.0,
            )) as Arc<dyn FlightPath>;
            ScenarioAircraft::drone(format!("DRONE{:03}", i + 1), path)
        })
        .collect();

    Scenario::fixed("converging", center_lat, center_lon, aircraft)
}

/// Parameters of random traffic through a circular area.
#[derive(Debug, Clone, Copy)]
pub struct CircleTraffic {
    pub radius_m: f64,
    pub count: usize,
    /// Aircraft enter at random times within this window
    pub spawn_window_s: f64,
    /// Maximum deviation of the entry track from the center line, degrees
    pub heading_spread_deg: f64,
    pub min_speed_mps: f64,
    pub max_speed_mps: f64,
    pub min_altitude_m: f64,
    pub max_altitude_m: f64,
    pub seed: u64,
}

impl Default for CircleTraffic {
    fn default() -> Self {
        Self {
            radius_m: 1500.0,
            count: 40,
            spawn_window_s: 120.0,
            heading_spread_deg: 30.0,
            min_speed_mps: 5.0,
            max_speed_mps: 20.0,
            min_altitude_m: 30.0,
            max_altitude_m: 150.0,
            seed: 1,
        }
    }
}

/// Random drone traffic entering a circle on its border and crossing it.
pub fn create_circle_traffic(center_lat: f64, center_lon: f64, params: &CircleTraffic) -> Scenario {
    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);

    let aircraft = (0..params.count)
        .map(|i| {
            let entry_bearing = rng.random_range(0.0..360.0);
            let (lat, lon) = offset_by_bearing(
                center_lat,
                center_lon,
                params.radius_m,
                f64::to_radians(entry_bearing),
            );
            let spread = params.heading_spread_deg.abs();
            let jitter = if spread > 0.0 {
                rng.random_range(-spread..=spread)
            } else {
                0.0
            };
            let heading = entry_bearing + 180.0 + jitter;
            let speed = sample_range(&mut rng, params.min_speed_mps, params.max_speed_mps);
            let altitude = sample_range(&mut rng, params.min_altitude_m, params.max_altitude_m);
            let spawn_s = sample_range(&mut rng, 0.0, params.spawn_window_s);

            ScenarioAircraft {
                id: format!("D{:05}", i + 1),
                category: AircraftCategory::from_type_code("M600"),
                spawn_s,
                path: Arc::new(LinearPath::from_heading(lat, lon, heading, altitude, speed)),
            }
        })
        .collect();

    Scenario {
        name: "circle".to_string(),
        center_lat,
        center_lon,
        aircraft,
        despawn_radius_m: Some(params.radius_m * 1.05),
    }
}

fn sample_range(rng: &mut impl Rng, low: f64, high: f64) -> f64 {
    if high > low {
        rng.random_range(low..high)
    } else {
        low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adsl_core::haversine_distance;

    #[test]
    fn test_crossing_scenario_creates_two_drones() {
        let scenario = create_crossing_scenario(33.0, -117.0);
        assert_eq!(scenario.aircraft.len(), 2);
        assert_eq!(scenario.name, "crossing");
    }

    #[test]
    fn test_converging_scenario_creates_four_drones() {
        let scenario = create_converging_scenario(33.0, -117.0);
        assert_eq!(scenario.aircraft.len(), 4);
        assert_eq!(scenario.name, "converging");
    }

    #[test]
    fn test_head_on_starts_at_requested_separation() {
        let scenario = create_head_on_scenario(52.0, 4.0, 50.0, 10.0);
        let (lat1, lon1, _) = scenario.aircraft[0].path.get_position(0.0);
        let (lat2, lon2, _) = scenario.aircraft[1].path.get_position(0.0);
        assert!((haversine_distance(lat1, lon1, lat2, lon2) - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_circle_traffic_enters_on_border_heading_inwards() {
        let params = CircleTraffic {
            count: 25,
            ..Default::default()
        };
        let scenario = create_circle_traffic(52.0, 4.0, &params);
        assert_eq!(scenario.aircraft.len(), 25);

        for aircraft in &scenario.aircraft {
            assert_eq!(aircraft.category, AircraftCategory::Drone);
            assert!(aircraft.spawn_s >= 0.0 && aircraft.spawn_s < params.spawn_window_s);

            let (lat, lon, _) = aircraft.path.get_position(0.0);
            let d0 = haversine_distance(52.0, 4.0, lat, lon);
            assert!((d0 - params.radius_m).abs() < 1.0);

            let (lat, lon, _) = aircraft.path.get_position(10.0);
            assert!(haversine_distance(52.0, 4.0, lat, lon) < d0);
        }
    }

    #[test]
    fn test_circle_traffic_is_seeded() {
        let params = CircleTraffic::default();
        let a = create_circle_traffic(52.0, 4.0, &params);
        let b = create_circle_traffic(52.0, 4.0, &params);
        for (x, y) in a.aircraft.iter().zip(&b.aircraft) {
            assert_eq!(x.spawn_s, y.spawn_s);
            assert_eq!(x.path.get_position(5.0), y.path.get_position(5.0));
        }
    }
}
