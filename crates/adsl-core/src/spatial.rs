//! Spatial math for conflict detection and surveillance noise.

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per degree of latitude used by the flat-earth noise model.
pub const METERS_PER_DEG_LAT: f64 = 110_574.0;
/// Meters per degree of longitude at the equator.
pub const METERS_PER_DEG_LON_EQUATOR: f64 = 111_320.0;

/// Calculate distance between two points in meters using Haversine formula.
///
/// # Arguments
/// * `lat1`, `lon1` - First point coordinates in decimal degrees
/// * `lat2`, `lon2` - Second point coordinates in decimal degrees
///
/// # Returns
/// Distance in meters
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Wrap an angle in degrees to [-180, 180). In-range input is returned untouched.
pub fn wrap_180(deg: f64) -> f64 {
    if (-180.0..180.0).contains(&deg) {
        deg
    } else {
        (deg + 180.0).rem_euclid(360.0) - 180.0
    }
}

/// Position of point 2 as seen from point 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelativePosition {
    /// Bearing from point 1 to point 2, degrees in [0, 360)
    pub bearing_deg: f64,
    /// Great-circle distance, meters
    pub distance_m: f64,
    /// Offset of point 2 east of point 1, meters
    pub east_m: f64,
    /// Offset of point 2 north of point 1, meters
    pub north_m: f64,
}

/// Bearing, distance and local Cartesian offset from point 1 to point 2.
///
/// The direction is taken at the mean latitude of both points, so swapping
/// the points negates the offset exactly and turns the bearing by 180 degrees.
pub fn relative_position(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> RelativePosition {
    let distance_m = haversine_distance(lat1, lon1, lat2, lon2);

    let mean_lat = ((lat1 + lat2) / 2.0).to_radians();
    let d_east = wrap_180(lon2 - lon1).to_radians() * mean_lat.cos();
    let d_north = (lat2 - lat1).to_radians();
    let norm = d_east.hypot(d_north);

    if norm <= f64::EPSILON * 1e-3 {
        return RelativePosition {
            bearing_deg: 0.0,
            distance_m,
            east_m: 0.0,
            north_m: 0.0,
        };
    }

    RelativePosition {
        bearing_deg: d_east.atan2(d_north).to_degrees().rem_euclid(360.0),
        distance_m,
        east_m: distance_m * d_east / norm,
        north_m: distance_m * d_north / norm,
    }
}

/// Convert a north/east offset in meters into a latitude/longitude delta
/// with the flat-earth approximation at `ref_lat_deg`.
pub fn flat_earth_delta_deg(north_m: f64, east_m: f64, ref_lat_deg: f64) -> (f64, f64) {
    let lon_scale = (ref_lat_deg.to_radians().cos().abs() * METERS_PER_DEG_LON_EQUATOR).max(1e-9);
    (north_m / METERS_PER_DEG_LAT, east_m / lon_scale)
}

/// Offset a position by distance and bearing.
///
/// # Arguments
/// * `lat`, `lon` - Starting position in degrees
/// * `distance_m` - Distance in meters
/// * `bearing_rad` - Bearing in radians (0 = north, π/2 = east)
///
/// # Returns
/// (new_lat, new_lon) in degrees
pub fn offset_by_bearing(lat: f64, lon: f64, distance_m: f64, bearing_rad: f64) -> (f64, f64) {
    if distance_m.abs() <= f64::EPSILON {
        return (lat, lon);
    }

    let lat1 = lat.to_radians();
    let lon1 = lon.to_radians();
    let angular_distance = distance_m / EARTH_RADIUS_M;

    let sin_lat1 = lat1.sin();
    let cos_lat1 = lat1.cos();
    let sin_ad = angular_distance.sin();
    let cos_ad = angular_distance.cos();

    let sin_lat2 = sin_lat1 * cos_ad + cos_lat1 * sin_ad * bearing_rad.cos();
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();

    let y = bearing_rad.sin() * sin_ad * cos_lat1;
    let x = cos_ad - sin_lat1 * sin_lat2;
    let mut lon2 = lon1 + y.atan2(x);
    lon2 =
        (lon2 + std::f64::consts::PI).rem_euclid(2.0 * std::f64::consts::PI) - std::f64::consts::PI;

    (lat2.to_degrees(), lon2.to_degrees())
}
