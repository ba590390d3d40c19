//! State-based conflict detection (closest point of approach).
//!
//! Every ordered pair (ownship i, intruder j) is extrapolated at constant
//! velocity. A pair is in conflict when the horizontal and vertical
//! protection zone crossings overlap in time within the lookahead window,
//! and in loss of separation when both zones are violated right now.
//! The routine is pure: it keeps no state between calls.

use crate::models::Kinematics;
use crate::rules::SeparationStandard;
use crate::spatial::relative_position;
use serde::{Deserialize, Serialize};

/// Floor for |v_rel|^2 and |vs_own - vs_int| to avoid division by zero.
pub const MIN_DENOMINATOR: f64 = 1e-6;
/// Entry/exit time used for pairs that never meet horizontally.
const NO_CONFLICT_TIME_S: f64 = 1e8;
/// Distance reported for an aircraft paired with itself.
pub const SELF_PAIR_DISTANCE_M: f64 = 1e9;

/// Dense square matrix indexed by [ownship][intruder].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairMatrix<T> {
    n: usize,
    data: Vec<T>,
}

impl<T: Clone> PairMatrix<T> {
    pub fn filled(n: usize, value: T) -> Self {
        Self {
            n,
            data: vec![value; n * n],
        }
    }
}

impl<T: Copy> PairMatrix<T> {
    pub fn get(&self, i: usize, j: usize) -> T {
        self.data[i * self.n + j]
    }

    pub fn set(&mut self, i: usize, j: usize, value: T) {
        self.data[i * self.n + j] = value;
    }

    pub fn size(&self) -> usize {
        self.n
    }
}

/// Geometry of one conflicting ordered pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairGeometry {
    pub ownship: usize,
    pub intruder: usize,
    /// Bearing from ownship to intruder, degrees
    pub bearing_deg: f64,
    pub distance_m: f64,
    /// Predicted horizontal distance at CPA
    pub dcpa_m: f64,
    pub tcpa_s: f64,
    /// Time until the protection zone is entered
    pub tin_s: f64,
    /// Time until the protection zone is left
    pub tout_s: f64,
}

/// Output of one detection pass. Pair indices refer to the input slices.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Ordered conflicting pairs; for symmetric input both (i, j) and (j, i) appear
    pub conflicts: Vec<(usize, usize)>,
    pub los: Vec<(usize, usize)>,
    pub in_conflict: Vec<bool>,
    /// Largest time to CPA among each ownship's conflicts, 0 when none
    pub tcpa_max: Vec<f64>,
    /// One entry per conflicting pair, same order as `conflicts`
    pub geometry: Vec<PairGeometry>,
    /// Unmasked CPA distance for every pair
    pub dcpa: PairMatrix<f64>,
    /// Unmasked current distance for every pair
    pub distance: PairMatrix<f64>,
    pub los_mask: PairMatrix<bool>,
}

impl Detection {
    fn empty(n: usize) -> Self {
        Self {
            conflicts: Vec::new(),
            los: Vec::new(),
            in_conflict: vec![false; n],
            tcpa_max: vec![0.0; n],
            geometry: Vec::new(),
            dcpa: PairMatrix::filled(n, SELF_PAIR_DISTANCE_M),
            distance: PairMatrix::filled(n, SELF_PAIR_DISTANCE_M),
            los_mask: PairMatrix::filled(n, false),
        }
    }
}

/// Result of evaluating a single ordered pair.
#[derive(Debug, Clone, Copy)]
struct PairEvaluation {
    geometry: PairGeometry,
    conflict: bool,
    los: bool,
}

fn evaluate_pair(
    i: usize,
    j: usize,
    own: &Kinematics,
    intruder: &Kinematics,
    standard: &SeparationStandard,
) -> PairEvaluation {
    // Horizontal: position and velocity of j relative to i
    let rel = relative_position(own.lat, own.lon, intruder.lat, intruder.lon);
    let (own_u, own_v) = own.velocity_en();
    let (int_u, int_v) = intruder.velocity_en();
    let du = int_u - own_u;
    let dv = int_v - own_v;

    let mut dv2 = du * du + dv * dv;
    if dv2.abs() < MIN_DENOMINATOR {
        dv2 = MIN_DENOMINATOR;
    }
    let vrel = dv2.sqrt();

    let tcpa = -(du * rel.east_m + dv * rel.north_m) / dv2;
    let dcpa2 = (rel.distance_m * rel.distance_m - tcpa * tcpa * dv2).abs();

    let r2 = standard.rpz_m * standard.rpz_m;
    let horizontal = dcpa2 < r2;
    let dt_inside = (r2 - dcpa2).max(0.0).sqrt() / vrel;
    let (tin_hor, tout_hor) = if horizontal {
        (tcpa - dt_inside, tcpa + dt_inside)
    } else {
        (NO_CONFLICT_TIME_S, -NO_CONFLICT_TIME_S)
    };

    // Vertical: crossing of the (-hpz, +hpz) slab
    let dalt = own.altitude_m - intruder.altitude_m;
    let mut dvs = own.vertical_speed_mps - intruder.vertical_speed_mps;
    if dvs.abs() < MIN_DENOMINATOR {
        dvs = MIN_DENOMINATOR;
    }
    let t_cross_hi = (dalt + standard.hpz_m) / -dvs;
    let t_cross_lo = (dalt - standard.hpz_m) / -dvs;
    let tin_ver = t_cross_hi.min(t_cross_lo);
    let tout_ver = t_cross_hi.max(t_cross_lo);

    let tin = tin_ver.max(tin_hor);
    let tout = tout_ver.min(tout_hor);

    let conflict = horizontal && tin <= tout && tout > 0.0 && tin < standard.lookahead_s;
    let los = rel.distance_m < standard.rpz_m && dalt.abs() < standard.hpz_m;

    PairEvaluation {
        geometry: PairGeometry {
            ownship: i,
            intruder: j,
            bearing_deg: rel.bearing_deg,
            distance_m: rel.distance_m,
            dcpa_m: dcpa2.sqrt(),
            tcpa_s: tcpa,
            tin_s: tin,
            tout_s: tout,
        },
        conflict,
        los,
    }
}

/// Run conflict detection for every ordered pair.
///
/// `ownship[i]` is compared against `intruder[j]` for i != j, using the
/// pairwise maximum of `standards[i]` and `standards[j]`. The three slices
/// are expected to have equal length; extra entries are ignored.
pub fn detect(
    ownship: &[Kinematics],
    intruder: &[Kinematics],
    standards: &[SeparationStandard],
) -> Detection {
    let n = ownship.len().min(intruder.len()).min(standards.len());
    debug_assert_eq!(ownship.len(), intruder.len());
    debug_assert_eq!(ownship.len(), standards.len());

    let mut detection = Detection::empty(n);

    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let standard = standards[i].pairwise(&standards[j]);
            let eval = evaluate_pair(i, j, &ownship[i], &intruder[j], &standard);

            detection.dcpa.set(i, j, eval.geometry.dcpa_m);
            detection.distance.set(i, j, eval.geometry.distance_m);

            if eval.los {
                detection.los.push((i, j));
                detection.los_mask.set(i, j, true);
            }

            if eval.conflict {
                detection.conflicts.push((i, j));
                detection.in_conflict[i] = true;
                detection.tcpa_max[i] = detection.tcpa_max[i].max(eval.geometry.tcpa_s);
                detection.geometry.push(eval.geometry);
            }
        }
    }

    detection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::offset_by_bearing;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    const KT: f64 = 0.514444;

    fn at(lat: f64, lon: f64, alt: f64, trk: f64, gs: f64, vs: f64) -> Kinematics {
        Kinematics {
            lat,
            lon,
            altitude_m: alt,
            track_deg: trk,
            ground_speed_mps: gs,
            vertical_speed_mps: vs,
        }
    }

    fn defaults(n: usize) -> Vec<SeparationStandard> {
        vec![SeparationStandard::default(); n]
    }

    #[test]
    fn head_on_at_protection_radius() {
        let rpz = SeparationStandard::default().rpz_m;
        let (lat2, lon2) = offset_by_bearing(52.0, 4.0, rpz, 90.0_f64.to_radians());
        let states = vec![
            at(52.0, 4.0, 100.0, 90.0, 20.0 * KT, 0.0),
            at(lat2, lon2, 100.0, 270.0, 20.0 * KT, 0.0),
        ];
        let det = detect(&states, &states, &defaults(2));

        assert_eq!(det.conflicts, vec![(0, 1), (1, 0)]);
        assert!(det.in_conflict.iter().all(|&c| c));
        let g = det.geometry[0];
        assert!(g.dcpa_m < 1.0, "dcpa {}", g.dcpa_m);
        assert!(g.tin_s.abs() < 1e-3, "entry time {}", g.tin_s);
        let closing = 40.0 * KT;
        assert!((g.tcpa_s - rpz / closing).abs() < 0.01);
    }

    #[test]
    fn parallel_tracks_do_not_conflict() {
        let (lat2, lon2) = offset_by_bearing(52.0, 4.0, 200.0, 90.0_f64.to_radians());
        let states = vec![
            at(52.0, 4.0, 100.0, 0.0, 15.0, 0.0),
            at(lat2, lon2, 100.0, 0.0, 15.0, 0.0),
        ];
        let det = detect(&states, &states, &defaults(2));
        assert!(det.conflicts.is_empty());
        assert!(det.los.is_empty());
        assert_eq!(det.tcpa_max, vec![0.0, 0.0]);
    }

    #[test]
    fn vertical_separation_blocks_conflict() {
        let (lat2, lon2) = offset_by_bearing(52.0, 4.0, 300.0, 90.0_f64.to_radians());
        let states = vec![
            at(52.0, 4.0, 100.0, 90.0, 10.0, 0.0),
            at(lat2, lon2, 200.0, 270.0, 10.0, 0.0),
        ];
        let det = detect(&states, &states, &defaults(2));
        assert!(det.conflicts.is_empty());
    }

    #[test]
    fn descending_into_zone_conflicts() {
        // Stationary and horizontally co-located, intruder 100 m above sinking at 5 m/s.
        let states = vec![
            at(52.0, 4.0, 100.0, 0.0, 0.0, 0.0),
            at(52.0, 4.0, 200.0, 0.0, 0.0, -5.0),
        ];
        let det = detect(&states, &states, &defaults(2));
        assert_eq!(det.conflicts.len(), 2);
        // Zone entered once the gap shrinks from 100 m to hpz (30 m).
        assert!((det.geometry[0].tin_s - 14.0).abs() < 1e-6);
        assert!(det.los.is_empty());
    }

    #[test]
    fn identical_positions_are_finite() {
        let states = vec![at(52.0, 4.0, 100.0, 0.0, 0.0, 0.0), at(52.0, 4.0, 100.0, 0.0, 0.0, 0.0)];
        let det = detect(&states, &states, &defaults(2));
        assert_eq!(det.los, vec![(0, 1), (1, 0)]);
        assert_eq!(det.conflicts.len(), 2);
        for g in &det.geometry {
            assert!(g.tcpa_s.is_finite() && g.tin_s.is_finite() && g.dcpa_m.is_finite());
        }
    }

    #[test]
    fn conflicts_beyond_lookahead_are_ignored() {
        // 2 km apart closing at 20 m/s: zone entry after ~97 s.
        let (lat2, lon2) = offset_by_bearing(52.0, 4.0, 2000.0, 0.0);
        let states = vec![
            at(52.0, 4.0, 100.0, 0.0, 10.0, 0.0),
            at(lat2, lon2, 100.0, 180.0, 10.0, 0.0),
        ];
        assert!(detect(&states, &states, &defaults(2)).conflicts.is_empty());

        let long = vec![
            SeparationStandard {
                lookahead_s: 120.0,
                ..Default::default()
            },
            SeparationStandard::default(),
        ];
        let det = detect(&states, &states, &long);
        assert_eq!(det.conflicts.len(), 2);
        assert!(det.tcpa_max[0] > 90.0);
    }

    #[test]
    fn larger_radius_of_the_pair_applies() {
        let (lat2, lon2) = offset_by_bearing(52.0, 4.0, 150.0, 90.0_f64.to_radians());
        let states = vec![
            at(52.0, 4.0, 100.0, 0.0, 5.0, 0.0),
            at(lat2, lon2, 100.0, 0.0, 5.0, 0.0),
        ];
        assert!(detect(&states, &states, &defaults(2)).los.is_empty());

        let mut standards = defaults(2);
        standards[1].rpz_m = 200.0;
        let det = detect(&states, &states, &standards);
        assert_eq!(det.los, vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn truth_pass_is_symmetric() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let states: Vec<Kinematics> = (0..25)
            .map(|_| {
                at(
                    52.0 + rng.random_range(-0.004..0.004),
                    4.0 + rng.random_range(-0.006..0.006),
                    rng.random_range(60.0..140.0),
                    rng.random_range(0.0..360.0),
                    rng.random_range(0.0..25.0),
                    rng.random_range(-2.0..2.0),
                )
            })
            .collect();
        let det = detect(&states, &states, &defaults(states.len()));

        assert!(!det.conflicts.is_empty());
        for &(i, j) in &det.conflicts {
            assert!(det.conflicts.contains(&(j, i)), "({i},{j}) without mirror");
        }
        for &(i, j) in &det.los {
            assert!(det.los.contains(&(j, i)));
        }
        for g in &det.geometry {
            let mirror = det
                .geometry
                .iter()
                .find(|m| m.ownship == g.intruder && m.intruder == g.ownship)
                .unwrap();
            let turn = (g.bearing_deg - mirror.bearing_deg).rem_euclid(360.0);
            assert!((turn - 180.0).abs() < 1e-6, "bearing turn {turn}");
        }
    }
}
