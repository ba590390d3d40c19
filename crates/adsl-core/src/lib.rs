pub mod bookkeeping;
pub mod codec;
pub mod conflict;
pub mod cpa;
pub mod error;
pub mod models;
pub mod roster;
pub mod rules;
pub mod spatial;
pub mod surveillance;

pub use bookkeeping::{AccuracyCounters, ClosestApproachMatrix, PairDelta, PairHistory, StreamBook};
pub use conflict::{
    AircraftFlag, ClosestApproachEntry, ConflictDetector, ConflictGeometry, StreamSnapshot,
    TickResult,
};
pub use cpa::{detect, Detection, PairGeometry, PairMatrix};
pub use error::{CoreError, Result};
pub use models::{AircraftCategory, AircraftPair, AircraftState, BroadcastRecord, Kinematics};
pub use roster::{Roster, SlotHandle};
pub use rules::{
    ConfigUpdate, DegradedView, DetectionSource, DetectorConfig, NoiseParams, SeparationOverride,
    SeparationStandard,
};
pub use spatial::{haversine_distance, relative_position, RelativePosition};
pub use surveillance::{quantized_view, LatencyStats, QuantizedView, SurveillanceModel};
