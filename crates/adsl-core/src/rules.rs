//! Separation standards and detector configuration.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};

/// Protection zone and prediction horizon for one aircraft.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeparationStandard {
    /// Horizontal protection zone radius in meters
    pub rpz_m: f64,
    /// Vertical protection zone half-height in meters
    pub hpz_m: f64,
    /// Lookahead window for conflict prediction in seconds
    pub lookahead_s: f64,
    /// Horizon below which resolution no longer acts, seconds
    pub no_look_s: f64,
}

impl Default for SeparationStandard {
    fn default() -> Self {
        Self {
            rpz_m: 50.0,
            hpz_m: 30.0,
            lookahead_s: 20.0,
            no_look_s: 0.0,
        }
    }
}

impl SeparationStandard {
    /// Pairwise standard: the larger value of the two aircraft, field by field.
    pub fn pairwise(&self, other: &SeparationStandard) -> SeparationStandard {
        SeparationStandard {
            rpz_m: self.rpz_m.max(other.rpz_m),
            hpz_m: self.hpz_m.max(other.hpz_m),
            lookahead_s: self.lookahead_s.max(other.lookahead_s),
            no_look_s: self.no_look_s.max(other.no_look_s),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.rpz_m.is_finite() || self.rpz_m < 0.0 {
            return Err(CoreError::invalid(format!(
                "horizontal protection radius must be >= 0, got {}",
                self.rpz_m
            )));
        }
        if !self.hpz_m.is_finite() || self.hpz_m < 0.0 {
            return Err(CoreError::invalid(format!(
                "vertical protection half-height must be >= 0, got {}",
                self.hpz_m
            )));
        }
        if !self.lookahead_s.is_finite() || self.lookahead_s <= 0.0 {
            return Err(CoreError::invalid(format!(
                "lookahead must be > 0, got {}",
                self.lookahead_s
            )));
        }
        if !self.no_look_s.is_finite() || self.no_look_s < 0.0 || self.no_look_s >= self.lookahead_s {
            return Err(CoreError::invalid(format!(
                "no-look horizon must be in [0, lookahead), got {}",
                self.no_look_s
            )));
        }
        Ok(())
    }

    pub fn apply(&self, update: &SeparationOverride) -> SeparationStandard {
        SeparationStandard {
            rpz_m: update.rpz_m.unwrap_or(self.rpz_m),
            hpz_m: update.hpz_m.unwrap_or(self.hpz_m),
            lookahead_s: update.lookahead_s.unwrap_or(self.lookahead_s),
            no_look_s: update.no_look_s.unwrap_or(self.no_look_s),
        }
    }
}

/// Partial update of a separation standard. Missing fields keep their value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SeparationOverride {
    #[serde(default)]
    pub rpz_m: Option<f64>,
    #[serde(default)]
    pub hpz_m: Option<f64>,
    #[serde(default)]
    pub lookahead_s: Option<f64>,
    #[serde(default)]
    pub no_look_s: Option<f64>,
}

/// Surveillance noise model parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseParams {
    /// Apply navigation noise to broadcast position and ground speed
    pub nav_noise: bool,
    /// Horizontal position error, one standard deviation, meters
    pub hpos_sigma_m: f64,
    /// Ground speed error, one standard deviation, m/s
    pub ground_speed_sigma_mps: f64,
    /// Spread of the initial broadcast phase, one standard deviation, seconds
    pub phase_sigma_s: f64,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            nav_noise: true,
            hpos_sigma_m: 1.5,
            ground_speed_sigma_mps: 0.0,
            phase_sigma_s: 5.0,
        }
    }
}

impl NoiseParams {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("hpos_sigma_m", self.hpos_sigma_m),
            ("ground_speed_sigma_mps", self.ground_speed_sigma_mps),
            ("phase_sigma_s", self.phase_sigma_s),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(CoreError::invalid(format!("{name} must be >= 0, got {value}")));
            }
        }
        Ok(())
    }
}

/// Which side of the degraded pass reads broadcast data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradedView {
    /// Ownship and intruder both use their broadcast records
    #[default]
    Both,
    /// Ownship uses its true state, intruders their broadcast records
    IntruderOnly,
}

/// Detection pass whose output is handed to resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionSource {
    #[default]
    Broadcast,
    GroundTruth,
}

/// Full detector configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub separation: SeparationStandard,
    pub noise: NoiseParams,
    /// Probability that an aircraft reports on a given tick
    pub update_probability: f64,
    /// When false every aircraft reports every tick
    pub dropouts_enabled: bool,
    /// Pass ground speed and track through the fixed-point codec
    pub codec_enabled: bool,
    /// Probability that a new aircraft broadcasts an emergency status
    pub emergency_probability: f64,
    pub degraded_view: DegradedView,
    pub resolve_on: DetectionSource,
    pub seed: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            separation: SeparationStandard::default(),
            noise: NoiseParams::default(),
            update_probability: 1.0,
            dropouts_enabled: true,
            codec_enabled: false,
            emergency_probability: 0.1,
            degraded_view: DegradedView::default(),
            resolve_on: DetectionSource::default(),
            seed: 42,
        }
    }
}

impl DetectorConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: DetectorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.separation.validate()?;
        self.noise.validate()?;
        for (name, value) in [
            ("update_probability", self.update_probability),
            ("emergency_probability", self.emergency_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(CoreError::invalid(format!("{name} must be within [0, 1], got {value}")));
            }
        }
        Ok(())
    }

    /// Merge an update into a copy of this config and validate the result.
    pub fn merged(&self, update: &ConfigUpdate) -> Result<DetectorConfig> {
        let mut next = self.clone();
        if let Some(separation) = &update.separation {
            next.separation = next.separation.apply(separation);
        }
        if let Some(nav_noise) = update.nav_noise {
            next.noise.nav_noise = nav_noise;
        }
        if let Some(sigma) = update.hpos_sigma_m {
            next.noise.hpos_sigma_m = sigma;
        }
        if let Some(sigma) = update.ground_speed_sigma_mps {
            next.noise.ground_speed_sigma_mps = sigma;
        }
        if let Some(sigma) = update.phase_sigma_s {
            next.noise.phase_sigma_s = sigma;
        }
        if let Some(p) = update.update_probability {
            next.update_probability = p;
        }
        if let Some(enabled) = update.dropouts_enabled {
            next.dropouts_enabled = enabled;
        }
        if let Some(enabled) = update.codec_enabled {
            next.codec_enabled = enabled;
        }
        if let Some(p) = update.emergency_probability {
            next.emergency_probability = p;
        }
        if let Some(view) = update.degraded_view {
            next.degraded_view = view;
        }
        if let Some(source) = update.resolve_on {
            next.resolve_on = source;
        }
        next.validate()?;
        Ok(next)
    }
}

/// Partial configuration change. Unset fields retain their previous values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigUpdate {
    pub separation: Option<SeparationOverride>,
    pub nav_noise: Option<bool>,
    pub hpos_sigma_m: Option<f64>,
    pub ground_speed_sigma_mps: Option<f64>,
    pub phase_sigma_s: Option<f64>,
    pub update_probability: Option<f64>,
    pub dropouts_enabled: Option<bool>,
    pub codec_enabled: Option<bool>,
    pub emergency_probability: Option<f64>,
    pub degraded_view: Option<DegradedView>,
    pub resolve_on: Option<DetectionSource>,
}
