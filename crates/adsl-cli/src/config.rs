//! Simulator configuration from environment and config file.

use adsl_core::DetectorConfig;
use anyhow::Context;
use std::env;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct Config {
    pub seed: u64,
    pub ticks: usize,
    /// Simulation time step in seconds
    pub dt: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: 42,
            ticks: 120,
            dt: 1.0,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            seed: env::var("ADSL_SEED")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.seed),
            ticks: env::var("ADSL_TICKS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.ticks),
            dt: env::var("ADSL_DT")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|dt: &f64| dt.is_finite() && *dt > 0.0)
                .unwrap_or(defaults.dt),
        }
    }
}

/// Load a detector configuration from a JSON file, or use defaults.
pub fn load_detector_config(path: Option<&Path>) -> anyhow::Result<DetectorConfig> {
    let Some(path) = path else {
        return Ok(DetectorConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading detector config {}", path.display()))?;
    let config = DetectorConfig::from_json_str(&text)
        .with_context(|| format!("parsing detector config {}", path.display()))?;
    Ok(config)
}
