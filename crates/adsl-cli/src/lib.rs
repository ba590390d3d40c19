//! ADS-L simulation host.
//!
//! Drives `adsl-core` with synthetic constant-velocity traffic:
//! - sim::paths: flight paths sampled each tick
//! - sim::scenarios: named encounter geometries and random circle traffic
//! - sim::runner: tick loop, noise sweep and JSON reports

pub mod config;
pub mod sim;

pub use config::Config;
