//! Tunables for the clustering protocol and the simulation harness.
//!
//! Defaults reproduce spec.md's compile-time constants exactly; all of
//! them can be overridden by loading a TOML file with [`Config::from_file`].

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Root configuration for a simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Clustering algorithm tunables.
    pub algorithm: AlgorithmConfig,

    /// Node actor / transport timing tunables.
    pub timing: TimingConfig,

    /// Simulation engine tunables.
    pub engine: EngineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            algorithm: AlgorithmConfig::default(),
            timing: TimingConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl Config {
    /// Load a config from a TOML file, falling back to defaults for any
    /// field the file omits.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }
}

/// Join-score weights and plane-centrality geometry (spec.md §4.1.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlgorithmConfig {
    /// Weight on Euclidean distance in the join score.
    pub score_weight_a: f64,

    /// Weight on plane-centrality distance in the join score.
    pub score_weight_b: f64,

    /// Number of satellites per orbital plane.
    pub satellites_per_plane: u32,

    /// First orbital plane index (1-indexed, inclusive).
    pub plane_start: u32,

    /// Last orbital plane index (1-indexed, inclusive).
    pub plane_end: u32,
}

impl AlgorithmConfig {
    /// The plane closest to the constellation's equator.
    pub fn middle_plane(&self) -> f64 {
        (self.plane_end + self.plane_start) as f64 / 2.0
    }

    /// The largest possible distance from `middle_plane`.
    pub fn max_plane_offset(&self) -> f64 {
        (self.plane_end - self.plane_start) as f64 / 2.0
    }
}

impl Default for AlgorithmConfig {
    fn default() -> Self {
        Self {
            score_weight_a: 0.5,
            score_weight_b: 0.8,
            satellites_per_plane: 21,
            plane_start: 1,
            plane_end: 71,
        }
    }
}

/// Timing tunables for the node actor / transport (spec.md §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Interval between `on_tick` invocations.
    #[serde(with = "duration_millis")]
    pub tick_period: Duration,

    /// Per-send timeout before a saturated peer queue is a `Timeout` error.
    #[serde(with = "duration_millis")]
    pub send_timeout: Duration,

    /// Bounded capacity of each per-peer link queue.
    pub queue_capacity: usize,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_secs(1),
            send_timeout: Duration::from_millis(500),
            queue_capacity: 30,
        }
    }
}

/// Simulation engine tunables (spec.md §4.4, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Two satellites with distance below this threshold (km) are peers.
    pub max_comm_distance_km: f64,

    /// Wall-clock window actors run for before cluster assignments are harvested.
    #[serde(with = "duration_millis")]
    pub settling_window: Duration,

    /// Maximum number of snapshot files processed per run, in listing order.
    pub snapshot_cap: usize,

    /// Directory results are written under, relative to the current directory.
    pub output_dir: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_comm_distance_km: 3000.0,
            settling_window: Duration::from_secs(10),
            snapshot_cap: 10,
            output_dir: "engLogs/clusters".to_string(),
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
