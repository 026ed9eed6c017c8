use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::error::{TrifieldError, TrifieldResult};

/// Environment variable naming an optional JSON config file
pub const CONFIG_PATH_ENV: &str = "TRIFIELD_CONFIG";
/// Environment variable pinning the RNG seed
pub const SEED_ENV: &str = "TRIFIELD_SEED";

/// Greys and white used for ordinary triangles
pub const DEFAULT_PALETTE: [[u8; 3]; 6] = [
    [96, 96, 96],
    [92, 92, 92],
    [99, 99, 99],
    [147, 147, 147],
    [193, 193, 193],
    [255, 255, 255],
];

/// Every tunable of the triangle field. Times are milliseconds, distances pixels.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Number of ordinary triangles kept alive
    pub capacity: usize,
    /// Lifetime of a flicker triangle
    pub flicker_duration_ms: f64,
    /// Opaque scale applied to flicker age before the sine
    pub flicker_opacity_scale: f64,
    /// Fixed size of flicker triangles
    pub flicker_size: f32,
    /// Minimum time between two line bursts
    pub burst_interval_ms: f64,
    /// Flicker triangles per line burst
    pub burst_count: usize,
    /// Upper bound of the random insertion delay inside a burst
    pub burst_stagger_ms: f64,
    pub trail_chance: f64,
    pub trail_length: usize,
    pub trail_delay: f32,
    /// Offset between consecutive trail ghosts
    pub trail_distance: f32,
    /// Ordinary size = r * min(w, h) * size_scale + size_floor
    pub size_scale: f32,
    pub size_floor: f32,
    pub max_speed: f32,
    pub large_speed_multiplier: f32,
    pub small_speed_multiplier: f32,
    pub rotation_speed_scale: f32,
    /// Upper bound of the random spawn delay of ordinary triangles
    pub spawn_delay_ms: f64,
    pub palette: Vec<[u8; 3]>,
    /// Fixed RNG seed; random per run when absent
    pub seed: Option<u64>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            capacity: 55,
            flicker_duration_ms: 2000.0,
            flicker_opacity_scale: 0.01,
            flicker_size: 50.0,
            burst_interval_ms: 5000.0,
            burst_count: 10,
            burst_stagger_ms: 1000.0,
            trail_chance: 0.1,
            trail_length: 5,
            trail_delay: 0.75,
            trail_distance: 10.0,
            size_scale: 0.6,
            size_floor: 50.0,
            max_speed: 0.5,
            large_speed_multiplier: 0.5,
            small_speed_multiplier: 2.0,
            rotation_speed_scale: 0.01,
            spawn_delay_ms: 3000.0,
            palette: DEFAULT_PALETTE.to_vec(),
            seed: None,
        }
    }
}

impl FieldConfig {
    /// Load config from the file named by `TRIFIELD_CONFIG` and from `TRIFIELD_SEED`.
    /// The binary reads `.env` before calling this. Falls back to defaults when nothing is configured.
    pub fn load() -> TrifieldResult<Self> {
        let mut config = match env::var(CONFIG_PATH_ENV) {
            Ok(path) => {
                log::info!("Loading field config from {}", path);
                Self::from_file(path)?
            }
            Err(_) => Self::default(),
        };

        if let Ok(seed) = env::var(SEED_ENV) {
            let seed = seed.trim().parse::<u64>().map_err(|e| TrifieldError::InvalidConfig {
                field: "seed",
                reason: format!("{} is not a u64: {}", SEED_ENV, e),
            })?;
            config.seed = Some(seed);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> TrifieldResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn from_json_str(json: &str) -> TrifieldResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> TrifieldResult<()> {
        fn invalid(field: &'static str, reason: &str) -> TrifieldError {
            TrifieldError::InvalidConfig {
                field,
                reason: reason.to_string(),
            }
        }

        if self.capacity == 0 {
            return Err(invalid("capacity", "must be greater than zero"));
        }
        if self.flicker_duration_ms <= 0.0 {
            return Err(invalid("flicker_duration_ms", "must be positive"));
        }
        if self.burst_interval_ms <= 0.0 {
            return Err(invalid("burst_interval_ms", "must be positive"));
        }
        if self.burst_stagger_ms < 0.0 {
            return Err(invalid("burst_stagger_ms", "cannot be negative"));
        }
        if self.spawn_delay_ms < 0.0 {
            return Err(invalid("spawn_delay_ms", "cannot be negative"));
        }
        if !(0.0..=1.0).contains(&self.trail_chance) {
            return Err(invalid("trail_chance", "must be within 0..=1"));
        }
        if self.trail_delay <= 0.0 {
            return Err(invalid("trail_delay", "must be positive"));
        }
        if self.palette.is_empty() {
            return Err(invalid("palette", "needs at least one color"));
        }
        Ok(())
    }
}
