//! Run controller configuration.

use qc_core::enums::ConflictPolicy;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

const fn default_time_scale() -> f64 {
    1.0
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunsConfig {
    /// Behavior when a run of the same kind is already running.
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,

    /// Multiplier applied to every stage offset. `0` plays stages back to back.
    #[serde(default = "default_time_scale")]
    pub time_scale: f64,
}

impl Default for RunsConfig {
    fn default() -> Self {
        Self {
            conflict_policy: ConflictPolicy::default(),
            time_scale: default_time_scale(),
        }
    }
}

impl RunsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.time_scale.is_finite() || self.time_scale < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "runs.time_scale".into(),
                reason: format!("must be a finite, non-negative number (got {})", self.time_scale),
            });
        }
        Ok(())
    }
}
