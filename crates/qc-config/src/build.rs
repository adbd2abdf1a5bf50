//! Build plan configuration.

use qc_core::defaults::default_build_stages;
use qc_core::enums::RunKind;
use qc_core::stage::{Stage, StagePlan};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BuildConfig {
    /// Stages narrated by a build run.
    #[serde(default = "default_build_stages")]
    pub stages: Vec<Stage>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            stages: default_build_stages(),
        }
    }
}

impl BuildConfig {
    /// Turn the configured stages into a validated build plan.
    pub fn plan(&self) -> Result<StagePlan, ConfigError> {
        if self.stages.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "build.stages".into(),
                reason: "at least one stage is required".into(),
            });
        }
        StagePlan::new(RunKind::Build, self.stages.clone()).map_err(|error| {
            ConfigError::InvalidValue {
                field: "build.stages".into(),
                reason: error.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_plan_matches_builtin() {
        let plan = BuildConfig::default().plan().unwrap();
        assert_eq!(plan, qc_core::defaults::default_build_plan());
    }

    #[test]
    fn empty_stage_list_is_invalid() {
        let config = BuildConfig { stages: Vec::new() };
        let err = config.plan().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "build.stages"));
    }
}
