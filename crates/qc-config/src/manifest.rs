//! Manifest audit configuration.

use qc_core::defaults::default_required_files;
use serde::{Deserialize, Serialize};

fn default_asset_root() -> String {
    String::from(".")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ManifestConfig {
    /// Paths a well-formed project is expected to contain.
    #[serde(default = "default_required_files")]
    pub required: Vec<String>,

    /// Directory whose top-level entries are audited. Relative paths resolve
    /// against the project root.
    #[serde(default = "default_asset_root")]
    pub asset_root: String,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            required: default_required_files(),
            asset_root: default_asset_root(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = ManifestConfig::default();
        assert_eq!(config.asset_root, ".");
        assert_eq!(config.required.len(), 7);
        assert_eq!(config.required[0], "build.gradle");
    }
}
