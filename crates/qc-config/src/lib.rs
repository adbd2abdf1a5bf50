//! # qc-config
//!
//! Layered configuration loading for Quantum Console using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`QCONSOLE_*` prefix, `__` as separator)
//! 2. Project-level `.qconsole/config.toml`
//! 3. User-level `~/.config/qconsole/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `QCONSOLE_RUNS__CONFLICT_POLICY` -> `runs.conflict_policy`,
//! `QCONSOLE_MANIFEST__ASSET_ROOT` -> `manifest.asset_root`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use qc_config::QConsoleConfig;
//! use std::path::Path;
//!
//! let config = QConsoleConfig::load_with_dotenv(Path::new(".")).expect("config");
//! println!("policy: {}", config.runs.conflict_policy);
//! ```

mod build;
mod error;
mod manifest;
mod runs;

pub use build::BuildConfig;
pub use error::ConfigError;
pub use manifest::ManifestConfig;
pub use runs::RunsConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory holding project-local state.
pub const PROJECT_DIR: &str = ".qconsole";
/// Environment prefix for overrides.
pub const ENV_PREFIX: &str = "QCONSOLE_";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QConsoleConfig {
    #[serde(default)]
    pub manifest: ManifestConfig,
    #[serde(default)]
    pub runs: RunsConfig,
    #[serde(default)]
    pub build: BuildConfig,
}

impl QConsoleConfig {
    /// Load configuration for the project rooted at `project_root`.
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env`
    /// support.
    pub fn load(project_root: &Path) -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment(project_root))
    }

    /// Load configuration after reading `<project_root>/.env` (if present).
    pub fn load_with_dotenv(project_root: &Path) -> Result<Self, ConfigError> {
        let env_path = project_root.join(".env");
        if env_path.exists() {
            let _ = dotenvy::from_path(&env_path);
        } else {
            let _ = dotenvy::dotenv();
        }
        Self::load(project_root)
    }

    /// Extract and validate a config from an arbitrary figment.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can add providers on top.
    pub fn figment(project_root: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = Self::project_config_path(project_root);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Check cross-field constraints figment cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.runs.validate()?;
        self.build.plan()?;
        Ok(())
    }

    /// `<project_root>/.qconsole/config.toml`
    #[must_use]
    pub fn project_config_path(project_root: &Path) -> PathBuf {
        project_root.join(PROJECT_DIR).join("config.toml")
    }

    /// Directory audited by default, resolved against `project_root`.
    #[must_use]
    pub fn asset_root(&self, project_root: &Path) -> PathBuf {
        let root = PathBuf::from(&self.manifest.asset_root);
        if root.is_absolute() {
            root
        } else {
            project_root.join(root)
        }
    }

    /// Write the built-in defaults as TOML to `path`.
    ///
    /// Refuses to overwrite an existing file unless `force` is set.
    pub fn write_default(path: &Path, force: bool) -> Result<(), ConfigError> {
        if path.exists() && !force {
            return Err(ConfigError::AlreadyExists(path.to_path_buf()));
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let rendered = toml::to_string_pretty(&Self::default())?;
        std::fs::write(path, rendered).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("qconsole").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qc_core::enums::ConflictPolicy;

    #[test]
    fn default_config_is_valid() {
        let config = QConsoleConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.runs.conflict_policy, ConflictPolicy::Replace);
        assert_eq!(config.build.stages.len(), 9);
    }

    #[test]
    fn figment_builds_without_files() {
        let dir = tempfile::tempdir().unwrap();
        let figment = QConsoleConfig::figment(dir.path());
        let config: QConsoleConfig = figment.extract().expect("should extract defaults");
        assert_eq!(config.manifest.asset_root, ".");
    }

    #[test]
    fn asset_root_resolves_relative_to_project() {
        let config = QConsoleConfig::default();
        let root = config.asset_root(Path::new("/work/app"));
        assert_eq!(root, PathBuf::from("/work/app/."));
    }
}
