use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use qc_config::QConsoleConfig;
use qc_orchestrator::{DirListing, RunController};

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub project_root: PathBuf,
    pub config: QConsoleConfig,
    pub asset_root: PathBuf,
    pub controller: Arc<RunController>,
}

impl AppContext {
    /// Wire a run controller from configuration.
    ///
    /// `asset_root` overrides `manifest.asset_root`; relative paths resolve
    /// against `project_root` either way.
    pub fn init(
        project_root: PathBuf,
        config: QConsoleConfig,
        asset_root: Option<PathBuf>,
    ) -> anyhow::Result<Self> {
        let asset_root = match asset_root {
            Some(root) if root.is_absolute() => root,
            Some(root) => project_root.join(root),
            None => config.asset_root(&project_root),
        };

        let build_plan = config
            .build
            .plan()
            .context("invalid build stage configuration")?;

        let controller = RunController::new(
            Arc::new(DirListing::new(&asset_root)),
            config.manifest.required.clone(),
            build_plan,
        )
        .with_policy(config.runs.conflict_policy)
        .with_time_scale(config.runs.time_scale)
        .context("invalid runs.time_scale")?;

        tracing::debug!(
            project_root = %project_root.display(),
            asset_root = %asset_root.display(),
            policy = %config.runs.conflict_policy,
            "run controller ready"
        );

        Ok(Self {
            project_root,
            config,
            asset_root,
            controller: Arc::new(controller),
        })
    }
}
