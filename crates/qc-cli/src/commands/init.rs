use std::path::Path;

use anyhow::Context;
use qc_config::QConsoleConfig;

use crate::cli::{GlobalFlags, InitArgs};
use crate::output::InitResponse;

/// Handle `qconsole init`.
pub fn handle(args: &InitArgs, project_root: &Path, flags: &GlobalFlags) -> anyhow::Result<()> {
    let path = QConsoleConfig::project_config_path(project_root);
    let overwritten = path.exists();

    QConsoleConfig::write_default(&path, args.force).with_context(|| {
        if overwritten {
            format!(
                "{} already exists; pass --force to overwrite it",
                path.display()
            )
        } else {
            format!("failed to write {}", path.display())
        }
    })?;

    tracing::info!(path = %path.display(), overwritten, "wrote default configuration");
    super::emit(&InitResponse { path, overwritten }, flags)
}
