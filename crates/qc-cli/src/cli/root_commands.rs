use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Write `.qconsole/config.toml` with the built-in defaults.
    Init(InitArgs),
    /// Check the project layout against the required manifest.
    Audit(AuditArgs),
    /// Play the simulated build stages.
    Build(BuildArgs),
    /// Interactive prompt; runs stream in the background.
    Console,
}

impl Commands {
    /// Asset root override carried by the command, if any.
    #[must_use]
    pub fn audit_root(&self) -> Option<PathBuf> {
        match self {
            Self::Audit(args) => args.root.clone(),
            Self::Init(_) | Self::Build(_) | Self::Console => None,
        }
    }
}

#[derive(Clone, Debug, Args)]
pub struct InitArgs {
    /// Overwrite an existing config file.
    #[arg(long)]
    pub force: bool,
}

#[derive(Clone, Debug, Args)]
pub struct AuditArgs {
    /// Directory to audit (defaults to `manifest.asset_root`).
    #[arg(long)]
    pub root: Option<PathBuf>,
}

#[derive(Clone, Debug, Args)]
pub struct BuildArgs {
    /// Cancel the build after this many milliseconds.
    #[arg(long, value_name = "MS")]
    pub cancel_after: Option<u64>,
}
