use qc_core::enums::RunKind;
use qc_core::errors::CoreError;
use qc_core::ids::RunId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    /// The listing source could not be read. No audit result is produced.
    #[error("listing source unavailable ({source_name}): {reason}")]
    SourceUnavailable { source_name: String, reason: String },
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("progress sink is closed")]
    Closed,
    #[error("progress sink lock poisoned")]
    Poisoned,
    #[error("progress sink write failed: {0}")]
    Write(String),
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error("a {kind} run is already running ({run_id})")]
    AlreadyRunning { kind: RunKind, run_id: RunId },
    #[error("unknown run: {0}")]
    UnknownRun(RunId),
    /// Issued by this controller, ended, then dropped from the run history.
    #[error("run {0} has ended and its record was discarded")]
    Evicted(RunId),
    #[error("run {0} ended without reporting an outcome")]
    Abandoned(RunId),
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),
    #[error(transparent)]
    Core(#[from] CoreError),
}
