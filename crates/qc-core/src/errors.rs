//! Cross-cutting error types for Quantum Console.
//!
//! Domain-specific errors (e.g., `ManifestError`, `OrchestratorError`) are
//! defined in their respective crates. The CLI converges everything through
//! `anyhow`.

use thiserror::Error;

/// Errors that can be raised by any Quantum Console crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Data failed validation (format, constraints).
    #[error("Validation error: {0}")]
    Validation(String),

    /// A state machine transition was attempted that is not allowed.
    #[error("Invalid state transition: run {id} from {from} to {to}")]
    InvalidTransition { id: String, from: String, to: String },
}
