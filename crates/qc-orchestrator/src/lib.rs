//! # qc-orchestrator
//!
//! The staged task orchestrator behind Quantum Console.
//!
//! - [`manifest`]: classifies required project paths against a top-level listing
//! - [`sequencer`]: plays a stage plan with correct relative timing
//! - [`controller`]: at most one active run per kind, with cancel and replace
//! - [`sink`]: the progress observer interface and in-process implementations
//!
//! Delivery runs on tokio tasks. Cancellation is cooperative, via
//! `tokio_util::sync::CancellationToken`.

pub mod controller;
pub mod error;
pub mod manifest;
pub mod sequencer;
pub mod sink;

pub use controller::{RunController, RunHandle};
pub use error::{ManifestError, OrchestratorError, SinkError};
pub use manifest::{DirListing, ListingSource, ObservedListing, StaticListing};
pub use sequencer::{SequenceResult, StageSequencer};
pub use sink::{LogBuffer, ProgressSink, TracingSink};
