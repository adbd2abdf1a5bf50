//! Plays a stage plan against a progress sink.
//!
//! One task delivers every stage of a run, so delivery order is the plan's
//! sorted order no matter how timers fire. Each stage waits until
//! `start + offset` on the tokio clock; the wait is raced against the
//! cancellation token with cancellation checked first, so a cancelled run
//! never delivers another stage, zero-offset stages included.

use qc_core::enums::RunKind;
use qc_core::responses::RunOutcome;
use qc_core::stage::{Stage, StagePlan};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::sink::ProgressSink;

/// Outcome of one sequencer pass plus what reached the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceResult {
    pub outcome: RunOutcome,
    pub emitted: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct StageSequencer {
    kind: RunKind,
    stages: Vec<Stage>,
}

impl StageSequencer {
    #[must_use]
    pub fn new(plan: &StagePlan) -> Self {
        Self {
            kind: plan.kind,
            stages: plan.ordered(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> RunKind {
        self.kind
    }

    /// Stages in the order they will be delivered.
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Deliver every stage at its offset, stopping early on cancellation or
    /// on the first sink failure.
    pub async fn run(&self, sink: &dyn ProgressSink, cancel: &CancellationToken) -> SequenceResult {
        let started = Instant::now();
        let mut emitted = Vec::with_capacity(self.stages.len());

        for (index, stage) in self.stages.iter().enumerate() {
            let deadline = started + stage.offset();

            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!(
                        kind = %self.kind,
                        delivered = emitted.len(),
                        next = %stage.label,
                        "stage sequence cancelled"
                    );
                    return SequenceResult {
                        outcome: RunOutcome::Cancelled,
                        emitted,
                    };
                }
                () = tokio::time::sleep_until(deadline) => {}
            }

            if let Err(error) = sink.notify(&stage.message) {
                warn!(kind = %self.kind, stage = %stage.label, %error, "stage delivery failed");
                return SequenceResult {
                    outcome: RunOutcome::Failed {
                        reason: format!("delivering stage '{}' failed: {error}", stage.label),
                    },
                    emitted,
                };
            }

            debug!(
                kind = %self.kind,
                stage = %stage.label,
                index,
                offset_ms = stage.offset_ms,
                "stage delivered"
            );
            emitted.push(stage.message.clone());
        }

        SequenceResult {
            outcome: RunOutcome::Completed,
            emitted,
        }
    }
}
