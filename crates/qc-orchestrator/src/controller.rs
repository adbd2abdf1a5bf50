//! Run controller: owns every run, at most one running per kind.
//!
//! `start` registers a run and hands delivery to a spawned driver task, then
//! returns. The driver is the only writer of a run's terminal status. When a
//! kind is already running, the configured [`ConflictPolicy`] decides:
//!
//! - `Replace`: the old run is cancelled and awaited before the sink is
//!   cleared, so no stale message can land in the fresh log.
//! - `Reject`: `start` fails with [`OrchestratorError::AlreadyRunning`].
//!
//! Starts are serialized through an async gate, which makes the
//! check-cancel-register sequence atomic with respect to other starts.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use qc_core::enums::{ConflictPolicy, RunKind, RunStatus};
use qc_core::errors::CoreError;
use qc_core::ids::RunId;
use qc_core::responses::{AuditReport, RunOutcome, RunReport, RunSummary};
use qc_core::stage::StagePlan;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::OrchestratorError;
use crate::manifest::{self, ListingSource};
use crate::sequencer::{SequenceResult, StageSequencer};
use crate::sink::{ProgressSink, RecordingSink};

/// Terminal runs kept for `status`/`wait` lookups before the oldest are dropped.
const RUN_HISTORY_LIMIT: usize = 32;

/// Caller-side reference to one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunHandle {
    pub id: RunId,
    pub kind: RunKind,
}

type ReportRx = watch::Receiver<Option<RunReport>>;

struct RunEntry {
    status: RunStatus,
    cancel: CancellationToken,
    recorder: Arc<RecordingSink>,
    report: ReportRx,
    audit: Option<AuditReport>,
}

#[derive(Default)]
struct Registry {
    runs: HashMap<RunId, RunEntry>,
    active: HashMap<RunKind, RunId>,
    latest: HashMap<RunKind, RunId>,
}

impl Registry {
    fn running(&self, kind: RunKind) -> Option<(RunId, &RunEntry)> {
        let id = *self.active.get(&kind)?;
        self.runs
            .get(&id)
            .filter(|entry| entry.status == RunStatus::Running)
            .map(|entry| (id, entry))
    }

    fn prune(&mut self) {
        while self.runs.len() > RUN_HISTORY_LIMIT {
            let oldest = self
                .runs
                .iter()
                .filter(|(id, entry)| {
                    entry.status.is_terminal() && !self.latest.values().any(|latest| latest == *id)
                })
                .map(|(id, _)| *id)
                .min();
            match oldest {
                Some(id) => {
                    self.runs.remove(&id);
                }
                None => break,
            }
        }
    }
}

pub struct RunController {
    listing: Arc<dyn ListingSource>,
    required: Vec<String>,
    build_plan: StagePlan,
    policy: ConflictPolicy,
    registry: Arc<Mutex<Registry>>,
    start_gate: tokio::sync::Mutex<()>,
    next_seq: AtomicU64,
}

impl RunController {
    /// Controller auditing `required` against `listing` and narrating
    /// `build_plan` for build runs. Uses the default conflict policy.
    pub fn new(
        listing: Arc<dyn ListingSource>,
        required: Vec<String>,
        build_plan: StagePlan,
    ) -> Self {
        Self {
            listing,
            required,
            build_plan,
            policy: ConflictPolicy::default(),
            registry: Arc::new(Mutex::new(Registry::default())),
            start_gate: tokio::sync::Mutex::new(()),
            next_seq: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: ConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Scale every build stage offset by `factor`.
    ///
    /// # Errors
    ///
    /// Rejects negative or non-finite factors.
    pub fn with_time_scale(mut self, factor: f64) -> Result<Self, OrchestratorError> {
        self.build_plan = self.build_plan.scaled(factor)?;
        Ok(self)
    }

    #[must_use]
    pub const fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    #[must_use]
    pub const fn build_plan(&self) -> &StagePlan {
        &self.build_plan
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        lock(&self.registry)
    }

    /// Whether `id` was handed out by this controller.
    fn issued(&self, id: RunId) -> bool {
        (1..=self.next_seq.load(Ordering::Relaxed)).contains(&id.seq())
    }

    /// Error for a handle with no registry entry.
    fn missing(&self, id: RunId) -> OrchestratorError {
        if self.issued(id) {
            OrchestratorError::Evicted(id)
        } else {
            OrchestratorError::UnknownRun(id)
        }
    }

    /// Start a run of `kind`, delivering to `sink`.
    ///
    /// Returns once the run is registered; stages are delivered on a
    /// background task. The sink is cleared before the first message.
    ///
    /// # Errors
    ///
    /// - [`OrchestratorError::Manifest`] when an audit cannot read its listing
    ///   (nothing is cleared or emitted)
    /// - [`OrchestratorError::AlreadyRunning`] under the `Reject` policy
    /// - [`OrchestratorError::Sink`] when the sink cannot be cleared
    pub async fn start(
        &self,
        kind: RunKind,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<RunHandle, OrchestratorError> {
        let _gate = self.start_gate.lock().await;

        if self.policy == ConflictPolicy::Reject {
            if let Some((run_id, _)) = self.registry().running(kind) {
                debug!(%kind, %run_id, "start rejected, run already active");
                return Err(OrchestratorError::AlreadyRunning { kind, run_id });
            }
        }

        let (plan, audit) = self.plan_for(kind)?;

        let prior = self.registry().running(kind).map(|(id, entry)| {
            (
                id,
                entry.cancel.clone(),
                entry.report.clone(),
                entry.recorder.shares_target(&sink),
            )
        });

        // A sink the prior run writes to is cleared only once that run is
        // quiet; any other sink is cleared before the prior run is touched.
        let shared_sink = prior.as_ref().is_some_and(|(.., shared)| *shared);
        if !shared_sink {
            sink.clear()?;
        }

        if let Some((prior_id, cancel, mut report, _)) = prior {
            info!(%kind, prior = %prior_id, "replacing running run");
            cancel.cancel();
            if report.wait_for(Option::is_some).await.is_err() {
                warn!(%kind, prior = %prior_id, "replaced run ended without a report");
            }
        }

        if shared_sink {
            sink.clear()?;
        }

        let id = RunId::new(self.next_seq.fetch_add(1, Ordering::Relaxed) + 1);
        let handle = RunHandle { id, kind };
        let cancel = CancellationToken::new();
        let recorder = Arc::new(RecordingSink::new(sink));
        let (report_tx, report_rx) = watch::channel(None);

        {
            let mut registry = self.registry();
            registry.runs.insert(
                id,
                RunEntry {
                    status: RunStatus::Running,
                    cancel: cancel.clone(),
                    recorder: Arc::clone(&recorder),
                    report: report_rx,
                    audit,
                },
            );
            registry.active.insert(kind, id);
            registry.latest.insert(kind, id);
        }

        info!(run = %id, %kind, stages = plan.len(), "run started");
        tokio::spawn(drive(
            handle,
            StageSequencer::new(&plan),
            recorder,
            cancel,
            Arc::clone(&self.registry),
            report_tx,
        ));

        Ok(handle)
    }

    fn plan_for(
        &self,
        kind: RunKind,
    ) -> Result<(StagePlan, Option<AuditReport>), OrchestratorError> {
        match kind {
            RunKind::Build => Ok((self.build_plan.clone(), None)),
            RunKind::Audit => {
                let report = manifest::check_source(self.required.as_slice(), self.listing.as_ref())
                    .inspect_err(|error| warn!(%error, "audit not started"))?;
                Ok((manifest::audit_plan(&report), Some(report)))
            }
        }
    }

    /// Request cancellation. Cancelling a terminal run is a no-op, including
    /// one already evicted from the run history.
    ///
    /// The run settles as `Cancelled` at its next check point; use
    /// [`Self::wait`] to observe it.
    ///
    /// # Errors
    ///
    /// [`OrchestratorError::UnknownRun`] for a handle this controller never issued.
    pub fn cancel(&self, handle: RunHandle) -> Result<(), OrchestratorError> {
        let registry = self.registry();
        let Some(entry) = registry.runs.get(&handle.id) else {
            if self.issued(handle.id) {
                debug!(run = %handle.id, "cancel ignored, run already ended and evicted");
                return Ok(());
            }
            return Err(OrchestratorError::UnknownRun(handle.id));
        };
        if entry.status.is_terminal() {
            debug!(run = %handle.id, status = %entry.status, "cancel ignored, run already ended");
        } else {
            debug!(run = %handle.id, "cancel requested");
            entry.cancel.cancel();
        }
        Ok(())
    }

    /// Cancel whatever run of `kind` is active, if any.
    pub fn cancel_kind(&self, kind: RunKind) -> Option<RunHandle> {
        let handle = self.active(kind)?;
        self.cancel(handle).ok()?;
        Some(handle)
    }

    /// Current status of a run.
    ///
    /// # Errors
    ///
    /// [`OrchestratorError::UnknownRun`] for a handle this controller never
    /// issued, [`OrchestratorError::Evicted`] for one dropped from history.
    pub fn status(&self, handle: RunHandle) -> Result<RunStatus, OrchestratorError> {
        self.registry()
            .runs
            .get(&handle.id)
            .map(|entry| entry.status)
            .ok_or_else(|| self.missing(handle.id))
    }

    /// Status of the most recent run of `kind`, `Idle` if there was none.
    #[must_use]
    pub fn kind_status(&self, kind: RunKind) -> RunStatus {
        let registry = self.registry();
        registry
            .latest
            .get(&kind)
            .and_then(|id| registry.runs.get(id))
            .map_or(RunStatus::Idle, |entry| entry.status)
    }

    /// The running run of `kind`, if any.
    #[must_use]
    pub fn active(&self, kind: RunKind) -> Option<RunHandle> {
        self.registry()
            .running(kind)
            .map(|(id, _)| RunHandle { id, kind })
    }

    /// Messages delivered so far by a run.
    ///
    /// # Errors
    ///
    /// [`OrchestratorError::UnknownRun`] for a handle this controller never
    /// issued, [`OrchestratorError::Evicted`] for one dropped from history.
    pub fn emitted(&self, handle: RunHandle) -> Result<Vec<String>, OrchestratorError> {
        self.registry()
            .runs
            .get(&handle.id)
            .map(|entry| entry.recorder.delivered())
            .ok_or_else(|| self.missing(handle.id))
    }

    /// The manifest check behind an audit run. `None` for build runs.
    ///
    /// # Errors
    ///
    /// [`OrchestratorError::UnknownRun`] for a handle this controller never
    /// issued, [`OrchestratorError::Evicted`] for one dropped from history.
    pub fn audit_report(&self, handle: RunHandle) -> Result<Option<AuditReport>, OrchestratorError> {
        self.registry()
            .runs
            .get(&handle.id)
            .map(|entry| entry.audit.clone())
            .ok_or_else(|| self.missing(handle.id))
    }

    /// Wait for a run to reach a terminal state.
    ///
    /// # Errors
    ///
    /// [`OrchestratorError::UnknownRun`] for an unknown handle,
    /// [`OrchestratorError::Evicted`] for one dropped from history,
    /// [`OrchestratorError::Abandoned`] if the driver vanished without reporting.
    pub async fn wait(&self, handle: RunHandle) -> Result<RunReport, OrchestratorError> {
        let mut report = self
            .registry()
            .runs
            .get(&handle.id)
            .map(|entry| entry.report.clone())
            .ok_or_else(|| self.missing(handle.id))?;

        let settled = report
            .wait_for(Option::is_some)
            .await
            .map_err(|_| OrchestratorError::Abandoned(handle.id))?;
        settled
            .clone()
            .ok_or(OrchestratorError::Abandoned(handle.id))
    }

    /// One row per run kind, for status displays.
    #[must_use]
    pub fn summaries(&self) -> Vec<RunSummary> {
        let registry = self.registry();
        RunKind::ALL
            .into_iter()
            .map(|kind| {
                let latest = registry
                    .latest
                    .get(&kind)
                    .and_then(|id| registry.runs.get(id).map(|entry| (*id, entry)));
                match latest {
                    Some((id, entry)) => RunSummary {
                        kind,
                        run_id: Some(id),
                        status: entry.status,
                        emitted: entry.recorder.delivered_count(),
                    },
                    None => RunSummary {
                        kind,
                        run_id: None,
                        status: RunStatus::Idle,
                        emitted: 0,
                    },
                }
            })
            .collect()
    }
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drive one run to its end and settle it.
///
/// The sequencer runs on its own task so a panic inside a sink surfaces as a
/// `Failed` run instead of a driver that never reports.
async fn drive(
    handle: RunHandle,
    sequencer: StageSequencer,
    recorder: Arc<RecordingSink>,
    cancel: CancellationToken,
    registry: Arc<Mutex<Registry>>,
    report_tx: watch::Sender<Option<RunReport>>,
) {
    let started_at: DateTime<Utc> = Utc::now();

    let delivery = {
        let recorder = Arc::clone(&recorder);
        tokio::spawn(async move { sequencer.run(recorder.as_ref(), &cancel).await })
    };

    let result = match delivery.await {
        Ok(result) => result,
        Err(error) => SequenceResult {
            outcome: RunOutcome::Failed {
                reason: format!("stage delivery task failed: {error}"),
            },
            emitted: recorder.delivered(),
        },
    };

    let report = RunReport {
        run_id: handle.id,
        kind: handle.kind,
        outcome: result.outcome,
        emitted: result.emitted,
        started_at,
        finished_at: Utc::now(),
    };

    if let Err(error) = settle(&registry, &report) {
        warn!(%error, "ignoring run transition");
    }

    match &report.outcome {
        RunOutcome::Completed | RunOutcome::Cancelled => info!(
            run = %report.run_id,
            kind = %report.kind,
            status = %report.status(),
            emitted = report.emitted.len(),
            "run finished"
        ),
        RunOutcome::Failed { reason } => warn!(
            run = %report.run_id,
            kind = %report.kind,
            emitted = report.emitted.len(),
            %reason,
            "run failed"
        ),
    }

    report_tx.send_replace(Some(report));
}

/// Record a run's terminal status and release its kind.
///
/// The active slot is released and history pruned even when the status
/// change itself is refused.
fn settle(registry: &Mutex<Registry>, report: &RunReport) -> Result<(), CoreError> {
    let mut registry = lock(registry);
    let next = report.status();

    let transition = match registry.runs.get_mut(&report.run_id) {
        Some(entry) if entry.status.can_transition_to(next) => {
            entry.status = next;
            Ok(())
        }
        Some(entry) => Err(CoreError::InvalidTransition {
            id: report.run_id.to_string(),
            from: entry.status.to_string(),
            to: next.to_string(),
        }),
        None => Ok(()),
    };

    if registry.active.get(&report.kind) == Some(&report.run_id) {
        registry.active.remove(&report.kind);
    }

    registry.prune();
    transition
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::LogBuffer;

    fn entry(status: RunStatus) -> RunEntry {
        let (_tx, report) = watch::channel(None);
        RunEntry {
            status,
            cancel: CancellationToken::new(),
            recorder: Arc::new(RecordingSink::new(Arc::new(LogBuffer::new()))),
            report,
            audit: None,
        }
    }

    fn report(id: RunId, outcome: RunOutcome) -> RunReport {
        let now = Utc::now();
        RunReport {
            run_id: id,
            kind: RunKind::Build,
            outcome,
            emitted: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    #[test]
    fn settle_moves_running_to_terminal() {
        let id = RunId::new(1);
        let registry = Mutex::new(Registry::default());
        {
            let mut guard = lock(&registry);
            guard.runs.insert(id, entry(RunStatus::Running));
            guard.active.insert(RunKind::Build, id);
        }

        settle(&registry, &report(id, RunOutcome::Cancelled)).unwrap();

        let guard = lock(&registry);
        assert_eq!(guard.runs[&id].status, RunStatus::Cancelled);
        assert!(guard.active.is_empty());
    }

    #[test]
    fn settle_refuses_leaving_a_terminal_state() {
        let id = RunId::new(4);
        let registry = Mutex::new(Registry::default());
        {
            let mut guard = lock(&registry);
            guard.runs.insert(id, entry(RunStatus::Completed));
            guard.active.insert(RunKind::Build, id);
        }

        let error = settle(&registry, &report(id, RunOutcome::Cancelled)).unwrap_err();

        assert!(matches!(
            error,
            CoreError::InvalidTransition { ref id, ref from, ref to }
                if id == "run-0004" && from == "completed" && to == "cancelled"
        ));
        let guard = lock(&registry);
        assert_eq!(guard.runs[&id].status, RunStatus::Completed);
        assert!(guard.active.is_empty());
    }

    #[test]
    fn prune_keeps_latest_and_running_runs() {
        let mut registry = Registry::default();
        for seq in 1..=40 {
            registry.runs.insert(RunId::new(seq), entry(RunStatus::Completed));
        }
        registry.runs.insert(RunId::new(41), entry(RunStatus::Running));
        registry.latest.insert(RunKind::Audit, RunId::new(1));

        registry.prune();

        assert_eq!(registry.runs.len(), RUN_HISTORY_LIMIT);
        assert!(registry.runs.contains_key(&RunId::new(1)));
        assert!(registry.runs.contains_key(&RunId::new(41)));
        assert!(!registry.runs.contains_key(&RunId::new(2)));
    }
}
