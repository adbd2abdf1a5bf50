//! Report types returned to callers and printed as JSON by `qconsole`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{AuditStatus, RunKind, RunStatus};
use crate::ids::RunId;

/// One required manifest entry and how it was classified.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditEntry {
    /// The required path as declared in the manifest.
    pub path: String,
    /// The leading path segment that was actually compared.
    pub top_level: String,
    pub status: AuditStatus,
}

/// Result of a manifest check, one entry per required path in manifest order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditReport {
    pub entries: Vec<AuditEntry>,
}

impl AuditReport {
    pub fn present(&self) -> impl Iterator<Item = &AuditEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.status == AuditStatus::Present)
    }

    pub fn missing(&self) -> impl Iterator<Item = &AuditEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.status == AuditStatus::Missing)
    }

    /// Status of the first entry declared with `path`.
    #[must_use]
    pub fn status_of(&self, path: &str) -> Option<AuditStatus> {
        self.entries
            .iter()
            .find(|entry| entry.path == path)
            .map(|entry| entry.status)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing().next().is_none()
    }
}

/// How a run ended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    Cancelled,
    Failed { reason: String },
}

impl RunOutcome {
    /// The terminal status this outcome settles a run into.
    #[must_use]
    pub const fn status(&self) -> RunStatus {
        match self {
            Self::Completed => RunStatus::Completed,
            Self::Cancelled => RunStatus::Cancelled,
            Self::Failed { .. } => RunStatus::Failed,
        }
    }
}

/// Terminal record of one run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: RunId,
    pub kind: RunKind,
    #[serde(flatten)]
    pub outcome: RunOutcome,
    /// Messages delivered to the sink, in delivery order.
    pub emitted: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.outcome.status()
    }
}

/// Row printed by `status` in the interactive console.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunSummary {
    pub kind: RunKind,
    pub run_id: Option<RunId>,
    pub status: RunStatus,
    pub emitted: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(path: &str, status: AuditStatus) -> AuditEntry {
        AuditEntry {
            path: path.to_string(),
            top_level: path.split('/').next().unwrap_or_default().to_string(),
            status,
        }
    }

    #[test]
    fn audit_report_partitions_entries() {
        let report = AuditReport {
            entries: vec![
                entry("A", AuditStatus::Present),
                entry("B", AuditStatus::Missing),
                entry("C/d", AuditStatus::Present),
            ],
        };

        let present: Vec<_> = report.present().map(|e| e.path.as_str()).collect();
        let missing: Vec<_> = report.missing().map(|e| e.path.as_str()).collect();
        assert_eq!(present, vec!["A", "C/d"]);
        assert_eq!(missing, vec!["B"]);
        assert_eq!(report.status_of("B"), Some(AuditStatus::Missing));
        assert_eq!(report.status_of("Z"), None);
        assert!(!report.is_complete());
    }

    #[test]
    fn run_report_serializes_outcome_inline() {
        let now = Utc::now();
        let report = RunReport {
            run_id: RunId::new(3),
            kind: RunKind::Build,
            outcome: RunOutcome::Failed {
                reason: "sink closed".into(),
            },
            emitted: vec!["one".into()],
            started_at: now,
            finished_at: now,
        };

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["outcome"], "failed");
        assert_eq!(value["reason"], "sink closed");
        assert_eq!(value["kind"], "build");
        assert_eq!(value["run_id"], 3);
        assert_eq!(report.status(), RunStatus::Failed);
    }
}
