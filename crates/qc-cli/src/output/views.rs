//! Response shapes printed by commands.

use std::fmt::Write as _;
use std::path::PathBuf;

use qc_core::responses::{AuditReport, RunOutcome, RunReport, RunSummary};
use serde::Serialize;

use super::TextView;

impl TextView for RunReport {
    fn text_view(&self) -> String {
        let messages = self.emitted.len();
        match &self.outcome {
            RunOutcome::Failed { reason } => {
                format!(
                    "{} {} failed: {reason} ({messages} messages)",
                    self.run_id, self.kind
                )
            }
            outcome => format!(
                "{} {} {} ({messages} messages)",
                self.run_id,
                self.kind,
                outcome.status()
            ),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuditResponse {
    pub run: RunReport,
    pub audit: Option<AuditReport>,
}

impl TextView for AuditResponse {
    fn text_view(&self) -> String {
        let mut line = self.run.text_view();
        if let Some(audit) = &self.audit {
            let _ = write!(
                line,
                "; {} present, {} missing",
                audit.present().count(),
                audit.missing().count()
            );
        }
        line
    }
}

#[derive(Debug, Serialize)]
pub struct InitResponse {
    pub path: PathBuf,
    pub overwritten: bool,
}

impl TextView for InitResponse {
    fn text_view(&self) -> String {
        let verb = if self.overwritten { "rewrote" } else { "wrote" };
        format!("{verb} default configuration to {}", self.path.display())
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub runs: Vec<RunSummary>,
}

impl TextView for StatusResponse {
    fn text_view(&self) -> String {
        self.runs
            .iter()
            .map(|summary| match summary.run_id {
                Some(id) => format!(
                    "{:<6} {:<10} {id} ({} messages)",
                    summary.kind.as_str(),
                    summary.status.as_str(),
                    summary.emitted
                ),
                None => format!(
                    "{:<6} {}",
                    summary.kind.as_str(),
                    summary.status.as_str()
                ),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
