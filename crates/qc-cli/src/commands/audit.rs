use std::sync::Arc;

use anyhow::Context;
use qc_core::enums::{RunKind, RunStatus};

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::AuditResponse;
use crate::progress::TerminalSink;

/// Handle `qconsole audit`.
pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let sink = Arc::new(TerminalSink::foreground(RunKind::Audit, flags));
    let handle = ctx
        .controller
        .start(RunKind::Audit, sink.clone())
        .await
        .with_context(|| format!("failed to audit {}", ctx.asset_root.display()))?;

    let run = ctx.controller.wait(handle).await?;
    sink.finish(&run);
    let audit = ctx.controller.audit_report(handle)?;

    let failed = run.status() == RunStatus::Failed;
    super::emit(&AuditResponse { run, audit }, flags)?;
    if failed {
        anyhow::bail!("audit {} did not finish", handle.id);
    }
    Ok(())
}
