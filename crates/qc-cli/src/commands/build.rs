use std::future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use qc_core::enums::{RunKind, RunStatus};

use crate::cli::{BuildArgs, GlobalFlags};
use crate::context::AppContext;
use crate::progress::TerminalSink;

/// Handle `qconsole build`.
pub async fn handle(args: &BuildArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let sink = Arc::new(TerminalSink::foreground(RunKind::Build, flags));
    let handle = ctx
        .controller
        .start(RunKind::Build, sink.clone())
        .await
        .context("failed to start build")?;

    let report = tokio::select! {
        report = ctx.controller.wait(handle) => report?,
        () = interrupted(args.cancel_after.map(Duration::from_millis)) => {
            tracing::info!(run = %handle.id, "cancelling build");
            ctx.controller.cancel(handle)?;
            ctx.controller.wait(handle).await?
        }
    };
    sink.finish(&report);

    let failed = report.status() == RunStatus::Failed;
    super::emit(&report, flags)?;
    if failed {
        anyhow::bail!("build {} did not finish", handle.id);
    }
    Ok(())
}

/// Resolves on Ctrl-C or once `after` elapses, whichever comes first.
async fn interrupted(after: Option<Duration>) {
    let deadline = async {
        match after {
            Some(delay) => tokio::time::sleep(delay).await,
            None => future::pending().await,
        }
    };
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::warn!(%error, "cannot listen for Ctrl-C");
            future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => {}
        () = deadline => {}
    }
}
