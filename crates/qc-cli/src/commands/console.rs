//! Interactive prompt. Runs started here stream in the background; the
//! prompt keeps reading commands while they play.

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use qc_core::enums::RunKind;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::{self, StatusResponse};
use crate::progress::TerminalSink;

const PROMPT: &str = ">> ";

const HELP: &str = "\
Available commands:
  audit          - Check the project layout against the required manifest.
  build          - Play the simulated build stages.
  cancel <kind>  - Cancel the running audit or build.
  status         - Show the latest run of each kind.
  help           - Show this help message.
  exit | quit    - Leave the console.
A leading '!' is accepted, e.g. '!build'.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ConsoleCommand {
    Empty,
    Start(RunKind),
    Cancel(RunKind),
    Status,
    Help,
    Exit,
}

impl ConsoleCommand {
    /// Parse one prompt line. `Err` carries a hint for the user.
    fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let line = line.strip_prefix('!').unwrap_or(line).trim();

        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(Self::Empty);
        };
        let arg = words.next();

        match (head.to_ascii_lowercase().as_str(), arg) {
            ("audit", None) => Ok(Self::Start(RunKind::Audit)),
            ("build", None) => Ok(Self::Start(RunKind::Build)),
            ("cancel", Some(kind)) => kind
                .parse()
                .map(Self::Cancel)
                .map_err(|_| format!("unknown run kind '{kind}'. Usage: cancel <audit|build>")),
            ("cancel", None) => Err("usage: cancel <audit|build>".to_string()),
            ("status", None) => Ok(Self::Status),
            ("help", _) => Ok(Self::Help),
            ("exit" | "quit", _) => Ok(Self::Exit),
            _ => Err(format!("unknown command '{line}'. Type 'help' for commands.")),
        }
    }
}

/// Handle `qconsole console`.
pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    println!(
        "Quantum Console ready in {} (conflict policy: {}). Type 'help' for commands.",
        ctx.project_root.display(),
        ctx.config.runs.conflict_policy
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt()?;
        let Some(line) = lines
            .next_line()
            .await
            .context("failed to read console input")?
        else {
            break;
        };

        match ConsoleCommand::parse(&line) {
            Ok(ConsoleCommand::Empty) => {}
            Ok(ConsoleCommand::Exit) => break,
            Ok(ConsoleCommand::Help) => println!("{HELP}"),
            Ok(ConsoleCommand::Status) => output::output(
                &StatusResponse {
                    runs: ctx.controller.summaries(),
                },
                flags.format,
            )?,
            Ok(ConsoleCommand::Start(kind)) => start_in_background(ctx, kind, flags).await,
            Ok(ConsoleCommand::Cancel(kind)) => match ctx.controller.cancel_kind(kind) {
                Some(handle) => println!("cancelling {kind} {}", handle.id),
                None => println!("no {kind} run in progress"),
            },
            Err(hint) => println!("{hint}"),
        }
    }

    for kind in RunKind::ALL {
        if let Some(handle) = ctx.controller.cancel_kind(kind) {
            let _ = ctx.controller.wait(handle).await;
        }
    }
    Ok(())
}

fn prompt() -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    write!(stdout, "{PROMPT}")?;
    stdout.flush()?;
    Ok(())
}

/// Start a run and report its end once it settles. Start failures are
/// printed and leave the prompt running.
async fn start_in_background(ctx: &AppContext, kind: RunKind, flags: &GlobalFlags) {
    let sink = Arc::new(TerminalSink::background(kind, flags));
    let handle = match ctx.controller.start(kind, sink).await {
        Ok(handle) => handle,
        Err(error) => {
            println!("could not start {kind}: {error}");
            return;
        }
    };

    let controller = Arc::clone(&ctx.controller);
    let format = flags.format;
    tokio::spawn(async move {
        match controller.wait(handle).await {
            Ok(report) => {
                if let Err(error) = output::output(&report, format) {
                    tracing::warn!(%error, run = %handle.id, "failed to print run report");
                }
            }
            Err(error) => tracing::warn!(%error, run = %handle.id, "lost track of console run"),
        }
    });
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::ConsoleCommand;
    use qc_core::enums::RunKind;

    #[rstest]
    #[case("audit", ConsoleCommand::Start(RunKind::Audit))]
    #[case("!build", ConsoleCommand::Start(RunKind::Build))]
    #[case("  BUILD  ", ConsoleCommand::Start(RunKind::Build))]
    #[case("cancel build", ConsoleCommand::Cancel(RunKind::Build))]
    #[case("!cancel audit", ConsoleCommand::Cancel(RunKind::Audit))]
    #[case("status", ConsoleCommand::Status)]
    #[case("!help", ConsoleCommand::Help)]
    #[case("exit", ConsoleCommand::Exit)]
    #[case("quit", ConsoleCommand::Exit)]
    #[case("", ConsoleCommand::Empty)]
    #[case("!", ConsoleCommand::Empty)]
    fn parses_known_commands(#[case] line: &str, #[case] expected: ConsoleCommand) {
        assert_eq!(ConsoleCommand::parse(line), Ok(expected));
    }

    #[rstest]
    #[case("deploy", "Type 'help'")]
    #[case("cancel", "usage: cancel")]
    #[case("cancel deploy", "unknown run kind 'deploy'")]
    #[case("audit now", "unknown command")]
    fn unknown_input_yields_hint(#[case] line: &str, #[case] hint: &str) {
        let error = ConsoleCommand::parse(line).unwrap_err();
        assert!(error.contains(hint), "{error}");
    }
}
