use std::io::Write;
use std::sync::OnceLock;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use qc_core::enums::RunKind;
use qc_core::responses::{RunOutcome, RunReport};
use qc_orchestrator::{ProgressSink, SinkError, TracingSink};

use crate::cli::{GlobalFlags, OutputFormat};
use crate::ui;

pub struct Progress {
    bar: Option<ProgressBar>,
}

static MULTI_PROGRESS: OnceLock<MultiProgress> = OnceLock::new();

fn multi_progress() -> &'static MultiProgress {
    MULTI_PROGRESS.get_or_init(MultiProgress::new)
}

impl Progress {
    #[must_use]
    pub fn spinner(message: &str) -> Self {
        if !ui::prefs().progress {
            return Self { bar: None };
        }

        let bar = multi_progress().add(ProgressBar::new_spinner());
        bar.enable_steady_tick(std::time::Duration::from_millis(100));
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());
        Self { bar: Some(bar) }
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.bar.is_some()
    }

    pub fn set_message(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(message.to_string());
        }
    }

    /// Print a line above the spinner without disturbing it.
    pub fn println(&self, line: &str) {
        if let Some(bar) = &self.bar {
            bar.println(line);
        }
    }

    pub fn finish_ok(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.finish_with_message(message.to_string());
        }
    }

    pub fn finish_err(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.abandon_with_message(message.to_string());
        }
    }
}

/// Where a [`TerminalSink`] sends progress lines.
enum Target {
    /// Lines above an `indicatif` spinner.
    Spinner(Progress),
    /// Plain lines on stdout.
    Stdout,
    /// `tracing` events on stderr, keeping stdout for JSON reports.
    Log(TracingSink),
}

/// Progress sink rendering run messages in the terminal.
pub struct TerminalSink {
    kind: RunKind,
    target: Target,
}

impl TerminalSink {
    /// Sink for a foreground run: a spinner on an interactive terminal,
    /// plain lines otherwise, the log in JSON mode.
    #[must_use]
    pub fn foreground(kind: RunKind, flags: &GlobalFlags) -> Self {
        let target = if flags.format == OutputFormat::Json {
            Target::Log(TracingSink)
        } else {
            let spinner = Progress::spinner(&format!("{kind}: starting"));
            if spinner.is_active() {
                Target::Spinner(spinner)
            } else {
                Target::Stdout
            }
        };
        Self { kind, target }
    }

    /// Sink for a run started from the interactive prompt. Never draws a
    /// spinner, which would fight with the prompt line.
    #[must_use]
    pub fn background(kind: RunKind, flags: &GlobalFlags) -> Self {
        let target = if flags.format == OutputFormat::Json {
            Target::Log(TracingSink)
        } else {
            Target::Stdout
        };
        Self { kind, target }
    }

    /// Settle the spinner, if any, to reflect how the run ended.
    pub fn finish(&self, report: &RunReport) {
        let Target::Spinner(progress) = &self.target else {
            return;
        };
        match &report.outcome {
            RunOutcome::Completed => progress.finish_ok(&format!("{} completed", self.kind)),
            RunOutcome::Cancelled => progress.finish_err(&format!("{} cancelled", self.kind)),
            RunOutcome::Failed { reason } => {
                progress.finish_err(&format!("{} failed: {reason}", self.kind));
            }
        }
    }
}

impl ProgressSink for TerminalSink {
    fn notify(&self, message: &str) -> Result<(), SinkError> {
        match &self.target {
            Target::Spinner(progress) => {
                progress.println(message);
                progress.set_message(&format!("{}: {}", self.kind, message.trim()));
                Ok(())
            }
            Target::Stdout => {
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{message}")
                    .and_then(|()| stdout.flush())
                    .map_err(|error| SinkError::Write(error.to_string()))
            }
            Target::Log(sink) => sink.notify(message),
        }
    }

    fn clear(&self) -> Result<(), SinkError> {
        match &self.target {
            Target::Spinner(progress) => {
                progress.set_message(&format!("{}: starting", self.kind));
                Ok(())
            }
            Target::Stdout => Ok(()),
            Target::Log(sink) => sink.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(format: OutputFormat) -> GlobalFlags {
        GlobalFlags {
            format,
            quiet: false,
            verbose: false,
            project: None,
        }
    }

    #[test]
    fn json_mode_routes_progress_to_the_log() {
        let sink = TerminalSink::foreground(RunKind::Build, &flags(OutputFormat::Json));
        assert!(matches!(sink.target, Target::Log(_)));
        assert!(sink.notify("Step 1/4").is_ok());
        assert!(sink.clear().is_ok());
    }

    #[test]
    fn background_sink_never_draws_a_spinner() {
        let sink = TerminalSink::background(RunKind::Audit, &flags(OutputFormat::Text));
        assert!(matches!(sink.target, Target::Stdout));
    }

    #[test]
    fn spinner_is_inert_without_progress_prefs() {
        let progress = Progress::spinner("idle");
        assert!(!progress.is_active());
        progress.println("ignored");
        progress.finish_ok("done");
    }
}
