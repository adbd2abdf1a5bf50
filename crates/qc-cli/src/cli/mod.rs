use clap::Parser;

pub mod global;
pub mod root_commands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::{BuildArgs, Commands, InitArgs};

/// Top-level CLI parser for the `qconsole` binary.
#[derive(Debug, Parser)]
#[command(
    name = "qconsole",
    version,
    about = "Quantum Console - staged audit and build runs"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: text, json
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project root path (defaults to the current directory)
    #[arg(short, long, global = true)]
    pub project: Option<String>,
}

impl Cli {
    /// Extract ergonomic global flags struct for command handlers.
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            quiet: self.quiet,
            verbose: self.verbose,
            project: self.project.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::{CommandFactory, Parser};

    use super::{Cli, Commands, GlobalFlags, OutputFormat};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_before_subcommand() {
        let cli = Cli::try_parse_from(["qconsole", "--format", "json", "--verbose", "console"])
            .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Console));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["qconsole", "build", "--format", "text", "--quiet"])
            .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Text);
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Build(_)));
    }

    #[test]
    fn format_defaults_to_text() {
        let cli = Cli::try_parse_from(["qconsole", "audit"]).expect("cli should parse");
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn output_format_rejects_invalid_value() {
        let parsed = Cli::try_parse_from(["qconsole", "--format", "xml", "audit"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn build_parses_cancel_after() {
        let cli = Cli::try_parse_from(["qconsole", "build", "--cancel-after", "2000"])
            .expect("cli should parse");
        let Commands::Build(args) = cli.command else {
            panic!("expected build command");
        };
        assert_eq!(args.cancel_after, Some(2000));
    }

    #[test]
    fn audit_root_is_exposed_for_audit_only() {
        let audit = Cli::try_parse_from(["qconsole", "audit", "--root", "/tmp/assets"])
            .expect("cli should parse");
        assert_eq!(
            audit.command.audit_root(),
            Some(PathBuf::from("/tmp/assets"))
        );

        let build = Cli::try_parse_from(["qconsole", "build"]).expect("cli should parse");
        assert_eq!(build.command.audit_root(), None);
    }

    #[test]
    fn init_accepts_force() {
        let cli = Cli::try_parse_from(["qconsole", "init", "--force"]).expect("cli should parse");
        assert!(matches!(cli.command, Commands::Init(ref args) if args.force));
    }

    #[test]
    fn global_flags_extraction_copies_values() {
        let cli = Cli::try_parse_from(["qconsole", "--project", "/tmp/demo", "console"])
            .expect("cli should parse");
        let flags: GlobalFlags = cli.global_flags();
        assert_eq!(flags.project.as_deref(), Some("/tmp/demo"));
    }
}
