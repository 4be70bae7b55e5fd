//! CLI argument definitions for fjrd.

use clap::{Args, Parser, Subcommand};

use crate::logging::{LogFormat, LogLevel};

/// Version string with the commit and build time baked in by `build.rs`.
pub const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("FJRD_GIT_COMMIT"),
    " ",
    env!("FJRD_BUILD_TIMESTAMP"),
    ")"
);

/// fjrd - converge macOS preferences to a declared TOML document.
///
/// LOCATION is a local `.toml` path, an `https://` URL to a `.toml` file, a
/// GitHub blob URL, or a GitHub repository (`owner/repo`,
/// `github.com/owner/repo`, `owner/repo/branch/path.toml`).
#[derive(Parser, Debug)]
#[command(name = "fjrd")]
#[command(author, version = VERSION, about = "Converge macOS preferences to a declared TOML document", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options accepted by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Print command output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Log level for diagnostics on stderr [env: FJRD_LOG_LEVEL]
    #[arg(long, value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    /// Log format for diagnostics on stderr [env: FJRD_LOG_FORMAT]
    #[arg(long, value_enum, global = true)]
    pub log_format: Option<LogFormat>,

    /// Overall time limit in seconds for fetching and applying [env: FJRD_TIMEOUT]
    #[arg(long, value_name = "SECONDS", global = true)]
    pub timeout: Option<u64>,

    /// Show debug diagnostics
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only show errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply the configuration at LOCATION to this machine
    ///
    /// Domains are applied one after another. Within a domain, the first
    /// failing command stops that domain; other domains still run. Raw
    /// `defaultsRaw` entries are listed and confirmed before anything runs.
    Apply {
        /// Configuration location
        location: String,

        /// Run raw defaults without asking
        #[arg(short, long)]
        yes: bool,

        /// Show what would be written without touching any preference
        #[arg(long)]
        dry_run: bool,
    },

    /// Show every command `apply` would run, without running anything
    Plan {
        /// Configuration location
        location: String,
    },

    /// Print the configuration document at LOCATION
    Fetch {
        /// Configuration location
        location: String,
    },

    /// List the typed settings domains and their options
    Domains,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_apply_flags() {
        let cli = Cli::parse_from(["fjrd", "apply", "me/dotfiles", "--yes", "--dry-run"]);
        match cli.command {
            Commands::Apply {
                location,
                yes,
                dry_run,
            } => {
                assert_eq!(location, "me/dotfiles");
                assert!(yes);
                assert!(dry_run);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "fjrd",
            "plan",
            "fjrd.toml",
            "--json",
            "--timeout",
            "5",
            "--log-level",
            "debug",
        ]);
        assert!(cli.global.json);
        assert_eq!(cli.global.timeout, Some(5));
        assert_eq!(cli.global.log_level, Some(LogLevel::Debug));
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["fjrd", "-v", "-q", "domains"]).is_err());
    }

    #[test]
    fn test_location_is_required() {
        assert!(Cli::try_parse_from(["fjrd", "fetch"]).is_err());
    }
}
