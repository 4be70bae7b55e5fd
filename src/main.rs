//! fjrd CLI - converge macOS preferences to a declared TOML document.

use std::env;
use std::io::{self, IsTerminal};
use std::process;

use clap::Parser;
use fjrd::approval;
use fjrd::cli::{Cli, Commands, GlobalArgs};
use fjrd::commands::{self, CommandResult, PlanOutput};
use fjrd::config::{RunSettings, SettingsFile, SettingsOverrides, resolve_settings};
use fjrd::defaults::{DefaultsCli, DryRunStore, StoreOp};
use fjrd::domains::builtin_registry;
use fjrd::logging::{LogConfig, init_logging};
use fjrd::source::ResourceResolver;
use fjrd::sys::Deadline;
use fjrd::{Error, Result};
use tracing::debug;

fn main() {
    let cli = Cli::parse();
    let json = cli.global.json;

    if let Err(e) = run(cli) {
        report_error(&e, json);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(&cli.global, &cli.command)?;

    let log_config = LogConfig::new(settings.log_level.value, settings.log_format.value)
        .with_verbosity(cli.global.verbose, cli.global.quiet)
        .with_ansi(io::stderr().is_terminal());
    init_logging(&log_config)?;
    debug!(
        timeout = ?settings.timeout.value,
        timeout_source = %settings.timeout.source,
        log_level_source = %settings.log_level.source,
        "Resolved run settings"
    );

    let deadline = Deadline::after(settings.timeout.value);
    deadline.cancel_on_interrupt()?;

    let json = cli.global.json;
    match cli.command {
        Commands::Fetch { location } => {
            let resolver = ResourceResolver::system(deadline);
            output(&commands::fetch(&resolver, &location)?, json);
        }
        Commands::Plan { location } => {
            let resolver = ResourceResolver::system(deadline);
            let registry = builtin_registry()?;
            let result = commands::plan(&resolver, &registry, &location)?;
            output(&result, json);
            check_plan(&result)?;
        }
        Commands::Apply {
            location, dry_run, ..
        } => {
            let resolver = ResourceResolver::system(deadline.clone());
            let registry = builtin_registry()?;
            let plan = commands::load_plan(&resolver, &registry, &location)?;
            let assume_yes = settings.assume_yes.value || dry_run;

            let approved = commands::approve(&plan, &deadline, |operations| {
                if assume_yes {
                    Ok(true)
                } else {
                    ask(operations, &deadline, json)
                }
            })?;
            if !approved {
                if json {
                    println!(r#"{{"declined": true}}"#);
                } else {
                    println!("Aborted, nothing was applied.");
                }
                return Ok(());
            }

            // Execution gets the full timeout, starting after the prompt.
            let deadline = deadline.renewed(settings.timeout.value);
            let result = if dry_run {
                let store = DryRunStore::new();
                let mut result = commands::apply(&plan, &store, &deadline)?;
                result.dry_run = true;
                result.calls = store.calls();
                result
            } else {
                let store = DefaultsCli::new(deadline.clone());
                commands::apply(&plan, &store, &deadline)?
            };
            output(&result, json);
        }
        Commands::Domains => {
            let registry = builtin_registry()?;
            output(&commands::domains(&registry), json);
        }
    }
    Ok(())
}

/// Prompt on the terminal before raw operations run.
fn ask(operations: &[StoreOp], deadline: &Deadline, json: bool) -> Result<bool> {
    // Keep stdout parseable in JSON mode.
    if json {
        approval::confirm(operations, io::stdin(), &mut io::stderr(), deadline)
    } else {
        approval::confirm(operations, io::stdin(), &mut io::stdout(), deadline)
    }
}

/// Resolve run settings from flags, environment and the settings file.
fn load_settings(global: &GlobalArgs, command: &Commands) -> Result<RunSettings> {
    let env_lookup = |name: &str| env::var(name).ok();
    let path = SettingsFile::default_path(env_lookup);
    let file = match &path {
        Some(path) => SettingsFile::load(path)?,
        None => SettingsFile::default(),
    };

    let yes = matches!(command, Commands::Apply { yes: true, .. });
    let overrides = SettingsOverrides::new()
        .with_timeout_secs(global.timeout)
        .with_log_level(global.log_level)
        .with_log_format(global.log_format)
        .with_assume_yes(yes);
    resolve_settings(&overrides, &file, path.as_deref(), env_lookup)
}

fn check_plan(result: &PlanOutput) -> Result<()> {
    match result.invalid_count() {
        0 => Ok(()),
        1 => Err(Error::Other("1 domain failed validation".to_string())),
        n => Err(Error::Other(format!("{} domains failed validation", n))),
    }
}

fn output<T: CommandResult>(result: &T, json: bool) {
    if json {
        println!("{}", result.to_json());
    } else {
        println!("{}", result.to_human());
    }
}

fn report_error(error: &Error, json: bool) {
    let partial = matches!(error, Error::Domains(_) | Error::Batch { .. });
    if json {
        let body = serde_json::json!({
            "error": error.to_string(),
            "partial": partial,
        });
        eprintln!("{}", body);
    } else {
        eprintln!("Error: {}", error);
        if partial {
            eprintln!("Note: changes applied before the failure were not rolled back.");
        }
    }
}
