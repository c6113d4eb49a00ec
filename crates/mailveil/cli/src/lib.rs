//! Mailveil CLI - switch a mail client's anonymization profile from the terminal
//!
//! The CLI operates on a JSON preference snapshot and drives the same panel
//! entry points a settings window would:
//! - `show` prints the form the panel would load
//! - `apply` reconciles a profile selection (or previews it with `--dry-run`)
//! - `test` applies and reports the check page for the selection
//! - `keyserver-args` prints the keyserver arguments for a kind
//! - `forget` drops every remembered per-profile value

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mailveil_engine::{EngineConfig, LoggingConfig};
use mailveil_profiles::ProfileKind;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod error;
mod host;
pub mod output;

use commands::{Context, SelectionArgs};
pub use error::{CliError, CliResult};
use output::OutputFormat;

/// Mailveil CLI application
#[derive(Parser)]
#[command(name = "mailveil")]
#[command(about = "Mailveil - anonymization profiles for mail clients", long_about = None)]
#[command(version)]
struct Cli {
    /// Preference snapshot to read and update
    #[arg(long, env = "MAILVEIL_PREFS", default_value = "mailveil-prefs.json")]
    prefs: PathBuf,

    /// Engine configuration file
    #[arg(short, long, env = "MAILVEIL_CONFIG")]
    config: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    output: OutputFormat,

    /// Answer yes to the warning prompt
    #[arg(short, long)]
    yes: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Show the active profile as the settings panel would load it
    Show,

    /// Switch to a profile
    Apply {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Print the planned writes without saving
        #[arg(long)]
        dry_run: bool,
    },

    /// Switch to a profile and print the page that checks it
    Test {
        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// Print the keyserver arguments for a profile kind
    KeyserverArgs {
        #[arg(long)]
        kind: ProfileKind,

        #[arg(long)]
        hide_key_id: bool,
    },

    /// Forget every remembered per-profile value
    Forget,
}

/// Run using the current process arguments.
pub fn run() -> CliResult<()> {
    run_with_args(std::env::args_os())
}

/// Run using the provided argument iterator.
pub fn run_with_args<I, T>(args: I) -> CliResult<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    let config = EngineConfig::load(cli.config.as_deref())?;
    init_tracing(&config.logging, cli.verbose);

    let ctx = Context {
        config,
        prefs: cli.prefs,
        assume_yes: cli.yes,
        format: cli.output,
    };

    match cli.command {
        Commands::Show => commands::show(&ctx),
        Commands::Apply { selection, dry_run } => commands::apply(&ctx, &selection, dry_run),
        Commands::Test { selection } => commands::test(&ctx, &selection),
        Commands::KeyserverArgs { kind, hide_key_id } => {
            commands::keyserver(kind, hide_key_id, ctx.format)
        }
        Commands::Forget => commands::forget(&ctx),
    }
}

// Logs go to stderr so JSON output on stdout stays parseable.
fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if logging.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .without_time()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    // A subscriber may already be installed when embedded.
    let _ = result;
}
