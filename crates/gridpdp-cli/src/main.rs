//! gridpdp command-line interface.
//!
//! Evaluates authorization requests against policy documents and inspects
//! the layered evaluator configuration.
//!
//! # Quick Start
//!
//! ```bash
//! # Check that policy documents load
//! gridpdp check policies/grid.toml
//!
//! # Evaluate a request (exit status 0 = permitted, 2 = denied)
//! gridpdp evaluate --request request.json --policy policies/grid.toml
//!
//! # Show the effective configuration
//! gridpdp config show --format toml
//! ```

mod commands;
mod style;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use gridpdp::EvaluationMode;
use tracing_subscriber::EnvFilter;

/// gridpdp - policy decision point for grid authorization.
#[derive(Parser)]
#[command(name = "gridpdp")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information.
    Version,

    /// Evaluate a request document.
    Evaluate {
        /// Request document (JSON or TOML).
        #[arg(short, long)]
        request: PathBuf,

        /// Policy document; repeat for several. Replaces configured sources.
        #[arg(short, long = "policy")]
        policies: Vec<PathBuf>,

        /// Project directory holding gridpdp.toml.
        #[arg(long, default_value = ".")]
        project: PathBuf,

        /// Output format.
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Override the tuple evaluation mode.
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Override the store combining algorithm.
        #[arg(long)]
        algorithm: Option<String>,

        /// Show every candidate decision per tuple.
        #[arg(long)]
        explain: bool,
    },

    /// Load policy documents and report their rules.
    Check {
        /// Policy documents to load.
        #[arg(required = true)]
        policies: Vec<PathBuf>,
    },

    /// Configuration commands.
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration.
    Show {
        /// Project directory holding gridpdp.toml.
        #[arg(long, default_value = ".")]
        project: PathBuf,

        /// Output format.
        #[arg(short, long, value_enum, default_value_t = ConfigFormat::Text)]
        format: ConfigFormat,
    },

    /// Check that the configuration loads and names known factories.
    Validate {
        /// Project directory holding gridpdp.toml.
        #[arg(long, default_value = ".")]
        project: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ConfigFormat {
    Text,
    Json,
    Toml,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    FailsOnDeny,
    StopsOnDeny,
    StopsOnPermit,
    StopsNever,
}

impl From<ModeArg> for EvaluationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::FailsOnDeny => Self::FailsOnDeny,
            ModeArg::StopsOnDeny => Self::StopsOnDeny,
            ModeArg::StopsOnPermit => Self::StopsOnPermit,
            ModeArg::StopsNever => Self::StopsNever,
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    style::set_no_color(cli.no_color || std::env::var_os("NO_COLOR").is_some());

    match cli.command {
        Commands::Version => {
            commands::version::run();
            Ok(ExitCode::SUCCESS)
        }
        Commands::Evaluate {
            request,
            policies,
            project,
            format,
            mode,
            algorithm,
            explain,
        } => commands::evaluate::run(&commands::evaluate::EvaluateArgs {
            request,
            policies,
            project,
            format,
            mode: mode.map(EvaluationMode::from),
            algorithm,
            explain,
        }),
        Commands::Check { policies } => commands::check::run(&policies).map(|()| ExitCode::SUCCESS),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show { project, format } => commands::config::show(&project, format),
            ConfigCommands::Validate { project } => commands::config::validate(&project),
        }
        .map(|()| ExitCode::SUCCESS),
    }
}
