//! maestro-hook: CLI hook handler for Maestro.
//!
//! Called directly by Claude Code hooks configured in `.claude/settings.json`.
//! Text printed to stdout is injected into the conversation; diagnostics go to
//! the log file and, for warnings, to stderr.
//!
//! ## Subcommands
//!
//! - `handle`: Main hook handler, reads one payload from stdin
//! - `flags`: Prints the resolved feature flags as JSON

mod handle;
mod logging;

use clap::{Parser, Subcommand};
use maestro_core::{FeatureFlags, MaestroError, MaestroPaths};

#[derive(Parser)]
#[command(name = "maestro-hook")]
#[command(about = "Maestro session tracker and capability recommender")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Handle a hook event (reads JSON or prompt text from stdin)
    Handle,

    /// Print the resolved feature flags
    Flags {
        /// Project directory (defaults to CLAUDE_PROJECT_DIR or the current directory)
        #[arg(long, value_name = "DIR")]
        project: Option<String>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("Failed to read stdin: {0}")]
    Stdin(#[source] std::io::Error),

    #[error("Failed to write output: {0}")]
    Stdout(#[source] std::io::Error),

    #[error(transparent)]
    Core(#[from] MaestroError),

    #[error("Failed to serialize flags: {0}")]
    Json(#[from] serde_json::Error),
}

fn main() {
    let _logging_guard = logging::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Handle => {
            if let Err(e) = handle::run() {
                tracing::error!(error = %e, "maestro-hook handle failed");
                std::process::exit(1);
            }
        }
        Commands::Flags { project } => {
            if let Err(e) = print_flags(project.as_deref()) {
                tracing::error!(error = %e, "maestro-hook flags failed");
                std::process::exit(1);
            }
        }
    }
}

fn print_flags(project: Option<&str>) -> Result<(), HookError> {
    let paths = match project {
        Some(dir) => MaestroPaths::for_project(dir),
        None => MaestroPaths::resolve(None),
    };
    let flags = FeatureFlags::load(&paths.feature_flags_file());
    println!("{}", serde_json::to_string_pretty(&flags)?);
    Ok(())
}
