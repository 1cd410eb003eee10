mod error;
mod icons;
mod install;
mod package;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::error::ToolError;
use crate::install::InstallMode;

/// Developer tooling for the BF6 Stats Stream Deck plugin bundle.
#[derive(Debug, Parser)]
#[command(name = "bf6-stats-tools", version)]
struct Cli {
    /// Path to the `.sdPlugin` bundle directory.
    #[arg(long, global = true, default_value = "com.jmolund.bf6stats.sdPlugin")]
    plugin_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render the placeholder gradient icons into `<plugin-dir>/images`.
    Icons,
    /// Install the bundle into the local Stream Deck plugins directory.
    Install {
        /// Symlink instead of copying.
        #[arg(long)]
        symlink: bool,
    },
    /// Build the `.streamDeckPlugin` archive, optionally publishing a GitHub release.
    Package {
        /// Create a GitHub release for the manifest version via `gh`.
        #[arg(long)]
        publish: bool,
        /// Plugin executable to copy into the bundle before archiving.
        #[arg(long)]
        binary: Option<PathBuf>,
        #[arg(long, default_value = "dist")]
        dist_dir: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), ToolError> {
    match cli.command {
        Command::Icons => {
            let written = icons::generate(&cli.plugin_dir)?;
            tracing::info!("generated {} icons", written.len());
        }
        Command::Install { symlink } => {
            let mode = if symlink {
                InstallMode::Symlink
            } else {
                InstallMode::Copy
            };
            install::install(&cli.plugin_dir, &install::plugins_dir()?, mode)?;
        }
        Command::Package {
            publish,
            binary,
            dist_dir,
        } => {
            let manifest = package::read_manifest(&cli.plugin_dir)?;
            tracing::info!(
                "packaging {} v{}",
                manifest.name.as_deref().unwrap_or(package::RELEASE_TITLE),
                manifest.version
            );
            if let Some(binary) = binary {
                package::stage_binary(&cli.plugin_dir, &binary)?;
            }
            let archive = package::build_archive(&cli.plugin_dir, &dist_dir)?;
            if publish {
                package::publish(&manifest.version, &archive, &dist_dir)?;
            }
        }
    }
    Ok(())
}
