//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to the
//! command implementations. Build behavior is controlled by the
//! settings table in `apx.toml`; flags only carry ambient overrides.

mod build;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;

/// Assetpipe - build front-end assets from src/ into dist/
#[derive(Parser)]
#[command(name = "apx")]
#[command(about = "Assetpipe - build scripts, styles, SVGs, and static files per apx.toml")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the build pipeline once
    Build {
        /// Override output directory
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Override source directory
        #[arg(long)]
        src: Option<PathBuf>,

        /// Show what would be built without building
        #[arg(long)]
        dry_run: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Build, start the dev server, and rebuild on changes
    Watch {
        /// Override output directory
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Override source directory
        #[arg(long)]
        src: Option<PathBuf>,

        /// Override dev server port
        #[arg(short, long)]
        port: Option<u16>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Initialize a new assetpipe project
    Init {
        /// Project directory (default: current directory)
        path: Option<PathBuf>,

        /// Project name (default: directory name)
        #[arg(long)]
        name: Option<String>,
    },
}

/// Run the CLI.
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { out, src, dry_run, verbose } => {
            build::run_build(out.as_deref(), src.as_deref(), dry_run, verbose)
        }
        Commands::Watch { out, src, port, verbose } => {
            build::run_watch(out.as_deref(), src.as_deref(), port, verbose)
        }
        Commands::Init { path, name } => build::run_init(path.as_deref(), name.as_deref()),
    }
}
