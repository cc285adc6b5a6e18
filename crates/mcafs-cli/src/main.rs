//! mcafs: browse a content-addressed asset store as a read-only filesystem.
//!
//! Usage:
//!   # List the indexes found under ~/.minecraft/assets
//!   mcafs indexes
//!
//!   # Look around
//!   mcafs ls /legacy/minecraft/sounds
//!   mcafs tree /legacy --depth 2
//!   mcafs cat /legacy/pack.mcmeta
//!
//!   # Interactive shell (the default)
//!   mcafs --root /srv/assets shell
//!
//! Settings come from `--config`, else `mcafs/config.toml` in the user's
//! config directory; flags override the file.

mod commands;
mod config;
mod shell;

use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mcafs_kernel::AssetFs;
use tokio::io::{AsyncWriteExt, BufReader};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use config::{Config, DEFAULT_LOG_LEVEL, Settings};

/// Read-only browser for content-addressed asset stores.
#[derive(Parser, Debug)]
#[command(name = "mcafs", version)]
#[command(about = "Browse a content-addressed asset store as a read-only filesystem")]
struct Args {
    /// Asset store root (contains `indexes/` and `objects/`)
    #[arg(long, global = true)]
    root: Option<String>,

    /// Config file (default: <config dir>/mcafs/config.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Tracing filter, e.g. `debug` or `mcafs_kernel=trace` (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Manifest file extension in `indexes/`
    #[arg(long, global = true)]
    extension: Option<String>,

    /// Mount manifests flagged `map_to_resources` under this subdirectory
    #[arg(long, global = true)]
    resources_prefix: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List loaded indexes and manifests that failed to load
    Indexes {
        #[arg(long)]
        json: bool,
    },
    /// List a directory
    Ls {
        #[arg(default_value = "/")]
        path: String,
    },
    /// Show one entry
    Stat {
        path: String,
        #[arg(long)]
        json: bool,
    },
    /// Write a file's bytes to stdout
    Cat {
        path: String,
        /// Start reading at this byte offset
        #[arg(long, default_value_t = 0)]
        offset: u64,
    },
    /// Draw the directory tree
    Tree {
        #[arg(default_value = "/")]
        path: String,
        /// Maximum depth to descend
        #[arg(long)]
        depth: Option<usize>,
    },
    /// Interactive shell over one session
    Shell,
}

impl Args {
    /// Flag values, shaped like a config file so they can be overlaid.
    fn overrides(&self) -> Config {
        Config {
            root: self.root.clone(),
            manifest_extension: self.extension.clone(),
            resources_prefix: self.resources_prefix.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL)),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match Config::load(args.config.as_deref()) {
        Ok(file) => file.overlay(args.overrides()),
        Err(e) => {
            eprintln!("mcafs: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(config.log_level());

    let command = args.command.unwrap_or(Command::Shell);
    match run(command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: &Config) -> Result<()> {
    let Settings { root, load } = config.settings()?;
    tracing::info!(
        root = %root.display(),
        extension = %load.extension,
        resources_prefix = ?load.resources_prefix,
        "opening asset store"
    );
    let fs = Arc::new(AssetFs::load(root, load)?);

    let mut out = tokio::io::stdout();
    match command {
        Command::Indexes { json } => commands::indexes(&fs, json, &mut out).await?,
        Command::Ls { path } => commands::ls(&fs.session(), &path, &mut out).await?,
        Command::Stat { path, json } => {
            commands::stat(&fs.session(), &path, json, &mut out).await?
        }
        Command::Cat { path, offset } => {
            commands::cat(&fs.session(), &path, offset, &mut out).await?
        }
        Command::Tree { path, depth } => {
            commands::tree(&fs.session(), &path, depth, &mut out).await?
        }
        Command::Shell => {
            let prompt = std::io::stdin().is_terminal();
            let input = BufReader::new(tokio::io::stdin());
            shell::run(fs.session(), input, &mut out, prompt).await?
        }
    }
    out.flush().await?;
    Ok(())
}
