mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use dav_access_core::{InsertMode, ScopeTree};
use tracing::debug;

#[derive(Parser)]
#[command(name = "dav-access")]
#[command(about = "Inspect the RFC3744 access-control properties a configuration produces")]
#[command(version)]
pub struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "dav-access.toml")]
    pub config: PathBuf,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render live properties the way a PROPFIND response would
    Propfind {
        /// Request path
        #[arg(short, long)]
        path: String,

        /// Authenticated user (anonymous when omitted)
        #[arg(short, long)]
        user: Option<String>,

        /// Property to render, as `name` (DAV: namespace) or `{namespace}name`;
        /// every catalogued property when omitted
        #[arg(long = "prop")]
        props: Vec<String>,

        /// Insertion mode
        #[arg(short, long, value_enum, default_value_t = Mode::Value)]
        mode: Mode,
    },
    /// Show the DAV header and Allow tokens contributed for a path
    Options {
        /// Request path
        #[arg(short, long)]
        path: String,
    },
    /// Show the resource type declared for a path
    Resourcetype {
        /// Request path
        #[arg(short, long)]
        path: String,
    },
    /// Validate the configuration and list its locations
    Check,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Mode {
    Value,
    Name,
    Supported,
}

impl From<Mode> for InsertMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Value => InsertMode::Value,
            Mode::Name => InsertMode::Name,
            Mode::Supported => InsertMode::Supported,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let tree = ScopeTree::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    debug!(config = %cli.config.display(), "configuration loaded");

    match cli.command {
        Commands::Propfind {
            path,
            user,
            props,
            mode,
        } => commands::execute_propfind(&tree, &path, user, &props, mode.into(), cli.json),
        Commands::Options { path } => commands::execute_options(&tree, &path, cli.json),
        Commands::Resourcetype { path } => commands::execute_resourcetype(&tree, &path, cli.json),
        Commands::Check => commands::execute_check(&tree, cli.json),
    }
}

/// Log to stderr so stdout stays clean for rendered output
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(format!(
                    "dav_access={},dav_access_core={}",
                    level, level
                ))
            }),
        )
        .init();
}
