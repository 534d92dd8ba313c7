mod build;
mod config;
mod render;
mod search;
mod show;
mod touch;

use anyhow::Result;
use clap::{Parser, Subcommand};
use loadout::catalog::{FsSource, HttpSource, IndexSource};
use loadout::services::ConfigService;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "loadout")]
#[command(about = "Build and browse the content indexes of a static game-guide site", long_about = None)]
pub struct Cli {
    /// Enable verbose output (info logs)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project root holding loadout.toml and the content directory
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Regenerates every index when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Regenerate collection indexes from content files
    Build(build::BuildArgs),

    /// Stamp updatedAt on modified content files
    Touch(touch::TouchArgs),

    /// Filter and page through a collection index
    Search(search::SearchArgs),

    /// Show the full record of one entry
    Show(show::ShowArgs),

    /// Write HTML card fragments for every collection
    Render(render::RenderArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}

/// Execute the CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let root = cli.root;
    match cli.command {
        None => build::execute(build::BuildArgs::default(), &root).await,
        Some(Commands::Build(args)) => build::execute(args, &root).await,
        Some(Commands::Touch(args)) => touch::execute(args, &root).await,
        Some(Commands::Search(args)) => search::execute(args, &root).await,
        Some(Commands::Show(args)) => show::execute(args, &root).await,
        Some(Commands::Render(args)) => render::execute(args, &root).await,
        Some(Commands::Config(args)) => config::execute(args, &root).await,
    }
}

/// Index source for catalog commands: HTTP when a base URL is given on the
/// command line or in config, the local content directory otherwise
pub fn open_source(root: &Path, base_url: Option<&str>) -> Result<Box<dyn IndexSource>> {
    let config_service = ConfigService::new(root);
    let config = config_service.load()?;

    let base_url = base_url
        .map(str::to_string)
        .or(config.client.base_url)
        .filter(|url| !url.trim().is_empty());

    Ok(match base_url {
        Some(url) => {
            tracing::info!(base_url = %url, "Reading indexes over HTTP");
            Box::new(HttpSource::new(&url))
        },
        None => Box::new(FsSource::new(config_service.resolve_content_root()?)),
    })
}
