//! Inkpress - a static site generator for markdown content.
//!
//! # Usage
//!
//! ```bash
//! inkpress content
//! inkpress content -o dist --site https://example.dev
//! inkpress --watch
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use inkpress::build::Site;
use inkpress::config::{ConfigLayer, default_config_path, load_config};
use inkpress::perf;
use inkpress::watcher::ContentWatcher;

/// How often watch mode polls for debounced changes.
const WATCH_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A static site generator for markdown content
#[derive(Parser, Debug)]
#[command(name = "inkpress", version, about, long_about = None)]
struct Cli {
    /// Directory of markdown sources
    #[arg(value_name = "CONTENT_DIR")]
    content: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Config file (defaults to inkpress.json5)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Absolute site URL, used for sitemap generation
    #[arg(long, value_name = "URL")]
    site: Option<String>,

    /// Syntax highlight theme name
    #[arg(long, value_name = "NAME")]
    theme: Option<String>,

    /// Watch the content directory and rebuild on changes
    #[arg(short, long)]
    watch: bool,

    /// Enable build performance logging
    #[arg(long)]
    perf: bool,
}

impl Cli {
    /// The CLI flags as a config layer, merged over the file config.
    fn as_layer(&self) -> ConfigLayer {
        ConfigLayer {
            site: self.site.clone(),
            content_dir: self.content.clone(),
            out_dir: self.out.clone(),
            theme: self.theme.clone(),
            watch_debounce_ms: None,
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    perf::set_enabled(cli.perf);

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let file_layer = load_config(&config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;
    let config = file_layer.union(&cli.as_layer()).resolve();

    let site = Site::new(config);
    site.build().context("build failed")?;

    if cli.watch {
        watch_loop(&site)?;
    }
    Ok(())
}

/// Rebuild whenever the content tree changes, until interrupted.
fn watch_loop(site: &Site) -> Result<()> {
    let config = site.config();
    let mut watcher = ContentWatcher::new(&config.content_dir, config.watch_debounce)
        .with_context(|| format!("watching {}", config.content_dir.display()))?;
    info!(root = %watcher.watch_root().display(), "watching for changes");

    loop {
        std::thread::sleep(WATCH_POLL_INTERVAL);
        if watcher.take_change_ready() {
            info!("content changed, rebuilding");
            // Keep watching after a failed rebuild.
            if let Err(err) = site.build() {
                error!(%err, "rebuild failed");
            }
        }
    }
}
