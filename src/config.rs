//! Site configuration.
//!
//! Settings come from an optional `inkpress.json5` file merged under CLI
//! flags (CLI wins field by field). JSON5 keeps the file comment-friendly:
//!
//! ```json5
//! {
//!   // Absolute URL, required for sitemap generation
//!   site: "https://example.dev",
//!   theme: "InspiredGitHub",
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::SiteError;

/// Raw configuration layer: every field optional so layers can merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConfigLayer {
    /// Absolute site URL (`https://example.dev`)
    pub site: Option<String>,
    /// Directory of markdown sources
    pub content_dir: Option<PathBuf>,
    /// Output directory
    pub out_dir: Option<PathBuf>,
    /// Syntect theme name for code blocks
    pub theme: Option<String>,
    /// Debounce for watch-mode rebuilds, in milliseconds
    pub watch_debounce_ms: Option<u64>,
}

impl ConfigLayer {
    /// Merge two layers; fields set in `other` win.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            site: other.site.clone().or_else(|| self.site.clone()),
            content_dir: other
                .content_dir
                .clone()
                .or_else(|| self.content_dir.clone()),
            out_dir: other.out_dir.clone().or_else(|| self.out_dir.clone()),
            theme: other.theme.clone().or_else(|| self.theme.clone()),
            watch_debounce_ms: other.watch_debounce_ms.or(self.watch_debounce_ms),
        }
    }

    /// Apply defaults, producing the effective configuration.
    pub fn resolve(&self) -> SiteConfig {
        SiteConfig {
            site: self
                .site
                .as_ref()
                .map(|url| url.trim_end_matches('/').to_string()),
            content_dir: self
                .content_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from("content")),
            out_dir: self.out_dir.clone().unwrap_or_else(|| PathBuf::from("dist")),
            theme: self.theme.clone(),
            watch_debounce: Duration::from_millis(self.watch_debounce_ms.unwrap_or(200)),
        }
    }
}

/// Effective configuration after merging and defaulting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    pub site: Option<String>,
    pub content_dir: PathBuf,
    pub out_dir: PathBuf,
    pub theme: Option<String>,
    pub watch_debounce: Duration,
}

impl Default for SiteConfig {
    fn default() -> Self {
        ConfigLayer::default().resolve()
    }
}

/// The config file looked for when `--config` is not given.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("inkpress.json5")
}

/// Load a config layer from a JSON5 file.
///
/// A missing file is an empty layer; a present but invalid file is an error.
pub fn load_config(path: &Path) -> Result<ConfigLayer, SiteError> {
    if !path.exists() {
        return Ok(ConfigLayer::default());
    }
    let content = fs::read_to_string(path).map_err(|source| SiteError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    json5::from_str(&content).map_err(|source| SiteError::Config {
        path: path.to_path_buf(),
        source,
    })
}
