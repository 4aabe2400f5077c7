//! Site build orchestration.
//!
//! Collects markdown sources, renders each page, and writes the output tree:
//! `<out>/<slug>/index.html` per page plus `sitemap.xml` when a site URL is
//! configured.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::SiteConfig;
use crate::document::{Page, Renderer};
use crate::error::SiteError;
use crate::frontmatter;
use crate::highlight::Highlighter;
use crate::html::escape_text;
use crate::sitemap;
use crate::transform::TransformPipeline;

/// A configured site, ready to build.
pub struct Site {
    config: SiteConfig,
    highlighter: Highlighter,
    transforms: TransformPipeline,
}

/// What a build produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Pages written
    pub pages: usize,
    /// Draft pages skipped
    pub drafts: usize,
    /// Whether a sitemap was written
    pub sitemap: bool,
}

impl Site {
    pub fn new(config: SiteConfig) -> Self {
        let highlighter = Highlighter::new(config.theme.as_deref());
        Self {
            config,
            highlighter,
            transforms: TransformPipeline::standard(),
        }
    }

    pub const fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Build the whole site into the output directory.
    pub fn build(&self) -> Result<BuildSummary, SiteError> {
        let _scope = crate::perf::scope("build.total");
        let content_dir = &self.config.content_dir;
        if !content_dir.is_dir() {
            return Err(SiteError::MissingContentDir(content_dir.clone()));
        }

        let sources = collect_sources(content_dir)?;
        let renderer = Renderer::new(&self.highlighter, &self.transforms);

        let mut pages = Vec::new();
        let mut drafts = 0;
        for source_path in &sources {
            let _scope = crate::perf::scope(format!("build.page.{}", source_path.display()));
            let source =
                fs::read_to_string(source_path).map_err(|source| SiteError::Read {
                    path: source_path.clone(),
                    source,
                })?;
            let (matter, body) = frontmatter::extract(source_path, &source)?;
            if matter.draft {
                debug!(path = %source_path.display(), "skipping draft");
                drafts += 1;
                continue;
            }

            let relative = source_path
                .strip_prefix(content_dir)
                .unwrap_or(source_path);
            let slug = slug_for(relative);
            let doc = renderer.render(body);
            let title = matter
                .title
                .clone()
                .or_else(|| doc.headings.first().map(|h| h.text.clone()))
                .unwrap_or_else(|| file_stem(relative));

            debug!(slug = %slug, title = %title, "rendered page");
            pages.push(Page {
                slug,
                matter,
                title,
                doc,
            });
        }

        for page in &pages {
            self.write_page(page)?;
        }

        let sitemap_written = match &self.config.site {
            Some(site_url) => {
                let xml = sitemap::render(site_url, &pages);
                write_file(&self.config.out_dir.join("sitemap.xml"), &xml)?;
                true
            }
            None => {
                warn!("no site URL configured, skipping sitemap");
                false
            }
        };

        let summary = BuildSummary {
            pages: pages.len(),
            drafts,
            sitemap: sitemap_written,
        };
        info!(
            pages = summary.pages,
            drafts = summary.drafts,
            out = %self.config.out_dir.display(),
            "build complete"
        );
        Ok(summary)
    }

    fn write_page(&self, page: &Page) -> Result<(), SiteError> {
        let mut path = self.config.out_dir.clone();
        if !page.slug.is_empty() {
            path.push(&page.slug);
        }
        path.push("index.html");
        write_file(&path, &page_shell(page))
    }
}

/// Wrap a rendered article in the minimal page shell.
fn page_shell(page: &Page) -> String {
    let mut html = String::from("<!doctype html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\" />\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\" />\n");
    html.push_str(&format!("<title>{}</title>\n", escape_text(&page.title)));
    if let Some(description) = &page.matter.description {
        html.push_str(&format!(
            "<meta name=\"description\" content=\"{}\" />\n",
            crate::html::escape_attr(description)
        ));
    }
    html.push_str("</head>\n<body>\n<main>\n<article>\n");
    html.push_str(&page.doc.to_html());
    html.push_str("\n</article>\n</main>\n</body>\n</html>\n");
    html
}

/// All markdown sources under `root`, sorted for deterministic output.
fn collect_sources(root: &Path) -> Result<Vec<PathBuf>, SiteError> {
    let mut sources = Vec::new();
    collect_sources_into(root, &mut sources)?;
    sources.sort();
    Ok(sources)
}

fn collect_sources_into(dir: &Path, sources: &mut Vec<PathBuf>) -> Result<(), SiteError> {
    let entries = fs::read_dir(dir).map_err(|source| SiteError::Read {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| SiteError::Read {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_sources_into(&path, sources)?;
        } else if crate::document::is_markdown_file(&path) {
            sources.push(path);
        }
    }
    Ok(())
}

/// Derive the output slug from a content-relative source path.
///
/// The extension is dropped and a trailing `index` collapses into its
/// parent, so `guide/index.md` and `guide.md` both land at `guide/`.
pub fn slug_for(relative: &Path) -> String {
    let mut parts: Vec<String> = relative
        .with_extension("")
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.last().is_some_and(|last| last == "index") {
        parts.pop();
    }
    parts.join("/")
}

fn file_stem(relative: &Path) -> String {
    relative
        .file_stem()
        .map_or_else(|| "untitled".to_string(), |s| s.to_string_lossy().into_owned())
}

fn write_file(path: &Path, content: &str) -> Result<(), SiteError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| SiteError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, content).map_err(|source| SiteError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_for_drops_extension() {
        assert_eq!(slug_for(Path::new("posts/hello.md")), "posts/hello");
    }

    #[test]
    fn test_slug_for_collapses_index() {
        assert_eq!(slug_for(Path::new("index.md")), "");
        assert_eq!(slug_for(Path::new("guide/index.md")), "guide");
    }

    #[test]
    fn test_missing_content_dir_is_an_error() {
        let config = crate::config::ConfigLayer {
            content_dir: Some(PathBuf::from("definitely/not/here")),
            ..Default::default()
        }
        .resolve();
        let err = Site::new(config).build().unwrap_err();
        assert!(matches!(err, SiteError::MissingContentDir(_)));
    }
}
