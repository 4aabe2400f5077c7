//! Error types for the build pipeline.

use std::path::PathBuf;

/// Errors surfaced while building a site.
///
/// Annotation directives are deliberately absent here: a malformed or missing
/// code-block directive degrades to "no transform applied" and can never fail
/// a build.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: json5::Error,
    },

    #[error("invalid front matter in {}", path.display())]
    FrontMatter {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("content directory {} does not exist", .0.display())]
    MissingContentDir(PathBuf),
}
