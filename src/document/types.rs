//! Core page and document types.

use crate::frontmatter::FrontMatter;
use crate::html::Node;

/// A heading found while rendering, for anchors and tables of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingRef {
    /// Heading level (1-6)
    pub level: u8,
    /// Plain text content
    pub text: String,
    /// Anchor id, unique within the document
    pub id: String,
}

/// The rendered body of one markdown source.
#[derive(Debug, Clone, Default)]
pub struct RenderedDocument {
    /// Article content as sibling block nodes
    pub nodes: Vec<Node>,
    /// Headings in document order
    pub headings: Vec<HeadingRef>,
}

impl RenderedDocument {
    /// Serialize the article content to an HTML fragment.
    pub fn to_html(&self) -> String {
        crate::html::serialize_all(&self.nodes)
    }
}

/// A fully rendered page, ready to be written to the output directory.
#[derive(Debug, Clone)]
pub struct Page {
    /// Output path segment, derived from the content-relative source path
    pub slug: String,
    /// Front matter as authored
    pub matter: FrontMatter,
    /// Resolved title: front matter, else first heading, else file stem
    pub title: String,
    /// Rendered body
    pub doc: RenderedDocument,
}

impl Page {
    /// The site-relative URL path for this page.
    pub fn url_path(&self) -> String {
        if self.slug.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", self.slug)
        }
    }
}
