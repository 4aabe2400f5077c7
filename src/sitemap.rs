//! Sitemap generation.
//!
//! Emits `sitemap.xml` in the urlset schema, one `<url>` entry per rendered
//! page, joined from the configured site URL and each page's slug.

use std::fmt::Write as _;

use crate::document::Page;
use crate::html::escape_text;

/// Render the sitemap XML for a set of pages.
///
/// `site_url` must be absolute without a trailing slash; draft pages are
/// already filtered out by the build.
pub fn render(site_url: &str, pages: &[Page]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");
    for page in pages {
        let _ = writeln!(
            xml,
            "  <url><loc>{}{}</loc></url>",
            escape_text(site_url),
            escape_text(&page.url_path())
        );
    }
    xml.push_str("</urlset>\n");
    xml
}
