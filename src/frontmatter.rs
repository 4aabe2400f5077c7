//! YAML front matter extraction.
//!
//! A page may open with a `---` fenced YAML block:
//!
//! ```text
//! ---
//! title: Hello
//! draft: true
//! ---
//! # Body
//! ```
//!
//! A missing block is valid (all fields default); a present but malformed
//! block is a real error, unlike code-block annotations, because it silently
//! changes which pages get published.

use std::path::Path;

use serde::Deserialize;

use crate::error::SiteError;

/// Page metadata from the leading YAML block.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FrontMatter {
    /// Page title; falls back to the first heading or the file stem.
    pub title: Option<String>,
    pub description: Option<String>,
    /// Publication date, kept as the author wrote it.
    pub date: Option<String>,
    /// Draft pages are excluded from the build and the sitemap.
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Split a source file into its front matter block and markdown body.
///
/// Returns the raw YAML (without fences) and the body. Sources without a
/// leading fence, or with an unclosed one, are all body.
pub fn split(source: &str) -> (Option<&str>, &str) {
    let Some(rest) = source.strip_prefix("---").and_then(strip_newline) else {
        return (None, source);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return (Some(yaml), body);
        }
        offset += line.len();
    }
    (None, source)
}

fn strip_newline(s: &str) -> Option<&str> {
    s.strip_prefix("\r\n").or_else(|| s.strip_prefix('\n'))
}

/// Parse a source file into front matter and body.
pub fn extract<'a>(path: &Path, source: &'a str) -> Result<(FrontMatter, &'a str), SiteError> {
    let (yaml, body) = split(source);
    let Some(yaml) = yaml else {
        return Ok((FrontMatter::default(), body));
    };
    if yaml.trim().is_empty() {
        return Ok((FrontMatter::default(), body));
    }
    let matter = serde_yaml::from_str(yaml).map_err(|source| SiteError::FrontMatter {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((matter, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_parses_fields_and_body() {
        let source = "---\ntitle: Hello\ndate: 2026-01-03\ndraft: true\ntags: [a, b]\n---\n# Body\n";
        let (matter, body) = extract(Path::new("p.md"), source).unwrap();
        assert_eq!(matter.title.as_deref(), Some("Hello"));
        assert_eq!(matter.date.as_deref(), Some("2026-01-03"));
        assert!(matter.draft);
        assert_eq!(matter.tags, vec!["a", "b"]);
        assert_eq!(body, "# Body\n");
    }

    #[test]
    fn test_missing_front_matter_defaults() {
        let source = "# Just a heading\n";
        let (matter, body) = extract(Path::new("p.md"), source).unwrap();
        assert_eq!(matter, FrontMatter::default());
        assert_eq!(body, source);
    }

    #[test]
    fn test_unclosed_fence_is_all_body() {
        let source = "---\ntitle: Oops\n# Body\n";
        let (yaml, body) = split(source);
        assert_eq!(yaml, None);
        assert_eq!(body, source);
    }

    #[test]
    fn test_crlf_fences() {
        let source = "---\r\ntitle: Win\r\n---\r\nbody\r\n";
        let (matter, body) = extract(Path::new("p.md"), source).unwrap();
        assert_eq!(matter.title.as_deref(), Some("Win"));
        assert_eq!(body, "body\r\n");
    }

    #[test]
    fn test_malformed_yaml_is_an_error() {
        let source = "---\ntitle: [unclosed\n---\nbody\n";
        let err = extract(Path::new("bad.md"), source).unwrap_err();
        assert!(matches!(err, SiteError::FrontMatter { .. }));
    }

    #[test]
    fn test_thematic_break_later_in_body_is_not_a_fence() {
        let source = "intro\n\n---\n\nmore\n";
        let (yaml, body) = split(source);
        assert_eq!(yaml, None);
        assert_eq!(body, source);
    }
}
