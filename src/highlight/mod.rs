//! Syntax highlighting for code blocks.
//!
//! Uses syntect for highlighting with Sublime Text syntax definitions. The
//! output is a `<code>` element whose children alternate one
//! `<span class="line">` per source line with a `"\n"` text separator, which
//! is the sequence shape the code-block transformers rely on.

use std::sync::OnceLock;

use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxSet;

use crate::html::{Element, Node};

/// Theme names tried in order when the configured theme is unknown.
const FALLBACK_THEMES: &[&str] = &["InspiredGitHub", "base16-ocean.dark", "Solarized (light)"];

/// A theme-bound highlighter, built once per build and reused for every
/// code block.
pub struct Highlighter {
    theme: Theme,
}

impl Highlighter {
    /// Resolve `theme_name` against the bundled theme set.
    ///
    /// Unknown names fall back to the first available default; `None` goes
    /// straight to the fallback list.
    pub fn new(theme_name: Option<&str>) -> Self {
        let theme_set = ThemeSet::load_defaults();

        if let Some(name) = theme_name {
            if let Some(theme) = theme_set.themes.get(name) {
                return Self {
                    theme: theme.clone(),
                };
            }
            tracing::warn!(theme = name, "unknown highlight theme, using default");
        }

        for name in FALLBACK_THEMES {
            if let Some(theme) = theme_set.themes.get(*name) {
                return Self {
                    theme: theme.clone(),
                };
            }
        }

        Self {
            theme: theme_set.themes.values().next().cloned().unwrap_or_default(),
        }
    }

    /// Highlight a block of code into the line-node sequence.
    pub fn highlight(&self, language: Option<&str>, code: &str) -> Element {
        let mut code_el = Element::new("code");
        let syntax_set = syntax_set();
        let syntax = language
            .and_then(|lang| syntax_set.find_syntax_by_token(lang))
            .or_else(|| language.and_then(|lang| syntax_set.find_syntax_by_name(lang)));

        let Some(syntax) = syntax else {
            for line in code.lines() {
                code_el.children.push(plain_line(line));
                code_el.children.push(Node::text("\n"));
            }
            return code_el;
        };

        let mut highlighter = HighlightLines::new(syntax, &self.theme);
        for line in code.lines() {
            let ranges = highlighter
                .highlight_line(line, syntax_set)
                .unwrap_or_default();
            let mut line_el = Element::new("span").with_attr("class", "line");
            for (style, text) in ranges {
                let fg = style.foreground;
                line_el.children.push(
                    Element::new("span")
                        .with_attr("style", format!("color:#{:02x}{:02x}{:02x}", fg.r, fg.g, fg.b))
                        .with_text(text)
                        .into(),
                );
            }
            code_el.children.push(line_el.into());
            code_el.children.push(Node::text("\n"));
        }

        code_el
    }
}

fn plain_line(line: &str) -> Node {
    Element::new("span")
        .with_attr("class", "line")
        .with_text(line)
        .into()
}

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(|| {
        let _scope = crate::perf::scope("highlight.syntax_set.load_defaults");
        SyntaxSet::load_defaults_newlines()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_count(code_el: &Element) -> usize {
        code_el
            .children
            .iter()
            .filter_map(Node::as_element)
            .filter(|el| el.has_class("line"))
            .count()
    }

    #[test]
    fn test_highlight_rust_produces_colored_spans() {
        let hl = Highlighter::new(None);
        let code_el = hl.highlight(Some("rust"), "fn main() {\n    let x = 1;\n}\n");

        assert_eq!(line_count(&code_el), 3);
        let html = crate::html::serialize(&code_el.into());
        assert!(html.contains("color:#"), "expected colored token spans");
    }

    #[test]
    fn test_highlight_unknown_language_falls_back_to_plain() {
        let hl = Highlighter::new(None);
        let code_el = hl.highlight(Some("nope"), "just text");

        assert_eq!(line_count(&code_el), 1);
        let html = crate::html::serialize(&code_el.into());
        assert!(!html.contains("color:#"), "unknown language should not colorize");
    }

    #[test]
    fn test_lines_alternate_with_newline_separators() {
        let hl = Highlighter::new(None);
        let code_el = hl.highlight(None, "a\nb\nc");

        assert_eq!(code_el.children.len(), 6);
        for (index, node) in code_el.children.iter().enumerate() {
            if index % 2 == 0 {
                assert!(node.as_element().is_some_and(|el| el.has_class("line")));
            } else {
                assert_eq!(node, &Node::text("\n"));
            }
        }
    }

    #[test]
    fn test_unknown_theme_name_still_highlights() {
        let hl = Highlighter::new(Some("no-such-theme"));
        let code_el = hl.highlight(Some("rust"), "fn main() {}");
        assert_eq!(line_count(&code_el), 1);
    }

    #[test]
    fn test_empty_code_has_no_lines() {
        let hl = Highlighter::new(None);
        let code_el = hl.highlight(Some("rust"), "");
        assert!(code_el.children.is_empty());
    }
}
