//! Markdown rendering with comrak.
//!
//! Walks the comrak AST and emits the HTML node tree directly, so fenced
//! code blocks can be routed through the highlight and transformer pipeline
//! instead of comrak's own formatter.

use std::collections::HashMap;

use comrak::nodes::{AstNode, ListType, NodeValue, TableAlignment};
use comrak::{Arena, Options, parse_document};

use crate::highlight::Highlighter;
use crate::html::{Element, Node};
use crate::transform::{BlockContext, TransformPipeline};

use super::types::{HeadingRef, RenderedDocument};

/// Renders markdown bodies against a shared highlighter and transformer set.
pub struct Renderer<'a> {
    highlighter: &'a Highlighter,
    transforms: &'a TransformPipeline,
}

impl<'a> Renderer<'a> {
    pub const fn new(highlighter: &'a Highlighter, transforms: &'a TransformPipeline) -> Self {
        Self {
            highlighter,
            transforms,
        }
    }

    /// Render a markdown body (front matter already removed).
    pub fn render(&self, source: &str) -> RenderedDocument {
        let arena = Arena::new();
        let options = create_options();
        let root = parse_document(&arena, source, &options);

        let mut doc = RenderedDocument::default();
        let mut slugs = Slugger::default();
        let mut nodes = Vec::new();
        for child in root.children() {
            self.render_block(child, &mut nodes, &mut doc.headings, &mut slugs);
        }
        doc.nodes = nodes;
        doc
    }

    fn render_block<'n>(
        &self,
        node: &'n AstNode<'n>,
        out: &mut Vec<Node>,
        headings: &mut Vec<HeadingRef>,
        slugs: &mut Slugger,
    ) {
        match &node.data.borrow().value {
            NodeValue::Heading(heading) => {
                let text = extract_text(node);
                let id = slugs.slug(&text);
                headings.push(HeadingRef {
                    level: heading.level,
                    text,
                    id: id.clone(),
                });

                let mut el = Element::new(format!("h{}", heading.level)).with_attr("id", id);
                el.children = self.render_inline_children(node);
                out.push(el.into());
            }

            NodeValue::Paragraph => {
                let mut el = Element::new("p");
                el.children = self.render_inline_children(node);
                out.push(el.into());
            }

            NodeValue::CodeBlock(code_block) => {
                let info = code_block.info.trim();
                let language = info.split_whitespace().next().filter(|s| !s.is_empty());
                let annotation = language
                    .map_or("", |lang| info[lang.len()..].trim_start())
                    .to_string();
                out.push(self.render_code_block(language, &annotation, &code_block.literal));
            }

            NodeValue::BlockQuote => {
                let mut el = Element::new("blockquote");
                let mut children = Vec::new();
                for child in node.children() {
                    self.render_block(child, &mut children, headings, slugs);
                }
                el.children = children;
                out.push(el.into());
            }

            NodeValue::List(list) => {
                let mut el = match list.list_type {
                    ListType::Bullet => Element::new("ul"),
                    ListType::Ordered => {
                        let mut ol = Element::new("ol");
                        if list.start != 1 {
                            ol.set_attr("start", list.start.to_string());
                        }
                        ol
                    }
                };
                let mut children = Vec::new();
                for child in node.children() {
                    self.render_block(child, &mut children, headings, slugs);
                }
                el.children = children;
                out.push(el.into());
            }

            NodeValue::Item(_) => {
                let mut el = Element::new("li");
                let mut children = Vec::new();
                for child in node.children() {
                    self.render_block(child, &mut children, headings, slugs);
                }
                // A single-paragraph item renders tight, without the <p>.
                if children.len() == 1 {
                    if let [Node::Element(p)] = children.as_slice() {
                        if p.tag == "p" {
                            el.children = p.children.clone();
                            out.push(el.into());
                            return;
                        }
                    }
                }
                el.children = children;
                out.push(el.into());
            }

            NodeValue::TaskItem(symbol) => {
                let mut el = Element::new("li").with_attr("class", "task-list-item");
                let mut checkbox = Element::new("input")
                    .with_attr("type", "checkbox")
                    .with_attr("disabled", "");
                if symbol.is_some() {
                    checkbox.set_attr("checked", "");
                }
                el.children.push(checkbox.into());
                el.children.push(Node::text(" "));
                for child in node.children() {
                    match &child.data.borrow().value {
                        NodeValue::Paragraph => {
                            el.children.extend(self.render_inline_children(child));
                        }
                        _ => self.render_block(child, &mut el.children, headings, slugs),
                    }
                }
                out.push(el.into());
            }

            NodeValue::Table(_) => {
                out.push(self.render_table(node));
            }

            NodeValue::ThematicBreak => {
                out.push(Element::new("hr").into());
            }

            NodeValue::FootnoteDefinition(def) => {
                let mut el = Element::new("div")
                    .with_attr("class", "footnote")
                    .with_attr("id", format!("fn-{}", def.name));
                let mut children = Vec::new();
                for child in node.children() {
                    self.render_block(child, &mut children, headings, slugs);
                }
                el.children = children;
                out.push(el.into());
            }

            NodeValue::HtmlBlock(html) => {
                out.push(Node::raw(html.literal.clone()));
            }

            _ => {
                for child in node.children() {
                    self.render_block(child, out, headings, slugs);
                }
            }
        }
    }

    /// Render one fenced code block through the transformer pipeline.
    pub fn render_code_block(
        &self,
        language: Option<&str>,
        annotation: &str,
        literal: &str,
    ) -> Node {
        if language == Some("csv") {
            if let Some(table) = csv_table(literal) {
                return table;
            }
            tracing::debug!("malformed csv block, rendering as code");
        }

        let mut ctx = BlockContext::new(language, annotation);
        self.transforms.preprocess(&mut ctx, literal);

        let mut code_el = self.highlighter.highlight(language, literal);
        self.transforms.apply(&ctx, &mut code_el);

        let mut pre = Element::new("pre").with_attr("class", "highlight");
        if let Some(lang) = language {
            pre.set_attr("data-language", lang);
        }
        pre.children.push(code_el.into());
        pre.into()
    }

    fn render_table<'n>(&self, node: &'n AstNode<'n>) -> Node {
        let alignments = match &node.data.borrow().value {
            NodeValue::Table(table) => table.alignments.clone(),
            _ => Vec::new(),
        };

        let mut thead = Element::new("thead");
        let mut tbody = Element::new("tbody");
        for row_node in node.children() {
            let is_header = match &row_node.data.borrow().value {
                NodeValue::TableRow(is_header) => *is_header,
                _ => continue,
            };
            let mut row = Element::new("tr");
            for (column, cell_node) in row_node.children().enumerate() {
                if !matches!(cell_node.data.borrow().value, NodeValue::TableCell) {
                    continue;
                }
                let mut cell = Element::new(if is_header { "th" } else { "td" });
                if let Some(style) = alignments.get(column).and_then(alignment_style) {
                    cell.set_attr("style", style);
                }
                cell.children = self.render_inline_children(cell_node);
                row.children.push(cell.into());
            }
            if is_header {
                thead.children.push(row.into());
            } else {
                tbody.children.push(row.into());
            }
        }

        let mut table = Element::new("table");
        if !thead.children.is_empty() {
            table.children.push(thead.into());
        }
        if !tbody.children.is_empty() {
            table.children.push(tbody.into());
        }
        table.into()
    }

    fn render_inline_children<'n>(&self, node: &'n AstNode<'n>) -> Vec<Node> {
        let mut out = Vec::new();
        for child in node.children() {
            self.render_inline(child, &mut out);
        }
        out
    }

    fn render_inline<'n>(&self, node: &'n AstNode<'n>, out: &mut Vec<Node>) {
        match &node.data.borrow().value {
            NodeValue::Text(text) => out.push(Node::text(text.clone())),

            NodeValue::Code(code) => {
                out.push(Element::new("code").with_text(code.literal.clone()).into());
            }

            NodeValue::Emph => out.push(self.inline_wrapper("em", node)),
            NodeValue::Strong => out.push(self.inline_wrapper("strong", node)),
            NodeValue::Strikethrough => out.push(self.inline_wrapper("del", node)),
            NodeValue::Superscript => out.push(self.inline_wrapper("sup", node)),
            NodeValue::Subscript => out.push(self.inline_wrapper("sub", node)),

            NodeValue::Link(link) => {
                let mut el = Element::new("a").with_attr("href", link.url.clone());
                if !link.title.is_empty() {
                    el.set_attr("title", link.title.clone());
                }
                el.children = self.render_inline_children(node);
                out.push(el.into());
            }

            NodeValue::Image(image) => {
                let mut el = Element::new("img")
                    .with_attr("src", image.url.clone())
                    .with_attr("alt", extract_text(node));
                if !image.title.is_empty() {
                    el.set_attr("title", image.title.clone());
                }
                out.push(el.into());
            }

            NodeValue::FootnoteReference(reference) => {
                out.push(
                    Element::new("sup")
                        .with_attr("class", "footnote-ref")
                        .with_child(
                            Element::new("a")
                                .with_attr("href", format!("#fn-{}", reference.name))
                                .with_text(format!("[{}]", reference.name)),
                        )
                        .into(),
                );
            }

            NodeValue::ShortCode(shortcode) => out.push(Node::text(shortcode.emoji.clone())),

            NodeValue::SoftBreak => out.push(Node::text("\n")),
            NodeValue::LineBreak => out.push(Element::new("br").into()),

            NodeValue::HtmlInline(html) => out.push(Node::raw(html.clone())),

            _ => {
                for child in node.children() {
                    self.render_inline(child, out);
                }
            }
        }
    }

    fn inline_wrapper<'n>(&self, tag: &str, node: &'n AstNode<'n>) -> Node {
        let mut el = Element::new(tag);
        el.children = self.render_inline_children(node);
        el.into()
    }
}

fn create_options() -> Options {
    let mut options = Options::default();

    // Enable GFM extensions
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;
    options.extension.superscript = true;
    options.extension.subscript = true;

    // Emoji shortcodes like :crab:
    options.extension.shortcodes = true;

    options
}

/// Plain text of a node's inline subtree, for heading anchors and alt text.
fn extract_text<'n>(node: &'n AstNode<'n>) -> String {
    let mut text = String::new();
    extract_text_recursive(node, &mut text);
    text
}

fn extract_text_recursive<'n>(node: &'n AstNode<'n>, text: &mut String) {
    match &node.data.borrow().value {
        NodeValue::Text(t) => text.push_str(t),
        NodeValue::Code(code) => text.push_str(&code.literal),
        NodeValue::ShortCode(shortcode) => text.push_str(&shortcode.emoji),
        NodeValue::SoftBreak | NodeValue::LineBreak => text.push(' '),
        _ => {
            for child in node.children() {
                extract_text_recursive(child, text);
            }
        }
    }
}

const fn alignment_style(alignment: &TableAlignment) -> Option<&'static str> {
    match alignment {
        TableAlignment::None => None,
        TableAlignment::Left => Some("text-align: left"),
        TableAlignment::Center => Some("text-align: center"),
        TableAlignment::Right => Some("text-align: right"),
    }
}

/// Render a `csv` code block as a table, header row first.
///
/// Returns `None` when the block is not well-formed CSV so the caller can
/// fall back to a plain code block.
fn csv_table(literal: &str) -> Option<Node> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(false)
        .from_reader(literal.as_bytes());

    let mut records = Vec::new();
    for record in reader.records() {
        records.push(record.ok()?);
    }
    let (header, rows) = records.split_first()?;

    let mut thead = Element::new("thead");
    let mut header_row = Element::new("tr");
    for field in header {
        header_row
            .children
            .push(Element::new("th").with_text(field).into());
    }
    thead.children.push(header_row.into());

    let mut tbody = Element::new("tbody");
    for record in rows {
        let mut row = Element::new("tr");
        for field in record {
            row.children.push(Element::new("td").with_text(field).into());
        }
        tbody.children.push(row.into());
    }

    Some(
        Element::new("table")
            .with_attr("class", "csv")
            .with_child(thead)
            .with_child(tbody)
            .into(),
    )
}

/// Generates document-unique anchor ids from heading text.
#[derive(Debug, Default)]
struct Slugger {
    seen: HashMap<String, usize>,
}

impl Slugger {
    fn slug(&mut self, text: &str) -> String {
        let base = slugify(text);
        let count = self.seen.entry(base.clone()).or_insert(0);
        let slug = if *count == 0 {
            base.clone()
        } else {
            format!("{base}-{count}")
        };
        *count += 1;
        slug
    }
}

/// Lowercase, alphanumerics kept, runs of anything else become one dash.
fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            for lower in ch.to_lowercase() {
                slug.push(lower);
            }
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::serialize_all;

    fn render(source: &str) -> RenderedDocument {
        let highlighter = Highlighter::new(None);
        let transforms = TransformPipeline::standard();
        Renderer::new(&highlighter, &transforms).render(source)
    }

    fn render_html(source: &str) -> String {
        serialize_all(&render(source).nodes)
    }

    #[test]
    fn test_heading_gets_anchor_id() {
        let html = render_html("## Getting Started\n");
        assert_eq!(html, "<h2 id=\"getting-started\">Getting Started</h2>");
    }

    #[test]
    fn test_duplicate_headings_get_unique_ids() {
        let doc = render("# Setup\n\n# Setup\n");
        let ids: Vec<&str> = doc.headings.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["setup", "setup-1"]);
    }

    #[test]
    fn test_paragraph_with_inline_styles() {
        let html = render_html("some *em* and **strong** and `code`\n");
        assert_eq!(
            html,
            "<p>some <em>em</em> and <strong>strong</strong> and <code>code</code></p>"
        );
    }

    #[test]
    fn test_link_and_image() {
        let html = render_html("[here](/a \"Title\") ![alt text](/img.png)\n");
        assert!(html.contains("<a href=\"/a\" title=\"Title\">here</a>"));
        assert!(html.contains("<img src=\"/img.png\" alt=\"alt text\" />"));
    }

    #[test]
    fn test_code_block_is_highlighted_line_tree() {
        let html = render_html("```rust\nfn main() {}\n```\n");
        assert!(html.starts_with("<pre class=\"highlight\" data-language=\"rust\">"));
        assert!(html.contains("<code><span class=\"line\">"));
    }

    #[test]
    fn test_code_block_annotation_reaches_transformers() {
        let html = render_html("```rust skip{2}\nline one\nline two\nline three\n```\n");
        assert!(html.contains("class=\"line hidden\""));
        assert!(html.contains("<span class=\"skip\" style=\"counter-set: line 2\">2-2</span>"));
    }

    #[test]
    fn test_csv_block_renders_as_table() {
        let html = render_html("```csv\nname,qty\nbolt,4\nnut,9\n```\n");
        assert!(html.contains("<table class=\"csv\">"));
        assert!(html.contains("<th>name</th><th>qty</th>"));
        assert!(html.contains("<td>nut</td><td>9</td>"));
    }

    #[test]
    fn test_malformed_csv_falls_back_to_code_block() {
        let html = render_html("```csv\na,b\n\"unclosed\n```\n");
        assert!(html.contains("<pre class=\"highlight\""));
    }

    #[test]
    fn test_lists_and_task_items() {
        let html = render_html("- plain\n- [x] done\n- [ ] todo\n");
        assert!(html.contains("<li>plain</li>"));
        assert!(html.contains("<input type=\"checkbox\" disabled=\"\" checked=\"\" />"));
        assert!(html.contains("<input type=\"checkbox\" disabled=\"\" />"));
    }

    #[test]
    fn test_ordered_list_start_offset() {
        let html = render_html("3. three\n4. four\n");
        assert!(html.starts_with("<ol start=\"3\">"));
    }

    #[test]
    fn test_table_with_alignments() {
        let html = render_html("| a | b |\n|:--|--:|\n| 1 | 2 |\n");
        assert!(html.contains("<th style=\"text-align: left\">a</th>"));
        assert!(html.contains("<td style=\"text-align: right\">2</td>"));
    }

    #[test]
    fn test_html_block_passes_through_unescaped() {
        let html = render_html("<div class=\"note\">hi</div>\n");
        assert!(html.contains("<div class=\"note\">hi</div>"));
    }

    #[test]
    fn test_text_is_escaped() {
        let html = render_html("1 < 2 & 3\n");
        assert_eq!(html, "<p>1 &lt; 2 &amp; 3</p>");
    }

    #[test]
    fn test_slugify_collapses_punctuation() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  spaced   out  "), "spaced-out");
        assert_eq!(slugify("???"), "section");
    }

    #[test]
    fn test_footnotes_link_to_definitions() {
        let html = render_html("a claim[^1]\n\n[^1]: the source\n");
        assert!(html.contains("<a href=\"#fn-1\">[1]</a>"));
        assert!(html.contains("<div class=\"footnote\" id=\"fn-1\">"));
    }
}
