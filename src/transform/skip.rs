//! Line-range skipping for code blocks.
//!
//! A `skip{2,4-6}` annotation hides the named lines and collapses each
//! contiguous hidden run into a single marker line reading `"4-6"`. The
//! marker carries a `counter-set` style so CSS line numbering resumes at the
//! right value on the next visible line. Line numbers in the directive are
//! absolute display numbers: with `showLineNumbers{10}`, `skip{12-13}` hides
//! the third and fourth source lines.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::html::{Element, Node};

use super::{BlockContext, CodeTransformer, expand_ranges};

static SKIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"skip\{([\d,-]+)\}").expect("skip pattern"));
static START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"showLineNumbers\{(\d+)\}").expect("showLineNumbers pattern"));

/// Extract the set of lines a `skip{..}` directive hides.
///
/// Returns `None` when the annotation is empty or carries no directive.
/// Malformed range entries are dropped rather than reported; absence of a
/// usable directive is a valid outcome, not an error.
pub fn skipped_lines(annotation: &str) -> Option<BTreeSet<usize>> {
    if annotation.is_empty() {
        return None;
    }
    let captures = SKIP_RE.captures(annotation)?;
    Some(expand_ranges(&captures[1]))
}

/// Extract the starting display line number from `showLineNumbers{n}`.
///
/// Returns `None` when absent; callers default to 1.
pub fn starting_line(annotation: &str) -> Option<usize> {
    if annotation.is_empty() {
        return None;
    }
    START_RE
        .captures(annotation)?
        .get(1)
        .and_then(|m| m.as_str().parse().ok())
}

/// Hides `skip{..}` lines and collapses each hidden run into a marker.
pub struct SkipLines;

impl CodeTransformer for SkipLines {
    fn name(&self) -> &'static str {
        "skip-lines"
    }

    fn preprocess(&self, ctx: &mut BlockContext, _code: &str) {
        if ctx.annotation.is_empty() {
            return;
        }
        if ctx.start_line.is_none() {
            ctx.start_line = starting_line(&ctx.annotation);
        }
        ctx.skipped_lines = skipped_lines(&ctx.annotation);
    }

    fn code(&self, ctx: &BlockContext, code_el: &mut Element) {
        let Some(skipped) = &ctx.skipped_lines else {
            return;
        };
        if skipped.is_empty() {
            return;
        }
        let start_line = ctx.start_line();

        // The children alternate line elements and "\n" separators, so the
        // logical source line of a node is its position divided by two.
        let nodes = std::mem::take(&mut code_el.children);
        let mut result = Vec::with_capacity(nodes.len());
        let mut is_skipping = false;
        let mut skip_range_start = 0;

        for (index, mut node) in nodes.into_iter().enumerate() {
            let line_number = index / 2;

            if skipped.contains(&(line_number + start_line)) {
                if !is_skipping {
                    skip_range_start = line_number;
                    is_skipping = true;
                }
                if let Some(el) = node.as_element_mut() {
                    el.add_class("hidden");
                }
                result.push(node);
            } else {
                if is_skipping {
                    let skip_range_end = line_number + start_line - 1;
                    result.push(collapsed_marker(
                        skip_range_start + start_line,
                        skip_range_end,
                    ));
                    is_skipping = false;
                }
                result.push(node);
            }
        }

        // A run still open at the end of the block gets no marker.
        code_el.children = result;
    }
}

/// The synthetic line summarizing a hidden range.
fn collapsed_marker(range_start: usize, range_end: usize) -> Node {
    Element::new("span")
        .with_attr("class", "skip")
        .with_attr("style", format!("counter-set: line {range_end}"))
        .with_text(format!("{range_start}-{range_end}"))
        .into()
}
