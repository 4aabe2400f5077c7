//! Annotation-driven emphasis and numbering transformers.

use std::sync::LazyLock;

use regex::Regex;

use crate::html::Element;

use super::{BlockContext, CodeTransformer, expand_ranges, starting_line};

// The group must start the annotation or follow whitespace so the braces of
// `skip{..}` and `showLineNumbers{..}` are never mistaken for a highlight
// group.
static HIGHLIGHT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)\{([\d,-]+)\}").expect("highlight pattern"));

/// Adds class `highlighted` to the lines named by a bare `{2,4-6}` group.
///
/// Line numbers here are 1-based positions within the block, independent of
/// any `showLineNumbers{..}` offset.
pub struct MetaHighlight;

impl CodeTransformer for MetaHighlight {
    fn name(&self) -> &'static str {
        "meta-highlight"
    }

    fn preprocess(&self, ctx: &mut BlockContext, _code: &str) {
        if ctx.annotation.is_empty() {
            return;
        }
        ctx.highlighted_lines = HIGHLIGHT_RE
            .captures(&ctx.annotation)
            .map(|captures| expand_ranges(&captures[1]));
    }

    fn code(&self, ctx: &BlockContext, code_el: &mut Element) {
        let Some(highlighted) = &ctx.highlighted_lines else {
            return;
        };
        if highlighted.is_empty() {
            return;
        }
        for (index, node) in code_el.children.iter_mut().enumerate() {
            if index % 2 != 0 {
                continue;
            }
            if highlighted.contains(&(index / 2 + 1)) {
                if let Some(el) = node.as_element_mut() {
                    el.add_class("highlighted");
                }
            }
        }
    }
}

/// Marks a block for CSS line numbering when `showLineNumbers{n}` is present.
///
/// The counter is reset to `n - 1` so the first rendered line displays `n`.
pub struct LineNumbers;

impl CodeTransformer for LineNumbers {
    fn name(&self) -> &'static str {
        "line-numbers"
    }

    fn preprocess(&self, ctx: &mut BlockContext, _code: &str) {
        if ctx.start_line.is_none() {
            ctx.start_line = starting_line(&ctx.annotation);
        }
    }

    fn code(&self, ctx: &BlockContext, code_el: &mut Element) {
        let Some(start) = ctx.start_line else {
            return;
        };
        code_el.add_class("line-numbers");
        code_el.set_attr("style", format!("counter-reset: line {}", start - 1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::Node;
    use crate::transform::tests::code_lines;

    fn run<T: CodeTransformer>(transformer: &T, code_el: &mut Element, annotation: &str) {
        let mut ctx = BlockContext::new(None, annotation);
        transformer.preprocess(&mut ctx, "");
        transformer.code(&ctx, code_el);
    }

    fn highlighted_positions(code_el: &Element) -> Vec<usize> {
        code_el
            .children
            .iter()
            .filter_map(Node::as_element)
            .enumerate()
            .filter(|(_, el)| el.has_class("highlighted"))
            .map(|(i, _)| i + 1)
            .collect()
    }

    #[test]
    fn test_highlight_group_marks_named_lines() {
        let mut code = code_lines(6);
        run(&MetaHighlight, &mut code, "{2,4-5}");
        assert_eq!(highlighted_positions(&code), vec![2, 4, 5]);
    }

    #[test]
    fn test_skip_braces_are_not_a_highlight_group() {
        let mut code = code_lines(6);
        run(&MetaHighlight, &mut code, "skip{2,4-5}");
        assert!(highlighted_positions(&code).is_empty());
    }

    #[test]
    fn test_highlight_group_composes_with_other_directives() {
        let mut code = code_lines(6);
        run(&MetaHighlight, &mut code, "showLineNumbers{3} {1} skip{4}");
        assert_eq!(highlighted_positions(&code), vec![1]);
    }

    #[test]
    fn test_line_numbers_resets_counter_below_start() {
        let mut code = code_lines(3);
        run(&LineNumbers, &mut code, "showLineNumbers{10}");
        assert!(code.has_class("line-numbers"));
        assert_eq!(code.attr("style"), Some("counter-reset: line 9"));
    }

    #[test]
    fn test_line_numbers_absent_without_directive() {
        let mut code = code_lines(3);
        let before = code.clone();
        run(&LineNumbers, &mut code, "{1-2}");
        assert_eq!(code, before);
    }
}
