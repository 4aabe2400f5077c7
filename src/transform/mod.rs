//! Code-block transformers.
//!
//! Fenced code blocks can carry annotation text after the language token:
//!
//! ````text
//! ```rust showLineNumbers{10} skip{12-13} {15}
//! ```
//! ````
//!
//! Each transformer gets two hooks per block: [`CodeTransformer::preprocess`]
//! runs against the raw code text before highlighting, and
//! [`CodeTransformer::code`] rewrites the rendered `<code>` tree afterwards.
//! State resolved during preprocessing travels in a [`BlockContext`] owned by
//! the block being rendered; nothing is shared across blocks.
//!
//! Directives never fail: a malformed or absent directive means the
//! transformer leaves the block alone.

mod meta;
mod skip;

use std::collections::BTreeSet;

use crate::html::Element;

pub use meta::{LineNumbers, MetaHighlight};
pub use skip::{SkipLines, skipped_lines, starting_line};

/// Per-block state shared between the preprocess and code hooks.
///
/// Created when a block starts rendering, dropped when it is emitted.
#[derive(Debug, Clone, Default)]
pub struct BlockContext {
    /// Language token from the fence info string, if any.
    pub language: Option<String>,
    /// Raw annotation text after the language token.
    pub annotation: String,
    /// First displayed line number, when a directive set one.
    pub start_line: Option<usize>,
    /// Absolute line numbers to hide, when a `skip{..}` directive is present.
    pub skipped_lines: Option<BTreeSet<usize>>,
    /// 1-based line numbers to emphasize, when a `{..}` group is present.
    pub highlighted_lines: Option<BTreeSet<usize>>,
}

impl BlockContext {
    pub fn new(language: Option<&str>, annotation: &str) -> Self {
        Self {
            language: language.map(ToOwned::to_owned),
            annotation: annotation.to_string(),
            ..Self::default()
        }
    }

    /// The first displayed line number, defaulting to 1.
    pub fn start_line(&self) -> usize {
        self.start_line.unwrap_or(1)
    }
}

/// A transformer applied to every fenced code block.
pub trait CodeTransformer {
    fn name(&self) -> &'static str;

    /// Inspect the raw code text and annotation before highlighting.
    fn preprocess(&self, ctx: &mut BlockContext, code: &str) {
        let _ = (ctx, code);
    }

    /// Rewrite the rendered `<code>` element after highlighting.
    fn code(&self, ctx: &BlockContext, code_el: &mut Element) {
        let _ = (ctx, code_el);
    }
}

/// An ordered set of transformers run over each code block.
pub struct TransformPipeline {
    transformers: Vec<Box<dyn CodeTransformer>>,
}

impl TransformPipeline {
    /// The standard transformer set: meta highlighting, line numbers,
    /// line skipping.
    pub fn standard() -> Self {
        Self {
            transformers: vec![
                Box::new(MetaHighlight),
                Box::new(LineNumbers),
                Box::new(SkipLines),
            ],
        }
    }

    /// An empty pipeline; code blocks render highlighted but untransformed.
    pub const fn empty() -> Self {
        Self {
            transformers: Vec::new(),
        }
    }

    /// Run every preprocess hook in registration order.
    pub fn preprocess(&self, ctx: &mut BlockContext, code: &str) {
        for transformer in &self.transformers {
            transformer.preprocess(ctx, code);
        }
    }

    /// Run every code hook in registration order.
    pub fn apply(&self, ctx: &BlockContext, code_el: &mut Element) {
        for transformer in &self.transformers {
            transformer.code(ctx, code_el);
        }
    }
}

impl Default for TransformPipeline {
    fn default() -> Self {
        Self::standard()
    }
}

/// Expand a comma-separated list of numbers and inclusive `a-b` ranges.
///
/// Malformed entries are dropped; an inverted range expands to nothing.
pub(crate) fn expand_ranges(spec: &str) -> BTreeSet<usize> {
    let mut numbers = BTreeSet::new();
    for entry in spec.split(',') {
        let mut parts = entry.splitn(2, '-');
        let Some(start) = parts.next().and_then(|s| s.parse::<usize>().ok()) else {
            continue;
        };
        match parts.next() {
            Some(end) => {
                if let Ok(end) = end.parse::<usize>() {
                    numbers.extend(start..=end);
                }
            }
            None => {
                numbers.insert(start);
            }
        }
    }
    numbers
}
