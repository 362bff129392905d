//! Block rule capability.
//!
//! Block rules look at the document line by line (each line keeps its
//! trailing newline). A rule can claim a range of lines as opaque source,
//! replace it with rendered HTML, wrap a body that keeps being processed
//! as markdown, or rebuild the range from [`ClaimPart`]s.

use std::ops::Range;

use crate::code_fence::FenceTracker;
use crate::error::RulerKind;
use crate::ruler::Ruler;

/// What a block rule did with the lines starting at the candidate line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockClaim {
    /// Lines up to `end` go to markdown-rs untouched and are not
    /// inline-scanned.
    Opaque {
        /// Exclusive end line.
        end: usize,
    },
    /// Lines up to `end` are replaced by `html`.
    Html {
        /// Rendered HTML.
        html: String,
        /// Exclusive end line.
        end: usize,
    },
    /// `open` and `close` wrap the `body` lines, which are processed
    /// recursively.
    Container {
        /// HTML emitted before the body.
        open: String,
        /// HTML emitted after the body.
        close: String,
        /// Body line range.
        body: Range<usize>,
        /// Exclusive end line (after the closing marker).
        end: usize,
    },
    /// Lines up to `end` are replaced by `parts`, in order. No parts drops
    /// the lines.
    Parts {
        /// Replacement pieces.
        parts: Vec<ClaimPart>,
        /// Exclusive end line.
        end: usize,
    },
}

/// One piece of a [`BlockClaim::Parts`] claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimPart {
    /// Flow HTML on its own.
    Html(String),
    /// Inline markdown between two pieces of flow HTML, without a
    /// paragraph around it.
    Wrapped {
        /// HTML before the text.
        open: String,
        /// Inline markdown.
        text: String,
        /// HTML after the text.
        close: String,
    },
    /// Markdown processed like a nested document.
    Markdown(String),
}

impl BlockClaim {
    /// Exclusive end line of the claim.
    pub fn end(&self) -> usize {
        match self {
            BlockClaim::Opaque { end }
            | BlockClaim::Html { end, .. }
            | BlockClaim::Container { end, .. }
            | BlockClaim::Parts { end, .. } => *end,
        }
    }
}

/// A rule tried at the start of every line outside claimed ranges.
pub trait BlockRule: Send + Sync {
    /// Returns a claim for `lines[start..]`, or `None` to decline.
    fn apply(&self, lines: &[&str], start: usize) -> Option<BlockClaim>;
}

impl<F> BlockRule for F
where
    F: Fn(&[&str], usize) -> Option<BlockClaim> + Send + Sync,
{
    fn apply(&self, lines: &[&str], start: usize) -> Option<BlockClaim> {
        (self)(lines, start)
    }
}

/// The block rule chain.
pub type BlockRuler = Ruler<dyn BlockRule>;

impl Ruler<dyn BlockRule> {
    /// Creates an empty block chain.
    pub fn new() -> Self {
        Self::empty(RulerKind::Block)
    }

    /// Creates the chain with the built-in `fence` rule.
    pub fn with_defaults() -> Self {
        let mut ruler = Self::new();
        ruler.push("fence", Box::new(fence));
        ruler
    }

    /// First claim any rule makes at `start`.
    pub fn claim(&self, lines: &[&str], start: usize) -> Option<BlockClaim> {
        self.rules()
            .find_map(|rule| rule.apply(lines, start))
            .filter(|claim| claim.end() > start)
    }
}

impl Default for Ruler<dyn BlockRule> {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn fence(lines: &[&str], start: usize) -> Option<BlockClaim> {
    let mut tracker = FenceTracker::new();
    if !tracker.observe(lines[start]) {
        return None;
    }
    let mut end = start + 1;
    while end < lines.len() && tracker.is_inside() {
        tracker.observe(lines[end]);
        end += 1;
    }
    Some(BlockClaim::Opaque { end })
}

/// A `:::`-style container located by [`find_container`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpan<'a> {
    /// Text after the opening marker run, trimmed.
    pub params: &'a str,
    /// Body line range.
    pub body: Range<usize>,
    /// Exclusive end line; equals `lines.len()` when unclosed.
    pub end: usize,
}

/// Locates a container opened at `start` by at least three `marker`
/// characters followed by non-empty params.
///
/// The closing line is a run of the same marker at least as long as the
/// opener with nothing after it. Nested openers with the same marker and
/// lines inside fenced code are skipped. An unclosed container runs to the
/// end of the input.
pub fn find_container<'a>(lines: &[&'a str], start: usize, marker: char) -> Option<ContainerSpan<'a>> {
    let (open_len, params) = marker_line(lines[start], marker)?;
    if params.is_empty() {
        return None;
    }

    let mut depth = 0usize;
    let mut fence = FenceTracker::new();
    for (index, line) in lines.iter().enumerate().skip(start + 1) {
        if fence.observe(line) {
            continue;
        }
        let Some((len, rest)) = marker_line(line, marker) else {
            continue;
        };
        if !rest.is_empty() {
            depth += 1;
        } else if depth > 0 {
            depth -= 1;
        } else if len >= open_len {
            return Some(ContainerSpan {
                params,
                body: start + 1..index,
                end: index + 1,
            });
        }
    }

    Some(ContainerSpan {
        params,
        body: start + 1..lines.len(),
        end: lines.len(),
    })
}

fn marker_line(line: &str, marker: char) -> Option<(usize, &str)> {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    let len = trimmed.chars().take_while(|c| *c == marker).count();
    if len < 3 {
        return None;
    }
    let rest = trimmed[len * marker.len_utf8()..].trim();
    Some((len, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(src: &str) -> Vec<&str> {
        src.split_inclusive('\n').collect()
    }

    #[test]
    fn fence_claims_through_closer() {
        let src = lines("text\n```\n{a^b}\n```\nafter\n");
        let ruler = BlockRuler::with_defaults();
        assert_eq!(ruler.claim(&src, 0), None);
        assert_eq!(ruler.claim(&src, 1), Some(BlockClaim::Opaque { end: 4 }));
    }

    #[test]
    fn unclosed_fence_runs_to_end() {
        let src = lines("```\ncode\n");
        assert_eq!(fence(&src, 0), Some(BlockClaim::Opaque { end: 2 }));
    }

    #[test]
    fn container_with_nested_opener() {
        let src = lines("::: note info\nouter\n::: warning\ninner\n:::\nstill outer\n:::\nafter\n");
        let span = find_container(&src, 0, ':').unwrap();
        assert_eq!(span.params, "note info");
        assert_eq!(span.body, 1..6);
        assert_eq!(span.end, 7);
    }

    #[test]
    fn container_closer_inside_fence_is_ignored() {
        let src = lines(";;; tab1 First\n```\n;;;\n```\n;;;\n");
        let span = find_container(&src, 0, ';').unwrap();
        assert_eq!(span.end, 5);
    }

    #[test]
    fn container_requires_params() {
        let src = lines(":::\ntext\n:::\n");
        assert!(find_container(&src, 0, ':').is_none());
    }

    #[test]
    fn unclosed_container_runs_to_end() {
        let src = lines("+++ info Title\nbody\n");
        let span = find_container(&src, 0, '+').unwrap();
        assert_eq!(span.body, 1..2);
        assert_eq!(span.end, 2);
    }
}
