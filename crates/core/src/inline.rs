//! Inline rule capability.
//!
//! Inline rules scan one paragraph-sized chunk of markdown source. A rule
//! either claims the input at the current position (pushing tokens and
//! advancing `pos`) or declines. Everything not claimed by a token-pushing
//! rule is kept verbatim as markdown source for markdown-rs.
//!
//! The built-in rules never push tokens. They exist so constructs that
//! markdown-rs owns (escapes, code spans, delimiter runs, link
//! destinations, autolinks and inline HTML) are skipped over as a unit, and
//! so extensions have stable anchors to position themselves against.

use crate::error::RulerKind;
use crate::ruler::Ruler;
use crate::token::{SOURCE, Token, TokenSink};

/// Scan state for one chunk of inline source.
pub struct InlineState<'s> {
    src: &'s str,
    /// Current scan offset (byte index into `src`).
    pub pos: usize,
    pos_max: usize,
    pending: String,
    tokens: Vec<Token>,
    ruler: Option<&'s InlineRuler>,
}

impl<'s> InlineState<'s> {
    /// Creates a state scanning the whole of `src`.
    pub fn new(src: &'s str) -> Self {
        Self {
            src,
            pos: 0,
            pos_max: src.len(),
            pending: String::new(),
            tokens: Vec::new(),
            ruler: None,
        }
    }

    /// The full source of the chunk.
    pub fn src(&self) -> &'s str {
        self.src
    }

    /// Exclusive scan limit.
    pub fn pos_max(&self) -> usize {
        self.pos_max
    }

    /// Byte at `pos`, or `None` past the scan limit.
    pub fn byte_at(&self, pos: usize) -> Option<u8> {
        if pos < self.pos_max {
            self.src.as_bytes().get(pos).copied()
        } else {
            None
        }
    }

    /// Source from the current position to the scan limit.
    pub fn rest(&self) -> &'s str {
        &self.src[self.pos..self.pos_max]
    }

    /// Offset of the `]` closing a label opened just before `start`.
    /// Nested brackets are balanced and backslash escapes skipped.
    pub fn label_end(&self, start: usize) -> Option<usize> {
        let bytes = self.src.as_bytes();
        let mut depth = 1;
        let mut cursor = start;
        while cursor < self.pos_max {
            match bytes[cursor] {
                b'\\' => cursor += 1,
                b'[' => depth += 1,
                b']' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(cursor);
                    }
                }
                _ => {}
            }
            cursor += 1;
        }
        None
    }

    /// Keeps `src[pos..end]` as markdown source and moves to `end`.
    pub fn pass_through(&mut self, end: usize) {
        let end = end.min(self.pos_max);
        self.pending.push_str(&self.src[self.pos..end]);
        self.pos = end;
    }

    /// Runs the whole rule chain over `src[start..end]`, appending the
    /// result. Used by rules whose content may hold other inline syntax.
    ///
    /// Without a chain (a state built by hand) the range is kept as source.
    pub fn tokenize_range(&mut self, start: usize, end: usize) {
        let end = end.min(self.pos_max);
        let Some(ruler) = self.ruler else {
            self.pending.push_str(&self.src[start..end]);
            return;
        };
        self.flush_pending();
        let mut nested = InlineState {
            src: self.src,
            pos: start,
            pos_max: end,
            pending: String::new(),
            tokens: Vec::new(),
            ruler: Some(ruler),
        };
        ruler.run(&mut nested);
        self.tokens.append(&mut nested.finish());
    }

    /// Consumes the state, returning the token stream.
    pub fn finish(mut self) -> Vec<Token> {
        self.flush_pending();
        self.tokens
    }

    fn flush_pending(&mut self) {
        if !self.pending.is_empty() {
            let mut token = Token::new(SOURCE, "", 0);
            token.content = std::mem::take(&mut self.pending);
            self.tokens.push(token);
        }
    }
}

impl TokenSink for InlineState<'_> {
    fn push_token(&mut self, kind: &str, tag: &str, nesting: i8) -> &mut Token {
        self.flush_pending();
        self.tokens.push_token(kind, tag, nesting)
    }
}

/// A rule tried at every scan position.
pub trait InlineRule: Send + Sync {
    /// Claims input at `state.pos` by advancing it and returning true.
    ///
    /// A rule that returns false must not have pushed tokens; the caller
    /// restores `pos`.
    fn apply(&self, state: &mut InlineState<'_>) -> bool;
}

impl<F> InlineRule for F
where
    F: Fn(&mut InlineState<'_>) -> bool + Send + Sync,
{
    fn apply(&self, state: &mut InlineState<'_>) -> bool {
        (self)(state)
    }
}

/// The inline rule chain.
pub type InlineRuler = Ruler<dyn InlineRule>;

impl Ruler<dyn InlineRule> {
    /// Creates an empty inline chain.
    pub fn new() -> Self {
        Self::empty(RulerKind::Inline)
    }

    /// Creates the chain with the built-in pass-through rules:
    /// `escape`, `backticks`, `strikethrough`, `emphasis`, `link`,
    /// `autolink`.
    pub fn with_defaults() -> Self {
        let mut ruler = Self::new();
        ruler.push("escape", Box::new(escape));
        ruler.push("backticks", Box::new(backticks));
        ruler.push("strikethrough", Box::new(strikethrough));
        ruler.push("emphasis", Box::new(emphasis));
        ruler.push("link", Box::new(link));
        ruler.push("autolink", Box::new(autolink));
        ruler
    }

    /// Runs the chain over `src`.
    pub fn tokenize(&self, src: &str) -> Vec<Token> {
        let mut state = InlineState::new(src);
        state.ruler = Some(self);
        self.run(&mut state);
        state.finish()
    }

    fn run(&self, state: &mut InlineState<'_>) {
        while state.pos < state.pos_max {
            let start = state.pos;
            let claimed = self.rules().any(|rule| {
                if rule.apply(state) && state.pos > start {
                    true
                } else {
                    state.pos = start;
                    false
                }
            });
            if !claimed {
                let width = state.src[start..].chars().next().map_or(1, char::len_utf8);
                state.pass_through(start + width);
            }
        }
    }
}

impl Default for Ruler<dyn InlineRule> {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn escape(state: &mut InlineState<'_>) -> bool {
    if state.byte_at(state.pos) != Some(b'\\') {
        return false;
    }
    match state.byte_at(state.pos + 1) {
        Some(next) if next.is_ascii_punctuation() || next == b'\n' => {
            state.pass_through(state.pos + 2);
            true
        }
        _ => false,
    }
}

fn backticks(state: &mut InlineState<'_>) -> bool {
    let run = marker_run(state, b'`');
    if run == 0 {
        return false;
    }
    let open_end = state.pos + run;
    let bytes = state.src().as_bytes();
    let mut cursor = open_end;
    while cursor < state.pos_max() {
        if bytes[cursor] == b'`' {
            let close_start = cursor;
            while cursor < state.pos_max() && bytes[cursor] == b'`' {
                cursor += 1;
            }
            if cursor - close_start == run {
                state.pass_through(cursor);
                return true;
            }
        } else {
            cursor += 1;
        }
    }
    // Unmatched opener: keep the run literal so later rules skip it too.
    state.pass_through(open_end);
    true
}

fn strikethrough(state: &mut InlineState<'_>) -> bool {
    let run = marker_run(state, b'~');
    if run < 2 {
        return false;
    }
    state.pass_through(state.pos + run);
    true
}

fn emphasis(state: &mut InlineState<'_>) -> bool {
    let run = marker_run(state, b'*').max(marker_run(state, b'_'));
    if run == 0 {
        return false;
    }
    state.pass_through(state.pos + run);
    true
}

/// Inline links, images and reference definitions. The label runs through
/// the chain; destination and title stay markdown source.
fn link(state: &mut InlineState<'_>) -> bool {
    let label_start = match (state.byte_at(state.pos), state.byte_at(state.pos + 1)) {
        (Some(b'['), _) => state.pos + 1,
        (Some(b'!'), Some(b'[')) => state.pos + 2,
        _ => return false,
    };
    let Some(label_end) = state.label_end(label_start) else {
        return false;
    };
    let tail_end = match state.byte_at(label_end + 1) {
        Some(b'(') => destination_close(state, label_end + 2),
        Some(b':') if at_line_start(state) && state.byte_at(label_start) != Some(b'^') => {
            Some(line_end(state, label_end + 2))
        }
        _ => None,
    };
    let Some(tail_end) = tail_end else {
        return false;
    };
    state.pass_through(label_start);
    state.tokenize_range(label_start, label_end);
    state.pos = label_end;
    state.pass_through(tail_end);
    true
}

/// Offset just past the `)` closing a destination that starts at `start`.
fn destination_close(state: &InlineState<'_>, start: usize) -> Option<usize> {
    let bytes = state.src().as_bytes();
    let mut depth = 1;
    let mut quote: Option<u8> = None;
    let mut cursor = start;
    while cursor < state.pos_max() {
        let byte = bytes[cursor];
        match (quote, byte) {
            (_, b'\\') => cursor += 1,
            (Some(open), _) if byte == open => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') if bytes[cursor - 1].is_ascii_whitespace() => quote = Some(byte),
            (None, b'(') => depth += 1,
            (None, b')') => {
                depth -= 1;
                if depth == 0 {
                    return Some(cursor + 1);
                }
            }
            _ => {}
        }
        cursor += 1;
    }
    None
}

fn at_line_start(state: &InlineState<'_>) -> bool {
    let line = state.src()[..state.pos].rsplit('\n').next().unwrap_or_default();
    line.len() <= 3 && line.bytes().all(|b| b == b' ')
}

fn line_end(state: &InlineState<'_>, from: usize) -> usize {
    state.src()[from..state.pos_max()]
        .find('\n')
        .map_or(state.pos_max(), |offset| from + offset)
}

fn autolink(state: &mut InlineState<'_>) -> bool {
    if state.byte_at(state.pos) != Some(b'<') {
        return false;
    }
    match state.byte_at(state.pos + 1) {
        Some(b) if b.is_ascii_alphabetic() || matches!(b, b'/' | b'!' | b'?') => {}
        _ => return false,
    }
    match state.rest().find('>') {
        Some(close) => {
            state.pass_through(state.pos + close + 1);
            true
        }
        None => false,
    }
}

fn marker_run(state: &InlineState<'_>, marker: u8) -> usize {
    let mut len = 0;
    while state.byte_at(state.pos + len) == Some(marker) {
        len += 1;
    }
    len
}
