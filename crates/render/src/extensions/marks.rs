//! `++ins++`, `==mark==`, `~sub~` and `^sup^`.

use multimark_core::{InlineRule, InlineState, MultimarkError, TokenSink};
use serde_json::Value;

use super::{Extension, ExtensionRegistry};
use crate::engine::Engine;

/// How the marked span is delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// Doubled marker; content may hold other inline syntax.
    Double,
    /// Single marker; content is literal and may not contain whitespace.
    Single,
}

/// One inline mark extension.
pub struct Mark {
    name: &'static str,
    marker: u8,
    tag: &'static str,
    shape: Shape,
}

/// The four mark extensions.
pub const MARKS: [Mark; 4] = [
    Mark {
        name: "ins",
        marker: b'+',
        tag: "ins",
        shape: Shape::Double,
    },
    Mark {
        name: "mark",
        marker: b'=',
        tag: "mark",
        shape: Shape::Double,
    },
    Mark {
        name: "sub",
        marker: b'~',
        tag: "sub",
        shape: Shape::Single,
    },
    Mark {
        name: "sup",
        marker: b'^',
        tag: "sup",
        shape: Shape::Single,
    },
];

pub(super) fn install(registry: &mut ExtensionRegistry) {
    for mark in MARKS {
        registry.register(Box::new(mark));
    }
}

struct MarkRule {
    marker: u8,
    tag: &'static str,
    shape: Shape,
}

impl MarkRule {
    fn open_kind(&self) -> String {
        format!("{}_open", self.tag)
    }

    fn close_kind(&self) -> String {
        format!("{}_close", self.tag)
    }

    fn apply_double(&self, state: &mut InlineState<'_>) -> bool {
        let m = self.marker;
        let open = state.pos;
        if state.byte_at(open) != Some(m)
            || state.byte_at(open + 1) != Some(m)
            || state.byte_at(open + 2) == Some(m)
        {
            return false;
        }
        let start = open + 2;
        if state.byte_at(start).is_none_or(|b| b.is_ascii_whitespace()) {
            return false;
        }

        let bytes = state.src().as_bytes();
        let mut cursor = start + 1;
        let close = loop {
            if cursor + 1 >= state.pos_max() {
                return false;
            }
            if bytes[cursor] == b'\\' {
                cursor += 2;
                continue;
            }
            if bytes[cursor] == m && bytes[cursor + 1] == m && !bytes[cursor - 1].is_ascii_whitespace() {
                break cursor;
            }
            cursor += 1;
        };

        state.push_token(&self.open_kind(), self.tag, 1);
        state.tokenize_range(start, close);
        state.push_token(&self.close_kind(), self.tag, -1);
        state.pos = close + 2;
        true
    }

    fn apply_single(&self, state: &mut InlineState<'_>) -> bool {
        let m = self.marker;
        let open = state.pos;
        if state.byte_at(open) != Some(m) || state.byte_at(open + 1) == Some(m) {
            return false;
        }
        let start = open + 1;
        let bytes = state.src().as_bytes();
        let mut cursor = start;
        let close = loop {
            let Some(byte) = state.byte_at(cursor) else {
                return false;
            };
            if byte == b'\\' {
                cursor += 2;
                continue;
            }
            if byte == m {
                break cursor;
            }
            if byte.is_ascii_whitespace() {
                return false;
            }
            cursor += 1;
        };
        if close == start || bytes.get(close + 1) == Some(&m) {
            return false;
        }

        let content = unescape(&state.src()[start..close]);
        state.push_token(&self.open_kind(), self.tag, 1);
        state.push_token("text", "", 0).content = content;
        state.push_token(&self.close_kind(), self.tag, -1);
        state.pos = close + 1;
        true
    }
}

impl InlineRule for MarkRule {
    fn apply(&self, state: &mut InlineState<'_>) -> bool {
        match self.shape {
            Shape::Double => self.apply_double(state),
            Shape::Single => self.apply_single(state),
        }
    }
}

/// Drops backslashes in front of ASCII punctuation and spaces.
fn unescape(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\'
            && let Some(&next) = chars.peek()
            && (next == ' ' || next.is_ascii_punctuation())
        {
            out.push(next);
            chars.next();
            continue;
        }
        out.push(ch);
    }
    out
}

impl Extension for Mark {
    fn name(&self) -> &str {
        self.name
    }

    fn register(&self, engine: &mut Engine, _options: &Value) -> Result<(), MultimarkError> {
        let rule = MarkRule {
            marker: self.marker,
            tag: self.tag,
            shape: self.shape,
        };
        engine.inline_mut().after("emphasis", self.name, Box::new(rule))?;
        if self.marker == b'~' {
            engine.parse_options_mut().single_tilde = false;
        }
        Ok(())
    }
}
