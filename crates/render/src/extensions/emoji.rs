//! `:shortcode:` emoji.

use std::collections::HashMap;

use multimark_core::{InlineState, MultimarkError, TokenSink};
use once_cell::sync::Lazy;
use serde_json::Value;

use super::Extension;
use crate::engine::Engine;

static EMOJI: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("+1", "👍"),
        ("-1", "👎"),
        ("100", "💯"),
        ("angry", "😠"),
        ("beer", "🍺"),
        ("bell", "🔔"),
        ("blush", "😊"),
        ("book", "📖"),
        ("bookmark", "🔖"),
        ("bug", "🐛"),
        ("bulb", "💡"),
        ("cat", "🐱"),
        ("check", "✔️"),
        ("clap", "👏"),
        ("coffee", "☕"),
        ("confused", "😕"),
        ("cry", "😢"),
        ("dog", "🐶"),
        ("fire", "🔥"),
        ("grin", "😁"),
        ("heart", "❤️"),
        ("heavy_check_mark", "✔️"),
        ("hourglass", "⌛"),
        ("info", "ℹ️"),
        ("joy", "😂"),
        ("laughing", "😆"),
        ("link", "🔗"),
        ("lock", "🔒"),
        ("memo", "📝"),
        ("moon", "🌔"),
        ("muscle", "💪"),
        ("ok_hand", "👌"),
        ("pencil", "📝"),
        ("pray", "🙏"),
        ("question", "❓"),
        ("rocket", "🚀"),
        ("sake", "🍶"),
        ("smile", "😄"),
        ("smiley", "😃"),
        ("sob", "😭"),
        ("sparkles", "✨"),
        ("star", "⭐"),
        ("sunny", "☀️"),
        ("sushi", "🍣"),
        ("tada", "🎉"),
        ("thinking", "🤔"),
        ("thumbsdown", "👎"),
        ("thumbsup", "👍"),
        ("warning", "⚠️"),
        ("wave", "👋"),
        ("white_check_mark", "✅"),
        ("wink", "😉"),
        ("x", "❌"),
        ("zap", "⚡"),
    ]
    .into_iter()
    .collect()
});

/// Looks up a shortcode without the colons.
pub fn lookup(code: &str) -> Option<&'static str> {
    EMOJI.get(code).copied()
}

fn is_code_byte(byte: u8) -> bool {
    byte.is_ascii_lowercase() || byte.is_ascii_digit() || matches!(byte, b'_' | b'+' | b'-')
}

fn emoji(state: &mut InlineState<'_>) -> bool {
    if state.byte_at(state.pos) != Some(b':') {
        return false;
    }
    let start = state.pos + 1;
    let mut end = start;
    while state.byte_at(end).is_some_and(is_code_byte) {
        end += 1;
    }
    if end == start || state.byte_at(end) != Some(b':') {
        return false;
    }
    let Some(glyph) = lookup(&state.src()[start..end]) else {
        return false;
    };
    state.push_token("emoji", "", 0).content = glyph.to_string();
    state.pos = end + 1;
    true
}

/// Registers the `emoji` inline rule.
pub struct Emoji;

impl Extension for Emoji {
    fn name(&self) -> &str {
        "emoji"
    }

    fn register(&self, engine: &mut Engine, _options: &Value) -> Result<(), MultimarkError> {
        engine.inline_mut().push("emoji", Box::new(emoji));
        Ok(())
    }
}
