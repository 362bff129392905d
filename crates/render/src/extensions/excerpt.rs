//! `<!-- more -->` excerpt separators.
//!
//! The separator is kept as a raw comment even when raw HTML is escaped,
//! so the output can still be split at it.

use multimark_core::{BlockClaim, InlineState, MultimarkError, TokenSink};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::Extension;
use crate::engine::Engine;

static SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^<!--+\s*more\s*--+>").expect("static regex"));

fn excerpt_inline(state: &mut InlineState<'_>) -> bool {
    if state.byte_at(state.pos) != Some(b'<') {
        return false;
    }
    let Some(found) = SEPARATOR.find(state.rest()) else {
        return false;
    };
    state.push_token("html_inline", "", 0).content = found.as_str().to_string();
    state.pos += found.end();
    true
}

/// Claims a line holding only the separator.
fn excerpt_block(lines: &[&str], start: usize) -> Option<BlockClaim> {
    let line = lines[start].trim_end();
    let body = line.trim_start_matches(' ');
    if line.len() - body.len() > 3 {
        return None;
    }
    let found = SEPARATOR.find(body)?;
    (found.end() == body.len()).then(|| BlockClaim::Html {
        html: body.to_string(),
        end: start + 1,
    })
}

/// Registers the separator rules.
pub struct Excerpt;

impl Extension for Excerpt {
    fn name(&self) -> &str {
        "excerpt"
    }

    fn register(&self, engine: &mut Engine, _options: &Value) -> Result<(), MultimarkError> {
        engine.inline_mut().before("autolink", "excerpt", Box::new(excerpt_inline))?;
        engine.block_mut().push("excerpt", Box::new(excerpt_block));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderOptions;

    fn render(source: &str, html: bool) -> String {
        let mut engine = Engine::new(RenderOptions {
            html,
            ..RenderOptions::default()
        });
        Excerpt.register(&mut engine, &Value::Null).unwrap();
        engine.render(source).unwrap().html
    }

    #[test]
    fn separator_survives_escaped_html() {
        insta::assert_snapshot!(render("Intro.\n\n<!-- more -->\n\n<b>Rest</b>\n", false), @r"
        <p>Intro.</p>
        <!-- more -->
        <p>&lt;b&gt;Rest&lt;/b&gt;</p>
        ");
    }

    #[test]
    fn inline_separator_and_variants() {
        assert_eq!(
            render("Intro <!---MORE---> rest\n", false),
            "<p>Intro <!---MORE---> rest</p>\n"
        );
        assert_eq!(render("<!-- less -->\n", false), "<p>&lt;!-- less --&gt;</p>\n");
    }

    #[test]
    fn separator_with_html_enabled() {
        assert_eq!(render("a\n\n<!--more-->\n", true), "<p>a</p>\n<!--more-->\n");
    }
}
