//! `$inline$` and `$$display$$` TeX.
//!
//! The TeX source is kept away from markdown-rs and written out escaped,
//! in elements a client-side typesetter picks up.

use multimark_core::{BlockClaim, InlineState, MultimarkError, Token, TokenSink};
use serde_json::Value;

use super::Extension;
use crate::engine::Engine;

const INLINE_KIND: &str = "math_inline";
const DELIMITER: &str = "$$";

/// Whether a `$` at `pos` may open or close a span.
///
/// A closer may not follow a space or tab, nor precede a digit; an opener
/// may not precede a space or tab.
fn delimiter_at(state: &InlineState<'_>, pos: usize) -> (bool, bool) {
    let bytes = state.src().as_bytes();
    let prev = pos.checked_sub(1).map(|at| bytes[at]);
    let next = state.byte_at(pos + 1);

    let can_open = !matches!(next, Some(b' ' | b'\t'));
    let can_close = !matches!(prev, Some(b' ' | b'\t')) && !next.is_some_and(|b| b.is_ascii_digit());
    (can_open, can_close)
}

/// Next `$` at or after `from` that is not backslash-escaped.
fn find_closer(state: &InlineState<'_>, from: usize) -> Option<usize> {
    let bytes = state.src().as_bytes();
    let mut at = from;
    while at < state.pos_max() {
        if bytes[at] == b'$' {
            let backslashes = bytes[..at].iter().rev().take_while(|b| **b == b'\\').count();
            if backslashes % 2 == 0 {
                return Some(at);
            }
        }
        at += 1;
    }
    None
}

fn math_inline(state: &mut InlineState<'_>) -> bool {
    if state.byte_at(state.pos) != Some(b'$') {
        return false;
    }
    let (can_open, _) = delimiter_at(state, state.pos);
    let start = state.pos + 1;
    if !can_open {
        state.pass_through(start);
        return true;
    }

    let Some(close) = find_closer(state, start) else {
        state.pass_through(start);
        return true;
    };
    if close == start {
        state.pass_through(start + 1);
        return true;
    }
    let (_, can_close) = delimiter_at(state, close);
    if !can_close {
        state.pass_through(start);
        return true;
    }

    let content = state.src()[start..close].to_string();
    state.push_token(INLINE_KIND, "math", 0).content = content;
    state.pos = close + 1;
    true
}

fn render_inline(token: &Token) -> String {
    format!(
        "<span class=\"math inline\">{}</span>",
        html_escape::encode_text(&token.content)
    )
}

fn strip_indent(line: &str) -> Option<&str> {
    let trimmed = line.trim_start_matches(' ');
    (line.len() - trimmed.len() <= 3).then_some(trimmed)
}

fn line_body(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

/// Claims a display block opened by `$$` at the start of a line. The block
/// ends on the first line whose trimmed text ends in `$$`, possibly the
/// opening line itself; an unclosed block runs to the end of the input.
fn math_block(lines: &[&str], start: usize) -> Option<BlockClaim> {
    let first = line_body(strip_indent(lines[start])?).strip_prefix(DELIMITER)?;

    if let Some(single) = first.trim().strip_suffix(DELIMITER) {
        return Some(display(single.trim(), start + 1));
    }

    let mut content = String::new();
    if !first.trim().is_empty() {
        content.push_str(first);
        content.push('\n');
    }
    let mut next = start + 1;
    while next < lines.len() {
        let body = line_body(lines[next]);
        if body.trim().ends_with(DELIMITER) {
            if let Some(at) = body.rfind(DELIMITER) {
                let last = body[..at].trim_start_matches(' ');
                if !last.trim().is_empty() {
                    content.push_str(last);
                }
            }
            return Some(display(content.trim_end(), next + 1));
        }
        content.push_str(lines[next]);
        next += 1;
    }
    Some(display(content.trim_end(), lines.len()))
}

fn display(tex: &str, end: usize) -> BlockClaim {
    BlockClaim::Html {
        html: format!(
            "<div class=\"math display\">{}</div>",
            html_escape::encode_text(tex)
        ),
        end,
    }
}

/// Registers inline and display math.
pub struct Katex;

impl Extension for Katex {
    fn name(&self) -> &str {
        "katex"
    }

    fn register(&self, engine: &mut Engine, options: &Value) -> Result<(), MultimarkError> {
        if !options.is_null() {
            log::debug!("katex options are applied client side: {options}");
        }
        engine.inline_mut().after("escape", INLINE_KIND, Box::new(math_inline))?;
        engine.tokens_mut().set(INLINE_KIND, render_inline);
        engine.block_mut().push("math_block", Box::new(math_block));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderOptions;

    fn render(source: &str) -> String {
        let mut engine = Engine::new(RenderOptions {
            typographer: false,
            ..RenderOptions::default()
        });
        Katex.register(&mut engine, &Value::Null).unwrap();
        engine.render(source).unwrap().html
    }

    #[test]
    fn inline_math_is_protected() {
        assert_eq!(
            render("area $a_1 * b_2 < c$ here\n"),
            "<p>area <span class=\"math inline\">a_1 * b_2 &lt; c</span> here</p>\n"
        );
    }

    #[test]
    fn invalid_delimiters_stay_text() {
        assert_eq!(render("costs $ 5 and $6\n"), "<p>costs $ 5 and $6</p>\n");
        assert_eq!(render("empty $$ pair\n"), "<p>empty $$ pair</p>\n");
        assert_eq!(render("from $5 to $10\n"), "<p>from $5 to $10</p>\n");
    }

    #[test]
    fn escaped_dollars_are_skipped() {
        assert_eq!(
            render("$a \\$ b$\n"),
            "<p><span class=\"math inline\">a \\$ b</span></p>\n"
        );
    }

    #[test]
    fn display_blocks() {
        insta::assert_snapshot!(render("$$x^2$$\n\n$$\n\\frac{a}{b}\n$$\n"), @r#"
        <div class="math display">x^2</div>
        <div class="math display">\frac{a}{b}</div>
        "#);
    }

    #[test]
    fn display_block_content_on_delimiter_lines() {
        let lines = ["$$ a +\n", "b\n", "c $$\n"];
        assert_eq!(
            math_block(&lines, 0),
            Some(BlockClaim::Html {
                html: "<div class=\"math display\"> a +\nb\nc</div>".to_string(),
                end: 3,
            })
        );
    }

    #[test]
    fn unclosed_display_runs_to_end() {
        let lines = ["$$\n", "x\n"];
        assert_eq!(math_block(&lines, 0).map(|c| c.end()), Some(2));
        assert!(math_block(&["    $$x$$\n"], 0).is_none());
    }
}
