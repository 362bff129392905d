//! Spaces between CJK and half-width letters, digits and some punctuation.
//!
//! Each text run is spaced on its own; runs split by tags or code are left
//! as they meet.

use multimark_core::MultimarkError;
use serde_json::Value;

use super::Extension;
use crate::engine::{Engine, PassStage};
use crate::html::map_text;

fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{2e80}'..='\u{2eff}'
        | '\u{2f00}'..='\u{2fdf}'
        | '\u{3040}'..='\u{309f}'
        | '\u{30a0}'..='\u{30fa}'
        | '\u{30fc}'..='\u{30ff}'
        | '\u{3100}'..='\u{312f}'
        | '\u{3200}'..='\u{32ff}'
        | '\u{3400}'..='\u{4dbf}'
        | '\u{4e00}'..='\u{9fff}'
        | '\u{f900}'..='\u{faff}')
}

fn is_half_width(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || (matches!(c, '\u{c0}'..='\u{ff}' | '\u{370}'..='\u{3ff}') && !matches!(c, '\u{d7}' | '\u{f7}'))
}

/// Half-width characters spaced from CJK that follows them.
fn spaced_before_cjk(c: char) -> bool {
    is_half_width(c) || matches!(c, '%' | '!' | ':' | ',' | '.' | '?')
}

/// Half-width characters spaced from CJK that precedes them.
fn spaced_after_cjk(c: char) -> bool {
    is_half_width(c) || matches!(c, '$' | '@')
}

/// Appends `text` to `out` with spaces at CJK boundaries.
fn space_into(text: &str, out: &mut String) {
    let mut prev: Option<char> = None;
    for c in text.chars() {
        if let Some(p) = prev
            && ((is_cjk(p) && spaced_after_cjk(c)) || (spaced_before_cjk(p) && is_cjk(c)))
        {
            out.push(' ');
        }
        out.push(c);
        prev = Some(c);
    }
}

fn space_html(_source: &str, html: String) -> String {
    if !html.chars().any(is_cjk) {
        return html;
    }
    map_text(&html, space_into)
}

/// Registers the spacing pass.
pub struct Pangu;

impl Extension for Pangu {
    fn name(&self) -> &str {
        "pangu"
    }

    fn register(&self, engine: &mut Engine, _options: &Value) -> Result<(), MultimarkError> {
        engine.add_html_pass(self.name(), PassStage::Masked, Box::new(space_html));
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
        Pangu.register(&mut engine, &Value::Null).unwrap();
        engine.render(source).unwrap().html
    }

    #[test]
    fn spaces_mixed_runs() {
        assert_eq!(render("漢字English混在123です\n"), "<p>漢字 English 混在 123 です</p>\n");
        assert_eq!(render("中文,English。\n"), "<p>中文,English。</p>\n");
        assert_eq!(render("版本v2.0発表\n"), "<p>版本 v2.0 発表</p>\n");
    }

    #[test]
    fn entities_and_code_are_untouched() {
        assert_eq!(render("漢&字 <a\n"), "<p>漢&amp;字 &lt;a</p>\n");
        assert_eq!(render("日本`code`語\n"), "<p>日本<code>code</code>語</p>\n");
        assert_eq!(render("```\n漢A\n```\n"), "<pre><code>漢A\n</code></pre>\n");
    }

    #[test]
    fn punctuation_spacing_follows_direction() {
        assert_eq!(render("注意:日本語、100%の$5\n"), "<p>注意: 日本語、100% の $5</p>\n");
        assert_eq!(render("{漢^かん}\n"), "<p>{漢^かん}</p>\n");
    }

    #[test]
    fn spaces_are_not_doubled() {
        assert_eq!(render("漢 A 字\n"), "<p>漢 A 字</p>\n");
    }
}
