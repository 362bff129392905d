//! `{#id .class key=value}` attribute lists and `[text]{.class}` spans.
//!
//! An attribute list claimed inline renders as a placeholder holding its
//! source. Once masks are restored, the placeholder is merged into the
//! element it decorates: the element closed right before it, or the element
//! it ends. Placeholders that decorate nothing turn back into text.

use std::ops::Range;

use multimark_core::{InlineState, MultimarkError, TokenSink};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::Extension;
use crate::engine::{Engine, PassStage};

const KIND: &str = "attrs";
const OPEN: char = '\u{fdd2}';
const CLOSE: char = '\u{fdd3}';

static TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(/?)([A-Za-z][A-Za-z0-9-]*)[^>]*>").expect("static regex"));
static CLOSED_BEFORE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</([A-Za-z][A-Za-z0-9-]*)>$").expect("static regex"));
static VOID_BEFORE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(?:img|input)\b[^>]*>$").expect("static regex"));
static ENDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*(?:<a\b[^>]*aria-hidden="true"[^>]*>[^<]*</a>\s*)?</([A-Za-z][A-Za-z0-9-]*)>"#)
        .expect("static regex")
});
static ID_ATTR: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\sid="[^"]*""#).expect("static regex"));
static CLASS_ATTR: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\sclass="([^"]*)""#).expect("static regex"));

/// A parsed attribute list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attrs {
    /// Last `#id`.
    pub id: Option<String>,
    /// Every `.class`, in order.
    pub classes: Vec<String>,
    /// `key=value` pairs, in order.
    pub others: Vec<(String, String)>,
}

impl Attrs {
    /// The attributes as ` key="value"` pairs, escaped.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        if let Some(id) = &self.id {
            push_attr(&mut out, "id", id);
        }
        if !self.classes.is_empty() {
            push_attr(&mut out, "class", &self.classes.join(" "));
        }
        for (key, value) in &self.others {
            push_attr(&mut out, key, value);
        }
        out
    }
}

fn push_attr(out: &mut String, key: &str, value: &str) {
    out.push(' ');
    out.push_str(key);
    out.push_str("=\"");
    out.push_str(&html_escape::encode_double_quoted_attribute(value));
    out.push('"');
}

/// Parses an attribute list at the start of `src`, returning it and the
/// bytes consumed. The list must hold at least one item and close on the
/// same line. Event handler keys (`on…`) are dropped.
pub fn parse(src: &str) -> Option<(Attrs, usize)> {
    let mut pos = src.strip_prefix('{').map(|_| 1)?;
    let mut attrs = Attrs::default();
    let mut items = 0;
    loop {
        let rest = &src[pos..];
        pos += rest.len() - rest.trim_start_matches([' ', '\t']).len();
        let rest = &src[pos..];
        match rest.chars().next()? {
            '}' => return (items > 0).then_some((attrs, pos + 1)),
            '.' => {
                let class = name(&rest[1..])?;
                attrs.classes.push(class.to_string());
                pos += 1 + class.len();
            }
            '#' => {
                let id = name(&rest[1..])?;
                attrs.id = Some(id.to_string());
                pos += 1 + id.len();
            }
            _ => {
                let (key, value, len) = pair(rest)?;
                if key.len() > 2 && key.get(..2).is_some_and(|prefix| prefix.eq_ignore_ascii_case("on")) {
                    log::debug!("dropping event handler attribute {key}");
                } else {
                    attrs.others.push((key.to_string(), value.to_string()));
                }
                pos += len;
            }
        }
        items += 1;
        if !src[pos..].starts_with([' ', '\t', '}']) {
            return None;
        }
    }
}

fn name(src: &str) -> Option<&str> {
    let len = src
        .find(|c: char| !(c.is_alphanumeric() || matches!(c, '-' | '_' | ':')))
        .unwrap_or(src.len());
    (len > 0).then(|| &src[..len])
}

/// `key=value`, `key="value"` or `key='value'`.
fn pair(src: &str) -> Option<(&str, &str, usize)> {
    let key = name(src).filter(|key| !key.starts_with(|c: char| c.is_ascii_digit() || c == '-'))?;
    let rest = src[key.len()..].strip_prefix('=')?;
    let consumed = key.len() + 1;
    match rest.chars().next()? {
        quote @ ('"' | '\'') => {
            let body = &rest[1..];
            let close = body.find(|c: char| c == quote || c == '\n')?;
            if !body[close..].starts_with(quote) {
                return None;
            }
            Some((key, &body[..close], consumed + close + 2))
        }
        _ => {
            let len = rest
                .find(|c: char| c.is_whitespace() || matches!(c, '}' | '"' | '\'' | '<' | '>' | '`' | '='))
                .unwrap_or(rest.len());
            (len > 0).then(|| (key, &rest[..len], consumed + len))
        }
    }
}

fn placeholder(literal: &str) -> String {
    format!("{OPEN}{}{CLOSE}", html_escape::encode_text(literal))
}

/// Removes attribute placeholders from restored HTML.
pub(crate) fn strip_placeholders(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after = &rest[start + OPEN.len_utf8()..];
        rest = after.find(CLOSE).map_or("", |close| &after[close + CLOSE.len_utf8()..]);
    }
    out.push_str(rest);
    out
}

/// The `#id` of an attribute list ending `html`.
pub(crate) fn trailing_id(html: &str) -> Option<String> {
    let body = html.trim_end().strip_suffix(CLOSE)?;
    let open = body.rfind(OPEN)?;
    let literal = html_escape::decode_html_entities(&body[open + OPEN.len_utf8()..]);
    parse(&literal)?.0.id
}

/// Merges every placeholder into the element it decorates.
fn apply_placeholders(html: String) -> String {
    if !html.contains(OPEN) {
        return html;
    }
    let mut out = String::with_capacity(html.len());
    let mut rest = html.as_str();
    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after = &rest[start + OPEN.len_utf8()..];
        let close = after.find(CLOSE).unwrap_or(after.len());
        let literal = html_escape::decode_html_entities(&after[..close]).into_owned();
        rest = after.get(close + CLOSE.len_utf8()..).unwrap_or("");
        let attached = parse(&literal).is_some_and(|(attrs, _)| attach(&mut out, rest, &attrs));
        if !attached {
            out.push_str(&html_escape::encode_double_quoted_attribute(&literal));
        }
    }
    out.push_str(rest);
    out
}

fn attach(out: &mut String, tail: &str, attrs: &Attrs) -> bool {
    if let Some(found) = VOID_BEFORE.find(out) {
        let range = found.range();
        let merged = merge_into(&out[range.clone()], attrs);
        out.replace_range(range, &merged);
        return true;
    }
    if let Some(name) = CLOSED_BEFORE.captures(out).map(|caps| caps[1].to_string()) {
        return inject(out, &name, 0, attrs);
    }
    let Some(name) = ENDS.captures(tail).map(|caps| caps[1].to_string()) else {
        return false;
    };
    let mut kept = out.trim_end().len();
    if let Some(line) = ["<br>", "<br />"].iter().find(|br| out[..kept].ends_with(*br)) {
        kept = out[..kept - line.len()].trim_end().len();
    }
    let trailing = out.split_off(kept);
    if inject(out, &name, 1, attrs) {
        true
    } else {
        out.push_str(&trailing);
        false
    }
}

/// Merges into the open tag of `name` found scanning back from the end of
/// `html`, `depth` elements of that name deep.
fn inject(html: &mut String, name: &str, mut depth: usize, attrs: &Attrs) -> bool {
    let tags: Vec<(Range<usize>, bool)> = TAG
        .captures_iter(html)
        .filter(|caps| caps[2].eq_ignore_ascii_case(name))
        .filter_map(|caps| Some((caps.get(0)?.range(), caps[1].is_empty())))
        .collect();
    for (range, opening) in tags.into_iter().rev() {
        if !opening {
            depth += 1;
            continue;
        }
        if depth <= 1 {
            let merged = merge_into(&html[range.clone()], attrs);
            html.replace_range(range, &merged);
            return true;
        }
        depth -= 1;
    }
    false
}

/// Adds `attrs` to an open tag. The id is replaced, classes are appended.
fn merge_into(tag: &str, attrs: &Attrs) -> String {
    let mut tag = tag.strip_suffix('>').unwrap_or(tag).to_string();
    let void = tag.ends_with('/');
    if void {
        tag.pop();
        tag.truncate(tag.trim_end().len());
    }
    if let Some(id) = &attrs.id {
        if let Some(range) = ID_ATTR.find(&tag).map(|found| found.range()) {
            tag.replace_range(range, "");
        }
        push_attr(&mut tag, "id", id);
    }
    if !attrs.classes.is_empty() {
        let classes = attrs.classes.join(" ");
        match CLASS_ATTR.captures(&tag).and_then(|caps| caps.get(1)).map(|found| found.range()) {
            Some(existing) => {
                let sep = if existing.is_empty() { "" } else { " " };
                let extra = format!("{sep}{}", html_escape::encode_double_quoted_attribute(&classes));
                tag.insert_str(existing.end, &extra);
            }
            None => push_attr(&mut tag, "class", &classes),
        }
    }
    for (key, value) in &attrs.others {
        push_attr(&mut tag, key, value);
    }
    tag.push_str(if void { " />" } else { ">" });
    tag
}

fn attrs_rule(state: &mut InlineState<'_>) -> bool {
    if state.byte_at(state.pos) != Some(b'{') {
        return false;
    }
    let Some((_, len)) = parse(state.rest()) else {
        return false;
    };
    let literal = state.rest()[..len].to_string();
    state.push_token(KIND, "", 0).content = literal;
    state.pos += len;
    true
}

fn span_rule(state: &mut InlineState<'_>) -> bool {
    if state.byte_at(state.pos) != Some(b'[') {
        return false;
    }
    let label_start = state.pos + 1;
    let Some(label_end) = state.label_end(label_start) else {
        return false;
    };
    let Some((attrs, len)) = parse(&state.src()[label_end + 1..state.pos_max()]) else {
        return false;
    };
    state.push_token("span_open", "span", 1).content = attrs.to_html();
    state.tokenize_range(label_start, label_end);
    state.push_token("span_close", "span", -1);
    state.pos = label_end + 1 + len;
    true
}

/// Registers the attribute list rule and the pass that places lists.
pub struct AttrsExtension;

impl Extension for AttrsExtension {
    fn name(&self) -> &str {
        "attrs"
    }

    fn register(&self, engine: &mut Engine, _options: &Value) -> Result<(), MultimarkError> {
        engine.inline_mut().after("emphasis", KIND, Box::new(attrs_rule))?;
        engine.tokens_mut().set(KIND, |token| placeholder(&token.content));
        engine.add_html_pass(
            KIND,
            PassStage::Restored,
            Box::new(|_: &str, html: String| apply_placeholders(html)),
        );
        Ok(())
    }
}

/// Registers `[text]{attrs}` spans.
pub struct BracketedSpans;

impl Extension for BracketedSpans {
    fn name(&self) -> &str {
        "bracketed-spans"
    }

    fn register(&self, engine: &mut Engine, _options: &Value) -> Result<(), MultimarkError> {
        engine.inline_mut().before("link", "bracketed_span", Box::new(span_rule))?;
        engine
            .tokens_mut()
            .set("span_open", |token| format!("<span{}>", token.content));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderOptions;
    use crate::extensions::anchor::Anchor;
    use serde_json::json;

    fn render_with(source: &str, extensions: &[&dyn Extension]) -> String {
        let mut engine = Engine::new(RenderOptions {
            typographer: false,
            ..RenderOptions::default()
        });
        for extension in extensions {
            extension.register(&mut engine, &Value::Null).unwrap();
        }
        engine.render(source).unwrap().html
    }

    fn render(source: &str) -> String {
        render_with(source, &[&AttrsExtension, &BracketedSpans])
    }

    #[test]
    fn parses_ids_classes_and_pairs() {
        let (attrs, len) = parse("{#top .a .b data-x=1 title=\"two words\"} rest").unwrap();
        assert_eq!(len, 39);
        assert_eq!(attrs.id.as_deref(), Some("top"));
        assert_eq!(attrs.classes, ["a", "b"]);
        assert_eq!(
            attrs.others,
            [
                ("data-x".to_string(), "1".to_string()),
                ("title".to_string(), "two words".to_string())
            ]
        );
        assert_eq!(attrs.to_html(), " id=\"top\" class=\"a b\" data-x=\"1\" title=\"two words\"");
    }

    #[test]
    fn rejects_malformed_lists() {
        for src in ["{}", "{ }", "{.}", "{bare}", "{.a", "{.a\n}", "{x=\"open}", "{.a.b}", "{漢^かん}"] {
            assert_eq!(parse(src), None, "{src}");
        }
        let (attrs, _) = parse("{onclick=alert(1) .ok}").unwrap();
        assert!(attrs.others.is_empty());
        assert_eq!(attrs.classes, ["ok"]);
    }

    #[test]
    fn lists_decorate_the_element_before_them() {
        assert_eq!(
            render("*hi*{.x} and `code`{#c}\n"),
            "<p><em class=\"x\">hi</em> and <code id=\"c\">code</code></p>\n"
        );
        assert_eq!(
            render("![alt](a.png){width=10}\n"),
            "<p><img src=\"a.png\" alt=\"alt\" width=\"10\"></p>\n"
        );
    }

    #[test]
    fn trailing_lists_decorate_the_block() {
        assert_eq!(render("A paragraph {.lead}\n"), "<p class=\"lead\">A paragraph</p>\n");
        assert_eq!(render("Second line\n{#p2}\n"), "<p id=\"p2\">Second line</p>\n");
        assert_eq!(
            render("- item {.done}\n"),
            "<ul>\n<li class=\"done\">item</li>\n</ul>\n"
        );
    }

    #[test]
    fn heading_ids_come_from_the_list() {
        let mut engine = Engine::new(RenderOptions::default());
        AttrsExtension.register(&mut engine, &Value::Null).unwrap();
        Anchor
            .register(&mut engine, &json!({"permalink": true}))
            .unwrap();
        let doc = engine.render("## Title {#custom .big}\n").unwrap();
        assert_eq!(doc.headings[0].slug, "custom");
        assert_eq!(doc.headings[0].text, "Title");
        assert!(
            doc.html.starts_with("<h2 id=\"custom\" class=\"big\">Title <a "),
            "{}",
            doc.html
        );
        assert!(doc.html.contains("href=\"#custom\""));
    }

    #[test]
    fn unplaced_lists_stay_text() {
        assert_eq!(render("{.a} start\n"), "<p>{.a} start</p>\n");
        assert_eq!(render("x {y=\"<b>\"} z\n"), "<p>x {y=&quot;&lt;b&gt;&quot;} z</p>\n");
    }

    #[test]
    fn classes_merge_with_existing_ones() {
        assert_eq!(
            merge_into("<li class=\"task-list-item\">", &parse("{.a #i}").unwrap().0),
            "<li class=\"task-list-item a\" id=\"i\">"
        );
        assert_eq!(
            merge_into("<h2 id=\"old\">", &parse("{#new}").unwrap().0),
            "<h2 id=\"new\">"
        );
    }

    #[test]
    fn bracketed_spans_wrap_markdown() {
        assert_eq!(
            render("a [*b* c]{.hl lang=ja} d\n"),
            "<p>a <span class=\"hl\" lang=\"ja\"><em>b</em> c</span> d</p>\n"
        );
        assert_eq!(render("[plain] [link](u)\n"), "<p>[plain] <a href=\"u\">link</a></p>\n");
    }

    #[test]
    fn code_keeps_braces() {
        assert_eq!(render("`{.a}`\n"), "<p><code>{.a}</code></p>\n");
    }
}
