//! `:::` note and link-card containers, `;;;` tabs, `+++` collapsible
//! sections and `::: spoiler` blocks.

use std::collections::HashMap;

use multimark_core::{BlockClaim, ContainerSpan, MultimarkError, find_container};
use serde_json::Value;

use super::Extension;
use crate::engine::Engine;

const NOTE_STYLES: [&str; 7] = [
    "default",
    "primary",
    "success",
    "info",
    "warning",
    "danger",
    "jsonModule",
];
const COLLAPSE_STYLES: [&str; 5] = ["primary", "success", "info", "warning", "danger"];
const DEFAULT_CARD_COLOR: &str = "#6AC1EC";

fn attr(value: &str) -> std::borrow::Cow<'_, str> {
    html_escape::encode_double_quoted_attribute(value)
}

fn wrap(span: ContainerSpan<'_>, open: String, close: &str) -> BlockClaim {
    BlockClaim::Container {
        open,
        close: close.to_string(),
        body: span.body,
        end: span.end,
    }
}

/// `::: json` (link cards) and `::: <style>` notes.
fn colon_container(lines: &[&str], start: usize) -> Option<BlockClaim> {
    let span = find_container(lines, start, ':')?;
    let params = span.params;

    if params.starts_with("json") {
        if params == "json" {
            let cards = parse_cards(&lines[span.body.clone()]);
            if !cards.is_empty() {
                return Some(BlockClaim::Html {
                    html: render_cards(&cards),
                    end: span.end,
                });
            }
        }
        let open = format!("<div class=\"container_{}\">", attr(params));
        return Some(wrap(span, open, "</div>"));
    }

    if NOTE_STYLES.iter().any(|style| params.starts_with(style)) {
        let open = format!("<div class=\"note {}\">", attr(params));
        return Some(wrap(span, open, "</div>"));
    }
    None
}

/// `;;; id Title` tabs.
fn tab_container(lines: &[&str], start: usize) -> Option<BlockClaim> {
    let span = find_container(lines, start, ';')?;
    let id_len = span
        .params
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
        .count();
    if id_len == 0 {
        return None;
    }
    let (id, title) = span.params.split_at(id_len);
    let open = format!(
        "<div class=\"tab\" data-id=\"{}\" data-title=\"{}\">",
        attr(id),
        attr(title.trim())
    );
    Some(wrap(span, open, "</div>"))
}

/// `+++ Title` or `+++<style> Title` collapsible sections.
///
/// The style only applies when it directly follows the markers; with a
/// space in between the whole text becomes the summary.
fn collapse_container(lines: &[&str], start: usize) -> Option<BlockClaim> {
    let span = find_container(lines, start, '+')?;
    let raw = raw_params(lines[start], '+');

    let (style, summary) = match COLLAPSE_STYLES.iter().find(|style| raw.starts_with(**style)) {
        Some(style) => (*style, &raw[style.len()..]),
        None if raw.starts_with(char::is_whitespace) => ("", raw),
        None => return None,
    };

    let class = if style.is_empty() {
        String::new()
    } else {
        format!(" class=\"{style}\"")
    };
    let open = format!(
        "<details{class}><summary>{}</summary><div>",
        html_escape::encode_text(summary.trim())
    );
    Some(wrap(span, open, "</div></details>"))
}

/// `::: spoiler Title` blocks.
fn spoiler_container(lines: &[&str], start: usize) -> Option<BlockClaim> {
    let span = find_container(lines, start, ':')?;
    let summary = span.params.strip_prefix("spoiler")?;
    if !summary.starts_with(char::is_whitespace) {
        return None;
    }
    let open = format!(
        "<details class=\"spoiler\"><summary>{}</summary>",
        html_escape::encode_text(summary.trim_start())
    );
    Some(wrap(span, open, "</details>"))
}

/// Text after the marker run, without the line ending.
fn raw_params(line: &str, marker: char) -> &str {
    line.trim_start_matches(' ')
        .trim_start_matches(marker)
        .trim_end_matches(['\n', '\r'])
}

/// Reads `key: value` lines into cards; `blackType` starts a new card.
fn parse_cards(body: &[&str]) -> Vec<HashMap<String, String>> {
    let mut cards = Vec::new();
    let mut current: HashMap<String, String> = HashMap::new();
    for line in body {
        let Some((key, value)) = line.trim().split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() || key.contains(' ') {
            continue;
        }
        if key == "blackType" && !current.is_empty() {
            cards.push(std::mem::take(&mut current));
        }
        current.insert(key.to_string(), value.trim().to_string());
    }
    if !current.is_empty() {
        cards.push(current);
    }
    cards
}

fn favicon(url: &str) -> String {
    format!("https://favicon.run/favicon?domain={}&sz=64", host_of(url).unwrap_or(url))
}

fn host_of(url: &str) -> Option<&str> {
    let (scheme, rest) = url.split_once("://")?;
    if scheme.is_empty() || !scheme.bytes().all(|b| b.is_ascii_alphanumeric() || b"+.-".contains(&b)) {
        return None;
    }
    let authority = rest.split(['/', '?', '#']).next()?;
    let host = authority.rsplit('@').next()?;
    let host = match host.rsplit_once(':') {
        Some((name, port)) if port.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => host,
    };
    (!host.is_empty()).then_some(host)
}

fn render_cards(cards: &[HashMap<String, String>]) -> String {
    let mut out = String::from("<div class=\"links\">");
    for card in cards {
        let field = |key: &str| card.get(key).map(String::as_str).unwrap_or_default();
        let strip = |key: &str| field(key).replace(['`', '"'], "");

        let url = strip("url");
        let color = card
            .get("color")
            .map(|c| c.replace(['`', '"'], ""))
            .unwrap_or_else(|| DEFAULT_CARD_COLOR.to_string());
        let mut image = strip("image");
        if image.trim().is_empty() {
            image = favicon(&url);
        }
        let site = field("site");
        let title = Some(field("owner")).filter(|o| !o.is_empty()).unwrap_or(site);
        let desc = Some(field("desc")).filter(|d| !d.is_empty()).unwrap_or(&url);

        out.push_str(&format!(
            "<div class=\"item\" title=\"{}\" style=\"--block-color:{};\">\
             <a href=\"{url_attr}\" class=\"image\" data-background-image=\"{}\"></a>\
             <div class=\"info\"><a href=\"{url_attr}\" target=\"_blank\" class=\"title\">{}</a>\
             <p class=\"desc\">{}</p></div>",
            attr(title),
            attr(&color),
            attr(&image),
            html_escape::encode_text(site),
            html_escape::encode_text(desc),
            url_attr = attr(&url),
        ));

        let ext_url = field("exturl").replace('`', "");
        let ext_info = field("extinfo");
        if !ext_url.is_empty() && !ext_info.is_empty() {
            out.push_str(&format!(
                "<div class=\"extended\"><a href=\"{}\" target=\"_blank\" class=\"title\">{}</a></div>",
                attr(&ext_url),
                html_escape::encode_text(ext_info)
            ));
        }
        out.push_str("</div>");
    }
    out.push_str("</div>");
    out
}

/// Registers the note, link-card, tab and collapse containers.
pub struct Container;

impl Extension for Container {
    fn name(&self) -> &str {
        "container"
    }

    fn register(&self, engine: &mut Engine, _options: &Value) -> Result<(), MultimarkError> {
        let block = engine.block_mut();
        block.push("container_colon", Box::new(colon_container));
        block.push("container_tab", Box::new(tab_container));
        block.push("container_collapse", Box::new(collapse_container));
        Ok(())
    }
}

/// Registers `::: spoiler` blocks.
pub struct Spoiler;

impl Extension for Spoiler {
    fn name(&self) -> &str {
        "spoiler"
    }

    fn register(&self, engine: &mut Engine, _options: &Value) -> Result<(), MultimarkError> {
        engine.block_mut().push("spoiler", Box::new(spoiler_container));
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
        Container.register(&mut engine, &Value::Null).unwrap();
        Spoiler.register(&mut engine, &Value::Null).unwrap();
        engine.render(source).unwrap().html
    }

    #[test]
    fn note_wraps_markdown_body() {
        insta::assert_snapshot!(render("::: warning\nBe *careful*.\n:::\n"), @r#"
        <div class="note warning">
        <p>Be <em>careful</em>.</p>
        </div>
        "#);
    }

    #[test]
    fn unknown_note_style_is_a_paragraph() {
        assert_eq!(render("::: nothing\n:::\n"), "<p>::: nothing<br>\n:::</p>\n");
    }

    #[test]
    fn nested_notes_close_in_order() {
        insta::assert_snapshot!(render("::: info\nouter\n::: danger\ninner\n:::\n:::\n"), @r#"
        <div class="note info">
        <p>outer</p>
        <div class="note danger">
        <p>inner</p>
        </div>
        </div>
        "#);
    }

    #[test]
    fn tabs_carry_id_and_title() {
        insta::assert_snapshot!(render(";;; first Getting started\nbody\n;;;\n"), @r#"
        <div class="tab" data-id="first" data-title="Getting started">
        <p>body</p>
        </div>
        "#);
    }

    #[test]
    fn collapse_style_must_touch_the_markers() {
        insta::assert_snapshot!(render("+++info Details\nx\n+++\n\n+++ info Details\ny\n+++\n"), @r#"
        <details class="info"><summary>Details</summary><div>
        <p>x</p>
        </div></details>
        <details><summary>info Details</summary><div>
        <p>y</p>
        </div></details>
        "#);
    }

    #[test]
    fn spoiler_escapes_summary() {
        insta::assert_snapshot!(render("::: spoiler Who <wins>?\nNobody.\n:::\n"), @r#"
        <details class="spoiler"><summary>Who &lt;wins&gt;?</summary>
        <p>Nobody.</p>
        </details>
        "#);
    }

    #[test]
    fn json_container_renders_link_cards() {
        let html = render(
            "::: json\nblackType: a\nsite: Rust\nurl: https://www.rust-lang.org/learn\n\
             blackType: b\nsite: Docs\nurl: `https://docs.rs`\ndesc: Crate docs\ncolor: red\n\
             exturl: https://docs.rs/about\nextinfo: About\n:::\n",
        );
        insta::assert_snapshot!(html, @r#"<div class="links"><div class="item" title="Rust" style="--block-color:#6AC1EC;"><a href="https://www.rust-lang.org/learn" class="image" data-background-image="https://favicon.run/favicon?domain=www.rust-lang.org&amp;sz=64"></a><div class="info"><a href="https://www.rust-lang.org/learn" target="_blank" class="title">Rust</a><p class="desc">https://www.rust-lang.org/learn</p></div></div><div class="item" title="Docs" style="--block-color:red;"><a href="https://docs.rs" class="image" data-background-image="https://favicon.run/favicon?domain=docs.rs&amp;sz=64"></a><div class="info"><a href="https://docs.rs" target="_blank" class="title">Docs</a><p class="desc">Crate docs</p></div><div class="extended"><a href="https://docs.rs/about" target="_blank" class="title">About</a></div></div></div>"#);
    }

    #[test]
    fn json_container_without_cards_keeps_body() {
        insta::assert_snapshot!(render("::: json\nno pairs here\n:::\n"), @r#"
        <div class="container_json">
        <p>no pairs here</p>
        </div>
        "#);
    }

    #[test]
    fn card_fields_parse_and_split() {
        let cards = parse_cards(&["blackType: x\n", "bad key: no\n", "site: A\n", "blackType: y\n"]);
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].get("site").map(String::as_str), Some("A"));
        assert!(!cards[0].contains_key("bad key"));
    }

    #[test]
    fn hosts_are_extracted_from_urls() {
        assert_eq!(host_of("https://user@example.com:8080/x"), Some("example.com"));
        assert_eq!(host_of("example.com/x"), None);
        assert_eq!(favicon("example.com"), "https://favicon.run/favicon?domain=example.com&sz=64");
    }
}
