//! Heading anchors and the table of contents.

use multimark_core::{BlockClaim, MultimarkError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Extension, parse_options};
use crate::engine::Engine;
use crate::html::HeadingEntry;

/// Placeholder left by the `toc` block rule until headings are known.
pub const TOC_PLACEHOLDER: &str = "<!-- multimark:toc -->";

static TOC_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^ {0,3}(?:\$\{toc\}|\[\[toc\]\]|@\[toc\])[ \t]*\r?\n?$").expect("static regex")
});

/// Heading id options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnchorOptions {
    /// Smallest heading depth that gets an id.
    pub level: u8,
    /// Add a self link to each heading.
    pub permalink: bool,
    /// Class of the self link.
    pub permalink_class: String,
    /// Text of the self link.
    pub permalink_symbol: String,
    /// Put the self link before the heading text.
    pub permalink_before: bool,
}

impl Default for AnchorOptions {
    fn default() -> Self {
        Self {
            level: 1,
            permalink: false,
            permalink_class: "header-anchor".to_string(),
            permalink_symbol: "\u{b6}".to_string(),
            permalink_before: false,
        }
    }
}

impl AnchorOptions {
    /// Self link markup for `slug`.
    pub fn permalink_html(&self, slug: &str) -> String {
        format!(
            "<a class=\"{}\" href=\"#{}\" aria-hidden=\"true\">{}</a>",
            html_escape::encode_double_quoted_attribute(&self.permalink_class),
            html_escape::encode_double_quoted_attribute(slug),
            self.permalink_symbol
        )
    }
}

/// Table of contents options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TocOptions {
    /// Class of the `<nav>` wrapper.
    pub class_name: String,
    /// Shallowest heading depth listed.
    pub first_level: u8,
    /// Deepest heading depth listed.
    pub last_level: u8,
}

impl Default for TocOptions {
    fn default() -> Self {
        Self {
            class_name: "table-of-contents".to_string(),
            first_level: 1,
            last_level: 6,
        }
    }
}

/// Claims a `[[toc]]`, `${toc}` or `@[toc]` line standing as its own
/// paragraph.
fn toc_rule(lines: &[&str], start: usize) -> Option<BlockClaim> {
    let standalone = start == 0 || lines[start - 1].trim().is_empty();
    if !standalone || !TOC_LINE.is_match(lines[start]) {
        return None;
    }
    Some(BlockClaim::Html {
        html: TOC_PLACEHOLDER.to_string(),
        end: start + 1,
    })
}

/// Nested `<ol>` list of `headings` within the configured depths.
pub fn toc_html(headings: &[HeadingEntry], options: &TocOptions) -> String {
    let mut out = format!(
        "<nav class=\"{}\">",
        html_escape::encode_double_quoted_attribute(&options.class_name)
    );
    let mut open: Vec<u8> = Vec::new();

    for heading in headings
        .iter()
        .filter(|h| (options.first_level..=options.last_level).contains(&h.depth))
    {
        match open.last() {
            Some(&depth) if heading.depth > depth => {
                out.push_str("<ol>");
                open.push(heading.depth);
            }
            Some(_) => {
                out.push_str("</li>");
                while open.len() > 1 && open.last().is_some_and(|&depth| heading.depth < depth) {
                    out.push_str("</ol></li>");
                    open.pop();
                }
            }
            None => {
                out.push_str("<ol>");
                open.push(heading.depth);
            }
        }
        out.push_str("<li><a href=\"#");
        out.push_str(&html_escape::encode_double_quoted_attribute(&heading.slug));
        out.push_str("\">");
        out.push_str(&html_escape::encode_text(&heading.text));
        out.push_str("</a>");
    }

    while open.pop().is_some() {
        out.push_str("</li></ol>");
    }
    out.push_str("</nav>");
    out
}

/// Replaces every placeholder in `html` with the table of contents.
pub fn replace_toc(html: &str, headings: &[HeadingEntry], options: &TocOptions) -> String {
    if !html.contains(TOC_PLACEHOLDER) {
        return html.to_string();
    }
    html.replace(TOC_PLACEHOLDER, &toc_html(headings, options))
}

/// Registers heading ids.
pub struct Anchor;

impl Extension for Anchor {
    fn name(&self) -> &str {
        "anchor"
    }

    fn register(&self, engine: &mut Engine, options: &Value) -> Result<(), MultimarkError> {
        engine.set_heading_anchors(parse_options(self.name(), options)?);
        Ok(())
    }
}

/// Registers the table of contents placeholder.
pub struct Toc;

impl Extension for Toc {
    fn name(&self) -> &str {
        "toc"
    }

    fn register(&self, engine: &mut Engine, options: &Value) -> Result<(), MultimarkError> {
        let options: TocOptions = parse_options(self.name(), options)?;
        engine.block_mut().push("toc", Box::new(toc_rule));
        engine.enable_toc(options);
        Ok(())
    }
}
