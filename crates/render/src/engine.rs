//! The rendering engine extensions register against.
//!
//! An [`Engine`] owns the pre-pass rule chains, the markdown-rs parse
//! options, the fence renderers and the HTML passes. Extensions mutate it
//! while the renderer is built; after that it is only read.

use multimark_core::{
    BlockRuler, InlineRuler, MultimarkError, ParseOptions, Prepass, TokenRenderers, parse_mdast,
};
use serde::Serialize;

use crate::config::RenderOptions;
use crate::extensions::anchor::{self, AnchorOptions, TocOptions};
use crate::html::{self, HeadingEntry};
use crate::typographer;

/// A fenced code block handed to fence renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FenceBlock<'a> {
    /// First word of the info string.
    pub lang: &'a str,
    /// Full info string.
    pub info: &'a str,
    /// Code without the trailing newline.
    pub code: &'a str,
    /// Zero-based index of this fence in the document.
    pub ordinal: usize,
}

/// Renders fenced code blocks it recognises.
pub trait FenceRenderer: Send + Sync {
    /// Returns HTML for `fence`, or `None` to let the next renderer try.
    fn render(&self, fence: &FenceBlock<'_>) -> Option<String>;
}

impl<F> FenceRenderer for F
where
    F: Fn(&FenceBlock<'_>) -> Option<String> + Send + Sync,
{
    fn render(&self, fence: &FenceBlock<'_>) -> Option<String> {
        (self)(fence)
    }
}

/// When an [`HtmlPass`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassStage {
    /// Before masks are restored: fragments claimed by inline and block
    /// rules are still markers.
    Masked,
    /// After masks are restored, before the table of contents is inserted.
    Restored,
}

/// Rewrites rendered HTML.
pub trait HtmlPass: Send + Sync {
    /// Returns the new HTML. `source` is the markdown being rendered.
    fn apply(&self, source: &str, html: String) -> String;
}

impl<F> HtmlPass for F
where
    F: Fn(&str, String) -> String + Send + Sync,
{
    fn apply(&self, source: &str, html: String) -> String {
        (self)(source, html)
    }
}

/// A rendered document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedDocument {
    /// HTML output.
    pub html: String,
    /// Headings in document order.
    pub headings: Vec<HeadingEntry>,
}

/// Rule chains, parse options and renderers for one configuration.
pub struct Engine {
    options: RenderOptions,
    parse: ParseOptions,
    prepass: Prepass,
    fences: Vec<(String, Box<dyn FenceRenderer>)>,
    passes: Vec<(String, PassStage, Box<dyn HtmlPass>)>,
    anchors: Option<AnchorOptions>,
    toc: Option<TocOptions>,
}

impl Engine {
    /// Creates an engine with no extensions registered.
    pub fn new(options: RenderOptions) -> Self {
        let parse = ParseOptions {
            raw_html: options.html,
            autolink_literal: options.linkify,
            ..ParseOptions::commonmark()
        };
        let prepass = Prepass {
            html_blocks: options.html,
            ..Prepass::new()
        };
        Self {
            options,
            parse,
            prepass,
            fences: Vec::new(),
            passes: Vec::new(),
            anchors: None,
            toc: None,
        }
    }

    /// Rendering switches.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Inline rule chain of the pre-pass.
    pub fn inline_mut(&mut self) -> &mut InlineRuler {
        &mut self.prepass.inline
    }

    /// Block rule chain of the pre-pass.
    pub fn block_mut(&mut self) -> &mut BlockRuler {
        &mut self.prepass.block
    }

    /// Renderers for tokens pushed by inline rules.
    pub fn tokens_mut(&mut self) -> &mut TokenRenderers {
        &mut self.prepass.tokens
    }

    /// markdown-rs construct switches.
    pub fn parse_options(&self) -> &ParseOptions {
        &self.parse
    }

    /// Mutable markdown-rs construct switches.
    pub fn parse_options_mut(&mut self) -> &mut ParseOptions {
        &mut self.parse
    }

    /// Adds a fence renderer. Later renderers are tried first.
    pub fn add_fence_renderer(&mut self, name: impl Into<String>, renderer: Box<dyn FenceRenderer>) {
        self.fences.push((name.into(), renderer));
    }

    /// Names of the registered fence renderers, in registration order.
    pub fn fence_renderers(&self) -> impl Iterator<Item = &str> {
        self.fences.iter().map(|(name, _)| name.as_str())
    }

    /// Adds an HTML pass. Passes of one stage run in registration order.
    pub fn add_html_pass(&mut self, name: impl Into<String>, stage: PassStage, pass: Box<dyn HtmlPass>) {
        self.passes.push((name.into(), stage, pass));
    }

    fn run_passes(&self, stage: PassStage, source: &str, html: String) -> String {
        self.passes
            .iter()
            .filter(|(_, pass_stage, _)| *pass_stage == stage)
            .fold(html, |html, (_, _, pass)| pass.apply(source, html))
    }

    /// Turns on heading ids.
    pub fn set_heading_anchors(&mut self, options: AnchorOptions) {
        self.anchors = Some(options);
    }

    /// Heading id options, if anchors are on.
    pub fn heading_anchors(&self) -> Option<&AnchorOptions> {
        self.anchors.as_ref()
    }

    /// Turns on table of contents placeholders. Heading ids are switched on
    /// with default options if nothing enabled them yet.
    pub fn enable_toc(&mut self, options: TocOptions) {
        if self.anchors.is_none() {
            self.anchors = Some(AnchorOptions::default());
        }
        self.toc = Some(options);
    }

    /// Renders a fenced code block with the first renderer that accepts it.
    pub fn render_fence(&self, fence: &FenceBlock<'_>) -> String {
        for (name, renderer) in self.fences.iter().rev() {
            if let Some(html) = renderer.render(fence) {
                log::trace!("fence {} rendered by {name}", fence.ordinal);
                return html;
            }
        }
        default_fence(fence)
    }

    /// Renders `markdown` to HTML.
    pub fn render(&self, markdown: &str) -> Result<RenderedDocument, MultimarkError> {
        let prepared = self.prepass.run(markdown);
        log::debug!("pre-pass masked {} fragments", prepared.masks.len());

        let tree = parse_mdast(&prepared.source, &self.parse)?;
        let body = html::render_tree(&tree, self, &prepared.masks);

        let mut out = if self.options.typographer {
            typographer::apply(&body.html, &self.options.quotes)
        } else {
            body.html
        };
        out = self.run_passes(PassStage::Masked, markdown, out);
        out = prepared.masks.restore(&out);
        out = self.run_passes(PassStage::Restored, markdown, out);
        if let Some(toc) = &self.toc {
            out = anchor::replace_toc(&out, &body.headings, toc);
        }

        Ok(RenderedDocument {
            html: out,
            headings: body.headings,
        })
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("options", &self.options)
            .field("parse", &self.parse)
            .field("inline", &self.prepass.inline.names().collect::<Vec<_>>())
            .field("block", &self.prepass.block.names().collect::<Vec<_>>())
            .field("fences", &self.fence_renderers().collect::<Vec<_>>())
            .field("passes", &self.passes.iter().map(|(name, ..)| name).collect::<Vec<_>>())
            .field("anchors", &self.anchors)
            .field("toc", &self.toc)
            .finish()
    }
}

fn default_fence(fence: &FenceBlock<'_>) -> String {
    let mut out = String::from("<pre><code");
    if !fence.lang.is_empty() {
        out.push_str(" class=\"language-");
        out.push_str(&html_escape::encode_double_quoted_attribute(fence.lang));
        out.push('"');
    }
    out.push('>');
    out.push_str(&html_escape::encode_text(fence.code));
    if !fence.code.is_empty() {
        out.push('\n');
    }
    out.push_str("</code></pre>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_options_seed_parse_options() {
        let engine = Engine::new(RenderOptions {
            html: false,
            linkify: false,
            ..RenderOptions::default()
        });
        assert!(!engine.parse_options().raw_html);
        assert!(!engine.parse_options().autolink_literal);
    }

    #[test]
    fn html_passes_run_around_restore() {
        let mut engine = Engine::new(RenderOptions::default());
        engine.add_html_pass(
            "restored",
            PassStage::Restored,
            Box::new(|_: &str, html: String| html.replace("<p>", "<p class=\"x\">")),
        );
        engine.add_html_pass(
            "masked",
            PassStage::Masked,
            Box::new(|source: &str, html: String| format!("{html}<!-- {} -->", source.len())),
        );
        assert_eq!(engine.render("a\n").unwrap().html, "<p class=\"x\">a</p>\n<!-- 2 -->");
    }

    #[test]
    fn later_fence_renderers_win() {
        let mut engine = Engine::new(RenderOptions::default());
        engine.add_fence_renderer("first", Box::new(|_: &FenceBlock<'_>| Some("first".to_string())));
        engine.add_fence_renderer("second", Box::new(|fence: &FenceBlock<'_>| {
            (fence.lang == "x").then(|| "second".to_string())
        }));

        let block = |lang| FenceBlock {
            lang,
            info: lang,
            code: "",
            ordinal: 0,
        };
        assert_eq!(engine.render_fence(&block("x")), "second");
        assert_eq!(engine.render_fence(&block("y")), "first");
    }

    #[test]
    fn default_fence_escapes_code() {
        let html = default_fence(&FenceBlock {
            lang: "html",
            info: "html",
            code: "<b>",
            ordinal: 0,
        });
        assert_eq!(html, "<pre><code class=\"language-html\">&lt;b&gt;\n</code></pre>\n");
    }

    #[test]
    fn toc_turns_on_anchors() {
        let mut engine = Engine::new(RenderOptions::default());
        assert!(engine.heading_anchors().is_none());
        engine.enable_toc(TocOptions::default());
        assert!(engine.heading_anchors().is_some());
    }

    #[test]
    fn plain_render() {
        let engine = Engine::new(RenderOptions::default());
        let doc = engine.render("# Title\n\nSome *text*.\n").unwrap();
        assert_eq!(doc.html, "<h1>Title</h1>\n<p>Some <em>text</em>.</p>\n");
        assert_eq!(doc.headings.len(), 1);
    }
}
