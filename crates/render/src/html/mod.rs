//! MDAST to HTML.

mod context;
mod render;
mod text;

use markdown::mdast::Node;
use multimark_core::MaskTable;
use serde::Serialize;

use crate::engine::Engine;

pub(crate) use context::Context;
pub(crate) use text::map_text;

/// Heading metadata collected while rendering.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct HeadingEntry {
    /// Heading depth (1-6).
    pub depth: u8,
    /// Slug, unique within the document.
    pub slug: String,
    /// Visible heading text.
    pub text: String,
}

/// Rendered body before masks are restored.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RenderedBody {
    pub html: String,
    pub headings: Vec<HeadingEntry>,
}

/// Element the renderer is currently inside of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scope {
    Paragraph,
    Heading,
    List { tight: bool },
    Blockquote,
    FootnoteDefinition,
    TableCell,
}

/// Renders a parsed tree. Markers from `masks` stay in the output.
pub(crate) fn render_tree(tree: &Node, engine: &Engine, masks: &MaskTable) -> RenderedBody {
    let mut ctx = Context::new(engine, masks, tree);
    render::render_node(tree, &mut ctx);
    render::render_footnote_section(&mut ctx);
    ctx.finish()
}
