//! Rendering state for one document.

use std::collections::HashMap;

use markdown::mdast::Node;
use multimark_core::{MaskTable, Slugger};

use super::{HeadingEntry, RenderedBody, Scope};
use crate::config::RenderOptions;
use crate::engine::Engine;
use crate::extensions::attrs;

/// Link reference definition target.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LinkTarget<'a> {
    pub url: &'a str,
    pub title: Option<&'a str>,
}

/// Output buffer plus everything the renderer tracks across nodes.
pub(crate) struct Context<'a> {
    engine: &'a Engine,
    masks: &'a MaskTable,
    html: String,
    stack: Vec<Scope>,
    slugger: Slugger,
    headings: Vec<HeadingEntry>,
    definitions: HashMap<&'a str, LinkTarget<'a>>,
    footnote_bodies: HashMap<&'a str, &'a [Node]>,
    /// Footnote identifiers in order of first reference.
    footnote_order: Vec<String>,
    footnote_refs: HashMap<String, usize>,
    fences: usize,
    tasks: usize,
}

impl<'a> Context<'a> {
    /// Creates a context, collecting definitions from `tree` up front so
    /// references may precede them.
    pub fn new(engine: &'a Engine, masks: &'a MaskTable, tree: &'a Node) -> Self {
        let mut ctx = Self {
            engine,
            masks,
            html: String::with_capacity(4096),
            stack: Vec::new(),
            slugger: Slugger::new(),
            headings: Vec::new(),
            definitions: HashMap::new(),
            footnote_bodies: HashMap::new(),
            footnote_order: Vec::new(),
            footnote_refs: HashMap::new(),
            fences: 0,
            tasks: 0,
        };
        ctx.collect_definitions(tree);
        ctx
    }

    fn collect_definitions(&mut self, node: &'a Node) {
        match node {
            Node::Definition(def) => {
                self.definitions.entry(def.identifier.as_str()).or_insert(LinkTarget {
                    url: &def.url,
                    title: def.title.as_deref(),
                });
            }
            Node::FootnoteDefinition(def) => {
                self.footnote_bodies
                    .entry(def.identifier.as_str())
                    .or_insert(def.children.as_slice());
            }
            _ => {}
        }
        if let Some(children) = node.children() {
            for child in children {
                self.collect_definitions(child);
            }
        }
    }

    pub fn engine(&self) -> &'a Engine {
        self.engine
    }

    pub fn options(&self) -> &'a RenderOptions {
        self.engine.options()
    }

    /// Writes HTML unchanged.
    pub fn push_raw(&mut self, s: &str) {
        self.html.push_str(s);
    }

    /// Writes escaped text.
    pub fn push_text(&mut self, s: &str) {
        self.html.push_str(&html_escape::encode_text(s));
    }

    /// Writes an escaped attribute value.
    pub fn push_attr_value(&mut self, s: &str) {
        self.html
            .push_str(&html_escape::encode_double_quoted_attribute(s));
    }

    /// Writes a void element, e.g. `push_void("<br")`.
    pub fn push_void(&mut self, open: &str) {
        self.html.push_str(open);
        self.html.push_str(if self.options().xhtml_out { " />" } else { ">" });
    }

    pub fn ends_with_newline(&self) -> bool {
        self.html.is_empty() || self.html.ends_with('\n')
    }

    pub fn enter(&mut self, scope: Scope) {
        self.stack.push(scope);
    }

    pub fn exit(&mut self) -> Option<Scope> {
        self.stack.pop()
    }

    /// True when paragraphs render without `<p>`: the closest list or
    /// block container is a tight list.
    pub fn is_in_tight_list(&self) -> bool {
        self.stack
            .iter()
            .rev()
            .find(|scope| {
                matches!(
                    scope,
                    Scope::List { .. } | Scope::Blockquote | Scope::FootnoteDefinition
                )
            })
            .is_some_and(|scope| matches!(scope, Scope::List { tight: true }))
    }

    /// True inside phrasing content, where raw HTML is inline.
    pub fn is_in_phrasing(&self) -> bool {
        matches!(
            self.stack.last(),
            Some(Scope::Paragraph | Scope::Heading | Scope::TableCell)
        )
    }

    /// Renders into a fresh buffer and returns what was written.
    pub fn capture(&mut self, render: impl FnOnce(&mut Self)) -> String {
        let saved = std::mem::take(&mut self.html);
        render(self);
        std::mem::replace(&mut self.html, saved)
    }

    /// Plain text of a heading: markers restored, tags stripped, entities
    /// decoded.
    pub fn plain_text(&self, raw: &str) -> String {
        let restored = attrs::strip_placeholders(&self.masks.restore(&html_escape::encode_text(raw)));
        let mut text = String::with_capacity(restored.len());
        let mut in_tag = false;
        for ch in restored.chars() {
            match ch {
                '<' => in_tag = true,
                '>' if in_tag => in_tag = false,
                _ if !in_tag => text.push(ch),
                _ => {}
            }
        }
        html_escape::decode_html_entities(text.trim()).into_owned()
    }

    /// The `#id` of an attribute list ending a heading, if any.
    pub fn attrs_id(&self, raw: &str) -> Option<String> {
        attrs::trailing_id(&self.masks.restore(&html_escape::encode_text(raw)))
    }

    pub fn next_slug(&mut self, text: &str) -> String {
        self.slugger.slug(text)
    }

    pub fn add_heading(&mut self, entry: HeadingEntry) {
        self.headings.push(entry);
    }

    pub fn definition(&self, identifier: &str) -> Option<LinkTarget<'a>> {
        self.definitions.get(identifier).copied()
    }

    /// Records a reference to footnote `identifier`.
    ///
    /// Returns the footnote number (1-based, by first reference) and how
    /// many times it was referenced before.
    pub fn footnote_reference(&mut self, identifier: &str) -> (usize, usize) {
        let number = match self.footnote_order.iter().position(|id| id == identifier) {
            Some(index) => index + 1,
            None => {
                self.footnote_order.push(identifier.to_string());
                self.footnote_order.len()
            }
        };
        let count = self.footnote_refs.entry(identifier.to_string()).or_insert(0);
        let previous = *count;
        *count += 1;
        (number, previous)
    }

    /// Footnotes to list: identifier, body and reference count, in
    /// reference order. References rendered while listing are included.
    pub fn footnote(&self, index: usize) -> Option<(String, &'a [Node], usize)> {
        let identifier = self.footnote_order.get(index)?;
        let body = self.footnote_bodies.get(identifier.as_str()).copied().unwrap_or(&[]);
        let refs = self.footnote_refs.get(identifier).copied().unwrap_or(0);
        Some((identifier.clone(), body, refs))
    }

    pub fn has_footnotes(&self) -> bool {
        !self.footnote_order.is_empty()
    }

    pub fn next_fence_ordinal(&mut self) -> usize {
        let ordinal = self.fences;
        self.fences += 1;
        ordinal
    }

    pub fn next_task_id(&mut self) -> usize {
        let id = self.tasks;
        self.tasks += 1;
        id
    }

    pub fn finish(self) -> RenderedBody {
        RenderedBody {
            html: self.html,
            headings: self.headings,
        }
    }
}
