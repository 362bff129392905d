//! markdown-rs parse options and the MDAST entry point.

use markdown::mdast::Node;
use markdown::message::{Message, Place};

use crate::error::{MultimarkError, SourceLocation};

/// Feature switches mapped onto markdown-rs constructs.
///
/// Extensions flip these while they register. Math is not listed: `$`
/// syntax is claimed by the pre-pass before markdown-rs sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    /// GFM autolink literals (`www.example.com`, bare URLs).
    pub autolink_literal: bool,
    /// GFM footnote definitions and references.
    pub footnotes: bool,
    /// GFM strikethrough.
    pub strikethrough: bool,
    /// Whether a single `~` also strikes through.
    pub single_tilde: bool,
    /// GFM tables.
    pub tables: bool,
    /// GFM task list items.
    pub task_lists: bool,
    /// Raw HTML (flow and text) kept as HTML nodes.
    pub raw_html: bool,
    /// Indented code blocks.
    pub code_indented: bool,
}

impl ParseOptions {
    /// Plain CommonMark with raw HTML.
    pub const fn commonmark() -> Self {
        Self {
            autolink_literal: false,
            footnotes: false,
            strikethrough: false,
            single_tilde: true,
            tables: false,
            task_lists: false,
            raw_html: true,
            code_indented: true,
        }
    }

    /// Every GFM construct switched on.
    pub const fn gfm() -> Self {
        Self {
            autolink_literal: true,
            footnotes: true,
            strikethrough: true,
            tables: true,
            task_lists: true,
            ..Self::commonmark()
        }
    }

    /// Converts to markdown-rs `ParseOptions`.
    pub fn to_markdown(self) -> markdown::ParseOptions {
        let constructs = markdown::Constructs {
            code_indented: self.code_indented,
            html_flow: self.raw_html,
            html_text: self.raw_html,
            gfm_autolink_literal: self.autolink_literal,
            gfm_footnote_definition: self.footnotes,
            gfm_label_start_footnote: self.footnotes,
            gfm_strikethrough: self.strikethrough,
            gfm_table: self.tables,
            gfm_task_list_item: self.task_lists,
            ..markdown::Constructs::default()
        };

        markdown::ParseOptions {
            constructs,
            gfm_strikethrough_single_tilde: self.single_tilde,
            ..markdown::ParseOptions::default()
        }
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::commonmark()
    }
}

/// Parses markdown into an MDAST tree.
pub fn parse_mdast(input: &str, options: &ParseOptions) -> Result<Node, MultimarkError> {
    parse_mdast_with_options(input, &options.to_markdown())
}

/// Parses markdown into an MDAST tree using markdown-rs options directly.
pub fn parse_mdast_with_options(
    input: &str,
    options: &markdown::ParseOptions,
) -> Result<Node, MultimarkError> {
    markdown::to_mdast(input, options).map_err(|err| MultimarkError::MarkdownAdapter {
        message: err.to_string(),
        location: message_location(&err),
    })
}

fn message_location(message: &Message) -> SourceLocation {
    match message.place.as_deref() {
        Some(Place::Point(point)) => SourceLocation::new(point.line, point.column),
        Some(Place::Position(position)) => {
            SourceLocation::new(position.start.line, position.start.column)
        }
        None => SourceLocation::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gfm_switches_map_to_constructs() {
        let options = ParseOptions {
            single_tilde: false,
            ..ParseOptions::gfm()
        }
        .to_markdown();
        assert!(options.constructs.gfm_table);
        assert!(options.constructs.gfm_footnote_definition);
        assert!(options.constructs.gfm_label_start_footnote);
        assert!(!options.constructs.math_text);
        assert!(!options.gfm_strikethrough_single_tilde);
    }

    #[test]
    fn raw_html_can_be_disabled() {
        let options = ParseOptions {
            raw_html: false,
            ..ParseOptions::default()
        };
        let root = parse_mdast("<div>\nx\n</div>\n", &options).unwrap();
        let Node::Root(root) = root else {
            panic!("expected root");
        };
        assert!(matches!(root.children[0], Node::Paragraph(_)));
    }

    #[test]
    fn tables_need_the_switch() {
        let src = "| a |\n| - |\n| b |\n";
        let plain = parse_mdast(src, &ParseOptions::commonmark()).unwrap();
        let gfm = parse_mdast(src, &ParseOptions::gfm()).unwrap();
        let first = |node: &Node| node.children().and_then(|c| c.first().cloned());
        assert!(matches!(first(&plain), Some(Node::Paragraph(_))));
        assert!(matches!(first(&gfm), Some(Node::Table(_))));
    }
}
