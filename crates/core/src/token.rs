//! Token stream shared by inline rules and the token renderers.

use std::collections::HashMap;
use std::fmt;

/// Token type for verbatim markdown source handed on to markdown-rs.
pub const SOURCE: &str = "source";
/// Token type for literal text, HTML-escaped when rendered.
pub const TEXT: &str = "text";
/// Token type for raw HTML emitted unchanged.
pub const HTML_INLINE: &str = "html_inline";

/// A single unit pushed by an inline rule.
///
/// `nesting` follows the usual convention: `1` opens an element, `-1`
/// closes it and `0` is a leaf carrying `content`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Token type (e.g. `ruby_open`, `text`).
    pub kind: String,
    /// HTML tag name, empty for text leaves.
    pub tag: String,
    /// Nesting delta: 1, 0 or -1.
    pub nesting: i8,
    /// Leaf content.
    pub content: String,
}

impl Token {
    /// Creates a token with empty content.
    pub fn new(kind: impl Into<String>, tag: impl Into<String>, nesting: i8) -> Self {
        Self {
            kind: kind.into(),
            tag: tag.into(),
            nesting,
            content: String::new(),
        }
    }

    /// Creates a text leaf.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::new(TEXT, "", 0)
        }
    }

    /// Returns true if this token is untouched markdown source.
    pub fn is_source(&self) -> bool {
        self.kind == SOURCE
    }
}

/// Anything a rule can push tokens into.
pub trait TokenSink {
    /// Appends a token and returns it so the caller can fill in `content`.
    fn push_token(&mut self, kind: &str, tag: &str, nesting: i8) -> &mut Token;
}

impl TokenSink for Vec<Token> {
    fn push_token(&mut self, kind: &str, tag: &str, nesting: i8) -> &mut Token {
        self.push(Token::new(kind, tag, nesting));
        let last = self.len() - 1;
        &mut self[last]
    }
}

type RenderFn = dyn Fn(&Token) -> String + Send + Sync;

/// Per-type HTML renderers for tokens claimed by inline rules.
///
/// Types without a registered renderer use the default rendering: open and
/// close tags from `tag`/`nesting`, escaped `content` for text leaves and
/// verbatim `content` for `html_inline`.
#[derive(Default)]
pub struct TokenRenderers {
    rules: HashMap<String, Box<RenderFn>>,
}

impl TokenRenderers {
    /// Creates an empty renderer table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides rendering for one token type.
    pub fn set<F>(&mut self, kind: impl Into<String>, render: F)
    where
        F: Fn(&Token) -> String + Send + Sync + 'static,
    {
        self.rules.insert(kind.into(), Box::new(render));
    }

    /// Returns true if a custom renderer exists for `kind`.
    pub fn has(&self, kind: &str) -> bool {
        self.rules.contains_key(kind)
    }

    /// Renders a run of claimed tokens to HTML.
    pub fn render(&self, tokens: &[Token]) -> String {
        let mut out = String::new();
        for token in tokens {
            match self.rules.get(&token.kind) {
                Some(render) => out.push_str(&render(token)),
                None => render_default(token, &mut out),
            }
        }
        out
    }
}

impl fmt::Debug for TokenRenderers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRenderers")
            .field("rules", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn render_default(token: &Token, out: &mut String) {
    match token.nesting {
        1 => {
            out.push('<');
            out.push_str(&token.tag);
            out.push('>');
        }
        -1 => {
            out.push_str("</");
            out.push_str(&token.tag);
            out.push('>');
        }
        _ if token.kind == HTML_INLINE => out.push_str(&token.content),
        _ if token.tag.is_empty() => {
            out.push_str(&html_escape::encode_text(&token.content));
        }
        _ => {
            out.push('<');
            out.push_str(&token.tag);
            out.push('>');
            out.push_str(&html_escape::encode_text(&token.content));
            out.push_str("</");
            out.push_str(&token.tag);
            out.push('>');
        }
    }
}
