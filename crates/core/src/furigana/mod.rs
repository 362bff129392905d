//! Furigana: `{漢字^かんじ}` to `<ruby>` markup.
//!
//! The base run is turned into an anchored pattern ([`AlignmentPattern`])
//! and matched against the annotation. Separators (`・`) split readings
//! between base characters; combinators (`+`) tie readings together while
//! still emitting one `<ruby>` per base character. When the annotation
//! does not fit the base, the whole run gets a single `<ruby>`.
//!
//! ```
//! use multimark_core::furigana::{FuriganaOptions, match_furigana};
//!
//! let segments = match_furigana("可愛い犬", "か・わい・い・いぬ", &FuriganaOptions::default());
//! assert_eq!(segments.len(), 4);
//! assert_eq!(segments[1].annotation, "わい");
//! ```

mod bracket;
mod emit;
mod fallback;
mod matcher;
mod pattern;
mod script;

use serde::{Deserialize, Serialize};

use crate::error::MultimarkError;
use crate::inline::{InlineRule, InlineRuler, InlineState};

pub use bracket::{BracketMatch, parse_bracket};
pub use emit::emit_segments;
pub use fallback::rubify_every_character;
pub use matcher::{AlignedSegment, clean_annotation, match_furigana};
pub use pattern::AlignmentPattern;
pub use script::ScriptClass;

/// Canonical separator marker.
pub const SEPARATOR: char = '・';
/// Canonical combinator marker.
pub const COMBINATOR: char = '+';

/// Rule name used in the inline chain.
pub const RULE_NAME: &str = "furigana";

/// Furigana rule options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FuriganaOptions {
    /// Two characters wrapping a plain-text copy of the reading after the
    /// ruby markup, e.g. `"()"`. Empty or absent disables it.
    pub fallback_parens: Option<String>,
    /// Characters treated as separators in addition to `・`.
    pub extra_separators: String,
    /// Characters treated as combinators in addition to `+`.
    pub extra_combinators: String,
}

impl FuriganaOptions {
    fn parens(&self) -> Option<&str> {
        self.fallback_parens.as_deref().filter(|p| !p.is_empty())
    }
}

/// Inline rule recognising `{base^annotation}`.
#[derive(Debug, Clone, Default)]
pub struct FuriganaRule {
    options: FuriganaOptions,
}

impl FuriganaRule {
    /// Creates the rule.
    pub fn new(options: FuriganaOptions) -> Self {
        Self { options }
    }

    /// Options in use.
    pub fn options(&self) -> &FuriganaOptions {
        &self.options
    }
}

impl InlineRule for FuriganaRule {
    fn apply(&self, state: &mut InlineState<'_>) -> bool {
        let Some(found) = parse_bracket(state.src(), state.pos, state.pos_max()) else {
            return false;
        };
        let segments = match_furigana(&found.base, &found.annotation, &self.options);
        emit_segments(state, &segments, self.options.parens(), &found.annotation);
        state.pos = found.resume_offset;
        true
    }
}

/// Registers the furigana rule immediately before `emphasis`.
pub fn register(ruler: &mut InlineRuler, options: FuriganaOptions) -> Result<(), MultimarkError> {
    ruler.before("emphasis", RULE_NAME, Box::new(FuriganaRule::new(options)))
}
