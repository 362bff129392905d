#![deny(missing_docs)]
//! multimark core: the furigana alignment engine, the rule capabilities it
//! is driven through, and the masking pre-pass that runs them ahead of
//! markdown-rs.

/// Block rule capability and `:::`-style container scanning.
pub mod block;
/// Fenced code tracking.
pub mod code_fence;
/// Core error types.
pub mod error;
/// `{base^annotation}` ruby alignment.
pub mod furigana;
/// Inline rule capability and built-in pass-through rules.
pub mod inline;
/// Marker table for HTML produced before parsing.
pub mod mask;
/// markdown-rs parse options.
pub mod parse;
/// Block and inline pre-pass.
pub mod prepass;
/// Ordered, named rule chains.
pub mod ruler;
/// Heading slugs.
pub mod slug;
/// Tokens and token renderers.
pub mod token;

pub use block::{BlockClaim, BlockRule, BlockRuler, ClaimPart, ContainerSpan, find_container};
pub use code_fence::FenceTracker;
pub use error::{MultimarkError, RulerKind, SourceLocation};
pub use furigana::{AlignedSegment, FuriganaOptions, FuriganaRule, match_furigana};
pub use inline::{InlineRule, InlineRuler, InlineState};
pub use mask::MaskTable;
pub use parse::{ParseOptions, parse_mdast, parse_mdast_with_options};
pub use prepass::{Prepared, Prepass};
pub use ruler::Ruler;
pub use slug::{Slugger, slugify};
pub use token::{Token, TokenRenderers, TokenSink};
