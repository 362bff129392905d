use crate::token::{TEXT, TokenSink};

use super::matcher::AlignedSegment;

/// Pushes ruby markup for each segment, followed by the parenthesised raw
/// annotation when `fallback_parens` is set.
///
/// Missing parenthesis characters default to `(` and `)`.
pub fn emit_segments<S: TokenSink + ?Sized>(
    sink: &mut S,
    segments: &[AlignedSegment],
    fallback_parens: Option<&str>,
    raw_annotation: &str,
) {
    for segment in segments {
        sink.push_token("ruby_open", "ruby", 1);
        sink.push_token("ruby_base_open", "rb", 1);
        sink.push_token(TEXT, "", 0).content = segment.base.clone();
        sink.push_token("ruby_base_close", "rb", -1);
        sink.push_token("ruby_text_open", "rt", 1);
        sink.push_token(TEXT, "", 0).content = segment.annotation.clone();
        sink.push_token("ruby_text_close", "rt", -1);
        sink.push_token("ruby_close", "ruby", -1);
    }

    if let Some(parens) = fallback_parens {
        let mut chars = parens.chars();
        let open = chars.next().unwrap_or('(');
        let close = chars.next().unwrap_or(')');
        sink.push_token(TEXT, "", 0).content = open.to_string();
        sink.push_token(TEXT, "", 0).content = raw_annotation.to_string();
        sink.push_token(TEXT, "", 0).content = close.to_string();
    }
}
