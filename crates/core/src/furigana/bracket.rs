const OPEN: u8 = b'{';
const DIVIDER: u8 = b'^';
const CLOSE: u8 = b'}';
const ESCAPE: u8 = b'\\';

/// Parts of one `{base^annotation}` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketMatch {
    /// Text between `{` and `^`, with `\^` unescaped.
    pub base: String,
    /// Text between `^` and `}`, with `\}` and `\^` unescaped.
    pub annotation: String,
    /// Offset just past the closing `}`.
    pub resume_offset: usize,
}

/// Parses the bracket notation starting at `start`, scanning no further
/// than `end`.
///
/// The divider is the first `^` not preceded by a backslash; the closing
/// marker is the first such `}` after it. Returns `None` when `src[start]`
/// is not `{` or either marker is missing.
pub fn parse_bracket(src: &str, start: usize, end: usize) -> Option<BracketMatch> {
    let bytes = src.as_bytes();
    let end = end.min(bytes.len());
    if bytes.get(start) != Some(&OPEN) {
        return None;
    }

    let unescaped = |pos: usize, marker: u8| bytes[pos] == marker && bytes[pos - 1] != ESCAPE;

    let divider = (start + 1..end).find(|&pos| unescaped(pos, DIVIDER))?;
    let close = (divider + 1..end).find(|&pos| unescaped(pos, CLOSE))?;

    let base = src[start + 1..divider].replace("\\^", "^");
    let annotation = src[divider + 1..close]
        .replace("\\}", "}")
        .replace("\\^", "^");

    Some(BracketMatch {
        base,
        annotation,
        resume_offset: close + 1,
    })
}
