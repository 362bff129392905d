//! Placeholders for HTML produced ahead of markdown-rs.
//!
//! Rendered fragments are swapped for markers before the source is parsed,
//! then put back into the final HTML. A marker is `U+FDD0`, a kind letter,
//! the fragment index and `U+FDD1`. The noncharacters `U+FDD0..=U+FDEF` are
//! reserved for markers and other render-time placeholders, and
//! [`sanitize`] removes them from user input, so a document can never spell
//! one itself. Nothing else in a marker is touched by markdown or the
//! typographer.

use std::borrow::Cow;

const PREFIX: &str = "\u{fdd0}";
const SUFFIX: &str = "\u{fdd1}";
const INLINE: &str = "i";
const BLOCK: &str = "b";

/// Returns true for the code points reserved for placeholders.
pub fn is_reserved(c: char) -> bool {
    ('\u{fdd0}'..='\u{fdef}').contains(&c)
}

/// Replaces reserved code points in user input with `U+FFFD`.
pub fn sanitize(input: &str) -> Cow<'_, str> {
    if input.chars().any(is_reserved) {
        Cow::Owned(
            input
                .chars()
                .map(|c| if is_reserved(c) { '\u{fffd}' } else { c })
                .collect(),
        )
    } else {
        Cow::Borrowed(input)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MaskKind {
    Inline,
    Block,
}

impl MaskKind {
    fn label(self) -> &'static str {
        match self {
            MaskKind::Inline => INLINE,
            MaskKind::Block => BLOCK,
        }
    }
}

/// Masked HTML fragments of one render.
#[derive(Debug, Clone, Default)]
pub struct MaskTable {
    entries: Vec<(MaskKind, String)>,
}

impl MaskTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores phrasing HTML and returns the marker to put in its place.
    pub fn inline(&mut self, html: impl Into<String>) -> String {
        self.insert(MaskKind::Inline, html.into())
    }

    /// Stores flow HTML and returns the marker to put on its own line.
    ///
    /// On restore, a `<p>` right before the marker and a `</p>` right after
    /// it are dropped, so a marker may also open or close a paragraph's
    /// text.
    pub fn block(&mut self, html: impl Into<String>) -> String {
        self.insert(MaskKind::Block, html.into())
    }

    /// Number of stored fragments.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was masked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, kind: MaskKind, html: String) -> String {
        let marker = format!("{PREFIX}{}{}{SUFFIX}", kind.label(), self.entries.len());
        self.entries.push((kind, html));
        marker
    }

    /// Replaces every marker in `html` with its fragment.
    ///
    /// Markers are restored recursively, so a fragment may itself contain
    /// markers issued earlier. Unknown markers are left as they are.
    pub fn restore(&self, html: &str) -> String {
        if self.entries.is_empty() {
            return html.to_string();
        }
        let mut out = String::with_capacity(html.len());
        self.restore_into(html, &mut out, 0);
        out
    }

    fn restore_into(&self, html: &str, out: &mut String, depth: usize) {
        let mut rest = html;
        while let Some(start) = rest.find(PREFIX) {
            out.push_str(&rest[..start]);
            let after = &rest[start + PREFIX.len()..];
            match self.parse_marker(after) {
                Some((index, consumed)) if depth <= self.entries.len() => {
                    let (kind, fragment) = &self.entries[index];
                    let mut tail = &after[consumed..];
                    if *kind == MaskKind::Block {
                        if out.ends_with("<p>") {
                            out.truncate(out.len() - "<p>".len());
                        }
                        if let Some(stripped) = tail.strip_prefix("</p>") {
                            tail = stripped;
                        }
                    }
                    self.restore_into(fragment, out, depth + 1);
                    rest = tail;
                }
                _ => {
                    out.push_str(PREFIX);
                    rest = after;
                }
            }
        }
        out.push_str(rest);
    }

    /// Parses `{KIND}{n}MARK` and returns the entry index and bytes used.
    fn parse_marker(&self, text: &str) -> Option<(usize, usize)> {
        let (kind, label_len) = if text.starts_with(INLINE) {
            (MaskKind::Inline, INLINE.len())
        } else if text.starts_with(BLOCK) {
            (MaskKind::Block, BLOCK.len())
        } else {
            return None;
        };
        let digits = text[label_len..]
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        if digits == 0 {
            return None;
        }
        let number_end = label_len + digits;
        if !text[number_end..].starts_with(SUFFIX) {
            return None;
        }
        let index: usize = text[label_len..number_end].parse().ok()?;
        match self.entries.get(index) {
            Some((entry_kind, _)) if *entry_kind == kind => Some((index, number_end + SUFFIX.len())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_markers_are_replaced_in_place() {
        let mut masks = MaskTable::new();
        let marker = masks.inline("<ruby>漢<rt>かん</rt></ruby>");
        let html = format!("<p>{marker}です</p>");
        assert_eq!(masks.restore(&html), "<p><ruby>漢<rt>かん</rt></ruby>です</p>");
    }

    #[test]
    fn block_markers_drop_their_paragraph() {
        let mut masks = MaskTable::new();
        let marker = masks.block("<div class=\"note\">");
        let html = format!("<p>{marker}</p>\n<p>body</p>");
        assert_eq!(masks.restore(&html), "<div class=\"note\">\n<p>body</p>");
    }

    #[test]
    fn block_markers_can_wrap_paragraph_text() {
        let mut masks = MaskTable::new();
        let open = masks.block("<dt>");
        let close = masks.block("</dt>");
        let html = format!("<p>{open}Term{close}</p>\n");
        assert_eq!(masks.restore(&html), "<dt>Term</dt>\n");
    }

    #[test]
    fn block_marker_inside_text_keeps_surroundings() {
        let mut masks = MaskTable::new();
        let marker = masks.block("<hr>");
        let html = format!("<li>{marker}</li>");
        assert_eq!(masks.restore(&html), "<li><hr></li>");
    }

    #[test]
    fn nested_fragments_are_restored() {
        let mut masks = MaskTable::new();
        let inner = masks.inline("<b>x</b>");
        let outer = masks.inline(format!("<i>{inner}</i>"));
        assert_eq!(masks.restore(&outer), "<i><b>x</b></i>");
    }

    #[test]
    fn unknown_markers_are_left_alone() {
        let masks = {
            let mut masks = MaskTable::new();
            masks.inline("x");
            masks
        };
        let html = "\u{fdd0}i7\u{fdd1} \u{fdd0}b0\u{fdd1} \u{fdd0}";
        assert_eq!(masks.restore(html), html);
    }

    #[test]
    fn marker_lookalike_text_is_kept() {
        let mut masks = MaskTable::new();
        let marker = masks.inline("<b>x</b>");
        let html = format!("{marker} MULTIMARKINLINE0MARK i0");
        assert_eq!(masks.restore(&html), "<b>x</b> MULTIMARKINLINE0MARK i0");
    }

    #[test]
    fn sanitize_removes_delimiters() {
        assert!(matches!(sanitize("plain"), Cow::Borrowed("plain")));
        assert_eq!(sanitize("a\u{fdd0}i0\u{fdd1}\u{fdef}"), "a\u{fffd}i0\u{fffd}\u{fffd}");
        assert!(!is_reserved('\u{fdf0}'));
    }
}
