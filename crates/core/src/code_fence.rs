//! Fenced code tracking for the line-oriented pre-pass.
//!
//! The pre-pass must hand fenced code to markdown-rs untouched, so it only
//! needs to know, line by line, whether a line opens, continues or closes a
//! fence. Indentation rules follow CommonMark: openers and closers may be
//! indented by at most three columns.

/// Open fence (marker character and run length).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenFence {
    /// Fence marker character (`` ` `` or `~`).
    pub marker: char,
    /// Length of the opening run.
    pub length: usize,
}

/// Line-by-line fence tracker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FenceTracker {
    open: Option<OpenFence>,
}

impl FenceTracker {
    /// Creates a tracker outside any fence.
    pub fn new() -> Self {
        Self::default()
    }

    /// The fence currently open, if any.
    pub fn open_fence(&self) -> Option<OpenFence> {
        self.open
    }

    /// Returns true while inside a fence.
    pub fn is_inside(&self) -> bool {
        self.open.is_some()
    }

    /// Feeds one line; returns true if the line is part of a fence
    /// (opener, body or closer).
    pub fn observe(&mut self, line: &str) -> bool {
        let (columns, bytes) = leading_whitespace(line);
        let after_indent = line[bytes..].trim_end_matches(['\n', '\r']);

        match self.open {
            None => {
                if columns > 3 {
                    return false;
                }
                match marker_run(after_indent) {
                    Some((marker, length)) if opener_info_ok(marker, &after_indent[length..]) => {
                        self.open = Some(OpenFence { marker, length });
                        true
                    }
                    _ => false,
                }
            }
            Some(open) => {
                if columns <= 3
                    && let Some((marker, length)) = marker_run(after_indent)
                    && marker == open.marker
                    && length >= open.length
                    && after_indent[length..].trim().is_empty()
                {
                    self.open = None;
                }
                true
            }
        }
    }
}

/// Returns (visual columns, byte offset) of leading whitespace.
/// Tabs advance to the next multiple of four columns.
fn leading_whitespace(line: &str) -> (usize, usize) {
    let mut columns = 0;
    let mut bytes = 0;
    for b in line.bytes() {
        match b {
            b' ' => columns += 1,
            b'\t' => columns += 4 - (columns % 4),
            _ => break,
        }
        bytes += 1;
    }
    (columns, bytes)
}

fn marker_run(text: &str) -> Option<(char, usize)> {
    let first = text.chars().next()?;
    if first != '`' && first != '~' {
        return None;
    }
    let length = text.chars().take_while(|c| *c == first).count();
    (length >= 3).then_some((first, length))
}

/// Backtick fences may not carry backticks in their info string.
fn opener_info_ok(marker: char, info: &str) -> bool {
    marker != '`' || !info.contains('`')
}

/// Returns true if the line is indented enough to be indented code.
pub fn is_indented_code_line(line: &str) -> bool {
    let (columns, bytes) = leading_whitespace(line);
    columns >= 4 && !line[bytes..].trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_and_closes_backtick_fence() {
        let mut fence = FenceTracker::new();
        assert!(fence.observe("```js\n"));
        assert_eq!(
            fence.open_fence(),
            Some(OpenFence {
                marker: '`',
                length: 3
            })
        );
        assert!(fence.observe("{漢字^かんじ}\n"));
        assert!(fence.observe("```\n"));
        assert!(!fence.is_inside());
        assert!(!fence.observe("after\n"));
    }

    #[test]
    fn four_spaces_is_not_a_fence() {
        let mut fence = FenceTracker::new();
        assert!(!fence.observe("    ```js"));
        assert!(!fence.observe("\t```js"));
        assert!(fence.observe("   ```js"));
    }

    #[test]
    fn closer_needs_same_marker_and_length() {
        let mut fence = FenceTracker::new();
        fence.observe("````markdown");
        fence.observe("```");
        assert!(fence.is_inside());
        fence.observe("~~~~");
        assert!(fence.is_inside());
        fence.observe("`````");
        assert!(!fence.is_inside());
    }

    #[test]
    fn closer_with_info_string_does_not_close() {
        let mut fence = FenceTracker::new();
        fence.observe("```");
        fence.observe("```rust");
        assert!(fence.is_inside());
    }

    #[test]
    fn inline_backticks_in_info_reject_opener() {
        let mut fence = FenceTracker::new();
        assert!(!fence.observe("``` `code` ```"));
    }

    #[test]
    fn two_markers_do_not_open() {
        let mut fence = FenceTracker::new();
        assert!(!fence.observe("``"));
    }

    #[test]
    fn detects_indented_code() {
        assert!(is_indented_code_line("    let x = 1;"));
        assert!(!is_indented_code_line("   text"));
        assert!(!is_indented_code_line("        "));
    }
}
