//! Source pre-pass running block and inline rules ahead of markdown-rs.
//!
//! The pass walks the document line by line. Block rules may claim line
//! ranges; everything else is grouped into paragraph-sized chunks and run
//! through the inline chain. Claimed output is rendered to HTML right away
//! and replaced by a marker from [`MaskTable`], so markdown-rs only ever
//! sees plain markdown.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::block::{BlockClaim, BlockRuler, ClaimPart};
use crate::code_fence::is_indented_code_line;
use crate::inline::InlineRuler;
use crate::mask::{self, MaskTable};
use crate::token::{Token, TokenRenderers};

static LIST_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ {0,3}(?:[-+*]|\d{1,9}[.)])(?:[ \t]|$)").expect("static regex"));

static HTML_BLOCK_OPEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^ {0,3}(?:",
        r"<(?i:script|pre|style|textarea)(?:[\s>]|$)",
        r"|<!--|<\?|<![A-Za-z]|<!\[CDATA\[",
        r"|</?(?i:address|article|aside|base|basefont|blockquote|body|caption|center|col|colgroup|dd|details|dialog|dir|div|dl|dt|fieldset|figcaption|figure|footer|form|frame|frameset|h[1-6]|head|header|hr|html|iframe|legend|li|link|main|menu|menuitem|nav|noframes|ol|optgroup|option|p|param|search|section|summary|table|tbody|td|tfoot|th|thead|title|tr|track|ul)(?:[\s/>]|$)",
        r"|</?[A-Za-z][A-Za-z0-9-]*(?:\s[^<>]*)?/?>\s*$",
        r")"
    ))
    .expect("static regex")
});

/// Output of [`Prepass::run`].
#[derive(Debug, Clone, Default)]
pub struct Prepared {
    /// Markdown with claimed regions replaced by markers.
    pub source: String,
    /// Fragments to restore into the rendered HTML.
    pub masks: MaskTable,
}

/// Rule chains and token renderers for one renderer instance.
#[derive(Debug)]
pub struct Prepass {
    /// Block rule chain.
    pub block: BlockRuler,
    /// Inline rule chain.
    pub inline: InlineRuler,
    /// Renderers for tokens pushed by inline rules.
    pub tokens: TokenRenderers,
    /// Whether HTML block starts are passed through without inline scanning.
    pub html_blocks: bool,
    /// Whether indented code chunks are passed through without inline
    /// scanning.
    pub indented_code: bool,
}

impl Default for Prepass {
    fn default() -> Self {
        Self {
            block: BlockRuler::with_defaults(),
            inline: InlineRuler::with_defaults(),
            tokens: TokenRenderers::new(),
            html_blocks: true,
            indented_code: true,
        }
    }
}

impl Prepass {
    /// Creates a pre-pass with the built-in rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs block and inline rules over `markdown`.
    pub fn run(&self, markdown: &str) -> Prepared {
        let markdown = mask::sanitize(markdown);
        let lines: Vec<&str> = markdown.split_inclusive('\n').collect();
        let mut prepared = Prepared::default();
        self.process(&lines, 0, &mut prepared);
        prepared
    }

    fn process(&self, lines: &[&str], start: usize, prepared: &mut Prepared) {
        let mut plain_start = start;
        let mut index = start;
        while index < lines.len() {
            let Some(claim) = self.block.claim(lines, index) else {
                index += 1;
                continue;
            };
            self.process_plain(&lines[plain_start..index], prepared);
            log::trace!("block claim at line {index}: {claim:?}");
            let end = claim.end().min(lines.len());
            match claim {
                BlockClaim::Opaque { .. } => {
                    for line in &lines[index..end] {
                        prepared.source.push_str(line);
                    }
                    ensure_newline(&mut prepared.source);
                }
                BlockClaim::Html { html, .. } => {
                    let marker = prepared.masks.block(html);
                    push_block_marker(&mut prepared.source, &marker);
                }
                BlockClaim::Container {
                    open, close, body, ..
                } => {
                    let marker = prepared.masks.block(open);
                    push_block_marker(&mut prepared.source, &marker);
                    let body_end = body.end.min(lines.len());
                    let body_start = body.start.min(body_end);
                    self.process(&lines[..body_end], body_start, prepared);
                    let marker = prepared.masks.block(close);
                    push_block_marker(&mut prepared.source, &marker);
                }
                BlockClaim::Parts { parts, .. } => {
                    for part in parts {
                        self.process_part(part, prepared);
                    }
                }
            }
            index = end;
            plain_start = end;
        }
        self.process_plain(&lines[plain_start..], prepared);
    }

    fn process_part(&self, part: ClaimPart, prepared: &mut Prepared) {
        match part {
            ClaimPart::Html(html) => {
                let marker = prepared.masks.block(html);
                push_block_marker(&mut prepared.source, &marker);
            }
            ClaimPart::Wrapped { open, text, close } => {
                start_paragraph(&mut prepared.source);
                let marker = prepared.masks.block(open);
                prepared.source.push_str(&marker);
                self.scan_inline(text.trim(), prepared);
                let marker = prepared.masks.block(close);
                prepared.source.push_str(&marker);
                prepared.source.push_str("\n\n");
            }
            ClaimPart::Markdown(text) => {
                start_paragraph(&mut prepared.source);
                let lines: Vec<&str> = text.split_inclusive('\n').collect();
                self.process(&lines, 0, prepared);
                ensure_newline(&mut prepared.source);
            }
        }
    }

    /// Splits unclaimed lines into chunks at blank lines and ATX headings,
    /// then inline-scans each chunk that is neither code nor raw HTML.
    fn process_plain(&self, lines: &[&str], prepared: &mut Prepared) {
        let mut in_list = false;
        let mut chunk_start = 0;
        let mut index = 0;
        while index <= lines.len() {
            let boundary = index == lines.len() || lines[index].trim().is_empty() || is_atx_heading(lines[index]);
            if !boundary {
                index += 1;
                continue;
            }
            if chunk_start < index {
                self.process_chunk(&lines[chunk_start..index], &mut in_list, prepared);
            }
            if index == lines.len() {
                break;
            }
            if lines[index].trim().is_empty() {
                prepared.source.push_str(lines[index]);
            } else {
                in_list = false;
                self.scan_inline(lines[index], prepared);
            }
            index += 1;
            chunk_start = index;
        }
    }

    fn process_chunk(&self, chunk: &[&str], in_list: &mut bool, prepared: &mut Prepared) {
        let first = chunk[0];
        let indented = is_indented_code_line(first);
        if LIST_ITEM.is_match(first) {
            *in_list = true;
        } else if !indented {
            *in_list = false;
        }

        let verbatim = (self.indented_code && indented && !*in_list)
            || (self.html_blocks && !indented && HTML_BLOCK_OPEN.is_match(first));
        let text = chunk.concat();
        if verbatim {
            prepared.source.push_str(&text);
        } else {
            self.scan_inline(&text, prepared);
        }
    }

    fn scan_inline(&self, text: &str, prepared: &mut Prepared) {
        let tokens = self.inline.tokenize(text);
        let mut run: Vec<Token> = Vec::new();
        for token in tokens {
            if token.is_source() {
                self.flush_run(&mut run, prepared);
                prepared.source.push_str(&token.content);
            } else {
                run.push(token);
            }
        }
        self.flush_run(&mut run, prepared);
    }

    fn flush_run(&self, run: &mut Vec<Token>, prepared: &mut Prepared) {
        if run.is_empty() {
            return;
        }
        let html = self.tokens.render(run);
        let marker = prepared.masks.inline(html);
        prepared.source.push_str(&marker);
        run.clear();
    }
}

fn is_atx_heading(line: &str) -> bool {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return false;
    }
    let hashes = trimmed.bytes().take_while(|b| *b == b'#').count();
    (1..=6).contains(&hashes)
        && trimmed[hashes..]
            .chars()
            .next()
            .is_none_or(char::is_whitespace)
}

fn ensure_newline(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

/// Ends the current paragraph, if any.
fn start_paragraph(out: &mut String) {
    ensure_newline(out);
    if !out.is_empty() && !out.ends_with("\n\n") {
        out.push('\n');
    }
}

/// Puts a block marker on its own paragraph.
fn push_block_marker(out: &mut String, marker: &str) {
    start_paragraph(out);
    out.push_str(marker);
    out.push_str("\n\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockRule, find_container};
    use crate::inline::InlineState;
    use crate::token::{TEXT, TokenSink};

    fn star(state: &mut InlineState<'_>) -> bool {
        if state.byte_at(state.pos) != Some(b'@') {
            return false;
        }
        state.push_token("star_open", "b", 1);
        state.push_token(TEXT, "", 0).content = "*".to_string();
        state.push_token("star_close", "b", -1);
        state.pos += 1;
        true
    }

    fn prepass() -> Prepass {
        let mut prepass = Prepass::new();
        prepass.inline.push("star", Box::new(star));
        prepass
    }

    #[test]
    fn claimed_inline_runs_become_markers() {
        let prepared = prepass().run("a @ b\n");
        assert_eq!(prepared.source, "a \u{fdd0}i0\u{fdd1} b\n");
        assert_eq!(prepared.masks.restore(&prepared.source), "a <b>*</b> b\n");
    }

    #[test]
    fn marker_delimiters_in_input_are_replaced() {
        let prepared = prepass().run("x \u{fdd0}i0\u{fdd1} @\n");
        assert_eq!(prepared.masks.len(), 1);
        assert_eq!(prepared.masks.restore(&prepared.source), "x \u{fffd}i0\u{fffd} <b>*</b>\n");
    }

    #[test]
    fn fenced_and_indented_code_is_untouched() {
        let src = "```\n@\n```\n\n    @ code\n\ntext @\n";
        let prepared = prepass().run(src);
        assert!(prepared.source.starts_with("```\n@\n```\n\n    @ code\n\ntext \u{fdd0}i0"));
        assert_eq!(prepared.masks.len(), 1);
    }

    #[test]
    fn indented_list_continuation_is_scanned() {
        let prepared = prepass().run("- item\n\n    more @\n");
        assert_eq!(prepared.masks.len(), 1);
    }

    #[test]
    fn html_blocks_are_untouched() {
        let prepared = prepass().run("<div>\n@\n</div>\n\n<span>@</span> text\n");
        assert_eq!(prepared.masks.len(), 1);
        assert!(prepared.source.starts_with("<div>\n@\n</div>\n"));
    }

    #[test]
    fn headings_are_their_own_chunk() {
        let prepared = prepass().run("# Title @\ntext\n");
        assert_eq!(prepared.source, "# Title \u{fdd0}i0\u{fdd1}\ntext\n");
    }

    #[test]
    fn parts_rebuild_the_claimed_lines() {
        fn list(lines: &[&str], start: usize) -> Option<BlockClaim> {
            lines[start].starts_with("??").then(|| BlockClaim::Parts {
                parts: vec![
                    ClaimPart::Html("<dl>".to_string()),
                    ClaimPart::Wrapped {
                        open: "<dt>".to_string(),
                        text: " x @ ".to_string(),
                        close: "</dt>".to_string(),
                    },
                    ClaimPart::Markdown("- a @\n".to_string()),
                    ClaimPart::Html("</dl>".to_string()),
                ],
                end: start + 1,
            })
        }

        let mut prepass = prepass();
        prepass.block.push("list", Box::new(list));
        let prepared = prepass.run("?? ignored\n");
        assert_eq!(
            prepared.source,
            "\u{fdd0}b0\u{fdd1}\n\n\u{fdd0}b1\u{fdd1}x \u{fdd0}i2\u{fdd1}\u{fdd0}b3\u{fdd1}\n\n- a \u{fdd0}i4\u{fdd1}\n\n\u{fdd0}b5\u{fdd1}\n\n"
        );
    }

    #[test]
    fn empty_parts_drop_lines() {
        fn drop(lines: &[&str], start: usize) -> Option<BlockClaim> {
            lines[start].starts_with("%%").then(|| BlockClaim::Parts {
                parts: Vec::new(),
                end: start + 1,
            })
        }

        let mut prepass = prepass();
        prepass.block.push("drop", Box::new(drop));
        let prepared = prepass.run("%% gone\ntext\n");
        assert_eq!(prepared.source, "text\n");
    }

    #[test]
    fn containers_wrap_processed_bodies() {
        struct Note;
        impl BlockRule for Note {
            fn apply(&self, lines: &[&str], start: usize) -> Option<BlockClaim> {
                let span = find_container(lines, start, ':')?;
                Some(BlockClaim::Container {
                    open: format!("<div class=\"{}\">", span.params),
                    close: "</div>".to_string(),
                    body: span.body,
                    end: span.end,
                })
            }
        }

        let mut prepass = prepass();
        prepass.block.push("note", Box::new(Note));
        let prepared = prepass.run("before\n::: warn\ninside @\n:::\nafter\n");
        assert_eq!(
            prepared.source,
            "before\n\n\u{fdd0}b0\u{fdd1}\n\ninside \u{fdd0}i1\u{fdd1}\n\n\u{fdd0}b2\u{fdd1}\n\nafter\n"
        );
    }
}
