//! Definition lists.
//!
//! ```text
//! Term
//! : Definition, indented continuation lines
//!   belong to it.
//! ~ Another definition
//! ```
//!
//! A blank line between a term and its definitions, or between
//! definitions, makes the list loose: definitions are then rendered as
//! block markdown instead of inline text.

use multimark_core::{BlockClaim, ClaimPart, MultimarkError};
use serde_json::Value;

use super::Extension;
use crate::engine::Engine;

struct Entry {
    term: String,
    definitions: Vec<String>,
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn indent(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// Column of the content after a `:` or `~` marker, and the content.
fn definition_line(line: &str) -> Option<(usize, &str)> {
    let body = line.trim_end_matches(['\n', '\r']);
    let trimmed = body.trim_start_matches(' ');
    if body.len() - trimmed.len() > 3 {
        return None;
    }
    let rest = trimmed.strip_prefix([':', '~'])?;
    if !(rest.is_empty() || rest.starts_with([' ', '\t'])) {
        return None;
    }
    let content = rest.trim_start_matches([' ', '\t']);
    Some((body.len() - content.len(), content))
}

/// Lines that open some other block and so cannot be a term.
fn opens_block(line: &str) -> bool {
    let trimmed = line.trim_start_matches(' ');
    if trimmed.starts_with(['#', '>', '|', '<', '`']) || trimmed.starts_with("~~~") {
        return true;
    }
    if let Some(rest) = trimmed.strip_prefix(['-', '*', '+']) {
        return rest.is_empty() || rest.starts_with([' ', '\t', '\n']);
    }
    let digits = trimmed.bytes().take_while(u8::is_ascii_digit).count();
    digits > 0
        && trimmed[digits..].starts_with(['.', ')'])
        && trimmed[digits + 1..].starts_with([' ', '\t', '\n'])
}

fn is_term(line: &str) -> bool {
    !is_blank(line) && indent(line) <= 3 && definition_line(line).is_none() && !opens_block(line)
}

fn dedent(line: &str, columns: usize) -> &str {
    &line[indent(line).min(columns)..]
}

/// One term and its definitions starting at `start`. Returns the entry, the
/// line after it and whether blank lines separated its parts.
fn entry_at(lines: &[&str], start: usize) -> Option<(Entry, usize, bool)> {
    if !is_term(lines[start]) {
        return None;
    }
    let mut loose = false;
    let mut index = start + 1;
    if lines.get(index).is_some_and(|line| is_blank(line)) {
        index += 1;
        loose = true;
    }
    definition_line(lines.get(index)?)?;

    let mut definitions = Vec::new();
    while let Some((column, content)) = lines.get(index).and_then(|line| definition_line(line)) {
        let mut body = format!("{content}\n");
        index += 1;
        while let Some(line) = lines.get(index) {
            if is_blank(line) {
                let next = (index..lines.len()).find(|&at| !is_blank(lines[at]));
                match next {
                    Some(at) if definition_line(lines[at]).is_some() => {
                        loose = true;
                        index = at;
                    }
                    Some(at) if indent(lines[at]) >= column.min(4) => {
                        loose = true;
                        body.extend(lines[index..at].iter().map(|_| "\n"));
                        index = at;
                        continue;
                    }
                    _ => {}
                }
                break;
            }
            if definition_line(line).is_some() {
                break;
            }
            if indent(line) < column.min(4)
                && lines.get(index + 1).is_some_and(|next| definition_line(next).is_some())
            {
                // A new term.
                break;
            }
            body.push_str(dedent(line, column));
            if !body.ends_with('\n') {
                body.push('\n');
            }
            index += 1;
        }
        definitions.push(body);
    }

    let term = lines[start].trim().to_string();
    Some((Entry { term, definitions }, index, loose))
}

fn definition_list(lines: &[&str], start: usize) -> Option<BlockClaim> {
    let (first, mut end, mut loose) = entry_at(lines, start)?;
    let mut entries = vec![first];
    while let Some(next) = (end..lines.len()).find(|&at| !is_blank(lines[at])) {
        let Some((entry, entry_end, spaced)) = entry_at(lines, next) else {
            break;
        };
        loose |= spaced || next > end;
        entries.push(entry);
        end = entry_end;
    }

    let mut parts = vec![ClaimPart::Html("<dl>".to_string())];
    for entry in entries {
        parts.push(ClaimPart::Wrapped {
            open: "<dt>".to_string(),
            text: entry.term,
            close: "</dt>".to_string(),
        });
        for definition in entry.definitions {
            if loose {
                parts.push(ClaimPart::Html("<dd>".to_string()));
                parts.push(ClaimPart::Markdown(definition));
                parts.push(ClaimPart::Html("</dd>".to_string()));
            } else {
                parts.push(ClaimPart::Wrapped {
                    open: "<dd>".to_string(),
                    text: definition,
                    close: "</dd>".to_string(),
                });
            }
        }
    }
    parts.push(ClaimPart::Html("</dl>".to_string()));
    Some(BlockClaim::Parts { parts, end })
}

/// Registers the definition list block rule.
pub struct Deflist;

impl Extension for Deflist {
    fn name(&self) -> &str {
        "deflist"
    }

    fn register(&self, engine: &mut Engine, _options: &Value) -> Result<(), MultimarkError> {
        engine.block_mut().push("deflist", Box::new(definition_list));
        Ok(())
    }
}
