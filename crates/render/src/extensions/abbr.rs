//! `*[HTML]: Hyper Text Markup Language` abbreviations.
//!
//! Definition lines are dropped from the output. Every whole-word
//! occurrence of a defined label in text is then wrapped in `<abbr>`.

use std::collections::HashMap;

use multimark_core::{BlockClaim, FenceTracker, MultimarkError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::Extension;
use crate::engine::{Engine, PassStage};
use crate::html::map_text;

static DEFINITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^ {0,3}\*\[([^\]\n]*[^\]\s][^\]\n]*)\]:[ \t]*(.*\S)[ \t]*\r?\n?$").expect("static regex")
});

fn definition(line: &str) -> Option<(&str, &str)> {
    let caps = DEFINITION.captures(line)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

fn definitions_block(lines: &[&str], start: usize) -> Option<BlockClaim> {
    let count = lines[start..].iter().take_while(|line| definition(line).is_some()).count();
    (count > 0).then(|| BlockClaim::Parts {
        parts: Vec::new(),
        end: start + count,
    })
}

/// Definitions outside fenced code, first one per label.
fn definitions(source: &str) -> Vec<(&str, &str)> {
    let mut fence = FenceTracker::new();
    let mut found: Vec<(&str, &str)> = Vec::new();
    for line in source.split_inclusive('\n') {
        if fence.observe(line) {
            continue;
        }
        if let Some((label, title)) = definition(line)
            && !found.iter().any(|(seen, _)| *seen == label)
        {
            found.push((label, title));
        }
    }
    found
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn wrap_abbreviations(source: &str, html: String) -> String {
    let found = definitions(source);
    if found.is_empty() {
        return html;
    }
    // Labels are matched against escaped text.
    let mut titles: HashMap<String, &str> = HashMap::new();
    for &(label, title) in &found {
        titles.insert(html_escape::encode_text(label).into_owned(), title);
    }
    let mut labels: Vec<&String> = titles.keys().collect();
    labels.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
    let alternation = labels.iter().map(|label| regex::escape(label)).collect::<Vec<_>>().join("|");
    let pattern = match Regex::new(&alternation) {
        Ok(pattern) => pattern,
        Err(err) => {
            log::warn!("abbreviations skipped: {err}");
            return html;
        }
    };

    map_text(&html, |text, out| {
        let mut last = 0;
        let mut search = 0;
        while let Some(hit) = pattern.find_at(text, search) {
            let before = text[..hit.start()].chars().next_back();
            let after = text[hit.end()..].chars().next();
            if before.is_some_and(is_word) || after.is_some_and(is_word) {
                search = hit.start() + text[hit.start()..].chars().next().map_or(1, char::len_utf8);
                continue;
            }
            let title = titles.get(hit.as_str()).copied().unwrap_or_default();
            out.push_str(&text[last..hit.start()]);
            out.push_str("<abbr title=\"");
            out.push_str(&html_escape::encode_double_quoted_attribute(title));
            out.push_str("\">");
            out.push_str(hit.as_str());
            out.push_str("</abbr>");
            last = hit.end();
            search = hit.end();
        }
        out.push_str(&text[last..]);
    })
}

/// Registers abbreviation definitions and the pass that applies them.
pub struct Abbr;

impl Extension for Abbr {
    fn name(&self) -> &str {
        "abbr"
    }

    fn register(&self, engine: &mut Engine, _options: &Value) -> Result<(), MultimarkError> {
        engine.block_mut().push("abbr_def", Box::new(definitions_block));
        engine.add_html_pass("abbr", PassStage::Masked, Box::new(wrap_abbreviations));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderOptions;

    fn render(source: &str) -> String {
        let mut engine = Engine::new(RenderOptions {
            typographer: false,
            ..RenderOptions::default()
        });
        Abbr.register(&mut engine, &Value::Null).unwrap();
        engine.render(source).unwrap().html
    }

    #[test]
    fn whole_words_are_wrapped() {
        assert_eq!(
            render(
                "*[HTML]: Hyper Text Markup Language\n*[W3C]: World Wide Web Consortium\n\nThe HTML standard is by W3C. HTMLX and `HTML` stay.\n"
            ),
            "<p>The <abbr title=\"Hyper Text Markup Language\">HTML</abbr> standard is by \
             <abbr title=\"World Wide Web Consortium\">W3C</abbr>. HTMLX and <code>HTML</code> stay.</p>\n"
        );
    }

    #[test]
    fn longest_label_wins_and_first_definition_counts() {
        assert_eq!(
            render("*[HTML]: one\n*[HTML5]: five\n*[HTML]: two\n\nHTML5 beats HTML\n"),
            "<p><abbr title=\"five\">HTML5</abbr> beats <abbr title=\"one\">HTML</abbr></p>\n"
        );
    }

    #[test]
    fn definitions_may_follow_a_paragraph() {
        assert_eq!(
            render("Uses CSS\n*[CSS]: Cascading \"Style\" Sheets\n"),
            "<p>Uses <abbr title=\"Cascading &quot;Style&quot; Sheets\">CSS</abbr></p>\n"
        );
    }

    #[test]
    fn fenced_definitions_are_code() {
        assert_eq!(
            render("```\n*[X]: no\n```\n\nX\n"),
            "<pre><code>*[X]: no\n</code></pre>\n<p>X</p>\n"
        );
    }

    #[test]
    fn escaped_labels_match_escaped_text() {
        assert_eq!(
            render("*[R&D]: Research\n\nR&D team\n"),
            "<p><abbr title=\"Research\">R&amp;D</abbr> team</p>\n"
        );
    }

    #[test]
    fn malformed_definitions_are_text() {
        assert_eq!(render("*[]: nothing\n"), "<p>*[]: nothing</p>\n");
        assert_eq!(render("*[X]:\n"), "<p>*[X]:</p>\n");
    }
}
