//! Line-table code blocks with captions, line numbers, marked lines and
//! shell prompts.
//!
//! Fence meta after the language understands:
//!
//! - `first_line:N` numbers lines from `N`.
//! - `mark:1,3-5` adds `class="marked"` to those rows.
//! - `command:("$":1-2||"#":4)` adds a prompt column.
//! - Remaining text is the caption; a trailing `https://…` URL (optionally
//!   followed by a title) becomes a link.

use std::collections::HashMap;

use multimark_core::MultimarkError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use super::{Extension, parse_options};
use crate::engine::{Engine, FenceBlock};

/// Language names and aliases a fence may use.
const LANGUAGES: &[&str] = &[
    "markup", "html", "xml", "svg", "mathml", "ssml", "atom", "rss", "css", "clike", "javascript",
    "js", "markup-templating", "bash", "sh", "shell", "c", "cpp", "csharp", "cs", "dotnet",
    "docker", "dockerfile", "git", "go", "graphql", "java", "json", "webmanifest", "jsx", "kotlin",
    "kt", "kts", "latex", "tex", "context", "less", "makefile", "markdown", "md", "nginx",
    "objectivec", "objc", "perl", "php", "powershell", "python", "py", "ruby", "rb", "rust", "sass",
    "scala", "scss", "sql", "swift", "typescript", "ts", "tsx", "wasm", "yaml", "yml", "diff",
];

static DISPLAY_NAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("bash", "Bash"),
        ("sh", "Shell"),
        ("shell", "Shell"),
        ("c", "C"),
        ("cpp", "C++"),
        ("csharp", "C#"),
        ("cs", "C#"),
        ("css", "CSS"),
        ("diff", "Diff"),
        ("docker", "Dockerfile"),
        ("dockerfile", "Dockerfile"),
        ("go", "Go"),
        ("graphql", "GraphQL"),
        ("html", "HTML"),
        ("java", "Java"),
        ("javascript", "JavaScript"),
        ("js", "JavaScript"),
        ("json", "JSON"),
        ("jsx", "JSX"),
        ("kotlin", "Kotlin"),
        ("latex", "LaTeX"),
        ("less", "Less"),
        ("makefile", "Makefile"),
        ("markdown", "Markdown"),
        ("md", "Markdown"),
        ("objectivec", "Objective-C"),
        ("php", "PHP"),
        ("powershell", "PowerShell"),
        ("python", "Python"),
        ("py", "Python"),
        ("ruby", "Ruby"),
        ("rust", "Rust"),
        ("scss", "SCSS"),
        ("sql", "SQL"),
        ("swift", "Swift"),
        ("typescript", "TypeScript"),
        ("ts", "TypeScript"),
        ("tsx", "TSX"),
        ("wasm", "WebAssembly"),
        ("xml", "XML"),
        ("yaml", "YAML"),
        ("yml", "YAML"),
    ]
    .into_iter()
    .collect()
});

static FIRST_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*first_line:(\d+)").expect("static regex"));
static MARK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s*mark:([0-9,-]+)").expect("static regex"));
static COMMAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)\s*command:\((\S.*)\)").expect("static regex"));
static SUB_COMMAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)"+(.*)"+:([0-9,-]+)?"#).expect("static regex"));
static CAPTION_URL_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)^(.*?)\s+(https?://\S+)\s+(.+)$").expect("static regex"));
static CAPTION_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)^(.*?)\s+(https?://\S+)\s*$").expect("static regex"));

/// Whether `lang` is a highlightable language name or alias.
pub fn is_known_language(lang: &str) -> bool {
    LANGUAGES.contains(&lang)
}

/// Prism extension options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrismOptions {
    /// Fallback for both unknown and missing languages.
    pub default_language: Option<String>,
    /// Language used when the fence names an unknown one.
    pub default_language_for_unknown: Option<String>,
    /// Language used when the fence names none.
    pub default_language_for_unspecified: Option<String>,
}

impl PrismOptions {
    fn validate(&self) -> Result<(), MultimarkError> {
        let named = [
            ("defaultLanguage", &self.default_language),
            ("defaultLanguageForUnknown", &self.default_language_for_unknown),
            ("defaultLanguageForUnspecified", &self.default_language_for_unspecified),
        ];
        for (option, language) in named {
            if let Some(language) = language
                && !is_known_language(language)
            {
                return Err(MultimarkError::invalid_options(
                    "prism",
                    format!("Bad option {option}: There is no Prism language '{language}'."),
                ));
            }
        }
        Ok(())
    }
}

/// Options parsed from the fence meta.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct FenceMeta {
    first_line: usize,
    caption: String,
    marked: Vec<usize>,
    commands: Option<HashMap<usize, String>>,
}

/// Expands `3` or `5-2` into line numbers.
fn line_range(range: &str) -> Vec<usize> {
    match range.split_once('-') {
        Some((a, b)) => {
            let (Ok(a), Ok(b)) = (a.parse::<usize>(), b.parse::<usize>()) else {
                return Vec::new();
            };
            (a.min(b)..=a.max(b)).collect()
        }
        None => range.parse().map(|line| vec![line]).unwrap_or_default(),
    }
}

fn lines_in(ranges: &str) -> impl Iterator<Item = usize> + '_ {
    ranges.split(',').flat_map(line_range)
}

fn parse_meta(meta: &str) -> FenceMeta {
    let mut rest = meta.to_string();
    let mut parsed = FenceMeta {
        first_line: 1,
        ..FenceMeta::default()
    };

    if let Some(found) = FIRST_LINE.captures(&rest) {
        parsed.first_line = found[1].parse().unwrap_or(1);
        rest = FIRST_LINE.replace(&rest, "").into_owned();
    }

    if let Some(found) = MARK.captures(&rest) {
        parsed.marked = lines_in(&found[1]).collect();
        rest = MARK.replace(&rest, "").into_owned();
    }

    if let Some(found) = COMMAND.captures(&rest) {
        let mut commands = HashMap::new();
        for command in found[1].split("||") {
            let Some(sub) = SUB_COMMAND.captures(command) else {
                continue;
            };
            let prompt = sub[1].to_string();
            match sub.get(2) {
                Some(ranges) => {
                    for line in lines_in(ranges.as_str()) {
                        commands.insert(line, prompt.clone());
                    }
                }
                None => {
                    commands.insert(1, prompt);
                }
            }
        }
        parsed.commands = Some(commands);
        rest = COMMAND.replace(&rest, "").into_owned();
    }

    parsed.caption = caption(&rest);
    parsed
}

fn caption(text: &str) -> String {
    let escape = |s: &str| html_escape::encode_text(s.trim()).into_owned();
    if let Some(found) = CAPTION_URL_TITLE.captures(text) {
        format!(
            "<span>{}</span><a href=\"{}\">{}</a>",
            escape(&found[1]),
            html_escape::encode_double_quoted_attribute(&found[2]),
            escape(&found[3])
        )
    } else if let Some(found) = CAPTION_URL.captures(text) {
        format!(
            "<span>{}</span><a href=\"{}\">link</a>",
            escape(&found[1]),
            html_escape::encode_double_quoted_attribute(&found[2])
        )
    } else {
        format!("<span>{}</span>", escape(text))
    }
}

fn unescape_braces(code: &str) -> String {
    code.replace("&#123;", "{").replace("&#125;", "}")
}

fn escape_braces(code: &str) -> String {
    code.replace('{', "&#123;").replace('}', "&#125;")
}

fn escape_code(code: &str) -> String {
    html_escape::encode_quoted_attribute(&unescape_braces(code)).into_owned()
}

/// Replaces each leading tab of every line with `tab`.
fn replace_tabs(line: &str, tab: &str) -> String {
    let body = line.trim_start_matches('\t');
    let tabs = line.len() - body.len();
    let mut out = tab.repeat(tabs);
    out.push_str(body);
    out
}

/// The fence renderer.
#[derive(Debug, Clone, Default)]
struct Highlighter {
    for_unknown: Option<String>,
    for_unspecified: Option<String>,
    tab: String,
}

impl Highlighter {
    fn new(options: PrismOptions, tab: &str) -> Self {
        Self {
            for_unknown: options.default_language_for_unknown.or(options.default_language.clone()),
            for_unspecified: options.default_language_for_unspecified.or(options.default_language),
            tab: tab.to_string(),
        }
    }

    /// Language to highlight with, its display name, and whether it is
    /// known.
    fn select<'a>(&'a self, lang: &'a str) -> (&'a str, &'a str, bool) {
        let mut chosen = lang;
        if chosen.is_empty()
            && let Some(fallback) = &self.for_unspecified
        {
            chosen = fallback;
        }
        let shown = DISPLAY_NAMES.get(chosen).copied().unwrap_or(chosen);
        if is_known_language(chosen) {
            return (chosen, shown, true);
        }
        match &self.for_unknown {
            Some(fallback) => (fallback, shown, true),
            None => (chosen, shown, false),
        }
    }

    fn render(&self, fence: &FenceBlock<'_>) -> Option<String> {
        let info = fence.info.trim_start();
        let lang = info.split(' ').next().unwrap_or_default();
        let text = fence.code.trim();
        let (chosen, shown, known) = self.select(lang);

        if !known && lang != "raw" {
            return (lang == "info").then(|| {
                format!("<pre class=\"info\"><code>{}</code></pre>", escape_code(text))
            });
        }

        let meta = parse_meta(&info[lang.len()..]);
        let code = escape_braces(&escape_code(text));
        let mut rows = String::new();
        for (offset, line) in code.split('\n').enumerate() {
            let number = meta.first_line + offset;
            if meta.marked.contains(&number) {
                rows.push_str("<tr class=\"marked\">");
            } else {
                rows.push_str("<tr>");
            }
            rows.push_str(&format!("<td data-num=\"{number}\"></td>"));
            if let Some(commands) = &meta.commands {
                let prompt = commands.get(&number).map(String::as_str).unwrap_or_default();
                rows.push_str(&format!(
                    "<td data-command=\"{}\"></td>",
                    html_escape::encode_double_quoted_attribute(prompt)
                ));
            }
            let line = if self.tab.is_empty() {
                line.to_string()
            } else {
                replace_tabs(line, &self.tab)
            };
            rows.push_str(&format!("<td><pre>{line}</pre></td></tr>"));
        }

        let class = if chosen.is_empty() {
            String::new()
        } else {
            format!(" {}", html_escape::encode_double_quoted_attribute(chosen))
        };
        Some(format!(
            "<figure class=\"highlight{class}\"><figcaption data-lang=\"{}\">{}</figcaption><table>{rows}</table></figure>",
            html_escape::encode_double_quoted_attribute(shown),
            meta.caption
        ))
    }
}

/// Registers the line-table fence renderer.
pub struct Prism;

impl Extension for Prism {
    fn name(&self) -> &str {
        "prism"
    }

    fn register(&self, engine: &mut Engine, options: &Value) -> Result<(), MultimarkError> {
        let options: PrismOptions = parse_options(self.name(), options)?;
        options.validate()?;
        let highlighter = Highlighter::new(options, &engine.options().tab);
        engine.add_fence_renderer(self.name(), Box::new(move |fence: &FenceBlock<'_>| highlighter.render(fence)));
        Ok(())
    }
}
