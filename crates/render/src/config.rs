//! Renderer configuration and the extension merge.

use multimark_core::MultimarkError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Built-in extensions, in registration order.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "abbr",
    "bracketed-spans",
    "attrs",
    "deflist",
    "footnote",
    "table",
    "strikethrough",
    "tasklist",
    "emoji",
    "ins",
    "mark",
    "sub",
    "sup",
    "anchor",
    "toc",
    "pangu",
    "container",
    "furigana",
    "katex",
    "mermaid",
    "graphviz",
    "prism",
    "chart",
    "spoiler",
    "excerpt",
];

/// Core rendering switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderOptions {
    /// Pass raw HTML through. When false it is escaped.
    pub html: bool,
    /// Close void tags XHTML style (`<br />`).
    pub xhtml_out: bool,
    /// Turn soft line breaks into `<br>`.
    pub breaks: bool,
    /// Link bare URLs.
    pub linkify: bool,
    /// Smart quotes, dashes and symbol replacements.
    pub typographer: bool,
    /// Double open, double close, single open, single close quote.
    pub quotes: String,
    /// Replacement for leading tabs in highlighted code. Empty keeps tabs.
    pub tab: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            html: true,
            xhtml_out: false,
            breaks: true,
            linkify: true,
            typographer: true,
            quotes: "\"\"\u{2018}\u{2019}".to_string(),
            tab: String::new(),
        }
    }
}

/// One extension entry in the flat form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtensionConfig {
    /// Extension name.
    #[serde(default)]
    pub name: String,
    /// Enabled unless literally `false`.
    #[serde(default)]
    pub enable: Option<bool>,
    /// Extension-specific options.
    #[serde(default)]
    pub options: Option<Value>,
}

/// The `plugin:` wrapper accepted for older configurations.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LegacyPlugin {
    /// Wrapped entry. Enabled only when `enable` is literally `true`.
    pub plugin: ExtensionConfig,
}

/// An entry of the `plugins` list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PluginEntry {
    /// `{ plugin: { name, enable, options } }`.
    Legacy(LegacyPlugin),
    /// `{ name, enable, options }`.
    Modern(ExtensionConfig),
    /// Anything else; skipped.
    Ignored(Value),
}

impl PluginEntry {
    /// Flat entry with the legacy enable rule applied.
    fn resolve(&self) -> Option<ResolvedExtension> {
        let (config, enable) = match self {
            PluginEntry::Legacy(legacy) => (&legacy.plugin, legacy.plugin.enable == Some(true)),
            PluginEntry::Modern(config) => (config, config.enable != Some(false)),
            PluginEntry::Ignored(value) => {
                log::debug!("ignoring plugin entry {value}");
                return None;
            }
        };
        if config.name.is_empty() {
            return None;
        }
        Some(ResolvedExtension {
            name: config.name.clone(),
            enable,
            options: config.options.clone().unwrap_or(Value::Null),
        })
    }
}

/// Top-level renderer configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Rendering switches.
    pub render: RenderOptions,
    /// Extension entries merged over [`DEFAULT_EXTENSIONS`].
    #[serde(alias = "extensions")]
    pub plugins: Vec<PluginEntry>,
}

impl RendererConfig {
    /// Loads configuration from YAML. Blank input yields the defaults.
    pub fn from_yaml_str(input: &str) -> Result<Self, MultimarkError> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(input).map_err(|err| MultimarkError::Config(err.to_string()))
    }

    /// Loads configuration from JSON.
    pub fn from_json_str(input: &str) -> Result<Self, MultimarkError> {
        serde_json::from_str(input).map_err(|err| MultimarkError::Config(err.to_string()))
    }

    /// Extensions to register, in order.
    pub fn extensions(&self) -> Vec<ResolvedExtension> {
        resolve_extensions(&self.plugins)
    }
}

/// An extension after merging user entries over the defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedExtension {
    /// Extension name.
    pub name: String,
    /// Whether it gets registered.
    pub enable: bool,
    /// Options handed to the extension; `Null` when none were given.
    pub options: Value,
}

/// Built-in names behind a `markdown-it-*` plugin name, with or without a
/// `./` or `./lib/renderer/` path in front.
fn builtin_names(name: &str) -> Option<&'static [&'static str]> {
    let short = name
        .strip_prefix("./lib/renderer/")
        .or_else(|| name.strip_prefix("./"))
        .unwrap_or(name);
    let short = short.strip_prefix("markdown-it-").unwrap_or(short);
    match short {
        "multimd-table" => Some(&["table"]),
        "task-checkbox" => Some(&["tasklist"]),
        "toc-and-anchor" => Some(&["anchor", "toc"]),
        _ => DEFAULT_EXTENSIONS
            .iter()
            .find(|builtin| **builtin == short)
            .map(std::slice::from_ref),
    }
}

/// Merges user entries over [`DEFAULT_EXTENSIONS`].
///
/// Defaults keep their order and are enabled with no options. An entry
/// naming a default, directly or by its `markdown-it-*` plugin name,
/// replaces it in place; any other entry is appended after the defaults in
/// the order given. Entries without a name are skipped.
pub fn resolve_extensions(entries: &[PluginEntry]) -> Vec<ResolvedExtension> {
    let mut resolved: Vec<ResolvedExtension> = DEFAULT_EXTENSIONS
        .iter()
        .map(|name| ResolvedExtension {
            name: (*name).to_string(),
            enable: true,
            options: Value::Null,
        })
        .collect();
    let mut custom = Vec::new();

    for entry in entries.iter().filter_map(PluginEntry::resolve) {
        let Some(builtins) = builtin_names(&entry.name) else {
            custom.push(entry);
            continue;
        };
        for builtin in builtins {
            if let Some(index) = DEFAULT_EXTENSIONS.iter().position(|name| name == builtin) {
                resolved[index] = ResolvedExtension {
                    name: (*builtin).to_string(),
                    ..entry.clone()
                };
            }
        }
    }

    resolved.extend(custom);
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(resolved: &[ResolvedExtension]) -> Vec<&str> {
        resolved.iter().map(|ext| ext.name.as_str()).collect()
    }

    #[test]
    fn defaults_when_nothing_configured() {
        let resolved = resolve_extensions(&[]);
        assert_eq!(names(&resolved), DEFAULT_EXTENSIONS);
        assert!(resolved.iter().all(|ext| ext.enable && ext.options.is_null()));
    }

    #[test]
    fn user_entry_replaces_default_in_place() {
        let config = RendererConfig::from_yaml_str(
            "plugins:\n  - name: furigana\n    options:\n      fallbackParens: \"()\"\n  - name: katex\n    enable: false\n",
        )
        .unwrap();
        let resolved = config.extensions();
        assert_eq!(resolved.len(), DEFAULT_EXTENSIONS.len());

        let furigana = resolved.iter().position(|ext| ext.name == "furigana").unwrap();
        assert_eq!(furigana, 17);
        assert_eq!(resolved[furigana].options, json!({"fallbackParens": "()"}));

        let katex = resolved.iter().find(|ext| ext.name == "katex").unwrap();
        assert!(!katex.enable);
    }

    #[test]
    fn custom_entries_follow_defaults_in_order() {
        let config = RendererConfig::from_json_str(
            r#"{"extensions": [{"name": "b"}, {"name": "emoji", "enable": false}, {"name": "a"}]}"#,
        )
        .unwrap();
        let resolved = config.extensions();
        let tail = &names(&resolved)[DEFAULT_EXTENSIONS.len()..];
        assert_eq!(tail, ["b", "a"]);
        assert!(!resolved[8].enable);
    }

    #[test]
    fn legacy_entries_need_explicit_enable() {
        let config = RendererConfig::from_yaml_str(
            "plugins:\n  - plugin:\n      name: emoji\n  - plugin:\n      name: custom\n      enable: true\n",
        )
        .unwrap();
        let resolved = config.extensions();
        assert!(!resolved[8].enable);
        assert_eq!(resolved.last().map(|ext| ext.name.as_str()), Some("custom"));
        assert!(resolved.last().is_some_and(|ext| ext.enable));
    }

    #[test]
    fn plugin_module_names_map_to_builtins() {
        let config = RendererConfig::from_yaml_str(
            "plugins:
  - name: ./lib/renderer/markdown-it-furigana
    enable: false
  - name: markdown-it-emoji
    enable: false
  - name: markdown-it-toc-and-anchor
    options:
      level: 2
  - name: ./markdown-it-container
    enable: false
  - name: markdown-it-unknown
",
        )
        .unwrap();
        let resolved = config.extensions();
        assert_eq!(&names(&resolved)[..DEFAULT_EXTENSIONS.len()], DEFAULT_EXTENSIONS);
        assert_eq!(resolved.last().map(|ext| ext.name.as_str()), Some("markdown-it-unknown"));

        let find = |name: &str| resolved.iter().find(|ext| ext.name == name).unwrap();
        assert!(!find("furigana").enable);
        assert!(!find("emoji").enable);
        assert!(!find("container").enable);
        assert!(find("anchor").enable && find("toc").enable);
        assert_eq!(find("anchor").options, json!({"level": 2}));
        assert_eq!(find("toc").options, json!({"level": 2}));
    }

    #[test]
    fn nameless_and_malformed_entries_are_skipped() {
        let config =
            RendererConfig::from_json_str(r#"{"plugins": [{"enable": true}, 42, "emoji"]}"#).unwrap();
        assert_eq!(config.extensions().len(), DEFAULT_EXTENSIONS.len());
    }

    #[test]
    fn render_options_use_camel_case() {
        let config = RendererConfig::from_yaml_str("render:\n  xhtmlOut: true\n  html: false\n").unwrap();
        assert!(config.render.xhtml_out);
        assert!(!config.render.html);
        assert!(config.render.breaks);
        assert_eq!(config.render.quotes.chars().count(), 4);
    }

    #[test]
    fn default_quotes_keep_straight_doubles() {
        assert_eq!(RenderOptions::default().quotes, "\"\"\u{2018}\u{2019}");
        let html = crate::render("\"x\" 'y'\n", &RendererConfig::default()).unwrap();
        assert_eq!(html, "<p>\"x\" \u{2018}y\u{2019}</p>\n");
    }

    #[test]
    fn blank_and_broken_input() {
        assert_eq!(RendererConfig::from_yaml_str("  \n").unwrap(), RendererConfig::default());
        assert!(matches!(
            RendererConfig::from_json_str("{"),
            Err(MultimarkError::Config(_))
        ));
    }
}
