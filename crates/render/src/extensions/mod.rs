//! Built-in extensions and the registry that applies them.
//!
//! An extension receives the [`Engine`] and its options and registers
//! rules, token renderers, fence renderers or parse switches. Extensions
//! are applied in the order produced by
//! [`resolve_extensions`](crate::config::resolve_extensions).

pub mod abbr;
pub mod anchor;
pub mod attrs;
pub mod container;
pub mod deflist;
pub mod diagram;
pub mod emoji;
pub mod excerpt;
pub mod furigana;
pub mod gfm;
pub mod marks;
pub mod math;
pub mod pangu;
pub mod prism;

use std::collections::HashMap;
use std::fmt;

use multimark_core::MultimarkError;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::ResolvedExtension;
use crate::engine::Engine;

/// A named unit of functionality registered against the engine.
pub trait Extension: Send + Sync {
    /// Name used in configuration.
    fn name(&self) -> &str;

    /// Registers with `engine`. `options` is `Null` when none were given.
    fn register(&self, engine: &mut Engine, options: &Value) -> Result<(), MultimarkError>;
}

/// Extensions by name.
#[derive(Default)]
pub struct ExtensionRegistry {
    extensions: HashMap<String, Box<dyn Extension>>,
}

impl ExtensionRegistry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry holding every built-in extension.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(abbr::Abbr));
        registry.register(Box::new(attrs::BracketedSpans));
        registry.register(Box::new(attrs::AttrsExtension));
        registry.register(Box::new(deflist::Deflist));
        gfm::install(&mut registry);
        registry.register(Box::new(emoji::Emoji));
        marks::install(&mut registry);
        registry.register(Box::new(anchor::Anchor));
        registry.register(Box::new(anchor::Toc));
        registry.register(Box::new(pangu::Pangu));
        registry.register(Box::new(container::Container));
        registry.register(Box::new(container::Spoiler));
        registry.register(Box::new(furigana::Furigana));
        registry.register(Box::new(math::Katex));
        registry.register(Box::new(diagram::Mermaid));
        registry.register(Box::new(diagram::Graphviz));
        registry.register(Box::new(diagram::Chart));
        registry.register(Box::new(prism::Prism));
        registry.register(Box::new(excerpt::Excerpt));
        registry
    }

    /// Adds or replaces an extension under its name.
    pub fn register(&mut self, extension: Box<dyn Extension>) {
        self.extensions.insert(extension.name().to_string(), extension);
    }

    /// Looks up an extension.
    pub fn get(&self, name: &str) -> Option<&dyn Extension> {
        self.extensions.get(name).map(|ext| ext.as_ref())
    }

    /// Registers every enabled entry of `resolved` with `engine`.
    ///
    /// Unknown names and failing extensions are logged and skipped.
    pub fn apply(&self, engine: &mut Engine, resolved: &[ResolvedExtension]) {
        for entry in resolved.iter().filter(|entry| entry.enable) {
            let Some(extension) = self.get(&entry.name) else {
                log::warn!("Unknown extension {}, skipping", entry.name);
                continue;
            };
            match extension.register(engine, &entry.options) {
                Ok(()) => log::debug!("registered extension {}", entry.name),
                Err(err) => log::warn!("Failed to load extension {}: {err}", entry.name),
            }
        }
    }
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.extensions.keys().collect();
        names.sort();
        f.debug_struct("ExtensionRegistry").field("extensions", &names).finish()
    }
}

/// Deserializes extension options; `Null` yields the defaults.
pub fn parse_options<T>(extension: &str, options: &Value) -> Result<T, MultimarkError>
where
    T: DeserializeOwned + Default,
{
    if options.is_null() {
        return Ok(T::default());
    }
    T::deserialize(options).map_err(|err| MultimarkError::invalid_options(extension, err.to_string()))
}
