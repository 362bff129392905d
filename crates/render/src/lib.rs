#![deny(missing_docs)]
//! multimark renderer: configuration, extensions and MDAST to HTML on top
//! of the multimark core pre-pass.

/// Parallel rendering of many documents.
pub mod batch;
/// Renderer configuration and extension merging.
pub mod config;
/// The engine extensions register against.
pub mod engine;
/// Built-in extensions and the registry.
pub mod extensions;
/// MDAST to HTML.
pub mod html;
/// Smart quotes and typographic replacements.
pub mod typographer;

pub use batch::{BatchInput, BatchOptions, BatchProcessingResult, BatchResult, BatchStats, render_batch};
pub use config::{
    DEFAULT_EXTENSIONS, ExtensionConfig, PluginEntry, RenderOptions, RendererConfig, ResolvedExtension,
    resolve_extensions,
};
pub use engine::{Engine, FenceBlock, FenceRenderer, HtmlPass, PassStage, RenderedDocument};
pub use extensions::{Extension, ExtensionRegistry};
pub use html::HeadingEntry;
pub use multimark_core::MultimarkError;

/// A configured renderer. Build once, render many documents.
#[derive(Debug)]
pub struct Renderer {
    engine: Engine,
}

impl Renderer {
    /// Builds a renderer with the built-in extensions.
    pub fn new(config: &RendererConfig) -> Self {
        Self::with_registry(config, &ExtensionRegistry::builtin())
    }

    /// Builds a renderer resolving extension names against `registry`.
    pub fn with_registry(config: &RendererConfig, registry: &ExtensionRegistry) -> Self {
        let mut engine = Engine::new(config.render.clone());
        registry.apply(&mut engine, &config.extensions());
        Self { engine }
    }

    /// Wraps an engine configured by hand.
    pub fn from_engine(engine: Engine) -> Self {
        Self { engine }
    }

    /// The underlying engine.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Renders `markdown` to HTML.
    pub fn render(&self, markdown: &str) -> Result<String, MultimarkError> {
        Ok(self.engine.render(markdown)?.html)
    }

    /// Renders `markdown`, also returning its headings.
    pub fn render_document(&self, markdown: &str) -> Result<RenderedDocument, MultimarkError> {
        self.engine.render(markdown)
    }
}

/// Builds a renderer from `config` and renders one document.
pub fn render(markdown: &str, config: &RendererConfig) -> Result<String, MultimarkError> {
    Renderer::new(config).render(markdown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ruby_with_default_config() {
        let html = render(
            "この{可愛い犬^か・わい・い・いぬ}は{東京^とう・きょう}から来た。\n",
            &RendererConfig::default(),
        )
        .unwrap();
        insta::assert_snapshot!(html, @"<p>この<ruby><rb>可</rb><rt>か</rt></ruby><ruby><rb>愛</rb><rt>わい</rt></ruby><ruby><rb>い</rb><rt>い</rt></ruby><ruby><rb>犬</rb><rt>いぬ</rt></ruby>は<ruby><rb>東</rb><rt>とう</rt></ruby><ruby><rb>京</rb><rt>きょう</rt></ruby>から来た。</p>");
    }

    #[test]
    fn default_extensions_work_together() {
        let html = render(
            "# Notes\n\nH~2~O and 2^10^ are ==marked== :tada:\n\n::: info\n$e = mc^2$ -- \"quoted\" it's\n:::\n",
            &RendererConfig::default(),
        )
        .unwrap();
        insta::assert_snapshot!(html, @r#"
        <h1 id="notes">Notes</h1>
        <p>H<sub>2</sub>O and 2<sup>10</sup> are <mark>marked</mark> 🎉</p>
        <div class="note info">
        <p><span class="math inline">e = mc^2</span> – "quoted" it’s</p>
        </div>
        "#);
    }

    #[test]
    fn yaml_config_disables_and_configures_extensions() {
        let config = RendererConfig::from_yaml_str(
            "render:\n  typographer: false\nplugins:\n  - name: furigana\n    enable: false\n  - plugin:\n      name: anchor\n      enable: true\n      options:\n        level: 2\n  - plugin:\n      name: emoji\n",
        )
        .unwrap();
        let html = render("# Top\n\n## Title\n\n{犬^いぬ} :tada:\n", &config).unwrap();
        assert_eq!(html, "<h1>Top</h1>\n<h2 id=\"title\">Title</h2>\n<p>{犬^いぬ} :tada:</p>\n");
    }

    #[test]
    fn failing_extension_is_skipped() {
        let config = RendererConfig::from_json_str(
            r#"{"plugins": [{"name": "prism", "options": {"defaultLanguage": "klingon"}}]}"#,
        )
        .unwrap();
        let html = render("```rust\nfn x() {}\n```\n", &config).unwrap();
        assert_eq!(html, "<pre><code class=\"language-rust\">fn x() {}\n</code></pre>\n");
    }

    #[test]
    fn empty_registry_renders_plain_markdown() {
        let renderer = Renderer::with_registry(&RendererConfig::default(), &ExtensionRegistry::empty());
        assert_eq!(renderer.render("{犬^いぬ} ~~x~~\n").unwrap(), "<p>{犬^いぬ} ~~x~~</p>\n");
    }

    #[test]
    fn documents_report_headings() {
        let renderer = Renderer::new(&RendererConfig::default());
        let doc = renderer.render_document("# A\n\n## B\n").unwrap();
        let slugs: Vec<_> = doc.headings.iter().map(|h| h.slug.as_str()).collect();
        assert_eq!(slugs, ["a", "b"]);
    }
}
