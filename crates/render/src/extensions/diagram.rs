//! Fences handed to client-side renderers: mermaid, graphviz and frappe
//! charts.

use multimark_core::MultimarkError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::Extension;
use crate::engine::{Engine, FenceBlock};

static MERMAID_GRAPH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^graph (?:TB|BT|RL|LR|TD);?$").expect("static regex"));

fn mermaid(fence: &FenceBlock<'_>) -> Option<String> {
    if fence.info.trim() != "mermaid" {
        return None;
    }
    let code = fence.code.trim();
    let first = code.lines().next().unwrap_or_default().trim();
    let style = if MERMAID_GRAPH.is_match(first) { " graph" } else { "" };
    Some(format!(
        "<pre class=\"mermaid{style}\">{}</pre>",
        html_escape::encode_text(code)
    ))
}

fn graphviz(fence: &FenceBlock<'_>) -> Option<String> {
    if !matches!(fence.info.trim(), "graphviz" | "dot") {
        return None;
    }
    Some(format!(
        "<pre class=\"graphviz\">{}</pre>",
        html_escape::encode_text(fence.code)
    ))
}

/// The chart id comes from the fence position so output is reproducible.
fn chart(fence: &FenceBlock<'_>) -> Option<String> {
    if fence.info.trim() != "chart" {
        return None;
    }
    let id = format!("chart{}", fence.ordinal);
    Some(format!(
        "<div id=\"{id}\" class=\"chart-container\"></div>\
         <script type=\"text/javascript\">\
         var {id} = new frappe.Chart(document.getElementById('{id}'), {});\
         window.addEventListener('pjax:send', function() {{ {id}.destroy() }});\
         </script>",
        fence.code.trim()
    ))
}

/// Registers the `mermaid` fence renderer.
pub struct Mermaid;

impl Extension for Mermaid {
    fn name(&self) -> &str {
        "mermaid"
    }

    fn register(&self, engine: &mut Engine, _options: &Value) -> Result<(), MultimarkError> {
        engine.add_fence_renderer(self.name(), Box::new(mermaid));
        Ok(())
    }
}

/// Registers the `graphviz` fence renderer.
pub struct Graphviz;

impl Extension for Graphviz {
    fn name(&self) -> &str {
        "graphviz"
    }

    fn register(&self, engine: &mut Engine, _options: &Value) -> Result<(), MultimarkError> {
        engine.add_fence_renderer(self.name(), Box::new(graphviz));
        Ok(())
    }
}

/// Registers the `chart` fence renderer.
pub struct Chart;

impl Extension for Chart {
    fn name(&self) -> &str {
        "chart"
    }

    fn register(&self, engine: &mut Engine, _options: &Value) -> Result<(), MultimarkError> {
        engine.add_fence_renderer(self.name(), Box::new(chart));
        Ok(())
    }
}
