//! Parallel rendering of many documents with one renderer.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::Renderer;

/// A single document to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchInput {
    /// Document identifier (typically the file path).
    pub id: String,
    /// Markdown source.
    pub source: String,
}

/// Result for a single document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Identifier matching the input.
    pub id: String,
    /// Rendered HTML (present on success).
    pub html: Option<String>,
    /// Error message (present on failure).
    pub error: Option<String>,
}

/// Counters for a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStats {
    /// Number of documents processed.
    pub total: u32,
    /// Number rendered successfully.
    pub succeeded: u32,
    /// Number that failed.
    pub failed: u32,
    /// Wall-clock time in milliseconds.
    pub processing_time_ms: f64,
}

/// Options for a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchOptions {
    /// Thread count. Defaults to the rayon global pool.
    pub max_threads: Option<usize>,
    /// Keep going after a failure. Defaults to true; when false, documents
    /// are rendered in order and the run stops at the first failure.
    pub continue_on_error: Option<bool>,
}

/// Results in input order, plus statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchProcessingResult {
    /// One result per processed input.
    pub results: Vec<BatchResult>,
    /// Run statistics.
    pub stats: BatchStats,
}

/// Renders `inputs` with `renderer`, in parallel unless
/// `continue_on_error` is false.
pub fn render_batch(
    renderer: &Renderer,
    inputs: Vec<BatchInput>,
    options: &BatchOptions,
) -> BatchProcessingResult {
    let start = Instant::now();
    let total = inputs.len() as u32;
    let succeeded = AtomicU32::new(0);
    let failed = AtomicU32::new(0);

    let process = |input: BatchInput| -> BatchResult {
        match renderer.render(&input.source) {
            Ok(html) => {
                succeeded.fetch_add(1, Ordering::Relaxed);
                BatchResult {
                    id: input.id,
                    html: Some(html),
                    error: None,
                }
            }
            Err(err) => {
                log::warn!("Failed to render {}: {err}", input.id);
                failed.fetch_add(1, Ordering::Relaxed);
                BatchResult {
                    id: input.id,
                    html: None,
                    error: Some(err.to_string()),
                }
            }
        }
    };

    let results: Vec<BatchResult> = if options.continue_on_error.unwrap_or(true) {
        let pool = options.max_threads.and_then(|threads| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|err| log::warn!("Falling back to the global thread pool: {err}"))
                .ok()
        });
        match pool {
            Some(pool) => pool.install(|| inputs.into_par_iter().map(process).collect()),
            None => inputs.into_par_iter().map(process).collect(),
        }
    } else {
        let mut results = Vec::with_capacity(inputs.len());
        for input in inputs {
            let result = process(input);
            let stop = result.error.is_some();
            results.push(result);
            if stop {
                break;
            }
        }
        results
    };

    let stats = BatchStats {
        total,
        succeeded: succeeded.load(Ordering::Relaxed),
        failed: failed.load(Ordering::Relaxed),
        processing_time_ms: start.elapsed().as_secs_f64() * 1000.0,
    };
    log::debug!(
        "batch of {} rendered: {} ok, {} failed",
        stats.total,
        stats.succeeded,
        stats.failed
    );
    BatchProcessingResult { results, stats }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RendererConfig;

    fn inputs(count: usize) -> Vec<BatchInput> {
        (0..count)
            .map(|n| BatchInput {
                id: format!("doc{n}.md"),
                source: format!("# Doc {n}\n\n{{犬^いぬ}}\n"),
            })
            .collect()
    }

    #[test]
    fn renders_in_input_order() {
        let renderer = Renderer::new(&RendererConfig::default());
        let batch = render_batch(&renderer, inputs(8), &BatchOptions::default());
        assert_eq!(batch.stats.total, 8);
        assert_eq!(batch.stats.succeeded, 8);
        assert_eq!(batch.stats.failed, 0);
        for (n, result) in batch.results.iter().enumerate() {
            assert_eq!(result.id, format!("doc{n}.md"));
            let html = result.html.as_deref().unwrap();
            assert!(html.contains(&format!(">Doc {n}</h1>")));
            assert!(html.contains("<ruby><rb>犬</rb><rt>いぬ</rt></ruby>"));
        }
    }

    #[test]
    fn sequential_run_with_bounded_pool_options() {
        let renderer = Renderer::new(&RendererConfig::default());
        let options = BatchOptions {
            max_threads: Some(2),
            continue_on_error: Some(false),
        };
        let batch = render_batch(&renderer, inputs(3), &options);
        assert_eq!(batch.results.len(), 3);
        assert!(batch.results.iter().all(|r| r.error.is_none()));
    }
}
