//! End-to-end `generate` pipeline: code → record → samples → enrichment →
//! compose → history.

use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use copydesk_catalog::{Catalog, SpecEntry, parse_spec_text};
use copydesk_enrich::{Enricher, Enrichment, EnrichmentRequest};
use copydesk_shared::{ComposeOptions, GeneratedContent, GenerationId, ProductRecord, Result};
use copydesk_storage::Storage;

use crate::compose::compose;

/// One generation request.
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    /// Product code to look up.
    pub code: String,
    /// Manufacturer page to scrape, overriding the record's website.
    pub manufacturer_url: Option<String>,
    /// Run a web search for the product.
    pub search: bool,
    /// Read and write the manufacturer cache in storage.
    pub cache_enrichment: bool,
}

/// Result of the `generate` pipeline.
#[derive(Debug)]
pub struct GenerateResult {
    pub record: ProductRecord,
    pub content: GeneratedContent,
    /// Parsed spec rows behind `content.spec_table_html`.
    pub specs: Vec<SpecEntry>,
    pub enrichment: Enrichment,
    /// History ID, when the generation was stored.
    pub generation_id: Option<GenerationId>,
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the pipeline completes.
    fn done(&self, result: &GenerateResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _result: &GenerateResult) {}
}

/// Run the full `generate` pipeline.
///
/// Only a missing code fails the request. Enrichment is skipped when no
/// enricher is given, and storage problems are logged and ignored.
#[instrument(skip_all, fields(code = %request.code))]
pub async fn generate(
    catalog: &Catalog,
    request: &GenerateRequest,
    enricher: Option<&Enricher>,
    storage: Option<&Storage>,
    options: &ComposeOptions,
    progress: &dyn ProgressReporter,
) -> Result<GenerateResult> {
    let start = Instant::now();

    progress.phase("Looking up product");
    let record = catalog.lookup(&request.code)?;
    let samples = catalog.style_samples(record, options.similar_limit);
    info!(
        code = %record.code,
        category = %record.category,
        samples = samples.len(),
        "product found"
    );

    let enrichment = match enricher {
        Some(enricher) => {
            progress.phase("Gathering enrichment");
            let enrichment_request = enrichment_request(record, request, enricher);
            let cache = storage.filter(|_| request.cache_enrichment);
            enricher.enrich(&enrichment_request, cache).await
        }
        None => Enrichment::default(),
    };

    progress.phase("Composing content");
    let content = compose(record, &samples, &enrichment, options);

    let mut generation_id = None;
    if let Some(storage) = storage {
        progress.phase("Saving history");
        match storage.insert_generation(&content).await {
            Ok(id) => generation_id = Some(id),
            Err(e) => warn!(error = %e, "failed to record generation history"),
        }
    }

    let result = GenerateResult {
        record: record.clone(),
        specs: parse_spec_text(&record.spec_text),
        content,
        enrichment,
        generation_id,
        elapsed: start.elapsed(),
    };
    progress.done(&result);

    info!(
        code = %result.record.code,
        confidence = result.content.style_confidence,
        sources = ?result.content.enrichment_sources,
        elapsed_ms = result.elapsed.as_millis() as u64,
        "generation complete"
    );

    Ok(result)
}

fn enrichment_request(
    record: &ProductRecord,
    request: &GenerateRequest,
    enricher: &Enricher,
) -> EnrichmentRequest {
    let manufacturer_url = request
        .manufacturer_url
        .clone()
        .or_else(|| record.manufacturer_website.clone())
        .filter(|url| !url.trim().is_empty());
    let search_query = (request.search || enricher.options().search_enabled)
        .then(|| format!("{} {}", record.title, record.category));

    EnrichmentRequest {
        manufacturer_url,
        product_name: record.display_name(),
        search_query,
    }
}
