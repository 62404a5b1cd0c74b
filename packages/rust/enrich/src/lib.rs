//! Best-effort product enrichment: manufacturer page scraping and web search.
//!
//! Every source is optional. A failure (timeout, HTTP error, SSRF block,
//! empty page) becomes a [`CopydeskError::PartialEnrichment`], is logged at
//! `warn`, and the source is simply absent from the [`Enrichment`].

mod http;
pub mod manufacturer;
pub mod search;

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, instrument, warn};
use url::Url;

use copydesk_shared::{CopydeskError, EnrichmentOptions, Result};
use copydesk_storage::Storage;

pub use manufacturer::{ManufacturerInfo, cache_key, parse_manufacturer_page};
pub use search::{SearchHit, build_search_url, parse_search_results};

const MANUFACTURER: &str = "manufacturer";
const SEARCH: &str = "search";

/// What to look up for one product.
#[derive(Debug, Clone, Default)]
pub struct EnrichmentRequest {
    /// Manufacturer page to scrape.
    pub manufacturer_url: Option<String>,
    /// Name looked for on the manufacturer page.
    pub product_name: String,
    /// Web search query, when search is wanted.
    pub search_query: Option<String>,
}

/// Whatever enrichment could be gathered.
#[derive(Debug, Clone, Default)]
pub struct Enrichment {
    pub manufacturer: Option<ManufacturerInfo>,
    pub search: Option<Vec<SearchHit>>,
    /// Sources that were requested but unavailable.
    pub unavailable: Vec<String>,
}

impl Enrichment {
    /// Nothing to add to the description.
    pub fn is_empty(&self) -> bool {
        self.manufacturer.is_none() && self.search.is_none()
    }

    /// Names of the sources that contributed.
    pub fn sources(&self) -> Vec<String> {
        let mut sources = Vec::new();
        if self.manufacturer.is_some() {
            sources.push(MANUFACTURER.to_string());
        }
        if self.search.is_some() {
            sources.push(SEARCH.to_string());
        }
        sources
    }

    /// First non-empty search snippet.
    pub fn top_snippet(&self) -> Option<&str> {
        self.search
            .as_ref()?
            .iter()
            .map(|hit| hit.snippet.as_str())
            .find(|s| !s.is_empty())
    }
}

/// HTTP-backed enrichment with a timeout and a single bounded retry.
pub struct Enricher {
    client: Client,
    options: EnrichmentOptions,
    /// Allow localhost/private IPs (integration tests with mock servers).
    allow_localhost: bool,
}

impl Enricher {
    pub fn new(options: EnrichmentOptions) -> Result<Self> {
        let client = http::build_client(Duration::from_secs(options.timeout_secs))?;
        Ok(Self {
            client,
            options,
            allow_localhost: false,
        })
    }

    /// Allow fetching localhost/private IPs (for integration tests).
    pub fn allow_localhost(mut self) -> Self {
        self.allow_localhost = true;
        self
    }

    pub fn options(&self) -> &EnrichmentOptions {
        &self.options
    }

    /// Run every requested source concurrently.
    #[instrument(skip_all, fields(product = %request.product_name))]
    pub async fn enrich(&self, request: &EnrichmentRequest, storage: Option<&Storage>) -> Enrichment {
        let manufacturer = async {
            match &request.manufacturer_url {
                Some(url) => Some(self.manufacturer(url, &request.product_name, storage).await),
                None => None,
            }
        };
        let search = async {
            match &request.search_query {
                Some(query) => Some(self.search(query).await),
                None => None,
            }
        };
        let (manufacturer, search) = tokio::join!(manufacturer, search);

        let mut enrichment = Enrichment::default();
        match manufacturer {
            Some(Some(info)) => enrichment.manufacturer = Some(info),
            Some(None) => enrichment.unavailable.push(MANUFACTURER.to_string()),
            None => {}
        }
        match search {
            Some(Some(hits)) => enrichment.search = Some(hits),
            Some(None) => enrichment.unavailable.push(SEARCH.to_string()),
            None => {}
        }

        info!(
            sources = ?enrichment.sources(),
            unavailable = ?enrichment.unavailable,
            "enrichment finished"
        );
        enrichment
    }

    /// Scrape a manufacturer page, consulting the cache first.
    pub async fn manufacturer(
        &self,
        website: &str,
        product_name: &str,
        storage: Option<&Storage>,
    ) -> Option<ManufacturerInfo> {
        let key = cache_key(website, product_name);

        if let Some(storage) = storage {
            match storage.get_enrichment_cache(&key).await {
                Ok(Some(json)) => match serde_json::from_str::<ManufacturerInfo>(&json) {
                    Ok(info) => {
                        debug!(website, "manufacturer info served from cache");
                        return Some(info);
                    }
                    Err(e) => warn!(website, error = %e, "discarding unreadable cache entry"),
                },
                Ok(None) => {}
                Err(e) => warn!(website, error = %e, "enrichment cache lookup failed"),
            }
        }

        let info = soft_fail(self.fetch_manufacturer(website, product_name).await)?;

        if let Some(storage) = storage {
            let stored = match serde_json::to_string(&info) {
                Ok(json) => storage.set_enrichment_cache(&key, MANUFACTURER, &json).await,
                Err(e) => Err(CopydeskError::Storage(e.to_string())),
            };
            if let Err(e) = stored {
                warn!(website, error = %e, "failed to cache manufacturer info");
            }
        }

        Some(info)
    }

    /// Run a web search and keep the top hits.
    pub async fn search(&self, query: &str) -> Option<Vec<SearchHit>> {
        soft_fail(self.fetch_search(query).await)
    }

    async fn fetch_manufacturer(&self, website: &str, product_name: &str) -> Result<ManufacturerInfo> {
        let url = self.checked_url(MANUFACTURER, website)?;
        let html = http::fetch_with_retry(&self.client, &url, self.options.retries)
            .await
            .map_err(|e| CopydeskError::partial(MANUFACTURER, e.to_string()))?;

        let info = parse_manufacturer_page(&html, url.as_str(), product_name);
        if info.is_empty() {
            return Err(CopydeskError::partial(
                MANUFACTURER,
                format!("{url}: no company name or features found"),
            ));
        }
        Ok(info)
    }

    async fn fetch_search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let url = build_search_url(&self.options.search_url, query)
            .map_err(|e| CopydeskError::partial(SEARCH, e.to_string()))?;
        let url = self.checked_url(SEARCH, url.as_str())?;

        let html = http::fetch_with_retry(&self.client, &url, self.options.retries)
            .await
            .map_err(|e| CopydeskError::partial(SEARCH, e.to_string()))?;

        let hits = parse_search_results(&html, self.options.max_search_results);
        if hits.is_empty() {
            return Err(CopydeskError::partial(SEARCH, format!("no results for '{query}'")));
        }
        Ok(hits)
    }

    /// Parse and SSRF-check a target URL.
    fn checked_url(&self, source: &str, raw: &str) -> Result<Url> {
        let url = Url::parse(raw.trim())
            .map_err(|e| CopydeskError::partial(source, format!("invalid URL '{raw}': {e}")))?;
        if !self.allow_localhost && http::is_ssrf_target(&url) {
            return Err(CopydeskError::partial(
                source,
                format!("{url}: blocked by SSRF protection"),
            ));
        }
        Ok(url)
    }
}

/// Log a failed source and drop it.
fn soft_fail<T>(result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(error = %e, "enrichment source skipped");
            None
        }
    }
}
