//! Web search result parsing (HTML results page).

use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

use copydesk_shared::{CopydeskError, Result};

/// One organic search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Append `q=<query>` to the configured endpoint.
pub fn build_search_url(endpoint: &str, query: &str) -> Result<Url> {
    let mut url = Url::parse(endpoint)
        .map_err(|e| CopydeskError::config(format!("invalid search_url '{endpoint}': {e}")))?;
    url.query_pairs_mut().append_pair("q", query.trim());
    Ok(url)
}

/// Parse up to `limit` hits that carry a non-empty snippet.
pub fn parse_search_results(html: &str, limit: usize) -> Vec<SearchHit> {
    static RESULT: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".result").expect("valid selector"));
    static LINK: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".result__a").expect("valid selector"));
    static SNIPPET: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".result__snippet").expect("valid selector"));

    let doc = Html::parse_document(html);
    doc.select(&RESULT)
        .filter_map(|result| {
            let link = result.select(&LINK).next()?;
            let snippet = result
                .select(&SNIPPET)
                .next()
                .map(|s| collapse(s.text()))
                .unwrap_or_default();
            if snippet.is_empty() {
                return None;
            }
            Some(SearchHit {
                title: collapse(link.text()),
                url: link.value().attr("href").unwrap_or_default().to_string(),
                snippet,
            })
        })
        .take(limit)
        .collect()
}

fn collapse<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
