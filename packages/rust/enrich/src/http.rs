//! HTTP client construction, bounded retry, and SSRF protection.

use std::net::IpAddr;
use std::time::Duration;

use reqwest::Client;
use reqwest::redirect::Policy;
use tracing::debug;
use url::Url;

use copydesk_shared::{CopydeskError, Result};

/// User-Agent string for enrichment requests.
pub(crate) const USER_AGENT: &str = concat!("copydesk/", env!("CARGO_PKG_VERSION"));

const MAX_REDIRECTS: usize = 5;

/// Build the shared client with an explicit per-request timeout. Every
/// redirect hop is checked with [`redirect_allowed`].
pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    let policy = Policy::custom(|attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        let allowed = attempt
            .previous()
            .first()
            .is_none_or(|origin| redirect_allowed(origin, attempt.url()));
        if allowed {
            attempt.follow()
        } else {
            let target = attempt.url().to_string();
            attempt.error(format!("redirect to {target} blocked"))
        }
    });

    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(policy)
        .timeout(timeout)
        .build()
        .map_err(|e| CopydeskError::Network(format!("failed to build HTTP client: {e}")))
}

/// GET `url`, retrying up to `retries` extra times with no backoff.
pub(crate) async fn fetch_with_retry(client: &Client, url: &Url, retries: u32) -> Result<String> {
    let attempts = retries.saturating_add(1);
    let mut last_error = None;

    for attempt in 1..=attempts {
        match fetch_text(client, url).await {
            Ok(body) => return Ok(body),
            Err(e) => {
                debug!(%url, attempt, attempts, error = %e, "fetch attempt failed");
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| CopydeskError::Network(format!("{url}: no attempts made"))))
}

async fn fetch_text(client: &Client, url: &Url) -> Result<String> {
    let response = client.get(url.as_str()).send().await.map_err(|e| {
        if e.is_timeout() {
            CopydeskError::Network(format!("{url}: timed out"))
        } else {
            CopydeskError::Network(format!("{url}: {e}"))
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(CopydeskError::Network(format!("{url}: HTTP {status}")));
    }

    response
        .text()
        .await
        .map_err(|e| CopydeskError::Network(format!("{url}: body read failed: {e}")))
}

// ---------------------------------------------------------------------------
// SSRF protection
// ---------------------------------------------------------------------------

/// Check if a URL targets a potentially dangerous resource.
pub(crate) fn is_ssrf_target(url: &Url) -> bool {
    match url.scheme() {
        "http" | "https" => {}
        _ => return true,
    }

    if let Some(host) = url.host_str() {
        let bare = host.trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = bare.parse::<IpAddr>() {
            return is_private_ip(&ip);
        }
        if host == "localhost" || host.ends_with(".local") || host.ends_with(".internal") {
            return true;
        }
    }

    false
}

/// Whether a redirect from the request's `origin` may go to `next`. Private
/// targets are only reachable from a request that already started at one.
pub(crate) fn redirect_allowed(origin: &Url, next: &Url) -> bool {
    if !matches!(next.scheme(), "http" | "https") {
        return false;
    }
    !is_ssrf_target(next) || is_ssrf_target(origin)
}

/// Check if an IP is in a private/reserved range.
fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified()
                // 100.64.0.0/10 (Carrier-grade NAT)
                || (v4.octets()[0] == 100 && (v4.octets()[1] & 0xC0) == 64)
        }
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_private_ip(&IpAddr::V4(v4));
            }
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                // fc00::/7 (unique local)
                || (first & 0xfe00) == 0xfc00
                // fe80::/10 (link-local)
                || (first & 0xffc0) == 0xfe80
        }
    }
}
