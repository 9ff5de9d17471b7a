//! Homepage fetching over HTTPS with an HTTP fallback.
//!
//! Each domain is tried as `https://<domain>` then `http://<domain>` (plus the
//! `www.` variants when enabled). The first candidate that answers with a 2xx
//! or 3xx status wins; otherwise the last candidate's error is returned,
//! classified so callers can tell timeouts, connection failures, TLS failures
//! and HTTP errors apart.

use std::error::Error as StdError;
use std::future::Future;
use std::time::Duration;

use rand::seq::SliceRandom;
use reqwest::{redirect, Client, StatusCode};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::ScanConfig;

const DETAIL_CHAR_LIMIT: usize = 120;

/// Desktop browser agents rotated per domain.
pub const BROWSER_USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_7_1) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.4 Safari/605.1.15",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.0 Safari/605.1.15",
];

/// Coarse failure category, recoverable from [`FetchError`]'s message prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Timeout,
    Connection,
    Tls,
    Http,
    InvalidDomain,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Timeout after {timeout:?} ({url})")]
    Timeout { url: String, timeout: Duration },

    #[error("Connection error ({url}): {detail}")]
    Connection { url: String, detail: String },

    #[error("TLS error ({url}): {detail}")]
    Tls { url: String, detail: String },

    #[error("HTTP error ({url}): status {status}")]
    Status { url: String, status: u16 },

    #[error("HTTP error ({url}): {detail}")]
    Http { url: String, detail: String },

    #[error("Invalid domain: {domain}")]
    InvalidDomain { domain: String },
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::Timeout { .. } => FetchErrorKind::Timeout,
            FetchError::Connection { .. } => FetchErrorKind::Connection,
            FetchError::Tls { .. } => FetchErrorKind::Tls,
            FetchError::Status { .. } | FetchError::Http { .. } => FetchErrorKind::Http,
            FetchError::InvalidDomain { .. } => FetchErrorKind::InvalidDomain,
        }
    }
}

/// A successfully fetched homepage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Final URL after redirects.
    pub url: String,
    pub status: u16,
    pub body: String,
}

/// Anything that can produce a domain's homepage.
pub trait PageSource {
    fn fetch(&self, domain: &str) -> impl Future<Output = Result<FetchedPage, FetchError>>;
}

/// Candidate URLs for `domain`, in the order they are tried.
pub fn candidate_urls(domain: &str, try_www: bool) -> Vec<String> {
    let with_www = try_www && !domain.starts_with("www.");
    let mut urls = Vec::with_capacity(4);
    for scheme in ["https", "http"] {
        urls.push(format!("{scheme}://{domain}"));
        if with_www {
            urls.push(format!("{scheme}://www.{domain}"));
        }
    }
    urls
}

pub struct PageFetcher {
    client: Client,
    timeout: Duration,
    try_www: bool,
    user_agent: Option<String>,
}

impl PageFetcher {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: &ScanConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .redirect(redirect::Policy::limited(config.max_redirects))
            .build()?;
        Ok(Self {
            client,
            timeout: config.timeout,
            try_www: config.try_www,
            user_agent: config.user_agent.clone(),
        })
    }

    fn pick_user_agent(&self) -> &str {
        match &self.user_agent {
            Some(agent) => agent,
            None => BROWSER_USER_AGENTS
                .choose(&mut rand::thread_rng())
                .copied()
                .unwrap_or(BROWSER_USER_AGENTS[0]),
        }
    }

    async fn fetch_url(&self, raw_url: &str, user_agent: &str) -> Result<FetchedPage, FetchError> {
        let url = Url::parse(raw_url).map_err(|_| FetchError::InvalidDomain {
            domain: raw_url.to_string(),
        })?;

        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, user_agent)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .send()
            .await
            .map_err(|e| self.map_transport_error(raw_url, &e))?;

        let status = response.status();
        let final_url = response.url().to_string();
        if !is_acceptable(status) {
            return Err(FetchError::Status {
                url: final_url,
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(&final_url, &e))?;

        Ok(FetchedPage {
            url: final_url,
            status: status.as_u16(),
            body,
        })
    }

    fn map_transport_error(&self, url: &str, error: &reqwest::Error) -> FetchError {
        classify_transport_error(url, error, self.timeout)
    }
}

impl PageSource for PageFetcher {
    async fn fetch(&self, domain: &str) -> Result<FetchedPage, FetchError> {
        let user_agent = self.pick_user_agent().to_string();
        let mut last_error = FetchError::InvalidDomain {
            domain: domain.to_string(),
        };

        for url in candidate_urls(domain, self.try_www) {
            debug!(action = "fetch", component = "page_fetcher", url = %url, user_agent = %user_agent, "Checking URL");
            match self.fetch_url(&url, &user_agent).await {
                Ok(page) => return Ok(page),
                Err(error) => {
                    debug!(action = "fetch_failed", component = "page_fetcher", url = %url, error = %error, "Candidate URL failed");
                    last_error = error;
                }
            }
        }

        Err(last_error)
    }
}

fn is_acceptable(status: StatusCode) -> bool {
    status.is_success() || status.is_redirection()
}

/// `url` labels the error only when reqwest does not report the URL that
/// failed, which after a redirect differs from the candidate.
fn classify_transport_error(url: &str, error: &reqwest::Error, timeout: Duration) -> FetchError {
    let url = error
        .url()
        .map(|failed| failed.to_string())
        .unwrap_or_else(|| url.to_string());
    if error.is_timeout() {
        return FetchError::Timeout { url, timeout };
    }

    let detail = error_detail(error);
    if error.is_builder() {
        FetchError::InvalidDomain { domain: url }
    } else if looks_like_tls_failure(&detail) {
        FetchError::Tls { url, detail }
    } else if error.is_connect() {
        FetchError::Connection { url, detail }
    } else if error.is_redirect() {
        FetchError::Http {
            url,
            detail: "too many redirects".to_string(),
        }
    } else {
        FetchError::Http { url, detail }
    }
}

/// Innermost cause of `error`, trimmed to a readable length.
fn error_detail(error: &(dyn StdError + 'static)) -> String {
    let mut innermost = error;
    while let Some(source) = innermost.source() {
        innermost = source;
    }
    let compact = innermost
        .to_string()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if compact.chars().count() > DETAIL_CHAR_LIMIT {
        let preview: String = compact.chars().take(DETAIL_CHAR_LIMIT).collect();
        format!("{preview}...")
    } else {
        compact
    }
}

fn looks_like_tls_failure(detail: &str) -> bool {
    const TLS_MARKERS: [&str; 6] = [
        "certificate",
        "tls",
        "ssl",
        "handshake",
        "corrupt message",
        "unknownissuer",
    ];
    let detail = detail.to_lowercase();
    TLS_MARKERS.iter().any(|marker| detail.contains(marker))
}
