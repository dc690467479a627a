// src/transport.rs
//! Network collaborator: listing retrieval and probe requests.
//!
//! The pipeline only ever talks to the network through `StreamTransport`,
//! so integration tests can substitute an in-memory stub and the prober
//! stays free of HTTP details beyond status/headers.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::config::AuditorConfig;

/// Upstream hosts tend to gate on a plausible browser agent.
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// How much of a probed body we are willing to look at.
const PROBE_RANGE: &str = "bytes=0-1023";

#[derive(Debug, Clone)]
pub struct ListingBody {
    pub status: u16,
    pub body: String,
}

/// What a probe observed, before any policy is applied.
#[derive(Debug, Clone, Default)]
pub struct ProbeResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    /// First bytes of the body; empty unless the caller asked for them.
    pub body_prefix: Vec<u8>,
}

#[async_trait]
pub trait StreamTransport: Send + Sync {
    /// Retrieve the raw text of a listing.
    async fn fetch_listing(&self, url: &str) -> Result<ListingBody>;

    /// Lightweight existence check. With `want_body_prefix` the transport
    /// issues a ranged GET and returns the first bytes for shape checks;
    /// otherwise a HEAD suffices.
    async fn probe(&self, url: &str, want_body_prefix: bool) -> Result<ProbeResponse>;
}

/// Production transport on reqwest. Redirects are followed and invalid
/// certificates tolerated: stream hosts run self-signed TLS more often
/// than not, and we are checking liveness, not trust.
pub struct HttpTransport {
    client: reqwest::Client,
    fetch_timeout: Duration,
    probe_timeout: Duration,
}

impl HttpTransport {
    pub fn new(cfg: &AuditorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .danger_accept_invalid_certs(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("building http client")?;
        Ok(Self {
            client,
            fetch_timeout: Duration::from_secs(cfg.fetch_timeout_secs),
            probe_timeout: Duration::from_secs(cfg.probe_timeout_secs),
        })
    }
}

#[async_trait]
impl StreamTransport for HttpTransport {
    async fn fetch_listing(&self, url: &str) -> Result<ListingBody> {
        let resp = self
            .client
            .get(url)
            .timeout(self.fetch_timeout)
            .send()
            .await
            .context("listing get()")?;
        let status = resp.status().as_u16();
        let body = resp.text().await.context("listing .text()")?;
        Ok(ListingBody { status, body })
    }

    async fn probe(&self, url: &str, want_body_prefix: bool) -> Result<ProbeResponse> {
        let request = if want_body_prefix {
            self.client
                .get(url)
                .header(reqwest::header::RANGE, PROBE_RANGE)
        } else {
            self.client.head(url)
        };
        let mut resp = request
            .timeout(self.probe_timeout)
            .send()
            .await
            .context("probe send()")?;

        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_ascii_lowercase());
        let content_length = resp.content_length();

        // One chunk is enough for a signature check; servers that ignore
        // the Range header would otherwise stream the whole playlist.
        let body_prefix = if want_body_prefix {
            match resp.chunk().await {
                Ok(Some(bytes)) => bytes.to_vec(),
                _ => Vec::new(),
            }
        } else {
            Vec::new()
        };

        Ok(ProbeResponse {
            status,
            content_type,
            content_length,
            body_prefix,
        })
    }
}
