// src/probe.rs
//! Liveness probing of deduplicated candidates.
//!
//! Every candidate gets exactly one probe attempt per run; re-running the
//! pipeline is the retry mechanism. Probes run concurrently under a global
//! bound and each one is cancelled individually by its own timeout, so a
//! stuck host never stalls the rest of the batch.
//!
//! Two distinct "slow" outcomes: a response that arrives after the
//! acceptable-latency threshold but before the hard timeout is a policy
//! failure (`Timeout`); the hard timeout itself is transport-level
//! (`NetworkError`).

use std::sync::Arc;
use std::time::Duration;

use futures::{stream, StreamExt};
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::config::AuditorConfig;
use crate::ingest::types::CandidateRecord;
use crate::transport::{ProbeResponse, StreamTransport};

/// Content-type fragments a live stream endpoint plausibly answers with.
const PLAUSIBLE_TYPES: [&str; 4] = ["mpegurl", "m3u", "javascript", "plain"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Responded, but slower than the acceptable-latency policy allows.
    Timeout,
    /// Non-2xx response.
    BadStatus,
    /// Responded in time but the payload does not look like a stream.
    BadShape,
    /// Transport error or hard timeout; nothing usable came back.
    NetworkError,
    /// Scheme we cannot probe (rtmp/rtsp/udp/rtp); conservatively rejected.
    UnsupportedScheme,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::BadStatus => "bad_status",
            FailureKind::BadShape => "bad_shape",
            FailureKind::NetworkError => "network_error",
            FailureKind::UnsupportedScheme => "unsupported_scheme",
        }
    }
}

/// Outcome of one probe; 1:1 with its deduplicated candidate.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub record: CandidateRecord,
    pub success: bool,
    /// Round-trip seconds; meaningful only when `success` is true.
    pub latency_secs: f64,
    pub failure: Option<FailureKind>,
}

impl ProbeResult {
    fn ok(record: CandidateRecord, latency_secs: f64) -> Self {
        Self {
            record,
            success: true,
            latency_secs,
            failure: None,
        }
    }

    fn failed(record: CandidateRecord, kind: FailureKind) -> Self {
        Self {
            record,
            success: false,
            latency_secs: 0.0,
            failure: Some(kind),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProbePolicy {
    /// Hard per-probe deadline; exceeding it is a `NetworkError`.
    pub timeout: Duration,
    /// Acceptable round-trip; a timely-but-slow 2xx is a `Timeout`.
    pub max_latency_secs: f64,
    pub concurrency: usize,
    /// Fetch a body prefix and verify response shape.
    pub strict_shape: bool,
    pub min_payload_bytes: u64,
}

impl ProbePolicy {
    pub fn from_config(cfg: &AuditorConfig) -> Self {
        Self {
            timeout: Duration::from_secs(cfg.probe_timeout_secs),
            max_latency_secs: cfg.max_latency_secs,
            concurrency: cfg.concurrency,
            strict_shape: cfg.strict_shape,
            min_payload_bytes: cfg.min_payload_bytes,
        }
    }
}

pub struct Prober {
    transport: Arc<dyn StreamTransport>,
    policy: ProbePolicy,
}

impl Prober {
    pub fn new(transport: Arc<dyn StreamTransport>, policy: ProbePolicy) -> Self {
        Self { transport, policy }
    }

    /// Probe all candidates under the global concurrency bound. Result
    /// order is whatever the network gave us; the ranker sorts later.
    pub async fn probe_all(&self, records: Vec<CandidateRecord>) -> Vec<ProbeResult> {
        let results: Vec<ProbeResult> = stream::iter(records)
            .map(|record| self.probe_one(record))
            .buffer_unordered(self.policy.concurrency.max(1))
            .collect()
            .await;

        for r in &results {
            match r.failure {
                None => counter!("audit_probe_success_total").increment(1),
                Some(kind) => {
                    counter!("audit_probe_failure_total", "kind" => kind.as_str()).increment(1)
                }
            }
        }
        results
    }

    async fn probe_one(&self, record: CandidateRecord) -> ProbeResult {
        let scheme = match Url::parse(&record.url) {
            Ok(u) => u.scheme().to_string(),
            Err(_) => return ProbeResult::failed(record, FailureKind::NetworkError),
        };
        if scheme != "http" && scheme != "https" {
            // rtmp/rtsp/udp/rtp cannot be checked over the existence-check
            // mechanism; rejecting beats whitelisting an unprobed URL.
            return ProbeResult::failed(record, FailureKind::UnsupportedScheme);
        }

        let started = tokio::time::Instant::now();
        let attempt = tokio::time::timeout(
            self.policy.timeout,
            self.transport.probe(&record.url, self.policy.strict_shape),
        )
        .await;
        let latency = started.elapsed().as_secs_f64();

        match attempt {
            Err(_) => {
                debug!(url = %record.url, "probe hit hard timeout");
                ProbeResult::failed(record, FailureKind::NetworkError)
            }
            Ok(Err(e)) => {
                debug!(url = %record.url, error = %e, "probe transport error");
                ProbeResult::failed(record, FailureKind::NetworkError)
            }
            Ok(Ok(resp)) => {
                if !(200..300).contains(&resp.status) {
                    return ProbeResult::failed(record, FailureKind::BadStatus);
                }
                if latency > self.policy.max_latency_secs {
                    return ProbeResult::failed(record, FailureKind::Timeout);
                }
                if self.policy.strict_shape
                    && !plausible_shape(&resp, self.policy.min_payload_bytes)
                {
                    return ProbeResult::failed(record, FailureKind::BadShape);
                }
                histogram!("audit_probe_latency_seconds").record(latency);
                ProbeResult::ok(record, latency)
            }
        }
    }
}

/// Shape check: the content-type (or an `#EXTM3U` signature) must look like
/// a playlist/script/plain-text answer, and the payload must not be a stub.
fn plausible_shape(resp: &ProbeResponse, min_payload_bytes: u64) -> bool {
    let type_ok = resp
        .content_type
        .as_deref()
        .map(|ct| PLAUSIBLE_TYPES.iter().any(|t| ct.contains(t)))
        .unwrap_or(false)
        || resp.body_prefix.starts_with(b"#EXTM3U");
    let length = resp
        .content_length
        .unwrap_or(resp.body_prefix.len() as u64);
    type_ok && length > min_payload_bytes
}
