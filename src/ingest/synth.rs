// src/ingest/synth.rs
//! URL synthesis for host[:port] candidates.
//!
//! Asset-index style listings hand us endpoints, not playable URLs. Each
//! bare endpoint expands into scheme × well-known-suffix combinations;
//! records that already carry a path pass through untouched. Expansion is
//! capped per host, truncating deterministically (scheme-major, then path
//! order) instead of failing.

use once_cell::sync::OnceCell;
use regex::Regex;
use tracing::warn;
use url::Url;

use crate::ingest::types::CandidateRecord;

/// Expand every bare endpoint in `records`, preserving overall order.
pub fn expand_candidates(
    records: Vec<CandidateRecord>,
    suffix_paths: &[String],
    max_per_host: usize,
) -> Vec<CandidateRecord> {
    records
        .into_iter()
        .flat_map(|rec| expand_one(rec, suffix_paths, max_per_host))
        .collect()
}

fn expand_one(
    rec: CandidateRecord,
    suffix_paths: &[String],
    max_per_host: usize,
) -> Vec<CandidateRecord> {
    let Some((schemes, host, port)) = bare_endpoint(&rec.url) else {
        return vec![rec];
    };

    let cap = max_per_host.max(1);
    let mut out = Vec::new();
    'schemes: for scheme in schemes {
        for path in suffix_paths {
            if out.len() >= cap {
                warn!(host = %host, cap, "synthesis cap reached, truncating expansion");
                break 'schemes;
            }
            out.push(CandidateRecord::new(
                rec.display_name.clone(),
                endpoint_url(scheme, &host, port, path),
                rec.origin.clone(),
            ));
        }
    }
    out
}

/// Recognize a candidate URL that is really a bare `host[:port]` endpoint.
/// Returns the schemes to try: the declared one when it is http/https,
/// both otherwise.
fn bare_endpoint(raw: &str) -> Option<(Vec<&'static str>, String, Option<u16>)> {
    let raw = raw.trim();

    if raw.contains("://") {
        let url = Url::parse(raw).ok()?;
        let scheme = match url.scheme() {
            "http" => "http",
            "https" => "https",
            _ => return None,
        };
        let host = url.host_str()?.to_string();
        let pathless = url.path().is_empty() || url.path() == "/";
        if !pathless || url.query().is_some() {
            return None;
        }
        // Url::port() is already None when the port is the scheme default.
        return Some((vec![scheme], host, url.port()));
    }

    static RE_ENDPOINT: OnceCell<Regex> = OnceCell::new();
    let re = RE_ENDPOINT.get_or_init(|| {
        Regex::new(r"^([A-Za-z0-9][A-Za-z0-9._-]*\.[A-Za-z0-9][A-Za-z0-9_-]*)(?::(\d{1,5}))?$")
            .unwrap()
    });
    let caps = re.captures(raw)?;
    let host = caps[1].to_string();
    let port = match caps.get(2) {
        Some(p) => Some(p.as_str().parse::<u16>().ok()?),
        None => None,
    };
    Some((vec!["http", "https"], host, port))
}

/// Build `scheme://host[:port]path`, omitting the port when it is the
/// scheme default (80 for http, 443 for https).
fn endpoint_url(scheme: &str, host: &str, port: Option<u16>, path: &str) -> String {
    let port_part = match (scheme, port) {
        (_, None) | ("http", Some(80)) | ("https", Some(443)) => String::new(),
        (_, Some(p)) => format!(":{p}"),
    };
    let slash = if path.starts_with('/') { "" } else { "/" };
    format!("{scheme}://{host}{port_part}{slash}{path}")
}
