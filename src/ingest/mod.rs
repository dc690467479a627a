// src/ingest/mod.rs
pub mod parse;
pub mod synth;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use futures::{stream, StreamExt};
use metrics::counter;
use tracing::{debug, warn};
use url::Url;

use crate::ingest::types::{CandidateRecord, RawListing};
use crate::transport::StreamTransport;

/// Drop locators that are blank, comments, or not absolute URLs. Malformed
/// locators must never reach the fetcher.
pub fn filter_locators<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut out = Vec::with_capacity(raw.len());
    for line in raw {
        let line = line.as_ref().trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match Url::parse(line) {
            Ok(u) if u.host_str().is_some() => out.push(line.to_string()),
            _ => warn!(locator = %line, "skipping malformed source locator"),
        }
    }
    out
}

/// Fetch every locator concurrently, capturing failure per listing.
///
/// Results come back in locator order (`buffered`, not `buffer_unordered`)
/// so that downstream deduplication has a deterministic first-seen order.
/// A failure on one locator never affects the others.
pub async fn fetch_listings(
    transport: &Arc<dyn StreamTransport>,
    locators: &[String],
    timeout: Duration,
    parallelism: usize,
) -> Vec<RawListing> {
    stream::iter(locators.iter().cloned())
        .map(|locator| {
            let transport = Arc::clone(transport);
            async move {
                let listing =
                    match tokio::time::timeout(timeout, transport.fetch_listing(&locator)).await {
                        Err(_) => RawListing::failed(locator, "listing fetch timed out"),
                        Ok(Err(e)) => RawListing::failed(locator, e.to_string()),
                        Ok(Ok(body)) if !(200..300).contains(&body.status) => {
                            RawListing::failed(locator, format!("http status {}", body.status))
                        }
                        Ok(Ok(body)) => RawListing::fetched(locator, body.body),
                    };
                if let Some(reason) = &listing.fetch_error {
                    warn!(locator = %listing.locator, %reason, "listing fetch failed");
                    counter!("audit_listing_errors_total").increment(1);
                }
                listing
            }
        })
        .buffered(parallelism.max(1))
        .collect()
        .await
}

/// Parse all fetched listings in order and concatenate their records.
pub fn parse_listings(listings: &[RawListing]) -> Vec<CandidateRecord> {
    let mut out = Vec::new();
    for listing in listings {
        let Some(content) = &listing.content else {
            continue;
        };
        let records = parse::parse_listing(&listing.locator, content);
        debug!(locator = %listing.locator, records = records.len(), "parsed listing");
        counter!("audit_candidates_total").increment(records.len() as u64);
        out.extend(records);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locator_filter_keeps_only_absolute_urls() {
        let raw = [
            "# comment",
            "",
            "http://a.example/list.m3u",
            "not a url",
            "  https://b.example/tv.txt  ",
        ];
        let kept = filter_locators(&raw);
        assert_eq!(
            kept,
            vec![
                "http://a.example/list.m3u".to_string(),
                "https://b.example/tv.txt".to_string(),
            ]
        );
    }

    #[test]
    fn failed_listings_parse_to_nothing() {
        let listings = vec![
            RawListing::failed("http://dead.example/1.txt", "http status 503"),
            RawListing::fetched("http://ok.example/2.txt", "A,http://h/a\n"),
        ];
        let records = parse_listings(&listings);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].origin, "http://ok.example/2.txt");
    }
}
