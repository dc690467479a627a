// src/pipeline.rs
//! The batch pipeline: fetch → parse → synthesize → dedup → probe →
//! classify/rank → partition. Each stage consumes the complete output of
//! the previous one; nothing is reported until the whole pass finishes.
//!
//! Stage failures are data (skipped listings, rejected candidates). The
//! run itself only errors when there are no usable locators at all.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing::info;

use crate::classify::Taxonomy;
use crate::config::AuditorConfig;
use crate::ingest;
use crate::ingest::synth;
use crate::normalize;
use crate::partition::{partition_results, ResultSet};
use crate::probe::{ProbePolicy, Prober};
use crate::transport::StreamTransport;

/// One-time metrics registration (so series show up on a scrape).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("audit_listing_errors_total", "Listings that could not be fetched.");
        describe_counter!("audit_candidates_total", "Candidate records parsed from listings.");
        describe_counter!(
            "audit_dedup_total",
            "Candidates removed as duplicates of an earlier record."
        );
        describe_counter!("audit_probe_success_total", "Probes that accepted a candidate.");
        describe_counter!(
            "audit_probe_failure_total",
            "Probes that rejected a candidate, by kind."
        );
        describe_histogram!(
            "audit_probe_latency_seconds",
            "Round-trip time of successful probes."
        );
        describe_gauge!("audit_last_run_ts", "Unix ts when the pipeline last completed.");
    });
}

/// Per-stage counts for logging and reporting.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RunStats {
    pub listings_fetched: usize,
    pub listings_failed: usize,
    pub candidates_parsed: usize,
    pub candidates_expanded: usize,
    pub candidates_unique: usize,
    pub accepted: usize,
    pub rejected: usize,
}

#[derive(Debug)]
pub struct AuditOutcome {
    pub results: ResultSet,
    pub stats: RunStats,
}

pub struct Auditor {
    cfg: AuditorConfig,
    taxonomy: Taxonomy,
    transport: Arc<dyn StreamTransport>,
}

impl Auditor {
    /// Build an auditor; the taxonomy comes from `cfg.taxonomy_path` when
    /// set, otherwise the embedded table.
    pub fn new(cfg: AuditorConfig, transport: Arc<dyn StreamTransport>) -> Result<Self> {
        let taxonomy = match cfg.taxonomy_path.as_deref() {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading taxonomy at {path}"))?;
                Taxonomy::from_toml_str(&raw)?
            }
            None => Taxonomy::default(),
        };
        Ok(Self {
            cfg,
            taxonomy,
            transport,
        })
    }

    pub fn with_taxonomy(
        cfg: AuditorConfig,
        transport: Arc<dyn StreamTransport>,
        taxonomy: Taxonomy,
    ) -> Self {
        Self {
            cfg,
            taxonomy,
            transport,
        }
    }

    /// One complete pass over the locator list. Idempotent; re-running is
    /// the retry mechanism for transient network failure.
    pub async fn run(&self, locators: &[String]) -> Result<AuditOutcome> {
        ensure_metrics_described();

        let locators = ingest::filter_locators(locators);
        if locators.is_empty() {
            bail!("no usable source locators");
        }

        let mut stats = RunStats::default();

        let listings = ingest::fetch_listings(
            &self.transport,
            &locators,
            Duration::from_secs(self.cfg.fetch_timeout_secs),
            self.cfg.concurrency,
        )
        .await;
        stats.listings_failed = listings.iter().filter(|l| l.fetch_error.is_some()).count();
        stats.listings_fetched = listings.len() - stats.listings_failed;

        let parsed = ingest::parse_listings(&listings);
        stats.candidates_parsed = parsed.len();

        let expanded = synth::expand_candidates(
            parsed,
            &self.cfg.synth_paths,
            self.cfg.max_synth_per_host,
        );
        stats.candidates_expanded = expanded.len();

        let unique = normalize::dedup_candidates(expanded);
        counter!("audit_dedup_total")
            .increment((stats.candidates_expanded - unique.len()) as u64);
        stats.candidates_unique = unique.len();
        info!(
            listings = stats.listings_fetched,
            failed = stats.listings_failed,
            parsed = stats.candidates_parsed,
            unique = stats.candidates_unique,
            "candidate discovery complete"
        );

        let prober = Prober::new(Arc::clone(&self.transport), ProbePolicy::from_config(&self.cfg));
        let probed = prober.probe_all(unique).await;

        let results = partition_results(probed, &self.taxonomy);
        stats.accepted = results.accepted.len();
        stats.rejected = results.rejected.len();

        gauge!("audit_last_run_ts").set(chrono::Utc::now().timestamp().max(0) as f64);
        info!(
            accepted = stats.accepted,
            rejected = stats.rejected,
            "audit pass complete"
        );

        Ok(AuditOutcome { results, stats })
    }
}
