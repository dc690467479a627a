// src/partition.rs
//! # Ranker & Result Partitioner
//! Pure, testable logic that maps probe results → the final accepted and
//! rejected sets. No I/O; network nondeterminism is neutralized here by
//! explicit sorts (latency then normalized URL for accepted entries,
//! normalized URL for rejected ones).

use serde::Serialize;

use crate::classify::{Category, Taxonomy};
use crate::normalize::candidate_key;
use crate::probe::ProbeResult;

/// The sole output of a pipeline run: two disjoint, deterministically
/// ordered sequences. Categories are attached to accepted entries only.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResultSet {
    pub accepted: Vec<(ProbeResult, Category)>,
    pub rejected: Vec<ProbeResult>,
}

/// Split probe results into accepted/rejected and rank them. Every input
/// lands in exactly one of the two sequences.
pub fn partition_results(results: Vec<ProbeResult>, taxonomy: &Taxonomy) -> ResultSet {
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();

    for result in results {
        if result.success {
            let category =
                taxonomy.classify(&result.record.display_name, &result.record.url);
            accepted.push((result, category));
        } else {
            rejected.push(result);
        }
    }

    accepted.sort_by(|(a, _), (b, _)| {
        a.latency_secs
            .total_cmp(&b.latency_secs)
            .then_with(|| candidate_key(&a.record).cmp(&candidate_key(&b.record)))
    });
    rejected.sort_by(|a, b| candidate_key(&a.record).cmp(&candidate_key(&b.record)));

    ResultSet { accepted, rejected }
}
