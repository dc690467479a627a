// src/normalize.rs
//! URL normalization and candidate deduplication.
//!
//! The normalized form (scheme and host case-folded, port only when it is
//! not the scheme default, path and query verbatim) is the sole identity
//! of a candidate. Dedup keeps the first-seen record per identity, so the
//! ordered fetch/parse stages decide which display name survives.

use std::collections::HashSet;

use url::Url;

use crate::ingest::types::CandidateRecord;

/// Canonical string form of a URL, used as the deduplication key.
/// Returns `None` when the input does not parse as a host-bearing URL.
pub fn normalize_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    let host = url.host_str()?;
    let mut out = format!("{}://{}", url.scheme(), host);
    // Url::port() is None when the port equals the scheme default.
    if let Some(port) = url.port() {
        out.push(':');
        out.push_str(&port.to_string());
    }
    out.push_str(url.path());
    if let Some(query) = url.query() {
        out.push('?');
        out.push_str(query);
    }
    Some(out)
}

/// Dedup key for a record; unparseable URLs fall back to their raw form so
/// that every record still has exactly one identity.
pub fn candidate_key(record: &CandidateRecord) -> String {
    normalize_url(&record.url).unwrap_or_else(|| record.url.trim().to_string())
}

/// One entry per normalized URL, first-seen order and first-seen display
/// name preserved.
pub fn dedup_candidates(records: Vec<CandidateRecord>) -> Vec<CandidateRecord> {
    let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
    let mut out = Vec::with_capacity(records.len());
    for record in records {
        if seen.insert(candidate_key(&record)) {
            out.push(record);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(name: &str, url: &str) -> CandidateRecord {
        CandidateRecord::new(name, url, "http://origin/1.txt")
    }

    #[test]
    fn scheme_and_host_are_case_folded() {
        assert_eq!(
            normalize_url("HTTP://HOST.Example/Path?b=2").as_deref(),
            Some("http://host.example/Path?b=2")
        );
    }

    #[test]
    fn default_port_dropped_nonstandard_kept() {
        assert_eq!(
            normalize_url("http://host:80/a").as_deref(),
            Some("http://host/a")
        );
        assert_eq!(
            normalize_url("https://host:443/a").as_deref(),
            Some("https://host/a")
        );
        assert_eq!(
            normalize_url("http://host:8080/a").as_deref(),
            Some("http://host:8080/a")
        );
    }

    #[test]
    fn dedup_keeps_first_seen_name() {
        let records = vec![
            rec("News24", "http://host/news"),
            rec("unknown", "http://host/news"),
        ];
        let unique = dedup_candidates(records);
        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].display_name, "News24");
    }

    #[test]
    fn equivalent_spellings_collapse() {
        let records = vec![
            rec("A", "http://Host.example:80/live"),
            rec("B", "http://host.example/live"),
        ];
        let unique = dedup_candidates(records);
        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].display_name, "A");
    }

    #[test]
    fn output_never_exceeds_input_and_keys_are_unique() {
        let records = vec![
            rec("A", "http://h/1"),
            rec("B", "http://h/2"),
            rec("C", "http://h/1"),
            rec("D", "not a url"),
            rec("E", "not a url"),
        ];
        let input_len = records.len();
        let unique = dedup_candidates(records);
        assert!(unique.len() <= input_len);
        let keys: HashSet<String> = unique.iter().map(candidate_key).collect();
        assert_eq!(keys.len(), unique.len());
    }
}
