// tests/discovery.rs
// Candidate discovery without the network: parse → synthesize → dedup
// composition over the public API.

use iptv_source_auditor::ingest::parse::parse_listing;
use iptv_source_auditor::ingest::synth::expand_candidates;
use iptv_source_auditor::normalize::{candidate_key, dedup_candidates};
use iptv_source_auditor::AuditorConfig;

#[test]
fn same_url_via_two_shapes_keeps_first_seen_name() {
    let records = parse_listing(
        "http://origin/list.txt",
        "News24,http://host/news\nhttp://host/news\n",
    );
    assert_eq!(records.len(), 2);

    let unique = dedup_candidates(records);
    assert_eq!(unique.len(), 1);
    assert_eq!(unique[0].display_name, "News24");
}

#[test]
fn asset_index_blob_expands_into_probeable_urls() {
    let cfg = AuditorConfig::default();

    // An endpoint listing rather than a playlist: host:port, no path.
    let records = parse_listing(
        "http://index/api",
        r#"[{"name":"粤TV","url":"example.net:8080"}]"#,
    );
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].url, "example.net:8080");

    let expanded = expand_candidates(records, &cfg.synth_paths, cfg.max_synth_per_host);

    // Unknown protocol: both schemes tried, non-default port retained.
    let urls: Vec<&str> = expanded.iter().map(|r| r.url.as_str()).collect();
    assert!(urls.contains(&"http://example.net:8080/live.m3u8"));
    assert!(urls.contains(&"https://example.net:8080/live.m3u8"));

    // Bounded expansion: schemes × paths, capped.
    assert_eq!(expanded.len(), cfg.synth_paths.len() * 2);
    assert!(expanded.len() <= cfg.max_synth_per_host);

    // Synthesized URLs are distinct under normalization.
    let unique = dedup_candidates(expanded);
    assert_eq!(unique.len(), cfg.synth_paths.len() * 2);
    assert!(unique.iter().all(|r| r.display_name == "粤TV"));
    let keys: std::collections::HashSet<String> = unique.iter().map(candidate_key).collect();
    assert_eq!(keys.len(), unique.len());
}

#[test]
fn mixed_listing_survives_malformed_regions() {
    let content = "\
# generated 2025-01-01
#EXTINF:-1,CCTV-1
http://h/cctv1.m3u8
garbage line without shape
Sports,http://h/sports
,missing-name,also-not-a-url
http://h/bare.m3u8
";
    let records = parse_listing("http://origin/mixed.txt", content);
    let names: Vec<&str> = records.iter().map(|r| r.display_name.as_str()).collect();
    assert_eq!(names, vec!["CCTV-1", "Sports", "bare"]);
}
