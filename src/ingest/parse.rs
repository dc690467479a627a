// src/ingest/parse.rs
//! Format detection and parsing of raw listings into candidate records.
//!
//! Upstream listings arrive in several incompatible shapes: extended
//! playlists (`#EXTINF` metadata pairs), `name,url` delimited lines, bare
//! URL lines, and script/JSON payloads with embedded channel objects.
//! Recognizers are tried in priority order per line. Each one is total:
//! it either yields a record or declines, it never fails the listing.
//! Lines that match nothing are dropped silently.

use once_cell::sync::OnceCell;
use regex::Regex;
use url::Url;

use crate::ingest::types::{CandidateRecord, UNKNOWN_NAME};

const EXTINF_DIRECTIVE: &str = "#EXTINF";

/// Schemes accepted for bare URL lines.
const LINE_SCHEMES: [&str; 6] = ["http", "https", "rtmp", "rtsp", "udp", "rtp"];

/// Parse one listing into candidate records, in the order encountered.
///
/// Line recognizers run first. When they produce nothing, the content is
/// treated as a non-line-oriented payload and handed to the embedded-blob
/// scanner. No URL is validated for reachability here.
pub fn parse_listing(origin: &str, content: &str) -> Vec<CandidateRecord> {
    let lines: Vec<&str> = content.lines().map(str::trim).collect();
    let mut out = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        if line.is_empty() {
            i += 1;
            continue;
        }

        // 1) Extended playlist pair: metadata line + following URL line.
        if let Some(meta) = line.strip_prefix(EXTINF_DIRECTIVE) {
            if let Some(next) = lines.get(i + 1).copied() {
                if !next.is_empty() && !next.starts_with('#') {
                    let name = meta
                        .rsplit_once(',')
                        .map(|(_, n)| n.trim())
                        .filter(|n| !n.is_empty())
                        .unwrap_or(UNKNOWN_NAME);
                    out.push(CandidateRecord::new(name, next, origin));
                    i += 2;
                    continue;
                }
            }
            i += 1;
            continue;
        }

        // Comment lines other than the directive above never carry data.
        if line.starts_with('#') {
            i += 1;
            continue;
        }

        // 2) Delimited pair: name,url where the suffix is an absolute URL.
        if let Some(rec) = parse_comma_pair(line, origin) {
            out.push(rec);
            i += 1;
            continue;
        }

        // 3) Bare URL line.
        if let Some(rec) = parse_bare_url(line, origin) {
            out.push(rec);
            i += 1;
            continue;
        }

        // Unrecognized line: parse noise, dropped.
        i += 1;
    }

    if out.is_empty() {
        out = scan_blob(origin, content);
    }
    out
}

/// `name,url` where the text after the last comma is an absolute URL.
fn parse_comma_pair(line: &str, origin: &str) -> Option<CandidateRecord> {
    let (name, url) = line.rsplit_once(',')?;
    let (name, url) = (name.trim(), url.trim());
    if name.is_empty() || !is_absolute_url(url) {
        return None;
    }
    Some(CandidateRecord::new(name, url, origin))
}

/// A line that is itself an absolute URL with a recognized scheme. The
/// display name falls back to the last non-extension path segment.
fn parse_bare_url(line: &str, origin: &str) -> Option<CandidateRecord> {
    let url = Url::parse(line).ok()?;
    if !LINE_SCHEMES.contains(&url.scheme()) || url.host_str().is_none() {
        return None;
    }
    Some(CandidateRecord::new(name_from_url(&url), line, origin))
}

fn is_absolute_url(s: &str) -> bool {
    match Url::parse(s) {
        Ok(u) => u.host_str().is_some_and(|h| !h.is_empty()),
        Err(_) => false,
    }
}

/// Heuristic channel name for records without one: the last non-empty path
/// segment, extension stripped. `http://host/news` → "news".
fn name_from_url(url: &Url) -> String {
    let seg = url
        .path_segments()
        .and_then(|segments| segments.rev().find(|s| !s.is_empty()));
    match seg {
        Some(seg) => {
            let stem = seg.rsplit_once('.').map(|(s, _)| s).unwrap_or(seg);
            if stem.is_empty() {
                UNKNOWN_NAME.to_string()
            } else {
                stem.to_string()
            }
        }
        None => UNKNOWN_NAME.to_string(),
    }
}

/// 4) Embedded structured blob: tolerant scan of script/JSON-like payloads
/// for adjacent name/url pairs (either key order) and bare stream URLs.
fn scan_blob(origin: &str, content: &str) -> Vec<CandidateRecord> {
    static RE_NAME_URL: OnceCell<Regex> = OnceCell::new();
    static RE_URL_NAME: OnceCell<Regex> = OnceCell::new();
    static RE_STREAM_URL: OnceCell<Regex> = OnceCell::new();

    let re_name_url = RE_NAME_URL.get_or_init(|| {
        Regex::new(r#"(?s)"name"\s*:\s*"([^"]+)".{0,120}?"url"\s*:\s*"([^"]+)""#).unwrap()
    });
    let re_url_name = RE_URL_NAME.get_or_init(|| {
        Regex::new(r#"(?s)"url"\s*:\s*"([^"]+)".{0,120}?"name"\s*:\s*"([^"]+)""#).unwrap()
    });
    let re_stream_url = RE_STREAM_URL
        .get_or_init(|| Regex::new(r#"(?i)https?://[^\s"'<>,;()\\]+"#).unwrap());

    let mut out = Vec::new();

    for caps in re_name_url.captures_iter(content) {
        out.push(CandidateRecord::new(&caps[1], &caps[2], origin));
    }
    for caps in re_url_name.captures_iter(content) {
        out.push(CandidateRecord::new(&caps[2], &caps[1], origin));
    }

    // Bare stream URLs: keep only ones with a stream-file suffix or a
    // /live/ style segment, everything else in a blob is link soup.
    for m in re_stream_url.find_iter(content) {
        let u = m.as_str();
        let streamish = u.ends_with(".m3u8")
            || u.ends_with(".flv")
            || u.ends_with(".ts")
            || u.contains("/live/");
        if !streamish {
            continue;
        }
        let name = Url::parse(u)
            .map(|parsed| name_from_url(&parsed))
            .unwrap_or_else(|_| UNKNOWN_NAME.to_string());
        out.push(CandidateRecord::new(name, u, origin));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "http://upstream/listing.txt";

    #[test]
    fn extinf_pair_yields_named_record() {
        let recs = parse_listing(ORIGIN, "#EXTINF:-1,Channel One\nhttp://host/a.m3u8\n");
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].display_name, "Channel One");
        assert_eq!(recs[0].url, "http://host/a.m3u8");
        assert_eq!(recs[0].origin, ORIGIN);
    }

    #[test]
    fn extinf_name_is_the_trailing_comma_field() {
        let recs = parse_listing(
            ORIGIN,
            "#EXTINF:-1 tvg-id=\"c1\" group-title=\"News\",News 24\nhttp://host/n\n",
        );
        assert_eq!(recs[0].display_name, "News 24");
    }

    #[test]
    fn comma_pair_line_splits_on_last_comma() {
        let recs = parse_listing(ORIGIN, "News24,http://host/news\n");
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].display_name, "News24");
        assert_eq!(recs[0].url, "http://host/news");
    }

    #[test]
    fn bare_url_line_derives_name_from_path() {
        let recs = parse_listing(ORIGIN, "http://host/live/sports.m3u8\n");
        assert_eq!(recs[0].display_name, "sports");

        let recs = parse_listing(ORIGIN, "udp://239.0.0.1:1234\n");
        assert_eq!(recs[0].display_name, UNKNOWN_NAME);
    }

    #[test]
    fn comments_and_noise_are_dropped_without_failing() {
        let content = "# generated header\n\nnot a record at all\nCCTV-1,http://host/1\n";
        let recs = parse_listing(ORIGIN, content);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].display_name, "CCTV-1");
    }

    #[test]
    fn unsupported_scheme_is_not_a_bare_url_record() {
        assert!(parse_listing(ORIGIN, "ftp://host/file\n").is_empty());
    }

    #[test]
    fn blob_scan_extracts_pairs_in_either_order() {
        let blob = r#"{"dt":[{"name":"东方卫视","id":"2030","url":"http://cdn/2030.m3u8"},
            {"url":"http://cdn/20.m3u8","name":"新闻综合"}]}"#;
        let recs = parse_listing(ORIGIN, blob);
        assert!(recs
            .iter()
            .any(|r| r.display_name == "东方卫视" && r.url == "http://cdn/2030.m3u8"));
        assert!(recs
            .iter()
            .any(|r| r.display_name == "新闻综合" && r.url == "http://cdn/20.m3u8"));
    }

    #[test]
    fn blob_scan_picks_up_bare_stream_urls() {
        let blob = "var src = 'http://cdn.example/live/ch1.flv'; var page = 'http://cdn.example/about.html';";
        let recs = parse_listing(ORIGIN, blob);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].url, "http://cdn.example/live/ch1.flv");
    }

    #[test]
    fn empty_yield_is_a_valid_result() {
        assert!(parse_listing(ORIGIN, "just prose, nothing else").is_empty());
        assert!(parse_listing(ORIGIN, "").is_empty());
    }

    #[test]
    fn parsing_is_idempotent() {
        let content = "#EXTINF:-1,A\nhttp://h/a.m3u8\nB,http://h/b\nhttp://h/c.m3u8\n";
        let first = parse_listing(ORIGIN, content);
        let second = parse_listing(ORIGIN, content);
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }
}
