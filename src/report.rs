// src/report.rs
//! Result emission: whitelist/blacklist files in the delimited `name,url`
//! format players consume directly. The pipeline hands over already-ordered
//! data; this module only formats and writes it.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::partition::ResultSet;

pub trait ResultSink {
    fn write(&self, results: &ResultSet) -> Result<()>;
}

/// Writes two files: accepted entries as `name,url,category` in rank order,
/// rejected entries as `name,url,failure_kind` in normalized-URL order.
pub struct FileSink {
    whitelist_path: PathBuf,
    blacklist_path: PathBuf,
}

impl FileSink {
    pub fn new(whitelist: impl AsRef<Path>, blacklist: impl AsRef<Path>) -> Self {
        Self {
            whitelist_path: whitelist.as_ref().to_path_buf(),
            blacklist_path: blacklist.as_ref().to_path_buf(),
        }
    }
}

impl ResultSink for FileSink {
    fn write(&self, results: &ResultSet) -> Result<()> {
        let generated = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");

        let mut whitelist = String::new();
        let _ = writeln!(whitelist, "# Whitelist - generated: {generated}");
        let _ = writeln!(whitelist, "# Valid sources: {}", results.accepted.len());
        for (result, category) in &results.accepted {
            let _ = writeln!(
                whitelist,
                "{},{},{}",
                result.record.display_name,
                result.record.url,
                category.as_str()
            );
        }
        std::fs::write(&self.whitelist_path, whitelist).with_context(|| {
            format!("writing whitelist to {}", self.whitelist_path.display())
        })?;

        let mut blacklist = String::new();
        let _ = writeln!(blacklist, "# Blacklist - generated: {generated}");
        let _ = writeln!(blacklist, "# Invalid sources: {}", results.rejected.len());
        for result in &results.rejected {
            let kind = result
                .failure
                .map(|k| k.as_str())
                .unwrap_or("unknown");
            let _ = writeln!(
                blacklist,
                "{},{},{}",
                result.record.display_name, result.record.url, kind
            );
        }
        std::fs::write(&self.blacklist_path, blacklist).with_context(|| {
            format!("writing blacklist to {}", self.blacklist_path.display())
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Category;
    use crate::ingest::types::CandidateRecord;
    use crate::probe::{FailureKind, ProbeResult};

    fn sample_results() -> ResultSet {
        ResultSet {
            accepted: vec![(
                ProbeResult {
                    record: CandidateRecord::new("CCTV-1", "http://h/1", "http://o/1.txt"),
                    success: true,
                    latency_secs: 0.4,
                    failure: None,
                },
                Category::NationalBroadcast,
            )],
            rejected: vec![ProbeResult {
                record: CandidateRecord::new("Dead", "http://h/dead", "http://o/1.txt"),
                success: false,
                latency_secs: 0.0,
                failure: Some(FailureKind::BadStatus),
            }],
        }
    }

    #[test]
    fn files_carry_headers_and_delimited_entries() {
        let dir = std::env::temp_dir();
        let wl = dir.join("auditor_test_whitelist.txt");
        let bl = dir.join("auditor_test_blacklist.txt");

        FileSink::new(&wl, &bl).write(&sample_results()).unwrap();

        let whitelist = std::fs::read_to_string(&wl).unwrap();
        assert!(whitelist.starts_with("# Whitelist - generated:"));
        assert!(whitelist.contains("# Valid sources: 1"));
        assert!(whitelist.contains("CCTV-1,http://h/1,national-broadcast"));

        let blacklist = std::fs::read_to_string(&bl).unwrap();
        assert!(blacklist.contains("# Invalid sources: 1"));
        assert!(blacklist.contains("Dead,http://h/dead,bad_status"));

        let _ = std::fs::remove_file(wl);
        let _ = std::fs::remove_file(bl);
    }
}
