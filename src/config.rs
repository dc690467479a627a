// src/config.rs
//! Runtime configuration: timeouts, concurrency, latency policy, synthesis
//! paths. The knobs that used to be scattered across near-identical
//! checker scripts live here as data, one pipeline for all deployments.
//!
//! Resolution order: `AUDITOR_CONFIG_PATH` → `config/auditor.toml` →
//! built-in defaults; numeric env overrides are applied on top.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "config/auditor.toml";

pub const ENV_CONFIG_PATH: &str = "AUDITOR_CONFIG_PATH";
pub const ENV_CONCURRENCY: &str = "AUDITOR_CONCURRENCY";
pub const ENV_MAX_LATENCY: &str = "AUDITOR_MAX_LATENCY_SECS";
pub const ENV_PROBE_TIMEOUT: &str = "AUDITOR_PROBE_TIMEOUT_SECS";
pub const ENV_STRICT_SHAPE: &str = "AUDITOR_STRICT_SHAPE";

/// Suffix paths probed against bare host[:port] endpoints.
pub const DEFAULT_SYNTH_PATHS: [&str; 10] = [
    "/live.m3u8",
    "/iptv.m3u8",
    "/tv.m3u8",
    "/live.txt",
    "/iptv.txt",
    "/tv.txt",
    "/zh_cn.js",
    "/playlist.m3u8",
    "/iptv/index.m3u8",
    "/tv/index.m3u8",
];

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AuditorConfig {
    /// Per-listing fetch deadline.
    pub fetch_timeout_secs: u64,
    /// Hard per-probe deadline.
    pub probe_timeout_secs: u64,
    /// Acceptable probe round-trip; slower 2xx responses are rejected.
    pub max_latency_secs: f64,
    /// Global bound on in-flight fetches/probes.
    pub concurrency: usize,
    /// Verify content-type/payload shape on probes.
    pub strict_shape: bool,
    /// Minimum plausible payload size for the shape check.
    pub min_payload_bytes: u64,
    /// Suffix paths for URL synthesis.
    pub synth_paths: Vec<String>,
    /// Cap on synthesized URLs per endpoint.
    pub max_synth_per_host: usize,
    /// Optional TOML file replacing the embedded category taxonomy.
    pub taxonomy_path: Option<String>,
}

impl Default for AuditorConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 10,
            probe_timeout_secs: 10,
            max_latency_secs: 5.0,
            concurrency: 15,
            strict_shape: false,
            min_payload_bytes: 10,
            synth_paths: DEFAULT_SYNTH_PATHS.iter().map(|s| s.to_string()).collect(),
            max_synth_per_host: 20,
            taxonomy_path: None,
        }
    }
}

impl AuditorConfig {
    /// Load using env var + fallbacks, then apply env overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::from_file(&pb)?
        } else {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default.exists() {
                Self::from_file(&default)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env_overrides();
        cfg.harden();
        Ok(cfg)
    }

    fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading auditor config at {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let cfg: AuditorConfig = toml::from_str(raw).context("parsing auditor config")?;
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = parse_env::<usize>(ENV_CONCURRENCY) {
            self.concurrency = v;
        }
        if let Some(v) = parse_env::<f64>(ENV_MAX_LATENCY) {
            self.max_latency_secs = v;
        }
        if let Some(v) = parse_env::<u64>(ENV_PROBE_TIMEOUT) {
            self.probe_timeout_secs = v;
        }
        if std::env::var(ENV_STRICT_SHAPE).ok().as_deref() == Some("1") {
            self.strict_shape = true;
        }
    }

    /// Ensure a runnable configuration even if the TOML is odd.
    fn harden(&mut self) {
        if !self.max_latency_secs.is_finite() || self.max_latency_secs <= 0.0 {
            self.max_latency_secs = Self::default().max_latency_secs;
        }
        if self.concurrency == 0 {
            self.concurrency = 1;
        }
        if self.probe_timeout_secs == 0 {
            self.probe_timeout_secs = Self::default().probe_timeout_secs;
        }
        if self.fetch_timeout_secs == 0 {
            self.fetch_timeout_secs = Self::default().fetch_timeout_secs;
        }
        if self.max_synth_per_host == 0 {
            self.max_synth_per_host = Self::default().max_synth_per_host;
        }
        if self.synth_paths.is_empty() {
            self.synth_paths = Self::default().synth_paths;
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}
