//! IPTV Source Auditor — Binary Entrypoint
//! One pass: read locators, run the discovery/validation pipeline, write
//! the whitelist and blacklist files.
//!
//! Usage: `iptv-source-auditor [sources.txt]`

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use iptv_source_auditor::{Auditor, AuditorConfig, FileSink, HttpTransport, ResultSink};

const DEFAULT_SOURCE_FILE: &str = "sources.txt";
const WHITELIST_FILE: &str = "whitelist.txt";
const BLACKLIST_FILE: &str = "blacklist.txt";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AuditorConfig::load().context("loading auditor config")?;

    let source_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_SOURCE_FILE.to_string());
    let raw = std::fs::read_to_string(&source_path)
        .with_context(|| format!("reading source locators from {source_path}"))?;
    let locators: Vec<String> = raw.lines().map(str::to_string).collect();

    let transport = Arc::new(HttpTransport::new(&cfg)?);
    let auditor = Auditor::new(cfg, transport)?;
    let outcome = auditor.run(&locators).await?;

    FileSink::new(WHITELIST_FILE, BLACKLIST_FILE).write(&outcome.results)?;
    info!(
        accepted = outcome.stats.accepted,
        rejected = outcome.stats.rejected,
        whitelist = WHITELIST_FILE,
        blacklist = BLACKLIST_FILE,
        "results written"
    );
    Ok(())
}
