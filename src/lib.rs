// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod classify;
pub mod config;
pub mod ingest;
pub mod normalize;
pub mod partition;
pub mod pipeline;
pub mod probe;
pub mod report;
pub mod transport;

// ---- Re-exports for stable public API ----
pub use crate::classify::{Category, Taxonomy};
pub use crate::config::AuditorConfig;
pub use crate::ingest::types::{CandidateRecord, RawListing, UNKNOWN_NAME};
pub use crate::partition::ResultSet;
pub use crate::pipeline::{AuditOutcome, Auditor, RunStats};
pub use crate::probe::{FailureKind, ProbeResult};
pub use crate::report::{FileSink, ResultSink};
pub use crate::transport::{HttpTransport, ListingBody, ProbeResponse, StreamTransport};
