// src/ingest/types.rs

/// Display name used when a listing gives us a URL but no channel name.
pub const UNKNOWN_NAME: &str = "unknown";

/// A parsed (name, URL) pair, not yet validated for reachability.
///
/// Identity for deduplication is the normalized form of `url` (see
/// `crate::normalize`); `display_name` and `origin` are carried along for
/// output and diagnostics only.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct CandidateRecord {
    pub display_name: String,
    pub url: String,
    /// Locator of the listing this record was parsed from.
    pub origin: String,
}

impl CandidateRecord {
    pub fn new(
        display_name: impl Into<String>,
        url: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            url: url.into(),
            origin: origin.into(),
        }
    }
}

/// Raw text of one upstream listing, or the reason we could not get it.
/// Fetch failure is data here, never an error the caller has to handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawListing {
    pub locator: String,
    pub content: Option<String>,
    pub fetch_error: Option<String>,
}

impl RawListing {
    pub fn fetched(locator: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            content: Some(content.into()),
            fetch_error: None,
        }
    }

    pub fn failed(locator: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            content: None,
            fetch_error: Some(reason.into()),
        }
    }
}
