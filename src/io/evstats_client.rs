mod client;
mod reporting;

use std::fmt;

use jiff::civil::Date;
use serde_json::Value;
use thiserror::Error;

use crate::cli::TimeBucket;

pub use client::EvStatsClient;
pub use reporting::Reporting;

/// One day's raw document, e.g. `{"v2": {"cars": {"models": {...}}}}`.
pub type DailyDocument = serde_json::Map<String, Value>;

/// Everything this tool ever asks the evstats api for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Registrations per model for a single day.
    Daily(Date),

    /// Registrations per maker, bucketed by month, quarter or year.
    MakerMetrics {
        bucket: TimeBucket,
        makers: Vec<String>,
    },
}

impl Request {
    /// Deterministic key, one per distinct request. Used by the memo and the disk cache.
    pub fn cache_key(&self) -> String {
        match self {
            Request::Daily(date) => format!("daily/{date}"),
            Request::MakerMetrics { bucket, makers } => {
                format!("makers/{}/{}", bucket.as_str(), makers.join(","))
            }
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Daily(date) => write!(f, "models for {date}"),
            Request::MakerMetrics { bucket, .. } => write!(f, "{} maker metrics", bucket.as_str()),
        }
    }
}

/// Anything that can answer a [`Request`].
///
/// Implementations hand back JSON objects only. Every failure, whatever the cause,
/// is `None`, and callers must not try to tell them apart.
pub trait Fetch {
    fn fetch(&self, request: &Request) -> Option<Value>;
}

impl<F: Fetch + ?Sized> Fetch for &F {
    fn fetch(&self, request: &Request) -> Option<Value> {
        (**self).fetch(request)
    }
}

/// Why a request came back empty. Logged, never returned to callers.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport failure: {0}")]
    Transport(#[from] ureq::Error),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("response body is not a JSON object")]
    NotAnObject,

    #[error("could not encode the maker filter: {0}")]
    Encode(#[from] serde_json::Error),
}
