//! Error taxonomy.
//!
//! - [`ValidationError`] — bad caller input, raised before any network call.
//! - [`FetchError`] — one window request failed; aborts the whole run.
//! - [`ScrapeError`] — everything a full scrape can fail with.
//!
//! Total-count drift between windows is not an error; it is recorded as an
//! [`InconsistentTotal`](crate::models::InconsistentTotal) on the result.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid date '{value}': enter dates in mm/dd/yyyy format")]
    DateFormat { value: String },

    #[error("begin date {begin} is after end date {end}")]
    DateOrder { begin: String, end: String },

    #[error("output path is not an existing directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error(
        "invalid filename '{0}': must be alphanumeric or underscore \
         (a timestamp and .csv are appended)"
    )]
    Filename(String),
}

/// What went wrong with a single window request.
#[derive(Debug, Error)]
pub enum FetchErrorKind {
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed response: {0}")]
    Decode(String),
}

/// A failed window fetch, tagged with the request parameters that produced it.
#[derive(Debug, Error)]
#[error("error running API query (expr={expr:?}, min_rnk={min_rank}, max_rnk={max_rank}): {kind}")]
pub struct FetchError {
    pub expr: String,
    pub min_rank: u64,
    pub max_rank: u64,
    #[source]
    pub kind: FetchErrorKind,
}

impl FetchError {
    pub fn new(expr: &str, min_rank: u64, max_rank: u64, kind: FetchErrorKind) -> Self {
        Self {
            expr: expr.to_string(),
            min_rank,
            max_rank,
            kind,
        }
    }
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to write output {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write CSV {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
