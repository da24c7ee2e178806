//! The pagination loop.
//!
//! The search API exposes only a total count plus a `min_rnk`/`max_rnk`
//! window, so the loop always issues at least one request to learn the
//! total, then keeps advancing the window by one page until a window has
//! covered the first observed total.
//!
//! ```text
//!  Init ──▶ Fetching ──(min_rank > total_found)──▶ Done
//!              ▲   │
//!              └───┘ advance window
//! ```
//!
//! Any [`FetchError`] aborts the run; no partial result escapes.

use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::fetch::WindowedFetcher;
use crate::models::{AccumulatedResult, InconsistentTotal, RankWindow};
use crate::progress::{NoProgress, ScrapeProgressEvent, ScrapeProgressReporter};

/// Widest window the API serves.
pub const PAGE_SIZE: u64 = 100;

pub struct AggregationLoop<'a> {
    fetcher: &'a dyn WindowedFetcher,
    page_size: u64,
    progress: &'a dyn ScrapeProgressReporter,
}

impl<'a> AggregationLoop<'a> {
    pub fn new(fetcher: &'a dyn WindowedFetcher, page_size: u64) -> Self {
        Self {
            fetcher,
            page_size: page_size.max(1),
            progress: &NoProgress,
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn ScrapeProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Collect every record matching `expr`.
    pub async fn run(&self, expr: &str) -> Result<AccumulatedResult, FetchError> {
        let mut window = RankWindow::first(self.page_size);
        let mut result = AccumulatedResult::default();
        let mut total_found: Option<u64> = None;

        self.progress.report(ScrapeProgressEvent::Discovering);

        loop {
            let envelope = self
                .fetcher
                .fetch(expr, window.min_rank, window.max_rank)
                .await?;
            result.windows_fetched += 1;

            let total = match total_found {
                None => {
                    info!(total_found = envelope.total_found, "studies found");
                    total_found = Some(envelope.total_found);
                    envelope.total_found
                }
                Some(expected) => {
                    if envelope.total_found != expected {
                        warn!(
                            expected,
                            reported = envelope.total_found,
                            min_rank = window.min_rank,
                            "total study count changed mid-run; keeping first value"
                        );
                        result.total_drift.push(InconsistentTotal {
                            window,
                            expected,
                            reported: envelope.total_found,
                        });
                    }
                    expected
                }
            };

            debug!(
                min_rank = window.min_rank,
                max_rank = window.max_rank,
                received = envelope.records.len(),
                "window fetched"
            );
            result.records.extend(envelope.records);

            self.progress.report(ScrapeProgressEvent::Window {
                min_rank: window.min_rank,
                max_rank: window.max_rank,
                collected: result.records.len() as u64,
                total,
            });

            // Done once the window just served covered rank `total`.
            window.advance();
            if window.min_rank > total {
                break;
            }
        }

        result.total_found = total_found.unwrap_or_default();
        Ok(result)
    }
}
