//! End-to-end scrape: validate → query → aggregate → flatten → write.
//!
//! All caller input is validated before the first request. A failed window
//! aborts the run before anything is written, so a failed scrape leaves no
//! output file behind.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::aggregate::AggregationLoop;
use crate::config::Config;
use crate::error::Result;
use crate::fetch::WindowedFetcher;
use crate::flatten::{flatten, ColumnNaming};
use crate::output::OutputTarget;
use crate::progress::ScrapeProgressReporter;
use crate::query::{DateRange, Query};

/// Caller inputs for one scrape, as given on the command line.
#[derive(Debug, Clone)]
pub struct ScrapeRequest {
    pub begin: String,
    pub end: String,
    pub dir: PathBuf,
    pub filename: String,
    pub full_path_columns: bool,
}

/// What a completed scrape produced.
#[derive(Debug, Clone)]
pub struct ScrapeSummary {
    pub total_found: u64,
    pub windows_fetched: u64,
    pub rows: usize,
    pub columns: usize,
    pub drift_warnings: usize,
    pub path: PathBuf,
}

pub async fn run_scrape(
    config: &Config,
    request: &ScrapeRequest,
    fetcher: &dyn WindowedFetcher,
    progress: &dyn ScrapeProgressReporter,
) -> Result<ScrapeSummary> {
    let range = DateRange::parse(&request.begin, &request.end)?;
    let target = OutputTarget::new(&request.dir, &request.filename)?;

    let query =
        Query::substances(Some(range)).with_post_date_filter(config.query.filter_by_post_date);
    let expr = query.expression();
    info!(%expr, "starting scrape");

    let result = AggregationLoop::new(fetcher, config.api.page_size)
        .with_progress(progress)
        .run(&expr)
        .await?;

    if !result.total_drift.is_empty() {
        warn!(
            windows = result.total_drift.len(),
            "study count was inconsistent across windows"
        );
    }

    let naming = if request.full_path_columns || config.output.full_path_columns {
        ColumnNaming::FullPath
    } else {
        ColumnNaming::LeafKey
    };
    let table = flatten(&result.records, naming);
    let path = target.write(&table)?;
    info!(path = %path.display(), rows = table.row_count(), "scrape written");

    Ok(ScrapeSummary {
        total_found: result.total_found,
        windows_fetched: result.windows_fetched,
        rows: table.row_count(),
        columns: table.columns().len(),
        drift_warnings: result.total_drift.len(),
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FetchError, FetchErrorKind, ScrapeError, ValidationError};
    use crate::models::ResponseEnvelope;
    use crate::progress::NoProgress;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Returns `total` studies with per-page nested records; fails on `fail_on`.
    struct FakeApi {
        total: u64,
        fail_on: Option<usize>,
        calls: AtomicUsize,
    }

    impl FakeApi {
        fn new(total: u64) -> Self {
            Self {
                total,
                fail_on: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl WindowedFetcher for FakeApi {
        async fn fetch(
            &self,
            expr: &str,
            min_rank: u64,
            max_rank: u64,
        ) -> std::result::Result<ResponseEnvelope, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_on == Some(call) {
                return Err(FetchError::new(
                    expr,
                    min_rank,
                    max_rank,
                    FetchErrorKind::Decode("boom".into()),
                ));
            }
            let records = (min_rank..=max_rank.min(self.total))
                .map(|r| {
                    json!({
                        "Study": {
                            "ProtocolSection": {
                                "IdentificationModule": {"NCTId": format!("NCT{:08}", r)}
                            },
                            "Rank": r
                        }
                    })
                })
                .collect();
            Ok(ResponseEnvelope {
                total_found: self.total,
                records,
            })
        }
    }

    fn request(dir: &TempDir) -> ScrapeRequest {
        ScrapeRequest {
            begin: "01/01/2020".into(),
            end: "12/31/2020".into(),
            dir: dir.path().to_path_buf(),
            filename: "ctscrape".into(),
            full_path_columns: false,
        }
    }

    fn files_in(dir: &TempDir) -> usize {
        std::fs::read_dir(dir.path()).unwrap().count()
    }

    #[tokio::test]
    async fn writes_one_row_per_study() {
        let tmp = TempDir::new().unwrap();
        let api = FakeApi::new(250);
        let summary = run_scrape(&Config::default(), &request(&tmp), &api, &NoProgress)
            .await
            .unwrap();

        assert_eq!(summary.total_found, 250);
        assert_eq!(summary.windows_fetched, 3);
        assert_eq!(summary.rows, 250);
        assert_eq!(summary.columns, 2);

        let content = std::fs::read_to_string(&summary.path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("NCTId,Rank"));
        assert_eq!(lines.next(), Some("NCT00000001,1"));
        assert_eq!(content.lines().count(), 251);
    }

    #[tokio::test]
    async fn full_path_columns_option() {
        let tmp = TempDir::new().unwrap();
        let mut req = request(&tmp);
        req.full_path_columns = true;
        let summary = run_scrape(&Config::default(), &req, &FakeApi::new(1), &NoProgress)
            .await
            .unwrap();
        let content = std::fs::read_to_string(&summary.path).unwrap();
        assert!(content
            .starts_with("Study.ProtocolSection.IdentificationModule.NCTId,Study.Rank\n"));
    }

    #[tokio::test]
    async fn zero_studies_writes_empty_table() {
        let tmp = TempDir::new().unwrap();
        let api = FakeApi::new(0);
        let summary = run_scrape(&Config::default(), &request(&tmp), &api, &NoProgress)
            .await
            .unwrap();
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
        assert_eq!(summary.rows, 0);
        assert_eq!(summary.columns, 0);
        assert!(summary.path.exists());
    }

    #[tokio::test]
    async fn failed_window_leaves_no_file() {
        let tmp = TempDir::new().unwrap();
        let mut api = FakeApi::new(350);
        api.fail_on = Some(3);
        let err = run_scrape(&Config::default(), &request(&tmp), &api, &NoProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Fetch(_)));
        assert_eq!(files_in(&tmp), 0);
    }

    #[tokio::test]
    async fn invalid_input_makes_no_requests() {
        let tmp = TempDir::new().unwrap();
        let api = FakeApi::new(10);

        let mut bad_date = request(&tmp);
        bad_date.begin = "2020-01-01".into();
        let mut bad_name = request(&tmp);
        bad_name.filename = "no-dashes".into();
        let mut bad_dir = request(&tmp);
        bad_dir.dir = tmp.path().join("missing");

        for req in [bad_date, bad_name, bad_dir] {
            let err = run_scrape(&Config::default(), &req, &api, &NoProgress)
                .await
                .unwrap_err();
            assert!(matches!(err, ScrapeError::Validation(_)), "{:?}", err);
        }
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
        assert_eq!(files_in(&tmp), 0);
    }

    #[tokio::test]
    async fn reversed_dates_are_rejected() {
        let tmp = TempDir::new().unwrap();
        let mut req = request(&tmp);
        req.begin = "12/31/2021".into();
        let err = run_scrape(&Config::default(), &req, &FakeApi::new(1), &NoProgress)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::Validation(ValidationError::DateOrder { .. })
        ));
    }

    #[tokio::test]
    async fn two_runs_write_two_files() {
        let tmp = TempDir::new().unwrap();
        let a = run_scrape(&Config::default(), &request(&tmp), &FakeApi::new(3), &NoProgress)
            .await
            .unwrap();
        let b = run_scrape(&Config::default(), &request(&tmp), &FakeApi::new(3), &NoProgress)
            .await
            .unwrap();
        assert_ne!(a.path, b.path);
        assert_eq!(files_in(&tmp), 2);
    }
}
