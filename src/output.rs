//! Output location checks and CSV persistence.
//!
//! Files are named `<base>_<epoch-ms>.csv`. The table is written to a
//! temporary file in the output directory and only moved into place once
//! complete, so a failed write leaves nothing behind and an existing file
//! is never overwritten.

use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::Utc;
use regex::Regex;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Result, ScrapeError, ValidationError};
use crate::flatten::FlattenedTable;

pub const EXTENSION: &str = "csv";

fn base_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("valid regex"))
}

/// Where a scrape will be written. Validated up front.
#[derive(Debug, Clone)]
pub struct OutputTarget {
    dir: PathBuf,
    base_name: String,
}

impl OutputTarget {
    pub fn new(
        dir: impl Into<PathBuf>,
        base_name: &str,
    ) -> std::result::Result<Self, ValidationError> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(ValidationError::NotADirectory(dir));
        }
        if !base_name_pattern().is_match(base_name) {
            return Err(ValidationError::Filename(base_name.to_string()));
        }
        Ok(Self {
            dir,
            base_name: base_name.to_string(),
        })
    }

    pub fn file_name(&self, epoch_ms: i64) -> String {
        format!("{}_{}.{}", self.base_name, epoch_ms, EXTENSION)
    }

    /// Write `table` to a fresh timestamped file and return its path.
    ///
    /// If a file with the current timestamp already exists the timestamp is
    /// bumped by one millisecond until a free name is found.
    pub fn write(&self, table: &FlattenedTable) -> Result<PathBuf> {
        debug!(dir = %self.dir.display(), rows = table.row_count(), "writing table");
        self.persist(|file, path| {
            write_csv(file, table).map_err(|source| ScrapeError::Csv {
                path: path.to_path_buf(),
                source,
            })
        })
    }

    /// Fill a temporary file with `fill`, then move it to a free
    /// timestamped name. The temporary file is removed if `fill` fails.
    fn persist<F>(&self, fill: F) -> Result<PathBuf>
    where
        F: FnOnce(&mut File, &Path) -> Result<()>,
    {
        let mut epoch_ms = Utc::now().timestamp_millis();
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|source| ScrapeError::Output {
            path: self.dir.clone(),
            source,
        })?;

        fill(tmp.as_file_mut(), &self.dir.join(self.file_name(epoch_ms)))?;

        loop {
            let path = self.dir.join(self.file_name(epoch_ms));
            match tmp.persist_noclobber(&path) {
                Ok(_) => return Ok(path),
                Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                    tmp = e.file;
                    epoch_ms += 1;
                }
                Err(e) => {
                    return Err(ScrapeError::Output {
                        path,
                        source: e.error,
                    });
                }
            }
        }
    }
}

/// Write a header row followed by every table row.
///
/// A table without columns is written as an empty file: rows with no
/// cells would otherwise read back as a header.
pub fn write_csv<W: std::io::Write>(writer: W, table: &FlattenedTable) -> csv::Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    if table.columns().is_empty() {
        return Ok(());
    }
    out.write_record(table.columns())?;
    for row in table.rows() {
        out.write_record(row)?;
    }
    out.flush()?;
    Ok(())
}
