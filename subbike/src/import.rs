//! Bulk loading of hourly station flow CSV exports into `sub_amounts`.
//!
//! Each file covers a single day, named `station_flow_<YYYY>-<Mon>-<DD>.csv`
//! (`station_flow_2019-May-01.csv`). After a header row, every row is
//! `station, hour, in_count, out_count`. Files are upserted one transaction at a time, so a
//! bad file leaves earlier files imported and itself untouched.

use std::{
    collections::HashMap,
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::db::{errors::DbError, handlers::ridership, models::ridership::SubAmount};

const FILE_PREFIX: &str = "station_flow_";
const FILE_SUFFIX: &str = ".csv";
const FILE_DATE_FORMAT: &str = "%Y-%b-%d";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{file}, line {line}: {reason}")]
    MalformedRow { file: String, line: u64, reason: String },

    #[error("{file}: {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },

    #[error("failed to import {file}: {source}")]
    Database {
        file: String,
        #[source]
        source: DbError,
    },
}

/// A flow file found on disk with the day it covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowFile {
    pub path: PathBuf,
    pub date: NaiveDate,
}

impl FlowFile {
    fn label(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Totals reported at the end of a run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub files: usize,
    pub rows: usize,
    /// Names in the directory that did not match the flow file pattern
    pub skipped: usize,
}

/// Day encoded in a flow file name, or `None` when the name doesn't follow the pattern
pub fn date_from_file_name(name: &str) -> Option<NaiveDate> {
    let stem = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
    NaiveDate::parse_from_str(stem, FILE_DATE_FORMAT).ok()
}

/// Flow files directly inside `dir`, oldest day first
pub fn discover_files(dir: &Path) -> Result<(Vec<FlowFile>, usize), ImportError> {
    let io_error = |source| ImportError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    let mut skipped = 0;
    for entry in std::fs::read_dir(dir).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        if !entry.file_type().map_err(io_error)?.is_file() {
            continue;
        }

        let name = entry.file_name();
        match date_from_file_name(&name.to_string_lossy()) {
            Some(date) => files.push(FlowFile { path: entry.path(), date }),
            None => {
                debug!(file = %name.to_string_lossy(), "skipping file not matching {FILE_PREFIX}{FILE_DATE_FORMAT}{FILE_SUFFIX}");
                skipped += 1;
            }
        }
    }

    files.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.path.cmp(&b.path)));
    Ok((files, skipped))
}

/// Parse one day's rows. A station/hour pair that appears twice keeps its last row.
pub fn parse_flow_csv<R: Read>(reader: R, date: NaiveDate, file: &str) -> Result<Vec<SubAmount>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows: Vec<SubAmount> = Vec::new();
    let mut seen: HashMap<(String, i32), usize> = HashMap::new();

    for record in reader.records() {
        let record = record.map_err(|source| match source.position().map(|p| p.line()) {
            Some(line) => ImportError::MalformedRow {
                file: file.to_string(),
                line,
                reason: source.to_string(),
            },
            None => ImportError::Csv {
                file: file.to_string(),
                source,
            },
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let malformed = |reason: String| ImportError::MalformedRow {
            file: file.to_string(),
            line,
            reason,
        };

        let (station, hour, in_count, out_count): (String, i32, i64, i64) =
            record.deserialize(None).map_err(|e| malformed(e.to_string()))?;

        if station.is_empty() {
            return Err(malformed("station is empty".to_string()));
        }
        if !(0..24).contains(&hour) {
            return Err(malformed(format!("hour {hour} is outside 0-23")));
        }
        if in_count < 0 || out_count < 0 {
            return Err(malformed("counts cannot be negative".to_string()));
        }

        let row = SubAmount {
            date,
            station,
            time_slot: hour,
            in_num: in_count,
            out_num: out_count,
        };
        match seen.get(&(row.station.clone(), hour)) {
            Some(&index) => {
                warn!(file, line, station = %row.station, hour, "duplicate station/hour, keeping the later row");
                rows[index] = row;
            }
            None => {
                seen.insert((row.station.clone(), hour), rows.len());
                rows.push(row);
            }
        }
    }

    Ok(rows)
}

/// Parse a flow file and, when `pool` is given, upsert it in its own transaction.
///
/// Returns the number of rows in the file.
#[instrument(skip_all, fields(file = %file.path.display(), date = %file.date), err)]
pub async fn import_file(pool: Option<&PgPool>, file: &FlowFile) -> Result<usize, ImportError> {
    let label = file.label();
    let reader = File::open(&file.path).map_err(|source| ImportError::Io {
        path: file.path.clone(),
        source,
    })?;
    let rows = parse_flow_csv(reader, file.date, &label)?;

    let Some(pool) = pool else {
        info!("parsed {} rows from {} (dry run)", rows.len(), label);
        return Ok(rows.len());
    };

    let database = |source: DbError| ImportError::Database {
        file: label.clone(),
        source,
    };
    let mut tx = pool.begin().await.map_err(|e| database(e.into()))?;
    ridership::upsert_sub_amounts(&mut tx, &rows).await.map_err(database)?;
    tx.commit().await.map_err(|e| database(e.into()))?;

    info!("imported {} rows from {}", rows.len(), label);
    Ok(rows.len())
}

/// Import every flow file in `dir`. Without a pool the files are only parsed.
pub async fn import_dir(pool: Option<&PgPool>, dir: &Path) -> Result<ImportSummary, ImportError> {
    let (files, skipped) = discover_files(dir)?;
    if files.is_empty() {
        warn!(dir = %dir.display(), "no station flow files found");
    }

    let mut summary = ImportSummary {
        skipped,
        ..Default::default()
    };
    for file in &files {
        summary.rows += import_file(pool, file).await?;
        summary.files += 1;
    }

    Ok(summary)
}
