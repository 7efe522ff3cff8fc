//! Append-only per-keyword rank series on disk.
//!
//! One CSV file per normalized keyword under the data directory, columns
//! `timestamp,keyword,rank,title,url`. Appends are serialized per keyword
//! by an advisory lock file with a bounded wait; appends to different
//! keywords never contend. Series are never truncated, only appended to.

use std::collections::BTreeSet;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Local;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::TrackerConfig;
use crate::csv;
use crate::error::TrackerError;
use crate::types::{Rank, RankHit, RankRecord, FIELD_SENTINEL, RANK_SENTINEL, TIMESTAMP_FORMAT};

const SERIES_HEADER: [&str; 5] = ["timestamp", "keyword", "rank", "title", "url"];
const EXPORT_FILE: &str = "web_rankings_export.csv";
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Map a keyword to its filesystem-safe storage key: trimmed, with any
/// character that is not alphanumeric, underscore, space or hyphen replaced
/// by an underscore, then spaces collapsed to underscores.
///
/// Deterministic but lossy: distinct keywords differing only in punctuation
/// or case of separators can normalize to the same key and are then treated
/// as one series. Known limitation, not corrected.
pub fn sanitize_keyword(keyword: &str) -> String {
    keyword
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == ' ' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .replace(' ', "_")
}

/// Aggregate view over every stored series, for dashboard consumers.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub total_searches: usize,
    pub unique_keywords: usize,
    /// Mean over numeric ranks only, rounded to two decimals.
    pub average_rank: Option<f64>,
    pub best_rank: Option<u32>,
    pub worst_rank: Option<u32>,
    pub recent_searches: Vec<RankRecord>,
}

/// Chart-ready view of one keyword's series: date labels plus rank points,
/// with `None` holes where the observation was a not-found sentinel.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSeries {
    pub keyword: String,
    pub labels: Vec<String>,
    pub points: Vec<Option<u32>>,
}

/// Advisory per-series lock. Held for the duration of one append; the lock
/// file is removed when the guard drops, error paths included.
struct SeriesLock {
    path: PathBuf,
}

impl SeriesLock {
    async fn acquire(
        path: PathBuf,
        keyword: &str,
        timeout: Duration,
    ) -> Result<Self, TrackerError> {
        let start = Instant::now();
        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    let _ = write!(file, "{}", std::process::id());
                    return Ok(Self { path });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if start.elapsed() >= timeout {
                        return Err(TrackerError::LockTimeout {
                            keyword: keyword.to_string(),
                            waited_secs: timeout.as_secs(),
                        });
                    }
                    tokio::time::sleep(LOCK_POLL_INTERVAL).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl Drop for SeriesLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("Failed to release lock file {:?}: {}", self.path, e);
        }
    }
}

pub struct RankStore {
    data_dir: PathBuf,
    lock_timeout: Duration,
}

impl RankStore {
    pub fn new(config: &TrackerConfig) -> Result<Self, TrackerError> {
        fs::create_dir_all(&config.data_dir)?;
        Ok(Self {
            data_dir: config.data_dir.clone(),
            lock_timeout: config.lock_timeout,
        })
    }

    fn series_path(&self, keyword: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}.csv", sanitize_keyword(keyword)))
    }

    /// Append one observation to the keyword's series. `None` writes the
    /// not-found sentinel row. Every lookup attempt lands exactly one row.
    pub async fn append(
        &self,
        keyword: &str,
        hit: Option<&RankHit>,
    ) -> Result<(), TrackerError> {
        let path = self.series_path(keyword);
        let lock_path = path.with_extension("csv.lock");
        let _lock = SeriesLock::acquire(lock_path, keyword, self.lock_timeout).await?;

        let is_new = !path.exists();
        let mut file = OpenOptions::new().append(true).create(true).open(&path)?;
        if is_new {
            csv::write_row(&mut file, &SERIES_HEADER)?;
        }

        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        match hit {
            Some(hit) => {
                let rank = hit.rank.to_string();
                csv::write_row(&mut file, &[&timestamp, keyword, &rank, &hit.title, &hit.url])?;
            }
            None => {
                csv::write_row(
                    &mut file,
                    &[&timestamp, keyword, RANK_SENTINEL, FIELD_SENTINEL, FIELD_SENTINEL],
                )?;
            }
        }
        file.flush()?;

        info!("Saved result for keyword '{}' to {:?}", keyword, path);
        Ok(())
    }

    /// Full series for one keyword, in append order. A missing file yields
    /// an empty history; malformed rows are skipped, not fatal.
    pub fn history(&self, keyword: &str) -> Vec<RankRecord> {
        let path = self.series_path(keyword);
        if !path.exists() {
            return Vec::new();
        }
        match read_series(&path) {
            Ok(records) => records,
            Err(e) => {
                error!("Error reading history for '{}': {}", keyword, e);
                Vec::new()
            }
        }
    }

    /// Union of all stored series. Ordered within each keyword's run of
    /// rows, with no global ordering across keywords.
    pub fn all_history(&self) -> Vec<RankRecord> {
        let mut records = Vec::new();
        for path in self.series_files() {
            match read_series(&path) {
                Ok(rows) => records.extend(rows),
                Err(e) => warn!("Error reading {:?}: {}", path, e),
            }
        }
        records
    }

    /// Keywords recovered from stored file names, sorted. Lossy round-trip:
    /// underscores read back as spaces, so original punctuation and the
    /// exact spacing of the submitted keyword are not recoverable.
    pub fn all_keywords(&self) -> Vec<String> {
        let keywords: BTreeSet<String> = self
            .series_files()
            .into_iter()
            .filter_map(|path| {
                path.file_stem()
                    .map(|stem| stem.to_string_lossy().replace('_', " "))
            })
            .collect();
        keywords.into_iter().collect()
    }

    /// Materialize the full history into a single downloadable CSV. The
    /// export file lives in the data directory but is excluded from scans.
    pub fn export(&self) -> Result<PathBuf, TrackerError> {
        let records = self.all_history();
        let path = self.data_dir.join(EXPORT_FILE);
        let mut file = fs::File::create(&path)?;

        csv::write_row(&mut file, &SERIES_HEADER)?;
        for record in &records {
            let rank = record.rank.as_store_value();
            csv::write_row(
                &mut file,
                &[
                    &record.timestamp,
                    &record.keyword,
                    &rank,
                    &record.title,
                    &record.url,
                ],
            )?;
        }
        file.flush()?;

        info!("Exported {} rows to {:?}", records.len(), path);
        Ok(path)
    }

    /// Aggregates across every series: totals, numeric-rank extremes and
    /// the five most recently scanned rows.
    pub fn summary(&self) -> DashboardSummary {
        let records = self.all_history();
        let keywords: BTreeSet<&str> = records.iter().map(|r| r.keyword.as_str()).collect();
        let numeric: Vec<u32> = records.iter().filter_map(|r| r.rank.position()).collect();

        let average_rank = if numeric.is_empty() {
            None
        } else {
            let mean = numeric.iter().map(|&n| n as f64).sum::<f64>() / numeric.len() as f64;
            Some((mean * 100.0).round() / 100.0)
        };

        let recent_start = records.len().saturating_sub(5);
        DashboardSummary {
            total_searches: records.len(),
            unique_keywords: keywords.len(),
            average_rank,
            best_rank: numeric.iter().min().copied(),
            worst_rank: numeric.iter().max().copied(),
            recent_searches: records[recent_start..].to_vec(),
        }
    }

    /// Date labels and rank points for charting one keyword's trend.
    pub fn chart_series(&self, keyword: &str) -> ChartSeries {
        let history = self.history(keyword);
        let labels = history
            .iter()
            .map(|r| r.timestamp.chars().take(10).collect())
            .collect();
        let points = history.iter().map(|r| r.rank.position()).collect();

        ChartSeries {
            keyword: keyword.to_string(),
            labels,
            points,
        }
    }

    fn series_files(&self) -> Vec<PathBuf> {
        let entries = match fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(e) => {
                error!("Error listing data directory {:?}: {}", self.data_dir, e);
                return Vec::new();
            }
        };

        entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension().is_some_and(|ext| ext == "csv")
                    && path
                        .file_name()
                        .is_some_and(|name| name != EXPORT_FILE)
            })
            .collect()
    }
}

fn read_series(path: &Path) -> std::io::Result<Vec<RankRecord>> {
    let text = fs::read_to_string(path)?;
    let mut records = Vec::new();

    for (number, line) in text.lines().enumerate() {
        if number == 0 || line.trim().is_empty() {
            continue; // header
        }
        let fields = match csv::split_line(line) {
            Some(fields) if fields.len() == 5 => fields,
            _ => {
                warn!("Skipping malformed row {} in {:?}", number + 1, path);
                continue;
            }
        };
        let mut fields = fields.into_iter();
        records.push(RankRecord {
            timestamp: fields.next().unwrap_or_default(),
            keyword: fields.next().unwrap_or_default(),
            rank: Rank::parse(&fields.next().unwrap_or_default()),
            title: fields.next().unwrap_or_default(),
            url: fields.next().unwrap_or_default(),
        });
    }
    Ok(records)
}
