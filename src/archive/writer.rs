use chrono::{Local, NaiveDate};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use crate::errors::ScanError;
use super::record::ArchiveRecord;
use tracing::{debug, info, warn};

pub const FILE_PREFIX: &str = "oastscan";
const FILE_SUFFIX: &str = ".log.gz";
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Appends record batches to `oastscan_<yyyymmdd>_<n>.log.gz`, one gzip
/// member per batch, moving to `n + 1` once a file passes the size limit.
pub struct ArchiveWriter {
    dir: PathBuf,
    max_file_size: u64,
}

impl ArchiveWriter {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes.max(1);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn day_prefix(date: NaiveDate) -> String {
        format!("{}_{}_", FILE_PREFIX, date.format("%Y%m%d"))
    }

    /// File the next batch for `date` goes into.
    pub async fn current_file(&self, date: NaiveDate) -> Result<PathBuf, ScanError> {
        let prefix = Self::day_prefix(date);
        let mut latest: Option<(u32, u64)> = None;

        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(index) = name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(FILE_SUFFIX))
                .and_then(|n| n.parse::<u32>().ok())
            else {
                continue;
            };
            if latest.map_or(true, |(best, _)| index > best) {
                let size = entry.metadata().await?.len();
                latest = Some((index, size));
            }
        }

        let index = match latest {
            None => 0,
            Some((index, size)) if size < self.max_file_size => index,
            Some((index, _)) => index + 1,
        };
        Ok(self.dir.join(format!("{}{}{}", prefix, index, FILE_SUFFIX)))
    }

    /// Write one batch as a gzip member appended to the current file.
    pub async fn append_batch(&self, records: &[ArchiveRecord]) -> Result<PathBuf, ScanError> {
        let mut lines = String::new();
        for record in records {
            lines.push_str(&serde_json::to_string(record)?);
            lines.push('\n');
        }
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(lines.as_bytes())?;
        let compressed = encoder.finish()?;

        let path = self.current_file(Local::now().date_naive()).await?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(&compressed).await?;
        file.flush().await?;
        debug!(path = %path.display(), records = records.len(), "Archive batch written");
        Ok(path)
    }

    /// Delete archive files dated before `today - retention_days`.
    pub async fn clean_expired(&self, retention_days: u32, today: NaiveDate) -> Result<usize, ScanError> {
        let cutoff = today - chrono::Duration::days(i64::from(retention_days));
        let mut removed = 0;

        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(date) = name
                .strip_prefix(FILE_PREFIX)
                .and_then(|rest| rest.strip_prefix('_'))
                .and_then(|rest| rest.split('_').next())
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y%m%d").ok())
            else {
                continue;
            };
            if date < cutoff {
                match tokio::fs::remove_file(entry.path()).await {
                    Ok(()) => removed += 1,
                    Err(e) => warn!(file = %name, error = %e, "Failed to delete expired archive"),
                }
            }
        }
        if removed > 0 {
            info!(removed, retention_days, "Expired archive files deleted");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_first_file_is_index_zero() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArchiveWriter::new(dir.path());
        let path = writer.current_file(day(2025, 3, 9)).await.unwrap();
        assert_eq!(path.file_name().unwrap(), "oastscan_20250309_0.log.gz");
    }

    #[tokio::test]
    async fn test_rotation_uses_numeric_order() {
        let dir = tempfile::tempdir().unwrap();
        for n in [0, 2, 10] {
            std::fs::write(dir.path().join(format!("oastscan_20250309_{}.log.gz", n)), vec![0u8; 8]).unwrap();
        }
        let writer = ArchiveWriter::new(dir.path()).with_max_file_size(8);
        let path = writer.current_file(day(2025, 3, 9)).await.unwrap();
        assert_eq!(path.file_name().unwrap(), "oastscan_20250309_11.log.gz");

        let roomy = ArchiveWriter::new(dir.path()).with_max_file_size(1024);
        let path = roomy.current_file(day(2025, 3, 9)).await.unwrap();
        assert_eq!(path.file_name().unwrap(), "oastscan_20250309_10.log.gz");
    }

    #[tokio::test]
    async fn test_clean_expired() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "oastscan_20250101_0.log.gz",
            "oastscan_20250305_0.log.gz",
            "oastscan_20250309_3.log.gz",
            "oastscan_garbage.log.gz",
            "notes.txt",
        ] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        let writer = ArchiveWriter::new(dir.path());
        let removed = writer.clean_expired(7, day(2025, 3, 9)).await.unwrap();
        assert_eq!(removed, 1);
        assert!(!dir.path().join("oastscan_20250101_0.log.gz").exists());
        assert!(dir.path().join("oastscan_20250305_0.log.gz").exists());
        assert!(dir.path().join("notes.txt").exists());
    }
}
