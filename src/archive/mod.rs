//! Compressed on-disk log of every probe the engine sends.
//!
//! Scanners call [`ProbeArchive::record`] from worker tasks; it only buffers.
//! A background flusher writes full batches, and a final flush on shutdown
//! writes whatever is left.

pub mod record;
pub mod writer;

use chrono::Local;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use crate::errors::ScanError;
use crate::host::HttpExchange;
use tracing::{debug, info, warn};

pub use record::ArchiveRecord;
pub use writer::ArchiveWriter;

/// Records buffered before the flusher is woken.
pub const BATCH_SIZE: usize = 100;

pub struct ProbeArchive {
    writer: ArchiveWriter,
    buffer: Mutex<VecDeque<ArchiveRecord>>,
    flush_signal: Notify,
    write_lock: tokio::sync::Mutex<()>,
    written: AtomicU64,
}

impl ProbeArchive {
    /// Create the archive directory and delete files older than
    /// `retention_days`.
    pub async fn open(dir: &Path, retention_days: u32) -> Result<Self, ScanError> {
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            ScanError::Archive(format!("Cannot create archive dir {}: {}", dir.display(), e))
        })?;
        let writer = ArchiveWriter::new(dir);
        writer.clean_expired(retention_days, Local::now().date_naive()).await?;
        info!(dir = %dir.display(), retention_days, "Probe archive opened");
        Ok(Self::with_writer(writer))
    }

    pub fn with_writer(writer: ArchiveWriter) -> Self {
        Self {
            writer,
            buffer: Mutex::new(VecDeque::new()),
            flush_signal: Notify::new(),
            write_lock: tokio::sync::Mutex::new(()),
            written: AtomicU64::new(0),
        }
    }

    fn buffer(&self) -> MutexGuard<'_, VecDeque<ArchiveRecord>> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Buffer one exchange. Never blocks on I/O.
    pub fn record(&self, exchange: &HttpExchange) {
        let record = ArchiveRecord::from_exchange(exchange);
        let len = {
            let mut buffer = self.buffer();
            buffer.push_back(record);
            buffer.len()
        };
        if len >= BATCH_SIZE {
            self.flush_signal.notify_one();
        }
    }

    pub fn buffered(&self) -> usize {
        self.buffer().len()
    }

    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    pub fn dir(&self) -> &Path {
        self.writer.dir()
    }

    /// Write everything buffered as one batch. On failure the batch goes
    /// back to the front of the buffer, ahead of anything recorded since.
    pub async fn flush(&self) -> Result<usize, ScanError> {
        let _guard = self.write_lock.lock().await;
        let batch: Vec<ArchiveRecord> = self.buffer().drain(..).collect();
        if batch.is_empty() {
            return Ok(0);
        }

        match self.writer.append_batch(&batch).await {
            Ok(path) => {
                let count = batch.len();
                self.written.fetch_add(count as u64, Ordering::Relaxed);
                debug!(records = count, file = %path.display(), "Archive flushed");
                Ok(count)
            }
            Err(e) => {
                let mut buffer = self.buffer();
                for record in batch.into_iter().rev() {
                    buffer.push_front(record);
                }
                Err(e)
            }
        }
    }

    /// Flush whenever a batch fills up, then once more on cancellation.
    pub async fn run_flusher(self: Arc<Self>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = self.flush_signal.notified() => {
                    if let Err(e) = self.flush().await {
                        warn!(error = %e, buffered = self.buffered(), "Archive flush failed, batch kept");
                    }
                }
            }
        }
        if let Err(e) = self.flush().await {
            warn!(error = %e, buffered = self.buffered(), "Final archive flush failed");
        }
    }
}
