//! Ingest worker pool
//!
//! Drives one scan pass: the [`FileScanner`] produces paths into a bounded queue, and a
//! semaphore-bounded set of workers turns each path into a [`Record`] and upserts it.
//!
//! Per file:
//! 1. Open and hash the whole stream (failure: log, skip the file)
//! 2. Rewind and extract tags (failure: empty descriptive fields, file still ingested)
//! 3. Derive the public path (failure: log at error, skip the file)
//! 4. Upsert into the catalog (failure: log, count as failed, keep going)
//!
//! [`IngestWorkerPool::scan`] returns only after every spawned worker has finished.

use crate::db::Catalog;
use crate::models::Record;
use crate::services::content_identifier::ContentIdentifier;
use crate::services::file_scanner::{FileScanner, ScanError};
use crate::services::metadata_extractor::{MediaMetadata, MetadataError, MetadataExtractor};
use crate::services::path_normalizer::PathNormalizer;
use std::fs::File;
use std::io::Seek;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

/// Capacity of the queue between the traversal and the workers
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Worker count when none is configured: CPU parallelism clamped to 4..=16
pub fn default_concurrency() -> usize {
    num_cpus::get().clamp(4, 16)
}

/// Summary of one scan pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Regular files the traversal emitted
    pub discovered: usize,
    /// Files upserted into the catalog
    pub ingested: usize,
    /// Subset of `ingested` with no descriptive tags
    pub untagged: usize,
    /// Files dropped before reaching the catalog (unreadable, outside root)
    pub skipped: usize,
    /// Files whose upsert failed, or whose worker died
    pub failed: usize,
    /// Directory entries the traversal could not read
    pub walk_errors: usize,
    /// Scan stopped early on request
    pub cancelled: bool,
}

impl ScanReport {
    /// Files that reached a final outcome
    pub fn processed(&self) -> usize {
        self.ingested + self.skipped + self.failed
    }

    fn tally(&mut self, result: Result<FileOutcome, JoinError>) {
        match result {
            Ok(FileOutcome::Ingested { untagged }) => {
                self.ingested += 1;
                if untagged {
                    self.untagged += 1;
                }
            }
            Ok(FileOutcome::Skipped) => self.skipped += 1,
            Ok(FileOutcome::Failed) => self.failed += 1,
            Err(e) => {
                tracing::error!("Ingest worker panicked: {}", e);
                self.failed += 1;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileOutcome {
    Ingested { untagged: bool },
    Skipped,
    Failed,
}

/// Everything a worker needs, shared by all workers of the pool
struct WorkerContext {
    catalog: Catalog,
    identifier: ContentIdentifier,
    extractor: MetadataExtractor,
    normalizer: PathNormalizer,
}

impl WorkerContext {
    async fn ingest(self: Arc<Self>, path: PathBuf) -> FileOutcome {
        let blocking = Arc::clone(&self);
        let prepared = tokio::task::spawn_blocking(move || blocking.prepare_record(&path)).await;

        let record = match prepared {
            Ok(Some(record)) => record,
            Ok(None) => return FileOutcome::Skipped,
            Err(e) => {
                tracing::error!("File worker panicked: {}", e);
                return FileOutcome::Failed;
            }
        };

        match self.catalog.upsert(&record).await {
            Ok(()) => {
                tracing::debug!(
                    identity = %record.identity,
                    path = %record.public_path,
                    title = %record.title,
                    "Ingested file"
                );
                FileOutcome::Ingested {
                    untagged: record.is_untagged(),
                }
            }
            Err(e) => {
                tracing::error!(
                    identity = %record.identity,
                    path = %record.public_path,
                    error = %e,
                    "Failed to store record"
                );
                FileOutcome::Failed
            }
        }
    }

    /// Blocking part of the pipeline; `None` means the file is skipped
    fn prepare_record(&self, path: &Path) -> Option<Record> {
        let mut file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "Cannot open file, skipping");
                return None;
            }
        };

        let (identity, size_bytes) = match self.identifier.identify_reader(&mut file) {
            Ok(hashed) => hashed,
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "Cannot read file, skipping");
                return None;
            }
        };

        let metadata = match file
            .rewind()
            .map_err(MetadataError::from)
            .and_then(|()| self.extractor.extract(&mut file))
        {
            Ok(metadata) => metadata,
            Err(MetadataError::NoMetadata) => {
                tracing::debug!(file = %path.display(), "No metadata");
                MediaMetadata::default()
            }
            Err(e) => {
                tracing::debug!(file = %path.display(), error = %e, "Unusable metadata");
                MediaMetadata::default()
            }
        };

        let public_path = match self.normalizer.public_path(path) {
            Ok(public_path) => public_path,
            Err(e) => {
                tracing::error!(error = %e, "Cannot derive public path, skipping");
                return None;
            }
        };

        Some(Record {
            identity: identity.into_string(),
            title: metadata.title,
            creator: metadata.artist,
            collection: metadata.album,
            genre: metadata.genre,
            release_year: metadata.year,
            encoding_format: metadata.format,
            container_type: metadata.file_type,
            public_path,
            size_bytes,
        })
    }
}

/// Bounded pool that ingests every file under the normalizer's root
pub struct IngestWorkerPool {
    context: Arc<WorkerContext>,
    scanner: FileScanner,
    concurrency: usize,
    queue_capacity: usize,
}

impl IngestWorkerPool {
    /// Pool over `normalizer.root()` with the lofty extractor and default limits
    pub fn new(catalog: Catalog, normalizer: PathNormalizer) -> Self {
        Self {
            context: Arc::new(WorkerContext {
                catalog,
                identifier: ContentIdentifier::new(),
                extractor: MetadataExtractor::new(),
                normalizer,
            }),
            scanner: FileScanner::new(),
            concurrency: default_concurrency(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    pub fn with_extractor(mut self, extractor: MetadataExtractor) -> Self {
        let context = &self.context;
        self.context = Arc::new(WorkerContext {
            catalog: context.catalog.clone(),
            identifier: context.identifier,
            extractor,
            normalizer: context.normalizer.clone(),
        });
        self
    }

    pub fn with_scanner(mut self, scanner: FileScanner) -> Self {
        self.scanner = scanner;
        self
    }

    /// Maximum files processed at once (at least 1)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn root(&self) -> &Path {
        self.context.normalizer.root()
    }

    /// Run one scan pass to completion
    ///
    /// Cancelling `cancel` stops the traversal and stops handing out paths; workers already
    /// running finish their upsert before this returns.
    pub async fn scan(&self, cancel: CancellationToken) -> Result<ScanReport, ScanError> {
        let root = self.root().to_path_buf();
        let (tx, mut rx) = mpsc::channel(self.queue_capacity);
        let (stats, traversal) = self.scanner.spawn(&root, tx, cancel.clone())?;

        tracing::info!(
            root = %root.display(),
            concurrency = self.concurrency,
            "Scan started"
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut workers = JoinSet::new();
        let mut report = ScanReport::default();

        loop {
            let path = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                next = rx.recv() => match next {
                    Some(path) => path,
                    None => break,
                },
            };

            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            while let Some(result) = workers.try_join_next() {
                report.tally(result);
            }

            let context = Arc::clone(&self.context);
            workers.spawn(async move {
                let _permit = permit;
                context.ingest(path).await
            });
        }

        // Unblocks a traversal waiting on a full queue
        drop(rx);

        // Join barrier
        while let Some(result) = workers.join_next().await {
            report.tally(result);
        }

        if let Err(e) = traversal.await {
            tracing::error!("Traversal task failed: {}", e);
        }

        report.discovered = stats.discovered();
        report.walk_errors = stats.walk_errors();
        report.cancelled = cancel.is_cancelled();

        tracing::info!(
            root = %root.display(),
            discovered = report.discovered,
            ingested = report.ingested,
            untagged = report.untagged,
            skipped = report.skipped,
            failed = report.failed,
            walk_errors = report.walk_errors,
            cancelled = report.cancelled,
            "Scan finished"
        );

        Ok(report)
    }
}
