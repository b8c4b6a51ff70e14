//! Harvest coordinator - main run orchestration logic
//!
//! This module runs the two phases of a harvest:
//! - Traversing the listing pages into a frozen candidate set
//! - Fetching every candidate on a bounded worker pool
//! - Ingesting outcomes on a single consumer and checkpointing snapshots
//! - Producing the final [`Report`]

use crate::config::Config;
use crate::crawler::{build_session, DetailFetcher, FetchFailure, ListingSession, Pacer, PageNavigator};
use crate::output::{Checkpointer, CsvCheckpointer, OutputError, OutputResult, Report};
use crate::state::{CandidateLink, CrawlState, Ingested, ProductRecord};
use crate::HarvestError;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

/// Outcome a worker hands to the ingestion loop
type Outcome = Result<ProductRecord, FetchFailure>;

/// Checkpointer shared with the blocking pool during a flush
type SnapshotSink = Arc<Mutex<Box<dyn Checkpointer>>>;

/// Main harvest coordinator structure
pub struct Harvester {
    config: Arc<Config>,
    fetcher: Arc<DetailFetcher>,
    session: Box<dyn ListingSession>,
    checkpointer: Box<dyn Checkpointer>,
    detail_pacer: Pacer,
    settle_pacer: Pacer,
}

impl Harvester {
    /// Creates a new harvester from a validated configuration
    ///
    /// # Arguments
    ///
    /// * `config` - The harvest configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Harvester)` - Ready to run
    /// * `Err(HarvestError)` - An HTTP client or the listing session could not be built
    pub fn new(config: Config) -> Result<Self, HarvestError> {
        let fetcher = DetailFetcher::from_config(&config.fetch, &config.headers)?;
        let session = build_session(&config.listing, &config.headers)?;
        let checkpointer = CsvCheckpointer::new(&config.output.path);
        let detail_pacer = Pacer::random(config.fetch.delay_min_ms, config.fetch.delay_max_ms);
        let [settle_min, settle_max] = config.listing.settle_delay_ms;
        let settle_pacer = Pacer::random(settle_min, settle_max);

        Ok(Self {
            config: Arc::new(config),
            fetcher: Arc::new(fetcher),
            session,
            checkpointer: Box::new(checkpointer),
            detail_pacer,
            settle_pacer,
        })
    }

    /// Replaces the listing session
    pub fn with_session(mut self, session: Box<dyn ListingSession>) -> Self {
        self.session = session;
        self
    }

    /// Replaces the snapshot destination
    pub fn with_checkpointer(mut self, checkpointer: Box<dyn Checkpointer>) -> Self {
        self.checkpointer = checkpointer;
        self
    }

    /// Replaces the pause taken by each worker after delivering a result
    pub fn with_pacer(mut self, pacer: Pacer) -> Self {
        self.detail_pacer = pacer;
        self
    }

    /// Replaces the settle pause taken on each listing page
    pub fn with_settle_pacer(mut self, pacer: Pacer) -> Self {
        self.settle_pacer = pacer;
        self
    }

    /// Runs both phases to completion
    ///
    /// Per-item failures never abort the run. Only a fatal listing failure or
    /// a crashed worker returns `Err`; a failed final snapshot is reported in
    /// [`Report::final_flush_error`].
    pub async fn run(self) -> Result<Report, HarvestError> {
        let started_at = Utc::now();
        let Harvester {
            config,
            fetcher,
            session,
            checkpointer,
            detail_pacer,
            settle_pacer,
        } = self;

        tracing::info!(
            "Starting harvest of up to {} listing pages",
            config.listing.max_pages
        );

        let mut navigator = PageNavigator::with_pacer(session, config.listing.clone(), settle_pacer);
        let candidates = navigator.traverse().await?;
        let traversal = navigator.stats().clone();
        tracing::info!("[TOTAL PRODUCT LINKS] {}", candidates.len());

        let destination = checkpointer.destination();
        let checkpointer: SnapshotSink = Arc::new(Mutex::new(checkpointer));

        let mut state = CrawlState::new(
            candidates.clone(),
            config.output.checkpoint_interval as usize,
        );
        let mut checkpoints_written = 0usize;
        let mut checkpoint_failures = 0usize;
        let mut worker_error = None;

        if candidates.is_empty() {
            tracing::warn!("No item links found; writing an empty snapshot");
        } else {
            let total = candidates.len();
            let width = (config.fetch.concurrency as usize).clamp(1, total);
            tracing::info!("Fetching {} items with {} workers", total, width);

            let (work_tx, work_rx) = mpsc::unbounded_channel::<CandidateLink>();
            for link in candidates.iter() {
                // The receiver is held right here, so this cannot fail
                let _ = work_tx.send(link.clone());
            }
            drop(work_tx);

            let queue = Arc::new(Mutex::new(work_rx));
            let (result_tx, mut result_rx) = mpsc::channel::<Outcome>(width * 2);

            let mut workers = JoinSet::new();
            for id in 0..width {
                workers.spawn(worker(
                    id,
                    queue.clone(),
                    fetcher.clone(),
                    result_tx.clone(),
                    detail_pacer.clone(),
                ));
            }
            drop(result_tx);

            while let Some(outcome) = result_rx.recv().await {
                let link = match &outcome {
                    Ok(record) => record.link.clone(),
                    Err(failure) => failure.url.clone(),
                };

                match state.ingest(outcome) {
                    Ingested::Retained => {}
                    Ingested::Failed => {}
                    Ingested::Dropped => tracing::debug!("Dropped {}: no title", link),
                    Ingested::Duplicate => tracing::warn!("Ignored repeated result for {}", link),
                    Ingested::Unknown => tracing::warn!("Ignored result for unknown link {}", link),
                }

                tracing::info!("[PRODUCTS SCRAPED] {}/{}", state.completed(), total);

                if state.checkpoint_due() {
                    match flush_snapshot(&checkpointer, state.records()).await {
                        Ok(()) => {
                            checkpoints_written += 1;
                            tracing::info!(
                                "[CHECKPOINT] {} records saved to {}",
                                state.records().len(),
                                destination
                            );
                        }
                        Err(e) => {
                            checkpoint_failures += 1;
                            tracing::warn!("Checkpoint failed: {}", e);
                        }
                    }
                }
            }

            while let Some(joined) = workers.join_next().await {
                if let Err(e) = joined {
                    tracing::error!("Worker crashed: {}", e);
                    worker_error.get_or_insert(e);
                }
            }

            if !state.is_drained() {
                tracing::warn!(
                    "Only {} of {} items completed",
                    state.completed(),
                    total
                );
            }
        }

        let final_flush_error = match flush_snapshot(&checkpointer, state.records()).await {
            Ok(()) => {
                checkpoints_written += 1;
                None
            }
            Err(e) => {
                tracing::error!("Final snapshot failed: {}", e);
                Some(e.to_string())
            }
        };

        if let Some(e) = worker_error {
            return Err(HarvestError::Worker(e));
        }

        let total_records = state.records().len();
        let dropped = state.dropped();
        let report = Report {
            total_candidates: candidates.len(),
            total_records,
            failures: state.into_failures(),
            dropped,
            traversal,
            checkpoints_written,
            checkpoint_failures,
            final_flush_error,
            destination,
            started_at,
            finished_at: Utc::now(),
        };

        tracing::info!(
            "[SAVED] {} records to {} ({} failed, {} dropped)",
            report.total_records,
            report.destination,
            report.failures.len(),
            report.dropped
        );

        Ok(report)
    }
}

/// Writes a snapshot of `records` on the blocking pool
///
/// The ingestion loop waits for the write, so snapshots stay ordered, but the
/// runtime thread is free for the workers while the file is written.
async fn flush_snapshot(checkpointer: &SnapshotSink, records: &[ProductRecord]) -> OutputResult<()> {
    let checkpointer = Arc::clone(checkpointer);
    let records = records.to_vec();
    tokio::task::spawn_blocking(move || checkpointer.blocking_lock().flush(&records))
        .await
        .map_err(|e| OutputError::Io(std::io::Error::other(e)))?
}

/// Pulls candidates until the queue is empty
///
/// The pause comes after the outcome has been handed over and before the next
/// candidate is taken.
async fn worker(
    id: usize,
    queue: Arc<Mutex<mpsc::UnboundedReceiver<CandidateLink>>>,
    fetcher: Arc<DetailFetcher>,
    results: mpsc::Sender<Outcome>,
    pacer: Pacer,
) {
    loop {
        let next = queue.lock().await.recv().await;
        let Some(link) = next else {
            break;
        };

        let outcome = fetcher.fetch(&link).await;
        if let Err(failure) = &outcome {
            tracing::warn!("[ERROR] {}", failure);
        }

        if results.send(outcome).await.is_err() {
            break;
        }

        pacer.pause().await;
    }
    tracing::trace!("Worker {} finished", id);
}

/// Runs a complete harvest
///
/// This is the main entry point. It will:
/// 1. Build the listing session, fetcher and CSV checkpointer
/// 2. Collect candidate links from the listing pages
/// 3. Fetch every candidate on the worker pool
/// 4. Write the final snapshot and return the report
///
/// # Arguments
///
/// * `config` - The harvest configuration
///
/// # Returns
///
/// * `Ok(Report)` - Harvest completed, possibly with per-item failures
/// * `Err(HarvestError)` - Harvest failed fatally
pub async fn harvest(config: Config) -> crate::Result<Report> {
    Harvester::new(config)?.run().await
}
