//! Flush worker pool
//!
//! One pipeline per ingest run. The ingest thread calls `add_record` /
//! `add_key`; cut batches travel over a bounded crossbeam channel to a
//! fixed set of flush workers, each committing independently against the
//! shared storage manager. `finalize` flushes the residue, closes the
//! channel, and joins the pool with a timeout.

use super::Batch;
use crate::error::{BatchError, BatchResult};
use crate::schema::{Record, SchemaRegistry};
use crate::store::StorageManager;
use crate::value::Value;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How often the finalize loop polls worker completion
const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Counters shared between the pipeline and its workers
#[derive(Debug, Default)]
pub struct PipelineStats {
    /// Full rows committed
    pub rows_written: AtomicU64,

    /// Placeholder keys committed
    pub keys_written: AtomicU64,

    /// Batches flushed
    pub batches_flushed: AtomicU64,

    /// Insert calls that failed (logged, not raised)
    pub insert_failures: AtomicU64,
}

impl PipelineStats {
    /// Full rows committed so far
    pub fn rows_written(&self) -> u64 {
        self.rows_written.load(Ordering::Relaxed)
    }

    /// Placeholder keys committed so far
    pub fn keys_written(&self) -> u64 {
        self.keys_written.load(Ordering::Relaxed)
    }

    /// Batches flushed so far
    pub fn batches_flushed(&self) -> u64 {
        self.batches_flushed.load(Ordering::Relaxed)
    }

    /// Failed insert calls so far
    pub fn insert_failures(&self) -> u64 {
        self.insert_failures.load(Ordering::Relaxed)
    }
}

/// Buffers ingested records and flushes them in bounded batches through a
/// worker pool
///
/// The ingest path is single-threaded; the workers are the only concurrent
/// component. Batches may commit out of order (inserts are upserts, so
/// this is safe). Placeholder keys let a child row land before its parent:
/// the minimal parent row satisfies the foreign key until the real row
/// arrives and replaces it.
pub struct BatchPipeline {
    /// Accumulating batch, replaced on every cut
    batch: Batch,

    /// Feature count that cuts a batch
    limit: usize,

    /// Channel into the worker pool (dropped on finalize)
    sender: Option<Sender<Batch>>,

    /// Flush workers
    workers: Vec<FlushWorker>,

    /// How long finalize waits for the pool to drain
    timeout: Duration,

    /// Shared counters
    stats: Arc<PipelineStats>,
}

impl BatchPipeline {
    /// Create a pipeline with `workers` flush threads
    ///
    /// The registry snapshot is used by workers to resolve descriptors at
    /// flush time; registration must be complete before the pipeline is
    /// built.
    pub fn new(
        manager: Arc<dyn StorageManager>,
        registry: Arc<SchemaRegistry>,
        limit: usize,
        workers: usize,
        timeout: Duration,
    ) -> BatchResult<Self> {
        // Channel holds one batch per worker plus one in reserve; the
        // ingest thread blocks when the pool falls behind (backpressure).
        let (sender, receiver) = bounded::<Batch>(workers + 1);
        let stats = Arc::new(PipelineStats::default());

        // Tables commit parent-first within a flush so a same-batch child
        // row never references a parent that has not landed yet.
        let order: Arc<Vec<String>> = Arc::new((*registry).clone().parent_first()?);

        let pool = (0..workers)
            .map(|id| {
                FlushWorker::spawn(
                    id,
                    Arc::clone(&manager),
                    Arc::clone(&registry),
                    Arc::clone(&order),
                    receiver.clone(),
                    Arc::clone(&stats),
                )
            })
            .collect::<BatchResult<Vec<_>>>()?;

        info!(workers, limit, "Batch pipeline started");

        Ok(Self {
            batch: Batch::new(),
            limit,
            sender: Some(sender),
            workers: pool,
            timeout,
            stats,
        })
    }

    /// Add a fully-populated feature record
    pub fn add_record<R: Record>(&mut self, record: &R) -> BatchResult<()> {
        self.batch.add_record(record);
        self.cut_if_full()
    }

    /// Add a placeholder primary key for a table
    pub fn add_key(&mut self, table: &str, key: Value) -> BatchResult<()> {
        self.batch.add_key(table, key);
        // Placeholders never trip the limit
        Ok(())
    }

    /// Shared counters
    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// Flush any residual batch, drain the pool, and report
    ///
    /// Waits up to the configured timeout for in-flight flushes; workers
    /// still running past the deadline are abandoned and reported in the
    /// error.
    pub fn finalize(mut self) -> BatchResult<Arc<PipelineStats>> {
        if !self.batch.is_empty() {
            let residual = std::mem::take(&mut self.batch);
            self.send(residual)?;
        }

        // Closing the channel stops the workers once the queue drains
        self.sender = None;

        let deadline = Instant::now() + self.timeout;
        let mut pending = 0usize;
        for worker in self.workers.drain(..) {
            match worker.join_by(deadline) {
                JoinOutcome::Finished => {}
                JoinOutcome::Panicked(id) => return Err(BatchError::Panicked { id }),
                JoinOutcome::TimedOut => pending += 1,
            }
        }

        if pending > 0 {
            return Err(BatchError::ShutdownTimeout {
                secs: self.timeout.as_secs(),
                pending,
            });
        }

        info!(
            rows = self.stats.rows_written(),
            keys = self.stats.keys_written(),
            batches = self.stats.batches_flushed(),
            failures = self.stats.insert_failures(),
            "Batch pipeline finalized"
        );

        Ok(Arc::clone(&self.stats))
    }

    fn cut_if_full(&mut self) -> BatchResult<()> {
        if self.batch.len() >= self.limit {
            let full = std::mem::take(&mut self.batch);
            self.send(full)?;
        }
        Ok(())
    }

    fn send(&self, batch: Batch) -> BatchResult<()> {
        match &self.sender {
            Some(sender) => sender.send(batch).map_err(|_| BatchError::ChannelClosed),
            None => Err(BatchError::ChannelClosed),
        }
    }
}

enum JoinOutcome {
    Finished,
    Panicked(usize),
    TimedOut,
}

/// One flush worker thread
struct FlushWorker {
    id: usize,
    handle: JoinHandle<()>,
}

impl FlushWorker {
    fn spawn(
        id: usize,
        manager: Arc<dyn StorageManager>,
        registry: Arc<SchemaRegistry>,
        order: Arc<Vec<String>>,
        receiver: Receiver<Batch>,
        stats: Arc<PipelineStats>,
    ) -> BatchResult<Self> {
        let handle = thread::Builder::new()
            .name(format!("flush-{}", id))
            .spawn(move || flush_loop(id, manager, registry, order, receiver, stats))
            .map_err(|e| BatchError::SpawnFailed {
                id,
                reason: e.to_string(),
            })?;
        Ok(Self { id, handle })
    }

    /// Join with a deadline; a worker past the deadline is abandoned
    fn join_by(self, deadline: Instant) -> JoinOutcome {
        while !self.handle.is_finished() {
            if Instant::now() >= deadline {
                return JoinOutcome::TimedOut;
            }
            thread::sleep(JOIN_POLL_INTERVAL);
        }
        match self.handle.join() {
            Ok(()) => JoinOutcome::Finished,
            Err(_) => JoinOutcome::Panicked(self.id),
        }
    }
}

/// Worker loop: drain batches until the channel closes
fn flush_loop(
    id: usize,
    manager: Arc<dyn StorageManager>,
    registry: Arc<SchemaRegistry>,
    order: Arc<Vec<String>>,
    receiver: Receiver<Batch>,
    stats: Arc<PipelineStats>,
) {
    debug!(worker = id, "Flush worker started");

    for batch in receiver.iter() {
        flush_batch(batch, manager.as_ref(), &registry, &order, &stats);
    }

    debug!(worker = id, "Flush worker stopped");
}

/// Commit one batch: placeholder keys first, full rows second
///
/// Placeholders go first so a same-batch child row never sees a missing
/// parent. Insert failures are logged and counted, never raised: ingestion
/// proceeds with partial data rather than halting on one bad row.
fn flush_batch(
    batch: Batch,
    manager: &dyn StorageManager,
    registry: &SchemaRegistry,
    order: &[String],
    stats: &PipelineStats,
) {
    let (mut key_groups, mut row_groups) = batch.split();
    let rank = |table: &str| order.iter().position(|t| t == table).unwrap_or(usize::MAX);
    key_groups.sort_by_key(|(table, _)| rank(table));
    row_groups.sort_by_key(|(table, _)| rank(table));

    for (table, keys) in key_groups {
        let Some(desc) = registry.get(&table) else {
            warn!(table = %table, "Dropping placeholder keys for unregistered table");
            stats.insert_failures.fetch_add(1, Ordering::Relaxed);
            continue;
        };
        match manager.insert_keys(desc, &keys) {
            Ok(written) => {
                stats
                    .keys_written
                    .fetch_add(written as u64, Ordering::Relaxed);
            }
            Err(e) => {
                warn!(table = %table, error = %e, "Placeholder key insert failed");
                stats.insert_failures.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    for (table, rows) in row_groups {
        let Some(desc) = registry.get(&table) else {
            warn!(table = %table, "Dropping rows for unregistered table");
            stats.insert_failures.fetch_add(1, Ordering::Relaxed);
            continue;
        };
        match manager.insert_rows(desc, &rows) {
            Ok(written) => {
                stats
                    .rows_written
                    .fetch_add(written as u64, Ordering::Relaxed);
            }
            Err(e) => {
                warn!(table = %table, error = %e, "Row insert failed");
                stats.insert_failures.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    stats.batches_flushed.fetch_add(1, Ordering::Relaxed);
}
