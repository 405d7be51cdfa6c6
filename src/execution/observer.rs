use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use log::debug;

/// Execution events emitted by the engine.
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted { operation: &'static str, rows: usize },
    ChunkStarted { start_row: usize, row_count: usize },
    ChunkFinished { output_len: usize },
    RunFinished {
        operation: &'static str,
        elapsed: Duration,
        metrics: ExecutionMetricsSnapshot,
    },
}

/// Observer hook for execution events.
pub trait ExecutionObserver: Send + Sync {
    fn on_event(&self, event: &ExecutionEvent);
}

/// Forwards execution events to the `log` facade at debug level (target `execution`).
#[derive(Debug, Default)]
pub struct LogExecutionObserver;

impl ExecutionObserver for LogExecutionObserver {
    fn on_event(&self, event: &ExecutionEvent) {
        match event {
            ExecutionEvent::RunFinished {
                operation, metrics, ..
            } => debug!(target: "execution", "{operation} finished: {metrics}"),
            other => debug!(target: "execution", "{other:?}"),
        }
    }
}

/// Counters for the most recent query run.
///
/// Updated with relaxed atomics while chunks are in flight, so a snapshot taken mid-run is
/// approximate; after the query returns it is exact.
#[derive(Debug, Default)]
pub struct ExecutionMetrics {
    run_id: AtomicU64,
    elapsed_ns: AtomicU64,
    rows_processed: AtomicU64,
    chunks_started: AtomicU64,
    chunks_finished: AtomicU64,
    items_emitted: AtomicU64,
}

impl ExecutionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_run(&self) {
        self.run_id.fetch_add(1, Ordering::Relaxed);
        self.elapsed_ns.store(0, Ordering::Relaxed);
        self.rows_processed.store(0, Ordering::Relaxed);
        self.chunks_started.store(0, Ordering::Relaxed);
        self.chunks_finished.store(0, Ordering::Relaxed);
        self.items_emitted.store(0, Ordering::Relaxed);
    }

    pub fn end_run(&self, elapsed: Duration) {
        self.elapsed_ns
            .store(elapsed.as_nanos().min(u64::MAX as u128) as u64, Ordering::Relaxed);
    }

    pub fn on_chunk_start(&self) {
        self.chunks_started.fetch_add(1, Ordering::Relaxed);
    }

    /// `rows` went in; `emitted` matching rows or partial groups came out.
    pub fn on_chunk_end(&self, rows: usize, emitted: usize) {
        self.rows_processed.fetch_add(rows as u64, Ordering::Relaxed);
        self.items_emitted.fetch_add(emitted as u64, Ordering::Relaxed);
        self.chunks_finished.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ExecutionMetricsSnapshot {
        let elapsed_ns = self.elapsed_ns.load(Ordering::Relaxed);
        ExecutionMetricsSnapshot {
            run_id: self.run_id.load(Ordering::Relaxed),
            elapsed: (elapsed_ns > 0).then(|| Duration::from_nanos(elapsed_ns)),
            rows_processed: self.rows_processed.load(Ordering::Relaxed),
            chunks_started: self.chunks_started.load(Ordering::Relaxed),
            chunks_finished: self.chunks_finished.load(Ordering::Relaxed),
            items_emitted: self.items_emitted.load(Ordering::Relaxed),
        }
    }
}

/// Immutable snapshot of [`ExecutionMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionMetricsSnapshot {
    pub run_id: u64,
    pub elapsed: Option<Duration>,
    pub rows_processed: u64,
    pub chunks_started: u64,
    pub chunks_finished: u64,
    /// Rows kept (filters) or partial groups produced (aggregations), summed over chunks.
    pub items_emitted: u64,
}

impl fmt::Display for ExecutionMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run #{}: {} rows in {}/{} chunks -> {} items, elapsed={:?}",
            self.run_id,
            self.rows_processed,
            self.chunks_finished,
            self.chunks_started,
            self.items_emitted,
            self.elapsed
        )
    }
}
