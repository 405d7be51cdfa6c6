//! Chunked parallel execution of filter and group-by queries.
//!
//! The engine evaluates the same queries as [`crate::processing`] on a dedicated rayon pool.
//! Chunks are processed independently against the shared read-only dataset and merged in chunk
//! order, so filters return exactly the sequential view and counts match exactly. Means agree
//! up to floating-point summation order.

mod observer;

use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

use crate::error::QueryResult;
use crate::processing::aggregate::{count_groups, finish_means, rank_counts, sum_groups};
use crate::processing::{CompiledFilter, DataView, FilterCriteria, Predicate};
use crate::types::{DataSet, GroupKey, Value};

pub use observer::{
    ExecutionEvent, ExecutionMetrics, ExecutionMetricsSnapshot, ExecutionObserver, LogExecutionObserver,
};

/// Configuration for the [`ExecutionEngine`].
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Number of worker threads used by the engine.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
    /// Number of rows per chunk.
    pub chunk_size: usize,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            num_threads: None,
            chunk_size: 4_096,
        }
    }
}

/// A configurable parallel engine for listing queries.
pub struct ExecutionEngine {
    pool: ThreadPool,
    opts: ExecutionOptions,
    observer: Option<Arc<dyn ExecutionObserver>>,
    metrics: Arc<ExecutionMetrics>,
}

impl ExecutionEngine {
    /// Create a new engine with the given options.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size == 0` or `num_threads == Some(0)`.
    pub fn new(opts: ExecutionOptions) -> Result<Self, ThreadPoolBuildError> {
        assert!(opts.chunk_size > 0, "chunk_size must be > 0");
        if let Some(n) = opts.num_threads {
            assert!(n > 0, "num_threads must be > 0 when set");
        }

        let n_threads = opts
            .num_threads
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1));
        let pool = ThreadPoolBuilder::new().num_threads(n_threads).build()?;

        Ok(Self {
            pool,
            opts,
            observer: None,
            metrics: Arc::new(ExecutionMetrics::new()),
        })
    }

    /// Attach an observer for execution events (metrics/logging).
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a handle to real-time execution metrics.
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Parallel equivalent of [`crate::processing::apply`].
    pub fn filter_parallel<'a>(
        &self,
        dataset: &'a DataSet,
        criteria: &FilterCriteria,
    ) -> QueryResult<DataView<'a>> {
        criteria.validate()?;
        self.filter_where_parallel(dataset, &criteria.predicates())
    }

    /// Parallel equivalent of [`crate::processing::filter_where`].
    pub fn filter_where_parallel<'a>(
        &self,
        dataset: &'a DataSet,
        predicates: &[Predicate],
    ) -> QueryResult<DataView<'a>> {
        let compiled = CompiledFilter::compile(&dataset.schema, predicates)?;
        let indices = self.run("filter", dataset.row_count(), |range| {
            let kept: Vec<usize> = range.filter(|&i| compiled.matches(&dataset.rows[i])).collect();
            (kept.len(), kept)
        });
        Ok(DataView::from_sorted_indices(dataset, indices.into_iter().flatten().collect()))
    }

    /// Parallel equivalent of [`crate::processing::count_by`].
    pub fn count_by_parallel(
        &self,
        view: &DataView<'_>,
        key_column: &str,
        top_n: Option<usize>,
    ) -> QueryResult<Vec<(GroupKey, usize)>> {
        let (key_idx, _) = view.schema().require(key_column)?;
        let partials = self.run("count_by", view.len(), |range| {
            let counts = count_groups(chunk_rows(view, range), key_idx);
            (counts.len(), counts)
        });

        let mut merged: BTreeMap<GroupKey, usize> = BTreeMap::new();
        for partial in partials {
            for (key, n) in partial {
                *merged.entry(key).or_insert(0) += n;
            }
        }
        Ok(rank_counts(merged, top_n))
    }

    /// Parallel equivalent of [`crate::processing::mean_by`].
    pub fn mean_by_parallel(
        &self,
        view: &DataView<'_>,
        key_column: &str,
        value_column: &str,
    ) -> QueryResult<BTreeMap<GroupKey, f64>> {
        let (key_idx, _) = view.schema().require(key_column)?;
        let (value_idx, _) = view.schema().require_numeric(value_column)?;
        let partials = self.run("mean_by", view.len(), |range| {
            let sums = sum_groups(chunk_rows(view, range), key_idx, value_idx);
            (sums.len(), sums)
        });

        let mut merged: BTreeMap<GroupKey, (f64, usize)> = BTreeMap::new();
        for partial in partials {
            for (key, (sum, n)) in partial {
                let entry = merged.entry(key).or_insert((0.0, 0));
                entry.0 += sum;
                entry.1 += n;
            }
        }
        Ok(finish_means(merged))
    }

    /// Run `work` over `0..len` in chunks on the pool; results come back in chunk order.
    ///
    /// `work` returns the chunk's output size (for events) alongside its result.
    fn run<T, F>(&self, operation: &'static str, len: usize, work: F) -> Vec<T>
    where
        T: Send,
        F: Fn(Range<usize>) -> (usize, T) + Send + Sync,
    {
        let start = Instant::now();
        self.metrics.begin_run();
        self.emit(ExecutionEvent::RunStarted { operation, rows: len });

        let out = self.pool.install(|| {
            chunk_ranges(len, self.opts.chunk_size)
                .into_par_iter()
                .map(|range| {
                    let rows = range.len();
                    self.metrics.on_chunk_start();
                    self.emit(ExecutionEvent::ChunkStarted {
                        start_row: range.start,
                        row_count: rows,
                    });

                    let (output_len, result) = work(range);

                    self.emit(ExecutionEvent::ChunkFinished { output_len });
                    self.metrics.on_chunk_end(rows, output_len);
                    result
                })
                .collect::<Vec<_>>()
        });

        self.metrics.end_run(start.elapsed());
        self.emit(ExecutionEvent::RunFinished {
            operation,
            elapsed: start.elapsed(),
            metrics: self.metrics.snapshot(),
        });
        out
    }

    fn emit(&self, event: ExecutionEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

fn chunk_rows<'v, 'a: 'v>(
    view: &'v DataView<'a>,
    range: Range<usize>,
) -> impl Iterator<Item = &'a [Value]> + 'v {
    let rows = &view.dataset().rows;
    view.indices()[range].iter().map(move |&i| rows[i].as_slice())
}

fn chunk_ranges(row_count: usize, chunk_size: usize) -> Vec<Range<usize>> {
    (0..row_count)
        .step_by(chunk_size)
        .map(|start| start..(start + chunk_size).min(row_count))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::{chunk_ranges, ExecutionEngine, ExecutionEvent, ExecutionObserver, ExecutionOptions};
    use crate::listing::{ListingDataset, ListingRecord};
    use crate::processing::{apply, count_by, mean_by, DataView, FilterCriteria};

    fn listings(n: usize) -> ListingDataset {
        let countries = ["Spain", "Portugal", "Brazil", "Turkey"];
        let rooms = ["Entire home/apt", "Private room", "Shared room"];
        ListingDataset::from_records((0..n).map(|i| ListingRecord {
            country: countries[i % countries.len()].to_string(),
            property_type: if i % 5 == 0 { "House" } else { "Apartment" }.to_string(),
            room_type: rooms[i % rooms.len()].to_string(),
            host_name: format!("host-{}", i % 7),
            name: format!("listing-{i}"),
            price: (i % 50) as f64 * 10.0,
            availability_365: (i % 366) as i64,
        }))
        .unwrap()
    }

    fn engine(chunk_size: usize) -> ExecutionEngine {
        ExecutionEngine::new(ExecutionOptions {
            num_threads: Some(4),
            chunk_size,
        })
        .unwrap()
    }

    #[test]
    fn chunk_ranges_cover_all_rows() {
        assert_eq!(chunk_ranges(0, 4), vec![]);
        assert_eq!(chunk_ranges(5, 2), vec![0..2, 2..4, 4..5]);
    }

    #[test]
    fn parallel_filter_matches_sequential() {
        let ds = listings(1_000);
        let mut criteria = FilterCriteria::select_all(&ds).unwrap();
        criteria.countries.remove("Brazil");
        criteria.price_max = 300.0;

        let sequential = apply(ds.dataset(), &criteria).unwrap();
        let parallel = engine(37).filter_parallel(ds.dataset(), &criteria).unwrap();
        assert_eq!(parallel.indices(), sequential.indices());
    }

    #[test]
    fn parallel_aggregates_match_sequential() {
        let ds = listings(999);
        let view = DataView::all(ds.dataset());
        let engine = engine(64);

        assert_eq!(
            engine.count_by_parallel(&view, "Host_name", Some(3)).unwrap(),
            count_by(&view, "Host_name", Some(3)).unwrap()
        );
        // Prices are multiples of ten, so sums are exact in any order.
        assert_eq!(
            engine.mean_by_parallel(&view, "Room_type", "Price").unwrap(),
            mean_by(&view, "Room_type", "Price").unwrap()
        );
    }

    #[derive(Default)]
    struct ChunkCounter {
        started: AtomicUsize,
        finished: AtomicUsize,
    }

    impl ExecutionObserver for ChunkCounter {
        fn on_event(&self, event: &ExecutionEvent) {
            match event {
                ExecutionEvent::ChunkStarted { .. } => {
                    self.started.fetch_add(1, Ordering::SeqCst);
                }
                ExecutionEvent::ChunkFinished { .. } => {
                    self.finished.fetch_add(1, Ordering::SeqCst);
                }
                _ => {}
            }
        }
    }

    #[test]
    fn observer_and_metrics_track_chunks() {
        let ds = listings(100);
        let counter = Arc::new(ChunkCounter::default());
        let engine = engine(10).with_observer(counter.clone());
        let metrics = engine.metrics();

        let view = DataView::all(ds.dataset());
        engine.count_by_parallel(&view, "Country", None).unwrap();

        assert_eq!(counter.started.load(Ordering::SeqCst), 10);
        assert_eq!(counter.finished.load(Ordering::SeqCst), 10);
        let snap = metrics.snapshot();
        assert_eq!(snap.run_id, 1);
        assert_eq!(snap.rows_processed, 100);
        assert_eq!(snap.chunks_finished, 10);
        // Four countries, every chunk of ten sees all of them.
        assert_eq!(snap.items_emitted, 40);
        assert!(snap.elapsed.is_some());
    }

    #[test]
    fn invalid_criteria_surface_before_any_work() {
        let ds = listings(10);
        let mut criteria = FilterCriteria::select_all(&ds).unwrap();
        criteria.price_min = 500.0;
        criteria.price_max = 1.0;
        let engine = engine(4);
        assert!(engine.filter_parallel(ds.dataset(), &criteria).is_err());
        assert_eq!(engine.metrics().snapshot().run_id, 0);
    }
}
