//! Bulk recomputation in bounded, paced batches with per-entity isolation.

pub mod latency;

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::FutureExt;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::Result;

pub use latency::LatencyStats;

/// fetch + normalize + score + persist for one entity id.
#[async_trait]
pub trait EntityJob: Send + Sync {
    fn name(&self) -> &'static str;
    async fn process(&self, id: &str) -> Result<()>;
}

/// Source of entity ids, one page at a time.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn page(&self, offset: usize, limit: usize) -> Result<Vec<String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    FetchingPage { offset: usize },
    ProcessingBatch { index: usize, size: usize },
    Done,
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunPhase::Idle => write!(f, "idle"),
            RunPhase::FetchingPage { offset } => write!(f, "fetching_page(offset={offset})"),
            RunPhase::ProcessingBatch { index, size } => write!(f, "processing_batch(#{index}, size={size})"),
            RunPhase::Done => write!(f, "done"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub updated: usize,
    pub errors: usize,
    pub p50_us: Option<u64>,
    pub p95_us: Option<u64>,
    pub p99_us: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct BatchUpdater {
    batch_size: usize,
    write_pacing: Duration,
    batch_pacing: Duration,
}

/// Mutable state of one run.
struct Run<'a> {
    job: &'a dyn EntityJob,
    phase: RunPhase,
    batches: usize,
    updated: usize,
    errors: usize,
    latency: LatencyStats,
}

impl<'a> Run<'a> {
    fn new(job: &'a dyn EntityJob) -> Self {
        Self {
            job,
            phase: RunPhase::Idle,
            batches: 0,
            updated: 0,
            errors: 0,
            latency: LatencyStats::new(),
        }
    }

    fn enter(&mut self, next: RunPhase) {
        debug!(job = self.job.name(), from = %self.phase, to = %next, "phase");
        self.phase = next;
    }

    fn finish(mut self) -> BatchSummary {
        self.enter(RunPhase::Done);
        let (p50_us, p95_us, p99_us) = self.latency.percentiles();
        let summary = BatchSummary {
            updated: self.updated,
            errors: self.errors,
            p50_us,
            p95_us,
            p99_us,
        };
        info!(
            job = self.job.name(),
            updated = summary.updated,
            errors = summary.errors,
            batches = self.batches,
            samples = self.latency.len(),
            "Batch run complete: {} updated, {} errors (entity latency p50={}us p95={}us p99={}us)",
            summary.updated,
            summary.errors,
            fmt_us(summary.p50_us),
            fmt_us(summary.p95_us),
            fmt_us(summary.p99_us),
        );
        summary
    }
}

fn fmt_us(v: Option<u64>) -> String {
    v.map(|us| us.to_string()).unwrap_or_else(|| "-".to_string())
}

impl BatchUpdater {
    pub fn new(batch_size: usize, write_pacing: Duration, batch_pacing: Duration) -> Self {
        Self {
            batch_size: batch_size.max(1),
            write_pacing,
            batch_pacing,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.batch_size, cfg.write_pacing, cfg.batch_pacing)
    }

    /// Process every id in order. Never aborts early; failures are counted.
    pub async fn run_all(&self, job: &dyn EntityJob, ids: &[String]) -> BatchSummary {
        let mut run = Run::new(job);
        for (index, chunk) in ids.chunks(self.batch_size).enumerate() {
            if index > 0 {
                self.pause(self.batch_pacing).await;
            }
            self.process_batch(&mut run, chunk).await;
        }
        run.finish()
    }

    /// Walk `source` page by page until a short page. A page fetch failure
    /// ends the run with the counts so far.
    pub async fn run_paged(&self, job: &dyn EntityJob, source: &dyn PageSource) -> BatchSummary {
        let mut run = Run::new(job);
        let mut offset = 0usize;
        loop {
            run.enter(RunPhase::FetchingPage { offset });
            let page = match source.page(offset, self.batch_size).await {
                Ok(p) => p,
                Err(e) => {
                    error!(job = job.name(), offset, "Page fetch failed, ending run: {e}");
                    break;
                }
            };
            if page.is_empty() {
                break;
            }
            if offset > 0 {
                self.pause(self.batch_pacing).await;
            }
            self.process_batch(&mut run, &page).await;
            offset += page.len();
            if page.len() < self.batch_size {
                break;
            }
        }
        run.finish()
    }

    async fn process_batch(&self, run: &mut Run<'_>, ids: &[String]) {
        run.enter(RunPhase::ProcessingBatch { index: run.batches, size: ids.len() });
        run.batches += 1;

        for (i, id) in ids.iter().enumerate() {
            if i > 0 {
                self.pause(self.write_pacing).await;
            }
            let started = Instant::now();
            let outcome = AssertUnwindSafe(run.job.process(id)).catch_unwind().await;
            run.latency.record(started.elapsed());

            match outcome {
                Ok(Ok(())) => run.updated += 1,
                Ok(Err(e)) if e.is_rate_limit() => {
                    run.errors += 1;
                    warn!(job = run.job.name(), entity = %id, "Entity skipped, upstream still throttling: {e}");
                }
                Ok(Err(e)) => {
                    run.errors += 1;
                    error!(job = run.job.name(), entity = %id, "Entity failed: {e}");
                }
                Err(_) => {
                    run.errors += 1;
                    error!(job = run.job.name(), entity = %id, "Entity panicked");
                }
            }
        }
    }

    async fn pause(&self, d: Duration) {
        if !d.is_zero() {
            tokio::time::sleep(d).await;
        }
    }
}
