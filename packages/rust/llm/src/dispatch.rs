//! Batched, rate-limited prompt dispatch.
//!
//! Jobs are partitioned into fixed-size chunks in submission order; each
//! chunk runs to completion before the next is formed, bounding the number
//! of jobs in flight to the chunk size. Within a chunk every job acquires a
//! permit from a shared counting semaphore before its network call, bounding
//! true concurrent outbound requests to the configured rate limit.
//!
//! Results are returned in exact submission order regardless of completion
//! order: jobs are spawned per chunk and their handles awaited in the order
//! they were submitted. A job failure becomes an error marker at the job's
//! position and never aborts its siblings. If the surrounding future is
//! dropped, in-flight requests fail naturally on connection abort; no retry
//! state survives a cancelled run.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use readmegen_shared::{AppConfig, RepositoryContext};

use crate::handler::PromptBackend;
use crate::prompts::{PromptJob, PromptKind, build_additional_jobs, build_summary_jobs};

/// Number of jobs per chunk. Chunk size bounds in-flight jobs independently
/// of how many may execute concurrently.
pub const DEFAULT_BATCH_SIZE: usize = 10;

// ---------------------------------------------------------------------------
// BatchResult
// ---------------------------------------------------------------------------

/// What a single prompt job produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Generated text from the backend.
    Text(String),
    /// The job failed; the payload is the failure description.
    Failed(String),
}

impl JobOutcome {
    /// The generated text, if the job succeeded.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Failed(_) => None,
        }
    }

    /// Whether the job failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// One positional result from a dispatch call. `index` matches the job's
/// submission position so later prompt builders can index into prior
/// results deterministically.
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// Submission position across the whole run.
    pub index: usize,
    /// Which README section the job fed.
    pub kind: PromptKind,
    /// Generated text or an error marker.
    pub outcome: JobOutcome,
}

// ---------------------------------------------------------------------------
// BatchDispatcher
// ---------------------------------------------------------------------------

/// Drives a [`PromptBackend`] over batches of prompt jobs.
///
/// The rate-limit semaphore is owned here and handed to every spawned job;
/// it is the only mutable state shared across jobs.
pub struct BatchDispatcher {
    limiter: Arc<Semaphore>,
    batch_size: usize,
}

impl BatchDispatcher {
    /// Create a dispatcher bounding concurrent outbound requests to
    /// `rate_limit` (clamped to at least 1).
    pub fn new(rate_limit: usize) -> Self {
        Self {
            limiter: Arc::new(Semaphore::new(rate_limit.max(1))),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Override the chunk size (mainly for tests).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Run the full two-phase prompt sequence for a repository.
    ///
    /// Phase 1 dispatches the file-summary jobs. Phase 2 builds the
    /// core-features and overview jobs from the completed summaries (they
    /// are not submitted until every summary job has resolved) and
    /// dispatches them. The combined results preserve submission order.
    #[instrument(skip_all, fields(repo = %context.name))]
    pub async fn batch_request(
        &self,
        backend: Arc<dyn PromptBackend>,
        config: &AppConfig,
        context: &RepositoryContext,
    ) -> Vec<BatchResult> {
        let summary_jobs = build_summary_jobs(config, context);
        info!(jobs = summary_jobs.len(), "dispatching file-summary jobs");
        let mut results = self
            .dispatch_batches(backend.clone(), summary_jobs, 0)
            .await;

        let additional_jobs = build_additional_jobs(config, context, &results);
        info!(jobs = additional_jobs.len(), "dispatching synthesis jobs");
        let additional = self
            .dispatch_batches(backend, additional_jobs, results.len())
            .await;
        results.extend(additional);

        let failed = results.iter().filter(|r| r.outcome.is_failed()).count();
        if failed > 0 {
            warn!(failed, total = results.len(), "some prompt jobs failed");
        }

        results
    }

    /// Dispatch `jobs` in fixed-size chunks, numbering results from
    /// `start_index`. Always returns exactly `jobs.len()` results in
    /// submission order.
    pub async fn dispatch_batches(
        &self,
        backend: Arc<dyn PromptBackend>,
        jobs: Vec<PromptJob>,
        start_index: usize,
    ) -> Vec<BatchResult> {
        let mut queue: Vec<(usize, PromptJob)> = jobs
            .into_iter()
            .enumerate()
            .map(|(i, job)| (start_index + i, job))
            .collect();

        let mut results = Vec::with_capacity(queue.len());

        while !queue.is_empty() {
            let chunk: Vec<(usize, PromptJob)> = {
                let take = queue.len().min(self.batch_size);
                queue.drain(..take).collect()
            };

            let mut handles = Vec::with_capacity(chunk.len());
            for (index, job) in chunk {
                let kind = job.kind;
                let backend = backend.clone();
                let limiter = self.limiter.clone();

                handles.push((
                    index,
                    kind,
                    tokio::spawn(async move {
                        let _permit =
                            limiter.acquire_owned().await.expect("semaphore closed");
                        backend
                            .complete(index, &job.prompt, job.max_tokens, job.temperature)
                            .await
                    }),
                ));
            }

            // Await in submission order so the result sequence stays
            // positionally aligned even when later jobs complete first.
            for (index, kind, handle) in handles {
                let outcome = match handle.await {
                    Ok(Ok(text)) => {
                        debug!(index, kind = kind.as_str(), "job completed");
                        JobOutcome::Text(text)
                    }
                    Ok(Err(e)) => {
                        warn!(index, kind = kind.as_str(), error = %e, "job failed");
                        JobOutcome::Failed(e.to_string())
                    }
                    Err(e) => {
                        warn!(index, kind = kind.as_str(), error = %e, "job task aborted");
                        JobOutcome::Failed(e.to_string())
                    }
                };
                results.push(BatchResult {
                    index,
                    kind,
                    outcome,
                });
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::PromptBackend;
    use async_trait::async_trait;
    use readmegen_shared::{
        FileContext, ReadmeGenError, RepositoryContext, RepositoryMetadata, Result,
    };
    use std::collections::{BTreeMap, HashSet};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    /// Instrumented backend: configurable latency and failures, records the
    /// concurrency high-water mark and every prompt it sees.
    struct FakeBackend {
        base_delay: Duration,
        /// Per-index extra delay; with `reverse_delays` earlier jobs sleep
        /// longer, inverting completion order within a wave.
        delay_step: Duration,
        reverse_delays: bool,
        fail_indices: HashSet<usize>,
        in_flight: AtomicUsize,
        high_water: AtomicUsize,
        seen_prompts: Mutex<Vec<(usize, String)>>,
    }

    impl FakeBackend {
        fn new(base_delay: Duration) -> Self {
            Self {
                base_delay,
                delay_step: Duration::ZERO,
                reverse_delays: false,
                fail_indices: HashSet::new(),
                in_flight: AtomicUsize::new(0),
                high_water: AtomicUsize::new(0),
                seen_prompts: Mutex::new(Vec::new()),
            }
        }

        fn with_varied_delays(mut self, step: Duration, reverse: bool) -> Self {
            self.delay_step = step;
            self.reverse_delays = reverse;
            self
        }

        fn failing_at(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
            self.fail_indices = indices.into_iter().collect();
            self
        }

        fn delay_for(&self, index: usize) -> Duration {
            let factor = if self.reverse_delays {
                // Earlier jobs are slower: completion order inverts
                // submission order within a wave.
                10usize.saturating_sub(index)
            } else {
                index
            };
            self.base_delay + self.delay_step * factor as u32
        }

        fn high_water_mark(&self) -> usize {
            self.high_water.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PromptBackend for FakeBackend {
        async fn complete(
            &self,
            index: usize,
            prompt: &str,
            _tokens: usize,
            _temperature: f32,
        ) -> Result<String> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.high_water.fetch_max(now, Ordering::SeqCst);
            self.seen_prompts
                .lock()
                .expect("lock")
                .push((index, prompt.to_string()));

            tokio::time::sleep(self.delay_for(index)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.fail_indices.contains(&index) {
                Err(ReadmeGenError::request(index, "simulated backend outage"))
            } else {
                Ok(format!("response-{index}"))
            }
        }
    }

    fn jobs(n: usize) -> Vec<PromptJob> {
        (0..n)
            .map(|i| PromptJob {
                kind: PromptKind::FileSummary,
                prompt: format!("prompt-{i}"),
                max_tokens: 512,
                temperature: 0.1,
            })
            .collect()
    }

    fn small_context() -> RepositoryContext {
        RepositoryContext {
            name: "demo".into(),
            files: vec![FileContext {
                path: "a.py".into(),
                name: "a.py".into(),
                content: "print('a')".into(),
            }],
            dependencies: vec!["flask".into()],
            docs_paths: vec!["README.md".into()],
            language_counts: BTreeMap::from([("python".into(), 1)]),
            metadata: RepositoryMetadata::default(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrency_never_exceeds_the_rate_limit() {
        let backend = Arc::new(FakeBackend::new(Duration::from_millis(25)));
        let dispatcher = BatchDispatcher::new(2).with_batch_size(10);

        let results = dispatcher
            .dispatch_batches(backend.clone(), jobs(6), 0)
            .await;

        assert_eq!(results.len(), 6);
        assert!(backend.high_water_mark() <= 2);
        assert_eq!(backend.high_water_mark(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn results_keep_submission_order_under_varied_latency() {
        // Earlier jobs are slower, so completion order is reversed
        let backend = Arc::new(
            FakeBackend::new(Duration::from_millis(5))
                .with_varied_delays(Duration::from_millis(20), true),
        );
        let dispatcher = BatchDispatcher::new(8).with_batch_size(10);

        let results = dispatcher.dispatch_batches(backend, jobs(8), 0).await;

        let indices: Vec<usize> = results.iter().map(|r| r.index).collect();
        assert_eq!(indices, (0..8).collect::<Vec<_>>());
        for result in &results {
            assert_eq!(
                result.outcome.text(),
                Some(format!("response-{}", result.index).as_str())
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failed_job_yields_marker_at_its_index_without_aborting_siblings() {
        let backend =
            Arc::new(FakeBackend::new(Duration::from_millis(10)).failing_at([2]));
        let dispatcher = BatchDispatcher::new(4);

        let results = dispatcher.dispatch_batches(backend, jobs(5), 0).await;

        assert_eq!(results.len(), 5);
        assert!(results[2].outcome.is_failed());
        for (i, result) in results.iter().enumerate() {
            if i != 2 {
                assert_eq!(
                    result.outcome.text(),
                    Some(format!("response-{i}").as_str())
                );
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn wall_clock_tracks_rate_limited_waves() {
        // 5 jobs at rate limit 2 → 3 waves: ceil(5/2) × delay, not 5 × delay
        let delay = Duration::from_millis(100);
        let backend = Arc::new(FakeBackend::new(delay));
        let dispatcher = BatchDispatcher::new(2).with_batch_size(10);

        let start = Instant::now();
        let results = dispatcher.dispatch_batches(backend, jobs(5), 0).await;
        let elapsed = start.elapsed();

        assert_eq!(results.len(), 5);
        assert!(elapsed >= delay * 3, "finished too fast: {elapsed:?}");
        assert!(elapsed < delay * 4, "rate limit not used: {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn chunks_bound_in_flight_jobs_independently_of_the_rate_limit() {
        // Rate limit far above chunk size: concurrency is still capped by
        // the chunk because each chunk runs to completion first.
        let backend = Arc::new(FakeBackend::new(Duration::from_millis(10)));
        let dispatcher = BatchDispatcher::new(64).with_batch_size(3);

        let results = dispatcher
            .dispatch_batches(backend.clone(), jobs(9), 0)
            .await;

        assert_eq!(results.len(), 9);
        assert!(backend.high_water_mark() <= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn batch_request_runs_two_phases_in_order() {
        let backend = Arc::new(FakeBackend::new(Duration::from_millis(5)));
        let dispatcher = BatchDispatcher::new(4);
        let config = readmegen_shared::AppConfig::default();
        let context = small_context();

        let results = dispatcher
            .batch_request(backend.clone(), &config, &context)
            .await;

        // One summary group for the tiny context, then the two synthesis jobs
        let kinds: Vec<PromptKind> = results.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                PromptKind::FileSummary,
                PromptKind::CoreFeatures,
                PromptKind::Overview
            ]
        );
        let indices: Vec<usize> = results.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);

        // Phase 2 prompts must embed the completed phase 1 output
        let seen = backend.seen_prompts.lock().expect("lock");
        let core_features_prompt = &seen
            .iter()
            .find(|(i, _)| *i == 1)
            .expect("core features prompt")
            .1;
        assert!(core_features_prompt.contains("response-0"));
    }
}
