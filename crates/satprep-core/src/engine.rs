//! Grading pipeline orchestrator.
//!
//! Fetches the test for an attempt, validates both, scores the attempt, and
//! persists the report. Batches run with bounded parallelism and retry
//! transient store failures.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::{Mutex, OnceCell, Semaphore};

use crate::error::{GradingError, StoreError};
use crate::model::{Test, TestAttempt};
use crate::report::ScoreReport;
use crate::scoring::score_attempt;
use crate::traits::Store;
use crate::validation::{validate_test, validate_test_attempt};

const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

type TestCache = Mutex<HashMap<String, Arc<OnceCell<Arc<Test>>>>>;

/// Configuration for the grading engine.
#[derive(Debug, Clone)]
pub struct GradingConfig {
    /// Maximum attempts graded concurrently in a batch.
    pub parallelism: usize,
    /// Retries on transient store errors.
    pub max_retries: u32,
    /// Initial delay between retries; doubles on each retry.
    pub retry_delay: Duration,
    /// Whether reports are written back to the store.
    pub persist: bool,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            parallelism: 4,
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
            persist: true,
        }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_grade_start(&self, attempt_id: &str);
    fn on_grade_complete(&self, report: &ScoreReport);
    fn on_grade_error(&self, attempt_id: &str, error: &GradingError);
    fn on_batch_complete(&self, total: usize, graded: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_grade_start(&self, _: &str) {}
    fn on_grade_complete(&self, _: &ScoreReport) {}
    fn on_grade_error(&self, _: &str, _: &GradingError) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// Outcome of grading a batch of attempts.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Reports for successfully graded attempts.
    pub reports: Vec<ScoreReport>,
    /// Attempts that could not be graded.
    pub failures: Vec<BatchFailure>,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// A single failed attempt within a batch.
#[derive(Debug)]
pub struct BatchFailure {
    pub attempt_id: String,
    pub error: GradingError,
}

/// The grading engine.
pub struct GradingEngine {
    store: Arc<dyn Store>,
    config: GradingConfig,
}

impl GradingEngine {
    pub fn new(store: Arc<dyn Store>, config: GradingConfig) -> Self {
        Self { store, config }
    }

    /// The store this engine reads from and writes to.
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Grade a single attempt end to end.
    pub async fn grade(&self, attempt: &TestAttempt) -> Result<ScoreReport, GradingError> {
        let test = self.fetch_test(&attempt.test_id).await?;
        self.grade_with(&test, attempt).await
    }

    /// Grade an attempt against an already loaded test.
    pub async fn grade_with(
        &self,
        test: &Test,
        attempt: &TestAttempt,
    ) -> Result<ScoreReport, GradingError> {
        let test_check = validate_test(test);
        if !test_check.valid {
            return Err(GradingError::Validation(test_check));
        }
        let attempt_check = validate_test_attempt(test, attempt);
        if !attempt_check.valid {
            return Err(GradingError::Validation(attempt_check));
        }

        let result = score_attempt(test, attempt)?;
        let report = ScoreReport::new(test, attempt, result);

        if self.config.persist {
            self.with_retry("put_report", || self.store.put_report(&report))
                .await?;
        }

        tracing::info!(
            attempt = %attempt.id,
            test = %test.id,
            scaled = report.result.overall.scaled,
            "graded attempt"
        );
        Ok(report)
    }

    /// Grade many attempts with bounded parallelism.
    ///
    /// Each test is fetched at most once per batch, even when several attempts
    /// for it are in flight; a failed fetch is retried by the next attempt.
    pub async fn grade_batch(
        &self,
        attempts: &[TestAttempt],
        progress: &dyn ProgressReporter,
    ) -> BatchOutcome {
        let start = Instant::now();
        let semaphore = Semaphore::new(self.config.parallelism.max(1));
        let cache: TestCache = Mutex::new(HashMap::new());

        let mut futures = FuturesUnordered::new();
        for attempt in attempts {
            let semaphore = &semaphore;
            let cache = &cache;
            futures.push(async move {
                let _permit = semaphore.acquire().await.ok();
                progress.on_grade_start(&attempt.id);
                let result = match self.cached_test(cache, &attempt.test_id).await {
                    Ok(test) => self.grade_with(&test, attempt).await,
                    Err(e) => Err(e),
                };
                (attempt.id.clone(), result)
            });
        }

        let mut reports = Vec::new();
        let mut failures = Vec::new();
        let total = futures.len();

        while let Some((attempt_id, result)) = futures.next().await {
            match result {
                Ok(report) => {
                    progress.on_grade_complete(&report);
                    reports.push(report);
                }
                Err(error) => {
                    tracing::error!("grading failed for {attempt_id}: {error}");
                    progress.on_grade_error(&attempt_id, &error);
                    failures.push(BatchFailure { attempt_id, error });
                }
            }
        }

        let elapsed = start.elapsed();
        progress.on_batch_complete(total, reports.len(), failures.len(), elapsed);

        reports.sort_by(|a, b| a.result.attempt_id.cmp(&b.result.attempt_id));
        failures.sort_by(|a, b| a.attempt_id.cmp(&b.attempt_id));

        BatchOutcome {
            reports,
            failures,
            duration_ms: elapsed.as_millis() as u64,
        }
    }

    async fn cached_test(
        &self,
        cache: &TestCache,
        test_id: &str,
    ) -> Result<Arc<Test>, GradingError> {
        let cell = Arc::clone(cache.lock().await.entry(test_id.to_string()).or_default());
        let test = cell
            .get_or_try_init(|| async { self.fetch_test(test_id).await.map(Arc::new) })
            .await?;
        Ok(Arc::clone(test))
    }

    async fn fetch_test(&self, test_id: &str) -> Result<Test, GradingError> {
        self.with_retry("get_test", || self.store.get_test(test_id))
            .await?
            .ok_or_else(|| GradingError::TestNotFound(test_id.to_string()))
    }

    /// Run a store operation, retrying transient failures with exponential
    /// backoff.
    async fn with_retry<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut delay = self.config.retry_delay;
        let mut retries = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_permanent() || retries >= self.config.max_retries => {
                    return Err(e);
                }
                Err(e) => {
                    retries += 1;
                    tracing::warn!(
                        store = self.store.name(),
                        "{operation} failed ({e}), retry {retries}/{} in {delay:?}",
                        self.config.max_retries
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(MAX_RETRY_DELAY);
                }
            }
        }
    }
}
