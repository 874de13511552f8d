//! Batch grading engine.
//!
//! Grades many submissions against one answer key with bounded parallelism.
//! Retry policy for the extraction call lives here, not in the extractor:
//! only transient provider errors are retried, with exponential backoff.

use std::borrow::Cow;
use std::future::Future;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::error::ExtractionError;
use crate::extractor::AnswerExtractor;
use crate::model::{AnswerKey, StudentAnswerEntry};
use crate::report::{AnswerKeySummary, BatchReport, SubmissionFailure, SubmissionOutcome};
use crate::scorer::{check_answer_key, evaluate};
use crate::statistics::compute_batch_stats;
use crate::traits::DocumentTextSource;

const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Configuration for the grading engine.
#[derive(Debug, Clone)]
pub struct GradingEngineConfig {
    /// Maximum submissions graded concurrently.
    pub parallelism: usize,
    /// Retries on transient provider errors (not on unparseable replies).
    pub max_retries_per_submission: u32,
    /// Delay before the first retry; doubled on each further retry.
    pub retry_delay: Duration,
}

impl Default for GradingEngineConfig {
    fn default() -> Self {
        Self {
            parallelism: 4,
            max_retries_per_submission: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// One submission's raw text, ready for extraction.
#[derive(Debug, Clone)]
pub struct Submission {
    pub id: String,
    pub text: String,
}

/// A submission still on disk; its text is read when its turn comes.
#[derive(Debug, Clone)]
pub struct DocumentSubmission {
    pub id: String,
    pub path: PathBuf,
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_submission_start(&self, submission_id: &str);
    fn on_submission_complete(&self, outcome: &SubmissionOutcome);
    fn on_submission_error(&self, submission_id: &str, error: &str);
    fn on_batch_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_submission_start(&self, _: &str) {}
    fn on_submission_complete(&self, _: &SubmissionOutcome) {}
    fn on_submission_error(&self, _: &str, _: &str) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// The batch grading engine.
pub struct GradingEngine {
    extractor: AnswerExtractor,
    config: GradingEngineConfig,
}

impl GradingEngine {
    pub fn new(extractor: AnswerExtractor, config: GradingEngineConfig) -> Self {
        Self { extractor, config }
    }

    /// Extract answers, retrying transient provider failures.
    ///
    /// Returns the entries and the number of attempts made.
    pub async fn extract_with_retry(
        &self,
        text: &str,
    ) -> Result<(Vec<StudentAnswerEntry>, u32), ExtractionError> {
        let mut retry_delay = self.config.retry_delay;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let e = match self.extractor.extract(text).await {
                Ok(entries) => return Ok((entries, attempt)),
                Err(e) => e,
            };

            let Some(provider_error) = e.provider_error() else {
                return Err(e);
            };
            if provider_error.is_permanent() || attempt > self.config.max_retries_per_submission {
                return Err(e);
            }
            if let Some(ms) = provider_error.retry_after_ms() {
                retry_delay = Duration::from_millis(ms);
            }
            tracing::warn!("extraction attempt {attempt} failed: {e}");

            tokio::time::sleep(retry_delay).await;
            retry_delay = (retry_delay * 2).min(MAX_RETRY_DELAY);
        }
    }

    /// Grade every submission against `key`.
    ///
    /// A malformed key aborts the whole batch; a failed submission is
    /// recorded in the report and does not affect the others.
    pub async fn run(
        &self,
        key: &AnswerKey,
        submissions: &[Submission],
        progress: &dyn ProgressReporter,
    ) -> Result<BatchReport> {
        let jobs = submissions.iter().map(|s| {
            let text: Result<Cow<'_, str>> = Ok(Cow::Borrowed(s.text.as_str()));
            (s.id.as_str(), std::future::ready(text))
        });
        self.grade_all(key, jobs, progress).await
    }

    /// Grade submissions read through `source`.
    ///
    /// Each document is read once its slot in the batch opens; a document
    /// that cannot be read is recorded as a failure like any other.
    pub async fn run_documents(
        &self,
        key: &AnswerKey,
        submissions: &[DocumentSubmission],
        source: &dyn DocumentTextSource,
        progress: &dyn ProgressReporter,
    ) -> Result<BatchReport> {
        let jobs = submissions.iter().map(|s| {
            let text = async move { source.extract_text(&s.path).await.map(Cow::Owned) };
            (s.id.as_str(), text)
        });
        self.grade_all(key, jobs, progress).await
    }

    async fn grade_all<'a, F>(
        &self,
        key: &AnswerKey,
        jobs: impl Iterator<Item = (&'a str, F)>,
        progress: &dyn ProgressReporter,
    ) -> Result<BatchReport>
    where
        F: Future<Output = Result<Cow<'a, str>>>,
    {
        check_answer_key(&key.questions)?;

        let start = Instant::now();
        let run_id = Uuid::new_v4();
        let semaphore = Semaphore::new(self.config.parallelism.max(1));

        let mut futures = FuturesUnordered::new();
        for (id, text) in jobs {
            let semaphore = &semaphore;
            futures.push(async move {
                let inner = async {
                    let _permit = semaphore
                        .acquire()
                        .await
                        .map_err(|_| anyhow::anyhow!("semaphore closed"))?;
                    progress.on_submission_start(id);

                    let sub_start = Instant::now();
                    let text = text.await?;
                    let (entries, attempts) = self.extract_with_retry(&text).await?;
                    let report = evaluate(&entries, &key.questions)?;

                    Ok::<_, anyhow::Error>(SubmissionOutcome {
                        submission_id: id.to_string(),
                        report,
                        attempts,
                        duration_ms: sub_start.elapsed().as_millis() as u64,
                    })
                };
                (id.to_string(), inner.await)
            });
        }

        let mut results = Vec::new();
        let mut failures = Vec::new();
        let total = futures.len();

        while let Some((submission_id, result)) = futures.next().await {
            match result {
                Ok(outcome) => {
                    progress.on_submission_complete(&outcome);
                    results.push(outcome);
                }
                Err(e) => {
                    let error = format!("{e:#}");
                    tracing::error!("grading failed for {submission_id}: {error}");
                    progress.on_submission_error(&submission_id, &error);
                    let raw_output = e
                        .downcast_ref::<ExtractionError>()
                        .and_then(|x| x.raw_output())
                        .map(str::to_string);
                    failures.push(SubmissionFailure {
                        submission_id,
                        error,
                        raw_output,
                    });
                }
            }
        }

        results.sort_by(|a, b| a.submission_id.cmp(&b.submission_id));
        failures.sort_by(|a, b| a.submission_id.cmp(&b.submission_id));

        let elapsed = start.elapsed();
        progress.on_batch_complete(total, results.len(), failures.len(), elapsed);

        let reports: Vec<_> = results.iter().map(|r| &r.report).collect();
        let stats = compute_batch_stats(key, &reports);

        Ok(BatchReport {
            id: run_id,
            created_at: chrono::Utc::now(),
            answer_key: AnswerKeySummary::from(key),
            results,
            failures,
            stats,
            duration_ms: elapsed.as_millis() as u64,
        })
    }
}
