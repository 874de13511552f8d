//! Score and batch report persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{AnswerKey, QuizScoreReport};
use crate::statistics::BatchStats;

fn write_json<T: Serialize>(value: &T, path: &Path, what: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("failed to serialize {what}"))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)
        .with_context(|| format!("failed to write {what} to {}", path.display()))?;
    Ok(())
}

impl QuizScoreReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        write_json(self, path, "score report")
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read score report from {}", path.display()))?;
        serde_json::from_str(&content).context("failed to parse score report JSON")
    }
}

/// Summary of the answer key a batch was graded against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerKeySummary {
    pub id: String,
    pub title: String,
    pub question_count: usize,
    pub total_marks: f64,
}

impl From<&AnswerKey> for AnswerKeySummary {
    fn from(key: &AnswerKey) -> Self {
        Self {
            id: key.id.clone(),
            title: key.title.clone(),
            question_count: key.questions.len(),
            total_marks: key.total_marks(),
        }
    }
}

/// A successfully graded submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    /// Submission identifier (usually the file stem).
    pub submission_id: String,
    pub report: QuizScoreReport,
    /// Extraction attempts it took, including the successful one.
    pub attempts: u32,
    /// Wall-clock time spent on this submission.
    pub duration_ms: u64,
}

/// A submission that could not be graded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionFailure {
    pub submission_id: String,
    pub error: String,
    /// Raw collaborator output, when the failure was a parse failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
}

/// The result of grading a batch of submissions against one key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    pub answer_key: AnswerKeySummary,
    /// Graded submissions, sorted by submission id.
    pub results: Vec<SubmissionOutcome>,
    /// Submissions that failed extraction or scoring.
    #[serde(default)]
    pub failures: Vec<SubmissionFailure>,
    pub stats: BatchStats,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl BatchReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        write_json(self, path, "batch report")
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read batch report from {}", path.display()))?;
        let report: BatchReport =
            serde_json::from_str(&content).context("failed to parse batch report JSON")?;
        Ok(report)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        let title = if self.answer_key.title.is_empty() {
            &self.answer_key.id
        } else {
            &self.answer_key.title
        };
        md.push_str(&format!("## {title}\n\n"));
        md.push_str(&format!(
            "**Summary:** {} graded, {} failed, mean {:.1}%, median {:.1}%\n\n",
            self.results.len(),
            self.failures.len(),
            self.stats.mean_percentage,
            self.stats.median_percentage
        ));

        if !self.results.is_empty() {
            md.push_str("### Submissions\n\n");
            md.push_str("| Submission | Score | Total | Percent |\n");
            md.push_str("|------------|-------|-------|---------|\n");
            for r in &self.results {
                md.push_str(&format!(
                    "| {} | {} | {} | {:.1}% |\n",
                    r.submission_id,
                    r.report.scored_marks,
                    r.report.total_marks,
                    r.report.percentage()
                ));
            }
            md.push('\n');
        }

        if !self.stats.per_question.is_empty() {
            md.push_str("### Questions\n\n");
            md.push_str("| Question | Correct | Partial | Incorrect | Avg marks |\n");
            md.push_str("|----------|---------|---------|-----------|-----------|\n");
            for q in &self.stats.per_question {
                md.push_str(&format!(
                    "| {} | {} | {} | {} | {:.2} |\n",
                    q.question_no, q.correct, q.partially_correct, q.incorrect, q.avg_awarded_marks
                ));
            }
            md.push('\n');
        }

        if !self.failures.is_empty() {
            md.push_str("### Failures\n\n");
            for f in &self.failures {
                // Only the first line; parse errors embed the raw output.
                let first_line = f.error.lines().next().unwrap_or_default();
                md.push_str(&format!("- `{}`: {}\n", f.submission_id, first_line));
            }
        }

        md
    }
}
