//! The `quizmark batch` command.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use comfy_table::{Cell, Table};

use quizmark_core::engine::{DocumentSubmission, GradingEngine, ProgressReporter};
use quizmark_core::parser::{load_submission_directory, parse_answer_key, validate_answer_key};
use quizmark_core::report::{BatchReport, SubmissionOutcome};
use quizmark_providers::{load_config_from, PlainTextSource};

use super::build_extractor;
use crate::ProviderArgs;

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_submission_start(&self, submission_id: &str) {
        eprintln!("  Grading: {submission_id}");
    }

    fn on_submission_complete(&self, outcome: &SubmissionOutcome) {
        let retries = if outcome.attempts > 1 {
            format!(" after {} attempts", outcome.attempts)
        } else {
            String::new()
        };
        eprintln!(
            "  Done: {} {}/{}{} ({}ms)",
            outcome.submission_id,
            outcome.report.scored_marks,
            outcome.report.total_marks,
            retries,
            outcome.duration_ms,
        );
    }

    fn on_submission_error(&self, submission_id: &str, error: &str) {
        let first_line = error.lines().next().unwrap_or_default();
        eprintln!("  ERROR: {submission_id}: {first_line}");
    }

    fn on_batch_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {completed}/{total} graded, {failed} failed ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(
    key_path: PathBuf,
    submissions_dir: PathBuf,
    parallelism: Option<usize>,
    output: Option<PathBuf>,
    format: String,
    provider: ProviderArgs,
) -> Result<()> {
    anyhow::ensure!(
        parallelism != Some(0),
        "parallelism must be at least 1"
    );

    let formats: Vec<&str> = if format == "all" {
        vec!["json", "markdown"]
    } else {
        format.split(',').map(str::trim).collect()
    };
    if let Some(bad) = formats.iter().find(|f| !matches!(**f, "json" | "markdown")) {
        anyhow::bail!("unknown format '{bad}': expected json, markdown or all");
    }

    let config = load_config_from(provider.config.as_deref())?;
    let key = parse_answer_key(&key_path)?;
    for w in validate_answer_key(&key) {
        match w.question_no {
            Some(q) => tracing::warn!("answer key question {q}: {}", w.message),
            None => tracing::warn!("answer key: {}", w.message),
        }
    }

    let paths = load_submission_directory(&submissions_dir)?;
    anyhow::ensure!(
        !paths.is_empty(),
        "no .txt or .md submissions found in {}",
        submissions_dir.display()
    );

    let submissions: Vec<DocumentSubmission> = paths
        .into_iter()
        .map(|path| DocumentSubmission {
            id: path
                .strip_prefix(&submissions_dir)
                .unwrap_or(&path)
                .to_string_lossy()
                .into_owned(),
            path,
        })
        .collect();

    let extractor = build_extractor(&config, &provider)?;
    eprintln!(
        "quizmark v{}: grading {} submissions against '{}' with {}/{}",
        env!("CARGO_PKG_VERSION"),
        submissions.len(),
        key.id,
        extractor.provider_name(),
        extractor.model(),
    );
    eprintln!();

    let engine = GradingEngine::new(extractor, config.engine_config(parallelism));
    let report = engine
        .run_documents(&key, &submissions, &PlainTextSource, &ConsoleReporter)
        .await?;

    print_summary(&report);

    let output = output.unwrap_or_else(|| config.output_dir.clone());
    std::fs::create_dir_all(&output)?;
    let timestamp = report.created_at.format("%Y-%m-%dT%H%M%S");

    for fmt in &formats {
        match *fmt {
            "json" => {
                let path = output.join(format!("batch-{timestamp}.json"));
                report.save_json(&path)?;
                eprintln!("Results saved to: {}", path.display());
            }
            "markdown" => {
                let path = output.join(format!("batch-{timestamp}.md"));
                std::fs::write(&path, report.to_markdown())?;
                eprintln!("Markdown report: {}", path.display());
            }
            _ => {}
        }
    }

    Ok(())
}

fn print_summary(report: &BatchReport) {
    let mut table = Table::new();
    table.set_header(vec!["Submission", "Score", "Percent", "Attempts"]);

    for r in &report.results {
        table.add_row(vec![
            Cell::new(&r.submission_id),
            Cell::new(format!("{}/{}", r.report.scored_marks, r.report.total_marks)),
            Cell::new(format!("{:.1}%", r.report.percentage())),
            Cell::new(r.attempts),
        ]);
    }
    for f in &report.failures {
        table.add_row(vec![
            Cell::new(&f.submission_id),
            Cell::new("failed"),
            Cell::new("-"),
            Cell::new("-"),
        ]);
    }

    println!("{table}");
    if !report.results.is_empty() {
        println!(
            "Mean {:.1}% | median {:.1}% | range {:.1}%..{:.1}%",
            report.stats.mean_percentage,
            report.stats.median_percentage,
            report.stats.min_percentage,
            report.stats.max_percentage,
        );
    }
}
