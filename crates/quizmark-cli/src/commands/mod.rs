//! Subcommand implementations.

pub mod batch;
pub mod extract;
pub mod grade;
pub mod init;
pub mod list_models;
pub mod validate;

use std::path::Path;

use anyhow::Result;
use comfy_table::{Cell, Table};

use quizmark_core::extractor::AnswerExtractor;
use quizmark_core::traits::DocumentTextSource;
use quizmark_core::QuizScoreReport;
use quizmark_providers::{create_provider, PlainTextSource, QuizmarkConfig};

use crate::ProviderArgs;

/// Build an extractor for the provider and model chosen on the command line.
pub(crate) fn build_extractor(
    config: &QuizmarkConfig,
    args: &ProviderArgs,
) -> Result<AnswerExtractor> {
    let (name, provider_config) = config.provider(args.provider.as_deref())?;
    let extractor_config = config.extractor_config(args.model.as_deref());
    tracing::debug!(provider = name, model = %extractor_config.model, "using provider");
    Ok(AnswerExtractor::new(
        create_provider(provider_config),
        extractor_config,
    ))
}

pub(crate) async fn read_submission(path: &Path) -> Result<String> {
    PlainTextSource.extract_text(path).await
}

pub(crate) fn join_answers(answers: &[String]) -> String {
    if answers.is_empty() {
        "-".to_string()
    } else {
        answers.join(", ")
    }
}

pub(crate) fn score_table(report: &QuizScoreReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Q", "Status", "Marks", "Answer", "Expected"]);

    for r in &report.question_results {
        table.add_row(vec![
            Cell::new(r.question_no),
            Cell::new(r.status),
            Cell::new(format!("{}/{}", r.awarded_marks, r.total_marks)),
            Cell::new(join_answers(&r.student_answer)),
            Cell::new(join_answers(&r.correct_answer)),
        ]);
    }

    table
}
