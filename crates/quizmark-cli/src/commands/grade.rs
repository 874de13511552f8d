//! The `quizmark grade` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use quizmark_core::parser::{load_student_answers, parse_answer_key};
use quizmark_core::scorer::evaluate;
use quizmark_core::GradeStatus;
use quizmark_providers::load_config_from;

use super::{build_extractor, read_submission, score_table};
use crate::ProviderArgs;

pub async fn execute(
    key_path: PathBuf,
    answers_path: Option<PathBuf>,
    submission_path: Option<PathBuf>,
    output: Option<PathBuf>,
    provider: ProviderArgs,
) -> Result<()> {
    let key = parse_answer_key(&key_path)?;

    let answers = match (answers_path, submission_path) {
        (Some(path), _) => load_student_answers(&path)?,
        (None, Some(path)) => {
            let config = load_config_from(provider.config.as_deref())?;
            let extractor = build_extractor(&config, &provider)?;
            let text = read_submission(&path).await?;
            extractor
                .extract(&text)
                .await
                .with_context(|| format!("failed to extract answers from {}", path.display()))?
        }
        (None, None) => anyhow::bail!("either --answers or --submission is required"),
    };

    let report = evaluate(&answers, &key.questions)?;

    println!("{}", score_table(&report));
    println!(
        "Score: {}/{} ({:.1}%) | {} correct, {} partial, {} incorrect",
        report.scored_marks,
        report.total_marks,
        report.percentage(),
        report.count_status(GradeStatus::Correct),
        report.count_status(GradeStatus::PartiallyCorrect),
        report.count_status(GradeStatus::Incorrect),
    );
    if !report.unmatched_question_nos.is_empty() {
        eprintln!(
            "Warning: answers for questions not in the key were ignored: {:?}",
            report.unmatched_question_nos
        );
    }

    if let Some(path) = output {
        report.save_json(&path)?;
        eprintln!("Report saved to: {}", path.display());
    }

    Ok(())
}
