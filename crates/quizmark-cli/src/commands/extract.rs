//! The `quizmark extract` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use quizmark_providers::load_config_from;

use super::{build_extractor, read_submission};
use crate::ProviderArgs;

pub async fn execute(
    submission_path: PathBuf,
    output: Option<PathBuf>,
    provider: ProviderArgs,
) -> Result<()> {
    let config = load_config_from(provider.config.as_deref())?;
    let extractor = build_extractor(&config, &provider)?;

    let text = read_submission(&submission_path).await?;
    let answers = extractor.extract(&text).await.with_context(|| {
        format!(
            "failed to extract answers from {}",
            submission_path.display()
        )
    })?;

    let json = serde_json::to_string_pretty(&answers)?;
    match output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("failed to write answers: {}", path.display()))?;
            eprintln!(
                "Extracted {} answers to: {}",
                answers.len(),
                path.display()
            );
        }
        None => println!("{json}"),
    }

    Ok(())
}
