//! The `quizmark validate` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use quizmark_core::parser::{parse_answer_key, validate_answer_key};

pub fn execute(key_path: PathBuf) -> Result<()> {
    let paths = if key_path.is_dir() {
        key_files(&key_path)?
    } else {
        vec![key_path]
    };

    let mut total_warnings = 0;

    for path in &paths {
        let key = parse_answer_key(path)?;
        let title = if key.title.is_empty() {
            &key.id
        } else {
            &key.title
        };
        println!(
            "Answer key: {title} ({} questions, {} marks)",
            key.questions.len(),
            key.total_marks()
        );

        let warnings = validate_answer_key(&key);
        for w in &warnings {
            let prefix = w
                .question_no
                .map(|q| format!("  [Q{q}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All answer keys valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}

fn key_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();
        if path
            .extension()
            .is_some_and(|ext| ext == "json" || ext == "toml")
        {
            files.push(path);
        }
    }
    files.sort();
    anyhow::ensure!(
        !files.is_empty(),
        "no .json or .toml answer keys found in {}",
        dir.display()
    );
    Ok(files)
}
