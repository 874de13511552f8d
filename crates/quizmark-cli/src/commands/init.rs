//! The `quizmark init` command.

use std::path::Path;

use anyhow::{Context, Result};

pub fn execute() -> Result<()> {
    write_if_missing(Path::new("quizmark.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("keys").context("failed to create keys/")?;
    write_if_missing(Path::new("keys/example.json"), EXAMPLE_KEY)?;

    println!("\nNext steps:");
    println!("  1. Set QUIZMARK_GEMINI_KEY or edit quizmark.toml");
    println!("  2. Run: quizmark validate --key keys/example.json");
    println!("  3. Run: quizmark grade --key keys/example.json --submission <file.txt>");

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizmark configuration

default_provider = "gemini"
default_model = "gemini-2.0-flash"
default_temperature = 0.0
max_tokens = 4096
max_retries = 3
retry_delay_ms = 1000
parallelism = 4
output_dir = "./quizmark-results"

[providers.gemini]
type = "gemini"
api_key = "${GEMINI_API_KEY}"

[providers.anthropic]
type = "anthropic"
api_key = "${ANTHROPIC_API_KEY}"

[providers.ollama]
type = "ollama"
base_url = "http://localhost:11434"
"#;

const EXAMPLE_KEY: &str = r#"{
  "id": "example",
  "title": "Example Quiz",
  "subject": "General Knowledge",
  "questions": [
    {
      "question_no": 1,
      "question_text": "The Earth orbits the Sun. True or false?",
      "correct_answer": ["true"],
      "marks": 5
    },
    {
      "question_no": 2,
      "question_text": "Which of these are prime numbers? (a) 2 (b) 4 (c) 7 (d) 9",
      "correct_answer": ["a", "c"],
      "marks": 10
    }
  ]
}
"#;
