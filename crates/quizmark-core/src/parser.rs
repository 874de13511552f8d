//! Answer-key and answer file loading.
//!
//! Answer keys load from JSON (a bare array of entries, or an object with a
//! `questions` array) or TOML (`[quiz]` header plus `[[questions]]`).
//! Student answers load from JSON arrays. Submissions for batch grading are
//! discovered in a directory tree.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ScoringInputError;
use crate::model::{AnswerKey, AnswerKeyEntry, StudentAnswerEntry};

/// On-disk format of an answer key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFormat {
    Json,
    Toml,
}

impl KeyFormat {
    /// Infer the format from a file extension; anything but `.toml` is JSON.
    pub fn from_path(path: &Path) -> Self {
        if path.extension().is_some_and(|ext| ext == "toml") {
            KeyFormat::Toml
        } else {
            KeyFormat::Json
        }
    }
}

/// Intermediate TOML structure for answer-key files.
#[derive(Debug, Deserialize)]
struct TomlKeyFile {
    #[serde(default)]
    quiz: TomlQuizHeader,
    #[serde(default)]
    questions: Vec<AnswerKeyEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct TomlQuizHeader {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    grade: Option<u8>,
}

fn malformed(what: &'static str, reason: impl ToString) -> ScoringInputError {
    ScoringInputError::Malformed {
        what,
        reason: reason.to_string(),
    }
}

/// Parse an answer-key file, choosing the format by extension.
pub fn parse_answer_key(path: &Path) -> Result<AnswerKey> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answer key: {}", path.display()))?;

    let mut key = parse_answer_key_str(&content, KeyFormat::from_path(path))
        .with_context(|| format!("failed to parse answer key: {}", path.display()))?;

    if key.id.is_empty() {
        if let Some(stem) = path.file_stem() {
            key.id = stem.to_string_lossy().into_owned();
        }
    }
    Ok(key)
}

/// Parse an answer key from a string (useful for testing).
pub fn parse_answer_key_str(content: &str, format: KeyFormat) -> Result<AnswerKey> {
    match format {
        KeyFormat::Toml => {
            let parsed: TomlKeyFile =
                toml::from_str(content).map_err(|e| malformed("answer key", e))?;
            Ok(AnswerKey {
                id: parsed.quiz.id,
                title: parsed.quiz.title,
                subject: parsed.quiz.subject,
                grade: parsed.quiz.grade,
                questions: parsed.questions,
            })
        }
        KeyFormat::Json => {
            let value: Value =
                serde_json::from_str(content).map_err(|e| malformed("answer key", e))?;
            if value.is_array() {
                let questions: Vec<AnswerKeyEntry> =
                    serde_json::from_value(value).map_err(|e| malformed("answer key", e))?;
                Ok(AnswerKey::from_entries(questions))
            } else {
                Ok(serde_json::from_value(value).map_err(|e| malformed("answer key", e))?)
            }
        }
    }
}

/// Load pre-extracted student answers from a JSON file.
pub fn load_student_answers(path: &Path) -> Result<Vec<StudentAnswerEntry>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answers: {}", path.display()))?;
    parse_student_answers_str(&content)
        .with_context(|| format!("failed to parse answers: {}", path.display()))
}

/// Parse student answers from a JSON string.
pub fn parse_student_answers_str(content: &str) -> Result<Vec<StudentAnswerEntry>> {
    Ok(serde_json::from_str(content).map_err(|e| malformed("student answers", e))?)
}

/// Recursively collect `.txt` and `.md` submission files, sorted by path.
pub fn load_submission_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut files = Vec::new();
    collect_submissions(dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_submissions(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_dir() {
            collect_submissions(&path, files)?;
        } else if path
            .extension()
            .is_some_and(|ext| ext == "txt" || ext == "md")
        {
            files.push(path);
        } else {
            tracing::debug!("skipping non-submission file {}", path.display());
        }
    }
    Ok(())
}

/// A warning from answer-key validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question number (if applicable).
    pub question_no: Option<u32>,
    /// Warning message.
    pub message: String,
}

/// Validate an answer key for common issues.
pub fn validate_answer_key(key: &AnswerKey) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if key.questions.is_empty() {
        warnings.push(ValidationWarning {
            question_no: None,
            message: "answer key has no questions".into(),
        });
    }

    let mut seen = std::collections::HashSet::new();
    for q in &key.questions {
        if !seen.insert(q.question_no) {
            warnings.push(ValidationWarning {
                question_no: Some(q.question_no),
                message: format!("duplicate question_no: {}", q.question_no),
            });
        }
    }

    for q in &key.questions {
        if !q.marks.is_finite() || q.marks < 0.0 {
            warnings.push(ValidationWarning {
                question_no: Some(q.question_no),
                message: format!("marks must be a non-negative number, got {}", q.marks),
            });
        } else if q.marks == 0.0 {
            warnings.push(ValidationWarning {
                question_no: Some(q.question_no),
                message: "question is worth zero marks".into(),
            });
        }
    }

    // An empty correct set is matched by any submission.
    for q in &key.questions {
        if q.correct_answer.is_empty() {
            warnings.push(ValidationWarning {
                question_no: Some(q.question_no),
                message: "correct_answer is empty; every submission scores full marks".into(),
            });
        } else if q.correct_answer.iter().any(|a| a.trim().is_empty()) {
            warnings.push(ValidationWarning {
                question_no: Some(q.question_no),
                message: "correct_answer contains a blank option; only a blank answer matches it"
                    .into(),
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOML_KEY: &str = r#"
[quiz]
id = "photosynthesis-g5"
title = "Photosynthesis"
subject = "Science"
grade = 5

[[questions]]
question_no = 1
question_text = "Plants need sunlight to make food."
correct_answer = ["true"]
marks = 5

[[questions]]
question_no = 2
question_text = "Which are inputs to photosynthesis?"
correct_answer = ["a", "c"]
marks = 10
"#;

    const JSON_KEY: &str = r#"{
  "id": "capitals",
  "title": "World Capitals",
  "questions": [
    {"question_no": 1, "correct_answer": ["Paris"], "marks": 2},
    {"question_no": 2, "correct_answer": ["Tokyo"], "marks": 2.5}
  ]
}"#;

    #[test]
    fn parse_toml_key() {
        let key = parse_answer_key_str(TOML_KEY, KeyFormat::Toml).unwrap();
        assert_eq!(key.id, "photosynthesis-g5");
        assert_eq!(key.grade, Some(5));
        assert_eq!(key.questions.len(), 2);
        assert_eq!(key.questions[1].correct_answer, vec!["a", "c"]);
        assert_eq!(key.total_marks(), 15.0);
    }

    #[test]
    fn parse_json_key_object() {
        let key = parse_answer_key_str(JSON_KEY, KeyFormat::Json).unwrap();
        assert_eq!(key.title, "World Capitals");
        assert_eq!(key.questions[1].marks, 2.5);
    }

    #[test]
    fn parse_json_key_bare_array() {
        let key = parse_answer_key_str(
            r#"[{"question_no": 1, "correct_answer": ["x"], "marks": 1}]"#,
            KeyFormat::Json,
        )
        .unwrap();
        assert!(key.id.is_empty());
        assert_eq!(key.questions.len(), 1);
    }

    #[test]
    fn missing_marks_is_a_scoring_input_error() {
        let err = parse_answer_key_str(
            r#"[{"question_no": 1, "correct_answer": ["x"]}]"#,
            KeyFormat::Json,
        )
        .unwrap_err();
        assert!(err.downcast_ref::<ScoringInputError>().is_some());
        assert!(err.to_string().contains("marks"));
    }

    #[test]
    fn parse_malformed_toml() {
        let result = parse_answer_key_str("this is not [valid toml }{", KeyFormat::Toml);
        assert!(result.is_err());
    }

    #[test]
    fn key_id_defaults_to_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unit-3.json");
        std::fs::write(&path, r#"[{"question_no": 1, "correct_answer": ["x"], "marks": 1}]"#)
            .unwrap();

        let key = parse_answer_key(&path).unwrap();
        assert_eq!(key.id, "unit-3");
    }

    #[test]
    fn load_answers_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("answers.json");
        std::fs::write(
            &path,
            r#"[{"question_no": 1, "answer": ["True"]}, {"question_no": 2, "answer": ["a"]}]"#,
        )
        .unwrap();

        let answers = load_student_answers(&path).unwrap();
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[0].answer, vec!["True"]);
    }

    #[test]
    fn submission_directory_is_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("section-b")).unwrap();
        std::fs::write(dir.path().join("zoe.txt"), "1. a").unwrap();
        std::fs::write(dir.path().join("amir.txt"), "1. b").unwrap();
        std::fs::write(dir.path().join("section-b/lee.md"), "1. c").unwrap();
        std::fs::write(dir.path().join("scan.pdf"), "%PDF").unwrap();

        let files = load_submission_directory(dir.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["amir.txt", "lee.md", "zoe.txt"]);
    }

    #[test]
    fn validate_flags_duplicates_and_empty_answers() {
        let key = parse_answer_key_str(
            r#"[
                {"question_no": 1, "correct_answer": ["a"], "marks": 1},
                {"question_no": 1, "correct_answer": ["b"], "marks": 1},
                {"question_no": 2, "correct_answer": [" "], "marks": 0}
            ]"#,
            KeyFormat::Json,
        )
        .unwrap();

        let warnings = validate_answer_key(&key);
        assert!(warnings.iter().any(|w| w.message.contains("duplicate")));
        assert!(warnings.iter().any(|w| w.message.contains("zero marks")));
        assert!(warnings
            .iter()
            .any(|w| w.question_no == Some(2) && w.message.contains("blank option")));
    }

    #[test]
    fn validate_distinguishes_empty_list_from_blank_option() {
        let key = parse_answer_key_str(
            r#"[
                {"question_no": 1, "correct_answer": [], "marks": 1},
                {"question_no": 2, "correct_answer": ["a", ""], "marks": 1}
            ]"#,
            KeyFormat::Json,
        )
        .unwrap();

        let warnings = validate_answer_key(&key);
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].question_no, Some(1));
        assert!(warnings[0].message.contains("is empty"));
        assert_eq!(warnings[1].question_no, Some(2));
        assert!(warnings[1].message.contains("blank option"));
    }

    #[test]
    fn validate_clean_key_has_no_warnings() {
        let key = parse_answer_key_str(TOML_KEY, KeyFormat::Toml).unwrap();
        assert!(validate_answer_key(&key).is_empty());
    }
}
