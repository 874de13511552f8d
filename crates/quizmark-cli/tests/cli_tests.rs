//! CLI integration tests using assert_cmd.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn quizmark() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("quizmark").unwrap()
}

const SCENARIO_KEY: &str = r#"[
    {"question_no": 1, "correct_answer": ["true"], "marks": 5},
    {"question_no": 2, "correct_answer": ["a", "c"], "marks": 10}
]"#;

const SCENARIO_ANSWERS: &str = r#"[
    {"question_no": 1, "answer": ["True"]},
    {"question_no": 2, "answer": ["a"]}
]"#;

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

fn ollama_config(dir: &Path, base_url: &str) -> std::path::PathBuf {
    write(
        dir,
        "quizmark.toml",
        &format!(
            r#"default_provider = "local"
default_model = "llama3.1:8b"
max_retries = 0
retry_delay_ms = 1

[providers.local]
type = "ollama"
base_url = "{base_url}"
"#
        ),
    )
}

fn ollama_reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "message": {"role": "assistant", "content": content},
        "model": "llama3.1:8b",
        "prompt_eval_count": 100,
        "eval_count": 20
    }))
}

#[test]
fn validate_sample_key() {
    quizmark()
        .arg("validate")
        .arg("--key")
        .arg("../../keys/geography.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("Geography 101 (4 questions, 10 marks)"))
        .stdout(predicate::str::contains("All answer keys valid"));
}

#[test]
fn validate_directory() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "keys/a.json", SCENARIO_KEY);
    write(
        dir.path(),
        "keys/b.json",
        r#"{"title": "Open Quiz", "questions": [{"question_no": 1, "correct_answer": [], "marks": 1}]}"#,
    );
    write(dir.path(), "keys/notes.txt", "not a key");

    quizmark()
        .arg("validate")
        .arg("--key")
        .arg(dir.path().join("keys"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Answer key: a (2 questions, 15 marks)"))
        .stdout(predicate::str::contains("Open Quiz"))
        .stdout(predicate::str::contains("[Q1] WARNING: correct_answer is empty"))
        .stdout(predicate::str::contains("1 warning(s) found"));
}

#[test]
fn validate_nonexistent_file() {
    quizmark()
        .arg("validate")
        .arg("--key")
        .arg("nonexistent.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn grade_with_answers_file() {
    let dir = TempDir::new().unwrap();
    let key = write(dir.path(), "key.json", SCENARIO_KEY);
    let answers = write(dir.path(), "answers.json", SCENARIO_ANSWERS);
    let output = dir.path().join("report.json");

    quizmark()
        .arg("grade")
        .arg("--key")
        .arg(&key)
        .arg("--answers")
        .arg(&answers)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 10/15"))
        .stdout(predicate::str::contains("1 correct, 1 partial, 0 incorrect"))
        .stdout(predicate::str::contains("partially_correct"));

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(report["total_marks"], 15.0);
    assert_eq!(report["scored_marks"], 10.0);
    assert_eq!(report["question_results"][0]["status"], "correct");
    assert_eq!(report["question_results"][1]["status"], "partially_correct");
    assert_eq!(report["question_results"][1]["awarded_marks"], 5.0);
    assert!(report.get("unmatched_question_nos").is_none());
}

#[test]
fn grade_rejects_duplicate_key_questions() {
    let dir = TempDir::new().unwrap();
    let key = write(
        dir.path(),
        "key.json",
        r#"[{"question_no": 1, "correct_answer": ["a"], "marks": 1},
            {"question_no": 1, "correct_answer": ["b"], "marks": 1}]"#,
    );
    let answers = write(dir.path(), "answers.json", SCENARIO_ANSWERS);

    quizmark()
        .arg("grade")
        .arg("--key")
        .arg(&key)
        .arg("--answers")
        .arg(&answers)
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate question_no 1"));
}

#[test]
fn grade_requires_an_input() {
    quizmark()
        .arg("grade")
        .arg("--key")
        .arg("../../keys/geography.toml")
        .assert()
        .failure();
}

#[tokio::test(flavor = "multi_thread")]
async fn grade_submission_through_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ollama_reply(
            "Sure! Here you go:\n```json\n[{\"question_no\": 1, \"answer\": [\"TRUE\"]}, {\"question_no\": 2, \"answer\": [\"c\", \"a\"]}]\n```",
        ))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = ollama_config(dir.path(), &server.uri());
    let key = write(dir.path(), "key.json", SCENARIO_KEY);
    let submission = write(dir.path(), "alice.txt", "1) True\n2) a and c\n");

    quizmark()
        .current_dir(dir.path())
        .arg("grade")
        .arg("--key")
        .arg(&key)
        .arg("--submission")
        .arg(&submission)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 15/15 (100.0%)"));
}

#[tokio::test(flavor = "multi_thread")]
async fn extract_reports_raw_output_on_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ollama_reply("I'm sorry, the scan is unreadable."))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = ollama_config(dir.path(), &server.uri());
    let submission = write(dir.path(), "smudged.txt", "???");

    quizmark()
        .arg("extract")
        .arg("--submission")
        .arg(&submission)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no JSON array found"))
        .stderr(predicate::str::contains("the scan is unreadable"));
}

#[tokio::test(flavor = "multi_thread")]
async fn batch_grades_directory_and_records_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_string_contains("submitted-by-alice"))
        .respond_with(ollama_reply(
            r#"[{"question_no": 1, "answer": ["Paris"]}, {"question_no": 2, "answer": ["a", "c"]}, {"question_no": 3, "answer": ["True"]}, {"question_no": 4, "answer": ["pacific"]}]"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_string_contains("submitted-by-bob"))
        .respond_with(ollama_reply("nothing legible here"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = ollama_config(dir.path(), &server.uri());
    let submissions = dir.path().join("submissions");
    write(&submissions, "alice.txt", "submitted-by-alice\n1. Paris\n2. a, c\n3. true\n4. Pacific");
    write(&submissions, "bob.md", "submitted-by-bob\n(smudged)");
    write(&submissions, "cover.pdf", "ignored");
    let out = dir.path().join("out");

    quizmark()
        .arg("batch")
        .arg("--key")
        .arg("../../keys/geography.toml")
        .arg("--submissions")
        .arg(&submissions)
        .arg("--output")
        .arg(&out)
        .arg("--format")
        .arg("all")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("alice.txt"))
        .stdout(predicate::str::contains("100.0%"))
        .stdout(predicate::str::contains("failed"));

    let mut files: Vec<_> = std::fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    files.sort();
    assert_eq!(files.len(), 2);

    let json = files
        .iter()
        .find(|p| p.extension().is_some_and(|e| e == "json"))
        .unwrap();
    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(json).unwrap()).unwrap();
    assert_eq!(report["results"].as_array().unwrap().len(), 1);
    assert_eq!(report["results"][0]["report"]["scored_marks"], 10.0);
    assert_eq!(report["failures"][0]["submission_id"], "bob.md");
    assert_eq!(report["failures"][0]["raw_output"], "nothing legible here");

    let markdown = files
        .iter()
        .find(|p| p.extension().is_some_and(|e| e == "md"))
        .unwrap();
    assert!(std::fs::read_to_string(markdown)
        .unwrap()
        .contains("## Geography 101"));
}

#[tokio::test]
async fn batch_keeps_going_past_unreadable_submission() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_string_contains("submitted-by-alice"))
        .respond_with(ollama_reply(
            r#"[{"question_no": 1, "answer": ["Paris"]}, {"question_no": 2, "answer": ["a"]}]"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = ollama_config(dir.path(), &server.uri());
    let submissions = dir.path().join("submissions");
    write(&submissions, "alice.txt", "submitted-by-alice\n1. Paris\n2. a");
    std::fs::write(submissions.join("carol.txt"), b"3. \xff\xfe ocr noise").unwrap();
    let out = dir.path().join("out");

    quizmark()
        .arg("batch")
        .arg("--key")
        .arg("../../keys/geography.toml")
        .arg("--submissions")
        .arg(&submissions)
        .arg("--output")
        .arg(&out)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("alice.txt"))
        .stdout(predicate::str::contains("carol.txt"))
        .stderr(predicate::str::contains("ERROR: carol.txt"));

    let json = std::fs::read_dir(&out).unwrap().next().unwrap().unwrap().path();
    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(json).unwrap()).unwrap();
    assert_eq!(report["results"][0]["submission_id"], "alice.txt");
    assert_eq!(report["results"][0]["report"]["scored_marks"], 4.0);
    assert_eq!(report["failures"][0]["submission_id"], "carol.txt");
    assert!(report["failures"][0]["error"]
        .as_str()
        .unwrap()
        .contains("carol.txt"));
    assert!(report["failures"][0]["raw_output"].is_null());
}

#[test]
fn batch_rejects_unknown_format() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "subs/a.txt", "1. x");

    quizmark()
        .arg("batch")
        .arg("--key")
        .arg("../../keys/geography.toml")
        .arg("--submissions")
        .arg(dir.path().join("subs"))
        .arg("--format")
        .arg("html")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format 'html'"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    quizmark()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created quizmark.toml"))
        .stdout(predicate::str::contains("Created keys/example.json"));

    assert!(dir.path().join("quizmark.toml").exists());

    quizmark()
        .current_dir(dir.path())
        .arg("validate")
        .arg("--key")
        .arg("keys/example.json")
        .assert()
        .success()
        .stdout(predicate::str::contains("Example Quiz (2 questions, 15 marks)"));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    quizmark().current_dir(dir.path()).arg("init").assert().success();

    quizmark()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn list_models_for_unconfigured_setup() {
    let dir = TempDir::new().unwrap();
    let config = write(dir.path(), "empty.toml", "");

    quizmark()
        .env_remove("QUIZMARK_GEMINI_KEY")
        .env_remove("QUIZMARK_ANTHROPIC_KEY")
        .arg("list-models")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("No providers configured"));
}

#[test]
fn list_models_with_gemini_key_from_env() {
    let dir = TempDir::new().unwrap();
    let config = write(dir.path(), "empty.toml", "");

    quizmark()
        .env("QUIZMARK_GEMINI_KEY", "test-key")
        .env_remove("QUIZMARK_ANTHROPIC_KEY")
        .arg("list-models")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Provider: gemini"))
        .stdout(predicate::str::contains("gemini-2.0-flash"));
}

#[test]
fn help_output() {
    quizmark()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("LLM-assisted quiz grading"));
}

#[test]
fn version_output() {
    quizmark()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("quizmark"));
}
