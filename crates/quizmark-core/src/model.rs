//! Core data model types for quizmark.
//!
//! Answer keys and student answers come in; per-question results and a
//! score report come out. All of these are plain per-request values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One question of an answer key: the correct options and their worth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerKeyEntry {
    /// Question number, unique within a quiz.
    pub question_no: u32,
    /// The question as shown to students.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_text: Option<String>,
    /// Every option that must be selected for full credit.
    pub correct_answer: Vec<String>,
    /// Points for a fully correct answer.
    pub marks: f64,
}

/// One question's answers as extracted from a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentAnswerEntry {
    pub question_no: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_text: Option<String>,
    pub answer: Vec<String>,
}

/// An answer key together with the quiz metadata it was generated with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerKey {
    /// Identifier for the quiz.
    #[serde(default)]
    pub id: String,
    /// Human-readable quiz title.
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub grade: Option<u8>,
    /// Key entries in presentation order.
    pub questions: Vec<AnswerKeyEntry>,
}

impl AnswerKey {
    /// Wrap bare entries in an anonymous key.
    pub fn from_entries(questions: Vec<AnswerKeyEntry>) -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            subject: None,
            grade: None,
            questions,
        }
    }

    /// Sum of the marks of every question.
    pub fn total_marks(&self) -> f64 {
        self.questions.iter().map(|q| q.marks).sum()
    }
}

/// Three-way classification of a graded question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeStatus {
    Correct,
    PartiallyCorrect,
    Incorrect,
}

impl fmt::Display for GradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradeStatus::Correct => write!(f, "correct"),
            GradeStatus::PartiallyCorrect => write!(f, "partially_correct"),
            GradeStatus::Incorrect => write!(f, "incorrect"),
        }
    }
}

impl FromStr for GradeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "correct" => Ok(GradeStatus::Correct),
            "partially_correct" | "partial" => Ok(GradeStatus::PartiallyCorrect),
            "incorrect" => Ok(GradeStatus::Incorrect),
            other => Err(format!("unknown grade status: {other}")),
        }
    }
}

/// The graded outcome of one answer-key entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question_no: u32,
    /// Empty when the key carries no question text.
    #[serde(default)]
    pub question_text: String,
    /// Marks available for this question.
    pub total_marks: f64,
    /// Marks awarded, always within `0..=total_marks`.
    pub awarded_marks: f64,
    pub status: GradeStatus,
    /// Normalized student answers, duplicates removed, first-seen order.
    pub student_answer: Vec<String>,
    /// Normalized correct answers, duplicates removed, key order.
    pub correct_answer: Vec<String>,
}

/// The scored result of one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizScoreReport {
    /// One result per answer-key entry, in key order.
    pub question_results: Vec<QuestionResult>,
    /// Sum of all key marks.
    pub total_marks: f64,
    /// Sum of all awarded marks.
    pub scored_marks: f64,
    /// Student question numbers that have no counterpart in the key.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unmatched_question_nos: Vec<u32>,
}

impl QuizScoreReport {
    /// Score as a fraction of the total in `0.0..=1.0`; `0.0` for an empty key.
    pub fn fraction(&self) -> f64 {
        if self.total_marks > 0.0 {
            self.scored_marks / self.total_marks
        } else {
            0.0
        }
    }

    /// Score as a percentage.
    pub fn percentage(&self) -> f64 {
        self.fraction() * 100.0
    }

    /// Number of questions with the given status.
    pub fn count_status(&self, status: GradeStatus) -> usize {
        self.question_results
            .iter()
            .filter(|r| r.status == status)
            .count()
    }
}
