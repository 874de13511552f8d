//! Deterministic grading of student answers against an answer key.
//!
//! Answers on both sides are normalized (trimmed, case-folded, duplicates
//! dropped) and compared as sets, so the order in which a student lists
//! multi-select options never matters.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use serde_json::Value;

use crate::error::ScoringInputError;
use crate::model::{AnswerKeyEntry, GradeStatus, QuestionResult, QuizScoreReport, StudentAnswerEntry};

/// Fraction of a question's marks awarded when some, but not all, of the
/// correct options were given. Flat regardless of how many options matched.
pub const PARTIAL_CREDIT_RATE: f64 = 0.5;

/// Trim and case-fold a single answer.
pub fn normalize_answer(answer: &str) -> String {
    answer.trim().to_lowercase()
}

/// Normalize a list of answers into a duplicate-free list in first-seen order.
///
/// Blank answers are kept as the empty string and still have to be matched.
pub fn normalize_answers<S: AsRef<str>>(answers: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    answers
        .iter()
        .map(|a| normalize_answer(a.as_ref()))
        .filter(|a| seen.insert(a.clone()))
        .collect()
}

/// Check the answer key against the data model before any scoring happens.
pub fn check_answer_key(answer_key: &[AnswerKeyEntry]) -> Result<(), ScoringInputError> {
    let mut seen = HashSet::new();
    for entry in answer_key {
        if !entry.marks.is_finite() || entry.marks < 0.0 {
            return Err(ScoringInputError::InvalidMarks {
                question_no: entry.question_no,
                marks: entry.marks,
            });
        }
        if !seen.insert(entry.question_no) {
            return Err(ScoringInputError::DuplicateQuestion(entry.question_no));
        }
    }
    Ok(())
}

/// Grade one key entry against the student's answers for that question.
///
/// `student` is `None` when the submission has no entry for the question;
/// that is scored as an empty answer, not rejected.
pub fn grade_question(
    entry: &AnswerKeyEntry,
    student: Option<&StudentAnswerEntry>,
) -> QuestionResult {
    let correct_answer = normalize_answers(&entry.correct_answer);
    let student_answer = student
        .map(|s| normalize_answers(&s.answer))
        .unwrap_or_default();

    let correct_set: HashSet<&str> = correct_answer.iter().map(String::as_str).collect();
    let matches = student_answer
        .iter()
        .filter(|a| correct_set.contains(a.as_str()))
        .count();

    // Both lists are duplicate-free, so matching every correct option is
    // equivalent to `student ∩ correct == correct`.
    let (status, awarded_marks) = if matches == correct_set.len() {
        (GradeStatus::Correct, entry.marks)
    } else if matches > 0 {
        (GradeStatus::PartiallyCorrect, entry.marks * PARTIAL_CREDIT_RATE)
    } else {
        (GradeStatus::Incorrect, 0.0)
    };

    QuestionResult {
        question_no: entry.question_no,
        question_text: entry.question_text.clone().unwrap_or_default(),
        total_marks: entry.marks,
        awarded_marks,
        status,
        student_answer,
        correct_answer,
    }
}

/// Grade a submission against an answer key.
///
/// Produces exactly one [`QuestionResult`] per key entry, in key order.
/// Student entries are looked up by `question_no`; when a submission repeats
/// a question number the first entry wins. Student entries with no
/// counterpart in the key are not scored and are listed in
/// [`QuizScoreReport::unmatched_question_nos`].
pub fn evaluate(
    student_answers: &[StudentAnswerEntry],
    answer_key: &[AnswerKeyEntry],
) -> Result<QuizScoreReport, ScoringInputError> {
    check_answer_key(answer_key)?;

    let mut lookup: HashMap<u32, &StudentAnswerEntry> = HashMap::new();
    for entry in student_answers {
        lookup.entry(entry.question_no).or_insert(entry);
    }

    let mut question_results = Vec::with_capacity(answer_key.len());
    let mut total_marks = 0.0;
    let mut scored_marks = 0.0;

    for key_entry in answer_key {
        let result = grade_question(key_entry, lookup.get(&key_entry.question_no).copied());
        total_marks += result.total_marks;
        scored_marks += result.awarded_marks;
        question_results.push(result);
    }

    let key_numbers: HashSet<u32> = answer_key.iter().map(|e| e.question_no).collect();
    let mut unmatched_question_nos: Vec<u32> = lookup
        .keys()
        .copied()
        .filter(|n| !key_numbers.contains(n))
        .collect();
    unmatched_question_nos.sort_unstable();
    if !unmatched_question_nos.is_empty() {
        tracing::warn!(
            "ignoring answers for questions not in the key: {:?}",
            unmatched_question_nos
        );
    }

    Ok(QuizScoreReport {
        question_results,
        total_marks,
        scored_marks,
        unmatched_question_nos,
    })
}

/// Grade loosely-typed JSON inputs, mapping shape errors to
/// [`ScoringInputError::Malformed`].
pub fn evaluate_json(
    student_answers: &Value,
    answer_key: &Value,
) -> Result<QuizScoreReport, ScoringInputError> {
    let key = Vec::<AnswerKeyEntry>::deserialize(answer_key).map_err(|e| {
        ScoringInputError::Malformed {
            what: "answer key",
            reason: e.to_string(),
        }
    })?;
    let student = Vec::<StudentAnswerEntry>::deserialize(student_answers).map_err(|e| {
        ScoringInputError::Malformed {
            what: "student answers",
            reason: e.to_string(),
        }
    })?;
    evaluate(&student, &key)
}
