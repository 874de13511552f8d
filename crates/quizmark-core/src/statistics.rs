//! Aggregate statistics over a batch of graded submissions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{AnswerKey, GradeStatus, QuizScoreReport};

/// Statistics across all successfully graded submissions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchStats {
    /// Number of graded submissions.
    pub submissions: usize,
    pub mean_percentage: f64,
    pub median_percentage: f64,
    pub min_percentage: f64,
    pub max_percentage: f64,
    /// Per-question breakdown, in answer-key order.
    pub per_question: Vec<QuestionStats>,
}

/// How the class did on one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionStats {
    pub question_no: u32,
    pub correct: usize,
    pub partially_correct: usize,
    pub incorrect: usize,
    /// Average marks awarded across submissions.
    pub avg_awarded_marks: f64,
    /// Fraction of submissions that got the question fully correct.
    pub correct_rate: f64,
}

/// Median of a slice (sorted in place). Returns 0.0 for an empty slice.
pub fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Compute batch statistics for reports graded against `key`.
pub fn compute_batch_stats(key: &AnswerKey, reports: &[&QuizScoreReport]) -> BatchStats {
    if reports.is_empty() {
        return BatchStats::default();
    }

    let mut percentages: Vec<f64> = reports.iter().map(|r| r.percentage()).collect();
    let n = percentages.len() as f64;
    let mean_percentage = percentages.iter().sum::<f64>() / n;
    let min_percentage = percentages.iter().copied().fold(f64::INFINITY, f64::min);
    let max_percentage = percentages.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let median_percentage = median(&mut percentages);

    let mut tallies: HashMap<u32, QuestionStats> = HashMap::new();
    for report in reports {
        for result in &report.question_results {
            let stats = tallies
                .entry(result.question_no)
                .or_insert_with(|| QuestionStats {
                    question_no: result.question_no,
                    correct: 0,
                    partially_correct: 0,
                    incorrect: 0,
                    avg_awarded_marks: 0.0,
                    correct_rate: 0.0,
                });
            match result.status {
                GradeStatus::Correct => stats.correct += 1,
                GradeStatus::PartiallyCorrect => stats.partially_correct += 1,
                GradeStatus::Incorrect => stats.incorrect += 1,
            }
            // Running sum; divided once all reports are tallied.
            stats.avg_awarded_marks += result.awarded_marks;
        }
    }

    let per_question = key
        .questions
        .iter()
        .filter_map(|q| tallies.remove(&q.question_no))
        .map(|mut stats| {
            stats.avg_awarded_marks /= n;
            stats.correct_rate = stats.correct as f64 / n;
            stats
        })
        .collect();

    BatchStats {
        submissions: reports.len(),
        mean_percentage,
        median_percentage,
        min_percentage,
        max_percentage,
        per_question,
    }
}
