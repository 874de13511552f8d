//! quizmark-core — Answer extraction, quiz scoring and batch grading.
//!
//! This crate defines the data model, collaborator traits, the scoring rules
//! and the extraction pipeline that the rest of quizmark builds on.

pub mod decoder;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod model;
pub mod parser;
pub mod report;
pub mod scorer;
pub mod statistics;
pub mod traits;

pub use error::{ExtractionError, ProviderError, ScoringInputError};
pub use extractor::AnswerExtractor;
pub use model::{AnswerKey, AnswerKeyEntry, GradeStatus, QuestionResult, QuizScoreReport, StudentAnswerEntry};
pub use scorer::evaluate;
