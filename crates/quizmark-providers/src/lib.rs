//! quizmark-providers — Collaborator implementations for quizmark.
//!
//! Implements `LlmProvider` for Gemini, Anthropic and Ollama plus a scripted
//! mock, `DocumentTextSource` for plain-text submissions, and the
//! configuration layer that wires them together.

pub mod anthropic;
pub mod config;
pub mod document;
pub mod gemini;
mod http;
pub mod mock;
pub mod ollama;

pub use config::{create_provider, load_config, load_config_from, ProviderConfig, QuizmarkConfig};
pub use document::PlainTextSource;
pub use quizmark_core::error::ProviderError;
