//! Student answer extraction from raw submission text.
//!
//! The extractor sends one fixed instruction to a text-generation
//! collaborator and decodes its reply into [`StudentAnswerEntry`] records.
//! It never retries: a single bad reply is returned as an
//! [`ExtractionError`] carrying the raw output.

use std::sync::Arc;

use crate::decoder;
use crate::error::ExtractionError;
use crate::model::StudentAnswerEntry;
use crate::traits::{GenerateRequest, GenerateResponse, LlmProvider};

/// System prompt used for every extraction call.
pub const EXTRACTION_SYSTEM_PROMPT: &str = "You transcribe student quiz submissions into structured data. Respond ONLY with a JSON array. Do not add explanations or markdown formatting.";

const EXTRACTION_INSTRUCTIONS: &str = r#"Extract the quiz answers from the student's submission below.

STRICTLY format the output as a JSON array of objects with the following schema:

- Each object must include:
  - "question_no": integer
  - "answer": list of strings
- Optional field:
  - "question_text": string

JSON Schema:
{
  "type": "array",
  "items": {
    "type": "object",
    "properties": {
      "question_no": { "type": "integer" },
      "question_text": { "type": "string" },
      "answer": {
        "type": "array",
        "items": { "type": "string" }
      }
    },
    "required": ["question_no", "answer"]
  }
}

Submission:
"#;

/// Build the full extraction prompt for one submission.
pub fn build_extraction_prompt(raw_text: &str) -> String {
    format!("{EXTRACTION_INSTRUCTIONS}{raw_text}\n")
}

/// Decode a collaborator response into student answers.
pub fn parse_extraction_response(
    response: &GenerateResponse,
) -> Result<Vec<StudentAnswerEntry>, ExtractionError> {
    decoder::decode_response(response)
}

/// Settings for extraction calls.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Model identifier passed to the provider.
    pub model: String,
    /// Max tokens for the reply.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            max_tokens: 4096,
            temperature: 0.0,
        }
    }
}

/// Turns raw submission text into student answers using an LLM.
#[derive(Clone)]
pub struct AnswerExtractor {
    provider: Arc<dyn LlmProvider>,
    config: ExtractorConfig,
}

impl AnswerExtractor {
    pub fn new(provider: Arc<dyn LlmProvider>, config: ExtractorConfig) -> Self {
        Self { provider, config }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Extract the per-question answers contained in `raw_text`.
    pub async fn extract(
        &self,
        raw_text: &str,
    ) -> Result<Vec<StudentAnswerEntry>, ExtractionError> {
        if raw_text.trim().is_empty() {
            return Err(ExtractionError::EmptyInput);
        }

        let request = GenerateRequest {
            model: self.config.model.clone(),
            prompt: build_extraction_prompt(raw_text),
            system_prompt: Some(EXTRACTION_SYSTEM_PROMPT.to_string()),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .provider
            .generate(&request)
            .await
            .map_err(ExtractionError::Generation)?;

        tracing::debug!(
            provider = self.provider.name(),
            latency_ms = response.latency_ms,
            "extraction response received"
        );

        let entries = parse_extraction_response(&response)?;
        tracing::info!("extracted answers for {} questions", entries.len());
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::traits::{ModelInfo, TokenUsage};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replies with a canned response and remembers the last prompt.
    struct CannedProvider {
        reply: anyhow::Result<String>,
        last_prompt: Mutex<Option<String>>,
    }

    impl CannedProvider {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                last_prompt: Mutex::new(None),
            }
        }

        fn failing(err: ProviderError) -> Self {
            Self {
                reply: Err(err.into()),
                last_prompt: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for CannedProvider {
        fn name(&self) -> &str {
            "canned"
        }

        async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
            *self.last_prompt.lock().unwrap() = Some(request.prompt.clone());
            match &self.reply {
                Ok(text) => Ok(GenerateResponse {
                    content: text.clone(),
                    structured: None,
                    model: request.model.clone(),
                    token_usage: TokenUsage::default(),
                    latency_ms: 1,
                }),
                Err(e) => Err(anyhow::anyhow!("{e}")),
            }
        }

        fn available_models(&self) -> Vec<ModelInfo> {
            vec![]
        }
    }

    #[tokio::test]
    async fn prompt_states_schema_and_carries_submission() {
        let provider = Arc::new(CannedProvider::replying("[]"));
        let extractor = AnswerExtractor::new(provider.clone(), ExtractorConfig::default());

        extractor.extract("1) Paris\n2) b, d").await.unwrap();

        let prompt = provider.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("\"question_no\": integer"));
        assert!(prompt.contains("\"required\": [\"question_no\", \"answer\"]"));
        assert!(prompt.ends_with("1) Paris\n2) b, d\n"));
    }

    #[tokio::test]
    async fn fenced_reply_is_parsed() {
        let reply = "Here you go:\n```json\n[{\"question_no\": 1, \"question_text\": \"Capital of France?\", \"answer\": [\"Paris\"]}]\n```";
        let extractor = AnswerExtractor::new(
            Arc::new(CannedProvider::replying(reply)),
            ExtractorConfig::default(),
        );

        let entries = extractor.extract("1. Paris").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].answer, vec!["Paris"]);
        assert_eq!(
            entries[0].question_text.as_deref(),
            Some("Capital of France?")
        );
    }

    #[tokio::test]
    async fn blank_submission_is_rejected_before_calling_provider() {
        let provider = Arc::new(CannedProvider::replying("[]"));
        let extractor = AnswerExtractor::new(provider.clone(), ExtractorConfig::default());

        let err = extractor.extract("  \n ").await.unwrap_err();
        assert!(matches!(err, ExtractionError::EmptyInput));
        assert!(provider.last_prompt.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn unparseable_reply_keeps_raw_output() {
        let extractor = AnswerExtractor::new(
            Arc::new(CannedProvider::replying("I cannot read this handwriting.")),
            ExtractorConfig::default(),
        );

        let err = extractor.extract("scribbles").await.unwrap_err();
        assert_eq!(err.raw_output(), Some("I cannot read this handwriting."));
    }

    #[tokio::test]
    async fn provider_failure_is_wrapped() {
        let extractor = AnswerExtractor::new(
            Arc::new(CannedProvider::failing(ProviderError::NetworkError(
                "connection reset".into(),
            ))),
            ExtractorConfig::default(),
        );

        let err = extractor.extract("1. a").await.unwrap_err();
        assert!(matches!(err, ExtractionError::Generation(_)));
        assert!(err.to_string().contains("connection reset"));
    }
}
