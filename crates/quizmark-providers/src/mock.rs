//! Mock provider for testing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use quizmark_core::traits::{GenerateRequest, GenerateResponse, LlmProvider, ModelInfo, TokenUsage};

/// A scripted LLM provider for exercising extraction and grading without
/// real API calls.
///
/// Replies are picked by the first registered prompt substring that the
/// incoming prompt contains, in registration order.
pub struct MockProvider {
    responses: Vec<(String, String)>,
    default_response: String,
    structured: Option<Value>,
    call_count: AtomicU32,
    last_request: Mutex<Option<GenerateRequest>>,
}

impl MockProvider {
    /// Create a mock with `(prompt substring, reply)` mappings.
    pub fn new<I, K, V>(responses: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            responses: responses
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            default_response: "[]".to_string(),
            structured: None,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that always replies with the same text.
    pub fn with_fixed_response(response: &str) -> Self {
        let mut mock = Self::new(Vec::<(String, String)>::new());
        mock.default_response = response.to_string();
        mock
    }

    /// Attach a function-call style structured payload to every reply.
    pub fn with_structured(mut self, value: Value) -> Self {
        self.structured = Some(value);
        self
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// The most recent request seen, if any.
    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.last_request
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        match self.last_request.lock() {
            Ok(mut guard) => *guard = Some(request.clone()),
            Err(poisoned) => *poisoned.into_inner() = Some(request.clone()),
        }

        let content = self
            .responses
            .iter()
            .find(|(key, _)| request.prompt.contains(key.as_str()))
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| self.default_response.clone());

        // Rough estimate: four characters per token.
        let prompt_tokens = (request.prompt.len() / 4) as u32;
        let completion_tokens = (content.len() / 4) as u32;

        Ok(GenerateResponse {
            content,
            structured: self.structured.clone(),
            model: request.model.clone(),
            token_usage: TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
                estimated_cost_usd: 0.0,
            },
            latency_ms: 1,
        })
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        vec![ModelInfo {
            id: "mock-model".into(),
            name: "Mock Model".into(),
            provider: "mock".into(),
            max_context: 100_000,
            cost_per_1k_input: 0.0,
            cost_per_1k_output: 0.0,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: &str) -> GenerateRequest {
        GenerateRequest {
            model: "mock-model".into(),
            prompt: prompt.into(),
            system_prompt: None,
            max_tokens: 100,
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn fixed_response() {
        let provider = MockProvider::with_fixed_response(r#"[{"question_no": 1, "answer": ["a"]}]"#);

        let response = provider.generate(&request("anything")).await.unwrap();
        assert!(response.content.contains("question_no"));
        assert!(response.structured.is_none());
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.last_request().unwrap().prompt, "anything");
    }

    #[tokio::test]
    async fn prompt_matching_uses_registration_order() {
        let provider = MockProvider::new([
            ("alice", r#"[{"question_no": 1, "answer": ["Paris"]}]"#),
            ("bob", r#"[{"question_no": 1, "answer": ["Lyon"]}]"#),
        ]);

        let resp = provider.generate(&request("Submission by bob")).await.unwrap();
        assert!(resp.content.contains("Lyon"));

        let resp = provider
            .generate(&request("alice and bob wrote this together"))
            .await
            .unwrap();
        assert!(resp.content.contains("Paris"));

        let resp = provider.generate(&request("nobody")).await.unwrap();
        assert_eq!(resp.content, "[]");
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn structured_payload_is_attached() {
        let provider = MockProvider::with_fixed_response("")
            .with_structured(serde_json::json!([{"question_no": 3, "answer": ["x"]}]));

        let resp = provider.generate(&request("p")).await.unwrap();
        assert_eq!(resp.structured.unwrap()[0]["question_no"], 3);
    }
}
