//! HTTP plumbing shared by the provider implementations.

use std::time::Duration;

use serde_json::Value;

use quizmark_core::error::ProviderError;

/// Retry-after used when a 429 response carries no usable header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

pub(crate) fn build_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Map a transport failure to a provider error.
pub(crate) fn send_error(e: reqwest::Error, timeout_secs: u64) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(timeout_secs)
    } else {
        ProviderError::NetworkError(e.to_string())
    }
}

/// Pull a human-readable message out of an error body.
///
/// Understands `{"error": {"message": ".."}}` and `{"error": ".."}`;
/// anything else is returned as-is.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| match v.get("error")? {
            Value::String(s) => Some(s.clone()),
            Value::Object(o) => o.get("message")?.as_str().map(str::to_string),
            _ => None,
        })
        .unwrap_or_else(|| body.to_string())
}

/// Turn non-success statuses into the matching [`ProviderError`].
pub(crate) async fn check_status(
    response: reqwest::Response,
    model: &str,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status().as_u16();
    match status {
        429 => {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
                * 1000;
            Err(ProviderError::RateLimited {
                retry_after_ms: retry_after,
            })
        }
        401 | 403 => {
            let body = response.text().await.unwrap_or_default();
            Err(ProviderError::AuthenticationFailed(error_message(&body)))
        }
        404 => Err(ProviderError::ModelNotFound(model.to_string())),
        s if s >= 400 => {
            let body = response.text().await.unwrap_or_default();
            Err(ProviderError::ApiError {
                status,
                message: error_message(&body),
            })
        }
        _ => Ok(response),
    }
}

/// Decode a success body, mapping failures to `ApiError { status: 0 }`.
pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    response.json().await.map_err(|e| ProviderError::ApiError {
        status: 0,
        message: format!("failed to parse response: {e}"),
    })
}
