//! Shared request plumbing for the HTTP backends.

use std::time::Duration;

use inkloop_core::CapabilityError;
use serde_json::Value;

use crate::ProviderError;

/// Longest error body kept in a provider error message.
const ERROR_BODY_CHARS: usize = 500;

pub fn build_client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// POST `body` as JSON and decode the JSON reply. Every failure, including
/// authentication statuses, is a provider error: credentials were present
/// when the backend was bound.
pub async fn post_json(
    request: reqwest::RequestBuilder,
    body: &Value,
    backend: &str,
) -> Result<Value, CapabilityError> {
    let response = request
        .json(body)
        .send()
        .await
        .map_err(|e| CapabilityError::Provider(format!("{backend}: request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(status_error(backend, status.as_u16(), &text));
    }

    response
        .json()
        .await
        .map_err(|e| CapabilityError::Provider(format!("{backend}: unreadable response: {e}")))
}

pub fn status_error(backend: &str, status: u16, body: &str) -> CapabilityError {
    let detail: String = body.trim().chars().take(ERROR_BODY_CHARS).collect();
    let kind = match status {
        401 | 403 => "authentication failed",
        429 => "rate limited",
        500..=599 => "server error",
        _ => "request rejected",
    };
    CapabilityError::Provider(format!("{backend}: {kind} (HTTP {status}): {detail}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_classifies() {
        let err = status_error("openai", 429, "slow down");
        assert_eq!(
            err,
            CapabilityError::Provider("openai: rate limited (HTTP 429): slow down".into())
        );
        assert!(!status_error("openai", 401, "").is_configuration());
    }

    #[test]
    fn test_status_error_truncates_body() {
        let body = "x".repeat(2000);
        let CapabilityError::Provider(msg) = status_error("tavily", 500, &body) else {
            panic!("expected provider error");
        };
        assert!(msg.len() < 600);
    }
}
