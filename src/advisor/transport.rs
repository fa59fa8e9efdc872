//! Advisor transport
//!
//! A [`Transport`] performs exactly one attempt and classifies the result.
//! Retry policy lives in the client so it can be tested with a scripted
//! transport.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::blocking::Client as HttpClient;
use serde_json::{Value, json};

use super::{AdvisorError, AdvisorPrompt};
use crate::settings::AdvisorSettings;

/// Result of a single request attempt
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// Raw model text
    Success(String),
    TransientFailure(String),
    /// Rate limit or quota hit; retrying will not help
    QuotaFailure(String),
    OverloadFailure(String),
}

/// Map an HTTP status to an attempt outcome
pub fn classify_status(status: u16, body: String) -> AttemptOutcome {
    match status {
        200..=299 => AttemptOutcome::Success(body),
        429 => AttemptOutcome::QuotaFailure(format!("HTTP {status}: {body}")),
        503 | 529 => AttemptOutcome::OverloadFailure(format!("HTTP {status}: {body}")),
        _ => AttemptOutcome::TransientFailure(format!("HTTP {status}: {body}")),
    }
}

pub trait Transport: Send + Sync {
    fn send(&self, prompt: &AdvisorPrompt) -> AttemptOutcome;
}

/// generateContent-style HTTP transport
pub struct HttpTransport {
    client: HttpClient,
    endpoint: String,
    model: String,
    api_key: String,
}

impl HttpTransport {
    pub fn new(settings: &AdvisorSettings) -> Result<Self, AdvisorError> {
        let api_key = settings.api_key().ok_or_else(|| {
            AdvisorError::NotConfigured(format!("{} is not set", settings.api_key_env))
        })?;
        let client = HttpClient::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|err| AdvisorError::NotConfigured(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key,
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

/// Request body with the screenshot inlined ahead of the text
pub fn request_body(prompt: &AdvisorPrompt) -> Value {
    let mut parts = Vec::new();
    if let Some(png) = &prompt.screenshot {
        parts.push(json!({
            "inline_data": {
                "mime_type": "image/png",
                "data": BASE64.encode(png),
            }
        }));
    }
    parts.push(json!({ "text": prompt.text }));

    json!({
        "contents": [{ "role": "user", "parts": parts }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": prompt.schema,
        }
    })
}

/// Concatenated text parts of the first candidate
pub fn extract_text(envelope: &Value) -> Option<String> {
    let parts = envelope
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

impl Transport for HttpTransport {
    fn send(&self, prompt: &AdvisorPrompt) -> AttemptOutcome {
        let response = match self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(prompt))
            .send()
        {
            Ok(response) => response,
            Err(err) => return AttemptOutcome::TransientFailure(err.to_string()),
        };

        let status = response.status().as_u16();
        let body = match response.text() {
            Ok(body) => body,
            Err(err) => return AttemptOutcome::TransientFailure(err.to_string()),
        };

        match classify_status(status, body) {
            // Unwrap the envelope; an unexpected shape is left for the parser to reject
            AttemptOutcome::Success(body) => {
                let text = serde_json::from_str::<Value>(&body)
                    .ok()
                    .as_ref()
                    .and_then(extract_text)
                    .unwrap_or(body);
                AttemptOutcome::Success(text)
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(screenshot: Option<Vec<u8>>) -> AdvisorPrompt {
        AdvisorPrompt {
            text: "pick one".to_string(),
            screenshot,
            schema: json!({ "type": "OBJECT" }),
        }
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(
            classify_status(200, "ok".into()),
            AttemptOutcome::Success("ok".into())
        );
        assert!(matches!(
            classify_status(429, String::new()),
            AttemptOutcome::QuotaFailure(_)
        ));
        assert!(matches!(
            classify_status(503, String::new()),
            AttemptOutcome::OverloadFailure(_)
        ));
        assert!(matches!(
            classify_status(529, String::new()),
            AttemptOutcome::OverloadFailure(_)
        ));
        assert!(matches!(
            classify_status(500, String::new()),
            AttemptOutcome::TransientFailure(_)
        ));
        assert!(matches!(
            classify_status(502, String::new()),
            AttemptOutcome::TransientFailure(_)
        ));
    }

    #[test]
    fn test_body_inlines_screenshot() {
        let body = request_body(&prompt(Some(vec![1, 2, 3])));
        let parts = body["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["inline_data"]["data"], "AQID");
        assert_eq!(parts[1]["text"], "pick one");
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn test_body_without_screenshot() {
        let body = request_body(&prompt(None));
        let parts = body["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 1);
    }

    #[test]
    fn test_extract_text() {
        let envelope = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "{\"message\":" }, { "text": "\"hi\"}" }] }
            }]
        });
        assert_eq!(
            extract_text(&envelope).as_deref(),
            Some("{\"message\":\"hi\"}")
        );
        assert_eq!(extract_text(&json!({ "candidates": [] })), None);
    }
}
