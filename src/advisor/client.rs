//! Retrying advisor client

use std::thread;
use std::time::Duration;

use serde_json::Value;

use super::fallback::local_hint;
use super::prompt::build_prompt;
use super::{AdvisorError, AdvisorPrompt, AdvisorRequest, HintSource, StrategicHint, Transport};
use crate::settings::AdvisorSettings;
use crate::sim::BubbleColor;

/// Bounded retry with doubling backoff
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn from_settings(settings: &AdvisorSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            initial_backoff: Duration::from_millis(settings.initial_backoff_ms),
        }
    }

    /// Wait after the given failed attempt (1-based): 1x, 2x, 4x the initial backoff
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.initial_backoff.saturating_mul(1 << shift)
    }
}

pub struct AdvisorClient {
    transport: Box<dyn Transport>,
    retry: RetryPolicy,
}

impl AdvisorClient {
    pub fn new(transport: Box<dyn Transport>, retry: RetryPolicy) -> Self {
        Self { transport, retry }
    }

    /// Send with retries. Quota and overload failures abort immediately.
    pub fn request_with_retry(&self, prompt: &AdvisorPrompt) -> Result<String, AdvisorError> {
        use super::AttemptOutcome::*;

        let mut last = String::new();
        for attempt in 1..=self.retry.max_attempts {
            match self.transport.send(prompt) {
                Success(text) => return Ok(text),
                QuotaFailure(msg) => return Err(AdvisorError::Quota(msg)),
                OverloadFailure(msg) => return Err(AdvisorError::Overload(msg)),
                TransientFailure(msg) => {
                    log::warn!(
                        "Advisor attempt {}/{} failed: {}",
                        attempt,
                        self.retry.max_attempts,
                        msg
                    );
                    last = msg;
                    if attempt < self.retry.max_attempts {
                        let backoff = self.retry.backoff_for(attempt);
                        if !backoff.is_zero() {
                            thread::sleep(backoff);
                        }
                    }
                }
            }
        }

        Err(AdvisorError::RetriesExhausted {
            attempts: self.retry.max_attempts,
            last,
        })
    }

    /// Always produces a hint; failures resolve to the local heuristic
    pub fn advise(&self, request: &AdvisorRequest) -> StrategicHint {
        let prompt = build_prompt(request);
        match self
            .request_with_retry(&prompt)
            .and_then(|raw| parse_hint(&raw))
        {
            Ok(hint) => {
                log::debug!("Advisor hint: {}", hint.message);
                hint
            }
            Err(err) => {
                log::warn!("Advisor fell back to local heuristic: {err}");
                local_hint(&request.candidates, err.reason())
            }
        }
    }
}

/// Models sometimes wrap JSON in a markdown fence
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Accepts integers, integral floats, and numeric strings
fn coordinate(value: Option<&Value>, field: &str) -> Result<u32, AdvisorError> {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| AdvisorError::InvalidCoordinates(format!("{field}: {value:?}")))
}

/// Parse and validate a raw advisor reply
pub fn parse_hint(raw: &str) -> Result<StrategicHint, AdvisorError> {
    let value: Value = serde_json::from_str(strip_code_fence(raw))
        .map_err(|err| AdvisorError::Parse(err.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| AdvisorError::Parse("reply is not a JSON object".to_string()))?;

    let message = object
        .get("message")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AdvisorError::Parse("missing message".to_string()))?
        .to_string();
    let rationale = object
        .get("rationale")
        .and_then(Value::as_str)
        .map(str::to_string);

    let target_row = coordinate(object.get("targetRow"), "targetRow")?;
    let target_col = coordinate(object.get("targetCol"), "targetCol")?;
    let recommended_color = object
        .get("recommendedColor")
        .and_then(Value::as_str)
        .and_then(|c| BubbleColor::parse(c.trim()))
        .ok_or_else(|| {
            AdvisorError::InvalidCoordinates(format!(
                "recommendedColor: {:?}",
                object.get("recommendedColor")
            ))
        })?;

    Ok(StrategicHint {
        message,
        rationale,
        target_row: Some(target_row),
        target_col: Some(target_col),
        recommended_color: Some(recommended_color),
        source: HintSource::Advisor,
        fallback_reason: None,
    })
}
