//! # Recognition Client
//!
//! Submits a recognizable segment to the external speech-to-text service and
//! maps the service's outcomes into this system's result taxonomy:
//!
//! - a transcript → success
//! - "understood nothing" → [`AppError::Unrecognized`] (a valid
//!   empty-content outcome, not a failure)
//! - unreachable / rejected → [`AppError::ServiceUnavailable`]
//!
//! The call is synchronous from the caller's perspective and performs no
//! internal retry: the service's quota and latency characteristics make
//! blind retry unsafe without a caller-visible policy decision. The HTTP
//! client does carry its own timeout, so a hung upstream surfaces as
//! `ServiceUnavailable` instead of wedging a worker.

use crate::config::RecognitionConfig;
use crate::error::{AppError, AppResult};
use crate::recognition::segment::RecognizableSegment;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::debug;

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// The external speech-to-text capability, seen as an opaque, stateless
/// service: `recognize(segment) -> text | not-understood | error`.
///
/// A trait seam so the orchestrator can be exercised against test doubles
/// without the network.
#[async_trait]
pub trait SpeechService: Send + Sync {
    async fn recognize(&self, segment: &RecognizableSegment) -> AppResult<String>;
}

/// HTTP client for the Google speech recognition API.
///
/// Stateless and reentrant; constructed once at startup and shared across
/// all concurrent requests.
pub struct GoogleSpeechClient {
    http: reqwest::Client,
    endpoint: String,
    language: String,
    api_key: String,
}

impl GoogleSpeechClient {
    pub fn new(config: &RecognitionConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            language: config.language.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl SpeechService for GoogleSpeechClient {
    async fn recognize(&self, segment: &RecognizableSegment) -> AppResult<String> {
        // A recording shorter than the calibration window leaves nothing to
        // submit; that is silence, not a system fault.
        if segment.is_empty() {
            return Err(AppError::Unrecognized);
        }

        let url = format!(
            "{}?client=chromium&lang={}&key={}",
            self.endpoint, self.language, self.api_key
        );

        debug!(
            duration_secs = segment.duration_secs(),
            sample_rate = segment.sample_rate,
            "submitting segment for recognition"
        );

        let response = self
            .http
            .post(&url)
            .header(
                CONTENT_TYPE,
                format!("audio/l16; rate={}", segment.sample_rate),
            )
            .body(segment.pcm_bytes())
            .send()
            .await
            .map_err(|e| AppError::ServiceUnavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::ServiceUnavailable(format!(
                "service returned {}",
                status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::ServiceUnavailable(format!("invalid response: {}", e)))?;

        match parse_transcript(&body) {
            Some(text) => Ok(text),
            None => Err(AppError::Unrecognized),
        }
    }
}

/// Extract the first transcript from the service's newline-delimited JSON
/// response.
///
/// The service streams one JSON object per line; the first line is usually an
/// empty `{"result":[]}` placeholder, with the real result following:
///
/// ```text
/// {"result":[]}
/// {"result":[{"alternative":[{"transcript":"hello world","confidence":0.98}],"final":true}],"result_index":0}
/// ```
///
/// Returns `None` when no line carries a transcript — the service understood
/// nothing.
fn parse_transcript(body: &str) -> Option<String> {
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let value: serde_json::Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(_) => continue,
        };

        let transcript = value
            .get("result")
            .and_then(|results| results.as_array())
            .and_then(|results| {
                results.iter().find_map(|result| {
                    result
                        .get("alternative")
                        .and_then(|alts| alts.as_array())
                        .and_then(|alts| alts.first())
                        .and_then(|alt| alt.get("transcript"))
                        .and_then(|t| t.as_str())
                })
            });

        if let Some(text) = transcript {
            let text = text.trim();
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
    }

    None
}
