//! Request and response bodies for the API endpoints.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/transcribe/audio`.
///
/// `audio` is a base64 encoding of a binary audio container, optionally
/// carried in data-URL form (`data:audio/webm;base64,<data>`). Missing and
/// null are treated the same as an empty payload.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscribeRequest {
    #[serde(default)]
    pub audio: Option<String>,
}

/// Successful transcription response.
#[derive(Debug, Clone, Serialize)]
pub struct TranscribeResponse {
    pub success: bool,
    pub text: String,
}

/// Body of `POST /api/keywords/highlight`.
#[derive(Debug, Clone, Deserialize)]
pub struct HighlightRequest {
    pub transcript: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Successful highlight response.
#[derive(Debug, Clone, Serialize)]
pub struct HighlightResponse {
    pub success: bool,
    pub highlighted: String,
}
