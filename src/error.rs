//! # Error Handling
//!
//! This module defines the error taxonomy for the transcription pipeline and
//! how each class is converted into an HTTP response.
//!
//! ## Error Taxonomy:
//! - **Input**: the client sent a malformed, absent, or too-small payload (400)
//! - **Conversion**: the external transcoding tool failed, timed out, or
//!   produced an empty file (500)
//! - **Unrecognized**: processing completed but no speech was detected — a
//!   legitimate terminal state, not a system fault (200 with `success: false`)
//! - **ServiceUnavailable**: the external recognition service was unreachable
//!   or rejected the request; the caller may retry later (503)
//! - **Internal**: anything we could not classify (500)
//!
//! ## Response Format:
//! All failures share one JSON envelope so the frontend can treat them
//! uniformly:
//! ```json
//! { "success": false, "error": "Audio data too small. Please record longer audio." }
//! ```
//! `Unrecognized` deliberately rides on a 2xx status: silence or unintelligible
//! speech is expected input, and calling UIs need to distinguish "try again"
//! from "something broke".

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use std::fmt;

/// Tagged outcome classes for a transcription request.
///
/// Exactly one variant describes any given failure; a request never carries
/// both a success text and an error detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Malformed, absent, or below-minimum-size audio payload.
    Input(String),

    /// Transcoding-tool failure, timeout, or empty output artifact.
    Conversion(String),

    /// Valid processing, but the recognition service understood nothing.
    Unrecognized,

    /// The external recognition dependency failed or was unreachable.
    ServiceUnavailable(String),

    /// Any uncategorized failure.
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Input(msg) => write!(f, "{}", msg),
            AppError::Conversion(msg) => write!(f, "Audio conversion failed: {}", msg),
            AppError::Unrecognized => write!(f, "Could not understand the audio"),
            AppError::ServiceUnavailable(msg) => {
                write!(f, "Speech recognition service error: {}", msg)
            }
            AppError::Internal(msg) => write!(f, "Server error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Conversion of pipeline errors into HTTP responses.
///
/// ## Status Code Mapping:
/// - Input → 400 (client must correct the payload)
/// - Conversion / Internal → 500
/// - ServiceUnavailable → 503 (explicitly retryable)
/// - Unrecognized → 200 with `success: false` (softer failure)
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Input(_) => StatusCode::BAD_REQUEST,
            AppError::Conversion(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unrecognized => StatusCode::OK,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": self.to_string(),
        }))
    }
}

/// Startup-path failures (config loading, client construction) use anyhow;
/// anything that leaks into a request path becomes an internal error.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Shorthand for `Result<T, AppError>`, used throughout the pipeline.
pub type AppResult<T> = Result<T, AppError>;
