//! # Transcription Endpoint
//!
//! `POST /api/transcribe/audio` — hands the payload to the pipeline and
//! shapes its outcome into the response contract. All error classification
//! lives in [`crate::error`]; this handler only tracks the active-request
//! counter and forwards the tagged result.

use crate::error::AppError;
use crate::handlers::models::{TranscribeRequest, TranscribeResponse};
use crate::state::AppState;
use actix_web::{web, HttpResponse};

pub async fn transcribe_audio(
    state: web::Data<AppState>,
    body: web::Json<TranscribeRequest>,
) -> Result<HttpResponse, AppError> {
    let payload = body
        .into_inner()
        .audio
        .ok_or_else(|| AppError::Input("No audio data provided".to_string()))?;

    state.increment_active_transcriptions();
    let result = state.pipeline.transcribe(&payload).await;
    state.decrement_active_transcriptions();

    let text = result?;

    Ok(HttpResponse::Ok().json(TranscribeResponse {
        success: true,
        text,
    }))
}
