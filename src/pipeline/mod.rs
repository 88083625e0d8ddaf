//! # Pipeline Orchestrator
//!
//! Sequences the transcription stages and owns the cleanup contract:
//!
//! ```text
//! Received → Decoded → InputTranscoded → OutputValidated → Recognized → Responded
//! ```
//!
//! Linear with failure short-circuit: any stage failure goes straight to the
//! response carrying its error tag, and both transient artifacts are released
//! on that transition regardless of which stage failed. There is no retry
//! loop and no backward transition — callers needing retry issue a new
//! request.
//!
//! The pipeline object is stateless and reentrant: one shared instance serves
//! all concurrent requests, which share nothing but read-only configuration.

pub mod artifact;

use crate::audio::decoder::decode_audio_payload;
use crate::audio::transcoder::Transcoder;
use crate::error::{AppError, AppResult};
use crate::recognition::segment::extract_segment;
use crate::recognition::SpeechService;
use artifact::TransientArtifact;
use std::sync::Arc;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

/// The transcription request pipeline: decode → transcode → recognize.
pub struct TranscriptionPipeline {
    transcoder: Transcoder,
    recognizer: Arc<dyn SpeechService>,
}

impl TranscriptionPipeline {
    pub fn new(transcoder: Transcoder, recognizer: Arc<dyn SpeechService>) -> Self {
        Self {
            transcoder,
            recognizer,
        }
    }

    /// Run one request through the full pipeline.
    ///
    /// Returns the transcript on success; every failure is a tagged
    /// [`AppError`]. Both transient artifacts are released before this
    /// function returns, on every path (their `Drop` impls additionally
    /// cover unwinds and cancellation).
    pub async fn transcribe(&self, payload: &str) -> AppResult<String> {
        let request_id = Uuid::new_v4();
        let span = info_span!("transcription", request_id = %request_id);

        async {
            // Decoding touches no files; artifacts are acquired only once
            // there are bytes worth writing.
            let audio = decode_audio_payload(payload)?;
            debug!(bytes = audio.len(), "decoded audio payload");

            let mut input = TransientArtifact::acquire(".webm")?;
            let mut output = TransientArtifact::acquire(".wav")?;

            let result = self.run_stages(&input, &output, &audio).await;

            input.release();
            output.release();

            match &result {
                Ok(text) => info!(chars = text.len(), "transcription completed"),
                Err(err) => info!(error = %err, "transcription failed"),
            }

            result
        }
        .instrument(span)
        .await
    }

    /// The file-touching stages, separated so the caller can release both
    /// artifacts no matter where this short-circuits.
    async fn run_stages(
        &self,
        input: &TransientArtifact,
        output: &TransientArtifact,
        audio: &[u8],
    ) -> AppResult<String> {
        tokio::fs::write(input.path(), audio)
            .await
            .map_err(|e| AppError::Internal(format!("could not write audio to disk: {}", e)))?;

        self.transcoder.transcode(input.path(), output.path()).await?;

        let wav = tokio::fs::read(output.path())
            .await
            .map_err(|e| AppError::Internal(format!("could not read converted audio: {}", e)))?;

        let segment = extract_segment(&wav)?;
        debug!(
            samples = segment.samples.len(),
            energy_threshold = segment.energy_threshold,
            "extracted recognizable segment"
        );

        self.recognizer.recognize(&segment).await
    }
}
