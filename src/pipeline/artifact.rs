//! # Transient Artifacts
//!
//! Request-scoped temporary files used to pass audio between pipeline stages.
//! Every artifact created during a request must be deleted before the
//! request's response is returned, on every control path — leaked temp files
//! under sustained failure traffic are the primary operational risk of this
//! pipeline.
//!
//! Deletion is guaranteed two ways: the orchestrator calls [`release`] on
//! every exit path, and `Drop` covers anything that unwinds or is cancelled
//! before it gets there. Repeated release is a no-op, never an error.
//!
//! [`release`]: TransientArtifact::release

use crate::error::{AppError, AppResult};
use std::path::Path;
use tempfile::{Builder, TempPath};

/// Prefix given to every artifact file name; keeps our files recognizable in
/// the shared temp directory and lets tests snapshot them.
pub const ARTIFACT_PREFIX: &str = "transcribe-";

/// A uniquely named temporary file with a deletion obligation.
///
/// Created empty, written once, read once, deleted exactly once. Uniqueness
/// of the generated name is what lets concurrent requests share the temp
/// namespace without locks.
#[derive(Debug)]
pub struct TransientArtifact {
    // None once released; TempPath deletes the file when dropped.
    path: Option<TempPath>,
}

impl TransientArtifact {
    /// Create a uniquely named empty file with the given suffix
    /// (e.g. `".webm"`, `".wav"`).
    pub fn acquire(suffix: &str) -> AppResult<Self> {
        let file = Builder::new()
            .prefix(ARTIFACT_PREFIX)
            .suffix(suffix)
            .tempfile()
            .map_err(|e| AppError::Internal(format!("could not create temporary file: {}", e)))?;

        Ok(Self {
            path: Some(file.into_temp_path()),
        })
    }

    /// Path of the underlying file, valid until release.
    ///
    /// Panics only if called after release, which would be an orchestrator
    /// bug — the pipeline releases strictly after its last read.
    pub fn path(&self) -> &Path {
        self.path
            .as_ref()
            .expect("artifact used after release")
    }

    /// Delete the file if it still exists. Idempotent: releasing an already
    /// released artifact is a no-op.
    pub fn release(&mut self) {
        if let Some(path) = self.path.take() {
            // Best-effort close; the file may already be gone.
            let _ = path.close();
        }
    }
}
