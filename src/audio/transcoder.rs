//! # Transcoder Invoker
//!
//! Drives the external transcoding process (ffmpeg) that normalizes whatever
//! container the browser recorded into the fixed waveform the recognition
//! service is calibrated for: 16 kHz, mono, WAV.
//!
//! ## Failure modes handled here:
//! - the process exceeds the wall-clock timeout (it is killed; no partial
//!   output is trusted)
//! - the process exits non-zero (its diagnostic stream is filtered and
//!   truncated into a reportable detail)
//! - the process exits zero but the output artifact is missing or empty
//!   (a successful exit code alone is not evidence of success)

use crate::config::TranscodeConfig;
use crate::error::{AppError, AppResult};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Maximum length of the diagnostic detail reported on conversion failure.
const MAX_DIAGNOSTIC_CHARS: usize = 200;

/// Number of trailing substantive stderr lines retained in the detail.
const DIAGNOSTIC_TAIL_LINES: usize = 3;

/// Invoker for the external transcoding process.
///
/// Stateless apart from configuration; one instance serves all concurrent
/// requests.
#[derive(Debug, Clone)]
pub struct Transcoder {
    config: TranscodeConfig,
}

impl Transcoder {
    pub fn new(config: TranscodeConfig) -> Self {
        Self { config }
    }

    /// Transcode `input` into `output`, blocking (asynchronously) until the
    /// process exits or the configured timeout elapses.
    ///
    /// The child is spawned with `kill_on_drop`, so when the wait future is
    /// dropped on timeout the process is torn down rather than left running.
    pub async fn transcode(&self, input: &Path, output: &Path) -> AppResult<()> {
        let mut command = Command::new(&self.config.ffmpeg_path);
        command
            .arg("-i")
            .arg(input)
            .args(["-ar", &self.config.sample_rate_hz.to_string()])
            .args(["-ac", &self.config.channels.to_string()])
            .args(["-f", &self.config.container_format])
            .arg("-y") // Overwrite the pre-acquired output artifact
            .args(["-loglevel", "error"])
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(input = %input.display(), output = %output.display(), "starting transcode");

        let child = command.spawn().map_err(|e| {
            AppError::Conversion(format!(
                "could not start {}: {}",
                self.config.ffmpeg_path, e
            ))
        })?;

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let process_output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => {
                result.map_err(|e| AppError::Conversion(format!("process wait failed: {}", e)))?
            }
            Err(_elapsed) => {
                // The dropped wait future kills the child via kill_on_drop.
                warn!(timeout_secs = self.config.timeout_secs, "transcode timed out");
                return Err(AppError::Conversion(format!(
                    "timed out after {} seconds",
                    self.config.timeout_secs
                )));
            }
        };

        if !process_output.status.success() {
            let stderr = String::from_utf8_lossy(&process_output.stderr);
            warn!(status = %process_output.status, "transcode process failed");
            return Err(AppError::Conversion(summarize_diagnostics(&stderr)));
        }

        // Validate the produced artifact: existence and non-zero size.
        match tokio::fs::metadata(output).await {
            Ok(meta) if meta.len() > 0 => Ok(()),
            _ => Err(AppError::Conversion("Output file is empty".to_string())),
        }
    }
}

/// Condense a transcoder diagnostic stream into a reportable detail.
///
/// Drops blank lines and version/banner noise, keeps at most the last
/// [`DIAGNOSTIC_TAIL_LINES`] substantive lines, and truncates the combined
/// message to [`MAX_DIAGNOSTIC_CHARS`] characters.
pub fn summarize_diagnostics(stderr: &str) -> String {
    let substantive: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty() && !line.contains("ffmpeg version") && !line.contains("Copyright")
        })
        .collect();

    if substantive.is_empty() {
        return "Unknown conversion error".to_string();
    }

    let tail_start = substantive.len().saturating_sub(DIAGNOSTIC_TAIL_LINES);
    let message = substantive[tail_start..].join("\n");

    if message.chars().count() > MAX_DIAGNOSTIC_CHARS {
        message.chars().take(MAX_DIAGNOSTIC_CHARS).collect()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    /// Write an executable shell script that stands in for the transcoder.
    fn fake_transcoder(dir: &TempDir, body: &str) -> String {
        let path = dir.path().join("fake-ffmpeg");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn transcoder_with(program: String, timeout_secs: u64) -> Transcoder {
        Transcoder::new(TranscodeConfig {
            ffmpeg_path: program,
            sample_rate_hz: 16_000,
            channels: 1,
            container_format: "wav".to_string(),
            timeout_secs,
        })
    }

    #[test]
    fn test_diagnostics_filter_banner_and_keep_tail() {
        let stderr = "\
ffmpeg version 6.1.1 Copyright (c) 2000-2023 the FFmpeg developers
  built with gcc 13

error line one
error line two
error line three
error line four
error line five";
        let summary = summarize_diagnostics(stderr);
        assert_eq!(
            summary,
            "error line three\nerror line four\nerror line five"
        );
        assert!(summary.chars().count() <= MAX_DIAGNOSTIC_CHARS);
    }

    #[test]
    fn test_diagnostics_truncated_to_limit() {
        let long_line = "x".repeat(500);
        let summary = summarize_diagnostics(&long_line);
        assert_eq!(summary.chars().count(), MAX_DIAGNOSTIC_CHARS);
    }

    #[test]
    fn test_diagnostics_empty_stream() {
        assert_eq!(summarize_diagnostics(""), "Unknown conversion error");
        let banner_only = "ffmpeg version 6.1.1\nCopyright (c) 2000-2023\n\n";
        assert_eq!(summarize_diagnostics(banner_only), "Unknown conversion error");
    }

    #[tokio::test]
    async fn test_nonzero_exit_reports_conversion_error() {
        let dir = TempDir::new().unwrap();
        let program = fake_transcoder(&dir, "echo 'input.webm: Invalid data' >&2; exit 1");
        let transcoder = transcoder_with(program, 5);

        let input = dir.path().join("in.webm");
        let output = dir.path().join("out.wav");
        std::fs::write(&input, b"junk").unwrap();

        let result = transcoder.transcode(&input, &output).await;
        match result {
            Err(AppError::Conversion(detail)) => assert!(detail.contains("Invalid data")),
            other => panic!("expected Conversion error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_zero_exit_with_empty_output_is_conversion_error() {
        let dir = TempDir::new().unwrap();
        // Exits cleanly without writing anything.
        let program = fake_transcoder(&dir, "exit 0");
        let transcoder = transcoder_with(program, 5);

        let input = dir.path().join("in.webm");
        let output = dir.path().join("out.wav");
        std::fs::write(&input, b"junk").unwrap();

        let result = transcoder.transcode(&input, &output).await;
        assert_eq!(
            result,
            Err(AppError::Conversion("Output file is empty".to_string()))
        );
    }

    #[tokio::test]
    async fn test_timeout_kills_process() {
        let dir = TempDir::new().unwrap();
        // Record our pid, then hang well past the timeout.
        let program = fake_transcoder(&dir, "echo $$ > \"$(dirname \"$0\")/pid\"; sleep 30");
        let transcoder = transcoder_with(program, 1);

        let input = dir.path().join("in.webm");
        let output = dir.path().join("out.wav");
        std::fs::write(&input, b"junk").unwrap();

        let result = transcoder.transcode(&input, &output).await;
        match result {
            Err(AppError::Conversion(detail)) => assert!(detail.contains("timed out")),
            other => panic!("expected Conversion error, got {:?}", other),
        }

        // Give the runtime a moment to reap, then verify the process is gone.
        tokio::time::sleep(Duration::from_millis(200)).await;
        let pid = std::fs::read_to_string(dir.path().join("pid"))
            .unwrap()
            .trim()
            .to_string();
        assert!(
            !std::path::Path::new(&format!("/proc/{}", pid)).exists()
                || std::fs::read_to_string(format!("/proc/{}/stat", pid))
                    .map(|s| s.contains(") Z "))
                    .unwrap_or(true),
            "transcoder process {} still running after timeout",
            pid
        );
    }

    #[tokio::test]
    async fn test_successful_transcode_validates_output() {
        let dir = TempDir::new().unwrap();
        // Shell-script transcoder: write to the output path (the last arg).
        let program = fake_transcoder(&dir, "for last; do :; done; printf 'RIFF' > \"$last\"");
        let transcoder = transcoder_with(program, 5);

        let input = dir.path().join("in.webm");
        let output = dir.path().join("out.wav");
        std::fs::write(&input, b"junk").unwrap();

        assert!(transcoder.transcode(&input, &output).await.is_ok());
        assert!(output.exists());
    }

    #[tokio::test]
    async fn test_missing_executable_is_conversion_error() {
        let dir = TempDir::new().unwrap();
        let transcoder = transcoder_with("/nonexistent/ffmpeg".to_string(), 5);

        let input = dir.path().join("in.webm");
        let output = dir.path().join("out.wav");
        std::fs::write(&input, b"junk").unwrap();

        assert!(matches!(
            transcoder.transcode(&input, &output).await,
            Err(AppError::Conversion(_))
        ));
    }
}
