//! # Recognizable Segment Extraction
//!
//! Pure functions over the transcoded waveform bytes. The first half second
//! of the recording is treated as an ambient-noise calibration window: its
//! energy sets the threshold the recognition request is tuned with, and the
//! remainder of the samples form the segment actually submitted.
//!
//! Operating on bytes (rather than a live audio source) keeps this stage
//! deterministic and testable; the live-microphone dictation variant is a
//! separate collaborator that supplies segments continuously.

use crate::error::{AppError, AppResult};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read, Seek, SeekFrom};

/// Length of the ambient-noise calibration window, in seconds.
pub const CALIBRATION_WINDOW_SECS: f64 = 0.5;

/// Default energy threshold used when the calibration window is silent or
/// absent.
const DEFAULT_ENERGY_THRESHOLD: f64 = 300.0;

/// Multiplier applied to the calibration window's RMS energy.
const ENERGY_THRESHOLD_FACTOR: f64 = 1.5;

/// The portion of a recording submitted for recognition, together with the
/// parameters derived during calibration.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizableSegment {
    /// 16-bit mono PCM samples following the calibration window.
    pub samples: Vec<i16>,
    /// Sample rate of the waveform in Hz.
    pub sample_rate: u32,
    /// Energy level below which the service should treat audio as ambient
    /// noise, derived from the calibration window.
    pub energy_threshold: f64,
}

impl RecognizableSegment {
    /// Raw little-endian PCM bytes, the `audio/l16` wire form.
    pub fn pcm_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.samples.len() * 2);
        for &sample in &self.samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        bytes
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Extract the recognizable segment from a transcoded WAV container.
///
/// The waveform is expected to be the transcoder's fixed output form
/// (16-bit mono PCM); anything else indicates a fault on our side of the
/// pipeline, not the client's.
pub fn extract_segment(wav: &[u8]) -> AppResult<RecognizableSegment> {
    let (samples, sample_rate) = parse_wav_mono16(wav)?;

    let window = (sample_rate as f64 * CALIBRATION_WINDOW_SECS) as usize;
    let (calibration, speech) = if samples.len() > window {
        samples.split_at(window)
    } else {
        // Recording shorter than the calibration window: everything is
        // ambient, nothing is left to recognize.
        (&samples[..], &[][..])
    };

    Ok(RecognizableSegment {
        samples: speech.to_vec(),
        sample_rate,
        energy_threshold: calibrate_energy(calibration),
    })
}

/// Derive the ambient-noise energy threshold from the calibration window.
fn calibrate_energy(samples: &[i16]) -> f64 {
    if samples.is_empty() {
        return DEFAULT_ENERGY_THRESHOLD;
    }

    let sum_of_squares: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    let rms = (sum_of_squares / samples.len() as f64).sqrt();

    (rms * ENERGY_THRESHOLD_FACTOR).max(DEFAULT_ENERGY_THRESHOLD)
}

/// Parse a RIFF/WAVE container holding 16-bit mono PCM.
fn parse_wav_mono16(bytes: &[u8]) -> AppResult<(Vec<i16>, u32)> {
    let mut cursor = Cursor::new(bytes);

    let mut riff = [0u8; 4];
    cursor
        .read_exact(&mut riff)
        .map_err(|_| invalid_wav("truncated header"))?;
    if &riff != b"RIFF" {
        return Err(invalid_wav("missing RIFF header"));
    }

    cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| invalid_wav("truncated header"))?;

    let mut wave = [0u8; 4];
    cursor
        .read_exact(&mut wave)
        .map_err(|_| invalid_wav("truncated header"))?;
    if &wave != b"WAVE" {
        return Err(invalid_wav("not a WAVE container"));
    }

    let mut sample_rate = None;
    let mut data: Option<Vec<u8>> = None;

    // Walk chunks until both fmt and data have been seen.
    loop {
        let mut chunk_id = [0u8; 4];
        if cursor.read_exact(&mut chunk_id).is_err() {
            break;
        }
        let chunk_len = cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| invalid_wav("truncated chunk header"))? as u64;

        match &chunk_id {
            b"fmt " => {
                let audio_format = cursor
                    .read_u16::<LittleEndian>()
                    .map_err(|_| invalid_wav("truncated fmt chunk"))?;
                let channels = cursor
                    .read_u16::<LittleEndian>()
                    .map_err(|_| invalid_wav("truncated fmt chunk"))?;
                let rate = cursor
                    .read_u32::<LittleEndian>()
                    .map_err(|_| invalid_wav("truncated fmt chunk"))?;
                cursor
                    .seek(SeekFrom::Current(6))
                    .map_err(|_| invalid_wav("truncated fmt chunk"))?;
                let bits = cursor
                    .read_u16::<LittleEndian>()
                    .map_err(|_| invalid_wav("truncated fmt chunk"))?;

                if audio_format != 1 || bits != 16 {
                    return Err(invalid_wav("expected 16-bit PCM"));
                }
                if channels != 1 {
                    return Err(invalid_wav("expected mono audio"));
                }

                // Skip any fmt extension.
                if chunk_len > 16 {
                    cursor
                        .seek(SeekFrom::Current((chunk_len - 16) as i64))
                        .map_err(|_| invalid_wav("truncated fmt chunk"))?;
                }
                sample_rate = Some(rate);
            }
            b"data" => {
                let mut buf = vec![0u8; chunk_len as usize];
                cursor
                    .read_exact(&mut buf)
                    .map_err(|_| invalid_wav("truncated data chunk"))?;
                data = Some(buf);
            }
            _ => {
                // Unrelated chunk (LIST, fact, ...): skip it.
                cursor
                    .seek(SeekFrom::Current(chunk_len as i64))
                    .map_err(|_| invalid_wav("truncated chunk"))?;
            }
        }

        // Chunks are word-aligned; odd lengths carry a pad byte.
        if chunk_len % 2 == 1 {
            let _ = cursor.seek(SeekFrom::Current(1));
        }

        if sample_rate.is_some() && data.is_some() {
            break;
        }
    }

    let sample_rate = sample_rate.ok_or_else(|| invalid_wav("missing fmt chunk"))?;
    let data = data.ok_or_else(|| invalid_wav("missing data chunk"))?;

    let mut samples = Vec::with_capacity(data.len() / 2);
    let mut reader = Cursor::new(data);
    while let Ok(sample) = reader.read_i16::<LittleEndian>() {
        samples.push(sample);
    }

    Ok((samples, sample_rate))
}

fn invalid_wav(detail: &str) -> AppError {
    AppError::Internal(format!("converted waveform is invalid: {}", detail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::io::Write;

    fn wav_bytes(samples: &[i16], sample_rate: u32, channels: u16, bits: u16) -> Vec<u8> {
        let data_len = (samples.len() * 2) as u32;
        let mut out = Vec::new();
        out.write_all(b"RIFF").unwrap();
        out.write_u32::<LittleEndian>(36 + data_len).unwrap();
        out.write_all(b"WAVE").unwrap();
        out.write_all(b"fmt ").unwrap();
        out.write_u32::<LittleEndian>(16).unwrap();
        out.write_u16::<LittleEndian>(1).unwrap();
        out.write_u16::<LittleEndian>(channels).unwrap();
        out.write_u32::<LittleEndian>(sample_rate).unwrap();
        out.write_u32::<LittleEndian>(sample_rate * u32::from(channels) * 2)
            .unwrap();
        out.write_u16::<LittleEndian>(channels * 2).unwrap();
        out.write_u16::<LittleEndian>(bits).unwrap();
        out.write_all(b"data").unwrap();
        out.write_u32::<LittleEndian>(data_len).unwrap();
        for &sample in samples {
            out.write_i16::<LittleEndian>(sample).unwrap();
        }
        out
    }

    #[test]
    fn test_segment_excludes_calibration_window() {
        // 0.5s of quiet calibration, 1s of loud speech at 16 kHz.
        let mut samples = vec![10i16; 8_000];
        samples.extend(vec![9_000i16; 16_000]);
        let wav = wav_bytes(&samples, 16_000, 1, 16);

        let segment = extract_segment(&wav).unwrap();
        assert_eq!(segment.sample_rate, 16_000);
        assert_eq!(segment.samples.len(), 16_000);
        assert!(segment.samples.iter().all(|&s| s == 9_000));
        assert!((segment.duration_secs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_quiet_calibration_uses_default_threshold() {
        let mut samples = vec![0i16; 8_000];
        samples.extend(vec![5_000i16; 8_000]);
        let wav = wav_bytes(&samples, 16_000, 1, 16);

        let segment = extract_segment(&wav).unwrap();
        assert_eq!(segment.energy_threshold, 300.0);
    }

    #[test]
    fn test_noisy_calibration_raises_threshold() {
        let mut samples = vec![2_000i16; 8_000];
        samples.extend(vec![8_000i16; 8_000]);
        let wav = wav_bytes(&samples, 16_000, 1, 16);

        let segment = extract_segment(&wav).unwrap();
        // RMS of a constant 2000 signal is 2000; threshold is 1.5x that.
        assert!((segment.energy_threshold - 3_000.0).abs() < 1.0);
    }

    #[test]
    fn test_recording_shorter_than_window_yields_empty_segment() {
        let samples = vec![1_000i16; 4_000]; // 0.25s at 16 kHz
        let wav = wav_bytes(&samples, 16_000, 1, 16);

        let segment = extract_segment(&wav).unwrap();
        assert!(segment.is_empty());
    }

    #[test]
    fn test_pcm_bytes_little_endian() {
        let segment = RecognizableSegment {
            samples: vec![1, -2],
            sample_rate: 16_000,
            energy_threshold: 300.0,
        };
        assert_eq!(segment.pcm_bytes(), vec![0x01, 0x00, 0xFE, 0xFF]);
    }

    #[test]
    fn test_rejects_non_wav_bytes() {
        assert!(extract_segment(b"definitely not a wav").is_err());
        assert!(extract_segment(&[]).is_err());
    }

    #[test]
    fn test_rejects_stereo_waveform() {
        let samples = vec![0i16; 16_000];
        let wav = wav_bytes(&samples, 16_000, 2, 16);
        assert!(matches!(
            extract_segment(&wav),
            Err(AppError::Internal(_))
        ));
    }
}
