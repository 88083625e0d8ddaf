//! # Audio Payload Decoder
//!
//! Turns the textual audio payload sent by the browser into raw container
//! bytes. The frontend records with MediaRecorder and ships the clip as a
//! data URL (`data:audio/webm;base64,<data>`) or as bare base64; both forms
//! are accepted.
//!
//! Pure transformation — no side effects. Every failure here is an input
//! error the client has to correct.

use crate::error::{AppError, AppResult};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Minimum decoded size in bytes. Anything below this is a certainly
/// truncated recording, not a real audio container.
pub const MIN_AUDIO_BYTES: usize = 1000;

/// Decode a (possibly data-URL-prefixed) base64 audio payload.
///
/// When the payload contains a comma, only the substring after the first
/// comma is treated as data; everything before it is the media-type
/// declaration (`data:audio/webm;base64`).
pub fn decode_audio_payload(payload: &str) -> AppResult<Vec<u8>> {
    if payload.trim().is_empty() {
        return Err(AppError::Input("No audio data provided".to_string()));
    }

    let encoded = match payload.split_once(',') {
        Some((_media_type, data)) => data,
        None => payload,
    };

    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| AppError::Input(format!("Invalid audio data format: {}", e)))?;

    if bytes.len() < MIN_AUDIO_BYTES {
        return Err(AppError::Input(
            "Audio data too small. Please record longer audio.".to_string(),
        ));
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(bytes: &[u8]) -> String {
        BASE64.encode(bytes)
    }

    #[test]
    fn test_empty_payload_rejected() {
        assert_eq!(
            decode_audio_payload(""),
            Err(AppError::Input("No audio data provided".to_string()))
        );
        assert!(matches!(
            decode_audio_payload("   "),
            Err(AppError::Input(_))
        ));
    }

    #[test]
    fn test_invalid_encoding_rejected() {
        let result = decode_audio_payload("not!!valid@@base64");
        match result {
            Err(AppError::Input(msg)) => assert!(msg.starts_with("Invalid audio data format")),
            other => panic!("expected Input error, got {:?}", other),
        }
    }

    /// Payloads under the minimum size are rejected regardless of content.
    #[test]
    fn test_too_small_payload_rejected() {
        for len in [1usize, 10, 500, MIN_AUDIO_BYTES - 1] {
            let payload = encode(&vec![0x42u8; len]);
            assert_eq!(
                decode_audio_payload(&payload),
                Err(AppError::Input(
                    "Audio data too small. Please record longer audio.".to_string()
                )),
                "payload of {} bytes should be rejected",
                len
            );
        }
    }

    #[test]
    fn test_minimum_size_accepted() {
        let bytes = vec![0x42u8; MIN_AUDIO_BYTES];
        let decoded = decode_audio_payload(&encode(&bytes)).unwrap();
        assert_eq!(decoded, bytes);
    }

    /// Stripping a data-URL prefix yields the same bytes as decoding the
    /// equivalent unprefixed payload.
    #[test]
    fn test_data_url_prefix_equivalence() {
        let bytes: Vec<u8> = (0..2000u32).map(|i| (i % 251) as u8).collect();
        let bare = encode(&bytes);
        let prefixed = format!("data:audio/webm;base64,{}", bare);

        let from_bare = decode_audio_payload(&bare).unwrap();
        let from_prefixed = decode_audio_payload(&prefixed).unwrap();
        assert_eq!(from_bare, from_prefixed);
        assert_eq!(from_prefixed, bytes);
    }

    /// Media-type declarations with codec parameters still strip cleanly.
    #[test]
    fn test_prefix_with_codec_parameters() {
        let bytes = vec![0x07u8; 1500];
        let payload = format!("data:audio/ogg;codecs=opus;base64,{}", encode(&bytes));
        assert_eq!(decode_audio_payload(&payload).unwrap(), bytes);
    }
}
