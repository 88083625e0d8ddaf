//! # Audio Input Handling
//!
//! Untrusted-payload decoding and external-process transcoding: the two
//! stages that turn a browser recording into the normalized waveform the
//! recognition service expects.

pub mod decoder;
pub mod transcoder;

pub use decoder::decode_audio_payload;
pub use transcoder::Transcoder;
