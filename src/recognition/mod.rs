//! # Speech Recognition
//!
//! The final pipeline stage: turning the normalized waveform into text by
//! delegating to an external speech-to-text service.
//!
//! Split in two: [`segment`] is the pure waveform-to-segment preparation
//! (ambient-noise calibration over bytes, no device abstraction), and
//! [`client`] is the network capability that actually submits the segment.

pub mod client;
pub mod segment;

pub use client::{GoogleSpeechClient, SpeechService};
