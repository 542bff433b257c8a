//! Audio normalization for the analysis pipeline
//!
//! Transcription and emotion classification both expect a mono 16 kHz
//! waveform; this module produces it from whatever container the browser
//! uploaded, by shelling out to ffmpeg.

mod normalizer;

pub use normalizer::{AudioNormalizer, FfmpegNormalizer, NormalizedAudio};
