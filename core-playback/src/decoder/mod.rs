//! # Audio Decoder Module
//!
//! One-shot decoding of in-memory audio using the Symphonia library.
//!
//! ## Supported Formats
//!
//! Everything Symphonia's `all` feature bundles: WAV/PCM, MP3, AAC/M4A,
//! Ogg Vorbis, Opus-in-Ogg (container only), FLAC, ALAC, AIFF, MKV/WebM.
//!
//! ## Architecture
//!
//! ```text
//! Bytes → Cursor → MediaSourceStream → FormatReader → Decoder → DecodedAudio
//! ```
//!
//! [`FormatDetector`] turns MIME hints and magic bytes into probe hints; the
//! preparer also uses it to type object URLs when the caller gave no MIME.

mod format_detector;
mod symphonia;

pub use self::symphonia::SymphoniaDecoder;
pub use format_detector::FormatDetector;
