//! # Playback Module
//!
//! Turns audio content into something the page can capture.
//!
//! ## Overview
//!
//! This crate handles:
//! - Content preparation: bytes, blobs and text become a playable fallback
//!   resource plus, when decoding succeeds, in-memory PCM
//! - Audio decoding through a pluggable decoder; symphonia in process by
//!   default
//! - The playback graph: one lazily created audio context whose capture
//!   destination is the virtual microphone's stream
//! - Request generations, so a slow stale request never clobbers a newer one

pub mod decoder;
pub mod error;
pub mod generation;
pub mod graph;
pub mod payload;
pub mod preparer;

pub use decoder::{FormatDetector, SymphoniaDecoder};
pub use error::{PlaybackError, Result};
pub use generation::{RequestGenerations, RequestTicket};
pub use graph::{GraphState, PlaybackGraph, PlaybackOutcome};
pub use payload::{FallbackSource, PlayableFallback, PreparedContent};
pub use preparer::ContentPreparer;
pub use bridge_traits::playback::AudioDecoder;
