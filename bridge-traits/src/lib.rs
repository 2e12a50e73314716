//! # Host Bridge Traits
//!
//! Platform abstraction traits that each host must implement for the virtual
//! microphone engine.
//!
//! ## Overview
//!
//! The engine never talks to browser APIs directly. Everything it needs from
//! the page (an audio graph, object URLs, the device API, the control channel,
//! a speech fetcher) is expressed here as a trait or a plain data type, and a
//! host crate supplies the concrete adapters.
//!
//! ## Traits
//!
//! ### Audio
//! - [`AudioBackend`](audio_graph::AudioBackend) - Context and hidden element factory
//! - [`AudioContext`](audio_graph::AudioContext) - Capture destination, buffers, source nodes
//! - [`ObjectUrlRegistry`](audio_graph::ObjectUrlRegistry) - Byte blob URL handles
//! - [`BlobHandle`](playback::BlobHandle) - Asynchronously readable platform blob
//! - [`AudioDecoder`](playback::AudioDecoder) - Encoded bytes to PCM without blocking the page
//!
//! ### Devices
//! - [`MediaDevices`](devices::MediaDevices) - Enumeration and acquisition entry points
//! - [`MediaDevicesSlot`](devices::MediaDevicesSlot) - Where those entry points live
//! - [`CaptureStreamSource`](devices::CaptureStreamSource) - Read access to the capture stream
//!
//! ### Host integration
//! - [`SpeechFetcher`](fetch::SpeechFetcher) - Text-to-speech bytes from a privileged context
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to the host
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Web      | `bridge-wasm`       | ✅ In Progress |
//! | Tests    | `bridge-traits` (`mock` feature) | ✅ |
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Adapters
//! convert platform exceptions into it and keep the platform's message.
//!
//! ## Thread Safety
//!
//! Bridge traits are bounded by [`PlatformSendSync`](platform::PlatformSendSync):
//! `Send + Sync` on native targets, unbounded on `wasm32` where browser handles
//! are single-threaded.

pub mod audio_graph;
pub mod devices;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod messaging;
#[cfg(feature = "mock")]
pub mod mock;
pub mod platform;
pub mod playback;

pub use error::BridgeError;

// Re-export commonly used types
pub use audio_graph::{
    AudioBackend, AudioContext, BufferSourceNode, CaptureDestination, ElementSourceNode,
    MediaElement, ObjectUrlRegistry,
};
pub use devices::{
    AudioRequest, CaptureStreamSource, ConstraintSet, MediaDeviceInfo, MediaDeviceKind,
    MediaDevices, MediaDevicesSlot, MediaStreamConstraints, SharedMediaDevices,
};
pub use fetch::{FetchResponse, FetchedAudio, SpeechFetcher};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use messaging::{ControlMessage, WireMessage};
pub use platform::PlatformSendSync;
pub use playback::{AudioDecoder, AudioPayload, BlobHandle, DecodedAudio};
