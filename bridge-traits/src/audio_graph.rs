//! Audio-processing graph abstractions.
//!
//! These traits model the small slice of a Web Audio style engine that the
//! playback graph needs: a lazily created context, one capture destination
//! whose stream is handed to page code, single-use buffer-source nodes, a
//! hidden media element used as the fallback route, and object URLs that bind
//! byte blobs to that element.
//!
//! ```text
//! DecodedAudio ─▶ BufferSourceNode ─┐
//!                                   ├─▶ CaptureDestination ─▶ Stream
//! MediaElement ─▶ ElementSourceNode ┘
//! ```

use crate::{error::Result, platform::PlatformSendSync, playback::DecodedAudio};
use bytes::Bytes;

/// Entry point into the host's audio stack.
pub trait AudioBackend: PlatformSendSync {
    type Element: MediaElement;
    type Context: AudioContext<Element = Self::Element>;

    /// Create a new audio-processing context.
    fn create_context(&self) -> Result<Self::Context>;

    /// Create the hidden playback element used by the fallback route.
    fn create_element(&self) -> Result<Self::Element>;
}

/// Registry of URL handles pointing at in-memory byte blobs.
///
/// Handles are a finite platform resource: every URL returned by
/// [`create_object_url`](ObjectUrlRegistry::create_object_url) must eventually
/// be passed to [`revoke_object_url`](ObjectUrlRegistry::revoke_object_url).
pub trait ObjectUrlRegistry: PlatformSendSync {
    fn create_object_url(&self, data: &Bytes, mime: &str) -> Result<String>;

    fn revoke_object_url(&self, url: &str) -> Result<()>;
}

/// A live audio-processing context.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait AudioContext: PlatformSendSync {
    /// Capture stream handed out to page code.
    type Stream: Clone + PlatformSendSync + 'static;
    type Destination: CaptureDestination<Stream = Self::Stream>;
    /// Platform-side copy of a [`DecodedAudio`].
    type Buffer: PlatformSendSync;
    type BufferSource: BufferSourceNode<Destination = Self::Destination>;
    type Element: MediaElement;
    type ElementSource: ElementSourceNode<Destination = Self::Destination>;

    /// Resume a suspended context. Some platforms suspend contexts created
    /// outside a user gesture.
    async fn resume(&self) -> Result<()>;

    fn create_capture_destination(&self) -> Result<Self::Destination>;

    fn create_buffer(&self, audio: &DecodedAudio) -> Result<Self::Buffer>;

    fn create_buffer_source(&self, buffer: &Self::Buffer) -> Result<Self::BufferSource>;

    /// Bind an element into the graph. Platforms allow this once per element.
    fn create_element_source(&self, element: &Self::Element) -> Result<Self::ElementSource>;
}

/// Graph node that exposes everything routed into it as a capture stream.
pub trait CaptureDestination: PlatformSendSync {
    type Stream;

    fn stream(&self) -> Self::Stream;
}

/// Single-use node that plays a buffer once started.
pub trait BufferSourceNode: PlatformSendSync {
    type Destination;

    fn connect(&self, destination: &Self::Destination) -> Result<()>;

    /// Connect to the context's local speakers.
    fn connect_to_output(&self) -> Result<()>;

    fn start(&self) -> Result<()>;

    fn stop(&self) -> Result<()>;
}

/// Node wrapping a media element's output.
pub trait ElementSourceNode: PlatformSendSync {
    type Destination;

    fn connect(&self, destination: &Self::Destination) -> Result<()>;
}

/// Hidden media element used by the fallback route.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait MediaElement: Clone + PlatformSendSync + 'static {
    fn set_source(&self, url: &str) -> Result<()>;

    fn load(&self) -> Result<()>;

    /// Start playback. Returns [`BridgeError::PlaybackRefused`] when the
    /// platform demands a user gesture.
    ///
    /// [`BridgeError::PlaybackRefused`]: crate::error::BridgeError::PlaybackRefused
    async fn play(&self) -> Result<()>;
}
