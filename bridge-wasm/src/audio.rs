//! Web Audio implementations of the audio graph traits.
//!
//! | Trait | Browser object |
//! |-------|----------------|
//! | `AudioContext` | `AudioContext` |
//! | `CaptureDestination` | `MediaStreamAudioDestinationNode` |
//! | `BufferSourceNode` | `AudioBufferSourceNode` |
//! | `ElementSourceNode` | `MediaElementAudioSourceNode` |
//! | `MediaElement` | hidden `<audio>` appended to the body |
//! | `ObjectUrlRegistry` | `URL.createObjectURL` over a typed `Blob` |
//! | `AudioDecoder` | `decodeAudioData` on an `OfflineAudioContext` |

use crate::error::{js_error, WasmError, WasmResult};
use bridge_traits::{
    audio_graph::{
        AudioBackend, AudioContext, BufferSourceNode, CaptureDestination, ElementSourceNode,
        MediaElement, ObjectUrlRegistry,
    },
    error::{BridgeError, Result as BridgeResult},
    playback::{AudioDecoder, DecodedAudio},
};
use bytes::Bytes;
use js_sys::{Array, Uint8Array};
use std::cell::RefCell;
use tracing::debug;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    AudioBuffer, AudioBufferSourceNode, Blob, BlobPropertyBag, Document, HtmlAudioElement,
    MediaElementAudioSourceNode, MediaStream, MediaStreamAudioDestinationNode,
    OfflineAudioContext, Url, Window,
};

/// Rate `decodeAudioData` resamples to.
const DECODE_SAMPLE_RATE: f32 = 48_000.0;

/// Entry point into the page's Web Audio stack.
#[derive(Debug, Clone)]
pub struct WebAudioBackend {
    document: Document,
}

impl WebAudioBackend {
    /// Backend for the given window.
    pub fn new(window: &Window) -> WasmResult<Self> {
        let document = window
            .document()
            .ok_or_else(|| WasmError::Unavailable("window.document".to_string()))?;
        Ok(Self { document })
    }
}

impl AudioBackend for WebAudioBackend {
    type Element = WebAudioElement;
    type Context = WebAudioContext;

    fn create_context(&self) -> BridgeResult<WebAudioContext> {
        let context = web_sys::AudioContext::new().map_err(js_error)?;
        Ok(WebAudioContext { context })
    }

    fn create_element(&self) -> BridgeResult<WebAudioElement> {
        let element = self
            .document
            .create_element("audio")
            .map_err(js_error)?
            .dyn_into::<HtmlAudioElement>()
            .map_err(|_| BridgeError::OperationFailed("created element is not <audio>".into()))?;
        element.set_cross_origin(Some("anonymous"));
        element.set_hidden(true);
        if let Some(body) = self.document.body() {
            body.append_child(&element).map_err(js_error)?;
        }
        Ok(WebAudioElement { element })
    }
}

impl ObjectUrlRegistry for WebAudioBackend {
    fn create_object_url(&self, data: &Bytes, mime: &str) -> BridgeResult<String> {
        let parts = Array::new();
        parts.push(&Uint8Array::from(data.as_ref()));
        let options = BlobPropertyBag::new();
        options.set_type(mime);
        let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)
            .map_err(js_error)?;
        Url::create_object_url_with_blob(&blob).map_err(js_error)
    }

    fn revoke_object_url(&self, url: &str) -> BridgeResult<()> {
        Url::revoke_object_url(url).map_err(js_error)
    }
}

/// The page's `AudioContext`.
#[derive(Debug)]
pub struct WebAudioContext {
    context: web_sys::AudioContext,
}

#[async_trait::async_trait(?Send)]
impl AudioContext for WebAudioContext {
    type Stream = MediaStream;
    type Destination = WebCaptureDestination;
    type Buffer = AudioBuffer;
    type BufferSource = WebBufferSource;
    type Element = WebAudioElement;
    type ElementSource = WebElementSource;

    async fn resume(&self) -> BridgeResult<()> {
        let promise = self.context.resume().map_err(js_error)?;
        JsFuture::from(promise).await.map_err(js_error)?;
        Ok(())
    }

    fn create_capture_destination(&self) -> BridgeResult<WebCaptureDestination> {
        let node = self
            .context
            .create_media_stream_destination()
            .map_err(js_error)?;
        Ok(WebCaptureDestination { node })
    }

    fn create_buffer(&self, audio: &DecodedAudio) -> BridgeResult<AudioBuffer> {
        let buffer = self
            .context
            .create_buffer(
                audio.channel_count() as u32,
                audio.frames() as u32,
                audio.sample_rate as f32,
            )
            .map_err(js_error)?;
        for (index, samples) in audio.channels.iter().enumerate() {
            buffer
                .copy_to_channel(samples, index as i32)
                .map_err(js_error)?;
        }
        Ok(buffer)
    }

    fn create_buffer_source(&self, buffer: &AudioBuffer) -> BridgeResult<WebBufferSource> {
        let node = self.context.create_buffer_source().map_err(js_error)?;
        node.set_buffer(Some(buffer));
        Ok(WebBufferSource {
            node,
            context: self.context.clone(),
        })
    }

    fn create_element_source(&self, element: &WebAudioElement) -> BridgeResult<WebElementSource> {
        let node = self
            .context
            .create_media_element_source(&element.element)
            .map_err(js_error)?;
        Ok(WebElementSource { node })
    }
}

/// `MediaStreamAudioDestinationNode`; its stream is the virtual microphone.
#[derive(Debug)]
pub struct WebCaptureDestination {
    node: MediaStreamAudioDestinationNode,
}

impl CaptureDestination for WebCaptureDestination {
    type Stream = MediaStream;

    fn stream(&self) -> MediaStream {
        self.node.stream()
    }
}

/// Single-use `AudioBufferSourceNode`.
#[derive(Debug)]
pub struct WebBufferSource {
    node: AudioBufferSourceNode,
    context: web_sys::AudioContext,
}

impl BufferSourceNode for WebBufferSource {
    type Destination = WebCaptureDestination;

    fn connect(&self, destination: &WebCaptureDestination) -> BridgeResult<()> {
        self.node
            .connect_with_audio_node(&destination.node)
            .map(|_| ())
            .map_err(js_error)
    }

    fn connect_to_output(&self) -> BridgeResult<()> {
        self.node
            .connect_with_audio_node(&self.context.destination())
            .map(|_| ())
            .map_err(js_error)
    }

    fn start(&self) -> BridgeResult<()> {
        self.node.start().map_err(js_error)
    }

    fn stop(&self) -> BridgeResult<()> {
        self.node.stop().map_err(js_error)
    }
}

/// The element's `MediaElementAudioSourceNode`.
#[derive(Debug)]
pub struct WebElementSource {
    node: MediaElementAudioSourceNode,
}

impl ElementSourceNode for WebElementSource {
    type Destination = WebCaptureDestination;

    fn connect(&self, destination: &WebCaptureDestination) -> BridgeResult<()> {
        self.node
            .connect_with_audio_node(&destination.node)
            .map(|_| ())
            .map_err(js_error)
    }
}

/// Hidden `<audio>` element used by the fallback route.
#[derive(Debug, Clone)]
pub struct WebAudioElement {
    element: HtmlAudioElement,
}

#[async_trait::async_trait(?Send)]
impl MediaElement for WebAudioElement {
    fn set_source(&self, url: &str) -> BridgeResult<()> {
        self.element.set_src(url);
        Ok(())
    }

    fn load(&self) -> BridgeResult<()> {
        self.element.load();
        Ok(())
    }

    async fn play(&self) -> BridgeResult<()> {
        let promise = self.element.play().map_err(js_error)?;
        JsFuture::from(promise).await.map_err(js_error)?;
        Ok(())
    }
}

/// Decoder backed by the browser's `decodeAudioData`, which decodes off the
/// main thread.
///
/// Decoding goes through an `OfflineAudioContext`, so no audio output is
/// opened before the first content arrives. Samples come back resampled to
/// 48 kHz.
#[derive(Debug, Default)]
pub struct WebAudioDecoder {
    context: RefCell<Option<OfflineAudioContext>>,
}

impl WebAudioDecoder {
    /// Decoder whose context is created on first use.
    pub fn new() -> Self {
        Self::default()
    }

    fn context(&self) -> BridgeResult<OfflineAudioContext> {
        if let Some(context) = self.context.borrow().as_ref() {
            return Ok(context.clone());
        }
        let context = OfflineAudioContext::new_with_number_of_channels_and_length_and_sample_rate(
            1,
            1,
            DECODE_SAMPLE_RATE,
        )
        .map_err(js_error)?;
        *self.context.borrow_mut() = Some(context.clone());
        Ok(context)
    }
}

#[async_trait::async_trait(?Send)]
impl AudioDecoder for WebAudioDecoder {
    async fn decode(&self, bytes: &Bytes, mime_hint: Option<&str>) -> BridgeResult<DecodedAudio> {
        if bytes.is_empty() {
            return Err(BridgeError::DecodeFailed("empty input".to_string()));
        }
        let context = self.context()?;

        // decodeAudioData detaches the buffer it is given, so hand it a copy.
        let data = Uint8Array::from(bytes.as_ref()).buffer();
        let promise = context.decode_audio_data(&data).map_err(js_error)?;
        let buffer: AudioBuffer = JsFuture::from(promise)
            .await
            .map_err(|e| BridgeError::DecodeFailed(WasmError::from(e).to_string()))?
            .dyn_into()
            .map_err(|_| {
                BridgeError::DecodeFailed("decodeAudioData did not yield an AudioBuffer".into())
            })?;

        let channels = (0..buffer.number_of_channels())
            .map(|index| buffer.get_channel_data(index).map_err(js_error))
            .collect::<BridgeResult<Vec<_>>>()?;
        let audio = DecodedAudio::new(buffer.sample_rate() as u32, channels);
        if audio.is_empty() {
            return Err(BridgeError::DecodeFailed("No audio frames decoded".to_string()));
        }

        debug!(
            mime = mime_hint.unwrap_or("unknown"),
            channels = audio.channel_count(),
            frames = audio.frames(),
            "Decoded audio in the browser"
        );
        Ok(audio)
    }
}
