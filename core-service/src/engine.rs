//! The page-wide engine: one preparer, one playback graph, one request
//! counter, and the event bus they report to.

use crate::error::Result;
use bridge_traits::{
    audio_graph::{AudioBackend, AudioContext, ObjectUrlRegistry},
    devices::MediaDevicesSlot,
    fetch::{FetchResponse, SpeechFetcher},
    messaging::{ControlMessage, WireMessage},
    playback::{AudioDecoder, AudioPayload},
};
use core_devices::{install_shim, InstallGuard, InstallOutcome};
use core_playback::{
    ContentPreparer, GraphState, PlaybackError, PlaybackGraph, PlaybackOutcome,
    RequestGenerations, RequestTicket,
};
use core_runtime::config::EngineConfig;
use core_runtime::events::{EngineEvent, EventBus, EventStream};
use core_runtime::logging::describe_text;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Capture stream type produced by backend `B`.
pub type StreamOf<B> = <<B as AudioBackend>::Context as AudioContext>::Stream;

/// Host-provided collaborators.
pub struct EngineDependencies<B> {
    /// Audio stack and object URL registry.
    pub backend: Arc<B>,
    /// Fetches speech bytes for text. Without one, text plays from the remote
    /// speech URL.
    pub speech_fetcher: Option<Arc<dyn SpeechFetcher>>,
    /// Platform decoder. Without one, bytes are decoded in process with
    /// symphonia.
    pub decoder: Option<Arc<dyn AudioDecoder>>,
}

impl<B> EngineDependencies<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            speech_fetcher: None,
            decoder: None,
        }
    }

    pub fn with_speech_fetcher(mut self, fetcher: Arc<dyn SpeechFetcher>) -> Self {
        self.speech_fetcher = Some(fetcher);
        self
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn AudioDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }
}

/// Result of a set-content request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetContentOutcome {
    /// The content is now current.
    Installed { generation: u64, decoded: bool },
    /// A newer request started first; this one changed nothing.
    Superseded { generation: u64 },
}

/// Result of [`VirtualMicEngine::handle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    Content(SetContentOutcome),
    Playback(PlaybackOutcome),
}

/// The virtual microphone engine.
///
/// ```text
/// set content ─▶ ContentPreparer ─▶ PlaybackGraph::install
/// play        ─────────────────────▶ PlaybackGraph::play
/// page device calls ─▶ InterceptingMediaDevices ─▶ PlaybackGraph::capture_stream
/// ```
pub struct VirtualMicEngine<B: AudioBackend + ObjectUrlRegistry> {
    config: EngineConfig,
    preparer: ContentPreparer<B>,
    graph: Arc<PlaybackGraph<B>>,
    generations: RequestGenerations,
    speech_fetcher: Option<Arc<dyn SpeechFetcher>>,
    events: EventBus,
}

impl<B: AudioBackend + ObjectUrlRegistry> VirtualMicEngine<B> {
    /// Validate `config` and build the engine. No platform resource is
    /// created until the first content arrives.
    pub fn new(config: EngineConfig, deps: EngineDependencies<B>) -> Result<Self> {
        config.validate()?;

        let events = EventBus::new(config.event_capacity);
        let mut preparer =
            ContentPreparer::new(Arc::clone(&deps.backend), config.fallback.clone());
        if let Some(decoder) = deps.decoder.clone() {
            preparer = preparer.with_decoder(decoder);
        }
        let graph = Arc::new(PlaybackGraph::new(
            deps.backend,
            &config.playback,
            events.clone(),
        ));

        info!(
            device_id = %config.virtual_device.device_id,
            fetcher = deps.speech_fetcher.is_some(),
            platform_decoder = deps.decoder.is_some(),
            "Virtual microphone engine created"
        );
        Ok(Self {
            config,
            preparer,
            graph,
            generations: RequestGenerations::new(),
            speech_fetcher: deps.speech_fetcher,
            events,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// New subscriber to engine events.
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }

    pub fn state(&self) -> GraphState {
        self.graph.state()
    }

    /// Generation of the most recent set-content request (0 before any).
    pub fn latest_generation(&self) -> u64 {
        self.generations.latest()
    }

    pub fn capture_stream(&self) -> Option<StreamOf<B>> {
        self.graph.capture_stream()
    }

    /// The graph, as read by the device shim.
    pub fn stream_source(&self) -> Arc<PlaybackGraph<B>> {
        Arc::clone(&self.graph)
    }

    /// Replace the device API in `slot` with one that advertises the virtual
    /// device and serves this engine's capture stream.
    pub fn install_device_shim<M>(&self, guard: &InstallGuard, slot: &M) -> Result<InstallOutcome>
    where
        M: MediaDevicesSlot<Stream = StreamOf<B>>,
        B: 'static,
    {
        Ok(install_shim(
            guard,
            slot,
            self.stream_source(),
            &self.config.virtual_device,
            &self.events,
        )?)
    }

    /// Prepare `payload` and make it current.
    ///
    /// A request that loses to a newer one returns
    /// [`SetContentOutcome::Superseded`] rather than an error. An empty
    /// payload is refused without disturbing requests already in flight.
    #[instrument(skip_all, fields(kind = payload.kind()))]
    pub async fn set_content(&self, payload: AudioPayload) -> Result<SetContentOutcome> {
        self.admit(&payload)?;
        let ticket = self.generations.begin();
        self.apply(payload, ticket).await
    }

    /// Make speech for `text` current.
    ///
    /// Asks the speech fetcher for audio bytes first; when there is no
    /// fetcher or it fails, the remote speech URL is used instead.
    #[instrument(skip_all, fields(text = %describe_text(text)))]
    pub async fn set_text(&self, text: &str) -> Result<SetContentOutcome> {
        self.admit(&AudioPayload::text(text))?;
        let ticket = self.generations.begin();
        let payload = self.speech_payload(text).await;
        self.apply(payload, ticket).await
    }

    /// Play the current content.
    pub async fn play(&self) -> Result<PlaybackOutcome> {
        Ok(self.graph.play().await?)
    }

    /// Set content, then play whatever is current once it is ready.
    pub async fn set_and_play(&self, payload: AudioPayload) -> Result<PlaybackOutcome> {
        self.submit(payload).await?;
        self.play().await
    }

    /// Execute a control message. Text content goes through [`set_text`].
    ///
    /// [`set_text`]: VirtualMicEngine::set_text
    pub async fn handle(&self, message: ControlMessage) -> Result<MessageOutcome> {
        match message {
            ControlMessage::SetContent(payload) => {
                Ok(MessageOutcome::Content(self.submit(payload).await?))
            }
            ControlMessage::Play => Ok(MessageOutcome::Playback(self.play().await?)),
        }
    }

    /// Execute a message from the page channel. Returns `Ok(None)` for
    /// traffic not addressed to the engine.
    pub async fn handle_wire(&self, message: WireMessage) -> Result<Option<MessageOutcome>> {
        match message.into_control(&self.config.messaging.direction)? {
            Some(control) => Ok(Some(self.handle(control).await?)),
            None => {
                debug!("Ignoring message not addressed to the engine");
                Ok(None)
            }
        }
    }

    async fn submit(&self, payload: AudioPayload) -> Result<SetContentOutcome> {
        match payload {
            AudioPayload::Text { text } => self.set_text(&text).await,
            other => self.set_content(other).await,
        }
    }

    /// Refuse payloads that are visibly empty before they take a ticket.
    fn admit(&self, payload: &AudioPayload) -> Result<()> {
        if let Err(e) = payload.validate() {
            let e = PlaybackError::from(e);
            warn!(error = %e, "Content rejected");
            self.events.emit(EngineEvent::ContentRejected {
                generation: 0,
                reason: e.to_string(),
            });
            return Err(e.into());
        }
        Ok(())
    }

    async fn speech_payload(&self, text: &str) -> AudioPayload {
        let Some(fetcher) = &self.speech_fetcher else {
            return AudioPayload::text(text);
        };

        match fetcher
            .fetch_speech(text)
            .await
            .and_then(FetchResponse::into_audio)
        {
            Ok(audio) => {
                debug!(len = audio.bytes.len(), "Fetched speech audio");
                AudioPayload::bytes(audio.bytes, audio.mime)
            }
            Err(e) => {
                warn!(error = %e, "Speech fetch failed, using remote speech URL");
                AudioPayload::text(text)
            }
        }
    }

    async fn apply(&self, payload: AudioPayload, ticket: RequestTicket) -> Result<SetContentOutcome> {
        let generation = ticket.generation();
        let kind = payload.kind();

        match self.prepare_and_install(payload, &ticket).await {
            Ok(decoded) => {
                info!(generation, kind, decoded, "Content ready");
                self.events.emit(EngineEvent::ContentPrepared {
                    generation,
                    kind: kind.to_string(),
                    decoded,
                });
                Ok(SetContentOutcome::Installed {
                    generation,
                    decoded,
                })
            }
            Err(e) if e.is_superseded() => {
                debug!(generation, "Content superseded by a newer request");
                self.events
                    .emit(EngineEvent::ContentSuperseded { generation });
                Ok(SetContentOutcome::Superseded { generation })
            }
            Err(e) => {
                // Only reachable for blobs, which are empty once read.
                if matches!(e, PlaybackError::InvalidPayload(_))
                    && self.generations.withdraw(&ticket)
                {
                    debug!(generation, "Withdrew empty request");
                }
                warn!(generation, error = %e, "Content rejected");
                self.events.emit(EngineEvent::ContentRejected {
                    generation,
                    reason: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    async fn prepare_and_install(
        &self,
        payload: AudioPayload,
        ticket: &RequestTicket,
    ) -> core_playback::Result<bool> {
        let prepared = self.preparer.prepare(payload, ticket).await?;
        let decoded = prepared.has_decoded();
        let fallback = prepared.fallback.clone();
        match self.graph.install(prepared, ticket) {
            Ok(()) => {
                self.preparer.commit(&fallback);
                Ok(decoded)
            }
            Err(e) => {
                self.preparer.discard(&fallback);
                Err(e)
            }
        }
    }
}

impl<B: AudioBackend + ObjectUrlRegistry> fmt::Debug for VirtualMicEngine<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualMicEngine")
            .field("device_id", &self.config.virtual_device.device_id)
            .field("graph", &self.graph)
            .field("latest_generation", &self.generations.latest())
            .finish()
    }
}
