//! # Playback Graph
//!
//! Owns the page's single audio-processing context and the capture
//! destination whose stream is the virtual microphone.
//!
//! ## Routes
//!
//! ```text
//!                ┌──────────────────────┐
//! decoded PCM ──▶│ buffer source (fresh │──┬──▶ capture destination ──▶ stream
//!                │ node per play)       │  └──▶ local output (monitoring)
//!                └──────────────────────┘
//!                ┌──────────────────────┐
//! fallback URL ─▶│ hidden element ─▶    │─────▶ capture destination
//!                │ element source (once)│
//!                └──────────────────────┘
//! ```
//!
//! The buffer route is preferred because it does not depend on element load
//! timing. The element route plays whatever decoding could not handle.
//!
//! ## Lifecycle
//!
//! `Idle → Prepared` after the first successful [`PlaybackGraph::install`],
//! `Prepared → Playing` after [`PlaybackGraph::play`]. A later install returns
//! to `Prepared`. There is no terminal state.
//!
//! The context, destination, element and element-source node are created at
//! most once and reused for the lifetime of the graph, so the capture stream
//! handed to page code stays valid across any number of set/play cycles.

use crate::error::{PlaybackError, Result};
use crate::generation::RequestTicket;
use crate::payload::{PlayableFallback, PreparedContent};
use bridge_traits::audio_graph::{
    AudioBackend, AudioContext, BufferSourceNode, CaptureDestination, ElementSourceNode,
    MediaElement,
};
use bridge_traits::devices::CaptureStreamSource;
use bridge_traits::BridgeError;
use core_runtime::config::PlaybackConfig;
use core_runtime::events::{EngineEvent, EventBus, PlaybackRoute};
use core_runtime::logging::redact_url;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

type Ctx<B> = <B as AudioBackend>::Context;
type Stream<B> = <Ctx<B> as AudioContext>::Stream;
type Destination<B> = <Ctx<B> as AudioContext>::Destination;
type Buffer<B> = <Ctx<B> as AudioContext>::Buffer;
type BufferSource<B> = <Ctx<B> as AudioContext>::BufferSource;
type ElementSource<B> = <Ctx<B> as AudioContext>::ElementSource;

/// Playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphState {
    /// Nothing installed yet.
    Idle,
    /// Content installed and ready to play.
    Prepared,
    /// A route was started.
    Playing,
}

impl GraphState {
    pub fn as_str(&self) -> &'static str {
        match self {
            GraphState::Idle => "idle",
            GraphState::Prepared => "prepared",
            GraphState::Playing => "playing",
        }
    }
}

/// Result of [`PlaybackGraph::play`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// `play` arrived before any install; nothing happened.
    NothingPrepared,
    /// Playback started on the given route.
    Started(PlaybackRoute),
}

struct ContextHandles<B: AudioBackend> {
    context: Arc<Ctx<B>>,
    destination: Destination<B>,
}

struct InstalledContent<B: AudioBackend> {
    generation: u64,
    buffer: Option<Buffer<B>>,
    fallback: PlayableFallback,
}

struct GraphInner<B: AudioBackend> {
    context: Option<ContextHandles<B>>,
    element: Option<B::Element>,
    element_source: Option<ElementSource<B>>,
    current: Option<InstalledContent<B>>,
    active_source: Option<BufferSource<B>>,
    state: GraphState,
}

impl<B: AudioBackend> GraphInner<B> {
    fn new() -> Self {
        Self {
            context: None,
            element: None,
            element_source: None,
            current: None,
            active_source: None,
            state: GraphState::Idle,
        }
    }

    fn ensure_context(&mut self, backend: &B) -> Result<&ContextHandles<B>> {
        if self.context.is_none() {
            let context = backend
                .create_context()
                .map_err(|e| PlaybackError::ContextUnavailable(e.to_string()))?;
            let destination = context
                .create_capture_destination()
                .map_err(|e| PlaybackError::ContextUnavailable(e.to_string()))?;
            info!("Created audio context and capture destination");
            self.context = Some(ContextHandles {
                context: Arc::new(context),
                destination,
            });
        }
        self.context
            .as_ref()
            .ok_or_else(|| PlaybackError::ContextUnavailable("context missing".to_string()))
    }

    /// Create the hidden element and bind it into the graph, both at most once.
    fn ensure_element(&mut self, backend: &B) -> Result<B::Element> {
        if let Some(element) = &self.element {
            return Ok(element.clone());
        }

        let element = backend.create_element()?;
        if let Some(handles) = &self.context {
            match handles.context.create_element_source(&element) {
                Ok(source) => {
                    if let Err(e) = source.connect(&handles.destination) {
                        warn!(error = %e, "Failed to connect element source to capture destination");
                    }
                    self.element_source = Some(source);
                }
                Err(e) => warn!(error = %e, "Failed to bind playback element into the graph"),
            }
        }

        self.element = Some(element.clone());
        Ok(element)
    }
}

/// Playback graph over an [`AudioBackend`].
pub struct PlaybackGraph<B: AudioBackend> {
    backend: Arc<B>,
    monitor_locally: bool,
    events: EventBus,
    inner: Mutex<GraphInner<B>>,
}

impl<B: AudioBackend> PlaybackGraph<B> {
    pub fn new(backend: Arc<B>, config: &PlaybackConfig, events: EventBus) -> Self {
        Self {
            backend,
            monitor_locally: config.monitor_locally,
            events,
            inner: Mutex::new(GraphInner::new()),
        }
    }

    pub fn state(&self) -> GraphState {
        self.inner.lock().state
    }

    /// Generation of the installed content, if any.
    pub fn current_generation(&self) -> Option<u64> {
        self.inner.lock().current.as_ref().map(|c| c.generation)
    }

    /// The capture stream, once the context exists. Never creates one.
    pub fn capture_stream(&self) -> Option<Stream<B>> {
        self.inner
            .lock()
            .context
            .as_ref()
            .map(|handles| handles.destination.stream())
    }

    /// Make `prepared` the current content.
    ///
    /// Creates the context, capture destination and playback element on
    /// first use, then binds the fallback URL to the element. A buffer-source
    /// node that is still playing keeps playing until the next [`play`].
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::Superseded`] if `ticket` is stale; nothing changes
    /// - [`PlaybackError::ContextUnavailable`] if the context cannot be
    ///   created; nothing is committed
    /// - [`PlaybackError::Platform`] if the element rejects the new source;
    ///   it is pointed back at the current content
    ///
    /// [`play`]: PlaybackGraph::play
    #[instrument(skip_all, fields(generation = ticket.generation()))]
    pub fn install(&self, prepared: PreparedContent, ticket: &RequestTicket) -> Result<()> {
        let mut inner = self.inner.lock();
        ticket.ensure_current()?;

        inner.ensure_context(&self.backend)?;
        let element = inner.ensure_element(&self.backend)?;

        if let Err(e) = element
            .set_source(&prepared.fallback.url)
            .and_then(|()| element.load())
        {
            // Keep the element on the content that is still current.
            if let Some(current) = &inner.current {
                if let Err(restore) = element.set_source(&current.fallback.url) {
                    warn!(error = %restore, "Failed to restore element source");
                }
            }
            return Err(e.into());
        }

        let handles = inner
            .context
            .as_ref()
            .ok_or_else(|| PlaybackError::ContextUnavailable("context missing".to_string()))?;
        let buffer = match prepared.decoded.as_ref() {
            Some(decoded) => match handles.context.create_buffer(decoded) {
                Ok(buffer) => Some(buffer),
                Err(e) => {
                    warn!(error = %e, "Failed to create audio buffer, element route only");
                    None
                }
            },
            None => None,
        };

        debug!(
            url = %redact_url(&prepared.fallback.url),
            buffered = buffer.is_some(),
            "Installed content"
        );
        inner.current = Some(InstalledContent {
            generation: prepared.generation,
            buffer,
            fallback: prepared.fallback,
        });
        inner.state = GraphState::Prepared;
        Ok(())
    }

    /// Play the current content.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::PlaybackBlocked`] if the platform refused element
    ///   playback; not retried
    #[instrument(skip(self))]
    pub async fn play(&self) -> Result<PlaybackOutcome> {
        let context = {
            let inner = self.inner.lock();
            match (&inner.current, &inner.context) {
                (Some(_), Some(handles)) => Arc::clone(&handles.context),
                _ => return Ok(self.nothing_prepared()),
            }
        };

        if let Err(e) = context.resume().await {
            warn!(error = %e, "Failed to resume audio context");
        }

        let element = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;

            if let Some(previous) = inner.active_source.take() {
                if let Err(e) = previous.stop() {
                    debug!(error = %e, "Previous buffer source was not running");
                }
            }

            let (current, handles) = match (&inner.current, &inner.context) {
                (Some(current), Some(handles)) => (current, handles),
                _ => return Ok(self.nothing_prepared()),
            };

            if let Some(buffer) = &current.buffer {
                match self.start_buffer_source(handles, buffer) {
                    Ok(source) => {
                        inner.active_source = Some(source);
                        inner.state = GraphState::Playing;
                        return Ok(self.started(PlaybackRoute::Buffer));
                    }
                    Err(e) => warn!(error = %e, "Buffer route failed, falling back to element"),
                }
            }

            debug!(url = %redact_url(&current.fallback.url), "Playing through element");
            inner.element.clone().ok_or_else(|| {
                PlaybackError::Platform(BridgeError::NotAvailable("playback element".to_string()))
            })?
        };

        match element.play().await {
            Ok(()) => {
                self.inner.lock().state = GraphState::Playing;
                Ok(self.started(PlaybackRoute::Element))
            }
            Err(BridgeError::PlaybackRefused(reason)) => {
                warn!(reason = %reason, "Element playback blocked");
                self.events.emit(EngineEvent::PlaybackBlocked {
                    reason: reason.clone(),
                });
                Err(PlaybackError::PlaybackBlocked(reason))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn start_buffer_source(
        &self,
        handles: &ContextHandles<B>,
        buffer: &Buffer<B>,
    ) -> Result<BufferSource<B>> {
        let source = handles.context.create_buffer_source(buffer)?;
        source.connect(&handles.destination)?;
        if self.monitor_locally {
            if let Err(e) = source.connect_to_output() {
                debug!(error = %e, "Local monitoring unavailable");
            }
        }
        source.start()?;
        Ok(source)
    }

    fn started(&self, route: PlaybackRoute) -> PlaybackOutcome {
        info!(route = route.as_str(), "Playback started");
        self.events.emit(EngineEvent::PlaybackStarted { route });
        PlaybackOutcome::Started(route)
    }

    fn nothing_prepared(&self) -> PlaybackOutcome {
        debug!("Play requested before any content was installed");
        self.events.emit(EngineEvent::NothingPrepared);
        PlaybackOutcome::NothingPrepared
    }
}

impl<B: AudioBackend> CaptureStreamSource<Stream<B>> for PlaybackGraph<B> {
    fn capture_stream(&self) -> Option<Stream<B>> {
        PlaybackGraph::capture_stream(self)
    }
}

impl<B: AudioBackend> fmt::Debug for PlaybackGraph<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("PlaybackGraph")
            .field("state", &inner.state)
            .field("has_context", &inner.context.is_some())
            .field("current_generation", &inner.current.as_ref().map(|c| c.generation))
            .field("monitor_locally", &self.monitor_locally)
            .finish()
    }
}
