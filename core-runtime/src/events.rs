//! # Event Bus System
//!
//! Broadcasts engine lifecycle events over `tokio::sync::broadcast` so that
//! hosts (a devtools panel, the control surface, tests) can observe what the
//! engine did without being wired into it.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐   emit   ┌───────────┐  subscribe  ┌────────────┐
//! │ Content Preparer ├─────────>│           ├────────────>│ Subscriber │
//! └──────────────────┘          │ EventBus  │             └────────────┘
//! ┌──────────────────┐   emit   │ (broadcast│
//! │ Playback Graph   ├─────────>│  channel) │  subscribe  ┌────────────┐
//! └──────────────────┘          │           ├────────────>│ Subscriber │
//! ┌──────────────────┐   emit   │           │             └────────────┘
//! │ Device Shim      ├─────────>│           │
//! └──────────────────┘          └───────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EngineEvent, EventBus};
//!
//! let bus = EventBus::new(16);
//! let mut receiver = bus.subscribe();
//!
//! bus.emit(EngineEvent::NothingPrepared);
//! assert_eq!(receiver.try_recv().unwrap(), EngineEvent::NothingPrepared);
//! ```
//!
//! ## Error Handling
//!
//! Emission never fails the caller: an event with no subscribers is simply
//! dropped. Receivers see `RecvError::Lagged(n)` when they fall more than the
//! bus capacity behind; this is non-fatal.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, TryRecvError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 64;

/// Route audio took when playback started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackRoute {
    /// Decoded samples through a buffer-source node.
    Buffer,
    /// The hidden media element through the element-source node.
    Element,
}

impl PlaybackRoute {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackRoute::Buffer => "buffer",
            PlaybackRoute::Element => "element",
        }
    }
}

/// Events emitted by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum EngineEvent {
    /// New content is ready to play.
    ContentPrepared {
        generation: u64,
        /// Payload variant (`bytes`, `blob`, `text`).
        kind: String,
        /// Whether samples were decoded (buffer route available).
        decoded: bool,
    },
    /// A set-content request was refused. `generation` is 0 when the payload
    /// was refused before the request was numbered.
    ContentRejected { generation: u64, reason: String },
    /// A set-content request lost to a newer one.
    ContentSuperseded { generation: u64 },
    PlaybackStarted { route: PlaybackRoute },
    /// The platform refused to start element playback.
    PlaybackBlocked { reason: String },
    /// `play` arrived before any content was installed.
    NothingPrepared,
    /// An acquisition call received the capture stream.
    StreamServed,
    /// An acquisition call was delegated to the real device API.
    AcquisitionPassedThrough { device_id: Option<String> },
    ShimInstalled { device_id: String },
}

impl EngineEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &'static str {
        match self {
            EngineEvent::ContentPrepared { .. } => "Content prepared",
            EngineEvent::ContentRejected { .. } => "Content rejected",
            EngineEvent::ContentSuperseded { .. } => "Content superseded by a newer request",
            EngineEvent::PlaybackStarted { .. } => "Playback started",
            EngineEvent::PlaybackBlocked { .. } => "Playback blocked by the platform",
            EngineEvent::NothingPrepared => "Play requested before any content",
            EngineEvent::StreamServed => "Capture stream served",
            EngineEvent::AcquisitionPassedThrough { .. } => "Acquisition passed through",
            EngineEvent::ShimInstalled { .. } => "Device shim installed",
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            EngineEvent::ContentRejected { .. } | EngineEvent::PlaybackBlocked { .. } => {
                EventSeverity::Warning
            }
            EngineEvent::ContentPrepared { .. }
            | EngineEvent::PlaybackStarted { .. }
            | EngineEvent::ShimInstalled { .. } => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Central event bus for publishing and subscribing to engine events.
///
/// Cloning the bus yields another handle to the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero; [`EngineConfig::validate`] rejects that.
    ///
    /// [`EngineConfig::validate`]: crate::config::EngineConfig::validate
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all current subscribers and returns how many
    /// received it.
    pub fn emit(&self, event: EngineEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<EngineEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&EngineEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{EngineEvent, EventBus, EventStream};
///
/// let bus = EventBus::new(16);
/// let mut playback = EventStream::new(bus.subscribe())
///     .filter(|event| matches!(event, EngineEvent::PlaybackStarted { .. }));
///
/// bus.emit(EngineEvent::StreamServed);
/// assert!(playback.try_recv().is_none());
/// ```
pub struct EventStream {
    receiver: Receiver<EngineEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<EngineEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv`/`try_recv`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&EngineEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &EngineEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<EngineEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without waiting.
    ///
    /// Returns `None` if no matching events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<EngineEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Lagged(n)) => return Some(Err(RecvError::Lagged(n))),
                Err(TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }

    /// Drain every matching event currently buffered.
    pub fn drain(&mut self) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        while let Some(result) = self.try_recv() {
            match result {
                Ok(event) => events.push(event),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
        events
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus_subscription() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
        let _sub1 = bus.subscribe();
        let _sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn test_emit_without_subscribers_is_silent() {
        let bus = EventBus::new(10);
        assert_eq!(bus.emit(EngineEvent::StreamServed), 0);
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        let event = EngineEvent::PlaybackStarted {
            route: PlaybackRoute::Buffer,
        };
        assert_eq!(bus.emit(event.clone()), 2);

        assert_eq!(sub1.recv().await.unwrap(), event);
        assert_eq!(sub2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_event_stream_with_filter() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe())
            .filter(|event| matches!(event, EngineEvent::ContentPrepared { .. }));

        bus.emit(EngineEvent::StreamServed);
        let prepared = EngineEvent::ContentPrepared {
            generation: 1,
            kind: "bytes".into(),
            decoded: true,
        };
        bus.emit(prepared.clone());

        assert_eq!(stream.recv().await.unwrap(), prepared);
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();

        for generation in 0..5 {
            bus.emit(EngineEvent::ContentSuperseded { generation });
        }

        assert!(matches!(sub.recv().await, Err(RecvError::Lagged(_))));
    }

    #[test]
    fn test_drain_collects_buffered_events() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe());
        bus.emit(EngineEvent::NothingPrepared);
        bus.emit(EngineEvent::StreamServed);

        assert_eq!(
            stream.drain(),
            vec![EngineEvent::NothingPrepared, EngineEvent::StreamServed]
        );
        assert!(stream.try_recv().is_none());
    }

    #[test]
    fn test_event_severity() {
        assert_eq!(
            EngineEvent::PlaybackBlocked {
                reason: "gesture".into()
            }
            .severity(),
            EventSeverity::Warning
        );
        assert_eq!(
            EngineEvent::ShimInstalled {
                device_id: "v".into()
            }
            .severity(),
            EventSeverity::Info
        );
        assert_eq!(EngineEvent::StreamServed.severity(), EventSeverity::Debug);
    }

    #[test]
    fn test_event_description() {
        assert_eq!(EngineEvent::NothingPrepared.description(), "Play requested before any content");
    }

    #[test]
    fn test_event_serialization() {
        let event = EngineEvent::PlaybackStarted {
            route: PlaybackRoute::Element,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"event": "PlaybackStarted", "route": "element"})
        );
        let back: EngineEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
