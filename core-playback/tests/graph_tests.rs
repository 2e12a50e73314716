mod common;

use bridge_traits::mock::{MockAudioBackend, MockStream};
use bridge_traits::playback::AudioPayload;
use bridge_traits::CaptureStreamSource;
use common::{short_clip, undecodable, wav_bytes};
use core_playback::{
    ContentPreparer, GraphState, PlaybackError, PlaybackGraph, PlaybackOutcome,
    RequestGenerations,
};
use core_runtime::config::{FallbackConfig, PlaybackConfig};
use core_runtime::events::{EngineEvent, EventBus, EventStream, PlaybackRoute};
use std::sync::Arc;

struct Harness {
    backend: MockAudioBackend,
    preparer: ContentPreparer<MockAudioBackend>,
    graph: PlaybackGraph<MockAudioBackend>,
    generations: RequestGenerations,
    events: EventBus,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(PlaybackConfig::default())
    }

    fn with_config(config: PlaybackConfig) -> Self {
        let backend = MockAudioBackend::new();
        let shared = Arc::new(backend.clone());
        let events = EventBus::new(32);
        Self {
            preparer: ContentPreparer::new(Arc::clone(&shared), FallbackConfig::default()),
            graph: PlaybackGraph::new(shared, &config, events.clone()),
            backend,
            generations: RequestGenerations::new(),
            events,
        }
    }

    async fn set(&self, payload: AudioPayload) {
        let ticket = self.generations.begin();
        let prepared = self.preparer.prepare(payload, &ticket).await.unwrap();
        let fallback = prepared.fallback.clone();
        self.graph.install(prepared, &ticket).unwrap();
        self.preparer.commit(&fallback);
    }
}

#[tokio::test]
async fn test_install_reaches_prepared() {
    let harness = Harness::new();
    assert_eq!(harness.graph.state(), GraphState::Idle);
    assert!(harness.graph.capture_stream().is_none());

    harness.set(AudioPayload::bytes(short_clip(), None)).await;

    assert_eq!(harness.graph.state(), GraphState::Prepared);
    assert_eq!(harness.graph.current_generation(), Some(1));
    let state = harness.backend.snapshot();
    assert_eq!(state.contexts_created, 1);
    assert_eq!(state.destinations_created, 1);
    assert_eq!(state.elements_created, 1);
    assert_eq!(state.element_sources_created, 1);
    assert_eq!(state.element_sources_connected, 1);
    assert_eq!(state.buffers_created, 1);
    assert_eq!(state.element_sources_set.len(), 1);
    assert_eq!(state.element_loads, 1);
}

#[tokio::test]
async fn test_play_before_install_reports_nothing_prepared() {
    let harness = Harness::new();
    let mut events = EventStream::new(harness.events.subscribe());

    let outcome = harness.graph.play().await.unwrap();

    assert_eq!(outcome, PlaybackOutcome::NothingPrepared);
    assert_eq!(harness.graph.state(), GraphState::Idle);
    assert_eq!(harness.backend.snapshot().contexts_created, 0);
    assert_eq!(events.drain(), vec![EngineEvent::NothingPrepared]);
}

#[tokio::test]
async fn test_decoded_content_plays_through_buffer() {
    let harness = Harness::new();
    let mut events = EventStream::new(harness.events.subscribe());
    harness.set(AudioPayload::bytes(short_clip(), None)).await;

    let outcome = harness.graph.play().await.unwrap();

    assert_eq!(outcome, PlaybackOutcome::Started(PlaybackRoute::Buffer));
    assert_eq!(harness.graph.state(), GraphState::Playing);
    let state = harness.backend.snapshot();
    assert_eq!(state.resumes, 1);
    assert_eq!(state.element_plays, 0);
    let active = state.active_buffer_sources();
    assert_eq!(active.len(), 1);
    assert!(active[0].connected_to_capture);
    assert!(active[0].connected_to_output);
    assert_eq!(active[0].frames, 2_205);
    assert_eq!(
        events.drain(),
        vec![EngineEvent::PlaybackStarted {
            route: PlaybackRoute::Buffer
        }]
    );
}

#[tokio::test]
async fn test_monitoring_can_be_disabled() {
    let harness = Harness::with_config(PlaybackConfig {
        monitor_locally: false,
    });
    harness.set(AudioPayload::bytes(short_clip(), None)).await;
    harness.graph.play().await.unwrap();

    let state = harness.backend.snapshot();
    assert!(state.buffer_sources[0].connected_to_capture);
    assert!(!state.buffer_sources[0].connected_to_output);
}

#[tokio::test]
async fn test_replay_stops_previous_source() {
    let harness = Harness::new();
    harness.set(AudioPayload::bytes(short_clip(), None)).await;

    harness.graph.play().await.unwrap();
    harness.graph.play().await.unwrap();

    let state = harness.backend.snapshot();
    assert_eq!(state.buffer_sources.len(), 2);
    assert!(state.buffer_sources[0].stopped);
    assert_eq!(state.active_buffer_sources().len(), 1);
}

#[tokio::test]
async fn test_last_install_wins() {
    let harness = Harness::new();
    harness.set(AudioPayload::bytes(wav_bytes(8_000, 1, 400, 100), None)).await;
    harness.set(AudioPayload::bytes(wav_bytes(8_000, 1, 900, 100), None)).await;

    harness.graph.play().await.unwrap();

    let state = harness.backend.snapshot();
    assert_eq!(state.buffer_sources.len(), 1);
    assert_eq!(state.buffer_sources[0].frames, 900);
    assert_eq!(harness.graph.current_generation(), Some(2));
}

#[tokio::test]
async fn test_install_leaves_running_source_until_play() {
    let harness = Harness::new();
    harness.set(AudioPayload::bytes(short_clip(), None)).await;
    harness.graph.play().await.unwrap();

    harness.set(AudioPayload::bytes(short_clip(), None)).await;
    assert_eq!(harness.graph.state(), GraphState::Prepared);
    assert_eq!(harness.backend.snapshot().active_buffer_sources().len(), 1);

    harness.graph.play().await.unwrap();
    let state = harness.backend.snapshot();
    assert!(state.buffer_sources[0].stopped);
    assert_eq!(state.active_buffer_sources().len(), 1);
}

#[tokio::test]
async fn test_undecoded_content_plays_through_element() {
    let harness = Harness::new();
    harness.set(AudioPayload::bytes(undecodable(), None)).await;

    let outcome = harness.graph.play().await.unwrap();

    assert_eq!(outcome, PlaybackOutcome::Started(PlaybackRoute::Element));
    let state = harness.backend.snapshot();
    assert_eq!(state.element_plays, 1);
    assert!(state.buffer_sources.is_empty());
    assert_eq!(state.buffers_created, 0);
}

#[tokio::test]
async fn test_text_plays_remote_url_through_element() {
    let harness = Harness::new();
    harness.set(AudioPayload::text("hello")).await;

    let outcome = harness.graph.play().await.unwrap();

    assert_eq!(outcome, PlaybackOutcome::Started(PlaybackRoute::Element));
    let state = harness.backend.snapshot();
    assert!(state.element_sources_set[0].contains("q=hello"));
}

#[tokio::test]
async fn test_refused_element_playback_is_blocked() {
    let harness = Harness::new();
    let mut events = EventStream::new(harness.events.subscribe())
        .filter(|event| matches!(event, EngineEvent::PlaybackBlocked { .. }));
    harness.backend.configure(|s| s.refuse_element_play = true);
    harness.set(AudioPayload::text("hello")).await;

    let result = harness.graph.play().await;

    assert!(matches!(result, Err(PlaybackError::PlaybackBlocked(_))));
    assert_eq!(harness.graph.state(), GraphState::Prepared);
    assert_eq!(harness.backend.snapshot().element_plays, 1);
    assert_eq!(events.drain().len(), 1);
}

#[tokio::test]
async fn test_buffer_failure_falls_back_to_element() {
    let harness = Harness::new();
    harness.backend.configure(|s| s.fail_buffer_source = true);
    harness.set(AudioPayload::bytes(short_clip(), None)).await;

    let outcome = harness.graph.play().await.unwrap();

    assert_eq!(outcome, PlaybackOutcome::Started(PlaybackRoute::Element));
    assert_eq!(harness.backend.snapshot().element_plays, 1);
}

#[tokio::test]
async fn test_resume_failure_is_not_fatal() {
    let harness = Harness::new();
    harness.backend.configure(|s| s.fail_resume = true);
    harness.set(AudioPayload::bytes(short_clip(), None)).await;

    let outcome = harness.graph.play().await.unwrap();

    assert_eq!(outcome, PlaybackOutcome::Started(PlaybackRoute::Buffer));
}

#[tokio::test]
async fn test_stale_install_is_superseded() {
    let harness = Harness::new();
    let stale = harness.generations.begin();
    let prepared = harness
        .preparer
        .prepare(AudioPayload::bytes(short_clip(), None), &stale)
        .await
        .unwrap();
    harness.generations.begin();

    let result = harness.graph.install(prepared, &stale);

    assert!(result.unwrap_err().is_superseded());
    assert_eq!(harness.graph.state(), GraphState::Idle);
    assert_eq!(harness.backend.snapshot().contexts_created, 0);
}

#[tokio::test]
async fn test_context_failure_commits_nothing() {
    let harness = Harness::new();
    harness.backend.configure(|s| s.fail_context = true);
    let ticket = harness.generations.begin();
    let prepared = harness
        .preparer
        .prepare(AudioPayload::bytes(short_clip(), None), &ticket)
        .await
        .unwrap();

    let result = harness.graph.install(prepared, &ticket);

    assert!(matches!(result, Err(PlaybackError::ContextUnavailable(_))));
    assert_eq!(harness.graph.state(), GraphState::Idle);
    assert!(harness.graph.capture_stream().is_none());
    assert_eq!(harness.graph.play().await.unwrap(), PlaybackOutcome::NothingPrepared);
}

#[tokio::test]
async fn test_failed_install_keeps_current_content_playable() {
    let harness = Harness::new();
    harness.set(AudioPayload::bytes(short_clip(), None)).await;
    let current = harness.preparer.held_object_url().unwrap();

    harness.backend.configure(|s| s.fail_element_load = true);
    let ticket = harness.generations.begin();
    let prepared = harness
        .preparer
        .prepare(AudioPayload::bytes(undecodable(), None), &ticket)
        .await
        .unwrap();
    let fallback = prepared.fallback.clone();

    let result = harness.graph.install(prepared, &ticket);
    assert!(matches!(result, Err(PlaybackError::Platform(_))));
    harness.preparer.discard(&fallback);

    let state = harness.backend.snapshot();
    assert_eq!(harness.graph.current_generation(), Some(1));
    assert_eq!(state.element_sources_set.last(), Some(&current));
    assert_eq!(state.live_urls, vec![current.clone()]);
    assert_eq!(state.revoked_urls, vec![fallback.url]);
    assert_eq!(harness.preparer.held_object_url(), Some(current));
}

#[tokio::test]
async fn test_capture_stream_is_stable_across_cycles() {
    let harness = Harness::new();
    harness.set(AudioPayload::bytes(short_clip(), None)).await;
    let first = harness.graph.capture_stream().unwrap();

    for _ in 0..5 {
        harness.set(AudioPayload::bytes(short_clip(), None)).await;
        harness.graph.play().await.unwrap();
        harness.set(AudioPayload::text("again")).await;
        harness.graph.play().await.unwrap();
    }

    let state = harness.backend.snapshot();
    assert_eq!(harness.graph.capture_stream(), Some(first.clone()));
    assert_eq!(first, MockStream::new("capture-1"));
    assert_eq!(state.contexts_created, 1);
    assert_eq!(state.elements_created, 1);
    assert_eq!(state.element_sources_created, 1);
    assert_eq!(state.active_buffer_sources().len(), 0);
}

#[tokio::test]
async fn test_graph_serves_as_stream_source() {
    let harness = Harness::new();
    let source: &dyn CaptureStreamSource<MockStream> = &harness.graph;
    assert!(source.capture_stream().is_none());

    harness.set(AudioPayload::bytes(short_clip(), None)).await;
    assert_eq!(source.capture_stream(), Some(MockStream::new("capture-1")));
}

#[tokio::test]
async fn test_element_binding_failure_still_installs() {
    let harness = Harness::new();
    harness.backend.configure(|s| s.fail_element_source = true);

    harness.set(AudioPayload::bytes(short_clip(), None)).await;

    assert_eq!(harness.graph.state(), GraphState::Prepared);
    assert_eq!(harness.backend.snapshot().element_sources_created, 0);
}
