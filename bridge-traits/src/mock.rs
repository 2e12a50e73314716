//! In-memory bridge implementations for tests.
//!
//! Every mock records what the engine asked of it in a shared state object so
//! tests can assert on graph wiring, node lifetimes and URL bookkeeping
//! without a browser. Failure knobs on the state simulate the platform
//! refusing an operation.

use crate::{
    audio_graph::{
        AudioBackend, AudioContext, BufferSourceNode, CaptureDestination, ElementSourceNode,
        MediaElement, ObjectUrlRegistry,
    },
    devices::{
        AudioRequest, ConstraintSet, MediaDeviceInfo, MediaDeviceKind, MediaDevices,
        MediaDevicesSlot, MediaStreamConstraints, SharedMediaDevices,
    },
    error::{BridgeError, Result},
    fetch::{FetchResponse, SpeechFetcher},
    playback::{BlobHandle, DecodedAudio},
};
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Stream handle handed out by the mocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockStream {
    pub id: String,
}

impl MockStream {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Lifecycle of one buffer-source node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BufferSourceRecord {
    pub sample_rate: u32,
    pub frames: usize,
    pub connected_to_capture: bool,
    pub connected_to_output: bool,
    pub started: bool,
    pub stopped: bool,
}

impl BufferSourceRecord {
    pub fn is_active(&self) -> bool {
        self.started && !self.stopped
    }
}

/// Everything the audio mocks observed.
#[derive(Debug, Clone, Default)]
pub struct MockAudioState {
    pub contexts_created: usize,
    pub resumes: usize,
    pub destinations_created: usize,
    pub buffers_created: usize,
    pub buffer_sources: Vec<BufferSourceRecord>,
    pub elements_created: usize,
    pub element_sources_created: usize,
    pub element_sources_connected: usize,
    pub element_sources_set: Vec<String>,
    pub element_loads: usize,
    pub element_plays: usize,
    pub live_urls: Vec<String>,
    pub revoked_urls: Vec<String>,
    pub urls_created: usize,

    pub fail_context: bool,
    pub fail_resume: bool,
    pub fail_buffer_source: bool,
    pub fail_element_source: bool,
    pub fail_element_load: bool,
    pub refuse_element_play: bool,
}

impl MockAudioState {
    pub fn active_buffer_sources(&self) -> Vec<&BufferSourceRecord> {
        self.buffer_sources.iter().filter(|r| r.is_active()).collect()
    }
}

/// Audio backend plus object URL registry.
#[derive(Debug, Clone, Default)]
pub struct MockAudioBackend {
    state: Arc<Mutex<MockAudioState>>,
}

impl MockAudioBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the recorded state.
    pub fn snapshot(&self) -> MockAudioState {
        self.state.lock().clone()
    }

    /// Adjust failure knobs.
    pub fn configure(&self, f: impl FnOnce(&mut MockAudioState)) {
        f(&mut self.state.lock());
    }
}

impl AudioBackend for MockAudioBackend {
    type Element = MockElement;
    type Context = MockContext;

    fn create_context(&self) -> Result<MockContext> {
        let mut state = self.state.lock();
        if state.fail_context {
            return Err(BridgeError::NotAvailable("AudioContext".into()));
        }
        state.contexts_created += 1;
        Ok(MockContext {
            state: Arc::clone(&self.state),
        })
    }

    fn create_element(&self) -> Result<MockElement> {
        self.state.lock().elements_created += 1;
        Ok(MockElement {
            state: Arc::clone(&self.state),
        })
    }
}

impl ObjectUrlRegistry for MockAudioBackend {
    fn create_object_url(&self, _data: &Bytes, mime: &str) -> Result<String> {
        let mut state = self.state.lock();
        state.urls_created += 1;
        let url = format!("blob:mock/{}?type={}", state.urls_created, mime);
        state.live_urls.push(url.clone());
        Ok(url)
    }

    fn revoke_object_url(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.live_urls.retain(|live| live != url);
        state.revoked_urls.push(url.to_string());
        Ok(())
    }
}

#[derive(Debug)]
pub struct MockContext {
    state: Arc<Mutex<MockAudioState>>,
}

#[derive(Debug)]
pub struct MockDestination {
    stream: MockStream,
}

#[derive(Debug)]
pub struct MockBuffer {
    pub sample_rate: u32,
    pub frames: usize,
}

#[derive(Debug)]
pub struct MockBufferSource {
    state: Arc<Mutex<MockAudioState>>,
    index: usize,
}

#[derive(Debug)]
pub struct MockElementSource {
    state: Arc<Mutex<MockAudioState>>,
}

#[derive(Debug, Clone)]
pub struct MockElement {
    state: Arc<Mutex<MockAudioState>>,
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl AudioContext for MockContext {
    type Stream = MockStream;
    type Destination = MockDestination;
    type Buffer = MockBuffer;
    type BufferSource = MockBufferSource;
    type Element = MockElement;
    type ElementSource = MockElementSource;

    async fn resume(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.resumes += 1;
        if state.fail_resume {
            return Err(BridgeError::OperationFailed("resume rejected".into()));
        }
        Ok(())
    }

    fn create_capture_destination(&self) -> Result<MockDestination> {
        let mut state = self.state.lock();
        state.destinations_created += 1;
        Ok(MockDestination {
            stream: MockStream::new(format!("capture-{}", state.destinations_created)),
        })
    }

    fn create_buffer(&self, audio: &DecodedAudio) -> Result<MockBuffer> {
        self.state.lock().buffers_created += 1;
        Ok(MockBuffer {
            sample_rate: audio.sample_rate,
            frames: audio.frames(),
        })
    }

    fn create_buffer_source(&self, buffer: &MockBuffer) -> Result<MockBufferSource> {
        let mut state = self.state.lock();
        if state.fail_buffer_source {
            return Err(BridgeError::OperationFailed("buffer source rejected".into()));
        }
        state.buffer_sources.push(BufferSourceRecord {
            sample_rate: buffer.sample_rate,
            frames: buffer.frames,
            ..Default::default()
        });
        Ok(MockBufferSource {
            state: Arc::clone(&self.state),
            index: state.buffer_sources.len() - 1,
        })
    }

    fn create_element_source(&self, _element: &MockElement) -> Result<MockElementSource> {
        let mut state = self.state.lock();
        if state.fail_element_source {
            return Err(BridgeError::OperationFailed("element already bound".into()));
        }
        state.element_sources_created += 1;
        Ok(MockElementSource {
            state: Arc::clone(&self.state),
        })
    }
}

impl CaptureDestination for MockDestination {
    type Stream = MockStream;

    fn stream(&self) -> MockStream {
        self.stream.clone()
    }
}

impl MockBufferSource {
    fn update(&self, f: impl FnOnce(&mut BufferSourceRecord) -> Result<()>) -> Result<()> {
        let mut state = self.state.lock();
        let record = state
            .buffer_sources
            .get_mut(self.index)
            .ok_or_else(|| BridgeError::OperationFailed("unknown node".into()))?;
        f(record)
    }
}

impl BufferSourceNode for MockBufferSource {
    type Destination = MockDestination;

    fn connect(&self, _destination: &MockDestination) -> Result<()> {
        self.update(|record| {
            record.connected_to_capture = true;
            Ok(())
        })
    }

    fn connect_to_output(&self) -> Result<()> {
        self.update(|record| {
            record.connected_to_output = true;
            Ok(())
        })
    }

    fn start(&self) -> Result<()> {
        self.update(|record| {
            if record.started {
                return Err(BridgeError::OperationFailed("node already started".into()));
            }
            record.started = true;
            Ok(())
        })
    }

    fn stop(&self) -> Result<()> {
        self.update(|record| {
            if !record.started {
                return Err(BridgeError::OperationFailed("node never started".into()));
            }
            record.stopped = true;
            Ok(())
        })
    }
}

impl ElementSourceNode for MockElementSource {
    type Destination = MockDestination;

    fn connect(&self, _destination: &MockDestination) -> Result<()> {
        self.state.lock().element_sources_connected += 1;
        Ok(())
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl MediaElement for MockElement {
    fn set_source(&self, url: &str) -> Result<()> {
        self.state.lock().element_sources_set.push(url.to_string());
        Ok(())
    }

    fn load(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_element_load {
            return Err(BridgeError::OperationFailed("element load failed".into()));
        }
        state.element_loads += 1;
        Ok(())
    }

    async fn play(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.element_plays += 1;
        if state.refuse_element_play {
            return Err(BridgeError::PlaybackRefused(
                "play() can only be initiated by a user gesture".into(),
            ));
        }
        Ok(())
    }
}

/// Recorded device API calls.
#[derive(Debug, Clone, Default)]
pub struct MockDeviceState {
    pub enumerate_calls: usize,
    pub acquisitions: Vec<AudioRequest>,
}

/// Device API with a fixed hardware list.
#[derive(Debug, Clone)]
pub struct MockMediaDevices {
    devices: Vec<MediaDeviceInfo>,
    state: Arc<Mutex<MockDeviceState>>,
}

impl MockMediaDevices {
    pub fn new(devices: Vec<MediaDeviceInfo>) -> Self {
        Self {
            devices,
            state: Arc::default(),
        }
    }

    /// One microphone and one camera.
    pub fn with_default_hardware() -> Self {
        Self::new(vec![
            MediaDeviceInfo::new("hw-mic", MediaDeviceKind::AudioInput, "Built-in Microphone"),
            MediaDeviceInfo::new("hw-cam", MediaDeviceKind::VideoInput, "FaceTime Camera"),
        ])
    }

    pub fn snapshot(&self) -> MockDeviceState {
        self.state.lock().clone()
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl MediaDevices for MockMediaDevices {
    type Stream = MockStream;
    type Constraints = MediaStreamConstraints;

    async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>> {
        self.state.lock().enumerate_calls += 1;
        Ok(self.devices.clone())
    }

    async fn get_user_media(&self, constraints: MediaStreamConstraints) -> Result<MockStream> {
        let request = constraints.audio_request();
        let id = match &request {
            AudioRequest::Device(id) => format!("hardware:{id}"),
            AudioRequest::Any => "hardware:default".to_string(),
            AudioRequest::NotRequested => "hardware:video".to_string(),
        };
        self.state.lock().acquisitions.push(request);
        Ok(MockStream::new(id))
    }
}

/// Slot holding the original device API and whatever replaced it.
pub struct MockMediaDevicesSlot {
    original: MockMediaDevices,
    installed: Mutex<Vec<SharedMediaDevices<MockStream, MediaStreamConstraints>>>,
    originals_taken: Mutex<usize>,
}

impl MockMediaDevicesSlot {
    pub fn new(original: MockMediaDevices) -> Self {
        Self {
            original,
            installed: Mutex::new(Vec::new()),
            originals_taken: Mutex::new(0),
        }
    }

    pub fn original_devices(&self) -> &MockMediaDevices {
        &self.original
    }

    /// Number of times a replacement was installed.
    pub fn replacements(&self) -> usize {
        self.installed.lock().len()
    }

    pub fn originals_taken(&self) -> usize {
        *self.originals_taken.lock()
    }

    /// What page code would call right now.
    pub fn current(&self) -> Option<SharedMediaDevices<MockStream, MediaStreamConstraints>> {
        self.installed.lock().last().cloned()
    }
}

impl MediaDevicesSlot for MockMediaDevicesSlot {
    type Stream = MockStream;
    type Constraints = MediaStreamConstraints;
    type Original = MockMediaDevices;

    fn original(&self) -> Result<MockMediaDevices> {
        *self.originals_taken.lock() += 1;
        Ok(self.original.clone())
    }

    fn replace(&self, devices: SharedMediaDevices<MockStream, MediaStreamConstraints>) -> Result<()> {
        self.installed.lock().push(devices);
        Ok(())
    }
}

/// Blob whose read can be held open until the test releases it.
#[derive(Debug)]
pub struct MockBlob {
    bytes: Bytes,
    mime: Option<String>,
    fail: bool,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl MockBlob {
    pub fn new(bytes: impl Into<Bytes>, mime: Option<&str>) -> Self {
        Self {
            bytes: bytes.into(),
            mime: mime.map(str::to_owned),
            fail: false,
            gate: Mutex::new(None),
        }
    }

    /// Blob whose read fails.
    pub fn unreadable() -> Self {
        Self {
            fail: true,
            ..Self::new(Bytes::new(), None)
        }
    }

    /// Blob whose read completes only after the returned sender fires.
    pub fn gated(bytes: impl Into<Bytes>, mime: Option<&str>) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        let blob = Self::new(bytes, mime);
        *blob.gate.lock() = Some(rx);
        (blob, tx)
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl BlobHandle for MockBlob {
    fn mime_type(&self) -> Option<String> {
        self.mime.clone()
    }

    async fn read_bytes(&self) -> Result<Bytes> {
        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if self.fail {
            return Err(BridgeError::OperationFailed("blob read failed".into()));
        }
        Ok(self.bytes.clone())
    }
}

/// Fetcher returning a canned response.
#[derive(Debug)]
pub struct MockSpeechFetcher {
    response: FetchResponse,
    requests: Mutex<Vec<String>>,
}

impl MockSpeechFetcher {
    pub fn new(response: FetchResponse) -> Self {
        Self {
            response,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl SpeechFetcher for MockSpeechFetcher {
    async fn fetch_speech(&self, text: &str) -> Result<FetchResponse> {
        self.requests.lock().push(text.to_string());
        Ok(self.response.clone())
    }
}
