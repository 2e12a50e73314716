use bridge_traits::devices::{
    AudioRequest, CaptureStreamSource, MediaDeviceInfo, MediaDeviceKind, MediaDevices,
    MediaStreamConstraints,
};
use bridge_traits::mock::{MockMediaDevices, MockMediaDevicesSlot, MockStream};
use core_devices::{
    install_shim, DeviceError, InstallGuard, InstallOutcome, InterceptingMediaDevices,
    VirtualDeviceDescriptor,
};
use core_runtime::config::VirtualDeviceConfig;
use core_runtime::events::{EngineEvent, EventBus, EventStream};
use parking_lot::Mutex;
use std::sync::Arc;

const VIRTUAL_ID: &str = "pokpok-tts-virtual-device";

/// Stream source whose stream the test controls.
#[derive(Default)]
struct ManualStreams {
    stream: Mutex<Option<MockStream>>,
}

impl ManualStreams {
    fn with_stream(id: &str) -> Arc<Self> {
        let streams = Self::default();
        *streams.stream.lock() = Some(MockStream::new(id));
        Arc::new(streams)
    }
}

impl CaptureStreamSource<MockStream> for ManualStreams {
    fn capture_stream(&self) -> Option<MockStream> {
        self.stream.lock().clone()
    }
}

fn shim(
    original: MockMediaDevices,
    streams: Arc<ManualStreams>,
    events: &EventBus,
) -> InterceptingMediaDevices<MockMediaDevices, ManualStreams> {
    InterceptingMediaDevices::new(
        original,
        streams,
        VirtualDeviceDescriptor::from(&VirtualDeviceConfig::default()),
        events.clone(),
    )
}

#[tokio::test]
async fn test_enumeration_appends_virtual_device() {
    let original = MockMediaDevices::with_default_hardware();
    let shim = shim(original, ManualStreams::with_stream("capture"), &EventBus::default());

    let devices = shim.enumerate_devices().await.unwrap();

    assert_eq!(devices.len(), 3);
    assert_eq!(devices[0].device_id, "hw-mic");
    assert_eq!(devices[1].device_id, "hw-cam");
    let virtual_entries: Vec<_> = devices
        .iter()
        .filter(|d| d.device_id == VIRTUAL_ID)
        .collect();
    assert_eq!(virtual_entries.len(), 1);
    assert_eq!(virtual_entries[0].kind, MediaDeviceKind::AudioInput);
    assert_eq!(virtual_entries[0].label, "pokpok tts");
}

#[tokio::test]
async fn test_enumeration_never_duplicates() {
    let original = MockMediaDevices::new(vec![MediaDeviceInfo::new(
        VIRTUAL_ID,
        MediaDeviceKind::AudioInput,
        "already here",
    )]);
    let shim = shim(original, Arc::default(), &EventBus::default());

    let devices = shim.enumerate_devices().await.unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].label, "already here");
}

#[tokio::test]
async fn test_generic_audio_gets_capture_stream() {
    let original = MockMediaDevices::with_default_hardware();
    let events = EventBus::default();
    let mut received = EventStream::new(events.subscribe());
    let shim = shim(original.clone(), ManualStreams::with_stream("capture"), &events);

    let stream = shim
        .get_user_media(MediaStreamConstraints::any_audio())
        .await
        .unwrap();

    assert_eq!(stream, MockStream::new("capture"));
    assert!(original.snapshot().acquisitions.is_empty());
    assert_eq!(received.drain(), vec![EngineEvent::StreamServed]);
}

#[tokio::test]
async fn test_virtual_id_gets_capture_stream() {
    let original = MockMediaDevices::with_default_hardware();
    let shim = shim(original.clone(), ManualStreams::with_stream("capture"), &EventBus::default());

    let stream = shim
        .get_user_media(MediaStreamConstraints::audio_device(VIRTUAL_ID))
        .await
        .unwrap();

    assert_eq!(stream, MockStream::new("capture"));
    assert!(original.snapshot().acquisitions.is_empty());
}

#[tokio::test]
async fn test_other_device_reaches_real_api() {
    let original = MockMediaDevices::with_default_hardware();
    let events = EventBus::default();
    let mut received = EventStream::new(events.subscribe());
    let shim = shim(original.clone(), ManualStreams::with_stream("capture"), &events);

    let stream = shim
        .get_user_media(MediaStreamConstraints::audio_device("hw-mic"))
        .await
        .unwrap();

    assert_eq!(stream, MockStream::new("hardware:hw-mic"));
    assert_eq!(
        original.snapshot().acquisitions,
        vec![AudioRequest::Device("hw-mic".into())]
    );
    assert_eq!(
        received.drain(),
        vec![EngineEvent::AcquisitionPassedThrough {
            device_id: Some("hw-mic".into())
        }]
    );
}

#[tokio::test]
async fn test_video_only_reaches_real_api() {
    let original = MockMediaDevices::with_default_hardware();
    let shim = shim(original.clone(), ManualStreams::with_stream("capture"), &EventBus::default());

    let stream = shim
        .get_user_media(MediaStreamConstraints::video_only())
        .await
        .unwrap();

    assert_eq!(stream, MockStream::new("hardware:video"));
    assert_eq!(original.snapshot().acquisitions, vec![AudioRequest::NotRequested]);
}

#[tokio::test]
async fn test_without_stream_falls_through_to_hardware() {
    let original = MockMediaDevices::with_default_hardware();
    let shim = shim(original.clone(), Arc::default(), &EventBus::default());

    let stream = shim
        .get_user_media(MediaStreamConstraints::any_audio())
        .await
        .unwrap();

    assert_eq!(stream, MockStream::new("hardware:default"));
    assert_eq!(original.snapshot().acquisitions, vec![AudioRequest::Any]);
}

#[tokio::test]
async fn test_parsed_constraint_shapes() {
    let original = MockMediaDevices::with_default_hardware();
    let shim = shim(original.clone(), ManualStreams::with_stream("capture"), &EventBus::default());

    let ideal: MediaStreamConstraints = serde_json::from_value(serde_json::json!({
        "audio": { "deviceId": { "ideal": VIRTUAL_ID }, "echoCancellation": false }
    }))
    .unwrap();
    assert_eq!(
        shim.get_user_media(ideal).await.unwrap(),
        MockStream::new("capture")
    );

    let list: MediaStreamConstraints = serde_json::from_value(serde_json::json!({
        "audio": { "deviceId": ["hw-mic", VIRTUAL_ID] }
    }))
    .unwrap();
    assert_eq!(
        shim.get_user_media(list).await.unwrap(),
        MockStream::new("hardware:hw-mic")
    );
}

#[tokio::test]
async fn test_empty_exact_falls_back_to_ideal_device() {
    let original = MockMediaDevices::with_default_hardware();
    let shim = shim(original.clone(), ManualStreams::with_stream("capture"), &EventBus::default());

    let constraints: MediaStreamConstraints = serde_json::from_value(serde_json::json!({
        "audio": { "deviceId": { "exact": "", "ideal": "hw-mic" } }
    }))
    .unwrap();

    assert_eq!(
        shim.get_user_media(constraints).await.unwrap(),
        MockStream::new("hardware:hw-mic")
    );
    assert_eq!(
        original.snapshot().acquisitions,
        vec![AudioRequest::Device("hw-mic".into())]
    );
}

#[tokio::test]
async fn test_install_wraps_once() {
    let guard = InstallGuard::new();
    let slot = MockMediaDevicesSlot::new(MockMediaDevices::with_default_hardware());
    let events = EventBus::default();
    let mut received = EventStream::new(events.subscribe());
    let streams = ManualStreams::with_stream("capture");
    let config = VirtualDeviceConfig::default();

    let first = install_shim(&guard, &slot, Arc::clone(&streams), &config, &events).unwrap();
    let second = install_shim(&guard, &slot, streams, &config, &events).unwrap();

    assert_eq!(first, InstallOutcome::Installed);
    assert_eq!(second, InstallOutcome::AlreadyInstalled);
    assert_eq!(slot.replacements(), 1);
    assert_eq!(slot.originals_taken(), 1);
    assert_eq!(
        received.drain(),
        vec![EngineEvent::ShimInstalled {
            device_id: VIRTUAL_ID.into()
        }]
    );

    let current = slot.current().unwrap();
    let devices = current.enumerate_devices().await.unwrap();
    assert_eq!(devices.iter().filter(|d| d.device_id == VIRTUAL_ID).count(), 1);

    // Pass-through reaches the true original, not another shim layer.
    current
        .get_user_media(MediaStreamConstraints::audio_device("hw-mic"))
        .await
        .unwrap();
    assert_eq!(slot.original_devices().snapshot().acquisitions.len(), 1);
}

#[tokio::test]
async fn test_install_accepts_trait_object_source() {
    let guard = InstallGuard::new();
    let slot = MockMediaDevicesSlot::new(MockMediaDevices::with_default_hardware());
    let streams: Arc<dyn CaptureStreamSource<MockStream>> = ManualStreams::with_stream("capture");

    install_shim(
        &guard,
        &slot,
        streams,
        &VirtualDeviceConfig::default(),
        &EventBus::default(),
    )
    .unwrap();

    let stream = slot
        .current()
        .unwrap()
        .get_user_media(MediaStreamConstraints::any_audio())
        .await
        .unwrap();
    assert_eq!(stream, MockStream::new("capture"));
}

#[test]
fn test_device_error_from_bridge() {
    let err: DeviceError = bridge_traits::BridgeError::NotAvailable("mediaDevices".into()).into();
    assert!(err.to_string().contains("mediaDevices"));
}
