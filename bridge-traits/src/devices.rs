//! Media device enumeration and acquisition.
//!
//! [`MediaDevices`] mirrors the two platform entry points a page uses to find
//! and open a microphone. [`MediaDevicesSlot`] is the place those entry points
//! live (e.g. `navigator.mediaDevices`): it hands out the untouched original
//! and accepts a replacement implementation.

use crate::{error::Result, platform::PlatformSendSync};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Device category reported by enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaDeviceKind {
    #[serde(rename = "audioinput")]
    AudioInput,
    #[serde(rename = "audiooutput")]
    AudioOutput,
    #[serde(rename = "videoinput")]
    VideoInput,
}

impl MediaDeviceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaDeviceKind::AudioInput => "audioinput",
            MediaDeviceKind::AudioOutput => "audiooutput",
            MediaDeviceKind::VideoInput => "videoinput",
        }
    }
}

/// One entry of an enumeration result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDeviceInfo {
    pub device_id: String,
    pub kind: MediaDeviceKind,
    pub label: String,
    #[serde(default)]
    pub group_id: String,
}

impl MediaDeviceInfo {
    pub fn new(
        device_id: impl Into<String>,
        kind: MediaDeviceKind,
        label: impl Into<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            kind,
            label: label.into(),
            group_id: String::new(),
        }
    }

    pub fn with_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = group_id.into();
        self
    }
}

/// What a constraint set asks for on the audio side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioRequest {
    /// No audio track requested (video-only or empty request).
    NotRequested,
    /// Audio requested without naming a device.
    Any,
    /// Audio requested from a specific device id.
    Device(String),
}

/// Read-only view over a platform constraint object.
///
/// Implementations keep the original object so that a pass-through call hands
/// the platform exactly what the page supplied.
pub trait ConstraintSet: PlatformSendSync {
    fn audio_request(&self) -> AudioRequest;
}

/// Typed form of the `getUserMedia` constraint dictionary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaStreamConstraints {
    #[serde(default)]
    pub audio: TrackConstraint,
    #[serde(default)]
    pub video: TrackConstraint,
}

impl MediaStreamConstraints {
    /// `{ audio: true }`
    pub fn any_audio() -> Self {
        Self {
            audio: TrackConstraint::Enabled(true),
            video: TrackConstraint::default(),
        }
    }

    /// `{ audio: { deviceId: { exact: id } } }`
    pub fn audio_device(device_id: impl Into<String>) -> Self {
        Self {
            audio: TrackConstraint::Detailed(TrackConstraintSet {
                device_id: Some(DeviceIdConstraint::Parameters {
                    exact: Some(DeviceIdValue::Single(device_id.into())),
                    ideal: None,
                }),
                ..Default::default()
            }),
            video: TrackConstraint::default(),
        }
    }

    /// `{ video: true }`
    pub fn video_only() -> Self {
        Self {
            audio: TrackConstraint::default(),
            video: TrackConstraint::Enabled(true),
        }
    }
}

impl ConstraintSet for MediaStreamConstraints {
    fn audio_request(&self) -> AudioRequest {
        match &self.audio {
            TrackConstraint::Enabled(false) => AudioRequest::NotRequested,
            TrackConstraint::Enabled(true) => AudioRequest::Any,
            TrackConstraint::Detailed(set) => match set.requested_device_id() {
                Some(id) => AudioRequest::Device(id),
                None => AudioRequest::Any,
            },
        }
    }
}

/// `audio` / `video` member: a flag or a detailed constraint set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrackConstraint {
    Enabled(bool),
    Detailed(TrackConstraintSet),
}

impl Default for TrackConstraint {
    fn default() -> Self {
        TrackConstraint::Enabled(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackConstraintSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<DeviceIdConstraint>,
    /// Remaining members (echoCancellation, sampleRate, ...), kept verbatim.
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

impl TrackConstraintSet {
    /// Device id the caller names, preferring `exact` over `ideal`. Empty
    /// strings count as "no device named".
    pub fn requested_device_id(&self) -> Option<String> {
        let named = match self.device_id.as_ref()? {
            DeviceIdConstraint::Value(value) => value.named(),
            DeviceIdConstraint::Parameters { exact, ideal } => exact
                .as_ref()
                .and_then(DeviceIdValue::named)
                .or_else(|| ideal.as_ref().and_then(DeviceIdValue::named)),
        };
        named.map(str::to_owned)
    }
}

/// `deviceId` member: a bare value or `{ exact, ideal }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeviceIdConstraint {
    Value(DeviceIdValue),
    Parameters {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exact: Option<DeviceIdValue>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ideal: Option<DeviceIdValue>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeviceIdValue {
    Single(String),
    List(Vec<String>),
}

impl DeviceIdValue {
    /// First id, unless it is empty.
    fn named(&self) -> Option<&str> {
        let first = match self {
            DeviceIdValue::Single(id) => Some(id.as_str()),
            DeviceIdValue::List(ids) => ids.first().map(String::as_str),
        };
        first.filter(|id| !id.is_empty())
    }
}

/// The page-facing device API.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait MediaDevices: PlatformSendSync {
    type Stream: Clone + PlatformSendSync + 'static;
    type Constraints: ConstraintSet;

    async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>>;

    async fn get_user_media(&self, constraints: Self::Constraints) -> Result<Self::Stream>;
}

/// Shared handle to a replacement device API.
pub type SharedMediaDevices<S, C> = Arc<dyn MediaDevices<Stream = S, Constraints = C>>;

/// Location of the platform's device entry points.
pub trait MediaDevicesSlot: PlatformSendSync {
    type Stream: Clone + PlatformSendSync + 'static;
    type Constraints: ConstraintSet;
    type Original: MediaDevices<Stream = Self::Stream, Constraints = Self::Constraints> + 'static;

    /// Capture the entry points currently installed. Called once, before
    /// [`replace`](MediaDevicesSlot::replace).
    fn original(&self) -> Result<Self::Original>;

    /// Route every subsequent page call through `devices`.
    fn replace(&self, devices: SharedMediaDevices<Self::Stream, Self::Constraints>) -> Result<()>;
}

/// Read access to the engine's capture stream.
pub trait CaptureStreamSource<S>: PlatformSendSync {
    /// The capture stream, once the audio graph has created one.
    fn capture_stream(&self) -> Option<S>;
}
