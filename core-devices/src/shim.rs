//! Decorator over the platform device API.

use crate::descriptor::VirtualDeviceDescriptor;
use crate::policy::{AcquisitionDecision, AcquisitionPolicy};
use bridge_traits::devices::{
    AudioRequest, CaptureStreamSource, ConstraintSet, MediaDeviceInfo, MediaDevices,
};
use bridge_traits::error::Result;
use core_runtime::events::{EngineEvent, EventBus};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Wraps the original device API: enumeration gains the virtual device,
/// qualifying acquisitions receive the engine's capture stream.
///
/// Everything else reaches `original` untouched, including the constraint
/// object itself.
pub struct InterceptingMediaDevices<O, S: ?Sized> {
    original: O,
    streams: Arc<S>,
    descriptor: VirtualDeviceDescriptor,
    policy: AcquisitionPolicy,
    events: EventBus,
}

impl<O, S> InterceptingMediaDevices<O, S>
where
    O: MediaDevices,
    S: CaptureStreamSource<O::Stream> + ?Sized,
{
    pub fn new(
        original: O,
        streams: Arc<S>,
        descriptor: VirtualDeviceDescriptor,
        events: EventBus,
    ) -> Self {
        let policy = AcquisitionPolicy::new(descriptor.device_id());
        Self {
            original,
            streams,
            descriptor,
            policy,
            events,
        }
    }

    pub fn descriptor(&self) -> &VirtualDeviceDescriptor {
        &self.descriptor
    }

    fn device_id_of(request: &AudioRequest) -> Option<String> {
        match request {
            AudioRequest::Device(id) => Some(id.clone()),
            _ => None,
        }
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl<O, S> MediaDevices for InterceptingMediaDevices<O, S>
where
    O: MediaDevices,
    S: CaptureStreamSource<O::Stream> + ?Sized,
{
    type Stream = O::Stream;
    type Constraints = O::Constraints;

    #[instrument(skip(self))]
    async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>> {
        let mut devices = self.original.enumerate_devices().await?;
        let appended = self.descriptor.append_to(&mut devices);
        debug!(count = devices.len(), appended, "Enumerated devices");
        Ok(devices)
    }

    #[instrument(skip_all)]
    async fn get_user_media(&self, constraints: Self::Constraints) -> Result<Self::Stream> {
        let request = constraints.audio_request();
        let stream = self.streams.capture_stream();

        let decision = self.policy.decide(&request, stream.is_some());
        match (decision, stream) {
            (AcquisitionDecision::ServeCaptureStream, Some(stream)) => {
                info!(request = ?request, "Serving capture stream");
                self.events.emit(EngineEvent::StreamServed);
                Ok(stream)
            }
            (decision, _) => {
                debug!(request = ?request, decision = ?decision, "Passing acquisition through");
                self.events.emit(EngineEvent::AcquisitionPassedThrough {
                    device_id: Self::device_id_of(&request),
                });
                self.original.get_user_media(constraints).await
            }
        }
    }
}

impl<O, S: ?Sized> fmt::Debug for InterceptingMediaDevices<O, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptingMediaDevices")
            .field("descriptor", &self.descriptor)
            .finish()
    }
}
