//! Which acquisition requests receive the capture stream.
//!
//! | Audio requested | Device named      | Stream exists | Decision     |
//! |-----------------|-------------------|---------------|--------------|
//! | no              | -                 | -             | pass through |
//! | yes             | none              | yes           | serve        |
//! | yes             | the virtual id    | yes           | serve        |
//! | yes             | any other id      | -             | pass through |
//! | yes             | none / virtual id | no            | pass through |
//!
//! Passing through hands the request to the real device API unchanged, so a
//! page never receives a stream that was never initialized.

use bridge_traits::devices::AudioRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionDecision {
    ServeCaptureStream,
    PassThrough(PassThroughReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassThroughReason {
    /// Video-only or empty request.
    NoAudioRequested,
    /// A real device was named.
    OtherDevice,
    /// The audio graph has not created a capture stream yet.
    NoCaptureStream,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionPolicy {
    virtual_device_id: String,
}

impl AcquisitionPolicy {
    pub fn new(virtual_device_id: impl Into<String>) -> Self {
        Self {
            virtual_device_id: virtual_device_id.into(),
        }
    }

    /// Whether `request` targets the virtual device.
    pub fn claims(&self, request: &AudioRequest) -> bool {
        match request {
            AudioRequest::NotRequested => false,
            AudioRequest::Any => true,
            AudioRequest::Device(id) => *id == self.virtual_device_id,
        }
    }

    pub fn decide(&self, request: &AudioRequest, stream_available: bool) -> AcquisitionDecision {
        match request {
            AudioRequest::NotRequested => {
                AcquisitionDecision::PassThrough(PassThroughReason::NoAudioRequested)
            }
            _ if !self.claims(request) => {
                AcquisitionDecision::PassThrough(PassThroughReason::OtherDevice)
            }
            _ if !stream_available => {
                AcquisitionDecision::PassThrough(PassThroughReason::NoCaptureStream)
            }
            _ => AcquisitionDecision::ServeCaptureStream,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> AcquisitionPolicy {
        AcquisitionPolicy::new("virtual")
    }

    #[test]
    fn test_generic_audio_is_served() {
        assert_eq!(
            policy().decide(&AudioRequest::Any, true),
            AcquisitionDecision::ServeCaptureStream
        );
    }

    #[test]
    fn test_virtual_id_is_served() {
        assert_eq!(
            policy().decide(&AudioRequest::Device("virtual".into()), true),
            AcquisitionDecision::ServeCaptureStream
        );
    }

    #[test]
    fn test_other_device_passes_through() {
        assert_eq!(
            policy().decide(&AudioRequest::Device("hw-mic".into()), true),
            AcquisitionDecision::PassThrough(PassThroughReason::OtherDevice)
        );
    }

    #[test]
    fn test_video_only_passes_through() {
        assert_eq!(
            policy().decide(&AudioRequest::NotRequested, true),
            AcquisitionDecision::PassThrough(PassThroughReason::NoAudioRequested)
        );
    }

    #[test]
    fn test_missing_stream_passes_through() {
        assert_eq!(
            policy().decide(&AudioRequest::Any, false),
            AcquisitionDecision::PassThrough(PassThroughReason::NoCaptureStream)
        );
        assert_eq!(
            policy().decide(&AudioRequest::Device("virtual".into()), false),
            AcquisitionDecision::PassThrough(PassThroughReason::NoCaptureStream)
        );
    }

    #[test]
    fn test_id_match_is_exact() {
        assert!(!policy().claims(&AudioRequest::Device("Virtual".into())));
        assert!(!policy().claims(&AudioRequest::Device("virtual-2".into())));
    }
}
