//! The synthetic input device advertised to page code.

use bridge_traits::devices::{MediaDeviceInfo, MediaDeviceKind};
use core_runtime::config::VirtualDeviceConfig;

/// Identity of the virtual microphone. Constant for the life of the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualDeviceDescriptor {
    device_id: String,
    label: String,
    group_id: String,
}

impl VirtualDeviceDescriptor {
    pub fn new(
        device_id: impl Into<String>,
        label: impl Into<String>,
        group_id: impl Into<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            label: label.into(),
            group_id: group_id.into(),
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Enumeration entry for this device. Always an audio input.
    pub fn to_device_info(&self) -> MediaDeviceInfo {
        MediaDeviceInfo::new(&*self.device_id, MediaDeviceKind::AudioInput, &*self.label)
            .with_group_id(&*self.group_id)
    }

    /// Append this device to an enumeration result unless an entry with the
    /// same id is already listed. Returns whether it was appended.
    pub fn append_to(&self, devices: &mut Vec<MediaDeviceInfo>) -> bool {
        if devices.iter().any(|d| d.device_id == self.device_id) {
            return false;
        }
        devices.push(self.to_device_info());
        true
    }
}

impl From<&VirtualDeviceConfig> for VirtualDeviceDescriptor {
    fn from(config: &VirtualDeviceConfig) -> Self {
        Self::new(&*config.device_id, &*config.label, &*config.group_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_default_config() {
        let descriptor = VirtualDeviceDescriptor::from(&VirtualDeviceConfig::default());
        let info = descriptor.to_device_info();
        assert_eq!(info.device_id, "pokpok-tts-virtual-device");
        assert_eq!(info.kind, MediaDeviceKind::AudioInput);
        assert_eq!(info.label, "pokpok tts");
        assert_eq!(info.group_id, "");
    }

    #[test]
    fn test_append_once() {
        let descriptor = VirtualDeviceDescriptor::new("virtual", "Virtual", "group");
        let mut devices = vec![MediaDeviceInfo::new(
            "mic",
            MediaDeviceKind::AudioInput,
            "Mic",
        )];

        assert!(descriptor.append_to(&mut devices));
        assert!(!descriptor.append_to(&mut devices));
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[1].group_id, "group");
    }
}
