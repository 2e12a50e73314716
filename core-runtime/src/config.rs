//! # Engine Configuration
//!
//! Settings for the virtual microphone engine. Every field has a default, so
//! an empty JSON object (or no configuration at all) yields a working engine.
//! Hosts that inject the engine into a page can pass a partial JSON document
//! to override individual values:
//!
//! ```rust
//! use core_runtime::config::EngineConfig;
//!
//! let config = EngineConfig::from_json(r#"{"virtualDevice": {"label": "Narrator"}}"#).unwrap();
//! assert_eq!(config.virtual_device.label, "Narrator");
//! assert_eq!(config.virtual_device.device_id, "pokpok-tts-virtual-device");
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Descriptor advertised for the virtual input device.
    #[serde(default)]
    pub virtual_device: VirtualDeviceConfig,

    /// How text and untyped bytes are turned into a playable resource.
    #[serde(default)]
    pub fallback: FallbackConfig,

    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub messaging: MessagingConfig,

    /// Page-global flag marking the engine as installed.
    ///
    /// Default: `__tts_virtual_mic_injected`.
    #[serde(default = "default_injection_flag")]
    pub injection_flag: String,

    /// Buffer size of the engine event bus.
    ///
    /// Default: 64.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            virtual_device: VirtualDeviceConfig::default(),
            fallback: FallbackConfig::default(),
            playback: PlaybackConfig::default(),
            messaging: MessagingConfig::default(),
            injection_flag: default_injection_flag(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.virtual_device.device_id.trim().is_empty() {
            return Err(Error::Config("virtualDevice.deviceId must not be empty".into()));
        }

        if !self.fallback.speech_url_template.contains(TEXT_PLACEHOLDER) {
            return Err(Error::Config(format!(
                "fallback.speechUrlTemplate must contain {}",
                TEXT_PLACEHOLDER
            )));
        }

        if self.fallback.default_mime.trim().is_empty() {
            return Err(Error::Config("fallback.defaultMime must not be empty".into()));
        }

        if self.messaging.direction.is_empty() {
            return Err(Error::Config("messaging.direction must not be empty".into()));
        }

        if self.injection_flag.is_empty() {
            return Err(Error::Config("injectionFlag must not be empty".into()));
        }

        if self.event_capacity == 0 {
            return Err(Error::Config("eventCapacity must be > 0".into()));
        }

        Ok(())
    }

    /// Remote speech URL for `text` in the configured language.
    pub fn speech_url(&self, text: &str) -> String {
        self.fallback.speech_url(text)
    }
}

pub const TEXT_PLACEHOLDER: &str = "{text}";
pub const LANG_PLACEHOLDER: &str = "{lang}";

/// Descriptor of the synthetic input device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualDeviceConfig {
    /// Default: `pokpok-tts-virtual-device`.
    #[serde(default = "default_device_id")]
    pub device_id: String,

    /// Default: `pokpok tts`.
    #[serde(default = "default_device_label")]
    pub label: String,

    /// Default: empty.
    #[serde(default)]
    pub group_id: String,
}

impl Default for VirtualDeviceConfig {
    fn default() -> Self {
        Self {
            device_id: default_device_id(),
            label: default_device_label(),
            group_id: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackConfig {
    /// URL template for remote speech; `{text}` and `{lang}` are substituted
    /// percent-encoded.
    #[serde(default = "default_speech_url_template")]
    pub speech_url_template: String,

    /// Default: `en`.
    #[serde(default = "default_language")]
    pub language: String,

    /// MIME type used when neither a hint nor the content identifies the
    /// format.
    ///
    /// Default: `audio/mpeg`.
    #[serde(default = "default_mime")]
    pub default_mime: String,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            speech_url_template: default_speech_url_template(),
            language: default_language(),
            default_mime: default_mime(),
        }
    }
}

impl FallbackConfig {
    pub fn speech_url(&self, text: &str) -> String {
        self.speech_url_template
            .replace(TEXT_PLACEHOLDER, &urlencoding::encode(text))
            .replace(LANG_PLACEHOLDER, &urlencoding::encode(&self.language))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackConfig {
    /// Also route decoded audio to the local speakers.
    ///
    /// Default: true.
    #[serde(default = "default_monitor_locally")]
    pub monitor_locally: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            monitor_locally: default_monitor_locally(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagingConfig {
    /// `direction` tag a control message must carry.
    ///
    /// Default: `from-extension`.
    #[serde(default = "default_direction")]
    pub direction: String,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            direction: default_direction(),
        }
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_device_id() -> String {
    "pokpok-tts-virtual-device".to_string()
}

fn default_device_label() -> String {
    "pokpok tts".to_string()
}

fn default_speech_url_template() -> String {
    "https://translate.google.com/translate_tts?ie=UTF-8&q={text}&tl={lang}&client=tw-ob"
        .to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_mime() -> String {
    "audio/mpeg".to_string()
}

fn default_monitor_locally() -> bool {
    true
}

fn default_direction() -> String {
    "from-extension".to_string()
}

fn default_injection_flag() -> String {
    "__tts_virtual_mic_injected".to_string()
}

fn default_event_capacity() -> usize {
    64
}
