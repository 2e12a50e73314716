//! Control messages delivered over the page's cross-context channel.
//!
//! The control surface posts plain objects tagged with `direction` and
//! `type`. [`WireMessage`] is their serializable shape; hosts that can carry
//! platform blobs build [`ControlMessage`] directly instead.

use crate::{
    error::{BridgeError, Result},
    playback::AudioPayload,
};
use serde::{Deserialize, Serialize};

pub const SET_CONTENT_TYPE: &str = "setTTS";
pub const SET_BLOB_TYPE: &str = "setTTSBlob";
pub const PLAY_TYPE: &str = "playTTS";

/// Request understood by the engine.
#[derive(Debug, Clone)]
pub enum ControlMessage {
    /// Replace the current audio content.
    SetContent(AudioPayload),
    /// Start playback of the current content.
    Play,
}

impl ControlMessage {
    /// Whether a `type` tag names a set-content request.
    pub fn is_set_type(message_type: &str) -> bool {
        message_type == SET_CONTENT_TYPE || message_type == SET_BLOB_TYPE
    }
}

/// Serializable message as posted on the channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMessage {
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(rename = "type", default)]
    pub message_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_buffer: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
}

impl WireMessage {
    pub fn set_text(direction: &str, text: impl Into<String>) -> Self {
        Self {
            direction: Some(direction.to_string()),
            message_type: Some(SET_CONTENT_TYPE.to_string()),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn set_bytes(direction: &str, bytes: Vec<u8>, mime: Option<String>) -> Self {
        Self {
            direction: Some(direction.to_string()),
            message_type: Some(SET_CONTENT_TYPE.to_string()),
            array_buffer: Some(bytes),
            mime,
            ..Default::default()
        }
    }

    pub fn play(direction: &str) -> Self {
        Self {
            direction: Some(direction.to_string()),
            message_type: Some(PLAY_TYPE.to_string()),
            ..Default::default()
        }
    }

    /// Interpret the message.
    ///
    /// Returns `Ok(None)` for traffic that is not addressed to the engine
    /// (other direction, unknown type). A set-content message carrying no
    /// content at all is an error.
    pub fn into_control(self, expected_direction: &str) -> Result<Option<ControlMessage>> {
        if self.direction.as_deref() != Some(expected_direction) {
            return Ok(None);
        }
        let Some(message_type) = self.message_type.as_deref() else {
            return Ok(None);
        };

        if message_type == PLAY_TYPE {
            return Ok(Some(ControlMessage::Play));
        }
        if !ControlMessage::is_set_type(message_type) {
            return Ok(None);
        }

        if let Some(bytes) = self.array_buffer {
            return Ok(Some(ControlMessage::SetContent(AudioPayload::bytes(
                bytes, self.mime,
            ))));
        }
        if let Some(text) = self.text {
            return Ok(Some(ControlMessage::SetContent(AudioPayload::text(text))));
        }
        Err(BridgeError::InvalidMessage(format!(
            "{message_type} carries no text, arrayBuffer or blob"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DIRECTION: &str = "from-extension";

    fn control(value: serde_json::Value) -> Result<Option<ControlMessage>> {
        serde_json::from_value::<WireMessage>(value)
            .unwrap()
            .into_control(DIRECTION)
    }

    #[test]
    fn parses_text_message() {
        let message = control(json!({"direction": DIRECTION, "type": "setTTS", "text": "hello"}))
            .unwrap()
            .unwrap();
        match message {
            ControlMessage::SetContent(AudioPayload::Text { text }) => assert_eq!(text, "hello"),
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn array_buffer_wins_over_text() {
        let message = control(json!({
            "direction": DIRECTION,
            "type": "setTTS",
            "text": "ignored",
            "arrayBuffer": [1, 2, 3],
            "mime": "audio/wav"
        }))
        .unwrap()
        .unwrap();
        match message {
            ControlMessage::SetContent(AudioPayload::Bytes { bytes, mime_hint }) => {
                assert_eq!(&bytes[..], &[1, 2, 3]);
                assert_eq!(mime_hint.as_deref(), Some("audio/wav"));
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn parses_play() {
        assert!(matches!(
            control(json!({"direction": DIRECTION, "type": "playTTS"})).unwrap(),
            Some(ControlMessage::Play)
        ));
    }

    #[test]
    fn ignores_foreign_traffic() {
        assert!(control(json!({"direction": "to-extension", "type": "playTTS"}))
            .unwrap()
            .is_none());
        assert!(control(json!({"type": "playTTS"})).unwrap().is_none());
        assert!(control(json!({"direction": DIRECTION, "type": "other"}))
            .unwrap()
            .is_none());
    }

    #[test]
    fn set_without_content_is_rejected() {
        let err = control(json!({"direction": DIRECTION, "type": "setTTS"})).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidMessage(_)));
    }

    #[test]
    fn blob_alias_is_a_set_type() {
        assert!(ControlMessage::is_set_type("setTTSBlob"));
        assert!(ControlMessage::is_set_type("setTTS"));
        assert!(!ControlMessage::is_set_type("playTTS"));
    }

    #[test]
    fn constructors_round_trip_through_control() {
        assert!(matches!(
            WireMessage::play(DIRECTION).into_control(DIRECTION).unwrap(),
            Some(ControlMessage::Play)
        ));
        assert!(matches!(
            WireMessage::set_text(DIRECTION, "hi").into_control(DIRECTION).unwrap(),
            Some(ControlMessage::SetContent(AudioPayload::Text { .. }))
        ));
    }
}
