//! Contract with the privileged process that fetches speech audio.
//!
//! The engine never performs network requests itself. A host that can reach
//! a text-to-speech service implements [`SpeechFetcher`]; responses follow
//! the `{ ok, dataBase64 | bytes, mime }` / `{ ok: false, error }` shape used
//! on the extension messaging channel, where raw buffers do not survive
//! structured cloning and are shipped as base64 instead.

use crate::{
    error::{BridgeError, Result},
    platform::PlatformSendSync,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Response to a fetch request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Audio returned by a successful fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedAudio {
    pub bytes: Bytes,
    pub mime: Option<String>,
}

impl FetchResponse {
    pub fn success(bytes: impl Into<Vec<u8>>, mime: impl Into<String>) -> Self {
        Self {
            ok: true,
            bytes: Some(bytes.into()),
            mime: Some(mime.into()),
            ..Default::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Extract the audio, decoding base64 when the bytes were shipped as text.
    pub fn into_audio(self) -> Result<FetchedAudio> {
        if !self.ok {
            return Err(BridgeError::OperationFailed(
                self.error.unwrap_or_else(|| "speech fetch failed".to_string()),
            ));
        }

        let bytes = match (self.bytes, self.data_base64) {
            (Some(bytes), _) => Bytes::from(bytes),
            (None, Some(encoded)) => BASE64
                .decode(encoded.as_bytes())
                .map(Bytes::from)
                .map_err(|err| BridgeError::OperationFailed(format!("decode base64 audio: {err}")))?,
            (None, None) => {
                return Err(BridgeError::OperationFailed(
                    "speech fetch returned no audio".to_string(),
                ))
            }
        };

        Ok(FetchedAudio {
            bytes,
            mime: self.mime,
        })
    }
}

/// Host capability that turns text into encoded speech audio.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait SpeechFetcher: PlatformSendSync {
    async fn fetch_speech(&self, text: &str) -> Result<FetchResponse>;
}
