//! WebAssembly bindings for bridge-wasm
//!
//! JavaScript-friendly wrappers that let the injecting script hand its own
//! implementations to the engine.

use crate::error::{js_error, WasmError};
use bridge_traits::{
    error::{BridgeError, Result as BridgeResult},
    fetch::{FetchResponse, SpeechFetcher},
};
use js_sys::{Function as JsFunction, Promise};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

// =============================================================================
// Speech Fetcher
// =============================================================================

/// JavaScript-accessible speech fetcher
///
/// Wraps a function that asks a privileged context (an extension background
/// page, a service worker) for speech audio.
///
/// # Example
///
/// ```javascript
/// const fetcher = new JsSpeechFetcher(async (text) => {
///   return chrome.runtime.sendMessage({ type: 'fetchTTS', text });
///   // -> { ok: true, dataBase64: '...', mime: 'audio/mpeg' }
///   // -> { ok: false, error: 'reason' }
/// });
/// ```
#[wasm_bindgen]
#[derive(Clone)]
pub struct JsSpeechFetcher {
    fetch: JsFunction,
}

#[wasm_bindgen]
impl JsSpeechFetcher {
    /// Create a fetcher from `(text) => Promise<response>`.
    #[wasm_bindgen(constructor)]
    pub fn new(fetch: JsFunction) -> JsSpeechFetcher {
        Self { fetch }
    }
}

#[async_trait::async_trait(?Send)]
impl SpeechFetcher for JsSpeechFetcher {
    async fn fetch_speech(&self, text: &str) -> BridgeResult<FetchResponse> {
        let returned = self
            .fetch
            .call1(&JsValue::UNDEFINED, &JsValue::from_str(text))
            .map_err(js_error)?;
        // Plain values are accepted as an already-settled response.
        let response = JsFuture::from(Promise::resolve(&returned))
            .await
            .map_err(js_error)?;
        if response.is_undefined() || response.is_null() {
            return Err(BridgeError::OperationFailed(
                "speech fetcher returned nothing".to_string(),
            ));
        }
        serde_wasm_bindgen::from_value(response)
            .map_err(|err| WasmError::from(err).into())
    }
}

// =============================================================================
// Module Info
// =============================================================================

/// Get the bridge-wasm version
#[wasm_bindgen(js_name = bridgeWasmVersion)]
pub fn bridge_wasm_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
