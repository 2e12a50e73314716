//! Error types for WebAssembly bridge implementations

use bridge_traits::error::BridgeError;
use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};

/// Result type for WebAssembly bridge operations
pub type WasmResult<T> = Result<T, WasmError>;

/// Errors that can occur in WebAssembly bridge implementations
#[derive(Error, Debug)]
pub enum WasmError {
    /// JavaScript error from web-sys
    #[error("JavaScript error: {0}")]
    JavaScript(String),

    /// The platform refused an operation that needs a user gesture
    #[error("Not allowed: {0}")]
    NotAllowed(String),

    /// A browser API the engine relies on is missing
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// A JavaScript value did not have the expected shape
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_wasm_bindgen::Error),

    /// Bridge error raised by shared code
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

impl From<WasmError> for BridgeError {
    fn from(err: WasmError) -> Self {
        match err {
            WasmError::NotAllowed(message) => BridgeError::PlaybackRefused(message),
            WasmError::Unavailable(message) => BridgeError::NotAvailable(message),
            WasmError::InvalidValue(message) => BridgeError::InvalidMessage(message),
            WasmError::Bridge(inner) => inner,
            other => BridgeError::OperationFailed(other.to_string()),
        }
    }
}

impl From<JsValue> for WasmError {
    fn from(js_value: JsValue) -> Self {
        if let Some(exception) = js_value.dyn_ref::<web_sys::DomException>() {
            let message = format!("{}: {}", exception.name(), exception.message());
            return if exception.name() == "NotAllowedError" {
                WasmError::NotAllowed(message)
            } else {
                WasmError::JavaScript(message)
            };
        }

        let msg = if js_value.is_string() {
            js_value
                .as_string()
                .unwrap_or_else(|| "Unknown error".to_string())
        } else if let Some(error) = js_value.dyn_ref::<js_sys::Error>() {
            error.message().into()
        } else {
            format!("{:?}", js_value)
        };
        WasmError::JavaScript(msg)
    }
}

/// Convert a rejected JavaScript value straight into a [`BridgeError`].
pub(crate) fn js_error(js_value: JsValue) -> BridgeError {
    WasmError::from(js_value).into()
}

/// Convert an error into a `JsValue` for returning to JavaScript callers.
pub fn to_js_error<E: std::fmt::Display>(err: E) -> JsValue {
    JsValue::from_str(&err.to_string())
}
