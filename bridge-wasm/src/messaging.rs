//! Window `message` channel listener.
//!
//! The control surface posts objects shaped like
//! [`WireMessage`](bridge_traits::messaging::WireMessage), except that the
//! audio may arrive as a real `ArrayBuffer` or `Blob`. Content is taken in
//! the order `arrayBuffer`, then `blob`, then `text`.

use crate::blob::WebBlob;
use crate::error::WasmResult;
use bridge_traits::{
    error::Result as BridgeResult,
    messaging::{ControlMessage, WireMessage},
    playback::AudioPayload,
};
use js_sys::{ArrayBuffer, Reflect, Uint8Array};
use std::sync::Arc;
use tracing::{debug, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{MessageEvent, Window};

fn property(target: &JsValue, name: &str) -> Option<JsValue> {
    Reflect::get(target, &JsValue::from_str(name))
        .ok()
        .filter(|value| !value.is_undefined() && !value.is_null())
}

fn string_property(target: &JsValue, name: &str) -> Option<String> {
    property(target, name).and_then(|value| value.as_string())
}

fn bytes_property(target: &JsValue, name: &str) -> Option<Vec<u8>> {
    let value = property(target, name)?;
    if value.is_instance_of::<ArrayBuffer>() || value.is_instance_of::<Uint8Array>() {
        Some(Uint8Array::new(&value).to_vec())
    } else {
        None
    }
}

/// Interpret posted message data.
///
/// Returns `Ok(None)` for traffic that is not addressed to the engine.
pub fn control_from_js(data: &JsValue, direction: &str) -> BridgeResult<Option<ControlMessage>> {
    let message_direction = string_property(data, "direction");
    let message_type = string_property(data, "type");
    let array_buffer = bytes_property(data, "arrayBuffer");

    let addressed = message_direction.as_deref() == Some(direction);
    let is_set = message_type
        .as_deref()
        .is_some_and(ControlMessage::is_set_type);
    if addressed && is_set && array_buffer.is_none() {
        if let Some(blob) = property(data, "blob").and_then(|v| v.dyn_into::<web_sys::Blob>().ok()) {
            return Ok(Some(ControlMessage::SetContent(AudioPayload::blob(Arc::new(
                WebBlob::new(blob),
            )))));
        }
    }

    WireMessage {
        direction: message_direction,
        message_type,
        text: string_property(data, "text"),
        array_buffer,
        mime: string_property(data, "mime"),
    }
    .into_control(direction)
}

/// A `message` listener on a window. Removed again on drop unless
/// [`forget`](MessageListener::forget) is called.
pub struct MessageListener {
    window: Window,
    callback: Option<Closure<dyn FnMut(MessageEvent)>>,
}

impl MessageListener {
    /// Listen for control messages tagged with `direction` and pass each one
    /// to `on_message`. Malformed messages are logged and dropped.
    pub fn attach<F>(window: Window, direction: impl Into<String>, mut on_message: F) -> WasmResult<Self>
    where
        F: FnMut(ControlMessage) + 'static,
    {
        let direction = direction.into();
        let callback = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            match control_from_js(&event.data(), &direction) {
                Ok(Some(message)) => on_message(message),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Dropping malformed control message"),
            }
        });
        window
            .add_event_listener_with_callback("message", callback.as_ref().unchecked_ref())?;
        debug!("Control message listener attached");

        Ok(Self {
            window,
            callback: Some(callback),
        })
    }

    /// Keep listening for the lifetime of the page.
    pub fn forget(mut self) {
        if let Some(callback) = self.callback.take() {
            callback.forget();
        }
    }
}

impl Drop for MessageListener {
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            let _ = self
                .window
                .remove_event_listener_with_callback("message", callback.as_ref().unchecked_ref());
        }
    }
}
