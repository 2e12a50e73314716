//! `navigator.mediaDevices` adapters.
//!
//! [`NavigatorMediaDevicesSlot::original`] captures the page's
//! `enumerateDevices` and `getUserMedia`, bound to the `MediaDevices`
//! instance, before anything is replaced. [`NavigatorMediaDevicesSlot::replace`]
//! then shadows both methods with own properties on that instance, so every
//! later page call lands in the replacement while the captured originals keep
//! reaching the browser.

use crate::error::{js_error, to_js_error, WasmError, WasmResult};
use bridge_traits::{
    devices::{
        AudioRequest, ConstraintSet, MediaDeviceInfo, MediaDeviceKind, MediaDevices,
        MediaDevicesSlot, MediaStreamConstraints, SharedMediaDevices,
    },
    error::{BridgeError, Result as BridgeResult},
};
use js_sys::{Array, Function, Object, Promise, Reflect};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use wasm_bindgen_futures::{future_to_promise, JsFuture};
use web_sys::{MediaStream, Window};

const ENUMERATE_DEVICES: &str = "enumerateDevices";
const GET_USER_MEDIA: &str = "getUserMedia";

/// Constraint object as the page passed it, plus its typed reading.
#[derive(Debug, Clone)]
pub struct JsConstraints {
    raw: JsValue,
    parsed: MediaStreamConstraints,
}

impl JsConstraints {
    /// Read a page constraint object. Shapes that do not parse are treated as
    /// requesting no audio, so they always reach the browser untouched.
    pub fn from_js(raw: JsValue) -> Self {
        let parsed = serde_wasm_bindgen::from_value(raw.clone()).unwrap_or_else(|err| {
            debug!(error = %err, "Unrecognized constraint shape");
            MediaStreamConstraints::default()
        });
        Self { raw, parsed }
    }

    /// The object exactly as the page passed it.
    pub fn raw(&self) -> &JsValue {
        &self.raw
    }
}

impl ConstraintSet for JsConstraints {
    fn audio_request(&self) -> AudioRequest {
        self.parsed.audio_request()
    }
}

/// The browser's own device entry points.
#[derive(Debug, Clone)]
pub struct WebMediaDevices {
    enumerate: Function,
    get_user_media: Function,
}

#[async_trait::async_trait(?Send)]
impl MediaDevices for WebMediaDevices {
    type Stream = MediaStream;
    type Constraints = JsConstraints;

    async fn enumerate_devices(&self) -> BridgeResult<Vec<MediaDeviceInfo>> {
        let promise = self.enumerate.call0(&JsValue::UNDEFINED).map_err(js_error)?;
        let list = JsFuture::from(Promise::from(promise))
            .await
            .map_err(js_error)?;
        Ok(Array::from(&list)
            .iter()
            .filter_map(|entry| device_info_from_js(&entry))
            .collect())
    }

    async fn get_user_media(&self, constraints: JsConstraints) -> BridgeResult<MediaStream> {
        let promise = self
            .get_user_media
            .call1(&JsValue::UNDEFINED, constraints.raw())
            .map_err(js_error)?;
        let stream = JsFuture::from(Promise::from(promise))
            .await
            .map_err(js_error)?;
        stream
            .dyn_into::<MediaStream>()
            .map_err(|_| BridgeError::OperationFailed("getUserMedia did not return a MediaStream".into()))
    }
}

/// `navigator.mediaDevices` of one window.
#[derive(Debug, Clone)]
pub struct NavigatorMediaDevicesSlot {
    media_devices: web_sys::MediaDevices,
}

impl NavigatorMediaDevicesSlot {
    /// Fails when the page is not a secure context.
    pub fn new(window: &Window) -> WasmResult<Self> {
        let media_devices = window
            .navigator()
            .media_devices()
            .map_err(|_| WasmError::Unavailable("navigator.mediaDevices".to_string()))?;
        Ok(Self { media_devices })
    }

    fn bound_method(&self, name: &str) -> BridgeResult<Function> {
        let method = Reflect::get(&self.media_devices, &JsValue::from_str(name))
            .map_err(js_error)?
            .dyn_into::<Function>()
            .map_err(|_| BridgeError::NotAvailable(format!("mediaDevices.{name}")))?;
        Ok(method.bind(&self.media_devices))
    }
}

impl MediaDevicesSlot for NavigatorMediaDevicesSlot {
    type Stream = MediaStream;
    type Constraints = JsConstraints;
    type Original = WebMediaDevices;

    fn original(&self) -> BridgeResult<WebMediaDevices> {
        Ok(WebMediaDevices {
            enumerate: self.bound_method(ENUMERATE_DEVICES)?,
            get_user_media: self.bound_method(GET_USER_MEDIA)?,
        })
    }

    fn replace(&self, devices: SharedMediaDevices<MediaStream, JsConstraints>) -> BridgeResult<()> {
        let enumerate = {
            let devices = Arc::clone(&devices);
            Closure::<dyn FnMut() -> Promise>::new(move || {
                let devices = Arc::clone(&devices);
                future_to_promise(async move {
                    let list = devices.enumerate_devices().await.map_err(to_js_error)?;
                    device_list_to_js(&list).map_err(to_js_error)
                })
            })
        };
        let get_user_media = Closure::<dyn FnMut(JsValue) -> Promise>::new(move |raw: JsValue| {
            let devices = Arc::clone(&devices);
            future_to_promise(async move {
                let stream = devices
                    .get_user_media(JsConstraints::from_js(raw))
                    .await
                    .map_err(to_js_error)?;
                Ok(stream.into())
            })
        });

        install_methods(
            self.media_devices.as_ref(),
            &[
                (ENUMERATE_DEVICES, enumerate.as_ref()),
                (GET_USER_MEDIA, get_user_media.as_ref()),
            ],
        )?;

        // The page owns these functions from now on.
        enumerate.forget();
        get_user_media.forget();
        Ok(())
    }
}

/// Set each method as an own property of `target`, in order. If one cannot
/// be set, the ones already set are put back exactly as they were.
fn install_methods(target: &Object, methods: &[(&str, &JsValue)]) -> BridgeResult<()> {
    let mut shadowed: Vec<(JsValue, JsValue)> = Vec::with_capacity(methods.len());
    for (name, function) in methods {
        let key = JsValue::from_str(name);
        let result = Reflect::get_own_property_descriptor(target, &key)
            .map_err(js_error)
            .and_then(|previous| {
                let installed = Reflect::set(target, &key, function).map_err(js_error)?;
                if !installed {
                    return Err(BridgeError::OperationFailed(format!(
                        "mediaDevices.{name} is not writable"
                    )));
                }
                Ok(previous)
            });
        match result {
            Ok(previous) => shadowed.push((key, previous)),
            Err(e) => {
                restore_properties(target, shadowed);
                return Err(e);
            }
        }
    }
    Ok(())
}

fn restore_properties(target: &Object, shadowed: Vec<(JsValue, JsValue)>) {
    for (key, previous) in shadowed.into_iter().rev() {
        let restored = if previous.is_undefined() {
            Reflect::delete_property(target, &key)
        } else {
            Reflect::define_property(target, &key, previous.unchecked_ref::<Object>())
        };
        match restored {
            Ok(true) => debug!(property = ?key.as_string(), "Restored device method"),
            Ok(false) | Err(_) => {
                warn!(property = ?key.as_string(), "Failed to restore device method")
            }
        }
    }
}

fn string_property(target: &JsValue, name: &str) -> Option<String> {
    Reflect::get(target, &JsValue::from_str(name))
        .ok()
        .and_then(|value| value.as_string())
}

/// Read a platform `MediaDeviceInfo`. Its members are prototype getters, so
/// they are read one by one instead of deserialized.
fn device_info_from_js(entry: &JsValue) -> Option<MediaDeviceInfo> {
    let kind = match string_property(entry, "kind")?.as_str() {
        "audioinput" => MediaDeviceKind::AudioInput,
        "audiooutput" => MediaDeviceKind::AudioOutput,
        "videoinput" => MediaDeviceKind::VideoInput,
        other => {
            warn!(kind = other, "Skipping device of unknown kind");
            return None;
        }
    };
    let info = MediaDeviceInfo::new(
        string_property(entry, "deviceId").unwrap_or_default(),
        kind,
        string_property(entry, "label").unwrap_or_default(),
    );
    Some(info.with_group_id(string_property(entry, "groupId").unwrap_or_default()))
}

fn device_list_to_js(devices: &[MediaDeviceInfo]) -> WasmResult<JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    Ok(devices.serialize(&serializer)?)
}
