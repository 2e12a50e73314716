//! Convenience helpers for wiring the page adapters together.
//!
//! Host shells call [`build_web_bridges`] once to get every adapter the
//! engine needs for the current window, instead of repeating the lookups for
//! `document`, `navigator.mediaDevices` and the injection flag.

use crate::{
    audio::WebAudioBackend,
    devices::NavigatorMediaDevicesSlot,
    error::{WasmError, WasmResult},
    page_flag::{PageFlag, DEFAULT_INJECTION_FLAG},
};
use std::sync::Arc;
use tracing::warn;
use web_sys::Window;

/// Configuration for [`build_web_bridges`].
#[derive(Debug, Clone)]
pub struct WebBridgeConfig {
    /// Name of the `window` property marking the page as already injected.
    pub injection_flag: String,
}

impl WebBridgeConfig {
    /// Config using `injection_flag` as the marker name.
    pub fn new(injection_flag: impl Into<String>) -> Self {
        Self {
            injection_flag: injection_flag.into(),
        }
    }
}

impl Default for WebBridgeConfig {
    fn default() -> Self {
        Self::new(DEFAULT_INJECTION_FLAG)
    }
}

/// Page adapters ready for injection into the engine.
#[derive(Debug, Clone)]
pub struct WebBridgeSet {
    /// The window everything was looked up on.
    pub window: Window,
    /// Web Audio stack and object URL registry.
    pub audio: Arc<WebAudioBackend>,
    /// `navigator.mediaDevices`; `None` outside secure contexts.
    pub media_devices: Option<NavigatorMediaDevicesSlot>,
    /// Once-per-page marker.
    pub injection_flag: PageFlag,
}

/// The global `window`.
pub fn window() -> WasmResult<Window> {
    web_sys::window().ok_or_else(|| WasmError::Unavailable("window".to_string()))
}

/// Route Rust panics to the browser console.
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Look up every page adapter on the global window.
pub fn build_web_bridges(config: &WebBridgeConfig) -> WasmResult<WebBridgeSet> {
    let window = window()?;
    let audio = Arc::new(WebAudioBackend::new(&window)?);
    let media_devices = match NavigatorMediaDevicesSlot::new(&window) {
        Ok(slot) => Some(slot),
        Err(e) => {
            warn!(error = %e, "Device API unavailable, virtual device will not be advertised");
            None
        }
    };
    let injection_flag = PageFlag::new(window.clone(), config.injection_flag.clone());

    Ok(WebBridgeSet {
        window,
        audio,
        media_devices,
        injection_flag,
    })
}
