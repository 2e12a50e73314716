//! Page-global marker that keeps the engine from being installed twice when
//! the injection script runs more than once in the same page.

use crate::error::WasmResult;
use wasm_bindgen::JsValue;
use web_sys::Window;

/// Property set on `window` once the engine is installed.
pub const DEFAULT_INJECTION_FLAG: &str = "__tts_virtual_mic_injected";

/// A boolean property on `window`.
#[derive(Debug, Clone)]
pub struct PageFlag {
    window: Window,
    name: String,
}

impl PageFlag {
    /// Flag stored under `window[name]`.
    pub fn new(window: Window, name: impl Into<String>) -> Self {
        Self {
            window,
            name: name.into(),
        }
    }

    /// Property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the property is present and truthy.
    pub fn is_set(&self) -> bool {
        js_sys::Reflect::get(&self.window, &JsValue::from_str(&self.name))
            .map(|value| value.is_truthy())
            .unwrap_or(false)
    }

    /// Mark the page.
    pub fn set(&self) -> WasmResult<()> {
        js_sys::Reflect::set(
            &self.window,
            &JsValue::from_str(&self.name),
            &JsValue::TRUE,
        )?;
        Ok(())
    }
}
