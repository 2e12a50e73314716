//! WebAssembly Bridge Implementations
//!
//! This crate provides the browser implementations of the bridge traits
//! defined in `bridge-traits`, built on `web-sys` and `wasm-bindgen`.
//!
//! # Platform Support
//!
//! This crate is designed exclusively for the `wasm32-unknown-unknown` target.
//! It will not compile for native targets.
//!
//! # Implementations
//!
//! - `WebAudioBackend`: `AudioContext`, hidden `<audio>` element and object URLs
//! - `WebAudioDecoder`: `decodeAudioData`, keeping decoding off the main thread
//! - `NavigatorMediaDevicesSlot`: `navigator.mediaDevices` capture and replacement
//! - `WebBlob`: `Blob` payloads read through `arrayBuffer()`
//! - `MessageListener`: window `message` channel carrying control messages
//! - `JsSpeechFetcher`: speech fetch delegated to a JavaScript function
//! - `PageFlag`: once-per-page injection marker
//!
//! # Examples
//!
//! ```ignore
//! use bridge_wasm::{build_web_bridges, WebBridgeConfig};
//!
//! let bridges = build_web_bridges(&WebBridgeConfig::default())?;
//! if !bridges.injection_flag.is_set() {
//!     // ... build the engine over bridges.audio
//! }
//! ```

#![cfg(target_arch = "wasm32")]
#![warn(missing_docs)]

pub mod audio;
pub mod blob;
pub mod bootstrap;
pub mod devices;
pub mod error;
pub mod messaging;
pub mod page_flag;
pub mod wasm;

// Re-export commonly used types
pub use audio::{WebAudioBackend, WebAudioDecoder};
pub use blob::WebBlob;
pub use bootstrap::{build_web_bridges, set_panic_hook, window, WebBridgeConfig, WebBridgeSet};
pub use devices::{JsConstraints, NavigatorMediaDevicesSlot, WebMediaDevices};
pub use error::{to_js_error, WasmError, WasmResult};
pub use messaging::{control_from_js, MessageListener};
pub use page_flag::{PageFlag, DEFAULT_INJECTION_FLAG};
pub use wasm::JsSpeechFetcher;
