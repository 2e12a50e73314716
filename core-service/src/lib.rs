//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (audio stack, object
//! URLs, device API slot, optional speech fetcher) into the virtual
//! microphone engine. Native hosts and tests construct a
//! [`VirtualMicEngine`] directly from bridge implementations; browser builds
//! enable the `wasm` feature, which installs the engine into the page through
//! the adapters from `bridge-wasm`.

pub mod engine;
pub mod error;

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub mod wasm;

pub use engine::{EngineDependencies, MessageOutcome, SetContentOutcome, StreamOf, VirtualMicEngine};
pub use error::{CoreError, Result};

pub use core_devices::{InstallGuard, InstallOutcome, GLOBAL_INSTALL_GUARD};
pub use core_playback::{GraphState, PlaybackOutcome};
pub use core_runtime::config::EngineConfig;
pub use core_runtime::events::{EngineEvent, EventStream, PlaybackRoute};

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub use wasm::{bootstrap_wasm, WebEngine};
