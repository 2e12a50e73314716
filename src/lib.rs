//! Workspace placeholder crate.
//!
//! Re-exports the engine façade so host shells can depend on a single crate
//! and toggle the browser bootstrap through the `wasm` feature.

pub use core_service::*;
