//! Thread-safety bounds that follow the target.
//!
//! Native hosts share bridge objects across tokio tasks and need
//! `Send + Sync`. In the browser everything runs on the page's single thread
//! and `web_sys` handles are neither `Send` nor `Sync`, so the bound vanishes
//! on `wasm32`.

/// `Send + Sync` on native targets, no bound on `wasm32`.
#[cfg(not(target_arch = "wasm32"))]
pub trait PlatformSendSync: Send + Sync {}

#[cfg(not(target_arch = "wasm32"))]
impl<T> PlatformSendSync for T where T: Send + Sync {}

#[cfg(target_arch = "wasm32")]
pub trait PlatformSendSync {}

#[cfg(target_arch = "wasm32")]
impl<T> PlatformSendSync for T {}
