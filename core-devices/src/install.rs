//! One-time installation of the device shim.
//!
//! Wrapping an already wrapped device API would stack interception layers
//! and lose the path to the real one, so installation goes through an
//! [`InstallGuard`]. The page-wide guard is [`GLOBAL_INSTALL_GUARD`]; tests
//! and embedders that manage their own lifetime can use a private one.

use crate::descriptor::VirtualDeviceDescriptor;
use crate::error::{DeviceError, Result};
use crate::shim::InterceptingMediaDevices;
use bridge_traits::devices::{CaptureStreamSource, MediaDevicesSlot};
use core_runtime::config::VirtualDeviceConfig;
use core_runtime::events::{EngineEvent, EventBus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Guard shared by every installation in the process.
pub static GLOBAL_INSTALL_GUARD: InstallGuard = InstallGuard::new();

/// Set-once flag. The first successful claim wins.
#[derive(Debug, Default)]
pub struct InstallGuard {
    installed: AtomicBool,
}

impl InstallGuard {
    pub const fn new() -> Self {
        Self {
            installed: AtomicBool::new(false),
        }
    }

    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::SeqCst)
    }

    /// Returns `true` for exactly one caller.
    pub fn try_claim(&self) -> bool {
        self.installed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn release(&self) {
        self.installed.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed,
    /// The guard was already claimed; nothing changed.
    AlreadyInstalled,
}

/// Capture the slot's original device API and replace it with an
/// [`InterceptingMediaDevices`] reading streams from `streams`.
///
/// # Errors
///
/// - [`DeviceError::Unavailable`] if the original API cannot be captured
/// - [`DeviceError::InstallFailed`] if the replacement is refused
///
/// On error the guard is released so a later attempt can retry.
pub fn install_shim<M, S>(
    guard: &InstallGuard,
    slot: &M,
    streams: Arc<S>,
    config: &VirtualDeviceConfig,
    events: &EventBus,
) -> Result<InstallOutcome>
where
    M: MediaDevicesSlot,
    S: CaptureStreamSource<M::Stream> + ?Sized + 'static,
{
    if !guard.try_claim() {
        debug!("Device shim already installed");
        return Ok(InstallOutcome::AlreadyInstalled);
    }

    let descriptor = VirtualDeviceDescriptor::from(config);
    let device_id = descriptor.device_id().to_string();

    if let Err(e) = wrap_slot(slot, streams, descriptor, events) {
        warn!(error = %e, "Failed to install device shim");
        guard.release();
        return Err(e);
    }

    info!(device_id = %device_id, "Installed device shim");
    events.emit(EngineEvent::ShimInstalled { device_id });
    Ok(InstallOutcome::Installed)
}

fn wrap_slot<M, S>(
    slot: &M,
    streams: Arc<S>,
    descriptor: VirtualDeviceDescriptor,
    events: &EventBus,
) -> Result<()>
where
    M: MediaDevicesSlot,
    S: CaptureStreamSource<M::Stream> + ?Sized + 'static,
{
    let original = slot
        .original()
        .map_err(|e| DeviceError::Unavailable(e.to_string()))?;
    let shim = InterceptingMediaDevices::new(original, streams, descriptor, events.clone());
    slot.replace(Arc::new(shim))
        .map_err(|e| DeviceError::InstallFailed(e.to_string()))
}
