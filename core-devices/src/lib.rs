//! # Device Virtualization Module
//!
//! Makes the engine's capture stream look like a microphone to page code.
//!
//! ## Overview
//!
//! This crate handles:
//! - The virtual device descriptor appended to enumeration results
//! - The acquisition policy deciding when a request gets the capture stream
//! - [`InterceptingMediaDevices`], a decorator over the platform device API
//! - One-time installation of that decorator through a
//!   [`MediaDevicesSlot`](bridge_traits::MediaDevicesSlot)

pub mod descriptor;
pub mod error;
pub mod install;
pub mod policy;
pub mod shim;

pub use descriptor::VirtualDeviceDescriptor;
pub use error::{DeviceError, Result};
pub use install::{install_shim, InstallGuard, InstallOutcome, GLOBAL_INSTALL_GUARD};
pub use policy::{AcquisitionDecision, AcquisitionPolicy, PassThroughReason};
pub use shim::InterceptingMediaDevices;
