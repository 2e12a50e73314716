//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the virtual microphone
//! engine:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the playback, device and
//! service crates depend on. It establishes the logging conventions, the
//! engine configuration schema and the event broadcasting used throughout the
//! system.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::EngineConfig;
pub use error::{Error, Result};
pub use events::{EngineEvent, EventBus};
