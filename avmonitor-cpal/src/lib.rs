//! # avmonitor-cpal
//!
//! cpal backend for avmonitor.
//!
//! Provides:
//! - `CpalInputCapture` / `CpalCaptureFactory` — microphone capture streams
//! - `CpalPlaybackSink` — output rendering for monitoring and playback
//! - `CpalDeviceCatalog` — input device enumeration
//! - `CpalPermissionProbe` — capture access check
//!
//! ## Usage
//! ```ignore
//! use std::sync::Arc;
//! use avmonitor_core::{AudioMonitor, MonitorConfig};
//! use avmonitor_cpal::{
//!     CpalCaptureFactory, CpalDeviceCatalog, CpalPermissionProbe, CpalPlaybackSink,
//! };
//!
//! let monitor = AudioMonitor::new(
//!     MonitorConfig::default(),
//!     Arc::new(CpalDeviceCatalog::new()),
//!     Arc::new(CpalPermissionProbe::new()),
//!     Box::new(CpalCaptureFactory::new()),
//!     Arc::new(CpalPlaybackSink::new()),
//! )?;
//! monitor.select_device(Some("Built-in Microphone"));
//! ```

pub mod enumerator;
pub mod input;
pub mod output;
pub mod permissions;

pub use enumerator::CpalDeviceCatalog;
pub use input::{CpalCaptureFactory, CpalInputCapture};
pub use output::CpalPlaybackSink;
pub use permissions::CpalPermissionProbe;
