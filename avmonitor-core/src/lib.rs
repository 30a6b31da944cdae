//! # avmonitor-core
//!
//! Platform-agnostic audio monitoring core library.
//!
//! Provides device cataloging, live passthrough monitoring with a
//! bounded buffer relay, FFT spectrum analysis, and scratch-file
//! recording with automatic playback. Platform backends implement the
//! `CaptureProvider`, `PlaybackSink`, `DeviceCatalog`, and
//! `PermissionProbe` traits and plug into the generic `AudioMonitor`.
//!
//! ## Architecture
//!
//! ```text
//! avmonitor-core (this crate)
//! ├── traits/       ← CaptureProvider, PlaybackSink, PermissionProbe, MonitorDelegate
//! ├── models/       ← MonitorError, PipelineState, MonitorConfig, InputDevice, etc.
//! ├── catalog       ← DeviceCatalog trait + filtering/ordering
//! ├── pipeline      ← CapturePipeline (device binding state machine)
//! ├── playback/     ← PlaybackGraph (player nodes), BufferRelay (SPSC drain)
//! ├── processing/   ← FormatConverter, WAV header generation
//! ├── spectrum      ← SpectrumAnalyzer (real FFT → magnitude bars)
//! ├── recorder      ← Recorder (scratch file + auto playback)
//! ├── storage/      ← RecordingWriter, metadata sidecar
//! └── monitor       ← AudioMonitor (generic orchestrator)
//! ```

pub mod catalog;
pub mod models;
pub mod monitor;
pub mod pipeline;
pub mod playback;
pub mod processing;
pub mod recorder;
pub mod spectrum;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use catalog::DeviceCatalog;
pub use models::config::MonitorConfig;
pub use models::device::{InputDevice, MediaKind, PermissionState};
pub use models::error::MonitorError;
pub use models::recording::{RecordingMetadata, RecordingResult};
pub use models::state::{PipelineState, RecorderState};
pub use monitor::{AudioMonitor, MonitorSnapshot};
pub use pipeline::CapturePipeline;
pub use playback::graph::PlaybackGraph;
pub use playback::relay::BufferRelay;
pub use processing::converter::FormatConverter;
pub use recorder::Recorder;
pub use spectrum::{SpectrumAnalyzer, SpectrumSnapshot};
pub use storage::recording_writer::RecordingWriter;
pub use traits::capture_provider::{AudioBufferCallback, CaptureProvider, CaptureProviderFactory};
pub use traits::delegate::MonitorDelegate;
pub use traits::permissions::{PermissionCallback, PermissionProbe};
pub use traits::playback_sink::{CompletionCallback, PlaybackSink};
