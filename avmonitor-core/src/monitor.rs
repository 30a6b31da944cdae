//! Top-level orchestrator tying the catalog, capture pipeline,
//! playback graph, relay, spectrum analyzer, and recorder together.
//!
//! The UI layer owns an `Arc<AudioMonitor>`, reads `snapshot()`, and
//! signals intent through the setters; everything else happens on the
//! capture and render lanes inside.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::catalog::{self, DeviceCatalog};
use crate::models::config::MonitorConfig;
use crate::models::device::{InputDevice, MediaKind, PermissionState};
use crate::models::error::MonitorError;
use crate::models::state::PipelineState;
use crate::pipeline::CapturePipeline;
use crate::playback::graph::PlaybackGraph;
use crate::playback::relay::BufferRelay;
use crate::processing::converter::FormatConverter;
use crate::recorder::Recorder;
use crate::spectrum::{SpectrumAnalyzer, SpectrumSnapshot};
use crate::traits::capture_provider::{AudioBufferCallback, CaptureProviderFactory};
use crate::traits::delegate::MonitorDelegate;
use crate::traits::permissions::PermissionProbe;
use crate::traits::playback_sink::PlaybackSink;

/// UI-facing state, read in one call to avoid torn views.
#[derive(Debug, Clone)]
pub struct MonitorSnapshot {
    pub devices: Vec<InputDevice>,
    pub selected_device_id: Option<String>,
    pub permission_denied: bool,
    pub muted: bool,
    pub recording: bool,
    pub sensitivity: f32,
    pub spectrum: Vec<f32>,
    pub state: PipelineState,
    pub error_message: String,
}

struct MonitorShared {
    devices: Vec<InputDevice>,
    selected_device_id: Option<String>,
    permission_denied: bool,
    error_message: String,
}

pub struct AudioMonitor {
    config: MonitorConfig,
    catalog: Arc<dyn DeviceCatalog>,
    permissions: Arc<dyn PermissionProbe>,
    pipeline: CapturePipeline,
    graph: Arc<PlaybackGraph>,
    relay: Arc<BufferRelay>,
    analyzer: Mutex<SpectrumAnalyzer>,
    spectrum: SpectrumSnapshot,
    recorder: Arc<Recorder>,
    converter: FormatConverter,
    shared: Mutex<MonitorShared>,
    delegate: Mutex<Option<Arc<dyn MonitorDelegate>>>,
    self_ref: Weak<AudioMonitor>,
}

impl AudioMonitor {
    pub fn new(
        config: MonitorConfig,
        catalog: Arc<dyn DeviceCatalog>,
        permissions: Arc<dyn PermissionProbe>,
        factory: Box<dyn CaptureProviderFactory>,
        sink: Arc<dyn PlaybackSink>,
    ) -> Result<Arc<Self>, MonitorError> {
        config.validate().map_err(MonitorError::InvalidConfiguration)?;

        let graph = Arc::new(PlaybackGraph::new(sink, config.sensitivity));
        let relay = BufferRelay::new(Arc::clone(&graph), config.relay_queue_capacity);
        let analyzer = SpectrumAnalyzer::new(config.fft_size, config.bar_count);
        let spectrum = analyzer.snapshot();
        let recorder = Recorder::new(&config, Arc::clone(&graph));
        let converter = FormatConverter::new(config.sample_rate);

        let monitor = Arc::new_cyclic(|self_ref| Self {
            config,
            catalog,
            permissions,
            pipeline: CapturePipeline::new(factory),
            graph,
            relay,
            analyzer: Mutex::new(analyzer),
            spectrum,
            recorder,
            converter,
            shared: Mutex::new(MonitorShared {
                devices: Vec::new(),
                selected_device_id: None,
                permission_denied: false,
                error_message: String::new(),
            }),
            delegate: Mutex::new(None),
            self_ref: Weak::clone(self_ref),
        });
        monitor.refresh_devices();
        Ok(monitor)
    }

    pub fn set_delegate(&self, delegate: Arc<dyn MonitorDelegate>) {
        *self.delegate.lock() = Some(delegate);
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        let shared = self.shared.lock();
        MonitorSnapshot {
            devices: shared.devices.clone(),
            selected_device_id: shared.selected_device_id.clone(),
            permission_denied: shared.permission_denied,
            muted: self.graph.monitor_muted(),
            recording: self.recorder.state().is_busy(),
            sensitivity: self.graph.sensitivity(),
            spectrum: self.spectrum.latest(),
            state: self.pipeline.state(),
            error_message: shared.error_message.clone(),
        }
    }

    /// Re-query the catalog and replace the device list.
    pub fn refresh_devices(&self) {
        match self.catalog.list_devices(MediaKind::Audio) {
            Ok(devices) => {
                let filtered =
                    catalog::filter_devices(devices, &self.config.excluded_name_fragments);
                self.shared.lock().devices = filtered;
            }
            Err(e) => self.set_error(&e),
        }
    }

    /// Select an input device by id, or `None` to deselect.
    ///
    /// The catalog is refreshed first; an id that no longer resolves
    /// forces a full reset. A session only starts once permission is
    /// granted — an unknown permission state triggers an asynchronous
    /// request whose completion re-enters here.
    pub fn select_device(&self, id: Option<&str>) {
        if self.shared.lock().permission_denied {
            self.deny();
            return;
        }

        self.refresh_devices();

        let Some(id) = id else {
            self.reset();
            return;
        };
        let device = {
            let shared = self.shared.lock();
            shared.devices.iter().find(|d| d.id == id).cloned()
        };
        let Some(device) = device else {
            self.reset();
            return;
        };

        // Rebinding invalidates the old session and everything it has
        // in flight.
        self.teardown_session();
        self.shared.lock().selected_device_id = Some(device.id.clone());

        match self.permissions.status(MediaKind::Audio) {
            PermissionState::Granted => self.start_session(device),
            PermissionState::Denied => self.deny(),
            PermissionState::Unknown => {
                let weak = Weak::clone(&self.self_ref);
                self.permissions.request(
                    MediaKind::Audio,
                    Box::new(move |state| {
                        let Some(monitor) = weak.upgrade() else {
                            return;
                        };
                        if state.is_granted() {
                            monitor.start_session(device);
                        } else {
                            monitor.deny();
                        }
                    }),
                );
            }
        }
    }

    /// Entry point for device connect/disconnect notifications:
    /// re-run selection against a fresh catalog.
    pub fn handle_device_changed(&self) {
        let selected = self.shared.lock().selected_device_id.clone();
        self.select_device(selected.as_deref());
    }

    pub fn muted(&self) -> bool {
        self.graph.monitor_muted()
    }

    pub fn set_muted(&self, muted: bool) {
        self.graph.set_monitor_muted(muted);
    }

    pub fn sensitivity(&self) -> f32 {
        self.graph.sensitivity()
    }

    /// Update the sensitivity scalar, clamped to [0, 2].
    ///
    /// Applies to the next buffer entering the relay and the next
    /// spectrum frame; an unmuted monitor changes volume immediately.
    pub fn set_sensitivity(&self, sensitivity: f32) {
        self.graph.set_sensitivity(sensitivity);
    }

    pub fn start_recording(&self) {
        if let Err(e) = self.recorder.start() {
            self.set_error(&e);
        }
    }

    /// Stop the recording; on success playback of the file starts
    /// automatically. A recording that failed mid-write surfaces its
    /// error and skips playback.
    pub fn stop_recording(&self) {
        match self.recorder.stop() {
            Ok(result) => {
                if let Some(delegate) = self.delegate() {
                    delegate.on_recording_finished(&result);
                }
                let weak = Weak::clone(&self.self_ref);
                let played = self.recorder.play_recording(Box::new(move || {
                    if let Some(monitor) = weak.upgrade() {
                        if let Some(delegate) = monitor.delegate() {
                            delegate.on_playback_finished();
                        }
                    }
                }));
                if let Err(e) = played {
                    self.set_error(&e);
                }
            }
            Err(e) => self.set_error(&e),
        }
    }

    /// Full reset: tear down the session, clear selection and errors,
    /// zero the spectrum, and refresh the catalog.
    pub fn reset(&self) {
        self.teardown_session();
        self.graph.set_monitor_muted(true);
        {
            let mut shared = self.shared.lock();
            shared.selected_device_id = None;
            shared.permission_denied = false;
            shared.error_message.clear();
        }
        self.refresh_devices();
        self.notify_state();
    }

    // --- Internal helpers ---

    fn start_session(&self, device: InputDevice) {
        let weak = Weak::clone(&self.self_ref);
        let callback: AudioBufferCallback = Arc::new(move |samples, sample_rate, channels| {
            if let Some(monitor) = weak.upgrade() {
                monitor.handle_capture_buffer(samples, sample_rate, channels);
            }
        });

        match self.pipeline.start(&device, callback) {
            Ok(()) => {
                self.shared.lock().error_message.clear();
            }
            Err(e) => self.set_error(&e),
        }
        self.notify_state();
    }

    /// Fan-out for every captured buffer: convert once, then feed the
    /// recorder tap while recording, otherwise the spectrum analyzer
    /// and the live relay.
    fn handle_capture_buffer(&self, samples: &[f32], sample_rate: f64, channels: u16) {
        let converted = match self.converter.convert(samples, sample_rate, channels) {
            Ok(converted) => converted,
            Err(e) if e.is_droppable() => {
                log::debug!("dropped capture buffer: {}", e);
                return;
            }
            Err(e) => {
                self.set_error(&e);
                return;
            }
        };

        if self.recorder.state().is_recording() {
            self.recorder.handle_samples(&converted);
            return;
        }

        let sensitivity = self.graph.sensitivity();
        let frame = self.analyzer.lock().analyze(&converted, sensitivity);
        match frame {
            Ok(frame) => {
                if let Some(delegate) = self.delegate() {
                    delegate.on_spectrum_updated(&frame);
                }
            }
            Err(e) => self.set_error(&e),
        }

        if let Err(e) = self.relay.push(converted) {
            self.set_error(&e);
        }
    }

    fn teardown_session(&self) {
        self.pipeline.reset();
        self.relay.flush();
        self.analyzer.lock().reset();
    }

    /// Permission denial: reset everything, then raise the denied flag
    /// so the UI can route to its permission screen.
    fn deny(&self) {
        self.reset();
        self.shared.lock().permission_denied = true;
        self.set_error(&MonitorError::PermissionDenied);
    }

    fn delegate(&self) -> Option<Arc<dyn MonitorDelegate>> {
        self.delegate.lock().clone()
    }

    fn notify_state(&self) {
        if let Some(delegate) = self.delegate() {
            delegate.on_state_changed(&self.pipeline.state());
        }
    }

    fn set_error(&self, error: &MonitorError) {
        log::error!("monitor error: {}", error);
        self.shared.lock().error_message = error.to_string();
        if let Some(delegate) = self.delegate() {
            delegate.on_error(error);
        }
    }
}
