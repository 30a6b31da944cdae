//! cpal input capture provider.
//!
//! Opens an input stream on a dedicated thread and delivers Float32
//! samples via the `AudioBufferCallback`. Integer formats are widened
//! to f32 before delivery.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;
use parking_lot::Mutex;

use avmonitor_core::models::device::{InputDevice, MediaKind};
use avmonitor_core::models::error::MonitorError;
use avmonitor_core::traits::capture_provider::{
    AudioBufferCallback, CaptureProvider, CaptureProviderFactory,
};

const START_TIMEOUT: Duration = Duration::from_secs(2);

/// cpal microphone capture.
///
/// The stream lives on its own named thread because cpal streams are
/// not `Send`; the thread owns the stream for the session's lifetime
/// and drops it when the running flag clears.
pub struct CpalInputCapture {
    info: InputDevice,
    running: Arc<AtomicBool>,
    capture_handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl CpalInputCapture {
    pub fn new(info: InputDevice) -> Self {
        Self {
            info,
            running: Arc::new(AtomicBool::new(false)),
            capture_handle: Mutex::new(None),
        }
    }
}

impl CaptureProvider for CpalInputCapture {
    fn is_available(&self) -> bool {
        find_input_device(&self.info.id).is_ok()
    }

    fn start(&mut self, callback: AudioBufferCallback) -> Result<(), MonitorError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(MonitorError::InvalidState("capture already running".into()));
        }

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let device_id = self.info.id.clone();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), MonitorError>>();

        let handle = thread::Builder::new()
            .name("cpal-input".into())
            .spawn(move || {
                capture_loop(running.clone(), device_id, callback, ready_tx);
                running.store(false, Ordering::SeqCst);
            })
            .map_err(|e| MonitorError::Unknown(format!("failed to spawn capture thread: {}", e)))?;

        match ready_rx.recv_timeout(START_TIMEOUT) {
            Ok(Ok(())) => {
                *self.capture_handle.lock() = Some(handle);
                Ok(())
            }
            Ok(Err(e)) => {
                self.running.store(false, Ordering::SeqCst);
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                self.running.store(false, Ordering::SeqCst);
                let _ = handle.join();
                Err(MonitorError::Unknown("capture stream start timed out".into()))
            }
        }
    }

    fn stop(&mut self) -> Result<(), MonitorError> {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.capture_handle.lock().take() {
            let _ = handle.join();
        }
        Ok(())
    }

    fn device_info(&self) -> InputDevice {
        self.info.clone()
    }
}

/// Owns the stream until the running flag clears.
fn capture_loop(
    running: Arc<AtomicBool>,
    device_id: String,
    callback: AudioBufferCallback,
    ready_tx: mpsc::Sender<Result<(), MonitorError>>,
) {
    let stream = match build_stream(&device_id, callback) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(MonitorError::Unknown(format!(
            "failed to start input stream: {}",
            e
        ))));
        return;
    }
    let _ = ready_tx.send(Ok(()));

    while running.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(50));
    }
    // Stream drops here, releasing the device.
}

fn build_stream(
    device_id: &str,
    callback: AudioBufferCallback,
) -> Result<cpal::Stream, MonitorError> {
    let device = find_input_device(device_id)?;
    let config = device
        .default_input_config()
        .map_err(|e| MonitorError::Unknown(format!("no input config: {}", e)))?;

    let sample_rate = f64::from(config.sample_rate().0);
    let channels = config.channels();
    let sample_format = config.sample_format();
    let stream_config: cpal::StreamConfig = config.into();
    let err_fn = |e| log::error!("input stream error: {}", e);

    let stream = match sample_format {
        SampleFormat::F32 => device.build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                callback(data, sample_rate, channels);
            },
            err_fn,
            None,
        ),
        SampleFormat::I16 => device.build_input_stream(
            &stream_config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                let samples: Vec<f32> =
                    data.iter().map(|s| f32::from(*s) / f32::from(i16::MAX)).collect();
                callback(&samples, sample_rate, channels);
            },
            err_fn,
            None,
        ),
        SampleFormat::U16 => device.build_input_stream(
            &stream_config,
            move |data: &[u16], _: &cpal::InputCallbackInfo| {
                let samples: Vec<f32> = data
                    .iter()
                    .map(|s| (f32::from(*s) - 32768.0) / 32768.0)
                    .collect();
                callback(&samples, sample_rate, channels);
            },
            err_fn,
            None,
        ),
        other => {
            return Err(MonitorError::FormatConversionFailed(format!(
                "unsupported sample format: {:?}",
                other
            )))
        }
    };

    stream.map_err(|e| MonitorError::Unknown(format!("failed to build input stream: {}", e)))
}

fn find_input_device(device_id: &str) -> Result<cpal::Device, MonitorError> {
    let host = cpal::default_host();
    host.input_devices()
        .map_err(|e| MonitorError::Unknown(format!("device enumeration failed: {}", e)))?
        .find(|d| d.name().ok().as_deref() == Some(device_id))
        .ok_or_else(|| MonitorError::DeviceNotFound(device_id.to_string()))
}

/// Opens `CpalInputCapture` providers for catalog devices.
pub struct CpalCaptureFactory;

impl CpalCaptureFactory {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CpalCaptureFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureProviderFactory for CpalCaptureFactory {
    fn open(&self, device: &InputDevice) -> Result<Box<dyn CaptureProvider>, MonitorError> {
        if device.kind != MediaKind::Audio {
            return Err(MonitorError::DeviceNotFound(device.id.clone()));
        }
        find_input_device(&device.id)?;
        Ok(Box::new(CpalInputCapture::new(device.clone())))
    }
}
