use std::sync::Arc;

use crate::models::device::InputDevice;
use crate::models::error::MonitorError;

/// Callback invoked when a capture buffer is available.
///
/// Parameters:
/// - `samples`: Interleaved f32 samples in the device's native format.
/// - `sample_rate`: The actual sample rate of the delivered audio.
/// - `channels`: Number of interleaved channels (1 = mono, 2 = stereo).
pub type AudioBufferCallback = Arc<dyn Fn(&[f32], f64, u16) + Send + Sync + 'static>;

/// Interface for platform-specific capture sources.
///
/// One provider binds exactly one input device for the lifetime of a
/// session; switching devices means stopping this provider and opening
/// a new one.
pub trait CaptureProvider: Send + Sync {
    /// Whether the backing device is still present.
    fn is_available(&self) -> bool;

    /// Start capturing, delivering buffers via `callback`.
    ///
    /// The callback fires on a dedicated audio thread — keep processing
    /// minimal and never block it.
    fn start(&mut self, callback: AudioBufferCallback) -> Result<(), MonitorError>;

    /// Stop capturing and release the device.
    fn stop(&mut self) -> Result<(), MonitorError>;

    /// Snapshot of the device backing this provider.
    fn device_info(&self) -> InputDevice;
}

/// Opens capture providers for catalog devices.
///
/// Implemented by backends; `open` failing maps to the session's
/// add-input failure path.
pub trait CaptureProviderFactory: Send + Sync {
    fn open(&self, device: &InputDevice) -> Result<Box<dyn CaptureProvider>, MonitorError>;
}
