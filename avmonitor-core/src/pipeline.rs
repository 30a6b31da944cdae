//! Capture pipeline: owns the active provider and its state machine.
//!
//! One pipeline binds zero-or-one input device. Selecting a device
//! opens a fresh provider through the backend factory; any failure
//! leaves the pipeline in the error state and the caller performs the
//! full reset — there is no partial-reconnect path.

use parking_lot::Mutex;

use crate::models::device::InputDevice;
use crate::models::error::MonitorError;
use crate::models::state::PipelineState;
use crate::traits::capture_provider::{
    AudioBufferCallback, CaptureProvider, CaptureProviderFactory,
};

pub struct CapturePipeline {
    factory: Box<dyn CaptureProviderFactory>,
    provider: Mutex<Option<Box<dyn CaptureProvider>>>,
    state: Mutex<PipelineState>,
}

impl CapturePipeline {
    pub fn new(factory: Box<dyn CaptureProviderFactory>) -> Self {
        Self {
            factory,
            provider: Mutex::new(None),
            state: Mutex::new(PipelineState::Idle),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state.lock().clone()
    }

    /// Bind a device and start delivering buffers to `callback`.
    ///
    /// Transitions `Idle -> Starting -> Running`. Factory failures map
    /// to the add-input path, provider start failures to add-output;
    /// both leave the pipeline in `Error` for the caller to reset.
    pub fn start(
        &self,
        device: &InputDevice,
        callback: AudioBufferCallback,
    ) -> Result<(), MonitorError> {
        {
            let mut state = self.state.lock();
            if !state.is_idle() {
                return Err(MonitorError::InvalidState(format!(
                    "cannot start capture from {:?}",
                    *state
                )));
            }
            *state = PipelineState::Starting;
        }

        let mut provider = match self.factory.open(device) {
            Ok(provider) => provider,
            Err(e) => {
                let error = MonitorError::AddInputFailed(e.to_string());
                *self.state.lock() = PipelineState::Error(error.clone());
                return Err(error);
            }
        };

        if let Err(e) = provider.start(callback) {
            let error = MonitorError::AddOutputFailed(e.to_string());
            *self.state.lock() = PipelineState::Error(error.clone());
            // Keep the partially built provider so reset can stop it.
            *self.provider.lock() = Some(provider);
            return Err(error);
        }

        *self.provider.lock() = Some(provider);
        *self.state.lock() = PipelineState::Running {
            device_id: device.id.clone(),
        };
        Ok(())
    }

    /// Tear down the session entirely and return to `Idle`.
    pub fn reset(&self) {
        if let Some(mut provider) = self.provider.lock().take() {
            if let Err(e) = provider.stop() {
                log::warn!("capture provider stop failed during reset: {}", e);
            }
        }
        *self.state.lock() = PipelineState::Idle;
    }
}
