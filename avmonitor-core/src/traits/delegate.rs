use crate::models::error::MonitorError;
use crate::models::recording::RecordingResult;
use crate::models::state::PipelineState;

/// Event delegate for monitor notifications.
///
/// All methods are called from processing lanes, not the UI thread.
/// Implementations should marshal to the UI thread if needed.
pub trait MonitorDelegate: Send + Sync {
    /// Called when the capture pipeline state changes.
    fn on_state_changed(&self, state: &PipelineState);

    /// Called with a fresh spectrum frame (one magnitude per bar).
    fn on_spectrum_updated(&self, magnitudes: &[f32]);

    /// Called when an error is surfaced to the user-visible state.
    fn on_error(&self, error: &MonitorError);

    /// Called when a recording is finalized, before its playback starts.
    fn on_recording_finished(&self, result: &RecordingResult);

    /// Called once playback of a recording has completed and the
    /// pre-recording mute state has been restored.
    fn on_playback_finished(&self);
}
