use crate::models::error::MonitorError;

/// Fired on the render lane once a scheduled buffer has fully drained.
pub type CompletionCallback = Box<dyn FnOnce() + Send + 'static>;

/// Interface to the platform playback output.
///
/// The graph schedules canonical-format buffers here; the sink plays
/// them in scheduling order and fires each completion callback after
/// the corresponding buffer drains. The relay's drain loop lives
/// entirely in those completions, so a sink must fire them exactly
/// once per scheduled buffer, even for silent audio.
pub trait PlaybackSink: Send + Sync {
    /// Start the output engine. Idempotent when already running.
    fn start(&self) -> Result<(), MonitorError>;

    /// Whether the output engine is currently running.
    fn is_running(&self) -> bool;

    /// Queue samples for playback after everything already scheduled.
    ///
    /// `on_complete` fires on the render lane — keep it short.
    fn schedule(&self, samples: Vec<f32>, on_complete: CompletionCallback);

    /// Stop the output engine. Pending completions are dropped, not
    /// completed.
    fn stop(&self);
}
