use super::error::MonitorError;

/// Capture pipeline state machine.
///
/// State transitions:
/// ```text
/// idle → starting → running
///           ↓          ↓
///         error       idle (reset / device removed / permission lost)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineState {
    Idle,
    Starting,
    Running { device_id: String },
    Error(MonitorError),
}

impl PipelineState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }

    /// The bound device id while a session is live.
    pub fn device_id(&self) -> Option<&str> {
        match self {
            Self::Running { device_id } => Some(device_id),
            _ => None,
        }
    }
}

/// Recorder state machine.
///
/// State transitions:
/// ```text
/// not-recording → recording → not-recording → playing-back → not-recording
/// ```
/// Playback starts automatically after a successful stop; a recording
/// that failed mid-write goes straight back to not-recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecorderState {
    #[default]
    NotRecording,
    Recording,
    PlayingBack,
}

impl RecorderState {
    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    pub fn is_playing_back(&self) -> bool {
        matches!(self, Self::PlayingBack)
    }

    /// True while a record/playback cycle is in progress.
    pub fn is_busy(&self) -> bool {
        !matches!(self, Self::NotRecording)
    }
}
