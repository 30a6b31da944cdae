use thiserror::Error;

/// Errors that can occur in the monitor pipeline.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MonitorError {
    #[error("permission denied")]
    PermissionDenied,

    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error("failed to add capture input: {0}")]
    AddInputFailed(String),

    #[error("failed to add capture output: {0}")]
    AddOutputFailed(String),

    #[error("failed to create buffer: {0}")]
    BufferCreationFailed(String),

    #[error("format conversion failed: {0}")]
    FormatConversionFailed(String),

    #[error("failed to delete recording file: {0}")]
    RecordingFileDeleteFailed(String),

    #[error("failed to read file: {0}")]
    FileReadFailed(String),

    #[error("failed to start playback engine: {0}")]
    EngineStartFailed(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("unknown error: {0}")]
    Unknown(String),
}

impl MonitorError {
    /// Device loss is recoverable: reset the session and wait for the
    /// device to reappear in the catalog.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::DeviceNotFound(_))
    }

    /// Per-buffer failures are droppable: skip the buffer, log, and
    /// keep the session alive.
    pub fn is_droppable(&self) -> bool {
        matches!(
            self,
            Self::BufferCreationFailed(_) | Self::FormatConversionFailed(_)
        )
    }
}
