use std::fs;
use std::path::Path;

use crate::models::error::MonitorError;
use crate::models::recording::RecordingMetadata;

/// Write recording metadata as a JSON sidecar file.
///
/// Creates `{recording_path}.metadata.json` next to the recording.
pub fn write_metadata(metadata: &RecordingMetadata, recording_path: &Path) -> Result<(), MonitorError> {
    let metadata_path = recording_path.with_extension("metadata.json");
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| MonitorError::StorageError(format!("failed to serialize metadata: {}", e)))?;
    fs::write(&metadata_path, json)
        .map_err(|e| MonitorError::StorageError(format!("failed to write metadata: {}", e)))?;
    Ok(())
}

/// Read recording metadata from a JSON sidecar file.
pub fn read_metadata(recording_path: &Path) -> Result<RecordingMetadata, MonitorError> {
    let metadata_path = recording_path.with_extension("metadata.json");
    let json = fs::read_to_string(&metadata_path)
        .map_err(|e| MonitorError::FileReadFailed(format!("failed to read metadata: {}", e)))?;
    serde_json::from_str(&json)
        .map_err(|e| MonitorError::StorageError(format!("failed to parse metadata: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn sidecar_round_trip() {
        let recording_path =
            std::env::temp_dir().join(format!("avmonitor_meta_{}.wav", std::process::id()));
        let metadata = RecordingMetadata::new(2.0, "recording.wav", "deadbeef", 48000, 1);

        write_metadata(&metadata, &recording_path).unwrap();
        let loaded = read_metadata(&recording_path).unwrap();
        assert_eq!(loaded, metadata);

        fs::remove_file(recording_path.with_extension("metadata.json")).ok();
    }

    #[test]
    fn missing_sidecar_is_a_read_failure() {
        let path = PathBuf::from("/nonexistent/recording.wav");
        assert!(matches!(
            read_metadata(&path),
            Err(MonitorError::FileReadFailed(_))
        ));
    }
}
