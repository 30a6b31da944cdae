use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Result returned when a recording is finalized successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingResult {
    pub file_path: PathBuf,
    pub duration_secs: f64,
    pub checksum: String,
    pub metadata: RecordingMetadata,
}

/// Metadata stored in a JSON sidecar next to the recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub duration_secs: f64,
    pub file_path: String,
    pub checksum: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub created_at: String,
}

impl RecordingMetadata {
    pub fn new(
        duration_secs: f64,
        file_path: &str,
        checksum: &str,
        sample_rate: u32,
        channels: u16,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            duration_secs,
            file_path: file_path.to_string(),
            checksum: checksum.to_string(),
            sample_rate,
            channels,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_round_trips_through_json() {
        let metadata = RecordingMetadata::new(1.5, "/tmp/recording.wav", "abc123", 48000, 1);
        let json = serde_json::to_string(&metadata).unwrap();
        let parsed: RecordingMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, metadata);
    }

    #[test]
    fn metadata_ids_are_unique() {
        let a = RecordingMetadata::new(0.0, "x", "c", 48000, 1);
        let b = RecordingMetadata::new(0.0, "x", "c", 48000, 1);
        assert_ne!(a.id, b.id);
    }
}
