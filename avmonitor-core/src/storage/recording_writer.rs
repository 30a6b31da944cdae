//! Streaming WAV writer for the scratch recording.
//!
//! Opens with a placeholder header, appends PCM as it arrives from the
//! capture tap, and patches the RIFF size fields on finalize. The
//! finalized file is checksummed with SHA-256 so the result can be
//! verified later.

use std::fs::{self, File};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::error::MonitorError;
use crate::processing::wav_format;

pub struct RecordingWriter {
    path: PathBuf,
    file: Option<File>,
    bytes_written: u64,
}

impl RecordingWriter {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            file: None,
            bytes_written: 0,
        }
    }

    /// Create the file and write the placeholder header.
    pub fn open(&mut self, sample_rate: u32, channels: u16) -> Result<(), MonitorError> {
        if self.file.is_some() {
            return Err(MonitorError::InvalidState("writer already open".into()));
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| MonitorError::StorageError(format!("failed to create directory: {}", e)))?;
        }

        let file = File::create(&self.path)
            .map_err(|e| MonitorError::StorageError(format!("failed to create file: {}", e)))?;
        self.file = Some(file);
        self.bytes_written = 0;

        let header = wav_format::generate_wav_header(sample_rate, 16, channels, 0);
        self.append(&header)
    }

    /// Append raw little-endian PCM bytes.
    pub fn append(&mut self, data: &[u8]) -> Result<(), MonitorError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| MonitorError::StorageError("writer is not open".into()))?;
        file.write_all(data)
            .map_err(|e| MonitorError::StorageError(format!("write failed: {}", e)))?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }

    /// Patch the size fields, flush, and return the file's SHA-256
    /// hex digest.
    pub fn finalize(&mut self) -> Result<String, MonitorError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| MonitorError::StorageError("writer is not open".into()))?;

        let riff_size = (self.bytes_written - 8) as u32;
        file.seek(SeekFrom::Start(4))
            .map_err(|e| MonitorError::StorageError(e.to_string()))?;
        file.write_all(&riff_size.to_le_bytes())
            .map_err(|e| MonitorError::StorageError(e.to_string()))?;

        let data_size = (self.bytes_written - wav_format::WAV_HEADER_SIZE as u64) as u32;
        file.seek(SeekFrom::Start(40))
            .map_err(|e| MonitorError::StorageError(e.to_string()))?;
        file.write_all(&data_size.to_le_bytes())
            .map_err(|e| MonitorError::StorageError(e.to_string()))?;

        file.flush().map_err(|e| MonitorError::StorageError(e.to_string()))?;
        self.file = None;

        sha256_file(&self.path)
    }

    /// PCM bytes written so far, excluding the header.
    pub fn data_bytes(&self) -> u64 {
        self.bytes_written
            .saturating_sub(wav_format::WAV_HEADER_SIZE as u64)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// SHA-256 hex digest of a file's contents.
fn sha256_file(path: &Path) -> Result<String, MonitorError> {
    let data = fs::read(path)
        .map_err(|e| MonitorError::StorageError(format!("failed to read file for checksum: {}", e)))?;
    let digest = Sha256::digest(&data);
    Ok(digest.iter().fold(String::with_capacity(64), |mut out, byte| {
        use std::fmt::Write as _;
        let _ = write!(out, "{:02x}", byte);
        out
    }))
}
