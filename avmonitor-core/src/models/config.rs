use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the monitor pipeline.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Canonical sample rate in Hz every captured buffer is converted
    /// to before it reaches the playback graph (default: 48000). The
    /// canonical path is mono; capture is downmixed on conversion.
    pub sample_rate: f64,

    /// Forward FFT length in samples (default: 1024). Must be a power
    /// of two.
    pub fft_size: usize,

    /// Number of magnitude bars exposed to the UI (default: 40).
    pub bar_count: usize,

    /// Maximum buffers the relay holds before dropping the oldest
    /// (default: 32).
    pub relay_queue_capacity: usize,

    /// Initial spectrum/volume sensitivity, clamped to [0, 2].
    pub sensitivity: f32,

    /// Directory the scratch recording is written to.
    pub output_directory: PathBuf,

    /// Fixed recording file name, overwritten on every recording.
    pub recording_file_name: String,

    /// Delay between playback completion and restoring the
    /// pre-recording mute state (default: 1s).
    pub playback_grace: Duration,

    /// Devices whose display name contains any of these fragments are
    /// excluded from the catalog (synthetic aggregate devices).
    pub excluded_name_fragments: Vec<String>,
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate <= 0.0 {
            return Err("sample rate must be positive".into());
        }
        if self.fft_size == 0 || !self.fft_size.is_power_of_two() {
            return Err(format!("fft size must be a power of two: {}", self.fft_size));
        }
        if self.bar_count == 0 || self.bar_count > self.fft_size / 2 {
            return Err(format!(
                "bar count must be in 1..={}: {}",
                self.fft_size / 2,
                self.bar_count
            ));
        }
        if self.relay_queue_capacity == 0 {
            return Err("relay queue capacity must be positive".into());
        }
        if !(0.0..=2.0).contains(&self.sensitivity) {
            return Err(format!("sensitivity out of range [0, 2]: {}", self.sensitivity));
        }
        if self.recording_file_name.is_empty() {
            return Err("recording file name must not be empty".into());
        }
        Ok(())
    }

    /// Full path of the scratch recording file.
    pub fn recording_path(&self) -> PathBuf {
        self.output_directory.join(&self.recording_file_name)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            fft_size: 1024,
            bar_count: 40,
            relay_queue_capacity: 32,
            sensitivity: 1.0,
            output_directory: PathBuf::from("."),
            recording_file_name: "recording.wav".into(),
            playback_grace: Duration::from_secs(1),
            excluded_name_fragments: vec!["CADefaultDeviceAggregate".into()],
        }
    }
}
