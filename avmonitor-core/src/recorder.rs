//! Recording and automatic playback of the scratch file.
//!
//! Recording force-mutes the live monitor path and diverts the capture
//! tap into the streaming writer. A successful stop finalizes the file
//! and playback of the recording starts on a dedicated playback node,
//! so the live monitor node is never touched by playback audio. Once
//! playback drains, the pre-recording mute state is restored after a
//! short grace period.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::config::MonitorConfig;
use crate::models::error::MonitorError;
use crate::models::recording::{RecordingMetadata, RecordingResult};
use crate::models::state::RecorderState;
use crate::playback::graph::PlaybackGraph;
use crate::processing::converter;
use crate::storage::metadata;
use crate::storage::recording_writer::RecordingWriter;

// The canonical monitoring path is mono; the converter downmixes every
// captured buffer before it reaches the recorder tap.
const CANONICAL_CHANNELS: u16 = 1;

struct RecorderInner {
    state: RecorderState,
    writer: Option<RecordingWriter>,
    frames_written: u64,
    mute_backup: bool,
    write_error: Option<MonitorError>,
}

pub struct Recorder {
    recording_path: PathBuf,
    sample_rate: f64,
    playback_grace: Duration,
    graph: Arc<PlaybackGraph>,
    inner: Mutex<RecorderInner>,
    self_ref: Weak<Recorder>,
}

impl Recorder {
    pub fn new(config: &MonitorConfig, graph: Arc<PlaybackGraph>) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            recording_path: config.recording_path(),
            sample_rate: config.sample_rate,
            playback_grace: config.playback_grace,
            graph,
            inner: Mutex::new(RecorderInner {
                state: RecorderState::NotRecording,
                writer: None,
                frames_written: 0,
                mute_backup: true,
                write_error: None,
            }),
            self_ref: Weak::clone(self_ref),
        })
    }

    pub fn state(&self) -> RecorderState {
        self.inner.lock().state
    }

    /// Begin recording to the fixed scratch path.
    ///
    /// Snapshots the current mute state, force-mutes the monitor, and
    /// deletes any previous recording. A failed delete aborts the
    /// start with nothing written and the mute state restored.
    pub fn start(&self) -> Result<(), MonitorError> {
        let mut inner = self.inner.lock();
        if inner.state.is_busy() {
            return Err(MonitorError::InvalidState(
                "recording already in progress".into(),
            ));
        }

        let mute_backup = self.graph.monitor_muted();
        self.graph.set_monitor_muted(true);

        if self.recording_path.exists() {
            if let Err(e) = fs::remove_file(&self.recording_path) {
                self.graph.set_monitor_muted(mute_backup);
                return Err(MonitorError::RecordingFileDeleteFailed(e.to_string()));
            }
        }

        let mut writer = RecordingWriter::new(self.recording_path.clone());
        if let Err(e) = writer.open(self.sample_rate as u32, CANONICAL_CHANNELS) {
            self.graph.set_monitor_muted(mute_backup);
            return Err(e);
        }

        inner.writer = Some(writer);
        inner.frames_written = 0;
        inner.write_error = None;
        inner.mute_backup = mute_backup;
        inner.state = RecorderState::Recording;
        Ok(())
    }

    /// Capture tap: append a canonical-format buffer to the file.
    ///
    /// Write failures are remembered and surfaced at stop; the buffer
    /// is dropped and capture continues.
    pub fn handle_samples(&self, samples: &[f32]) {
        let mut inner = self.inner.lock();
        if !inner.state.is_recording() {
            return;
        }
        let frames = samples.len() as u64;
        if let Some(writer) = inner.writer.as_mut() {
            let pcm = converter::to_int16_pcm(samples);
            match writer.append(&pcm) {
                Ok(()) => inner.frames_written += frames,
                Err(e) => {
                    log::error!("recording write failed: {}", e);
                    if inner.write_error.is_none() {
                        inner.write_error = Some(e);
                    }
                }
            }
        }
    }

    /// Stop recording and finalize the file.
    ///
    /// Returns the recording result; if any write failed during the
    /// recording the error is returned instead and playback must be
    /// skipped. The error path restores the pre-recording mute state
    /// immediately, since no playback will do it later.
    pub fn stop(&self) -> Result<RecordingResult, MonitorError> {
        let mut inner = self.inner.lock();
        if !inner.state.is_recording() {
            return Err(MonitorError::InvalidState("not recording".into()));
        }

        let mut writer = inner
            .writer
            .take()
            .ok_or_else(|| MonitorError::InvalidState("recording writer missing".into()))?;
        inner.state = RecorderState::NotRecording;

        let finalize_result = writer.finalize();
        let failure = inner.write_error.take().or(finalize_result.clone().err());
        if let Some(e) = failure {
            let backup = inner.mute_backup;
            drop(inner);
            self.graph.set_monitor_muted(backup);
            return Err(e);
        }

        let checksum = finalize_result?;
        let duration_secs = inner.frames_written as f64 / self.sample_rate;
        let recording_metadata = RecordingMetadata::new(
            duration_secs,
            &self.recording_path.to_string_lossy(),
            &checksum,
            self.sample_rate as u32,
            CANONICAL_CHANNELS,
        );
        if let Err(e) = metadata::write_metadata(&recording_metadata, &self.recording_path) {
            log::warn!("failed to write metadata sidecar: {}", e);
        }

        Ok(RecordingResult {
            file_path: self.recording_path.clone(),
            duration_secs,
            checksum,
            metadata: recording_metadata,
        })
    }

    /// Play the finished recording through the dedicated playback node.
    ///
    /// `on_done` fires after playback completes and the grace period
    /// has elapsed, with the pre-recording mute state restored.
    pub fn play_recording(
        &self,
        on_done: Box<dyn FnOnce() + Send + 'static>,
    ) -> Result<(), MonitorError> {
        {
            let mut inner = self.inner.lock();
            if inner.state.is_busy() {
                return Err(MonitorError::InvalidState("recorder busy".into()));
            }
            inner.state = RecorderState::PlayingBack;
        }

        let samples = match read_recording(&self.recording_path) {
            Ok(samples) => samples,
            Err(e) => {
                self.finish_playback();
                return Err(e);
            }
        };

        self.graph.set_playback_muted(false);
        if let Err(e) = self.graph.ensure_running() {
            self.finish_playback();
            return Err(e);
        }

        let recorder = Weak::clone(&self.self_ref);
        let grace = self.playback_grace;
        self.graph.schedule_playback(
            samples,
            Box::new(move || {
                // Completion fires on the render lane; the grace wait
                // and mute restore move to their own thread.
                let restore = move || {
                    thread::sleep(grace);
                    if let Some(recorder) = recorder.upgrade() {
                        recorder.finish_playback();
                    }
                    on_done();
                };
                if thread::Builder::new()
                    .name("playback-grace".into())
                    .spawn(restore)
                    .is_err()
                {
                    log::error!("failed to spawn grace timer thread");
                }
            }),
        );
        Ok(())
    }

    fn finish_playback(&self) {
        let backup = {
            let mut inner = self.inner.lock();
            inner.state = RecorderState::NotRecording;
            inner.mute_backup
        };
        self.graph.set_playback_muted(true);
        self.graph.set_monitor_muted(backup);
    }
}

/// Read the whole recording back as f32 samples.
fn read_recording(path: &PathBuf) -> Result<Vec<f32>, MonitorError> {
    let mut reader = hound::WavReader::open(path)
        .map_err(|e| MonitorError::FileReadFailed(e.to_string()))?;

    let spec = reader.spec();
    let samples: Result<Vec<f32>, hound::Error> = match spec.sample_format {
        hound::SampleFormat::Int => reader
            .samples::<i16>()
            .map(|s| s.map(|v| f32::from(v) / f32::from(i16::MAX)))
            .collect(),
        hound::SampleFormat::Float => reader.samples::<f32>().collect(),
    };
    samples.map_err(|e| MonitorError::FileReadFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::testing::RecordingSink;
    use crate::traits::playback_sink::PlaybackSink;
    use std::sync::mpsc;

    fn test_config(name: &str) -> MonitorConfig {
        MonitorConfig {
            output_directory: std::env::temp_dir(),
            recording_file_name: format!("avmonitor_rec_{}_{}.wav", std::process::id(), name),
            playback_grace: Duration::from_millis(0),
            ..Default::default()
        }
    }

    fn test_graph() -> (Arc<RecordingSink>, Arc<PlaybackGraph>) {
        let sink = Arc::new(RecordingSink::new());
        let graph = Arc::new(PlaybackGraph::new(
            Arc::clone(&sink) as Arc<dyn PlaybackSink>,
            1.0,
        ));
        (sink, graph)
    }

    fn cleanup(config: &MonitorConfig) {
        fs::remove_file(config.recording_path()).ok();
        fs::remove_file(config.recording_path().with_extension("metadata.json")).ok();
    }

    #[test]
    fn start_deletes_stale_recording() {
        let config = test_config("stale");
        fs::write(config.recording_path(), b"stale recording bytes").unwrap();

        let (_sink, graph) = test_graph();
        let recorder = Recorder::new(&config, graph);
        recorder.start().unwrap();

        // Old content replaced by a fresh header-only file.
        let len = fs::metadata(config.recording_path()).unwrap().len();
        assert_eq!(len, 44);

        recorder.handle_samples(&[0.1; 480]);
        recorder.stop().unwrap();
        cleanup(&config);
    }

    #[test]
    fn failed_delete_aborts_start() {
        let mut config = test_config("blocked");
        // A non-empty directory at the recording path cannot be
        // removed with remove_file.
        let dir = std::env::temp_dir().join(format!("avmonitor_blocked_{}", std::process::id()));
        fs::create_dir_all(dir.join("inner")).unwrap();
        config.output_directory = dir.parent().unwrap().to_path_buf();
        config.recording_file_name = dir.file_name().unwrap().to_string_lossy().into_owned();

        let (_sink, graph) = test_graph();
        graph.set_monitor_muted(false);
        let recorder = Recorder::new(&config, Arc::clone(&graph));

        let result = recorder.start();
        assert!(matches!(
            result,
            Err(MonitorError::RecordingFileDeleteFailed(_))
        ));
        assert_eq!(recorder.state(), RecorderState::NotRecording);
        assert!(!graph.monitor_muted(), "mute restored after aborted start");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn recording_forces_monitor_mute() {
        let config = test_config("muting");
        let (_sink, graph) = test_graph();
        graph.set_monitor_muted(false);
        let recorder = Recorder::new(&config, Arc::clone(&graph));

        recorder.start().unwrap();
        assert!(graph.monitor_muted());
        recorder.stop().unwrap();
        cleanup(&config);
    }

    #[test]
    fn stop_reports_duration_from_frames() {
        let config = test_config("duration");
        let (_sink, graph) = test_graph();
        let recorder = Recorder::new(&config, graph);

        recorder.start().unwrap();
        recorder.handle_samples(&vec![0.05; 48000]);
        let result = recorder.stop().unwrap();

        assert!((result.duration_secs - 1.0).abs() < 1e-9);
        assert_eq!(result.checksum.len(), 64);
        assert!(metadata::read_metadata(&config.recording_path()).is_ok());
        cleanup(&config);
    }

    #[test]
    fn finalized_header_matches_canonical_format() {
        let config = test_config("header");
        let (_sink, graph) = test_graph();
        let recorder = Recorder::new(&config, graph);

        recorder.start().unwrap();
        recorder.handle_samples(&vec![0.05; 48000]);
        let result = recorder.stop().unwrap();

        // The header's channel count must describe the mono data that
        // was actually written, or the file's duration is wrong.
        let reader = hound::WavReader::open(config.recording_path()).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, CANONICAL_CHANNELS);
        assert_eq!(spec.sample_rate, 48000);
        let file_secs = f64::from(reader.duration()) / f64::from(spec.sample_rate);
        assert!((file_secs - result.duration_secs).abs() < 1e-9);
        cleanup(&config);
    }

    #[test]
    fn stop_without_start_fails() {
        let config = test_config("nostart");
        let (_sink, graph) = test_graph();
        let recorder = Recorder::new(&config, graph);
        assert!(matches!(
            recorder.stop(),
            Err(MonitorError::InvalidState(_))
        ));
    }

    #[test]
    fn playback_restores_pre_recording_mute() {
        let config = test_config("playback");
        let (sink, graph) = test_graph();
        graph.set_monitor_muted(false); // user was listening
        let recorder = Recorder::new(&config, Arc::clone(&graph));

        recorder.start().unwrap();
        recorder.handle_samples(&[0.2; 4800]);
        recorder.stop().unwrap();

        let (tx, rx) = mpsc::channel();
        recorder
            .play_recording(Box::new(move || {
                tx.send(()).ok();
            }))
            .unwrap();

        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(!graph.monitor_muted(), "pre-recording mute state restored");
        assert!(graph.playback_muted(), "playback node re-muted after playback");
        assert_eq!(recorder.state(), RecorderState::NotRecording);

        // The recorded audio actually reached the sink.
        assert!(sink.scheduled().iter().any(|c| c.len() == 4800));
        cleanup(&config);
    }

    #[test]
    fn playback_of_missing_file_fails() {
        let config = test_config("missing");
        let (_sink, graph) = test_graph();
        let recorder = Recorder::new(&config, graph);
        fs::remove_file(config.recording_path()).ok();

        let result = recorder.play_recording(Box::new(|| {}));
        assert!(matches!(result, Err(MonitorError::FileReadFailed(_))));
        assert_eq!(recorder.state(), RecorderState::NotRecording);
    }
}
