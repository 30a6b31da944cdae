//! cpal playback sink.
//!
//! Plays scheduled mono chunks on the default output device,
//! duplicating the mono signal across the device's output channels.
//! Completion callbacks fire on the output thread once the
//! corresponding chunk has fully drained through the audio callback.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;

use avmonitor_core::models::error::MonitorError;
use avmonitor_core::traits::playback_sink::{CompletionCallback, PlaybackSink};

const START_TIMEOUT: Duration = Duration::from_secs(2);

struct ScheduledChunk {
    samples: Vec<f32>,
    pos: usize,
    on_complete: Option<CompletionCallback>,
}

struct SinkShared {
    queue: Mutex<VecDeque<ScheduledChunk>>,
    // Completions drained by the output thread, never run inside the
    // audio callback.
    finished: Mutex<Vec<CompletionCallback>>,
    running: AtomicBool,
}

/// Playback sink backed by a cpal output stream.
///
/// The stream lives on a dedicated named thread because cpal streams
/// are not `Send`. `stop` joins the thread and drops whatever is still
/// queued, completions included.
pub struct CpalPlaybackSink {
    shared: Arc<SinkShared>,
    render_handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl CpalPlaybackSink {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(SinkShared {
                queue: Mutex::new(VecDeque::new()),
                finished: Mutex::new(Vec::new()),
                running: AtomicBool::new(false),
            }),
            render_handle: Mutex::new(None),
        }
    }
}

impl Default for CpalPlaybackSink {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackSink for CpalPlaybackSink {
    fn start(&self) -> Result<(), MonitorError> {
        if self.shared.running.load(Ordering::SeqCst) {
            return Ok(());
        }

        self.shared.running.store(true, Ordering::SeqCst);
        let shared = Arc::clone(&self.shared);
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), MonitorError>>();

        let handle = thread::Builder::new()
            .name("cpal-output".into())
            .spawn(move || {
                render_loop(shared.clone(), ready_tx);
                shared.running.store(false, Ordering::SeqCst);
            })
            .map_err(|e| {
                MonitorError::EngineStartFailed(format!("failed to spawn output thread: {}", e))
            })?;

        match ready_rx.recv_timeout(START_TIMEOUT) {
            Ok(Ok(())) => {
                *self.render_handle.lock() = Some(handle);
                Ok(())
            }
            Ok(Err(e)) => {
                self.shared.running.store(false, Ordering::SeqCst);
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                self.shared.running.store(false, Ordering::SeqCst);
                let _ = handle.join();
                Err(MonitorError::EngineStartFailed(
                    "output stream start timed out".into(),
                ))
            }
        }
    }

    fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    fn schedule(&self, samples: Vec<f32>, on_complete: CompletionCallback) {
        self.shared.queue.lock().push_back(ScheduledChunk {
            samples,
            pos: 0,
            on_complete: Some(on_complete),
        });
    }

    fn stop(&self) {
        self.shared.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.render_handle.lock().take() {
            let _ = handle.join();
        }
        self.shared.queue.lock().clear();
        self.shared.finished.lock().clear();
    }
}

/// Owns the output stream and fires drained completions until the
/// running flag clears.
fn render_loop(shared: Arc<SinkShared>, ready_tx: mpsc::Sender<Result<(), MonitorError>>) {
    let stream = match build_stream(&shared) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(MonitorError::EngineStartFailed(format!(
            "failed to start output stream: {}",
            e
        ))));
        return;
    }
    let _ = ready_tx.send(Ok(()));

    while shared.running.load(Ordering::SeqCst) {
        let completions: Vec<CompletionCallback> =
            shared.finished.lock().drain(..).collect();
        for on_complete in completions {
            on_complete();
        }
        thread::sleep(Duration::from_millis(10));
    }
}

fn build_stream(shared: &Arc<SinkShared>) -> Result<cpal::Stream, MonitorError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| MonitorError::EngineStartFailed("no output device available".into()))?;
    let config = device
        .default_output_config()
        .map_err(|e| MonitorError::EngineStartFailed(format!("no output config: {}", e)))?;

    let channels = config.channels() as usize;
    let stream_config: cpal::StreamConfig = config.into();
    let shared = Arc::clone(shared);

    device
        .build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                fill_output(&shared, data, channels);
            },
            |e| log::error!("output stream error: {}", e),
            None,
        )
        .map_err(|e| MonitorError::EngineStartFailed(format!("failed to build output stream: {}", e)))
}

/// Copy queued mono samples into the interleaved output buffer,
/// zero-filling once the queue runs dry.
fn fill_output(shared: &SinkShared, data: &mut [f32], channels: usize) {
    let mut queue = shared.queue.lock();

    for frame in data.chunks_mut(channels) {
        let sample = loop {
            match queue.front_mut() {
                None => break 0.0,
                Some(chunk) if chunk.pos < chunk.samples.len() => {
                    let s = chunk.samples[chunk.pos];
                    chunk.pos += 1;
                    break s;
                }
                Some(chunk) => {
                    if let Some(on_complete) = chunk.on_complete.take() {
                        shared.finished.lock().push(on_complete);
                    }
                    queue.pop_front();
                }
            }
        };
        for out in frame.iter_mut() {
            *out = sample;
        }
    }

    // A chunk drained exactly at the buffer boundary still completes.
    while let Some(chunk) = queue.front_mut() {
        if chunk.pos < chunk.samples.len() {
            break;
        }
        if let Some(on_complete) = chunk.on_complete.take() {
            shared.finished.lock().push(on_complete);
        }
        queue.pop_front();
    }
}
