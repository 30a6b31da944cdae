//! Fake playback sinks shared by the crate's tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::models::error::MonitorError;
use crate::traits::playback_sink::{CompletionCallback, PlaybackSink};

/// Sink that records every scheduled chunk and fires completions
/// immediately on the scheduling thread.
pub struct RecordingSink {
    chunks: Mutex<Vec<Vec<f32>>>,
    running: AtomicBool,
    starts: AtomicUsize,
    fail_start: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            chunks: Mutex::new(Vec::new()),
            running: AtomicBool::new(false),
            starts: AtomicUsize::new(0),
            fail_start: AtomicBool::new(false),
        }
    }

    pub fn failing() -> Self {
        let sink = Self::new();
        sink.fail_start.store(true, Ordering::SeqCst);
        sink
    }

    pub fn scheduled(&self) -> Vec<Vec<f32>> {
        self.chunks.lock().clone()
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }
}

impl PlaybackSink for RecordingSink {
    fn start(&self) -> Result<(), MonitorError> {
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(MonitorError::EngineStartFailed("test sink".into()));
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn schedule(&self, samples: Vec<f32>, on_complete: CompletionCallback) {
        self.chunks.lock().push(samples);
        on_complete();
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Sink whose completions fire only when the test calls
/// [`ManualSink::complete_next`], emulating a paused output engine.
pub struct ManualSink {
    pending: Mutex<VecDeque<(Vec<f32>, CompletionCallback)>>,
    played: Mutex<Vec<Vec<f32>>>,
    running: AtomicBool,
}

impl ManualSink {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            played: Mutex::new(Vec::new()),
            running: AtomicBool::new(false),
        }
    }

    /// Drain one scheduled chunk and fire its completion.
    ///
    /// Returns false when nothing was pending.
    pub fn complete_next(&self) -> bool {
        let entry = self.pending.lock().pop_front();
        match entry {
            Some((samples, on_complete)) => {
                self.played.lock().push(samples);
                on_complete();
                true
            }
            None => false,
        }
    }

    /// Drain everything currently pending, including chunks scheduled
    /// by the completions themselves.
    pub fn complete_all(&self) {
        while self.complete_next() {}
    }

    pub fn played(&self) -> Vec<Vec<f32>> {
        self.played.lock().clone()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}

impl PlaybackSink for ManualSink {
    fn start(&self) -> Result<(), MonitorError> {
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn schedule(&self, samples: Vec<f32>, on_complete: CompletionCallback) {
        self.pending.lock().push_back((samples, on_complete));
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.pending.lock().clear();
    }
}
