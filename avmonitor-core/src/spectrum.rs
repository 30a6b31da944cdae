//! Real-time spectrum analysis for the visualizer bars.
//!
//! A fixed-size forward real FFT runs over the most recent captured
//! buffer; the magnitudes of the first `bar_count` bins, scaled by the
//! user sensitivity, become the UI's bar heights. Frames are not
//! queued — the latest frame always wins, and a read racing a write
//! simply sees the previous frame.
//!
//! No window function is applied before the transform, matching the
//! shipped visual behavior; adding one changes the bar shapes and is a
//! product decision.

use std::sync::Arc;

use parking_lot::Mutex;
use realfft::{RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex;

use crate::models::error::MonitorError;

/// Shared last-write-wins spectrum frame.
///
/// Cheap to clone; the UI lane holds one and polls `latest`.
#[derive(Clone)]
pub struct SpectrumSnapshot {
    frame: Arc<Mutex<Vec<f32>>>,
}

impl SpectrumSnapshot {
    fn new(bar_count: usize) -> Self {
        Self {
            frame: Arc::new(Mutex::new(vec![0.0; bar_count])),
        }
    }

    pub fn latest(&self) -> Vec<f32> {
        self.frame.lock().clone()
    }

    fn store(&self, magnitudes: &[f32]) {
        let mut frame = self.frame.lock();
        frame.clear();
        frame.extend_from_slice(magnitudes);
    }
}

/// Fixed-size FFT magnitude analyzer.
///
/// Scratch and output buffers are preallocated; `analyze` does no
/// allocation beyond the returned frame and is safe to call from the
/// capture callback lane.
pub struct SpectrumAnalyzer {
    fft: Arc<dyn RealToComplex<f32>>,
    input: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    bar_count: usize,
    snapshot: SpectrumSnapshot,
}

impl SpectrumAnalyzer {
    pub fn new(fft_size: usize, bar_count: usize) -> Self {
        let mut planner = RealFftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        let spectrum = fft.make_output_vec();
        let scratch = fft.make_scratch_vec();
        Self {
            fft,
            input: vec![0.0; fft_size],
            spectrum,
            scratch,
            bar_count,
            snapshot: SpectrumSnapshot::new(bar_count),
        }
    }

    /// Transform the most recent buffer into a bar frame.
    ///
    /// Buffers shorter than the FFT size are zero-padded; longer ones
    /// use only the leading `fft_size` samples. The resulting frame
    /// replaces the shared snapshot atomically from the reader's
    /// perspective.
    pub fn analyze(&mut self, samples: &[f32], sensitivity: f32) -> Result<Vec<f32>, MonitorError> {
        let take = samples.len().min(self.input.len());
        self.input[..take].copy_from_slice(&samples[..take]);
        self.input[take..].fill(0.0);

        self.fft
            .process_with_scratch(&mut self.input, &mut self.spectrum, &mut self.scratch)
            .map_err(|e| MonitorError::Unknown(format!("fft execution failed: {}", e)))?;

        let magnitudes: Vec<f32> = self.spectrum[..self.bar_count]
            .iter()
            .map(|bin| bin.norm() * sensitivity)
            .collect();

        self.snapshot.store(&magnitudes);
        Ok(magnitudes)
    }

    /// Zero the shared frame, e.g. when the session resets.
    pub fn reset(&self) {
        self.snapshot.store(&vec![0.0; self.bar_count]);
    }

    pub fn bar_count(&self) -> usize {
        self.bar_count
    }

    pub fn snapshot(&self) -> SpectrumSnapshot {
        self.snapshot.clone()
    }
}
