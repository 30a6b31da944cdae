//! Canonical-format conversion for captured buffers.
//!
//! Every buffer leaving a capture callback is downmixed and resampled
//! to the graph's canonical format here before it touches the relay,
//! the spectrum analyzer, or the recording writer.

use crate::models::error::MonitorError;

/// Converts device-native PCM into the canonical monitoring format.
#[derive(Debug, Clone)]
pub struct FormatConverter {
    pub target_sample_rate: f64,
}

impl FormatConverter {
    pub fn new(target_sample_rate: f64) -> Self {
        Self { target_sample_rate }
    }

    /// Convert an interleaved device buffer to canonical mono at the
    /// target sample rate.
    pub fn convert(
        &self,
        samples: &[f32],
        source_sample_rate: f64,
        channels: u16,
    ) -> Result<Vec<f32>, MonitorError> {
        if channels == 0 {
            return Err(MonitorError::FormatConversionFailed(
                "zero-channel buffer".into(),
            ));
        }
        if source_sample_rate <= 0.0 {
            return Err(MonitorError::FormatConversionFailed(format!(
                "invalid source sample rate: {}",
                source_sample_rate
            )));
        }
        if samples.is_empty() {
            return Err(MonitorError::BufferCreationFailed("empty capture buffer".into()));
        }

        let mono = downmix_to_mono(samples, channels as usize);
        Ok(self.resample(&mono, source_sample_rate))
    }

    /// Linear-interpolation resampling to the target rate.
    ///
    /// Output capacity is sized by the target/source ratio; input is
    /// returned unchanged when the rates already match.
    pub fn resample(&self, samples: &[f32], source_sample_rate: f64) -> Vec<f32> {
        if (source_sample_rate - self.target_sample_rate).abs() < 0.01 || samples.is_empty() {
            return samples.to_vec();
        }

        let ratio = self.target_sample_rate / source_sample_rate;
        let output_count = (samples.len() as f64 * ratio) as usize;
        if output_count == 0 {
            return Vec::new();
        }

        let mut output = vec![0.0f32; output_count];
        for (i, out) in output.iter_mut().enumerate() {
            let source_index = i as f64 / ratio;
            let index = source_index as usize;
            let fraction = (source_index - index as f64) as f32;

            if index + 1 < samples.len() {
                *out = samples[index] * (1.0 - fraction) + samples[index + 1] * fraction;
            } else if index < samples.len() {
                *out = samples[index];
            }
        }
        output
    }
}

/// Downmix interleaved multi-channel audio to mono by averaging each
/// frame's channels.
pub fn downmix_to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let frame_count = samples.len() / channels;
    let scale = 1.0 / channels as f32;
    let mut mono = Vec::with_capacity(frame_count);
    for frame in 0..frame_count {
        let sum: f32 = samples[frame * channels..(frame + 1) * channels].iter().sum();
        mono.push(sum * scale);
    }
    mono
}

/// Scale samples in place by a gain factor.
pub fn apply_gain(samples: &mut [f32], gain: f32) {
    if (gain - 1.0).abs() < f32::EPSILON {
        return;
    }
    for sample in samples {
        *sample *= gain;
    }
}

/// Convert f32 samples in [-1, 1] to 16-bit little-endian PCM bytes.
///
/// Out-of-range values are clamped.
pub fn to_int16_pcm(samples: &[f32]) -> Vec<u8> {
    let mut data = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
        data.extend_from_slice(&value.to_le_bytes());
    }
    data
}
