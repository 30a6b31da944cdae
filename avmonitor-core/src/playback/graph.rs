//! Playback graph: two independently mutable player nodes in front of
//! one platform sink.
//!
//! The monitor node carries live passthrough audio; the playback node
//! carries recording playback. Keeping them separate avoids cross-talk
//! between the two paths: muting the monitor during a recording never
//! touches the node the recording will play back on.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::error::MonitorError;
use crate::processing::converter;
use crate::traits::playback_sink::{CompletionCallback, PlaybackSink};

/// Gain state for one player node.
///
/// Mute and gain are independent: muting zeroes the audible output
/// without touching the stored gain, so unmuting restores the exact
/// previous sensitivity.
#[derive(Debug, Clone, Copy)]
pub struct PlayerNode {
    muted: bool,
    gain: f32,
}

impl PlayerNode {
    fn new(muted: bool, gain: f32) -> Self {
        Self {
            muted,
            gain: gain.clamp(0.0, 2.0),
        }
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Gain actually applied to scheduled audio.
    pub fn effective_gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.gain
        }
    }
}

/// Owns the sink plus the monitor and playback nodes.
///
/// Monitor-path gain is stamped by the relay as each buffer enters its
/// queue, so a buffer produced while muted stays silent no matter when
/// it drains. A muted node still passes every buffer through as
/// silence; the drain loop keeps running and nothing is lost.
pub struct PlaybackGraph {
    sink: Arc<dyn PlaybackSink>,
    monitor_node: Mutex<PlayerNode>,
    playback_node: Mutex<PlayerNode>,
}

impl PlaybackGraph {
    /// New graph with the monitor node muted, matching the app's
    /// muted-by-default startup state.
    pub fn new(sink: Arc<dyn PlaybackSink>, sensitivity: f32) -> Self {
        Self {
            sink,
            monitor_node: Mutex::new(PlayerNode::new(true, sensitivity)),
            playback_node: Mutex::new(PlayerNode::new(true, sensitivity)),
        }
    }

    /// Start the sink if it is not already running.
    pub fn ensure_running(&self) -> Result<(), MonitorError> {
        if self.sink.is_running() {
            return Ok(());
        }
        self.sink.start()
    }

    /// Stop the sink. Scheduled-but-unplayed audio is dropped.
    pub fn stop(&self) {
        self.sink.stop();
    }

    pub fn monitor_muted(&self) -> bool {
        self.monitor_node.lock().muted()
    }

    pub fn set_monitor_muted(&self, muted: bool) {
        self.monitor_node.lock().muted = muted;
    }

    pub fn playback_muted(&self) -> bool {
        self.playback_node.lock().muted()
    }

    pub fn set_playback_muted(&self, muted: bool) {
        self.playback_node.lock().muted = muted;
    }

    /// Apply a new sensitivity to both nodes, clamped to [0, 2].
    ///
    /// Takes effect on the next buffer each node scales; a muted node
    /// stays silent but remembers the value.
    pub fn set_sensitivity(&self, sensitivity: f32) {
        let clamped = sensitivity.clamp(0.0, 2.0);
        self.monitor_node.lock().gain = clamped;
        self.playback_node.lock().gain = clamped;
    }

    pub fn sensitivity(&self) -> f32 {
        self.monitor_node.lock().gain()
    }

    /// Gain currently applied to audio entering the monitor path.
    pub fn monitor_effective_gain(&self) -> f32 {
        self.monitor_node.lock().effective_gain()
    }

    /// Schedule live passthrough audio on the sink.
    ///
    /// Samples arrive already scaled: the relay stamps the monitor
    /// gain when a buffer is pushed, not when it drains.
    pub fn schedule_monitor(&self, samples: Vec<f32>, on_complete: CompletionCallback) {
        self.sink.schedule(samples, on_complete);
    }

    /// Schedule recording playback through the playback node.
    pub fn schedule_playback(&self, mut samples: Vec<f32>, on_complete: CompletionCallback) {
        let gain = self.playback_node.lock().effective_gain();
        converter::apply_gain(&mut samples, gain);
        self.sink.schedule(samples, on_complete);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::testing::RecordingSink;

    #[test]
    fn starts_muted() {
        let sink = Arc::new(RecordingSink::new());
        let graph = PlaybackGraph::new(sink, 1.0);
        assert!(graph.monitor_muted());
    }

    #[test]
    fn muted_monitor_has_zero_effective_gain() {
        let sink = Arc::new(RecordingSink::new());
        let graph = PlaybackGraph::new(sink, 1.0);

        assert_eq!(graph.monitor_effective_gain(), 0.0);
        graph.set_monitor_muted(false);
        assert_eq!(graph.monitor_effective_gain(), 1.0);
    }

    #[test]
    fn unmuted_monitor_gain_tracks_sensitivity() {
        let sink = Arc::new(RecordingSink::new());
        let graph = PlaybackGraph::new(sink, 1.0);
        graph.set_monitor_muted(false);
        graph.set_sensitivity(2.0);

        assert_eq!(graph.monitor_effective_gain(), 2.0);
    }

    #[test]
    fn playback_node_scales_at_schedule_time() {
        let sink = Arc::new(RecordingSink::new());
        let graph = PlaybackGraph::new(Arc::clone(&sink) as Arc<dyn PlaybackSink>, 1.0);
        graph.set_playback_muted(false);
        graph.set_sensitivity(2.0);

        graph.schedule_playback(vec![0.25], Box::new(|| {}));

        assert_eq!(sink.scheduled()[0], vec![0.5]);
    }

    #[test]
    fn sensitivity_clamps_to_range() {
        let sink = Arc::new(RecordingSink::new());
        let graph = PlaybackGraph::new(sink, 1.0);
        graph.set_sensitivity(5.0);
        assert_eq!(graph.sensitivity(), 2.0);
        graph.set_sensitivity(-1.0);
        assert_eq!(graph.sensitivity(), 0.0);
    }

    #[test]
    fn unmute_restores_previous_gain() {
        let sink = Arc::new(RecordingSink::new());
        let graph = PlaybackGraph::new(sink, 1.5);

        assert_eq!(graph.monitor_effective_gain(), 0.0);
        graph.set_monitor_muted(false);
        assert!((graph.monitor_effective_gain() - 1.5).abs() < 1e-6);
    }

    #[test]
    fn ensure_running_is_idempotent() {
        let sink = Arc::new(RecordingSink::new());
        let graph = PlaybackGraph::new(Arc::clone(&sink) as Arc<dyn PlaybackSink>, 1.0);
        graph.ensure_running().unwrap();
        graph.ensure_running().unwrap();
        assert_eq!(sink.start_count(), 1);
    }
}
