//! Buffer relay: the single-producer/single-consumer queue between the
//! capture callback lane and the playback graph.
//!
//! The producer pushes canonical-format buffers under the relay mutex;
//! the consumer is a self-perpetuating drain — each buffer's playback
//! completion schedules the next one, so there is no polling thread.
//! The monitor gain is stamped as a buffer enters the queue, so audio
//! produced while muted stays silent no matter when it drains.
//! The queue is bounded with a drop-oldest overflow policy, and a
//! generation counter lets a device switch invalidate in-flight
//! completions instead of letting a stale chain keep draining.

use std::collections::VecDeque;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::models::error::MonitorError;
use crate::playback::graph::PlaybackGraph;
use crate::processing::converter;

struct RelayInner {
    pending: VecDeque<Vec<f32>>,
    capacity: usize,
    generation: u64,
    in_flight: bool,
    dropped: u64,
}

/// FIFO relay feeding the monitor node of the playback graph.
///
/// Completions hold a weak handle back to the relay so a dropped relay
/// silently ends its drain chain.
pub struct BufferRelay {
    graph: Arc<PlaybackGraph>,
    inner: Mutex<RelayInner>,
    self_ref: Weak<BufferRelay>,
}

impl BufferRelay {
    pub fn new(graph: Arc<PlaybackGraph>, capacity: usize) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            graph,
            inner: Mutex::new(RelayInner {
                pending: VecDeque::with_capacity(capacity),
                capacity,
                generation: 0,
                in_flight: false,
                dropped: 0,
            }),
            self_ref: Weak::clone(self_ref),
        })
    }

    /// Producer side: stamp the current monitor gain, append, and kick
    /// the drain loop.
    ///
    /// Called from the capture callback lane. When the queue is full
    /// the oldest pending buffer is dropped so the producer never
    /// blocks.
    pub fn push(&self, mut samples: Vec<f32>) -> Result<(), MonitorError> {
        converter::apply_gain(&mut samples, self.graph.monitor_effective_gain());
        {
            let mut inner = self.inner.lock();
            if inner.pending.len() == inner.capacity {
                inner.pending.pop_front();
                inner.dropped += 1;
                log::warn!(
                    "relay queue full, dropped oldest buffer ({} dropped total)",
                    inner.dropped
                );
            }
            inner.pending.push_back(samples);
        }
        self.schedule_next()
    }

    /// Consumer side: schedule the oldest pending buffer on the graph.
    ///
    /// No-op while a buffer is already in flight; the in-flight
    /// buffer's completion re-enters here. The sink is (re)started
    /// first when it is not running; on start failure the buffer stays
    /// queued.
    pub fn schedule_next(&self) -> Result<(), MonitorError> {
        let (samples, generation) = {
            let mut inner = self.inner.lock();
            if inner.in_flight {
                return Ok(());
            }
            let Some(samples) = inner.pending.pop_front() else {
                return Ok(());
            };
            inner.in_flight = true;
            (samples, inner.generation)
        };

        if let Err(e) = self.graph.ensure_running() {
            let mut inner = self.inner.lock();
            if inner.generation == generation {
                inner.in_flight = false;
                inner.pending.push_front(samples);
            }
            return Err(e);
        }

        // The sink start ran outside the lock; a flush in that window
        // invalidated the popped buffer.
        if self.inner.lock().generation != generation {
            return Ok(());
        }

        let relay = Weak::clone(&self.self_ref);
        self.graph.schedule_monitor(
            samples,
            Box::new(move || {
                let Some(relay) = relay.upgrade() else {
                    return;
                };
                let proceed = {
                    let mut inner = relay.inner.lock();
                    if inner.generation != generation {
                        // Flushed while in flight: the chain stops here
                        // and whatever replaced us owns the drain.
                        false
                    } else {
                        inner.in_flight = false;
                        true
                    }
                };
                if proceed {
                    if let Err(e) = relay.schedule_next() {
                        log::error!("relay drain stalled: {}", e);
                    }
                }
            }),
        );
        Ok(())
    }

    /// Invalidate everything: clear pending buffers and orphan any
    /// in-flight completion. Used on device switch and session reset.
    pub fn flush(&self) {
        let mut inner = self.inner.lock();
        inner.pending.clear();
        inner.generation += 1;
        inner.in_flight = false;
    }

    pub fn pending_len(&self) -> usize {
        self.inner.lock().pending.len()
    }

    pub fn dropped_count(&self) -> u64 {
        self.inner.lock().dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use crate::playback::testing::{ManualSink, RecordingSink};
    use crate::traits::playback_sink::{CompletionCallback, PlaybackSink};

    fn graph_with(sink: Arc<dyn PlaybackSink>) -> Arc<PlaybackGraph> {
        let graph = PlaybackGraph::new(sink, 1.0);
        graph.set_monitor_muted(false);
        Arc::new(graph)
    }

    fn chunk(value: f32) -> Vec<f32> {
        vec![value; 4]
    }

    #[test]
    fn drains_in_fifo_order_across_pause() {
        let sink = Arc::new(ManualSink::new());
        let relay = BufferRelay::new(graph_with(Arc::clone(&sink) as Arc<dyn PlaybackSink>), 16);

        // Sink paused: buffers accumulate behind the first in-flight one.
        for i in 1..=5 {
            relay.push(chunk(i as f32 * 0.1)).unwrap();
        }
        assert_eq!(sink.pending_count(), 1);
        assert_eq!(relay.pending_len(), 4);

        sink.complete_all();

        let played = sink.played();
        assert_eq!(played.len(), 5);
        for (i, samples) in played.iter().enumerate() {
            assert!((samples[0] - (i as f32 + 1.0) * 0.1).abs() < 1e-6);
        }
    }

    #[test]
    fn overflow_drops_oldest_pending() {
        let sink = Arc::new(ManualSink::new());
        let relay = BufferRelay::new(graph_with(Arc::clone(&sink) as Arc<dyn PlaybackSink>), 2);

        relay.push(chunk(0.1)).unwrap(); // goes in flight
        relay.push(chunk(0.2)).unwrap();
        relay.push(chunk(0.3)).unwrap();
        relay.push(chunk(0.4)).unwrap(); // drops 0.2

        assert_eq!(relay.dropped_count(), 1);
        sink.complete_all();

        let played = sink.played();
        assert_eq!(played.len(), 3);
        assert!((played[0][0] - 0.1).abs() < 1e-6);
        assert!((played[1][0] - 0.3).abs() < 1e-6);
        assert!((played[2][0] - 0.4).abs() < 1e-6);
    }

    #[test]
    fn mute_toggling_never_halts_the_drain() {
        let sink = Arc::new(ManualSink::new());
        let graph = graph_with(Arc::clone(&sink) as Arc<dyn PlaybackSink>);
        let relay = BufferRelay::new(Arc::clone(&graph), 16);

        relay.push(chunk(0.1)).unwrap();
        graph.set_monitor_muted(true);
        relay.push(chunk(0.2)).unwrap();
        graph.set_monitor_muted(false);
        relay.push(chunk(0.3)).unwrap();

        sink.complete_all();

        let played = sink.played();
        assert_eq!(played.len(), 3, "muted buffers must not be lost");
        assert!(played[0].iter().any(|s| *s != 0.0));
        assert!(played[1].iter().all(|s| *s == 0.0), "muted buffer is silent");
        assert!(played[2].iter().any(|s| *s != 0.0));
    }

    #[test]
    fn immediate_completions_drain_everything() {
        let sink = Arc::new(RecordingSink::new());
        let relay = BufferRelay::new(graph_with(Arc::clone(&sink) as Arc<dyn PlaybackSink>), 16);

        for i in 0..10 {
            relay.push(chunk(i as f32)).unwrap();
        }

        assert_eq!(sink.scheduled().len(), 10);
        assert_eq!(relay.pending_len(), 0);
    }

    #[test]
    fn flush_orphans_in_flight_completion() {
        let sink = Arc::new(ManualSink::new());
        let relay = BufferRelay::new(graph_with(Arc::clone(&sink) as Arc<dyn PlaybackSink>), 16);

        relay.push(chunk(0.1)).unwrap(); // in flight
        relay.push(chunk(0.2)).unwrap(); // pending

        relay.flush();
        assert_eq!(relay.pending_len(), 0);

        relay.push(chunk(0.3)).unwrap();
        sink.complete_all();

        let played = sink.played();
        // 0.1 was already at the sink when we flushed; 0.2 must never
        // play; the stale completion must not re-drain anything.
        assert_eq!(played.len(), 2);
        assert!((played[1][0] - 0.3).abs() < 1e-6);
    }

    /// Sink that flushes the relay from inside `start`, landing a
    /// session switch in the window between the pop and the schedule.
    struct FlushOnStartSink {
        target: Mutex<Option<Arc<BufferRelay>>>,
        scheduled: Mutex<Vec<Vec<f32>>>,
        running: AtomicBool,
    }

    impl FlushOnStartSink {
        fn new() -> Self {
            Self {
                target: Mutex::new(None),
                scheduled: Mutex::new(Vec::new()),
                running: AtomicBool::new(false),
            }
        }
    }

    impl PlaybackSink for FlushOnStartSink {
        fn start(&self) -> Result<(), MonitorError> {
            if let Some(relay) = self.target.lock().clone() {
                relay.flush();
            }
            self.running.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn is_running(&self) -> bool {
            self.running.load(Ordering::SeqCst)
        }

        fn schedule(&self, samples: Vec<f32>, on_complete: CompletionCallback) {
            self.scheduled.lock().push(samples);
            on_complete();
        }

        fn stop(&self) {
            self.running.store(false, Ordering::SeqCst);
        }
    }

    #[test]
    fn flush_during_sink_start_drops_the_popped_buffer() {
        let sink = Arc::new(FlushOnStartSink::new());
        let graph = graph_with(Arc::clone(&sink) as Arc<dyn PlaybackSink>);
        let relay = BufferRelay::new(graph, 16);
        *sink.target.lock() = Some(Arc::clone(&relay));

        // The flush lands while the first buffer is already popped; it
        // belongs to the old session and must never reach the sink.
        relay.push(chunk(0.1)).unwrap();

        assert!(sink.scheduled.lock().is_empty());
        assert_eq!(relay.pending_len(), 0);

        // The relay keeps draining for the new session.
        relay.push(chunk(0.2)).unwrap();
        assert_eq!(sink.scheduled.lock().len(), 1);
    }

    #[test]
    fn engine_start_failure_keeps_buffer_queued() {
        let sink = Arc::new(RecordingSink::failing());
        let relay = BufferRelay::new(graph_with(sink), 16);

        let result = relay.push(chunk(0.1));
        assert!(matches!(result, Err(MonitorError::EngineStartFailed(_))));
        assert_eq!(relay.pending_len(), 1);
    }
}
