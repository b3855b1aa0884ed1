//! Replay collector: reads JSON-lines input events from any reader.
//!
//! A single producer thread parses lines in order and pushes them into a
//! bounded channel, so the engine sees events in the order they were
//! recorded. When the source is exhausted the channel disconnects.
//!
//! Every `start` gets its own running flag and channel. A worker left behind
//! by `stop` (still blocked reading its source) is detached, never joined.

use crate::collector::types::ScriptEvent;
use crate::collector::CollectorError;
use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender};
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How often a worker waiting on a full channel checks for `stop`.
const SEND_POLL: Duration = Duration::from_millis(50);

/// Configuration for the replay collector.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Maximum number of parsed events buffered ahead of the engine
    pub capacity: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self { capacity: 4_096 }
    }
}

/// Collector that replays a recorded (or piped) event stream.
pub struct ReplayCollector {
    config: CollectorConfig,
    receiver: Receiver<ScriptEvent>,
    running: Arc<AtomicBool>,
    rejected: Arc<AtomicU64>,
    worker: Option<JoinHandle<()>>,
}

impl ReplayCollector {
    /// Create a new, idle collector.
    pub fn new(config: CollectorConfig) -> Self {
        // Placeholder receiver: its sender is dropped immediately, so an
        // unstarted collector reads as disconnected.
        let (_sender, receiver) = bounded(1);
        Self {
            config,
            receiver,
            running: Arc::new(AtomicBool::new(false)),
            rejected: Arc::new(AtomicU64::new(0)),
            worker: None,
        }
    }

    /// Start reading `source` on a background thread.
    pub fn start<R>(&mut self, source: R) -> Result<(), CollectorError>
    where
        R: BufRead + Send + 'static,
    {
        if self.running.load(Ordering::SeqCst) {
            return Err(CollectorError::AlreadyRunning);
        }
        if let Some(worker) = self.worker.take() {
            if worker.is_finished() {
                let _ = worker.join();
            } else {
                tracing::debug!("Detaching previous replay worker, its source is still blocked");
            }
        }

        let (sender, receiver) = bounded(self.config.capacity.max(1));
        self.receiver = receiver;
        self.running = Arc::new(AtomicBool::new(true));

        let running = Arc::clone(&self.running);
        let rejected = Arc::clone(&self.rejected);

        let worker = thread::Builder::new()
            .name("replay-collector".to_string())
            .spawn(move || {
                for (index, line) in source.lines().enumerate() {
                    if !running.load(Ordering::SeqCst) {
                        break;
                    }
                    let line = match line {
                        Ok(line) => line,
                        Err(e) => {
                            tracing::warn!("Stopping replay, read failed: {e}");
                            break;
                        }
                    };
                    let trimmed = line.trim();
                    if trimmed.is_empty() || trimmed.starts_with('#') {
                        continue;
                    }

                    match ScriptEvent::parse_line(trimmed) {
                        Ok(event) => {
                            if !send_while_running(&sender, &running, event) {
                                break;
                            }
                        }
                        Err(e) => {
                            rejected.fetch_add(1, Ordering::Relaxed);
                            tracing::warn!("Skipping line {}: {e}", index + 1);
                        }
                    }
                }
                running.store(false, Ordering::SeqCst);
            })?;

        self.worker = Some(worker);
        Ok(())
    }

    /// Stop reading. Events already queued stay available on the receiver.
    ///
    /// A worker waiting on a full channel exits within [`SEND_POLL`]; one
    /// blocked inside its source exits on the next line it gets.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Check if the collector is still reading its source.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get the receiver for input events.
    pub fn receiver(&self) -> &Receiver<ScriptEvent> {
        &self.receiver
    }

    /// Try to receive an event without blocking.
    pub fn try_recv(&self) -> Option<ScriptEvent> {
        self.receiver.try_recv().ok()
    }

    /// Number of lines that could not be parsed so far.
    pub fn rejected_lines(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }
}

/// Queue `event`, giving up once the run is stopped or the receiver is gone.
fn send_while_running(
    sender: &Sender<ScriptEvent>,
    running: &AtomicBool,
    mut event: ScriptEvent,
) -> bool {
    loop {
        match sender.send_timeout(event, SEND_POLL) {
            Ok(()) => return true,
            Err(SendTimeoutError::Timeout(returned)) => {
                if !running.load(Ordering::SeqCst) {
                    return false;
                }
                event = returned;
            }
            Err(SendTimeoutError::Disconnected(_)) => return false,
        }
    }
}

impl Drop for ReplayCollector {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::types::{InputEvent, SensorSample};
    use std::io::{BufReader, Cursor, Read};

    /// A source that blocks until its sender side is dropped, then ends.
    struct Stalled(Receiver<()>);

    impl Read for Stalled {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            let _ = self.0.recv();
            Ok(0)
        }
    }

    fn touch_at(at_ms: u64) -> String {
        format!("{{\"kind\":\"touch_move\",\"at_ms\":{at_ms}}}\n")
    }

    #[test]
    fn test_replay_preserves_order_and_skips_bad_lines() {
        let script = "\
# warm-up
{\"kind\":\"foreground\",\"active\":true,\"at_ms\":0}
{\"kind\":\"proximity\",\"distance\":0,\"max_range\":5,\"at_ms\":10}
garbage

{\"kind\":\"proximity\",\"distance\":5,\"max_range\":5,\"at_ms\":110}
";
        let mut collector = ReplayCollector::new(CollectorConfig::default());
        collector.start(Cursor::new(script.to_string())).unwrap();

        let events: Vec<ScriptEvent> = collector.receiver().iter().collect();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].event, InputEvent::Foreground { active: true });
        assert_eq!(events[1].at_ms, Some(10));
        assert_eq!(
            events[2].event,
            InputEvent::Sample(SensorSample::Proximity {
                distance: 5.0,
                max_range: 5.0
            })
        );
        assert_eq!(collector.rejected_lines(), 1);
    }

    #[test]
    fn test_unstarted_collector_is_idle() {
        let collector = ReplayCollector::new(CollectorConfig::default());
        assert!(!collector.is_running());
        assert!(collector.try_recv().is_none());
    }

    #[test]
    fn test_restart_after_stop_on_full_channel() {
        let script: String = (0..10).map(touch_at).collect();
        let mut collector = ReplayCollector::new(CollectorConfig { capacity: 1 });
        collector.start(Cursor::new(script)).unwrap();
        collector.stop();
        assert!(!collector.is_running());

        collector.start(Cursor::new(touch_at(99))).unwrap();
        let events: Vec<ScriptEvent> = collector.receiver().iter().collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].at_ms, Some(99));
    }

    #[test]
    fn test_restart_does_not_wait_for_a_blocked_source() {
        let (hold, stalled) = bounded::<()>(0);
        let mut collector = ReplayCollector::new(CollectorConfig::default());
        collector.start(BufReader::new(Stalled(stalled))).unwrap();
        collector.stop();

        collector.start(Cursor::new(touch_at(5))).unwrap();
        let events: Vec<ScriptEvent> = collector.receiver().iter().collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, InputEvent::Sample(SensorSample::TouchMove));
        drop(hold);
    }
}
