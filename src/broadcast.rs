//! Fan-out of playback snapshots to connected observers.
//!
//! Backed by a `tokio::sync::watch` channel: publishing never blocks, slow
//! observers simply skip to the newest snapshot, and the sender does not keep
//! disconnected observers alive.

use std::time::{Duration, Instant};

use tokio::sync::watch;

use crate::player::state::PlaybackState;

pub const DEFAULT_BROADCAST_INTERVAL: Duration = Duration::from_millis(100);
pub const POSITION_THRESHOLD: f64 = 0.1;
pub const FPS_THRESHOLD: f64 = 1.0;

#[derive(Clone)]
pub struct StateBroadcaster {
    tx: watch::Sender<PlaybackState>,
}

impl StateBroadcaster {
    pub fn new(initial: PlaybackState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Publish a snapshot. Identical consecutive snapshots are not re-sent.
    pub fn notify(&self, snapshot: PlaybackState) {
        self.tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }

    /// Last published snapshot.
    pub fn current(&self) -> PlaybackState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> StateObserver {
        StateObserver {
            rx: self.tx.subscribe(),
        }
    }

    pub fn observer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// One connected observer.
pub struct StateObserver {
    rx: watch::Receiver<PlaybackState>,
}

impl StateObserver {
    /// The live snapshot, sent to an observer as soon as it connects.
    pub fn current(&mut self) -> PlaybackState {
        self.rx.borrow_and_update().clone()
    }

    /// Wait for the next published snapshot. `None` once the broadcaster is gone.
    pub async fn next(&mut self) -> Option<PlaybackState> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

/// Rate limit for telemetry-driven broadcasts.
///
/// A snapshot passes when it differs meaningfully from the last one that
/// passed and the minimum interval has elapsed since then.
#[derive(Debug, Clone)]
pub struct TelemetryGate {
    interval: Duration,
    last: Option<Sent>,
}

#[derive(Debug, Clone)]
struct Sent {
    at: Instant,
    position: f64,
    fps: f64,
    speed: Option<String>,
}

impl TelemetryGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn admit(&mut self, state: &PlaybackState, now: Instant) -> bool {
        if let Some(last) = &self.last {
            let changed = (state.position - last.position).abs() > POSITION_THRESHOLD
                || (state.fps - last.fps).abs() > FPS_THRESHOLD
                || state.speed != last.speed;
            if !changed || now.saturating_duration_since(last.at) < self.interval {
                return false;
            }
        }

        self.last = Some(Sent {
            at: now,
            position: state.position,
            fps: state.fps,
            speed: state.speed.clone(),
        });
        true
    }
}
