use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;
use tokio_util::codec::{AnyDelimiterCodec, FramedRead};

use crate::broadcast::TelemetryGate;
use crate::player::controller::Shared;
use crate::process::handle::DiagnosticStream;
use crate::progress::parse_line;

/// Which process slot a monitor watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Primary,
    Secondary,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Primary => f.write_str("playback"),
            Slot::Secondary => f.write_str("secondary"),
        }
    }
}

/// Follow a process's diagnostics until the stream closes.
///
/// Telemetry from the playback process is merged into the shared state. When
/// the stream ends the process is gone (crash, end of media, or teardown);
/// if this monitor's session still owns the slot, the slot is reset.
pub(crate) async fn watch(shared: Arc<Shared>, slot: Slot, session: u64, stream: DiagnosticStream) {
    tracing::debug!("Monitoring {} process (session {})", slot, session);

    // ffmpeg terminates progress lines with '\r', everything else with '\n'.
    let mut lines = FramedRead::new(stream, AnyDelimiterCodec::new(b"\r\n".to_vec(), Vec::new()));
    let mut gate = TelemetryGate::new(shared.settings.broadcast_interval);

    while let Some(chunk) = lines.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::warn!("Reading {} diagnostics failed: {}", slot, e);
                break;
            }
        };
        let text = String::from_utf8_lossy(&chunk);
        let line = text.trim();
        if line.is_empty() {
            continue;
        }

        let progress = parse_line(line);
        if slot == Slot::Secondary || progress.is_empty() {
            tracing::debug!("ffmpeg ({}): {}", slot, line);
            continue;
        }

        let mut inner = shared.inner.lock().await;
        if !inner.owns(slot, session) {
            return;
        }
        inner.state.apply_progress(&progress);
        if gate.admit(&inner.state, Instant::now()) {
            shared.broadcaster.notify(inner.state.clone());
        }
    }

    let mut inner = shared.inner.lock().await;
    if !inner.owns(slot, session) {
        tracing::debug!("{} monitor for replaced session {} exiting", slot, session);
        return;
    }

    tracing::info!("{} process ended (session {})", slot, session);
    if let Some(process) = inner.take(slot) {
        process.reap(shared.settings.grace_timeout).await;
    }
    match slot {
        Slot::Primary => inner.state.reset_playback(),
        Slot::Secondary => inner.state.clear_secondary(),
    }
    shared.broadcaster.notify(inner.state.clone());
}
