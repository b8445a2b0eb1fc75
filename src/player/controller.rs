//! Playback process controller.
//!
//! Owns the primary playback process, the optional secondary output process
//! and the shared [`PlaybackState`]. Every operation runs under one async
//! mutex, so terminating the old process and spawning its replacement is a
//! single critical section: two requests can never leave two playback
//! processes fighting over the same output.
//!
//! ffmpeg has no live seek or volume control, so both are implemented as
//! terminate-and-respawn at the new offset.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;

use crate::broadcast::{StateBroadcaster, StateObserver, DEFAULT_BROADCAST_INTERVAL};
use crate::error::{PlayerError, Result};
use crate::media::mime::is_image;
use crate::media::store::MediaStore;
use crate::player::monitor::{self, Slot};
use crate::player::state::{PlaybackState, PlayerPhase};
use crate::process::command::{image_clip_path, CommandSpec, FfmpegCommands, Job};
use crate::process::handle::{ProcessHandle, ProcessLauncher};

pub const DEFAULT_GRACE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct PlayerSettings {
    /// How long a process gets to exit after SIGTERM before it is killed.
    pub grace_timeout: Duration,
    /// Minimum spacing of telemetry-driven broadcasts.
    pub broadcast_interval: Duration,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            grace_timeout: DEFAULT_GRACE_TIMEOUT,
            broadcast_interval: DEFAULT_BROADCAST_INTERVAL,
        }
    }
}

/// Cheap to clone; all clones drive the same player.
#[derive(Clone)]
pub struct PlaybackController {
    shared: Arc<Shared>,
}

pub(crate) struct Shared {
    pub(crate) inner: Mutex<Inner>,
    pub(crate) broadcaster: StateBroadcaster,
    pub(crate) settings: PlayerSettings,
    launcher: Arc<dyn ProcessLauncher>,
    store: Arc<dyn MediaStore>,
    commands: FfmpegCommands,
}

pub(crate) struct Inner {
    pub(crate) state: PlaybackState,
    pub(crate) primary: Option<ActiveProcess>,
    pub(crate) secondary: Option<ActiveProcess>,
    last_session: u64,
}

impl Inner {
    fn next_session(&mut self) -> u64 {
        self.last_session += 1;
        self.last_session
    }

    /// Whether the process in `slot` is still the one started as `session`.
    pub(crate) fn owns(&self, slot: Slot, session: u64) -> bool {
        let active = match slot {
            Slot::Primary => &self.primary,
            Slot::Secondary => &self.secondary,
        };
        active.as_ref().map(|p| p.session) == Some(session)
    }

    pub(crate) fn take(&mut self, slot: Slot) -> Option<ActiveProcess> {
        match slot {
            Slot::Primary => self.primary.take(),
            Slot::Secondary => self.secondary.take(),
        }
    }
}

/// A running process plus the task watching its diagnostics.
pub(crate) struct ActiveProcess {
    pub(crate) session: u64,
    handle: Box<dyn ProcessHandle>,
    monitor: Option<JoinHandle<()>>,
}

impl ActiveProcess {
    /// Tear down from the controller side: wait for exit, then drop the monitor.
    async fn shutdown(mut self, grace: Duration) {
        self.handle.terminate(grace).await;
        if let Some(monitor) = self.monitor.take() {
            monitor.abort();
        }
    }

    /// Called by the process's own monitor once its stream has ended.
    pub(crate) async fn reap(mut self, grace: Duration) {
        self.handle.terminate(grace).await;
    }
}

impl PlaybackController {
    pub fn new(
        launcher: Arc<dyn ProcessLauncher>,
        store: Arc<dyn MediaStore>,
        commands: FfmpegCommands,
        settings: PlayerSettings,
    ) -> Self {
        let state = PlaybackState::default();
        let shared = Shared {
            broadcaster: StateBroadcaster::new(state.clone()),
            inner: Mutex::new(Inner {
                state,
                primary: None,
                secondary: None,
                last_session: 0,
            }),
            settings,
            launcher,
            store,
            commands,
        };
        Self {
            shared: Arc::new(shared),
        }
    }

    pub fn broadcaster(&self) -> &StateBroadcaster {
        &self.shared.broadcaster
    }

    pub fn subscribe(&self) -> StateObserver {
        self.shared.broadcaster.subscribe()
    }

    pub async fn state(&self) -> PlaybackState {
        self.shared.inner.lock().await.state.clone()
    }

    /// Select `path` for playback. Any running playback is stopped.
    pub async fn select_media(&self, path: &Path) -> Result<PlaybackState> {
        if !self.shared.store.exists(path) {
            return Err(PlayerError::MediaNotFound(path.to_path_buf()));
        }

        let duration = match self.shared.store.probe_duration(path).await {
            Ok(seconds) => seconds,
            Err(e) => {
                tracing::warn!("Using duration 0 for {}: {}", path.display(), e);
                0.0
            }
        };

        let mut inner = self.lock().await;
        self.stop_primary(&mut inner).await;
        inner.state.select(path, duration);
        tracing::info!("Selected {} ({:.1}s)", path.display(), duration);
        Ok(self.publish(&inner))
    }

    /// Start playback of the selected media at `position` seconds.
    pub async fn play(&self, position: f64) -> Result<PlaybackState> {
        let mut inner = self.lock().await;
        self.restart_primary(&mut inner, position).await?;
        Ok(self.publish(&inner))
    }

    /// Restart playback at `position`. There is no live seek.
    pub async fn seek(&self, position: f64) -> Result<PlaybackState> {
        self.play(position).await
    }

    pub async fn pause(&self) -> Result<PlaybackState> {
        self.suspend(Some(true)).await
    }

    pub async fn resume(&self) -> Result<PlaybackState> {
        self.suspend(Some(false)).await
    }

    /// Pause when playing, resume when paused. Read the returned state to
    /// learn which one happened.
    pub async fn toggle_pause(&self) -> Result<PlaybackState> {
        self.suspend(None).await
    }

    /// Set the volume (clamped to 0..=100). Running playback is restarted
    /// at the current position so the new volume takes effect.
    pub async fn set_volume(&self, volume: i64) -> Result<PlaybackState> {
        let mut inner = self.lock().await;
        inner.state.volume = PlaybackState::clamp_volume(volume);
        tracing::info!("Volume set to {}", inner.state.volume);

        if inner.state.is_playing {
            let position = inner.state.position;
            self.restart_primary(&mut inner, position).await?;
        }
        Ok(self.publish(&inner))
    }

    /// Stop playback. The selection is kept.
    pub async fn stop(&self) -> Result<PlaybackState> {
        let mut inner = self.lock().await;
        self.stop_primary(&mut inner).await;
        inner.state.reset_playback();
        Ok(self.publish(&inner))
    }

    /// Drive the secondary output from a media file. Stills are first rendered
    /// into a short clip because the output device only takes motion video.
    pub async fn start_secondary_output(&self, path: &Path) -> Result<PlaybackState> {
        if !self.shared.store.exists(path) {
            return Err(PlayerError::MediaNotFound(path.to_path_buf()));
        }

        let source = if is_image(path) {
            self.render_image_clip(path).await?
        } else {
            path.to_path_buf()
        };

        let spec = self
            .shared
            .commands
            .build(Job::SecondaryOutput { media: &source });
        let mut inner = self.lock().await;
        self.replace_secondary(&mut inner, spec, false).await?;
        Ok(self.publish(&inner))
    }

    /// Drive the secondary output from the live capture device.
    pub async fn start_capture_output(&self) -> Result<PlaybackState> {
        let spec = self.shared.commands.build(Job::CaptureOutput);
        let mut inner = self.lock().await;
        self.replace_secondary(&mut inner, spec, true).await?;
        Ok(self.publish(&inner))
    }

    pub async fn stop_secondary_output(&self) -> Result<PlaybackState> {
        let mut inner = self.lock().await;
        self.stop_secondary(&mut inner).await;
        inner.state.clear_secondary();
        Ok(self.publish(&inner))
    }

    /// Stop every process. Used on server shutdown.
    pub async fn shutdown(&self) {
        let mut inner = self.lock().await;
        self.stop_primary(&mut inner).await;
        self.stop_secondary(&mut inner).await;
        inner.state.reset_playback();
        inner.state.clear_secondary();
        self.publish(&inner);
    }

    async fn lock(&self) -> MutexGuard<'_, Inner> {
        self.shared.inner.lock().await
    }

    fn publish(&self, inner: &Inner) -> PlaybackState {
        let snapshot = inner.state.clone();
        self.shared.broadcaster.notify(snapshot.clone());
        snapshot
    }

    async fn stop_primary(&self, inner: &mut Inner) {
        if let Some(process) = inner.primary.take() {
            tracing::info!("Stopping playback process (session {})", process.session);
            process.shutdown(self.shared.settings.grace_timeout).await;
        }
    }

    async fn stop_secondary(&self, inner: &mut Inner) {
        if let Some(process) = inner.secondary.take() {
            tracing::info!("Stopping secondary output (session {})", process.session);
            process.shutdown(self.shared.settings.grace_timeout).await;
        }
    }

    /// Terminate the current playback process (if any) and spawn a new one at `position`.
    async fn restart_primary(&self, inner: &mut Inner, position: f64) -> Result<()> {
        let media = inner
            .state
            .selected_media
            .clone()
            .ok_or(PlayerError::NoMediaSelected)?;
        let seek = inner.state.clamp_seek(position);

        self.stop_primary(inner).await;

        let spec = self.shared.commands.build(Job::Playback {
            media: &media,
            seek,
            volume: inner.state.volume,
        });
        let process = match self.spawn_watched(inner, &spec, Slot::Primary).await {
            Ok(process) => process,
            Err(e) => {
                tracing::error!("Playback of {} failed to start: {}", media.display(), e);
                inner.state.reset_playback();
                self.publish(inner);
                return Err(e);
            }
        };

        tracing::info!(
            "Playing {} from {:.3}s (session {})",
            media.display(),
            seek,
            process.session
        );
        inner.primary = Some(process);
        inner.state.start_playing(seek);
        Ok(())
    }

    async fn replace_secondary(
        &self,
        inner: &mut Inner,
        spec: CommandSpec,
        capture: bool,
    ) -> Result<()> {
        self.stop_secondary(inner).await;

        let process = match self.spawn_watched(inner, &spec, Slot::Secondary).await {
            Ok(process) => process,
            Err(e) => {
                tracing::error!("Secondary output failed to start: {}", e);
                inner.state.clear_secondary();
                self.publish(inner);
                return Err(e);
            }
        };

        tracing::info!("Secondary output running (session {})", process.session);
        inner.secondary = Some(process);
        inner.state.secondary_active = true;
        inner.state.capture_active = capture;
        Ok(())
    }

    /// Spawn `spec` and attach a monitor to its diagnostics stream.
    ///
    /// The monitor cannot observe the new process until the caller releases
    /// the lock, by which time the slot holds it.
    async fn spawn_watched(
        &self,
        inner: &mut Inner,
        spec: &CommandSpec,
        slot: Slot,
    ) -> Result<ActiveProcess> {
        let mut handle = self.shared.launcher.spawn(spec).await?;
        let session = inner.next_session();

        let monitor = match handle.take_diagnostics() {
            Some(stream) => Some(tokio::spawn(monitor::watch(
                Arc::clone(&self.shared),
                slot,
                session,
                stream,
            ))),
            None => {
                tracing::warn!("{} process has no diagnostics stream; exit will go unnoticed", spec.role);
                None
            }
        };

        Ok(ActiveProcess {
            session,
            handle,
            monitor,
        })
    }

    async fn suspend(&self, target: Option<bool>) -> Result<PlaybackState> {
        let mut guard = self.lock().await;
        let inner = &mut *guard;

        let process = inner.primary.as_mut().ok_or(PlayerError::NoActiveProcess)?;
        let paused = inner.state.phase == PlayerPhase::Paused;
        let pause = target.unwrap_or(!paused);

        if !process.handle.supports_suspend() {
            return Err(PlayerError::NotSupported(if pause { "pause" } else { "resume" }));
        }

        if pause != paused {
            if pause {
                process.handle.pause()?;
            } else {
                process.handle.resume()?;
            }
            inner.state.set_paused(pause);
            tracing::info!("Playback {}", if pause { "paused" } else { "resumed" });
        }

        Ok(self.publish(inner))
    }

    async fn render_image_clip(&self, image: &Path) -> Result<PathBuf> {
        let output = image_clip_path(image);
        let spec = self.shared.commands.build(Job::ImageClip {
            image,
            output: &output,
        });
        tracing::info!("Rendering {} into {}", image.display(), output.display());

        let result = self
            .shared
            .launcher
            .run(&spec)
            .await
            .map_err(|e| PlayerError::ConversionFailed(e.to_string()))?;
        if !result.success {
            let reason = result.stderr.lines().last().unwrap_or("").trim().to_string();
            return Err(PlayerError::ConversionFailed(format!(
                "{} exited with {:?}: {}",
                spec.program, result.code, reason
            )));
        }
        Ok(output)
    }
}
