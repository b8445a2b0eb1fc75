use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::progress::Progress;

pub const DEFAULT_VOLUME: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerPhase {
    /// Nothing selected.
    Idle,
    /// Media selected, no playback process.
    Ready,
    Playing,
    /// Playback process suspended.
    Paused,
}

/// Snapshot of what the player is doing. This is what observers receive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackState {
    pub phase: PlayerPhase,
    #[serde(skip)]
    pub selected_media: Option<PathBuf>,
    pub current_file: Option<String>,
    pub duration: f64,
    pub position: f64,
    pub is_playing: bool,
    pub fps: f64,
    pub speed: Option<String>,
    pub volume: u8,
    pub secondary_active: bool,
    pub capture_active: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            phase: PlayerPhase::Idle,
            selected_media: None,
            current_file: None,
            duration: 0.0,
            position: 0.0,
            is_playing: false,
            fps: 0.0,
            speed: None,
            volume: DEFAULT_VOLUME,
            secondary_active: false,
            capture_active: false,
        }
    }
}

impl PlaybackState {
    /// Clamp an arbitrary requested volume into 0..=100.
    pub fn clamp_volume(volume: i64) -> u8 {
        volume.clamp(0, 100) as u8
    }

    /// Replace the selection. Playback-related fields go back to the stopped baseline.
    pub fn select(&mut self, path: &Path, duration: f64) {
        self.selected_media = Some(path.to_path_buf());
        self.current_file = path.file_name().map(|n| n.to_string_lossy().into_owned());
        self.duration = duration.max(0.0);
        self.reset_playback();
    }

    /// Stopped baseline: no process, position and telemetry zeroed.
    /// The selection and volume survive.
    pub fn reset_playback(&mut self) {
        self.position = 0.0;
        self.is_playing = false;
        self.reset_telemetry();
        self.phase = if self.selected_media.is_some() {
            PlayerPhase::Ready
        } else {
            PlayerPhase::Idle
        };
    }

    pub fn reset_telemetry(&mut self) {
        self.fps = 0.0;
        self.speed = None;
    }

    /// Freshly spawned playback process at `position`.
    pub fn start_playing(&mut self, position: f64) {
        self.position = position;
        self.is_playing = true;
        self.phase = PlayerPhase::Playing;
        self.reset_telemetry();
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.is_playing = !paused;
        self.phase = if paused {
            PlayerPhase::Paused
        } else {
            PlayerPhase::Playing
        };
    }

    /// Bound a requested seek to the media length (when known).
    pub fn clamp_seek(&self, position: f64) -> f64 {
        let position = if position.is_finite() { position.max(0.0) } else { 0.0 };
        if self.duration > 0.0 {
            position.min(self.duration)
        } else {
            position
        }
    }

    /// Merge parsed telemetry. A frame count only moves the position once a
    /// positive frame rate is known.
    pub fn apply_progress(&mut self, progress: &Progress) {
        if let Some(fps) = progress.fps {
            self.fps = fps;
        }
        if let Some(frame) = progress.frame {
            if self.fps > 0.0 {
                self.position = frame as f64 / self.fps;
            }
        }
        if let Some(speed) = &progress.speed {
            self.speed = Some(speed.clone());
        }
    }

    pub fn clear_secondary(&mut self) {
        self.secondary_active = false;
        self.capture_active = false;
    }
}
