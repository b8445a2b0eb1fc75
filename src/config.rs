use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::player::PlayerSettings;
use crate::process::command::{CaptureSource, FfmpegCommands};

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_MEDIA_DIR: &str = "uploads";
const DEFAULT_PRIMARY_OUTPUT: &str = "pipe:1";
const DEFAULT_SECONDARY_DEVICE: &str = "DeckLink Output";
const DEFAULT_GRACE_TIMEOUT_SECS: u64 = 5;
const DEFAULT_BROADCAST_INTERVAL_MS: u64 = 100;

#[derive(Deserialize, Default, Debug)]
pub struct FileConfig {
    pub port: Option<u16>,
    pub media_dir: Option<PathBuf>,
    pub localhost: Option<bool>,
    pub ffmpeg: Option<String>,
    pub ffprobe: Option<String>,
    /// ffmpeg output target of the primary playback process.
    pub primary_output: Option<String>,
    /// DeckLink device name used for the secondary output.
    pub secondary_device: Option<String>,
    pub capture_device: Option<String>,
    pub grace_timeout_secs: Option<u64>,
    pub broadcast_interval_ms: Option<u64>,
}

#[derive(Debug)]
pub struct Config {
    pub port: u16,
    pub media_dir: PathBuf,
    pub localhost: bool,
    pub ffmpeg: String,
    pub ffprobe: String,
    pub primary_output: String,
    pub secondary_device: String,
    pub capture_device: String,
    pub grace_timeout: Duration,
    pub broadcast_interval: Duration,
}

impl Config {
    /// Merge CLI flags over the config file over built-in defaults.
    pub fn resolve(file: Option<FileConfig>, args: &crate::cli::Args) -> Self {
        let file = file.unwrap_or_default();
        Config {
            port: args.port.or(file.port).unwrap_or(DEFAULT_PORT),
            media_dir: args
                .media_dir
                .clone()
                .or(file.media_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MEDIA_DIR)),
            localhost: args.localhost || file.localhost.unwrap_or(false),
            ffmpeg: args
                .ffmpeg
                .clone()
                .or(file.ffmpeg)
                .unwrap_or_else(|| "ffmpeg".to_string()),
            ffprobe: args
                .ffprobe
                .clone()
                .or(file.ffprobe)
                .unwrap_or_else(|| "ffprobe".to_string()),
            primary_output: file
                .primary_output
                .unwrap_or_else(|| DEFAULT_PRIMARY_OUTPUT.to_string()),
            secondary_device: file
                .secondary_device
                .unwrap_or_else(|| DEFAULT_SECONDARY_DEVICE.to_string()),
            capture_device: file
                .capture_device
                .unwrap_or_else(|| CaptureSource::default().device),
            grace_timeout: Duration::from_secs(
                file.grace_timeout_secs.unwrap_or(DEFAULT_GRACE_TIMEOUT_SECS),
            ),
            broadcast_interval: Duration::from_millis(
                file.broadcast_interval_ms
                    .unwrap_or(DEFAULT_BROADCAST_INTERVAL_MS),
            ),
        }
    }

    pub fn commands(&self) -> FfmpegCommands {
        FfmpegCommands::new(self.ffmpeg.clone())
            .with_primary_output(self.primary_output.clone())
            .with_secondary_device(self.secondary_device.clone())
            .with_capture(CaptureSource {
                device: self.capture_device.clone(),
                ..CaptureSource::default()
            })
    }

    pub fn player_settings(&self) -> PlayerSettings {
        PlayerSettings {
            grace_timeout: self.grace_timeout,
            broadcast_interval: self.broadcast_interval,
        }
    }
}

pub fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_owned());
    }
    let cwd_config = PathBuf::from("deckplay.toml");
    if cwd_config.exists() {
        return Some(cwd_config);
    }
    if let Some(config_dir) = dirs::config_dir() {
        let xdg_config = config_dir.join("deckplay").join("config.toml");
        if xdg_config.exists() {
            return Some(xdg_config);
        }
    }
    None
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

pub fn load_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: FileConfig = toml::from_str(&content)?;
    Ok(config)
}
