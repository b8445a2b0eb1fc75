//! Browser-controlled media playback: ffmpeg does the decoding, this crate
//! owns the processes, tracks their progress and pushes state to clients.

pub mod broadcast;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod media;
pub mod player;
pub mod process;
pub mod progress;
