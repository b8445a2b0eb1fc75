use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "deckplay",
    about = "Browser-controlled media player that drives ffmpeg for playback and DeckLink output",
    long_about = None,
    version,
)]
pub struct Args {
    /// Directory holding selectable and uploaded media [default: ./uploads]
    #[arg(short, long, value_name = "DIR")]
    pub media_dir: Option<PathBuf>,

    /// HTTP port to listen on [default: 5000]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to TOML config file (overrides default search: ./deckplay.toml, ~/.config/deckplay/config.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Bind to localhost only (127.0.0.1) instead of all interfaces
    #[arg(long)]
    pub localhost: bool,

    /// ffmpeg binary used for playback and output [default: ffmpeg]
    #[arg(long, value_name = "BIN")]
    pub ffmpeg: Option<String>,

    /// ffprobe binary used to read media durations [default: ffprobe]
    #[arg(long, value_name = "BIN")]
    pub ffprobe: Option<String>,
}
