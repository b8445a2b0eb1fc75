//! Telemetry extraction from ffmpeg's stderr status lines.
//!
//! ffmpeg reports progress as whitespace separated `key=value` pairs, often
//! padded as `key=   value` so the columns line up:
//!
//! ```text
//! frame=  240 fps= 24 q=28.0 size=    1024kB time=00:00:10.00 bitrate= 838.9kbits/s speed=1.0x
//! ```
//!
//! Only `frame`, `fps` and `speed` are extracted. Everything else on the line
//! is ignored.

/// Fields parsed from a single diagnostics line. Absent fields were not on
/// the line (or their value did not parse).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Progress {
    pub frame: Option<u64>,
    pub fps: Option<f64>,
    pub speed: Option<String>,
}

impl Progress {
    pub fn is_empty(&self) -> bool {
        self.frame.is_none() && self.fps.is_none() && self.speed.is_none()
    }
}

/// Parse one line of diagnostics output.
pub fn parse_line(line: &str) -> Progress {
    let mut progress = Progress::default();

    for (key, value) in pairs(line) {
        match key {
            "frame" => {
                if let Ok(frame) = value.parse::<u64>() {
                    progress.frame = Some(frame);
                }
            }
            "fps" => {
                if let Some(fps) = parse_decimal(value) {
                    progress.fps = Some(fps);
                }
            }
            "speed" => {
                if let Some(label) = speed_label(value) {
                    progress.speed = Some(label);
                }
            }
            _ => {}
        }
    }

    progress
}

/// Split a line into `(key, value)` pairs, folding `key= value` into one pair.
fn pairs(line: &str) -> Vec<(&str, &str)> {
    let mut out = Vec::new();
    let mut tokens = line.split_whitespace().peekable();

    while let Some(token) = tokens.next() {
        let Some((key, value)) = token.split_once('=') else {
            continue;
        };
        if key.is_empty() {
            continue;
        }
        if !value.is_empty() {
            out.push((key, value));
            continue;
        }
        // Padded form: the value is the next token, unless that token is a pair itself.
        match tokens.peek() {
            Some(next) if !next.contains('=') => {
                out.push((key, *next));
                tokens.next();
            }
            _ => {}
        }
    }

    out
}

fn parse_decimal(value: &str) -> Option<f64> {
    let parsed = value.parse::<f64>().ok()?;
    (parsed.is_finite() && parsed >= 0.0).then_some(parsed)
}

fn speed_label(value: &str) -> Option<String> {
    let number = value.strip_suffix('x').unwrap_or(value);
    parse_decimal(number)?;
    Some(format!("{number}x"))
}
