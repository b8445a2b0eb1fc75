use deckplay::progress::{parse_line, Progress};

#[test]
fn test_full_status_line() {
    let line = "frame=  240 fps= 24 q=28.0 size=    1024kB time=00:00:10.00 bitrate= 838.9kbits/s speed=1.0x";
    let p = parse_line(line);
    assert_eq!(p.frame, Some(240));
    assert_eq!(p.fps, Some(24.0));
    assert_eq!(p.speed.as_deref(), Some("1.0x"));
}

#[test]
fn test_compact_pairs() {
    let p = parse_line("frame=1500 fps=29.97 speed=0.998x");
    assert_eq!(p.frame, Some(1500));
    assert_eq!(p.fps, Some(29.97));
    assert_eq!(p.speed.as_deref(), Some("0.998x"));
}

#[test]
fn test_speed_without_suffix_gets_one() {
    let p = parse_line("speed=2");
    assert_eq!(p.speed.as_deref(), Some("2x"));
}

#[test]
fn test_partial_line_only_sets_present_fields() {
    let p = parse_line("fps=25");
    assert_eq!(
        p,
        Progress {
            frame: None,
            fps: Some(25.0),
            speed: None
        }
    );
}

#[test]
fn test_non_progress_lines_are_empty() {
    for line in [
        "",
        "Input #0, matroska,webm, from 'clip.mkv':",
        "  Duration: 00:01:00.00, start: 0.000000, bitrate: 1200 kb/s",
        "Press [q] to stop, [?] for help",
    ] {
        assert!(parse_line(line).is_empty(), "expected nothing from {line:?}");
    }
}

#[test]
fn test_invalid_values_are_ignored() {
    let p = parse_line("frame=abc fps=-3 speed=N/A");
    assert!(p.is_empty(), "got {p:?}");

    let p = parse_line("frame=-1 fps=inf speed=fastx");
    assert!(p.is_empty(), "got {p:?}");
}

#[test]
fn test_padded_key_followed_by_pair_is_skipped() {
    // "fps=" has no value of its own; the next token is another pair.
    let p = parse_line("frame= 10 fps= q=1.0");
    assert_eq!(p.frame, Some(10));
    assert_eq!(p.fps, None);
}

#[test]
fn test_zero_fps_is_reported() {
    let p = parse_line("frame=    0 fps=0.0 q=0.0 size=       0kB time=00:00:00.00 speed=   0x");
    assert_eq!(p.frame, Some(0));
    assert_eq!(p.fps, Some(0.0));
    assert_eq!(p.speed.as_deref(), Some("0x"));
}
