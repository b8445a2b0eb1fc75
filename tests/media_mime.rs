use std::path::Path;
use deckplay::media::mime::{is_image, is_video, MediaKind};

#[test]
fn test_mp4_classified_as_video() {
    assert_eq!(MediaKind::of(Path::new("movie.mp4")), Some(MediaKind::Video));
    assert!(is_video(Path::new("movie.mp4")));
}

#[test]
fn test_mkv_and_mov_are_video() {
    assert_eq!(MediaKind::of(Path::new("a.mkv")), Some(MediaKind::Video));
    assert_eq!(MediaKind::of(Path::new("b.mov")), Some(MediaKind::Video));
}

#[test]
fn test_txt_returns_none() {
    assert!(MediaKind::of(Path::new("readme.txt")).is_none());
}

#[test]
fn test_no_extension_returns_none() {
    assert!(MediaKind::of(Path::new("Makefile")).is_none());
}

#[test]
fn test_case_insensitive() {
    assert_eq!(MediaKind::of(Path::new("MOVIE.MP4")), Some(MediaKind::Video));
    assert!(is_image(Path::new("PHOTO.JPEG")));
}

#[test]
fn test_mp3_classified_as_audio() {
    assert_eq!(MediaKind::of(Path::new("song.mp3")), Some(MediaKind::Audio));
    assert!(!is_video(Path::new("song.mp3")));
    assert!(!is_image(Path::new("song.mp3")));
}

#[test]
fn test_stills_classified_as_image() {
    for name in ["photo.jpg", "photo.png", "scan.tiff", "icon.webp"] {
        assert!(is_image(Path::new(name)), "{name} should be an image");
        assert!(!is_video(Path::new(name)));
    }
}
