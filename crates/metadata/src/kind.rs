use std::path::Path;

use common::MediaKind;
use mime_guess::mime;

const PLAYLIST_EXTS: &[&str] = &["m3u", "m3u8", "pls"];
const CAPTION_EXTS: &[&str] = &["srt"];

const ALBUM_ART_STEMS: &[&str] = &[
    "cover",
    "folder",
    "front",
    "album",
    "albumart",
    "albumartsmall",
    "thumb",
];

fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

fn has_extension(name: &str, exts: &[&str]) -> bool {
    match extension(name) {
        Some(ext) => exts.contains(&ext.as_str()),
        None => false,
    }
}

pub fn is_playlist(name: &str) -> bool {
    has_extension(name, PLAYLIST_EXTS)
}

pub fn is_caption(name: &str) -> bool {
    has_extension(name, CAPTION_EXTS)
}

/// Kind guessed from the file extension. Playlists and captions are never a
/// media kind even when their mime type says audio or text.
pub fn media_kind(name: &str) -> Option<MediaKind> {
    if is_playlist(name) || is_caption(name) {
        return None;
    }
    let guess = mime_guess::from_path(name).first()?;
    let top = guess.type_();
    if top == mime::AUDIO {
        Some(MediaKind::Audio)
    } else if top == mime::VIDEO {
        Some(MediaKind::Video)
    } else if top == mime::IMAGE {
        Some(MediaKind::Image)
    } else {
        None
    }
}

pub fn is_audio(name: &str) -> bool {
    media_kind(name) == Some(MediaKind::Audio)
}

pub fn is_video(name: &str) -> bool {
    media_kind(name) == Some(MediaKind::Video)
}

pub fn is_image(name: &str) -> bool {
    media_kind(name) == Some(MediaKind::Image)
}

/// Cover images that sit next to the music they illustrate
/// (`cover.jpg`, `Folder.png`, `AlbumArtSmall.jpg`, ...).
pub fn is_album_art(name: &str) -> bool {
    if !is_image(name) {
        return false;
    }
    let stem = match Path::new(name).file_stem() {
        Some(stem) => stem.to_string_lossy().to_ascii_lowercase(),
        None => return false,
    };
    ALBUM_ART_STEMS.contains(&stem.as_str())
}

/// Whether `caption_name` is a sidecar of `video_name`: `movie.srt` and
/// `movie.en.srt` both belong to `movie.mkv`.
pub fn is_caption_for(video_name: &str, caption_name: &str) -> bool {
    if !is_caption(caption_name) {
        return false;
    }
    let video_stem = match Path::new(video_name).file_stem() {
        Some(stem) => stem.to_string_lossy().to_string(),
        None => return false,
    };
    let caption = Path::new(caption_name);
    let first = match caption.file_stem() {
        Some(stem) => stem.to_string_lossy().to_string(),
        None => return false,
    };
    if first == video_stem {
        return true;
    }
    match Path::new(&first).file_stem() {
        Some(second) => second.to_string_lossy() == video_stem,
        None => false,
    }
}
