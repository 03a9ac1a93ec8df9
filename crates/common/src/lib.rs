use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

mod key;

pub use key::{KeyError, ObjectId, KEY_DELIM};

pub type DetailId = u64;

/// One node of the virtual catalog tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogObject {
    pub object_id: ObjectId,
    pub parent_id: ObjectId,
    #[serde(default)]
    pub ref_id: Option<ObjectId>,
    #[serde(default)]
    pub detail_id: Option<DetailId>,
    pub class: ObjectClass,
    pub name: String,
}

/// Metadata record, stored once per physical file and shared by aliases.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Detail {
    pub id: DetailId,
    pub path: Option<String>,
    pub size: Option<u64>,
    pub title: Option<String>,
    pub duration_ms: Option<u32>,
    pub date: Option<String>,
    pub creator: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub track_no: Option<u16>,
    pub disc_no: Option<u16>,
    pub album_art: Option<u64>,
    pub mime: Option<String>,
    pub timestamp: Option<i64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectClass {
    #[serde(rename = "container.storageFolder")]
    StorageFolder,
    #[serde(rename = "container.album")]
    Album,
    #[serde(rename = "container.album.musicAlbum")]
    MusicAlbum,
    #[serde(rename = "container.album.photoAlbum")]
    PhotoAlbum,
    #[serde(rename = "container.person")]
    Person,
    #[serde(rename = "container.person.musicArtist")]
    MusicArtist,
    #[serde(rename = "container.genre.musicGenre")]
    MusicGenre,
    #[serde(rename = "item.audioItem.musicTrack")]
    MusicTrack,
    #[serde(rename = "item.videoItem")]
    VideoItem,
    #[serde(rename = "item.imageItem.photo")]
    Photo,
}

impl ObjectClass {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectClass::StorageFolder => "container.storageFolder",
            ObjectClass::Album => "container.album",
            ObjectClass::MusicAlbum => "container.album.musicAlbum",
            ObjectClass::PhotoAlbum => "container.album.photoAlbum",
            ObjectClass::Person => "container.person",
            ObjectClass::MusicArtist => "container.person.musicArtist",
            ObjectClass::MusicGenre => "container.genre.musicGenre",
            ObjectClass::MusicTrack => "item.audioItem.musicTrack",
            ObjectClass::VideoItem => "item.videoItem",
            ObjectClass::Photo => "item.imageItem.photo",
        }
    }

    pub fn is_container(self) -> bool {
        self.as_str().starts_with("container.")
    }

    pub fn media_kind(self) -> Option<MediaKind> {
        match self {
            ObjectClass::MusicTrack => Some(MediaKind::Audio),
            ObjectClass::VideoItem => Some(MediaKind::Video),
            ObjectClass::Photo => Some(MediaKind::Image),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Audio,
    Video,
    Image,
}

impl MediaKind {
    fn bit(self) -> u8 {
        match self {
            MediaKind::Audio => 1,
            MediaKind::Video => 1 << 1,
            MediaKind::Image => 1 << 2,
        }
    }
}

/// Set of media kinds a media root is scanned for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaTypes(u8);

impl MediaTypes {
    pub const AUDIO: MediaTypes = MediaTypes(1);
    pub const VIDEO: MediaTypes = MediaTypes(1 << 1);
    pub const IMAGES: MediaTypes = MediaTypes(1 << 2);
    pub const ALL: MediaTypes = MediaTypes(0b111);

    pub fn empty() -> Self {
        MediaTypes(0)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, kind: MediaKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn with(self, kind: MediaKind) -> Self {
        MediaTypes(self.0 | kind.bit())
    }

    /// Parses `A`, `V` and `P` flags in any order and case. An empty string
    /// means every kind.
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Some(MediaTypes::ALL);
        }
        let mut types = MediaTypes::empty();
        for ch in trimmed.chars() {
            let kind = match ch.to_ascii_uppercase() {
                'A' => MediaKind::Audio,
                'V' => MediaKind::Video,
                'P' => MediaKind::Image,
                _ => return None,
            };
            types = types.with(kind);
        }
        Some(types)
    }
}

impl fmt::Display for MediaTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (kind, flag) in [
            (MediaKind::Audio, 'A'),
            (MediaKind::Video, 'V'),
            (MediaKind::Image, 'P'),
        ] {
            if self.contains(kind) {
                write!(f, "{}", flag)?;
            }
        }
        Ok(())
    }
}

/// Hand-assigned keys of the top-level containers. Downstream browsing
/// relies on these exact values.
pub mod roots {
    pub const NONE: &str = "-1";
    pub const ROOT: &str = "0";
    pub const MUSIC: &str = "1";
    pub const MUSIC_ALL: &str = "1$4";
    pub const MUSIC_GENRE: &str = "1$5";
    pub const MUSIC_ARTIST: &str = "1$6";
    pub const MUSIC_ALBUM: &str = "1$7";
    pub const MUSIC_DIR: &str = "1$14";
    pub const MUSIC_PLAYLISTS: &str = "1$F";
    pub const VIDEO: &str = "2";
    pub const VIDEO_ALL: &str = "2$8";
    pub const VIDEO_DIR: &str = "2$15";
    pub const IMAGE: &str = "3";
    pub const IMAGE_ALL: &str = "3$B";
    pub const IMAGE_DATE: &str = "3$C";
    pub const IMAGE_CAMERA: &str = "3$D2";
    pub const IMAGE_DIR: &str = "3$16";
    pub const BROWSE_DIR: &str = "64";

    /// (key, parent, display name) in creation order.
    pub const WELL_KNOWN: &[(&str, &str, &str)] = &[
        (ROOT, NONE, "root"),
        (MUSIC, ROOT, "Music"),
        (MUSIC_ALL, MUSIC, "All Music"),
        (MUSIC_GENRE, MUSIC, "Genre"),
        (MUSIC_ARTIST, MUSIC, "Artist"),
        (MUSIC_ALBUM, MUSIC, "Album"),
        (MUSIC_DIR, MUSIC, "Folders"),
        (MUSIC_PLAYLISTS, MUSIC, "Playlists"),
        (VIDEO, ROOT, "Video"),
        (VIDEO_ALL, VIDEO, "All Video"),
        (VIDEO_DIR, VIDEO, "Folders"),
        (IMAGE, ROOT, "Pictures"),
        (IMAGE_ALL, IMAGE, "All Pictures"),
        (IMAGE_DATE, IMAGE, "Date Taken"),
        (IMAGE_CAMERA, IMAGE, "Camera"),
        (IMAGE_DIR, IMAGE, "Folders"),
        (BROWSE_DIR, ROOT, "Browse Folders"),
    ];
}

pub fn path_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

pub fn file_name_string(path: &Path) -> Option<String> {
    path.file_name().map(|s| s.to_string_lossy().to_string())
}
