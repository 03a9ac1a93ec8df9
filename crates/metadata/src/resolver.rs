use std::fs;
use std::path::Path;

use common::{path_string, Detail};
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::warn;

use crate::read_tags;

/// Produces the Detail record for a file or a virtual folder. Returning
/// `None` means the file could not be understood and should be skipped.
pub trait MetadataResolver: Send + Sync {
    fn resolve_folder(
        &self,
        name: &str,
        path: Option<&Path>,
        artist: Option<&str>,
        genre: Option<&str>,
        album_art: Option<u64>,
    ) -> Detail;

    fn resolve_image(&self, path: &Path, name: &str) -> Option<Detail>;

    fn resolve_audio(&self, path: &Path, name: &str) -> Option<Detail>;

    fn resolve_video(&self, path: &Path, name: &str) -> Option<Detail>;
}

/// Reads audio tags with lofty; images and videos get file-level details
/// with the modification time standing in for the capture date.
#[derive(Clone, Debug, Default)]
pub struct TagResolver;

impl MetadataResolver for TagResolver {
    fn resolve_folder(
        &self,
        name: &str,
        path: Option<&Path>,
        artist: Option<&str>,
        genre: Option<&str>,
        album_art: Option<u64>,
    ) -> Detail {
        Detail {
            title: Some(name.to_string()),
            path: path.map(path_string),
            artist: artist.map(str::to_string),
            genre: genre.map(str::to_string),
            album_art,
            ..Detail::default()
        }
    }

    fn resolve_image(&self, path: &Path, name: &str) -> Option<Detail> {
        file_detail(path, name)
    }

    fn resolve_audio(&self, path: &Path, name: &str) -> Option<Detail> {
        let mut detail = file_detail(path, name)?;
        let tag = match read_tags(path) {
            Ok(tag) => tag,
            Err(err) => {
                warn!("Failed to read tags for {:?}: {}", path, err);
                return None;
            }
        };
        if tag.title.is_some() {
            detail.title = tag.title;
        }
        detail.artist = tag.artist;
        detail.album = tag.album;
        detail.genre = tag.genres.into_iter().next();
        detail.date = tag.year.map(|year| format!("{:04}", year));
        detail.duration_ms = tag.duration_ms;
        detail.track_no = tag.track_no;
        detail.disc_no = tag.disc_no;
        Some(detail)
    }

    fn resolve_video(&self, path: &Path, name: &str) -> Option<Detail> {
        file_detail(path, name)
    }
}

fn file_detail(path: &Path, name: &str) -> Option<Detail> {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(err) => {
            warn!("Failed to stat {:?}: {}", path, err);
            return None;
        }
    };
    let title = Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| name.to_string());
    let date = meta
        .modified()
        .ok()
        .and_then(|modified| format_date(OffsetDateTime::from(modified)));
    let mime = mime_guess::from_path(path).first().map(|m| m.essence_str().to_string());
    Some(Detail {
        path: Some(path_string(path)),
        size: Some(meta.len()),
        title: Some(title),
        date,
        mime,
        ..Detail::default()
    })
}

fn format_date(value: OffsetDateTime) -> Option<String> {
    match value.format(format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second]"
    )) {
        Ok(formatted) => Some(formatted),
        Err(err) => {
            warn!("Failed to format date {}: {}", value, err);
            None
        }
    }
}
