use std::fs;
use std::path::{Path, PathBuf};

use common::{
    file_name_string, path_string, roots, CatalogObject, DetailId, MediaKind, MediaTypes,
    ObjectClass, ObjectId,
};
use metadata::{is_album_art, is_audio, is_caption_for, is_image, is_playlist, is_video};
use tracing::{debug, warn};

use crate::fanout::{fan_out, place_alias, ItemRef};
use crate::mirror::ensure_mirror;
use crate::session::Scan;
use crate::LibraryError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A catalog item was created; holds the key of its primary row.
    Item(ObjectId),
    /// The playlist importer consumed the file.
    Playlist,
    Skipped(SkipReason),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    AlbumArt,
    Unresolved,
    Unsupported,
}

/// Registers one file found in the browse folder `parent`.
///
/// Classification runs image, video, playlist, then audio; the first Detail
/// that resolves wins. The primary row takes the next counter under
/// `parent`, the type-scoped folder view gets an alias under the same
/// counter, and the item is fanned out into the taxonomy views. Videos also
/// pick up caption sidecars from their directory.
pub fn insert_file(
    scan: &mut Scan<'_>,
    name: &str,
    path: &Path,
    parent: &ObjectId,
    types: MediaTypes,
) -> Result<InsertOutcome, LibraryError> {
    let resolver = scan.resolver();
    let mut classified = None;
    let mut detail = None;

    if types.contains(MediaKind::Image) && is_image(name) {
        if is_album_art(name) {
            return Ok(InsertOutcome::Skipped(SkipReason::AlbumArt));
        }
        classified = Some((ObjectClass::Photo, roots::IMAGE_DIR));
        detail = resolver.resolve_image(path, name);
    } else if types.contains(MediaKind::Video) && is_video(name) {
        classified = Some((ObjectClass::VideoItem, roots::VIDEO_DIR));
        detail = resolver.resolve_video(path, name);
    } else if is_playlist(name) && scan.hooks.playlists.try_import(scan.store, path, name)? {
        return Ok(InsertOutcome::Playlist);
    }
    if detail.is_none() && types.contains(MediaKind::Audio) && is_audio(name) {
        classified = Some((ObjectClass::MusicTrack, roots::MUSIC_DIR));
        detail = resolver.resolve_audio(path, name);
    }

    let (class, scope) = match classified {
        Some(classified) => classified,
        None => return Ok(InsertOutcome::Skipped(SkipReason::Unsupported)),
    };
    let detail = match detail {
        Some(detail) => detail,
        None => {
            warn!("Unsuccessful getting details for {:?}", path);
            return Ok(InsertOutcome::Skipped(SkipReason::Unresolved));
        }
    };

    let detail_id = scan.store.insert_detail(detail)?;
    let counter = scan.store.next_child_counter(parent)?;
    let primary = parent.child(counter);
    scan.store.insert_object(&CatalogObject {
        object_id: primary.clone(),
        parent_id: parent.clone(),
        ref_id: None,
        detail_id: Some(detail_id),
        class,
        name: name.to_string(),
    })?;

    let browse = ObjectId::root(roots::BROWSE_DIR);
    let scope_root = ObjectId::root(scope);
    if parent != &browse {
        ensure_mirror(scan, &scope_root, parent)?;
    }
    let item = ItemRef {
        name,
        ref_id: &primary,
        class,
        detail_id,
    };
    let mirrored = parent.rebase(&browse, &scope_root)?.child(counter);
    place_alias(scan.store, mirrored, &item)?;

    fan_out(scan, &item)?;

    if class == ObjectClass::VideoItem {
        link_captions(scan, path, detail_id)?;
    }
    Ok(InsertOutcome::Item(primary))
}

/// Creates the browse-tree folder `object_id` for the real directory `path`.
pub fn insert_directory(
    scan: &mut Scan<'_>,
    name: &str,
    path: &Path,
    parent: &ObjectId,
    object_id: &ObjectId,
) -> Result<DetailId, LibraryError> {
    let detail = scan
        .resolver()
        .resolve_folder(name, Some(path), None, None, None);
    let detail_id = scan.store.insert_detail(detail)?;
    scan.store.insert_object(&CatalogObject {
        object_id: object_id.clone(),
        parent_id: parent.clone(),
        ref_id: None,
        detail_id: Some(detail_id),
        class: ObjectClass::StorageFolder,
        name: name.to_string(),
    })?;
    Ok(detail_id)
}

fn link_captions(scan: &Scan<'_>, video: &Path, detail_id: DetailId) -> Result<(), LibraryError> {
    let (dir, video_name) = match (video.parent(), file_name_string(video)) {
        (Some(dir), Some(name)) => (dir, name),
        _ => return Ok(()),
    };
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("Failed to list {:?} for captions: {}", dir, err);
            return Ok(());
        }
    };
    let mut sidecars: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|candidate| {
            file_name_string(candidate)
                .map(|name| is_caption_for(&video_name, &name))
                .unwrap_or(false)
        })
        .filter(|candidate| fs::File::open(candidate).is_ok())
        .collect();
    sidecars.sort();
    for sidecar in sidecars {
        debug!("Linking caption {:?} to {:?}", sidecar, path_string(video));
        scan.hooks.captions.link(scan.store, detail_id, &sidecar)?;
    }
    Ok(())
}
