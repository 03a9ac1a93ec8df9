use common::{roots, CatalogObject, Detail, DetailId, MediaKind, ObjectClass, ObjectId};

use crate::registry::{find_or_create, ContainerSpec};
use crate::session::Scan;
use crate::store::Store;
use crate::LibraryError;

pub const UNKNOWN_DATE: &str = "Unknown Date";
pub const UNKNOWN_CAMERA: &str = "Unknown Camera";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const ALL_ALBUMS: &str = "- All Albums -";
pub const ALL_ARTISTS: &str = "- All Artists -";

/// The primary item every alias points back to.
#[derive(Clone, Copy, Debug)]
pub struct ItemRef<'a> {
    pub name: &'a str,
    pub ref_id: &'a ObjectId,
    pub class: ObjectClass,
    pub detail_id: DetailId,
}

/// Writes an alias row of `item` at `object_id`.
pub fn place_alias(store: &Store, object_id: ObjectId, item: &ItemRef<'_>) -> Result<(), LibraryError> {
    let parent_id = object_id.parent()?;
    store.insert_object(&CatalogObject {
        object_id,
        parent_id,
        ref_id: Some(item.ref_id.clone()),
        detail_id: Some(item.detail_id),
        class: item.class,
        name: item.name.to_string(),
    })
}

/// Projects a freshly inserted primary item into every taxonomy view of its
/// media kind.
pub fn fan_out(scan: &mut Scan<'_>, item: &ItemRef<'_>) -> Result<(), LibraryError> {
    let kind = match item.class.media_kind() {
        Some(kind) => kind,
        None => return Ok(()),
    };
    let detail = match scan.store.get_detail(item.detail_id)? {
        Some(detail) => detail,
        None => return Ok(()),
    };
    match kind {
        MediaKind::Image => fan_out_image(scan, item, &detail),
        MediaKind::Audio => fan_out_audio(scan, item, &detail),
        MediaKind::Video => append_flat(scan.store, roots::VIDEO_ALL, item),
    }
}

fn fan_out_image(scan: &mut Scan<'_>, item: &ItemRef<'_>, detail: &Detail) -> Result<(), LibraryError> {
    let store = scan.store;
    let resolver = scan.resolver();
    let session = &mut scan.session;
    let date = detail
        .date
        .as_deref()
        .map(day_of)
        .unwrap_or(UNKNOWN_DATE)
        .to_string();
    let camera = detail
        .creator
        .clone()
        .unwrap_or_else(|| UNKNOWN_CAMERA.to_string());

    let date_root = ObjectId::root(roots::IMAGE_DATE);
    let key = session.date.place(date.clone(), || {
        find_or_create(
            store,
            resolver,
            &ContainerSpec::new(&date, &date_root, ObjectClass::PhotoAlbum),
        )
    })?;
    place_alias(store, key, item)?;

    let camera_root = ObjectId::root(roots::IMAGE_CAMERA);
    let (camera_container, changed) = session.camera.container_for(camera.clone(), || {
        find_or_create(
            store,
            resolver,
            &ContainerSpec::new(&camera, &camera_root, ObjectClass::StorageFolder),
        )
    })?;
    if changed {
        session.camera_date.invalidate();
    }
    let key = session.camera_date.place(date.clone(), || {
        find_or_create(
            store,
            resolver,
            &ContainerSpec::new(&date, &camera_container, ObjectClass::PhotoAlbum),
        )
    })?;
    place_alias(store, key, item)?;

    append_flat(store, roots::IMAGE_ALL, item)
}

fn fan_out_audio(scan: &mut Scan<'_>, item: &ItemRef<'_>, detail: &Detail) -> Result<(), LibraryError> {
    let store = scan.store;
    let resolver = scan.resolver();
    let session = &mut scan.session;
    let album = detail.album.as_deref();
    let artist = detail.artist.as_deref();
    let genre = detail.genre.as_deref();
    let album_art = detail.album_art;

    if let Some(album) = album {
        let album_root = ObjectId::root(roots::MUSIC_ALBUM);
        let key = session
            .album
            .place((album.to_string(), artist.map(str::to_string)), || {
                find_or_create(
                    store,
                    resolver,
                    &ContainerSpec::new(album, &album_root, ObjectClass::MusicAlbum)
                        .facets(artist, genre)
                        .album_art(album_art),
                )
            })?;
        place_alias(store, key, item)?;
    }

    if let Some(artist) = artist {
        let artist_root = ObjectId::root(roots::MUSIC_ARTIST);
        let (artist_container, changed) = session.artist.container_for(artist.to_string(), || {
            find_or_create(
                store,
                resolver,
                &ContainerSpec::new(artist, &artist_root, ObjectClass::MusicArtist)
                    .facets(None, genre),
            )
        })?;
        if changed {
            session.artist_all.invalidate();
            session.artist_album.invalidate();
        }
        let all_key = session.artist_all.place((), || {
            find_or_create(
                store,
                resolver,
                &ContainerSpec::new(ALL_ALBUMS, &artist_container, ObjectClass::Album)
                    .facets(Some(artist), genre),
            )
        })?;

        let album_label = album.unwrap_or(UNKNOWN_ALBUM);
        let album_ref = album.and(session.album.container().cloned());
        let key = session.artist_album.place(album_label.to_string(), || {
            find_or_create(
                store,
                resolver,
                &ContainerSpec::new(album_label, &artist_container, ObjectClass::MusicAlbum)
                    .reference(album_ref.as_ref())
                    .facets(Some(artist), genre)
                    .album_art(album_art),
            )
        })?;
        place_alias(store, key, item)?;
        place_alias(store, all_key, item)?;
    }

    if let Some(genre) = genre {
        let genre_root = ObjectId::root(roots::MUSIC_GENRE);
        let (genre_container, changed) = session.genre.container_for(genre.to_string(), || {
            find_or_create(
                store,
                resolver,
                &ContainerSpec::new(genre, &genre_root, ObjectClass::MusicGenre),
            )
        })?;
        if changed {
            session.genre_all.invalidate();
            session.genre_artist.invalidate();
        }
        let all_key = session.genre_all.place((), || {
            find_or_create(
                store,
                resolver,
                &ContainerSpec::new(ALL_ARTISTS, &genre_container, ObjectClass::Person)
                    .facets(None, Some(genre)),
            )
        })?;

        let artist_label = artist.unwrap_or(UNKNOWN_ARTIST);
        let artist_ref = artist.and(session.artist.container().cloned());
        let key = session.genre_artist.place(artist_label.to_string(), || {
            find_or_create(
                store,
                resolver,
                &ContainerSpec::new(artist_label, &genre_container, ObjectClass::MusicArtist)
                    .reference(artist_ref.as_ref())
                    .facets(None, Some(genre)),
            )
        })?;
        place_alias(store, key, item)?;
        place_alias(store, all_key, item)?;
    }

    append_flat(store, roots::MUSIC_ALL, item)
}

/// Flat "all" lists never reuse a position: every item takes a fresh counter.
fn append_flat(store: &Store, root: &str, item: &ItemRef<'_>) -> Result<(), LibraryError> {
    let root = ObjectId::root(root);
    let key = root.child(store.next_child_counter(&root)?);
    place_alias(store, key, item)
}

/// `2021-04-09T07:05:03` becomes `2021-04-09`.
fn day_of(date: &str) -> &str {
    date.get(..10).unwrap_or(date)
}
