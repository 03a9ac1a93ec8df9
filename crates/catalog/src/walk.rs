use std::fs;
use std::path::{Path, PathBuf};

use common::{MediaKind, MediaTypes, ObjectId};
use metadata::{is_audio, is_image, is_playlist, is_video};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::insert::{insert_directory, insert_file, InsertOutcome};
use crate::session::Scan;

enum EntryKind {
    Dir,
    File,
    Other,
}

/// Depth-first walk of `dir`, whose browse-tree folder is `parent`. Entries
/// are visited in file-name order; per-entry failures are logged and counted
/// and never stop the walk. The cancel flag is honoured between entries.
/// Symlinks are followed unless they lead back into a directory that is
/// still being walked.
pub fn scan_directory(scan: &mut Scan<'_>, dir: &Path, parent: &ObjectId, types: MediaTypes) {
    if types.is_empty() {
        warn!("No media types to scan in {:?}", dir);
        return;
    }
    let mut walking = vec![canonical(dir)];
    walk_dir(scan, dir, parent, types, &mut walking);
}

/// `walking` holds the canonical paths of `dir` and every directory above it
/// in the current descent.
fn walk_dir(
    scan: &mut Scan<'_>,
    dir: &Path,
    parent: &ObjectId,
    types: MediaTypes,
    walking: &mut Vec<PathBuf>,
) {
    let entries = match list_entries(dir, types) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("Error scanning {:?}: {}", dir, err);
            scan.stats.errors += 1;
            return;
        }
    };

    for entry in entries {
        if scan.is_canceled() {
            scan.stats.canceled = true;
            return;
        }
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        match entry_kind(&entry) {
            EntryKind::Dir => {
                let target = canonical(path);
                if walking.contains(&target) {
                    warn!("Skipping recursive link {:?} to {:?}", path, target);
                    scan.stats.skipped += 1;
                    continue;
                }
                if let Err(err) = fs::read_dir(path) {
                    warn!("Skipping unreadable directory {:?}: {}", path, err);
                    scan.stats.skipped += 1;
                    continue;
                }
                let child = match scan.store.next_child_counter(parent) {
                    Ok(counter) => parent.child(counter),
                    Err(err) => {
                        warn!("Failed to allocate folder for {:?}: {}", path, err);
                        scan.stats.errors += 1;
                        continue;
                    }
                };
                if let Err(err) = insert_directory(scan, &name, path, parent, &child) {
                    warn!("Failed to insert directory {:?}: {}", path, err);
                    scan.stats.errors += 1;
                    continue;
                }
                scan.stats.directories += 1;
                walking.push(target);
                walk_dir(scan, path, &child, types, walking);
                walking.pop();
            }
            EntryKind::File => {
                if let Err(err) = fs::File::open(path) {
                    warn!("Skipping unreadable file {:?}: {}", path, err);
                    scan.stats.skipped += 1;
                    continue;
                }
                match insert_file(scan, &name, path, parent, types) {
                    Ok(InsertOutcome::Item(id)) => {
                        debug!("Inserted {:?} as {}", path, id);
                        scan.stats.files += 1;
                    }
                    Ok(InsertOutcome::Playlist) => {}
                    Ok(InsertOutcome::Skipped(reason)) => {
                        debug!("Skipped {:?}: {:?}", path, reason);
                        scan.stats.skipped += 1;
                    }
                    Err(err) => {
                        warn!("Failed to insert {:?}: {}", path, err);
                        scan.stats.errors += 1;
                    }
                }
            }
            EntryKind::Other => {
                debug!("Ignoring {:?}", path);
            }
        }
    }
}

/// One level of `dir`, hidden entries dropped, filtered by `types` and
/// sorted by file name. A failure to read `dir` itself is an error; broken
/// entries are logged and left out.
fn list_entries(dir: &Path, types: MediaTypes) -> Result<Vec<DirEntry>, walkdir::Error> {
    let mut out = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(false)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => return Err(err),
            Err(err) => {
                warn!("Skipping entry in {:?}: {}", dir, err);
                continue;
            }
        };
        if is_hidden(&entry) || !accepts(&entry, types) {
            continue;
        }
        out.push(entry);
    }
    Ok(out)
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Directories, symlinks and other non-regular entries always pass and get
/// a closer look later. Regular files pass when their name matches an
/// allowed kind; playlists ride along with audio.
fn accepts(entry: &DirEntry, types: MediaTypes) -> bool {
    if !entry.file_type().is_file() {
        return true;
    }
    let name = entry.file_name().to_string_lossy();
    (types.contains(MediaKind::Audio) && (is_audio(&name) || is_playlist(&name)))
        || (types.contains(MediaKind::Video) && is_video(&name))
        || (types.contains(MediaKind::Image) && is_image(&name))
}

/// Symlinks and other ambiguous entries are probed by following them.
fn entry_kind(entry: &DirEntry) -> EntryKind {
    let file_type = entry.file_type();
    if file_type.is_dir() {
        return EntryKind::Dir;
    }
    if file_type.is_file() {
        return EntryKind::File;
    }
    match fs::metadata(entry.path()) {
        Ok(meta) if meta.is_dir() => EntryKind::Dir,
        Ok(meta) if meta.is_file() => EntryKind::File,
        Ok(_) => EntryKind::Other,
        Err(err) => {
            warn!("Failed to resolve {:?}: {}", entry.path(), err);
            EntryKind::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use common::{roots, Detail};
    use metadata::MetadataResolver;

    use crate::hooks::Collaborators;
    #[cfg(unix)]
    use crate::session::ScanStats;
    use crate::store::Store;
    use crate::testing::{seeded_store, track, FakeResolver};

    fn names(store: &Store, parent: &str) -> Vec<String> {
        store
            .children(&ObjectId::root(parent))
            .unwrap()
            .into_iter()
            .map(|object| object.name)
            .collect()
    }

    fn touch(dir: &Path, name: &str) {
        if let Some(parent) = dir.join(name).parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(dir.join(name), b"x").unwrap();
    }

    fn resolver() -> FakeResolver {
        FakeResolver::default()
            .with("a.mp3", track(Some("A"), Some("Ann"), None))
            .with("b.mp3", track(Some("A"), Some("Ann"), None))
            .with("c.mp3", track(None, None, None))
            .with("link.mp3", track(None, None, None))
            .with(".hidden.mp3", track(None, None, None))
            .with("clip.mkv", Detail::default())
            .with("pic.jpg", Detail::default())
    }

    #[test]
    fn walks_in_name_order_and_skips_hidden_entries() {
        let media = tempfile::tempdir().unwrap();
        for name in ["b.mp3", "a.mp3", ".hidden.mp3", "notes.txt", "sub/c.mp3", ".git/d.mp3"] {
            touch(media.path(), name);
        }
        let (_dir, store) = seeded_store();
        let hooks = Collaborators::with_resolver(Arc::new(resolver()));
        let cancel = AtomicBool::new(false);
        let mut scan = Scan::new(&store, &hooks, &cancel);
        let browse = ObjectId::root(roots::BROWSE_DIR);

        scan_directory(&mut scan, media.path(), &browse, MediaTypes::AUDIO);

        assert_eq!(names(&store, roots::BROWSE_DIR), vec!["a.mp3", "b.mp3", "sub"]);
        assert_eq!(names(&store, "64$2"), vec!["c.mp3"]);
        assert_eq!(names(&store, roots::MUSIC_DIR), vec!["a.mp3", "b.mp3", "sub"]);
        assert_eq!(names(&store, "1$14$2"), vec!["c.mp3"]);
        assert_eq!(scan.stats.files, 3);
        assert_eq!(scan.stats.directories, 1);
        assert_eq!(scan.stats.skipped, 0);
        assert!(!scan.stats.canceled);
        assert!(store.dangling_parents().unwrap().is_empty());
    }

    #[test]
    fn media_types_filter_entries() {
        let media = tempfile::tempdir().unwrap();
        for name in ["a.mp3", "clip.mkv", "pic.jpg", "mix.m3u"] {
            touch(media.path(), name);
        }
        let (_dir, store) = seeded_store();
        let hooks = Collaborators::with_resolver(Arc::new(resolver()));
        let cancel = AtomicBool::new(false);
        let mut scan = Scan::new(&store, &hooks, &cancel);
        let browse = ObjectId::root(roots::BROWSE_DIR);

        scan_directory(&mut scan, media.path(), &browse, MediaTypes::parse("VP").unwrap());

        assert_eq!(names(&store, roots::BROWSE_DIR), vec!["clip.mkv", "pic.jpg"]);
        assert_eq!(names(&store, roots::VIDEO_DIR), vec!["clip.mkv"]);
        assert_eq!(names(&store, roots::IMAGE_DIR), vec!["pic.jpg"]);
        assert!(store.playlists().unwrap().is_empty());
        assert_eq!(scan.stats.files, 2);
    }

    #[test]
    fn precanceled_walk_inserts_nothing() {
        let media = tempfile::tempdir().unwrap();
        touch(media.path(), "a.mp3");
        let (_dir, store) = seeded_store();
        let hooks = Collaborators::with_resolver(Arc::new(resolver()));
        let cancel = AtomicBool::new(true);
        let mut scan = Scan::new(&store, &hooks, &cancel);
        let before = store.object_count().unwrap();

        scan_directory(&mut scan, media.path(), &ObjectId::root(roots::BROWSE_DIR), MediaTypes::ALL);

        assert!(scan.stats.canceled);
        assert_eq!(store.object_count().unwrap(), before);
    }

    /// Raises the cancel flag once a given file has been resolved.
    struct CancelAfter {
        inner: FakeResolver,
        trigger: &'static str,
        cancel: Arc<AtomicBool>,
    }

    impl MetadataResolver for CancelAfter {
        fn resolve_folder(
            &self,
            name: &str,
            path: Option<&Path>,
            artist: Option<&str>,
            genre: Option<&str>,
            album_art: Option<u64>,
        ) -> Detail {
            self.inner.resolve_folder(name, path, artist, genre, album_art)
        }

        fn resolve_image(&self, path: &Path, name: &str) -> Option<Detail> {
            self.inner.resolve_image(path, name)
        }

        fn resolve_audio(&self, path: &Path, name: &str) -> Option<Detail> {
            if name == self.trigger {
                self.cancel.store(true, Ordering::Relaxed);
            }
            self.inner.resolve_audio(path, name)
        }

        fn resolve_video(&self, path: &Path, name: &str) -> Option<Detail> {
            self.inner.resolve_video(path, name)
        }
    }

    #[test]
    fn cancel_stops_between_entries() {
        let media = tempfile::tempdir().unwrap();
        for name in ["a.mp3", "b.mp3", "sub/c.mp3"] {
            touch(media.path(), name);
        }
        let (_dir, store) = seeded_store();
        let cancel = Arc::new(AtomicBool::new(false));
        let hooks = Collaborators::with_resolver(Arc::new(CancelAfter {
            inner: resolver(),
            trigger: "a.mp3",
            cancel: cancel.clone(),
        }));
        let mut scan = Scan::new(&store, &hooks, &cancel);

        scan_directory(&mut scan, media.path(), &ObjectId::root(roots::BROWSE_DIR), MediaTypes::ALL);

        assert!(scan.stats.canceled);
        assert_eq!(scan.stats.files, 1);
        assert_eq!(names(&store, roots::BROWSE_DIR), vec!["a.mp3"]);
        assert_eq!(names(&store, roots::MUSIC_ALL), vec!["a.mp3"]);
        assert!(store.dangling_parents().unwrap().is_empty());
    }

    #[test]
    fn missing_directory_is_logged_not_fatal() {
        let media = tempfile::tempdir().unwrap();
        let (_dir, store) = seeded_store();
        let hooks = Collaborators::with_resolver(Arc::new(resolver()));
        let cancel = AtomicBool::new(false);
        let mut scan = Scan::new(&store, &hooks, &cancel);

        let missing = media.path().join("gone");
        scan_directory(&mut scan, &missing, &ObjectId::root(roots::BROWSE_DIR), MediaTypes::ALL);
        assert_eq!(scan.stats.errors, 1);
        assert_eq!(scan.stats.files, 0);
    }

    #[cfg(unix)]
    fn walk_audio(store: &Store, media: &Path) -> ScanStats {
        let hooks = Collaborators::with_resolver(Arc::new(resolver()));
        let cancel = AtomicBool::new(false);
        let mut scan = Scan::new(store, &hooks, &cancel);
        scan_directory(&mut scan, media, &ObjectId::root(roots::BROWSE_DIR), MediaTypes::AUDIO);
        scan.stats
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_file_is_cataloged() {
        use std::os::unix::fs::symlink;

        let media = tempfile::tempdir().unwrap();
        let elsewhere = tempfile::tempdir().unwrap();
        touch(elsewhere.path(), "a.mp3");
        symlink(elsewhere.path().join("a.mp3"), media.path().join("link.mp3")).unwrap();
        let (_dir, store) = seeded_store();

        let stats = walk_audio(&store, media.path());

        assert_eq!(stats.files, 1);
        assert_eq!(names(&store, roots::BROWSE_DIR), vec!["link.mp3"]);
        assert_eq!(names(&store, roots::MUSIC_ALL), vec!["link.mp3"]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directory_is_walked() {
        use std::os::unix::fs::symlink;

        let media = tempfile::tempdir().unwrap();
        let elsewhere = tempfile::tempdir().unwrap();
        touch(elsewhere.path(), "c.mp3");
        symlink(elsewhere.path(), media.path().join("album")).unwrap();
        let (_dir, store) = seeded_store();

        let stats = walk_audio(&store, media.path());

        assert_eq!(stats.directories, 1);
        assert_eq!(stats.files, 1);
        assert_eq!(names(&store, roots::BROWSE_DIR), vec!["album"]);
        assert_eq!(names(&store, "64$0"), vec!["c.mp3"]);
        assert_eq!(names(&store, "1$14$0"), vec!["c.mp3"]);
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_passed_over() {
        use std::os::unix::fs::symlink;

        let media = tempfile::tempdir().unwrap();
        touch(media.path(), "a.mp3");
        touch(media.path(), "b.mp3");
        symlink(media.path().join("gone.mp3"), media.path().join("broken.mp3")).unwrap();
        let (_dir, store) = seeded_store();

        let stats = walk_audio(&store, media.path());

        assert_eq!(stats.files, 2);
        assert_eq!(stats.errors, 0);
        assert_eq!(names(&store, roots::BROWSE_DIR), vec!["a.mp3", "b.mp3"]);
    }

    #[cfg(unix)]
    #[test]
    fn links_back_into_the_walk_are_skipped() {
        use std::os::unix::fs::symlink;

        let media = tempfile::tempdir().unwrap();
        touch(media.path(), "a.mp3");
        touch(media.path(), "sub/b.mp3");
        symlink(media.path(), media.path().join("loop")).unwrap();
        symlink(media.path(), media.path().join("sub/up")).unwrap();
        let (_dir, store) = seeded_store();

        let stats = walk_audio(&store, media.path());

        assert_eq!(stats.files, 2);
        assert_eq!(stats.directories, 1);
        assert_eq!(stats.skipped, 2);
        assert_eq!(names(&store, roots::BROWSE_DIR), vec!["a.mp3", "sub"]);
        assert_eq!(names(&store, "64$1"), vec!["b.mp3"]);
        assert_eq!(names(&store, roots::MUSIC_ALL), vec!["a.mp3", "b.mp3"]);
        assert!(store.dangling_parents().unwrap().is_empty());
    }
}
