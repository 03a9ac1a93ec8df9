use std::collections::HashMap;
use std::path::Path;

use common::{path_string, Detail};
use metadata::MetadataResolver;

use crate::store::Store;

/// Serves canned Details keyed by file name. Unknown files do not resolve.
#[derive(Clone, Debug, Default)]
pub struct FakeResolver {
    files: HashMap<String, Detail>,
}

impl FakeResolver {
    pub fn with(mut self, name: &str, detail: Detail) -> Self {
        self.files.insert(name.to_string(), detail);
        self
    }

    fn lookup(&self, path: &Path, name: &str) -> Option<Detail> {
        let mut detail = self.files.get(name)?.clone();
        detail.path = Some(path_string(path));
        if detail.title.is_none() {
            detail.title = Some(name.to_string());
        }
        Some(detail)
    }
}

impl MetadataResolver for FakeResolver {
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
        self.lookup(path, name)
    }

    fn resolve_audio(&self, path: &Path, name: &str) -> Option<Detail> {
        self.lookup(path, name)
    }

    fn resolve_video(&self, path: &Path, name: &str) -> Option<Detail> {
        self.lookup(path, name)
    }
}

pub fn track(album: Option<&str>, artist: Option<&str>, genre: Option<&str>) -> Detail {
    Detail {
        album: album.map(str::to_string),
        artist: artist.map(str::to_string),
        genre: genre.map(str::to_string),
        ..Detail::default()
    }
}

pub fn open_store() -> (tempfile::TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(&dir.path().join("catalog.redb")).unwrap();
    store.init_tables().unwrap();
    (dir, store)
}

pub fn seeded_store() -> (tempfile::TempDir, Store) {
    let (dir, store) = open_store();
    crate::bootstrap::create_schema_and_seed(&store, &FakeResolver::default()).unwrap();
    (dir, store)
}
