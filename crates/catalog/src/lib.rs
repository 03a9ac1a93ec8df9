use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use common::{file_name_string, path_string, roots, KeyError, MediaTypes, ObjectId};
use redb::{CommitError, DatabaseError, StorageError, TableError, TransactionError};
use tracing::{info, warn};

mod bootstrap;
mod fanout;
mod hooks;
mod insert;
mod mirror;
mod registry;
mod session;
mod store;
mod walk;

#[cfg(test)]
mod testing;

pub use bootstrap::{create_schema_and_seed, UPDATE_ID_SETTING};
pub use fanout::{ALL_ALBUMS, ALL_ARTISTS, UNKNOWN_ALBUM, UNKNOWN_ARTIST, UNKNOWN_CAMERA, UNKNOWN_DATE};
pub use hooks::{CaptionLinker, CaptionRecorder, Collaborators, PlaylistImporter, PlaylistRecorder};
pub use insert::{InsertOutcome, SkipReason};
pub use registry::{find_or_create, AxisSlot, ContainerHit, ContainerSpec};
pub use session::{ScanSession, ScanStats};
pub use store::{PlaylistEntry, Store};

/// Bumped whenever the table layout or key scheme changes; an older catalog
/// is rebuilt from scratch.
pub const CATALOG_VERSION: u32 = 1;

/// A directory to catalog and the media kinds to pick up in it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaRoot {
    pub path: PathBuf,
    pub types: MediaTypes,
}

#[derive(Clone)]
pub struct Catalog {
    store: Store,
    hooks: Collaborators,
}

impl Catalog {
    pub fn open(db_path: &Path) -> Result<Self, LibraryError> {
        Ok(Self::with_collaborators(Store::open(db_path)?, Collaborators::default()))
    }

    pub fn with_collaborators(store: Store, hooks: Collaborators) -> Self {
        Self { store, hooks }
    }

    /// Opens a catalog that must already be built at the current version.
    pub fn open_existing(db_path: &Path) -> Result<Self, LibraryError> {
        let catalog = Self::open(db_path)?;
        match catalog.store.read_version()? {
            Some(version) if version == CATALOG_VERSION => Ok(catalog),
            Some(version) => Err(LibraryError::VersionMismatch(version)),
            None => Err(LibraryError::VersionMismatch(0)),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Builds the catalog unless a complete one at the current version is
    /// already there. Returns the stats of the build, if one ran.
    pub fn load_or_build(
        &self,
        media_roots: &[MediaRoot],
        merge_roots: bool,
        cancel: &AtomicBool,
    ) -> Result<Option<ScanStats>, LibraryError> {
        match self.store.read_version()? {
            Some(version) if version == CATALOG_VERSION => {
                info!("Loaded catalog at version {}", version);
                Ok(None)
            }
            Some(version) => {
                warn!("Catalog version mismatch ({}); rebuilding", version);
                self.build(media_roots, merge_roots, cancel).map(Some)
            }
            None => {
                warn!("Catalog missing; building");
                self.build(media_roots, merge_roots, cancel).map(Some)
            }
        }
    }

    /// Full rebuild: clears every table, seeds the well-known containers and
    /// walks each media root in order. A canceled build keeps what it wrote
    /// but records no version, so the next open builds again.
    pub fn build(
        &self,
        media_roots: &[MediaRoot],
        merge_roots: bool,
        cancel: &AtomicBool,
    ) -> Result<ScanStats, LibraryError> {
        self.store.reset()?;
        create_schema_and_seed(&self.store, self.hooks.resolver.as_ref())?;

        let mut scan = session::Scan::new(&self.store, &self.hooks, cancel);
        let browse = ObjectId::root(roots::BROWSE_DIR);
        let own_level = !merge_roots && media_roots.len() > 1;
        for root in media_roots {
            if scan.is_canceled() {
                scan.stats.canceled = true;
                break;
            }
            let name = file_name_string(&root.path).unwrap_or_else(|| path_string(&root.path));
            let (parent, detail_id) = if own_level {
                let level = browse.child(self.store.next_child_counter(&browse)?);
                let detail_id = insert::insert_directory(&mut scan, &name, &root.path, &browse, &level)?;
                (level, detail_id)
            } else {
                let detail = scan
                    .resolver()
                    .resolve_folder(&name, Some(&root.path), None, None, None);
                (browse.clone(), self.store.insert_detail(detail)?)
            };
            self.store
                .set_detail_timestamp(detail_id, i64::from(root.types.bits()))?;

            info!("Scanning {:?}", root.path);
            walk::scan_directory(&mut scan, &root.path, &parent, root.types);
            info!("Scanning {:?} finished ({} files)", root.path, scan.stats.files);
            self.store.add_media_dir(&path_string(&root.path))?;
        }

        let indexed = self.store.create_search_index()?;
        info!("Indexed {} objects for search", indexed);
        if !scan.stats.canceled {
            self.store.write_version(CATALOG_VERSION)?;
        }
        self.store.flush()?;
        Ok(scan.stats)
    }
}

#[derive(Debug)]
pub enum LibraryError {
    Io(std::io::Error),
    Redb(redb::Error),
    Bincode(Box<bincode::ErrorKind>),
    MalformedKey(KeyError),
    KeyParse(String),
    DuplicateObject(String),
    MissingObject(String),
    Bootstrap(Box<LibraryError>),
    VersionMismatch(u32),
}

impl std::fmt::Display for LibraryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LibraryError::Io(err) => write!(f, "io error: {}", err),
            LibraryError::Redb(err) => write!(f, "db error: {}", err),
            LibraryError::Bincode(err) => write!(f, "bincode error: {}", err),
            LibraryError::MalformedKey(err) => write!(f, "malformed key: {}", err),
            LibraryError::KeyParse(value) => write!(f, "key parse error: {}", value),
            LibraryError::DuplicateObject(id) => write!(f, "object already exists: {}", id),
            LibraryError::MissingObject(id) => write!(f, "object not found: {}", id),
            LibraryError::Bootstrap(err) => write!(f, "catalog bootstrap failed: {}", err),
            LibraryError::VersionMismatch(version) => {
                write!(f, "catalog version mismatch: {}", version)
            }
        }
    }
}

impl std::error::Error for LibraryError {}

impl From<std::io::Error> for LibraryError {
    fn from(err: std::io::Error) -> Self {
        LibraryError::Io(err)
    }
}

impl From<KeyError> for LibraryError {
    fn from(err: KeyError) -> Self {
        LibraryError::MalformedKey(err)
    }
}

impl From<redb::Error> for LibraryError {
    fn from(err: redb::Error) -> Self {
        LibraryError::Redb(err)
    }
}

impl From<DatabaseError> for LibraryError {
    fn from(err: DatabaseError) -> Self {
        LibraryError::Redb(err.into())
    }
}

impl From<TableError> for LibraryError {
    fn from(err: TableError) -> Self {
        LibraryError::Redb(err.into())
    }
}

impl From<TransactionError> for LibraryError {
    fn from(err: TransactionError) -> Self {
        LibraryError::Redb(err.into())
    }
}

impl From<StorageError> for LibraryError {
    fn from(err: StorageError) -> Self {
        LibraryError::Redb(err.into())
    }
}

impl From<CommitError> for LibraryError {
    fn from(err: CommitError) -> Self {
        LibraryError::Redb(err.into())
    }
}

impl From<Box<bincode::ErrorKind>> for LibraryError {
    fn from(err: Box<bincode::ErrorKind>) -> Self {
        LibraryError::Bincode(err)
    }
}
