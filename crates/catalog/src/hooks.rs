use std::path::Path;
use std::sync::Arc;

use common::{path_string, DetailId};
use metadata::{MetadataResolver, TagResolver};
use tracing::debug;

use crate::store::{PlaylistEntry, Store};
use crate::LibraryError;

/// Takes over playlist files. Returning `true` means the file was consumed
/// and gets no catalog item of its own.
pub trait PlaylistImporter: Send + Sync {
    fn try_import(&self, store: &Store, path: &Path, name: &str) -> Result<bool, LibraryError>;
}

/// Associates a caption sidecar with the Detail of the video it belongs to.
pub trait CaptionLinker: Send + Sync {
    fn link(&self, store: &Store, detail_id: DetailId, caption: &Path) -> Result<(), LibraryError>;
}

/// Records every playlist in the playlists table for a later parsing pass.
#[derive(Clone, Debug, Default)]
pub struct PlaylistRecorder;

impl PlaylistImporter for PlaylistRecorder {
    fn try_import(&self, store: &Store, path: &Path, name: &str) -> Result<bool, LibraryError> {
        store.insert_playlist(&PlaylistEntry {
            name: name.to_string(),
            path: path_string(path),
        })?;
        debug!("Recorded playlist {:?}", path);
        Ok(true)
    }
}

#[derive(Clone, Debug, Default)]
pub struct CaptionRecorder;

impl CaptionLinker for CaptionRecorder {
    fn link(&self, store: &Store, detail_id: DetailId, caption: &Path) -> Result<(), LibraryError> {
        store.insert_caption(detail_id, &path_string(caption))
    }
}

/// The external parties a scan talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub resolver: Arc<dyn MetadataResolver>,
    pub playlists: Arc<dyn PlaylistImporter>,
    pub captions: Arc<dyn CaptionLinker>,
}

impl Collaborators {
    pub fn with_resolver(resolver: Arc<dyn MetadataResolver>) -> Self {
        Self {
            resolver,
            ..Self::default()
        }
    }
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            resolver: Arc::new(TagResolver),
            playlists: Arc::new(PlaylistRecorder),
            captions: Arc::new(CaptionRecorder),
        }
    }
}
