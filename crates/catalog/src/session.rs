use std::sync::atomic::{AtomicBool, Ordering};

use common::ObjectId;
use metadata::MetadataResolver;
use serde::{Deserialize, Serialize};

use crate::hooks::Collaborators;
use crate::registry::AxisSlot;
use crate::store::Store;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub files: usize,
    pub directories: usize,
    pub skipped: usize,
    pub errors: usize,
    pub canceled: bool,
}

/// Recency caches for one build. They are only valid while entries arrive in
/// sorted order, so a session lives exactly as long as one walk.
#[derive(Debug, Default)]
pub struct ScanSession {
    pub date: AxisSlot<String>,
    pub camera: AxisSlot<String>,
    pub camera_date: AxisSlot<String>,
    /// Keyed by (album, artist) so equal titles by different artists stay apart.
    pub album: AxisSlot<(String, Option<String>)>,
    pub artist: AxisSlot<String>,
    pub artist_all: AxisSlot<()>,
    pub artist_album: AxisSlot<String>,
    pub genre: AxisSlot<String>,
    pub genre_all: AxisSlot<()>,
    pub genre_artist: AxisSlot<String>,
    pub last_mirrored: Option<ObjectId>,
}

/// Everything a walk threads through the inserter: the store, the
/// collaborators, the session caches, running stats and the cancel flag.
pub struct Scan<'a> {
    pub store: &'a Store,
    pub hooks: &'a Collaborators,
    pub session: ScanSession,
    pub stats: ScanStats,
    cancel: &'a AtomicBool,
}

impl<'a> Scan<'a> {
    pub fn new(store: &'a Store, hooks: &'a Collaborators, cancel: &'a AtomicBool) -> Self {
        Self {
            store,
            hooks,
            session: ScanSession::default(),
            stats: ScanStats::default(),
            cancel,
        }
    }

    pub fn resolver(&self) -> &'a dyn MetadataResolver {
        let hooks: &'a Collaborators = self.hooks;
        hooks.resolver.as_ref()
    }

    pub fn is_canceled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }
}
