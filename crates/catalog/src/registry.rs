use common::{CatalogObject, ObjectClass, ObjectId};
use metadata::MetadataResolver;
use tracing::debug;

use crate::store::Store;
use crate::LibraryError;

/// What to look up, and what to create when the lookup misses.
#[derive(Clone, Copy, Debug)]
pub struct ContainerSpec<'a> {
    pub name: &'a str,
    pub parent: &'a ObjectId,
    pub ref_id: Option<&'a ObjectId>,
    pub class: ObjectClass,
    pub artist: Option<&'a str>,
    pub genre: Option<&'a str>,
    pub album_art: Option<u64>,
}

impl<'a> ContainerSpec<'a> {
    pub fn new(name: &'a str, parent: &'a ObjectId, class: ObjectClass) -> Self {
        Self {
            name,
            parent,
            ref_id: None,
            class,
            artist: None,
            genre: None,
            album_art: None,
        }
    }

    pub fn reference(mut self, ref_id: Option<&'a ObjectId>) -> Self {
        self.ref_id = ref_id;
        self
    }

    pub fn facets(mut self, artist: Option<&'a str>, genre: Option<&'a str>) -> Self {
        self.artist = artist;
        self.genre = genre;
        self
    }

    pub fn album_art(mut self, album_art: Option<u64>) -> Self {
        self.album_art = album_art;
        self
    }
}

/// A resolved container and the first free counter beneath it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerHit {
    pub container: ObjectId,
    pub next: u64,
}

/// Reuses the container matching (parent, name, class, artist) or creates a
/// new one under the next free counter of the parent. A new container takes
/// the Detail of `ref_id` when that object exists and asks the resolver for
/// folder metadata otherwise.
pub fn find_or_create(
    store: &Store,
    resolver: &dyn MetadataResolver,
    spec: &ContainerSpec<'_>,
) -> Result<ContainerHit, LibraryError> {
    if let Some(container) = store.find_container(spec.parent, spec.name, spec.class, spec.artist)? {
        let next = store.next_child_counter(&container)?;
        debug!("Reusing container {} for {:?}", container, spec.name);
        return Ok(ContainerHit { container, next });
    }

    let container = spec.parent.child(store.next_child_counter(spec.parent)?);
    let referenced = match spec.ref_id {
        Some(ref_id) => store.detail_of(ref_id)?,
        None => None,
    };
    let detail_id = match referenced {
        Some(detail_id) => detail_id,
        None => store.insert_detail(resolver.resolve_folder(
            spec.name,
            None,
            spec.artist,
            spec.genre,
            spec.album_art,
        ))?,
    };
    store.insert_object(&CatalogObject {
        object_id: container.clone(),
        parent_id: spec.parent.clone(),
        ref_id: spec.ref_id.cloned(),
        detail_id: Some(detail_id),
        class: spec.class,
        name: spec.name.to_string(),
    })?;
    debug!("Created container {} for {:?}", container, spec.name);
    Ok(ContainerHit { container, next: 0 })
}

/// Single-slot recency cache for one taxonomy axis: the last facet value, its
/// container, and the next counter to hand out beneath it.
#[derive(Debug, Default)]
pub struct AxisSlot<K> {
    entry: Option<SlotEntry<K>>,
}

#[derive(Debug)]
struct SlotEntry<K> {
    key: K,
    container: ObjectId,
    next: u64,
}

impl<K: PartialEq> AxisSlot<K> {
    pub fn container(&self) -> Option<&ObjectId> {
        self.entry.as_ref().map(|entry| &entry.container)
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// Container cached for `key`, or the result of `resolve` on a miss.
    /// The flag reports a miss.
    pub fn container_for<F>(&mut self, key: K, resolve: F) -> Result<(ObjectId, bool), LibraryError>
    where
        F: FnOnce() -> Result<ContainerHit, LibraryError>,
    {
        if let Some(entry) = &self.entry {
            if entry.key == key {
                return Ok((entry.container.clone(), false));
            }
        }
        let hit = resolve()?;
        let container = hit.container.clone();
        self.entry = Some(SlotEntry {
            key,
            container: hit.container,
            next: hit.next,
        });
        Ok((container, true))
    }

    /// Key for the next child under the container for `key`. A hit skips the
    /// store and takes the next cached counter.
    pub fn place<F>(&mut self, key: K, resolve: F) -> Result<ObjectId, LibraryError>
    where
        F: FnOnce() -> Result<ContainerHit, LibraryError>,
    {
        if let Some(entry) = &mut self.entry {
            if entry.key == key {
                let child = entry.container.child(entry.next);
                entry.next += 1;
                return Ok(child);
            }
        }
        let hit = resolve()?;
        let child = hit.container.child(hit.next);
        self.entry = Some(SlotEntry {
            key,
            container: hit.container,
            next: hit.next + 1,
        });
        Ok(child)
    }
}
