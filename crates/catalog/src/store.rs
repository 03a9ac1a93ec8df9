use std::fs;
use std::path::Path;
use std::sync::Arc;

use common::{CatalogObject, Detail, DetailId, ObjectClass, ObjectId};
use redb::{
    Database, Durability, ReadableTable, TableDefinition, TableError, TableHandle,
    WriteTransaction,
};
use serde::{Deserialize, Serialize};

use crate::LibraryError;

const KEY_SEP: char = '\x1f';
const EMPTY: &[u8] = &[];

const META_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");
const OBJECTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("objects");
const CHILDREN_TABLE: TableDefinition<&str, &str> = TableDefinition::new("children");
const CONTAINER_NAMES_TABLE: TableDefinition<&str, &str> =
    TableDefinition::new("container_names");
const CLASSES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("classes");
const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");
const DETAILS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("details");
const DETAILS_BY_PATH_TABLE: TableDefinition<&str, u64> = TableDefinition::new("details_by_path");
const ALBUM_ART_TABLE: TableDefinition<u64, &str> = TableDefinition::new("album_art");
const CAPTIONS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("captions");
const BOOKMARKS_TABLE: TableDefinition<u64, u64> = TableDefinition::new("bookmarks");
const PLAYLISTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("playlists");
const SETTINGS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("settings");
const SEARCH_TABLE: TableDefinition<&str, u64> = TableDefinition::new("search");

const META_VERSION_KEY: &str = "version";
const META_DETAIL_SEQ_KEY: &str = "detail_seq";
const META_SEARCH_KEY: &str = "search_index";
const MEDIA_DIR_SETTING: &str = "media_dir";

/// A playlist file handed to the playlist importer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub name: String,
    pub path: String,
}

/// Catalog tables in a redb database. Every mutating call is its own write
/// transaction, so a single row is either fully written or absent.
#[derive(Clone)]
pub struct Store {
    db: Arc<Database>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, LibraryError> {
        let db = open_or_create_db(path)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Creates every table, including the point-lookup indexes maintained on
    /// each insert.
    pub fn init_tables(&self) -> Result<(), LibraryError> {
        let write_txn = self.db.begin_write()?;
        {
            write_txn.open_table(META_TABLE)?;
            write_txn.open_table(OBJECTS_TABLE)?;
            write_txn.open_table(CHILDREN_TABLE)?;
            write_txn.open_table(CONTAINER_NAMES_TABLE)?;
            write_txn.open_table(CLASSES_TABLE)?;
            write_txn.open_table(COUNTERS_TABLE)?;
            write_txn.open_table(DETAILS_TABLE)?;
            write_txn.open_table(DETAILS_BY_PATH_TABLE)?;
            write_txn.open_table(ALBUM_ART_TABLE)?;
            write_txn.open_table(CAPTIONS_TABLE)?;
            write_txn.open_table(BOOKMARKS_TABLE)?;
            write_txn.open_table(PLAYLISTS_TABLE)?;
            write_txn.open_table(SETTINGS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Drops every table. The search index goes too; it is rebuilt after the
    /// next walk.
    pub fn reset(&self) -> Result<(), LibraryError> {
        let write_txn = self.db.begin_write()?;
        clear_table(&write_txn, META_TABLE)?;
        clear_table(&write_txn, OBJECTS_TABLE)?;
        clear_table(&write_txn, CHILDREN_TABLE)?;
        clear_table(&write_txn, CONTAINER_NAMES_TABLE)?;
        clear_table(&write_txn, CLASSES_TABLE)?;
        clear_table(&write_txn, COUNTERS_TABLE)?;
        clear_table(&write_txn, DETAILS_TABLE)?;
        clear_table(&write_txn, DETAILS_BY_PATH_TABLE)?;
        clear_table(&write_txn, ALBUM_ART_TABLE)?;
        clear_table(&write_txn, CAPTIONS_TABLE)?;
        clear_table(&write_txn, BOOKMARKS_TABLE)?;
        clear_table(&write_txn, PLAYLISTS_TABLE)?;
        clear_table(&write_txn, SETTINGS_TABLE)?;
        clear_table(&write_txn, SEARCH_TABLE)?;
        write_txn.commit()?;
        Ok(())
    }

    /// Makes every eventual-durability row commit durable.
    pub fn flush(&self) -> Result<(), LibraryError> {
        let mut write_txn = self.db.begin_write()?;
        write_txn.set_durability(Durability::Immediate);
        write_txn.commit()?;
        Ok(())
    }

    pub fn read_version(&self) -> Result<Option<u32>, LibraryError> {
        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(META_TABLE) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let version = match table.get(META_VERSION_KEY)? {
            Some(value) => Some(decode_value(value.value())?),
            None => None,
        };
        Ok(version)
    }

    pub fn write_version(&self, version: u32) -> Result<(), LibraryError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut meta_table = write_txn.open_table(META_TABLE)?;
            let version_bytes = encode_value(&version)?;
            meta_table.insert(META_VERSION_KEY, version_bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Writes one object row together with its index entries and bumps the
    /// parent's counter high-water mark. Existing keys are never overwritten.
    pub fn insert_object(&self, object: &CatalogObject) -> Result<(), LibraryError> {
        let id = object.object_id.as_str();
        let write_txn = self.begin_row_write()?;
        {
            let mut objects = write_txn.open_table(OBJECTS_TABLE)?;
            if objects.get(id)?.is_some() {
                return Err(LibraryError::DuplicateObject(id.to_string()));
            }
            let bytes = encode_value(object)?;
            objects.insert(id, bytes.as_slice())?;

            let mut children = write_txn.open_table(CHILDREN_TABLE)?;
            children.insert(child_index_key(object).as_str(), id)?;

            let mut classes = write_txn.open_table(CLASSES_TABLE)?;
            classes.insert(class_key(object.class, id).as_str(), EMPTY)?;

            if object.class.is_container() {
                let mut names = write_txn.open_table(CONTAINER_NAMES_TABLE)?;
                let key = format!("{}{}", name_prefix(&object.parent_id, &object.name), id);
                names.insert(key.as_str(), id)?;
            }

            if let Ok((parent, counter)) = object.object_id.split_last() {
                let mut counters = write_txn.open_table(COUNTERS_TABLE)?;
                let current = counters.get(parent.as_str())?.map(|value| value.value());
                if current.map_or(true, |next| counter >= next) {
                    counters.insert(parent.as_str(), counter.saturating_add(1))?;
                }
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn get_object(&self, id: &ObjectId) -> Result<Option<CatalogObject>, LibraryError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(OBJECTS_TABLE)?;
        let object = match table.get(id.as_str())? {
            Some(value) => Some(decode_value(value.value())?),
            None => None,
        };
        Ok(object)
    }

    pub fn object_exists(&self, id: &ObjectId) -> Result<bool, LibraryError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(OBJECTS_TABLE)?;
        let exists = table.get(id.as_str())?.is_some();
        Ok(exists)
    }

    pub fn detail_of(&self, id: &ObjectId) -> Result<Option<DetailId>, LibraryError> {
        Ok(self.get_object(id)?.and_then(|object| object.detail_id))
    }

    /// First counter never handed out under `parent`.
    pub fn next_child_counter(&self, parent: &ObjectId) -> Result<u64, LibraryError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(COUNTERS_TABLE)?;
        let next = table
            .get(parent.as_str())?
            .map(|value| value.value())
            .unwrap_or(0);
        Ok(next)
    }

    /// Container under `parent` with this exact name and class whose Detail
    /// carries the same artist. A `None` artist only matches containers
    /// without one.
    pub fn find_container(
        &self,
        parent: &ObjectId,
        name: &str,
        class: ObjectClass,
        artist: Option<&str>,
    ) -> Result<Option<ObjectId>, LibraryError> {
        let read_txn = self.db.begin_read()?;
        let names = read_txn.open_table(CONTAINER_NAMES_TABLE)?;
        let objects = read_txn.open_table(OBJECTS_TABLE)?;
        let details = read_txn.open_table(DETAILS_TABLE)?;

        let prefix = name_prefix(parent, name);
        let end = range_end(&prefix);
        for entry in names.range(prefix.as_str()..end.as_str())? {
            let entry = entry?;
            let object: CatalogObject = match objects.get(entry.1.value())? {
                Some(value) => decode_value(value.value())?,
                None => continue,
            };
            if object.class != class || object.name != name {
                continue;
            }
            let detail_artist = match object.detail_id {
                Some(detail_id) => match details.get(detail_id)? {
                    Some(value) => decode_value::<Detail>(value.value())?.artist,
                    None => None,
                },
                None => None,
            };
            if detail_artist.as_deref() == artist {
                return Ok(Some(object.object_id));
            }
        }
        Ok(None)
    }

    /// Direct children of `parent` in counter order.
    pub fn children(&self, parent: &ObjectId) -> Result<Vec<CatalogObject>, LibraryError> {
        let read_txn = self.db.begin_read()?;
        let children = read_txn.open_table(CHILDREN_TABLE)?;
        let objects = read_txn.open_table(OBJECTS_TABLE)?;

        let prefix = prefix_key(parent.as_str());
        let end = range_end(&prefix);
        let mut out = Vec::new();
        for entry in children.range(prefix.as_str()..end.as_str())? {
            let entry = entry?;
            if let Some(value) = objects.get(entry.1.value())? {
                out.push(decode_value(value.value())?);
            }
        }
        Ok(out)
    }

    pub fn objects_by_class(&self, class: ObjectClass) -> Result<Vec<ObjectId>, LibraryError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CLASSES_TABLE)?;

        let prefix = prefix_key(class.as_str());
        let end = range_end(&prefix);
        let mut out = Vec::new();
        for entry in table.range(prefix.as_str()..end.as_str())? {
            let entry = entry?;
            let (_, id) = split_key_last(entry.0.value())?;
            out.push(ObjectId::parse(id)?);
        }
        Ok(out)
    }

    pub fn object_count(&self) -> Result<u64, LibraryError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(OBJECTS_TABLE)?;
        Ok(table.len()?)
    }

    /// Objects whose parent row is missing. Only the tree root qualifies in a
    /// consistent catalog.
    pub fn dangling_parents(&self) -> Result<Vec<ObjectId>, LibraryError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(OBJECTS_TABLE)?;
        let mut out = Vec::new();
        for entry in table.iter()? {
            let entry = entry?;
            let object: CatalogObject = decode_value(entry.1.value())?;
            if object.parent_id.as_str() == common::roots::NONE {
                continue;
            }
            if table.get(object.parent_id.as_str())?.is_none() {
                out.push(object.object_id);
            }
        }
        Ok(out)
    }

    /// Stores a Detail under a fresh id and returns the id.
    pub fn insert_detail(&self, mut detail: Detail) -> Result<DetailId, LibraryError> {
        let write_txn = self.begin_row_write()?;
        let id = {
            let mut meta = write_txn.open_table(META_TABLE)?;
            let next: u64 = match meta.get(META_DETAIL_SEQ_KEY)? {
                Some(value) => decode_value(value.value())?,
                None => 1,
            };
            let seq_bytes = encode_value(&(next + 1))?;
            meta.insert(META_DETAIL_SEQ_KEY, seq_bytes.as_slice())?;

            detail.id = next;
            let mut details = write_txn.open_table(DETAILS_TABLE)?;
            let bytes = encode_value(&detail)?;
            details.insert(next, bytes.as_slice())?;

            if let Some(path) = &detail.path {
                let mut by_path = write_txn.open_table(DETAILS_BY_PATH_TABLE)?;
                let key = format!("{}{:016X}", prefix_key(path), next);
                by_path.insert(key.as_str(), next)?;
            }
            next
        };
        write_txn.commit()?;
        Ok(id)
    }

    pub fn get_detail(&self, id: DetailId) -> Result<Option<Detail>, LibraryError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DETAILS_TABLE)?;
        let detail = match table.get(id)? {
            Some(value) => Some(decode_value(value.value())?),
            None => None,
        };
        Ok(detail)
    }

    pub fn details_by_path(&self, path: &str) -> Result<Vec<DetailId>, LibraryError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DETAILS_BY_PATH_TABLE)?;
        let prefix = prefix_key(path);
        let end = range_end(&prefix);
        let mut out = Vec::new();
        for entry in table.range(prefix.as_str()..end.as_str())? {
            let entry = entry?;
            out.push(entry.1.value());
        }
        Ok(out)
    }

    pub fn set_detail_timestamp(&self, id: DetailId, timestamp: i64) -> Result<(), LibraryError> {
        let write_txn = self.begin_row_write()?;
        {
            let mut details = write_txn.open_table(DETAILS_TABLE)?;
            let mut detail: Detail = match details.get(id)? {
                Some(value) => decode_value(value.value())?,
                None => return Ok(()),
            };
            detail.timestamp = Some(timestamp);
            let bytes = encode_value(&detail)?;
            details.insert(id, bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn put_setting(&self, key: &str, value: &str) -> Result<(), LibraryError> {
        let write_txn = self.begin_row_write()?;
        {
            let mut settings = write_txn.open_table(SETTINGS_TABLE)?;
            settings.insert(key, value)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn setting(&self, key: &str) -> Result<Option<String>, LibraryError> {
        let read_txn = self.db.begin_read()?;
        let settings = read_txn.open_table(SETTINGS_TABLE)?;
        let value = settings.get(key)?.map(|value| value.value().to_string());
        Ok(value)
    }

    pub fn add_media_dir(&self, path: &str) -> Result<(), LibraryError> {
        let key = format!("{}{}", prefix_key(MEDIA_DIR_SETTING), path);
        self.put_setting(&key, path)
    }

    pub fn media_dirs(&self) -> Result<Vec<String>, LibraryError> {
        let read_txn = self.db.begin_read()?;
        let settings = read_txn.open_table(SETTINGS_TABLE)?;
        let prefix = prefix_key(MEDIA_DIR_SETTING);
        let end = range_end(&prefix);
        let mut out = Vec::new();
        for entry in settings.range(prefix.as_str()..end.as_str())? {
            let entry = entry?;
            out.push(entry.1.value().to_string());
        }
        Ok(out)
    }

    pub fn insert_caption(&self, detail_id: DetailId, path: &str) -> Result<(), LibraryError> {
        let write_txn = self.begin_row_write()?;
        {
            let mut captions = write_txn.open_table(CAPTIONS_TABLE)?;
            let key = format!("{}{}", prefix_key(&format!("{:016X}", detail_id)), path);
            captions.insert(key.as_str(), path)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn captions(&self, detail_id: DetailId) -> Result<Vec<String>, LibraryError> {
        let read_txn = self.db.begin_read()?;
        let captions = read_txn.open_table(CAPTIONS_TABLE)?;
        let prefix = prefix_key(&format!("{:016X}", detail_id));
        let end = range_end(&prefix);
        let mut out = Vec::new();
        for entry in captions.range(prefix.as_str()..end.as_str())? {
            let entry = entry?;
            out.push(entry.1.value().to_string());
        }
        Ok(out)
    }

    pub fn insert_playlist(&self, entry: &PlaylistEntry) -> Result<(), LibraryError> {
        let write_txn = self.begin_row_write()?;
        {
            let mut playlists = write_txn.open_table(PLAYLISTS_TABLE)?;
            let bytes = encode_value(entry)?;
            playlists.insert(entry.path.as_str(), bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn playlists(&self) -> Result<Vec<PlaylistEntry>, LibraryError> {
        let read_txn = self.db.begin_read()?;
        let playlists = read_txn.open_table(PLAYLISTS_TABLE)?;
        let mut out = Vec::new();
        for entry in playlists.iter()? {
            let entry = entry?;
            out.push(decode_value(entry.1.value())?);
        }
        Ok(out)
    }

    /// Builds the `object_id + class -> detail_id` index in one pass over
    /// the objects. Returns the number of entries.
    pub fn create_search_index(&self) -> Result<usize, LibraryError> {
        let write_txn = self.db.begin_write()?;
        let count = {
            let objects = write_txn.open_table(OBJECTS_TABLE)?;
            let mut rows = Vec::new();
            for entry in objects.iter()? {
                let entry = entry?;
                let object: CatalogObject = decode_value(entry.1.value())?;
                if let Some(detail_id) = object.detail_id {
                    rows.push((search_key(&object), detail_id));
                }
            }
            drop(objects);

            let mut search = write_txn.open_table(SEARCH_TABLE)?;
            for (key, detail_id) in &rows {
                search.insert(key.as_str(), *detail_id)?;
            }
            let mut meta = write_txn.open_table(META_TABLE)?;
            meta.insert(META_SEARCH_KEY, bool_bytes(true))?;
            rows.len()
        };
        write_txn.commit()?;
        Ok(count)
    }

    pub fn search_detail(
        &self,
        id: &ObjectId,
        class: ObjectClass,
    ) -> Result<Option<DetailId>, LibraryError> {
        let read_txn = self.db.begin_read()?;
        let search = match read_txn.open_table(SEARCH_TABLE) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let key = format!("{}{}", prefix_key(id.as_str()), class.as_str());
        let detail_id = search.get(key.as_str())?.map(|value| value.value());
        Ok(detail_id)
    }

    fn begin_row_write(&self) -> Result<WriteTransaction, LibraryError> {
        let mut write_txn = self.db.begin_write()?;
        write_txn.set_durability(Durability::Eventual);
        Ok(write_txn)
    }
}

fn open_or_create_db(path: &Path) -> Result<Database, LibraryError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    if path.exists() {
        Ok(Database::open(path)?)
    } else {
        Ok(Database::create(path)?)
    }
}

fn clear_table(txn: &WriteTransaction, table: impl TableHandle) -> Result<(), LibraryError> {
    match txn.delete_table(table) {
        Ok(_) => Ok(()),
        Err(TableError::TableDoesNotExist(_)) => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn encode_value<T: Serialize>(value: &T) -> Result<Vec<u8>, LibraryError> {
    Ok(bincode::serialize(value)?)
}

fn decode_value<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T, LibraryError> {
    Ok(bincode::deserialize(bytes)?)
}

fn bool_bytes(value: bool) -> &'static [u8] {
    if value {
        &[1u8]
    } else {
        &[0u8]
    }
}

fn prefix_key(prefix: &str) -> String {
    let mut out = String::new();
    out.push_str(prefix);
    out.push(KEY_SEP);
    out
}

fn range_end(prefix: &str) -> String {
    let mut end = prefix.to_string();
    end.push('\u{10ffff}');
    end
}

fn split_key_last(value: &str) -> Result<(&str, &str), LibraryError> {
    let idx = value
        .rfind(KEY_SEP)
        .ok_or_else(|| LibraryError::KeyParse(value.to_string()))?;
    let next = idx + KEY_SEP.len_utf8();
    Ok((&value[..idx], &value[next..]))
}

/// Counter-ordered position under the parent. Hand-assigned roots without a
/// counter segment sort by their raw key.
fn child_index_key(object: &CatalogObject) -> String {
    let suffix = match object.object_id.split_last() {
        Ok((_, counter)) => format!("{:016X}", counter),
        Err(_) => object.object_id.as_str().to_string(),
    };
    format!("{}{}", prefix_key(object.parent_id.as_str()), suffix)
}

fn name_prefix(parent: &ObjectId, name: &str) -> String {
    let mut out = prefix_key(parent.as_str());
    out.push_str(name);
    out.push(KEY_SEP);
    out
}

fn class_key(class: ObjectClass, id: &str) -> String {
    format!("{}{}", prefix_key(class.as_str()), id)
}

fn search_key(object: &CatalogObject) -> String {
    format!("{}{}", prefix_key(object.object_id.as_str()), object.class.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_store(dir: &tempfile::TempDir) -> Store {
        let store = Store::open(&dir.path().join("catalog.redb")).unwrap();
        store.init_tables().unwrap();
        store
    }

    fn folder(id: &ObjectId, parent: &ObjectId, name: &str, detail_id: Option<u64>) -> CatalogObject {
        CatalogObject {
            object_id: id.clone(),
            parent_id: parent.clone(),
            ref_id: None,
            detail_id,
            class: ObjectClass::StorageFolder,
            name: name.to_string(),
        }
    }

    #[test]
    fn rejects_duplicate_object_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        let parent = ObjectId::root("64");
        let row = folder(&parent.child(0), &parent, "a", None);
        store.insert_object(&row).unwrap();
        assert!(matches!(
            store.insert_object(&row),
            Err(LibraryError::DuplicateObject(id)) if id == "64$0"
        ));
        assert_eq!(store.get_object(&parent.child(0)).unwrap(), Some(row));
    }

    #[test]
    fn counters_are_high_water_marks() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        let parent = ObjectId::root("64");
        assert_eq!(store.next_child_counter(&parent).unwrap(), 0);
        store
            .insert_object(&folder(&parent.child(5), &parent, "five", None))
            .unwrap();
        assert_eq!(store.next_child_counter(&parent).unwrap(), 6);
        store
            .insert_object(&folder(&parent.child(2), &parent, "two", None))
            .unwrap();
        assert_eq!(store.next_child_counter(&parent).unwrap(), 6);
        let names: Vec<String> = store
            .children(&parent)
            .unwrap()
            .into_iter()
            .map(|object| object.name)
            .collect();
        assert_eq!(names, vec!["two", "five"]);
    }

    #[test]
    fn finds_containers_by_name_class_and_artist() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        let parent = ObjectId::root("1$7");
        let with_artist = store
            .insert_detail(Detail {
                artist: Some("Ella".to_string()),
                ..Detail::default()
            })
            .unwrap();
        let mut album = folder(&parent.child(0), &parent, "Paris", Some(with_artist));
        album.class = ObjectClass::MusicAlbum;
        store.insert_object(&album).unwrap();

        assert_eq!(
            store
                .find_container(&parent, "Paris", ObjectClass::MusicAlbum, Some("Ella"))
                .unwrap(),
            Some(parent.child(0))
        );
        assert_eq!(
            store
                .find_container(&parent, "Paris", ObjectClass::MusicAlbum, None)
                .unwrap(),
            None
        );
        assert_eq!(
            store
                .find_container(&parent, "Paris", ObjectClass::MusicArtist, Some("Ella"))
                .unwrap(),
            None
        );
        assert_eq!(
            store
                .find_container(&parent, "Par", ObjectClass::MusicAlbum, Some("Ella"))
                .unwrap(),
            None
        );
    }

    #[test]
    fn container_lookup_ignores_names_extending_the_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        let parent = ObjectId::root("1$5");
        let joined = format!("Rock{}Pop", KEY_SEP);
        store
            .insert_object(&folder(&parent.child(0), &parent, &joined, None))
            .unwrap();

        assert_eq!(
            store
                .find_container(&parent, "Rock", ObjectClass::StorageFolder, None)
                .unwrap(),
            None
        );
        assert_eq!(
            store
                .find_container(&parent, &joined, ObjectClass::StorageFolder, None)
                .unwrap(),
            Some(parent.child(0))
        );
    }

    #[test]
    fn details_get_sequential_ids_and_path_index() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        let first = store
            .insert_detail(Detail {
                path: Some("/music/a.mp3".to_string()),
                ..Detail::default()
            })
            .unwrap();
        let second = store.insert_detail(Detail::default()).unwrap();
        assert_eq!((first, second), (1, 2));
        assert_eq!(store.details_by_path("/music/a.mp3").unwrap(), vec![first]);
        store.set_detail_timestamp(first, 7).unwrap();
        let detail = store.get_detail(first).unwrap().unwrap();
        assert_eq!(detail.id, first);
        assert_eq!(detail.timestamp, Some(7));
    }

    #[test]
    fn reset_clears_rows_and_version() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        let parent = ObjectId::root("64");
        store
            .insert_object(&folder(&parent.child(0), &parent, "a", None))
            .unwrap();
        store.write_version(3).unwrap();
        assert_eq!(store.read_version().unwrap(), Some(3));

        store.reset().unwrap();
        assert_eq!(store.read_version().unwrap(), None);
        store.init_tables().unwrap();
        assert_eq!(store.object_count().unwrap(), 0);
        assert_eq!(store.next_child_counter(&parent).unwrap(), 0);
    }

    #[test]
    fn reports_dangling_parents() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        let root = ObjectId::root("0");
        store
            .insert_object(&folder(&root, &ObjectId::root("-1"), "root", None))
            .unwrap();
        let orphan = ObjectId::root("64").child(1);
        store
            .insert_object(&folder(&orphan, &ObjectId::root("64"), "orphan", None))
            .unwrap();
        assert_eq!(store.dangling_parents().unwrap(), vec![orphan]);
    }

    #[test]
    fn search_index_maps_objects_to_details() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        let parent = ObjectId::root("64");
        store
            .insert_object(&folder(&parent.child(0), &parent, "a", Some(9)))
            .unwrap();
        store
            .insert_object(&folder(&parent.child(1), &parent, "b", None))
            .unwrap();
        assert_eq!(
            store
                .search_detail(&parent.child(0), ObjectClass::StorageFolder)
                .unwrap(),
            None
        );
        assert_eq!(store.create_search_index().unwrap(), 1);
        assert_eq!(
            store
                .search_detail(&parent.child(0), ObjectClass::StorageFolder)
                .unwrap(),
            Some(9)
        );
    }

    #[test]
    fn settings_and_media_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        store.put_setting("UPDATE_ID", "0").unwrap();
        store.add_media_dir("/srv/music").unwrap();
        store.add_media_dir("/srv/photos").unwrap();
        assert_eq!(store.setting("UPDATE_ID").unwrap().as_deref(), Some("0"));
        assert_eq!(
            store.media_dirs().unwrap(),
            vec!["/srv/music".to_string(), "/srv/photos".to_string()]
        );
    }
}
