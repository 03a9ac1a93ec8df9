use common::{roots, CatalogObject, ObjectClass, ObjectId};
use metadata::MetadataResolver;
use tracing::{error, info};

use crate::store::Store;
use crate::LibraryError;

pub const UPDATE_ID_SETTING: &str = "UPDATE_ID";

/// Creates the tables and seeds the well-known containers. Any failure is
/// reported as a bootstrap error; scanning must not start after one.
pub fn create_schema_and_seed(
    store: &Store,
    resolver: &dyn MetadataResolver,
) -> Result<(), LibraryError> {
    seed(store, resolver).map_err(|err| {
        error!("Failed to create catalog: {}", err);
        LibraryError::Bootstrap(Box::new(err))
    })
}

fn seed(store: &Store, resolver: &dyn MetadataResolver) -> Result<(), LibraryError> {
    store.init_tables()?;
    store.put_setting(UPDATE_ID_SETTING, "0")?;
    for &(key, parent, name) in roots::WELL_KNOWN {
        let detail_id = store.insert_detail(resolver.resolve_folder(name, None, None, None, None))?;
        store.insert_object(&CatalogObject {
            object_id: ObjectId::root(key),
            parent_id: ObjectId::root(parent),
            ref_id: None,
            detail_id: Some(detail_id),
            class: ObjectClass::StorageFolder,
            name: name.to_string(),
        })?;
    }
    info!("Seeded {} well-known containers", roots::WELL_KNOWN.len());
    Ok(())
}
