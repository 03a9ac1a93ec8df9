use common::{roots, CatalogObject, ObjectClass, ObjectId};
use tracing::debug;

use crate::session::Scan;
use crate::LibraryError;

/// Makes sure the folder `primary_dir` of the browse tree has a counterpart
/// under `scope_root` (e.g. the music-only folder view), creating missing
/// ancestors bottom-up. Each created row copies the name and Detail of its
/// browse-tree folder. Stops at the scope root, at the last mirrored folder,
/// or at the first ancestor already present.
pub fn ensure_mirror(
    scan: &mut Scan<'_>,
    scope_root: &ObjectId,
    primary_dir: &ObjectId,
) -> Result<(), LibraryError> {
    let browse = ObjectId::root(roots::BROWSE_DIR);
    let target = primary_dir.rebase(&browse, scope_root)?;
    if scan.session.last_mirrored.as_ref() == Some(&target) {
        return Ok(());
    }

    let mut primary = primary_dir.clone();
    while primary != browse {
        let mirrored = primary.rebase(&browse, scope_root)?;
        if scan.store.object_exists(&mirrored)? {
            break;
        }
        let source = match scan.store.get_object(&primary)? {
            Some(source) => source,
            None => return Err(LibraryError::MissingObject(primary.to_string())),
        };
        scan.store.insert_object(&CatalogObject {
            parent_id: mirrored.parent()?,
            object_id: mirrored.clone(),
            ref_id: Some(primary.clone()),
            detail_id: source.detail_id,
            class: ObjectClass::StorageFolder,
            name: source.name,
        })?;
        debug!("Mirrored folder {} as {}", primary, mirrored);
        primary = primary.parent()?;
    }

    scan.session.last_mirrored = Some(target);
    Ok(())
}
