//! Owner directories.
//!
//! Every account has at most one directory page listing the keys of the
//! objects it owns or is party to. The page is created on first insert and
//! erased when its last entry goes.

use xrpl_crypto::Keylet;
use xrpl_types::{AccountId, Hash256};

use crate::entry::DirectoryNode;
use crate::error::{StoreError, StoreResult};
use crate::traits::{LedgerView, LedgerViewExt, ReadView, ReadViewExt};

/// Most entries one owner directory may hold.
pub const MAX_DIRECTORY_ENTRIES: usize = 8192;

/// Keys listed in `owner`'s directory, in insertion order.
pub fn dir_entries<V: ReadView + ?Sized>(view: &V, owner: &AccountId) -> StoreResult<Vec<Hash256>> {
    Ok(view
        .read_entry::<DirectoryNode>(&Keylet::owner_dir(owner))?
        .map(|dir| dir.indexes)
        .unwrap_or_default())
}

/// Add `key` to `owner`'s directory. Adding a key already present is a
/// no-op.
pub fn dir_insert<V: LedgerView + ?Sized>(
    view: &mut V,
    owner: &AccountId,
    key: Hash256,
) -> StoreResult<()> {
    let keylet = Keylet::owner_dir(owner);
    match view.read_entry::<DirectoryNode>(&keylet)? {
        Some(mut dir) => {
            if dir.indexes.contains(&key) {
                return Ok(());
            }
            if dir.indexes.len() >= MAX_DIRECTORY_ENTRIES {
                return Err(StoreError::DirectoryFull(*owner));
            }
            dir.indexes.push(key);
            view.update_entry(&keylet, &dir)
        }
        None => view.insert_entry(
            &keylet,
            &DirectoryNode {
                owner: *owner,
                indexes: vec![key],
            },
        ),
    }
}

/// Remove `key` from `owner`'s directory. Returns `false` if it was not
/// listed.
pub fn dir_remove<V: LedgerView + ?Sized>(
    view: &mut V,
    owner: &AccountId,
    key: &Hash256,
) -> StoreResult<bool> {
    let keylet = Keylet::owner_dir(owner);
    let Some(mut dir) = view.read_entry::<DirectoryNode>(&keylet)? else {
        return Ok(false);
    };
    let before = dir.indexes.len();
    dir.indexes.retain(|k| k != key);
    if dir.indexes.len() == before {
        return Ok(false);
    }
    if dir.indexes.is_empty() {
        view.erase(&keylet)?;
    } else {
        view.update_entry(&keylet, &dir)?;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryView;

    fn owner() -> AccountId {
        AccountId::from_bytes([4; 20])
    }

    fn h(b: u8) -> Hash256 {
        Hash256::from_hash([b; 32])
    }

    #[test]
    fn insert_creates_page() {
        let mut view = InMemoryView::new();
        dir_insert(&mut view, &owner(), h(1)).unwrap();
        dir_insert(&mut view, &owner(), h(2)).unwrap();
        dir_insert(&mut view, &owner(), h(1)).unwrap();
        assert_eq!(dir_entries(&view, &owner()).unwrap(), vec![h(1), h(2)]);
    }

    #[test]
    fn removing_last_entry_erases_page() {
        let mut view = InMemoryView::new();
        dir_insert(&mut view, &owner(), h(1)).unwrap();
        assert!(dir_remove(&mut view, &owner(), &h(1)).unwrap());
        assert!(!view.exists(&Keylet::owner_dir(&owner())).unwrap());
        assert!(!dir_remove(&mut view, &owner(), &h(1)).unwrap());
    }

    #[test]
    fn remove_keeps_others() {
        let mut view = InMemoryView::new();
        for b in 1..=3 {
            dir_insert(&mut view, &owner(), h(b)).unwrap();
        }
        dir_remove(&mut view, &owner(), &h(2)).unwrap();
        assert_eq!(dir_entries(&view, &owner()).unwrap(), vec![h(1), h(3)]);
    }

    #[test]
    fn missing_directory_lists_nothing() {
        let view = InMemoryView::new();
        assert!(dir_entries(&view, &owner()).unwrap().is_empty());
    }
}
