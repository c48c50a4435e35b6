use xrpl_crypto::Keylet;
use xrpl_types::{Drops, Hash256};

use crate::codec;
use crate::entry::LedgerEntry;
use crate::error::{StoreError, StoreResult};

/// Read access to ledger state.
///
/// Entries are opaque bytes keyed by [`Keylet`]; typed access goes through
/// [`ReadViewExt`].
pub trait ReadView {
    /// Read the bytes stored under `keylet`. `Ok(None)` if nothing is there.
    fn read(&self, keylet: &Keylet) -> StoreResult<Option<Vec<u8>>>;

    /// Whether anything is stored under `keylet`.
    fn exists(&self, keylet: &Keylet) -> StoreResult<bool> {
        Ok(self.read(keylet)?.is_some())
    }

    /// Total native currency permanently removed from circulation.
    fn drops_destroyed(&self) -> Drops;

    /// Visit every entry.
    ///
    /// The visiting order is unspecified; never derive consensus-relevant
    /// results from it.
    fn for_each(&self, f: &mut dyn FnMut(&Hash256, &[u8]));
}

/// Mutable ledger state.
///
/// One transaction at a time holds a `&mut` to the view, so no locking is
/// involved.
pub trait LedgerView: ReadView {
    /// Store a new entry. Fails with [`StoreError::AlreadyExists`] if the
    /// key is taken.
    fn insert(&mut self, keylet: &Keylet, bytes: Vec<u8>) -> StoreResult<()>;

    /// Replace an existing entry. Fails with [`StoreError::NotFound`] if the
    /// key is empty.
    fn update(&mut self, keylet: &Keylet, bytes: Vec<u8>) -> StoreResult<()>;

    /// Remove an existing entry. Fails with [`StoreError::NotFound`] if the
    /// key is empty.
    fn erase(&mut self, keylet: &Keylet) -> StoreResult<()>;

    /// Add to the destroyed-drops counter. The counter never decreases.
    fn adjust_drops_destroyed(&mut self, drops: Drops);
}

/// Typed reads over any [`ReadView`].
pub trait ReadViewExt: ReadView {
    /// Read and decode an entry. The keylet's kind must match `T`.
    fn read_entry<T: LedgerEntry>(&self, keylet: &Keylet) -> StoreResult<Option<T>> {
        check_kind::<T>(keylet)?;
        match self.read(keylet)? {
            Some(bytes) => codec::decode(&keylet.key, &bytes).map(Some),
            None => Ok(None),
        }
    }
}

impl<V: ReadView + ?Sized> ReadViewExt for V {}

/// Typed writes over any [`LedgerView`].
pub trait LedgerViewExt: LedgerView {
    fn insert_entry<T: LedgerEntry>(&mut self, keylet: &Keylet, entry: &T) -> StoreResult<()> {
        check_kind::<T>(keylet)?;
        let bytes = codec::encode(entry)?;
        self.insert(keylet, bytes)
    }

    fn update_entry<T: LedgerEntry>(&mut self, keylet: &Keylet, entry: &T) -> StoreResult<()> {
        check_kind::<T>(keylet)?;
        let bytes = codec::encode(entry)?;
        self.update(keylet, bytes)
    }
}

impl<V: LedgerView + ?Sized> LedgerViewExt for V {}

fn check_kind<T: LedgerEntry>(keylet: &Keylet) -> StoreResult<()> {
    if keylet.entry_type != T::ENTRY_TYPE {
        return Err(StoreError::EntryTypeMismatch {
            key: keylet.key,
            expected: keylet.entry_type,
            found: T::ENTRY_TYPE,
        });
    }
    Ok(())
}
