use std::collections::BTreeMap;

use xrpl_crypto::{ContentHasher, Keylet};
use xrpl_types::{Drops, Hash256};

use crate::error::{StoreError, StoreResult};
use crate::traits::{LedgerView, ReadView};

/// In-memory ledger state.
///
/// Intended for tests and embedding. Entries live in a `BTreeMap` so
/// [`InMemoryView::state_hash`] can walk them in key order.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct InMemoryView {
    entries: BTreeMap<Hash256, Vec<u8>>,
    drops_destroyed: Drops,
}

impl InMemoryView {
    /// Create a new empty view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the view holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every key, in ascending order.
    pub fn keys(&self) -> Vec<Hash256> {
        self.entries.keys().copied().collect()
    }

    /// Digest of every entry and the destroyed-drops counter.
    ///
    /// Two views that applied the same transactions from the same start
    /// produce the same digest.
    pub fn state_hash(&self) -> Hash256 {
        let destroyed = self.drops_destroyed.as_u64().to_be_bytes();
        let parts = self
            .entries
            .iter()
            .flat_map(|(k, v)| [k.as_bytes().as_slice(), v.as_slice()])
            .chain(std::iter::once(destroyed.as_slice()));
        ContentHasher::STATE.hash_parts(parts)
    }
}

impl ReadView for InMemoryView {
    fn read(&self, keylet: &Keylet) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.entries.get(&keylet.key).cloned())
    }

    fn exists(&self, keylet: &Keylet) -> StoreResult<bool> {
        Ok(self.entries.contains_key(&keylet.key))
    }

    fn drops_destroyed(&self) -> Drops {
        self.drops_destroyed
    }

    fn for_each(&self, f: &mut dyn FnMut(&Hash256, &[u8])) {
        for (key, bytes) in &self.entries {
            f(key, bytes);
        }
    }
}

impl LedgerView for InMemoryView {
    fn insert(&mut self, keylet: &Keylet, bytes: Vec<u8>) -> StoreResult<()> {
        if self.entries.contains_key(&keylet.key) {
            return Err(StoreError::AlreadyExists(keylet.key));
        }
        self.entries.insert(keylet.key, bytes);
        Ok(())
    }

    fn update(&mut self, keylet: &Keylet, bytes: Vec<u8>) -> StoreResult<()> {
        match self.entries.get_mut(&keylet.key) {
            Some(slot) => {
                *slot = bytes;
                Ok(())
            }
            None => Err(StoreError::NotFound(keylet.key)),
        }
    }

    fn erase(&mut self, keylet: &Keylet) -> StoreResult<()> {
        self.entries
            .remove(&keylet.key)
            .map(|_| ())
            .ok_or(StoreError::NotFound(keylet.key))
    }

    fn adjust_drops_destroyed(&mut self, drops: Drops) {
        self.drops_destroyed = self
            .drops_destroyed
            .checked_add(drops)
            .unwrap_or(Drops::new(u64::MAX));
    }
}

impl std::fmt::Debug for InMemoryView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryView")
            .field("entry_count", &self.entries.len())
            .field("drops_destroyed", &self.drops_destroyed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use xrpl_types::AccountId;

    use super::*;
    use crate::entry::AccountRoot;
    use crate::traits::{LedgerViewExt, ReadViewExt};

    fn acct(b: u8) -> AccountId {
        AccountId::from_bytes([b; 20])
    }

    #[test]
    fn insert_then_read() {
        let mut view = InMemoryView::new();
        let k = Keylet::account(&acct(1));
        let root = AccountRoot::new(acct(1), Drops::new(100), 1);
        view.insert_entry(&k, &root).unwrap();
        assert!(view.exists(&k).unwrap());
        assert_eq!(view.read_entry::<AccountRoot>(&k).unwrap(), Some(root));
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn insert_twice_fails() {
        let mut view = InMemoryView::new();
        let k = Keylet::account(&acct(1));
        view.insert(&k, vec![1]).unwrap();
        assert_eq!(view.insert(&k, vec![2]), Err(StoreError::AlreadyExists(k.key)));
    }

    #[test]
    fn update_and_erase_require_presence() {
        let mut view = InMemoryView::new();
        let k = Keylet::account(&acct(1));
        assert_eq!(view.update(&k, vec![1]), Err(StoreError::NotFound(k.key)));
        assert_eq!(view.erase(&k), Err(StoreError::NotFound(k.key)));
        view.insert(&k, vec![1]).unwrap();
        view.update(&k, vec![2]).unwrap();
        assert_eq!(view.read(&k).unwrap(), Some(vec![2]));
        view.erase(&k).unwrap();
        assert!(view.is_empty());
    }

    #[test]
    fn typed_read_checks_keylet_kind() {
        let mut view = InMemoryView::new();
        let root = AccountRoot::new(acct(1), Drops::new(100), 1);
        let wrong = Keylet::check(&acct(1), 1);
        assert!(matches!(
            view.insert_entry(&wrong, &root),
            Err(StoreError::EntryTypeMismatch { .. })
        ));
    }

    #[test]
    fn drops_destroyed_accumulates() {
        let mut view = InMemoryView::new();
        view.adjust_drops_destroyed(Drops::new(10));
        view.adjust_drops_destroyed(Drops::new(12));
        assert_eq!(view.drops_destroyed(), Drops::new(22));
    }

    #[test]
    fn state_hash_tracks_contents() {
        let mut a = InMemoryView::new();
        let mut b = InMemoryView::new();
        assert_eq!(a.state_hash(), b.state_hash());
        a.insert(&Keylet::account(&acct(1)), vec![1]).unwrap();
        assert_ne!(a.state_hash(), b.state_hash());
        b.insert(&Keylet::account(&acct(1)), vec![1]).unwrap();
        assert_eq!(a.state_hash(), b.state_hash());
        b.adjust_drops_destroyed(Drops::new(1));
        assert_ne!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn for_each_visits_everything() {
        let mut view = InMemoryView::new();
        for b in 1..=3 {
            view.insert(&Keylet::account(&acct(b)), vec![b]).unwrap();
        }
        let mut seen = 0;
        view.for_each(&mut |_, _| seen += 1);
        assert_eq!(seen, 3);
    }
}
