use std::collections::BTreeMap;

use xrpl_crypto::Keylet;
use xrpl_types::{Drops, Hash256, LedgerEntryType};

use crate::error::{StoreError, StoreResult};
use crate::traits::{LedgerView, ReadView};

/// What a sandbox did to one key relative to its base.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Created(Vec<u8>),
    Modified(Vec<u8>),
    Deleted,
}

/// One pending change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pending {
    pub entry_type: LedgerEntryType,
    pub action: Action,
}

impl Pending {
    /// Bytes after the change, `None` for a deletion.
    pub fn after(&self) -> Option<&[u8]> {
        match &self.action {
            Action::Created(b) | Action::Modified(b) => Some(b),
            Action::Deleted => None,
        }
    }
}

/// A write overlay on top of a read-only view.
///
/// Nothing reaches the base until the overlay is turned into
/// [`PendingChanges`] and applied. Sandboxes nest: a sandbox is itself a
/// [`ReadView`].
pub struct Sandbox<'a> {
    base: &'a dyn ReadView,
    changes: BTreeMap<Hash256, Pending>,
    destroyed: Drops,
}

impl<'a> Sandbox<'a> {
    pub fn new(base: &'a dyn ReadView) -> Self {
        Self {
            base,
            changes: BTreeMap::new(),
            destroyed: Drops::ZERO,
        }
    }

    /// The view this sandbox reads through to.
    pub fn base(&self) -> &'a dyn ReadView {
        self.base
    }

    /// Changes so far, in key order.
    pub fn changes(&self) -> impl Iterator<Item = (&Hash256, &Pending)> {
        self.changes.iter()
    }

    /// Drops destroyed inside this sandbox only.
    pub fn destroyed(&self) -> Drops {
        self.destroyed
    }

    pub fn is_clean(&self) -> bool {
        self.changes.is_empty() && self.destroyed.is_zero()
    }

    /// Detach the accumulated changes from the base.
    pub fn into_changes(self) -> PendingChanges {
        PendingChanges {
            changes: self.changes,
            destroyed: self.destroyed,
        }
    }
}

impl ReadView for Sandbox<'_> {
    fn read(&self, keylet: &Keylet) -> StoreResult<Option<Vec<u8>>> {
        match self.changes.get(&keylet.key) {
            Some(pending) => Ok(pending.after().map(<[u8]>::to_vec)),
            None => self.base.read(keylet),
        }
    }

    fn drops_destroyed(&self) -> Drops {
        self.base
            .drops_destroyed()
            .checked_add(self.destroyed)
            .unwrap_or(Drops::new(u64::MAX))
    }

    fn for_each(&self, f: &mut dyn FnMut(&Hash256, &[u8])) {
        self.base.for_each(&mut |key, bytes| {
            if !self.changes.contains_key(key) {
                f(key, bytes);
            }
        });
        for (key, pending) in &self.changes {
            if let Some(bytes) = pending.after() {
                f(key, bytes);
            }
        }
    }
}

impl LedgerView for Sandbox<'_> {
    fn insert(&mut self, keylet: &Keylet, bytes: Vec<u8>) -> StoreResult<()> {
        if self.exists(keylet)? {
            return Err(StoreError::AlreadyExists(keylet.key));
        }
        // Re-creating something the base still holds is a modification.
        let action = match self.changes.get(&keylet.key) {
            Some(Pending {
                action: Action::Deleted,
                ..
            }) => Action::Modified(bytes),
            _ => Action::Created(bytes),
        };
        self.changes.insert(
            keylet.key,
            Pending {
                entry_type: keylet.entry_type,
                action,
            },
        );
        Ok(())
    }

    fn update(&mut self, keylet: &Keylet, bytes: Vec<u8>) -> StoreResult<()> {
        if !self.exists(keylet)? {
            return Err(StoreError::NotFound(keylet.key));
        }
        let action = match self.changes.get(&keylet.key) {
            Some(Pending {
                action: Action::Created(_),
                ..
            }) => Action::Created(bytes),
            _ => Action::Modified(bytes),
        };
        self.changes.insert(
            keylet.key,
            Pending {
                entry_type: keylet.entry_type,
                action,
            },
        );
        Ok(())
    }

    fn erase(&mut self, keylet: &Keylet) -> StoreResult<()> {
        if !self.exists(keylet)? {
            return Err(StoreError::NotFound(keylet.key));
        }
        let created_here = matches!(
            self.changes.get(&keylet.key),
            Some(Pending {
                action: Action::Created(_),
                ..
            })
        );
        if created_here {
            self.changes.remove(&keylet.key);
        } else {
            self.changes.insert(
                keylet.key,
                Pending {
                    entry_type: keylet.entry_type,
                    action: Action::Deleted,
                },
            );
        }
        Ok(())
    }

    fn adjust_drops_destroyed(&mut self, drops: Drops) {
        self.destroyed = self
            .destroyed
            .checked_add(drops)
            .unwrap_or(Drops::new(u64::MAX));
    }
}

/// Changes detached from a [`Sandbox`], ready to be committed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PendingChanges {
    changes: BTreeMap<Hash256, Pending>,
    destroyed: Drops,
}

impl PendingChanges {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.destroyed.is_zero()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Hash256, &Pending)> {
        self.changes.iter()
    }

    pub fn destroyed(&self) -> Drops {
        self.destroyed
    }

    /// Commit every change to `view`, in key order.
    pub fn apply_to(self, view: &mut dyn LedgerView) -> StoreResult<()> {
        tracing::trace!(
            changes = self.changes.len(),
            destroyed = self.destroyed.as_u64(),
            "applying pending changes"
        );
        for (key, pending) in self.changes {
            let keylet = Keylet::new(pending.entry_type, key);
            match pending.action {
                Action::Created(bytes) => view.insert(&keylet, bytes)?,
                Action::Modified(bytes) => view.update(&keylet, bytes)?,
                Action::Deleted => view.erase(&keylet)?,
            }
        }
        if !self.destroyed.is_zero() {
            view.adjust_drops_destroyed(self.destroyed);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use xrpl_types::AccountId;

    use super::*;
    use crate::memory::InMemoryView;

    fn key(b: u8) -> Keylet {
        Keylet::account(&AccountId::from_bytes([b; 20]))
    }

    fn base() -> InMemoryView {
        let mut view = InMemoryView::new();
        view.insert(&key(1), vec![1]).unwrap();
        view.insert(&key(2), vec![2]).unwrap();
        view
    }

    #[test]
    fn reads_fall_through_to_base() {
        let base = base();
        let sandbox = Sandbox::new(&base);
        assert_eq!(sandbox.read(&key(1)).unwrap(), Some(vec![1]));
        assert!(sandbox.is_clean());
    }

    #[test]
    fn writes_stay_in_overlay() {
        let base = base();
        let mut sandbox = Sandbox::new(&base);
        sandbox.update(&key(1), vec![10]).unwrap();
        sandbox.erase(&key(2)).unwrap();
        sandbox.insert(&key(3), vec![3]).unwrap();
        assert_eq!(sandbox.read(&key(1)).unwrap(), Some(vec![10]));
        assert_eq!(sandbox.read(&key(2)).unwrap(), None);
        assert_eq!(sandbox.read(&key(3)).unwrap(), Some(vec![3]));
        assert_eq!(base.read(&key(1)).unwrap(), Some(vec![1]));
        assert_eq!(base.read(&key(3)).unwrap(), None);
    }

    #[test]
    fn apply_commits_everything() {
        let mut base = base();
        let changes = {
            let mut sandbox = Sandbox::new(&base);
            sandbox.update(&key(1), vec![10]).unwrap();
            sandbox.erase(&key(2)).unwrap();
            sandbox.insert(&key(3), vec![3]).unwrap();
            sandbox.adjust_drops_destroyed(Drops::new(12));
            sandbox.into_changes()
        };
        changes.apply_to(&mut base).unwrap();
        assert_eq!(base.read(&key(1)).unwrap(), Some(vec![10]));
        assert_eq!(base.read(&key(2)).unwrap(), None);
        assert_eq!(base.read(&key(3)).unwrap(), Some(vec![3]));
        assert_eq!(base.drops_destroyed(), Drops::new(12));
    }

    #[test]
    fn dropped_sandbox_leaves_base_untouched() {
        let base = base();
        let before = base.state_hash();
        {
            let mut sandbox = Sandbox::new(&base);
            sandbox.erase(&key(1)).unwrap();
        }
        assert_eq!(base.state_hash(), before);
    }

    #[test]
    fn create_then_erase_cancels_out() {
        let base = base();
        let mut sandbox = Sandbox::new(&base);
        sandbox.insert(&key(3), vec![3]).unwrap();
        sandbox.update(&key(3), vec![4]).unwrap();
        assert!(matches!(
            sandbox.changes().next().map(|(_, p)| &p.action),
            Some(Action::Created(b)) if b == &vec![4]
        ));
        sandbox.erase(&key(3)).unwrap();
        assert!(sandbox.is_clean());
    }

    #[test]
    fn erase_then_insert_is_modification() {
        let base = base();
        let mut sandbox = Sandbox::new(&base);
        sandbox.erase(&key(1)).unwrap();
        sandbox.insert(&key(1), vec![9]).unwrap();
        let (_, pending) = sandbox.changes().next().unwrap();
        assert_eq!(pending.action, Action::Modified(vec![9]));
    }

    #[test]
    fn presence_rules_match_base_views() {
        let base = base();
        let mut sandbox = Sandbox::new(&base);
        assert_eq!(sandbox.insert(&key(1), vec![0]), Err(StoreError::AlreadyExists(key(1).key)));
        assert_eq!(sandbox.update(&key(7), vec![0]), Err(StoreError::NotFound(key(7).key)));
        sandbox.erase(&key(1)).unwrap();
        assert_eq!(sandbox.erase(&key(1)), Err(StoreError::NotFound(key(1).key)));
    }

    #[test]
    fn nested_sandboxes_commit_into_parent() {
        let base = base();
        let mut outer = Sandbox::new(&base);
        let inner_changes = {
            let mut inner = Sandbox::new(&outer);
            inner.insert(&key(5), vec![5]).unwrap();
            inner.into_changes()
        };
        inner_changes.apply_to(&mut outer).unwrap();
        assert_eq!(outer.read(&key(5)).unwrap(), Some(vec![5]));
        assert_eq!(base.read(&key(5)).unwrap(), None);
    }

    #[test]
    fn for_each_merges_overlay() {
        let base = base();
        let mut sandbox = Sandbox::new(&base);
        sandbox.erase(&key(1)).unwrap();
        sandbox.insert(&key(3), vec![3]).unwrap();
        let mut seen = Vec::new();
        sandbox.for_each(&mut |_, bytes| seen.push(bytes.to_vec()));
        seen.sort();
        assert_eq!(seen, vec![vec![2], vec![3]]);
    }
}
