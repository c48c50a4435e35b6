//! Ledger state storage for the XRPL transaction engine.
//!
//! Ledger objects are opaque byte strings stored under a
//! [`xrpl_crypto::Keylet`]. This crate defines the view contract, an
//! in-memory backend, write overlays for transactional apply, the typed
//! entry structs, and the canonical codec between the two.
//!
//! # Views
//!
//! - [`ReadView`] / [`LedgerView`] -- point reads, writes, deletes, the
//!   destroyed-drops counter, and an unordered scan
//! - [`InMemoryView`] -- `BTreeMap` backend for tests and embedding
//! - [`Sandbox`] -- overlay whose changes commit via [`PendingChanges`]
//!
//! # Design Rules
//!
//! 1. Insert never overwrites; update and erase never create.
//! 2. Equal entries encode to equal bytes.
//! 3. The destroyed-drops counter only grows.
//! 4. Scan order carries no meaning.

pub mod codec;
pub mod directory;
pub mod entry;
pub mod error;
pub mod memory;
pub mod sandbox;
pub mod traits;

pub use directory::{dir_entries, dir_insert, dir_remove, MAX_DIRECTORY_ENTRIES};
pub use entry::{
    lsf, AccountRoot, Amm, Check, Credential, DirectoryNode, LedgerEntry, RippleState, Ticket,
};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryView;
pub use sandbox::{Action, Pending, PendingChanges, Sandbox};
pub use traits::{LedgerView, LedgerViewExt, ReadView, ReadViewExt};
