//! Transaction engine for an XRPL-compatible ledger.
//!
//! Every transaction goes through the same pipeline before it can change
//! ledger state: amendment gating and stateless checks (preflight),
//! signature and signing authority, read-only checks against the ledger
//! (preclaim), then mutation inside a sandbox followed by invariant checks.
//! The result is a [`ResultCode`](xrpl_types::ResultCode) with a full
//! per-stage audit trail.
//!
//! # Quick Start
//!
//! ```rust
//! use xrpl_crypto::{Keylet, SigningKey};
//! use xrpl_engine::{CheckCreate, Engine, EngineConfig, Transaction};
//! use xrpl_store::{AccountRoot, InMemoryView, LedgerViewExt};
//! use xrpl_types::{Amount, Drops, ResultCode};
//!
//! let alice = SigningKey::from_bytes([1u8; 32]);
//! let bob = SigningKey::from_bytes([2u8; 32]);
//! let mut view = InMemoryView::new();
//! for key in [&alice, &bob] {
//!     let root = AccountRoot::new(key.account_id(), Drops::from_xrp(100), 1);
//!     view.insert_entry(&Keylet::account(&key.account_id()), &root).unwrap();
//! }
//!
//! let mut tx = Transaction::new(
//!     alice.account_id(),
//!     1,
//!     CheckCreate {
//!         destination: bob.account_id(),
//!         send_max: Amount::drops(10_000_000),
//!         expiration: None,
//!         destination_tag: None,
//!         invoice_id: None,
//!     },
//! );
//! tx.sign(&alice).unwrap();
//!
//! let mut engine = Engine::new(&mut view, EngineConfig::default());
//! let result = engine.apply(&tx);
//! assert_eq!(result.result, ResultCode::TesSuccess);
//! assert!(result.applied);
//! ```
//!
//! # Outcomes
//!
//! - `tes`: the sandbox commits.
//! - `tec`: the sandbox is dropped; only the fee and the sequence or ticket
//!   are committed.
//! - `tem`, `tef`, `ter`, `tel`: nothing is committed.

pub mod accounts;
mod common;
pub mod config;
pub mod engine;
pub mod error;
pub mod flow;
pub mod invariants;
pub mod stage;
pub mod transaction;
pub mod transactor;
pub mod trustline;
pub mod tx;

// Re-exports for convenience.
pub use config::{EngineConfig, Fees};
pub use engine::{AffectedNode, Engine, EngineResult, NodeChange, TxMeta};
pub use error::{reject, EngineError, TxFailure, TxResult};
pub use flow::{DirectSettler, FlowSettler, SettleOutcome, SettleRequest};
pub use stage::{Stage, StageResult};
pub use transaction::{tf, CommonFields, Transaction, TxKind, TxType};
pub use transactor::{ApplyContext, PreclaimContext, PreflightContext, Transactor};
pub use tx::{
    asf, AccountSet, AmmCreate, CheckCancel, CheckCash, CheckCreate, Clawback, CredentialAccept,
    CredentialCreate, CredentialDelete, Payment, SetRegularKey, TicketCreate, TrustSet,
    MAX_TICKETS, MAX_TRADING_FEE,
};
