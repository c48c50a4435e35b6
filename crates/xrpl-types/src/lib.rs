//! Foundation types for the XRPL transaction engine.
//!
//! Every other crate in the workspace depends on `xrpl-types`. Nothing here
//! touches ledger state; these are the values the engine reasons about.
//!
//! # Key Types
//!
//! - [`AccountId`] -- 160-bit account identifier with the classic `r...` address codec
//! - [`Amount`] -- native drops or an issued-currency value
//! - [`ResultCode`] -- closed outcome taxonomy (`tel`/`tem`/`tef`/`ter`/`tes`/`tec`)
//! - [`Rules`] -- the set of enabled amendments
//! - [`Hash256`] -- ledger keys and transaction IDs
//! - [`NetTime`] -- seconds since the network epoch

pub mod account;
pub mod amendment;
pub mod amount;
pub mod entry_type;
pub mod error;
pub mod hash;
pub mod result;
pub mod time;

pub use account::AccountId;
pub use amendment::{Amendment, Rules};
pub use amount::{Amount, Currency, Drops, Issue, IssuedAmount, DROPS_PER_XRP, MAX_NATIVE_DROPS};
pub use entry_type::LedgerEntryType;
pub use error::TypeError;
pub use hash::Hash256;
pub use result::{ResultBand, ResultCode};
pub use time::NetTime;
