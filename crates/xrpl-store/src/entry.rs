//! Typed ledger entries.
//!
//! Each entry kind is a plain struct; the view stores it as bytes via
//! [`crate::codec`]. Mutations happen on a decoded copy which the caller
//! writes back before the transaction finishes.

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use xrpl_types::{AccountId, Amount, Currency, Drops, Hash256, Issue, LedgerEntryType, NetTime};

/// A struct that can live in the ledger under a [`xrpl_crypto::Keylet`].
pub trait LedgerEntry: Serialize + DeserializeOwned {
    const ENTRY_TYPE: LedgerEntryType;
}

/// Ledger-state flags (`lsf*`), grouped by the entry kind that carries them.
pub mod lsf {
    // AccountRoot
    pub const PASSWORD_SPENT: u32 = 0x0001_0000;
    pub const REQUIRE_DEST_TAG: u32 = 0x0002_0000;
    pub const REQUIRE_AUTH: u32 = 0x0004_0000;
    pub const DISALLOW_XRP: u32 = 0x0008_0000;
    pub const DISABLE_MASTER: u32 = 0x0010_0000;
    pub const NO_FREEZE: u32 = 0x0020_0000;
    pub const GLOBAL_FREEZE: u32 = 0x0040_0000;
    pub const DEFAULT_RIPPLE: u32 = 0x0080_0000;
    pub const DEPOSIT_AUTH: u32 = 0x0100_0000;
    pub const DISALLOW_INCOMING_CHECK: u32 = 0x0800_0000;
    pub const DISALLOW_INCOMING_TRUSTLINE: u32 = 0x2000_0000;
    pub const ALLOW_TRUSTLINE_CLAWBACK: u32 = 0x8000_0000;

    // RippleState
    pub const LOW_RESERVE: u32 = 0x0001_0000;
    pub const HIGH_RESERVE: u32 = 0x0002_0000;
    pub const LOW_AUTH: u32 = 0x0004_0000;
    pub const HIGH_AUTH: u32 = 0x0008_0000;
    pub const LOW_NO_RIPPLE: u32 = 0x0010_0000;
    pub const HIGH_NO_RIPPLE: u32 = 0x0020_0000;
    pub const LOW_FREEZE: u32 = 0x0040_0000;
    pub const HIGH_FREEZE: u32 = 0x0080_0000;

    // Credential
    pub const ACCEPTED: u32 = 0x0001_0000;
}

fn normalized(value: Decimal) -> Decimal {
    value.normalize()
}

// ---------------------------------------------------------------------------
// AccountRoot
// ---------------------------------------------------------------------------

/// Per-account record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRoot {
    pub account: AccountId,
    pub balance: Drops,
    /// Reserve-counted objects this account owns.
    pub owner_count: u32,
    /// Next sequence number a transaction from this account must carry.
    pub sequence: u32,
    pub flags: u32,
    pub regular_key: Option<AccountId>,
    /// Tickets currently held.
    pub ticket_count: u32,
}

impl AccountRoot {
    pub fn new(account: AccountId, balance: Drops, sequence: u32) -> Self {
        Self {
            account,
            balance,
            owner_count: 0,
            sequence,
            flags: 0,
            regular_key: None,
            ticket_count: 0,
        }
    }

    pub fn has_flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }

    pub fn set_flag(&mut self, flag: u32) {
        self.flags |= flag;
    }

    pub fn clear_flag(&mut self, flag: u32) {
        self.flags &= !flag;
    }
}

impl LedgerEntry for AccountRoot {
    const ENTRY_TYPE: LedgerEntryType = LedgerEntryType::AccountRoot;
}

// ---------------------------------------------------------------------------
// RippleState
// ---------------------------------------------------------------------------

/// A trust line between two accounts for one currency.
///
/// The low account is the byte-wise smaller one. `balance` is stored from
/// the low side: positive means the high account owes the low account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RippleState {
    pub low: AccountId,
    pub high: AccountId,
    pub currency: Currency,
    balance: Decimal,
    low_limit: Decimal,
    high_limit: Decimal,
    pub flags: u32,
}

impl RippleState {
    /// An empty line between `a` and `b`, in either order.
    pub fn new(a: &AccountId, b: &AccountId, currency: Currency) -> Self {
        let (low, high) = if a <= b { (*a, *b) } else { (*b, *a) };
        Self {
            low,
            high,
            currency,
            balance: Decimal::ZERO,
            low_limit: Decimal::ZERO,
            high_limit: Decimal::ZERO,
            flags: 0,
        }
    }

    pub fn is_low(&self, account: &AccountId) -> bool {
        *account == self.low
    }

    pub fn involves(&self, account: &AccountId) -> bool {
        *account == self.low || *account == self.high
    }

    /// The counterparty of `account`.
    pub fn other(&self, account: &AccountId) -> AccountId {
        if self.is_low(account) {
            self.high
        } else {
            self.low
        }
    }

    /// Balance from `account`'s side: positive means `account` holds the
    /// other party's IOUs.
    pub fn balance_for(&self, account: &AccountId) -> Decimal {
        if self.is_low(account) {
            self.balance
        } else {
            -self.balance
        }
    }

    pub fn set_balance_for(&mut self, account: &AccountId, value: Decimal) {
        let low_side = if self.is_low(account) { value } else { -value };
        self.balance = normalized(low_side);
    }

    /// The most `account` is willing to hold of the counterparty's IOUs.
    pub fn limit_for(&self, account: &AccountId) -> Decimal {
        if self.is_low(account) {
            self.low_limit
        } else {
            self.high_limit
        }
    }

    pub fn set_limit_for(&mut self, account: &AccountId, limit: Decimal) {
        if self.is_low(account) {
            self.low_limit = normalized(limit);
        } else {
            self.high_limit = normalized(limit);
        }
    }

    pub fn has_flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }

    pub fn set_flag(&mut self, flag: u32) {
        self.flags |= flag;
    }

    pub fn clear_flag(&mut self, flag: u32) {
        self.flags &= !flag;
    }

    fn side(&self, account: &AccountId, low: u32, high: u32) -> u32 {
        if self.is_low(account) {
            low
        } else {
            high
        }
    }

    /// Set while `account` counts this line against its reserve.
    pub fn reserve_flag(&self, account: &AccountId) -> u32 {
        self.side(account, lsf::LOW_RESERVE, lsf::HIGH_RESERVE)
    }

    /// Set when `account` has authorized the counterparty to hold its IOUs.
    pub fn auth_flag(&self, account: &AccountId) -> u32 {
        self.side(account, lsf::LOW_AUTH, lsf::HIGH_AUTH)
    }

    pub fn no_ripple_flag(&self, account: &AccountId) -> u32 {
        self.side(account, lsf::LOW_NO_RIPPLE, lsf::HIGH_NO_RIPPLE)
    }

    /// Set when `account` has frozen the counterparty's side of the line.
    pub fn freeze_flag(&self, account: &AccountId) -> u32 {
        self.side(account, lsf::LOW_FREEZE, lsf::HIGH_FREEZE)
    }

    /// Whether `account` has frozen this line.
    pub fn is_frozen_by(&self, account: &AccountId) -> bool {
        self.has_flag(self.freeze_flag(account))
    }
}

impl LedgerEntry for RippleState {
    const ENTRY_TYPE: LedgerEntryType = LedgerEntryType::RippleState;
}

// ---------------------------------------------------------------------------
// Check
// ---------------------------------------------------------------------------

/// A deferred payment the destination may cash up to `send_max`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    pub account: AccountId,
    pub destination: AccountId,
    pub send_max: Amount,
    /// Sequence of the CheckCreate that made this check.
    pub sequence: u32,
    pub expiration: Option<NetTime>,
    pub destination_tag: Option<u32>,
    pub source_tag: Option<u32>,
    pub invoice_id: Option<Hash256>,
}

impl LedgerEntry for Check {
    const ENTRY_TYPE: LedgerEntryType = LedgerEntryType::Check;
}

// ---------------------------------------------------------------------------
// Ticket
// ---------------------------------------------------------------------------

/// A sequence number set aside for later, out-of-order use.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub account: AccountId,
    pub ticket_sequence: u32,
}

impl LedgerEntry for Ticket {
    const ENTRY_TYPE: LedgerEntryType = LedgerEntryType::Ticket;
}

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

/// An attestation by `issuer` about `subject`.
///
/// Counts against the issuer's reserve until accepted, then against the
/// subject's.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub subject: AccountId,
    pub issuer: AccountId,
    pub credential_type: Vec<u8>,
    pub expiration: Option<NetTime>,
    pub uri: Option<Vec<u8>>,
    pub flags: u32,
}

impl Credential {
    pub fn is_accepted(&self) -> bool {
        self.flags & lsf::ACCEPTED != 0
    }

    /// The account whose owner count carries this credential.
    pub fn reserve_owner(&self) -> AccountId {
        if self.is_accepted() {
            self.subject
        } else {
            self.issuer
        }
    }
}

impl LedgerEntry for Credential {
    const ENTRY_TYPE: LedgerEntryType = LedgerEntryType::Credential;
}

// ---------------------------------------------------------------------------
// Amm
// ---------------------------------------------------------------------------

/// An automated market maker pool for an asset pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amm {
    /// Pseudo-account that owns the pool.
    pub account: AccountId,
    pub asset: Issue,
    pub asset2: Issue,
    /// Pool holdings of `asset`.
    pub amount: Amount,
    /// Pool holdings of `asset2`.
    pub amount2: Amount,
    /// Basis points, 0 to 1000.
    pub trading_fee: u16,
    pub lp_token_balance: Decimal,
    pub creator: AccountId,
}

impl Amm {
    /// Native drops held by the pool across both sides.
    pub fn native_holdings(&self) -> Drops {
        let side = |a: &Amount| a.as_drops().unwrap_or(Drops::ZERO);
        side(&self.amount)
            .checked_add(side(&self.amount2))
            .unwrap_or(Drops::new(u64::MAX))
    }
}

impl LedgerEntry for Amm {
    const ENTRY_TYPE: LedgerEntryType = LedgerEntryType::Amm;
}

// ---------------------------------------------------------------------------
// DirectoryNode
// ---------------------------------------------------------------------------

/// Keys of every object an account owns, in insertion order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryNode {
    pub owner: AccountId,
    pub indexes: Vec<Hash256>,
}

impl LedgerEntry for DirectoryNode {
    const ENTRY_TYPE: LedgerEntryType = LedgerEntryType::DirectoryNode;
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn acct(b: u8) -> AccountId {
        AccountId::from_bytes([b; 20])
    }

    #[test]
    fn ripple_state_orders_sides() {
        let usd = Currency::from_code("USD").unwrap();
        let line = RippleState::new(&acct(9), &acct(1), usd);
        assert_eq!(line.low, acct(1));
        assert_eq!(line.high, acct(9));
        assert!(line.involves(&acct(9)));
        assert!(!line.involves(&acct(5)));
        assert_eq!(line.other(&acct(1)), acct(9));
    }

    #[test]
    fn balance_is_mirrored() {
        let usd = Currency::from_code("USD").unwrap();
        let mut line = RippleState::new(&acct(1), &acct(2), usd);
        line.set_balance_for(&acct(2), dec!(25));
        assert_eq!(line.balance_for(&acct(2)), dec!(25));
        assert_eq!(line.balance_for(&acct(1)), dec!(-25));
    }

    #[test]
    fn side_flags_follow_ordering() {
        let usd = Currency::from_code("USD").unwrap();
        let mut line = RippleState::new(&acct(1), &acct(2), usd);
        assert_eq!(line.freeze_flag(&acct(1)), lsf::LOW_FREEZE);
        assert_eq!(line.freeze_flag(&acct(2)), lsf::HIGH_FREEZE);
        line.set_flag(line.freeze_flag(&acct(2)));
        assert!(line.is_frozen_by(&acct(2)));
        assert!(!line.is_frozen_by(&acct(1)));
    }

    #[test]
    fn limits_are_per_side() {
        let usd = Currency::from_code("USD").unwrap();
        let mut line = RippleState::new(&acct(1), &acct(2), usd);
        line.set_limit_for(&acct(2), dec!(100));
        assert_eq!(line.limit_for(&acct(2)), dec!(100));
        assert_eq!(line.limit_for(&acct(1)), Decimal::ZERO);
    }

    #[test]
    fn account_flags() {
        let mut root = AccountRoot::new(acct(1), Drops::new(10), 1);
        root.set_flag(lsf::REQUIRE_DEST_TAG);
        assert!(root.has_flag(lsf::REQUIRE_DEST_TAG));
        root.clear_flag(lsf::REQUIRE_DEST_TAG);
        assert!(!root.has_flag(lsf::REQUIRE_DEST_TAG));
    }

    #[test]
    fn credential_reserve_moves_on_accept() {
        let mut cred = Credential {
            subject: acct(1),
            issuer: acct(2),
            credential_type: b"KYC".to_vec(),
            expiration: None,
            uri: None,
            flags: 0,
        };
        assert_eq!(cred.reserve_owner(), acct(2));
        cred.flags |= lsf::ACCEPTED;
        assert_eq!(cred.reserve_owner(), acct(1));
    }
}
