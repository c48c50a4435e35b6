use std::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::account::AccountId;
use crate::error::TypeError;

/// Drops per XRP.
pub const DROPS_PER_XRP: u64 = 1_000_000;

/// Total native supply in drops; no balance may ever exceed it.
pub const MAX_NATIVE_DROPS: u64 = 100_000_000_000 * DROPS_PER_XRP;

/// Characters rippled accepts in a three-letter currency code.
const CURRENCY_CODE_CHARS: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789<>(){}[]|?!@#$%^&*";

// ---------------------------------------------------------------------------
// Drops
// ---------------------------------------------------------------------------

/// An amount of the native currency in its smallest unit.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Drops(u64);

impl Drops {
    pub const ZERO: Self = Self(0);

    pub const fn new(drops: u64) -> Self {
        Self(drops)
    }

    /// Whole XRP to drops (saturating at `u64::MAX`).
    pub const fn from_xrp(xrp: u64) -> Self {
        Self(xrp.saturating_mul(DROPS_PER_XRP))
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    pub fn checked_mul(self, factor: u64) -> Option<Self> {
        self.0.checked_mul(factor).map(Self)
    }
}

impl fmt::Debug for Drops {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Drops({})", self.0)
    }
}

impl fmt::Display for Drops {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} drops", self.0)
    }
}

// ---------------------------------------------------------------------------
// Currency
// ---------------------------------------------------------------------------

/// A 160-bit currency code.
///
/// The all-zero value is the native currency. Standard three-letter codes
/// occupy bytes 12..15 with every other byte zero.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Currency([u8; 20]);

impl Currency {
    /// The native currency.
    pub const NATIVE: Self = Self([0u8; 20]);

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// The standard-format encoding of `"XRP"`. It is never a valid issued
    /// currency because it would be confused with the native one.
    pub const fn bad() -> Self {
        let mut bytes = [0u8; 20];
        bytes[12] = b'X';
        bytes[13] = b'R';
        bytes[14] = b'P';
        Self(bytes)
    }

    /// Encode a three-letter code in standard format.
    ///
    /// `"XRP"` encodes to [`Currency::bad`], not to the native currency.
    pub fn from_code(code: &str) -> Result<Self, TypeError> {
        if code.len() != 3 || !code.chars().all(|c| CURRENCY_CODE_CHARS.contains(c)) {
            return Err(TypeError::InvalidCurrency(code.to_string()));
        }
        let mut bytes = [0u8; 20];
        bytes[12..15].copy_from_slice(code.as_bytes());
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_native(&self) -> bool {
        self.0 == [0u8; 20]
    }

    pub fn is_bad(&self) -> bool {
        *self == Self::bad()
    }

    /// Returns `true` if only bytes 12..15 are populated.
    pub fn is_standard(&self) -> bool {
        self.0[..12].iter().all(|b| *b == 0) && self.0[15..].iter().all(|b| *b == 0)
    }

    /// Human-readable code: `XRP`, a three-letter code, or 40 hex characters.
    pub fn code(&self) -> String {
        if self.is_native() {
            return "XRP".into();
        }
        if self.is_standard() {
            if let Ok(code) = std::str::from_utf8(&self.0[12..15]) {
                return code.to_string();
            }
        }
        hex::encode_upper(self.0)
    }
}

impl fmt::Debug for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Currency({})", self.code())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ---------------------------------------------------------------------------
// Issue
// ---------------------------------------------------------------------------

/// A currency together with the account that issues it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Issue {
    pub currency: Currency,
    pub issuer: AccountId,
}

impl Issue {
    pub const fn native() -> Self {
        Self {
            currency: Currency::NATIVE,
            issuer: AccountId::ZERO,
        }
    }

    pub const fn new(currency: Currency, issuer: AccountId) -> Self {
        Self { currency, issuer }
    }

    pub fn is_native(&self) -> bool {
        self.currency.is_native()
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_native() {
            write!(f, "XRP")
        } else {
            write!(f, "{}/{}", self.currency, self.issuer)
        }
    }
}

// ---------------------------------------------------------------------------
// Amount
// ---------------------------------------------------------------------------

/// A signed decimal quantity of an issued currency.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssuedAmount {
    pub value: Decimal,
    pub currency: Currency,
    pub issuer: AccountId,
}

impl IssuedAmount {
    pub fn issue(&self) -> Issue {
        Issue::new(self.currency, self.issuer)
    }
}

/// A quantity of either the native currency or an issued currency.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Amount {
    Native(Drops),
    Issued(IssuedAmount),
}

impl Amount {
    /// A native amount in drops.
    pub const fn drops(drops: u64) -> Self {
        Self::Native(Drops::new(drops))
    }

    /// An issued amount.
    pub fn issued(value: Decimal, currency: Currency, issuer: AccountId) -> Self {
        Self::Issued(IssuedAmount {
            value,
            currency,
            issuer,
        })
    }

    /// A zero amount of the given issue.
    pub fn zero_of(issue: Issue) -> Self {
        if issue.is_native() {
            Self::Native(Drops::ZERO)
        } else {
            Self::issued(Decimal::ZERO, issue.currency, issue.issuer)
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native(_))
    }

    pub fn issue(&self) -> Issue {
        match self {
            Self::Native(_) => Issue::native(),
            Self::Issued(iou) => iou.issue(),
        }
    }

    pub fn currency(&self) -> Currency {
        self.issue().currency
    }

    /// The issuer, or [`AccountId::ZERO`] for native amounts.
    pub fn issuer(&self) -> AccountId {
        self.issue().issuer
    }

    pub fn as_drops(&self) -> Option<Drops> {
        match self {
            Self::Native(drops) => Some(*drops),
            Self::Issued(_) => None,
        }
    }

    pub fn as_issued(&self) -> Option<&IssuedAmount> {
        match self {
            Self::Native(_) => None,
            Self::Issued(iou) => Some(iou),
        }
    }

    /// The numeric value; native amounts are expressed in drops.
    pub fn value(&self) -> Decimal {
        match self {
            Self::Native(drops) => Decimal::from(drops.as_u64()),
            Self::Issued(iou) => iou.value,
        }
    }

    /// Same issue, different value. Native amounts truncate to whole drops
    /// and clamp negatives to zero.
    pub fn with_value(&self, value: Decimal) -> Self {
        match self {
            Self::Native(_) => {
                let drops = value.trunc().max(Decimal::ZERO);
                Self::Native(Drops::new(drops.to_u64().unwrap_or(u64::MAX)))
            }
            Self::Issued(iou) => Self::issued(value, iou.currency, iou.issuer),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.value().is_zero()
    }

    /// Strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.value() > Decimal::ZERO
    }

    /// Within the range the network can represent.
    pub fn is_legal(&self) -> bool {
        match self {
            Self::Native(drops) => drops.as_u64() <= MAX_NATIVE_DROPS,
            Self::Issued(iou) => iou.value.scale() <= 15,
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native(drops) => write!(f, "{drops}"),
            Self::Issued(iou) => write!(f, "{}/{}/{}", iou.value, iou.currency, iou.issuer),
        }
    }
}
