use serde::{Deserialize, Serialize};
use xrpl_types::{Amendment, Drops, NetTime, Rules};

use crate::error::EngineError;

/// Network fee and reserve parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fees {
    /// Minimum fee of a reference transaction.
    pub base_fee: Drops,
    /// Reserve every account must hold.
    pub reserve_base: Drops,
    /// Extra reserve per owned object.
    pub reserve_increment: Drops,
}

impl Default for Fees {
    fn default() -> Self {
        Self {
            base_fee: Drops::new(10),
            reserve_base: Drops::from_xrp(1),
            reserve_increment: Drops::new(200_000),
        }
    }
}

impl Fees {
    /// `reserve_base + owner_count * reserve_increment`, saturating.
    pub fn account_reserve(&self, owner_count: u32) -> Drops {
        let extra = self
            .reserve_increment
            .checked_mul(u64::from(owner_count))
            .unwrap_or(Drops::new(u64::MAX));
        self.reserve_base
            .checked_add(extra)
            .unwrap_or(Drops::new(u64::MAX))
    }
}

/// Configuration for one engine instance, fixed for the ledger being built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Enabled amendments. `None` skips amendment gating entirely and
    /// treats every amendment-dependent behavior as enabled. TOML cannot
    /// express `None`; build such configs in code.
    pub rules: Option<Rules>,
    /// Skip the signature stage. Test harnesses only.
    pub skip_signature_verification: bool,
    #[serde(flatten)]
    pub fees: Fees,
    /// Close time of the parent ledger; expirations are judged against it.
    pub parent_close_time: NetTime,
    /// Sequence of the ledger being built.
    pub ledger_sequence: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rules: Some(Rules::all_known()),
            skip_signature_verification: false,
            fees: Fees::default(),
            parent_close_time: NetTime::default(),
            ledger_sequence: 1,
        }
    }
}

impl EngineConfig {
    /// A configuration with gating disabled and signatures unchecked, for
    /// replaying legacy history and for tests.
    pub fn ungated() -> Self {
        Self {
            rules: None,
            skip_signature_verification: true,
            ..Default::default()
        }
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, EngineError> {
        toml::from_str(s).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Whether an amendment is in force. With no ruleset, everything is.
    pub fn enabled(&self, amendment: Amendment) -> bool {
        self.rules.as_ref().map_or(true, |rules| rules.has(amendment))
    }
}
