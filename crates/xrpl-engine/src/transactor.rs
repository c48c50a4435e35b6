use xrpl_store::{ReadView, Sandbox};
use xrpl_types::{AccountId, Amendment, Amount, Drops, NetTime};

use crate::config::{EngineConfig, Fees};
use crate::error::TxResult;
use crate::flow::FlowSettler;
use crate::transaction::{tf, CommonFields, TxType};

// ---------------------------------------------------------------------------
// Contexts
// ---------------------------------------------------------------------------

/// What a stateless check may look at: the transaction and the config.
pub struct PreflightContext<'a> {
    pub common: &'a CommonFields,
    pub config: &'a EngineConfig,
}

impl PreflightContext<'_> {
    pub fn enabled(&self, amendment: Amendment) -> bool {
        self.config.enabled(amendment)
    }
}

/// Read-only access to ledger state for preclaim checks.
pub struct PreclaimContext<'a> {
    pub view: &'a dyn ReadView,
    pub common: &'a CommonFields,
    pub config: &'a EngineConfig,
}

impl PreclaimContext<'_> {
    pub fn account(&self) -> AccountId {
        self.common.account
    }

    pub fn enabled(&self, amendment: Amendment) -> bool {
        self.config.enabled(amendment)
    }

    pub fn close_time(&self) -> NetTime {
        self.config.parent_close_time
    }
}

/// Mutable access for the apply step.
///
/// The fee has already been taken and the sequence or ticket consumed when
/// a transactor sees this.
pub struct ApplyContext<'a, 'v> {
    pub view: &'a mut Sandbox<'v>,
    pub common: &'a CommonFields,
    pub config: &'a EngineConfig,
    pub settler: &'a dyn FlowSettler,
    /// Sender balance before the fee was taken. Reserve checks use this.
    pub prior_balance: Drops,
    pub fee_paid: Drops,
    /// Set by transactors that report what they delivered.
    pub delivered: Option<Amount>,
}

impl ApplyContext<'_, '_> {
    pub fn account(&self) -> AccountId {
        self.common.account
    }

    pub fn enabled(&self, amendment: Amendment) -> bool {
        self.config.enabled(amendment)
    }

    pub fn fees(&self) -> &Fees {
        &self.config.fees
    }

    pub fn close_time(&self) -> NetTime {
        self.config.parent_close_time
    }
}

// ---------------------------------------------------------------------------
// Transactor trait
// ---------------------------------------------------------------------------

/// The contract every transaction type implements.
///
/// The engine drives the phases in order and stops at the first failure:
/// amendment gating, [`Transactor::preflight`], signature,
/// [`Transactor::preclaim`], then [`Transactor::do_apply`] inside a
/// sandbox. Shared checks (sequence, fee, flags) run in the engine, so
/// implementations only state what is specific to their type.
pub trait Transactor {
    fn tx_type(&self) -> TxType;

    /// Amendments that must all be enabled for this type to be legal.
    fn required_amendments(&self) -> &'static [Amendment] {
        &[]
    }

    /// Flag bits this type accepts. Any other bit is `temINVALID_FLAG`.
    fn legal_flags(&self) -> u32 {
        tf::UNIVERSAL
    }

    /// Smallest fee this type may pay.
    fn minimum_fee(&self, fees: &Fees) -> Drops {
        fees.base_fee
    }

    /// Stateless field checks.
    fn preflight(&self, ctx: &PreflightContext<'_>) -> TxResult<()>;

    /// Read-only checks against current state.
    fn preclaim(&self, _ctx: &PreclaimContext<'_>) -> TxResult<()> {
        Ok(())
    }

    /// Mutate state. Anything written before an `Err` is discarded.
    fn do_apply(&self, ctx: &mut ApplyContext<'_, '_>) -> TxResult<()>;
}
