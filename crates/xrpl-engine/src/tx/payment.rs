use serde::{Deserialize, Serialize};
use xrpl_crypto::Keylet;
use xrpl_store::{lsf, AccountRoot, LedgerViewExt};
use xrpl_types::{AccountId, Amount, Drops, Hash256, ResultCode};

use super::check_amount;
use crate::accounts::{load_account, read_account, transfer_drops};
use crate::error::{reject, TxResult};
use crate::flow::SettleRequest;
use crate::transaction::{tf, TxType};
use crate::transactor::{ApplyContext, PreclaimContext, PreflightContext, Transactor};

/// Send value to another account: native directly, issued currencies
/// through the flow settler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub destination: AccountId,
    pub amount: Amount,
    pub send_max: Option<Amount>,
    pub deliver_min: Option<Amount>,
    pub destination_tag: Option<u32>,
    pub invoice_id: Option<Hash256>,
}

impl Payment {
    /// A plain payment with no optional fields.
    pub fn new(destination: AccountId, amount: Amount) -> Self {
        Self {
            destination,
            amount,
            send_max: None,
            deliver_min: None,
            destination_tag: None,
            invoice_id: None,
        }
    }

    fn is_native_direct(&self) -> bool {
        self.amount.is_native() && self.send_max.as_ref().map_or(true, Amount::is_native)
    }
}

impl Transactor for Payment {
    fn tx_type(&self) -> TxType {
        TxType::Payment
    }

    fn legal_flags(&self) -> u32 {
        tf::UNIVERSAL | tf::NO_RIPPLE_DIRECT | tf::PARTIAL_PAYMENT | tf::LIMIT_QUALITY
    }

    fn preflight(&self, ctx: &PreflightContext<'_>) -> TxResult<()> {
        let flags = ctx.common.flags;
        let partial = flags & tf::PARTIAL_PAYMENT != 0;

        check_amount(&self.amount, "Amount")?;
        if let Some(send_max) = &self.send_max {
            check_amount(send_max, "SendMax")?;
        }
        if self.destination.is_zero() {
            return reject(ResultCode::TemDstNeeded, "no destination");
        }
        let source_issue = self.send_max.as_ref().unwrap_or(&self.amount).issue();
        if self.destination == ctx.common.account && source_issue == self.amount.issue() {
            return reject(ResultCode::TemRedundant, "payment to self");
        }

        if self.is_native_direct() {
            if self.send_max.is_some() {
                return reject(ResultCode::TemBadSendXrpMax, "SendMax on a native payment");
            }
            if partial {
                return reject(ResultCode::TemBadSendXrpPartial, "partial native payment");
            }
            if flags & tf::LIMIT_QUALITY != 0 {
                return reject(ResultCode::TemBadSendXrpLimit, "limit quality on a native payment");
            }
            if flags & tf::NO_RIPPLE_DIRECT != 0 {
                return reject(ResultCode::TemBadSendXrpNoDirect, "no-direct on a native payment");
            }
        }

        if let Some(min) = &self.deliver_min {
            if !partial {
                return reject(ResultCode::TemBadAmount, "DeliverMin needs a partial payment");
            }
            check_amount(min, "DeliverMin")?;
            if min.issue() != self.amount.issue() || min.value() > self.amount.value() {
                return reject(ResultCode::TemBadAmount, "DeliverMin must not exceed Amount");
            }
        }
        Ok(())
    }

    fn preclaim(&self, ctx: &PreclaimContext<'_>) -> TxResult<()> {
        let partial = ctx.common.flags & tf::PARTIAL_PAYMENT != 0;
        match read_account(ctx.view, &self.destination)? {
            None => {
                if !self.amount.is_native() {
                    return reject(ResultCode::TecNoDst, "issued payment to a missing account");
                }
                if partial {
                    return reject(ResultCode::TelNoDstPartial, "partial payment cannot create an account");
                }
                let reserve = ctx.config.fees.reserve_base;
                if self.amount.as_drops().unwrap_or_default() < reserve {
                    return reject(
                        ResultCode::TecNoDstInsufXrp,
                        format!("creating an account takes at least {reserve}"),
                    );
                }
            }
            Some(dest) => {
                if dest.has_flag(lsf::REQUIRE_DEST_TAG) && self.destination_tag.is_none() {
                    return reject(ResultCode::TecDstTagNeeded, "destination requires a tag");
                }
                if dest.has_flag(lsf::DEPOSIT_AUTH) && self.destination != ctx.account() {
                    return reject(ResultCode::TecNoPermission, "destination requires deposit authorization");
                }
            }
        }
        Ok(())
    }

    fn do_apply(&self, ctx: &mut ApplyContext<'_, '_>) -> TxResult<()> {
        let account = ctx.account();

        if self.is_native_direct() {
            let amount = self.amount.as_drops().unwrap_or_default();
            let root = load_account(&*ctx.view, &account)?;
            let reserve = ctx.fees().account_reserve(root.owner_count);
            let fee = ctx.common.fee.as_drops().unwrap_or_default();
            let needed = amount.checked_add(reserve.max(fee)).unwrap_or(Drops::new(u64::MAX));
            if ctx.prior_balance < needed {
                return reject(
                    ResultCode::TecUnfundedPayment,
                    format!("balance {} cannot cover {amount} above reserve", ctx.prior_balance),
                );
            }

            let dest_keylet = Keylet::account(&self.destination);
            if read_account(&*ctx.view, &self.destination)?.is_none() {
                let root = AccountRoot::new(self.destination, Drops::ZERO, ctx.config.ledger_sequence);
                ctx.view.insert_entry(&dest_keylet, &root)?;
                tracing::debug!(account = %self.destination, "account created");
            }
            transfer_drops(ctx.view, &account, &self.destination, amount)?;
            ctx.delivered = Some(self.amount.clone());
            return Ok(());
        }

        let request = SettleRequest {
            source: account,
            destination: self.destination,
            deliver: self.amount.clone(),
            send_max: self.send_max.clone(),
            partial: ctx.common.flags & tf::PARTIAL_PAYMENT != 0,
            deliver_min: self.deliver_min.clone(),
        };
        let outcome = ctx.settler.settle(&*ctx.view, &request);
        if !outcome.is_success() {
            return reject(
                outcome.result,
                outcome.diagnostic.unwrap_or_else(|| "settlement failed".into()),
            );
        }
        outcome.changes.apply_to(&mut *ctx.view)?;
        ctx.delivered = Some(outcome.delivered);
        Ok(())
    }
}
