use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use xrpl_store::lsf;
use xrpl_types::{Amendment, Amount, ResultCode};

use crate::accounts::read_account;
use crate::error::{reject, TxResult};
use crate::transaction::TxType;
use crate::transactor::{ApplyContext, PreclaimContext, PreflightContext, Transactor};
use crate::trustline::{credit_holder, read_line};

/// An issuer takes back up to `amount` of its IOUs from a holder.
///
/// `amount.issuer` names the holder, not the issuer; the issuer is the
/// transaction's account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clawback {
    pub amount: Amount,
}

impl Transactor for Clawback {
    fn tx_type(&self) -> TxType {
        TxType::Clawback
    }

    fn required_amendments(&self) -> &'static [Amendment] {
        &[Amendment::CLAWBACK]
    }

    fn preflight(&self, ctx: &PreflightContext<'_>) -> TxResult<()> {
        if self.amount.is_native() || !self.amount.is_legal() || !self.amount.is_positive() {
            return reject(ResultCode::TemBadAmount, "clawback amount must be a positive IOU");
        }
        if self.amount.issuer() == ctx.common.account {
            return reject(ResultCode::TemBadAmount, "cannot claw back from self");
        }
        Ok(())
    }

    fn preclaim(&self, ctx: &PreclaimContext<'_>) -> TxResult<()> {
        let issuer = ctx.account();
        let holder = self.amount.issuer();
        let currency = self.amount.currency();

        let Some(issuer_root) = read_account(ctx.view, &issuer)? else {
            return reject(ResultCode::TerNoAccount, format!("{issuer} does not exist"));
        };
        if !issuer_root.has_flag(lsf::ALLOW_TRUSTLINE_CLAWBACK) || issuer_root.has_flag(lsf::NO_FREEZE) {
            return reject(ResultCode::TecNoPermission, "issuer has not enabled clawback");
        }
        if read_account(ctx.view, &holder)?.is_none() {
            return reject(ResultCode::TerNoAccount, format!("holder {holder} does not exist"));
        }
        let Some(line) = read_line(ctx.view, &holder, &issuer, &currency)? else {
            return reject(ResultCode::TecNoLine, format!("{holder} has no {currency} line"));
        };
        if line.balance_for(&holder) <= Decimal::ZERO {
            return reject(ResultCode::TecInsufficientFunds, format!("{holder} holds no {currency}"));
        }
        Ok(())
    }

    fn do_apply(&self, ctx: &mut ApplyContext<'_, '_>) -> TxResult<()> {
        let issuer = ctx.account();
        let holder = self.amount.issuer();
        let currency = self.amount.currency();

        let held = read_line(&*ctx.view, &holder, &issuer, &currency)?
            .map(|line| line.balance_for(&holder))
            .unwrap_or(Decimal::ZERO);
        let clawed = self.amount.value().min(held);
        credit_holder(ctx.view, &holder, &issuer, &currency, -clawed)?;
        tracing::debug!(issuer = %issuer, holder = %holder, amount = %clawed, "clawed back");
        Ok(())
    }
}
