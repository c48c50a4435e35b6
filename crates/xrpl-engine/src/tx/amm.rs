use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};
use xrpl_crypto::Keylet;
use xrpl_store::{Amm, LedgerViewExt};
use xrpl_types::{Amendment, Amount, Drops, ResultCode};

use super::check_amount;
use crate::accounts::{load_account, read_account, write_account, xrp_liquid};
use crate::config::Fees;
use crate::error::{reject, TxFailure, TxResult};
use crate::transaction::TxType;
use crate::transactor::{ApplyContext, PreclaimContext, PreflightContext, Transactor};
use crate::trustline::{credit_holder, holdings, is_frozen};

/// Highest trading fee a pool may charge, in basis points.
pub const MAX_TRADING_FEE: u16 = 1000;

/// Create a pool for the pair of `amount` and `amount2`, funded with both.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmmCreate {
    pub amount: Amount,
    pub amount2: Amount,
    pub trading_fee: u16,
}

impl AmmCreate {
    /// Initial LP token supply: the geometric mean of the deposits.
    fn lp_tokens(&self) -> Option<Decimal> {
        self.amount.value().checked_mul(self.amount2.value())?.sqrt()
    }
}

impl Transactor for AmmCreate {
    fn tx_type(&self) -> TxType {
        TxType::AmmCreate
    }

    fn required_amendments(&self) -> &'static [Amendment] {
        &[Amendment::AMM, Amendment::FIX_UNIVERSAL_NUMBER]
    }

    /// Creating a pool costs one owner reserve.
    fn minimum_fee(&self, fees: &Fees) -> Drops {
        fees.reserve_increment
    }

    fn preflight(&self, _ctx: &PreflightContext<'_>) -> TxResult<()> {
        if !self.amount.is_native() {
            check_amount(&self.amount, "Amount")?;
        } else if !self.amount.is_positive() || !self.amount.is_legal() {
            return reject(ResultCode::TemBadAmount, "Amount must be positive");
        }
        if !self.amount2.is_native() {
            check_amount(&self.amount2, "Amount2")?;
        } else if !self.amount2.is_positive() || !self.amount2.is_legal() {
            return reject(ResultCode::TemBadAmount, "Amount2 must be positive");
        }
        if self.amount.issue() == self.amount2.issue() {
            return reject(ResultCode::TemBadAmmTokens, "pool assets must differ");
        }
        if self.trading_fee > MAX_TRADING_FEE {
            return reject(
                ResultCode::TemBadFee,
                format!("trading fee {} above {MAX_TRADING_FEE}", self.trading_fee),
            );
        }
        Ok(())
    }

    fn preclaim(&self, ctx: &PreclaimContext<'_>) -> TxResult<()> {
        let account = ctx.account();
        let keylet = Keylet::amm(&self.amount.issue(), &self.amount2.issue());
        if ctx.view.exists(&keylet)? {
            return reject(ResultCode::TecDuplicate, "pool already exists");
        }

        for deposit in [&self.amount, &self.amount2] {
            if deposit.is_native() {
                continue;
            }
            let issue = deposit.issue();
            if read_account(ctx.view, &issue.issuer)?.is_none() {
                return reject(ResultCode::TecNoIssuer, format!("issuer of {issue} does not exist"));
            }
            if is_frozen(ctx.view, &account, &issue)? {
                return reject(ResultCode::TecFrozen, format!("{issue} is frozen"));
            }
            // An issuer can deposit any amount of its own currency.
            if account != issue.issuer && holdings(ctx.view, &account, &issue)? < deposit.value() {
                return reject(ResultCode::TecUnfundedAmm, format!("not enough {issue} to deposit"));
            }
        }
        Ok(())
    }

    fn do_apply(&self, ctx: &mut ApplyContext<'_, '_>) -> TxResult<()> {
        let account = ctx.account();
        let native: Drops = [&self.amount, &self.amount2]
            .into_iter()
            .filter_map(Amount::as_drops)
            .fold(Drops::ZERO, |sum, d| sum.checked_add(d).unwrap_or(Drops::new(u64::MAX)));

        if xrp_liquid(&*ctx.view, &account, 0, ctx.fees())? < native {
            return reject(ResultCode::TecUnfundedAmm, format!("cannot deposit {native} above reserve"));
        }
        let Some(lp_tokens) = self.lp_tokens() else {
            return reject(ResultCode::TecUnfundedAmm, "deposit too large to price");
        };

        if !native.is_zero() {
            let mut root = load_account(&*ctx.view, &account)?;
            root.balance = root.balance.checked_sub(native).ok_or_else(|| {
                TxFailure::new(ResultCode::TecUnfundedAmm, "balance cannot cover deposit")
            })?;
            write_account(ctx.view, &root)?;
        }
        for deposit in [&self.amount, &self.amount2] {
            if let Some(iou) = deposit.as_issued() {
                if iou.issuer != account {
                    credit_holder(ctx.view, &account, &iou.issuer, &iou.currency, -iou.value)?;
                }
            }
        }

        let keylet = Keylet::amm(&self.amount.issue(), &self.amount2.issue());
        let pool = Amm {
            account: Keylet::amm_account(&keylet),
            asset: self.amount.issue(),
            asset2: self.amount2.issue(),
            amount: self.amount.clone(),
            amount2: self.amount2.clone(),
            trading_fee: self.trading_fee,
            lp_token_balance: lp_tokens,
            creator: account,
        };
        ctx.view.insert_entry(&keylet, &pool)?;
        tracing::debug!(
            creator = %account,
            pool = %pool.account,
            lp_tokens = %lp_tokens,
            "AMM created"
        );
        Ok(())
    }
}
