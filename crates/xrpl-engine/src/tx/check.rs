//! Checks: deferred payments the destination may cash later.
//!
//! A check moves through `NonExistent -> Active -> {Cashed, Cancelled}`.
//! CheckCreate makes it, CheckCash or CheckCancel removes it, and in every
//! case the creator's owner count carries it while it exists.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use xrpl_crypto::Keylet;
use xrpl_store::{
    dir_insert, dir_remove, lsf, Check, LedgerView, LedgerViewExt, ReadView, ReadViewExt,
};
use xrpl_types::{AccountId, Amendment, Amount, Hash256, LedgerEntryType, NetTime, ResultCode};

use super::check_amount;
use crate::accounts::{
    adjust_owner_count, check_reserve, load_account, read_account, transfer_drops, xrp_liquid,
};
use crate::error::{reject, TxResult};
use crate::flow::SettleRequest;
use crate::transaction::TxType;
use crate::transactor::{ApplyContext, PreclaimContext, PreflightContext, Transactor};
use crate::trustline::{create_line, is_frozen, is_global_frozen, read_line, requires_auth, write_line};

const CHECKS: &[Amendment] = &[Amendment::CHECKS];

fn expired(expiration: Option<NetTime>, now: NetTime) -> bool {
    expiration.is_some_and(|at| now.has_passed(at))
}

fn read_check<V: ReadView + ?Sized>(view: &V, check_id: &Hash256) -> TxResult<Option<Check>> {
    Ok(view.read_entry(&Keylet::new(LedgerEntryType::Check, *check_id))?)
}

/// Remove a check from both directories and release the creator's reserve.
fn delete_check<V: LedgerView + ?Sized>(view: &mut V, check_id: &Hash256, check: &Check) -> TxResult<()> {
    if check.destination != check.account {
        dir_remove(view, &check.destination, check_id)?;
    }
    dir_remove(view, &check.account, check_id)?;
    view.erase(&Keylet::new(LedgerEntryType::Check, *check_id))?;
    adjust_owner_count(view, &check.account, -1)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// CheckCreate
// ---------------------------------------------------------------------------

/// Create a check payable to `destination` for up to `send_max`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckCreate {
    pub destination: AccountId,
    pub send_max: Amount,
    pub expiration: Option<NetTime>,
    pub destination_tag: Option<u32>,
    pub invoice_id: Option<Hash256>,
}

impl Transactor for CheckCreate {
    fn tx_type(&self) -> TxType {
        TxType::CheckCreate
    }

    fn required_amendments(&self) -> &'static [Amendment] {
        CHECKS
    }

    fn preflight(&self, ctx: &PreflightContext<'_>) -> TxResult<()> {
        if self.destination == ctx.common.account {
            return reject(ResultCode::TemRedundant, "check to self");
        }
        check_amount(&self.send_max, "SendMax")?;
        if self.expiration == Some(NetTime::new(0)) {
            return reject(ResultCode::TemBadExpiration, "expiration must be nonzero");
        }
        Ok(())
    }

    fn preclaim(&self, ctx: &PreclaimContext<'_>) -> TxResult<()> {
        let Some(dest) = read_account(ctx.view, &self.destination)? else {
            return reject(ResultCode::TecNoDst, format!("{} does not exist", self.destination));
        };
        if ctx.enabled(Amendment::DISALLOW_INCOMING) && dest.has_flag(lsf::DISALLOW_INCOMING_CHECK) {
            return reject(ResultCode::TecNoPermission, "destination refuses checks");
        }
        if dest.has_flag(lsf::REQUIRE_DEST_TAG) && self.destination_tag.is_none() {
            return reject(ResultCode::TecDstTagNeeded, "destination requires a tag");
        }

        if let Some(iou) = self.send_max.as_issued() {
            let issue = iou.issue();
            if is_global_frozen(ctx.view, &issue.issuer)? {
                return reject(ResultCode::TecFrozen, format!("{} is globally frozen", issue.currency));
            }
            for party in [ctx.account(), self.destination] {
                if party == issue.issuer {
                    continue;
                }
                let frozen = read_line(ctx.view, &party, &issue.issuer, &issue.currency)?
                    .is_some_and(|line| line.is_frozen_by(&issue.issuer));
                if frozen {
                    return reject(ResultCode::TecFrozen, format!("{party}'s line is frozen"));
                }
            }
        }

        if expired(self.expiration, ctx.close_time()) {
            return reject(ResultCode::TecExpired, "expiration already passed");
        }
        Ok(())
    }

    fn do_apply(&self, ctx: &mut ApplyContext<'_, '_>) -> TxResult<()> {
        let account = ctx.account();
        let root = load_account(&*ctx.view, &account)?;
        check_reserve(ctx.prior_balance, root.owner_count.saturating_add(1), ctx.fees())?;

        let sequence = ctx.common.seq_proxy();
        let keylet = Keylet::check(&account, sequence);
        let check = Check {
            account,
            destination: self.destination,
            send_max: self.send_max.clone(),
            sequence,
            expiration: self.expiration,
            destination_tag: self.destination_tag,
            source_tag: ctx.common.source_tag,
            invoice_id: self.invoice_id,
        };
        ctx.view.insert_entry(&keylet, &check)?;
        dir_insert(ctx.view, &self.destination, keylet.key)?;
        dir_insert(ctx.view, &account, keylet.key)?;
        adjust_owner_count(ctx.view, &account, 1)?;
        tracing::debug!(check = %keylet.key.short_hex(), destination = %self.destination, "check created");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CheckCash
// ---------------------------------------------------------------------------

/// Cash a check. Exactly one of `amount` (exact) or `deliver_min` (at
/// least this much, as much as possible up to `SendMax`) is set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckCash {
    pub check_id: Hash256,
    pub amount: Option<Amount>,
    pub deliver_min: Option<Amount>,
}

impl CheckCash {
    fn requested(&self) -> Option<&Amount> {
        self.amount.as_ref().or(self.deliver_min.as_ref())
    }
}

impl Transactor for CheckCash {
    fn tx_type(&self) -> TxType {
        TxType::CheckCash
    }

    fn required_amendments(&self) -> &'static [Amendment] {
        CHECKS
    }

    fn preflight(&self, _ctx: &PreflightContext<'_>) -> TxResult<()> {
        let value = match (&self.amount, &self.deliver_min) {
            (Some(value), None) | (None, Some(value)) => value,
            _ => return reject(ResultCode::TemMalformed, "need exactly one of Amount and DeliverMin"),
        };
        check_amount(value, "Amount")
    }

    fn preclaim(&self, ctx: &PreclaimContext<'_>) -> TxResult<()> {
        let Some(check) = read_check(ctx.view, &self.check_id)? else {
            return reject(ResultCode::TecNoEntry, format!("check {} not found", self.check_id.short_hex()));
        };
        let account = ctx.account();
        if check.destination != account {
            return reject(ResultCode::TecNoPermission, "only the destination may cash a check");
        }
        let (Some(_), Some(dest)) = (
            read_account(ctx.view, &check.account)?,
            read_account(ctx.view, &check.destination)?,
        ) else {
            return reject(ResultCode::TecNoEntry, "check parties are missing");
        };
        if dest.has_flag(lsf::REQUIRE_DEST_TAG) && check.destination_tag.is_none() {
            return reject(ResultCode::TecDstTagNeeded, "check carries no destination tag");
        }
        if expired(check.expiration, ctx.close_time()) {
            return reject(ResultCode::TecExpired, "check expired");
        }

        let Some(value) = self.requested() else {
            return reject(ResultCode::TemMalformed, "no amount requested");
        };
        if value.issue() != check.send_max.issue() {
            return reject(ResultCode::TemMalformed, "currency does not match the check");
        }
        if value.value() > check.send_max.value() {
            return reject(ResultCode::TecPathPartial, "requested more than SendMax");
        }

        if let Some(wanted) = value.as_drops() {
            // Cashing frees the check's own reserve.
            let spare = xrp_liquid(ctx.view, &check.account, -1, &ctx.config.fees)?;
            if spare < wanted {
                return reject(ResultCode::TecPathPartial, format!("creator can spare only {spare}"));
            }
        }

        if let Some(iou) = value.as_issued() {
            let issue = iou.issue();
            if issue.issuer != account {
                if read_account(ctx.view, &issue.issuer)?.is_none() {
                    return reject(ResultCode::TecNoIssuer, format!("issuer {} does not exist", issue.issuer));
                }
                if requires_auth(ctx.view, &issue.issuer)? {
                    let Some(line) = read_line(ctx.view, &account, &issue.issuer, &issue.currency)? else {
                        return reject(ResultCode::TecNoLine, "issuer requires an authorized line");
                    };
                    if !line.has_flag(line.auth_flag(&issue.issuer)) {
                        return reject(ResultCode::TecNoAuth, "line not authorized by issuer");
                    }
                }
                if is_frozen(ctx.view, &account, &issue)? {
                    return reject(ResultCode::TecFrozen, format!("{} is frozen", issue.currency));
                }
            }
        }
        Ok(())
    }

    fn do_apply(&self, ctx: &mut ApplyContext<'_, '_>) -> TxResult<()> {
        let Some(check) = read_check(&*ctx.view, &self.check_id)? else {
            return reject(ResultCode::TecNoEntry, "check vanished");
        };
        let source = check.account;
        let account = ctx.account();

        match &check.send_max {
            Amount::Native(send_max) => {
                let liquid = xrp_liquid(&*ctx.view, &source, -1, ctx.fees())?;
                let deliver = match (&self.amount, &self.deliver_min) {
                    (Some(amount), _) => {
                        let wanted = amount.as_drops().unwrap_or_default();
                        if liquid < wanted {
                            return reject(ResultCode::TecPathPartial, format!("creator can spare only {liquid}"));
                        }
                        wanted
                    }
                    (None, Some(min)) => {
                        let deliver = (*send_max).min(liquid);
                        if deliver < min.as_drops().unwrap_or_default() {
                            return reject(ResultCode::TecPathPartial, format!("creator can spare only {liquid}"));
                        }
                        deliver
                    }
                    (None, None) => return reject(ResultCode::TemMalformed, "no amount requested"),
                };
                transfer_drops(ctx.view, &source, &account, deliver)?;
                ctx.delivered = Some(Amount::Native(deliver));
            }
            Amount::Issued(iou) => {
                let issue = iou.issue();
                let relax = ctx.enabled(Amendment::CHECK_CASH_MAKES_TRUST_LINE);
                let mut saved_limit = None;

                if account != issue.issuer {
                    let line = match read_line(&*ctx.view, &account, &issue.issuer, &issue.currency)? {
                        Some(line) => line,
                        None if relax => {
                            let root = load_account(&*ctx.view, &account)?;
                            if ctx.prior_balance < ctx.fees().account_reserve(root.owner_count.saturating_add(1)) {
                                return reject(
                                    ResultCode::TecNoLineInsufReserve,
                                    "no reserve for a new trust line",
                                );
                            }
                            create_line(ctx.view, &account, &issue.issuer, issue.currency, Decimal::ZERO, 0)?
                        }
                        None => return reject(ResultCode::TecNoLine, "destination has no trust line"),
                    };
                    if relax {
                        // Open the limit just far enough for this check.
                        let limit = line.limit_for(&account);
                        let Some(raised) = limit.checked_add(check.send_max.value()) else {
                            return reject(ResultCode::TecPathPartial, "trust line limit cannot be raised");
                        };
                        let mut relaxed = line.clone();
                        relaxed.set_limit_for(&account, raised);
                        write_line(ctx.view, &relaxed)?;
                        saved_limit = Some(limit);
                    }
                }

                let request = match (&self.amount, &self.deliver_min) {
                    (Some(amount), _) => SettleRequest {
                        source,
                        destination: account,
                        deliver: amount.clone(),
                        send_max: Some(check.send_max.clone()),
                        partial: false,
                        deliver_min: None,
                    },
                    (None, Some(min)) => SettleRequest {
                        source,
                        destination: account,
                        deliver: check.send_max.clone(),
                        send_max: Some(check.send_max.clone()),
                        partial: true,
                        deliver_min: Some(min.clone()),
                    },
                    (None, None) => return reject(ResultCode::TemMalformed, "no amount requested"),
                };
                let outcome = ctx.settler.settle(&*ctx.view, &request);
                if !outcome.is_success() {
                    return reject(
                        outcome.result,
                        outcome.diagnostic.unwrap_or_else(|| "settlement failed".into()),
                    );
                }
                outcome.changes.apply_to(&mut *ctx.view)?;

                if let Some(limit) = saved_limit {
                    if let Some(mut line) = read_line(&*ctx.view, &account, &issue.issuer, &issue.currency)? {
                        line.set_limit_for(&account, limit);
                        write_line(ctx.view, &line)?;
                    }
                }
                ctx.delivered = Some(outcome.delivered);
            }
        }

        delete_check(ctx.view, &self.check_id, &check)?;
        tracing::debug!(check = %self.check_id.short_hex(), "check cashed");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CheckCancel
// ---------------------------------------------------------------------------

/// Cancel a check. Before expiry only its creator or destination may.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckCancel {
    pub check_id: Hash256,
}

impl Transactor for CheckCancel {
    fn tx_type(&self) -> TxType {
        TxType::CheckCancel
    }

    fn required_amendments(&self) -> &'static [Amendment] {
        CHECKS
    }

    fn preflight(&self, _ctx: &PreflightContext<'_>) -> TxResult<()> {
        Ok(())
    }

    fn preclaim(&self, ctx: &PreclaimContext<'_>) -> TxResult<()> {
        let Some(check) = read_check(ctx.view, &self.check_id)? else {
            return reject(ResultCode::TecNoEntry, format!("check {} not found", self.check_id.short_hex()));
        };
        let account = ctx.account();
        if !expired(check.expiration, ctx.close_time())
            && account != check.account
            && account != check.destination
        {
            return reject(ResultCode::TecNoPermission, "check has not expired");
        }
        Ok(())
    }

    fn do_apply(&self, ctx: &mut ApplyContext<'_, '_>) -> TxResult<()> {
        let Some(check) = read_check(&*ctx.view, &self.check_id)? else {
            return reject(ResultCode::TecNoEntry, "check vanished");
        };
        delete_check(ctx.view, &self.check_id, &check)?;
        tracing::debug!(check = %self.check_id.short_hex(), "check cancelled");
        Ok(())
    }
}
