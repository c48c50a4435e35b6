//! TrustSet: create, adjust, and remove trust lines.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use xrpl_store::{lsf, ReadView, RippleState};
use xrpl_types::{AccountId, Amendment, Amount, Drops, ResultCode};

use crate::accounts::{adjust_owner_count, load_account, read_account};
use crate::error::{reject, TxResult};
use crate::transaction::{tf, TxType};
use crate::transactor::{ApplyContext, PreclaimContext, PreflightContext, Transactor};
use crate::trustline::{create_line, delete_line, read_line, write_line};

/// Trust `limit_amount.issuer` for up to `limit_amount.value` of its
/// currency.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustSet {
    pub limit_amount: Amount,
}

impl TrustSet {
    pub fn new(limit_amount: Amount) -> Self {
        Self { limit_amount }
    }
}

/// Apply the tf bits of a TrustSet to `account`'s side of `line`.
fn apply_line_flags(line: &mut RippleState, account: &AccountId, flags: u32) {
    if flags & tf::SET_AUTH != 0 {
        line.set_flag(line.auth_flag(account));
    }
    if flags & tf::SET_NO_RIPPLE != 0 {
        line.set_flag(line.no_ripple_flag(account));
    }
    if flags & tf::CLEAR_NO_RIPPLE != 0 {
        line.clear_flag(line.no_ripple_flag(account));
    }
    if flags & tf::SET_FREEZE != 0 {
        line.set_flag(line.freeze_flag(account));
    }
    if flags & tf::CLEAR_FREEZE != 0 {
        line.clear_flag(line.freeze_flag(account));
    }
}

/// A side counts the line against its reserve while it holds anything on
/// it or has moved it off the defaults.
fn side_needs_reserve(line: &RippleState, side: &AccountId, default_ripple: bool) -> bool {
    let no_ripple = line.has_flag(line.no_ripple_flag(side));
    !line.limit_for(side).is_zero()
        || line.balance_for(side) > Decimal::ZERO
        || no_ripple == default_ripple
        || line.is_frozen_by(side)
}

fn default_ripple<V: ReadView + ?Sized>(view: &V, account: &AccountId) -> TxResult<bool> {
    Ok(read_account(view, account)?.is_some_and(|root| root.has_flag(lsf::DEFAULT_RIPPLE)))
}

impl Transactor for TrustSet {
    fn tx_type(&self) -> TxType {
        TxType::TrustSet
    }

    fn legal_flags(&self) -> u32 {
        tf::UNIVERSAL
            | tf::SET_AUTH
            | tf::SET_NO_RIPPLE
            | tf::CLEAR_NO_RIPPLE
            | tf::SET_FREEZE
            | tf::CLEAR_FREEZE
    }

    fn preflight(&self, ctx: &PreflightContext<'_>) -> TxResult<()> {
        let flags = ctx.common.flags;
        let Some(iou) = self.limit_amount.as_issued() else {
            return reject(ResultCode::TemBadLimit, "limit must be an issued currency");
        };
        if !self.limit_amount.is_legal() {
            return reject(ResultCode::TemBadAmount, "limit out of range");
        }
        if iou.currency.is_native() || iou.currency.is_bad() {
            return reject(ResultCode::TemBadCurrency, "limit uses a reserved currency code");
        }
        if iou.value < Decimal::ZERO {
            return reject(ResultCode::TemBadLimit, "negative limit");
        }
        if iou.issuer.is_zero() {
            return reject(ResultCode::TemDstNeeded, "no peer account");
        }
        if iou.issuer == ctx.common.account {
            return reject(ResultCode::TemDstIsSrc, "trust line to self");
        }
        let both = |a: u32, b: u32| flags & a != 0 && flags & b != 0;
        if both(tf::SET_NO_RIPPLE, tf::CLEAR_NO_RIPPLE) || both(tf::SET_FREEZE, tf::CLEAR_FREEZE) {
            return reject(ResultCode::TemInvalidFlag, "contradictory flags");
        }
        Ok(())
    }

    fn preclaim(&self, ctx: &PreclaimContext<'_>) -> TxResult<()> {
        let account = ctx.account();
        let peer = self.limit_amount.issuer();
        let currency = self.limit_amount.currency();

        if ctx.common.flags & tf::SET_AUTH != 0 {
            let root = load_account(ctx.view, &account)?;
            if !root.has_flag(lsf::REQUIRE_AUTH) {
                return reject(ResultCode::TefNoAuthRequired, "account does not require auth");
            }
        }
        let Some(peer_root) = read_account(ctx.view, &peer)? else {
            return reject(ResultCode::TecNoDst, format!("{peer} does not exist"));
        };
        if ctx.enabled(Amendment::DISALLOW_INCOMING)
            && peer_root.has_flag(lsf::DISALLOW_INCOMING_TRUSTLINE)
            && read_line(ctx.view, &account, &peer, &currency)?.is_none()
        {
            return reject(ResultCode::TecNoPermission, "peer disallows incoming trust lines");
        }
        Ok(())
    }

    fn do_apply(&self, ctx: &mut ApplyContext<'_, '_>) -> TxResult<()> {
        let account = ctx.account();
        let peer = self.limit_amount.issuer();
        let currency = self.limit_amount.currency();
        let limit = self.limit_amount.value();
        let flags = ctx.common.flags;

        let root = load_account(&*ctx.view, &account)?;
        // The first two owned objects ride on the base reserve.
        let reserve_create = if root.owner_count < 2 {
            Drops::ZERO
        } else {
            ctx.fees().account_reserve(root.owner_count.saturating_add(1))
        };
        if flags & tf::SET_FREEZE != 0 && root.has_flag(lsf::NO_FREEZE) {
            return reject(ResultCode::TecNoPermission, "account has given up freezing");
        }

        let Some(mut line) = read_line(&*ctx.view, &account, &peer, &currency)? else {
            if limit.is_zero() && flags & (tf::SET_AUTH | tf::SET_NO_RIPPLE | tf::SET_FREEZE) == 0 {
                return reject(ResultCode::TecNoLineRedundant, "line would be all defaults");
            }
            if ctx.prior_balance < reserve_create {
                return reject(
                    ResultCode::TecNoLineInsufReserve,
                    format!("balance {} below reserve {reserve_create}", ctx.prior_balance),
                );
            }
            let mut line = create_line(ctx.view, &account, &peer, currency, limit, 0)?;
            apply_line_flags(&mut line, &account, flags);
            return write_line(ctx.view, &line);
        };

        line.set_limit_for(&account, limit);
        apply_line_flags(&mut line, &account, flags);

        let mut any_reserved = false;
        for side in [account, peer] {
            let needs = side_needs_reserve(&line, &side, default_ripple(&*ctx.view, &side)?);
            let reserve_bit = line.reserve_flag(&side);
            let holds = line.has_flag(reserve_bit);
            if needs && !holds {
                if side == account && ctx.prior_balance < reserve_create {
                    return reject(
                        ResultCode::TecInsufReserveLine,
                        format!("balance {} below reserve {reserve_create}", ctx.prior_balance),
                    );
                }
                line.set_flag(reserve_bit);
                adjust_owner_count(ctx.view, &side, 1)?;
            } else if !needs && holds {
                line.clear_flag(reserve_bit);
                adjust_owner_count(ctx.view, &side, -1)?;
            }
            any_reserved |= needs;
        }

        if !any_reserved && line.balance_for(&account).is_zero() {
            tracing::trace!(account = %account, peer = %peer, currency = %currency, "trust line removed");
            return delete_line(ctx.view, &line);
        }
        write_line(ctx.view, &line)
    }
}
