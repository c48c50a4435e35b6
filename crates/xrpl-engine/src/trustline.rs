//! Trust line helpers shared by TrustSet, checks, payments, clawback, and
//! AMM creation.

use rust_decimal::Decimal;
use xrpl_crypto::Keylet;
use xrpl_store::{
    dir_insert, dir_remove, lsf, LedgerView, LedgerViewExt, ReadView, ReadViewExt, RippleState,
};
use xrpl_types::{AccountId, Currency, Issue, ResultCode};

use crate::accounts::{adjust_owner_count, read_account};
use crate::error::{reject, TxResult};

pub fn read_line<V: ReadView + ?Sized>(
    view: &V,
    a: &AccountId,
    b: &AccountId,
    currency: &Currency,
) -> TxResult<Option<RippleState>> {
    Ok(view.read_entry(&Keylet::line(a, b, currency))?)
}

pub fn write_line<V: LedgerView + ?Sized>(view: &mut V, line: &RippleState) -> TxResult<()> {
    Ok(view.update_entry(&Keylet::line(&line.low, &line.high, &line.currency), line)?)
}

/// Whether `issuer` has frozen every line in its currencies.
pub fn is_global_frozen<V: ReadView + ?Sized>(view: &V, issuer: &AccountId) -> TxResult<bool> {
    Ok(read_account(view, issuer)?.is_some_and(|root| root.has_flag(lsf::GLOBAL_FREEZE)))
}

/// Whether `account` is blocked from moving `issue`: a global freeze by the
/// issuer, or the issuer freezing `account`'s line. Native is never frozen.
pub fn is_frozen<V: ReadView + ?Sized>(view: &V, account: &AccountId, issue: &Issue) -> TxResult<bool> {
    if issue.is_native() {
        return Ok(false);
    }
    if is_global_frozen(view, &issue.issuer)? {
        return Ok(true);
    }
    if *account == issue.issuer {
        return Ok(false);
    }
    Ok(read_line(view, account, &issue.issuer, &issue.currency)?
        .is_some_and(|line| line.is_frozen_by(&issue.issuer)))
}

pub fn requires_auth<V: ReadView + ?Sized>(view: &V, issuer: &AccountId) -> TxResult<bool> {
    Ok(read_account(view, issuer)?.is_some_and(|root| root.has_flag(lsf::REQUIRE_AUTH)))
}

/// IOUs of `issue` that `holder` holds, never negative. An issuer holds
/// nothing of its own currency.
pub fn holdings<V: ReadView + ?Sized>(view: &V, holder: &AccountId, issue: &Issue) -> TxResult<Decimal> {
    if *holder == issue.issuer {
        return Ok(Decimal::ZERO);
    }
    Ok(read_line(view, holder, &issue.issuer, &issue.currency)?
        .map(|line| line.balance_for(holder).max(Decimal::ZERO))
        .unwrap_or(Decimal::ZERO))
}

/// Create an empty line with `owner` paying its reserve and trusting
/// `peer` up to `limit`.
///
/// Each side that has not set DefaultRipple on its account gets its
/// no-ripple bit. `extra_flags` is ORed in last.
pub fn create_line<V: LedgerView + ?Sized>(
    view: &mut V,
    owner: &AccountId,
    peer: &AccountId,
    currency: Currency,
    limit: Decimal,
    extra_flags: u32,
) -> TxResult<RippleState> {
    let keylet = Keylet::line(owner, peer, &currency);
    let mut line = RippleState::new(owner, peer, currency);
    line.set_limit_for(owner, limit);
    line.set_flag(line.reserve_flag(owner));
    for side in [owner, peer] {
        let default_ripple = read_account(view, side)?
            .is_some_and(|root| root.has_flag(lsf::DEFAULT_RIPPLE));
        if !default_ripple {
            line.set_flag(line.no_ripple_flag(side));
        }
    }
    line.set_flag(extra_flags);

    view.insert_entry(&keylet, &line)?;
    dir_insert(view, owner, keylet.key)?;
    dir_insert(view, peer, keylet.key)?;
    adjust_owner_count(view, owner, 1)?;
    tracing::trace!(owner = %owner, peer = %peer, currency = %currency, "trust line created");
    Ok(line)
}

/// Erase a line, unlisting it from both directories and releasing any
/// reserve either side held.
pub fn delete_line<V: LedgerView + ?Sized>(view: &mut V, line: &RippleState) -> TxResult<()> {
    let keylet = Keylet::line(&line.low, &line.high, &line.currency);
    for side in [line.low, line.high] {
        dir_remove(view, &side, &keylet.key)?;
        if line.has_flag(line.reserve_flag(&side)) {
            adjust_owner_count(view, &side, -1)?;
        }
    }
    view.erase(&keylet)?;
    Ok(())
}

/// Move `amount` of `issuer`'s IOUs on the line between `holder` and
/// `issuer`. Positive `amount` credits the holder.
pub fn credit_holder<V: LedgerView + ?Sized>(
    view: &mut V,
    holder: &AccountId,
    issuer: &AccountId,
    currency: &Currency,
    amount: Decimal,
) -> TxResult<RippleState> {
    let Some(mut line) = read_line(view, holder, issuer, currency)? else {
        return reject(
            ResultCode::TecNoLine,
            format!("no {currency} line between {holder} and {issuer}"),
        );
    };
    let Some(balance) = line.balance_for(holder).checked_add(amount) else {
        return reject(ResultCode::TefInternal, format!("{currency} balance overflows"));
    };
    line.set_balance_for(holder, balance);
    write_line(view, &line)?;
    Ok(line)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use xrpl_store::{dir_entries, AccountRoot, InMemoryView};
    use xrpl_types::Drops;

    use super::*;
    use crate::accounts::load_account;

    fn acct(b: u8) -> AccountId {
        AccountId::from_bytes([b; 20])
    }

    fn usd() -> Currency {
        Currency::from_code("USD").unwrap()
    }

    fn setup() -> InMemoryView {
        let mut view = InMemoryView::new();
        for b in [1, 2] {
            let root = AccountRoot::new(acct(b), Drops::from_xrp(100), 1);
            view.insert_entry(&Keylet::account(&acct(b)), &root).unwrap();
        }
        view
    }

    #[test]
    fn create_and_delete_line_balances_bookkeeping() {
        let mut view = setup();
        let line = create_line(&mut view, &acct(2), &acct(1), usd(), dec!(50), 0).unwrap();
        assert_eq!(line.limit_for(&acct(2)), dec!(50));
        assert!(line.has_flag(line.reserve_flag(&acct(2))));
        assert!(line.has_flag(line.no_ripple_flag(&acct(2))));
        assert!(line.has_flag(line.no_ripple_flag(&acct(1))));
        assert_eq!(load_account(&view, &acct(2)).unwrap().owner_count, 1);
        assert_eq!(load_account(&view, &acct(1)).unwrap().owner_count, 0);
        assert_eq!(dir_entries(&view, &acct(1)).unwrap().len(), 1);

        delete_line(&mut view, &line).unwrap();
        assert_eq!(load_account(&view, &acct(2)).unwrap().owner_count, 0);
        assert!(dir_entries(&view, &acct(2)).unwrap().is_empty());
        assert!(read_line(&view, &acct(1), &acct(2), &usd()).unwrap().is_none());
    }

    #[test]
    fn freeze_checks() {
        let mut view = setup();
        let issue = Issue::new(usd(), acct(1));
        let mut line = create_line(&mut view, &acct(2), &acct(1), usd(), dec!(50), 0).unwrap();
        assert!(!is_frozen(&view, &acct(2), &issue).unwrap());

        line.set_flag(line.freeze_flag(&acct(1)));
        write_line(&mut view, &line).unwrap();
        assert!(is_frozen(&view, &acct(2), &issue).unwrap());
        assert!(!is_frozen(&view, &acct(1), &issue).unwrap());
        assert!(!is_frozen(&view, &acct(2), &Issue::native()).unwrap());
    }

    #[test]
    fn credit_moves_balance_and_needs_line() {
        let mut view = setup();
        let issue = Issue::new(usd(), acct(1));
        let err = credit_holder(&mut view, &acct(2), &acct(1), &usd(), dec!(5)).unwrap_err();
        assert_eq!(err.code, ResultCode::TecNoLine);

        create_line(&mut view, &acct(2), &acct(1), usd(), dec!(50), 0).unwrap();
        credit_holder(&mut view, &acct(2), &acct(1), &usd(), dec!(5)).unwrap();
        assert_eq!(holdings(&view, &acct(2), &issue).unwrap(), dec!(5));
        assert_eq!(holdings(&view, &acct(1), &issue).unwrap(), Decimal::ZERO);
    }
}
