//! Consistency checks run on a finished sandbox before it commits.
//!
//! A violation means the engine itself is wrong, so every failure is logged
//! at `warn` and reported as `tecINVARIANT_FAILED`; the engine then retries
//! with only the fee taken.

use xrpl_crypto::Keylet;
use xrpl_store::{codec, AccountRoot, Action, Amm, LedgerEntry, Pending, ReadViewExt, Sandbox};
use xrpl_types::{AccountId, Drops, Hash256, LedgerEntryType, ResultCode, MAX_NATIVE_DROPS};

use crate::config::Fees;
use crate::error::{TxFailure, TxResult};

/// Check every invariant over the changes in `sandbox`.
pub fn check(sandbox: &Sandbox<'_>, sender: &AccountId, fee_paid: Drops, fees: &Fees) -> TxResult<()> {
    let mut native_delta: i128 = 0;

    for (key, pending) in sandbox.changes() {
        match pending.entry_type {
            LedgerEntryType::AccountRoot => {
                let before = previous::<AccountRoot>(sandbox, key, pending)?;
                let Some(after) = decode_after::<AccountRoot>(key, pending)? else {
                    return violated(format!("account root {key} deleted"));
                };
                if after.balance.as_u64() > MAX_NATIVE_DROPS {
                    return violated(format!("{} balance {} exceeds supply", after.account, after.balance));
                }
                let before_balance = before.as_ref().map_or(0, |root| root.balance.as_u64());
                native_delta += i128::from(after.balance.as_u64()) - i128::from(before_balance);

                let before_owners = before.as_ref().map_or(0, |root| root.owner_count);
                if after.owner_count > before_owners && after.owner_count > 2 {
                    let credited = if after.account == *sender { fee_paid } else { Drops::ZERO };
                    let effective = after.balance.checked_add(credited).unwrap_or(Drops::new(u64::MAX));
                    let reserve = fees.account_reserve(after.owner_count);
                    if effective < reserve {
                        return violated(format!(
                            "{} holds {} for {} objects, reserve is {}",
                            after.account, after.balance, after.owner_count, reserve
                        ));
                    }
                }
            }
            LedgerEntryType::Amm => {
                let before = previous::<Amm>(sandbox, key, pending)?
                    .map_or(0, |amm| amm.native_holdings().as_u64());
                let after = decode_after::<Amm>(key, pending)?
                    .map_or(0, |amm| amm.native_holdings().as_u64());
                native_delta += i128::from(after) - i128::from(before);
            }
            _ => {}
        }
    }

    let expected = -i128::from(fee_paid.as_u64());
    if native_delta != expected {
        return violated(format!("native balances moved by {native_delta}, fee was {fee_paid}"));
    }
    if sandbox.destroyed() != fee_paid {
        return violated(format!("destroyed {} but fee was {fee_paid}", sandbox.destroyed()));
    }
    Ok(())
}

fn violated<T>(detail: String) -> TxResult<T> {
    tracing::warn!(%detail, "invariant violated");
    Err(TxFailure::new(ResultCode::TecInvariantFailed, detail))
}

fn previous<T: LedgerEntry>(
    sandbox: &Sandbox<'_>,
    key: &Hash256,
    pending: &Pending,
) -> TxResult<Option<T>> {
    if matches!(pending.action, Action::Created(_)) {
        return Ok(None);
    }
    Ok(sandbox.base().read_entry(&Keylet::new(pending.entry_type, *key))?)
}

fn decode_after<T: LedgerEntry>(key: &Hash256, pending: &Pending) -> TxResult<Option<T>> {
    match pending.after() {
        Some(bytes) => Ok(Some(codec::decode(key, bytes)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use xrpl_store::{InMemoryView, LedgerView, LedgerViewExt};

    use super::*;

    fn acct(b: u8) -> AccountId {
        AccountId::from_bytes([b; 20])
    }

    fn base() -> InMemoryView {
        let mut view = InMemoryView::new();
        for b in [1, 2] {
            let root = AccountRoot::new(acct(b), Drops::from_xrp(10), 1);
            view.insert_entry(&Keylet::account(&acct(b)), &root).unwrap();
        }
        view
    }

    fn charge(sandbox: &mut Sandbox<'_>, account: u8, fee: u64) {
        let keylet = Keylet::account(&acct(account));
        let mut root: AccountRoot = sandbox.read_entry(&keylet).unwrap().unwrap();
        root.balance = root.balance.saturating_sub(Drops::new(fee));
        sandbox.update_entry(&keylet, &root).unwrap();
        sandbox.adjust_drops_destroyed(Drops::new(fee));
    }

    #[test]
    fn fee_only_passes() {
        let base = base();
        let mut sandbox = Sandbox::new(&base);
        charge(&mut sandbox, 1, 10);
        assert!(check(&sandbox, &acct(1), Drops::new(10), &Fees::default()).is_ok());
    }

    #[test]
    fn created_drops_fail() {
        let base = base();
        let mut sandbox = Sandbox::new(&base);
        charge(&mut sandbox, 1, 10);
        let keylet = Keylet::account(&acct(2));
        let mut root: AccountRoot = sandbox.read_entry(&keylet).unwrap().unwrap();
        root.balance = root.balance.checked_add(Drops::new(1)).unwrap();
        sandbox.update_entry(&keylet, &root).unwrap();
        let err = check(&sandbox, &acct(1), Drops::new(10), &Fees::default()).unwrap_err();
        assert_eq!(err.code, ResultCode::TecInvariantFailed);
    }

    #[test]
    fn destroyed_must_match_fee() {
        let base = base();
        let mut sandbox = Sandbox::new(&base);
        charge(&mut sandbox, 1, 10);
        sandbox.adjust_drops_destroyed(Drops::new(1));
        assert!(check(&sandbox, &acct(1), Drops::new(10), &Fees::default()).is_err());
    }

    #[test]
    fn deleting_an_account_fails() {
        let base = base();
        let mut sandbox = Sandbox::new(&base);
        sandbox.erase(&Keylet::account(&acct(2))).unwrap();
        assert!(check(&sandbox, &acct(1), Drops::ZERO, &Fees::default()).is_err());
    }

    #[test]
    fn owner_growth_needs_reserve() {
        let base = base();
        let mut sandbox = Sandbox::new(&base);
        let keylet = Keylet::account(&acct(2));
        let mut root: AccountRoot = sandbox.read_entry(&keylet).unwrap().unwrap();
        root.owner_count = 50;
        sandbox.update_entry(&keylet, &root).unwrap();
        assert!(check(&sandbox, &acct(1), Drops::ZERO, &Fees::default()).is_err());

        root.owner_count = 2;
        sandbox.update_entry(&keylet, &root).unwrap();
        assert!(check(&sandbox, &acct(1), Drops::ZERO, &Fees::default()).is_ok());
    }
}
