//! AccountRoot access, owner counts, and reserve arithmetic.

use xrpl_crypto::Keylet;
use xrpl_store::{AccountRoot, LedgerView, LedgerViewExt, ReadView, ReadViewExt};
use xrpl_types::{AccountId, Drops, ResultCode};

use crate::config::Fees;
use crate::error::{reject, TxFailure, TxResult};

pub fn read_account<V: ReadView + ?Sized>(
    view: &V,
    account: &AccountId,
) -> TxResult<Option<AccountRoot>> {
    Ok(view.read_entry(&Keylet::account(account))?)
}

/// Read an account that earlier checks proved exists.
pub fn load_account<V: ReadView + ?Sized>(view: &V, account: &AccountId) -> TxResult<AccountRoot> {
    read_account(view, account)?.ok_or_else(|| {
        TxFailure::new(ResultCode::TefInternal, format!("account {account} vanished"))
    })
}

pub fn write_account<V: LedgerView + ?Sized>(view: &mut V, root: &AccountRoot) -> TxResult<()> {
    Ok(view.update_entry(&Keylet::account(&root.account), root)?)
}

/// Add `delta` to an owner count. Going below zero is an internal error.
pub fn adjust_owner_count<V: LedgerView + ?Sized>(
    view: &mut V,
    account: &AccountId,
    delta: i32,
) -> TxResult<u32> {
    let mut root = load_account(view, account)?;
    root.owner_count = root
        .owner_count
        .checked_add_signed(delta)
        .ok_or_else(|| {
            TxFailure::new(
                ResultCode::TefInternal,
                format!("owner count of {account} out of range"),
            )
        })?;
    write_account(view, &root)?;
    Ok(root.owner_count)
}

/// Reserve check for a new owned object.
///
/// Uses the balance from before the fee was taken, so a transaction is not
/// refused for the reserve it just paid a fee out of.
pub fn check_reserve(prior_balance: Drops, owner_count: u32, fees: &Fees) -> TxResult<()> {
    let reserve = fees.account_reserve(owner_count);
    if prior_balance < reserve {
        return reject(
            ResultCode::TecInsufficientReserve,
            format!("balance {prior_balance} below reserve {reserve}"),
        );
    }
    Ok(())
}

/// Native balance above the reserve, treating the owner count as
/// `owner_count + owner_adjust`.
pub fn xrp_liquid<V: ReadView + ?Sized>(
    view: &V,
    account: &AccountId,
    owner_adjust: i32,
    fees: &Fees,
) -> TxResult<Drops> {
    let root = load_account(view, account)?;
    let owners = root.owner_count.saturating_add_signed(owner_adjust);
    Ok(root.balance.saturating_sub(fees.account_reserve(owners)))
}

/// Move drops between two existing accounts.
pub fn transfer_drops<V: LedgerView + ?Sized>(
    view: &mut V,
    from: &AccountId,
    to: &AccountId,
    amount: Drops,
) -> TxResult<()> {
    let mut sender = load_account(view, from)?;
    sender.balance = match sender.balance.checked_sub(amount) {
        Some(balance) => balance,
        None => {
            return reject(
                ResultCode::TecUnfundedPayment,
                format!("{from} cannot cover {amount}"),
            )
        }
    };
    write_account(view, &sender)?;
    let mut receiver = load_account(view, to)?;
    receiver.balance = receiver.balance.checked_add(amount).ok_or_else(|| {
        TxFailure::new(ResultCode::TefInternal, "native balance overflow")
    })?;
    write_account(view, &receiver)
}
