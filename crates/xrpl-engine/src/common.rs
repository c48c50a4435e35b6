//! Checks every transaction type shares, run by the engine around the
//! type-specific phases.

use xrpl_crypto::{Keylet, SignatureVerifier};
use xrpl_store::{dir_remove, lsf, LedgerView, ReadView, Sandbox};
use xrpl_types::{Amendment, Amount, Drops, ResultCode};

use crate::accounts::{load_account, read_account, write_account};
use crate::config::EngineConfig;
use crate::error::{reject, TxFailure, TxResult};
use crate::transaction::{CommonFields, Transaction};
use crate::transactor::{PreclaimContext, PreflightContext};

/// Amendment gating, shared field checks, then the type's own preflight.
pub(crate) fn preflight(tx: &Transaction, config: &EngineConfig) -> TxResult<()> {
    let transactor = tx.transactor();
    let common = &tx.common;

    if let Some(rules) = &config.rules {
        let missing = rules.missing(transactor.required_amendments());
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(|a| a.name()).collect();
            return reject(
                ResultCode::TemDisabled,
                format!("{} needs {}", transactor.tx_type(), names.join(", ")),
            );
        }
    }

    if common.ticket_sequence.is_some() {
        if !config.enabled(Amendment::TICKET_BATCH) {
            return reject(ResultCode::TemMalformed, "tickets are not enabled");
        }
        if common.sequence != 0 {
            return reject(ResultCode::TemSeqAndTicket, "both sequence and ticket set");
        }
    }
    if common.account.is_zero() {
        return reject(ResultCode::TemBadSrcAccount, "zero source account");
    }
    match &common.fee {
        Amount::Native(_) if common.fee.is_legal() => {}
        fee => return reject(ResultCode::TemBadFee, format!("fee {fee} is not a legal native amount")),
    }
    let illegal = common.flags & !transactor.legal_flags();
    if illegal != 0 {
        return reject(
            ResultCode::TemInvalidFlag,
            format!("flags {illegal:#010x} not allowed on {}", transactor.tx_type()),
        );
    }
    if !common.signing_pub_key.is_empty() && !common.signing_pub_key.is_well_formed() {
        return reject(ResultCode::TemBadSignature, "malformed signing key");
    }

    transactor.preflight(&PreflightContext { common, config })
}

/// The signature must verify, and the signing key must be allowed to act
/// for the account.
pub(crate) fn check_signature(
    view: &dyn ReadView,
    tx: &Transaction,
    verifier: &dyn SignatureVerifier,
) -> TxResult<()> {
    let common = &tx.common;
    let key = &common.signing_pub_key;
    if key.is_empty() {
        return reject(ResultCode::TemBadSignature, "transaction is not signed");
    }
    let data = tx
        .signing_data()
        .map_err(|e| TxFailure::new(ResultCode::TefInternal, e.to_string()))?;
    verifier
        .verify(key, &data, &common.txn_signature)
        .map_err(|e| TxFailure::new(ResultCode::TemBadSignature, e.to_string()))?;

    let Some(root) = read_account(view, &common.account)? else {
        return reject(ResultCode::TerNoAccount, format!("{} does not exist", common.account));
    };
    let signer = key.account_id();
    if root.regular_key == Some(signer) {
        return Ok(());
    }
    if signer == common.account {
        if root.has_flag(lsf::DISABLE_MASTER) {
            return reject(ResultCode::TefMasterDisabled, "master key is disabled");
        }
        return Ok(());
    }
    if root.regular_key.is_some() {
        reject(ResultCode::TefBadAuth, format!("{signer} may not sign for {}", common.account))
    } else {
        reject(
            ResultCode::TefBadAuthMaster,
            format!("{signer} is not the master key of {}", common.account),
        )
    }
}

/// Sequence, ticket, expiry, and fee checks, then the type's own preclaim.
pub(crate) fn preclaim(view: &dyn ReadView, tx: &Transaction, config: &EngineConfig) -> TxResult<()> {
    let transactor = tx.transactor();
    let common = &tx.common;

    let Some(root) = read_account(view, &common.account)? else {
        return reject(ResultCode::TerNoAccount, format!("{} does not exist", common.account));
    };

    if let Some(last) = common.last_ledger_sequence {
        if last < config.ledger_sequence {
            return reject(
                ResultCode::TefMaxLedger,
                format!("last ledger {last} is before {}", config.ledger_sequence),
            );
        }
    }

    match common.ticket_sequence {
        None => {
            if common.sequence > root.sequence {
                return reject(
                    ResultCode::TerPreSeq,
                    format!("sequence {} ahead of {}", common.sequence, root.sequence),
                );
            }
            if common.sequence < root.sequence {
                return reject(
                    ResultCode::TefPastSeq,
                    format!("sequence {} already used", common.sequence),
                );
            }
        }
        Some(ticket) => {
            if !view.exists(&Keylet::ticket(&common.account, ticket))? {
                if ticket >= root.sequence {
                    return reject(ResultCode::TerPreTicket, format!("ticket {ticket} not created yet"));
                }
                return reject(ResultCode::TefNoTicket, format!("ticket {ticket} does not exist"));
            }
        }
    }

    let fee = common.fee.as_drops().unwrap_or(Drops::ZERO);
    let minimum = transactor.minimum_fee(&config.fees);
    if fee < minimum {
        return reject(ResultCode::TelInsufFeeP, format!("fee {fee} below minimum {minimum}"));
    }
    if fee > root.balance {
        return reject(
            ResultCode::TerInsufFeeB,
            format!("fee {fee} exceeds balance {}", root.balance),
        );
    }

    transactor.preclaim(&PreclaimContext { view, common, config })
}

/// What the preamble took.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Preamble {
    pub prior_balance: Drops,
    pub fee_paid: Drops,
}

/// Consume the sequence or ticket and take the fee. This is everything a
/// `tec` result commits.
pub(crate) fn apply_preamble(view: &mut Sandbox<'_>, common: &CommonFields) -> TxResult<Preamble> {
    let account = common.account;
    let mut root = load_account(view, &account)?;
    let prior_balance = root.balance;
    let fee = common.fee.as_drops().unwrap_or(Drops::ZERO);

    match common.ticket_sequence {
        None => {
            root.sequence = root.sequence.checked_add(1).ok_or_else(|| {
                TxFailure::new(ResultCode::TefInternal, "sequence overflow")
            })?;
        }
        Some(ticket) => {
            let keylet = Keylet::ticket(&account, ticket);
            view.erase(&keylet)?;
            dir_remove(view, &account, &keylet.key)?;
            root.owner_count = root.owner_count.checked_sub(1).ok_or_else(|| {
                TxFailure::new(ResultCode::TefInternal, "ticket without owner count")
            })?;
            root.ticket_count = root.ticket_count.saturating_sub(1);
        }
    }

    root.balance = root.balance.checked_sub(fee).ok_or_else(|| {
        TxFailure::new(ResultCode::TefInternal, format!("balance cannot cover fee {fee}"))
    })?;
    write_account(view, &root)?;
    view.adjust_drops_destroyed(fee);
    Ok(Preamble {
        prior_balance,
        fee_paid: fee,
    })
}
