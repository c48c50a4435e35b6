//! Transaction families.
//!
//! Each type is a plain struct of its own fields plus a [`Transactor`]
//! impl; [`crate::TxKind`] ties them together.
//!
//! [`Transactor`]: crate::Transactor

pub mod account_set;
pub mod amm;
pub mod check;
pub mod clawback;
pub mod credential;
pub mod payment;
pub mod ticket;
pub mod trust_set;

pub use account_set::{asf, AccountSet, SetRegularKey};
pub use amm::{AmmCreate, MAX_TRADING_FEE};
pub use check::{CheckCancel, CheckCash, CheckCreate};
pub use clawback::Clawback;
pub use credential::{CredentialAccept, CredentialCreate, CredentialDelete};
pub use payment::Payment;
pub use ticket::{TicketCreate, MAX_TICKETS};
pub use trust_set::TrustSet;

use xrpl_types::{Amount, ResultCode};

use crate::error::{reject, TxResult};

/// A strictly positive, representable amount in a real currency.
pub(crate) fn check_amount(amount: &Amount, what: &str) -> TxResult<()> {
    if !amount.is_legal() || !amount.is_positive() {
        return reject(ResultCode::TemBadAmount, format!("{what} must be positive"));
    }
    if let Some(iou) = amount.as_issued() {
        if iou.currency.is_native() || iou.currency.is_bad() {
            return reject(ResultCode::TemBadCurrency, format!("{what} uses a reserved currency code"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use xrpl_types::{AccountId, Currency};

    use super::*;

    #[test]
    fn amount_checks() {
        let gw = AccountId::from_bytes([1; 20]);
        assert!(check_amount(&Amount::drops(1), "x").is_ok());
        assert_eq!(
            check_amount(&Amount::drops(0), "x").unwrap_err().code,
            ResultCode::TemBadAmount
        );
        let bad = Amount::issued(dec!(1), Currency::bad(), gw);
        assert_eq!(check_amount(&bad, "x").unwrap_err().code, ResultCode::TemBadCurrency);
        let negative = Amount::issued(dec!(-1), Currency::from_code("USD").unwrap(), gw);
        assert_eq!(check_amount(&negative, "x").unwrap_err().code, ResultCode::TemBadAmount);
    }
}
