//! Issued-currency settlement.
//!
//! Payments and check cashing hand issued amounts to a [`FlowSettler`]. The
//! settler reads through the caller's view, computes the transfer in its
//! own sandbox, and returns the changes for the caller to commit or drop.
//! [`DirectSettler`] handles the direct cases: issuer to holder, holder to
//! issuer, and holder to holder rippling through the issuer.

use rust_decimal::Decimal;
use xrpl_store::{PendingChanges, ReadView, Sandbox};
use xrpl_types::{AccountId, Amount, ResultCode};

use crate::error::{reject, TxResult};
use crate::trustline::{credit_holder, is_frozen, read_line, requires_auth};

/// What to move, and how strictly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettleRequest {
    pub source: AccountId,
    pub destination: AccountId,
    /// What the destination should receive.
    pub deliver: Amount,
    /// Most the source will spend, same currency as `deliver`.
    pub send_max: Option<Amount>,
    /// Accept delivering less than `deliver`.
    pub partial: bool,
    /// With `partial`, the least that counts as success.
    pub deliver_min: Option<Amount>,
}

/// Result of one settlement attempt.
///
/// `changes` is empty unless `result` is `tesSUCCESS`.
#[derive(Clone, Debug)]
pub struct SettleOutcome {
    pub delivered: Amount,
    pub result: ResultCode,
    pub diagnostic: Option<String>,
    pub changes: PendingChanges,
}

impl SettleOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_success()
    }
}

/// Computes issued-currency transfers.
pub trait FlowSettler: Send + Sync {
    fn settle(&self, view: &dyn ReadView, request: &SettleRequest) -> SettleOutcome;
}

/// Settles along the single default path through the issuer.
#[derive(Clone, Copy, Debug, Default)]
pub struct DirectSettler;

impl FlowSettler for DirectSettler {
    fn settle(&self, view: &dyn ReadView, request: &SettleRequest) -> SettleOutcome {
        let mut sandbox = Sandbox::new(view);
        match settle_direct(&mut sandbox, request) {
            Ok(delivered) => SettleOutcome {
                delivered,
                result: ResultCode::TesSuccess,
                diagnostic: None,
                changes: sandbox.into_changes(),
            },
            Err(failure) => {
                tracing::debug!(result = %failure.code, reason = %failure.diagnostic, "settlement failed");
                SettleOutcome {
                    delivered: Amount::zero_of(request.deliver.issue()),
                    result: failure.code,
                    diagnostic: Some(failure.diagnostic),
                    changes: PendingChanges::default(),
                }
            }
        }
    }
}

fn settle_direct(view: &mut Sandbox<'_>, request: &SettleRequest) -> TxResult<Amount> {
    let Amount::Issued(iou) = &request.deliver else {
        return reject(ResultCode::TecPathDry, "native amounts settle without a path");
    };
    let issue = iou.issue();
    let issuer = issue.issuer;
    let (source, destination) = (request.source, request.destination);

    let mut cap = iou.value;
    if let Some(send_max) = &request.send_max {
        if send_max.is_native() || send_max.currency() != issue.currency {
            return reject(ResultCode::TecPathDry, "send max is in another currency");
        }
        cap = cap.min(send_max.value());
    }

    let through_issuer = source != issuer && destination != issuer;
    if through_issuer
        && (is_frozen(view, &source, &issue)? || is_frozen(view, &destination, &issue)?)
    {
        return reject(ResultCode::TecPathDry, format!("{} is frozen", issue.currency));
    }

    if source != issuer {
        let Some(line) = read_line(view, &source, &issuer, &issue.currency)? else {
            return reject(ResultCode::TecPathDry, "source has no trust line");
        };
        cap = cap.min(line.balance_for(&source).max(Decimal::ZERO));
    }

    if destination != issuer {
        let Some(line) = read_line(view, &destination, &issuer, &issue.currency)? else {
            return reject(ResultCode::TecPathDry, "destination has no trust line");
        };
        if requires_auth(view, &issuer)? && !line.has_flag(line.auth_flag(&issuer)) {
            return reject(ResultCode::TecPathDry, "destination line is not authorized");
        }
        let Some(room) = line.limit_for(&destination).checked_sub(line.balance_for(&destination)) else {
            return reject(ResultCode::TecPathDry, "destination line room overflows");
        };
        cap = cap.min(room.max(Decimal::ZERO));
    }

    if through_issuer {
        let src_line = read_line(view, &source, &issuer, &issue.currency)?;
        let dst_line = read_line(view, &destination, &issuer, &issue.currency)?;
        if let (Some(src_line), Some(dst_line)) = (src_line, dst_line) {
            if src_line.has_flag(src_line.no_ripple_flag(&issuer))
                && dst_line.has_flag(dst_line.no_ripple_flag(&issuer))
            {
                return reject(ResultCode::TecPathDry, "issuer does not ripple");
            }
        }
    }

    if cap <= Decimal::ZERO {
        return reject(ResultCode::TecPathDry, "nothing can be delivered");
    }
    if cap < iou.value {
        if !request.partial {
            return reject(
                ResultCode::TecPathPartial,
                format!("only {cap} of {} deliverable", iou.value),
            );
        }
        if let Some(min) = &request.deliver_min {
            if cap < min.value() {
                return reject(
                    ResultCode::TecPathPartial,
                    format!("{cap} is below the delivery minimum {}", min.value()),
                );
            }
        }
    }

    if source != issuer {
        credit_holder(view, &source, &issuer, &issue.currency, -cap)?;
    }
    if destination != issuer {
        credit_holder(view, &destination, &issuer, &issue.currency, cap)?;
    }
    Ok(request.deliver.with_value(cap))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use xrpl_crypto::Keylet;
    use xrpl_store::{lsf, AccountRoot, InMemoryView, LedgerViewExt};
    use xrpl_types::{Currency, Drops, Issue};

    use super::*;
    use crate::trustline::{create_line, holdings, write_line};

    fn acct(b: u8) -> AccountId {
        AccountId::from_bytes([b; 20])
    }

    fn usd() -> Currency {
        Currency::from_code("USD").unwrap()
    }

    const GW: u8 = 1;

    fn usd_amount(value: Decimal) -> Amount {
        Amount::issued(value, usd(), acct(GW))
    }

    /// Gateway 1 (DefaultRipple), holders 2 and 3 with 100 USD limits;
    /// holder 2 starts with 40 USD.
    fn setup() -> InMemoryView {
        let mut view = InMemoryView::new();
        for b in [1, 2, 3] {
            let mut root = AccountRoot::new(acct(b), Drops::from_xrp(100), 1);
            if b == GW {
                root.set_flag(lsf::DEFAULT_RIPPLE);
            }
            view.insert_entry(&Keylet::account(&acct(b)), &root).unwrap();
        }
        for b in [2, 3] {
            create_line(&mut view, &acct(b), &acct(GW), usd(), dec!(100), 0).unwrap();
        }
        let mut line = read_line(&view, &acct(2), &acct(GW), &usd()).unwrap().unwrap();
        line.set_balance_for(&acct(2), dec!(40));
        write_line(&mut view, &line).unwrap();
        view
    }

    fn request(from: u8, to: u8, value: Decimal) -> SettleRequest {
        SettleRequest {
            source: acct(from),
            destination: acct(to),
            deliver: usd_amount(value),
            send_max: None,
            partial: false,
            deliver_min: None,
        }
    }

    fn held(view: &InMemoryView, b: u8) -> Decimal {
        holdings(view, &acct(b), &Issue::new(usd(), acct(GW))).unwrap()
    }

    #[test]
    fn holder_to_holder_through_issuer() {
        let mut view = setup();
        let outcome = DirectSettler.settle(&view, &request(2, 3, dec!(15)));
        assert!(outcome.is_success());
        assert_eq!(outcome.delivered, usd_amount(dec!(15)));
        outcome.changes.apply_to(&mut view).unwrap();
        assert_eq!(held(&view, 2), dec!(25));
        assert_eq!(held(&view, 3), dec!(15));
    }

    #[test]
    fn settling_leaves_view_untouched() {
        let view = setup();
        let before = view.state_hash();
        let _ = DirectSettler.settle(&view, &request(2, 3, dec!(15)));
        assert_eq!(view.state_hash(), before);
    }

    #[test]
    fn shortfall_needs_partial_flag() {
        let view = setup();
        let outcome = DirectSettler.settle(&view, &request(2, 3, dec!(60)));
        assert_eq!(outcome.result, ResultCode::TecPathPartial);
        assert!(outcome.changes.is_empty());

        let mut partial = request(2, 3, dec!(60));
        partial.partial = true;
        let outcome = DirectSettler.settle(&view, &partial);
        assert!(outcome.is_success());
        assert_eq!(outcome.delivered, usd_amount(dec!(40)));

        partial.deliver_min = Some(usd_amount(dec!(45)));
        let outcome = DirectSettler.settle(&view, &partial);
        assert_eq!(outcome.result, ResultCode::TecPathPartial);
    }

    #[test]
    fn issuer_issues_up_to_limit() {
        let view = setup();
        let outcome = DirectSettler.settle(&view, &request(GW, 3, dec!(150)));
        assert_eq!(outcome.result, ResultCode::TecPathPartial);
        let outcome = DirectSettler.settle(&view, &request(GW, 3, dec!(100)));
        assert!(outcome.is_success());
    }

    #[test]
    fn frozen_holder_can_only_return_to_issuer() {
        let mut view = setup();
        let mut line = read_line(&view, &acct(2), &acct(GW), &usd()).unwrap().unwrap();
        line.set_flag(line.freeze_flag(&acct(GW)));
        write_line(&mut view, &line).unwrap();

        let outcome = DirectSettler.settle(&view, &request(2, 3, dec!(5)));
        assert_eq!(outcome.result, ResultCode::TecPathDry);
        let outcome = DirectSettler.settle(&view, &request(2, GW, dec!(5)));
        assert!(outcome.is_success());
    }

    #[test]
    fn no_ripple_issuer_blocks_holder_transfers() {
        let mut view = setup();
        for b in [2, 3] {
            let mut line = read_line(&view, &acct(b), &acct(GW), &usd()).unwrap().unwrap();
            line.set_flag(line.no_ripple_flag(&acct(GW)));
            write_line(&mut view, &line).unwrap();
        }
        let outcome = DirectSettler.settle(&view, &request(2, 3, dec!(5)));
        assert_eq!(outcome.result, ResultCode::TecPathDry);
    }

    #[test]
    fn unbounded_limit_over_negative_balance_does_not_overflow() {
        let mut view = setup();
        let mut line = read_line(&view, &acct(3), &acct(GW), &usd()).unwrap().unwrap();
        line.set_limit_for(&acct(3), Decimal::MAX);
        line.set_balance_for(&acct(3), dec!(-10));
        write_line(&mut view, &line).unwrap();

        let outcome = DirectSettler.settle(&view, &request(2, 3, dec!(5)));
        assert_eq!(outcome.result, ResultCode::TecPathDry);
        assert!(outcome.changes.is_empty());
    }

    #[test]
    fn negative_balance_widens_room() {
        let mut view = setup();
        let mut line = read_line(&view, &acct(3), &acct(GW), &usd()).unwrap().unwrap();
        line.set_limit_for(&acct(3), dec!(5));
        line.set_balance_for(&acct(3), dec!(-10));
        write_line(&mut view, &line).unwrap();

        let outcome = DirectSettler.settle(&view, &request(2, 3, dec!(15)));
        assert!(outcome.is_success(), "{:?}", outcome.diagnostic);
        outcome.changes.apply_to(&mut view).unwrap();
        let line = read_line(&view, &acct(3), &acct(GW), &usd()).unwrap().unwrap();
        assert_eq!(line.balance_for(&acct(3)), dec!(5));
    }

    #[test]
    fn native_is_refused() {
        let view = setup();
        let mut req = request(2, 3, dec!(1));
        req.deliver = Amount::drops(10);
        assert_eq!(DirectSettler.settle(&view, &req).result, ResultCode::TecPathDry);
    }
}
