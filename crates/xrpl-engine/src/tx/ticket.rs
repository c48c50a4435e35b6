use serde::{Deserialize, Serialize};
use xrpl_crypto::Keylet;
use xrpl_store::{dir_insert, LedgerViewExt, Ticket};
use xrpl_types::{Amendment, ResultCode};

use crate::accounts::{load_account, write_account};
use crate::error::{reject, TxFailure, TxResult};
use crate::transaction::TxType;
use crate::transactor::{ApplyContext, PreclaimContext, PreflightContext, Transactor};

/// Most tickets one account may hold, and the most one TicketCreate makes.
pub const MAX_TICKETS: u32 = 250;

/// Set aside `ticket_count` sequence numbers for later use.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketCreate {
    pub ticket_count: u32,
}

impl Transactor for TicketCreate {
    fn tx_type(&self) -> TxType {
        TxType::TicketCreate
    }

    fn required_amendments(&self) -> &'static [Amendment] {
        &[Amendment::TICKET_BATCH]
    }

    fn preflight(&self, _ctx: &PreflightContext<'_>) -> TxResult<()> {
        if !(1..=MAX_TICKETS).contains(&self.ticket_count) {
            return reject(
                ResultCode::TemInvalidCount,
                format!("ticket count {} outside 1..={MAX_TICKETS}", self.ticket_count),
            );
        }
        Ok(())
    }

    fn preclaim(&self, ctx: &PreclaimContext<'_>) -> TxResult<()> {
        let root = load_account(ctx.view, &ctx.account())?;
        // A ticket used to submit this transaction is consumed first.
        let held = root
            .ticket_count
            .saturating_sub(u32::from(ctx.common.ticket_sequence.is_some()));
        if held.saturating_add(self.ticket_count) > MAX_TICKETS {
            return reject(
                ResultCode::TecDirFull,
                format!("{held} tickets held, {MAX_TICKETS} allowed"),
            );
        }
        Ok(())
    }

    fn do_apply(&self, ctx: &mut ApplyContext<'_, '_>) -> TxResult<()> {
        let account = ctx.account();
        let mut root = load_account(&*ctx.view, &account)?;
        let reserve = ctx
            .fees()
            .account_reserve(root.owner_count.saturating_add(self.ticket_count));
        if ctx.prior_balance < reserve {
            return reject(
                ResultCode::TecInsufficientReserve,
                format!("balance {} below reserve {reserve}", ctx.prior_balance),
            );
        }

        // The preamble already advanced the sequence past this transaction.
        let first = root.sequence;
        let end = first.checked_add(self.ticket_count).ok_or_else(|| {
            TxFailure::new(ResultCode::TefInternal, "ticket sequence overflow")
        })?;
        for ticket_sequence in first..end {
            let keylet = Keylet::ticket(&account, ticket_sequence);
            ctx.view.insert_entry(
                &keylet,
                &Ticket {
                    account,
                    ticket_sequence,
                },
            )?;
            dir_insert(ctx.view, &account, keylet.key)?;
        }

        root.owner_count = root.owner_count.saturating_add(self.ticket_count);
        root.ticket_count = root.ticket_count.saturating_add(self.ticket_count);
        root.sequence = end;
        write_account(ctx.view, &root)?;
        tracing::debug!(account = %account, first, count = self.ticket_count, "tickets created");
        Ok(())
    }
}
