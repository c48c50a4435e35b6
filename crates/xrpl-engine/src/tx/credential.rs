//! Credentials: attestations an issuer makes about a subject.
//!
//! A credential is created by its issuer, accepted by its subject, and
//! deleted by either party, or by anyone once it has expired. Until
//! accepted it counts against the issuer's reserve and afterwards against
//! the subject's.

use serde::{Deserialize, Serialize};
use xrpl_crypto::Keylet;
use xrpl_store::{dir_insert, dir_remove, lsf, Credential, LedgerView, LedgerViewExt, ReadView, ReadViewExt};
use xrpl_types::{AccountId, Amendment, NetTime, ResultCode};

use crate::accounts::{adjust_owner_count, check_reserve, load_account, read_account};
use crate::error::{reject, TxResult};
use crate::transaction::TxType;
use crate::transactor::{ApplyContext, PreclaimContext, PreflightContext, Transactor};

const CREDENTIALS: &[Amendment] = &[Amendment::CREDENTIALS];

pub const MAX_CREDENTIAL_TYPE_LENGTH: usize = 64;
pub const MAX_CREDENTIAL_URI_LENGTH: usize = 256;

fn check_type(credential_type: &[u8]) -> TxResult<()> {
    if credential_type.is_empty() || credential_type.len() > MAX_CREDENTIAL_TYPE_LENGTH {
        return reject(
            ResultCode::TemMalformed,
            format!("credential type must be 1 to {MAX_CREDENTIAL_TYPE_LENGTH} bytes"),
        );
    }
    Ok(())
}

fn expired(credential: &Credential, now: NetTime) -> bool {
    credential.expiration.is_some_and(|at| now.has_passed(at))
}

fn read_credential<V: ReadView + ?Sized>(view: &V, keylet: &Keylet) -> TxResult<Option<Credential>> {
    Ok(view.read_entry(keylet)?)
}

/// Unlink a credential from both directories and release its reserve.
fn delete_credential<V: LedgerView + ?Sized>(
    view: &mut V,
    keylet: &Keylet,
    credential: &Credential,
) -> TxResult<()> {
    dir_remove(view, &credential.issuer, &keylet.key)?;
    if credential.subject != credential.issuer {
        dir_remove(view, &credential.subject, &keylet.key)?;
    }
    view.erase(keylet)?;
    adjust_owner_count(view, &credential.reserve_owner(), -1)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// CredentialCreate
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialCreate {
    pub subject: AccountId,
    pub credential_type: Vec<u8>,
    pub expiration: Option<NetTime>,
    pub uri: Option<Vec<u8>>,
}

impl Transactor for CredentialCreate {
    fn tx_type(&self) -> TxType {
        TxType::CredentialCreate
    }

    fn required_amendments(&self) -> &'static [Amendment] {
        CREDENTIALS
    }

    fn preflight(&self, _ctx: &PreflightContext<'_>) -> TxResult<()> {
        if self.subject.is_zero() {
            return reject(ResultCode::TemMalformed, "no subject");
        }
        if let Some(uri) = &self.uri {
            if uri.is_empty() || uri.len() > MAX_CREDENTIAL_URI_LENGTH {
                return reject(
                    ResultCode::TemMalformed,
                    format!("URI must be 1 to {MAX_CREDENTIAL_URI_LENGTH} bytes"),
                );
            }
        }
        check_type(&self.credential_type)
    }

    fn preclaim(&self, ctx: &PreclaimContext<'_>) -> TxResult<()> {
        if read_account(ctx.view, &self.subject)?.is_none() {
            return reject(ResultCode::TecNoTarget, format!("subject {} does not exist", self.subject));
        }
        let keylet = Keylet::credential(&self.subject, &ctx.account(), &self.credential_type);
        if ctx.view.exists(&keylet)? {
            return reject(ResultCode::TecDuplicate, "credential already exists");
        }
        Ok(())
    }

    fn do_apply(&self, ctx: &mut ApplyContext<'_, '_>) -> TxResult<()> {
        let issuer = ctx.account();
        if self.expiration.is_some_and(|at| ctx.close_time().has_passed(at)) {
            return reject(ResultCode::TecExpired, "credential would already be expired");
        }
        let root = load_account(&*ctx.view, &issuer)?;
        check_reserve(ctx.prior_balance, root.owner_count.saturating_add(1), ctx.fees())?;

        let self_issued = self.subject == issuer;
        let credential = Credential {
            subject: self.subject,
            issuer,
            credential_type: self.credential_type.clone(),
            expiration: self.expiration,
            uri: self.uri.clone(),
            flags: if self_issued { lsf::ACCEPTED } else { 0 },
        };
        let keylet = Keylet::credential(&self.subject, &issuer, &self.credential_type);
        ctx.view.insert_entry(&keylet, &credential)?;
        dir_insert(ctx.view, &issuer, keylet.key)?;
        if !self_issued {
            dir_insert(ctx.view, &self.subject, keylet.key)?;
        }
        adjust_owner_count(ctx.view, &issuer, 1)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CredentialAccept
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialAccept {
    pub issuer: AccountId,
    pub credential_type: Vec<u8>,
}

impl Transactor for CredentialAccept {
    fn tx_type(&self) -> TxType {
        TxType::CredentialAccept
    }

    fn required_amendments(&self) -> &'static [Amendment] {
        CREDENTIALS
    }

    fn preflight(&self, _ctx: &PreflightContext<'_>) -> TxResult<()> {
        if self.issuer.is_zero() {
            return reject(ResultCode::TemInvalidAccountId, "no issuer");
        }
        check_type(&self.credential_type)
    }

    fn preclaim(&self, ctx: &PreclaimContext<'_>) -> TxResult<()> {
        if read_account(ctx.view, &self.issuer)?.is_none() {
            return reject(ResultCode::TecNoIssuer, format!("issuer {} does not exist", self.issuer));
        }
        let keylet = Keylet::credential(&ctx.account(), &self.issuer, &self.credential_type);
        let Some(credential) = read_credential(ctx.view, &keylet)? else {
            return reject(ResultCode::TecNoEntry, "no such credential");
        };
        if credential.is_accepted() {
            return reject(ResultCode::TecDuplicate, "credential already accepted");
        }
        Ok(())
    }

    fn do_apply(&self, ctx: &mut ApplyContext<'_, '_>) -> TxResult<()> {
        let subject = ctx.account();
        let keylet = Keylet::credential(&subject, &self.issuer, &self.credential_type);
        let Some(mut credential) = read_credential(&*ctx.view, &keylet)? else {
            return reject(ResultCode::TecNoEntry, "no such credential");
        };
        if expired(&credential, ctx.close_time()) {
            return reject(ResultCode::TecExpired, "credential has expired");
        }
        let root = load_account(&*ctx.view, &subject)?;
        check_reserve(ctx.prior_balance, root.owner_count.saturating_add(1), ctx.fees())?;

        credential.flags |= lsf::ACCEPTED;
        ctx.view.update_entry(&keylet, &credential)?;
        adjust_owner_count(ctx.view, &self.issuer, -1)?;
        adjust_owner_count(ctx.view, &subject, 1)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CredentialDelete
// ---------------------------------------------------------------------------

/// Delete a credential. Omitted parties default to the sender.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialDelete {
    pub subject: Option<AccountId>,
    pub issuer: Option<AccountId>,
    pub credential_type: Vec<u8>,
}

impl CredentialDelete {
    fn parties(&self, account: AccountId) -> (AccountId, AccountId) {
        (self.subject.unwrap_or(account), self.issuer.unwrap_or(account))
    }
}

impl Transactor for CredentialDelete {
    fn tx_type(&self) -> TxType {
        TxType::CredentialDelete
    }

    fn required_amendments(&self) -> &'static [Amendment] {
        CREDENTIALS
    }

    fn preflight(&self, _ctx: &PreflightContext<'_>) -> TxResult<()> {
        if self.subject.is_none() && self.issuer.is_none() {
            return reject(ResultCode::TemMalformed, "neither subject nor issuer given");
        }
        if self.subject.is_some_and(|a| a.is_zero()) || self.issuer.is_some_and(|a| a.is_zero()) {
            return reject(ResultCode::TemInvalidAccountId, "zero account");
        }
        check_type(&self.credential_type)
    }

    fn preclaim(&self, ctx: &PreclaimContext<'_>) -> TxResult<()> {
        let account = ctx.account();
        let (subject, issuer) = self.parties(account);
        let keylet = Keylet::credential(&subject, &issuer, &self.credential_type);
        let Some(credential) = read_credential(ctx.view, &keylet)? else {
            return reject(ResultCode::TecNoEntry, "no such credential");
        };
        if account != subject && account != issuer && !expired(&credential, ctx.close_time()) {
            return reject(ResultCode::TecNoPermission, "only a party may delete a live credential");
        }
        Ok(())
    }

    fn do_apply(&self, ctx: &mut ApplyContext<'_, '_>) -> TxResult<()> {
        let (subject, issuer) = self.parties(ctx.account());
        let keylet = Keylet::credential(&subject, &issuer, &self.credential_type);
        let Some(credential) = read_credential(&*ctx.view, &keylet)? else {
            return reject(ResultCode::TecNoEntry, "no such credential");
        };
        delete_credential(ctx.view, &keylet, &credential)
    }
}
