use serde::{Deserialize, Serialize};
use xrpl_store::{dir_entries, lsf, AccountRoot};
use xrpl_types::{AccountId, Amendment, ResultCode};

use crate::accounts::{load_account, read_account, write_account};
use crate::error::{reject, TxResult};
use crate::transaction::{tf, TxType};
use crate::transactor::{ApplyContext, PreclaimContext, PreflightContext, Transactor};

/// Account-set flag numbers (`asf*`) for `set_flag` / `clear_flag`.
pub mod asf {
    pub const REQUIRE_DEST: u32 = 1;
    pub const REQUIRE_AUTH: u32 = 2;
    pub const DISALLOW_XRP: u32 = 3;
    pub const DISABLE_MASTER: u32 = 4;
    pub const NO_FREEZE: u32 = 6;
    pub const GLOBAL_FREEZE: u32 = 7;
    pub const DEFAULT_RIPPLE: u32 = 8;
    pub const DEPOSIT_AUTH: u32 = 9;
    pub const DISALLOW_INCOMING_CHECK: u32 = 13;
    pub const DISALLOW_INCOMING_TRUSTLINE: u32 = 15;
    pub const ALLOW_TRUSTLINE_CLAWBACK: u32 = 16;
}

/// Whether the transaction was signed by the account's master key. An
/// unsigned transaction (signature checks skipped) counts as master.
fn signed_with_master(ctx: &ApplyContext<'_, '_>) -> bool {
    let key = &ctx.common.signing_pub_key;
    key.is_empty() || key.account_id() == ctx.common.account
}

// ---------------------------------------------------------------------------
// AccountSet
// ---------------------------------------------------------------------------

/// Set or clear one account flag, plus the legacy `tf*` toggles.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSet {
    pub set_flag: Option<u32>,
    pub clear_flag: Option<u32>,
}

impl AccountSet {
    pub fn set(flag: u32) -> Self {
        Self {
            set_flag: Some(flag),
            clear_flag: None,
        }
    }

    pub fn clear(flag: u32) -> Self {
        Self {
            set_flag: None,
            clear_flag: Some(flag),
        }
    }

    fn sets(&self, asf: u32) -> bool {
        self.set_flag == Some(asf)
    }

    fn clears(&self, asf: u32) -> bool {
        self.clear_flag == Some(asf)
    }
}

/// `lsf` bit for an `asf` number, if the flag is a plain toggle under the
/// current rules.
fn toggle_bit(asf: u32, ctx: &ApplyContext<'_, '_>) -> Option<u32> {
    match asf {
        asf::REQUIRE_DEST => Some(lsf::REQUIRE_DEST_TAG),
        asf::REQUIRE_AUTH => Some(lsf::REQUIRE_AUTH),
        asf::DISALLOW_XRP => Some(lsf::DISALLOW_XRP),
        asf::DEFAULT_RIPPLE => Some(lsf::DEFAULT_RIPPLE),
        asf::DEPOSIT_AUTH => Some(lsf::DEPOSIT_AUTH),
        asf::DISALLOW_INCOMING_CHECK if ctx.enabled(Amendment::DISALLOW_INCOMING) => {
            Some(lsf::DISALLOW_INCOMING_CHECK)
        }
        asf::DISALLOW_INCOMING_TRUSTLINE if ctx.enabled(Amendment::DISALLOW_INCOMING) => {
            Some(lsf::DISALLOW_INCOMING_TRUSTLINE)
        }
        _ => None,
    }
}

impl Transactor for AccountSet {
    fn tx_type(&self) -> TxType {
        TxType::AccountSet
    }

    fn legal_flags(&self) -> u32 {
        tf::UNIVERSAL
            | tf::REQUIRE_DEST_TAG
            | tf::OPTIONAL_DEST_TAG
            | tf::REQUIRE_AUTH
            | tf::OPTIONAL_AUTH
            | tf::DISALLOW_XRP
            | tf::ALLOW_XRP
    }

    fn preflight(&self, ctx: &PreflightContext<'_>) -> TxResult<()> {
        let flags = ctx.common.flags;
        if self.set_flag.is_some() && self.set_flag == self.clear_flag {
            return reject(ResultCode::TemInvalidFlag, "same flag set and cleared");
        }
        let pairs = [
            (tf::REQUIRE_DEST_TAG, tf::OPTIONAL_DEST_TAG, asf::REQUIRE_DEST),
            (tf::REQUIRE_AUTH, tf::OPTIONAL_AUTH, asf::REQUIRE_AUTH),
            (tf::DISALLOW_XRP, tf::ALLOW_XRP, asf::DISALLOW_XRP),
        ];
        for (set, clear, asf) in pairs {
            let sets = flags & set != 0 || self.sets(asf);
            let clears = flags & clear != 0 || self.clears(asf);
            if sets && clears {
                return reject(ResultCode::TemInvalidFlag, "contradictory flags");
            }
        }
        Ok(())
    }

    fn preclaim(&self, ctx: &PreclaimContext<'_>) -> TxResult<()> {
        let flags = ctx.common.flags;
        let account = ctx.account();
        let owns_objects = || -> TxResult<bool> { Ok(!dir_entries(ctx.view, &account)?.is_empty()) };

        if (self.sets(asf::REQUIRE_AUTH) || flags & tf::REQUIRE_AUTH != 0) && owns_objects()? {
            return reject(ResultCode::TecOwners, "cannot require auth while owning objects");
        }
        if self.sets(asf::ALLOW_TRUSTLINE_CLAWBACK) && ctx.enabled(Amendment::CLAWBACK) {
            let Some(root) = read_account(ctx.view, &account)? else {
                return reject(ResultCode::TerNoAccount, "account missing");
            };
            if root.has_flag(lsf::NO_FREEZE) {
                return reject(ResultCode::TecNoPermission, "clawback conflicts with NoFreeze");
            }
            if owns_objects()? {
                return reject(ResultCode::TecOwners, "cannot allow clawback while owning objects");
            }
        }
        Ok(())
    }

    fn do_apply(&self, ctx: &mut ApplyContext<'_, '_>) -> TxResult<()> {
        let account = ctx.account();
        let mut root: AccountRoot = load_account(&*ctx.view, &account)?;
        let flags = ctx.common.flags;
        let master = signed_with_master(ctx);

        if flags & tf::REQUIRE_DEST_TAG != 0 {
            root.set_flag(lsf::REQUIRE_DEST_TAG);
        }
        if flags & tf::OPTIONAL_DEST_TAG != 0 {
            root.clear_flag(lsf::REQUIRE_DEST_TAG);
        }
        if flags & tf::REQUIRE_AUTH != 0 {
            root.set_flag(lsf::REQUIRE_AUTH);
        }
        if flags & tf::OPTIONAL_AUTH != 0 {
            root.clear_flag(lsf::REQUIRE_AUTH);
        }
        if flags & tf::DISALLOW_XRP != 0 {
            root.set_flag(lsf::DISALLOW_XRP);
        }
        if flags & tf::ALLOW_XRP != 0 {
            root.clear_flag(lsf::DISALLOW_XRP);
        }

        if let Some(asf) = self.set_flag {
            match asf {
                asf::DISABLE_MASTER => {
                    if !master {
                        return reject(ResultCode::TecNeedMasterKey, "disabling the master key needs the master key");
                    }
                    if root.regular_key.is_none() {
                        return reject(ResultCode::TecNoAlternativeKey, "no regular key to fall back on");
                    }
                    root.set_flag(lsf::DISABLE_MASTER);
                }
                asf::NO_FREEZE => {
                    if !master {
                        return reject(ResultCode::TecNeedMasterKey, "NoFreeze needs the master key");
                    }
                    root.set_flag(lsf::NO_FREEZE);
                }
                asf::GLOBAL_FREEZE => root.set_flag(lsf::GLOBAL_FREEZE),
                asf::ALLOW_TRUSTLINE_CLAWBACK if ctx.enabled(Amendment::CLAWBACK) => {
                    root.set_flag(lsf::ALLOW_TRUSTLINE_CLAWBACK);
                }
                other => {
                    if let Some(bit) = toggle_bit(other, ctx) {
                        root.set_flag(bit);
                    }
                }
            }
        }

        if let Some(asf) = self.clear_flag {
            match asf {
                asf::DISABLE_MASTER => root.clear_flag(lsf::DISABLE_MASTER),
                // NoFreeze is permanent, and it pins GlobalFreeze once set.
                asf::NO_FREEZE | asf::ALLOW_TRUSTLINE_CLAWBACK => {}
                asf::GLOBAL_FREEZE => {
                    if !root.has_flag(lsf::NO_FREEZE) {
                        root.clear_flag(lsf::GLOBAL_FREEZE);
                    }
                }
                other => {
                    if let Some(bit) = toggle_bit(other, ctx) {
                        root.clear_flag(bit);
                    }
                }
            }
        }

        write_account(ctx.view, &root)
    }
}

// ---------------------------------------------------------------------------
// SetRegularKey
// ---------------------------------------------------------------------------

/// Set, replace, or (with `None`) remove the account's regular key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetRegularKey {
    pub regular_key: Option<AccountId>,
}

impl Transactor for SetRegularKey {
    fn tx_type(&self) -> TxType {
        TxType::SetRegularKey
    }

    fn preflight(&self, ctx: &PreflightContext<'_>) -> TxResult<()> {
        if self.regular_key == Some(ctx.common.account) {
            return reject(ResultCode::TemBadRegkey, "regular key may not be the master key");
        }
        Ok(())
    }

    fn do_apply(&self, ctx: &mut ApplyContext<'_, '_>) -> TxResult<()> {
        let mut root = load_account(&*ctx.view, &ctx.account())?;
        if self.regular_key.is_none() && root.has_flag(lsf::DISABLE_MASTER) {
            return reject(ResultCode::TecNoAlternativeKey, "master key is disabled");
        }
        root.regular_key = self.regular_key;
        write_account(ctx.view, &root)
    }
}
