use std::fmt;

use serde::{Deserialize, Serialize};
use xrpl_types::{AccountId, Currency, Hash256, Issue, LedgerEntryType};

use crate::hasher::sha512_half;

/// Single-byte namespaces mixed into every keylet hash so objects of
/// different kinds can never share a key.
mod space {
    pub const ACCOUNT: u8 = b'a';
    pub const OWNER_DIR: u8 = b'O';
    pub const TRUST_LINE: u8 = b'r';
    pub const TICKET: u8 = b'T';
    pub const CHECK: u8 = b'C';
    pub const AMM: u8 = b'A';
    pub const CREDENTIAL: u8 = b'D';
}

/// A typed ledger key: where an object lives and what kind it must be.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Keylet {
    pub entry_type: LedgerEntryType,
    pub key: Hash256,
}

impl Keylet {
    /// Wrap a key already known to hold an object of `entry_type`.
    pub const fn new(entry_type: LedgerEntryType, key: Hash256) -> Self {
        Self { entry_type, key }
    }

    /// The account root of `account`.
    pub fn account(account: &AccountId) -> Self {
        Self::derive(LedgerEntryType::AccountRoot, space::ACCOUNT, &[account.as_bytes()])
    }

    /// The owner directory listing every object `owner` is responsible for.
    pub fn owner_dir(owner: &AccountId) -> Self {
        Self::derive(LedgerEntryType::DirectoryNode, space::OWNER_DIR, &[owner.as_bytes()])
    }

    /// The trust line between two accounts for `currency`.
    ///
    /// The accounts are put in canonical (low, high) order first, so the
    /// argument order never matters.
    pub fn line(a: &AccountId, b: &AccountId, currency: &Currency) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        Self::derive(
            LedgerEntryType::RippleState,
            space::TRUST_LINE,
            &[low.as_bytes(), high.as_bytes(), currency.as_bytes()],
        )
    }

    /// The check created by `owner` with transaction sequence `sequence`.
    pub fn check(owner: &AccountId, sequence: u32) -> Self {
        Self::derive(
            LedgerEntryType::Check,
            space::CHECK,
            &[owner.as_bytes(), &sequence.to_be_bytes()],
        )
    }

    /// The ticket `owner` reserved at `sequence`.
    pub fn ticket(owner: &AccountId, sequence: u32) -> Self {
        Self::derive(
            LedgerEntryType::Ticket,
            space::TICKET,
            &[owner.as_bytes(), &sequence.to_be_bytes()],
        )
    }

    /// The credential of `credential_type` issued by `issuer` to `subject`.
    pub fn credential(subject: &AccountId, issuer: &AccountId, credential_type: &[u8]) -> Self {
        Self::derive(
            LedgerEntryType::Credential,
            space::CREDENTIAL,
            &[subject.as_bytes(), issuer.as_bytes(), credential_type],
        )
    }

    /// The AMM pool for an asset pair. Symmetric in its arguments.
    pub fn amm(a: &Issue, b: &Issue) -> Self {
        let key_a = (a.currency, a.issuer);
        let key_b = (b.currency, b.issuer);
        let (min, max) = if key_a <= key_b { (a, b) } else { (b, a) };
        Self::derive(
            LedgerEntryType::Amm,
            space::AMM,
            &[
                min.issuer.as_bytes(),
                min.currency.as_bytes(),
                max.issuer.as_bytes(),
                max.currency.as_bytes(),
            ],
        )
    }

    /// The pseudo-account that holds an AMM pool's assets.
    pub fn amm_account(amm: &Keylet) -> AccountId {
        AccountId::from_public_key(amm.key.as_bytes())
    }

    fn derive(entry_type: LedgerEntryType, space: u8, fields: &[&[u8]]) -> Self {
        let ns = [0u8, space];
        let mut parts: Vec<&[u8]> = Vec::with_capacity(fields.len() + 1);
        parts.push(&ns);
        parts.extend_from_slice(fields);
        Self {
            entry_type,
            key: sha512_half(&parts),
        }
    }
}

impl fmt::Debug for Keylet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keylet({}:{})", self.entry_type, self.key.short_hex())
    }
}

impl fmt::Display for Keylet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entry_type, self.key)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn acct(b: u8) -> AccountId {
        AccountId::from_bytes([b; 20])
    }

    fn usd() -> Currency {
        Currency::from_code("USD").unwrap()
    }

    #[test]
    fn genesis_account_root_key() {
        // Well-known AccountRoot index of the genesis account.
        let genesis: AccountId = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh".parse().unwrap();
        assert_eq!(
            Keylet::account(&genesis).key.to_hex(),
            "2B6AC232AA4C4BE41BF49D2459FA4A0347E1B543A4C92FCEE0821C0201E2E9A8"
        );
    }

    #[test]
    fn line_is_symmetric() {
        assert_eq!(Keylet::line(&acct(1), &acct(2), &usd()), Keylet::line(&acct(2), &acct(1), &usd()));
    }

    #[test]
    fn line_depends_on_currency() {
        let eur = Currency::from_code("EUR").unwrap();
        assert_ne!(Keylet::line(&acct(1), &acct(2), &usd()), Keylet::line(&acct(1), &acct(2), &eur));
    }

    #[test]
    fn check_depends_on_owner_and_sequence() {
        assert_ne!(Keylet::check(&acct(1), 5), Keylet::check(&acct(1), 6));
        assert_ne!(Keylet::check(&acct(1), 5), Keylet::check(&acct(2), 5));
        assert_eq!(Keylet::check(&acct(1), 5), Keylet::check(&acct(1), 5));
        assert_eq!(Keylet::check(&acct(1), 5).entry_type, LedgerEntryType::Check);
    }

    #[test]
    fn namespaces_separate_kinds() {
        // Same field bytes, different kinds.
        assert_ne!(Keylet::check(&acct(1), 5).key, Keylet::ticket(&acct(1), 5).key);
        assert_ne!(Keylet::account(&acct(1)).key, Keylet::owner_dir(&acct(1)).key);
    }

    #[test]
    fn credential_is_directional() {
        let k1 = Keylet::credential(&acct(1), &acct(2), b"KYC");
        let k2 = Keylet::credential(&acct(2), &acct(1), b"KYC");
        assert_ne!(k1, k2);
        assert_ne!(k1, Keylet::credential(&acct(1), &acct(2), b"AML"));
    }

    #[test]
    fn amm_is_symmetric_and_has_account() {
        let xrp = Issue::native();
        let usd = Issue::new(usd(), acct(9));
        let k = Keylet::amm(&xrp, &usd);
        assert_eq!(k, Keylet::amm(&usd, &xrp));
        assert_eq!(Keylet::amm_account(&k), Keylet::amm_account(&Keylet::amm(&usd, &xrp)));
        assert!(!Keylet::amm_account(&k).is_zero());
    }

    proptest! {
        #[test]
        fn line_commutes(
            a in proptest::array::uniform20(any::<u8>()),
            b in proptest::array::uniform20(any::<u8>()),
            code in "[A-Z]{3}",
        ) {
            prop_assume!(code != "XRP");
            let c = Currency::from_code(&code).unwrap();
            let (a, b) = (AccountId::from_bytes(a), AccountId::from_bytes(b));
            prop_assert_eq!(Keylet::line(&a, &b, &c), Keylet::line(&b, &a, &c));
        }

        #[test]
        fn distinct_checks_do_not_collide(owner in proptest::array::uniform20(any::<u8>()), s1: u32, s2: u32) {
            prop_assume!(s1 != s2);
            let owner = AccountId::from_bytes(owner);
            prop_assert_ne!(Keylet::check(&owner, s1), Keylet::check(&owner, s2));
        }
    }
}
