use std::fmt;

use serde::{Deserialize, Serialize};
use xrpl_crypto::{prefixed_hash, HashPrefix, PublicKey, SigningKey};
use xrpl_store::codec;
use xrpl_types::{AccountId, Amount, Hash256};

use crate::error::EngineError;
use crate::transactor::Transactor;
use crate::tx::{
    AccountSet, AmmCreate, CheckCancel, CheckCash, CheckCreate, Clawback, CredentialAccept,
    CredentialCreate, CredentialDelete, Payment, SetRegularKey, TicketCreate, TrustSet,
};

/// Transaction flags (`tf*`). Each transaction type accepts
/// [`tf::UNIVERSAL`] plus its own bits.
pub mod tf {
    pub const FULLY_CANONICAL_SIG: u32 = 0x8000_0000;
    pub const UNIVERSAL: u32 = FULLY_CANONICAL_SIG;

    // Payment
    pub const NO_RIPPLE_DIRECT: u32 = 0x0001_0000;
    pub const PARTIAL_PAYMENT: u32 = 0x0002_0000;
    pub const LIMIT_QUALITY: u32 = 0x0004_0000;

    // TrustSet
    pub const SET_AUTH: u32 = 0x0001_0000;
    pub const SET_NO_RIPPLE: u32 = 0x0002_0000;
    pub const CLEAR_NO_RIPPLE: u32 = 0x0004_0000;
    pub const SET_FREEZE: u32 = 0x0010_0000;
    pub const CLEAR_FREEZE: u32 = 0x0020_0000;

    // AccountSet
    pub const REQUIRE_DEST_TAG: u32 = 0x0001_0000;
    pub const OPTIONAL_DEST_TAG: u32 = 0x0002_0000;
    pub const REQUIRE_AUTH: u32 = 0x0004_0000;
    pub const OPTIONAL_AUTH: u32 = 0x0008_0000;
    pub const DISALLOW_XRP: u32 = 0x0010_0000;
    pub const ALLOW_XRP: u32 = 0x0020_0000;
}

/// Transaction type tag, with the network's numeric codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u16)]
pub enum TxType {
    Payment = 0,
    AccountSet = 3,
    SetRegularKey = 5,
    TicketCreate = 10,
    CheckCreate = 16,
    CheckCash = 17,
    CheckCancel = 18,
    TrustSet = 20,
    Clawback = 30,
    AmmCreate = 35,
    CredentialCreate = 58,
    CredentialAccept = 59,
    CredentialDelete = 60,
}

impl TxType {
    pub const fn code(self) -> u16 {
        self as u16
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Payment => "Payment",
            Self::AccountSet => "AccountSet",
            Self::SetRegularKey => "SetRegularKey",
            Self::TicketCreate => "TicketCreate",
            Self::CheckCreate => "CheckCreate",
            Self::CheckCash => "CheckCash",
            Self::CheckCancel => "CheckCancel",
            Self::TrustSet => "TrustSet",
            Self::Clawback => "Clawback",
            Self::AmmCreate => "AMMCreate",
            Self::CredentialCreate => "CredentialCreate",
            Self::CredentialAccept => "CredentialAccept",
            Self::CredentialDelete => "CredentialDelete",
        }
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fields every transaction carries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonFields {
    pub account: AccountId,
    /// Must be native.
    pub fee: Amount,
    /// Zero when a ticket is used instead.
    pub sequence: u32,
    pub ticket_sequence: Option<u32>,
    pub flags: u32,
    pub last_ledger_sequence: Option<u32>,
    pub source_tag: Option<u32>,
    pub signing_pub_key: PublicKey,
    pub txn_signature: Vec<u8>,
}

impl CommonFields {
    /// The sequence value the transaction consumes: its ticket if it has
    /// one, otherwise its sequence.
    pub fn seq_proxy(&self) -> u32 {
        self.ticket_sequence.unwrap_or(self.sequence)
    }
}

macro_rules! tx_kinds {
    ($( $variant:ident($ty:ident) ),+ $(,)?) => {
        /// The type-specific body of a transaction.
        #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
        pub enum TxKind {
            $( $variant($ty), )+
        }

        impl TxKind {
            /// The rules for this body.
            pub fn transactor(&self) -> &dyn Transactor {
                match self {
                    $( TxKind::$variant(tx) => tx, )+
                }
            }
        }

        $(
            impl From<$ty> for TxKind {
                fn from(tx: $ty) -> Self {
                    TxKind::$variant(tx)
                }
            }
        )+
    };
}

tx_kinds! {
    Payment(Payment),
    AccountSet(AccountSet),
    SetRegularKey(SetRegularKey),
    TrustSet(TrustSet),
    TicketCreate(TicketCreate),
    CheckCreate(CheckCreate),
    CheckCash(CheckCash),
    CheckCancel(CheckCancel),
    Clawback(Clawback),
    CredentialCreate(CredentialCreate),
    CredentialAccept(CredentialAccept),
    CredentialDelete(CredentialDelete),
    AmmCreate(AmmCreate),
}

/// A submitted transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub common: CommonFields,
    pub kind: TxKind,
}

impl Transaction {
    /// A transaction paying the default 10-drop fee, with no flags and no
    /// signature.
    pub fn new(account: AccountId, sequence: u32, kind: impl Into<TxKind>) -> Self {
        Self {
            common: CommonFields {
                account,
                fee: Amount::drops(10),
                sequence,
                ticket_sequence: None,
                flags: 0,
                last_ledger_sequence: None,
                source_tag: None,
                signing_pub_key: PublicKey::from_bytes(Vec::new()),
                txn_signature: Vec::new(),
            },
            kind: kind.into(),
        }
    }

    pub fn with_fee(mut self, fee: Amount) -> Self {
        self.common.fee = fee;
        self
    }

    pub fn with_flags(mut self, flags: u32) -> Self {
        self.common.flags = flags;
        self
    }

    /// Use a ticket instead of a sequence number.
    pub fn with_ticket(mut self, ticket_sequence: u32) -> Self {
        self.common.sequence = 0;
        self.common.ticket_sequence = Some(ticket_sequence);
        self
    }

    pub fn with_last_ledger_sequence(mut self, ledger: u32) -> Self {
        self.common.last_ledger_sequence = Some(ledger);
        self
    }

    pub fn transactor(&self) -> &dyn Transactor {
        self.kind.transactor()
    }

    pub fn tx_type(&self) -> TxType {
        self.transactor().tx_type()
    }

    /// Bytes a single signer signs: `"STX\0"` and the canonical encoding
    /// with the signature cleared.
    pub fn signing_data(&self) -> Result<Vec<u8>, EngineError> {
        let mut unsigned = self.clone();
        unsigned.common.txn_signature.clear();
        let body = codec::to_canonical_bytes(&unsigned)?;
        let mut out = Vec::with_capacity(body.len() + 4);
        out.extend_from_slice(HashPrefix::TX_SIGN.as_bytes());
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Transaction ID: SHA-512Half over `"TXN\0"` and the signed encoding.
    pub fn id(&self) -> Result<Hash256, EngineError> {
        let body = codec::to_canonical_bytes(self)?;
        Ok(prefixed_hash(HashPrefix::TRANSACTION_ID, &body))
    }

    /// Set the signing key and sign.
    pub fn sign(&mut self, key: &SigningKey) -> Result<(), EngineError> {
        self.common.signing_pub_key = key.public_key();
        let data = self.signing_data()?;
        self.common.txn_signature = key.sign(&data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use xrpl_crypto::{Ed25519Verifier, SignatureVerifier};

    use super::*;

    fn cancel() -> Transaction {
        Transaction::new(
            AccountId::from_bytes([1; 20]),
            5,
            CheckCancel {
                check_id: Hash256::from_hash([2; 32]),
            },
        )
    }

    #[test]
    fn dispatch_reports_type() {
        assert_eq!(cancel().tx_type(), TxType::CheckCancel);
        assert_eq!(TxType::AmmCreate.to_string(), "AMMCreate");
        assert_eq!(TxType::CheckCreate.code(), 16);
    }

    #[test]
    fn ticket_replaces_sequence() {
        let tx = cancel().with_ticket(9);
        assert_eq!(tx.common.sequence, 0);
        assert_eq!(tx.common.seq_proxy(), 9);
        assert_eq!(cancel().common.seq_proxy(), 5);
    }

    #[test]
    fn signature_covers_signing_data() {
        let key = SigningKey::from_bytes([7; 32]);
        let mut tx = cancel();
        tx.sign(&key).unwrap();
        let data = tx.signing_data().unwrap();
        assert!(data.starts_with(b"STX\0"));
        assert!(Ed25519Verifier
            .verify(&tx.common.signing_pub_key, &data, &tx.common.txn_signature)
            .is_ok());
    }

    #[test]
    fn signing_data_ignores_signature() {
        let mut a = cancel();
        let b = cancel();
        a.common.txn_signature = vec![1, 2, 3];
        assert_eq!(a.signing_data().unwrap(), b.signing_data().unwrap());
    }

    #[test]
    fn id_changes_with_contents() {
        let a = cancel();
        let b = cancel().with_fee(Amount::drops(12));
        assert_eq!(a.id().unwrap(), cancel().id().unwrap());
        assert_ne!(a.id().unwrap(), b.id().unwrap());
    }
}
