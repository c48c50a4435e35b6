use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of a ledger object. The value is the rippled `LedgerEntryType` code
/// and travels with every stored entry so a read can confirm what it got.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u16)]
pub enum LedgerEntryType {
    AccountRoot = 0x0061,
    DirectoryNode = 0x0064,
    RippleState = 0x0072,
    Ticket = 0x0054,
    Check = 0x0043,
    Credential = 0x0081,
    Amm = 0x0079,
}

impl LedgerEntryType {
    pub const fn code(self) -> u16 {
        self as u16
    }

    pub fn from_code(code: u16) -> Option<Self> {
        Some(match code {
            0x0061 => Self::AccountRoot,
            0x0064 => Self::DirectoryNode,
            0x0072 => Self::RippleState,
            0x0054 => Self::Ticket,
            0x0043 => Self::Check,
            0x0081 => Self::Credential,
            0x0079 => Self::Amm,
            _ => return None,
        })
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::AccountRoot => "AccountRoot",
            Self::DirectoryNode => "DirectoryNode",
            Self::RippleState => "RippleState",
            Self::Ticket => "Ticket",
            Self::Check => "Check",
            Self::Credential => "Credential",
            Self::Amm => "AMM",
        }
    }
}

impl fmt::Display for LedgerEntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_roundtrip() {
        for t in [
            LedgerEntryType::AccountRoot,
            LedgerEntryType::DirectoryNode,
            LedgerEntryType::RippleState,
            LedgerEntryType::Ticket,
            LedgerEntryType::Check,
            LedgerEntryType::Credential,
            LedgerEntryType::Amm,
        ] {
            assert_eq!(LedgerEntryType::from_code(t.code()), Some(t));
        }
        assert_eq!(LedgerEntryType::from_code(0xFFFF), None);
    }

    #[test]
    fn display_uses_ledger_name() {
        assert_eq!(LedgerEntryType::Amm.to_string(), "AMM");
        assert_eq!(LedgerEntryType::RippleState.to_string(), "RippleState");
    }
}
