use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The band a [`ResultCode`] belongs to.
///
/// Bands carry the retry/claim semantics; numeric order across bands means
/// nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultBand {
    /// Local error: never forwarded, never charged.
    Tel,
    /// Malformed: can never succeed in any ledger state.
    Tem,
    /// Failure: invalid in the current context, not retried.
    Tef,
    /// Retry: may succeed later in the same open ledger.
    Ter,
    /// Success.
    Tes,
    /// Claimed cost: included, fee charged, intended effect not applied.
    Tec,
}

macro_rules! result_codes {
    ($( $variant:ident = $value:literal, $name:literal, $message:literal; )+) => {
        /// Canonical outcome of applying a transaction.
        ///
        /// The set is closed. Each code has a stable integer value, a
        /// symbolic name (`Display`) and a fixed human-readable message that
        /// never depends on ledger state.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum ResultCode {
            $( $variant, )+
        }

        impl ResultCode {
            /// Every code, in declaration order.
            pub const ALL: &'static [ResultCode] = &[ $( ResultCode::$variant, )+ ];

            /// The stable integer value.
            pub const fn code(self) -> i32 {
                match self {
                    $( ResultCode::$variant => $value, )+
                }
            }

            /// Short symbolic name, e.g. `temDISABLED`.
            pub const fn name(self) -> &'static str {
                match self {
                    $( ResultCode::$variant => $name, )+
                }
            }

            /// Human-readable description.
            pub const fn message(self) -> &'static str {
                match self {
                    $( ResultCode::$variant => $message, )+
                }
            }

            /// Look a code up by integer value.
            pub fn from_code(value: i32) -> Option<Self> {
                match value {
                    $( $value => Some(ResultCode::$variant), )+
                    _ => None,
                }
            }

            /// Look a code up by symbolic name.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $( $name => Some(ResultCode::$variant), )+
                    _ => None,
                }
            }
        }
    };
}

result_codes! {
    // tel: -399 ..= -300
    TelLocalError = -399, "telLOCAL_ERROR", "Local failure.";
    TelBadPublicKey = -396, "telBAD_PUBLIC_KEY", "Public key is not valid.";
    TelInsufFeeP = -394, "telINSUF_FEE_P", "Fee insufficient.";
    TelNoDstPartial = -393, "telNO_DST_PARTIAL", "Partial payment to create account not allowed.";

    // tem: -299 ..= -200
    TemMalformed = -299, "temMALFORMED", "Malformed transaction.";
    TemBadAmount = -298, "temBAD_AMOUNT", "Malformed: Bad amount.";
    TemBadCurrency = -297, "temBAD_CURRENCY", "Malformed: Bad currency.";
    TemBadExpiration = -296, "temBAD_EXPIRATION", "Malformed: Bad expiration.";
    TemBadFee = -295, "temBAD_FEE", "Invalid fee, negative or not XRP.";
    TemBadIssuer = -294, "temBAD_ISSUER", "Malformed: Bad issuer.";
    TemBadLimit = -293, "temBAD_LIMIT", "Limits must be non-negative.";
    TemBadRegkey = -289, "temBAD_REGKEY", "Malformed: Regular key cannot be same as master key.";
    TemBadSendXrpLimit = -288, "temBAD_SEND_XRP_LIMIT", "Malformed: Limit quality is not allowed for XRP to XRP.";
    TemBadSendXrpMax = -287, "temBAD_SEND_XRP_MAX", "Malformed: Send max is not allowed for XRP to XRP.";
    TemBadSendXrpNoDirect = -286, "temBAD_SEND_XRP_NO_DIRECT", "Malformed: No Ripple direct is not allowed for XRP to XRP.";
    TemBadSendXrpPartial = -285, "temBAD_SEND_XRP_PARTIAL", "Malformed: Partial payment is not allowed for XRP to XRP.";
    TemBadSignature = -282, "temBAD_SIGNATURE", "Malformed: Bad signature.";
    TemBadSrcAccount = -281, "temBAD_SRC_ACCOUNT", "Malformed: Bad source account.";
    TemDstIsSrc = -279, "temDST_IS_SRC", "Destination may not be source.";
    TemDstNeeded = -278, "temDST_NEEDED", "Destination not specified.";
    TemInvalid = -277, "temINVALID", "The transaction is ill-formed.";
    TemInvalidFlag = -276, "temINVALID_FLAG", "The transaction has an invalid flag.";
    TemRedundant = -275, "temREDUNDANT", "The transaction is redundant.";
    TemDisabled = -273, "temDISABLED", "The transaction requires an amendment that is not enabled.";
    TemInvalidAccountId = -268, "temINVALID_ACCOUNT_ID", "Malformed: A field contains an invalid account ID.";
    TemInvalidCount = -266, "temINVALID_COUNT", "Malformed: Count field outside valid range.";
    TemSeqAndTicket = -263, "temSEQ_AND_TICKET", "Transaction contains a TicketSequence and a non-zero Sequence.";
    TemBadAmmTokens = -261, "temBAD_AMM_TOKENS", "Malformed: Invalid LPTokens.";

    // tef: -199 ..= -100
    TefFailure = -199, "tefFAILURE", "Failed to apply.";
    TefBadAuth = -196, "tefBAD_AUTH", "Transaction's public key is not authorized.";
    TefBadLedger = -195, "tefBAD_LEDGER", "Ledger in unexpected state.";
    TefInternal = -192, "tefINTERNAL", "Internal error.";
    TefNoAuthRequired = -191, "tefNO_AUTH_REQUIRED", "Auth is not required.";
    TefPastSeq = -190, "tefPAST_SEQ", "This sequence number has already passed.";
    TefMasterDisabled = -188, "tefMASTER_DISABLED", "Master key is disabled.";
    TefMaxLedger = -187, "tefMAX_LEDGER", "Ledger sequence too high.";
    TefBadAuthMaster = -183, "tefBAD_AUTH_MASTER", "Auth for unclaimed account needs correct master key.";
    TefInvariantFailed = -182, "tefINVARIANT_FAILED", "Fee claim violated invariants for the transaction.";
    TefNoTicket = -180, "tefNO_TICKET", "Ticket is not in ledger.";

    // ter: -99 ..= -1
    TerRetry = -99, "terRETRY", "Retry transaction.";
    TerInsufFeeB = -97, "terINSUF_FEE_B", "Account balance can't pay fee.";
    TerNoAccount = -96, "terNO_ACCOUNT", "The source account does not exist.";
    TerNoAuth = -95, "terNO_AUTH", "Not authorized to hold IOUs.";
    TerNoLine = -94, "terNO_LINE", "No such line.";
    TerPreSeq = -92, "terPRE_SEQ", "Missing/inapplicable prior transaction.";
    TerNoRipple = -90, "terNO_RIPPLE", "Path does not permit rippling.";
    TerPreTicket = -88, "terPRE_TICKET", "Ticket is not yet in ledger.";

    // tes: 0
    TesSuccess = 0, "tesSUCCESS", "The transaction was applied. Only final in a validated ledger.";

    // tec: 100 ..
    TecClaim = 100, "tecCLAIM", "Fee claimed. Sequence used. No action.";
    TecPathPartial = 101, "tecPATH_PARTIAL", "Path could not send full amount.";
    TecUnfundedPayment = 104, "tecUNFUNDED_PAYMENT", "Insufficient XRP balance to send.";
    TecDirFull = 121, "tecDIR_FULL", "Can not add entry to full directory.";
    TecInsufReserveLine = 122, "tecINSUF_RESERVE_LINE", "Insufficient reserve to add trust line.";
    TecNoDst = 124, "tecNO_DST", "Destination does not exist. Send XRP to create it.";
    TecNoDstInsufXrp = 125, "tecNO_DST_INSUF_XRP", "Destination does not exist. Too little XRP sent to create it.";
    TecNoLineInsufReserve = 126, "tecNO_LINE_INSUF_RESERVE", "No such line. Too little reserve to create it.";
    TecNoLineRedundant = 127, "tecNO_LINE_REDUNDANT", "Can't set non-existent line to default.";
    TecPathDry = 128, "tecPATH_DRY", "Path could not send partial amount.";
    TecNoAlternativeKey = 130, "tecNO_ALTERNATIVE_KEY", "The operation would remove the ability to sign transactions with the account.";
    TecNoRegularKey = 131, "tecNO_REGULAR_KEY", "Regular key is not set.";
    TecOwners = 132, "tecOWNERS", "Non-zero owner count.";
    TecNoIssuer = 133, "tecNO_ISSUER", "Issuer account does not exist.";
    TecNoAuth = 134, "tecNO_AUTH", "Not authorized to hold asset.";
    TecNoLine = 135, "tecNO_LINE", "No such line.";
    TecFrozen = 137, "tecFROZEN", "Asset is frozen.";
    TecNoTarget = 138, "tecNO_TARGET", "Target account does not exist.";
    TecNoPermission = 139, "tecNO_PERMISSION", "No permission to perform requested operation.";
    TecNoEntry = 140, "tecNO_ENTRY", "No matching entry found.";
    TecInsufficientReserve = 141, "tecINSUFFICIENT_RESERVE", "Insufficient reserve to complete requested operation.";
    TecNeedMasterKey = 142, "tecNEED_MASTER_KEY", "The operation requires the use of the Master Key.";
    TecDstTagNeeded = 143, "tecDST_TAG_NEEDED", "A destination tag is required.";
    TecInternal = 144, "tecINTERNAL", "An internal error has occurred during processing.";
    TecInvariantFailed = 147, "tecINVARIANT_FAILED", "One or more invariants for the transaction were not satisfied.";
    TecExpired = 148, "tecEXPIRED", "Expiration time is passed.";
    TecDuplicate = 149, "tecDUPLICATE", "Ledger object already exists.";
    TecInsufficientFunds = 159, "tecINSUFFICIENT_FUNDS", "Not enough funds available to complete requested transaction.";
    TecUnfundedAmm = 162, "tecUNFUNDED_AMM", "Insufficient balance to fund AMM.";
}

impl ResultCode {
    /// The band this code belongs to.
    pub const fn band(self) -> ResultBand {
        match self.code() {
            -399..=-300 => ResultBand::Tel,
            -299..=-200 => ResultBand::Tem,
            -199..=-100 => ResultBand::Tef,
            -99..=-1 => ResultBand::Ter,
            0 => ResultBand::Tes,
            _ => ResultBand::Tec,
        }
    }

    pub const fn is_tel(self) -> bool {
        matches!(self.band(), ResultBand::Tel)
    }

    pub const fn is_tem(self) -> bool {
        matches!(self.band(), ResultBand::Tem)
    }

    pub const fn is_tef(self) -> bool {
        matches!(self.band(), ResultBand::Tef)
    }

    pub const fn is_ter(self) -> bool {
        matches!(self.band(), ResultBand::Ter)
    }

    pub const fn is_tec(self) -> bool {
        matches!(self.band(), ResultBand::Tec)
    }

    pub const fn is_success(self) -> bool {
        matches!(self, ResultCode::TesSuccess)
    }

    /// Included in a ledger: `tes` or `tec`. For `tec` only the fee and
    /// sequence take effect.
    pub const fn is_applied(self) -> bool {
        self.is_success() || self.is_tec()
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ResultCode {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| TypeError::UnknownResultCode(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn tem_disabled_name_and_message() {
        let code = ResultCode::TemDisabled;
        assert_eq!(code.to_string(), "temDISABLED");
        assert_eq!(
            code.message(),
            "The transaction requires an amendment that is not enabled."
        );
        assert!(code.is_tem());
        assert!(!code.is_success());
    }

    #[test]
    fn success_is_the_only_tes() {
        let tes: Vec<_> = ResultCode::ALL
            .iter()
            .filter(|c| c.band() == ResultBand::Tes)
            .collect();
        assert_eq!(tes, vec![&ResultCode::TesSuccess]);
    }

    #[test]
    fn every_code_sits_in_exactly_one_band() {
        for code in ResultCode::ALL {
            let hits = [
                code.is_tel(),
                code.is_tem(),
                code.is_tef(),
                code.is_ter(),
                code.is_success(),
                code.is_tec(),
            ]
            .iter()
            .filter(|b| **b)
            .count();
            assert_eq!(hits, 1, "{code} matched {hits} bands");
        }
    }

    #[test]
    fn names_carry_their_band_prefix() {
        for code in ResultCode::ALL {
            let prefix = match code.band() {
                ResultBand::Tel => "tel",
                ResultBand::Tem => "tem",
                ResultBand::Tef => "tef",
                ResultBand::Ter => "ter",
                ResultBand::Tes => "tes",
                ResultBand::Tec => "tec",
            };
            assert!(code.name().starts_with(prefix), "{code}");
        }
    }

    #[test]
    fn values_and_names_are_unique() {
        let values: HashSet<_> = ResultCode::ALL.iter().map(|c| c.code()).collect();
        let names: HashSet<_> = ResultCode::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(values.len(), ResultCode::ALL.len());
        assert_eq!(names.len(), ResultCode::ALL.len());
    }

    #[test]
    fn lookup_by_value_and_name() {
        for code in ResultCode::ALL {
            assert_eq!(ResultCode::from_code(code.code()), Some(*code));
            assert_eq!(code.name().parse::<ResultCode>().unwrap(), *code);
        }
        assert_eq!(ResultCode::from_code(12345), None);
        assert!("tecNOPE".parse::<ResultCode>().is_err());
    }

    #[test]
    fn applied_means_tes_or_tec() {
        assert!(ResultCode::TesSuccess.is_applied());
        assert!(ResultCode::TecNoPermission.is_applied());
        assert!(!ResultCode::TemMalformed.is_applied());
        assert!(!ResultCode::TefPastSeq.is_applied());
        assert!(!ResultCode::TerPreSeq.is_applied());
        assert!(!ResultCode::TelInsufFeeP.is_applied());
    }

    #[test]
    fn messages_are_non_empty() {
        assert!(ResultCode::ALL.iter().all(|c| !c.message().is_empty()));
    }
}
