use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A network-wide feature flag, identified by its stable name.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Amendment(&'static str);

impl Amendment {
    pub const CHECKS: Self = Self("Checks");
    pub const DISALLOW_INCOMING: Self = Self("DisallowIncoming");
    pub const CHECK_CASH_MAKES_TRUST_LINE: Self = Self("CheckCashMakesTrustLine");
    pub const AMM: Self = Self("AMM");
    pub const FIX_UNIVERSAL_NUMBER: Self = Self("fixUniversalNumber");
    pub const CLAWBACK: Self = Self("Clawback");
    pub const CREDENTIALS: Self = Self("Credentials");
    pub const TICKET_BATCH: Self = Self("TicketBatch");

    /// Every amendment this engine knows how to gate on.
    pub const KNOWN: &'static [Amendment] = &[
        Self::CHECKS,
        Self::DISALLOW_INCOMING,
        Self::CHECK_CASH_MAKES_TRUST_LINE,
        Self::AMM,
        Self::FIX_UNIVERSAL_NUMBER,
        Self::CLAWBACK,
        Self::CREDENTIALS,
        Self::TICKET_BATCH,
    ];

    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Debug for Amendment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amendment({})", self.0)
    }
}

impl fmt::Display for Amendment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// The set of amendments enabled for the ledger being built.
///
/// Names are free-form: an unknown name may be enabled and queried, it just
/// never gates anything. Engines hold an `Option<Rules>` where `None` turns
/// gating off entirely.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rules {
    enabled: BTreeSet<String>,
}

impl Rules {
    /// Nothing enabled.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every amendment in [`Amendment::KNOWN`].
    pub fn all_known() -> Self {
        Amendment::KNOWN
            .iter()
            .fold(Self::empty(), |rules, a| rules.enable(a.name()))
    }

    /// Enable a feature by name.
    pub fn enable(mut self, name: impl Into<String>) -> Self {
        self.enabled.insert(name.into());
        self
    }

    /// Whether the named feature is enabled.
    pub fn enabled(&self, name: &str) -> bool {
        self.enabled.contains(name)
    }

    /// Whether an amendment is enabled.
    pub fn has(&self, amendment: Amendment) -> bool {
        self.enabled(amendment.name())
    }

    /// Whether every listed amendment is enabled. An empty list always is.
    pub fn enabled_all(&self, required: &[Amendment]) -> bool {
        required.iter().all(|a| self.has(*a))
    }

    /// The listed amendments that are not enabled, in list order.
    pub fn missing(&self, required: &[Amendment]) -> Vec<Amendment> {
        required.iter().copied().filter(|a| !self.has(*a)).collect()
    }

    pub fn len(&self) -> usize {
        self.enabled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.enabled.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Rules {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            enabled: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_rules_enable_nothing() {
        let rules = Rules::empty();
        assert!(rules.is_empty());
        for a in Amendment::KNOWN {
            assert!(!rules.has(*a));
        }
    }

    #[test]
    fn builder_is_fluent() {
        let rules = Rules::empty().enable("Checks").enable("AMM");
        assert!(rules.has(Amendment::CHECKS));
        assert!(rules.has(Amendment::AMM));
        assert!(!rules.has(Amendment::CLAWBACK));
        assert_eq!(rules.len(), 2);
    }

    #[test]
    fn unknown_names_are_accepted_but_gate_nothing() {
        let rules = Rules::empty().enable("SomeFutureThing");
        assert!(rules.enabled("SomeFutureThing"));
        assert!(!rules.enabled("AnotherFutureThing"));
        assert!(!rules.enabled_all(Amendment::KNOWN));
    }

    #[test]
    fn enabled_all_requires_every_amendment() {
        let need = [Amendment::AMM, Amendment::FIX_UNIVERSAL_NUMBER];
        assert!(!Rules::empty().enable("AMM").enabled_all(&need));
        assert!(!Rules::empty().enable("fixUniversalNumber").enabled_all(&need));
        assert!(Rules::empty()
            .enable("AMM")
            .enable("fixUniversalNumber")
            .enabled_all(&need));
        assert!(Rules::empty().enabled_all(&[]));
    }

    #[test]
    fn missing_lists_disabled_in_order() {
        let need = [Amendment::AMM, Amendment::FIX_UNIVERSAL_NUMBER];
        let rules = Rules::empty().enable("fixUniversalNumber");
        assert_eq!(rules.missing(&need), vec![Amendment::AMM]);
    }

    #[test]
    fn names_are_case_sensitive() {
        assert!(!Rules::empty().enable("checks").has(Amendment::CHECKS));
    }

    #[test]
    fn all_known_covers_known_list() {
        assert!(Rules::all_known().enabled_all(Amendment::KNOWN));
    }

    #[test]
    fn serde_as_plain_list() {
        let rules: Rules = ["Checks", "AMM"].into_iter().collect();
        let json = serde_json::to_string(&rules).unwrap();
        assert_eq!(json, r#"["AMM","Checks"]"#);
        let back: Rules = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rules);
    }
}
