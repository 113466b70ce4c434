//! # Type Names
//!
//! The remote service names object types in `PascalCase` (`JobPart`) and their
//! attributes, relationship accessors and request fields in `camelCase`
//! (`jobPart`). Most names convert by flipping the case of the first letter;
//! acronym-heavy types (`GLAccount` <-> `glAccount`) are looked up in
//! [`IRREGULAR_NAMES`] instead.

pub mod inflector;

pub use inflector::{EnglishInflector, Inflector};

use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;

/// `(property name, type name)` pairs that cannot be derived mechanically.
pub const IRREGULAR_NAMES: &[(&str, &str)] = &[
    ("apSetup", "APSetup"),
    ("arSetup", "ARSetup"),
    ("crmSetup", "CRMSetup"),
    ("crmStatus", "CRMStatus"),
    ("crmUser", "CRMUser"),
    ("csr", "CSR"),
    ("dsfMediaSize", "DSFMediaSize"),
    ("dsfOrderStatus", "DSFOrderStatus"),
    ("faSetup", "FASetup"),
    ("glAccount", "GLAccount"),
    ("glAccountBalance", "GLAccountBalance"),
    ("glAccountBalanceSummary", "GLAccountBalanceSummary"),
    ("glAccountBudget", "GLAccountBudget"),
    ("glAccountingPeriod", "GLAccountingPeriod"),
    ("glBatch", "GLBatch"),
    ("glDepartment", "GLDepartment"),
    ("glDepartmentLocation", "GLDepartmentLocation"),
    ("glJournalEntry", "GLJournalEntry"),
    ("glJournalEntryAudit", "GLJournalEntryAudit"),
    ("glLocation", "GLLocation"),
    ("glRegisterNumber", "GLRegisterNumber"),
    ("glSchedule", "GLSchedule"),
    ("glScheduleLine", "GLScheduleLine"),
    ("glSetup", "GLSetup"),
    ("glSplit", "GLSplit"),
    ("glSummaryName", "GLSummaryName"),
    ("jmfReceivedMessage", "JMFReceivedMessage"),
    ("jmfReceivedMessagePartition", "JMFReceivedMessagePartition"),
    ("jmfReceivedMessageTransaction", "JMFReceivedMessageTransaction"),
    (
        "jmfReceivedMessageTransactionPartition",
        "JMFReceivedMessageTransactionPartition",
    ),
    ("poSetup", "POSetup"),
    ("poStatus", "POStatus"),
    ("rssChannel", "RSSChannel"),
    ("uom", "UOM"),
    ("uomDimension", "UOMDimension"),
    ("uomRange", "UOMRange"),
    ("uomSetup", "UOMSetup"),
    ("uomType", "UOMType"),
    ("wipCategory", "WIPCategory"),
];

/// Convert a type name to its camel-cased property name.
pub fn to_property_name(type_name: &str) -> String {
    IRREGULAR_NAMES
        .iter()
        .find(|(_, irregular)| *irregular == type_name)
        .map(|(property, _)| property.to_string())
        .unwrap_or_else(|| lower_first(type_name))
}

/// Convert a camel-cased property name to its type name.
pub fn to_type_name(property: &str) -> String {
    IRREGULAR_NAMES
        .iter()
        .find(|(irregular, _)| *irregular == property)
        .map(|(_, type_name)| type_name.to_string())
        .unwrap_or_else(|| upper_first(property))
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A validated remote object type name such as `Job`, `ChangeOrderLine` or `CSR`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TypeName(String);

impl TypeName {
    /// Validate a `CapitalizedWords` type name.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let mut chars = name.chars();
        let valid = chars.next().is_some_and(|c| c.is_ascii_uppercase())
            && chars.all(|c| c.is_ascii_alphanumeric());

        if !valid {
            return Err(Error::InvalidFormat(name));
        }
        Ok(Self(name))
    }

    /// Build a type name from a camel-cased property name (`crmUser` -> `CRMUser`).
    pub fn from_property(property: &str) -> Result<Self> {
        Self::new(to_type_name(property))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn property_name(&self) -> String {
        to_property_name(&self.0)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TypeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for TypeName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for TypeName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
