//! Matching requirements: what a node needs to know about a subject before
//! it can execute a query against its own data set.

use std::collections::BTreeSet;

use crate::wire::IdentityAttribute;

/// A named way a matching process can gain confidence in an identity match,
/// e.g. a supplementary identifier held by another party.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfidenceAttribute {
    name: String,
    description: String,
}

impl ConfidenceAttribute {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// The identity attributes an implementing node requires for a query.
///
/// Each set is optional: an absent set is distinct from a present-but-empty
/// one. Ordered sets keep equality and hashing independent of input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MatchingRequirements {
    required: Option<BTreeSet<IdentityAttribute>>,
    disambiguators: Option<BTreeSet<IdentityAttribute>>,
    confidence: Option<BTreeSet<ConfidenceAttribute>>,
}

impl MatchingRequirements {
    pub fn new(
        required: Option<BTreeSet<IdentityAttribute>>,
        disambiguators: Option<BTreeSet<IdentityAttribute>>,
        confidence: Option<BTreeSet<ConfidenceAttribute>>,
    ) -> Self {
        Self {
            required,
            disambiguators,
            confidence,
        }
    }

    pub fn required(&self) -> Option<&BTreeSet<IdentityAttribute>> {
        self.required.as_ref()
    }

    pub fn disambiguators(&self) -> Option<&BTreeSet<IdentityAttribute>> {
        self.disambiguators.as_ref()
    }

    pub fn confidence(&self) -> Option<&BTreeSet<ConfidenceAttribute>> {
        self.confidence.as_ref()
    }
}
