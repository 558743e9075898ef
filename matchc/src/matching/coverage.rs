//! Exhaustiveness checking of arm keys against the domain of the scrutinee.
//!
//! Keys and domain values are compared as strings: integers in decimal,
//! booleans as `true`/`false`, and string literals by their contents.

use fxhash::FxHashSet;

use crate::domain::Domain;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExhaustivenessReport {
    pub is_exhaustive: bool,
    /// Values in the domain with no arm, in domain order.
    pub missing: Vec<String>,
    /// Arm keys that are not in the domain, in arm order.
    pub extra: Vec<String>,
}

impl ExhaustivenessReport {
    fn unknown() -> ExhaustivenessReport {
        ExhaustivenessReport {
            is_exhaustive: true,
            missing: Vec::new(),
            extra: Vec::new(),
        }
    }
}

/// Compare the keys of the arms against the domain. An unknown domain is
/// always treated as exhaustive, and a wildcard makes any match exhaustive,
/// but missing values are still reported.
pub fn check_exhaustiveness(
    domain: &Domain,
    provided: &[String],
    has_wildcard: bool,
) -> ExhaustivenessReport {
    let expected = match domain {
        Domain::Known(expected) => expected,
        Domain::Unknown => return ExhaustivenessReport::unknown(),
    };

    let provided_set = provided.iter().collect::<FxHashSet<_>>();
    let expected_set = expected.iter().collect::<FxHashSet<_>>();

    let missing = (expected.iter())
        .filter(|value| !provided_set.contains(value))
        .cloned()
        .collect::<Vec<_>>();
    let extra = (provided.iter())
        .filter(|key| !expected_set.contains(key))
        .cloned()
        .collect();

    ExhaustivenessReport {
        is_exhaustive: has_wildcard || missing.is_empty(),
        missing,
        extra,
    }
}
