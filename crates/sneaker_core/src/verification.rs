//! Trusted-identifier registry.
//!
//! # Responsibility
//! - Answer "is this tag id attested authentic?" for the scan flow.
//!
//! # Invariants
//! - Lookups are pure: no I/O, no errors, same answer for the same input.
//! - The set is fixed at construction; catalog presence never implies
//!   verification.

use std::collections::BTreeSet;

/// Ids attested authentic in the shipped build.
pub const DEFAULT_VERIFIED_IDS: &[&str] = &[
    "b8141245-3ae5-491d-8b52-429c070b7aef",
    "d3b59a87-86f4-473a-8a96-78f5ccee853b",
];

/// Read-only membership oracle over trusted ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRegistry {
    trusted: BTreeSet<String>,
}

impl VerificationRegistry {
    /// Builds a registry from `ids`. Entries are trimmed; blank ones dropped.
    pub fn new<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let trusted = ids
            .into_iter()
            .map(|id| id.as_ref().trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();
        Self { trusted }
    }

    pub fn is_verified(&self, id: &str) -> bool {
        !id.is_empty() && self.trusted.contains(id)
    }

    pub fn len(&self) -> usize {
        self.trusted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trusted.is_empty()
    }
}

impl Default for VerificationRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_VERIFIED_IDS)
    }
}
