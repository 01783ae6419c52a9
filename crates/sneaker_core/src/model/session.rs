//! Explicit session capabilities.
//!
//! The host builds one `Session` at login and passes it to every use case that
//! needs elevated rights. Nothing in core reads an "is admin" flag from
//! storage.

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// Rights a session may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    /// Edit catalog items and append ownership history.
    EditCatalog,
}

impl Capability {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EditCatalog => "edit_catalog",
        }
    }
}

impl Display for Capability {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The current user and what they may do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    username: String,
    capabilities: BTreeSet<Capability>,
}

impl Session {
    /// Regular user: may scan and manage their own collection.
    pub fn user(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            capabilities: BTreeSet::new(),
        }
    }

    /// Administrator: may additionally edit the catalog.
    pub fn admin(username: impl Into<String>) -> Self {
        Self::user(username).with_capability(Capability::EditCatalog)
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.insert(capability);
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}
