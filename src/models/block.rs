//! Block-related domain models
//!
//! This module defines the records the ledger keeps for active blocks and
//! the result of applying a block request.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::domain::Domain;

/// Which DNS name of a blocked domain an entry covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockVariant {
    /// The bare domain
    Root,
    /// The `www.`-prefixed form
    Www,
}

impl std::fmt::Display for BlockVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockVariant::Root => write!(f, "root"),
            BlockVariant::Www => write!(f, "www"),
        }
    }
}

/// An active block record
///
/// Two entries with the same (domain, variant) pair never coexist; the
/// ledger enforces that at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedEntry {
    /// The DNS name this entry blocks
    pub domain: Domain,

    /// Which variant of the requested domain this is
    pub variant: BlockVariant,

    /// Address the name resolves to while blocked
    pub target_address: String,

    /// When the entry was created
    pub created_at: DateTime<Utc>,

    /// When the entry expires
    pub expires_at: DateTime<Utc>,
}

impl BlockedEntry {
    /// Create an entry expiring `ttl` after `now`
    pub fn new(
        domain: Domain,
        variant: BlockVariant,
        target_address: impl Into<String>,
        now: DateTime<Utc>,
        ttl: std::time::Duration,
    ) -> Self {
        let ttl = Duration::from_std(ttl).unwrap_or_else(|_| Duration::days(1));
        Self {
            domain,
            variant,
            target_address: target_address.into(),
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// Whether the entry is expired at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Result of applying a block request to the ledger
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockOutcome {
    /// Entries newly created by this request
    pub accepted: Vec<BlockedEntry>,

    /// Entries that were already active and left untouched
    pub already_active: Vec<BlockedEntry>,
}

impl BlockOutcome {
    /// Whether nothing new was created (every variant was already blocked)
    pub fn is_noop(&self) -> bool {
        self.accepted.is_empty()
    }
}
