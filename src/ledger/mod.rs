//! In-process record of active blocks
//!
//! The ledger is the only shared mutable state in the gateway. It provides
//! idempotency (a (domain, variant) pair is blocked at most once at a time)
//! and bounded lifetimes (entries expire after the configured TTL). It is
//! volatile by design: restarts rebuild it empty, and router-side entries
//! that outlive the process are re-absorbed by the lazy idempotency check.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::RwLock;

use crate::models::{BlockOutcome, BlockVariant, BlockedEntry};
use crate::models::domain::{Domain, DomainPair};

/// TTL-bounded, insertion-ordered store of active block entries
///
/// All mutations take the write lock, so two concurrent block requests for
/// the same domain cannot both observe "not active" and create duplicates.
/// Reads take the read lock and see consistent snapshots.
pub struct BlockLedger {
    entries: RwLock<Vec<BlockedEntry>>,
    ttl: Duration,
    target_address: String,
}

impl BlockLedger {
    /// Create an empty ledger
    pub fn new(ttl: Duration, target_address: impl Into<String>) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            ttl,
            target_address: target_address.into(),
        }
    }

    /// The address blocked domains resolve to
    pub fn target_address(&self) -> &str {
        &self.target_address
    }

    /// Record a block for both variants of a domain
    ///
    /// Expired entries are swept first. For each variant without an active
    /// entry a new one is created expiring at `now + ttl`; variants that are
    /// already active are reported as such and left untouched, keeping their
    /// original expiry.
    pub async fn try_block(&self, pair: &DomainPair, now: DateTime<Utc>) -> BlockOutcome {
        let mut entries = self.entries.write().await;
        entries.retain(|e| !e.is_expired(now));

        let mut outcome = BlockOutcome::default();
        let variants = [
            (pair.root.clone(), BlockVariant::Root),
            (pair.www.clone(), BlockVariant::Www),
        ];

        for (domain, variant) in variants {
            if let Some(existing) = entries
                .iter()
                .find(|e| e.domain == domain && e.variant == variant)
            {
                outcome.already_active.push(existing.clone());
                continue;
            }

            let entry =
                BlockedEntry::new(domain, variant, self.target_address.clone(), now, self.ttl);
            entries.push(entry.clone());
            outcome.accepted.push(entry);
        }

        outcome
    }

    /// Remove entries created by a failed request
    ///
    /// Used as compensating rollback when the router could not be updated,
    /// so the ledger never lists a block that was not applied upstream.
    pub async fn rollback(&self, created: &[BlockedEntry]) {
        if created.is_empty() {
            return;
        }
        let mut entries = self.entries.write().await;
        entries.retain(|e| {
            !created
                .iter()
                .any(|c| c.domain == e.domain && c.variant == e.variant)
        });
    }

    /// Remove expired entries, returning how many were dropped
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|e| !e.is_expired(now));
        before - entries.len()
    }

    /// Active entries in insertion order
    pub async fn list_active(&self, now: DateTime<Utc>) -> Vec<BlockedEntry> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|e| !e.is_expired(now))
            .cloned()
            .collect()
    }
}
