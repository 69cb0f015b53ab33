//! Offer negotiation: pending directed offers between participants, mutual
//! resolution, and expiry with no-op-on-already-removed semantics.

use std::collections::BTreeMap;

use contracts::{OfferKey, OfferOutcome, OfferSnapshot, SCHEMA_VERSION_V1};

/// Bookkeeping carried alongside a pending offer. Display names are captured
/// at offer time so the expiry notice can still name a target whose session
/// is gone.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingOffer {
    pub requester_name: String,
    pub target_name: String,
    pub offered_at_ms: u64,
    pub expires_at_ms: u64,
}

/// Set of outstanding directed offers, keyed by (requester, target).
///
/// Invariants: at most one entry per ordered pair; an entry disappears only
/// by being matched by its reverse or by expiry. There is no cancel or
/// renewal path.
#[derive(Debug, Default)]
pub struct OfferBook {
    offers: BTreeMap<OfferKey, PendingOffer>,
}

impl OfferBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a directed offer, resolving it against the reverse direction.
    ///
    /// On `Created` the caller is responsible for scheduling the expiry and
    /// delivering the offer notices; on `Matched` the caller must invoke pact
    /// creation exactly once.
    pub fn request(&mut self, key: OfferKey, pending: PendingOffer) -> OfferOutcome {
        if key.is_self_offer() {
            return OfferOutcome::SelfOffer;
        }

        let reverse = key.reversed();
        if self.offers.remove(&reverse).is_some() {
            // Defensive: the forward key should not coexist with its reverse,
            // but remove it too so a match always leaves both directions clear.
            self.offers.remove(&key);
            return OfferOutcome::Matched {
                partner: key.target,
            };
        }

        if self.offers.contains_key(&key) {
            return OfferOutcome::Duplicate;
        }

        self.offers.insert(key, pending);
        OfferOutcome::Created
    }

    /// Expire a directed offer. Returns the removed entry, or `None` when the
    /// key was already gone (matched earlier) — the caller must treat that as
    /// a no-op.
    pub fn expire(&mut self, key: &OfferKey) -> Option<PendingOffer> {
        self.offers.remove(key)
    }

    pub fn contains(&self, key: &OfferKey) -> bool {
        self.offers.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    pub fn snapshots(&self) -> Vec<OfferSnapshot> {
        self.offers
            .iter()
            .map(|(key, pending)| OfferSnapshot {
                schema_version: SCHEMA_VERSION_V1.to_string(),
                requester_id: key.requester.to_string(),
                requester_name: pending.requester_name.clone(),
                target_id: key.target.to_string(),
                target_name: pending.target_name.clone(),
                offered_at_ms: pending.offered_at_ms,
                expires_at_ms: pending.expires_at_ms,
            })
            .collect()
    }
}
