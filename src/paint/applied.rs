use crate::paint::model::{ActionItem, SurfacePoint};
use std::collections::HashSet;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub struct PendingAction {
    pub key: SurfacePoint,
    pub dispatched_at: Instant,
    pub item: ActionItem,
}

/// Split of the pending list around a depletion signal.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reconciliation {
    pub kept: usize,
    pub rolled_back: Vec<ActionItem>,
}

/// Confirmed and in-flight actions, keyed by surface point.
///
/// `confirmed` and `pending_keys` never overlap, and every pending key has
/// exactly one entry in `pending`.
#[derive(Debug, Clone, Default)]
pub struct AppliedState {
    confirmed: HashSet<SurfacePoint>,
    pending: Vec<PendingAction>,
    pending_keys: HashSet<SurfacePoint>,
}

impl AppliedState {
    pub fn confirmed(&self) -> &HashSet<SurfacePoint> {
        &self.confirmed
    }

    pub fn pending(&self) -> &[PendingAction] {
        &self.pending
    }

    pub fn confirmed_len(&self) -> usize {
        self.confirmed.len()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Confirmed plus in-flight, the numerator of progress.
    pub fn done(&self) -> usize {
        self.confirmed.len() + self.pending.len()
    }

    pub fn is_processed(&self, key: SurfacePoint) -> bool {
        self.confirmed.contains(&key) || self.pending_keys.contains(&key)
    }

    /// Records a dispatched action. Returns `false` and records nothing when
    /// the point is already confirmed or in flight.
    pub fn record_pending(&mut self, item: ActionItem, at: Instant) -> bool {
        let key = item.target;
        if self.is_processed(key) {
            return false;
        }
        self.pending_keys.insert(key);
        self.pending.push(PendingAction {
            key,
            dispatched_at: at,
            item,
        });
        true
    }

    /// Moves every pending action into the confirmed set.
    pub fn commit_pending(&mut self) -> usize {
        let count = self.pending.len();
        for action in self.pending.drain(..) {
            self.confirmed.insert(action.key);
        }
        self.pending_keys.clear();
        count
    }

    /// Keeps actions dispatched strictly before `observed_at` and removes the
    /// rest, returning their items in dispatch order.
    pub fn split_at(&mut self, observed_at: Instant) -> Reconciliation {
        let (kept, rejected): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|action| action.dispatched_at < observed_at);
        for action in &rejected {
            self.pending_keys.remove(&action.key);
        }
        self.pending = kept;
        Reconciliation {
            kept: self.pending.len(),
            rolled_back: rejected.into_iter().map(|action| action.item).collect(),
        }
    }

    pub fn replace_confirmed(&mut self, confirmed: HashSet<SurfacePoint>) {
        self.pending.clear();
        self.pending_keys.clear();
        self.confirmed = confirmed;
    }

    pub fn clear(&mut self) {
        self.confirmed.clear();
        self.pending.clear();
        self.pending_keys.clear();
    }

    #[cfg(test)]
    pub(crate) fn invariants_hold(&self) -> bool {
        self.confirmed.is_disjoint(&self.pending_keys)
            && self.pending.len() == self.pending_keys.len()
            && self
                .pending
                .iter()
                .all(|action| self.pending_keys.contains(&action.key))
    }
}
