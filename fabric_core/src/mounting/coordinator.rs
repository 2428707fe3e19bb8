// Copyright 2026 the Fabric Core Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-surface hand-off point between committing and mounting threads.

use std::collections::VecDeque;

use parking_lot::Mutex;

use super::transaction::MountingTransaction;
use crate::node::SurfaceId;
use crate::trace::{Tracer, TransactionEvent, TransactionOp};

/// Applies transactions to a host view hierarchy.
pub trait MountingConsumer {
    /// Applies every mutation of `transaction` in order.
    fn apply(&mut self, transaction: &MountingTransaction);
}

/// Bounds on how much undelivered work a coordinator keeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MountingConfig {
    /// Pending transactions kept before the oldest ones are merged.
    ///
    /// Values below 1 are treated as 1.
    pub max_pending: usize,
}

impl MountingConfig {
    /// Never merge on push.
    pub const UNBOUNDED: Self = Self {
        max_pending: usize::MAX,
    };

    /// Merge once `max_pending` transactions are waiting.
    #[must_use]
    pub const fn bounded(max_pending: usize) -> Self {
        Self { max_pending }
    }
}

impl Default for MountingConfig {
    fn default() -> Self {
        Self::bounded(64)
    }
}

#[derive(Debug, Default)]
struct PendingQueue {
    items: VecDeque<MountingTransaction>,
    last_pushed: Option<u64>,
    last_delivered: Option<u64>,
    revoked: bool,
    coalesced_count: u64,
}

impl PendingQueue {
    fn mark_delivered(&mut self, number: u64) {
        if let Some(last) = self.last_delivered {
            assert!(number > last, "transaction {number} delivered after {last}");
        }
        self.last_delivered = Some(number);
    }
}

/// FIFO of committed-but-unmounted transactions for one surface.
///
/// The committing thread [`push`](Self::push)es; a mounting thread
/// [`pull`](Self::pull)s or drains with
/// [`pull_aggregated`](Self::pull_aggregated). Both sides take the queue
/// lock only long enough to move a transaction in or out, and neither ever
/// waits for the other. `pull` returning `None` means "nothing yet; poll
/// again later".
///
/// When `max_pending` transactions are waiting, the two oldest are merged
/// into one, so a stalled consumer costs memory proportional to the changes
/// rather than to the number of commits, and nothing is lost.
#[derive(Debug)]
pub struct MountingCoordinator {
    surface_id: SurfaceId,
    config: MountingConfig,
    queue: Mutex<PendingQueue>,
    tracer: Tracer,
}

impl MountingCoordinator {
    /// Creates an empty coordinator.
    #[must_use]
    pub fn new(surface_id: SurfaceId, config: MountingConfig, tracer: Tracer) -> Self {
        Self {
            surface_id,
            config,
            queue: Mutex::new(PendingQueue::default()),
            tracer,
        }
    }

    /// Returns the surface this coordinator serves.
    #[inline]
    #[must_use]
    pub fn surface_id(&self) -> SurfaceId {
        self.surface_id
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> MountingConfig {
        self.config
    }

    /// Queues a transaction.
    ///
    /// Returns `false` without queueing if the coordinator was revoked.
    ///
    /// # Panics
    ///
    /// Panics if `transaction` is for another surface or is not numbered
    /// after every previously pushed transaction.
    pub fn push(&self, transaction: MountingTransaction) -> bool {
        assert_eq!(
            transaction.surface_id(),
            self.surface_id,
            "transaction pushed to the wrong surface"
        );

        #[cfg(feature = "trace-rich")]
        self.tracer
            .mutations(self.surface_id, transaction.number(), transaction.mutations());

        let number = transaction.number();
        let mutation_count = transaction.mutations().len();
        let mut coalesced = None;
        let pending = {
            let mut queue = self.queue.lock();
            if queue.revoked {
                log::debug!("{}: dropping transaction {number} after revoke", self.surface_id);
                return false;
            }
            if let Some(last) = queue.last_pushed {
                assert!(number > last, "transaction {number} pushed after {last}");
            }
            queue.last_pushed = Some(number);

            if queue.items.len() < self.config.max_pending.max(1) {
                queue.items.push_back(transaction);
            } else if queue.items.len() >= 2 {
                queue.coalesced_count += 1;
                if let (Some(next), Some(oldest)) = (queue.items.remove(1), queue.items.front_mut()) {
                    oldest.merge(next);
                    coalesced = Some((oldest.number(), oldest.mutations().len()));
                }
                queue.items.push_back(transaction);
            } else if let Some(back) = queue.items.back_mut() {
                back.merge(transaction);
                coalesced = Some((back.number(), back.mutations().len()));
                queue.coalesced_count += 1;
            }
            queue.items.len()
        };

        if let Some((merged_number, merged_len)) = coalesced {
            self.tracer.transaction(&TransactionEvent {
                surface: self.surface_id,
                number: merged_number,
                op: TransactionOp::Coalesced,
                mutation_count: merged_len,
                pending,
            });
        }
        self.tracer.transaction(&TransactionEvent {
            surface: self.surface_id,
            number,
            op: TransactionOp::Pushed,
            mutation_count,
            pending,
        });
        true
    }

    /// Removes and returns the oldest pending transaction.
    ///
    /// Never blocks; `None` means nothing is pending.
    #[must_use]
    pub fn pull(&self) -> Option<MountingTransaction> {
        let (transaction, pending) = {
            let mut queue = self.queue.lock();
            let transaction = queue.items.pop_front()?;
            queue.mark_delivered(transaction.number());
            (transaction, queue.items.len())
        };
        self.trace_pulled(&transaction, pending);
        Some(transaction)
    }

    /// Removes every pending transaction and returns them merged into one.
    ///
    /// Applying the result once is equivalent to applying each pending
    /// transaction in order. A push racing with this call lands either in
    /// the result or in the queue for the next pull.
    #[must_use]
    pub fn pull_aggregated(&self) -> Option<MountingTransaction> {
        let transaction = {
            let mut queue = self.queue.lock();
            let mut drained = queue.items.drain(..);
            let mut aggregate = drained.next()?;
            for later in drained {
                aggregate.merge(later);
            }
            queue.mark_delivered(aggregate.number());
            aggregate
        };
        self.trace_pulled(&transaction, 0);
        Some(transaction)
    }

    fn trace_pulled(&self, transaction: &MountingTransaction, pending: usize) {
        self.tracer.transaction(&TransactionEvent {
            surface: self.surface_id,
            number: transaction.number(),
            op: TransactionOp::Pulled,
            mutation_count: transaction.mutations().len(),
            pending,
        });
    }

    /// Returns `true` if a transaction is waiting.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.queue.lock().items.is_empty()
    }

    /// Returns the number of waiting transactions.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.queue.lock().items.len()
    }

    /// Returns the number of the newest delivered transaction.
    #[must_use]
    pub fn last_delivered(&self) -> Option<u64> {
        self.queue.lock().last_delivered
    }

    /// Returns how many times overflow merged pending transactions.
    #[must_use]
    pub fn coalesced_count(&self) -> u64 {
        self.queue.lock().coalesced_count
    }

    /// Stops accepting pushes. Pending transactions stay pullable.
    pub fn revoke(&self) {
        self.queue.lock().revoked = true;
    }

    /// Returns `true` once [`revoke`](Self::revoke) was called.
    #[must_use]
    pub fn is_revoked(&self) -> bool {
        self.queue.lock().revoked
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::diff::{Mutation, StubViewTree, diff};
    use crate::mounting::TransactionTelemetry;
    use crate::node::{ShadowNode, ShadowNodeFragment};
    use crate::testing::TreeBuilder;

    fn empty(number: u64) -> MountingTransaction {
        MountingTransaction::new(SurfaceId(1), number, Vec::new(), TransactionTelemetry::default())
    }

    fn coordinator(config: MountingConfig) -> MountingCoordinator {
        MountingCoordinator::new(SurfaceId(1), config, Tracer::none())
    }

    #[test]
    fn pull_on_empty_returns_none() {
        let c = coordinator(MountingConfig::default());
        assert!(c.pull().is_none());
        assert!(c.pull_aggregated().is_none());
        assert!(!c.has_pending());
        assert_eq!(c.last_delivered(), None);
    }

    #[test]
    fn pull_is_fifo() {
        let c = coordinator(MountingConfig::default());
        for n in 1..=3 {
            assert!(c.push(empty(n)));
        }
        assert_eq!(c.pending_len(), 3);
        let numbers: Vec<_> = core::iter::from_fn(|| c.pull()).map(|t| t.number()).collect();
        assert_eq!(numbers, [1, 2, 3]);
        assert_eq!(c.last_delivered(), Some(3));
    }

    #[test]
    #[should_panic(expected = "pushed after")]
    fn pushing_out_of_order_panics() {
        let c = coordinator(MountingConfig::default());
        c.push(empty(2));
        c.push(empty(2));
    }

    #[test]
    fn overflow_merges_oldest() {
        let c = coordinator(MountingConfig::bounded(2));
        for n in 1..=4 {
            c.push(empty(n));
        }
        assert_eq!(c.pending_len(), 2);
        assert_eq!(c.coalesced_count(), 2);
        let first = c.pull().expect("pending");
        assert_eq!(first.number(), 3);
        assert_eq!(first.merged_count(), 3);
        assert_eq!(c.pull().map(|t| t.number()), Some(4));
    }

    #[test]
    fn capacity_of_one_merges_into_back() {
        let c = coordinator(MountingConfig::bounded(0));
        c.push(empty(1));
        c.push(empty(2));
        assert_eq!(c.pending_len(), 1);
        let tx = c.pull().expect("pending");
        assert_eq!((tx.number(), tx.merged_count()), (2, 2));
    }

    #[test]
    fn revoked_coordinator_ignores_pushes() {
        let c = coordinator(MountingConfig::default());
        c.push(empty(1));
        c.revoke();
        assert!(!c.push(empty(2)));
        assert_eq!(c.pull().map(|t| t.number()), Some(1));
        assert!(c.pull().is_none());
    }

    #[test]
    fn aggregated_pull_matches_sequential_application() {
        let tb = TreeBuilder::new();
        let r0 = tb.root([]);
        let r1 = r0.clone_with(ShadowNodeFragment::children(vec![tb.view(2, []), tb.view(3, [])]));
        let r2 = r1.clone_with(ShadowNodeFragment::children(vec![
            Arc::clone(&r1.children()[1]),
            tb.view(4, []),
        ]));
        let r3 = r2.clone_with(ShadowNodeFragment::children(vec![
            tb.view(5, []),
            Arc::clone(&r2.children()[0]),
        ]));
        let revisions: [&Arc<ShadowNode>; 4] = [&r0, &r1, &r2, &r3];

        let sequential = coordinator(MountingConfig::UNBOUNDED);
        let aggregated = coordinator(MountingConfig::UNBOUNDED);
        for (n, pair) in revisions.windows(2).enumerate() {
            let mutations: Vec<Mutation> = diff(Some(pair[0]), pair[1]);
            let number = n as u64 + 1;
            let tx = MountingTransaction::new(SurfaceId(1), number, mutations, TransactionTelemetry::default());
            sequential.push(tx.clone());
            aggregated.push(tx);
        }

        let mut one_by_one = StubViewTree::from_tree(&r0);
        while let Some(tx) = sequential.pull() {
            one_by_one.apply_mutations(tx.mutations());
        }
        let mut at_once = StubViewTree::from_tree(&r0);
        let tx = aggregated.pull_aggregated().expect("three pending");
        assert_eq!((tx.number(), tx.merged_count()), (3, 3));
        at_once.apply_mutations(tx.mutations());

        assert_eq!(one_by_one, at_once);
        assert_eq!(at_once, StubViewTree::from_tree(&r3));
        assert!(aggregated.pull().is_none());
    }

    #[test]
    fn concurrent_push_and_pull_lose_nothing() {
        let c = coordinator(MountingConfig::bounded(4));
        let mut seen = 0_u32;
        let mut last = None;
        std::thread::scope(|s| {
            s.spawn(|| {
                for n in 1..=500 {
                    c.push(empty(n));
                }
            });
            while last != Some(500) {
                if let Some(tx) = c.pull_aggregated() {
                    assert!(last.is_none_or(|l| tx.number() > l), "delivery went backwards");
                    seen += tx.merged_count();
                    last = Some(tx.number());
                } else {
                    std::thread::yield_now();
                }
            }
        });
        assert_eq!(seen, 500);
    }
}
