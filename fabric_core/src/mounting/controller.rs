// Copyright 2026 the Fabric Core Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pulling and mounting with timing.

use std::sync::Arc;

use super::coordinator::{MountingConsumer, MountingCoordinator};
use super::telemetry::TransactionTelemetry;
use super::transaction::MountingTransaction;
use crate::time::Clock;
use crate::trace::{PhaseBeginEvent, PhaseEndEvent, PhaseKind, Tracer, TransactionSummary};

/// Drives a consumer from a coordinator, stamping mount times.
///
/// Meant to live on the mounting thread.
#[derive(Debug)]
pub struct TelemetryController {
    coordinator: Arc<MountingCoordinator>,
    clock: Arc<dyn Clock>,
    tracer: Tracer,
    last_telemetry: Option<TransactionTelemetry>,
    mounted_count: u64,
}

impl TelemetryController {
    /// Creates a controller for `coordinator`.
    #[must_use]
    pub fn new(coordinator: Arc<MountingCoordinator>, clock: Arc<dyn Clock>, tracer: Tracer) -> Self {
        Self {
            coordinator,
            clock,
            tracer,
            last_telemetry: None,
            mounted_count: 0,
        }
    }

    /// Returns the coordinator this controller pulls from.
    #[must_use]
    pub fn coordinator(&self) -> &Arc<MountingCoordinator> {
        &self.coordinator
    }

    /// Pulls the oldest pending transaction and mounts it.
    ///
    /// Returns the mounted transaction number, or `None` if nothing was
    /// pending.
    pub fn pull_and_mount<C: MountingConsumer + ?Sized>(&mut self, consumer: &mut C) -> Option<u64> {
        let transaction = self.coordinator.pull()?;
        Some(self.mount(transaction, consumer))
    }

    /// Pulls everything pending as one transaction and mounts it.
    pub fn pull_aggregated_and_mount<C: MountingConsumer + ?Sized>(
        &mut self,
        consumer: &mut C,
    ) -> Option<u64> {
        let transaction = self.coordinator.pull_aggregated()?;
        Some(self.mount(transaction, consumer))
    }

    fn mount<C: MountingConsumer + ?Sized>(&mut self, mut transaction: MountingTransaction, consumer: &mut C) -> u64 {
        let surface = transaction.surface_id();
        let number = transaction.number();

        let start = self.clock.now();
        transaction.telemetry_mut().mount_start = Some(start);
        self.tracer.phase_begin(&PhaseBeginEvent {
            surface,
            revision: number,
            phase: PhaseKind::Mount,
            timestamp: start,
        });

        consumer.apply(&transaction);

        let end = self.clock.now();
        transaction.telemetry_mut().mount_end = Some(end);
        self.tracer.phase_end(&PhaseEndEvent {
            surface,
            revision: number,
            phase: PhaseKind::Mount,
            timestamp: end,
        });
        self.tracer
            .transaction_summary(&TransactionSummary::new(&transaction));

        self.last_telemetry = Some(*transaction.telemetry());
        self.mounted_count += 1;
        number
    }

    /// Returns the telemetry of the last mounted transaction.
    #[must_use]
    pub fn last_telemetry(&self) -> Option<&TransactionTelemetry> {
        self.last_telemetry.as_ref()
    }

    /// Returns how many transactions were mounted.
    #[must_use]
    pub fn mounted_count(&self) -> u64 {
        self.mounted_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{Mutation, StubViewTree};
    use crate::mounting::MountingConfig;
    use crate::node::SurfaceId;
    use crate::testing::TreeBuilder;
    use crate::time::{Duration, HostTime, ManualClock};

    #[test]
    fn mount_is_stamped_and_applied() {
        let tb = TreeBuilder::new();
        let root = tb.root([]);
        let coordinator = Arc::new(MountingCoordinator::new(
            SurfaceId(1),
            MountingConfig::default(),
            Tracer::none(),
        ));
        coordinator.push(MountingTransaction::new(
            SurfaceId(1),
            0,
            vec![Mutation::Create { node: root.clone() }],
            TransactionTelemetry::default(),
        ));

        let clock = Arc::new(ManualClock::new(HostTime(0), Duration(5)));
        let mut controller = TelemetryController::new(coordinator, clock, Tracer::none());
        let mut mirror = StubViewTree::new();

        assert_eq!(controller.pull_and_mount(&mut mirror), Some(0));
        assert_eq!(mirror, StubViewTree::from_tree(&root));
        let telemetry = controller.last_telemetry().expect("mounted");
        assert_eq!(telemetry.mount_duration(), Some(Duration(5)));
        assert_eq!(controller.mounted_count(), 1);

        assert_eq!(controller.pull_and_mount(&mut mirror), None);
        assert_eq!(controller.pull_aggregated_and_mount(&mut mirror), None);
    }
}
