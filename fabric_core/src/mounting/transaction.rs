// Copyright 2026 the Fabric Core Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mount transactions.

use super::telemetry::TransactionTelemetry;
use crate::diff::Mutation;
use crate::node::SurfaceId;

/// The mutations produced by one commit, ready for a mounting consumer.
///
/// A transaction's number equals the revision it brings the consumer to.
#[derive(Clone, Debug)]
pub struct MountingTransaction {
    surface_id: SurfaceId,
    number: u64,
    mutations: Vec<Mutation>,
    telemetry: TransactionTelemetry,
    merged_count: u32,
}

impl MountingTransaction {
    /// Creates a transaction for a single commit.
    #[must_use]
    pub fn new(
        surface_id: SurfaceId,
        number: u64,
        mutations: Vec<Mutation>,
        telemetry: TransactionTelemetry,
    ) -> Self {
        Self {
            surface_id,
            number,
            mutations,
            telemetry,
            merged_count: 1,
        }
    }

    /// Returns the owning surface.
    #[inline]
    #[must_use]
    pub fn surface_id(&self) -> SurfaceId {
        self.surface_id
    }

    /// Returns the transaction number.
    #[inline]
    #[must_use]
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Returns the mutations in application order.
    #[must_use]
    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    /// Consumes the transaction, returning its mutations.
    #[must_use]
    pub fn into_mutations(self) -> Vec<Mutation> {
        self.mutations
    }

    /// Returns the phase timestamps.
    #[must_use]
    pub fn telemetry(&self) -> &TransactionTelemetry {
        &self.telemetry
    }

    /// Returns the phase timestamps for stamping mount times.
    pub fn telemetry_mut(&mut self) -> &mut TransactionTelemetry {
        &mut self.telemetry
    }

    /// Returns how many pushed transactions this one stands for.
    #[must_use]
    pub fn merged_count(&self) -> u32 {
        self.merged_count
    }

    /// Appends `later` so that applying `self` once has the effect of
    /// applying both in order.
    ///
    /// # Panics
    ///
    /// Panics if `later` belongs to another surface or does not come after
    /// `self`.
    pub fn merge(&mut self, later: Self) {
        assert_eq!(
            self.surface_id, later.surface_id,
            "cannot merge transactions of different surfaces"
        );
        assert!(
            later.number > self.number,
            "transaction {} merged after {}",
            later.number,
            self.number
        );
        self.number = later.number;
        self.mutations.extend(later.mutations);
        self.telemetry.widen(&later.telemetry);
        self.merged_count = self.merged_count.saturating_add(later.merged_count);
    }
}
