// Copyright 2026 the Fabric Core Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Surface-level entry point wiring the UI manager to a host.

use std::sync::Arc;

use serde_json::Value;

use crate::layout::{LayoutConstraints, LayoutEngine};
use crate::mounting::{MountingConfig, MountingCoordinator};
use crate::node::{Props, ShadowNode, SurfaceId};
use crate::time::Clock;
use crate::trace::Tracer;
use crate::tree::{CommitEnvironment, CommitOptions, CommitOutcome};
use crate::uimanager::{UiManager, UiManagerDelegate, UiManagerError};

/// How the host learns about new transactions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MountDelivery {
    /// The delegate is told after every commit and pulls right away.
    Push,
    /// The host polls the coordinator on its own cadence, typically once per
    /// frame. The delegate is not told about commits.
    Pull,
}

/// Configuration for the [`Scheduler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Pending-queue bound of every surface's coordinator.
    pub mounting: MountingConfig,
    /// Transaction delivery mode.
    pub delivery: MountDelivery,
    /// Options used for commits issued through the UI manager.
    pub commit: CommitOptions,
}

impl SchedulerConfig {
    /// Delegate-driven mounting after every commit.
    ///
    /// The queue only grows while the delegate is busy, so it stays short.
    #[must_use]
    pub const fn push() -> Self {
        Self {
            mounting: MountingConfig::bounded(16),
            delivery: MountDelivery::Push,
            commit: CommitOptions::DEFAULT,
        }
    }

    /// Host-polled mounting.
    ///
    /// Several commits may land between polls, so the queue is larger and
    /// the host is expected to pull aggregated.
    #[must_use]
    pub const fn pull() -> Self {
        Self {
            mounting: MountingConfig::bounded(64),
            delivery: MountDelivery::Pull,
            commit: CommitOptions::DEFAULT,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::push()
    }
}

/// Host callbacks.
pub trait SchedulerDelegate: Send + Sync {
    /// A transaction for `surface` is ready on `coordinator`.
    ///
    /// Only called with [`MountDelivery::Push`]. Called on the committing
    /// thread after the commit lock is released.
    fn did_finish_transaction(&self, surface: SurfaceId, coordinator: &Arc<MountingCoordinator>);

    /// An imperative command for the host view of `node`.
    fn did_dispatch_command(&self, node: &ShadowNode, name: &str, args: &Value);
}

struct Relay {
    delivery: MountDelivery,
    delegate: Arc<dyn SchedulerDelegate>,
}

impl UiManagerDelegate for Relay {
    fn ui_manager_did_finish_transaction(&self, coordinator: &Arc<MountingCoordinator>) {
        if self.delivery == MountDelivery::Push {
            self.delegate
                .did_finish_transaction(coordinator.surface_id(), coordinator);
        }
    }

    fn ui_manager_did_dispatch_command(&self, node: &Arc<ShadowNode>, name: &str, args: &Value) {
        self.delegate.did_dispatch_command(node, name, args);
    }
}

/// Owns a [`UiManager`] and the surfaces it drives.
///
/// # Usage
///
/// ```rust,ignore
/// let scheduler = Scheduler::new(SchedulerConfig::pull(), Some(engine), clock, tracer, None);
/// scheduler.start_surface(surface, Props::empty(), constraints)?;
/// // ... commands through scheduler.ui_manager() ...
/// if let Some(tx) = scheduler.ui_manager().mounting_coordinator(surface)?.pull_aggregated() {
///     host.apply(&tx);
/// }
/// ```
#[derive(Debug)]
pub struct Scheduler {
    config: SchedulerConfig,
    ui_manager: Arc<UiManager>,
}

impl Scheduler {
    /// Creates a scheduler.
    ///
    /// Without a layout engine, committed nodes keep the metrics they were
    /// built with.
    #[must_use]
    pub fn new(
        config: SchedulerConfig,
        layout_engine: Option<Arc<dyn LayoutEngine>>,
        clock: Arc<dyn Clock>,
        tracer: Tracer,
        delegate: Option<Arc<dyn SchedulerDelegate>>,
    ) -> Self {
        let mut env = CommitEnvironment::new(clock);
        env.layout_engine = layout_engine;
        env.tracer = tracer;
        env.mounting = config.mounting;
        let relay = delegate.map(|delegate| {
            Arc::new(Relay {
                delivery: config.delivery,
                delegate,
            }) as Arc<dyn UiManagerDelegate>
        });
        Self {
            config,
            ui_manager: Arc::new(UiManager::new(env, config.commit, relay)),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Returns the UI manager commands go through.
    #[must_use]
    pub fn ui_manager(&self) -> &Arc<UiManager> {
        &self.ui_manager
    }

    /// Registers and starts `surface`.
    pub fn start_surface(
        &self,
        surface: SurfaceId,
        props: Props,
        constraints: LayoutConstraints,
    ) -> Result<(), UiManagerError> {
        self.ui_manager.register_surface(surface, props, constraints)?;
        self.ui_manager.start_surface(surface)
    }

    /// Commits an empty tree for `surface`, then stops it.
    pub fn stop_surface(&self, surface: SurfaceId) -> Result<(), UiManagerError> {
        self.ui_manager.stop_surface(surface)
    }

    /// Changes the layout constraints of `surface`.
    pub fn constraint_surface_layout(
        &self,
        surface: SurfaceId,
        constraints: LayoutConstraints,
    ) -> Result<CommitOutcome, UiManagerError> {
        self.ui_manager.constraint_surface_layout(surface, constraints)
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Size;
    use parking_lot::Mutex;
    use serde_json::json;

    use super::*;
    use crate::diff::StubViewTree;
    use crate::layout::StackLayoutEngine;
    use crate::mounting::MountingConsumer;
    use crate::node::Tag;
    use crate::time::{Duration, HostTime, ManualClock};
    use crate::uimanager::SurfaceStatus;

    const S: SurfaceId = SurfaceId(7);

    #[derive(Default)]
    struct Host {
        mirror: Mutex<StubViewTree>,
        notified: Mutex<Vec<SurfaceId>>,
        commands: Mutex<Vec<String>>,
    }

    impl SchedulerDelegate for Host {
        fn did_finish_transaction(&self, surface: SurfaceId, coordinator: &Arc<MountingCoordinator>) {
            self.notified.lock().push(surface);
            let mut mirror = self.mirror.lock();
            while let Some(tx) = coordinator.pull() {
                mirror.apply(&tx);
            }
        }

        fn did_dispatch_command(&self, node: &ShadowNode, name: &str, _args: &Value) {
            self.commands.lock().push(format!("{}:{name}", node.tag()));
        }
    }

    fn scheduler(config: SchedulerConfig, host: &Arc<Host>) -> Scheduler {
        Scheduler::new(
            config,
            Some(Arc::new(StackLayoutEngine::default())),
            Arc::new(ManualClock::new(HostTime(0), Duration::from_micros(10))),
            Tracer::none(),
            Some(Arc::clone(host) as Arc<dyn SchedulerDelegate>),
        )
    }

    fn constraints() -> LayoutConstraints {
        LayoutConstraints::fixed(Size::new(320.0, 480.0))
    }

    #[test]
    fn presets_differ_in_delivery() {
        assert_eq!(SchedulerConfig::push().delivery, MountDelivery::Push);
        assert_eq!(SchedulerConfig::pull().delivery, MountDelivery::Pull);
        assert_eq!(SchedulerConfig::default(), SchedulerConfig::push());
    }

    #[test]
    fn push_delivery_mounts_on_every_commit() {
        let host = Arc::new(Host::default());
        let scheduler = scheduler(SchedulerConfig::push(), &host);
        scheduler
            .start_surface(S, Props::empty(), constraints())
            .expect("fresh surface");
        let ui = scheduler.ui_manager();

        let a = ui
            .create_node(Tag(10), "View", S, Props::from(json!({ "height": 40 })), None)
            .expect("running");
        ui.complete_surface(S, vec![a.clone()]).expect("running");
        ui.dispatch_command(&a, "scrollTo", &json!({})).expect("running");

        assert_eq!(*host.notified.lock(), [S]);
        assert_eq!(*host.commands.lock(), ["#10:scrollTo"]);
        // The initial transaction is not announced; the delegate drains it
        // together with the first commit.
        let root = ui.trees().get(S).expect("started").current_root();
        assert_eq!(*host.mirror.lock(), StubViewTree::from_tree(&root));
    }

    #[test]
    fn pull_delivery_leaves_transactions_queued() {
        let host = Arc::new(Host::default());
        let scheduler = scheduler(SchedulerConfig::pull(), &host);
        scheduler
            .start_surface(S, Props::empty(), constraints())
            .expect("fresh surface");
        let ui = scheduler.ui_manager();
        for tag in 10..13 {
            let node = ui
                .create_node(Tag(tag), "View", S, Props::empty(), None)
                .expect("running");
            ui.complete_surface(S, vec![node]).expect("running");
        }

        assert!(host.notified.lock().is_empty());
        let coordinator = ui.mounting_coordinator(S).expect("started");
        assert_eq!(coordinator.pending_len(), 4);
        let tx = coordinator.pull_aggregated().expect("pending");
        assert_eq!(tx.number(), 3);
        let mut mirror = StubViewTree::new();
        mirror.apply(&tx);
        assert_eq!(mirror.get(S.root_tag()).map(|v| v.children.clone()), Some(vec![Tag(12)]));
    }

    #[test]
    fn stop_surface_clears_the_host_tree() {
        let host = Arc::new(Host::default());
        let scheduler = scheduler(SchedulerConfig::push(), &host);
        scheduler
            .start_surface(S, Props::empty(), constraints())
            .expect("fresh surface");
        let ui = scheduler.ui_manager();
        let a = ui
            .create_node(Tag(10), "View", S, Props::empty(), None)
            .expect("running");
        ui.complete_surface(S, vec![a]).expect("running");
        scheduler.stop_surface(S).expect("running");

        assert_eq!(ui.surface_status(S), Some(SurfaceStatus::Stopped));
        let mirror = host.mirror.lock();
        assert_eq!(mirror.len(), 1);
        assert!(mirror.get(Tag(10)).is_none());
    }

    #[test]
    fn constraints_before_start_are_kept() {
        let host = Arc::new(Host::default());
        let scheduler = scheduler(SchedulerConfig::pull(), &host);
        let ui = scheduler.ui_manager();
        ui.register_surface(S, Props::empty(), LayoutConstraints::UNBOUNDED)
            .expect("fresh");
        assert_eq!(
            scheduler.constraint_surface_layout(S, constraints()),
            Ok(CommitOutcome::Skipped)
        );
        ui.start_surface(S).expect("not started");
        let tree = ui.trees().get(S).expect("started");
        assert_eq!(tree.layout_constraints(), constraints());

        let outcome = scheduler
            .constraint_surface_layout(S, LayoutConstraints::fixed(Size::new(100.0, 100.0)))
            .expect("running");
        assert_eq!(outcome, CommitOutcome::Committed { revision: 1 });
        assert_eq!(tree.current_root().layout_metrics().frame.width(), 100.0);
    }
}
