// Copyright 2026 the Fabric Core Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One surface's committed revision and its commit pipeline.

use core::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};

use super::hooks::CommitHookRegistry;
use crate::diff::{Mutation, diff};
use crate::layout::{LayoutConstraints, LayoutEngine, apply_layout};
use crate::mounting::{
    MountingConfig, MountingCoordinator, MountingTransaction, TransactionTelemetry,
};
use crate::node::{
    ComponentName, FamilyArena, FamilyFragment, NodeTraits, Props, ShadowNode,
    ShadowNodeFamily, ShadowNodeFragment, SurfaceId, Tag,
};
use crate::time::{Clock, HostTime};
use crate::trace::{CommitEvent, CommitStatus, PhaseBeginEvent, PhaseEndEvent, PhaseKind, Tracer};

/// A recoverable commit failure. The tree keeps its last revision.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CommitError {
    /// The surface was stopped before or during the commit.
    #[error("{0} is stopped")]
    SurfaceStopped(SurfaceId),
    /// The transaction function gave up.
    #[error("commit aborted: {0}")]
    Aborted(String),
    /// The transaction referenced a node that is not in the committed tree.
    #[error("node {0} is not in the committed tree")]
    NodeNotFound(Tag),
}

/// How a successful call to [`ShadowTree::commit`] ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    /// A new revision was swapped in and its transaction pushed.
    Committed {
        /// The new revision number.
        revision: u64,
    },
    /// Nothing changed: the transaction function returned no root, returned
    /// the current root, or a hook cancelled.
    Skipped,
}

impl CommitOutcome {
    /// Returns the new revision, if one was committed.
    #[must_use]
    pub fn revision(self) -> Option<u64> {
        match self {
            Self::Committed { revision } => Some(revision),
            Self::Skipped => None,
        }
    }
}

/// Per-commit switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommitOptions {
    /// Bring stale node states up to their family's newest committed state.
    pub enable_state_reconciliation: bool,
}

impl CommitOptions {
    /// Reconciliation on.
    pub const DEFAULT: Self = Self {
        enable_state_reconciliation: true,
    };

    /// Commit the candidate as given.
    pub const VERBATIM: Self = Self {
        enable_state_reconciliation: false,
    };
}

impl Default for CommitOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A committed root together with its number and timing.
#[derive(Clone, Debug)]
pub struct ShadowTreeRevision {
    /// The committed root.
    pub root: Arc<ShadowNode>,
    /// Revision number, starting at 0.
    pub number: u64,
    /// Timing of the commit that produced it.
    pub telemetry: TransactionTelemetry,
}

/// Told about every pushed transaction, after the commit lock is released.
pub trait ShadowTreeDelegate: Send + Sync {
    /// A transaction for `coordinator`'s surface is ready.
    fn shadow_tree_did_finish_transaction(&self, coordinator: &Arc<MountingCoordinator>);
}

/// Collaborators shared by every tree of one UI manager.
pub struct CommitEnvironment {
    /// Layout engine run on every commit, if any.
    pub layout_engine: Option<Arc<dyn LayoutEngine>>,
    /// Source of telemetry timestamps.
    pub clock: Arc<dyn Clock>,
    /// Trace output.
    pub tracer: Tracer,
    /// Commit hooks.
    pub hooks: Arc<CommitHookRegistry>,
    /// Queue bounds for each surface's coordinator.
    pub mounting: MountingConfig,
    /// Notified after each commit.
    pub delegate: Option<Arc<dyn ShadowTreeDelegate>>,
}

impl CommitEnvironment {
    /// An environment with no layout engine, hooks, tracing, or delegate.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            layout_engine: None,
            clock,
            tracer: Tracer::none(),
            hooks: Arc::new(CommitHookRegistry::new()),
            mounting: MountingConfig::default(),
            delegate: None,
        }
    }
}

impl fmt::Debug for CommitEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommitEnvironment")
            .field("layout_engine", &self.layout_engine)
            .field("clock", &self.clock)
            .field("tracer", &self.tracer)
            .field("hooks", &self.hooks)
            .field("mounting", &self.mounting)
            .field("delegate", &self.delegate.is_some())
            .finish()
    }
}

/// The committed state of one surface.
///
/// Commits are linearized by a per-surface lock: revision `N + 1` is always
/// derived from revision `N`, and its transaction is pushed before the lock
/// is released, so transactions reach the coordinator in revision order.
/// Readers never take the commit lock.
pub struct ShadowTree {
    surface_id: SurfaceId,
    env: Arc<CommitEnvironment>,
    coordinator: Arc<MountingCoordinator>,
    commit_lock: Mutex<LayoutConstraints>,
    current: RwLock<ShadowTreeRevision>,
    stopped: AtomicBool,
}

impl ShadowTree {
    /// Creates the tree with its revision 0 root.
    ///
    /// The root's tag equals the surface id. Transaction 0, creating the
    /// root view, is queued immediately so a consumer starting from nothing
    /// ends up with the root.
    #[must_use]
    pub fn new(
        surface_id: SurfaceId,
        root_props: Props,
        constraints: LayoutConstraints,
        arena: &Arc<FamilyArena>,
        env: Arc<CommitEnvironment>,
    ) -> Self {
        let family = ShadowNodeFamily::new(
            arena,
            FamilyFragment {
                tag: surface_id.root_tag(),
                surface_id,
                component_name: ComponentName::new(ComponentName::ROOT),
                event_target: None,
                traits: NodeTraits::FORMS_VIEW | NodeTraits::ROOT_NODE_KIND,
            },
        );
        let root = ShadowNode::builder(family).props(root_props).seal();

        let coordinator = Arc::new(MountingCoordinator::new(
            surface_id,
            env.mounting,
            env.tracer.clone(),
        ));
        coordinator.push(MountingTransaction::new(
            surface_id,
            0,
            vec![Mutation::Create {
                node: Arc::clone(&root),
            }],
            TransactionTelemetry::default(),
        ));

        Self {
            surface_id,
            env,
            coordinator,
            commit_lock: Mutex::new(constraints),
            current: RwLock::new(ShadowTreeRevision {
                root,
                number: 0,
                telemetry: TransactionTelemetry::default(),
            }),
            stopped: AtomicBool::new(false),
        }
    }

    /// Returns the surface id.
    #[inline]
    #[must_use]
    pub fn surface_id(&self) -> SurfaceId {
        self.surface_id
    }

    /// Returns the committed revision.
    #[must_use]
    pub fn current_revision(&self) -> ShadowTreeRevision {
        self.current.read().clone()
    }

    /// Returns the committed root.
    #[must_use]
    pub fn current_root(&self) -> Arc<ShadowNode> {
        Arc::clone(&self.current.read().root)
    }

    /// Returns the committed revision number.
    #[must_use]
    pub fn revision_number(&self) -> u64 {
        self.current.read().number
    }

    /// Returns this surface's coordinator.
    #[must_use]
    pub fn coordinator(&self) -> &Arc<MountingCoordinator> {
        &self.coordinator
    }

    /// Returns the constraints layout runs with.
    #[must_use]
    pub fn layout_constraints(&self) -> LayoutConstraints {
        *self.commit_lock.lock()
    }

    /// Returns `true` once [`stop`](Self::stop) was called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Derives and commits a new revision.
    ///
    /// `transaction` receives the committed root and returns the candidate
    /// root, `None` to skip, or an error to abort. The candidate then goes
    /// through commit hooks, optional state reconciliation, layout, and
    /// diffing before it is swapped in and its transaction pushed.
    ///
    /// On any error, and on skip, the committed revision is untouched.
    ///
    /// # Panics
    ///
    /// Panics if the candidate root is not of the current root's family.
    pub fn commit<F>(&self, transaction: F, options: CommitOptions) -> Result<CommitOutcome, CommitError>
    where
        F: FnOnce(&Arc<ShadowNode>) -> Result<Option<Arc<ShadowNode>>, CommitError>,
    {
        let constraints = self.commit_lock.lock();
        let outcome = self.commit_locked(*constraints, transaction, options);
        drop(constraints);
        self.notify(outcome)
    }

    /// The commit pipeline. The caller holds `commit_lock`.
    fn commit_locked<F>(
        &self,
        constraints: LayoutConstraints,
        transaction: F,
        options: CommitOptions,
    ) -> Result<CommitOutcome, CommitError>
    where
        F: FnOnce(&Arc<ShadowNode>) -> Result<Option<Arc<ShadowNode>>, CommitError>,
    {
        let old = self.current.read().clone();
        let next_number = old.number + 1;

        if self.is_stopped() {
            self.trace_commit(old.number, CommitStatus::Failed);
            return Err(CommitError::SurfaceStopped(self.surface_id));
        }

        let mut telemetry = TransactionTelemetry::default();
        let commit_start = self.begin(PhaseKind::Commit, next_number);
        telemetry.commit_start = Some(commit_start);

        let candidate = match transaction(&old.root) {
            Ok(Some(root)) => root,
            Ok(None) => return Ok(self.skip(old.number, next_number)),
            Err(error) => {
                self.end(PhaseKind::Commit, next_number);
                self.trace_commit(old.number, CommitStatus::Failed);
                return Err(error);
            }
        };
        assert!(
            candidate.same_family(&old.root),
            "{}: commit replaced the root family",
            self.surface_id
        );

        let Some(mut candidate) = self.env.hooks.apply(self.surface_id, &old.root, candidate) else {
            return Ok(self.skip(old.number, next_number));
        };

        if options.enable_state_reconciliation
            && let Some(progressed) = ShadowNode::progress_state(&candidate)
        {
            candidate = progressed;
        }

        if let Some(engine) = &self.env.layout_engine {
            telemetry.layout_start = Some(self.begin(PhaseKind::Layout, next_number));
            let results = engine.layout(&candidate, &constraints);
            if let Some(laid_out) = apply_layout(&candidate, &results) {
                candidate = laid_out;
            }
            telemetry.layout_end = Some(self.end(PhaseKind::Layout, next_number));
        }

        if Arc::ptr_eq(&candidate, &old.root) {
            return Ok(self.skip(old.number, next_number));
        }

        // Catch a stop that raced with this commit.
        if self.is_stopped() {
            self.end(PhaseKind::Commit, next_number);
            self.trace_commit(old.number, CommitStatus::Failed);
            return Err(CommitError::SurfaceStopped(self.surface_id));
        }

        telemetry.diff_start = Some(self.begin(PhaseKind::Diff, next_number));
        let mutations = diff(Some(&old.root), &candidate);
        telemetry.diff_end = Some(self.end(PhaseKind::Diff, next_number));

        record_committed_states(&mutations);
        telemetry.commit_end = Some(self.end(PhaseKind::Commit, next_number));

        let mutation_count = mutations.len();
        *self.current.write() = ShadowTreeRevision {
            root: candidate,
            number: next_number,
            telemetry,
        };
        self.coordinator.push(MountingTransaction::new(
            self.surface_id,
            next_number,
            mutations,
            telemetry,
        ));
        self.trace_commit(next_number, CommitStatus::Committed);
        log::debug!(
            "{}: committed revision {next_number} ({mutation_count} mutations)",
            self.surface_id
        );
        Ok(CommitOutcome::Committed {
            revision: next_number,
        })
    }

    /// Tells the delegate about a pushed transaction. Called without the
    /// commit lock.
    fn notify(
        &self,
        outcome: Result<CommitOutcome, CommitError>,
    ) -> Result<CommitOutcome, CommitError> {
        if let Ok(CommitOutcome::Committed { .. }) = outcome
            && let Some(delegate) = &self.env.delegate
        {
            delegate.shadow_tree_did_finish_transaction(&self.coordinator);
        }
        outcome
    }

    /// Replaces the layout constraints and lays the current tree out again.
    ///
    /// Skips when the new constraints leave every layout unchanged.
    pub fn set_layout_constraints(
        &self,
        constraints: LayoutConstraints,
    ) -> Result<CommitOutcome, CommitError> {
        let mut guard = self.commit_lock.lock();
        *guard = constraints;
        let outcome = self.commit_locked(
            constraints,
            |root| Ok(Some(Arc::clone(root))),
            CommitOptions::VERBATIM,
        );
        drop(guard);
        self.notify(outcome)
    }

    /// Commits a root with no children.
    pub fn commit_empty_tree(&self) -> Result<CommitOutcome, CommitError> {
        self.commit(empty_root, CommitOptions::VERBATIM)
    }

    /// Commits a root with no children and stops the tree, both under one
    /// hold of the commit lock.
    ///
    /// No other commit can land between the empty revision and the stop.
    /// The stop happens even if the empty commit fails.
    pub fn stop_with_empty_tree(&self) -> Result<CommitOutcome, CommitError> {
        let guard = self.commit_lock.lock();
        let outcome = self.commit_locked(*guard, empty_root, CommitOptions::VERBATIM);
        self.stopped.store(true, Ordering::Release);
        self.coordinator.revoke();
        drop(guard);
        self.notify(outcome)
    }

    /// Stops the tree.
    ///
    /// Any commit still running fails with [`CommitError::SurfaceStopped`]
    /// unless it already swapped in its revision; every later commit fails.
    /// Returns once no commit is in progress. Pending transactions stay
    /// pullable.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
        let _drain = self.commit_lock.lock();
        self.coordinator.revoke();
    }

    fn begin(&self, phase: PhaseKind, revision: u64) -> HostTime {
        let timestamp = self.env.clock.now();
        self.env.tracer.phase_begin(&PhaseBeginEvent {
            surface: self.surface_id,
            revision,
            phase,
            timestamp,
        });
        timestamp
    }

    fn end(&self, phase: PhaseKind, revision: u64) -> HostTime {
        let timestamp = self.env.clock.now();
        self.env.tracer.phase_end(&PhaseEndEvent {
            surface: self.surface_id,
            revision,
            phase,
            timestamp,
        });
        timestamp
    }

    fn skip(&self, current: u64, attempted: u64) -> CommitOutcome {
        self.end(PhaseKind::Commit, attempted);
        self.trace_commit(current, CommitStatus::Skipped);
        CommitOutcome::Skipped
    }

    fn trace_commit(&self, revision: u64, status: CommitStatus) {
        if self.env.tracer.is_enabled() {
            self.env.tracer.commit(&CommitEvent {
                surface: self.surface_id,
                revision,
                status,
                timestamp: self.env.clock.now(),
            });
        }
    }
}

fn empty_root(root: &Arc<ShadowNode>) -> Result<Option<Arc<ShadowNode>>, CommitError> {
    Ok((!root.children().is_empty()).then(|| root.clone_with(ShadowNodeFragment::children(Vec::new()))))
}

/// Records the state of every node the commit introduced as its family's
/// newest committed state.
fn record_committed_states(mutations: &[Mutation]) {
    for mutation in mutations {
        let node = match mutation {
            Mutation::Create { node }
            | Mutation::Insert { node, .. }
            | Mutation::UpdateState { node, .. }
            | Mutation::Update { new: node, .. } => node,
            Mutation::Delete { .. } | Mutation::Remove { .. } => continue,
        };
        if let Some(state) = node.state() {
            node.family().set_most_recent_state(state);
        }
    }
}

impl fmt::Debug for ShadowTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShadowTree")
            .field("surface_id", &self.surface_id)
            .field("revision", &self.revision_number())
            .field("stopped", &self.is_stopped())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use serde_json::json;

    use super::*;
    use crate::diff::{MutationKind, StubViewTree};
    use crate::layout::StackLayoutEngine;
    use crate::time::{Duration, ManualClock};
    use crate::tree::CommitHook;

    struct Fixture {
        arena: Arc<FamilyArena>,
        tree: ShadowTree,
    }

    impl Fixture {
        fn new(layout: bool) -> Self {
            let mut env = CommitEnvironment::new(Arc::new(ManualClock::new(HostTime(0), Duration(1))));
            if layout {
                env.layout_engine = Some(Arc::new(StackLayoutEngine::default()));
            }
            let arena = Arc::new(FamilyArena::new());
            let tree = ShadowTree::new(
                SurfaceId(11),
                Props::empty(),
                LayoutConstraints::fixed(kurbo::Size::new(100.0, 100.0)),
                &arena,
                Arc::new(env),
            );
            Self { arena, tree }
        }

        fn view(&self, tag: u32, props: serde_json::Value) -> Arc<ShadowNode> {
            let family = ShadowNodeFamily::new(
                &self.arena,
                FamilyFragment {
                    tag: Tag(tag),
                    surface_id: SurfaceId(11),
                    component_name: ComponentName::new("View"),
                    event_target: None,
                    traits: NodeTraits::FORMS_VIEW,
                },
            );
            ShadowNode::builder(family).props(Props::from(props)).seal()
        }

        fn set_children(&self, children: Vec<Arc<ShadowNode>>) -> Result<CommitOutcome, CommitError> {
            self.tree.commit(
                move |root| Ok(Some(root.clone_with(ShadowNodeFragment::children(children)))),
                CommitOptions::DEFAULT,
            )
        }

        fn pull_kinds(&self) -> Vec<MutationKind> {
            let tx = self.tree.coordinator().pull().expect("transaction pushed");
            tx.mutations().iter().map(Mutation::kind).collect()
        }
    }

    #[test]
    fn new_tree_queues_root_creation() {
        let f = Fixture::new(false);
        assert_eq!(f.tree.revision_number(), 0);
        let root = f.tree.current_root();
        assert_eq!(root.tag(), Tag(11));
        assert!(root.traits().contains(NodeTraits::ROOT_NODE_KIND));

        let tx = f.tree.coordinator().pull().expect("initial transaction");
        assert_eq!(tx.number(), 0);
        let mut mirror = StubViewTree::new();
        mirror.apply_mutations(tx.mutations());
        assert_eq!(mirror, StubViewTree::from_tree(&root));
    }

    #[test]
    fn props_change_commits_single_update() {
        let f = Fixture::new(false);
        let _ = f.tree.coordinator().pull();
        let a = f.view(1, json!({ "opacity": 1 }));
        assert_eq!(
            f.set_children(vec![a.clone()]),
            Ok(CommitOutcome::Committed { revision: 1 })
        );
        let _ = f.pull_kinds();

        let outcome = f.tree.commit(
            |root| {
                Ok(ShadowNode::clone_tree(root, a.family_id(), |node| {
                    node.clone_with(ShadowNodeFragment::props(node.props().with("opacity", 0.5)))
                }))
            },
            CommitOptions::DEFAULT,
        );
        assert_eq!(outcome, Ok(CommitOutcome::Committed { revision: 2 }));
        assert_eq!(f.pull_kinds(), [MutationKind::Update]);
    }

    #[test]
    fn skipped_commit_keeps_revision() {
        let f = Fixture::new(false);
        assert_eq!(f.tree.commit(|_| Ok(None), CommitOptions::DEFAULT), Ok(CommitOutcome::Skipped));
        assert_eq!(
            f.tree.commit(|root| Ok(Some(Arc::clone(root))), CommitOptions::DEFAULT),
            Ok(CommitOutcome::Skipped)
        );
        assert_eq!(f.tree.revision_number(), 0);
        assert_eq!(f.tree.coordinator().pending_len(), 1);
    }

    #[test]
    fn failed_commit_leaves_tree_untouched() {
        let f = Fixture::new(false);
        let before = f.tree.current_root();
        let result = f.tree.commit(
            |_| Err(CommitError::Aborted("raced".into())),
            CommitOptions::DEFAULT,
        );
        assert_eq!(result, Err(CommitError::Aborted("raced".into())));
        assert!(Arc::ptr_eq(&f.tree.current_root(), &before));
        assert_eq!(f.tree.revision_number(), 0);
    }

    #[test]
    fn stopped_tree_rejects_commits() {
        let f = Fixture::new(false);
        f.set_children(vec![f.view(1, json!({}))]).expect("running");
        f.tree.stop();
        assert!(f.tree.is_stopped());
        assert_eq!(
            f.set_children(Vec::new()),
            Err(CommitError::SurfaceStopped(SurfaceId(11)))
        );
        assert_eq!(f.tree.revision_number(), 1);
        // Already queued work can still be mounted.
        assert_eq!(f.tree.coordinator().pending_len(), 2);
    }

    #[test]
    fn stop_during_commit_fails_it() {
        let f = Fixture::new(false);
        let result = f.tree.commit(
            |root| {
                f.tree.stopped.store(true, Ordering::Release);
                Ok(Some(root.clone_with(ShadowNodeFragment::children(vec![f.view(1, json!({}))]))))
            },
            CommitOptions::DEFAULT,
        );
        assert_eq!(result, Err(CommitError::SurfaceStopped(SurfaceId(11))));
        assert_eq!(f.tree.revision_number(), 0);
    }

    #[test]
    fn concurrent_commits_are_gap_free() {
        let f = Fixture::new(false);
        let _ = f.tree.coordinator().pull();
        let seeds: Vec<_> = (0..4).map(|i| f.view(100 + i, json!({ "n": 0 }))).collect();
        f.set_children(seeds.clone()).expect("seeded");

        let revisions = Mutex::new(Vec::new());
        std::thread::scope(|s| {
            for seed in &seeds {
                let tree = &f.tree;
                let revisions = &revisions;
                s.spawn(move || {
                    for n in 1..=25 {
                        let outcome = tree
                            .commit(
                                |root| {
                                    Ok(ShadowNode::clone_tree(root, seed.family_id(), |node| {
                                        node.clone_with(ShadowNodeFragment::props(node.props().with("n", n)))
                                    }))
                                },
                                CommitOptions::DEFAULT,
                            )
                            .expect("surface running");
                        revisions.lock().push(outcome.revision().expect("props changed"));
                    }
                });
            }
        });

        let mut revisions = revisions.into_inner();
        revisions.sort_unstable();
        assert_eq!(revisions, (2..=101).collect::<Vec<u64>>());

        // Overflow may have merged some, but nothing is lost or reordered.
        let mut last = 0;
        let mut delivered = 0;
        while let Some(tx) = f.tree.coordinator().pull() {
            assert!(tx.number() > last, "delivery went backwards");
            last = tx.number();
            delivered += tx.merged_count();
        }
        assert_eq!((last, delivered), (101, 101));
        let root = f.tree.current_root();
        for child in root.children() {
            assert_eq!(child.props().number("n"), Some(25.0));
        }
    }

    #[test]
    fn layout_moves_only_affected_siblings() {
        let f = Fixture::new(true);
        let a = f.view(1, json!({ "height": 10 }));
        let b = f.view(2, json!({ "height": 10 }));
        let c = f.view(3, json!({ "height": 10 }));
        f.set_children(vec![a.clone(), b.clone(), c.clone()]).expect("running");
        let committed = f.tree.current_root();
        assert_eq!(committed.children()[2].layout_metrics().frame.y0, 20.0);

        f.tree
            .commit(
                |root| {
                    Ok(ShadowNode::clone_tree(root, b.family_id(), |node| {
                        node.clone_with(ShadowNodeFragment::props(node.props().with("height", 30)))
                    }))
                },
                CommitOptions::DEFAULT,
            )
            .expect("running");
        let next = f.tree.current_root();
        assert!(Arc::ptr_eq(&next.children()[0], &committed.children()[0]));
        assert_eq!(next.children()[2].layout_metrics().frame.y0, 40.0);

        let tx = f.tree.coordinator().pull_aggregated().expect("pending");
        let last: Vec<_> = tx
            .mutations()
            .iter()
            .rev()
            .take(2)
            .map(|m| (m.kind(), m.tag()))
            .collect();
        assert_eq!(
            last,
            [(MutationKind::Update, Tag(3)), (MutationKind::Update, Tag(2))]
        );
    }

    #[test]
    fn reconciliation_keeps_newer_state() {
        let f = Fixture::new(false);
        let a = f.view(1, json!({}));
        f.set_children(vec![a.clone()]).expect("running");

        let state = a.family().next_state(Arc::new(42_u32));
        f.tree
            .commit(
                |root| {
                    Ok(ShadowNode::clone_tree(root, a.family_id(), |node| {
                        node.clone_with(ShadowNodeFragment::state(state.clone()))
                    }))
                },
                CommitOptions::DEFAULT,
            )
            .expect("running");
        assert_eq!(a.family().most_recent_state().map(|s| s.revision()), Some(1));

        // A commit built from the stale, stateless clone of `a`.
        let stale = a.clone_with(ShadowNodeFragment::props(Props::from(json!({ "x": 1 }))));
        f.set_children(vec![stale]).expect("running");
        let root = f.tree.current_root();
        let committed = &root.children()[0];
        assert_eq!(committed.state().map(|s| s.revision()), Some(1));
        assert_eq!(committed.props().number("x"), Some(1.0));
    }

    struct Counting {
        calls: AtomicUsize,
        cancel_after: usize,
    }

    impl CommitHook for Counting {
        fn will_commit(
            &self,
            _: SurfaceId,
            _: &Arc<ShadowNode>,
            new_root: Arc<ShadowNode>,
        ) -> Option<Arc<ShadowNode>> {
            let n = self.calls.fetch_add(1, Ordering::Relaxed);
            (n < self.cancel_after).then_some(new_root)
        }
    }

    #[test]
    fn hooks_can_cancel() {
        let f = Fixture::new(false);
        let hook = Arc::new(Counting {
            calls: AtomicUsize::new(0),
            cancel_after: 1,
        });
        f.tree.env.hooks.register(hook.clone());

        assert!(f.set_children(vec![f.view(1, json!({}))]).is_ok());
        assert_eq!(f.set_children(Vec::new()), Ok(CommitOutcome::Skipped));
        assert_eq!(f.tree.revision_number(), 1);
        assert_eq!(hook.calls.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn empty_tree_commit_tears_down_children() {
        let f = Fixture::new(false);
        let _ = f.tree.coordinator().pull();
        f.set_children(vec![f.view(1, json!({})), f.view(2, json!({}))]).expect("running");
        let _ = f.pull_kinds();
        assert_eq!(f.tree.commit_empty_tree(), Ok(CommitOutcome::Committed { revision: 2 }));
        assert_eq!(
            f.pull_kinds(),
            [
                MutationKind::Remove,
                MutationKind::Remove,
                MutationKind::Delete,
                MutationKind::Delete,
            ]
        );
        assert_eq!(f.tree.commit_empty_tree(), Ok(CommitOutcome::Skipped));
    }

    #[test]
    fn unchanged_constraints_skip() {
        let f = Fixture::new(true);
        f.set_children(vec![f.view(1, json!({ "height": 10 }))]).expect("running");
        let pending = f.tree.coordinator().pending_len();
        let same = f.tree.layout_constraints();

        assert_eq!(f.tree.set_layout_constraints(same), Ok(CommitOutcome::Skipped));
        assert_eq!(f.tree.revision_number(), 1);
        assert_eq!(f.tree.coordinator().pending_len(), pending);

        let wider = LayoutConstraints::fixed(kurbo::Size::new(200.0, 100.0));
        assert_eq!(
            f.tree.set_layout_constraints(wider),
            Ok(CommitOutcome::Committed { revision: 2 })
        );
        assert_eq!(f.tree.current_root().layout_metrics().frame.width(), 200.0);
    }

    #[test]
    fn stop_with_empty_tree_is_final() {
        let f = Fixture::new(false);
        let _ = f.tree.coordinator().pull();
        f.set_children(vec![f.view(1, json!({}))]).expect("running");
        let _ = f.pull_kinds();

        assert_eq!(
            f.tree.stop_with_empty_tree(),
            Ok(CommitOutcome::Committed { revision: 2 })
        );
        assert!(f.tree.is_stopped());
        assert!(f.tree.coordinator().is_revoked());
        assert_eq!(f.pull_kinds(), [MutationKind::Remove, MutationKind::Delete]);
        assert_eq!(
            f.set_children(vec![f.view(2, json!({}))]),
            Err(CommitError::SurfaceStopped(SurfaceId(11)))
        );
        assert!(f.tree.current_root().children().is_empty());
    }

    #[test]
    fn commits_racing_a_stop_never_land_after_it() {
        for _ in 0..50 {
            let f = Fixture::new(false);
            let children: Vec<_> = (0..4).map(|i| f.view(100 + i, json!({}))).collect();
            std::thread::scope(|s| {
                for child in &children {
                    let f = &f;
                    s.spawn(move || {
                        while f.set_children(vec![Arc::clone(child)]).is_ok() {}
                    });
                }
                std::thread::yield_now();
                f.tree.stop_with_empty_tree().expect("first stop");
            });
            assert!(f.tree.current_root().children().is_empty());
        }
    }
}
