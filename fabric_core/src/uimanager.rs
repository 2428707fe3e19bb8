// Copyright 2026 the Fabric Core Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The boundary between the command source and the shadow trees.
//!
//! Node construction (`create_node`, `clone_node`, `append_child`) only
//! builds sealed nodes; the tree changes when those nodes are handed to
//! [`UiManager::complete_surface`]. `set_native_props` and `update_state`
//! commit directly. Every operation first checks the surface's lifecycle:
//!
//! ```text
//! register_surface ──► NotStarted ──start_surface──► Running ──stop_surface──► Stopped
//! ```
//!
//! Only `start_surface` and `unregister_surface` are valid outside
//! `Running`; everything else fails with
//! [`UiManagerError::InvalidSurfaceState`] and has no effect.

use core::any::Any;
use core::fmt;
use std::collections::HashMap;
use std::sync::Arc;

use kurbo::Point;
use parking_lot::RwLock;
use serde_json::Value;

use crate::layout::{self, LayoutConstraints, LayoutMetrics};
use crate::mounting::MountingCoordinator;
use crate::node::{
    ComponentName, EventTarget, FamilyArena, FamilyFragment, NodeTraits, Props, ShadowNode,
    ShadowNodeFamily, ShadowNodeFragment, SurfaceId, Tag,
};
use crate::trace::SurfaceEvent;
use crate::tree::{
    CommitEnvironment, CommitError, CommitHook, CommitOptions, CommitOutcome, ShadowTree,
    ShadowTreeDelegate, ShadowTreeRegistry,
};

/// Lifecycle of a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceStatus {
    /// Registered, no tree yet.
    NotStarted,
    /// Accepting commands.
    Running,
    /// Torn down. Terminal.
    Stopped,
}

impl fmt::Display for SurfaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotStarted => "not started",
            Self::Running => "running",
            Self::Stopped => "stopped",
        })
    }
}

/// Failure of a UI manager operation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum UiManagerError {
    /// The operation is not valid in the surface's current status.
    #[error("{surface} is {status}")]
    InvalidSurfaceState {
        /// The surface.
        surface: SurfaceId,
        /// Its status at the time of the call.
        status: SurfaceStatus,
    },
    /// The surface was never registered, or was unregistered.
    #[error("{0} is not registered")]
    UnknownSurface(SurfaceId),
    /// `create_node` was asked for the tag of the surface's own root.
    #[error("{tag} is the root tag of {surface}")]
    ReservedTag {
        /// The surface.
        surface: SurfaceId,
        /// The rejected tag.
        tag: Tag,
    },
    /// `register_surface` was called twice.
    #[error("{0} is already registered")]
    SurfaceAlreadyRegistered(SurfaceId),
    /// The commit itself failed.
    #[error(transparent)]
    Commit(#[from] CommitError),
}

/// Receives what the UI manager cannot handle itself.
pub trait UiManagerDelegate: Send + Sync {
    /// A commit pushed a transaction to `coordinator`.
    fn ui_manager_did_finish_transaction(&self, coordinator: &Arc<MountingCoordinator>);

    /// An imperative command for the host view of `node`.
    fn ui_manager_did_dispatch_command(&self, node: &Arc<ShadowNode>, name: &str, args: &Value);
}

/// Component name to traits.
///
/// Unregistered components are plain views.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    traits: RwLock<HashMap<ComponentName, NodeTraits>>,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the traits of `name`.
    pub fn register(&self, name: ComponentName, traits: NodeTraits) {
        self.traits.write().insert(name, traits);
    }

    /// Returns the traits of `name`.
    #[must_use]
    pub fn traits_of(&self, name: &ComponentName) -> NodeTraits {
        self.traits
            .read()
            .get(name)
            .copied()
            .unwrap_or(NodeTraits::FORMS_VIEW)
    }
}

#[derive(Debug)]
struct SurfaceRecord {
    status: SurfaceStatus,
    props: Props,
    constraints: LayoutConstraints,
}

struct DelegateRelay(Arc<dyn UiManagerDelegate>);

impl ShadowTreeDelegate for DelegateRelay {
    fn shadow_tree_did_finish_transaction(&self, coordinator: &Arc<MountingCoordinator>) {
        self.0.ui_manager_did_finish_transaction(coordinator);
    }
}

fn report<T>(operation: &str, result: Result<T, UiManagerError>) -> Result<T, UiManagerError> {
    if let Err(error) = &result {
        log::warn!("{operation} failed: {error}");
    }
    result
}

/// Routes commands into per-surface shadow trees.
pub struct UiManager {
    arena: Arc<FamilyArena>,
    env: Arc<CommitEnvironment>,
    commit_options: CommitOptions,
    trees: ShadowTreeRegistry,
    surfaces: RwLock<HashMap<SurfaceId, SurfaceRecord>>,
    components: ComponentRegistry,
    delegate: Option<Arc<dyn UiManagerDelegate>>,
}

impl UiManager {
    /// Creates a UI manager.
    ///
    /// If `delegate` is given it replaces `env.delegate`, so every commit is
    /// reported through it.
    #[must_use]
    pub fn new(
        mut env: CommitEnvironment,
        commit_options: CommitOptions,
        delegate: Option<Arc<dyn UiManagerDelegate>>,
    ) -> Self {
        if let Some(delegate) = &delegate {
            env.delegate = Some(Arc::new(DelegateRelay(Arc::clone(delegate))));
        }
        Self {
            arena: Arc::new(FamilyArena::new()),
            env: Arc::new(env),
            commit_options,
            trees: ShadowTreeRegistry::new(),
            surfaces: RwLock::new(HashMap::new()),
            components: ComponentRegistry::new(),
            delegate,
        }
    }

    /// Returns the family arena all nodes are allocated from.
    #[must_use]
    pub fn arena(&self) -> &Arc<FamilyArena> {
        &self.arena
    }

    /// Returns the registry of live trees.
    #[must_use]
    pub fn trees(&self) -> &ShadowTreeRegistry {
        &self.trees
    }

    /// Sets the traits used for nodes of component `name`.
    pub fn register_component(&self, name: impl Into<ComponentName>, traits: NodeTraits) {
        self.components.register(name.into(), traits);
    }

    /// Adds a commit hook for every surface.
    pub fn register_commit_hook(&self, hook: Arc<dyn CommitHook>) {
        self.env.hooks.register(hook);
    }

    /// Removes a commit hook, returning whether it was registered.
    pub fn unregister_commit_hook(&self, hook: &Arc<dyn CommitHook>) -> bool {
        self.env.hooks.unregister(hook)
    }

    // -- Surface lifecycle --------------------------------------------------

    /// Returns the status of `surface`, or `None` if it is not registered.
    #[must_use]
    pub fn surface_status(&self, surface: SurfaceId) -> Option<SurfaceStatus> {
        self.surfaces.read().get(&surface).map(|r| r.status)
    }

    /// Registers `surface` in [`SurfaceStatus::NotStarted`].
    pub fn register_surface(
        &self,
        surface: SurfaceId,
        props: Props,
        constraints: LayoutConstraints,
    ) -> Result<(), UiManagerError> {
        let result = {
            let mut surfaces = self.surfaces.write();
            if surfaces.contains_key(&surface) {
                Err(UiManagerError::SurfaceAlreadyRegistered(surface))
            } else {
                surfaces.insert(
                    surface,
                    SurfaceRecord {
                        status: SurfaceStatus::NotStarted,
                        props,
                        constraints,
                    },
                );
                Ok(())
            }
        };
        if result.is_ok() {
            self.trace_status(surface, SurfaceStatus::NotStarted);
        }
        report("register_surface", result)
    }

    /// Creates the surface's tree and starts accepting commands.
    pub fn start_surface(&self, surface: SurfaceId) -> Result<(), UiManagerError> {
        let result = self.transition(surface, &[SurfaceStatus::NotStarted], SurfaceStatus::Running, |record| {
            let tree = ShadowTree::new(
                surface,
                record.props.clone(),
                record.constraints,
                &self.arena,
                Arc::clone(&self.env),
            );
            self.trees.add(Arc::new(tree));
        });
        report("start_surface", result.map(|_| ()))
    }

    /// Commits an empty tree, then stops the surface.
    ///
    /// The surface's pending transactions stay pullable until it is
    /// unregistered.
    pub fn stop_surface(&self, surface: SurfaceId) -> Result<(), UiManagerError> {
        let result = self.transition(surface, &[SurfaceStatus::Running], SurfaceStatus::Stopped, |_| {});
        if result.is_ok()
            && let Some(tree) = self.trees.get(surface)
            && let Err(error) = tree.stop_with_empty_tree()
        {
            log::warn!("{surface}: final empty commit failed: {error}");
        }
        report("stop_surface", result.map(|_| ()))
    }

    /// Forgets a surface that is not running.
    pub fn unregister_surface(&self, surface: SurfaceId) -> Result<(), UiManagerError> {
        let result = {
            let mut surfaces = self.surfaces.write();
            match surfaces.get(&surface).map(|r| r.status) {
                None => Err(UiManagerError::UnknownSurface(surface)),
                Some(SurfaceStatus::Running) => Err(UiManagerError::InvalidSurfaceState {
                    surface,
                    status: SurfaceStatus::Running,
                }),
                Some(_) => {
                    surfaces.remove(&surface);
                    Ok(())
                }
            }
        };
        if result.is_ok() {
            let _ = self.trees.remove(surface);
        }
        report("unregister_surface", result)
    }

    /// Changes the layout constraints of `surface`.
    ///
    /// A running surface is laid out again right away; a surface that has not
    /// started uses them when it does.
    pub fn constraint_surface_layout(
        &self,
        surface: SurfaceId,
        constraints: LayoutConstraints,
    ) -> Result<CommitOutcome, UiManagerError> {
        let result = {
            let mut surfaces = self.surfaces.write();
            match surfaces.get_mut(&surface) {
                None => Err(UiManagerError::UnknownSurface(surface)),
                Some(record) if record.status == SurfaceStatus::NotStarted => {
                    record.constraints = constraints;
                    Ok(None)
                }
                Some(record) if record.status == SurfaceStatus::Stopped => {
                    Err(UiManagerError::InvalidSurfaceState {
                        surface,
                        status: record.status,
                    })
                }
                Some(_) => Ok(self.trees.get(surface)),
            }
        };
        let result = result.and_then(|tree| match tree {
            Some(tree) => Ok(tree.set_layout_constraints(constraints)?),
            None => Ok(CommitOutcome::Skipped),
        });
        report("constraint_surface_layout", result)
    }

    fn transition(
        &self,
        surface: SurfaceId,
        from: &[SurfaceStatus],
        to: SurfaceStatus,
        on_success: impl FnOnce(&SurfaceRecord),
    ) -> Result<SurfaceStatus, UiManagerError> {
        {
            let mut surfaces = self.surfaces.write();
            let record = surfaces
                .get_mut(&surface)
                .ok_or(UiManagerError::UnknownSurface(surface))?;
            if !from.contains(&record.status) {
                return Err(UiManagerError::InvalidSurfaceState {
                    surface,
                    status: record.status,
                });
            }
            on_success(record);
            record.status = to;
        }
        log::debug!("{surface}: {to}");
        self.trace_status(surface, to);
        Ok(to)
    }

    fn trace_status(&self, surface: SurfaceId, status: SurfaceStatus) {
        self.env.tracer.surface(&SurfaceEvent { surface, status });
    }

    fn require_running(&self, surface: SurfaceId) -> Result<(), UiManagerError> {
        match self.surface_status(surface) {
            None => Err(UiManagerError::UnknownSurface(surface)),
            Some(SurfaceStatus::Running) => Ok(()),
            Some(status) => Err(UiManagerError::InvalidSurfaceState { surface, status }),
        }
    }

    fn running_tree(&self, surface: SurfaceId) -> Result<Arc<ShadowTree>, UiManagerError> {
        self.require_running(surface)?;
        self.trees
            .get(surface)
            .ok_or(UiManagerError::UnknownSurface(surface))
    }

    // -- Node construction --------------------------------------------------

    /// Creates a sealed node of a new family.
    ///
    /// The surface's root tag is taken by its root and is refused.
    pub fn create_node(
        &self,
        tag: Tag,
        component: impl Into<ComponentName>,
        surface: SurfaceId,
        props: Props,
        event_target: Option<EventTarget>,
    ) -> Result<Arc<ShadowNode>, UiManagerError> {
        report("create_node", self.require_running(surface))?;
        if tag == surface.root_tag() {
            return report("create_node", Err(UiManagerError::ReservedTag { surface, tag }));
        }
        let component_name = component.into();
        let traits = self.components.traits_of(&component_name);
        let family = ShadowNodeFamily::new(
            &self.arena,
            FamilyFragment {
                tag,
                surface_id: surface,
                component_name,
                event_target,
                traits,
            },
        );
        Ok(ShadowNode::builder(family).props(props).seal())
    }

    /// Clones `node`, replacing its children and merging `raw_props` into its
    /// props.
    pub fn clone_node(
        &self,
        node: &Arc<ShadowNode>,
        children: Option<Vec<Arc<ShadowNode>>>,
        raw_props: Option<&Props>,
    ) -> Result<Arc<ShadowNode>, UiManagerError> {
        report("clone_node", self.require_running(node.surface_id()))?;
        Ok(node.clone_with(ShadowNodeFragment {
            props: raw_props.map(|raw| node.props().merged(raw)),
            children,
            ..ShadowNodeFragment::default()
        }))
    }

    /// Returns a clone of `parent` with `child` appended.
    pub fn append_child(
        &self,
        parent: &Arc<ShadowNode>,
        child: Arc<ShadowNode>,
    ) -> Result<Arc<ShadowNode>, UiManagerError> {
        report("append_child", self.require_running(parent.surface_id()))?;
        let mut builder = parent.clone_builder();
        builder.append_child(child);
        Ok(builder.seal())
    }

    // -- Commits ------------------------------------------------------------

    /// Commits `children` as the surface root's children.
    pub fn complete_surface(
        &self,
        surface: SurfaceId,
        children: Vec<Arc<ShadowNode>>,
    ) -> Result<CommitOutcome, UiManagerError> {
        let result = self.running_tree(surface).and_then(|tree| {
            Ok(tree.commit(
                move |root| Ok(Some(root.clone_with(ShadowNodeFragment::children(children)))),
                self.commit_options,
            )?)
        });
        report("complete_surface", result)
    }

    /// Merges `raw_props` into the committed clone of `node` and commits.
    pub fn set_native_props(
        &self,
        node: &ShadowNode,
        raw_props: &Props,
    ) -> Result<CommitOutcome, UiManagerError> {
        let result = self.commit_to_family(node, |newest| {
            newest.clone_with(ShadowNodeFragment::props(newest.props().merged(raw_props)))
        });
        report("set_native_props", result)
    }

    /// Commits a new state for `node`'s family.
    pub fn update_state(
        &self,
        node: &ShadowNode,
        data: Arc<dyn Any + Send + Sync>,
    ) -> Result<CommitOutcome, UiManagerError> {
        let state = node.family().next_state(data);
        let result = self.commit_to_family(node, move |newest| {
            newest.clone_with(ShadowNodeFragment::state(state))
        });
        report("update_state", result)
    }

    fn commit_to_family(
        &self,
        node: &ShadowNode,
        f: impl FnOnce(&Arc<ShadowNode>) -> Arc<ShadowNode>,
    ) -> Result<CommitOutcome, UiManagerError> {
        let tree = self.running_tree(node.surface_id())?;
        let (family, tag) = (node.family_id(), node.tag());
        Ok(tree.commit(
            move |root| {
                ShadowNode::clone_tree(root, family, f)
                    .map(Some)
                    .ok_or(CommitError::NodeNotFound(tag))
            },
            self.commit_options,
        )?)
    }

    /// Forwards an imperative command to the delegate. The tree is not
    /// touched.
    pub fn dispatch_command(
        &self,
        node: &Arc<ShadowNode>,
        name: &str,
        args: &Value,
    ) -> Result<(), UiManagerError> {
        report("dispatch_command", self.require_running(node.surface_id()))?;
        if let Some(delegate) = &self.delegate {
            delegate.ui_manager_did_dispatch_command(node, name, args);
        }
        Ok(())
    }

    // -- Queries ------------------------------------------------------------

    /// Returns the committed clone of `node`'s family.
    #[must_use]
    pub fn newest_clone_of(&self, node: &ShadowNode) -> Option<Arc<ShadowNode>> {
        let root = self.trees.get(node.surface_id())?.current_root();
        ShadowNode::find(&root, node.family_id())
    }

    /// Returns the committed layout of `node`'s family.
    #[must_use]
    pub fn layout_metrics(&self, node: &ShadowNode) -> Option<LayoutMetrics> {
        self.newest_clone_of(node).map(|n| *n.layout_metrics())
    }

    /// Returns the committed layout of `node` relative to `ancestor`, or to
    /// the surface root when `ancestor` is `None`.
    #[must_use]
    pub fn relative_layout_metrics(
        &self,
        node: &ShadowNode,
        ancestor: Option<&ShadowNode>,
    ) -> Option<LayoutMetrics> {
        let root = self.trees.get(node.surface_id())?.current_root();
        let ancestor = ancestor.map_or(root.family_id(), ShadowNode::family_id);
        layout::relative_layout_metrics(&root, ancestor, node.family_id())
    }

    /// Returns the topmost view at `point` in surface coordinates.
    #[must_use]
    pub fn find_node_at_point(&self, surface: SurfaceId, point: Point) -> Option<Arc<ShadowNode>> {
        let root = self.trees.get(surface)?.current_root();
        layout::find_node_at_point(&root, point)
    }

    /// Returns the coordinator of a started surface.
    #[must_use]
    pub fn mounting_coordinator(&self, surface: SurfaceId) -> Option<Arc<MountingCoordinator>> {
        self.trees.get(surface).map(|t| Arc::clone(t.coordinator()))
    }
}

impl fmt::Debug for UiManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiManager")
            .field("surfaces", &self.surfaces.read().len())
            .field("live_families", &self.arena.live_count())
            .field("commit_options", &self.commit_options)
            .finish_non_exhaustive()
    }
}
