// Copyright 2026 the Fabric Core Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node families and the generational arena that names them.

use core::any::Any;
use core::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bitflags::bitflags;
use parking_lot::Mutex;

use super::id::{ComponentName, EventTarget, FamilyId, SurfaceId, Tag};
use super::state::State;

bitflags! {
    /// Static characteristics of a component, fixed for the whole family.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct NodeTraits: u32 {
        /// The node is materialized as a host view and can be hit-tested.
        const FORMS_VIEW = 1 << 0;
        /// The node is a surface root.
        const ROOT_NODE_KIND = 1 << 1;
        /// Layout does not descend into the node's children.
        const LEAF_LAYOUT = 1 << 2;
    }
}

/// Allocator for [`FamilyId`]s.
///
/// Slots are recycled through a free list once the last node of a family is
/// released, and each release bumps the slot's generation so ids held past
/// that point fail [`is_alive`](Self::is_alive).
#[derive(Debug, Default)]
pub struct FamilyArena {
    slots: Mutex<ArenaSlots>,
}

#[derive(Debug, Default)]
struct ArenaSlots {
    generation: Vec<u32>,
    live: Vec<bool>,
    free_list: Vec<u32>,
}

impl FamilyArena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether `id` names a family that still has live nodes.
    #[must_use]
    pub fn is_alive(&self, id: FamilyId) -> bool {
        let slots = self.slots.lock();
        let idx = id.idx as usize;
        idx < slots.live.len() && slots.live[idx] && slots.generation[idx] == id.generation
    }

    /// Returns the number of live families.
    #[must_use]
    pub fn live_count(&self) -> usize {
        let slots = self.slots.lock();
        slots.live.len() - slots.free_list.len()
    }

    fn allocate(&self) -> FamilyId {
        let mut slots = self.slots.lock();
        let idx = if let Some(idx) = slots.free_list.pop() {
            slots.live[idx as usize] = true;
            idx
        } else {
            let len = slots.live.len();
            assert!(len < u32::MAX as usize, "family arena exhausted");
            slots.live.push(true);
            slots.generation.push(0);
            #[expect(
                clippy::cast_possible_truncation,
                reason = "length checked against u32::MAX above"
            )]
            {
                len as u32
            }
        };
        FamilyId {
            idx,
            generation: slots.generation[idx as usize],
        }
    }

    fn release(&self, id: FamilyId) {
        let mut slots = self.slots.lock();
        let idx = id.idx as usize;
        assert!(
            idx < slots.live.len() && slots.live[idx] && slots.generation[idx] == id.generation,
            "stale FamilyId released: {id:?}"
        );
        slots.live[idx] = false;
        slots.generation[idx] = slots.generation[idx].wrapping_add(1);
        slots.free_list.push(id.idx);
    }
}

/// Everything needed to start a new family.
#[derive(Clone, Debug)]
pub struct FamilyFragment {
    /// Host-view tag.
    pub tag: Tag,
    /// Owning surface.
    pub surface_id: SurfaceId,
    /// Component the node instantiates.
    pub component_name: ComponentName,
    /// Event routing handle, if the component emits events.
    pub event_target: Option<EventTarget>,
    /// Component traits.
    pub traits: NodeTraits,
}

/// Identity and shared bookkeeping common to every clone of one logical node.
///
/// Clones of a node hold the same `Arc<ShadowNodeFamily>`. When the last
/// clone is dropped, the family's arena slot is released.
pub struct ShadowNodeFamily {
    id: FamilyId,
    tag: Tag,
    surface_id: SurfaceId,
    component_name: ComponentName,
    event_target: Option<EventTarget>,
    traits: NodeTraits,
    state_revision: AtomicU64,
    most_recent_state: Mutex<Option<State>>,
    arena: Arc<FamilyArena>,
}

impl ShadowNodeFamily {
    /// Allocates a family id from `arena` and creates the family.
    #[must_use]
    pub fn new(arena: &Arc<FamilyArena>, fragment: FamilyFragment) -> Arc<Self> {
        Arc::new(Self {
            id: arena.allocate(),
            tag: fragment.tag,
            surface_id: fragment.surface_id,
            component_name: fragment.component_name,
            event_target: fragment.event_target,
            traits: fragment.traits,
            state_revision: AtomicU64::new(0),
            most_recent_state: Mutex::new(None),
            arena: Arc::clone(arena),
        })
    }

    /// Returns the family id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> FamilyId {
        self.id
    }

    /// Returns the host-view tag.
    #[inline]
    #[must_use]
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Returns the owning surface.
    #[inline]
    #[must_use]
    pub fn surface_id(&self) -> SurfaceId {
        self.surface_id
    }

    /// Returns the component name.
    #[must_use]
    pub fn component_name(&self) -> &ComponentName {
        &self.component_name
    }

    /// Returns the event routing handle.
    #[must_use]
    pub fn event_target(&self) -> Option<EventTarget> {
        self.event_target
    }

    /// Returns the component traits.
    #[inline]
    #[must_use]
    pub fn traits(&self) -> NodeTraits {
        self.traits
    }

    /// Issues a new state for this family, stamped with the next revision.
    #[must_use]
    pub fn next_state(&self, data: Arc<dyn Any + Send + Sync>) -> State {
        let revision = self.state_revision.fetch_add(1, Ordering::AcqRel) + 1;
        State::new(revision, data)
    }

    /// Returns the newest state that has been committed for this family.
    #[must_use]
    pub fn most_recent_state(&self) -> Option<State> {
        self.most_recent_state.lock().clone()
    }

    /// Records `state` as committed, unless a newer one is already recorded.
    pub(crate) fn set_most_recent_state(&self, state: &State) {
        let mut current = self.most_recent_state.lock();
        let replace = match current.as_ref() {
            Some(existing) => state.is_newer_than(existing),
            None => true,
        };
        if replace {
            *current = Some(state.clone());
        }
    }
}

impl Drop for ShadowNodeFamily {
    fn drop(&mut self) {
        self.arena.release(self.id);
    }
}

impl fmt::Debug for ShadowNodeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShadowNodeFamily")
            .field("id", &self.id)
            .field("tag", &self.tag)
            .field("surface_id", &self.surface_id)
            .field("component_name", &self.component_name)
            .field("traits", &self.traits)
            .finish_non_exhaustive()
    }
}
