// Copyright 2026 the Fabric Core Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Helpers shared by unit tests.

use std::sync::Arc;

use serde_json::Value;

use crate::node::{
    ComponentName, FamilyArena, FamilyFragment, NodeTraits, Props, ShadowNode, ShadowNodeFamily,
    SurfaceId, Tag,
};

/// Builds small sealed trees for one surface.
#[derive(Debug)]
pub(crate) struct TreeBuilder {
    pub(crate) arena: Arc<FamilyArena>,
    pub(crate) surface: SurfaceId,
}

impl TreeBuilder {
    pub(crate) fn new() -> Self {
        Self {
            arena: Arc::new(FamilyArena::new()),
            surface: SurfaceId(1),
        }
    }

    pub(crate) fn family(&self, tag: u32, name: &str, traits: NodeTraits) -> Arc<ShadowNodeFamily> {
        ShadowNodeFamily::new(
            &self.arena,
            FamilyFragment {
                tag: Tag(tag),
                surface_id: self.surface,
                component_name: ComponentName::new(name),
                event_target: None,
                traits,
            },
        )
    }

    /// A `View` with empty props.
    pub(crate) fn view<const N: usize>(&self, tag: u32, children: [Arc<ShadowNode>; N]) -> Arc<ShadowNode> {
        self.view_with(tag, Value::Null, children)
    }

    /// A `View` with the given JSON props.
    pub(crate) fn view_with<const N: usize>(
        &self,
        tag: u32,
        props: Value,
        children: [Arc<ShadowNode>; N],
    ) -> Arc<ShadowNode> {
        ShadowNode::builder(self.family(tag, "View", NodeTraits::FORMS_VIEW))
            .props(Props::from(props))
            .children(children)
            .seal()
    }

    /// A surface root tagged with the surface id.
    pub(crate) fn root<const N: usize>(&self, children: [Arc<ShadowNode>; N]) -> Arc<ShadowNode> {
        ShadowNode::builder(self.family(
            self.surface.root_tag().0,
            ComponentName::ROOT,
            NodeTraits::FORMS_VIEW | NodeTraits::ROOT_NODE_KIND,
        ))
        .children(children)
        .seal()
    }
}
