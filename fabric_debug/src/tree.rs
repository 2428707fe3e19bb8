// Copyright 2026 the Fabric Core Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text dumps of shadow trees and mutation lists.

use core::fmt::Write as _;

use fabric_core::diff::Mutation;
use fabric_core::node::ShadowNode;

/// Renders `root` as an indented outline, one node per line.
///
/// Each line is `Component #tag [x,y wxh]`, followed by the props when
/// non-empty and the state revision when present.
#[must_use]
pub fn describe_tree(root: &ShadowNode) -> String {
    let mut out = String::new();
    describe_node(root, 0, &mut out);
    out
}

fn describe_node(node: &ShadowNode, depth: usize, out: &mut String) {
    let frame = node.layout_metrics().frame;
    let _ = write!(
        out,
        "{:indent$}{} {} [{},{} {}x{}]",
        "",
        node.component_name(),
        node.tag(),
        frame.x0,
        frame.y0,
        frame.width(),
        frame.height(),
        indent = depth * 2
    );
    if !node.props().is_empty() {
        let _ = write!(out, " {}", node.props().to_value());
    }
    if let Some(state) = node.state() {
        let _ = write!(out, " state r{}", state.revision());
    }
    out.push('\n');
    for child in node.children() {
        describe_node(child, depth + 1, out);
    }
}

/// Renders `mutations` one instruction per line.
#[must_use]
pub fn describe_mutations(mutations: &[Mutation]) -> String {
    let mut out = String::new();
    for m in mutations {
        let _ = match m {
            Mutation::Create { node } => {
                writeln!(out, "create {} {}", node.tag(), node.component_name())
            }
            Mutation::Delete { node } => writeln!(out, "delete {}", node.tag()),
            Mutation::Insert {
                parent_tag,
                node,
                index,
            } => writeln!(out, "insert {} into {parent_tag} at {index}", node.tag()),
            Mutation::Remove {
                parent_tag,
                child_tag,
                index,
            } => writeln!(out, "remove {child_tag} from {parent_tag} at {index}"),
            Mutation::Update { new, .. } => writeln!(out, "update {}", new.tag()),
            Mutation::UpdateState { node, state } => {
                writeln!(out, "update-state {} r{}", node.tag(), state.revision())
            }
        };
    }
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use fabric_core::diff::diff;
    use fabric_core::node::{
        FamilyArena, FamilyFragment, NodeTraits, Props, ShadowNodeFamily, ShadowNodeFragment,
        SurfaceId, Tag,
    };
    use serde_json::json;

    use super::*;

    fn node(arena: &Arc<FamilyArena>, tag: u32, name: &str, traits: NodeTraits) -> Arc<ShadowNode> {
        let family = ShadowNodeFamily::new(
            arena,
            FamilyFragment {
                tag: Tag(tag),
                surface_id: SurfaceId(1),
                component_name: name.into(),
                event_target: None,
                traits,
            },
        );
        ShadowNode::builder(family).seal()
    }

    #[test]
    fn outline_and_instructions() {
        let arena = Arc::new(FamilyArena::new());
        let root = node(&arena, 1, "RootView", NodeTraits::FORMS_VIEW | NodeTraits::ROOT_NODE_KIND);
        let child = node(&arena, 2, "View", NodeTraits::FORMS_VIEW)
            .clone_with(ShadowNodeFragment::props(Props::from(json!({ "width": 5 }))));
        let next = root.clone_with(ShadowNodeFragment::children(vec![child]));

        assert_eq!(
            describe_tree(&next),
            "RootView #1 [0,0 0x0]\n  View #2 [0,0 0x0] {\"width\":5}\n",
            "outline is stable"
        );
        assert_eq!(
            describe_mutations(&diff(Some(&root), &next)),
            "create #2 View\ninsert #2 into #1 at 0\n",
            "instructions are stable"
        );
    }
}
