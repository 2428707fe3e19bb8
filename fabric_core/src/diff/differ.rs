// Copyright 2026 the Fabric Core Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Revision diffing.

use std::collections::HashMap;
use std::sync::Arc;

use super::mutation::Mutation;
use crate::node::{FamilyId, ShadowNode, Tag};

/// Computes the instructions that turn a view tree mirroring `old` into one
/// mirroring `new`.
///
/// Passing `None` for `old` treats every node of `new` as created. Diffing a
/// root against itself yields nothing.
///
/// The list is ordered so it can be applied front to back:
///
/// 1. every `Remove`, each parent's group by descending index,
/// 2. every `Delete`,
/// 3. every `Update` and `UpdateState`,
/// 4. every `Create`, parents before children,
/// 5. every `Insert`, each parent's group by ascending index.
///
/// Children are matched by family. Matched children that keep their relative
/// order stay in place; any other matched child is relocated with a
/// `Remove`/`Insert` pair.
///
/// # Panics
///
/// Panics if the roots belong to different families, or if two siblings share
/// a family.
#[must_use]
pub fn diff(old: Option<&Arc<ShadowNode>>, new: &Arc<ShadowNode>) -> Vec<Mutation> {
    let mut buckets = Buckets::default();
    match old {
        None => buckets.create_subtree(new),
        Some(old) if Arc::ptr_eq(old, new) => {}
        Some(old) => {
            assert!(
                old.same_family(new),
                "cannot diff roots of different families: {:?} and {:?}",
                old.family_id(),
                new.family_id()
            );
            buckets.diff_node(old, new);
        }
    }
    buckets.finish()
}

#[derive(Default)]
struct Buckets {
    removes: Vec<Mutation>,
    deletes: Vec<Mutation>,
    updates: Vec<Mutation>,
    creates: Vec<Mutation>,
    inserts: Vec<Mutation>,
}

impl Buckets {
    fn finish(self) -> Vec<Mutation> {
        let Self {
            mut removes,
            deletes,
            updates,
            creates,
            inserts,
        } = self;
        removes.reserve(deletes.len() + updates.len() + creates.len() + inserts.len());
        removes.extend(deletes);
        removes.extend(updates);
        removes.extend(creates);
        removes.extend(inserts);
        removes
    }

    /// Diffs two revisions of one family.
    fn diff_node(&mut self, old: &Arc<ShadowNode>, new: &Arc<ShadowNode>) {
        if Arc::ptr_eq(old, new) {
            return;
        }

        if old.props() != new.props() || old.layout_metrics() != new.layout_metrics() {
            self.updates.push(Mutation::Update {
                old: Arc::clone(old),
                new: Arc::clone(new),
            });
        } else if old.state() != new.state() {
            self.updates.push(match new.state() {
                Some(state) => Mutation::UpdateState {
                    node: Arc::clone(new),
                    state: state.clone(),
                },
                None => Mutation::Update {
                    old: Arc::clone(old),
                    new: Arc::clone(new),
                },
            });
        }

        if !old.shares_children_with(new) {
            self.diff_children(old, new);
        }
    }

    fn diff_children(&mut self, old_parent: &ShadowNode, new_parent: &ShadowNode) {
        let parent_tag = new_parent.tag();
        let old_children = old_parent.children();
        let new_children = new_parent.children();

        let old_index = index_by_family(old_parent.tag(), old_children);
        assert_unique_families(parent_tag, new_children);

        // (old index, new index) for every matched child, in new order.
        let mut matched: Vec<(usize, usize)> = Vec::with_capacity(new_children.len());
        let mut old_matched = vec![false; old_children.len()];
        let mut removes: Vec<(usize, Tag)> = Vec::new();
        let mut inserts: Vec<(usize, Arc<ShadowNode>)> = Vec::new();

        for (new_i, child) in new_children.iter().enumerate() {
            match old_index.get(&child.family_id()) {
                Some(&old_i) => {
                    matched.push((old_i, new_i));
                    old_matched[old_i] = true;
                }
                None => {
                    self.create_subtree(child);
                    inserts.push((new_i, Arc::clone(child)));
                }
            }
        }

        for (old_i, child) in old_children.iter().enumerate() {
            if !old_matched[old_i] {
                removes.push((old_i, child.tag()));
                self.delete_subtree(child);
            }
        }

        let sequence: Vec<usize> = matched.iter().map(|&(old_i, _)| old_i).collect();
        let stays = longest_increasing_run(&sequence);
        for (&(old_i, new_i), stays) in matched.iter().zip(stays) {
            let old_child = &old_children[old_i];
            let new_child = &new_children[new_i];
            if !stays {
                removes.push((old_i, old_child.tag()));
                inserts.push((new_i, Arc::clone(new_child)));
            }
            self.diff_node(old_child, new_child);
        }

        removes.sort_unstable_by(|a, b| b.0.cmp(&a.0));
        self.removes
            .extend(removes.into_iter().map(|(index, child_tag)| Mutation::Remove {
                parent_tag,
                child_tag,
                index,
            }));

        inserts.sort_unstable_by_key(|(index, _)| *index);
        self.inserts
            .extend(inserts.into_iter().map(|(index, node)| Mutation::Insert {
                parent_tag,
                node,
                index,
            }));
    }

    /// Emits `Create` for `node` and its descendants, plus the `Insert`s that
    /// assemble the descendants. Attaching `node` itself is up to the caller.
    fn create_subtree(&mut self, node: &Arc<ShadowNode>) {
        self.creates.push(Mutation::Create {
            node: Arc::clone(node),
        });
        assert_unique_families(node.tag(), node.children());
        for child in node.children() {
            self.create_subtree(child);
        }
        for (index, child) in node.children().iter().enumerate() {
            self.inserts.push(Mutation::Insert {
                parent_tag: node.tag(),
                node: Arc::clone(child),
                index,
            });
        }
    }

    /// Emits the `Remove`s that take `node`'s subtree apart and a `Delete`
    /// for every node in it. Detaching `node` itself is up to the caller.
    fn delete_subtree(&mut self, node: &Arc<ShadowNode>) {
        for (index, child) in node.children().iter().enumerate().rev() {
            self.removes.push(Mutation::Remove {
                parent_tag: node.tag(),
                child_tag: child.tag(),
                index,
            });
        }
        for child in node.children() {
            self.delete_subtree(child);
        }
        self.deletes.push(Mutation::Delete {
            node: Arc::clone(node),
        });
    }
}

fn index_by_family(parent: Tag, children: &[Arc<ShadowNode>]) -> HashMap<FamilyId, usize> {
    let mut index = HashMap::with_capacity(children.len());
    for (i, child) in children.iter().enumerate() {
        let previous = index.insert(child.family_id(), i);
        assert!(
            previous.is_none(),
            "duplicate family {:?} among children of {parent}",
            child.family_id()
        );
    }
    index
}

fn assert_unique_families(parent: Tag, children: &[Arc<ShadowNode>]) {
    if children.len() > 1 {
        let _ = index_by_family(parent, children);
    }
}

/// Marks the members of one longest strictly increasing subsequence.
fn longest_increasing_run(sequence: &[usize]) -> Vec<bool> {
    // `tails[k]` is the position of the smallest tail of any run of length k+1.
    let mut tails: Vec<usize> = Vec::new();
    let mut previous: Vec<Option<usize>> = vec![None; sequence.len()];
    for (i, &value) in sequence.iter().enumerate() {
        let k = tails.partition_point(|&t| sequence[t] < value);
        if k > 0 {
            previous[i] = Some(tails[k - 1]);
        }
        if k == tails.len() {
            tails.push(i);
        } else {
            tails[k] = i;
        }
    }

    let mut keep = vec![false; sequence.len()];
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        keep[i] = true;
        cursor = previous[i];
    }
    keep
}
