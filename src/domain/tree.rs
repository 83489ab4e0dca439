//! Arena-backed ownership tree.
//!
//! Nodes live in a generational arena; a node owns its children through the
//! `children` list and points back at its parent with a plain index. Every
//! mutation keeps the parent/child relation mutual and acyclic.

use std::collections::HashSet;
use std::fmt;

use generational_arena::{Arena, Index};
use tracing::{debug, error, instrument, trace};

use crate::domain::error::{TreeError, TreeResult};
use crate::domain::payload::Payload;
use crate::domain::policy::{DestroyPolicy, Traversal};

/// Stable identity of a node. Ids of destroyed nodes are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(Index);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (slot, generation) = self.0.into_raw_parts();
        write!(f, "#{}.{}", slot, generation)
    }
}

#[derive(Debug)]
struct Node<P> {
    /// `None` while the payload is checked out for its update hook
    payload: Option<P>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Forest of payload-carrying nodes.
pub struct OwnershipTree<P: Payload> {
    arena: Arena<Node<P>>,
    policy: DestroyPolicy,
    traversal: Traversal,
    strict: bool,
    /// Nesting depth of running broadcasts
    broadcasting: usize,
    /// Reparenting destroys while a broadcast runs: (destroyed, adopter, orphans)
    adoptions: Vec<(NodeId, Option<NodeId>, Vec<NodeId>)>,
}

impl<P: Payload> Default for OwnershipTree<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Payload> fmt::Debug for OwnershipTree<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnershipTree")
            .field("links", &self.links())
            .field("policy", &self.policy)
            .field("traversal", &self.traversal)
            .field("strict", &self.strict)
            .finish()
    }
}

impl<P: Payload> OwnershipTree<P> {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            policy: DestroyPolicy::default(),
            traversal: Traversal::default(),
            strict: false,
            broadcasting: 0,
            adoptions: Vec::new(),
        }
    }

    pub fn with_policy(mut self, policy: DestroyPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_traversal(mut self, traversal: Traversal) -> Self {
        self.traversal = traversal;
        self
    }

    /// Panic instead of returning `UseAfterDestroy`.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn policy(&self) -> DestroyPolicy {
        self.policy
    }

    pub fn traversal(&self) -> Traversal {
        self.traversal
    }

    // ------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------

    /// Insert a detached node (a new root).
    #[instrument(level = "trace", skip(self, payload))]
    pub fn insert(&mut self, payload: P) -> NodeId {
        let id = NodeId(self.arena.insert(Node {
            payload: Some(payload),
            parent: None,
            children: Vec::new(),
        }));
        trace!(%id, "inserted root");
        id
    }

    /// Insert a node already attached to `parent`.
    #[instrument(level = "trace", skip(self, payload))]
    pub fn insert_child(&mut self, payload: P, parent: NodeId) -> TreeResult<NodeId> {
        self.node(parent)?;
        let id = self.insert(payload);
        self.link(id, Some(parent));
        Ok(id)
    }

    // ------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------

    /// Move `node` under `new_parent`, or make it a root when `None`.
    ///
    /// Fails with `HierarchyViolation` when `new_parent` is `node` or one of
    /// its descendants; the tree is left untouched in that case.
    #[instrument(level = "debug", skip(self))]
    pub fn attach(&mut self, node: NodeId, new_parent: Option<NodeId>) -> TreeResult<()> {
        let current = self.node(node)?.parent;
        if let Some(parent) = new_parent {
            self.node(parent)?;
            if self.in_ancestry(parent, node) {
                debug!(%node, %parent, "rejected attach: would create a cycle");
                return Err(TreeError::HierarchyViolation { node, parent });
            }
        }
        if current == new_parent {
            return Ok(());
        }
        self.unlink(node);
        self.link(node, new_parent);
        Ok(())
    }

    /// Make `node` a root. Its children stay with it. No-op on a root.
    #[instrument(level = "debug", skip(self))]
    pub fn detach(&mut self, node: NodeId) -> TreeResult<()> {
        self.node(node)?;
        self.unlink(node);
        Ok(())
    }

    /// Destroy `node` with the tree's configured policy.
    ///
    /// Returns the number of payloads released.
    pub fn destroy(&mut self, node: NodeId) -> TreeResult<usize> {
        self.destroy_with(node, self.policy)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn destroy_with(&mut self, node: NodeId, policy: DestroyPolicy) -> TreeResult<usize> {
        let parent = self.node(node)?.parent;
        match policy {
            DestroyPolicy::Cascade => {
                // snapshot first: removing a node edits its parent's child list
                let doomed = self.postorder(node);
                for &id in &doomed {
                    self.remove(id);
                }
                debug!(%node, released = doomed.len(), "cascade destroy");
                Ok(doomed.len())
            }
            DestroyPolicy::ReparentOrphans => {
                let orphans = self.children(node)?;
                for &child in &orphans {
                    self.unlink(child);
                    self.link(child, parent);
                }
                self.remove(node);
                if self.broadcasting > 0 {
                    self.adoptions.push((node, parent, orphans.clone()));
                }
                debug!(%node, reparented = orphans.len(), "reparenting destroy");
                Ok(1)
            }
        }
    }

    /// Destroy every remaining node, deepest first. Returns the number of
    /// payloads released.
    #[instrument(level = "debug", skip(self))]
    pub fn teardown(&mut self) -> usize {
        let mut released = 0;
        for root in self.roots() {
            let doomed = self.postorder(root);
            for &id in &doomed {
                self.remove(id);
            }
            released += doomed.len();
        }
        released
    }

    // ------------------------------------------------------------
    // Broadcast
    // ------------------------------------------------------------

    /// Run the update hook on `root` and all its descendants using the
    /// tree's configured traversal. Returns the number of hooks invoked.
    pub fn broadcast(&mut self, root: NodeId) -> TreeResult<usize> {
        self.broadcast_with(root, self.traversal)
    }

    /// Nodes destroyed before their visit are skipped along with whatever
    /// they took with them. Orphans left by a reparenting destroy take the
    /// place of the destroyed node, so every node that stays alive below
    /// `root` (or below `root`'s orphans, should `root` itself go) is
    /// visited exactly once. Nodes attached during the broadcast wait for
    /// the next one.
    #[instrument(level = "trace", skip(self))]
    pub fn broadcast_with(&mut self, root: NodeId, traversal: Traversal) -> TreeResult<usize> {
        self.node(root)?;
        self.broadcasting += 1;
        let calls = self.walk(root, traversal);
        self.broadcasting -= 1;
        if self.broadcasting == 0 {
            self.adoptions.clear();
        }
        trace!(%root, calls, "broadcast done");
        Ok(calls)
    }

    fn walk(&mut self, root: NodeId, traversal: Traversal) -> usize {
        let mut visited = HashSet::new();
        let mut calls = 0;
        // (node, children already scheduled)
        let mut stack = vec![(root, false)];

        while let Some((id, expanded)) = stack.pop() {
            if !self.contains(id) {
                if !expanded {
                    for orphan in self.orphans_of(id).into_iter().rev() {
                        stack.push((orphan, false));
                    }
                }
                continue;
            }
            if !self.in_broadcast(id, root) {
                trace!(%id, "skipping node moved out during broadcast");
                continue;
            }
            if expanded {
                if self.notify(id) {
                    calls += 1;
                }
                continue;
            }
            if !visited.insert(id) {
                continue;
            }

            let snapshot = self
                .arena
                .get(id.0)
                .map(|n| n.children.clone())
                .unwrap_or_default();
            match traversal {
                Traversal::ParentFirst => {
                    if self.notify(id) {
                        calls += 1;
                    }
                }
                Traversal::ChildrenFirst => stack.push((id, true)),
            }
            for &child in snapshot.iter().rev() {
                stack.push((child, false));
            }
        }
        calls
    }

    // ------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id.0)
    }

    pub fn parent(&self, id: NodeId) -> TreeResult<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    /// Snapshot of the children of `id`.
    pub fn children(&self, id: NodeId) -> TreeResult<Vec<NodeId>> {
        Ok(self.node(id)?.children.clone())
    }

    pub fn child_count(&self, id: NodeId) -> TreeResult<usize> {
        Ok(self.node(id)?.children.len())
    }

    pub fn is_root(&self, id: NodeId) -> TreeResult<bool> {
        Ok(self.node(id)?.parent.is_none())
    }

    pub fn roots(&self) -> Vec<NodeId> {
        self.arena
            .iter()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(idx, _)| NodeId(idx))
            .collect()
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> TreeResult<Vec<NodeId>> {
        let mut out = Vec::new();
        let mut current = self.node(id)?.parent;
        while let Some(ancestor) = current {
            out.push(ancestor);
            current = self.arena.get(ancestor.0).and_then(|n| n.parent);
        }
        Ok(out)
    }

    /// True when `ancestor` lies strictly above `node`.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> TreeResult<bool> {
        self.node(ancestor)?;
        let parent = self.node(node)?.parent;
        Ok(parent.is_some_and(|p| self.in_ancestry(p, ancestor)))
    }

    /// Number of ancestors; roots have depth 0.
    pub fn depth(&self, id: NodeId) -> TreeResult<usize> {
        Ok(self.ancestors(id)?.len())
    }

    /// `id` and all its descendants in pre-order.
    pub fn subtree(&self, id: NodeId) -> TreeResult<Vec<NodeId>> {
        self.node(id)?;
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.get(current.0) {
                out.push(current);
                for &child in node.children.iter().rev() {
                    stack.push(child);
                }
            }
        }
        Ok(out)
    }

    /// Payload of `id`; `None` when the node is gone or its payload is
    /// checked out for an update hook.
    pub fn get(&self, id: NodeId) -> Option<&P> {
        self.arena.get(id.0).and_then(|n| n.payload.as_ref())
    }

    /// Every `(node, parent)` pair, sorted. Two trees with equal links have
    /// the same shape.
    pub fn links(&self) -> Vec<(NodeId, Option<NodeId>)> {
        let mut links: Vec<_> = self
            .arena
            .iter()
            .map(|(idx, node)| (NodeId(idx), node.parent))
            .collect();
        links.sort();
        links
    }

    /// Check that the relation is mutual and acyclic.
    pub fn validate(&self) -> TreeResult<()> {
        for (idx, node) in self.arena.iter() {
            let id = NodeId(idx);
            if let Some(parent) = node.parent {
                let siblings = &self
                    .arena
                    .get(parent.0)
                    .ok_or_else(|| TreeError::Corrupted(format!("{} has dead parent {}", id, parent)))?
                    .children;
                if siblings.iter().filter(|&&c| c == id).count() != 1 {
                    return Err(TreeError::Corrupted(format!(
                        "{} not listed exactly once under its parent {}",
                        id, parent
                    )));
                }
            }
            for &child in &node.children {
                let child_parent = self.arena.get(child.0).and_then(|c| c.parent);
                if child_parent != Some(id) {
                    return Err(TreeError::Corrupted(format!(
                        "{} lists child {} whose parent is {:?}",
                        id, child, child_parent
                    )));
                }
            }
            let mut steps = 0;
            let mut current = node.parent;
            while let Some(ancestor) = current {
                steps += 1;
                if ancestor == id || steps > self.arena.len() {
                    return Err(TreeError::Corrupted(format!("{} is its own ancestor", id)));
                }
                current = self.arena.get(ancestor.0).and_then(|n| n.parent);
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------

    fn node(&self, id: NodeId) -> TreeResult<&Node<P>> {
        match self.arena.get(id.0) {
            Some(node) => Ok(node),
            None => Err(self.use_after_destroy(id)),
        }
    }

    fn use_after_destroy(&self, id: NodeId) -> TreeError {
        error!(%id, "operation on destroyed node");
        if self.strict {
            panic!("use after destroy: node {} is no longer alive", id);
        }
        TreeError::UseAfterDestroy(id)
    }

    /// True when `target` is `start` or one of its ancestors.
    fn in_ancestry(&self, start: NodeId, target: NodeId) -> bool {
        let mut current = Some(start);
        while let Some(id) = current {
            if id == target {
                return true;
            }
            current = self.arena.get(id.0).and_then(|n| n.parent);
        }
        false
    }

    /// `id` lies below `root`, or below an orphan `root` left behind when it
    /// was destroyed mid-broadcast.
    fn in_broadcast(&self, id: NodeId, root: NodeId) -> bool {
        if self.contains(root) {
            return self.in_ancestry(id, root);
        }
        self.orphans_of(root)
            .into_iter()
            .any(|orphan| self.in_ancestry(id, orphan))
    }

    /// Orphans of `destroyed` still owned by the node that adopted them.
    /// An orphan destroyed in turn hands on its own orphans.
    fn orphans_of(&self, destroyed: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        for (_, adopter, orphans) in self.adoptions.iter().filter(|(n, _, _)| *n == destroyed) {
            for &orphan in orphans {
                match self.arena.get(orphan.0) {
                    Some(node) if node.parent == *adopter => out.push(orphan),
                    Some(_) => {}
                    None => out.extend(self.orphans_of(orphan)),
                }
            }
        }
        out
    }

    fn unlink(&mut self, id: NodeId) {
        let parent = self.arena.get_mut(id.0).and_then(|n| n.parent.take());
        if let Some(parent) = parent {
            if let Some(p) = self.arena.get_mut(parent.0) {
                p.children.retain(|&c| c != id);
            }
        }
    }

    /// Caller guarantees `id` is currently a root.
    fn link(&mut self, id: NodeId, parent: Option<NodeId>) {
        if let Some(p) = parent.and_then(|p| self.arena.get_mut(p.0)) {
            p.children.push(id);
        }
        if let Some(node) = self.arena.get_mut(id.0) {
            node.parent = parent;
        }
    }

    fn postorder(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![(id, false)];
        while let Some((current, expanded)) = stack.pop() {
            if expanded {
                out.push(current);
                continue;
            }
            if let Some(node) = self.arena.get(current.0) {
                stack.push((current, true));
                for &child in node.children.iter().rev() {
                    stack.push((child, false));
                }
            }
        }
        out
    }

    /// Unlink, drop from the arena and release the payload.
    fn remove(&mut self, id: NodeId) {
        self.unlink(id);
        let Some(node) = self.arena.remove(id.0) else {
            return;
        };
        // reparenting moved them out already; cascade removed them first
        for child in node.children {
            if let Some(c) = self.arena.get_mut(child.0) {
                c.parent = None;
            }
        }
        match node.payload {
            Some(mut payload) => {
                trace!(%id, "releasing payload");
                payload.on_release(id);
            }
            None => debug!(%id, "payload checked out, release deferred to hook return"),
        }
    }

    /// Invoke the update hook of `id`. Returns false when there was nothing
    /// to notify.
    fn notify(&mut self, id: NodeId) -> bool {
        let Some(mut payload) = self.arena.get_mut(id.0).and_then(|n| n.payload.take()) else {
            return false;
        };
        payload.on_update(id, self);
        match self.arena.get_mut(id.0) {
            Some(node) => node.payload = Some(payload),
            None => {
                trace!(%id, "node destroyed by its own hook");
                payload.on_release(id);
            }
        }
        true
    }
}

impl<P: Payload> Drop for OwnershipTree<P> {
    fn drop(&mut self) {
        if !self.arena.is_empty() {
            let released = self.teardown();
            trace!(released, "tree dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(tree: &mut OwnershipTree<()>, len: usize) -> Vec<NodeId> {
        let mut ids = vec![tree.insert(())];
        for _ in 1..len {
            let parent = *ids.last().unwrap();
            ids.push(tree.insert_child((), parent).unwrap());
        }
        ids
    }

    #[test]
    fn given_new_node_when_inserted_then_detached_and_childless() {
        let mut tree = OwnershipTree::<()>::new();
        let id = tree.insert(());
        assert_eq!(tree.parent(id).unwrap(), None);
        assert_eq!(tree.child_count(id).unwrap(), 0);
        assert!(tree.is_root(id).unwrap());
    }

    #[test]
    fn given_chain_when_querying_ancestry_then_nearest_first() {
        let mut tree = OwnershipTree::<()>::new();
        let ids = chain(&mut tree, 4);
        assert_eq!(tree.ancestors(ids[3]).unwrap(), vec![ids[2], ids[1], ids[0]]);
        assert_eq!(tree.depth(ids[3]).unwrap(), 3);
        assert!(tree.is_ancestor(ids[0], ids[3]).unwrap());
        assert!(!tree.is_ancestor(ids[3], ids[0]).unwrap());
        assert!(!tree.is_ancestor(ids[2], ids[2]).unwrap());
    }

    #[test]
    fn given_same_parent_when_attaching_again_then_no_duplicate_child() {
        let mut tree = OwnershipTree::<()>::new();
        let ids = chain(&mut tree, 2);
        tree.attach(ids[1], Some(ids[0])).unwrap();
        assert_eq!(tree.children(ids[0]).unwrap(), vec![ids[1]]);
        tree.validate().unwrap();
    }

    #[test]
    fn given_destroyed_slot_when_reused_then_old_id_stays_dead() {
        let mut tree = OwnershipTree::<()>::new();
        let old = tree.insert(());
        tree.destroy(old).unwrap();
        let new = tree.insert(());
        assert_ne!(old, new);
        assert!(!tree.contains(old));
        assert_eq!(tree.parent(old), Err(TreeError::UseAfterDestroy(old)));
    }

    #[test]
    fn given_postorder_snapshot_then_children_precede_parent() {
        let mut tree = OwnershipTree::<()>::new();
        let ids = chain(&mut tree, 3);
        let side = tree.insert_child((), ids[0]).unwrap();
        let order = tree.postorder(ids[0]);
        assert_eq!(order, vec![ids[2], ids[1], side, ids[0]]);
    }

    #[test]
    #[should_panic(expected = "use after destroy")]
    fn given_strict_tree_when_using_destroyed_node_then_panics() {
        let mut tree = OwnershipTree::<()>::new().with_strict(true);
        let id = tree.insert(());
        tree.destroy(id).unwrap();
        let _ = tree.detach(id);
    }
}
