//! Payload hooks: the seam between the tree and the resource a node wraps.

use crate::domain::tree::{NodeId, OwnershipTree};

/// Resource carried by a tree node (window, renderer, texture, ...).
///
/// The tree never inspects a payload. It only calls back into it:
/// `on_update` zero or more times during a broadcast and `on_release`
/// exactly once when the owning node is destroyed. Return values are not
/// consulted, so failures inside a hook stay with the payload.
pub trait Payload: Sized {
    /// Per-frame update ("paint").
    ///
    /// While this runs the payload is checked out of its node, so the hook may
    /// mutate `tree` freely, including destroying `id` itself. A node
    /// destroyed this way is released as soon as the hook returns.
    fn on_update(&mut self, id: NodeId, tree: &mut OwnershipTree<Self>) {
        let _ = (id, tree);
    }

    /// Release the underlying resource. Called once, after the node has been
    /// unlinked from the tree.
    fn on_release(&mut self, id: NodeId) {
        let _ = id;
    }
}

impl Payload for () {}
