//! Rendering ownership trees as `termtree` output.

use std::fmt;

use termtree::Tree;

use crate::application::Scene;
use crate::domain::{NodeId, OwnershipTree, Payload};

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

/// Render the subtree below `id`. Nodes whose payload is checked out are
/// shown by id.
pub fn subtree_to_tree<P>(tree: &OwnershipTree<P>, id: NodeId) -> Tree<String>
where
    P: Payload + fmt::Display,
{
    let label = tree
        .get(id)
        .map(|p| p.to_string())
        .unwrap_or_else(|| id.to_string());
    let leaves = tree
        .children(id)
        .unwrap_or_default()
        .into_iter()
        .map(|child| subtree_to_tree(tree, child))
        .collect::<Vec<_>>();
    Tree::new(label).with_leaves(leaves)
}

impl<P> TreeNodeConvert for OwnershipTree<P>
where
    P: Payload + fmt::Display,
{
    fn to_tree_string(&self) -> Tree<String> {
        let roots = self.roots();
        match roots.as_slice() {
            [] => Tree::new("Empty tree".to_string()),
            [root] => subtree_to_tree(self, *root),
            _ => Tree::new(format!("{} roots", roots.len()))
                .with_leaves(roots.iter().map(|&r| subtree_to_tree(self, r))),
        }
    }
}

impl TreeNodeConvert for Scene {
    fn to_tree_string(&self) -> Tree<String> {
        self.tree().to_tree_string()
    }
}
