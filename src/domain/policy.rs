//! Named choices for cascading teardown and broadcast order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What happens to the children of a destroyed node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DestroyPolicy {
    /// Destroy every descendant first (deepest first), then the node.
    #[default]
    Cascade,
    /// Hand the children over to the destroyed node's parent (or make them
    /// roots), then destroy only the node.
    ReparentOrphans,
}

/// When a node's update hook runs relative to its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Traversal {
    /// Node first, then its subtree (pre-order).
    #[default]
    ParentFirst,
    /// Subtree first, then the node (post-order).
    ChildrenFirst,
}

impl fmt::Display for DestroyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DestroyPolicy::Cascade => write!(f, "cascade"),
            DestroyPolicy::ReparentOrphans => write!(f, "reparent-orphans"),
        }
    }
}

impl FromStr for DestroyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cascade" | "cascade-delete" => Ok(DestroyPolicy::Cascade),
            "reparent" | "reparent-orphans" => Ok(DestroyPolicy::ReparentOrphans),
            other => Err(format!(
                "unknown destroy policy '{}' (expected cascade or reparent-orphans)",
                other
            )),
        }
    }
}

impl fmt::Display for Traversal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Traversal::ParentFirst => write!(f, "parent-first"),
            Traversal::ChildrenFirst => write!(f, "children-first"),
        }
    }
}

impl FromStr for Traversal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "parent-first" | "pre-order" => Ok(Traversal::ParentFirst),
            "children-first" | "post-order" => Ok(Traversal::ChildrenFirst),
            other => Err(format!(
                "unknown traversal '{}' (expected parent-first or children-first)",
                other
            )),
        }
    }
}
