//! Domain layer: the ownership tree and its payload seam
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod entities;
pub mod error;
pub mod payload;
pub mod policy;
pub mod tree;

pub use entities::{ObjectKind, ObjectSpec, SceneSpec};
pub use error::{TreeError, TreeResult};
pub use payload::Payload;
pub use policy::{DestroyPolicy, Traversal};
pub use tree::{NodeId, OwnershipTree};
