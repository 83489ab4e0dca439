//! cobra: ownership tree for scene objects
//!
//! A parent/child hierarchy that ties graphical objects together (a renderer
//! to the window that owns it, a texture to its renderer), cascades their
//! teardown and broadcasts the per-frame paint signal from a root to every
//! descendant.
//!
//! Layers:
//! - [`domain`]: the payload-agnostic [`domain::OwnershipTree`]
//! - [`application`]: scenes, the [`application::AppContext`] and services
//! - [`infrastructure`]: headless payloads, filesystem boundary, DI
//! - [`cli`]: the `cobra` command line

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;

pub use domain::{DestroyPolicy, NodeId, OwnershipTree, Payload, Traversal, TreeError, TreeResult};
