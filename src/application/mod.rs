//! Application layer: scenes, the application context and services
//!
//! This layer orchestrates the ownership tree and depends on I/O boundary traits.

pub mod context;
pub mod error;
pub mod error_ext;
pub mod scene;
pub mod services;

pub use context::{AppContext, RunReport};
pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::IoResultExt;
pub use scene::{Scene, SceneBuilder};
