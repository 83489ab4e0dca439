//! Infrastructure layer: I/O implementations, headless payloads and DI container
//!
//! This layer implements I/O boundary traits and wires up services.

pub mod di;
pub mod error;
pub mod headless;
pub mod traits;

pub use error::{InfraError, InfraResult};
pub use headless::{HeadlessObject, Journal, SceneEvent};
