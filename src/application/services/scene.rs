//! Scene loading service
//!
//! Reads scene files through the `FileSystem` boundary and builds them.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::application::{
    ApplicationError, ApplicationResult, IoResultExt, Scene, SceneBuilder,
};
use crate::domain::SceneSpec;
use crate::infrastructure::traits::FileSystem;

/// Service for loading scene files.
pub struct SceneService {
    fs: Arc<dyn FileSystem>,
}

impl SceneService {
    /// Create a new scene service.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Read and parse a scene file without building it.
    pub fn load_spec(&self, path: &Path) -> ApplicationResult<SceneSpec> {
        debug!("load_spec: path={}", path.display());
        if !self.fs.is_file(path) {
            return Err(ApplicationError::scene(format!(
                "scene file not found: {}",
                path.display()
            )));
        }
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read scene", path)?;
        SceneBuilder::parse(&content).map_err(|e| {
            ApplicationError::scene(format!("{}: {}", path.display(), e))
        })
    }

    /// Read, parse and build a scene file.
    pub fn load(&self, path: &Path, builder: &SceneBuilder) -> ApplicationResult<Scene> {
        let spec = self.load_spec(path)?;
        let scene = builder.build(&spec)?;
        debug!("load: {} objects from {}", scene.len(), path.display());
        Ok(scene)
    }
}
