//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use tracing::debug;

use crate::application::services::SceneService;
use crate::application::{Scene, SceneBuilder};
use crate::config::Settings;
use crate::infrastructure::error::{InfraError, InfraResult};
use crate::infrastructure::traits::{FileSystem, RealFileSystem};
use crate::util::path::resolve_scene_path;

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    pub scenes: SceneService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        let settings = Arc::new(settings);
        let scenes = SceneService::new(Arc::clone(&fs));

        Self {
            settings,
            fs,
            scenes,
        }
    }

    /// Resolve `scene` (cwd first, then `scene_dir`) and build it.
    pub fn load_scene(&self, scene: &str, builder: &SceneBuilder) -> InfraResult<Scene> {
        let path = resolve_scene_path(self.fs.as_ref(), scene, &self.settings.scene_dir);
        let path = self
            .fs
            .canonicalize(&path)
            .map_err(|e| InfraError::io(format!("resolve scene {}", path.display()), e))?;
        debug!("load_scene: {}", path.display());
        Ok(self.scenes.load(&path, builder)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::traits::MemoryFileSystem;

    #[test]
    fn given_unknown_scene_when_loading_then_io_error() {
        let container = ServiceContainer::with_deps(
            Settings::default(),
            Arc::new(MemoryFileSystem::new()),
        );
        let result = container.load_scene("/does/not/exist.toml", &SceneBuilder::new());
        assert!(matches!(result, Err(InfraError::Io { .. })));
    }

    #[test]
    fn given_scene_in_memory_when_loading_then_built() {
        let fs = MemoryFileSystem::new().with_file(
            "/s.toml",
            "[[object]]\nname = \"w\"\nkind = \"window\"\n",
        );
        let container = ServiceContainer::with_deps(Settings::default(), Arc::new(fs));
        let scene = container.load_scene("/s.toml", &SceneBuilder::new()).unwrap();
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn given_relative_name_when_loading_then_resolved_against_scene_dir() {
        let fs = MemoryFileSystem::new().with_file(
            "/scenes/menu.toml",
            "[[object]]\nname = \"menu\"\nkind = \"window\"\n",
        );
        let settings = Settings {
            scene_dir: "/scenes".into(),
            ..Settings::default()
        };
        let container = ServiceContainer::with_deps(settings, Arc::new(fs));

        let scene = container.load_scene("menu.toml", &SceneBuilder::new()).unwrap();

        assert_eq!(scene.live_names(), vec!["menu"]);
    }
}
