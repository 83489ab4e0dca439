//! Process-wide application context.
//!
//! Created once by `main` (or a test), handed to whatever mounts a scene, and
//! shut down explicitly. Teardown order: the mounted scene releases its
//! objects deepest first, then the context goes away.

use std::thread;
use std::time::Duration;

use tracing::{debug, info, instrument};

use crate::application::{ApplicationError, ApplicationResult, Scene, SceneBuilder};
use crate::config::Settings;

/// Summary of a [`AppContext::run`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Frames actually painted
    pub frames: u64,
    /// Update hooks invoked
    pub paints: usize,
    /// Objects released while running
    pub released: usize,
    /// Objects alive after the last frame
    pub live: usize,
}

#[derive(Debug)]
pub struct AppContext {
    settings: Settings,
    scene: Option<Scene>,
    frame: u64,
}

impl AppContext {
    #[instrument(level = "debug", skip(settings))]
    pub fn init(settings: Settings) -> Self {
        info!(
            policy = %settings.destroy_policy,
            traversal = %settings.traversal,
            "context initialised"
        );
        Self {
            settings,
            scene: None,
            frame: 0,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Builder configured from the context's settings.
    pub fn scene_builder(&self) -> SceneBuilder {
        SceneBuilder::from_settings(&self.settings)
    }

    /// Mount `scene`, tearing down any scene mounted before.
    pub fn mount(&mut self, scene: Scene) {
        let released = self.unmount();
        if released > 0 {
            debug!(released, "previous scene torn down");
        }
        self.scene = Some(scene);
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn scene_mut(&mut self) -> Option<&mut Scene> {
        self.scene.as_mut()
    }

    /// Total frames painted since init.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Paint up to `frames` frames, stopping early once the scene is empty.
    #[instrument(level = "debug", skip(self))]
    pub fn run(&mut self, frames: u64) -> ApplicationResult<RunReport> {
        let delay = Duration::from_millis(self.settings.frame_delay_ms);
        let scene = self
            .scene
            .as_mut()
            .ok_or_else(|| ApplicationError::scene("no scene mounted"))?;

        let paints_before = scene.journal().paint_count();
        let released_before = scene.journal().release_count();
        let mut painted = 0;

        while painted < frames && !scene.is_empty() {
            let calls = scene.frame()?;
            painted += 1;
            self.frame += 1;
            debug!(frame = self.frame, calls, live = scene.len(), "frame painted");
            if !delay.is_zero() {
                thread::sleep(delay);
            }
        }

        Ok(RunReport {
            frames: painted,
            paints: scene.journal().paint_count() - paints_before,
            released: scene.journal().release_count() - released_before,
            live: scene.len(),
        })
    }

    /// Tear everything down. Returns the number of objects released.
    #[instrument(level = "debug", skip(self))]
    pub fn shutdown(mut self) -> usize {
        let released = self.unmount();
        info!(released, frames = self.frame, "context shut down");
        released
    }

    fn unmount(&mut self) -> usize {
        self.scene.take().map_or(0, |mut scene| scene.teardown())
    }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        self.unmount();
    }
}
