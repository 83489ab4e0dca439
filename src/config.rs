//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/cobra/cobra.toml`
//! 3. Local config: `<dir>/.cobra.toml` (usually the working directory)
//! 4. Environment variables: `COBRA_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, Map};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{DestroyPolicy, Traversal};
use crate::util::path::expand_path;

/// Unified configuration for cobra.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// What destroying a node does to its children
    pub destroy_policy: DestroyPolicy,
    /// Paint order within a subtree
    pub traversal: Traversal,
    /// Frames painted by `cobra run` when `--frames` is not given
    pub frames: u64,
    /// Pause between frames
    pub frame_delay_ms: u64,
    /// Panic on use-after-destroy instead of reporting an error
    pub strict_lifecycle: bool,
    /// Where relative scene paths are looked up when not found in cwd
    pub scene_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            destroy_policy: DestroyPolicy::Cascade,
            traversal: Traversal::ParentFirst,
            frames: 3,
            frame_delay_ms: 16,
            strict_lifecycle: false,
            scene_dir: default_scene_dir(),
        }
    }
}

/// Raw settings for intermediate parsing (`None` → not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub destroy_policy: Option<DestroyPolicy>,
    pub traversal: Option<Traversal>,
    pub frames: Option<u64>,
    pub frame_delay_ms: Option<u64>,
    pub strict_lifecycle: Option<bool>,
    pub scene_dir: Option<PathBuf>,
}

/// Get the default scene directory (~/.cobra/scenes).
fn default_scene_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".cobra").join("scenes"))
        .unwrap_or_else(|| PathBuf::from("~/.cobra/scenes"))
}

/// Get the XDG config directory for cobra.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "cobra").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("cobra.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".cobra.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Expand `~`, `$VAR` and `${VAR}` in path-like fields.
    fn expand_paths(&mut self) {
        self.scene_dir = expand_path(&self.scene_dir.to_string_lossy());
    }

    /// Overlay wins wherever it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            destroy_policy: overlay.destroy_policy.unwrap_or(self.destroy_policy),
            traversal: overlay.traversal.unwrap_or(self.traversal),
            frames: overlay.frames.unwrap_or(self.frames),
            frame_delay_ms: overlay.frame_delay_ms.unwrap_or(self.frame_delay_ms),
            strict_lifecycle: overlay.strict_lifecycle.unwrap_or(self.strict_lifecycle),
            scene_dir: overlay
                .scene_dir
                .clone()
                .unwrap_or_else(|| self.scene_dir.clone()),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.cobra.toml`
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/cobra/cobra.toml`
    /// 3. Local config: `<local_dir>/.cobra.toml`
    /// 4. Environment variables: `COBRA_*` prefix
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current, None)?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply COBRA_* environment variables as explicit overrides.
    ///
    /// `vars` replaces the process environment when given.
    fn apply_env_overrides(
        mut settings: Self,
        vars: Option<Map<String, String>>,
    ) -> Result<Self, ApplicationError> {
        // Use config crate just for env var parsing
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("COBRA")
                    .prefix_separator("_")
                    .separator("__")
                    .source(vars),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("destroy_policy") {
            settings.destroy_policy = val.parse().map_err(|message| ApplicationError::Config {
                message: format!("COBRA_DESTROY_POLICY: {}", message),
            })?;
        }
        if let Ok(val) = config.get_string("traversal") {
            settings.traversal = val.parse().map_err(|message| ApplicationError::Config {
                message: format!("COBRA_TRAVERSAL: {}", message),
            })?;
        }
        if let Ok(val) = config.get_string("frames") {
            settings.frames = parse_number("COBRA_FRAMES", &val)?;
        }
        if let Ok(val) = config.get_string("frame_delay_ms") {
            settings.frame_delay_ms = parse_number("COBRA_FRAME_DELAY_MS", &val)?;
        }
        if let Ok(val) = config.get_string("strict_lifecycle") {
            settings.strict_lifecycle = parse_flag("COBRA_STRICT_LIFECYCLE", &val)?;
        }
        if let Ok(val) = config.get_string("scene_dir") {
            settings.scene_dir = PathBuf::from(val);
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# cobra configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/cobra/cobra.toml
#   Local:  ./.cobra.toml
#   Env:    COBRA_* environment variables (explicit overrides)

# What destroying an object does to the objects it owns:
#   "cascade"          destroy them too, deepest first
#   "reparent-orphans" hand them to the destroyed object's owner
# destroy_policy = "cascade"

# Paint order within a subtree: "parent-first" or "children-first"
# traversal = "parent-first"

# Frames painted by `cobra run` without --frames
# frames = 3

# Pause between frames in milliseconds
# frame_delay_ms = 16

# Abort on use of a destroyed object instead of reporting an error
# strict_lifecycle = false

# Directory searched for scene files given by relative path
# scene_dir = "~/.cobra/scenes"
"#
        .to_string()
    }
}

fn parse_number(var: &str, val: &str) -> Result<u64, ApplicationError> {
    val.trim().parse().map_err(|e| ApplicationError::Config {
        message: format!("{}: invalid number '{}': {}", var, val, e),
    })
}

fn parse_flag(var: &str, val: &str) -> Result<bool, ApplicationError> {
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ApplicationError::Config {
            message: format!("{}: expected true or false, got '{}'", var, val),
        }),
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
