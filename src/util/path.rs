use std::path::{Path, PathBuf};

use crate::infrastructure::traits::FileSystem;

/// Expand `~`, `$VAR` and `${VAR}`. Unknown variables leave the input as is.
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(
        shellexpand::full(path)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| path.to_string()),
    )
}

/// Resolve a scene path: as given (after expansion) when it exists,
/// otherwise relative to `scene_dir`. Returns the expanded path unchanged
/// when neither exists so the caller reports the name the user typed.
pub fn resolve_scene_path(fs: &dyn FileSystem, path: &str, scene_dir: &Path) -> PathBuf {
    let expanded = expand_path(path);
    if fs.exists(&expanded) || expanded.is_absolute() {
        return expanded;
    }
    let candidate = scene_dir.join(&expanded);
    if fs.exists(&candidate) {
        candidate
    } else {
        expanded
    }
}
