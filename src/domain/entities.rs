//! Domain entities: scene description data structures

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of graphical object a scene node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Window,
    Renderer,
    Texture,
    /// Plain grouping node without a resource of its own
    Group,
}

impl ObjectKind {
    /// Whether an object of this kind may live under `parent`.
    ///
    /// `None` means "as a root". Renderers belong to a window and textures
    /// to a renderer; windows and groups may hang anywhere except under a
    /// texture or renderer.
    pub fn accepts_parent(&self, parent: Option<ObjectKind>) -> bool {
        match (self, parent) {
            (ObjectKind::Renderer, Some(ObjectKind::Window)) => true,
            (ObjectKind::Renderer, _) => false,
            (ObjectKind::Texture, Some(ObjectKind::Renderer)) => true,
            (ObjectKind::Texture, _) => false,
            (_, None | Some(ObjectKind::Window) | Some(ObjectKind::Group)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ObjectKind::Window => "window",
            ObjectKind::Renderer => "renderer",
            ObjectKind::Texture => "texture",
            ObjectKind::Group => "group",
        };
        write!(f, "{}", s)
    }
}

/// One `[[object]]` entry of a scene file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSpec {
    /// Unique name within the scene
    pub name: String,
    pub kind: ObjectKind,
    /// Name of the owning object, absent for roots
    #[serde(default)]
    pub parent: Option<String>,
    /// Window title
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    /// Frames after which the object destroys itself
    #[serde(default)]
    pub expires_after: Option<u64>,
}

impl ObjectSpec {
    pub fn new(name: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parent: None,
            title: None,
            width: None,
            height: None,
            expires_after: None,
        }
    }

    pub fn under(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn expiring_after(mut self, frames: u64) -> Self {
        self.expires_after = Some(frames);
        self
    }
}

/// A whole scene file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneSpec {
    #[serde(default, rename = "object")]
    pub objects: Vec<ObjectSpec>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_renderer_when_checking_parents_then_only_window_accepted() {
        assert!(ObjectKind::Renderer.accepts_parent(Some(ObjectKind::Window)));
        assert!(!ObjectKind::Renderer.accepts_parent(None));
        assert!(!ObjectKind::Renderer.accepts_parent(Some(ObjectKind::Group)));
    }

    #[test]
    fn given_window_when_checking_parents_then_not_under_texture() {
        assert!(ObjectKind::Window.accepts_parent(None));
        assert!(ObjectKind::Window.accepts_parent(Some(ObjectKind::Group)));
        assert!(!ObjectKind::Window.accepts_parent(Some(ObjectKind::Texture)));
        assert!(!ObjectKind::Group.accepts_parent(Some(ObjectKind::Renderer)));
    }

    #[test]
    fn given_toml_objects_when_deserialized_then_optional_fields_default() {
        let spec: SceneSpec = toml::from_str(
            r#"
[[object]]
name = "main"
kind = "window"
title = "Cobra"

[[object]]
name = "gpu"
kind = "renderer"
parent = "main"
"#,
        )
        .unwrap();
        assert_eq!(spec.objects.len(), 2);
        assert_eq!(spec.objects[0].title.as_deref(), Some("Cobra"));
        assert_eq!(spec.objects[1], ObjectSpec::new("gpu", ObjectKind::Renderer).under("main"));
    }
}
