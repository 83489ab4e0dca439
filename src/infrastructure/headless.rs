//! Headless stand-ins for native window/renderer/texture handles.
//!
//! A `HeadlessObject` behaves like a wrapped native resource as far as the
//! ownership tree can tell: it paints on every broadcast, releases once, and
//! may expire on its own. Everything it does is written to a shared
//! [`Journal`] so a caller can inspect the history after the object is gone.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::domain::{NodeId, ObjectSpec, OwnershipTree, Payload};

/// Something that happened to a scene object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneEvent {
    Painted { name: String, frame: u64 },
    Expired { name: String },
    Released { name: String },
}

impl SceneEvent {
    pub fn name(&self) -> &str {
        match self {
            SceneEvent::Painted { name, .. }
            | SceneEvent::Expired { name }
            | SceneEvent::Released { name } => name,
        }
    }
}

/// Shared, append-only event log.
#[derive(Debug, Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<SceneEvent>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: SceneEvent) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<SceneEvent> {
        self.0.borrow().clone()
    }

    pub fn paints_of(&self, name: &str) -> usize {
        self.count(|e| matches!(e, SceneEvent::Painted { .. }) && e.name() == name)
    }

    pub fn releases_of(&self, name: &str) -> usize {
        self.count(|e| matches!(e, SceneEvent::Released { .. }) && e.name() == name)
    }

    pub fn paint_count(&self) -> usize {
        self.count(|e| matches!(e, SceneEvent::Painted { .. }))
    }

    pub fn release_count(&self) -> usize {
        self.count(|e| matches!(e, SceneEvent::Released { .. }))
    }

    /// Names in the order they were released.
    pub fn released(&self) -> Vec<String> {
        self.0
            .borrow()
            .iter()
            .filter(|e| matches!(e, SceneEvent::Released { .. }))
            .map(|e| e.name().to_string())
            .collect()
    }

    fn count(&self, pred: impl Fn(&SceneEvent) -> bool) -> usize {
        self.0.borrow().iter().filter(|e| pred(e)).count()
    }
}

/// Payload of a scene node.
#[derive(Debug)]
pub struct HeadlessObject {
    spec: ObjectSpec,
    frames: u64,
    released: bool,
    journal: Journal,
}

impl HeadlessObject {
    pub fn new(spec: ObjectSpec, journal: Journal) -> Self {
        Self {
            spec,
            frames: 0,
            released: false,
            journal,
        }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

}

impl Payload for HeadlessObject {
    fn on_update(&mut self, id: NodeId, tree: &mut OwnershipTree<Self>) {
        self.frames += 1;
        trace!(name = %self.spec.name, frame = self.frames, "paint");
        self.journal.record(SceneEvent::Painted {
            name: self.spec.name.clone(),
            frame: self.frames,
        });

        if self.spec.expires_after.is_some_and(|n| self.frames >= n) {
            debug!(name = %self.spec.name, frames = self.frames, "expired");
            self.journal.record(SceneEvent::Expired {
                name: self.spec.name.clone(),
            });
            if let Err(e) = tree.destroy(id) {
                warn!(name = %self.spec.name, error = %e, "could not destroy expired object");
            }
        }
    }

    fn on_release(&mut self, _id: NodeId) {
        if self.released {
            warn!(name = %self.spec.name, "released twice");
        }
        self.released = true;
        debug!(name = %self.spec.name, kind = %self.spec.kind, "released");
        self.journal.record(SceneEvent::Released {
            name: self.spec.name.clone(),
        });
    }
}

impl fmt::Display for HeadlessObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.spec.name, self.spec.kind)?;
        if let Some(title) = &self.spec.title {
            write!(f, " \"{}\"", title)?;
        }
        if let (Some(w), Some(h)) = (self.spec.width, self.spec.height) {
            write!(f, " {}x{}", w, h)?;
        }
        Ok(())
    }
}
