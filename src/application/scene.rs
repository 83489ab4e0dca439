//! Scenes: a named ownership tree of headless objects.

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::config::Settings;
use crate::domain::{
    DestroyPolicy, NodeId, ObjectKind, OwnershipTree, SceneSpec, Traversal, TreeError,
};
use crate::infrastructure::{HeadlessObject, Journal};

/// Ownership tree plus a name index and the journal its objects write to.
#[derive(Debug)]
pub struct Scene {
    tree: OwnershipTree<HeadlessObject>,
    names: BTreeMap<String, NodeId>,
    journal: Journal,
}

impl Scene {
    pub fn tree(&self) -> &OwnershipTree<HeadlessObject> {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut OwnershipTree<HeadlessObject> {
        &mut self.tree
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Node id of a live object.
    pub fn id(&self, name: &str) -> ApplicationResult<NodeId> {
        let id = *self
            .names
            .get(name)
            .ok_or_else(|| ApplicationError::scene(format!("unknown object '{}'", name)))?;
        if !self.tree.contains(id) {
            return Err(TreeError::UseAfterDestroy(id).into());
        }
        Ok(id)
    }

    pub fn name_of(&self, id: NodeId) -> Option<&str> {
        self.tree.get(id).map(|obj| obj.name())
    }

    /// Names of objects still alive, sorted.
    pub fn live_names(&self) -> Vec<String> {
        self.names
            .iter()
            .filter(|(_, &id)| self.tree.contains(id))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Destroy an object by name. `policy` overrides the tree's default.
    #[instrument(level = "debug", skip(self))]
    pub fn destroy(&mut self, name: &str, policy: Option<DestroyPolicy>) -> ApplicationResult<usize> {
        let id = self.id(name)?;
        let policy = policy.unwrap_or(self.tree.policy());
        Ok(self.tree.destroy_with(id, policy)?)
    }

    /// Paint one frame: broadcast from every root alive at frame start.
    ///
    /// Returns the number of update hooks invoked.
    #[instrument(level = "trace", skip(self))]
    pub fn frame(&mut self) -> ApplicationResult<usize> {
        let mut calls = 0;
        for root in self.tree.roots() {
            if self.tree.contains(root) {
                calls += self.tree.broadcast(root)?;
            }
        }
        Ok(calls)
    }

    /// Release every object, deepest first.
    pub fn teardown(&mut self) -> usize {
        self.tree.teardown()
    }
}

/// Builds a [`Scene`] from a [`SceneSpec`].
///
/// Every object is created detached first and then attached to its declared
/// parent, so a parent loop in the file is rejected by the tree itself.
#[derive(Debug, Clone, Default)]
pub struct SceneBuilder {
    policy: DestroyPolicy,
    traversal: Traversal,
    strict: bool,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            policy: settings.destroy_policy,
            traversal: settings.traversal,
            strict: settings.strict_lifecycle,
        }
    }

    pub fn with_policy(mut self, policy: DestroyPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_traversal(mut self, traversal: Traversal) -> Self {
        self.traversal = traversal;
        self
    }

    /// Parse scene TOML.
    pub fn parse(content: &str) -> ApplicationResult<SceneSpec> {
        toml::from_str(content).map_err(|e| ApplicationError::scene(format!("parse: {}", e)))
    }

    #[instrument(level = "debug", skip(self, spec), fields(objects = spec.objects.len()))]
    pub fn build(&self, spec: &SceneSpec) -> ApplicationResult<Scene> {
        let journal = Journal::new();
        let mut tree = OwnershipTree::new()
            .with_policy(self.policy)
            .with_traversal(self.traversal)
            .with_strict(self.strict);
        let mut names = BTreeMap::new();
        let mut kinds = BTreeMap::new();

        for object in &spec.objects {
            if names.contains_key(&object.name) {
                return Err(ApplicationError::scene(format!(
                    "duplicate object name '{}'",
                    object.name
                )));
            }
            let id = tree.insert(HeadlessObject::new(object.clone(), journal.clone()));
            names.insert(object.name.clone(), id);
            kinds.insert(object.name.clone(), object.kind);
        }

        for object in &spec.objects {
            let parent_kind: Option<ObjectKind> = match &object.parent {
                Some(parent) => Some(*kinds.get(parent).ok_or_else(|| {
                    ApplicationError::scene(format!(
                        "object '{}' refers to unknown parent '{}'",
                        object.name, parent
                    ))
                })?),
                None => None,
            };
            if !object.kind.accepts_parent(parent_kind) {
                return Err(ApplicationError::scene(format!(
                    "a {} cannot be owned by {}",
                    object.kind,
                    parent_kind.map_or_else(|| "nothing".to_string(), |k| format!("a {}", k))
                )));
            }
            if let Some(parent) = &object.parent {
                tree.attach(names[&object.name], Some(names[parent]))?;
            }
        }

        tree.validate()?;
        debug!(nodes = tree.len(), roots = tree.roots().len(), "scene built");
        Ok(Scene {
            tree,
            names,
            journal,
        })
    }
}
