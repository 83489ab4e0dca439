#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use cobra::{NodeId, OwnershipTree, Payload};

pub type Hook = Box<dyn FnMut(NodeId, &mut OwnershipTree<Probe>)>;

/// Shared record of hook calls: (name, "update" | "release").
#[derive(Clone, Default)]
pub struct Log(Rc<RefCell<Vec<(String, &'static str)>>>);

impl Log {
    pub fn updates(&self) -> Vec<String> {
        self.of("update")
    }

    pub fn releases(&self) -> Vec<String> {
        self.of("release")
    }

    pub fn count(&self, name: &str, what: &str) -> usize {
        self.0
            .borrow()
            .iter()
            .filter(|(n, w)| n == name && *w == what)
            .count()
    }

    fn of(&self, what: &str) -> Vec<String> {
        self.0
            .borrow()
            .iter()
            .filter(|(_, w)| *w == what)
            .map(|(n, _)| n.clone())
            .collect()
    }
}

/// Test payload recording every hook call.
pub struct Probe {
    pub name: String,
    log: Log,
    hook: Option<Hook>,
}

impl Probe {
    pub fn new(name: &str, log: &Log) -> Self {
        Self {
            name: name.to_string(),
            log: log.clone(),
            hook: None,
        }
    }

    pub fn with_hook(mut self, hook: Hook) -> Self {
        self.hook = Some(hook);
        self
    }
}

impl Payload for Probe {
    fn on_update(&mut self, id: NodeId, tree: &mut OwnershipTree<Self>) {
        self.log.0.borrow_mut().push((self.name.clone(), "update"));
        if let Some(hook) = self.hook.as_mut() {
            hook(id, tree);
        }
    }

    fn on_release(&mut self, _id: NodeId) {
        self.log.0.borrow_mut().push((self.name.clone(), "release"));
    }
}
