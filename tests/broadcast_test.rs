//! Depth-first paint broadcast, including hooks that mutate the tree.

mod common;

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use cobra::{DestroyPolicy, NodeId, OwnershipTree, Traversal};
use rstest::rstest;

use common::{Log, Probe};

/// R -> {C1 -> {G1, G2}, C2, C3}
fn six(log: &Log, traversal: Traversal) -> (OwnershipTree<Probe>, HashMap<&'static str, NodeId>) {
    let mut tree = OwnershipTree::new().with_traversal(traversal);
    let r = tree.insert(Probe::new("R", log));
    let c1 = tree.insert_child(Probe::new("C1", log), r).unwrap();
    let g1 = tree.insert_child(Probe::new("G1", log), c1).unwrap();
    let g2 = tree.insert_child(Probe::new("G2", log), c1).unwrap();
    let c2 = tree.insert_child(Probe::new("C2", log), r).unwrap();
    let c3 = tree.insert_child(Probe::new("C3", log), r).unwrap();
    let ids = HashMap::from([
        ("R", r),
        ("C1", c1),
        ("G1", g1),
        ("G2", g2),
        ("C2", c2),
        ("C3", c3),
    ]);
    (tree, ids)
}

#[rstest]
#[case(Traversal::ParentFirst)]
#[case(Traversal::ChildrenFirst)]
fn given_six_node_tree_when_broadcast_then_each_node_visited_once(#[case] traversal: Traversal) {
    let log = Log::default();
    let (mut tree, ids) = six(&log, traversal);

    let calls = tree.broadcast(ids["R"]).unwrap();

    assert_eq!(calls, 6);
    for name in ["R", "C1", "G1", "G2", "C2", "C3"] {
        assert_eq!(log.count(name, "update"), 1, "{} painted once", name);
    }
}

#[test]
fn given_parent_first_when_broadcast_then_parents_before_children() {
    let log = Log::default();
    let (mut tree, ids) = six(&log, Traversal::ParentFirst);

    tree.broadcast(ids["R"]).unwrap();

    assert_eq!(log.updates(), ["R", "C1", "G1", "G2", "C2", "C3"]);
}

#[test]
fn given_children_first_when_broadcast_then_children_before_parents() {
    let log = Log::default();
    let (mut tree, ids) = six(&log, Traversal::ChildrenFirst);

    tree.broadcast(ids["R"]).unwrap();

    assert_eq!(log.updates(), ["G1", "G2", "C1", "C2", "C3", "R"]);
}

#[test]
fn given_inner_node_when_broadcast_then_only_its_subtree_painted() {
    let log = Log::default();
    let (mut tree, ids) = six(&log, Traversal::ParentFirst);

    assert_eq!(tree.broadcast(ids["C1"]).unwrap(), 3);
    assert_eq!(log.count("R", "update"), 0);
    assert_eq!(log.count("C2", "update"), 0);
}

// ============================================================
// Reentrant mutation from hooks
// ============================================================

#[test]
fn given_hook_destroying_later_sibling_when_broadcast_then_sibling_not_painted() {
    let log = Log::default();
    let mut tree = OwnershipTree::new();
    let r = tree.insert(Probe::new("R", &log));
    let victim: Rc<Cell<Option<NodeId>>> = Rc::new(Cell::new(None));
    let target = Rc::clone(&victim);
    tree.insert_child(
        Probe::new("killer", &log).with_hook(Box::new(move |_, tree| {
            if let Some(id) = target.get() {
                tree.destroy(id).unwrap();
            }
        })),
        r,
    )
    .unwrap();
    let v = tree.insert_child(Probe::new("victim", &log), r).unwrap();
    tree.insert_child(Probe::new("victim-child", &log), v).unwrap();
    victim.set(Some(v));

    let calls = tree.broadcast(r).unwrap();

    assert_eq!(calls, 2);
    assert_eq!(log.count("victim", "update"), 0);
    assert_eq!(log.count("victim-child", "update"), 0);
    assert_eq!(log.count("victim", "release"), 1);
    assert_eq!(log.count("victim-child", "release"), 1);
    tree.validate().unwrap();
}

#[test]
fn given_hook_destroying_own_node_when_broadcast_then_released_once_after_hook() {
    let log = Log::default();
    let mut tree = OwnershipTree::new();
    let r = tree.insert(Probe::new("R", &log));
    let doomed = tree
        .insert_child(
            Probe::new("self-destruct", &log).with_hook(Box::new(|id, tree| {
                tree.destroy(id).unwrap();
            })),
            r,
        )
        .unwrap();
    tree.insert_child(Probe::new("orphan", &log), doomed).unwrap();

    tree.broadcast(r).unwrap();

    assert!(!tree.contains(doomed));
    assert_eq!(log.count("self-destruct", "update"), 1);
    assert_eq!(log.count("self-destruct", "release"), 1);
    // cascade took the child before it could be painted
    assert_eq!(log.count("orphan", "update"), 0);
    assert_eq!(log.count("orphan", "release"), 1);
    assert_eq!(tree.len(), 1);
}

#[test]
fn given_hook_adding_child_when_broadcast_then_new_child_waits_for_next_frame() {
    let log = Log::default();
    let hook_log = log.clone();
    let mut tree = OwnershipTree::new();
    let r = tree.insert(Probe::new("R", &log).with_hook(Box::new(move |id, tree| {
        tree.insert_child(Probe::new("spawned", &hook_log), id).unwrap();
    })));

    assert_eq!(tree.broadcast(r).unwrap(), 1);
    assert_eq!(log.count("spawned", "update"), 0);

    assert_eq!(tree.broadcast(r).unwrap(), 2);
    assert_eq!(log.count("spawned", "update"), 1);
    assert_eq!(tree.child_count(r).unwrap(), 2);
}

#[test]
fn given_hook_moving_sibling_out_of_subtree_when_broadcast_then_sibling_skipped() {
    let log = Log::default();
    let mut tree = OwnershipTree::new();
    let r = tree.insert(Probe::new("R", &log));
    let elsewhere = tree.insert(Probe::new("elsewhere", &log));
    let moved: Rc<Cell<Option<NodeId>>> = Rc::new(Cell::new(None));
    let target = Rc::clone(&moved);
    tree.insert_child(
        Probe::new("mover", &log).with_hook(Box::new(move |_, tree| {
            if let Some(id) = target.get() {
                tree.attach(id, Some(elsewhere)).unwrap();
            }
        })),
        r,
    )
    .unwrap();
    let m = tree.insert_child(Probe::new("moved", &log), r).unwrap();
    moved.set(Some(m));

    tree.broadcast(r).unwrap();

    assert_eq!(log.count("moved", "update"), 0);
    assert_eq!(tree.parent(m).unwrap(), Some(elsewhere));
}

// ============================================================
// Reentrant mutation under reparent-orphans
// ============================================================

fn destroy_self() -> common::Hook {
    Box::new(|id, tree| {
        tree.destroy(id).unwrap();
    })
}

#[test]
fn given_reparent_when_hook_destroys_own_node_then_orphans_painted_once() {
    let log = Log::default();
    let mut tree = OwnershipTree::new().with_policy(DestroyPolicy::ReparentOrphans);
    let r = tree.insert(Probe::new("R", &log));
    let s = tree
        .insert_child(Probe::new("S", &log).with_hook(destroy_self()), r)
        .unwrap();
    let o1 = tree.insert_child(Probe::new("O1", &log), s).unwrap();
    let o2 = tree.insert_child(Probe::new("O2", &log), s).unwrap();

    let calls = tree.broadcast(r).unwrap();

    assert_eq!(calls, 4);
    assert_eq!(log.updates(), ["R", "S", "O1", "O2"]);
    assert_eq!(log.releases(), ["S"]);
    assert_eq!(tree.children(r).unwrap(), vec![o1, o2]);
    tree.validate().unwrap();
}

#[test]
fn given_reparent_when_hook_destroys_unvisited_sibling_then_its_children_painted_once() {
    let log = Log::default();
    let mut tree = OwnershipTree::new().with_policy(DestroyPolicy::ReparentOrphans);
    let r = tree.insert(Probe::new("R", &log));
    let victim: Rc<Cell<Option<NodeId>>> = Rc::new(Cell::new(None));
    let target = Rc::clone(&victim);
    let killer = tree
        .insert_child(
            Probe::new("killer", &log).with_hook(Box::new(move |_, tree| {
                if let Some(id) = target.get() {
                    tree.destroy(id).unwrap();
                }
            })),
            r,
        )
        .unwrap();
    let v = tree.insert_child(Probe::new("victim", &log), r).unwrap();
    let v1 = tree.insert_child(Probe::new("V1", &log), v).unwrap();
    let v2 = tree.insert_child(Probe::new("V2", &log), v).unwrap();
    tree.insert_child(Probe::new("V1a", &log), v1).unwrap();
    victim.set(Some(v));

    let calls = tree.broadcast(r).unwrap();

    assert_eq!(calls, 5);
    assert_eq!(log.updates(), ["R", "killer", "V1", "V1a", "V2"]);
    assert_eq!(log.count("victim", "update"), 0);
    assert_eq!(log.releases(), ["victim"]);
    assert_eq!(tree.children(r).unwrap(), vec![killer, v1, v2]);
    tree.validate().unwrap();
}

#[rstest]
#[case(false)]
#[case(true)]
fn given_reparent_when_root_destroys_itself_then_former_children_still_painted(
    #[case] has_parent: bool,
) {
    let log = Log::default();
    let mut tree = OwnershipTree::new().with_policy(DestroyPolicy::ReparentOrphans);
    let top = has_parent.then(|| tree.insert(Probe::new("top", &log)));
    let r = tree.insert(Probe::new("R", &log).with_hook(destroy_self()));
    if let Some(top) = top {
        tree.attach(r, Some(top)).unwrap();
    }
    let a = tree.insert_child(Probe::new("A", &log), r).unwrap();
    tree.insert_child(Probe::new("A1", &log), a).unwrap();
    let b = tree.insert_child(Probe::new("B", &log), r).unwrap();

    let calls = tree.broadcast(r).unwrap();

    assert_eq!(calls, 4);
    assert_eq!(log.updates(), ["R", "A", "A1", "B"]);
    assert_eq!(log.count("top", "update"), 0);
    assert_eq!(log.releases(), ["R"]);
    assert_eq!(tree.parent(a).unwrap(), top);
    assert_eq!(tree.parent(b).unwrap(), top);
    tree.validate().unwrap();

    // the next frame starts from whatever owns them now
    let next = match top {
        Some(top) => tree.broadcast(top).unwrap(),
        None => tree.broadcast(a).unwrap() + tree.broadcast(b).unwrap(),
    };
    assert_eq!(next, if has_parent { 4 } else { 3 });
}

#[test]
fn given_reparent_when_root_destroyed_and_orphan_moved_away_then_moved_orphan_skipped() {
    let log = Log::default();
    let mut tree = OwnershipTree::new().with_policy(DestroyPolicy::ReparentOrphans);
    let elsewhere = tree.insert(Probe::new("elsewhere", &log));
    let moved: Rc<Cell<Option<NodeId>>> = Rc::new(Cell::new(None));
    let target = Rc::clone(&moved);
    let r = tree.insert(Probe::new("R", &log).with_hook(Box::new(move |id, tree| {
        tree.destroy(id).unwrap();
        if let Some(b) = target.get() {
            tree.attach(b, Some(elsewhere)).unwrap();
        }
    })));
    tree.insert_child(Probe::new("A", &log), r).unwrap();
    let b = tree.insert_child(Probe::new("B", &log), r).unwrap();
    moved.set(Some(b));

    tree.broadcast(r).unwrap();

    assert_eq!(log.updates(), ["R", "A"]);
    assert_eq!(tree.parent(b).unwrap(), Some(elsewhere));
}
