//! Edge case and stress tests for fos-dom
//!
//! Deep trees, repeated reordering and listener routing at the boundaries.

use fos_dom::{Document, DomError, DomTree, EventBits, EventKind, ListenerId, NodeId};

// ============================================================================
// TREE SHAPE EDGE CASES
// ============================================================================

#[test]
fn test_deep_tree_membership() {
    let mut doc = Document::new();
    let body = doc.body().expect("skeleton has a body");

    let mut parent = body;
    let mut deepest = body;
    for _ in 0..1000 {
        let child = doc.tree_mut().create_element("div");
        doc.tree_mut().append_child(parent, child).unwrap();
        parent = child;
        deepest = child;
    }
    assert!(doc.is_in_document(deepest));

    let first = doc.tree().child_at(body, 0).unwrap();
    doc.tree_mut().detach(first).unwrap();
    assert!(!doc.is_in_document(deepest));
}

#[test]
fn test_repeated_moves_never_duplicate() {
    let mut tree = DomTree::new();
    let list = tree.create_element("ul");
    tree.append_child(tree.root(), list).unwrap();
    let items: Vec<_> = (0..10)
        .map(|_| {
            let li = tree.create_element("li");
            tree.append_child(list, li).unwrap();
            li
        })
        .collect();

    // Rotate the first item to the end many times
    for _ in 0..25 {
        let first = tree.child_at(list, 0).unwrap();
        tree.append_child(list, first).unwrap();
        assert_eq!(tree.child_count(list), 10);
    }

    let order: Vec<_> = tree.children(list).collect();
    let expected: Vec<_> = items.iter().cycle().skip(5).take(10).copied().collect();
    assert_eq!(order, expected);
}

#[test]
fn test_move_between_parents() {
    let mut tree = DomTree::new();
    let a = tree.create_element("div");
    let b = tree.create_element("div");
    let child = tree.create_element("span");
    tree.append_child(a, child).unwrap();

    tree.append_child(b, child).unwrap();
    assert_eq!(tree.child_count(a), 0);
    assert_eq!(tree.parent(child), Some(b));
}

#[test]
fn test_root_cannot_be_moved_or_released() {
    let mut tree = DomTree::new();
    let div = tree.create_element("div");
    assert!(matches!(
        tree.append_child(div, NodeId::ROOT),
        Err(DomError::HierarchyRequest { .. })
    ));
    assert!(tree.release(NodeId::ROOT).is_err());
}

#[test]
fn test_stale_node_is_not_found() {
    let mut tree = DomTree::new();
    let div = tree.create_element("div");
    tree.release(div).unwrap();
    assert!(matches!(tree.set_attribute(div, "id", "x"), Err(DomError::NotFound(_))));
    assert_eq!(tree.attribute(div, "id"), None);
}

// ============================================================================
// LISTENER ROUTING EDGE CASES
// ============================================================================

#[test]
fn test_non_bubbling_event_stays_on_target() {
    let mut tree = DomTree::new();
    let form = tree.create_element("form");
    let input = tree.create_element("input");
    tree.append_child(form, input).unwrap();
    tree.set_event_listener(form, Some(ListenerId(1))).unwrap();
    tree.sink_events(form, EventBits::FOCUS_EVENTS | EventBits::CLICK).unwrap();

    assert!(tree.dispatch_path(input, EventKind::Blur).is_empty());
    assert_eq!(tree.dispatch_path(input, EventKind::Click), vec![(form, ListenerId(1))]);
}

#[test]
fn test_sunk_bits_without_listener_are_ignored() {
    let mut tree = DomTree::new();
    let div = tree.create_element("div");
    tree.sink_events(div, EventBits::CLICK).unwrap();
    assert!(tree.dispatch_path(div, EventKind::Click).is_empty());

    tree.set_event_listener(div, Some(ListenerId(7))).unwrap();
    assert_eq!(tree.dispatch_path(div, EventKind::Click).len(), 1);
    tree.set_event_listener(div, None).unwrap();
    assert!(tree.dispatch_path(div, EventKind::Click).is_empty());
}
