//! Child traversal.
//!
//! [`ChildIter`] is a borrowing iterator. [`ChildCursor`] holds no borrow,
//! so the tree can change between steps and the cursor can remove the
//! child it last returned. Both skip empty slots by looking ahead from the
//! current position instead of snapshotting occupancy.

use crate::node::Structure;
use crate::{WidgetError, WidgetId, WidgetResult, WidgetTree};

/// What sits at `index` of a container: `None` past the end,
/// `Some(None)` for an empty slot.
fn occupant(tree: &WidgetTree, container: WidgetId, index: usize) -> Option<Option<WidgetId>> {
    match &tree.widgets.get(container.0)?.structure {
        Structure::Leaf => None,
        Structure::Panel(children) => children.get(index).copied().map(Some),
        Structure::Slots(slots) => slots.get(index).copied(),
        Structure::Composite(inner) => (index == 0).then_some(*inner).filter(Option::is_some),
    }
}

/// First occupied index at or after `from`
fn next_occupied(tree: &WidgetTree, container: WidgetId, from: usize) -> Option<(usize, WidgetId)> {
    let mut index = from;
    loop {
        match occupant(tree, container, index)? {
            Some(child) => return Some((index, child)),
            None => index += 1,
        }
    }
}

/// Iterator over a container's children in index order
pub struct ChildIter<'a> {
    tree: &'a WidgetTree,
    container: WidgetId,
    next: usize,
}

impl Iterator for ChildIter<'_> {
    type Item = WidgetId;

    fn next(&mut self) -> Option<WidgetId> {
        let (index, child) = next_occupied(self.tree, self.container, self.next)?;
        self.next = index + 1;
        Some(child)
    }
}

/// Detached cursor over a container's children with removal support
#[derive(Debug, Clone)]
pub struct ChildCursor {
    container: WidgetId,
    next: usize,
    /// Index and widget returned by the last `advance`, cleared by `remove`
    last: Option<(usize, WidgetId)>,
}

impl ChildCursor {
    pub fn container(&self) -> WidgetId {
        self.container
    }

    pub fn has_next(&self, tree: &WidgetTree) -> bool {
        next_occupied(tree, self.container, self.next).is_some()
    }

    /// Advance to the next occupied position
    pub fn advance(&mut self, tree: &WidgetTree) -> WidgetResult<WidgetId> {
        let (index, child) =
            next_occupied(tree, self.container, self.next).ok_or(WidgetError::NoSuchElement)?;
        self.next = index + 1;
        self.last = Some((index, child));
        Ok(child)
    }

    /// Remove the child returned by the last call to `advance`
    pub fn remove(&mut self, tree: &mut WidgetTree) -> WidgetResult<()> {
        let (index, child) = self
            .last
            .take()
            .ok_or(WidgetError::IllegalState("remove without a preceding advance"))?;
        let container = self.container;

        let is_slots = matches!(tree.node(container)?.structure, Structure::Slots(_));
        if is_slots {
            return match occupant(tree, container, index).flatten() {
                None => Err(WidgetError::SlotEmpty { container, slot: index }),
                Some(current) if current != child => Err(WidgetError::NotAChild { parent: container, child }),
                Some(_) => tree.clear_slot(container, index).map(|_| ()),
            };
        }

        let position = tree.index_of(container, child);
        tree.remove(container, child)?;
        if let Some(position) = position {
            if position < self.next {
                self.next -= 1;
            }
        }
        Ok(())
    }
}

impl WidgetTree {
    /// Iterate over the children of a container. Empty slots are skipped;
    /// a composite yields its inner widget.
    pub fn children(&self, id: WidgetId) -> ChildIter<'_> {
        ChildIter {
            tree: self,
            container: id,
            next: 0,
        }
    }

    /// Cursor over the children of `id`
    pub fn cursor(&self, id: WidgetId) -> WidgetResult<ChildCursor> {
        self.node(id)?;
        Ok(ChildCursor {
            container: id,
            next: 0,
            last: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{Config, Plain, WidgetError, WidgetTree};

    #[test]
    fn test_panel_cursor_remove_keeps_position() {
        let mut tree = WidgetTree::new(Config::default());
        let panel = tree.create_panel("div", Plain);
        let ids: Vec<_> = (0..4).map(|_| tree.create_leaf("span", Plain)).collect();
        for id in &ids {
            tree.add(panel, *id).unwrap();
        }

        let mut cursor = tree.cursor(panel).unwrap();
        let mut seen = Vec::new();
        while cursor.has_next(&tree) {
            let child = cursor.advance(&tree).unwrap();
            seen.push(child);
            if child == ids[1] || child == ids[2] {
                cursor.remove(&mut tree).unwrap();
            }
        }
        assert_eq!(seen, ids);
        assert_eq!(tree.children(panel).collect::<Vec<_>>(), vec![ids[0], ids[3]]);
        assert!(matches!(cursor.advance(&tree), Err(WidgetError::NoSuchElement)));
    }

    #[test]
    fn test_remove_requires_next() {
        let mut tree = WidgetTree::new(Config::default());
        let panel = tree.create_panel("div", Plain);
        let a = tree.create_leaf("span", Plain);
        tree.add(panel, a).unwrap();

        let mut cursor = tree.cursor(panel).unwrap();
        assert!(matches!(cursor.remove(&mut tree), Err(WidgetError::IllegalState(_))));
        cursor.advance(&tree).unwrap();
        cursor.remove(&mut tree).unwrap();
        assert!(matches!(cursor.remove(&mut tree), Err(WidgetError::IllegalState(_))));
    }

    #[test]
    fn test_slot_emptied_between_next_and_remove() {
        let mut tree = WidgetTree::new(Config::default());
        let dock = tree.create_slot_panel("div", 2, Plain);
        let a = tree.create_leaf("span", Plain);
        tree.set_slot(dock, 0, Some(a)).unwrap();

        let mut cursor = tree.cursor(dock).unwrap();
        assert_eq!(cursor.advance(&tree).unwrap(), a);
        tree.clear_slot(dock, 0).unwrap();
        assert!(matches!(
            cursor.remove(&mut tree),
            Err(WidgetError::SlotEmpty { slot: 0, .. })
        ));
    }

    #[test]
    fn test_slot_filled_after_cursor_creation_is_seen() {
        let mut tree = WidgetTree::new(Config::default());
        let dock = tree.create_slot_panel("div", 3, Plain);
        let (a, b) = (tree.create_leaf("span", Plain), tree.create_leaf("span", Plain));
        tree.set_slot(dock, 0, Some(a)).unwrap();

        let mut cursor = tree.cursor(dock).unwrap();
        assert_eq!(cursor.advance(&tree).unwrap(), a);
        assert!(!cursor.has_next(&tree));

        tree.set_slot(dock, 2, Some(b)).unwrap();
        assert!(cursor.has_next(&tree));
        assert_eq!(cursor.advance(&tree).unwrap(), b);
    }

    #[test]
    fn test_composite_yields_inner() {
        let mut tree = WidgetTree::new(Config::default());
        let composite = tree.create_composite(Plain);
        assert_eq!(tree.children(composite).count(), 0);
        let inner = tree.create_leaf("span", Plain);
        tree.init_widget(composite, inner).unwrap();
        assert_eq!(tree.children(composite).collect::<Vec<_>>(), vec![inner]);
    }
}
