//! Container operations for panels and slot panels.
//!
//! Logical ownership (the child list, the parent link) and physical
//! placement (the child's element under the container's element) are
//! updated together. Contract checks run before anything is mutated.

use fos_dom::NodeId;

use crate::lifecycle::merge;
use crate::node::Structure;
use crate::{WidgetError, WidgetId, WidgetResult, WidgetTree};

impl WidgetTree {
    /// Append to a panel, or fill the first empty slot of a slot panel
    pub fn add(&mut self, parent: WidgetId, child: WidgetId) -> WidgetResult<()> {
        let node = self.node(parent)?;
        match &node.structure {
            Structure::Panel(children) => {
                let len = children.len();
                self.insert(parent, child, len)
            }
            Structure::Slots(slots) => {
                let slot = slots
                    .iter()
                    .position(Option::is_none)
                    .ok_or(WidgetError::IllegalState("slot panel has no empty slot"))?;
                self.set_slot(parent, slot, Some(child)).map(|_| ())
            }
            _ => Err(WidgetError::NotAContainer(parent)),
        }
    }

    /// Insert `child` into a panel before index `before`.
    ///
    /// A child taken from another container is fully removed from it first.
    /// A child already in this panel is moved: the index is interpreted as
    /// if the child had been removed first, and no lifecycle transition
    /// happens.
    pub fn insert(&mut self, parent: WidgetId, child: WidgetId, before: usize) -> WidgetResult<()> {
        let len = match &self.node(parent)?.structure {
            Structure::Panel(children) => children.len(),
            _ => return Err(WidgetError::NotAContainer(parent)),
        };
        if before > len {
            return Err(WidgetError::IndexOutOfBounds { index: before, len });
        }
        self.check_adoptable(parent, child)?;

        if self.parent(child) == Some(parent) {
            return self.move_within(parent, child, before);
        }
        self.remove_from_parent(child)?;

        let parent_el = self.element(parent)?;
        let child_el = self.element(child)?;
        let reference = self.element_at(parent, before);

        if let Structure::Panel(children) = &mut self.node_mut(parent)?.structure {
            children.insert(before, child);
        }
        if let Err(e) = self.document.tree_mut().insert_before(parent_el, child_el, reference) {
            if let Structure::Panel(children) = &mut self.node_mut(parent)?.structure {
                children.remove(before);
            }
            return Err(e.into());
        }
        self.adopt(parent, child)
    }

    /// Reorder a child already owned by `parent`
    fn move_within(&mut self, parent: WidgetId, child: WidgetId, before: usize) -> WidgetResult<()> {
        let old = self
            .index_of(parent, child)
            .ok_or(WidgetError::NotAChild { parent, child })?;
        let target = if old < before { before - 1 } else { before };
        if old == target {
            return Ok(());
        }

        // The surface moves the element in one step, so it is never absent
        // from the document and never present twice.
        let parent_el = self.element(parent)?;
        let child_el = self.element(child)?;
        let reference = self.element_at(parent, before);
        self.document.tree_mut().insert_before(parent_el, child_el, reference)?;

        if let Structure::Panel(children) = &mut self.node_mut(parent)?.structure {
            children.remove(old);
            children.insert(target, child);
        }
        tracing::debug!("Moved {:?} in {:?} from {} to {}", child, parent, old, target);
        Ok(())
    }

    /// Remove a child from a panel or slot panel
    pub fn remove(&mut self, parent: WidgetId, child: WidgetId) -> WidgetResult<()> {
        let holds = match &self.node(parent)?.structure {
            Structure::Panel(children) => children.contains(&child),
            Structure::Slots(slots) => slots.contains(&Some(child)),
            Structure::Composite(inner) if *inner == Some(child) => {
                return Err(WidgetError::NotAContainer(parent));
            }
            _ => false,
        };
        if !holds {
            return Err(WidgetError::NotAChild { parent, child });
        }
        self.orphan(parent, child)
    }

    /// Remove the child at `index` of a panel and return it
    pub fn remove_at(&mut self, parent: WidgetId, index: usize) -> WidgetResult<WidgetId> {
        let child = self.child_at(parent, index)?;
        self.remove(parent, child)?;
        Ok(child)
    }

    /// Remove the widget from its parent, if any
    pub fn remove_from_parent(&mut self, child: WidgetId) -> WidgetResult<()> {
        let parent = self.node(child)?.parent;
        match parent {
            Some(parent) => self.remove(parent, child),
            None => Ok(()),
        }
    }

    /// Remove every child, continuing past failures
    pub fn clear(&mut self, parent: WidgetId) -> WidgetResult<()> {
        let children = match &self.node(parent)?.structure {
            Structure::Panel(_) | Structure::Slots(_) => self.node(parent)?.structure.child_ids(),
            _ => return Err(WidgetError::NotAContainer(parent)),
        };
        crate::FailureSet::visit_all(children, |child| self.remove(parent, child))
    }

    /// Position of `child`: list index for panels, slot index for slot panels
    pub fn index_of(&self, parent: WidgetId, child: WidgetId) -> Option<usize> {
        match &self.widgets.get(parent.0)?.structure {
            Structure::Panel(children) => children.iter().position(|c| *c == child),
            Structure::Slots(slots) => slots.iter().position(|s| *s == Some(child)),
            _ => None,
        }
    }

    /// The panel child at `index`
    pub fn child_at(&self, parent: WidgetId, index: usize) -> WidgetResult<WidgetId> {
        match &self.node(parent)?.structure {
            Structure::Panel(children) => children
                .get(index)
                .copied()
                .ok_or(WidgetError::IndexOutOfBounds { index, len: children.len() }),
            _ => Err(WidgetError::NotAContainer(parent)),
        }
    }

    /// Number of children currently owned (occupied slots for slot panels)
    pub fn child_count(&self, parent: WidgetId) -> usize {
        self.widgets
            .get(parent.0)
            .map_or(0, |n| n.structure.child_ids().len())
    }

    /// Number of slots of a slot panel
    pub fn arity(&self, parent: WidgetId) -> Option<usize> {
        match &self.widgets.get(parent.0)?.structure {
            Structure::Slots(slots) => Some(slots.len()),
            _ => None,
        }
    }

    /// Put `child` into `slot`, or empty the slot with `None`. Returns the
    /// widget that was displaced.
    ///
    /// A child that already has a parent is removed from it first, even when
    /// that parent is this panel: moving between slots detaches and
    /// re-attaches the child, unlike the silent reorder done by `insert`.
    pub fn set_slot(
        &mut self,
        parent: WidgetId,
        slot: usize,
        child: Option<WidgetId>,
    ) -> WidgetResult<Option<WidgetId>> {
        let (arity, current) = match &self.node(parent)?.structure {
            Structure::Slots(slots) => (slots.len(), slots.get(slot).copied().flatten()),
            _ => return Err(WidgetError::NotAContainer(parent)),
        };
        if slot >= arity {
            return Err(WidgetError::SlotOutOfBounds { slot, arity });
        }
        if current == child {
            return Ok(None);
        }
        if let Some(child) = child {
            self.check_adoptable(parent, child)?;
            self.remove_from_parent(child)?;
        }

        let mut result = Ok(());
        if let Some(old) = current {
            result = merge(result, self.orphan(parent, old));
        }
        if let Some(child) = child {
            result = merge(result, self.place_in_slot(parent, slot, child));
        }
        result.map(|()| current)
    }

    /// Occupant of `slot`
    pub fn slot(&self, parent: WidgetId, slot: usize) -> WidgetResult<Option<WidgetId>> {
        match &self.node(parent)?.structure {
            Structure::Slots(slots) => slots.get(slot).copied().ok_or(WidgetError::SlotOutOfBounds {
                slot,
                arity: slots.len(),
            }),
            _ => Err(WidgetError::NotAContainer(parent)),
        }
    }

    /// Empty a populated slot and return its former occupant
    pub fn clear_slot(&mut self, parent: WidgetId, slot: usize) -> WidgetResult<WidgetId> {
        let occupant = self
            .slot(parent, slot)?
            .ok_or(WidgetError::SlotEmpty { container: parent, slot })?;
        self.orphan(parent, occupant)?;
        Ok(occupant)
    }

    /// Single-child form of [`set_slot`](Self::set_slot) for one-slot panels
    pub fn set_widget(&mut self, parent: WidgetId, child: Option<WidgetId>) -> WidgetResult<Option<WidgetId>> {
        self.set_slot(parent, 0, child)
    }

    fn place_in_slot(&mut self, parent: WidgetId, slot: usize, child: WidgetId) -> WidgetResult<()> {
        let parent_el = self.element(parent)?;
        let child_el = self.element(child)?;
        // Keep element order equal to slot order
        let reference = match &self.node(parent)?.structure {
            Structure::Slots(slots) => slots[slot + 1..]
                .iter()
                .flatten()
                .find_map(|w| self.widgets.get(w.0).and_then(|n| n.element)),
            _ => None,
        };
        self.document.tree_mut().insert_before(parent_el, child_el, reference)?;
        if let Structure::Slots(slots) = &mut self.node_mut(parent)?.structure {
            slots[slot] = Some(child);
        }
        self.adopt(parent, child)
    }

    /// Checks shared by every insertion path
    fn check_adoptable(&self, parent: WidgetId, child: WidgetId) -> WidgetResult<()> {
        self.node(child)?;
        if child == self.root() {
            return Err(WidgetError::IllegalState("the root panel cannot be a child"));
        }
        if child == parent || self.is_ancestor(child, parent) {
            return Err(WidgetError::IllegalState("a widget cannot contain itself"));
        }
        self.element(child)?;
        Ok(())
    }

    /// Element of the panel child currently at `index`
    fn element_at(&self, parent: WidgetId, index: usize) -> Option<NodeId> {
        let child = self.child_at(parent, index).ok()?;
        self.widgets.get(child.0)?.element
    }

    /// Link `child` to `parent`, attaching it if the parent is live
    fn adopt(&mut self, parent: WidgetId, child: WidgetId) -> WidgetResult<()> {
        self.node_mut(child)?.parent = Some(parent);
        tracing::debug!("{:?} adopted {:?}", parent, child);
        if self.is_attached(parent) {
            self.on_attach(child)
        } else {
            Ok(())
        }
    }

    /// Detach `child` if live, then take it out of the surface and out of
    /// the container. The unlink happens whatever the detach reported.
    fn orphan(&mut self, parent: WidgetId, child: WidgetId) -> WidgetResult<()> {
        let detached = if self.is_attached(child) {
            self.on_detach(child)
        } else {
            Ok(())
        };

        let parent_el = self.element(parent)?;
        let child_el = self.element(child)?;
        let surface = self
            .document
            .tree_mut()
            .remove_child(parent_el, child_el)
            .map_err(WidgetError::from);

        match &mut self.node_mut(parent)?.structure {
            Structure::Panel(children) => children.retain(|c| *c != child),
            Structure::Slots(slots) => {
                for slot in slots.iter_mut().filter(|s| **s == Some(child)) {
                    *slot = None;
                }
            }
            _ => {}
        }
        self.node_mut(child)?.parent = None;
        tracing::debug!("{:?} orphaned {:?}", parent, child);

        merge(detached, surface)
    }
}
