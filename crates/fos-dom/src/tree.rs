//! DOM Tree (arena-based allocation)
//!
//! Insertion follows DOM semantics: a node that already has a parent is
//! unlinked first, so reordering is one operation and a node is never
//! reachable from two parents.

use crate::{DomError, DomResult, Node, NodeId};

/// Arena-based DOM tree for memory efficiency
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
    /// Released slots available for reuse
    free: Vec<NodeId>,
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::document()],
            free: Vec::new(),
        }
    }

    /// The document node
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).filter(|n| !n.is_vacant())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index()).filter(|n| !n.is_vacant())
    }

    pub(crate) fn node(&self, id: NodeId) -> DomResult<&Node> {
        self.get(id).ok_or(DomError::NotFound(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> DomResult<&mut Node> {
        self.get_mut(id).ok_or(DomError::NotFound(id))
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.nodes[id.index()] = node;
            id
        } else {
            let id = NodeId(self.nodes.len() as u32);
            self.nodes.push(node);
            id
        }
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(Node::element(tag))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.alloc(Node::text(content.to_string()))
    }

    /// Parent of a node, if linked
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent.some())
    }

    /// Iterate over the direct children of a node
    pub fn children(&self, id: NodeId) -> Children<'_> {
        let next = self.get(id).map_or(NodeId::NONE, |n| n.first_child);
        Children { tree: self, next }
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).count()
    }

    /// Position of `child` among the children of `parent`
    pub fn child_index(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.children(parent).position(|c| c == child)
    }

    /// Child at a position
    pub fn child_at(&self, parent: NodeId, index: usize) -> Option<NodeId> {
        self.children(parent).nth(index)
    }

    /// Check whether `ancestor` is a strict ancestor of `node`
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent(p);
        }
        false
    }

    /// Append `child` as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `reference` (or append when `None`)
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<()> {
        self.node(parent)?;
        self.node(child)?;
        if child == parent || child == NodeId::ROOT || self.is_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        if let Some(r) = reference {
            if self.node(r)?.parent != parent {
                return Err(DomError::NotAChild { parent, child: r });
            }
        }

        // Inserting a node before itself leaves it where it is
        let reference = match reference {
            Some(r) if r == child => self.nodes[child.index()].next_sibling.some(),
            other => other,
        };

        self.unlink(child);
        self.link_before(parent, child, reference);
        Ok(())
    }

    /// Remove `child` from `parent`, leaving it detached but allocated
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.node(parent)?;
        if self.node(child)?.parent != parent {
            return Err(DomError::NotAChild { parent, child });
        }
        self.unlink(child);
        Ok(())
    }

    /// Unlink a node from whatever parent holds it
    pub fn detach(&mut self, id: NodeId) -> DomResult<()> {
        self.node(id)?;
        self.unlink(id);
        Ok(())
    }

    /// Free a node and its whole subtree. Returns the number of released nodes.
    pub fn release(&mut self, id: NodeId) -> DomResult<usize> {
        if id == NodeId::ROOT {
            return Err(DomError::HierarchyRequest { parent: NodeId::NONE, child: id });
        }
        self.node(id)?;
        self.unlink(id);

        let mut stack = vec![id];
        let mut released = 0;
        while let Some(current) = stack.pop() {
            stack.extend(self.children(current));
            self.nodes[current.index()] = Node {
                data: crate::NodeData::Vacant,
                ..Node::document()
            };
            self.free.push(current);
            released += 1;
        }
        tracing::trace!("Released {} nodes starting at {:?}", released, id);
        Ok(released)
    }

    /// Set an attribute on an element
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> DomResult<()> {
        self.node_mut(id)?
            .as_element_mut()
            .ok_or(DomError::NotAnElement(id))?
            .set_attr(name, value);
        Ok(())
    }

    /// Read an attribute from an element
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.get(id)?.as_element()?.get_attr(name)
    }

    /// Number of live nodes in the tree
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Check if tree holds only the document node
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    fn unlink(&mut self, child: NodeId) {
        let (parent, prev, next) = {
            let n = &self.nodes[child.index()];
            (n.parent, n.prev_sibling, n.next_sibling)
        };
        if !parent.is_valid() {
            return;
        }

        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = next;
        } else {
            self.nodes[parent.index()].first_child = next;
        }
        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = prev;
        } else {
            self.nodes[parent.index()].last_child = prev;
        }

        let n = &mut self.nodes[child.index()];
        n.parent = NodeId::NONE;
        n.prev_sibling = NodeId::NONE;
        n.next_sibling = NodeId::NONE;
    }

    fn link_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        match reference {
            None => {
                let last = self.nodes[parent.index()].last_child;
                {
                    let n = &mut self.nodes[child.index()];
                    n.prev_sibling = last;
                    n.next_sibling = NodeId::NONE;
                }
                if last.is_valid() {
                    self.nodes[last.index()].next_sibling = child;
                } else {
                    self.nodes[parent.index()].first_child = child;
                }
                self.nodes[parent.index()].last_child = child;
            }
            Some(r) => {
                let prev = self.nodes[r.index()].prev_sibling;
                {
                    let n = &mut self.nodes[child.index()];
                    n.prev_sibling = prev;
                    n.next_sibling = r;
                }
                self.nodes[r.index()].prev_sibling = child;
                if prev.is_valid() {
                    self.nodes[prev.index()].next_sibling = child;
                } else {
                    self.nodes[parent.index()].first_child = child;
                }
            }
        }
        self.nodes[child.index()].parent = parent;
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the direct children of a node
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next.some()?;
        self.next = self.tree.nodes[current.index()].next_sibling;
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with(n: usize) -> (DomTree, NodeId, Vec<NodeId>) {
        let mut tree = DomTree::new();
        let parent = tree.create_element("div");
        tree.append_child(tree.root(), parent).unwrap();
        let kids: Vec<_> = (0..n)
            .map(|_| {
                let k = tree.create_element("span");
                tree.append_child(parent, k).unwrap();
                k
            })
            .collect();
        (tree, parent, kids)
    }

    #[test]
    fn test_append_preserves_order() {
        let (tree, parent, kids) = tree_with(3);
        let order: Vec<_> = tree.children(parent).collect();
        assert_eq!(order, kids);
        assert_eq!(tree.child_index(parent, kids[2]), Some(2));
    }

    #[test]
    fn test_insert_before_moves_existing_child() {
        let (mut tree, parent, kids) = tree_with(3);
        tree.insert_before(parent, kids[2], Some(kids[0])).unwrap();

        let order: Vec<_> = tree.children(parent).collect();
        assert_eq!(order, vec![kids[2], kids[0], kids[1]]);
        assert_eq!(tree.child_count(parent), 3);
    }

    #[test]
    fn test_insert_before_self_is_noop() {
        let (mut tree, parent, kids) = tree_with(3);
        tree.insert_before(parent, kids[1], Some(kids[1])).unwrap();
        let order: Vec<_> = tree.children(parent).collect();
        assert_eq!(order, kids);
    }

    #[test]
    fn test_hierarchy_request() {
        let (mut tree, parent, kids) = tree_with(1);
        let err = tree.append_child(kids[0], parent).unwrap_err();
        assert!(matches!(err, DomError::HierarchyRequest { .. }));
        assert!(tree.append_child(parent, parent).is_err());
    }

    #[test]
    fn test_remove_child_requires_parent() {
        let (mut tree, parent, kids) = tree_with(2);
        let stranger = tree.create_element("p");
        assert!(matches!(
            tree.remove_child(parent, stranger),
            Err(DomError::NotAChild { .. })
        ));

        tree.remove_child(parent, kids[0]).unwrap();
        assert_eq!(tree.parent(kids[0]), None);
        assert_eq!(tree.children(parent).collect::<Vec<_>>(), vec![kids[1]]);
    }

    #[test]
    fn test_release_frees_subtree() {
        let (mut tree, parent, _) = tree_with(2);
        let before = tree.len();
        assert_eq!(tree.release(parent).unwrap(), 3);
        assert_eq!(tree.len(), before - 3);
        assert!(tree.get(parent).is_none());

        // Released slots are reused
        let again = tree.create_element("div");
        assert!(tree.get(again).is_some());
        assert_eq!(tree.len(), before - 2);
    }
}
