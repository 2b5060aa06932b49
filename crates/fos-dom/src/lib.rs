//! fOS DOM - Document Object Model
//!
//! Arena-backed element tree used as the rendering surface for widgets.
//! Nodes are addressed by [`NodeId`] and linked through parent/sibling ids,
//! so moving a subtree never copies it.

mod node;
mod tree;
mod document;
mod events;
mod operations;

pub use node::{Node, NodeData, ElementData};
pub use tree::{DomTree, Children};
pub use document::Document;
pub use events::{BrowserEvent, EventBits, EventKind, ListenerId};
pub use operations::{DomError, DomResult};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root node ID
    pub const ROOT: NodeId = NodeId(0);

    /// Sentinel for "no node" in sibling/parent links
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check if this id refers to a node slot
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    /// Convert a sentinel link into an `Option`
    #[inline]
    pub(crate) fn some(self) -> Option<NodeId> {
        self.is_valid().then_some(self)
    }
}
