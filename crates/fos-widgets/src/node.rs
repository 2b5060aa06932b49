//! Widget node state kept in the tree arena.

use fos_dom::{EventBits, NodeId};

use crate::handlers::HandlerTable;
use crate::{Widget, WidgetId};

/// Attachment state of a widget.
///
/// `Never` is only left once; afterwards the state alternates between
/// `Attached` and `Detached`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachState {
    Never,
    Attached,
    Detached,
}

/// Structural kind of a widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetKind {
    /// No children
    Leaf,
    /// Ordered, dynamically sized child list
    Panel,
    /// Fixed number of optional slots
    Slots { arity: usize },
    /// Wraps exactly one inner widget
    Composite,
}

pub(crate) enum Structure {
    Leaf,
    Panel(Vec<WidgetId>),
    Slots(Vec<Option<WidgetId>>),
    /// `None` until `init_widget`
    Composite(Option<WidgetId>),
}

impl Structure {
    pub(crate) fn kind(&self) -> WidgetKind {
        match self {
            Structure::Leaf => WidgetKind::Leaf,
            Structure::Panel(_) => WidgetKind::Panel,
            Structure::Slots(slots) => WidgetKind::Slots { arity: slots.len() },
            Structure::Composite(_) => WidgetKind::Composite,
        }
    }

    /// Children currently owned, in order, skipping empty slots
    pub(crate) fn child_ids(&self) -> Vec<WidgetId> {
        match self {
            Structure::Leaf | Structure::Composite(None) => Vec::new(),
            Structure::Panel(children) => children.clone(),
            Structure::Slots(slots) => slots.iter().flatten().copied().collect(),
            Structure::Composite(Some(inner)) => vec![*inner],
        }
    }
}

pub(crate) struct WidgetNode {
    /// Set once at creation (or at `init_widget` for composites)
    pub(crate) element: Option<NodeId>,
    pub(crate) parent: Option<WidgetId>,
    pub(crate) state: AttachState,
    /// Event bits requested before the first attach
    pub(crate) pending_sink: EventBits,
    pub(crate) structure: Structure,
    pub(crate) behavior: Box<dyn Widget>,
    pub(crate) handlers: HandlerTable,
}

impl WidgetNode {
    pub(crate) fn new(element: Option<NodeId>, structure: Structure, behavior: Box<dyn Widget>) -> Self {
        Self {
            element,
            parent: None,
            state: AttachState::Never,
            pending_sink: EventBits::NONE,
            structure,
            behavior,
            handlers: HandlerTable::default(),
        }
    }

    pub(crate) fn is_or_was_attached(&self) -> bool {
        self.state != AttachState::Never
    }
}
