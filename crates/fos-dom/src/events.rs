//! DOM Events
//!
//! Input event categories, sink masks and the per-element dispatch target.
//! Each element carries at most one listener; routing walks from the target
//! towards the root collecting listeners whose sink mask covers the event.

use std::ops::{BitOr, BitOrAssign};

use crate::{DomError, DomResult, DomTree, NodeId};

/// Event type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    DblClick,
    MouseDown,
    MouseUp,
    MouseMove,
    MouseOver,
    MouseOut,
    MouseWheel,
    KeyDown,
    KeyUp,
    KeyPress,
    Change,
    Focus,
    Blur,
    Scroll,
    Load,
    Error,
    ContextMenu,
}

impl EventKind {
    /// Sink bit for this event type
    pub const fn bit(self) -> EventBits {
        EventBits(1 << self as u32)
    }

    /// Check if this event type can bubble
    pub fn bubbles(&self) -> bool {
        !matches!(
            self,
            EventKind::Focus | EventKind::Blur | EventKind::Load | EventKind::Error | EventKind::Scroll
        )
    }
}

/// Bitset of event categories an element wants delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EventBits(u32);

impl EventBits {
    pub const NONE: EventBits = EventBits(0);
    pub const CLICK: EventBits = EventKind::Click.bit();
    pub const DBLCLICK: EventBits = EventKind::DblClick.bit();
    pub const CHANGE: EventBits = EventKind::Change.bit();
    pub const SCROLL: EventBits = EventKind::Scroll.bit();
    pub const LOAD: EventBits = EventKind::Load.bit();
    pub const ERROR: EventBits = EventKind::Error.bit();
    pub const CONTEXT_MENU: EventBits = EventKind::ContextMenu.bit();
    pub const FOCUS_EVENTS: EventBits = EventBits(EventKind::Focus.bit().0 | EventKind::Blur.bit().0);
    pub const KEY_EVENTS: EventBits = EventBits(
        EventKind::KeyDown.bit().0 | EventKind::KeyUp.bit().0 | EventKind::KeyPress.bit().0,
    );
    pub const MOUSE_EVENTS: EventBits = EventBits(
        EventKind::MouseDown.bit().0
            | EventKind::MouseUp.bit().0
            | EventKind::MouseMove.bit().0
            | EventKind::MouseOver.bit().0
            | EventKind::MouseOut.bit().0,
    );

    /// Raw mask value
    pub const fn bits(self) -> u32 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Check if an event kind is covered
    pub fn includes(self, kind: EventKind) -> bool {
        (self.0 & kind.bit().0) != 0
    }

    /// Union of two masks
    pub fn or(self, other: EventBits) -> EventBits {
        EventBits(self.0 | other.0)
    }

    /// Mask with `other`'s bits cleared
    pub fn without(self, other: EventBits) -> EventBits {
        EventBits(self.0 & !other.0)
    }
}

impl From<EventKind> for EventBits {
    fn from(kind: EventKind) -> Self {
        kind.bit()
    }
}

impl BitOr for EventBits {
    type Output = EventBits;

    fn bitor(self, rhs: EventBits) -> EventBits {
        self.or(rhs)
    }
}

impl BitOrAssign for EventBits {
    fn bitor_assign(&mut self, rhs: EventBits) {
        self.0 |= rhs.0;
    }
}

/// Opaque dispatch target attached to an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// An input event travelling through the tree
#[derive(Debug, Clone)]
pub struct BrowserEvent {
    pub kind: EventKind,
    /// Element the event originated on
    pub target: NodeId,
    /// Element whose listener is currently handling the event
    pub current_target: Option<NodeId>,
    propagation_stopped: bool,
}

impl BrowserEvent {
    pub fn new(kind: EventKind, target: NodeId) -> Self {
        Self {
            kind,
            target,
            current_target: None,
            propagation_stopped: false,
        }
    }

    /// Stop propagation to listeners further up the tree
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

impl DomTree {
    /// Bind (or clear) the dispatch target of an element
    pub fn set_event_listener(&mut self, id: NodeId, listener: Option<ListenerId>) -> DomResult<()> {
        self.node_mut(id)?
            .as_element_mut()
            .ok_or(DomError::NotAnElement(id))?
            .listener = listener;
        Ok(())
    }

    /// Current dispatch target of an element
    pub fn event_listener(&self, id: NodeId) -> Option<ListenerId> {
        self.get(id)?.as_element()?.listener
    }

    /// Replace the sink mask of an element
    pub fn sink_events(&mut self, id: NodeId, bits: EventBits) -> DomResult<()> {
        self.node_mut(id)?
            .as_element_mut()
            .ok_or(DomError::NotAnElement(id))?
            .sunk = bits;
        Ok(())
    }

    /// Sink mask of an element (empty for non-elements)
    pub fn sunk_events(&self, id: NodeId) -> EventBits {
        self.get(id)
            .and_then(|n| n.as_element())
            .map_or(EventBits::NONE, |e| e.sunk)
    }

    /// Listeners that should see an event of `kind` fired at `target`,
    /// innermost first. Non-bubbling kinds only consider the target itself.
    pub fn dispatch_path(&self, target: NodeId, kind: EventKind) -> Vec<(NodeId, ListenerId)> {
        let mut path = Vec::new();
        let mut current = self.get(target).map(|_| target);
        while let Some(id) = current {
            if let Some(elem) = self.get(id).and_then(|n| n.as_element()) {
                if let Some(listener) = elem.listener {
                    if elem.sunk.includes(kind) {
                        path.push((id, listener));
                    }
                }
            }
            if !kind.bubbles() {
                break;
            }
            current = self.parent(id);
        }
        path
    }
}
