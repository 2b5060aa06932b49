//! Per-widget handler lists for attach notifications and DOM events.

use fos_dom::{BrowserEvent, EventKind};

use crate::WidgetId;

/// Fired after a widget is attached or before it is detached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachEvent {
    pub widget: WidgetId,
    pub attached: bool,
}

/// Token returned by handler registration, used to remove the handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerRegistration(pub(crate) u64);

pub type AttachHandler = Box<dyn FnMut(&AttachEvent)>;
pub type DomHandler = Box<dyn FnMut(&mut BrowserEvent)>;

#[derive(Default)]
pub(crate) struct HandlerTable {
    attach: Vec<(HandlerRegistration, AttachHandler)>,
    dom: Vec<(HandlerRegistration, EventKind, DomHandler)>,
}

impl HandlerTable {
    pub(crate) fn add_attach(&mut self, reg: HandlerRegistration, handler: AttachHandler) {
        self.attach.push((reg, handler));
    }

    pub(crate) fn add_dom(&mut self, reg: HandlerRegistration, kind: EventKind, handler: DomHandler) {
        self.dom.push((reg, kind, handler));
    }

    pub(crate) fn remove(&mut self, reg: HandlerRegistration) -> bool {
        let before = self.attach.len() + self.dom.len();
        self.attach.retain(|(r, _)| *r != reg);
        self.dom.retain(|(r, _, _)| *r != reg);
        before != self.attach.len() + self.dom.len()
    }

    pub(crate) fn fire_attach(&mut self, event: &AttachEvent) {
        for (_, handler) in self.attach.iter_mut() {
            handler(event);
        }
    }

    /// Run every handler registered for the event's kind
    pub(crate) fn fire_dom(&mut self, event: &mut BrowserEvent) {
        for (_, kind, handler) in self.dom.iter_mut() {
            if *kind == event.kind {
                handler(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fos_dom::NodeId;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_dom_handlers_filter_by_kind() {
        let clicks = Rc::new(Cell::new(0));
        let mut table = HandlerTable::default();
        let c = clicks.clone();
        table.add_dom(HandlerRegistration(1), EventKind::Click, Box::new(move |_| c.set(c.get() + 1)));

        table.fire_dom(&mut BrowserEvent::new(EventKind::Click, NodeId::ROOT));
        table.fire_dom(&mut BrowserEvent::new(EventKind::KeyDown, NodeId::ROOT));
        assert_eq!(clicks.get(), 1);

        assert!(table.remove(HandlerRegistration(1)));
        assert!(!table.remove(HandlerRegistration(1)));
        table.fire_dom(&mut BrowserEvent::new(EventKind::Click, NodeId::ROOT));
        assert_eq!(clicks.get(), 1);
    }
}
