//! Input event routing from surface elements to widgets.

use fos_dom::{BrowserEvent, EventKind, NodeId};

use crate::node::Structure;
use crate::{HookContext, WidgetId, WidgetResult, WidgetTree};

impl WidgetTree {
    /// Widget currently bound as the dispatch target of `element`
    pub fn dispatch_target(&self, element: NodeId) -> Option<WidgetId> {
        let listener = self.document.tree().event_listener(element)?;
        let id = WidgetId::from_listener(listener);
        self.contains(id).then_some(id)
    }

    /// Fire an input event at a surface element.
    ///
    /// The event bubbles through every listening element that sinks `kind`
    /// until a handler stops propagation. Returns the number of widget
    /// deliveries, counting the inner widgets reached through composites.
    pub fn dispatch_event(&mut self, target: NodeId, kind: EventKind) -> usize {
        let mut event = BrowserEvent::new(kind, target);
        let path = self.document.tree().dispatch_path(target, kind);

        let mut delivered = 0;
        for (element, listener) in path {
            let id = WidgetId::from_listener(listener);
            if !self.contains(id) {
                tracing::warn!("Stale dispatch target {:?} on {:?}", listener, element);
                continue;
            }
            event.current_target = Some(element);
            delivered += self.deliver(id, &mut event);
            if event.is_propagation_stopped() {
                break;
            }
        }
        delivered
    }

    /// Fire an input event at a widget's element
    pub fn fire_event_at(&mut self, id: WidgetId, kind: EventKind) -> WidgetResult<usize> {
        let element = self.element(id)?;
        Ok(self.dispatch_event(element, kind))
    }

    /// Run the widget's own event hook and handlers. Composites then hand
    /// the same event to their inner widget.
    fn deliver(&mut self, id: WidgetId, event: &mut BrowserEvent) -> usize {
        let Self { widgets, document, scheduler, .. } = self;
        let Some(node) = widgets.get_mut(id.0) else {
            return 0;
        };
        let mut cx = HookContext {
            widget: id,
            element: node.element,
            document,
            scheduler,
        };
        node.behavior.on_browser_event(event, &mut cx);
        node.handlers.fire_dom(event);
        tracing::trace!("Delivered {:?} to {:?}", event.kind, id);

        let inner = match node.structure {
            Structure::Composite(inner) => inner,
            _ => None,
        };
        match inner {
            Some(inner) => 1 + self.deliver(inner, event),
            None => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, Plain, Widget};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Stopper;

    impl Widget for Stopper {
        fn on_browser_event(&mut self, event: &mut BrowserEvent, _cx: &mut HookContext<'_>) {
            event.stop_propagation();
        }
    }

    #[test]
    fn test_bubbles_to_sinking_ancestors() {
        let mut tree = WidgetTree::new(Config::default());
        let panel = tree.create_panel("div", Plain);
        let button = tree.create_leaf("button", Plain);
        tree.add(panel, button).unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        for (id, name) in [(button, "button"), (panel, "panel")] {
            let s = seen.clone();
            tree.add_dom_handler(id, EventKind::Click, move |_| s.borrow_mut().push(name))
                .unwrap();
        }
        tree.add_to_root(panel).unwrap();

        assert_eq!(tree.fire_event_at(button, EventKind::Click).unwrap(), 2);
        assert_eq!(*seen.borrow(), vec!["button", "panel"]);

        // Not sunk anywhere
        assert_eq!(tree.fire_event_at(button, EventKind::KeyDown).unwrap(), 0);
    }

    #[test]
    fn test_stop_propagation() {
        let mut tree = WidgetTree::new(Config::default());
        let panel = tree.create_panel("div", Plain);
        let button = tree.create_leaf("button", Stopper);
        tree.add(panel, button).unwrap();
        tree.sink_events(button, EventKind::Click.into()).unwrap();

        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        tree.add_dom_handler(panel, EventKind::Click, move |_| *h.borrow_mut() += 1)
            .unwrap();
        tree.add_to_root(panel).unwrap();

        assert_eq!(tree.fire_event_at(button, EventKind::Click).unwrap(), 1);
        assert_eq!(*hits.borrow(), 0);
    }

    #[test]
    fn test_detached_widget_receives_nothing() {
        let mut tree = WidgetTree::new(Config::default());
        let button = tree.create_leaf("button", Plain);
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        tree.add_dom_handler(button, EventKind::Click, move |_| *h.borrow_mut() += 1)
            .unwrap();

        assert_eq!(tree.fire_event_at(button, EventKind::Click).unwrap(), 0);
        tree.add_to_root(button).unwrap();
        assert_eq!(tree.fire_event_at(button, EventKind::Click).unwrap(), 1);
        tree.remove_from_parent(button).unwrap();
        assert_eq!(tree.fire_event_at(button, EventKind::Click).unwrap(), 0);
        assert_eq!(*hits.borrow(), 1);
        assert_eq!(tree.dispatch_target(tree.element(button).unwrap()), None);
    }
}
