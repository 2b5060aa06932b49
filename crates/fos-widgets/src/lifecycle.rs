//! Attach/detach transitions and bulk child visits.

use fos_dom::EventBits;

use crate::handlers::AttachEvent;
use crate::node::{AttachState, Structure};
use crate::{FailureSet, HookContext, WidgetError, WidgetId, WidgetResult, WidgetTree};

/// Combine two outcomes of one operation. A single error is returned
/// unchanged; two become an aggregated failure.
pub(crate) fn merge(first: WidgetResult<()>, second: WidgetResult<()>) -> WidgetResult<()> {
    match (first, second) {
        (Ok(()), result) | (result, Ok(())) => result,
        (Err(a), Err(b)) => {
            let mut set = FailureSet::new();
            set.push(a);
            set.push(b);
            set.into_result()
        }
    }
}

impl WidgetTree {
    /// Attach transition. Invoked by the tree when the widget becomes part
    /// of the live document; calling it on an attached widget is an error.
    ///
    /// Children are attached before `on_load` runs. The own hook and the
    /// attach notification run even if some children failed; every failure
    /// is reported together.
    pub fn on_attach(&mut self, id: WidgetId) -> WidgetResult<()> {
        let node = self.node(id)?;
        if let Structure::Composite(inner) = node.structure {
            return self.attach_composite(id, inner);
        }
        if node.state == AttachState::Attached {
            return Err(WidgetError::AlreadyAttached(id));
        }
        let element = node.element.ok_or(WidgetError::NotInitialized(id))?;
        let pending = node.pending_sink;

        let surface = self.document.tree_mut();
        if !pending.is_empty() {
            let current = surface.sunk_events(element);
            surface.sink_events(element, current | pending)?;
        }
        surface.set_event_listener(element, Some(id.listener()))?;

        let node = self.node_mut(id)?;
        node.pending_sink = EventBits::NONE;
        node.state = AttachState::Attached;
        tracing::debug!("Attached {:?}", id);

        let children = self.attach_children(id);
        let load = self.run_load(id);
        self.fire_attach(id, true);
        merge(children, load)
    }

    /// Detach transition, the mirror of [`on_attach`](Self::on_attach).
    ///
    /// `on_unload` and the detach notification run first, while the widget
    /// still reads as attached. Children are detached, the element's
    /// dispatch target is cleared and the state becomes `Detached`
    /// whatever the hooks returned.
    pub fn on_detach(&mut self, id: WidgetId) -> WidgetResult<()> {
        let node = self.node(id)?;
        if let Structure::Composite(inner) = node.structure {
            return self.detach_composite(id, inner);
        }
        if node.state != AttachState::Attached {
            return Err(WidgetError::NotAttached(id));
        }
        let element = node.element.ok_or(WidgetError::NotInitialized(id))?;

        let unload = self.run_unload(id);
        self.fire_attach(id, false);

        let children = self.detach_children(id);
        let surface = self
            .document
            .tree_mut()
            .set_event_listener(element, None)
            .map_err(WidgetError::from);
        self.node_mut(id)?.state = AttachState::Detached;
        tracing::debug!("Detached {:?}", id);

        merge(merge(unload, children), surface)
    }

    /// Attach every child, visiting all of them even when some fail.
    pub fn attach_children(&mut self, id: WidgetId) -> WidgetResult<()> {
        let children = self.node(id)?.structure.child_ids();
        let result = FailureSet::visit_all(children, |child| self.on_attach(child));
        if let Err(WidgetError::AttachDetach(failure)) = &result {
            tracing::warn!("Attaching children of {:?}: {}", id, failure);
        }
        result
    }

    /// Detach every child, visiting all of them even when some fail.
    pub fn detach_children(&mut self, id: WidgetId) -> WidgetResult<()> {
        let children = self.node(id)?.structure.child_ids();
        let result = FailureSet::visit_all(children, |child| self.on_detach(child));
        if let Err(WidgetError::AttachDetach(failure)) = &result {
            tracing::warn!("Detaching children of {:?}: {}", id, failure);
        }
        result
    }

    pub(crate) fn run_load(&mut self, id: WidgetId) -> WidgetResult<()> {
        let Self { widgets, document, scheduler, .. } = self;
        let node = widgets.get_mut(id.0).ok_or(WidgetError::UnknownWidget(id))?;
        let mut cx = HookContext {
            widget: id,
            element: node.element,
            document,
            scheduler,
        };
        node.behavior.on_load(&mut cx).map_err(WidgetError::from)
    }

    pub(crate) fn run_unload(&mut self, id: WidgetId) -> WidgetResult<()> {
        let Self { widgets, document, scheduler, .. } = self;
        let node = widgets.get_mut(id.0).ok_or(WidgetError::UnknownWidget(id))?;
        let mut cx = HookContext {
            widget: id,
            element: node.element,
            document,
            scheduler,
        };
        node.behavior.on_unload(&mut cx).map_err(WidgetError::from)
    }

    pub(crate) fn fire_attach(&mut self, id: WidgetId, attached: bool) {
        if let Some(node) = self.widgets.get_mut(id.0) {
            node.handlers.fire_attach(&AttachEvent { widget: id, attached });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, HookError, Plain, Widget};
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Recorder {
        name: &'static str,
        log: Log,
        fail_load: Option<HookError>,
        fail_unload: Option<HookError>,
    }

    impl Recorder {
        fn new(name: &'static str, log: &Log) -> Self {
            Self {
                name,
                log: log.clone(),
                fail_load: None,
                fail_unload: None,
            }
        }
    }

    impl Widget for Recorder {
        fn on_load(&mut self, _cx: &mut HookContext<'_>) -> Result<(), HookError> {
            self.log.borrow_mut().push(format!("load {}", self.name));
            self.fail_load.clone().map_or(Ok(()), Err)
        }

        fn on_unload(&mut self, _cx: &mut HookContext<'_>) -> Result<(), HookError> {
            self.log.borrow_mut().push(format!("unload {}", self.name));
            self.fail_unload.clone().map_or(Ok(()), Err)
        }
    }

    #[test]
    fn test_merge() {
        let a: WidgetError = HookError::msg("a").into();
        let b: WidgetError = HookError::msg("b").into();
        assert!(merge(Ok(()), Ok(())).is_ok());
        assert!(merge(Err(a.clone()), Ok(())).unwrap_err().same_as(&a));
        assert!(merge(Ok(()), Err(b.clone())).unwrap_err().same_as(&b));
        match merge(Err(a), Err(b)) {
            Err(WidgetError::AttachDetach(agg)) => assert_eq!(agg.len(), 2),
            other => panic!("expected aggregate, got {other:?}"),
        }
    }

    #[test]
    fn test_children_load_before_parent_and_unload_after() {
        let log = Log::default();
        let mut tree = WidgetTree::new(Config::default());
        let panel = tree.create_panel("div", Recorder::new("panel", &log));
        let child = tree.create_leaf("span", Recorder::new("child", &log));
        tree.add(panel, child).unwrap();

        tree.add_to_root(panel).unwrap();
        tree.remove_from_parent(panel).unwrap();

        assert_eq!(
            *log.borrow(),
            vec!["load child", "load panel", "unload panel", "unload child"]
        );
    }

    #[test]
    fn test_attach_twice_is_contract_error() {
        let mut tree = WidgetTree::new(Config::default());
        let leaf = tree.create_leaf("span", Plain);
        tree.add_to_root(leaf).unwrap();
        assert!(matches!(tree.on_attach(leaf), Err(WidgetError::AlreadyAttached(_))));

        let other = tree.create_leaf("span", Plain);
        assert!(matches!(tree.on_detach(other), Err(WidgetError::NotAttached(_))));
    }

    #[test]
    fn test_detach_completes_when_unload_fails() {
        let log = Log::default();
        let mut tree = WidgetTree::new(Config::default());
        let mut recorder = Recorder::new("leaf", &log);
        let failure = HookError::msg("unload failed");
        recorder.fail_unload = Some(failure.clone());
        let leaf = tree.create_leaf("span", recorder);
        tree.add_to_root(leaf).unwrap();
        let el = tree.element(leaf).unwrap();

        let err = tree.remove_from_parent(leaf).unwrap_err();
        assert!(err.same_as(&failure.into()));
        assert!(!tree.is_attached(leaf));
        assert_eq!(tree.attach_state(leaf), Some(AttachState::Detached));
        assert_eq!(tree.document().tree().event_listener(el), None);
        assert_eq!(tree.parent(leaf), None);
    }

    #[test]
    fn test_attach_notifications() {
        let mut tree = WidgetTree::new(Config::default());
        let leaf = tree.create_leaf("span", Plain);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        tree.add_attach_handler(leaf, move |e| s.borrow_mut().push(e.attached))
            .unwrap();

        tree.add_to_root(leaf).unwrap();
        tree.remove_from_parent(leaf).unwrap();
        tree.add_to_root(leaf).unwrap();
        assert_eq!(*seen.borrow(), vec![true, false, true]);
    }
}
