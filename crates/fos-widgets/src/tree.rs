//! Widget tree: arena of widgets over a surface document.
//!
//! The tree owns every widget and the document their elements live in.
//! Ownership always runs container -> children; the parent link stored on
//! each node is only used for lookups.

use fos_dom::{BrowserEvent, Document, EventBits, EventKind, NodeId};

use crate::arena::GenArena;
use crate::handlers::{AttachEvent, HandlerRegistration};
use crate::node::{AttachState, Structure, WidgetKind, WidgetNode};
use crate::{Config, FailurePolicy, Plain, Scheduler, Widget, WidgetError, WidgetId, WidgetResult};

/// The widget tree
pub struct WidgetTree {
    pub(crate) document: Document,
    pub(crate) widgets: GenArena<WidgetNode>,
    pub(crate) scheduler: Scheduler,
    config: Config,
    root: WidgetId,
    next_handler: u64,
}

impl WidgetTree {
    /// Create a tree over a fresh document
    pub fn new(config: Config) -> Self {
        Self::with_document(Document::new(), config)
    }

    /// Create a tree over an existing document. The root panel wraps the
    /// body, or a new `config.root_tag` element when there is none.
    pub fn with_document(mut document: Document, config: Config) -> Self {
        let root_element = match document.body() {
            Some(body) => body,
            None => {
                let element = document.tree_mut().create_element(&config.root_tag);
                let doc_root = document.tree().root();
                // The document node accepts any fresh element
                let _ = document.tree_mut().append_child(doc_root, element);
                element
            }
        };

        let mut widgets = GenArena::new();
        let root = WidgetId(widgets.insert(WidgetNode::new(
            Some(root_element),
            Structure::Panel(Vec::new()),
            Box::new(Plain),
        )));

        let mut tree = Self {
            document,
            widgets,
            scheduler: Scheduler::new(),
            config,
            root,
            next_handler: 0,
        };

        // The root is live from the start
        if let Err(e) = tree.on_attach(root) {
            tracing::error!("Failed to attach root panel: {}", e);
        }
        tracing::debug!("Widget tree created, root {:?} on {:?}", root, root_element);
        tree
    }

    /// The root panel, attached to the live document
    pub fn root(&self) -> WidgetId {
        self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    /// Number of live widgets, including the root
    pub fn widget_count(&self) -> usize {
        self.widgets.len()
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.widgets.contains(id.0)
    }

    pub(crate) fn node(&self, id: WidgetId) -> WidgetResult<&WidgetNode> {
        self.widgets.get(id.0).ok_or(WidgetError::UnknownWidget(id))
    }

    pub(crate) fn node_mut(&mut self, id: WidgetId) -> WidgetResult<&mut WidgetNode> {
        self.widgets.get_mut(id.0).ok_or(WidgetError::UnknownWidget(id))
    }

    fn insert_node(&mut self, element: Option<NodeId>, structure: Structure, behavior: Box<dyn Widget>) -> WidgetId {
        let id = WidgetId(self.widgets.insert(WidgetNode::new(element, structure, behavior)));
        tracing::trace!("Created {:?} ({:?})", id, self.widgets.get(id.0).map(|n| n.structure.kind()));
        id
    }

    // ------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------

    /// Create a widget with no children
    pub fn create_leaf<W: Widget>(&mut self, tag: &str, widget: W) -> WidgetId {
        let element = self.document.tree_mut().create_element(tag);
        self.insert_node(Some(element), Structure::Leaf, Box::new(widget))
    }

    /// Create a container with an ordered child list
    pub fn create_panel<W: Widget>(&mut self, tag: &str, widget: W) -> WidgetId {
        let element = self.document.tree_mut().create_element(tag);
        self.insert_node(Some(element), Structure::Panel(Vec::new()), Box::new(widget))
    }

    /// Create a container with `arity` optional slots
    pub fn create_slot_panel<W: Widget>(&mut self, tag: &str, arity: usize, widget: W) -> WidgetId {
        let element = self.document.tree_mut().create_element(tag);
        self.insert_node(Some(element), Structure::Slots(vec![None; arity]), Box::new(widget))
    }

    /// Create a composite. It has no element until `init_widget` binds
    /// its inner widget.
    pub fn create_composite<W: Widget>(&mut self, widget: W) -> WidgetId {
        self.insert_node(None, Structure::Composite(None), Box::new(widget))
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// The widget's element
    pub fn element(&self, id: WidgetId) -> WidgetResult<NodeId> {
        self.node(id)?.element.ok_or(WidgetError::NotInitialized(id))
    }

    pub fn parent(&self, id: WidgetId) -> Option<WidgetId> {
        self.widgets.get(id.0).and_then(|n| n.parent)
    }

    pub fn kind(&self, id: WidgetId) -> Option<WidgetKind> {
        self.widgets.get(id.0).map(|n| n.structure.kind())
    }

    /// Raw attach state. For composites this is the composite's own
    /// bookkeeping; use [`is_attached`](Self::is_attached) for liveness.
    pub fn attach_state(&self, id: WidgetId) -> Option<AttachState> {
        self.widgets.get(id.0).map(|n| n.state)
    }

    /// Whether the widget is part of the live document. A composite reports
    /// its inner widget's state; an unbound composite is never attached.
    pub fn is_attached(&self, id: WidgetId) -> bool {
        match self.widgets.get(id.0) {
            Some(WidgetNode { structure: Structure::Composite(inner), .. }) => {
                inner.is_some_and(|inner| self.is_attached(inner))
            }
            Some(node) => node.state == AttachState::Attached,
            None => false,
        }
    }

    /// Whether the widget has ever been attached
    pub fn is_or_was_attached(&self, id: WidgetId) -> bool {
        self.widgets.get(id.0).is_some_and(|n| n.is_or_was_attached())
    }

    /// Whether the widget's element is currently reachable from the
    /// document root, computed by walking the surface.
    pub fn is_element_live(&self, id: WidgetId) -> bool {
        self.widgets
            .get(id.0)
            .and_then(|n| n.element)
            .is_some_and(|el| self.document.is_in_document(el))
    }

    /// True if `ancestor` is a strict ancestor of `id` through parent links
    pub fn is_ancestor(&self, ancestor: WidgetId, id: WidgetId) -> bool {
        let mut current = self.parent(id);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent(p);
        }
        false
    }

    /// Typed access to a widget's behaviour object
    pub fn widget<W: Widget>(&self, id: WidgetId) -> Option<&W> {
        let node = self.widgets.get(id.0)?;
        (*node.behavior).as_any().downcast_ref::<W>()
    }

    pub fn widget_mut<W: Widget>(&mut self, id: WidgetId) -> Option<&mut W> {
        let node = self.widgets.get_mut(id.0)?;
        (*node.behavior).as_any_mut().downcast_mut::<W>()
    }

    // ------------------------------------------------------------------
    // Event sinking and handlers
    // ------------------------------------------------------------------

    /// Ask for `bits` to be delivered to this widget. Applied to the
    /// element immediately if the widget is or was attached, otherwise
    /// deferred until its first attach.
    pub fn sink_events(&mut self, id: WidgetId, bits: EventBits) -> WidgetResult<()> {
        let node = self.node_mut(id)?;
        match node.element {
            Some(element) if node.is_or_was_attached() => {
                let tree = self.document.tree_mut();
                let current = tree.sunk_events(element);
                tree.sink_events(element, current | bits)?;
            }
            _ => node.pending_sink |= bits,
        }
        Ok(())
    }

    /// Stop delivering `bits` to this widget
    pub fn unsink_events(&mut self, id: WidgetId, bits: EventBits) -> WidgetResult<()> {
        let node = self.node_mut(id)?;
        node.pending_sink = node.pending_sink.without(bits);
        match node.element {
            Some(element) if node.is_or_was_attached() => {
                let tree = self.document.tree_mut();
                let current = tree.sunk_events(element);
                tree.sink_events(element, current.without(bits))?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Event bits requested but not yet applied to the element
    pub fn pending_sink(&self, id: WidgetId) -> Option<EventBits> {
        self.widgets.get(id.0).map(|n| n.pending_sink)
    }

    fn next_registration(&mut self) -> HandlerRegistration {
        self.next_handler += 1;
        HandlerRegistration(self.next_handler)
    }

    /// Observe attach and detach of a widget
    pub fn add_attach_handler<F>(&mut self, id: WidgetId, handler: F) -> WidgetResult<HandlerRegistration>
    where
        F: FnMut(&AttachEvent) + 'static,
    {
        self.node(id)?;
        let reg = self.next_registration();
        self.node_mut(id)?.handlers.add_attach(reg, Box::new(handler));
        Ok(reg)
    }

    /// Handle input events of `kind` delivered to this widget. Also sinks
    /// the event kind.
    pub fn add_dom_handler<F>(&mut self, id: WidgetId, kind: EventKind, handler: F) -> WidgetResult<HandlerRegistration>
    where
        F: FnMut(&mut BrowserEvent) + 'static,
    {
        self.sink_events(id, kind.into())?;
        let reg = self.next_registration();
        self.node_mut(id)?.handlers.add_dom(reg, kind, Box::new(handler));
        Ok(reg)
    }

    /// Remove a handler registered on `id`
    pub fn remove_handler(&mut self, id: WidgetId, reg: HandlerRegistration) -> bool {
        self.widgets
            .get_mut(id.0)
            .is_some_and(|n| n.handlers.remove(reg))
    }

    // ------------------------------------------------------------------
    // Root operations
    // ------------------------------------------------------------------

    /// Add a widget to the root panel. Hook failures are subject to the
    /// configured [`FailurePolicy`]; contract errors always propagate.
    pub fn add_to_root(&mut self, child: WidgetId) -> WidgetResult<()> {
        let result = self.add(self.root, child);
        self.apply_policy(result, "add_to_root")
    }

    /// Detach the whole tree from the document
    pub fn teardown(&mut self) -> WidgetResult<()> {
        if !self.is_attached(self.root) {
            return Ok(());
        }
        tracing::debug!("Tearing down widget tree");
        let result = self.on_detach(self.root);
        self.apply_policy(result, "teardown")
    }

    /// Re-attach the root after a teardown
    pub fn restore(&mut self) -> WidgetResult<()> {
        if self.is_attached(self.root) {
            return Ok(());
        }
        let result = self.on_attach(self.root);
        self.apply_policy(result, "restore")
    }

    fn apply_policy(&self, result: WidgetResult<()>, operation: &str) -> WidgetResult<()> {
        match (result, self.config.failure_policy) {
            (Err(e @ (WidgetError::AttachDetach(_) | WidgetError::Hook(_))), FailurePolicy::LogAndContinue) => {
                tracing::error!("{} completed with lifecycle failures: {}", operation, e);
                Ok(())
            }
            (result, _) => result,
        }
    }

    // ------------------------------------------------------------------
    // Destruction
    // ------------------------------------------------------------------

    /// Free a detached, parentless widget together with its subtree and
    /// elements.
    pub fn release(&mut self, id: WidgetId) -> WidgetResult<()> {
        let node = self.node(id)?;
        if id == self.root {
            return Err(WidgetError::IllegalState("the root panel cannot be released"));
        }
        if node.parent.is_some() {
            return Err(WidgetError::HasParent(id));
        }
        if self.is_attached(id) {
            return Err(WidgetError::StillAttached(id));
        }

        let element = node.element;
        let mut stack = vec![id];
        let mut released = 0;
        while let Some(current) = stack.pop() {
            if let Some(node) = self.widgets.remove(current.0) {
                stack.extend(node.structure.child_ids());
                released += 1;
            }
        }
        if let Some(element) = element {
            self.document.tree_mut().release(element)?;
        }
        tracing::debug!("Released {:?} ({} widgets)", id, released);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_is_attached_to_body() {
        let tree = WidgetTree::new(Config::default());
        let root = tree.root();
        assert!(tree.is_attached(root));
        assert_eq!(tree.element(root).ok(), tree.document().body());
        assert!(tree.is_element_live(root));
    }

    #[test]
    fn test_root_created_when_document_has_no_body() {
        let config = Config {
            root_tag: "main".to_string(),
            ..Config::default()
        };
        let tree = WidgetTree::with_document(Document::empty(), config);
        let root_el = tree.element(tree.root()).unwrap();
        let tag = tree.document().tree().get(root_el).and_then(|n| n.as_element()).map(|e| e.tag.clone());
        assert_eq!(tag.as_deref(), Some("main"));
        assert!(tree.is_attached(tree.root()));
    }

    #[test]
    fn test_new_widgets_are_detached() {
        let mut tree = WidgetTree::new(Config::default());
        let leaf = tree.create_leaf("span", Plain);
        assert!(!tree.is_attached(leaf));
        assert_eq!(tree.attach_state(leaf), Some(AttachState::Never));
        assert_eq!(tree.kind(leaf), Some(WidgetKind::Leaf));
        assert_eq!(tree.parent(leaf), None);
    }

    #[test]
    fn test_sink_before_attach_is_deferred() {
        let mut tree = WidgetTree::new(Config::default());
        let leaf = tree.create_leaf("button", Plain);
        tree.sink_events(leaf, EventBits::CLICK).unwrap();

        let el = tree.element(leaf).unwrap();
        assert_eq!(tree.document().tree().sunk_events(el), EventBits::NONE);
        assert_eq!(tree.pending_sink(leaf), Some(EventBits::CLICK));

        tree.add_to_root(leaf).unwrap();
        assert_eq!(tree.document().tree().sunk_events(el), EventBits::CLICK);
        assert_eq!(tree.pending_sink(leaf), Some(EventBits::NONE));

        // After the first attach, sinking goes straight to the element
        tree.sink_events(leaf, EventBits::FOCUS_EVENTS).unwrap();
        assert!(tree.document().tree().sunk_events(el).includes(EventKind::Blur));
        tree.unsink_events(leaf, EventBits::CLICK).unwrap();
        assert!(!tree.document().tree().sunk_events(el).includes(EventKind::Click));
    }

    #[test]
    fn test_release_requires_orphaned_detached_widget() {
        let mut tree = WidgetTree::new(Config::default());
        let panel = tree.create_panel("div", Plain);
        let child = tree.create_leaf("span", Plain);
        tree.add(panel, child).unwrap();
        tree.add_to_root(panel).unwrap();

        assert!(matches!(tree.release(child), Err(WidgetError::HasParent(_))));
        assert!(matches!(tree.release(tree.root()), Err(WidgetError::IllegalState(_))));

        tree.remove_from_parent(panel).unwrap();
        let before = tree.widget_count();
        tree.release(panel).unwrap();
        assert_eq!(tree.widget_count(), before - 2);
        assert!(!tree.contains(panel));
        assert!(!tree.contains(child));
        assert!(matches!(tree.element(child), Err(WidgetError::UnknownWidget(_))));
    }

    #[test]
    fn test_widget_downcast() {
        #[derive(Default)]
        struct Counter(u32);
        impl Widget for Counter {}

        let mut tree = WidgetTree::new(Config::default());
        let id = tree.create_leaf("div", Counter(3));
        assert_eq!(tree.widget::<Counter>(id).map(|c| c.0), Some(3));
        assert!(tree.widget::<Plain>(id).is_none());

        tree.widget_mut::<Counter>(id).unwrap().0 += 1;
        assert_eq!(tree.widget::<Counter>(id).map(|c| c.0), Some(4));
    }
}
