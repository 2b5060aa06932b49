//! Composite widgets.
//!
//! A composite wraps exactly one inner widget and takes over its element.
//! The element's dispatch target is the composite, which forwards events
//! and lifecycle transitions to the inner widget.

use crate::lifecycle::merge;
use crate::node::{AttachState, Structure};
use crate::{WidgetError, WidgetId, WidgetResult, WidgetTree};

impl WidgetTree {
    /// Bind the inner widget of a composite. Allowed once per composite.
    ///
    /// The inner widget is first removed from any previous parent, then its
    /// element becomes the composite's element.
    pub fn init_widget(&mut self, composite: WidgetId, inner: WidgetId) -> WidgetResult<()> {
        match self.node(composite)?.structure {
            Structure::Composite(None) => {}
            Structure::Composite(Some(_)) => return Err(WidgetError::AlreadyInitialized(composite)),
            _ => return Err(WidgetError::IllegalState("init_widget on a widget that is not a composite")),
        }
        if inner == composite || inner == self.root() {
            return Err(WidgetError::IllegalState("composite cannot wrap itself or the root"));
        }
        let element = self.element(inner)?;

        self.remove_from_parent(inner)?;

        let node = self.node_mut(composite)?;
        node.structure = Structure::Composite(Some(inner));
        node.element = Some(element);
        self.node_mut(inner)?.parent = Some(composite);
        tracing::debug!("Composite {:?} wraps {:?}", composite, inner);
        Ok(())
    }

    /// The bound inner widget
    pub fn inner(&self, composite: WidgetId) -> WidgetResult<WidgetId> {
        match self.node(composite)?.structure {
            Structure::Composite(Some(inner)) => Ok(inner),
            Structure::Composite(None) => Err(WidgetError::NotInitialized(composite)),
            _ => Err(WidgetError::IllegalState("inner requested from a widget that is not a composite")),
        }
    }

    pub(crate) fn attach_composite(&mut self, id: WidgetId, inner: Option<WidgetId>) -> WidgetResult<()> {
        let inner = inner.ok_or(WidgetError::NotInitialized(id))?;
        if self.is_attached(inner) {
            return Err(WidgetError::AlreadyAttached(id));
        }

        // The composite shares its element with the inner widget, so its
        // deferred sink bits belong to the inner widget.
        let node = self.node(id)?;
        if !node.is_or_was_attached() && !node.pending_sink.is_empty() {
            let pending = node.pending_sink;
            self.sink_events(inner, pending)?;
        }
        let node = self.node_mut(id)?;
        node.pending_sink = fos_dom::EventBits::NONE;
        node.state = AttachState::Attached;

        let inner_result = self.on_attach(inner);

        let element = self.element(id)?;
        self.document
            .tree_mut()
            .set_event_listener(element, Some(id.listener()))?;
        tracing::debug!("Attached composite {:?}", id);

        let load = self.run_load(id);
        self.fire_attach(id, true);
        merge(inner_result, load)
    }

    pub(crate) fn detach_composite(&mut self, id: WidgetId, inner: Option<WidgetId>) -> WidgetResult<()> {
        let inner = inner.ok_or(WidgetError::NotInitialized(id))?;
        if !self.is_attached(inner) {
            return Err(WidgetError::NotAttached(id));
        }

        let unload = self.run_unload(id);
        self.fire_attach(id, false);

        // Clears the shared element's dispatch target
        let inner_result = self.on_detach(inner);
        self.node_mut(id)?.state = AttachState::Detached;
        tracing::debug!("Detached composite {:?}", id);

        merge(unload, inner_result)
    }
}
