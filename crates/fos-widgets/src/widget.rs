//! User-facing widget behaviour.
//!
//! The tree owns structure and lifecycle; a [`Widget`] only supplies the
//! optional hooks that run at attach, detach and event delivery.

use std::any::Any;

use fos_dom::{BrowserEvent, Document, NodeId};

use crate::{HookError, Scheduler, WidgetId};

/// What a hook may touch while it runs.
pub struct HookContext<'a> {
    /// Widget whose hook is running
    pub widget: WidgetId,
    /// Its element (shared with the inner widget for composites)
    pub element: Option<NodeId>,
    pub document: &'a mut Document,
    /// Queue for work that must run at the end of the current turn
    pub scheduler: &'a mut Scheduler,
}

/// Downcasting support for `dyn Widget`
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Hooks invoked by the tree.
///
/// `on_load` runs after the widget (and its children) became attached;
/// `on_unload` runs before anything is detached, so it still observes an
/// attached widget. A hook error never stops the tree's own bookkeeping.
pub trait Widget: AsAny {
    fn on_load(&mut self, _cx: &mut HookContext<'_>) -> Result<(), HookError> {
        Ok(())
    }

    fn on_unload(&mut self, _cx: &mut HookContext<'_>) -> Result<(), HookError> {
        Ok(())
    }

    /// Called for every input event routed to this widget, before its
    /// registered DOM handlers.
    fn on_browser_event(&mut self, _event: &mut BrowserEvent, _cx: &mut HookContext<'_>) {}
}

/// Widget without hooks, for plain structural nodes
#[derive(Debug, Clone, Copy, Default)]
pub struct Plain;

impl Widget for Plain {}
