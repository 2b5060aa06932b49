//! fOS Widgets - attachment lifecycle and event delegation
//!
//! Widgets live in a [`WidgetTree`] arena and own one surface element each.
//! Containers fan attach/detach out to their children, collecting child
//! failures instead of stopping at the first one. Composites wrap a single
//! inner widget, share its element, and see every input event before it.
//!
//! ```ignore
//! let mut tree = WidgetTree::new(Config::default());
//! let panel = tree.create_panel("div", Plain);
//! let label = tree.create_leaf("span", Plain);
//! tree.add(panel, label)?;
//! tree.add_to_root(panel)?;
//! assert!(tree.is_attached(label));
//! ```

mod arena;
mod composite;
mod config;
mod cursor;
mod error;
mod handlers;
mod lifecycle;
mod node;
mod panel;
mod router;
mod scheduler;
mod tree;
mod widget;

pub use fos_dom as dom;

pub use config::{Config, FailurePolicy};
pub use cursor::{ChildCursor, ChildIter};
pub use error::{AggregatedFailure, FailureSet, HookError, WidgetError, WidgetResult};
pub use handlers::{AttachEvent, AttachHandler, DomHandler, HandlerRegistration};
pub use node::{AttachState, WidgetKind};
pub use scheduler::{DeferredCommand, Scheduler, TaskHandle};
pub use tree::WidgetTree;
pub use widget::{AsAny, HookContext, Plain, Widget};

use arena::GenIndex;
use fos_dom::ListenerId;

/// Handle to a widget in a [`WidgetTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetId(pub(crate) GenIndex);

impl WidgetId {
    /// Dispatch target bound on the widget's element while it is attached
    pub fn listener(self) -> ListenerId {
        ListenerId(self.0.to_bits())
    }

    pub fn from_listener(listener: ListenerId) -> Self {
        Self::from_bits(listener.0)
    }

    pub(crate) fn from_bits(bits: u64) -> Self {
        WidgetId(GenIndex::from_bits(bits))
    }
}
