//! Widget errors and bulk-failure aggregation.
//!
//! Contract violations are reported immediately by the operation that
//! detects them. The only deferred errors are the ones collected while a
//! container visits every child: those end up in an [`AggregatedFailure`].

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use fos_dom::DomError;

use crate::WidgetId;

/// Result type for widget operations
pub type WidgetResult<T> = Result<T, WidgetError>;

/// Widget operation errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum WidgetError {
    #[error("Unknown widget: {0:?}")]
    UnknownWidget(WidgetId),

    #[error("Composite {0:?} is already initialized")]
    AlreadyInitialized(WidgetId),

    #[error("Composite {0:?} used before init_widget")]
    NotInitialized(WidgetId),

    #[error("Index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Slot {slot} out of bounds (arity {arity})")]
    SlotOutOfBounds { slot: usize, arity: usize },

    #[error("Slot {slot} of {container:?} is empty")]
    SlotEmpty { container: WidgetId, slot: usize },

    #[error("{child:?} is not a child of {parent:?}")]
    NotAChild { parent: WidgetId, child: WidgetId },

    #[error("{0:?} does not support removing its children")]
    NotAContainer(WidgetId),

    #[error("Should only call on_attach when {0:?} is detached")]
    AlreadyAttached(WidgetId),

    #[error("Should only call on_detach when {0:?} is attached")]
    NotAttached(WidgetId),

    #[error("{0:?} is still attached")]
    StillAttached(WidgetId),

    #[error("{0:?} still has a parent")]
    HasParent(WidgetId),

    #[error("No more elements")]
    NoSuchElement,

    #[error("Illegal state: {0}")]
    IllegalState(&'static str),

    #[error(transparent)]
    Hook(#[from] HookError),

    #[error(transparent)]
    AttachDetach(#[from] AggregatedFailure),

    #[error("Surface error: {0}")]
    Surface(#[from] DomError),
}

impl WidgetError {
    /// Address identifying the underlying error value, if it has one.
    fn identity(&self) -> Option<*const ()> {
        match self {
            WidgetError::Hook(h) => Some(Arc::as_ptr(&h.0) as *const ()),
            WidgetError::AttachDetach(a) => Some(Arc::as_ptr(&a.causes) as *const ()),
            _ => None,
        }
    }

    /// Identity comparison: true only for clones of the same error value.
    pub fn same_as(&self, other: &WidgetError) -> bool {
        match (self.identity(), other.identity()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct Message(String);

/// Failure raised by a user hook (`on_load`, `on_unload`).
///
/// Clones share the same underlying value, so two children reporting the
/// same instance are recognised as one cause.
#[derive(Clone)]
pub struct HookError(Arc<dyn StdError + Send + Sync>);

impl HookError {
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        HookError(Arc::new(error))
    }

    /// Hook failure carrying only a message
    pub fn msg(message: impl Into<String>) -> Self {
        HookError(Arc::new(Message(message.into())))
    }

    /// True if both handles point at the same error value
    pub fn same_as(&self, other: &HookError) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn inner(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.0
    }
}

impl fmt::Debug for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HookError").field(&self.0).finish()
    }
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl StdError for HookError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl From<&str> for HookError {
    fn from(message: &str) -> Self {
        HookError::msg(message)
    }
}

impl From<String> for HookError {
    fn from(message: String) -> Self {
        HookError::msg(message)
    }
}

/// Every failure collected during one bulk attach or detach visit.
///
/// Never empty. Causes keep the order in which children were visited.
#[derive(Debug, Clone)]
pub struct AggregatedFailure {
    causes: Arc<[WidgetError]>,
}

impl AggregatedFailure {
    pub fn causes(&self) -> &[WidgetError] {
        &self.causes
    }

    pub fn len(&self) -> usize {
        self.causes.len()
    }

    /// Always false; kept for symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.causes.is_empty()
    }

    /// Identity membership test
    pub fn contains(&self, error: &WidgetError) -> bool {
        self.causes.iter().any(|c| c.same_as(error))
    }
}

impl fmt::Display for AggregatedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} widget lifecycle failure(s)", self.causes.len())?;
        if let Some(first) = self.causes.first() {
            write!(f, "; first: {}", first)?;
        }
        Ok(())
    }
}

impl StdError for AggregatedFailure {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.causes.first().map(|c| c as &(dyn StdError + 'static))
    }
}

/// Accumulator used while visiting children: each failure is kept, the
/// visit continues, and the set is turned into one error at the end.
#[derive(Debug, Default)]
pub struct FailureSet {
    causes: Vec<WidgetError>,
}

impl FailureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure unless the same error value is already present
    pub fn push(&mut self, error: WidgetError) {
        if !self.causes.iter().any(|c| c.same_as(&error)) {
            self.causes.push(error);
        }
    }

    /// Record the error side of a result
    pub fn record(&mut self, result: WidgetResult<()>) {
        if let Err(e) = result {
            self.push(e);
        }
    }

    /// Apply `f` to every item, collecting failures instead of stopping
    pub fn visit_all<I, F>(items: I, mut f: F) -> WidgetResult<()>
    where
        I: IntoIterator,
        F: FnMut(I::Item) -> WidgetResult<()>,
    {
        let mut set = FailureSet::new();
        for item in items {
            set.record(f(item));
        }
        set.into_result()
    }

    pub fn len(&self) -> usize {
        self.causes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.causes.is_empty()
    }

    /// `Ok` if nothing failed, otherwise a single aggregated error
    pub fn into_result(self) -> WidgetResult<()> {
        if self.causes.is_empty() {
            Ok(())
        } else {
            Err(WidgetError::AttachDetach(AggregatedFailure {
                causes: self.causes.into(),
            }))
        }
    }
}
