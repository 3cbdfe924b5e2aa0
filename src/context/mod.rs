use crate::signal::{Never, Signal};
use crate::sync::{self, Mutex};
use crossbeam_channel::{Receiver, Select, SelectedOperation};
use std::borrow::Cow;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

/// The reason a [`Context`] is done.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cause {
    /// [`CancelHandle::cancel`] was called on the context or one of its ancestors.
    #[error("context canceled")]
    Canceled,
    /// The context's deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

type Attr = (Cow<'static, str>, String);

/// Carries cancellation, a deadline and diagnostic attributes
/// across blocking calls.
///
/// Contexts are cheap to clone and form a tree: every `with_*` method
/// derives a child that inherits everything its parent carries.
/// Cancelling a context cancels all of its descendants, never its ancestors.
///
/// ```
/// use syncq::{Cause, Context};
/// use std::time::Duration;
///
/// let root = Context::background().with_attr("module", "ingest");
/// let (ctx, cancel) = root.with_cancel();
/// let child = ctx.with_timeout(Duration::from_secs(60));
///
/// assert_eq!(child.cause(), None);
/// cancel.cancel();
/// assert_eq!(child.cause(), Some(Cause::Canceled));
/// assert_eq!(root.cause(), None);
/// ```
#[derive(Clone, Default)]
pub struct Context {
    cancel: Option<Arc<CancelState>>,
    deadline: Option<Instant>,
    attrs: Arc<Vec<Attr>>,
}

/// Cancels the [`Context`] returned together with it by [`Context::with_cancel`].
#[derive(Clone)]
pub struct CancelHandle {
    state: Arc<CancelState>,
}

struct CancelState {
    signal: Signal,
    children: Mutex<Vec<Weak<CancelState>>>,
}

impl CancelState {
    fn new() -> Self {
        Self {
            signal: Signal::new(),
            children: Mutex::new(Vec::new()),
        }
    }

    fn cancel(&self) {
        if !self.signal.fire() {
            return;
        }
        let children = std::mem::take(&mut *sync::lock(&self.children));
        for child in children.iter().filter_map(Weak::upgrade) {
            child.cancel();
        }
    }

    fn adopt(&self, child: &Arc<CancelState>) {
        let mut children = sync::lock(&self.children);
        // `cancel` fires before draining, so a child registered after
        // the drain sees the signal here.
        if self.signal.is_fired() {
            drop(children);
            child.cancel();
            return;
        }
        children.retain(|c| c.strong_count() > 0);
        children.push(Arc::downgrade(child));
    }
}

impl Context {
    /// A context that is never canceled, has no deadline and no attributes.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derives a context that is canceled by the returned [`CancelHandle`]
    /// or when `self` is canceled.
    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        let state = Arc::new(CancelState::new());
        if let Some(parent) = &self.cancel {
            parent.adopt(&state);
        }
        let ctx = Self {
            cancel: Some(state.clone()),
            deadline: self.deadline,
            attrs: self.attrs.clone(),
        };
        (ctx, CancelHandle { state })
    }

    /// Derives a context that expires at `deadline`.
    ///
    /// A deadline later than the inherited one has no effect.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) if current <= deadline => current,
            _ => deadline,
        };
        Self {
            cancel: self.cancel.clone(),
            deadline: Some(deadline),
            attrs: self.attrs.clone(),
        }
    }

    /// Derives a context that expires `timeout` from now.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.clone(),
        }
    }

    /// Derives a context carrying an extra diagnostic attribute.
    ///
    /// Setting a key that is already present replaces its value in place.
    pub fn with_attr(
        &self,
        key: impl Into<Cow<'static, str>>,
        value: impl fmt::Display,
    ) -> Self {
        let key = key.into();
        let value = value.to_string();
        let mut attrs = Vec::clone(&self.attrs);
        match attrs.iter_mut().find(|(k, _)| *k == key) {
            Some(attr) => attr.1 = value,
            None => attrs.push((key, value)),
        }
        Self {
            cancel: self.cancel.clone(),
            deadline: self.deadline,
            attrs: Arc::new(attrs),
        }
    }

    /// Returns why the context is done, or `None` while it is live.
    ///
    /// Cancellation is reported in preference to an expired deadline.
    pub fn cause(&self) -> Option<Cause> {
        if self.is_canceled() {
            return Some(Cause::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Cause::DeadlineExceeded),
            _ => None,
        }
    }

    /// Shorthand for `self.cause().is_some()`.
    pub fn is_done(&self) -> bool {
        self.cause().is_some()
    }

    /// The effective deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The diagnostic attributes, in the order they were first set.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.attrs.iter().map(|(k, v)| (k.as_ref(), v.as_str()))
    }

    fn is_canceled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|c| c.signal.is_fired())
    }

    /// Adds an arm that becomes ready once the context is canceled.
    pub(crate) fn watch<'a>(&'a self, sel: &mut Select<'a>) -> Option<Watch<'a>> {
        let listener = self.cancel.as_ref()?.signal.listener();
        Some(Watch {
            index: sel.recv(listener),
            listener,
        })
    }

    /// Runs `sel` until an arm is ready or the deadline passes.
    pub(crate) fn select<'a>(&self, sel: &mut Select<'a>) -> Option<SelectedOperation<'a>> {
        match self.deadline {
            Some(deadline) => sel.select_deadline(deadline).ok(),
            None => Some(sel.select()),
        }
    }
}

/// The cancellation arm of a `Select` registered by [`Context::watch`].
pub(crate) struct Watch<'a> {
    index: usize,
    listener: &'a Receiver<Never>,
}

impl<'a> Watch<'a> {
    pub(crate) fn index(&self) -> usize {
        self.index
    }

    /// Completes `oper`, which must have been selected on this arm.
    pub(crate) fn complete(self, oper: SelectedOperation<'a>) {
        debug_assert_eq!(oper.index(), self.index);
        let _ = oper.recv(self.listener);
    }
}

impl CancelHandle {
    /// Cancels the context and its descendants. Idempotent.
    pub fn cancel(&self) {
        self.state.cancel();
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("canceled", &self.is_canceled())
            .field("deadline", &self.deadline)
            .field("attrs", &self.attrs)
            .finish()
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle")
            .field("canceled", &self.state.signal.is_fired())
            .finish()
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests;
