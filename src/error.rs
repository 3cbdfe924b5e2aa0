use crate::context::Cause;
use crate::ctxerr::ContextError;
use std::error;
use std::fmt;

/// The reason a [`Queue::push`](crate::Queue::push) failed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The caller's [`Context`](crate::Context) was canceled or expired
    /// before the item was accepted.
    #[error(transparent)]
    Context(#[from] ContextError),
    /// [`Queue::shutdown`](crate::Queue::shutdown) was called.
    #[error("queue is shutdown")]
    Shutdown,
    /// [`Queue::close`](crate::Queue::close) was called, so the queue
    /// no longer accepts items.
    #[error("queue is closed")]
    Closed,
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The context was canceled.
    Canceled,
    /// The context's deadline passed.
    DeadlineExceeded,
    /// The queue was shut down or closed to producers.
    QueueShutdown,
}

impl Error {
    /// Returns the [`ErrorKind`] of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Context(e) => match e.cause() {
                Cause::Canceled => ErrorKind::Canceled,
                Cause::DeadlineExceeded => ErrorKind::DeadlineExceeded,
            },
            Error::Shutdown | Error::Closed => ErrorKind::QueueShutdown,
        }
    }
}

/// Error for the [`push`](crate::Queue::push) method.
///
/// Contains the [`Error`] and the item that failed to be enqueued.
#[derive(PartialEq, Eq, Clone)]
pub struct PushError<T> {
    error: Error,
    item: T,
}

impl<T> PushError<T> {
    pub(crate) fn new(error: impl Into<Error>, item: T) -> Self {
        Self {
            error: error.into(),
            item,
        }
    }

    /// The reason the push failed.
    pub fn error(&self) -> &Error {
        &self.error
    }

    /// Shorthand for `self.error().kind()`.
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    /// Returns the item that wasn't enqueued.
    pub fn into_inner(self) -> T {
        self.item
    }

    /// Splits into the error and the rejected item.
    pub fn into_parts(self) -> (Error, T) {
        (self.error, self.item)
    }
}

impl<T> From<PushError<T>> for Error {
    fn from(e: PushError<T>) -> Self {
        e.error
    }
}

impl<T> fmt::Display for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl<T> fmt::Debug for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PushError")
            .field(&self.error)
            .field(&format_args!(".."))
            .finish()
    }
}

impl<T> error::Error for PushError<T> {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        error::Error::source(&self.error)
    }
}
