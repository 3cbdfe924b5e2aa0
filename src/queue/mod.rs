use crate::context::{Cause, Context};
use crate::ctxerr::ContextError;
use crate::error::{Error, PushError};
use crate::signal::Signal;
use crossbeam_channel::{Receiver, Select, SendError, Sender};
use std::fmt;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

mod counters;
use counters::Counters;

mod dispatch;
use dispatch::Dispatch;

#[cfg(feature = "batch")]
mod batch;
#[cfg(feature = "batch")]
pub use batch::BatchQueue;

/// The one-shot signals shared by a [`Queue`] and its dispatch thread.
pub(crate) struct Lifecycle {
    /// No more pushes; the backlog still drains.
    closed: Signal,
    /// Stop now; the backlog is abandoned.
    shutdown: Signal,
    /// Raised by the dispatch thread on exit.
    done: Signal,
}

impl Lifecycle {
    fn new() -> Self {
        Self {
            closed: Signal::new(),
            shutdown: Signal::new(),
            done: Signal::new(),
        }
    }
}

/// Raises `done` when the dispatch thread finishes, including by unwinding.
struct RaiseDone(Arc<Lifecycle>);

impl Drop for RaiseDone {
    fn drop(&mut self) {
        self.0.done.fire();
    }
}

/// An unbounded queue for any number of producer and consumer threads.
///
/// Producers call [`push`](Queue::push) and consumers call [`pop`](Queue::pop).
/// A dedicated dispatch thread owns the backlog; both calls are rendezvous
/// with it, so `push` returns as soon as the item is in the backlog, never
/// waiting for a consumer.
///
/// Like a pipeline of channels, the queue is shut down in one of two ways:
///
/// - [`close`](Queue::close) says no more items are coming. Consumers keep
///   receiving until the backlog is empty, then `pop` returns `None`.
/// - [`shutdown`](Queue::shutdown) says no one is consuming anymore. Every
///   later `push` fails, every later `pop` returns `None`, and the backlog
///   is dropped.
///
/// [`wait_empty`](Queue::wait_empty) combines both and blocks until the
/// dispatch thread exits. Dropping the queue shuts it down.
///
/// ```
/// use syncq::{Context, Queue};
/// use std::thread;
///
/// let ctx = Context::background();
/// let queue = Queue::new();
///
/// thread::scope(|s| {
///     s.spawn(|| {
///         for i in 0..3 {
///             queue.push(&ctx, i).unwrap();
///         }
///         queue.close();
///     });
///
///     let mut got = Vec::new();
///     while let Some(i) = queue.pop(&ctx) {
///         got.push(i);
///     }
///     assert_eq!(got, [0, 1, 2]);
/// });
///
/// assert!(queue.wait_empty(&ctx));
/// assert_eq!(queue.size(), (0, 3));
/// ```
pub struct Queue<E> {
    incoming: Sender<E>,
    outgoing: Receiver<E>,
    lifecycle: Arc<Lifecycle>,
    counters: Counters,
    actor: Option<JoinHandle<()>>,
    name: String,
}

/// Configures and spawns a [`Queue`].
///
/// ```
/// use syncq::{Builder, Queue};
///
/// let queue: Queue<String> = Builder::new()
///     .name("ingest")
///     .stack_size(64 * 1024)
///     .spawn()
///     .unwrap();
/// queue.shutdown();
/// ```
#[derive(Debug, Default, Clone)]
pub struct Builder {
    name: Option<String>,
    stack_size: Option<usize>,
}

const DEFAULT_NAME: &str = "syncq-dispatch";

impl Builder {
    /// Creates a builder with the default thread name and stack size.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names the dispatch thread. The name also tags its `tracing` span.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the stack size of the dispatch thread.
    pub fn stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size);
        self
    }

    /// Spawns the dispatch thread and returns the queue it serves.
    ///
    /// Fails only if the OS refuses to create the thread.
    pub fn spawn<E: Send + 'static>(self) -> io::Result<Queue<E>> {
        let name = self.name.unwrap_or_else(|| DEFAULT_NAME.to_owned());
        let (incoming, backlog_in) = crossbeam_channel::bounded(0);
        let (backlog_out, outgoing) = crossbeam_channel::bounded(0);
        let lifecycle = Arc::new(Lifecycle::new());

        let dispatch = Dispatch::new(backlog_in, backlog_out, lifecycle.clone());
        let raise_done = RaiseDone(lifecycle.clone());
        let span = tracing::debug_span!("dispatch", queue = %name);

        let mut builder = thread::Builder::new().name(name.clone());
        if let Some(size) = self.stack_size {
            builder = builder.stack_size(size);
        }
        let actor = builder.spawn(move || {
            let _done = raise_done;
            let _enter = span.enter();
            tracing::trace!("dispatch started");
            let exit = dispatch.run();
            tracing::debug!(?exit, "dispatch exited");
        })?;

        Ok(Queue {
            incoming,
            outgoing,
            lifecycle,
            counters: Counters::new(),
            actor: Some(actor),
            name,
        })
    }
}

impl<E: Send + 'static> Queue<E> {
    /// Creates a queue and starts its dispatch thread.
    ///
    /// # Panics
    ///
    /// Panics if the OS fails to create the thread, like [`std::thread::spawn`].
    /// Use [`Builder::spawn`] to handle that error.
    pub fn new() -> Self {
        Builder::new()
            .spawn()
            .expect("failed to spawn dispatch thread")
    }
}

impl<E: Send + 'static> Default for Queue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Queue<E> {
    /// Adds `item` to the back of the queue.
    ///
    /// Blocks only until the dispatch thread accepts the item, not until it
    /// is consumed. On failure the item is handed back inside the error:
    ///
    /// - [`Error::Context`] if `ctx` is canceled or expires first,
    /// - [`Error::Shutdown`] once [`shutdown`](Queue::shutdown) was called,
    /// - [`Error::Closed`] once [`close`](Queue::close) was called.
    pub fn push(&self, ctx: &Context, item: E) -> Result<(), PushError<E>> {
        if let Some(cause) = ctx.cause() {
            return Err(PushError::new(ContextError::new(ctx, cause), item));
        }
        if self.lifecycle.shutdown.is_fired() {
            return Err(PushError::new(Error::Shutdown, item));
        }
        if self.lifecycle.closed.is_fired() {
            return Err(PushError::new(Error::Closed, item));
        }

        let mut sel = Select::new();
        let accept = sel.send(&self.incoming);
        let shutdown = sel.recv(self.lifecycle.shutdown.listener());
        let closed = sel.recv(self.lifecycle.closed.listener());
        let watch = ctx.watch(&mut sel);

        let Some(oper) = ctx.select(&mut sel) else {
            let err = ContextError::new(ctx, Cause::DeadlineExceeded);
            return Err(PushError::new(err, item));
        };
        let index = oper.index();

        if index == accept {
            match oper.send(&self.incoming, item) {
                Ok(()) => {
                    self.counters.accepted();
                    Ok(())
                }
                // The dispatch thread already exited.
                Err(SendError(item)) => Err(PushError::new(self.terminal_error(), item)),
            }
        } else if index == shutdown {
            let _ = oper.recv(self.lifecycle.shutdown.listener());
            Err(PushError::new(Error::Shutdown, item))
        } else if index == closed {
            let _ = oper.recv(self.lifecycle.closed.listener());
            Err(PushError::new(Error::Closed, item))
        } else {
            match watch {
                Some(watch) => watch.complete(oper),
                None => unreachable!("unknown select arm {index}"),
            }
            let cause = ctx.cause().unwrap_or(Cause::Canceled);
            Err(PushError::new(ContextError::new(ctx, cause), item))
        }
    }

    /// Removes the item at the front of the queue, blocking until one is
    /// available.
    ///
    /// Returns `None` once the queue is closed and empty, once it is shut
    /// down, or when `ctx` is canceled or expires. The three cases look the
    /// same; a consumer seeing `None` should stop consuming.
    pub fn pop(&self, ctx: &Context) -> Option<E> {
        if ctx.is_done() || self.lifecycle.shutdown.is_fired() {
            return None;
        }

        let mut sel = Select::new();
        let deliver = sel.recv(&self.outgoing);
        let shutdown = sel.recv(self.lifecycle.shutdown.listener());
        let watch = ctx.watch(&mut sel);

        let oper = ctx.select(&mut sel)?;
        let index = oper.index();

        if index == deliver {
            // Err: the dispatch thread exited after draining.
            let item = oper.recv(&self.outgoing).ok()?;
            self.counters.delivered();
            Some(item)
        } else if index == shutdown {
            let _ = oper.recv(self.lifecycle.shutdown.listener());
            None
        } else {
            match watch {
                Some(watch) => watch.complete(oper),
                None => unreachable!("unknown select arm {index}"),
            }
            None
        }
    }

    /// Signals that no more items will be pushed.
    ///
    /// Items already in the queue are still delivered. Idempotent.
    pub fn close(&self) {
        if self.lifecycle.closed.fire() {
            tracing::trace!(queue = %self.name, "queue closed");
        }
    }

    /// Stops the queue immediately, dropping whatever it still holds.
    ///
    /// Afterwards `push` fails with [`Error::Shutdown`] and `pop` returns
    /// `None`. Idempotent.
    pub fn shutdown(&self) {
        if self.lifecycle.shutdown.fire() {
            tracing::trace!(queue = %self.name, "queue shutdown");
        }
    }

    /// Closes the queue and blocks until the dispatch thread exits.
    ///
    /// Returns `true` if every item was consumed. If `ctx` is canceled or
    /// expires first, the queue is shut down instead and `false` is
    /// returned, still only after the dispatch thread exited.
    pub fn wait_empty(&self, ctx: &Context) -> bool {
        self.close();
        if self.lifecycle.done.is_fired() {
            return true;
        }

        if !ctx.is_done() {
            let mut sel = Select::new();
            let done = sel.recv(self.lifecycle.done.listener());
            let watch = ctx.watch(&mut sel);

            if let Some(oper) = ctx.select(&mut sel) {
                if oper.index() == done {
                    let _ = oper.recv(self.lifecycle.done.listener());
                    return true;
                }
                match watch {
                    Some(watch) => watch.complete(oper),
                    None => unreachable!("unknown select arm"),
                }
            }
        }

        self.shutdown();
        self.lifecycle.done.wait();
        false
    }

    /// Returns the number of items in the queue and the number of items
    /// ever accepted.
    ///
    /// Under concurrent use the first value is approximate.
    pub fn size(&self) -> (i64, i64) {
        self.counters.load()
    }

    /// Returns `true` once the dispatch thread has exited.
    pub fn is_done(&self) -> bool {
        self.lifecycle.done.is_fired()
    }

    fn terminal_error(&self) -> Error {
        if self.lifecycle.shutdown.is_fired() {
            Error::Shutdown
        } else {
            Error::Closed
        }
    }
}

impl<E> Drop for Queue<E> {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(actor) = self.actor.take() {
            // A panic on the dispatch thread has nothing left to poison.
            let _ = actor.join();
        }
    }
}

impl<E> fmt::Debug for Queue<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (size, total) = self.size();
        f.debug_struct("Queue")
            .field("name", &self.name)
            .field("size", &size)
            .field("total", &total)
            .field("closed", &self.lifecycle.closed.is_fired())
            .field("shutdown", &self.lifecycle.shutdown.is_fired())
            .field("done", &self.is_done())
            .finish()
    }
}
