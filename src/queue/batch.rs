use super::Queue;
use crate::context::Context;
use crate::error::PushError;
use std::ops::Deref;

/// A [`Queue`] that moves items in batches.
///
/// Each [`push`](BatchQueue::push) enqueues its items as a single element
/// and each [`pop`](BatchQueue::pop) returns one such batch, in order.
/// Lifecycle and accounting are those of the wrapped `Queue<Vec<E>>`,
/// reachable through `Deref`; [`size`](Queue::size) counts batches.
///
/// ```
/// use syncq::{BatchQueue, Context};
///
/// let ctx = Context::background();
/// let queue = BatchQueue::new();
/// queue.push(&ctx, [1, 2, 3]).unwrap();
/// queue.push(&ctx, 4..6).unwrap();
/// queue.close();
///
/// assert_eq!(queue.pop(&ctx), Some(vec![1, 2, 3]));
/// assert_eq!(queue.pop(&ctx), Some(vec![4, 5]));
/// assert_eq!(queue.pop(&ctx), None);
/// ```
#[derive(Debug)]
pub struct BatchQueue<E> {
    queue: Queue<Vec<E>>,
}

impl<E: Send + 'static> BatchQueue<E> {
    /// Creates a batching queue and starts its dispatch thread.
    ///
    /// # Panics
    ///
    /// Panics if the OS fails to create the thread.
    pub fn new() -> Self {
        Self {
            queue: Queue::new(),
        }
    }
}

impl<E: Send + 'static> Default for BatchQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> From<Queue<Vec<E>>> for BatchQueue<E> {
    fn from(queue: Queue<Vec<E>>) -> Self {
        Self { queue }
    }
}

impl<E> BatchQueue<E> {
    /// Enqueues `items` as one batch. See [`Queue::push`].
    pub fn push(
        &self,
        ctx: &Context,
        items: impl IntoIterator<Item = E>,
    ) -> Result<(), PushError<Vec<E>>> {
        self.queue.push(ctx, items.into_iter().collect())
    }

    /// Dequeues the oldest batch. See [`Queue::pop`].
    pub fn pop(&self, ctx: &Context) -> Option<Vec<E>> {
        self.queue.pop(ctx)
    }
}

impl<E> Deref for BatchQueue<E> {
    type Target = Queue<Vec<E>>;

    fn deref(&self) -> &Self::Target {
        &self.queue
    }
}
