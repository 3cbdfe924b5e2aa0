use super::Lifecycle;
use crossbeam_channel::{Receiver, Select, SendError, Sender};
use std::collections::VecDeque;
use std::sync::Arc;

/// Why the dispatch loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Exit {
    /// Producers closed and every accepted item was delivered.
    Drained,
    /// Shutdown was signaled; `abandoned` items were never delivered.
    Shutdown { abandoned: usize },
    /// The queue handle went away.
    Disconnected,
}

/// The single owner of a queue's backlog.
///
/// Items enter through `incoming` and leave through `outgoing`; both are
/// zero-capacity channels, so every transfer is a rendezvous with a caller
/// blocked in `push` or `pop`. The backlog supplies the buffering those
/// channels lack.
pub(super) struct Dispatch<E> {
    incoming: Receiver<E>,
    outgoing: Sender<E>,
    lifecycle: Arc<Lifecycle>,
    backlog: VecDeque<E>,
    accepting: bool,
}

impl<E> Dispatch<E> {
    pub(super) fn new(
        incoming: Receiver<E>,
        outgoing: Sender<E>,
        lifecycle: Arc<Lifecycle>,
    ) -> Self {
        Self {
            incoming,
            outgoing,
            lifecycle,
            backlog: VecDeque::new(),
            accepting: true,
        }
    }

    /// Runs until the backlog drains after close, or until shutdown.
    ///
    /// Consumes `self`, so `outgoing` is dropped (and blocked consumers
    /// released) as soon as this returns or unwinds.
    pub(super) fn run(mut self) -> Exit {
        loop {
            let mut sel = Select::new();
            let accept = self.accepting.then(|| sel.recv(&self.incoming));
            let closed = self
                .accepting
                .then(|| sel.recv(self.lifecycle.closed.listener()));
            // The head leaves the backlog only once a consumer takes it.
            let deliver = (!self.backlog.is_empty()).then(|| sel.send(&self.outgoing));
            let stop = sel.recv(self.lifecycle.shutdown.listener());

            let oper = sel.select();
            let index = oper.index();

            if index == stop {
                let _ = oper.recv(self.lifecycle.shutdown.listener());
                return Exit::Shutdown {
                    abandoned: self.backlog.len(),
                };
            } else if Some(index) == accept {
                match oper.recv(&self.incoming) {
                    Ok(item) => self.backlog.push_back(item),
                    Err(_) => self.accepting = false,
                }
            } else if Some(index) == closed {
                let _ = oper.recv(self.lifecycle.closed.listener());
                self.accepting = false;
            } else if Some(index) == deliver {
                let Some(item) = self.backlog.pop_front() else {
                    unreachable!("delivery armed on an empty backlog");
                };
                if let Err(SendError(item)) = oper.send(&self.outgoing, item) {
                    self.backlog.push_front(item);
                    return Exit::Disconnected;
                }
            } else {
                unreachable!("unknown select arm {index}");
            }

            if !self.accepting && self.backlog.is_empty() {
                return Exit::Drained;
            }
        }
    }
}
