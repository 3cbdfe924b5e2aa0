use crate::sync::atomic::{
    AtomicBool,
    Ordering::{AcqRel, Acquire},
};
use crate::sync::{self, Mutex};
use crossbeam_channel::{Receiver, Sender};

/// Message type of a signal channel; nothing is ever sent on it.
pub(crate) enum Never {}

/// One-shot broadcast flag.
///
/// Firing drops the only [`Sender`] of a zero-capacity channel, so every
/// [`listener`](Signal::listener) becomes permanently ready, which lets a
/// signal take part in a `crossbeam_channel::Select` next to ordinary
/// channel operations.
pub(crate) struct Signal {
    fired: AtomicBool,
    trigger: Mutex<Option<Sender<Never>>>,
    listener: Receiver<Never>,
}

impl Signal {
    pub(crate) fn new() -> Self {
        let (trigger, listener) = crossbeam_channel::bounded(0);
        Self {
            fired: AtomicBool::new(false),
            trigger: Mutex::new(Some(trigger)),
            listener,
        }
    }

    /// Raises the signal. Returns `true` only for the call that raised it.
    pub(crate) fn fire(&self) -> bool {
        if self
            .fired
            .compare_exchange(false, true, AcqRel, Acquire)
            .is_err()
        {
            return false;
        }
        drop(sync::lock(&self.trigger).take());
        true
    }

    #[inline]
    pub(crate) fn is_fired(&self) -> bool {
        self.fired.load(Acquire)
    }

    /// Receiver that disconnects once the signal is fired.
    ///
    /// Operations selected on it must be completed with `recv`, which
    /// always returns `Err` after firing.
    #[inline]
    pub(crate) fn listener(&self) -> &Receiver<Never> {
        &self.listener
    }

    /// Blocks until the signal is fired.
    pub(crate) fn wait(&self) {
        // Never returns Ok: there's no value of type Never.
        let _ = self.listener.recv();
    }
}
