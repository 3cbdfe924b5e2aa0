#![allow(unused_imports)]
cfg_loom! {
    pub(crate) use loom::sync::*;
}

cfg_not_loom! {
    pub(crate) use std::sync::*;
}

/// Locks `mutex`, ignoring poison.
///
/// Every critical section in this crate leaves its data consistent
/// before it can panic, so a poisoned lock is still usable.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(g) => g,
        Err(poisoned) => poisoned.into_inner(),
    }
}
