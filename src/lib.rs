#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

// loom integration
#[doc(hidden)]
macro_rules! cfg_loom {
    ($($item:item)*) => {
        $(
            #[cfg(feature = "loom")]
            $item
        )*
    };
}
#[doc(hidden)]
macro_rules! cfg_not_loom {
    ($($item:item)*) => {
        $(
            #[cfg(not(feature = "loom"))]
            $item
        )*
    };
}

#[doc(hidden)]
mod sync;
//loom integration finished.

mod signal;

/// Cancellation, deadlines and diagnostic attributes for blocking calls.
pub mod context;

/// Annotation of cancellation errors with context attributes.
pub mod ctxerr;

/// A module containing the error types used by the library.
pub mod error;

/// The unbounded multi-producer multi-consumer [`Queue`].
pub mod queue;

#[doc(inline)]
pub use context::{CancelHandle, Cause, Context};
#[doc(inline)]
pub use error::{Error, ErrorKind, PushError};
#[doc(inline)]
pub use queue::{Builder, Queue};

#[cfg(feature = "batch")]
#[doc(inline)]
pub use queue::BatchQueue;
