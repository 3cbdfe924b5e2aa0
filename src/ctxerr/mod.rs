use crate::context::{Cause, Context};
use std::error::Error;
use std::fmt;

/// Attribute keys that [`ContextError`] renders as a prefix.
pub const ERROR_PREFIX_KEYS: &[&str] = &["module", "call", "action", "error"];

/// A [`Cause`] annotated with the diagnostic attributes of the [`Context`]
/// it came from.
///
/// Only attributes whose key is listed in [`ERROR_PREFIX_KEYS`] are kept,
/// in the order the context carries them:
///
/// ```
/// use syncq::ctxerr::ContextError;
/// use syncq::{Cause, Context};
///
/// let ctx = Context::background()
///     .with_attr("module", "ingest")
///     .with_attr("user", "alice")
///     .with_attr("call", "push");
/// let err = ContextError::new(&ctx, Cause::Canceled);
/// assert_eq!(err.to_string(), "[module=ingest][call=push]: context canceled");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextError {
    prefix: Vec<(String, String)>,
    cause: Cause,
}

impl ContextError {
    /// Captures the prefix attributes of `ctx` around `cause`.
    pub fn new(ctx: &Context, cause: Cause) -> Self {
        let prefix = ctx
            .attrs()
            .filter(|(k, _)| ERROR_PREFIX_KEYS.contains(k))
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Self { prefix, cause }
    }

    /// The underlying cancellation cause.
    pub fn cause(&self) -> Cause {
        self.cause
    }

    /// The captured prefix attributes.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.prefix.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (k, v) in &self.prefix {
            write!(f, "[{k}={v}]")?;
        }
        if !self.prefix.is_empty() {
            f.write_str(": ")?;
        }
        fmt::Display::fmt(&self.cause, f)
    }
}

impl Error for ContextError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.cause)
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests;
