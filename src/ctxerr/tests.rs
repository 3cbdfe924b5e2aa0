use super::*;

#[test]
fn bare_cause() {
    let err = ContextError::new(&Context::background(), Cause::DeadlineExceeded);
    assert_eq!(err.to_string(), "context deadline exceeded");
    assert_eq!(err.attrs().count(), 0);
}

#[test]
fn ignores_other_keys() {
    let ctx = Context::background()
        .with_attr("request", 42)
        .with_attr("error", "upstream");
    let err = ContextError::new(&ctx, Cause::Canceled);
    assert_eq!(err.to_string(), "[error=upstream]: context canceled");
    assert_eq!(err.attrs().collect::<Vec<_>>(), [("error", "upstream")]);
}

#[test]
fn wraps_cause() {
    let ctx = Context::background().with_attr("action", "drain");
    let err = ContextError::new(&ctx, Cause::Canceled);
    assert_eq!(err.cause(), Cause::Canceled);
    let source = err.source().expect("source");
    assert_eq!(source.downcast_ref::<Cause>(), Some(&Cause::Canceled));
}

#[test]
fn snapshot_at_creation() {
    let ctx = Context::background().with_attr("module", "a");
    let err = ContextError::new(&ctx, Cause::Canceled);
    let _later = ctx.with_attr("call", "pop");
    assert_eq!(err.to_string(), "[module=a]: context canceled");
}
