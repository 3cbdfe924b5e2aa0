use super::*;

#[test]
fn background_is_live() {
    let ctx = Context::background();
    assert_eq!(ctx.cause(), None);
    assert_eq!(ctx.deadline(), None);
    assert_eq!(ctx.attrs().count(), 0);
}

#[test]
fn cancel_reaches_descendants() {
    let (parent, cancel) = Context::background().with_cancel();
    let (child, _child_cancel) = parent.with_cancel();
    let grandchild = child.with_attr("call", "push");

    cancel.cancel();
    assert_eq!(parent.cause(), Some(Cause::Canceled));
    assert_eq!(child.cause(), Some(Cause::Canceled));
    assert_eq!(grandchild.cause(), Some(Cause::Canceled));
}

#[test]
fn cancel_spares_ancestors() {
    let (parent, _cancel) = Context::background().with_cancel();
    let (child, child_cancel) = parent.with_cancel();
    child_cancel.cancel();
    child_cancel.cancel();
    assert!(child.is_done());
    assert!(!parent.is_done());
}

#[test]
fn child_of_canceled_parent() {
    let (parent, cancel) = Context::background().with_cancel();
    cancel.cancel();
    let (child, _) = parent.with_cancel();
    assert_eq!(child.cause(), Some(Cause::Canceled));
}

#[test]
fn deadline_exceeded() {
    let ctx = Context::background().with_timeout(Duration::from_millis(10));
    assert_eq!(ctx.cause(), None);
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(ctx.cause(), Some(Cause::DeadlineExceeded));
}

#[test]
fn earliest_deadline_wins() {
    let now = Instant::now();
    let early = now + Duration::from_secs(1);
    let late = now + Duration::from_secs(10);
    let ctx = Context::background().with_deadline(early).with_deadline(late);
    assert_eq!(ctx.deadline(), Some(early));
}

#[test]
fn cancel_beats_deadline() {
    let (ctx, cancel) = Context::background()
        .with_deadline(Instant::now())
        .with_cancel();
    cancel.cancel();
    assert_eq!(ctx.cause(), Some(Cause::Canceled));
}

#[test]
fn attrs_replace_in_place() {
    let ctx = Context::background()
        .with_attr("module", "ingest")
        .with_attr("call", "push")
        .with_attr("module", "egress");
    let attrs: Vec<_> = ctx.attrs().collect();
    assert_eq!(attrs, [("module", "egress"), ("call", "push")]);
}

#[test]
fn watch_wakes_select() {
    let (ctx, cancel) = Context::background().with_cancel();
    let (_tx, rx) = crossbeam_channel::bounded::<()>(0);
    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(10));
        cancel.cancel();
    });

    let mut sel = Select::new();
    sel.recv(&rx);
    let watch = ctx.watch(&mut sel).expect("cancelable context");
    let oper = ctx.select(&mut sel).expect("no deadline");
    assert_eq!(oper.index(), watch.index());
    watch.complete(oper);
    handle.join().unwrap();
}

#[test]
fn select_times_out() {
    let ctx = Context::background().with_timeout(Duration::from_millis(10));
    let (_tx, rx) = crossbeam_channel::bounded::<()>(0);
    let mut sel = Select::new();
    sel.recv(&rx);
    assert!(ctx.watch(&mut sel).is_none());
    assert!(ctx.select(&mut sel).is_none());
}
