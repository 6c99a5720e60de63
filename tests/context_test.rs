mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use common::{FakeIndex, reader_id};
use lexiq::{Context, ContextConfig, DisposeOutcome, LexiqError, LiveTrackers, ReloadOutcome};

#[test]
fn test_reload_is_idempotent() -> lexiq::Result<()> {
    let index = FakeIndex::with_docs(3);
    let context = Context::new(index.primitives());

    let handle = context.checkout()?;
    let before = Arc::clone(handle.searcher());
    handle.release()?;

    index.bump();
    assert!(matches!(context.reload()?, ReloadOutcome::Published { .. }));
    assert_eq!(context.reload()?, ReloadOutcome::Unchanged);
    assert_eq!(index.reopens(), 2);

    let first = context.checkout()?;
    let second = context.checkout()?;
    assert!(Arc::ptr_eq(first.searcher(), second.searcher()));
    assert!(!Arc::ptr_eq(first.searcher(), &before));
    first.release()?;
    second.release()?;

    assert_eq!(index.opened().len(), 2);
    Ok(())
}

#[test]
fn test_handle_keeps_its_snapshot_across_reload() -> lexiq::Result<()> {
    let index = FakeIndex::with_docs(3);
    let context = Context::new(index.primitives());

    let handle = context.checkout()?;
    let searcher = Arc::clone(handle.searcher());

    index.bump();
    context.reload()?;

    assert!(Arc::ptr_eq(handle.searcher(), &searcher));
    let fresh = context.checkout()?;
    assert_ne!(reader_id(fresh.searcher()), reader_id(&searcher));

    handle.release()?;
    fresh.release()?;
    Ok(())
}

#[test]
fn test_superseded_snapshot_waits_for_every_handle() -> lexiq::Result<()> {
    let index = FakeIndex::with_docs(3);
    let context = Context::new(index.primitives());

    let handles = (0..3)
        .map(|_| context.checkout())
        .collect::<lexiq::Result<Vec<_>>>()?;
    let old_reader = reader_id(handles[0].searcher());

    index.bump();
    context.reload()?;

    // Release out of checkout order.
    handles[1].release()?;
    assert_eq!(index.close_count(old_reader), 0);
    handles[2].release()?;
    assert_eq!(index.close_count(old_reader), 0);
    handles[0].release()?;
    assert_eq!(index.close_count(old_reader), 1);

    drop(handles);
    assert_eq!(index.close_count(old_reader), 1);
    Ok(())
}

#[test]
fn test_idle_snapshot_closes_on_reload() -> lexiq::Result<()> {
    let index = FakeIndex::with_docs(3);
    let context = Context::new(index.primitives());

    let handle = context.checkout()?;
    let old_reader = reader_id(handle.searcher());
    handle.release()?;
    assert_eq!(index.close_count(old_reader), 0);

    index.bump();
    context.reload()?;
    assert_eq!(index.closed(), vec![old_reader]);
    Ok(())
}

#[test]
fn test_double_release_fails() -> lexiq::Result<()> {
    let index = FakeIndex::with_docs(1);
    let context = Context::new(index.primitives());

    let handle = context.checkout()?;
    handle.release()?;
    assert!(matches!(handle.release(), Err(LexiqError::AlreadyReleased)));
    assert!(matches!(handle.release(), Err(LexiqError::AlreadyReleased)));
    assert_eq!(context.outstanding_handles(), 0);
    Ok(())
}

#[test]
fn test_dropped_handle_is_released() -> lexiq::Result<()> {
    let index = FakeIndex::with_docs(1);
    let context = Context::new(index.primitives());

    {
        let _handle = context.checkout()?;
        assert_eq!(context.outstanding_handles(), 1);
    }
    assert_eq!(context.outstanding_handles(), 0);
    Ok(())
}

#[test]
fn test_reload_before_checkout_is_noop() -> lexiq::Result<()> {
    let index = FakeIndex::with_docs(1);
    let context = Context::new(index.primitives());

    assert_eq!(context.reload()?, ReloadOutcome::NoSnapshot);
    assert_eq!(index.reopens(), 0);
    assert!(index.opened().is_empty());
    assert_eq!(context.current_generation(), None);
    Ok(())
}

#[test]
fn test_failed_reopen_keeps_current_snapshot() -> lexiq::Result<()> {
    let index = FakeIndex::with_docs(1);
    let context = Context::new(index.primitives());
    context.checkout()?.release()?;
    let generation = context.current_generation();

    index.bump();
    index.fail_reopen(true);
    assert!(matches!(context.reload(), Err(LexiqError::Index(_))));
    assert_eq!(context.current_generation(), generation);

    index.fail_reopen(false);
    assert!(matches!(context.reload()?, ReloadOutcome::Published { .. }));
    Ok(())
}

#[test]
fn test_failed_searcher_closes_reopened_reader() -> lexiq::Result<()> {
    let index = FakeIndex::with_docs(1);
    let context = Context::new(index.primitives());
    context.checkout()?.release()?;
    let generation = context.current_generation();

    index.bump();
    index.fail_searcher(true);
    assert!(matches!(context.reload(), Err(LexiqError::Index(_))));
    assert_eq!(context.current_generation(), generation);

    // The reader from the failed reload is handed back; the first stays open.
    let opened = index.opened();
    assert_eq!(opened.len(), 2);
    assert_eq!(index.closed(), vec![opened[1]]);

    index.fail_searcher(false);
    assert!(matches!(context.reload()?, ReloadOutcome::Published { .. }));
    assert_eq!(index.closed(), vec![opened[1], opened[0]]);
    Ok(())
}

#[test]
fn test_loading_callbacks_see_unpublished_searcher() -> lexiq::Result<()> {
    let index = FakeIndex::with_docs(2);
    let context = Arc::new(Context::new(index.primitives()));
    let warmed = Arc::new(AtomicUsize::new(0));

    let seen = Arc::clone(&warmed);
    let observed = Arc::downgrade(&context);
    context.on_snapshot_loading(move |searcher| {
        // The new searcher is not current yet.
        if let Some(context) = observed.upgrade() {
            let handle = context.checkout()?;
            assert!(!Arc::ptr_eq(handle.searcher(), searcher));
            handle.release()?;
        }
        seen.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    context.checkout()?.release()?;
    index.bump();
    context.reload()?;
    assert_eq!(warmed.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn test_failing_loading_callback_aborts_reload() -> lexiq::Result<()> {
    let index = FakeIndex::with_docs(2);
    let context = Context::new(index.primitives());
    context.on_snapshot_loading(|_| Err(LexiqError::index("warm-up failed")));

    let handle = context.checkout()?;
    let current = reader_id(handle.searcher());
    handle.release()?;

    index.bump();
    assert!(context.reload().is_err());

    let handle = context.checkout()?;
    assert_eq!(reader_id(handle.searcher()), current);
    handle.release()?;

    // The discarded snapshot was closed, the current one was not.
    let discarded = index.opened()[1];
    assert_eq!(index.close_count(discarded), 1);
    assert_eq!(index.close_count(current), 0);
    Ok(())
}

#[test]
fn test_prewarm_disabled_skips_callbacks() -> lexiq::Result<()> {
    let index = FakeIndex::with_docs(2);
    let context = Context::with_config(
        ContextConfig::new("cold").with_prewarm(false),
        index.primitives(),
    );
    context.on_snapshot_loading(|_| Err(LexiqError::index("must not run")));

    context.checkout()?.release()?;
    index.bump();
    assert!(matches!(context.reload()?, ReloadOutcome::Published { .. }));
    Ok(())
}

#[test]
fn test_dispose_defers_release_to_last_handle() -> lexiq::Result<()> {
    let index = FakeIndex::with_docs(1);
    let trackers = Arc::new(LiveTrackers::new());
    let context = Context::new(index.primitives()).with_observer(trackers.clone());

    let handle = context.checkout()?;
    let generation = handle.generation();

    assert_eq!(context.dispose(), DisposeOutcome::Deferred { outstanding: 1 });
    assert_eq!(context.dispose(), DisposeOutcome::AlreadyDisposed);
    assert_eq!(trackers.deferred(), vec![(generation, 1)]);
    assert!(matches!(context.checkout(), Err(LexiqError::ManagerDisposed)));
    assert!(matches!(context.reload(), Err(LexiqError::ManagerDisposed)));

    // The handle keeps working until released.
    assert_eq!(handle.searcher().reader().num_docs(), 1);
    handle.release()?;
    assert_eq!(trackers.live_count(), 0);
    assert_eq!(index.closed().len(), 1);
    Ok(())
}

#[test]
fn test_drop_disposes_context() -> lexiq::Result<()> {
    let index = FakeIndex::with_docs(1);
    let trackers = Arc::new(LiveTrackers::new());
    {
        let context = Context::new(index.primitives()).with_observer(trackers.clone());
        context.checkout()?.release()?;
        assert_eq!(trackers.live_count(), 1);
    }
    assert_eq!(trackers.live_count(), 0);
    assert_eq!(trackers.released_count(), 1);
    Ok(())
}

#[test]
fn test_concurrent_checkout_and_reload() -> lexiq::Result<()> {
    let index = FakeIndex::with_docs(4);
    let trackers = Arc::new(LiveTrackers::new());
    let context = Arc::new(Context::new(index.primitives()).with_observer(trackers.clone()));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let context = Arc::clone(&context);
            thread::spawn(move || -> lexiq::Result<()> {
                for _ in 0..200 {
                    let handle = context.checkout()?;
                    let searcher = Arc::clone(handle.searcher());
                    thread::yield_now();
                    assert!(Arc::ptr_eq(handle.searcher(), &searcher));
                    handle.release()?;
                }
                Ok(())
            })
        })
        .collect();

    let writer = {
        let context = Arc::clone(&context);
        let index = Arc::clone(&index);
        thread::spawn(move || -> lexiq::Result<()> {
            for _ in 0..50 {
                index.bump();
                context.reload()?;
                thread::yield_now();
            }
            Ok(())
        })
    };

    for reader in readers {
        reader.join().expect("reader thread panicked")?;
    }
    writer.join().expect("writer thread panicked")?;

    assert_eq!(context.outstanding_handles(), 0);
    assert_eq!(context.dispose(), DisposeOutcome::Released);

    // Every snapshot ever opened was closed exactly once.
    assert_eq!(trackers.live_count(), 0);
    for id in index.opened() {
        assert_eq!(index.close_count(id), 1, "reader {id}");
    }
    Ok(())
}
