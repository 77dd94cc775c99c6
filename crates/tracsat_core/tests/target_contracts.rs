use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;

use tracsat_core::error::ErrorKind;
use tracsat_core::{LogSink, TargetRegistry};

fn recording_registry() -> (Arc<TargetRegistry>, Arc<Mutex<Vec<String>>>) {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let sink_lines = Arc::clone(&lines);
    let sink: Arc<dyn LogSink> = Arc::new(move |line: &str| {
        sink_lines.lock().unwrap().push(line.to_owned());
    });
    (Arc::new(TargetRegistry::with_sink(sink)), lines)
}

#[test]
fn unknown_names_are_reported() {
    let registry = TargetRegistry::new();

    for err in [
        registry.reach("ghost").unwrap_err(),
        registry.wait("ghost", false).unwrap_err(),
        registry.wait("ghost", true).unwrap_err(),
        registry.clear("ghost").unwrap_err(),
        registry.is_reached("ghost").unwrap_err(),
    ] {
        assert_eq!(err.kind, ErrorKind::TargetNotFound);
    }
}

#[test]
fn reach_is_one_shot() {
    let (registry, lines) = recording_registry();
    registry.register("net.ready").unwrap();

    registry.reach("net.ready").unwrap();
    let err = registry.reach("net.ready").unwrap_err();
    assert_eq!(err.kind, ErrorKind::TargetAlreadyReached);

    assert_eq!(
        *lines.lock().unwrap(),
        vec!["[OK] Reached target: net.ready".to_owned()]
    );
}

#[test]
fn duplicate_register_keeps_existing_gate() {
    let registry = TargetRegistry::new();
    registry.register("net.ready").unwrap();
    registry.reach("net.ready").unwrap();

    let err = registry.register("net.ready").unwrap_err();
    assert_eq!(err.kind, ErrorKind::DuplicateTarget);
    assert!(registry.is_reached("net.ready").unwrap());
    assert_eq!(registry.len(), 1);
}

#[test]
fn non_blocking_wait_reflects_reach() {
    let registry = TargetRegistry::new();
    registry.register("net.ready").unwrap();

    assert!(!registry.wait("net.ready", false).unwrap());
    registry.reach("net.ready").unwrap();
    assert!(registry.wait("net.ready", false).unwrap());
    assert!(registry.wait("net.ready", true).unwrap());
}

#[test]
fn all_blocked_waiters_release_on_reach() {
    const WAITERS: usize = 8;

    let registry = Arc::new(TargetRegistry::new());
    registry.register("net.ready").unwrap();

    let released = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(WAITERS + 1));

    let handles: Vec<_> = (0..WAITERS)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let released = Arc::clone(&released);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let ok = registry.wait("net.ready", true).unwrap();
                released.fetch_add(1, Ordering::SeqCst);
                ok
            })
        })
        .collect();

    barrier.wait();
    thread::sleep(Duration::from_millis(50));
    assert_eq!(released.load(Ordering::SeqCst), 0);

    registry.reach("net.ready").unwrap();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
    assert_eq!(released.load(Ordering::SeqCst), WAITERS);
}

#[test]
fn waiting_does_not_block_other_targets() {
    let registry = Arc::new(TargetRegistry::new());
    registry.register("slow").unwrap();

    let waiter = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || registry.wait("slow", true))
    };
    thread::sleep(Duration::from_millis(20));

    registry.register("fast").unwrap();
    registry.reach("fast").unwrap();
    assert!(registry.wait("fast", false).unwrap());

    registry.reach("slow").unwrap();
    assert!(waiter.join().unwrap().unwrap());
}

#[test]
fn clear_allows_reregistration() {
    let registry = TargetRegistry::new();
    registry.register("link.up").unwrap();
    registry.reach("link.up").unwrap();

    registry.clear("link.up").unwrap();
    assert!(!registry.is_registered("link.up"));
    assert_eq!(
        registry.clear("link.up").unwrap_err().kind,
        ErrorKind::TargetNotFound
    );

    registry.register("link.up").unwrap();
    assert!(!registry.is_reached("link.up").unwrap());
}

#[test]
fn clear_releases_pending_waiters_with_not_found() {
    let registry = Arc::new(TargetRegistry::new());
    registry.register("link.up").unwrap();

    let waiter = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || registry.wait("link.up", true))
    };
    thread::sleep(Duration::from_millis(20));

    registry.clear("link.up").unwrap();
    let err = waiter.join().unwrap().unwrap_err();
    assert_eq!(err.kind, ErrorKind::TargetNotFound);
}

#[test]
fn wait_timeout_expires_without_reach() {
    let registry = TargetRegistry::new();
    registry.register("net.ready").unwrap();

    assert!(!registry
        .wait_timeout("net.ready", Duration::from_millis(10))
        .unwrap());

    registry.reach("net.ready").unwrap();
    assert!(registry
        .wait_timeout("net.ready", Duration::from_millis(10))
        .unwrap());
}

#[test]
fn names_are_sorted() {
    let registry = TargetRegistry::new();
    assert!(registry.is_empty());

    for name in ["net.ready", "adcs.ready", "link.up"] {
        registry.register(name).unwrap();
    }
    assert_eq!(registry.names(), vec!["adcs.ready", "link.up", "net.ready"]);
}
