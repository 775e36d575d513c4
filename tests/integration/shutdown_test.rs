//! Integration tests for the shutdown fan-out.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use vmhooks_manager::{HookManager, HookName, ProtocolVersion};

use crate::helpers::{Scripted, TestSidecar, info, scanner, socket_dir};

#[tokio::test]
async fn test_shutdown_stops_sidecar_once() {
    let dir = socket_dir();
    let hook = Scripted::default();
    let calls = hook.counter();
    let sidecar = TestSidecar::spawn(
        dir.path(),
        "stoppable.sock",
        info("stoppable", &[ProtocolVersion::V1Alpha3], &[(HookName::Shutdown, 0)]),
        Arc::new(hook),
    )
    .await;
    let socket = sidecar.socket.clone();

    let index = scanner(dir.path())
        .discover(1, Duration::from_secs(5))
        .await
        .expect("discover");
    let manager = HookManager::new(index);

    manager.shutdown().await.expect("shutdown");
    sidecar
        .finished(Duration::from_secs(5))
        .await
        .expect("clean exit");
    assert!(!socket.exists());

    manager.shutdown().await.expect("second call is a no-op");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_shutdown_skips_revisions_without_it() {
    let dir = socket_dir();
    let hook = Scripted::default();
    let calls = hook.counter();
    let sidecar = TestSidecar::spawn(
        dir.path(),
        "older.sock",
        info("older", &[ProtocolVersion::V1Alpha2], &[(HookName::Shutdown, 0)]),
        Arc::new(hook),
    )
    .await;

    let index = scanner(dir.path())
        .discover(1, Duration::from_secs(5))
        .await
        .expect("discover");
    let manager = HookManager::new(index);

    manager.shutdown().await.expect("nothing to notify");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(sidecar.is_running());
}
