//! Integration tests for socket discovery and version negotiation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use vmhooks_manager::protocol::version::supported_version_names;
use vmhooks_manager::{HookError, HookName, ProtocolVersion};
use vmhooks_sdk::prelude::{InfoResult, NoopCallbacks};

use crate::helpers::{TestSidecar, info, scanner, socket_dir};

#[tokio::test]
async fn test_resolves_every_expected_sidecar() {
    let dir = socket_dir();
    let _a = TestSidecar::spawn(
        dir.path(),
        "a.sock",
        info("disk-cache", &[ProtocolVersion::V1Alpha1], &[(HookName::OnDefineDomain, 0)]),
        Arc::new(NoopCallbacks),
    )
    .await;
    let _b = TestSidecar::spawn(
        dir.path(),
        "b.sock",
        info("smbios", &[ProtocolVersion::V1Alpha2], &[(HookName::OnDefineDomain, 0)]),
        Arc::new(NoopCallbacks),
    )
    .await;

    let index = scanner(dir.path())
        .discover(2, Duration::from_secs(5))
        .await
        .expect("discover");

    assert_eq!(index.plugin_count(), 2);
    assert_eq!(index.handler_count(HookName::OnDefineDomain), 2);
}

#[tokio::test]
async fn test_late_listener_is_not_an_error() {
    let dir = socket_dir();
    let path = dir.path().to_path_buf();
    std::fs::write(path.join("late.sock"), b"").expect("placeholder");

    let late = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        TestSidecar::spawn(
            &path,
            "late.sock",
            info("late", &[ProtocolVersion::V1Alpha3], &[(HookName::OnDefineDomain, 1)]),
            Arc::new(NoopCallbacks),
        )
        .await
    });

    let index = scanner(dir.path())
        .discover(1, Duration::from_secs(5))
        .await
        .expect("discover after listener starts");

    assert_eq!(index.plugins()[0].name(), "late");
    drop(late.await.expect("join"));
}

#[tokio::test]
async fn test_times_out_with_fewer_sidecars() {
    let dir = socket_dir();
    let _only = TestSidecar::spawn(
        dir.path(),
        "only.sock",
        info("only", &[ProtocolVersion::V1Alpha1], &[(HookName::OnDefineDomain, 0)]),
        Arc::new(NoopCallbacks),
    )
    .await;

    let started = Instant::now();
    let err = scanner(dir.path())
        .discover(2, Duration::from_millis(300))
        .await
        .expect_err("timeout");

    assert!(matches!(
        err,
        HookError::CollectTimeout {
            expected: 2,
            resolved: 1,
            ..
        }
    ));
    assert!(started.elapsed() >= Duration::from_millis(300));
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_newest_common_version_selected() {
    let dir = socket_dir();
    let _mixed = TestSidecar::spawn(
        dir.path(),
        "mixed.sock",
        info(
            "mixed",
            &[ProtocolVersion::V1Alpha1, ProtocolVersion::V1Alpha2],
            &[(HookName::OnDefineDomain, 0)],
        ),
        Arc::new(NoopCallbacks),
    )
    .await;
    let _future = TestSidecar::spawn(
        dir.path(),
        "future.sock",
        InfoResult::new("future")
            .with_version_name("v2")
            .with_version(ProtocolVersion::V1Alpha3)
            .with_hook_point(HookName::OnDefineDomain, 0),
        Arc::new(NoopCallbacks),
    )
    .await;

    let plugins = scanner(dir.path())
        .resolve_all(2, Duration::from_secs(5))
        .await
        .expect("resolve");

    let version_of = |name: &str| {
        plugins
            .iter()
            .find(|p| p.name() == name)
            .map(|p| p.version())
            .expect("plugin")
    };
    assert_eq!(version_of("mixed"), ProtocolVersion::V1Alpha2);
    assert_eq!(version_of("future"), ProtocolVersion::V1Alpha3);
}

#[tokio::test]
async fn test_unsupported_version_fails_discovery() {
    let dir = socket_dir();
    let _alien = TestSidecar::spawn(
        dir.path(),
        "alien.sock",
        InfoResult::new("alien")
            .with_version_name("v2beta1")
            .with_hook_point(HookName::OnDefineDomain, 0),
        Arc::new(NoopCallbacks),
    )
    .await;

    let err = scanner(dir.path())
        .discover(1, Duration::from_secs(5))
        .await
        .expect_err("no common version");

    match err {
        HookError::UnsupportedVersion {
            plugin,
            advertised,
            supported,
            ..
        } => {
            assert_eq!(plugin, "alien");
            assert_eq!(advertised, ["v2beta1"]);
            assert_eq!(supported, supported_version_names());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_order_does_not_depend_on_readiness() {
    let dir = socket_dir();
    let _zeta = TestSidecar::spawn(
        dir.path(),
        "0-zeta.sock",
        info("zeta", &[ProtocolVersion::V1Alpha1], &[(HookName::OnDefineDomain, 7)]),
        Arc::new(NoopCallbacks),
    )
    .await;
    let _alpha = TestSidecar::spawn(
        dir.path(),
        "1-alpha.sock",
        info("alpha", &[ProtocolVersion::V1Alpha1], &[(HookName::OnDefineDomain, 7)]),
        Arc::new(NoopCallbacks),
    )
    .await;

    let index = scanner(dir.path())
        .discover(2, Duration::from_secs(5))
        .await
        .expect("discover");

    let order: Vec<_> = index
        .get(HookName::OnDefineDomain)
        .iter()
        .map(|e| e.plugin.name().to_string())
        .collect();
    assert_eq!(order, ["alpha", "zeta"]);
}
