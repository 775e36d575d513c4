//! Integration tests for the definition and first-boot chains.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use serde_json::json;
use vmhooks_core::config::HooksConfig;
use vmhooks_manager::protocol::error_codes;
use vmhooks_manager::{CloudInitData, DataSource, HookError, HookManager, HookName, ProtocolVersion};

use crate::helpers::{CloudMode, Scripted, TestSidecar, info, scanner, socket_dir};

const DOMAIN: &[u8] = b"<domain type='kvm'></domain>";

async fn manager(dir: &std::path::Path, expected: usize) -> HookManager {
    let index = scanner(dir)
        .discover(expected, Duration::from_secs(5))
        .await
        .expect("discover");
    HookManager::new(index)
}

#[tokio::test]
async fn test_single_plugin_called_exactly_once() {
    let dir = socket_dir();
    let hook = Scripted::appending("<!-- hook1 -->");
    let calls = hook.counter();
    let _sidecar = TestSidecar::spawn(
        dir.path(),
        "hook1.sock",
        info("hook1", &[ProtocolVersion::V1Alpha1], &[(HookName::OnDefineDomain, 0)]),
        Arc::new(hook),
    )
    .await;

    let manager = manager(dir.path(), 1).await;
    let result = manager
        .on_define_domain(DOMAIN, &json!({"metadata": {"name": "vm"}}))
        .await
        .expect("chain");

    assert_eq!(result, b"<domain type='kvm'></domain><!-- hook1 -->");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_first_failure_aborts_chain() {
    let dir = socket_dir();
    let first = Scripted::appending("+first");
    let second = Scripted::failing();
    let third = Scripted::appending("+third");
    let (first_calls, second_calls, third_calls) = (first.counter(), second.counter(), third.counter());

    let _s1 = TestSidecar::spawn(
        dir.path(),
        "first.sock",
        info("first", &[ProtocolVersion::V1Alpha3], &[(HookName::OnDefineDomain, 30)]),
        Arc::new(first),
    )
    .await;
    let _s2 = TestSidecar::spawn(
        dir.path(),
        "second.sock",
        info("second", &[ProtocolVersion::V1Alpha3], &[(HookName::OnDefineDomain, 20)]),
        Arc::new(second),
    )
    .await;
    let _s3 = TestSidecar::spawn(
        dir.path(),
        "third.sock",
        info("third", &[ProtocolVersion::V1Alpha3], &[(HookName::OnDefineDomain, 10)]),
        Arc::new(third),
    )
    .await;

    let manager = manager(dir.path(), 3).await;
    let err = manager
        .on_define_domain(DOMAIN, &json!({}))
        .await
        .expect_err("second link fails");

    match err {
        HookError::Rpc { code, message, .. } => {
            assert_eq!(code, error_codes::CALLBACK_FAILED);
            assert!(message.contains("definition refused"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert_eq!(second_calls.load(Ordering::SeqCst), 1);
    assert_eq!(third_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_no_sidecars_is_identity() {
    let config = HooksConfig {
        socket_dir: "/nonexistent/hooks".into(),
        expected_sidecars: 0,
        ..HooksConfig::default()
    };
    let manager = HookManager::collect(&config).await.expect("empty");

    let result = manager.on_define_domain(DOMAIN, &json!({})).await.expect("identity");
    assert_eq!(result, DOMAIN);

    let data = CloudInitData::new(DataSource::ConfigDrive).with_user_data("#cloud-config\n");
    let out = manager
        .pre_cloud_init_iso(data.clone(), &json!({}))
        .await
        .expect("identity");
    assert_eq!(out, data);
}

#[tokio::test]
async fn test_priority_then_name_ordering() {
    let dir = socket_dir();
    let plugins = [("bravo", 5, "+b"), ("alpha", 5, "+a"), ("charlie", 10, "+c")];
    let mut sidecars = Vec::new();
    for (name, priority, suffix) in plugins {
        sidecars.push(
            TestSidecar::spawn(
                dir.path(),
                &format!("{name}.sock"),
                info(name, &[ProtocolVersion::V1Alpha2], &[(HookName::OnDefineDomain, priority)]),
                Arc::new(Scripted::appending(suffix)),
            )
            .await,
        );
    }

    let manager = manager(dir.path(), 3).await;
    let result = manager.on_define_domain(b"<d>", &json!({})).await.expect("chain");
    assert_eq!(result, b"<d>+c+a+b");
}

#[tokio::test]
async fn test_old_revision_skipped_for_first_boot_data() {
    let dir = socket_dir();
    let old = Scripted::cloud(CloudMode::AppendUserData("never".into()));
    let old_calls = old.counter();
    let modern = Scripted::cloud(CloudMode::AppendUserData("hostname: modern\n".into()));
    let modern_calls = modern.counter();

    let _old = TestSidecar::spawn(
        dir.path(),
        "old.sock",
        info(
            "old",
            &[ProtocolVersion::V1Alpha1],
            &[(HookName::PreCloudInitIso, 100), (HookName::OnDefineDomain, 0)],
        ),
        Arc::new(old),
    )
    .await;
    let _modern = TestSidecar::spawn(
        dir.path(),
        "modern.sock",
        info("modern", &[ProtocolVersion::V1Alpha2], &[(HookName::PreCloudInitIso, 0)]),
        Arc::new(modern),
    )
    .await;

    let manager = manager(dir.path(), 2).await;
    assert_eq!(manager.index().handler_count(HookName::PreCloudInitIso), 1);

    let data = CloudInitData::new(DataSource::NoCloud).with_user_data("#cloud-config\n");
    let out = manager.pre_cloud_init_iso(data, &json!({})).await.expect("chain");

    assert_eq!(out.user_data, "#cloud-config\nhostname: modern\n");
    assert_eq!(old_calls.load(Ordering::SeqCst), 0);
    assert_eq!(modern_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_legacy_only_plugin_still_yields_user_data() {
    let dir = socket_dir();
    let _legacy = TestSidecar::spawn(
        dir.path(),
        "legacy.sock",
        info("legacy", &[ProtocolVersion::V1Alpha2], &[(HookName::PreCloudInitIso, 0)]),
        Arc::new(Scripted::cloud(CloudMode::LegacyBase64(
            "I2Nsb3VkLWNvbmZpZwpob3N0bmFtZTogbGVnYWN5Cg==".into(),
        ))),
    )
    .await;

    let manager = manager(dir.path(), 1).await;
    let mut data = CloudInitData::new(DataSource::ConfigDrive).with_user_data("#cloud-config\n");
    data.config_drive_meta_data = Some(json!({"instance_id": "vm-1"}));
    data.volume_name = "cloudinitdisk".into();

    let out = manager
        .pre_cloud_init_iso(data.clone(), &json!({}))
        .await
        .expect("fallback");

    assert_eq!(out.user_data, "#cloud-config\nhostname: legacy\n");
    assert_eq!(out.data_source, DataSource::ConfigDrive);
    assert_eq!(out.config_drive_meta_data, data.config_drive_meta_data);
    assert_eq!(out.volume_name, "cloudinitdisk");
}

#[tokio::test]
async fn test_pass_through_plugin_keeps_data() {
    let dir = socket_dir();
    let _echo = TestSidecar::spawn(
        dir.path(),
        "echo.sock",
        info("echo", &[ProtocolVersion::V1Alpha3], &[(HookName::PreCloudInitIso, 0)]),
        Arc::new(Scripted::default()),
    )
    .await;

    let manager = manager(dir.path(), 1).await;
    let data = CloudInitData::new(DataSource::NoCloud)
        .with_user_data("#cloud-config\n")
        .with_network_data("version: 2\n");
    let out = manager
        .pre_cloud_init_iso(data.clone(), &json!({}))
        .await
        .expect("chain");
    assert_eq!(out, data);
}
