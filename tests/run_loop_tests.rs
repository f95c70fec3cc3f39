//! # Run Loop Tests
//!
//! Scheduling and shutdown of the fixed-interval loop, plus startup validation.

mod common;

use common::*;
use proxy_kubeconfig_generator::prelude::*;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_cancelled_before_start_runs_one_pass() {
    let cluster = cluster();
    let shutdown = CancellationToken::new();
    shutdown.cancel();

    tokio::time::timeout(Duration::from_secs(5), run(args(config(), &cluster), shutdown))
        .await
        .expect("run loop stops once cancelled");

    assert_eq!(cluster.creates(), 1);
    assert_eq!(cluster.secret_reads(PROXY_NAMESPACE, PROXY_TLS_SECRET), 1);
}

#[tokio::test]
async fn test_loop_repeats_until_cancelled() {
    let cluster = cluster();
    let shutdown = CancellationToken::new();

    let handle = tokio::spawn(run(args(config(), &cluster), shutdown.clone()));
    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown.cancel();

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("run loop stops once cancelled")
        .unwrap();

    assert!(cluster.secret_reads(PROXY_NAMESPACE, PROXY_TLS_SECRET) >= 2);
    assert_eq!(cluster.writes(), 1);
}

#[tokio::test]
async fn test_errors_do_not_stop_the_loop() {
    let cluster = cluster();
    cluster.fail_secret_reads(PROXY_NAMESPACE, PROXY_TLS_SECRET);
    let shutdown = CancellationToken::new();

    let handle = tokio::spawn(run(args(config(), &cluster), shutdown.clone()));
    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("run loop stops once cancelled")
        .unwrap();

    assert!(cluster.secret_reads(PROXY_NAMESPACE, PROXY_TLS_SECRET) >= 2);
    assert_eq!(cluster.writes(), 0);
}

#[test]
fn test_required_fields_fail_validation() {
    let missing_service_account = GeneratorConfig {
        service_account_name: String::new(),
        ..config()
    };
    assert_eq!(
        missing_service_account.validate(),
        Err(ConfigError::Missing("service account name"))
    );

    let missing_server = GeneratorConfig {
        server: String::new(),
        ..config()
    };
    assert_eq!(
        missing_server.validate(),
        Err(ConfigError::Missing("server url"))
    );

    let missing_tls_secret = GeneratorConfig {
        server_tls_secret_name: String::new(),
        ..config()
    };
    assert_eq!(
        missing_tls_secret.validate(),
        Err(ConfigError::Missing("server TLS secret name"))
    );

    assert_eq!(config().validate(), Ok(()));
}
