//! Failure-isolation tests for the per-domain monitors.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;

#[path = "../helpers/mod.rs"]
mod helpers;
use helpers::{test_config, FakeProber, RecordingSink};

use certmon::app::App;

/// A persistently failing domain must never alter or block the record of a
/// healthy domain, nor bring the monitors down.
#[tokio::test]
async fn test_probe_failure_is_isolated_per_domain() {
    let expiration = "2030-01-01T00:00:00Z".parse().unwrap();
    let prober = Arc::new(FakeProber::new());
    prober.fail_with("down.example", "connection refused");
    prober.succeed_with("up.example", expiration);

    let sink = Arc::new(RecordingSink::new());
    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let app = App::builder(test_config(&["down.example", "up.example"]))
        .prober_override(prober.clone())
        .sink_override(sink.clone())
        .build(shutdown_rx)
        .await
        .unwrap();
    let table = app.table();
    let app_handle = tokio::spawn(app.run());

    // Wait until both domains have a recorded outcome.
    sink.wait_for_domain("up.example", Duration::from_secs(5)).await;
    timeout(Duration::from_secs(5), async {
        loop {
            let snapshot = table.snapshot();
            let down = snapshot.iter().find(|(d, _)| d == "down.example").unwrap();
            if down.1.last_error.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("failure never recorded");

    let snapshot = table.snapshot();
    let down = snapshot.iter().find(|(d, _)| d == "down.example").unwrap();
    let up = snapshot.iter().find(|(d, _)| d == "up.example").unwrap();

    // The failing domain keeps its "unknown" expiration and records the
    // error; the healthy domain is unaffected.
    assert_eq!(down.1.expiration, None);
    assert!(down.1.last_error.as_deref().unwrap().contains("connection refused"));
    assert_eq!(up.1.expiration, Some(expiration));
    assert_eq!(up.1.last_error, None);

    shutdown_tx.send(()).unwrap();
    timeout(Duration::from_secs(5), app_handle)
        .await
        .expect("app did not shut down in time")
        .unwrap()
        .unwrap();
}

/// A failed probe leaves the table entry exactly as it was before the call.
#[tokio::test]
async fn test_failed_probe_retains_previous_value() {
    let expiration = "2027-03-01T00:00:00Z".parse().unwrap();
    let prober = Arc::new(FakeProber::new());
    prober.succeed_with("flap.example", expiration);

    let sink = Arc::new(RecordingSink::new());
    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let app = App::builder(test_config(&["flap.example"]))
        .prober_override(prober.clone())
        .sink_override(sink.clone())
        .build(shutdown_rx)
        .await
        .unwrap();
    let table = app.table();
    let app_handle = tokio::spawn(app.run());

    sink.wait_for_domain("flap.example", Duration::from_secs(5)).await;

    // Start failing and wait until the failure lands in the table.
    prober.fail_with("flap.example", "handshake failed");
    timeout(Duration::from_secs(5), async {
        while table.snapshot()[0].1.last_error.is_none() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("failure never recorded");

    let snapshot = table.snapshot();
    let (_, status) = snapshot.iter().find(|(d, _)| d == "flap.example").unwrap();
    assert_eq!(status.expiration, Some(expiration));
    assert!(status.last_error.is_some());

    shutdown_tx.send(()).unwrap();
    timeout(Duration::from_secs(5), app_handle)
        .await
        .expect("app did not shut down in time")
        .unwrap()
        .unwrap();
}
