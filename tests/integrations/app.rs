//! End-to-end test of the HTTP surface: status page and Prometheus metrics.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;

#[path = "../helpers/mod.rs"]
mod helpers;
use helpers::{test_config, FakeProber};

use certmon::app::App;

/// Boots the full app with a scripted prober, then checks that the status
/// page lists domains soonest-to-expire first (unknown on top) and that the
/// expiration gauge shows up on `/metrics`.
///
/// This is the only test in the suite that installs the global Prometheus
/// recorder, which can only happen once per process.
#[tokio::test]
async fn test_status_page_and_metrics_endpoint() {
    let prober = Arc::new(FakeProber::new());
    prober.succeed_with("late.example", "2030-01-01T00:00:00Z".parse().unwrap());
    prober.succeed_with("soon.example", "2025-06-01T00:00:00Z".parse().unwrap());
    prober.fail_with("dark.example", "no route to host");

    let mut config = test_config(&["late.example", "soon.example", "dark.example"]);
    config.metrics.enabled = true;

    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let app = App::builder(config)
        .prober_override(prober)
        .build(shutdown_rx)
        .await
        .unwrap();
    let addr = app.local_addr();
    let app_handle = tokio::spawn(app.run());

    let client = reqwest::Client::new();
    let status_url = format!("http://{addr}/");
    let metrics_url = format!("http://{addr}/metrics");

    // Poll until both successful probes are visible on the page.
    let page = timeout(Duration::from_secs(5), async {
        loop {
            if let Ok(resp) = client.get(&status_url).send().await {
                let body = resp.text().await.unwrap_or_default();
                if body.contains("2030-01-01T00:00:00Z") && body.contains("2025-06-01T00:00:00Z") {
                    return body;
                }
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    })
    .await
    .expect("status page never showed both expirations");

    // Soonest-to-expire first; the never-probed domain sorts before both.
    let dark = page.find("dark.example").unwrap();
    let soon = page.find("soon.example").unwrap();
    let late = page.find("late.example").unwrap();
    assert!(dark < soon && soon < late, "unexpected row order");
    assert!(page.contains("unknown"));

    let metrics_body = client
        .get(&metrics_url)
        .send()
        .await
        .expect("metrics endpoint unreachable")
        .text()
        .await
        .unwrap();
    assert!(metrics_body.contains("tls_certificate_expiration_timestamp_seconds"));
    assert!(metrics_body.contains("domain=\"soon.example\""));
    assert!(metrics_body.contains("probes_total"));

    shutdown_tx.send(()).unwrap();
    timeout(Duration::from_secs(5), app_handle)
        .await
        .expect("app did not shut down in time")
        .unwrap()
        .unwrap();
}
