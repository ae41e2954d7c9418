//! Concurrency tests for the shared expiration table.

use certmon::table::ExpirationTable;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Arc;

/// Concurrent writers on distinct keys must not lose updates, and a snapshot
/// must never observe a value that straddles two probe results.
#[tokio::test]
async fn test_concurrent_writers_one_final_value_per_domain() {
    const DOMAINS: usize = 16;
    const WRITES_PER_DOMAIN: usize = 100;

    let domains: Vec<String> = (0..DOMAINS).map(|i| format!("d{i}.example")).collect();
    let table = Arc::new(ExpirationTable::new(domains.iter().cloned()));
    let base: DateTime<Utc> = "2027-01-01T00:00:00Z".parse().unwrap();

    // One writer task per key, mirroring the one-monitor-per-domain model.
    let mut writers = Vec::new();
    for (i, domain) in domains.iter().enumerate() {
        let table = table.clone();
        let domain = domain.clone();
        writers.push(tokio::spawn(async move {
            for step in 0..WRITES_PER_DOMAIN {
                let expiration = base + ChronoDuration::days((i * WRITES_PER_DOMAIN + step) as i64);
                table.record_success(&domain, expiration, Utc::now());
                if step % 10 == 0 {
                    tokio::task::yield_now().await;
                }
            }
        }));
    }

    // Concurrent readers: every snapshot must be internally consistent, i.e.
    // every observed expiration is one of the values its writer produced.
    let reader = {
        let table = table.clone();
        tokio::spawn(async move {
            for _ in 0..50 {
                for (domain, status) in table.snapshot() {
                    if let Some(expiration) = status.expiration {
                        let i: usize = domain[1..domain.find('.').unwrap()].parse().unwrap();
                        let offset = (expiration - base).num_days() as usize;
                        assert!(
                            (i * WRITES_PER_DOMAIN..(i + 1) * WRITES_PER_DOMAIN).contains(&offset),
                            "snapshot saw a value not written for {domain}"
                        );
                    }
                }
                tokio::task::yield_now().await;
            }
        })
    };

    for writer in writers {
        writer.await.unwrap();
    }
    reader.await.unwrap();

    // After all writers finish, each domain holds exactly its final value.
    let snapshot = table.snapshot();
    assert_eq!(snapshot.len(), DOMAINS);
    for (domain, status) in snapshot {
        let i: usize = domain[1..domain.find('.').unwrap()].parse().unwrap();
        let expected = base + ChronoDuration::days((i * WRITES_PER_DOMAIN + WRITES_PER_DOMAIN - 1) as i64);
        assert_eq!(status.expiration, Some(expected), "lost update for {domain}");
    }
}
