//! Status page rendering
//!
//! Pure functions from a table snapshot to the report served at `/`. Sorting
//! puts the soonest-to-expire certificates first, which is the operational
//! point of the page; domains that have never been probed successfully sort
//! before everything else and render an explicit "unknown" marker.

use chrono::SecondsFormat;

use crate::core::DomainStatus;

/// Sorts a snapshot ascending by expiration, ties broken by domain name.
///
/// "Unknown" entries (no successful probe yet) compare equal to each other
/// and sort before any known expiration, which follows from `Option`
/// ordering (`None < Some`). The result is deterministic regardless of the
/// snapshot's iteration order.
pub fn sort_snapshot(mut snapshot: Vec<(String, DomainStatus)>) -> Vec<(String, DomainStatus)> {
    snapshot.sort_by(|a, b| {
        a.1.expiration
            .cmp(&b.1.expiration)
            .then_with(|| a.0.cmp(&b.0))
    });
    snapshot
}

fn format_expiration(status: &DomainStatus) -> String {
    match status.expiration {
        Some(expiration) => expiration.to_rfc3339_opts(SecondsFormat::Secs, true),
        None => "unknown".to_string(),
    }
}

fn format_health(status: &DomainStatus) -> String {
    match (&status.last_error, status.last_success) {
        (Some(error), _) => format!("error: {}", html_escape(error)),
        (None, Some(at)) => format!("ok at {}", at.to_rfc3339_opts(SecondsFormat::Secs, true)),
        (None, None) => "not yet probed".to_string(),
    }
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Renders the HTML status page from an already-sorted snapshot.
///
/// Pure function of its input: every configured domain appears exactly once,
/// in the order given.
pub fn render_page(snapshot: &[(String, DomainStatus)]) -> String {
    let mut page = String::from(
        "<html>\n<head>\n<style>\nth { text-align: left; }\ntd { padding-right: 1em; }\n</style>\n</head>\n\
         <body>\n<h1>certmon: TLS certificate expiration</h1>\n\
         <p>This job periodically checks the expiration dates of TLS certificates\n\
         and exposes them as <a href=\"/metrics\">metrics</a> for Prometheus.</p>\n\
         <table>\n<tr><th>Domain</th><th>Certificate expires</th><th>Last probe</th></tr>\n",
    );
    for (domain, status) in snapshot {
        page.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            html_escape(domain),
            format_expiration(status),
            format_health(status),
        ));
    }
    page.push_str("</table>\n</body>\n</html>\n");
    page
}
