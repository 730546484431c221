pub mod builders;
pub mod fake_tasks;

use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Route runner and task logs into the test harness's captured output.
///
/// Safe to call from every test; only the first call installs the
/// subscriber. `RUST_LOG` picks the filter, `info` otherwise. Span fields
/// (`task=...`) show which fake task logged a line.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Fail the test if a run hangs, e.g. a task that never sees cancellation.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("deployment run did not finish within 5 seconds")
}
