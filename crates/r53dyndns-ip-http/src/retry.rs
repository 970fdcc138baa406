//! Result-driven retry loop for discovery attempts
//!
//! Each attempt returns a plain `Result`; the driver inspects the
//! discriminant instead of catching anything. A parse failure on an
//! otherwise-successful fetch is retried like any other attempt failure,
//! since a transiently garbled response body should not abort the whole
//! pass. After the budget is spent, the last attempt's error is surfaced
//! as the source of `LookupFailed`.

use r53dyndns_core::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Pause between attempts
pub(crate) const RETRY_PAUSE: Duration = Duration::from_secs(1);

/// Run `op` up to `max_attempts` times, pausing `pause` between attempts
pub(crate) async fn run<T, F, Fut>(max_attempts: u32, pause: Duration, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last = None;

    for attempt in 1..=max_attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                debug!("Attempt {}/{} failed: {}", attempt, max_attempts, err);
                last = Some(err);
                if attempt < max_attempts {
                    tokio::time::sleep(pause).await;
                }
            }
        }
    }

    let source = last.unwrap_or_else(|| Error::invalid_input("retry budget of zero attempts"));
    Err(Error::LookupFailed {
        attempts: max_attempts,
        source: Box::new(source),
    })
}
