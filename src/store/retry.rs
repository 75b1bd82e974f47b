//! Retrying batch commits on transient store errors.

use crate::config::RetryConfig;
use crate::errors::StoreError;
use std::time::Instant;

/// Run `commit` until it succeeds, fails permanently, or the retry budget runs out.
///
/// Only errors for which [`StoreError::is_retryable`] holds are retried; the
/// batch is atomic, so re-sending it cannot double-apply anything.
pub fn commit_with_retry<F>(retry: &RetryConfig, label: &str, mut commit: F) -> Result<(), StoreError>
where
    F: FnMut() -> Result<(), StoreError>,
{
    let started = Instant::now();
    let mut retries = 0;

    loop {
        match commit() {
            Ok(()) => return Ok(()),
            Err(err) if err.is_retryable() && retry.should_retry(retries, started.elapsed()) => {
                retries += 1;
                let delay = retry.delay_for_attempt(retries);
                log::warn!(
                    "{label}: transient failure ({err}); retry {retries}/{} in {:?}",
                    retry.max_retries,
                    delay
                );
                std::thread::sleep(delay);
            }
            Err(err) => return Err(err),
        }
    }
}
