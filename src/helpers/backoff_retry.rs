use std::fmt::Display;
use std::time::Duration;

use backoff::{retry_notify, Error, ExponentialBackoffBuilder};

use crate::constants::defaults;

/// Retry transient failures with exponential backoff, capped so that a dead
/// endpoint cannot stall a poll cycle indefinitely.
pub fn backoff_retry<F, T, E>(fn_to_try: F) -> Result<T, Error<E>>
where
    F: FnMut() -> Result<T, Error<E>>,
    E: Display,
{
    let notify = |err, dur: Duration| {
        log::warn!("Temporary error after {:.1}s: {}", dur.as_secs_f32(), err);
    };

    let backoff = ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(defaults::HTTP_RETRY_MAX_ELAPSED))
        .build();

    retry_notify(backoff, fn_to_try, notify)
}
