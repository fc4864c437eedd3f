//! Waiting for remotely provisioned resources to become ready.
//!
//! Hosted agents, action groups and aliases are created asynchronously
//! by the service and report a status string that moves through states
//! like `CREATING` → `NOT_PREPARED` → `PREPARED`. [`await_condition`]
//! polls such a status until it reaches a target, with a deadline
//! instead of spinning forever.

use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// Why [`await_condition`] gave up.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError<E> {
    /// The target status was not reached before the deadline.
    #[error("timed out after {waited:?} waiting for {target}; last status was {last_status}")]
    Timeout {
        /// Status being waited for.
        target: String,
        /// Most recent status observed.
        last_status: String,
        /// How long we waited.
        waited: Duration,
    },

    /// Polling the status failed.
    #[error("status poll failed: {0}")]
    Poll(#[source] E),
}

/// Polls `poll` every `interval` until it returns `target`.
///
/// Returns `Ok(())` as soon as the status equals `target`. The first
/// poll happens immediately. A poll error ends the wait at once and is
/// returned as [`ProvisionError::Poll`]; once `timeout` has elapsed
/// without a match the result is [`ProvisionError::Timeout`].
///
/// ```rust
/// use std::time::Duration;
/// use tooluse::provision::await_condition;
///
/// # async fn example() {
/// let mut polls = 0;
/// let result = await_condition(
///     || {
///         polls += 1;
///         let status = if polls < 3 { "CREATING" } else { "PREPARED" };
///         async move { Ok::<_, std::io::Error>(status) }
///     },
///     &"PREPARED",
///     Duration::from_millis(10),
///     Duration::from_secs(1),
/// )
/// .await;
/// assert!(result.is_ok());
/// # }
/// ```
pub async fn await_condition<F, Fut, S, E>(
    mut poll: F,
    target: &S,
    interval: Duration,
    timeout: Duration,
) -> Result<(), ProvisionError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<S, E>>,
    S: PartialEq + Debug,
{
    let started = Instant::now();
    let deadline = started + timeout;

    loop {
        let status = poll().await.map_err(ProvisionError::Poll)?;
        if status == *target {
            debug!(?status, waited = ?started.elapsed(), "target status reached");
            return Ok(());
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(ProvisionError::Timeout {
                target: format!("{target:?}"),
                last_status: format!("{status:?}"),
                waited: now - started,
            });
        }
        debug!(?status, ?target, "waiting for status");
        tokio::time::sleep(interval.min(deadline - now)).await;
    }
}
