//! Bounded retry harness for async work.

use core::future::Future;
use core::num::NonZeroU32;
use core::time::Duration;

/// Event sent to the notifier.
#[derive(Debug)]
pub enum RetryEvent<'a, E> {
    /// The work is about to be invoked.
    Attempt {
        /// One-based attempt number.
        number: u32,
    },

    /// The work returned an error.
    Failed {
        /// The error that was returned by the work future.
        error: &'a E,

        /// One-based number of the failed attempt.
        attempt: u32,

        /// The time to wait before the next attempt, `None` if this was the last one.
        next_retry_in: Option<Duration>,
    },
}

/// The work did not succeed within the allowed number of attempts.
#[derive(Debug, thiserror::Error)]
#[error("gave up after {attempts} attempt(s): {error}")]
pub struct GaveUp<E> {
    /// How many attempts were made.
    pub attempts: u32,

    /// The error returned by the last attempt.
    #[source]
    pub error: E,
}

/// Parameters for `run`.
pub struct Params<Work, Retryable, Notifier, Sleep> {
    /// The work to run.
    pub work: Work,

    /// Decides whether an error is worth another attempt.
    pub retryable: Retryable,

    /// Notifier for events.
    pub notifier: Notifier,

    /// Sleep timer.
    pub sleep: Sleep,

    /// The exponential backoff configuration for the retries.
    pub backoff: exp_backoff::State,

    /// Upper bound on the number of invocations of the work.
    pub max_attempts: NonZeroU32,
}

/// Run the work until it succeeds, fails with a non-retryable error or the attempts run out.
pub async fn run<Work, WorkFut, Retryable, Notifier, Sleep, SleepFut, Value, Error>(
    mut params: Params<Work, Retryable, Notifier, Sleep>,
) -> Result<Value, GaveUp<Error>>
where
    Work: FnMut() -> WorkFut,
    WorkFut: Future<Output = Result<Value, Error>>,
    Retryable: FnMut(&Error) -> bool,
    Notifier: FnMut(RetryEvent<'_, Error>),
    Sleep: FnMut(Duration) -> SleepFut,
    SleepFut: Future<Output = ()>,
{
    let mut attempt = 1;
    loop {
        (params.notifier)(RetryEvent::Attempt { number: attempt });

        let error = match (params.work)().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        let next_retry_in = (attempt < params.max_attempts.get() && (params.retryable)(&error))
            .then(|| params.backoff.advance());

        (params.notifier)(RetryEvent::Failed {
            error: &error,
            attempt,
            next_retry_in,
        });

        let Some(delay) = next_retry_in else {
            return Err(GaveUp {
                attempts: attempt,
                error,
            });
        };

        (params.sleep)(delay).await;
        attempt += 1;
    }
}
