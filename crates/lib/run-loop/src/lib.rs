//! The long-lived poll loop.
//!
//! One session at a time: connect with bounded retries, run a cycle, sleep,
//! repeat. A cycle that finds the connection dead drops the session and
//! starts over from connecting. The shutdown future is checked before every
//! connect and before every message of a cycle, and interrupts the sleep and
//! connect backoff.

use core::future::Future;
use core::num::NonZeroU32;
use core::pin::pin;
use core::time::Duration;

use futures_util::FutureExt as _;
use futures_util::future::FusedFuture as _;
use mail_forward::Transport;
use mail_session::MailSession;
use reconcile::Cycle;

/// Loop timing.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pause between the end of one cycle and the start of the next.
    pub poll_interval: Duration,

    /// Backoff between connect attempts, restarted on every reconnect.
    pub connect_backoff: exp_backoff::State,

    /// Connect attempts before giving up.
    pub connect_attempts: NonZeroU32,
}

/// Errors that stop the loop.
#[derive(Debug, thiserror::Error)]
pub enum RunError<ConnectError> {
    /// No session could be established.
    #[error("connect: {0}")]
    Connect(#[source] retry::GaveUp<ConnectError>),
}

/// Parameters for [`run`].
pub struct Params<Connect, Retryable, Transport, Shutdown> {
    /// Loop timing.
    pub config: Config,

    /// The per-cycle work.
    pub cycle: Cycle,

    /// Outbound relay.
    pub transport: Transport,

    /// Opens a new session.
    pub connect: Connect,

    /// Whether a connect error is worth retrying.
    pub retryable: Retryable,

    /// Resolves when the loop should stop.
    pub shutdown: Shutdown,
}

/// Run cycles until `shutdown` resolves or connecting gives up.
///
/// A panic inside a cycle closes the session before it is resumed.
pub async fn run<Connect, ConnectFut, Session, ConnectError, Retryable, T, Shutdown>(
    params: Params<Connect, Retryable, T, Shutdown>,
) -> Result<(), RunError<ConnectError>>
where
    Connect: FnMut() -> ConnectFut,
    ConnectFut: Future<Output = Result<Session, ConnectError>>,
    Session: MailSession,
    ConnectError: std::error::Error,
    Retryable: FnMut(&ConnectError) -> bool,
    T: Transport,
    Shutdown: Future<Output = ()>,
{
    let Params {
        config,
        cycle,
        transport,
        mut connect,
        mut retryable,
        shutdown,
    } = params;
    let mut shutdown = pin!(shutdown.fuse());

    loop {
        let connecting = retry::run(retry::Params {
            work: &mut connect,
            retryable: &mut retryable,
            notifier: log_connect_event::<ConnectError>,
            sleep: tokio::time::sleep,
            backoff: config.connect_backoff.clone(),
            max_attempts: config.connect_attempts,
        });

        let mut session = tokio::select! {
            biased;
            () = &mut shutdown => {
                tracing::info!("shutdown requested while connecting");
                return Ok(());
            }
            result = connecting => result.map_err(RunError::Connect)?,
        };
        tracing::info!("connected");

        loop {
            let outcome = core::panic::AssertUnwindSafe(cycle.run_once(
                &mut session,
                &transport,
                &mut shutdown,
            ))
            .catch_unwind()
            .await;

            match outcome {
                Ok(Ok(_report)) => {}
                Ok(Err(error)) if error.is_connection_lost() => {
                    tracing::warn!(%error, "connection lost, reconnecting");
                    session.close().await;
                    break;
                }
                Ok(Err(error)) => {
                    tracing::error!(%error, "cycle failed");
                }
                Err(panic_payload) => {
                    tracing::error!("cycle panicked, closing session");
                    session.close().await;
                    std::panic::resume_unwind(panic_payload);
                }
            }

            if shutdown.is_terminated() {
                tracing::info!("shutting down after partial cycle");
                session.close().await;
                return Ok(());
            }

            tokio::select! {
                biased;
                () = &mut shutdown => {
                    tracing::info!("shutting down");
                    session.close().await;
                    return Ok(());
                }
                () = tokio::time::sleep(config.poll_interval) => {}
            }
        }
    }
}

/// Log connect attempts and failures.
fn log_connect_event<E: std::error::Error>(event: retry::RetryEvent<'_, E>) {
    match event {
        retry::RetryEvent::Attempt { number } => {
            tracing::debug!(attempt = number, "connecting");
        }
        retry::RetryEvent::Failed {
            error,
            attempt,
            next_retry_in: Some(delay),
        } => {
            tracing::warn!(%error, attempt, ?delay, "connect failed, retrying");
        }
        retry::RetryEvent::Failed {
            error,
            attempt,
            next_retry_in: None,
        } => {
            tracing::error!(%error, attempt, "connect failed, giving up");
        }
    }
}
