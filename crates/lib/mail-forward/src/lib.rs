//! Relaying matched messages to the configured recipient.

mod rewrite;
mod smtp;
mod target;

#[cfg(feature = "testing")]
pub mod testing;

pub use rewrite::*;
pub use smtp::*;
pub use target::*;

use core::future::Future;

use mail_session::{MailSession, MessageRef};

/// Outbound submission of an already formed message.
pub trait Transport {
    /// Submission error.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Submit `message` verbatim with the given envelope.
    fn send(
        &self,
        envelope: &lettre::address::Envelope,
        message: &[u8],
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Errors returned while forwarding a message.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError<DeliveryError> {
    /// The message could not be fetched.
    #[error("fetch: {0}")]
    Fetch(#[source] mail_session::Error),

    /// The message has no `To` header to rewrite.
    #[error("rewrite: {0}")]
    Rewrite(#[from] RewriteError),

    /// The relay did not accept the message.
    #[error("delivery: {0}")]
    Delivery(#[source] DeliveryError),
}

impl<DeliveryError> ForwardError<DeliveryError> {
    /// Whether the mailbox session is unusable after this error.
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, Self::Fetch(error) if error.is_connection_lost())
    }
}

/// Fetch `message`, point its `To` header at the target recipient and relay it.
pub async fn forward<S, T>(
    session: &mut S,
    message: MessageRef,
    target: &ForwardTarget,
    transport: &T,
) -> Result<(), ForwardError<T::Error>>
where
    S: MailSession,
    T: Transport,
{
    let raw = session
        .fetch_body(message)
        .await
        .map_err(ForwardError::Fetch)?;

    let rewritten = rewrite_recipient(raw.as_bytes(), AsRef::<str>::as_ref(target.recipient()))?;

    transport
        .send(target.envelope(), &rewritten)
        .await
        .map_err(ForwardError::Delivery)?;

    tracing::info!(%message, recipient = %target.recipient(), "forwarded message");
    Ok(())
}
