//! [`MailSession`] over an `async-imap` session.

use core::fmt;
use core::future::Future;
use core::time::Duration;

use futures_util::TryStreamExt as _;

use crate::{
    Command, Error, FetchFailure, MailSession, MessageRef, MessageUid, RawMessage, SearchFilter,
    SearchResult, UidItem,
};

/// Bounds an IMAP transport has to satisfy.
pub trait ImapStream:
    tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + fmt::Debug
{
}

impl<S> ImapStream for S where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + fmt::Debug
{
}

/// An authenticated IMAP session with a selected mailbox.
pub struct ImapMailSession<S>
where
    S: ImapStream,
{
    /// The live session, `None` once logged out.
    session: Option<async_imap::Session<S>>,

    /// The selected mailbox.
    mailbox: String,

    /// Upper bound for every server round trip.
    operation_timeout: Duration,
}

impl<S> ImapMailSession<S>
where
    S: ImapStream,
{
    /// Wrap a session that already has `mailbox` selected.
    pub fn new(
        session: async_imap::Session<S>,
        mailbox: impl Into<String>,
        operation_timeout: Duration,
    ) -> Self {
        Self {
            session: Some(session),
            mailbox: mailbox.into(),
            operation_timeout,
        }
    }

    /// The selected mailbox.
    pub fn mailbox(&self) -> &str {
        &self.mailbox
    }

    /// Whether the session has been closed.
    pub fn is_closed(&self) -> bool {
        self.session.is_none()
    }

    /// The live session and the timeout to apply to the next command.
    pub(crate) fn live(&mut self) -> Result<(&mut async_imap::Session<S>, Duration), Error> {
        let timeout = self.operation_timeout;
        let session = self.session.as_mut().ok_or(Error::Closed)?;
        Ok((session, timeout))
    }
}

impl<S> fmt::Debug for ImapMailSession<S>
where
    S: ImapStream,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImapMailSession")
            .field("mailbox", &self.mailbox)
            .field("closed", &self.is_closed())
            .field("operation_timeout", &self.operation_timeout)
            .finish()
    }
}

/// A command exceeded the operation timeout.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TimedOut {
    /// The command that timed out.
    pub(crate) command: Command,

    /// The configured limit.
    pub(crate) after: Duration,
}

impl From<TimedOut> for Error {
    fn from(TimedOut { command, after }: TimedOut) -> Self {
        Self::Timeout { command, after }
    }
}

/// Run `fut` under the operation timeout.
pub(crate) async fn timed<F, T>(
    limit: Duration,
    command: Command,
    fut: F,
) -> Result<Result<T, async_imap::error::Error>, TimedOut>
where
    F: Future<Output = Result<T, async_imap::error::Error>>,
{
    tokio::time::timeout(limit, fut).await.map_err(|_| TimedOut {
        command,
        after: limit,
    })
}

impl<S> MailSession for ImapMailSession<S>
where
    S: ImapStream,
{
    async fn search(&mut self, filter: &SearchFilter) -> Result<SearchResult, Error> {
        let (session, limit) = self.live()?;
        let query = filter.to_query();

        let seqs = timed(limit, Command::Search, session.search(&query))
            .await?
            .map_err(|source| Error::Protocol {
                command: Command::Search,
                source,
            })?;

        let result = SearchResult::from_unordered(seqs);
        tracing::debug!(%query, matches = result.len(), "search finished");
        Ok(result)
    }

    async fn fetch_body(&mut self, message: MessageRef) -> Result<RawMessage, Error> {
        let (session, limit) = self.live()?;

        let fetches = timed(limit, Command::Fetch, async {
            let stream = session.fetch(message.to_string(), "RFC822").await?;
            stream.try_collect::<Vec<_>>().await
        })
        .await?
        .map_err(|source| Error::Fetch {
            message,
            reason: FetchFailure::Rejected(source),
        })?;

        let body = fetches
            .iter()
            .filter(|fetch| fetch.message == message.get())
            .find_map(|fetch| fetch.body())
            .ok_or(Error::Fetch {
                message,
                reason: FetchFailure::NoData,
            })?;

        if body.is_empty() {
            return Err(Error::Fetch {
                message,
                reason: FetchFailure::EmptyBody,
            });
        }

        Ok(RawMessage::new(body))
    }

    async fn fetch_uid(&mut self, message: MessageRef) -> Result<MessageUid, Error> {
        let (session, limit) = self.live()?;

        let fetches = timed(limit, Command::Fetch, async {
            let stream = session.fetch(message.to_string(), "(UID)").await?;
            stream.try_collect::<Vec<_>>().await
        })
        .await?
        .map_err(|source| Error::Fetch {
            message,
            reason: FetchFailure::Rejected(source),
        })?;

        let items = fetches.iter().map(|fetch| UidItem {
            message: fetch.message,
            uid: fetch.uid,
        });
        Ok(crate::parse_uid(message, items)?)
    }

    async fn copy_to_folder(&mut self, uid: MessageUid, folder: &str) -> Result<(), Error> {
        let (session, limit) = self.live()?;

        timed(limit, Command::Copy, session.uid_copy(uid.to_string(), folder))
            .await?
            .map_err(|source| Error::Protocol {
                command: Command::Copy,
                source,
            })
    }

    async fn mark_deleted(&mut self, uid: MessageUid) -> Result<(), Error> {
        let (session, limit) = self.live()?;

        timed(limit, Command::Store, async {
            let stream = session
                .uid_store(uid.to_string(), "+FLAGS (\\Deleted)")
                .await?;
            stream.try_collect::<Vec<_>>().await
        })
        .await?
        .map_err(|source| Error::Protocol {
            command: Command::Store,
            source,
        })?;

        Ok(())
    }

    async fn expunge(&mut self) -> Result<Vec<MessageRef>, Error> {
        let (session, limit) = self.live()?;

        let seqs = timed(limit, Command::Expunge, async {
            let stream = session.expunge().await?;
            stream.try_collect::<Vec<_>>().await
        })
        .await?
        .map_err(|source| Error::Protocol {
            command: Command::Expunge,
            source,
        })?;

        Ok(seqs.into_iter().filter_map(MessageRef::new).collect())
    }

    async fn close(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };

        match timed(self.operation_timeout, Command::Logout, session.logout()).await {
            Ok(Ok(())) => tracing::debug!(mailbox = %self.mailbox, "logged out"),
            Ok(Err(error)) => tracing::debug!(%error, "logout failed, dropping the connection"),
            Err(TimedOut { after, .. }) => {
                tracing::debug!(?after, "logout timed out, dropping the connection")
            }
        }
    }
}

#[cfg(test)]
mod tests;
