//! Establishing a ready-to-use session.

use core::time::Duration;

use futures_util::TryStreamExt as _;

use crate::imap::{TimedOut, timed};
use crate::{Command, ImapMailSession, ImapStream};

/// Everything needed to open the polled mailbox.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectParams<'a> {
    /// Where and how to connect.
    pub server: imap_connect::Params<'a>,

    /// Session setup after the connection is up.
    pub open: OpenParams<'a>,
}

/// Session setup on an already connected client.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenParams<'a> {
    /// Username for IMAP authentication.
    pub username: &'a str,

    /// Password for IMAP authentication.
    pub password: &'a str,

    /// The mailbox to select.
    pub mailbox: &'a str,

    /// The folder processed messages are copied to; only checked for existence.
    pub archive_mailbox: &'a str,

    /// Upper bound for every server round trip.
    pub operation_timeout: Duration,
}

/// Errors returned while establishing a session.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// Network, TLS or greeting failure.
    #[error("connect: {0}")]
    Connectivity(#[source] imap_connect::Error),

    /// The server rejected the credentials.
    #[error("login: {0}")]
    Auth(#[source] async_imap::error::Error),

    /// Mailbox listing or selection failed.
    #[error("{command} failed: {source}")]
    Protocol {
        /// The failed command.
        command: Command,

        /// Underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// The server did not answer in time.
    #[error("{command} timed out after {after:?}")]
    Timeout {
        /// The command that timed out.
        command: Command,

        /// The configured limit.
        after: Duration,
    },
}

impl ConnectError {
    /// Whether the credentials were rejected; retrying will not help.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::Auth(async_imap::error::Error::No(_) | async_imap::error::Error::Bad(_))
        )
    }
}

impl From<TimedOut> for ConnectError {
    fn from(TimedOut { command, after }: TimedOut) -> Self {
        Self::Timeout { command, after }
    }
}

/// Connect, authenticate and select the mailbox.
pub async fn connect(
    params: ConnectParams<'_>,
) -> Result<ImapMailSession<imap_connect::Stream>, ConnectError> {
    let ConnectParams { server, open } = params;
    let limit = open.operation_timeout;

    let client = tokio::time::timeout(limit, imap_connect::connect(server))
        .await
        .map_err(|_| TimedOut {
            command: Command::Connect,
            after: limit,
        })?
        .map_err(ConnectError::Connectivity)?;

    self::open(client, open).await
}

/// Authenticate on a connected client and select the mailbox.
pub async fn open<S>(
    client: async_imap::Client<S>,
    params: OpenParams<'_>,
) -> Result<ImapMailSession<S>, ConnectError>
where
    S: ImapStream,
{
    let OpenParams {
        username,
        password,
        mailbox,
        archive_mailbox,
        operation_timeout: limit,
    } = params;

    let mut session = tokio::time::timeout(limit, client.login(username, password))
        .await
        .map_err(|_| TimedOut {
            command: Command::Login,
            after: limit,
        })?
        .map_err(|(error, _client)| ConnectError::Auth(error))?;

    if let Err(error) = prepare(&mut session, mailbox, archive_mailbox, limit).await {
        let _ = timed(limit, Command::Logout, session.logout()).await;
        return Err(error);
    }

    tracing::info!(imap_mailbox = %mailbox, "connected to the IMAP server");

    Ok(ImapMailSession::new(session, mailbox, limit))
}

/// List the folders and select the mailbox.
async fn prepare<S>(
    session: &mut async_imap::Session<S>,
    mailbox: &str,
    archive_mailbox: &str,
    limit: Duration,
) -> Result<(), ConnectError>
where
    S: ImapStream,
{
    let folders: Vec<String> = timed(limit, Command::List, async {
        let names = session.list(Some(""), Some("*")).await?;
        names
            .map_ok(|name| name.name().to_owned())
            .try_collect::<Vec<_>>()
            .await
    })
    .await?
    .map_err(|source| ConnectError::Protocol {
        command: Command::List,
        source,
    })?;

    if !folders.iter().any(|folder| folder == archive_mailbox) {
        tracing::warn!(
            imap_archive_mailbox = %archive_mailbox,
            "archive folder is not listed on the server; archiving will fail until it exists"
        );
    }

    let selected = timed(limit, Command::Select, session.select(mailbox))
        .await?
        .map_err(|source| ConnectError::Protocol {
            command: Command::Select,
            source,
        })?;

    tracing::debug!(imap_mailbox = %mailbox, exists = selected.exists, "mailbox selected");

    Ok(())
}
