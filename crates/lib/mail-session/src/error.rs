//! Session error types.

use core::fmt;
use core::time::Duration;

use crate::{MessageRef, ParseError};

/// The IMAP command an error relates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Connection setup up to the server greeting.
    Connect,

    /// `LOGIN`.
    Login,

    /// `LIST`.
    List,

    /// `SELECT`.
    Select,

    /// `SEARCH`.
    Search,

    /// `FETCH`.
    Fetch,

    /// `UID COPY`.
    Copy,

    /// `UID STORE`.
    Store,

    /// `EXPUNGE`.
    Expunge,

    /// `LOGOUT`.
    Logout,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connect => "connect",
            Self::Login => "LOGIN",
            Self::List => "LIST",
            Self::Select => "SELECT",
            Self::Search => "SEARCH",
            Self::Fetch => "FETCH",
            Self::Copy => "UID COPY",
            Self::Store => "UID STORE",
            Self::Expunge => "EXPUNGE",
            Self::Logout => "LOGOUT",
        })
    }
}

/// Errors returned by [`crate::MailSession`] operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The server did not answer OK, or the connection failed mid-command.
    #[error("{command} failed: {source}")]
    Protocol {
        /// The failed command.
        command: Command,

        /// Underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// A message could not be fetched.
    #[error("fetching message {message} failed: {reason}")]
    Fetch {
        /// The requested message.
        message: MessageRef,

        /// What went wrong.
        #[source]
        reason: FetchFailure,
    },

    /// The UID could not be extracted from the server's response.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The server did not answer in time; the session state is unknown.
    #[error("{command} timed out after {after:?}")]
    Timeout {
        /// The command that timed out.
        command: Command,

        /// The configured limit.
        after: Duration,
    },

    /// The session was already logged out.
    #[error("session is closed")]
    Closed,
}

impl Error {
    /// Whether the session is unusable after this error.
    pub fn is_connection_lost(&self) -> bool {
        match self {
            Self::Protocol { source, .. } => is_connection_error(source),
            Self::Fetch {
                reason: FetchFailure::Rejected(source),
                ..
            } => is_connection_error(source),
            Self::Fetch { .. } | Self::Parse(_) => false,
            Self::Timeout { .. } | Self::Closed => true,
        }
    }
}

/// Why a fetch produced no message.
#[derive(Debug, thiserror::Error)]
pub enum FetchFailure {
    /// The server did not answer OK.
    #[error("{0}")]
    Rejected(#[source] async_imap::error::Error),

    /// The server answered OK without data for the message.
    #[error("no data returned")]
    NoData,

    /// The server returned a zero-length message.
    #[error("empty message")]
    EmptyBody,
}

/// Whether an IMAP error means the transport is gone.
pub(crate) fn is_connection_error(error: &async_imap::error::Error) -> bool {
    matches!(
        error,
        async_imap::error::Error::Io(_) | async_imap::error::Error::ConnectionLost
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_rejection_keeps_the_session() {
        let error = Error::Protocol {
            command: Command::Copy,
            source: async_imap::error::Error::No("no such mailbox".into()),
        };
        assert!(!error.is_connection_lost());
    }

    #[test]
    fn dropped_connection_loses_the_session() {
        let error = Error::Protocol {
            command: Command::Search,
            source: async_imap::error::Error::ConnectionLost,
        };
        assert!(error.is_connection_lost());

        let error = Error::Fetch {
            message: MessageRef::new(1).unwrap(),
            reason: FetchFailure::Rejected(async_imap::error::Error::Io(
                std::io::ErrorKind::BrokenPipe.into(),
            )),
        };
        assert!(error.is_connection_lost());
    }

    #[test]
    fn timeouts_lose_the_session() {
        let error = Error::Timeout {
            command: Command::Fetch,
            after: Duration::from_secs(1),
        };
        assert!(error.is_connection_lost());
        assert_eq!(error.to_string(), "FETCH timed out after 1s");
    }

    #[test]
    fn missing_data_keeps_the_session() {
        let error = Error::Fetch {
            message: MessageRef::new(4).unwrap(),
            reason: FetchFailure::NoData,
        };
        assert!(!error.is_connection_lost());
        assert_eq!(error.to_string(), "fetching message 4 failed: no data returned");
    }
}
