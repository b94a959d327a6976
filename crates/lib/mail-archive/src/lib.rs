//! Moving a processed message out of the selected mailbox.

use mail_session::{MailSession, MessageRef, MessageUid};

/// Errors returned while archiving a message.
///
/// Each variant names the step that failed; later steps did not run.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// The message UID could not be resolved.
    #[error("resolving UID of message {message}: {source}")]
    Uid {
        /// The message being archived.
        message: MessageRef,

        /// The underlying error.
        #[source]
        source: mail_session::Error,
    },

    /// The message could not be copied to the archive folder.
    #[error("copying UID {uid} to {folder:?}: {source}")]
    Copy {
        /// The message being archived.
        uid: MessageUid,

        /// The archive folder.
        folder: String,

        /// The underlying error.
        #[source]
        source: mail_session::Error,
    },

    /// The message was copied but could not be flagged as deleted.
    #[error("flagging UID {uid} as deleted: {source}")]
    Flag {
        /// The message being archived.
        uid: MessageUid,

        /// The underlying error.
        #[source]
        source: mail_session::Error,
    },

    /// The message was flagged but the mailbox could not be expunged.
    #[error("expunging after UID {uid}: {source}")]
    Expunge {
        /// The message being archived.
        uid: MessageUid,

        /// The underlying error.
        #[source]
        source: mail_session::Error,
    },
}

impl ArchiveError {
    /// The session error behind this failure.
    pub fn session_error(&self) -> &mail_session::Error {
        match self {
            Self::Uid { source, .. }
            | Self::Copy { source, .. }
            | Self::Flag { source, .. }
            | Self::Expunge { source, .. } => source,
        }
    }

    /// Whether the mailbox session is unusable after this error.
    pub fn is_connection_lost(&self) -> bool {
        self.session_error().is_connection_lost()
    }
}

/// A successfully archived message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archived {
    /// The UID the message had before it was expunged.
    pub uid: MessageUid,

    /// Sequence numbers the server reported as expunged.
    pub expunged: Vec<MessageRef>,
}

/// Copy `message` to `folder`, flag it deleted and expunge it.
///
/// The copy happens by UID, so it is safe against renumbering between
/// steps. Only a completed expunge counts as archived.
pub async fn archive<S>(
    session: &mut S,
    message: MessageRef,
    folder: &str,
) -> Result<Archived, ArchiveError>
where
    S: MailSession,
{
    let uid = session
        .fetch_uid(message)
        .await
        .map_err(|source| ArchiveError::Uid { message, source })?;

    session
        .copy_to_folder(uid, folder)
        .await
        .map_err(|source| ArchiveError::Copy {
            uid,
            folder: folder.to_owned(),
            source,
        })?;

    session
        .mark_deleted(uid)
        .await
        .map_err(|source| ArchiveError::Flag { uid, source })?;

    let expunged = session
        .expunge()
        .await
        .map_err(|source| ArchiveError::Expunge { uid, source })?;

    if expunged != [message] {
        tracing::warn!(
            %message,
            %uid,
            ?expunged,
            "server expunged something other than the archived message"
        );
    }

    tracing::info!(%message, %uid, folder, "archived message");
    Ok(Archived { uid, expunged })
}
