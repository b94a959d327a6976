//! UID extraction from `FETCH (UID)` responses.

use crate::{MessageRef, MessageUid};

/// The part of one untagged `FETCH` response relevant to UID resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UidItem {
    /// The sequence number the response is about.
    pub message: u32,

    /// The `UID` data item, if the response carried one.
    pub uid: Option<u32>,
}

/// Errors returned when a `FETCH (UID)` response does not yield a UID.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The server sent no FETCH response for the requested message.
    #[error("no FETCH response for message {message}")]
    MissingResponse {
        /// The requested message.
        message: MessageRef,
    },

    /// The FETCH response lacks the UID data item.
    #[error("FETCH response for message {message} carries no UID")]
    MissingUid {
        /// The requested message.
        message: MessageRef,
    },

    /// The server reported UID 0, which is not a valid UID.
    #[error("FETCH response for message {message} carries UID 0")]
    ZeroUid {
        /// The requested message.
        message: MessageRef,
    },

    /// The server reported two different UIDs for one message.
    #[error("FETCH responses for message {message} disagree on UID: {first} vs {second}")]
    ConflictingUid {
        /// The requested message.
        message: MessageRef,

        /// The first UID seen.
        first: u32,

        /// The disagreeing UID.
        second: u32,
    },
}

/// Pick the UID of `message` out of the FETCH responses.
///
/// Responses about other messages are unsolicited updates and are ignored.
pub fn parse_uid(
    message: MessageRef,
    items: impl IntoIterator<Item = UidItem>,
) -> Result<MessageUid, ParseError> {
    let mut seen_response = false;
    let mut found: Option<u32> = None;

    for item in items
        .into_iter()
        .filter(|item| item.message == message.get())
    {
        seen_response = true;
        let Some(uid) = item.uid else { continue };
        match found {
            Some(first) if first != uid => {
                return Err(ParseError::ConflictingUid {
                    message,
                    first,
                    second: uid,
                });
            }
            _ => found = Some(uid),
        }
    }

    if !seen_response {
        return Err(ParseError::MissingResponse { message });
    }
    let uid = found.ok_or(ParseError::MissingUid { message })?;
    MessageUid::new(uid).ok_or(ParseError::ZeroUid { message })
}
