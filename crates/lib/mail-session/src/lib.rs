//! Mailbox session capability and its IMAP implementation.

mod connect;
mod error;
mod imap;
mod types;
mod uid;

#[cfg(test)]
mod testing;

pub use connect::*;
pub use error::*;
pub use imap::*;
pub use types::*;
pub use uid::*;

use core::future::Future;

/// Operations the forwarder needs from a selected mailbox.
///
/// Sequence numbers passed in are interpreted against the mailbox state
/// at the time of the call, so any expunge renumbers later messages.
pub trait MailSession {
    /// Search the selected mailbox.
    ///
    /// No matches is an empty result, not an error.
    fn search(
        &mut self,
        filter: &SearchFilter,
    ) -> impl Future<Output = Result<SearchResult, Error>> + Send;

    /// Fetch the full raw message.
    fn fetch_body(
        &mut self,
        message: MessageRef,
    ) -> impl Future<Output = Result<RawMessage, Error>> + Send;

    /// Resolve the stable UID of a message.
    fn fetch_uid(
        &mut self,
        message: MessageRef,
    ) -> impl Future<Output = Result<MessageUid, Error>> + Send;

    /// Copy a message into another folder.
    fn copy_to_folder(
        &mut self,
        uid: MessageUid,
        folder: &str,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    /// Flag a message as `\Deleted`. Flagging a message that is already gone is not an error.
    fn mark_deleted(&mut self, uid: MessageUid) -> impl Future<Output = Result<(), Error>> + Send;

    /// Remove every `\Deleted` message, returning the reported sequence numbers.
    fn expunge(&mut self) -> impl Future<Output = Result<Vec<MessageRef>, Error>> + Send;

    /// Log out. Safe to call any number of times; never fails.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}
