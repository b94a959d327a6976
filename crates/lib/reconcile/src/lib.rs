//! One search-forward-archive pass over the selected mailbox.

use core::future::Future;

use futures_util::FutureExt as _;
use mail_forward::{ForwardTarget, Transport};
use mail_session::{MailSession, MessageRef, SearchFilter};

/// What one cycle does.
#[derive(Debug, Clone)]
pub struct Cycle {
    /// Which messages to pick up.
    pub filter: SearchFilter,

    /// Where to forward them.
    pub target: ForwardTarget,

    /// Folder that receives processed messages.
    pub archive_folder: String,
}

/// Outcome of a completed cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Messages returned by the search.
    pub matched: usize,

    /// Messages accepted by the relay.
    pub forwarded: usize,

    /// Messages moved to the archive folder.
    pub archived: u32,

    /// Messages with at least one failed step.
    pub failed: usize,
}

/// Errors that end a cycle early.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    /// The search failed; nothing was processed.
    #[error("search: {0}")]
    Search(#[source] mail_session::Error),

    /// The session died while processing messages.
    #[error("connection lost while processing message {message}: {source}")]
    ConnectionLost {
        /// The message being processed.
        message: MessageRef,

        /// The error that revealed the loss.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl CycleError {
    /// Whether the session must be replaced before the next cycle.
    pub fn is_connection_lost(&self) -> bool {
        match self {
            Self::Search(error) => error.is_connection_lost(),
            Self::ConnectionLost { .. } => true,
        }
    }
}

impl Cycle {
    /// Search, then forward and archive every match.
    ///
    /// The search result is taken once. Every expunge reported while
    /// archiving renumbers the matches still pending, including removals of
    /// messages other than the one being archived, such as an earlier match
    /// whose own expunge failed. A pending match that was itself expunged is
    /// skipped.
    ///
    /// `stop` is checked without waiting before each message; once it has
    /// resolved, the remaining matches are left for a later cycle.
    pub async fn run_once<S, T, Stop>(
        &self,
        session: &mut S,
        transport: &T,
        stop: &mut Stop,
    ) -> Result<CycleReport, CycleError>
    where
        S: MailSession,
        T: Transport,
        Stop: Future<Output = ()> + Unpin,
    {
        let matches = session
            .search(&self.filter)
            .await
            .map_err(CycleError::Search)?;

        let mut report = CycleReport {
            matched: matches.len(),
            ..CycleReport::default()
        };
        tracing::debug!(matched = report.matched, sender = self.filter.sender(), "search finished");

        // Original search position and current position of every match.
        let mut pending: Vec<(MessageRef, Option<MessageRef>)> =
            matches.into_iter().map(|message| (message, Some(message))).collect();

        for index in 0..pending.len() {
            if (&mut *stop).now_or_never().is_some() {
                tracing::info!(remaining = pending.len() - index, "stop requested, ending cycle early");
                break;
            }

            let (original, current) = pending[index];
            let Some(message) = current else {
                tracing::info!(%original, "message was expunged before processing, skipping");
                continue;
            };

            let mut failed = false;

            match mail_forward::forward(session, message, &self.target, transport).await {
                Ok(()) => report.forwarded += 1,
                Err(error) if error.is_connection_lost() => {
                    return Err(CycleError::ConnectionLost {
                        message,
                        source: Box::new(error),
                    });
                }
                Err(error) => {
                    tracing::error!(%message, %original, %error, "failed to forward message");
                    failed = true;
                }
            }

            match mail_archive::archive(session, message, &self.archive_folder).await {
                Ok(archived) => {
                    report.archived += 1;
                    for removed in archived.expunged {
                        for (_, later) in &mut pending[index + 1..] {
                            *later = later.and_then(|position| position.after_expunge(removed));
                        }
                    }
                }
                Err(error) if error.is_connection_lost() => {
                    return Err(CycleError::ConnectionLost {
                        message,
                        source: Box::new(error),
                    });
                }
                Err(error) => {
                    tracing::error!(%message, %original, %error, "failed to archive message");
                    failed = true;
                }
            }

            if failed {
                report.failed += 1;
            }
        }

        tracing::info!(
            matched = report.matched,
            forwarded = report.forwarded,
            archived = report.archived,
            failed = report.failed,
            "finished processing mailbox"
        );
        Ok(report)
    }
}
