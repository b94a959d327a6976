//! Test helpers for code that forwards messages.

use std::sync::{Arc, Mutex};

use lettre::address::Envelope;

/// The recording transport refused a message.
#[derive(Debug, Clone, thiserror::Error)]
#[error("relay refused the message")]
pub struct Refused;

/// A message handed to the [`RecordingTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    /// The envelope used.
    pub envelope: Envelope,

    /// The submitted bytes.
    pub message: Vec<u8>,
}

/// A [`crate::Transport`] that records submissions instead of sending them.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    /// Messages accepted so far.
    sent: Arc<Mutex<Vec<Sent>>>,

    /// Number of upcoming submissions to refuse.
    refuse: Arc<Mutex<usize>>,
}

impl RecordingTransport {
    /// A transport that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse the next `count` submissions.
    pub fn refuse_next(&self, count: usize) {
        *self.refuse.lock().unwrap() = count;
    }

    /// Messages accepted so far.
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }
}

impl crate::Transport for RecordingTransport {
    type Error = Refused;

    async fn send(&self, envelope: &Envelope, message: &[u8]) -> Result<(), Refused> {
        {
            let mut refuse = self.refuse.lock().unwrap();
            if *refuse > 0 {
                *refuse -= 1;
                return Err(Refused);
            }
        }

        self.sent.lock().unwrap().push(Sent {
            envelope: envelope.clone(),
            message: message.to_vec(),
        });
        Ok(())
    }
}
