//! Forwarding identities.

use lettre::Address;
use lettre::address::Envelope;

/// Who forwarded messages come from and go to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardTarget {
    /// The recipient written into the `To` header.
    recipient: Address,

    /// SMTP envelope: configured sender to the recipient.
    envelope: Envelope,
}

/// Errors returned while building a [`ForwardTarget`].
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    /// The sender is not a valid address.
    #[error("invalid sender address {address:?}: {source}")]
    Sender {
        /// The rejected input.
        address: String,

        /// Why it was rejected.
        #[source]
        source: lettre::address::AddressError,
    },

    /// The recipient is not a valid address.
    #[error("invalid recipient address {address:?}: {source}")]
    Recipient {
        /// The rejected input.
        address: String,

        /// Why it was rejected.
        #[source]
        source: lettre::address::AddressError,
    },

    /// The envelope could not be formed.
    #[error("envelope: {0}")]
    Envelope(#[source] lettre::error::Error),
}

impl ForwardTarget {
    /// Parse and validate the sender and recipient addresses.
    pub fn new(sender: &str, recipient: &str) -> Result<Self, TargetError> {
        let sender_address: Address = sender.parse().map_err(|source| TargetError::Sender {
            address: sender.to_owned(),
            source,
        })?;
        let recipient: Address = recipient
            .parse()
            .map_err(|source| TargetError::Recipient {
                address: recipient.to_owned(),
                source,
            })?;
        let envelope = Envelope::new(Some(sender_address), vec![recipient.clone()])
            .map_err(TargetError::Envelope)?;

        Ok(Self {
            recipient,
            envelope,
        })
    }

    /// The recipient.
    pub fn recipient(&self) -> &Address {
        &self.recipient
    }

    /// The SMTP envelope used for every forwarded message.
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }
}
