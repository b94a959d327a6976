//! SMTP submission through `lettre`.

use core::time::Duration;

use lettre::address::Envelope;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport as _, Tokio1Executor};

/// How to secure the SMTP connection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SmtpSecurity {
    /// Implicit TLS (usually port 465).
    Implicit,

    /// Mandatory STARTTLS upgrade (usually port 587).
    StartTls,

    /// No TLS, for local relays only.
    Plain,
}

impl SmtpSecurity {
    /// The conventional port for this mode.
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Implicit => 465,
            Self::StartTls => 587,
            Self::Plain => 25,
        }
    }
}

/// An SMTP relay that opens a fresh connection for every message.
#[derive(Clone)]
pub struct SmtpRelay {
    /// Relay hostname.
    pub host: String,

    /// Relay port.
    pub port: u16,

    /// Connection security.
    pub security: SmtpSecurity,

    /// Submission credentials, if the relay requires authentication.
    pub credentials: Option<Credentials>,

    /// Network timeout for each SMTP command.
    pub timeout: Duration,
}

impl core::fmt::Debug for SmtpRelay {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SmtpRelay")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("security", &self.security)
            .field("authenticated", &self.credentials.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SmtpRelay {
    /// Build a single-use transport.
    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, lettre::transport::smtp::Error> {
        let builder = match self.security {
            SmtpSecurity::Implicit => AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host)?,
            SmtpSecurity::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)?
            }
            SmtpSecurity::Plain => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.host),
        };

        let builder = builder.port(self.port).timeout(Some(self.timeout));
        let builder = match &self.credentials {
            Some(credentials) => builder.credentials(credentials.clone()),
            None => builder,
        };

        Ok(builder.build())
    }
}

impl crate::Transport for SmtpRelay {
    type Error = lettre::transport::smtp::Error;

    async fn send(&self, envelope: &Envelope, message: &[u8]) -> Result<(), Self::Error> {
        tracing::debug!(
            smtp_host = %self.host,
            smtp_port = self.port,
            smtp_security = ?self.security,
            bytes = message.len(),
            "submitting message"
        );

        // Without pooling the connection is closed with QUIT after this message.
        let response = self.transport()?.send_raw(envelope, message).await?;

        tracing::debug!(code = %response.code(), "relay accepted message");
        Ok(())
    }
}
