//! Resolved settings.

use std::path::PathBuf;

/// Fully resolved IMAP connection settings.
#[derive(Clone)]
pub struct Imap {
    /// Hostname or IP address of the IMAP server.
    pub host: String,

    /// IMAP port.
    pub port: u16,

    /// TLS mode.
    pub tls_mode: imap_connect::TlsMode,

    /// TLS server name (SNI).
    pub tls_server_name: String,

    /// Username for IMAP authentication.
    pub username: String,

    /// Password for IMAP authentication.
    pub password: String,

    /// The mailbox to poll.
    pub mailbox: String,

    /// The folder processed messages are moved to.
    pub archive_mailbox: String,

    /// Upper bound for every server round trip.
    pub operation_timeout: core::time::Duration,
}

impl core::fmt::Debug for Imap {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Imap")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls_mode", &self.tls_mode)
            .field("tls_server_name", &self.tls_server_name)
            .field("username", &self.username)
            .field("mailbox", &self.mailbox)
            .field("archive_mailbox", &self.archive_mailbox)
            .field("operation_timeout", &self.operation_timeout)
            .finish_non_exhaustive()
    }
}

impl Imap {
    /// Parameters for [`mail_session::connect`].
    pub fn connect_params(&self) -> mail_session::ConnectParams<'_> {
        mail_session::ConnectParams {
            server: imap_connect::Params {
                host: &self.host,
                port: self.port,
                tls_mode: self.tls_mode,
                tls_server_name: &self.tls_server_name,
            },
            open: mail_session::OpenParams {
                username: &self.username,
                password: &self.password,
                mailbox: &self.mailbox,
                archive_mailbox: &self.archive_mailbox,
                operation_timeout: self.operation_timeout,
            },
        }
    }
}

/// Everything the process needs to run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Mailbox access.
    pub imap: Imap,

    /// Outbound relay.
    pub smtp: mail_forward::SmtpRelay,

    /// Per-cycle work.
    pub cycle: reconcile::Cycle,

    /// Loop timing.
    pub run: run_loop::Config,

    /// Where to append the log.
    pub log_file: PathBuf,
}
