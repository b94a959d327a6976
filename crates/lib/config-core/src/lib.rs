//! Shared configuration types for inbox-forwarder.

/// Root configuration.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// The polled IMAP account.
    pub imap: ImapConfig,

    /// The outbound SMTP relay.
    pub smtp: SmtpConfig,

    /// What to forward and where.
    pub forward: ForwardConfig,

    /// Delay between reconciliation cycles (seconds).
    pub poll_interval_secs: u64,

    /// Connect retry policy override.
    #[cfg_attr(feature = "serde", serde(default))]
    pub connect_retry: Option<ConnectRetryConfig>,

    /// Append-only log file path override.
    #[cfg_attr(feature = "serde", serde(default))]
    pub log_file: Option<std::path::PathBuf>,
}

/// The polled IMAP server and mailbox.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq)]
pub struct ImapConfig {
    /// Hostname or IP address of the IMAP server.
    pub host: String,

    /// Optional port override.
    #[cfg_attr(feature = "serde", serde(default))]
    pub port: Option<u16>,

    /// TLS settings.
    pub tls: TlsConfig,

    /// Login credentials.
    pub credentials: LoginCredentials,

    /// Mailbox to poll, `INBOX` when unset.
    #[cfg_attr(feature = "serde", serde(default))]
    pub mailbox: Option<String>,

    /// Folder that receives processed messages, `Archived` when unset.
    #[cfg_attr(feature = "serde", serde(default))]
    pub archive_mailbox: Option<String>,

    /// Per-operation timeout override (seconds).
    #[cfg_attr(feature = "serde", serde(default))]
    pub operation_timeout_secs: Option<u64>,
}

/// TLS configuration for the IMAP server.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq)]
pub struct TlsConfig {
    /// TLS mode.
    pub mode: TlsMode,

    /// Optional override for the TLS server name (SNI).
    #[cfg_attr(feature = "serde", serde(default))]
    pub server_name: Option<String>,
}

/// Supported IMAP TLS modes.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TlsMode {
    /// Implicit TLS (usually port 993).
    Implicit,

    /// STARTTLS upgrade (usually port 143).
    #[cfg_attr(feature = "serde", serde(rename = "starttls", alias = "start_tls"))]
    StartTls,
}

/// The outbound SMTP relay.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq)]
pub struct SmtpConfig {
    /// Hostname of the SMTP relay.
    pub host: String,

    /// Optional port override.
    #[cfg_attr(feature = "serde", serde(default))]
    pub port: Option<u16>,

    /// Connection security, STARTTLS when unset.
    #[cfg_attr(feature = "serde", serde(default))]
    pub security: Option<SmtpSecurity>,

    /// Submission credentials, the IMAP credentials when unset.
    #[cfg_attr(feature = "serde", serde(default))]
    pub credentials: Option<LoginCredentials>,
}

/// Supported SMTP connection security modes.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SmtpSecurity {
    /// Implicit TLS (usually port 465).
    Implicit,

    /// Mandatory STARTTLS upgrade (usually port 587).
    #[cfg_attr(feature = "serde", serde(rename = "starttls", alias = "start_tls"))]
    StartTls,

    /// No TLS at all, for local relays only.
    Plain,
}

/// Forwarding rule.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardConfig {
    /// Only messages from this sender are forwarded.
    pub sender_filter: String,

    /// Envelope sender of forwarded messages.
    pub from: String,

    /// Recipient of forwarded messages.
    pub to: String,
}

/// Connect retry policy.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectRetryConfig {
    /// Total number of connect attempts.
    pub attempts: Option<u32>,

    /// First backoff delay (seconds).
    pub initial_delay_secs: Option<u64>,

    /// Backoff delay clamp (seconds).
    pub max_delay_secs: Option<u64>,
}

/// Login credentials.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq)]
pub struct LoginCredentials {
    /// Username, typically an email address.
    pub username: String,

    /// Password.
    pub password: PasswordSource,
}

/// Source for a password value.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
#[derive(Debug, Clone, PartialEq)]
pub enum PasswordSource {
    /// Plaintext password stored directly in config.
    Plain(String),

    /// Name of an environment variable holding the password.
    Env {
        /// The variable name.
        env: String,
    },
}
