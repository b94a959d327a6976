//! Error types.

/// Config bringup error.
#[derive(Debug, thiserror::Error)]
pub enum BringupError {
    /// Failed to resolve the IMAP password.
    #[error("imap password: {0}")]
    ImapPassword(#[source] PasswordError),

    /// Failed to resolve the SMTP password.
    #[error("smtp password: {0}")]
    SmtpPassword(#[source] PasswordError),

    /// The forwarding addresses are invalid.
    #[error("forward: {0}")]
    Target(#[source] mail_forward::TargetError),

    /// The poll interval must be positive.
    #[error("poll_interval_secs must be greater than zero")]
    ZeroPollInterval,

    /// At least one connect attempt is required.
    #[error("connect_retry.attempts must be greater than zero")]
    ZeroConnectAttempts,
}

/// Errors returned while resolving a password.
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// The env variable could not be read.
    #[error("env var {var}: {source}")]
    Env {
        /// The variable name.
        var: String,

        /// Underlying error.
        #[source]
        source: std::env::VarError,
    },

    /// The env variable is not set.
    #[error("env var {var} is not set")]
    MissingEnv {
        /// The variable name.
        var: String,
    },
}
