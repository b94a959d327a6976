//! Lift raw config into runtime settings.

mod error;
mod password;
mod types;

pub use error::*;
pub use password::*;
pub use types::*;

use core::num::NonZeroU32;
use core::time::Duration;

/// Mailbox to poll when not specified in config.
pub const DEFAULT_MAILBOX: &str = "INBOX";

/// Archive folder when not specified in config.
pub const DEFAULT_ARCHIVE_MAILBOX: &str = "Archived";

/// Per-operation IMAP timeout (seconds) when not specified in config.
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 60;

/// SMTP command timeout.
pub const SMTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Connect attempts when not specified in config.
pub const DEFAULT_CONNECT_ATTEMPTS: u32 = 5;

/// First connect retry delay (seconds) when not specified in config.
pub const DEFAULT_CONNECT_INITIAL_DELAY_SECS: u64 = 1;

/// Connect retry delay clamp (seconds) when not specified in config.
pub const DEFAULT_CONNECT_MAX_DELAY_SECS: u64 = 60;

/// Log file when not specified in config.
pub const DEFAULT_LOG_FILE: &str = "inbox-forwarder.log";

/// Build runtime settings, resolving passwords from the environment as needed.
pub fn bringup(config: &config_core::Config) -> Result<Settings, BringupError> {
    let imap = imap(&config.imap).map_err(BringupError::ImapPassword)?;
    let smtp = smtp(&config.smtp, &config.imap.credentials).map_err(BringupError::SmtpPassword)?;
    let cycle = cycle(&config.forward, &imap.archive_mailbox)?;
    let run = run(config)?;

    let log_file = config
        .log_file
        .clone()
        .unwrap_or_else(|| DEFAULT_LOG_FILE.into());

    Ok(Settings {
        imap,
        smtp,
        cycle,
        run,
        log_file,
    })
}

/// Convert config TLS mode to IMAP TLS mode.
fn map_tls_mode(mode: config_core::TlsMode) -> imap_connect::TlsMode {
    match mode {
        config_core::TlsMode::Implicit => imap_connect::TlsMode::Implicit,
        config_core::TlsMode::StartTls => imap_connect::TlsMode::StartTls,
    }
}

/// Convert config SMTP security to the transport's.
fn map_smtp_security(security: config_core::SmtpSecurity) -> mail_forward::SmtpSecurity {
    match security {
        config_core::SmtpSecurity::Implicit => mail_forward::SmtpSecurity::Implicit,
        config_core::SmtpSecurity::StartTls => mail_forward::SmtpSecurity::StartTls,
        config_core::SmtpSecurity::Plain => mail_forward::SmtpSecurity::Plain,
    }
}

/// Bringup the IMAP side.
fn imap(imap: &config_core::ImapConfig) -> Result<Imap, PasswordError> {
    let tls_mode = map_tls_mode(imap.tls.mode);
    let port = imap.port.unwrap_or_else(|| tls_mode.default_port());
    let tls_server_name = imap
        .tls
        .server_name
        .clone()
        .unwrap_or_else(|| imap.host.clone());

    let password = resolve_password(&imap.credentials.password)?;

    Ok(Imap {
        host: imap.host.clone(),
        port,
        tls_mode,
        tls_server_name,
        username: imap.credentials.username.clone(),
        password,
        mailbox: imap
            .mailbox
            .clone()
            .unwrap_or_else(|| DEFAULT_MAILBOX.to_owned()),
        archive_mailbox: imap
            .archive_mailbox
            .clone()
            .unwrap_or_else(|| DEFAULT_ARCHIVE_MAILBOX.to_owned()),
        operation_timeout: Duration::from_secs(
            imap.operation_timeout_secs
                .unwrap_or(DEFAULT_OPERATION_TIMEOUT_SECS),
        ),
    })
}

/// Bringup the SMTP relay. Credentials default to the IMAP ones.
fn smtp(
    smtp: &config_core::SmtpConfig,
    imap_credentials: &config_core::LoginCredentials,
) -> Result<mail_forward::SmtpRelay, PasswordError> {
    let security = map_smtp_security(smtp.security.unwrap_or(config_core::SmtpSecurity::StartTls));
    let port = smtp.port.unwrap_or_else(|| security.default_port());

    let credentials = smtp.credentials.as_ref().unwrap_or(imap_credentials);
    let password = resolve_password(&credentials.password)?;

    Ok(mail_forward::SmtpRelay {
        host: smtp.host.clone(),
        port,
        security,
        credentials: Some(lettre::transport::smtp::authentication::Credentials::new(
            credentials.username.clone(),
            password,
        )),
        timeout: SMTP_TIMEOUT,
    })
}

/// Bringup the per-cycle work.
fn cycle(
    forward: &config_core::ForwardConfig,
    archive_mailbox: &str,
) -> Result<reconcile::Cycle, BringupError> {
    let target = mail_forward::ForwardTarget::new(&forward.from, &forward.to)
        .map_err(BringupError::Target)?;

    Ok(reconcile::Cycle {
        filter: mail_session::SearchFilter::from_sender(forward.sender_filter.clone()),
        target,
        archive_folder: archive_mailbox.to_owned(),
    })
}

/// Bringup the loop timing.
fn run(config: &config_core::Config) -> Result<run_loop::Config, BringupError> {
    if config.poll_interval_secs == 0 {
        return Err(BringupError::ZeroPollInterval);
    }

    let retry = config.connect_retry.clone().unwrap_or_default();
    let connect_attempts = NonZeroU32::new(retry.attempts.unwrap_or(DEFAULT_CONNECT_ATTEMPTS))
        .ok_or(BringupError::ZeroConnectAttempts)?;
    let initial = Duration::from_secs(
        retry
            .initial_delay_secs
            .unwrap_or(DEFAULT_CONNECT_INITIAL_DELAY_SECS),
    );
    let max = Duration::from_secs(
        retry
            .max_delay_secs
            .unwrap_or(DEFAULT_CONNECT_MAX_DELAY_SECS),
    );

    Ok(run_loop::Config {
        poll_interval: Duration::from_secs(config.poll_interval_secs),
        connect_backoff: exp_backoff::State::new(initial, 2, max.max(initial)),
        connect_attempts,
    })
}
