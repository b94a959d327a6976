//! IMAP client connection setup: TCP, TLS and the server greeting.

/// The effective data stream type we use.
pub type Stream = tokio_rustls::client::TlsStream<tokio::net::TcpStream>;

/// The effective client type we use.
pub type Client = async_imap::Client<Stream>;

/// How to secure the IMAP connection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TlsMode {
    /// Implicit TLS (usually port 993).
    Implicit,

    /// Start with plaintext and upgrade using STARTTLS (usually port 143).
    StartTls,
}

impl TlsMode {
    /// The conventional port for this mode.
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Implicit => 993,
            Self::StartTls => 143,
        }
    }
}

/// IMAP connect params.
#[derive(Debug, Clone, PartialEq)]
pub struct Params<'a> {
    /// Hostname or IP address of the IMAP server.
    pub host: &'a str,

    /// IMAP port.
    pub port: u16,

    /// TLS mode.
    pub tls_mode: TlsMode,

    /// TLS server name (SNI).
    pub tls_server_name: &'a str,
}

/// Errors returned while connecting to an IMAP server.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// TCP connection error.
    #[error("TCP connection error: {0}")]
    TcpConnect(#[source] std::io::Error),

    /// Failed to load system root certificates.
    #[error("failed to load system root certificates: {0}")]
    RootCerts(#[source] rustls_native_certs::Error),

    /// Invalid DNS name for TLS verification.
    #[error("invalid DNS name: {0}")]
    InvalidDnsName(String),

    /// TLS handshake or I/O error.
    #[error("TLS handshake error: {0}")]
    TlsHandshake(#[source] std::io::Error),

    /// IMAP protocol error before authentication.
    #[error("IMAP error: {0}")]
    Imap(#[source] async_imap::error::Error),

    /// Reading the greeting failed.
    #[error("reading IMAP greeting: {0}")]
    Greeting(#[source] std::io::Error),

    /// The server did not send the expected greeting.
    #[error("IMAP server sent no greeting")]
    MissingGreeting,
}

/// Build a rustls connector configured with system root certificates.
pub fn tls_connector() -> Result<tokio_rustls::TlsConnector, Error> {
    let mut root_store = rustls::RootCertStore::empty();
    let rustls_native_certs::CertificateResult { certs, errors, .. } =
        rustls_native_certs::load_native_certs();
    if let Some(err) = errors.into_iter().next() {
        return Err(Error::RootCerts(err));
    }
    let (added, ignored) = root_store.add_parsable_certificates(certs);
    tracing::trace!(added, ignored, "loaded system root certificates");

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();
    Ok(tokio_rustls::TlsConnector::from(std::sync::Arc::new(
        config,
    )))
}

/// Connect to an IMAP server and produce a client that already consumed the greeting.
pub async fn connect(params: Params<'_>) -> Result<Client, Error> {
    let Params {
        host,
        port,
        tls_mode,
        tls_server_name,
    } = params;

    tracing::debug!(
        imap_host = %host,
        imap_port = port,
        imap_tls_mode = ?tls_mode,
        tls_server_name = %tls_server_name,
        "connecting to an IMAP server"
    );

    let server_name = rustls::pki_types::ServerName::try_from(tls_server_name.to_owned())
        .map_err(|_| Error::InvalidDnsName(tls_server_name.to_owned()))?;
    let connector = tls_connector()?;

    let tcp_stream = tokio::net::TcpStream::connect((host, port))
        .await
        .map_err(Error::TcpConnect)?;

    let client = match tls_mode {
        TlsMode::Implicit => {
            let stream = connector
                .connect(server_name, tcp_stream)
                .await
                .map_err(Error::TlsHandshake)?;
            let mut client = async_imap::Client::new(stream);
            read_greeting(&mut client).await?;
            client
        }
        TlsMode::StartTls => {
            let mut client = async_imap::Client::new(tcp_stream);
            read_greeting(&mut client).await?;
            client
                .run_command_and_check_ok("STARTTLS", None)
                .await
                .map_err(Error::Imap)?;
            let stream = connector
                .connect(server_name, client.into_inner())
                .await
                .map_err(Error::TlsHandshake)?;
            async_imap::Client::new(stream)
        }
    };

    Ok(client)
}

/// Consume the untagged server greeting.
pub async fn read_greeting<S>(client: &mut async_imap::Client<S>) -> Result<(), Error>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + std::fmt::Debug,
{
    client
        .read_response()
        .await
        .map_err(Error::Greeting)?
        .ok_or(Error::MissingGreeting)?;
    Ok(())
}
