//! IMAP connectivity helpers.

use std::time::Duration;

use async_imap::Client;
use futures_util::TryStreamExt as _;
use tokio::net::TcpStream;

/// Connects and reads the greeting, retrying until the server is ready.
pub async fn client_with_retry(host: &str, port: u16) -> Result<Client<TcpStream>, std::io::Error> {
    let try_connect = || async move {
        let stream = TcpStream::connect((host, port)).await?;

        let mut client = Client::new(stream);

        let Some(_) = client.read_response().await? else {
            return Err(std::io::Error::other("missing IMAP greeting"));
        };

        Ok(client)
    };

    let mut attempts = 60u8;
    loop {
        let err = match try_connect().await {
            Ok(client) => return Ok(client),
            Err(err) => err,
        };

        let Some(attempts_left) = attempts.checked_sub(1) else {
            return Err(err);
        };

        attempts = attempts_left;
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
}

/// Connects and logs in, retrying until the server is ready.
pub async fn login_with_retry(
    host: &str,
    port: u16,
    user: &str,
    password: &str,
) -> Result<async_imap::Session<TcpStream>, std::io::Error> {
    let client = client_with_retry(host, port).await?;

    client
        .login(user, password)
        .await
        .map_err(|(err, _)| std::io::Error::other(err))
}

/// Full bodies of every message in `mailbox`, in sequence order.
pub async fn mailbox_bodies(
    session: &mut async_imap::Session<TcpStream>,
    mailbox: &str,
) -> Result<Vec<Vec<u8>>, async_imap::error::Error> {
    let selected = session.select(mailbox).await?;
    if selected.exists == 0 {
        return Ok(Vec::new());
    }

    let fetches: Vec<_> = session
        .fetch(format!("1:{}", selected.exists), "RFC822")
        .await?
        .try_collect()
        .await?;

    Ok(fetches
        .iter()
        .filter_map(|fetch| fetch.body().map(<[u8]>::to_vec))
        .collect())
}
