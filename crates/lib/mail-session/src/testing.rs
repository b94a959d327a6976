//! Scripted IMAP server for unit tests.

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt as _, AsyncWriteExt as _, DuplexStream};

/// Reply to a `LOGIN` command.
pub(crate) const LOGIN_OK: &str = "{tag} OK LOGIN completed\r\n";

/// Handle to the server side of a scripted connection.
pub(crate) struct ScriptedServer {
    /// Command lines received so far.
    commands: Arc<Mutex<Vec<String>>>,
}

impl ScriptedServer {
    /// Command lines received so far.
    pub(crate) fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

/// Spawn a server that answers each incoming command line with the next reply.
///
/// `{tag}` in a reply is replaced with the tag of the command being answered.
/// Once the replies run out, commands are recorded but never answered.
pub(crate) async fn scripted_client(
    replies: &[&str],
) -> (async_imap::Client<DuplexStream>, ScriptedServer) {
    let (client_side, server_side) = tokio::io::duplex(64 * 1024);
    let commands = Arc::new(Mutex::new(Vec::new()));

    let replies: Vec<String> = replies.iter().map(|reply| reply.to_string()).collect();
    let recorded = Arc::clone(&commands);
    tokio::spawn(async move {
        let (read, mut write) = tokio::io::split(server_side);
        let mut lines = tokio::io::BufReader::new(read).lines();
        write.write_all(b"* OK IMAP4rev1 ready\r\n").await.unwrap();

        let mut replies = replies.into_iter();
        while let Ok(Some(line)) = lines.next_line().await {
            let tag = line.split(' ').next().unwrap_or_default().to_owned();
            recorded.lock().unwrap().push(line);

            if let Some(reply) = replies.next() {
                let reply = reply.replace("{tag}", &tag);
                if write.write_all(reply.as_bytes()).await.is_err() {
                    break;
                }
            }
        }
    });

    let mut client = async_imap::Client::new(client_side);
    imap_connect::read_greeting(&mut client).await.unwrap();

    (client, ScriptedServer { commands })
}

/// A logged-in session on a scripted server, with `replies` queued after `LOGIN`.
pub(crate) async fn scripted_session(
    replies: &[&str],
    operation_timeout: core::time::Duration,
) -> (crate::ImapMailSession<DuplexStream>, ScriptedServer) {
    let mut all = vec![LOGIN_OK];
    all.extend_from_slice(replies);

    let (client, server) = scripted_client(&all).await;
    let session = client
        .login("user", "secret")
        .await
        .map_err(|(error, _client)| error)
        .unwrap();

    (
        crate::ImapMailSession::new(session, "INBOX", operation_timeout),
        server,
    )
}
