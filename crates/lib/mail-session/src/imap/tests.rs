use core::time::Duration;

use crate::testing::scripted_session;
use crate::{Command, Error, FetchFailure, MailSession as _, MessageRef, MessageUid, ParseError, SearchFilter};

const TIMEOUT: Duration = Duration::from_secs(5);

fn message(seq: u32) -> MessageRef {
    MessageRef::new(seq).unwrap()
}

fn uid(uid: u32) -> MessageUid {
    MessageUid::new(uid).unwrap()
}

#[tokio::test]
async fn search_returns_sorted_matches() {
    let (mut session, server) = scripted_session(
        &["* SEARCH 3 1 2\r\n{tag} OK SEARCH completed\r\n"],
        TIMEOUT,
    )
    .await;

    let result = session
        .search(&SearchFilter::from_sender("camera@example.com"))
        .await
        .unwrap();

    let seqs: Vec<u32> = result.as_slice().iter().map(|r| r.get()).collect();
    assert_eq!(seqs, [1, 2, 3]);
    assert!(
        server.commands()[1].ends_with(r#"SEARCH FROM "camera@example.com""#),
        "{:?}",
        server.commands()
    );
}

#[tokio::test]
async fn search_without_matches_is_empty() {
    let (mut session, _server) =
        scripted_session(&["* SEARCH\r\n{tag} OK SEARCH completed\r\n"], TIMEOUT).await;

    let result = session
        .search(&SearchFilter::from_sender("nobody@example.com"))
        .await
        .unwrap();

    assert!(result.is_empty());
}

#[tokio::test]
async fn rejected_search_is_a_protocol_error() {
    let (mut session, _server) =
        scripted_session(&["{tag} BAD Could not parse command\r\n"], TIMEOUT).await;

    let error = session
        .search(&SearchFilter::from_sender("camera@example.com"))
        .await
        .unwrap_err();

    assert!(
        matches!(
            error,
            Error::Protocol {
                command: Command::Search,
                ..
            }
        ),
        "{error:?}"
    );
    assert!(!error.is_connection_lost());
}

#[tokio::test]
async fn fetch_uid_reads_the_uid_item() {
    let (mut session, server) = scripted_session(
        &["* 2 FETCH (UID 42)\r\n{tag} OK FETCH completed\r\n"],
        TIMEOUT,
    )
    .await;

    let fetched = session.fetch_uid(message(2)).await.unwrap();

    assert_eq!(fetched, uid(42));
    assert!(server.commands()[1].ends_with("FETCH 2 (UID)"), "{:?}", server.commands());
}

#[tokio::test]
async fn fetch_uid_without_response_is_a_parse_error() {
    let (mut session, _server) =
        scripted_session(&["{tag} OK FETCH completed\r\n"], TIMEOUT).await;

    let error = session.fetch_uid(message(2)).await.unwrap_err();

    assert!(
        matches!(error, Error::Parse(ParseError::MissingResponse { .. })),
        "{error:?}"
    );
}

#[tokio::test]
async fn fetch_body_returns_raw_bytes() {
    let raw = "From: camera@example.com\r\nTo: me@example.com\r\n\r\nmotion\r\n";
    let reply = format!(
        "* 1 FETCH (RFC822 {{{}}}\r\n{raw})\r\n{{tag}} OK FETCH completed\r\n",
        raw.len()
    );
    let (mut session, _server) = scripted_session(&[&reply], TIMEOUT).await;

    let fetched = session.fetch_body(message(1)).await.unwrap();

    assert_eq!(fetched.as_bytes(), raw.as_bytes());
}

#[tokio::test]
async fn fetch_body_without_data() {
    let (mut session, _server) =
        scripted_session(&["{tag} OK FETCH completed\r\n"], TIMEOUT).await;

    let error = session.fetch_body(message(1)).await.unwrap_err();

    assert!(
        matches!(
            error,
            Error::Fetch {
                reason: FetchFailure::NoData,
                ..
            }
        ),
        "{error:?}"
    );
}

#[tokio::test]
async fn rejected_copy_is_a_protocol_error() {
    let (mut session, _server) =
        scripted_session(&["{tag} NO [TRYCREATE] No such mailbox\r\n"], TIMEOUT).await;

    let error = session.copy_to_folder(uid(7), "Archived").await.unwrap_err();

    assert!(
        matches!(
            error,
            Error::Protocol {
                command: Command::Copy,
                ..
            }
        ),
        "{error:?}"
    );
}

#[tokio::test]
async fn mark_deleted_and_expunge() {
    let (mut session, server) = scripted_session(
        &[
            "* 1 FETCH (FLAGS (\\Deleted) UID 7)\r\n{tag} OK STORE completed\r\n",
            "* 1 EXPUNGE\r\n{tag} OK EXPUNGE completed\r\n",
        ],
        TIMEOUT,
    )
    .await;

    session.mark_deleted(uid(7)).await.unwrap();
    let expunged = session.expunge().await.unwrap();

    assert_eq!(expunged, [message(1)]);
    let commands = server.commands();
    assert!(commands[1].ends_with(r"UID STORE 7 +FLAGS (\Deleted)"), "{commands:?}");
    assert!(commands[2].ends_with("EXPUNGE"), "{commands:?}");
}

#[tokio::test]
async fn close_is_idempotent() {
    let (mut session, server) =
        scripted_session(&["* BYE\r\n{tag} OK LOGOUT completed\r\n"], TIMEOUT).await;

    session.close().await;
    session.close().await;

    assert!(session.is_closed());
    let logouts = server
        .commands()
        .iter()
        .filter(|command| command.ends_with("LOGOUT"))
        .count();
    assert_eq!(logouts, 1);
}

#[tokio::test]
async fn operations_after_close_fail() {
    let (mut session, _server) =
        scripted_session(&["* BYE\r\n{tag} OK LOGOUT completed\r\n"], TIMEOUT).await;
    session.close().await;

    let error = session.expunge().await.unwrap_err();

    assert!(matches!(error, Error::Closed), "{error:?}");
    assert!(error.is_connection_lost());
}

#[tokio::test(start_paused = true)]
async fn unanswered_command_times_out() {
    let (mut session, _server) = scripted_session(&[], Duration::from_secs(30)).await;

    let error = session.fetch_uid(message(1)).await.unwrap_err();

    assert!(
        matches!(
            error,
            Error::Timeout {
                command: Command::Fetch,
                ..
            }
        ),
        "{error:?}"
    );
    assert!(error.is_connection_lost());
}

#[tokio::test(start_paused = true)]
async fn close_after_unresponsive_server_does_not_hang() {
    let (mut session, _server) = scripted_session(&[], Duration::from_secs(30)).await;

    session.close().await;

    assert!(session.is_closed());
}
