//! Docker-backed end-to-end tests of a forwarding cycle.

use std::error::Error;
use std::time::Duration;

use imap_integration::Account;
use mail_session::MailSession as _;

const OWNER: Account<'static> = Account {
    login: "owner",
    password: "secret",
    address: "owner@example.com",
};

const TARGET: Account<'static> = Account {
    login: "target",
    password: "secret",
    address: "target@example.org",
};

const CAMERA: &str = "camera@example.com";
const ARCHIVE: &str = "Archived";

fn message(from: &str, subject: &str) -> String {
    format!(
        "From: {from}\r\nTo: {}\r\nSubject: {subject}\r\n\r\nSnapshot for {subject}.\r\n",
        OWNER.address
    )
}

fn contains(haystack: &[u8], needle: &str) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window == needle.as_bytes())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn forwards_and_archives_matching_messages() -> Result<(), Box<dyn Error + Send + Sync>> {
    imap_integration::require_integration_tests_enabled()?;

    let container = imap_integration::start_greenmail(&[OWNER, TARGET]).await?;

    let host = container.get_host().await?.to_string();
    let imap_port = container
        .get_host_port_ipv4(imap_integration::IMAP_PORT)
        .await?;
    let smtp_port = container
        .get_host_port_ipv4(imap_integration::SMTP_PORT)
        .await?;

    let mut admin =
        imap_integration::login_with_retry(&host, imap_port, OWNER.login, OWNER.password).await?;
    admin.create(ARCHIVE).await?;
    for (from, subject) in [
        (CAMERA, "front door"),
        ("someone@example.net", "newsletter"),
        (CAMERA, "garage"),
    ] {
        admin
            .append("INBOX", None, None, message(from, subject).as_bytes())
            .await?;
    }

    let client = imap_integration::client_with_retry(&host, imap_port).await?;
    let mut session = mail_session::open(
        client,
        mail_session::OpenParams {
            username: OWNER.login,
            password: OWNER.password,
            mailbox: "INBOX",
            archive_mailbox: ARCHIVE,
            operation_timeout: Duration::from_secs(30),
        },
    )
    .await?;

    let cycle = reconcile::Cycle {
        filter: mail_session::SearchFilter::from_sender(CAMERA),
        target: mail_forward::ForwardTarget::new(OWNER.address, TARGET.address)?,
        archive_folder: ARCHIVE.to_owned(),
    };
    let relay = mail_forward::SmtpRelay {
        host: host.clone(),
        port: smtp_port,
        security: mail_forward::SmtpSecurity::Plain,
        credentials: None,
        timeout: Duration::from_secs(30),
    };

    let report = cycle
        .run_once(&mut session, &relay, &mut futures_util::future::pending())
        .await?;
    session.close().await;
    session.close().await;

    assert_eq!(report.matched, 2);
    assert_eq!(report.forwarded, 2);
    assert_eq!(report.archived, 2);
    assert_eq!(report.failed, 0);

    let inbox = imap_integration::mailbox_bodies(&mut admin, "INBOX").await?;
    assert_eq!(inbox.len(), 1);
    assert!(contains(&inbox[0], "Subject: newsletter"));

    let archived = imap_integration::mailbox_bodies(&mut admin, ARCHIVE).await?;
    assert_eq!(archived.len(), 2);
    admin.logout().await?;

    // Delivery is asynchronous on the server side.
    let mut target =
        imap_integration::login_with_retry(&host, imap_port, TARGET.login, TARGET.password)
            .await?;
    let mut delivered = Vec::new();
    for _ in 0..40 {
        delivered = imap_integration::mailbox_bodies(&mut target, "INBOX").await?;
        if delivered.len() >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
    target.logout().await?;

    assert_eq!(delivered.len(), 2);
    for body in &delivered {
        assert!(contains(body, &format!("To: {}", TARGET.address)));
        assert!(!contains(body, &format!("To: {}", OWNER.address)));
    }
    assert!(delivered.iter().any(|body| contains(body, "Subject: front door")));
    assert!(delivered.iter().any(|body| contains(body, "Subject: garage")));

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn rejects_wrong_password() -> Result<(), Box<dyn Error + Send + Sync>> {
    imap_integration::require_integration_tests_enabled()?;

    let container = imap_integration::start_greenmail(&[OWNER]).await?;

    let host = container.get_host().await?.to_string();
    let imap_port = container
        .get_host_port_ipv4(imap_integration::IMAP_PORT)
        .await?;

    let client = imap_integration::client_with_retry(&host, imap_port).await?;
    let error = mail_session::open(
        client,
        mail_session::OpenParams {
            username: OWNER.login,
            password: "wrong",
            mailbox: "INBOX",
            archive_mailbox: ARCHIVE,
            operation_timeout: Duration::from_secs(30),
        },
    )
    .await
    .err()
    .ok_or("login with a wrong password succeeded")?;

    assert!(error.is_auth(), "{error:?}");

    Ok(())
}
