//! GreenMail container helpers.

use testcontainers::{
    GenericImage, ImageExt as _, core::IntoContainerPort as _, runners::AsyncRunner as _,
};

/// A mail account on the test server.
#[derive(Debug, Clone, Copy)]
pub struct Account<'a> {
    /// Login name.
    pub login: &'a str,

    /// Password.
    pub password: &'a str,

    /// Mail address delivered to this account.
    pub address: &'a str,
}

/// Starts a GreenMail container with IMAP and SMTP and the given accounts.
pub async fn start_greenmail(
    accounts: &[Account<'_>],
) -> Result<testcontainers::ContainerAsync<GenericImage>, testcontainers::TestcontainersError> {
    let users = accounts
        .iter()
        .map(|account| {
            let domain = account
                .address
                .split_once('@')
                .map_or("localhost", |(_, domain)| domain);
            format!("{}:{}@{domain}", account.login, account.password)
        })
        .collect::<Vec<_>>()
        .join(",");

    let container = GenericImage::new("greenmail/standalone", "latest")
        .with_exposed_port(crate::IMAP_PORT.tcp())
        .with_exposed_port(crate::SMTP_PORT.tcp())
        .with_wait_for(testcontainers::core::WaitFor::message_on_stdout(
            "Starting GreenMail API server at",
        ))
        .with_env_var(
            "GREENMAIL_OPTS",
            format!(
                "-Dgreenmail.setup.test.all -Dgreenmail.hostname=0.0.0.0 -Dgreenmail.users={users}"
            ),
        )
        .start()
        .await?;

    Ok(container)
}
