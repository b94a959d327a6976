//! Main entrypoint for the inbox forwarder.

mod logging;

/// Load the config, then poll and forward until Ctrl-C.
#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;

    let config_load::Located {
        payload: config,
        path: config_path,
    } = config_load::with_default_env_var().await?;
    let settings = config_bringup::bringup(&config)?;
    drop(config);

    logging::init(&settings.log_file)?;

    tracing::info!(
        config_path = %config_path.display(),
        imap_host = %settings.imap.host,
        imap_port = settings.imap.port,
        imap_tls_mode = ?settings.imap.tls_mode,
        imap_mailbox = %settings.imap.mailbox,
        smtp_host = %settings.smtp.host,
        smtp_port = settings.smtp.port,
        sender_filter = settings.cycle.filter.sender(),
        poll_interval = ?settings.run.poll_interval,
        "starting inbox forwarder"
    );

    let config_bringup::Settings {
        imap,
        smtp,
        cycle,
        run,
        ..
    } = settings;
    let imap = &imap;

    run_loop::run(run_loop::Params {
        config: run,
        cycle,
        transport: smtp,
        connect: move || mail_session::connect(imap.connect_params()),
        retryable: |error: &mail_session::ConnectError| !error.is_auth(),
        shutdown: shutdown_signal(),
    })
    .await?;

    tracing::info!("inbox forwarder stopped");
    Ok(())
}

/// Resolve on Ctrl-C.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received Ctrl-C, shutting down"),
        Err(error) => {
            tracing::error!(%error, "unable to listen for Ctrl-C");
            core::future::pending::<()>().await;
        }
    }
}
