pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod patients;
pub mod pipeline;

use std::error::Error;

use tracing_subscriber::EnvFilter;

/// Start the service: read configuration, build the remote client, serve the
/// API until Ctrl-C. Exits the process with status 1 on startup failure.
pub fn run() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    if let Err(e) = serve() {
        tracing::error!("{} failed: {e}", config::APP_NAME);
        std::process::exit(1);
    }
}

fn serve() -> Result<(), Box<dyn Error>> {
    let config = config::AppConfig::from_env()?;

    // reqwest::blocking owns an internal runtime: build it (and drop it)
    // outside of ours.
    let llm = config::build_llm_client(&config)?;

    db::open_database(&config.db_path)?;
    tracing::info!(path = %config.db_path.display(), "Database ready");

    let ctx = api::ApiContext::new(llm.clone(), config.db_path.clone());
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let server = api::start_api_server_on(ctx, config.bind_addr).await?;
        tracing::info!(addr = %server.addr, "Listening; press Ctrl-C to stop");

        tokio::signal::ctrl_c().await?;
        tracing::info!("Ctrl-C received, shutting down");
        server.stop().await;
        Ok::<(), Box<dyn Error>>(())
    })?;

    drop(runtime);
    drop(llm);
    Ok(())
}
