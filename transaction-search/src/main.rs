//! Transaction search service entry point.

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use transaction_search::http::create_router;
use transaction_search::{AppError, Dependencies, LogFormat, Settings};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenv::dotenv().ok();

    let settings = Settings::from_env()?;
    init_tracing(settings.log_format);

    if let Err(e) = run(settings).await {
        error!(error = %e, "Transaction search service failed");
        return Err(e);
    }

    Ok(())
}

async fn run(settings: Settings) -> Result<(), AppError> {
    let dependencies = Dependencies::new(&settings).await?;
    let app = create_router(dependencies.state);

    let listener = TcpListener::bind(settings.listen_addr).await?;
    info!(addr = %settings.listen_addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
