use clap::Parser;
use stratusd::{AppState, Endpoints};
use tokio::net::TcpListener;

#[derive(Debug, Parser)]
#[command(name = "stratusd", version, about = "Stratus provisioning daemon")]
struct Cli {
    /// Address the HTTP server binds to
    #[arg(long, env = "STRATUSD_BIND", default_value = "0.0.0.0:8080")]
    bind: String,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "STRATUSD_LOG", default_value = "info")]
    log: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log)),
        )
        .init();

    let state = AppState::new(Endpoints::default());
    let app = stratusd::router(state);

    let listener = TcpListener::bind(&cli.bind).await?;
    tracing::info!(addr = %cli.bind, "stratusd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown signal received");
    }
}
