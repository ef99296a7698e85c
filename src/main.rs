use clap::Parser;
use concierge::cli::Cli;
use concierge::config::Settings;
use concierge::AppContext;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let settings = Settings::new_with_cli(&cli)?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let context = AppContext::new(settings)?;

    let report = context.registry.initialize().await;
    if report.failed > 0 || report.skipped > 0 {
        warn!(
            skipped = report.skipped,
            failed = report.failed,
            "Some agents were not registered"
        );
    }

    let (listener, port) = bind(&context.settings).await?;
    info!(
        base_url = %context.settings.base_url_for_port(port),
        agents = report.loaded,
        "Concierge listening"
    );

    let app = concierge::create_app(&context);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Bind the configured port, falling back to each fallback port in order
async fn bind(settings: &Settings) -> anyhow::Result<(TcpListener, u16)> {
    let ports = settings.candidate_ports();
    for port in &ports {
        let addr = format!("{}:{}", settings.server.host, port);
        match TcpListener::bind(&addr).await {
            Ok(listener) => return Ok((listener, *port)),
            Err(e) => warn!(%addr, error = %e, "Port unavailable"),
        }
    }
    anyhow::bail!(
        "Could not bind {} on any of ports {:?}",
        settings.server.host,
        ports
    )
}
