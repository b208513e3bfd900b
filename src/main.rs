use anyhow::Context;
use led_api::{api, config::Config, gpio::PinController, state::AppState, tunnel::Tunnel};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("led_api=debug".parse()?),
        )
        .init();

    tracing::info!("Starting LED API Server");

    // Override the file via LED_API_CONFIG, individual settings via LED_API_*
    let config = Config::load_with_fallback().context("Failed to load configuration")?;

    // Dropping the controller releases the pin, so every early return below
    // cleans up after it.
    let controller = PinController::initialize(&config.gpio).context("GPIO initialization failed")?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let tunnel = if config.server.debug {
        tracing::info!("Debug mode, skipping tunnel");
        None
    } else {
        Some(
            Tunnel::open(&config.tunnel, config.server.port)
                .await
                .context("Failed to open tunnel")?,
        )
    };

    let state = AppState::new(controller, tunnel.as_ref().map(|t| t.public_url().to_string()));
    let app = api::router(state.clone(), config.required_credentials());

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("LED endpoint: GET/POST /api/led");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Some(tunnel) = tunnel {
        tunnel.close().await;
    }
    state.controller.lock().await.cleanup();

    served.context("Server error")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
