use common::TelemetryGuard;
use gateway::{
    AppState, get_configuration,
    logging::{SERVICE_NAME, setup_logging},
    router,
};
use inference::Detector;
use std::sync::Arc;

#[cfg(feature = "ort-backend")]
use inference::backend::ort::OrtBackend as Backend;

#[cfg(not(feature = "ort-backend"))]
compile_error!("The 'ort-backend' feature must be enabled");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = get_configuration()?;

    let _telemetry = config
        .otel_endpoint
        .as_ref()
        .map(|endpoint| TelemetryGuard::init(SERVICE_NAME, endpoint))
        .transpose()?;

    setup_logging(&config);

    tracing::info!(
        config = ?config,
        "Loaded configuration"
    );
    config.validate()?;

    let detector = Arc::new(Detector::new::<Backend>(config.inference.clone()));

    if config.inference.eager_load {
        let warm = Arc::clone(&detector);
        tokio::task::spawn_blocking(move || warm.warm_up()).await??;
    }

    let app = router(AppState::new(detector, &config.server));

    let addr = config.server.address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Detection server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
