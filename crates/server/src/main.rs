use anyhow::Context;
use billscan_ocr::ReceiptPipeline;
use billscan_server::{router, telemetry, AppState, ServerConfig};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load().context("Failed to load configuration")?;
    telemetry::init(config.log_format).context("Failed to initialize logging")?;

    let backend = config.ocr.build_backend().context("Failed to set up OCR backend")?;
    let pipeline = ReceiptPipeline::from_shared(backend);
    tracing::info!(backend = pipeline.backend_name(), lang = %config.ocr.lang, "OCR backend ready");

    let app = router(AppState::new(pipeline), config.max_upload_bytes);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Server listening on {}", addr);
    tracing::info!("  POST /upload  - receipt image → extracted fields");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
