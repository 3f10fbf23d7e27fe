use anyhow::Result;
use assess_report_http::{AppState, create_router};
use assess_report_service::ReportService;

pub(crate) async fn run(service: ReportService, port: u16, host: String) -> Result<()> {
    let router = create_router(AppState::new(service));
    let addr = format!("{host}:{port}");
    tracing::info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutting down");
        })
        .await?;
    Ok(())
}
