use anyhow::Result;
use assess_report_service::ReportService;
use assess_report_storage::{Pager, SubjectFilter};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// Token cancelled on Ctrl-C so a slow report stops issuing calls.
fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling report");
            trigger.cancel();
        }
    });
    token
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) async fn page(service: &ReportService, filter: SubjectFilter, page: usize, page_size: usize) -> Result<()> {
    let cancel = interrupt_token();
    let report = service.page(&filter, Pager::new(page, page_size), &cancel).await?;
    print_json(&report)
}

pub(crate) async fn detail(service: &ReportService, id: &str) -> Result<()> {
    let cancel = interrupt_token();
    let report = service.get_detail(id, &cancel).await?;
    print_json(&report)
}
