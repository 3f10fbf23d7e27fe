use std::sync::Arc;

use anyhow::Result;
use assess_report_core::{SubjectKind, SubjectStatus};
use assess_report_providers::{HttpProviders, ProviderEndpoints};
use assess_report_service::{Providers, ReportConfig, ReportService};
use assess_report_storage::StorageBackend;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "assess-report")]
#[command(about = "Assessment report aggregation service", long_about = None)]
struct Cli {
    #[command(flatten)]
    backend: BackendArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct BackendArgs {
    /// PostgreSQL repository; the in-memory repository is used when unset.
    #[arg(long, env = "ASSESS_REPORT_DATABASE_URL", global = true)]
    database_url: Option<String>,
    #[arg(long, env = "ASSESS_REPORT_SCHEDULE_URL", default_value = "http://127.0.0.1:9001", global = true)]
    schedule_url: String,
    #[arg(long, env = "ASSESS_REPORT_CATALOG_URL", default_value = "http://127.0.0.1:9002", global = true)]
    catalog_url: String,
    #[arg(long, env = "ASSESS_REPORT_DIRECTORY_URL", default_value = "http://127.0.0.1:9003", global = true)]
    directory_url: String,
    #[arg(long, env = "ASSESS_REPORT_LIVE_URL", default_value = "http://127.0.0.1:9004", global = true)]
    live_url: String,
    #[arg(long, env = "ASSESS_REPORT_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API.
    Serve {
        #[arg(short, long, default_value = "8080")]
        port: u16,
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,
    },
    /// Print one page of subject reports as JSON.
    Page {
        #[arg(long, default_value = "1")]
        page: usize,
        #[arg(long, default_value = "20")]
        page_size: usize,
        /// Comma-separated kinds, e.g. `online_class,review_study`.
        #[arg(long, value_delimiter = ',')]
        kinds: Vec<SubjectKind>,
        #[arg(long, value_delimiter = ',')]
        statuses: Vec<SubjectStatus>,
        #[arg(long)]
        teacher: Option<String>,
        #[arg(long)]
        title: Option<String>,
    },
    /// Print the detail report of one subject as JSON.
    Detail { id: String },
}

async fn build_storage(database_url: Option<&str>) -> Result<StorageBackend> {
    match database_url {
        #[cfg(feature = "postgres")]
        Some(url) => {
            let storage = StorageBackend::new_postgres(url).await?;
            tracing::info!("Connected to PostgreSQL repository");
            Ok(storage)
        },
        #[cfg(not(feature = "postgres"))]
        Some(_) => anyhow::bail!("a database URL was given but this binary was built without the `postgres` feature"),
        None => {
            tracing::warn!("ASSESS_REPORT_DATABASE_URL not set, using an empty in-memory repository");
            Ok(StorageBackend::new_memory())
        },
    }
}

async fn build_service(args: &BackendArgs) -> Result<ReportService> {
    let storage = Arc::new(build_storage(args.database_url.as_deref()).await?);
    let http = HttpProviders::connect(&ProviderEndpoints {
        schedule_url: args.schedule_url.clone(),
        catalog_url: args.catalog_url.clone(),
        directory_url: args.directory_url.clone(),
        live_url: args.live_url.clone(),
        api_key: args.api_key.clone(),
    })?;
    let providers = Providers {
        schedules: Arc::new(http.schedules),
        catalog: Arc::new(http.catalog),
        directory: Arc::new(http.directory),
        live: Arc::new(http.live),
    };
    let config = ReportConfig::from_env();
    tracing::debug!(?config, "report configuration loaded");
    Ok(ReportService::new(storage, providers, config))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let service = build_service(&cli.backend).await?;

    match cli.command {
        Commands::Serve { port, host } => commands::serve::run(service, port, host).await,
        Commands::Page { page, page_size, kinds, statuses, teacher, title } => {
            let filter = assess_report_storage::SubjectFilter { kinds, statuses, teacher_id: teacher, title };
            commands::report::page(&service, filter, page, page_size).await
        },
        Commands::Detail { id } => commands::report::detail(&service, &id).await,
    }
}
