//! HTTP provider clients for assess-report
//!
//! Every provider speaks JSON over POST: batch reads send `{"ids": [...]}`
//! and receive `{"data": [...]}`. Transient failures (transport errors,
//! 429 and 5xx) are retried by [`ProviderClient`]; the aggregation engine
//! itself never retries.

mod catalog;
mod client;
mod directory;
mod live;
mod schedule;
mod wire;


pub use catalog::HttpCatalogProvider;
pub use client::{DEFAULT_RETRY_DELAYS, ProviderClient, REQUEST_TIMEOUT, truncate};
pub use directory::HttpDirectoryProvider;
pub use live::HttpLiveSessionProvider;
pub use schedule::HttpScheduleProvider;

use assess_report_core::ProviderResult;

/// Base URLs of the four collaborator services.
#[derive(Debug, Clone, Default)]
pub struct ProviderEndpoints {
    pub schedule_url: String,
    pub catalog_url: String,
    pub directory_url: String,
    pub live_url: String,
    pub api_key: Option<String>,
}

/// One client per collaborator, ready to hand to the report service.
#[derive(Debug, Clone)]
pub struct HttpProviders {
    pub schedules: HttpScheduleProvider,
    pub catalog: HttpCatalogProvider,
    pub directory: HttpDirectoryProvider,
    pub live: HttpLiveSessionProvider,
}

impl HttpProviders {
    /// # Errors
    /// Returns an error if an HTTP client cannot be built.
    pub fn connect(endpoints: &ProviderEndpoints) -> ProviderResult<Self> {
        let client = |url: &str| ProviderClient::new(url, endpoints.api_key.clone());
        let providers = Self {
            schedules: HttpScheduleProvider::new(client(&endpoints.schedule_url)?),
            catalog: HttpCatalogProvider::new(client(&endpoints.catalog_url)?),
            directory: HttpDirectoryProvider::new(client(&endpoints.directory_url)?),
            live: HttpLiveSessionProvider::new(client(&endpoints.live_url)?),
        };
        tracing::info!(
            schedule = %endpoints.schedule_url,
            catalog = %endpoints.catalog_url,
            directory = %endpoints.directory_url,
            live = %endpoints.live_url,
            "provider clients ready"
        );
        Ok(providers)
    }
}
