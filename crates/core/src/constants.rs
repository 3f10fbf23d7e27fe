//! Shared constants for assess-report.

/// Completion window for subjects whose schedule has no explicit due date.
pub const DEFAULT_WINDOW_SECS: i64 = 7 * 24 * 60 * 60;

/// Default bound on concurrently running fetches within one aggregation phase.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Maximum page size accepted by the page query (DoS protection).
pub const MAX_PAGE_SIZE: usize = 100;

/// Page size used when the caller does not specify one.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Maximum number of IDs in one provider batch request.
pub const MAX_BATCH_IDS: usize = 500;

/// Upper bound on pooled PostgreSQL connections.
pub const PG_POOL_MAX_CONNECTIONS: u32 = 10;

pub const PG_POOL_ACQUIRE_TIMEOUT_SECS: u64 = 5;

pub const PG_POOL_IDLE_TIMEOUT_SECS: u64 = 300;
