//! Storage layer for assess-report
//!
//! Repository traits over subjects and their review rows, with an in-memory
//! backend and an optional PostgreSQL backend (`postgres` feature).

mod backend;
pub mod error;
mod memory;
#[cfg(feature = "postgres")]
mod pg_migrations;
#[cfg(feature = "postgres")]
pub mod pg_storage;
#[cfg(test)]
mod tests;
pub mod traits;
mod types;

pub use backend::StorageBackend;
pub use error::StorageError;
pub use memory::MemoryStorage;
#[cfg(feature = "postgres")]
pub use pg_storage::PgStorage;
pub use traits::{AssessmentStore, Repository, SubjectStore, UpdateStore};
pub use types::{PaginatedResult, Pager, SubjectFilter, SubjectUpdate, SubjectUserUpdate};
