//! Repository trait abstraction
//!
//! Async domain traits for subject persistence. The aggregation engine only
//! reads through [`SubjectStore`] and [`AssessmentStore`]; mutations go
//! through the single atomic [`UpdateStore::update_subjects_tx`].

pub mod assessment;
pub mod subject;
pub mod update;

pub use assessment::AssessmentStore;
pub use subject::SubjectStore;
pub use update::UpdateStore;

/// Every capability the report service needs from the relational store.
pub trait Repository: SubjectStore + AssessmentStore + UpdateStore {}

impl<T: SubjectStore + AssessmentStore + UpdateStore> Repository for T {}
