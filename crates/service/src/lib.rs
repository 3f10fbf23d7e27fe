//! Service layer for assess-report
//!
//! Aggregation sessions, per-kind report strategies, the report assembler and
//! the submit operations, behind [`ReportService`].

#![allow(missing_docs, reason = "Internal crate with self-explanatory API")]
#![allow(clippy::missing_errors_doc, reason = "Errors are self-explanatory from Result types")]
#![allow(missing_debug_implementations, reason = "Internal types")]
#![allow(clippy::missing_docs_in_private_items, reason = "Internal crate")]
#![allow(clippy::implicit_return, reason = "Implicit return is idiomatic Rust")]
#![allow(clippy::question_mark_used, reason = "? operator is idiomatic Rust")]
#![allow(clippy::cognitive_complexity, reason = "Complex async flows are inherent")]
#![allow(clippy::min_ident_chars, reason = "Short error vars are idiomatic")]

mod assembler;
pub mod config;
mod error;
pub mod outcome;
pub mod report;
mod report_service;
pub mod session;
mod submit;
pub mod variant;

#[cfg(test)]
mod tests;

pub use config::ReportConfig;
pub use error::{ServiceError, ServiceResult};
pub use report::{DetailReport, PageReport, SubjectReport};
pub use report_service::ReportService;
pub use session::{AggregationSession, Providers, ReportMode};
pub use submit::{
    ContentEdit, OutcomeEdit, ScoreEdit, StudentEdit, SubmitAction, SubmitReceipt, SubmitRequest,
};
