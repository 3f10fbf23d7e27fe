//! Turns a warm or cold session into reply records.
//!
//! List replies group subjects by kind and ask each kind's strategy for
//! every attribute once per group. Detail replies first warm the session's
//! caches level by level, then assemble from them.

mod detail;
mod levels;
mod page;

pub(crate) use detail::assemble_detail;
pub(crate) use page::assemble_page;
