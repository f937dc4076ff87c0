//! Reconciliation engine.
//!
//! Turns raw source records into the minimal set of store writes:
//!
//! ```text
//! raw records -> parse -> dedupe -> plan (against a bulk snapshot) -> execute
//! ```
//!
//! `parse`, `dedupe` and `plan` are pure; only `execute` touches the store.

mod dedupe;
mod executor;
mod parser;
mod plan;

pub use dedupe::{dedupe, Deduped};
pub use executor::{execute, ExecutionSummary};
pub use parser::{normalize_phone, parse};
pub use plan::{plan, NameUpdate, WritePlan};
