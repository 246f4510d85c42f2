//! Runtime Executor
//!
//! Matches entity batches against a sorted `RuleSet` using the tiered index,
//! bounded per rule by candidate count and time budget. Output is
//! deterministic: rule order, then entity discovery order.

mod executor;
mod generate;
mod result;

pub use executor::TaintRuleExecutor;
pub use generate::{generate_candidates, Candidates};
pub use result::{ExecutionDiagnostic, ExecutionStats, MatchSet, RuleMatch};
