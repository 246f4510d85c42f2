//! Rule Compiler
//!
//! Compiles atoms into `TaintRuleExecutableIR` values and sorts them into a
//! `RuleSet` with a strict total order.

mod classify;
mod compiler;
mod error;
mod generator;
mod ir;
mod ordering;
mod predicate;
mod scoring;

pub use classify::classify;
pub use compiler::{CompileOutput, TaintRuleCompiler};
pub use error::{CompileError, CompileResult};
pub use generator::{generator_options, plan_generator};
pub use ir::{
    Check, Confidence, Effect, GeneratorExec, IndexTarget, KeyField, Lookup, PatternType,
    Predicate, PredicateExec, PredicateOutcome, RulePatterns, SecurityMetadata, Specificity,
    TaintRuleExecutableIR, Tier, TracePolicy,
};
pub use ordering::RuleSet;
pub use predicate::plan_predicates;
pub use scoring::{base_confidence, confidence, specificity, tier_adjustment};
