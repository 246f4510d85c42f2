//! Feature modules, leaves first
//!
//! - pattern_matching - wildcard classification + cached anchored matchers
//! - indexing         - exact hash indices over an entity batch
//! - rule_spec        - declarative atoms (input)
//! - rule_compiler    - tiering, plans, scores, total order (compile time)
//! - runtime          - bounded, deterministic matching (run time)

pub mod indexing;
pub mod pattern_matching;
pub mod rule_compiler;
pub mod rule_spec;
pub mod runtime;
