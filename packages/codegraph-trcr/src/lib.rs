/*
 * Codegraph TRCR - Taint Rule Compiler & Runtime
 *
 * Feature-First Architecture:
 * - shared/      : Entity facts (call sites, property reads)
 * - features/    : pattern_matching → indexing → rule_compiler → runtime
 * - config/      : Presets, section overrides, YAML v1
 *
 * Flow:
 *   AtomSpec[] ──► TaintRuleCompiler ──► RuleSet (sorted)
 *   Entity[]   ──► TieredIndex ──► TaintRuleExecutor ──► MatchSet
 */

pub mod config;
pub mod errors;
pub mod features;
pub mod shared;

pub use config::{Preset, TrcrConfig, ValidatedConfig};
pub use errors::{Result, TrcrError};
pub use features::indexing::{EntityIndex, IndexCache, TieredIndex};
pub use features::pattern_matching::{wildcard_match, CompiledPattern, PatternKind, WildcardMatcher};
pub use features::rule_compiler::{
    CompileError, CompileOutput, RuleSet, TaintRuleCompiler, TaintRuleExecutableIR, Tier,
};
pub use features::rule_spec::{
    ArgCheck, ArgConstraint, AtomKind, AtomSpec, MatchRule, MatchStrategy, Severity,
};
pub use features::runtime::{ExecutionDiagnostic, MatchSet, RuleMatch, TaintRuleExecutor};
pub use shared::models::{CallSite, Entity, EntityKind, PropertyRead, RawEntity};
