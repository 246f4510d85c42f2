//! Executable rule IR
//!
//! `TaintRuleExecutableIR` is the compiled, immutable form of one match rule.
//! Everything the runtime needs (generator plan, predicate plan, scores) is
//! computed once here so matching never re-classifies patterns.

use crate::features::pattern_matching::{CompiledPattern, PatternKind, WildcardMatcher};
use crate::features::rule_spec::{AtomKind, Severity};
use crate::shared::models::{Entity, EntityKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Precision/cost class of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Exact patterns only
    Tier1,
    /// One single-wildcard shape (suffix/prefix/contains)
    Tier2,
    /// Multiple wildcards, general patterns or a declared fuzzy strategy
    Tier3,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Tier1 => "tier1",
            Tier::Tier2 => "tier2",
            Tier::Tier3 => "tier3",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pattern type selecting the tier confidence adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternType {
    Exact,
    Suffix,
    Prefix,
    Contains,
    /// Tier 3 reached through pattern shape alone
    General,
    /// Declared `trigram` strategy
    Trigram,
    /// Declared `fuzzy`/`fallback` strategy
    Fallback,
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::Exact => "exact",
            PatternType::Suffix => "suffix",
            PatternType::Prefix => "prefix",
            PatternType::Contains => "contains",
            PatternType::General => "general",
            PatternType::Trigram => "trigram",
            PatternType::Fallback => "fallback",
        }
    }
}

/// Which member a rule targets, plus its receiver type pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulePatterns {
    pub target: EntityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_type: Option<CompiledPattern>,
    /// `call` or `read` pattern, per `target`
    pub member: CompiledPattern,
}

impl RulePatterns {
    pub fn iter(&self) -> impl Iterator<Item = &CompiledPattern> {
        self.base_type.iter().chain(std::iter::once(&self.member))
    }

    pub fn wildcard_count(&self) -> usize {
        self.iter().map(CompiledPattern::wildcard_count).sum()
    }

    pub fn literal_length(&self) -> usize {
        self.iter().map(CompiledPattern::literal_length).sum()
    }
}

// ============================================================================
// Generator plan
// ============================================================================

/// Index a generator queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexTarget {
    TypeCall,
    Call,
    TypeRead,
}

impl IndexTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexTarget::TypeCall => "type_call",
            IndexTarget::Call => "call",
            IndexTarget::TypeRead => "type_read",
        }
    }
}

/// Component of a composite key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyField {
    BaseType,
    Member,
}

/// How the index is queried
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "lookup", rename_all = "snake_case")]
pub enum Lookup {
    /// Direct hash lookup by the full key
    Exact,
    /// Scan the index's key set and filter keys by pattern shape
    KeyScan,
    /// Scan keys whose `field` contains `anchor`, then apply the general matcher
    LiteralScan { field: KeyField, anchor: String },
}

impl Lookup {
    pub fn name(&self) -> &'static str {
        match self {
            Lookup::Exact => "exact",
            Lookup::KeyScan => "key_scan",
            Lookup::LiteralScan { .. } => "literal_scan",
        }
    }
}

/// Candidate-generation plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorExec {
    pub target: IndexTarget,
    pub lookup: Lookup,
    /// Whether the base-type pattern is enforced by the generator
    /// (otherwise it is a predicate step)
    pub filters_base_type: bool,
    pub cost_hint: u32,
    pub estimated_candidates: usize,
    /// Expected compiled-matcher cache hit rate while generating
    pub expected_cache_hit_rate: f64,
}

// ============================================================================
// Predicate plan
// ============================================================================

/// One structural check on a candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum Predicate {
    /// Receiver type is known and matches
    BaseType { pattern: CompiledPattern },
    /// Argument exists
    ArgPresent { position: usize },
    /// Argument is a compile-time constant
    ArgConst { position: usize },
    /// Argument is not a constant; unknown constness passes guarded
    ArgNotConst { position: usize },
    /// Argument descriptor matches
    ArgMatches {
        position: usize,
        pattern: CompiledPattern,
    },
}

/// Result of one predicate on one candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Pass,
    /// Passed on weaker evidence
    Guarded,
    Fail,
}

impl Predicate {
    /// Relative evaluation cost
    pub fn cost(&self) -> u32 {
        match self {
            Predicate::ArgPresent { .. } => 1,
            Predicate::ArgConst { .. } | Predicate::ArgNotConst { .. } => 1,
            Predicate::BaseType { pattern } => 1 + pattern.kind().eval_cost(),
            Predicate::ArgMatches { pattern, .. } => 1 + pattern.kind().eval_cost(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Predicate::BaseType { .. } => "base_type",
            Predicate::ArgPresent { .. } => "arg_present",
            Predicate::ArgConst { .. } => "arg_const",
            Predicate::ArgNotConst { .. } => "arg_not_const",
            Predicate::ArgMatches { .. } => "arg_matches",
        }
    }

    pub fn check(&self, entity: &Entity, matcher: &WildcardMatcher, case_sensitive: bool) -> Check {
        let pass = |ok: bool| if ok { Check::Pass } else { Check::Fail };

        match self {
            Predicate::BaseType { pattern } => match entity.base_type() {
                Some(base_type) => pass(matcher.matches(pattern, base_type, case_sensitive)),
                None => Check::Fail,
            },
            Predicate::ArgPresent { position } => {
                pass(entity.as_call().is_some_and(|c| *position < c.args.len()))
            }
            Predicate::ArgConst { position } => pass(entity.as_call().is_some_and(|c| {
                *position < c.args.len() && c.is_const.get(position) == Some(&true)
            })),
            Predicate::ArgNotConst { position } => match entity.as_call() {
                Some(c) if *position < c.args.len() => match c.is_const.get(position) {
                    Some(false) => Check::Pass,
                    Some(true) => Check::Fail,
                    None => Check::Guarded,
                },
                _ => Check::Fail,
            },
            Predicate::ArgMatches { position, pattern } => pass(
                entity
                    .as_call()
                    .and_then(|c| c.args.get(*position))
                    .is_some_and(|arg| matcher.matches(pattern, arg, case_sensitive)),
            ),
        }
    }
}

/// Outcome of running a predicate plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateOutcome {
    Pass { guarded: bool },
    /// Index of the first failing step
    Fail { step: usize },
}

/// Ordered, short-circuiting checks (cheapest first)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateExec {
    pub steps: Vec<Predicate>,
    /// Cost when every step runs
    pub total_cost: u32,
    /// Cost when the first step fails (0 for an empty plan)
    pub best_case_cost: u32,
}

impl PredicateExec {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn evaluate(&self, entity: &Entity, matcher: &WildcardMatcher, case_sensitive: bool) -> PredicateOutcome {
        let mut guarded = false;
        for (step, predicate) in self.steps.iter().enumerate() {
            match predicate.check(entity, matcher, case_sensitive) {
                Check::Pass => {}
                Check::Guarded => guarded = true,
                Check::Fail => return PredicateOutcome::Fail { step },
            }
        }
        PredicateOutcome::Pass { guarded }
    }
}

// ============================================================================
// Scores
// ============================================================================

/// Structural score used for ordering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Specificity {
    pub final_score: f64,
    pub wildcard_count: usize,
    pub literal_length: usize,
}

/// Calibrated `[0, 1]` match reliability
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Confidence {
    pub base: f64,
    pub adjustment: f64,
    /// `base + adjustment`, within `[0, 1]`
    pub value: f64,
    pub min_report_threshold: f64,
}

impl Confidence {
    pub fn should_report(&self) -> bool {
        self.value >= self.min_report_threshold
    }
}

// ============================================================================
// Effect and metadata
// ============================================================================

/// What a match marks the entity as
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    pub kind: AtomKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityMetadata {
    pub severity: Severity,
    pub cwe: Vec<String>,
    pub owasp: Vec<String>,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TracePolicy {
    #[default]
    Off,
    /// `trace!` every candidate decision
    Verbose,
}

// ============================================================================
// Executable rule
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaintRuleExecutableIR {
    /// blake3 fingerprint of identity, tier and patterns
    pub compiled_id: String,
    /// `{atom_id}#{match_rule_index}`
    pub rule_id: String,
    pub atom_id: String,
    pub tier: Tier,
    pub pattern_type: PatternType,
    pub patterns: RulePatterns,
    pub generator_exec: GeneratorExec,
    pub predicate_exec: PredicateExec,
    pub specificity: Specificity,
    pub confidence: Confidence,
    pub effect: Effect,
    pub metadata: SecurityMetadata,
    pub trace: TracePolicy,
    pub compiled_at: DateTime<Utc>,
}

impl TaintRuleExecutableIR {
    /// Primary (member) pattern shape
    pub fn member_kind(&self) -> &PatternKind {
        self.patterns.member.kind()
    }

    pub fn is_verbose(&self) -> bool {
        self.trace == TracePolicy::Verbose
    }

    /// One-line diagnostic summary
    pub fn explain(&self) -> String {
        let pattern = match &self.patterns.base_type {
            Some(base_type) => format!("{}.{}", base_type, self.patterns.member),
            None => self.patterns.member.to_string(),
        };
        format!(
            "{} [{}/{}] {} {} via {}:{} (cost {}, ~{} candidates, {} predicates) specificity {:.2} (wildcards {}, literals {}) confidence {:.2}",
            self.rule_id,
            self.tier,
            self.pattern_type.as_str(),
            self.patterns.target,
            pattern,
            self.generator_exec.target.as_str(),
            self.generator_exec.lookup.name(),
            self.generator_exec.cost_hint,
            self.generator_exec.estimated_candidates,
            self.predicate_exec.steps.len(),
            self.specificity.final_score,
            self.specificity.wildcard_count,
            self.specificity.literal_length,
            self.confidence.value,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{CallSite, PropertyRead};

    fn call_with_args() -> Entity {
        CallSite::new("c", "execute")
            .with_base_type("sqlite3.Cursor")
            .with_arg("query", Some(false))
            .with_arg("params", None)
            .with_arg("\"literal\"", Some(true))
            .into()
    }

    #[test]
    fn test_arg_predicates() {
        let m = WildcardMatcher::default();
        let e = call_with_args();

        assert_eq!(Predicate::ArgNotConst { position: 0 }.check(&e, &m, false), Check::Pass);
        assert_eq!(Predicate::ArgNotConst { position: 1 }.check(&e, &m, false), Check::Guarded);
        assert_eq!(Predicate::ArgNotConst { position: 2 }.check(&e, &m, false), Check::Fail);
        assert_eq!(Predicate::ArgNotConst { position: 9 }.check(&e, &m, false), Check::Fail);
        assert_eq!(Predicate::ArgConst { position: 2 }.check(&e, &m, false), Check::Pass);
        assert_eq!(Predicate::ArgConst { position: 1 }.check(&e, &m, false), Check::Fail);
        assert_eq!(Predicate::ArgPresent { position: 2 }.check(&e, &m, false), Check::Pass);
        assert_eq!(Predicate::ArgPresent { position: 3 }.check(&e, &m, false), Check::Fail);

        let p = Predicate::ArgMatches {
            position: 1,
            pattern: CompiledPattern::parse("par*").unwrap(),
        };
        assert_eq!(p.check(&e, &m, false), Check::Pass);
    }

    #[test]
    fn test_base_type_predicate_requires_type() {
        let m = WildcardMatcher::default();
        let p = Predicate::BaseType {
            pattern: CompiledPattern::parse("*.Request").unwrap(),
        };
        let typed: Entity = PropertyRead::new("r", "args").with_base_type("flask.Request").into();
        let untyped: Entity = PropertyRead::new("r", "args").into();

        assert_eq!(p.check(&typed, &m, false), Check::Pass);
        assert_eq!(p.check(&untyped, &m, false), Check::Fail);
    }

    #[test]
    fn test_plan_short_circuits_and_tracks_guard() {
        let m = WildcardMatcher::default();
        let e = call_with_args();

        let plan = PredicateExec {
            steps: vec![
                Predicate::ArgNotConst { position: 1 },
                Predicate::ArgPresent { position: 0 },
            ],
            total_cost: 2,
            best_case_cost: 1,
        };
        assert_eq!(plan.evaluate(&e, &m, false), PredicateOutcome::Pass { guarded: true });

        let plan = PredicateExec {
            steps: vec![
                Predicate::ArgPresent { position: 0 },
                Predicate::ArgConst { position: 0 },
                Predicate::ArgNotConst { position: 1 },
            ],
            total_cost: 3,
            best_case_cost: 1,
        };
        assert_eq!(plan.evaluate(&e, &m, false), PredicateOutcome::Fail { step: 1 });

        assert_eq!(
            PredicateExec::default().evaluate(&e, &m, false),
            PredicateOutcome::Pass { guarded: false }
        );
    }

    #[test]
    fn test_should_report() {
        let c = Confidence {
            base: 0.6,
            adjustment: -0.1,
            value: 0.5,
            min_report_threshold: 0.7,
        };
        assert!(!c.should_report());
        assert!(Confidence { min_report_threshold: 0.5, ..c }.should_report());
    }
}
