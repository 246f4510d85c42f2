//! Taint rule compiler
//!
//! ```text
//! AtomSpec ──► per match rule:
//!   1. parse + classify patterns    (Tier 1/2/3, pattern type)
//!   2. plan generator               (cheapest index lookup)
//!   3. plan predicates              (cheapest-first, short-circuit)
//!   4. specificity                  (structural score)
//!   5. confidence                   (tier base + adjustment, must stay in [0, 1])
//!   6. identity + metadata + timestamp
//! ```
//!
//! Each match rule compiles to one `TaintRuleExecutableIR` with id
//! `{atom_id}#{index}`. Failures are per rule; the rest of the set still
//! compiles.

use super::classify::classify;
use super::error::{CompileError, CompileResult};
use super::generator::plan_generator;
use super::ir::{
    Effect, PatternType, PredicateExec, RulePatterns, SecurityMetadata, TaintRuleExecutableIR,
    Tier, TracePolicy,
};
use super::ordering::RuleSet;
use super::predicate::plan_predicates;
use super::scoring;
use crate::config::ValidatedConfig;
use crate::errors::TrcrError;
use crate::features::pattern_matching::CompiledPattern;
use crate::features::rule_spec::{AtomSpec, MatchRule};
use crate::shared::models::EntityKind;
use rustc_hash::FxHashSet;
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Result of compiling a rule-set: partial success is the normal case
#[derive(Debug, Clone, Default)]
pub struct CompileOutput {
    /// Successfully compiled rules, sorted
    pub rules: RuleSet,
    /// One entry per failed rule, in atom order
    pub errors: Vec<CompileError>,
}

impl CompileOutput {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// The rule-set, or every compile error if any rule failed
    pub fn into_strict(mut self) -> crate::errors::Result<RuleSet> {
        match self.errors.len() {
            0 => Ok(self.rules),
            1 => Err(TrcrError::Compile(self.errors.remove(0))),
            _ => Err(TrcrError::CompileBatch(self.errors)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaintRuleCompiler {
    config: ValidatedConfig,
}

impl TaintRuleCompiler {
    pub fn new(config: ValidatedConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidatedConfig {
        &self.config
    }

    /// Compile match rule `index` of `atom`
    pub fn compile_rule(&self, atom: &AtomSpec, index: usize) -> CompileResult<TaintRuleExecutableIR> {
        let rule_id = format!("{}#{}", atom.id, index);
        let rule = atom
            .match_rules
            .get(index)
            .ok_or_else(|| CompileError::MissingMatchTarget {
                rule_id: rule_id.clone(),
            })?;

        let patterns = rule_patterns(&rule_id, rule)?;
        let (tier, pattern_type) = classify(&patterns, rule.strategy);
        let generator_exec = plan_generator(&rule_id, &patterns)?;
        let predicate_exec = plan_predicates(&rule_id, &patterns, &generator_exec, &rule.args)?;

        let tiers = self.config.tiers();
        let specificity = scoring::specificity(tier, &patterns, tiers);
        let confidence =
            scoring::confidence(&rule_id, tier, pattern_type, tiers, self.config.confidence())?;

        let compiled_id = compiled_id(&rule_id, tier, pattern_type, &patterns, &predicate_exec);

        tracing::trace!(
            rule_id = %rule_id,
            tier = %tier,
            score = specificity.final_score,
            confidence = confidence.value,
            "rule compiled"
        );

        Ok(TaintRuleExecutableIR {
            compiled_id,
            rule_id,
            atom_id: atom.id.clone(),
            tier,
            pattern_type,
            patterns,
            generator_exec,
            predicate_exec,
            specificity,
            confidence,
            effect: Effect {
                kind: atom.kind,
                category: atom.effective_category().map(str::to_string),
            },
            metadata: SecurityMetadata {
                severity: atom.severity,
                cwe: atom.cwe.clone(),
                owasp: atom.owasp.clone(),
                tags: atom.tags.clone(),
                description: atom.description.clone(),
            },
            trace: if atom.debug {
                TracePolicy::Verbose
            } else {
                TracePolicy::Off
            },
            compiled_at: chrono::Utc::now(),
        })
    }

    /// Compile every match rule of one atom
    pub fn compile_atom(&self, atom: &AtomSpec) -> Vec<CompileResult<TaintRuleExecutableIR>> {
        self.compile_atom_at(atom, 0)
    }

    fn compile_atom_at(&self, atom: &AtomSpec, position: usize) -> Vec<CompileResult<TaintRuleExecutableIR>> {
        if atom.id.trim().is_empty() {
            return vec![Err(CompileError::EmptyRuleId { position })];
        }
        if atom.match_rules.is_empty() {
            return vec![Err(CompileError::EmptyAtom {
                rule_id: atom.id.clone(),
            })];
        }
        (0..atom.match_rules.len())
            .map(|index| self.compile_rule(atom, index))
            .collect()
    }

    /// Compile a rule-set and sort it once
    pub fn compile_all(&self, atoms: &[AtomSpec]) -> CompileOutput {
        let start = Instant::now();

        #[cfg(feature = "parallel")]
        let results: Vec<Vec<CompileResult<TaintRuleExecutableIR>>> = atoms
            .par_iter()
            .enumerate()
            .map(|(position, atom)| self.compile_atom_at(atom, position))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let results: Vec<Vec<CompileResult<TaintRuleExecutableIR>>> = atoms
            .iter()
            .enumerate()
            .map(|(position, atom)| self.compile_atom_at(atom, position))
            .collect();

        let mut seen = FxHashSet::default();
        let mut rules = Vec::new();
        let mut errors = Vec::new();

        for result in results.into_iter().flatten() {
            match result {
                Ok(ir) if seen.insert(ir.rule_id.clone()) => rules.push(ir),
                Ok(ir) => errors.push(CompileError::DuplicateRuleId { rule_id: ir.rule_id }),
                Err(e) => errors.push(e),
            }
        }

        for error in &errors {
            tracing::warn!(rule_id = error.rule_id(), error = %error, "rule failed to compile");
        }

        let rules = RuleSet::new(rules);
        tracing::info!(
            atoms = atoms.len(),
            rules = rules.len(),
            errors = errors.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "rule-set compiled"
        );

        CompileOutput { rules, errors }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn rule_patterns(rule_id: &str, rule: &MatchRule) -> CompileResult<RulePatterns> {
    let (target, member, field) = match (non_blank(&rule.call), non_blank(&rule.read)) {
        (Some(_), Some(_)) => {
            return Err(CompileError::ConflictingMatchTarget {
                rule_id: rule_id.to_string(),
            })
        }
        (Some(call), None) => (EntityKind::Call, call, "call"),
        (None, Some(read)) => (EntityKind::Read, read, "read"),
        (None, None) => {
            return Err(CompileError::MissingMatchTarget {
                rule_id: rule_id.to_string(),
            })
        }
    };

    let parse = |field: &'static str, raw: &str| {
        CompiledPattern::parse(raw).map_err(|source| CompileError::MalformedPattern {
            rule_id: rule_id.to_string(),
            field,
            source,
        })
    };

    Ok(RulePatterns {
        target,
        base_type: rule
            .base_type
            .as_deref()
            .map(|b| parse("base_type", b))
            .transpose()?,
        member: parse(field, member)?,
    })
}

/// Deterministic blake3 fingerprint of what the rule matches
fn compiled_id(
    rule_id: &str,
    tier: Tier,
    pattern_type: PatternType,
    patterns: &RulePatterns,
    predicates: &PredicateExec,
) -> String {
    let mut hasher = blake3::Hasher::new();
    for part in [
        rule_id,
        tier.as_str(),
        pattern_type.as_str(),
        patterns.target.as_str(),
        patterns.base_type.as_ref().map_or("", CompiledPattern::as_str),
        patterns.member.as_str(),
    ] {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    hasher.update(&serde_json::to_vec(&predicates.steps).unwrap_or_default());
    hasher.finalize().to_hex().to_string()
}
