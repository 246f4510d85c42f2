//! Taint rule executor
//!
//! ```text
//! entities ──► TieredIndex (built once, reused while the batch is unchanged)
//!                 │
//! for rule in RuleSet (sorted):
//!   generate candidates ──► truncate to max_candidates_per_rule
//!   for candidate (discovery order, until the rule's budget expires):
//!     predicate plan (short-circuit) ──► confidence (× guard) ──► threshold ──► RuleMatch
//! ```

use super::generate::generate_candidates;
use super::result::{ExecutionDiagnostic, ExecutionStats, MatchSet, RuleMatch};
use crate::config::ValidatedConfig;
use crate::features::indexing::{IndexCache, TieredIndex};
use crate::features::pattern_matching::WildcardMatcher;
use crate::features::rule_compiler::{PredicateOutcome, RuleSet, TaintRuleExecutableIR};
use crate::shared::models::{Entity, RawEntity};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub struct TaintRuleExecutor {
    rules: RuleSet,
    config: ValidatedConfig,
    matcher: Arc<WildcardMatcher>,
    index_cache: IndexCache,
}

impl TaintRuleExecutor {
    /// Executor with its own pattern cache sized from the configuration
    pub fn new(rules: RuleSet, config: ValidatedConfig) -> Self {
        let matcher = Arc::new(WildcardMatcher::new(config.runtime().pattern_cache_size));
        Self::with_matcher(rules, config, matcher)
    }

    /// Executor sharing an existing pattern cache
    pub fn with_matcher(rules: RuleSet, config: ValidatedConfig, matcher: Arc<WildcardMatcher>) -> Self {
        let index_cache = IndexCache::new(config.index_cache_ttl());
        Self {
            rules,
            config,
            matcher,
            index_cache,
        }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn config(&self) -> &ValidatedConfig {
        &self.config
    }

    pub fn matcher(&self) -> &Arc<WildcardMatcher> {
        &self.matcher
    }

    pub fn index_cache(&self) -> &IndexCache {
        &self.index_cache
    }

    /// Match a batch, reusing the cached index when the batch is unchanged.
    /// Entities with a blank member name are excluded and reported.
    pub fn execute(&self, entities: &[Entity]) -> MatchSet {
        let malformed = screen(entities);
        let entities: Cow<'_, [Entity]> = if malformed.is_empty() {
            Cow::Borrowed(entities)
        } else {
            Cow::Owned(entities.iter().filter(|e| e.validate().is_ok()).cloned().collect())
        };

        let (index, hit) = self
            .index_cache
            .get_or_build(&entities, self.config.runtime().case_sensitive);
        let mut set = self.execute_index(&index);
        set.stats.index_cache_hit = hit;
        with_malformed(set, malformed)
    }

    /// Convenience entry point for loader-shaped records. Malformed records are
    /// excluded and reported as diagnostics.
    pub fn match_patterns(&self, batch: Vec<RawEntity>) -> MatchSet {
        let mut entities = Vec::with_capacity(batch.len());
        let mut malformed = Vec::new();

        for raw in batch {
            match Entity::try_from(raw) {
                Ok(entity) => entities.push(entity),
                Err(error) => {
                    tracing::warn!(entity_id = error.entity_id(), %error, "malformed entity excluded");
                    malformed.push(ExecutionDiagnostic::MalformedEntity { error });
                }
            }
        }

        let index = TieredIndex::build(entities, self.config.runtime().case_sensitive);
        with_malformed(self.execute_index(&index), malformed)
    }

    /// Match independent batches, one index each; results follow input order
    pub fn execute_batches(&self, batches: Vec<Vec<Entity>>) -> Vec<MatchSet> {
        let case_sensitive = self.config.runtime().case_sensitive;
        let run = |mut batch: Vec<Entity>| {
            let malformed = screen(&batch);
            if !malformed.is_empty() {
                batch.retain(|e| e.validate().is_ok());
            }
            with_malformed(
                self.execute_index(&TieredIndex::build(batch, case_sensitive)),
                malformed,
            )
        };

        #[cfg(feature = "parallel")]
        let results = if self.config.runtime().parallel_batches {
            batches.into_par_iter().map(run).collect()
        } else {
            batches.into_iter().map(run).collect()
        };

        #[cfg(not(feature = "parallel"))]
        let results = batches.into_iter().map(run).collect();

        results
    }

    /// Match every rule, in order, against a built index
    pub fn execute_index(&self, index: &TieredIndex) -> MatchSet {
        let start = Instant::now();
        let runtime = self.config.runtime();
        let threshold = self.config.confidence().min_report_threshold;
        let guard_multiplier = self.config.confidence().guard_multiplier;
        let budget = self.config.execution_budget();
        let case_sensitive = index.case_sensitive();

        let mut per_entity = runtime.max_matches_per_entity.map(|_| vec![0usize; index.len()]);
        let mut matches = Vec::new();
        let mut diagnostics = Vec::new();
        let mut stats = ExecutionStats {
            entities: index.len(),
            ..Default::default()
        };

        for rule in &self.rules {
            if !rule.confidence.should_report() || rule.confidence.value < threshold {
                stats.rules_skipped += 1;
                tracing::debug!(
                    rule_id = %rule.rule_id,
                    confidence = rule.confidence.value,
                    threshold,
                    "rule skipped: confidence below threshold"
                );
                continue;
            }
            stats.rules_evaluated += 1;

            let rule_start = Instant::now();
            let deadline = rule_start.checked_add(budget);
            let mut candidates = generate_candidates(rule, index, &self.matcher, deadline);
            stats.candidates_generated += candidates.generated;

            if candidates.ordinals.len() > runtime.max_candidates_per_rule {
                candidates.ordinals.truncate(runtime.max_candidates_per_rule);
                tracing::warn!(
                    rule_id = %rule.rule_id,
                    generated = candidates.generated,
                    kept = runtime.max_candidates_per_rule,
                    "candidate overflow: truncated"
                );
                diagnostics.push(ExecutionDiagnostic::CandidateOverflow {
                    rule_id: rule.rule_id.clone(),
                    generated: candidates.generated,
                    kept: runtime.max_candidates_per_rule,
                });
            }

            if candidates.timed_out {
                self.record_timeout(rule, 0, candidates.ordinals.len(), &mut diagnostics);
                continue;
            }

            for (position, &ordinal) in candidates.ordinals.iter().enumerate() {
                if rule_start.elapsed() >= budget {
                    let skipped = candidates.ordinals.len() - position;
                    self.record_timeout(rule, position, skipped, &mut diagnostics);
                    break;
                }

                let Some(entity) = index.entity(ordinal) else {
                    continue;
                };
                if let (Some(counts), Some(cap)) = (per_entity.as_ref(), runtime.max_matches_per_entity) {
                    if counts[ordinal] >= cap {
                        stats.capped += 1;
                        continue;
                    }
                }
                stats.candidates_evaluated += 1;

                let guarded = match rule.predicate_exec.evaluate(entity, &self.matcher, case_sensitive) {
                    PredicateOutcome::Fail { step } => {
                        if rule.is_verbose() {
                            tracing::trace!(
                                rule_id = %rule.rule_id,
                                entity_id = entity.id(),
                                step,
                                "candidate rejected"
                            );
                        }
                        continue;
                    }
                    PredicateOutcome::Pass { guarded } => guarded,
                };

                let confidence = if guarded {
                    rule.confidence.value * guard_multiplier
                } else {
                    rule.confidence.value
                };
                if confidence < threshold {
                    stats.below_threshold += 1;
                    continue;
                }

                if rule.is_verbose() {
                    tracing::trace!(
                        rule_id = %rule.rule_id,
                        entity_id = entity.id(),
                        confidence,
                        guarded,
                        "candidate matched"
                    );
                }
                if let Some(counts) = per_entity.as_mut() {
                    counts[ordinal] += 1;
                }
                matches.push(rule_match(rule, entity, confidence, guarded));
            }
        }

        stats.matches = matches.len();
        stats.elapsed_us = start.elapsed().as_micros() as u64;

        tracing::info!(
            entities = stats.entities,
            rules = stats.rules_evaluated,
            skipped = stats.rules_skipped,
            candidates = stats.candidates_evaluated,
            matches = stats.matches,
            diagnostics = diagnostics.len(),
            elapsed_us = stats.elapsed_us,
            "rule execution finished"
        );

        MatchSet {
            matches,
            diagnostics,
            stats,
        }
    }

    fn record_timeout(
        &self,
        rule: &TaintRuleExecutableIR,
        evaluated: usize,
        skipped: usize,
        diagnostics: &mut Vec<ExecutionDiagnostic>,
    ) {
        let budget_ms = self.config.runtime().max_execution_time_ms;
        tracing::warn!(rule_id = %rule.rule_id, evaluated, skipped, budget_ms, "rule time budget exceeded");
        diagnostics.push(ExecutionDiagnostic::ExecutionTimeout {
            rule_id: rule.rule_id.clone(),
            evaluated,
            skipped,
            budget_ms,
        });
    }
}

impl std::fmt::Debug for TaintRuleExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaintRuleExecutor")
            .field("rules", &self.rules.len())
            .field("config", &self.config.describe())
            .field("matcher", &self.matcher)
            .field("index_cache", &self.index_cache)
            .finish()
    }
}

fn screen(entities: &[Entity]) -> Vec<ExecutionDiagnostic> {
    entities
        .iter()
        .filter_map(|entity| entity.validate().err())
        .map(|error| {
            tracing::warn!(entity_id = error.entity_id(), %error, "malformed entity excluded");
            ExecutionDiagnostic::MalformedEntity { error }
        })
        .collect()
}

/// Malformed-entity diagnostics lead the rule diagnostics
fn with_malformed(mut set: MatchSet, mut malformed: Vec<ExecutionDiagnostic>) -> MatchSet {
    if !malformed.is_empty() {
        malformed.append(&mut set.diagnostics);
        set.diagnostics = malformed;
    }
    set
}

fn rule_match(rule: &TaintRuleExecutableIR, entity: &Entity, confidence: f64, guarded: bool) -> RuleMatch {
    RuleMatch {
        rule_id: rule.rule_id.clone(),
        atom_id: rule.atom_id.clone(),
        entity: entity.clone(),
        confidence,
        effect_kind: rule.effect.kind,
        category: rule.effect.category.clone(),
        severity: rule.metadata.severity,
        tier: rule.tier,
        guarded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Preset, TrcrConfig};
    use crate::features::rule_compiler::TaintRuleCompiler;
    use crate::features::rule_spec::{ArgConstraint, AtomKind, AtomSpec, MatchRule};
    use crate::shared::models::{CallSite, PropertyRead};
    use pretty_assertions::assert_eq;

    fn executor_with(config: ValidatedConfig, atoms: &[AtomSpec]) -> TaintRuleExecutor {
        let rules = TaintRuleCompiler::new(config.clone())
            .compile_all(atoms)
            .into_strict()
            .unwrap();
        TaintRuleExecutor::new(rules, config)
    }

    fn sql_atom() -> AtomSpec {
        AtomSpec::new("sink.sql", AtomKind::Sink)
            .with_rule(MatchRule::call(Some("*.Cursor"), "execute").with_arg(ArgConstraint::not_const(0)))
    }

    #[test]
    fn test_guarded_match_scaled() {
        let exec = executor_with(ValidatedConfig::default(), &[sql_atom()]);
        let entities: Vec<Entity> = vec![
            CallSite::new("known", "execute")
                .with_base_type("sqlite3.Cursor")
                .with_arg("q", Some(false))
                .into(),
            CallSite::new("unknown", "execute")
                .with_base_type("sqlite3.Cursor")
                .with_arg("q", None)
                .into(),
            CallSite::new("const", "execute")
                .with_base_type("sqlite3.Cursor")
                .with_arg("'SELECT 1'", Some(true))
                .into(),
        ];

        let set = exec.execute(&entities);
        let ids: Vec<&str> = set.iter().map(RuleMatch::entity_id).collect();
        assert_eq!(ids, vec!["known", "unknown"]);
        assert!((set.matches[0].confidence - 0.9).abs() < 1e-9);
        assert!(set.matches[1].guarded);
        assert!((set.matches[1].confidence - 0.81).abs() < 1e-9);
    }

    #[test]
    fn test_guard_can_drop_below_threshold() {
        let config = TrcrConfig::preset(Preset::Fast).build().unwrap();
        let exec = executor_with(config, &[sql_atom()]);
        let entities: Vec<Entity> = vec![CallSite::new("u", "execute")
            .with_base_type("sqlite3.Cursor")
            .with_arg("q", None)
            .into()];

        // 0.9 * 0.9 = 0.81 >= 0.8 under fast
        assert_eq!(exec.execute(&entities).len(), 1);

        let config = TrcrConfig::preset(Preset::Fast)
            .confidence(|c| c.guard_multiplier(0.5))
            .build()
            .unwrap();
        let exec = executor_with(config, &[sql_atom()]);
        let set = exec.execute(&entities);
        assert!(set.is_empty());
        assert_eq!(set.stats.below_threshold, 1);
    }

    #[test]
    fn test_low_confidence_rules_skipped() {
        let atom = AtomSpec::new("fuzzy", AtomKind::Source).with_rule(
            MatchRule::read(Some("flask.Request"), "args")
                .with_strategy(crate::features::rule_spec::MatchStrategy::Fallback),
        );
        let exec = executor_with(ValidatedConfig::default(), &[atom]);
        let entities: Vec<Entity> = vec![PropertyRead::new("r", "args").with_base_type("flask.Request").into()];

        let set = exec.execute(&entities);
        assert!(set.is_empty());
        assert_eq!(set.stats.rules_skipped, 1);
        assert_eq!(set.stats.rules_evaluated, 0);
    }

    #[test]
    fn test_index_cache_reused() {
        let exec = executor_with(ValidatedConfig::default(), &[sql_atom()]);
        let entities: Vec<Entity> = vec![CallSite::new("a", "execute").with_base_type("x.Cursor").into()];

        assert!(!exec.execute(&entities).stats.index_cache_hit);
        assert!(exec.execute(&entities).stats.index_cache_hit);
        assert_eq!(exec.index_cache().hits(), 1);
    }

    #[test]
    fn test_match_patterns_reports_malformed() {
        let exec = executor_with(
            ValidatedConfig::default(),
            &[AtomSpec::new("src", AtomKind::Source).with_rule(MatchRule::read(Some("flask.Request"), "args"))],
        );
        let batch = vec![
            RawEntity {
                id: "ok".to_string(),
                kind: "read".to_string(),
                base_type: Some("flask.Request".to_string()),
                read: Some("args".to_string()),
                ..Default::default()
            },
            RawEntity {
                id: "bad".to_string(),
                kind: "import".to_string(),
                ..Default::default()
            },
        ];

        let set = exec.match_patterns(batch);
        assert_eq!(set.len(), 1);
        assert_eq!(set.matches[0].entity_id(), "ok");
        assert_eq!(set.diagnostics.len(), 1);
        assert!(matches!(
            &set.diagnostics[0],
            ExecutionDiagnostic::MalformedEntity { error } if error.entity_id() == "bad"
        ));
        assert!(!set.is_partial());
    }

    #[test]
    fn test_execute_excludes_blank_members() {
        let exec = executor_with(
            TrcrConfig::preset(Preset::Thorough).build().unwrap(),
            &[AtomSpec::new("sink.any", AtomKind::Sink).with_rule(MatchRule::call(Some("sqlite3.Cursor"), "*"))],
        );
        let entities: Vec<Entity> = vec![
            CallSite::new("blank", "  ").with_base_type("sqlite3.Cursor").into(),
            CallSite::new("ok", "execute").with_base_type("sqlite3.Cursor").into(),
        ];

        let set = exec.execute(&entities);
        let hits: Vec<&str> = set.matches.iter().map(|m| m.entity.id()).collect();
        assert_eq!(hits, vec!["ok"]);
        assert!(matches!(
            &set.diagnostics[0],
            ExecutionDiagnostic::MalformedEntity { error } if error.entity_id() == "blank"
        ));

        let sets = exec.execute_batches(vec![entities]);
        assert_eq!(sets[0].matches.len(), 1);
        assert_eq!(sets[0].diagnostics.len(), 1);
    }

    #[test]
    fn test_execute_batches_in_input_order() {
        let exec = executor_with(ValidatedConfig::default(), &[sql_atom()]);
        let batch = |id: &str| -> Vec<Entity> {
            vec![CallSite::new(id, "execute")
                .with_base_type("sqlite3.Cursor")
                .with_arg("q", Some(false))
                .into()]
        };

        let results = exec.execute_batches(vec![batch("a"), Vec::new(), batch("c")]);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].matches[0].entity_id(), "a");
        assert!(results[1].is_empty());
        assert_eq!(results[2].matches[0].entity_id(), "c");
    }
}
