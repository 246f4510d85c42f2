//! Execution results
//!
//! Runtime conditions are recorded as diagnostics on the `MatchSet`; a partial
//! scan is still a result.

use crate::features::rule_compiler::Tier;
use crate::features::rule_spec::{AtomKind, Severity};
use crate::shared::models::{Entity, MalformedEntity};
use serde::{Deserialize, Serialize};

/// One successful rule match, handed to claim arbitration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleMatch {
    pub rule_id: String,
    pub atom_id: String,
    pub entity: Entity,
    pub confidence: f64,
    pub effect_kind: AtomKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub severity: Severity,
    pub tier: Tier,
    /// Relied on guarded evidence (confidence already scaled)
    #[serde(default)]
    pub guarded: bool,
}

impl RuleMatch {
    pub fn entity_id(&self) -> &str {
        self.entity.id()
    }
}

/// Non-fatal runtime condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "diagnostic", rename_all = "snake_case")]
pub enum ExecutionDiagnostic {
    /// Candidate set exceeded the per-rule bound; the first `kept` (by
    /// discovery order) were evaluated
    CandidateOverflow {
        rule_id: String,
        generated: usize,
        kept: usize,
    },

    /// Per-rule time budget exhausted; remaining candidates skipped
    ExecutionTimeout {
        rule_id: String,
        evaluated: usize,
        skipped: usize,
        budget_ms: u64,
    },

    /// Entity record excluded from indexing
    MalformedEntity { error: MalformedEntity },
}

impl ExecutionDiagnostic {
    pub fn rule_id(&self) -> Option<&str> {
        match self {
            ExecutionDiagnostic::CandidateOverflow { rule_id, .. }
            | ExecutionDiagnostic::ExecutionTimeout { rule_id, .. } => Some(rule_id),
            ExecutionDiagnostic::MalformedEntity { .. } => None,
        }
    }

    /// Overflow and timeout leave a rule's result partial
    pub fn is_partial(&self) -> bool {
        !matches!(self, ExecutionDiagnostic::MalformedEntity { .. })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStats {
    pub entities: usize,
    pub rules_evaluated: usize,
    /// Rules whose compile-time confidence can never reach the threshold
    pub rules_skipped: usize,
    pub candidates_generated: usize,
    pub candidates_evaluated: usize,
    pub matches: usize,
    /// Matches dropped by `max_matches_per_entity`
    pub capped: usize,
    /// Passed predicates but scaled below the threshold
    pub below_threshold: usize,
    pub index_cache_hit: bool,
    pub elapsed_us: u64,
}

/// Ordered matches plus diagnostics for one execution call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchSet {
    /// Rule order, then entity discovery order
    pub matches: Vec<RuleMatch>,
    pub diagnostics: Vec<ExecutionDiagnostic>,
    pub stats: ExecutionStats,
}

impl MatchSet {
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RuleMatch> {
        self.matches.iter()
    }

    /// Some rule was truncated or timed out
    pub fn is_partial(&self) -> bool {
        self.diagnostics.iter().any(ExecutionDiagnostic::is_partial)
    }

    /// Rules with a truncated or timed-out scan, in rule order
    pub fn partial_rules(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for id in self
            .diagnostics
            .iter()
            .filter(|d| d.is_partial())
            .filter_map(ExecutionDiagnostic::rule_id)
        {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    pub fn matches_for_entity<'a>(&'a self, entity_id: &'a str) -> impl Iterator<Item = &'a RuleMatch> {
        self.matches.iter().filter(move |m| m.entity_id() == entity_id)
    }

    pub fn into_matches(self) -> Vec<RuleMatch> {
        self.matches
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl<'a> IntoIterator for &'a MatchSet {
    type Item = &'a RuleMatch;
    type IntoIter = std::slice::Iter<'a, RuleMatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.iter()
    }
}
