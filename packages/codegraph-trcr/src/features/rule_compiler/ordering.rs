//! Rule ordering
//!
//! Strict total order over executable rules, used to sort a rule-set once at
//! load time:
//!
//! 1. higher `specificity.final_score`
//! 2. fewer wildcards
//! 3. longer literal text
//! 4. smaller `rule_id`
//!
//! Nothing here depends on insertion order, hashing or timing.

use super::ir::TaintRuleExecutableIR;
use std::cmp::Ordering;
use std::sync::Arc;

impl TaintRuleExecutableIR {
    /// Compare by evaluation order (earlier rule is `Less`)
    pub fn order_cmp(&self, other: &Self) -> Ordering {
        other
            .specificity
            .final_score
            .total_cmp(&self.specificity.final_score)
            .then_with(|| {
                self.specificity
                    .wildcard_count
                    .cmp(&other.specificity.wildcard_count)
            })
            .then_with(|| {
                other
                    .specificity
                    .literal_length
                    .cmp(&self.specificity.literal_length)
            })
            .then_with(|| self.rule_id.cmp(&other.rule_id))
    }
}

impl PartialEq for TaintRuleExecutableIR {
    fn eq(&self, other: &Self) -> bool {
        self.order_cmp(other) == Ordering::Equal
    }
}

impl Eq for TaintRuleExecutableIR {}

impl PartialOrd for TaintRuleExecutableIR {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TaintRuleExecutableIR {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order_cmp(other)
    }
}

/// Sorted, shareable rule-set
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Arc<TaintRuleExecutableIR>>,
}

impl RuleSet {
    pub fn new(mut rules: Vec<TaintRuleExecutableIR>) -> Self {
        rules.sort();
        Self {
            rules: rules.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules in evaluation order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<TaintRuleExecutableIR>> {
        self.rules.iter()
    }

    pub fn get(&self, rule_id: &str) -> Option<&Arc<TaintRuleExecutableIR>> {
        self.rules.iter().find(|r| r.rule_id == rule_id)
    }

    pub fn rule_ids(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.rule_id.as_str()).collect()
    }

    /// Subset for one atom, still in evaluation order
    pub fn for_atom(&self, atom_id: &str) -> RuleSet {
        RuleSet {
            rules: self
                .rules
                .iter()
                .filter(|r| r.atom_id == atom_id)
                .cloned()
                .collect(),
        }
    }

    /// One `explain()` line per rule
    pub fn explain(&self) -> String {
        self.rules
            .iter()
            .map(|r| r.explain())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Arc<TaintRuleExecutableIR>;
    type IntoIter = std::slice::Iter<'a, Arc<TaintRuleExecutableIR>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
