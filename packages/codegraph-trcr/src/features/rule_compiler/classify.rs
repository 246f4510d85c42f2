//! Tier classification

use super::ir::{PatternType, RulePatterns, Tier};
use crate::features::pattern_matching::PatternKind;
use crate::features::rule_spec::MatchStrategy;

/// Classify a rule's patterns into a tier and the pattern type that selects
/// its confidence adjustment.
///
/// - every pattern exact -> Tier 1
/// - exactly one non-exact pattern, of a suffix/prefix/contains shape -> Tier 2
/// - anything else, or a declared non-`auto` strategy -> Tier 3
pub fn classify(patterns: &RulePatterns, strategy: MatchStrategy) -> (Tier, PatternType) {
    match strategy {
        MatchStrategy::Auto => {}
        MatchStrategy::Trigram => return (Tier::Tier3, PatternType::Trigram),
        MatchStrategy::Fuzzy | MatchStrategy::Fallback => {
            return (Tier::Tier3, PatternType::Fallback)
        }
    }

    let wildcarded: Vec<&PatternKind> = patterns
        .iter()
        .map(|p| p.kind())
        .filter(|k| **k != PatternKind::Exact)
        .collect();

    match wildcarded.as_slice() {
        [] => (Tier::Tier1, PatternType::Exact),
        [PatternKind::Suffix(_)] => (Tier::Tier2, PatternType::Suffix),
        [PatternKind::Prefix(_)] => (Tier::Tier2, PatternType::Prefix),
        [PatternKind::Contains(_)] => (Tier::Tier2, PatternType::Contains),
        _ => (Tier::Tier3, PatternType::General),
    }
}
